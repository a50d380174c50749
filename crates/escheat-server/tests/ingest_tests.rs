//! Batch loader tests
//!
//! Verifies the chunk protocol: first-write-wins deduplication, the
//! store/index watermark invariant, and recovery when the index has
//! fallen behind committed store rows.

mod common;

use common::{property, setup_db};
use escheat_server::db::search;
use escheat_server::ingest::BatchLoader;

/// Number of index entries matching a single token.
async fn index_hits(pool: &sqlx::SqlitePool, token: &str) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM properties_fts WHERE properties_fts MATCH ?1")
        .bind(token)
        .fetch_one(pool)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_load_chunk_inserts_and_indexes() {
    let (_dir, pool) = setup_db().await;
    let loader = BatchLoader::new(pool.clone());

    let outcome = loader
        .load_chunk(&[property("P1", "SMITH"), property("P2", "JONES")])
        .await
        .unwrap();

    assert_eq!(outcome.inserted, 2);
    assert_eq!(outcome.skipped, 0);
    assert_eq!(search::store_row_count(&pool).await.unwrap(), 2);
    assert_eq!(search::index_watermark(&pool).await.unwrap(), 2);
}

#[tokio::test]
async fn test_empty_chunk_is_a_no_op() {
    let (_dir, pool) = setup_db().await;
    let loader = BatchLoader::new(pool.clone());

    let outcome = loader.load_chunk(&[]).await.unwrap();

    assert_eq!(outcome.inserted, 0);
    assert_eq!(outcome.skipped, 0);
    assert_eq!(search::store_row_count(&pool).await.unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_id_in_same_chunk_first_write_wins() {
    let (_dir, pool) = setup_db().await;
    let loader = BatchLoader::new(pool.clone());

    let outcome = loader
        .load_chunk(&[property("P1", "SMITH"), property("P1", "JONES")])
        .await
        .unwrap();

    assert_eq!(outcome.inserted, 1);
    assert_eq!(outcome.skipped, 1);

    let kept = search::lookup(&pool, "P1").await.unwrap().unwrap();
    assert_eq!(kept.owner_name.as_deref(), Some("SMITH"));
}

#[tokio::test]
async fn test_duplicate_id_across_chunks_first_write_wins() {
    let (_dir, pool) = setup_db().await;
    let loader = BatchLoader::new(pool.clone());

    loader.load_chunk(&[property("P1", "SMITH")]).await.unwrap();
    let second = loader.load_chunk(&[property("P1", "JONES")]).await.unwrap();

    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped, 1);

    let kept = search::lookup(&pool, "P1").await.unwrap().unwrap();
    assert_eq!(kept.owner_name.as_deref(), Some("SMITH"));

    // The discarded duplicate must not leave an index entry either.
    assert_eq!(index_hits(&pool, "JONES").await, 0);
}

#[tokio::test]
async fn test_watermark_tracks_store_after_every_chunk() {
    let (_dir, pool) = setup_db().await;
    let loader = BatchLoader::new(pool.clone());

    loader
        .load_chunk(&[property("P1", "A"), property("P2", "B")])
        .await
        .unwrap();
    assert_eq!(search::index_watermark(&pool).await.unwrap(), 2);

    // Skipped duplicates add no store rows, so the watermark holds still.
    loader
        .load_chunk(&[property("P2", "B"), property("P3", "C")])
        .await
        .unwrap();
    assert_eq!(search::store_row_count(&pool).await.unwrap(), 3);
    assert_eq!(search::index_watermark(&pool).await.unwrap(), 3);
}

#[tokio::test]
async fn test_reloading_chunk_repairs_unindexed_store_rows() {
    let (_dir, pool) = setup_db().await;

    // Simulate a store row committed without its index entry (a partial
    // state the loader itself can no longer produce, but a restored backup
    // can).
    sqlx::query(
        "INSERT INTO properties (property_id, owner_name, raw_payload) VALUES ('P1', 'SMITH', '{}')",
    )
    .execute(&pool)
    .await
    .unwrap();
    assert_eq!(search::index_watermark(&pool).await.unwrap(), 0);

    // Re-invoking the same chunk load dedups the record and re-derives the
    // missing index delta.
    let loader = BatchLoader::new(pool.clone());
    let outcome = loader.load_chunk(&[property("P1", "SMITH")]).await.unwrap();
    assert_eq!(outcome.inserted, 0);
    assert_eq!(outcome.skipped, 1);

    // Indexed exactly once: never zero, never two.
    assert_eq!(index_hits(&pool, "SMITH").await, 1);
    assert_eq!(
        search::query_ids(&pool, "SMITH", 10).await.unwrap(),
        vec!["P1".to_string()]
    );
}

#[tokio::test]
async fn test_extend_index_is_idempotent() {
    let (_dir, pool) = setup_db().await;

    sqlx::query(
        "INSERT INTO properties (property_id, owner_name, raw_payload) VALUES ('P1', 'SMITH', '{}')",
    )
    .execute(&pool)
    .await
    .unwrap();

    let loader = BatchLoader::new(pool.clone());
    assert_eq!(loader.extend_index().await.unwrap(), 1);
    assert_eq!(loader.extend_index().await.unwrap(), 0);
    assert_eq!(index_hits(&pool, "SMITH").await, 1);
}

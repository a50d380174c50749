//! End-to-end ingestion tests
//!
//! Fixture archives served over a local HTTP mock, driven through the full
//! fetch → normalize → load pipeline, then verified through the read path.

mod common;

use common::{empty_zip_fixture, setup_db, zip_fixture};
use sqlx::SqlitePool;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use escheat_common::EscheatError;
use escheat_server::config::SourceConfig;
use escheat_server::db::search;
use escheat_server::ingest::{BatchLoader, SourceFetcher, SyncOrchestrator};

async fn mock_archive(server: &MockServer, name: &str, blob: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(format!("/{name}")))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(blob))
        .mount(server)
        .await;
}

fn orchestrator(server: &MockServer, pool: &SqlitePool, chunk_size: usize) -> SyncOrchestrator {
    let source = SourceConfig {
        base_url: server.uri(),
        archives: Vec::new(),
        fetch_timeout_secs: 5,
    };
    let fetcher = SourceFetcher::new(&source).unwrap();
    SyncOrchestrator::new(fetcher, BatchLoader::new(pool.clone()), chunk_size)
}

#[tokio::test]
async fn test_duplicate_rows_in_one_archive() {
    let (_dir, pool) = setup_db().await;
    let server = MockServer::start().await;
    mock_archive(
        &server,
        "records.zip",
        zip_fixture(
            "PROPERTY_ID,OWNER_NAME,AMOUNT_REPORTED\n\
             P1,Smith,12.50\n\
             P1,Jones,99\n",
        ),
    )
    .await;

    let summary = orchestrator(&server, &pool, 100)
        .run(&["records.zip".to_string()])
        .await
        .unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.inserted, 1);
    assert_eq!(summary.skipped, 1);

    // The first committed row wins, unchanged by the duplicate.
    let kept = search::lookup(&pool, "P1").await.unwrap().unwrap();
    assert_eq!(kept.owner_name.as_deref(), Some("Smith"));
    assert_eq!(kept.amount_reported, 12.50);

    assert_eq!(
        search::query_ids(&pool, "Smith", 5).await.unwrap(),
        vec!["P1".to_string()]
    );
    assert!(search::query_ids(&pool, "Jones", 5).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rerunning_identical_input_only_skips() {
    let (_dir, pool) = setup_db().await;
    let server = MockServer::start().await;
    mock_archive(
        &server,
        "records.zip",
        zip_fixture(
            "PROPERTY_ID,OWNER_NAME\n\
             P1,SMITH\n\
             P2,JONES\n\
             P3,BROWN\n",
        ),
    )
    .await;

    let locations = vec!["records.zip".to_string()];
    let orchestrator = orchestrator(&server, &pool, 100);

    let first = orchestrator.run(&locations).await.unwrap();
    assert_eq!(first.inserted, 3);
    assert_eq!(first.skipped, 0);

    let second = orchestrator.run(&locations).await.unwrap();
    assert_eq!(second.inserted, 0);
    assert_eq!(second.skipped, 3);

    assert_eq!(search::store_row_count(&pool).await.unwrap(), 3);
    assert_eq!(search::index_watermark(&pool).await.unwrap(), 3);
}

#[tokio::test]
async fn test_overlapping_archives_dedup_across_locations() {
    let (_dir, pool) = setup_db().await;
    let server = MockServer::start().await;
    mock_archive(
        &server,
        "full.zip",
        zip_fixture("PROPERTY_ID,OWNER_NAME\nP1,SMITH\nP2,JONES\n"),
    )
    .await;
    // A tiered re-report covering one old id and one new one.
    mock_archive(
        &server,
        "tier.zip",
        zip_fixture("PROPERTY_ID,OWNER_NAME\nP2,JONES AMENDED\nP3,BROWN\n"),
    )
    .await;

    let orchestrator = orchestrator(&server, &pool, 100);
    orchestrator.run(&["full.zip".to_string()]).await.unwrap();

    let superset = orchestrator
        .run(&["full.zip".to_string(), "tier.zip".to_string()])
        .await
        .unwrap();

    assert_eq!(superset.inserted, 1);
    assert_eq!(superset.skipped, 3);
    assert_eq!(search::store_row_count(&pool).await.unwrap(), 3);

    // The amended duplicate was discarded, not merged.
    let kept = search::lookup(&pool, "P2").await.unwrap().unwrap();
    assert_eq!(kept.owner_name.as_deref(), Some("JONES"));
}

#[tokio::test]
async fn test_multi_chunk_run_indexes_every_record() {
    let (_dir, pool) = setup_db().await;
    let server = MockServer::start().await;
    mock_archive(
        &server,
        "records.zip",
        zip_fixture(
            "PROPERTY_ID,OWNER_NAME\n\
             P1,ALPHA\nP2,BRAVO\nP3,CHARLIE\nP4,DELTA\nP5,ECHO\n",
        ),
    )
    .await;

    // Chunk size 2 forces three chunks over five records.
    let summary = orchestrator(&server, &pool, 2)
        .run(&["records.zip".to_string()])
        .await
        .unwrap();

    assert_eq!(summary.inserted, 5);
    assert_eq!(search::index_watermark(&pool).await.unwrap(), 5);
    for (id, owner) in [("P1", "ALPHA"), ("P3", "CHARLIE"), ("P5", "ECHO")] {
        assert_eq!(
            search::query_ids(&pool, owner, 5).await.unwrap(),
            vec![id.to_string()]
        );
    }
}

#[tokio::test]
async fn test_rows_without_id_are_dropped_not_fatal() {
    let (_dir, pool) = setup_db().await;
    let server = MockServer::start().await;
    mock_archive(
        &server,
        "records.zip",
        zip_fixture(
            "PROPERTY_ID,OWNER_NAME\n\
             P1,SMITH\n\
             ,NO ID HERE\n\
             P2,JONES\n",
        ),
    )
    .await;

    let summary = orchestrator(&server, &pool, 100)
        .run(&["records.zip".to_string()])
        .await
        .unwrap();

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.inserted, 2);
    assert_eq!(summary.dropped, 1);
}

#[tokio::test]
async fn test_empty_archive_aborts_run() {
    let (_dir, pool) = setup_db().await;
    let server = MockServer::start().await;
    mock_archive(&server, "empty.zip", empty_zip_fixture()).await;

    let err = orchestrator(&server, &pool, 100)
        .run(&["empty.zip".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, EscheatError::ArchiveEmpty { .. }));
    assert_eq!(search::store_row_count(&pool).await.unwrap(), 0);
}

#[tokio::test]
async fn test_missing_archive_aborts_run() {
    let (_dir, pool) = setup_db().await;
    let server = MockServer::start().await;
    // No mock mounted: the server answers 404.

    let err = orchestrator(&server, &pool, 100)
        .run(&["nowhere.zip".to_string()])
        .await
        .unwrap_err();

    match err {
        EscheatError::FetchFailed { location, .. } => assert_eq!(location, "nowhere.zip"),
        other => panic!("expected FetchFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_failed_location_keeps_earlier_locations_committed() {
    let (_dir, pool) = setup_db().await;
    let server = MockServer::start().await;
    mock_archive(
        &server,
        "good.zip",
        zip_fixture("PROPERTY_ID,OWNER_NAME\nP1,SMITH\nP2,JONES\n"),
    )
    .await;

    let err = orchestrator(&server, &pool, 100)
        .run(&["good.zip".to_string(), "missing.zip".to_string()])
        .await
        .unwrap_err();

    assert!(matches!(err, EscheatError::FetchFailed { .. }));

    // Everything committed before the failure stays, store and index in
    // step, and a later re-run completes the job without duplicates.
    assert_eq!(search::store_row_count(&pool).await.unwrap(), 2);
    assert_eq!(search::index_watermark(&pool).await.unwrap(), 2);

    mock_archive(
        &server,
        "missing.zip",
        zip_fixture("PROPERTY_ID,OWNER_NAME\nP3,BROWN\n"),
    )
    .await;
    let retry = orchestrator(&server, &pool, 100)
        .run(&["good.zip".to_string(), "missing.zip".to_string()])
        .await
        .unwrap();

    assert_eq!(retry.inserted, 1);
    assert_eq!(retry.skipped, 2);
    assert_eq!(search::store_row_count(&pool).await.unwrap(), 3);
}

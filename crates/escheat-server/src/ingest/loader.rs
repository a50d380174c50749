//! Batch loader
//!
//! Commits canonical records to the store in bounded chunks and keeps the
//! search index synchronized with what was just committed. The chunk is
//! the unit of atomicity and of crash-recovery granularity: both steps of
//! a chunk commit in one transaction, so readers either see a whole chunk
//! or none of it, and a fault leaves the store and index consistent at the
//! previous chunk boundary.

use sqlx::{QueryBuilder, SqlitePool};
use tracing::debug;

use escheat_common::{Property, Result};

/// Extend the search index to cover every store row beyond its current
/// high-water rowid. Derived from store state alone, so the statement is
/// idempotent: re-running it after a crash re-computes the same delta and
/// can never index a row twice.
const EXTEND_INDEX_SQL: &str = r#"
INSERT INTO properties_fts (rowid, owner_name, owner_address, owner_city, holder_name)
SELECT rowid, owner_name, owner_address, owner_city, holder_name
FROM properties
WHERE rowid > (SELECT IFNULL(MAX(rowid), 0) FROM properties_fts)
"#;

/// Counts from one committed chunk.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkOutcome {
    /// Records newly written to the store
    pub inserted: u64,
    /// Records discarded because their property id already existed
    pub skipped: u64,
}

/// Writes record chunks into the store and index.
pub struct BatchLoader {
    pool: SqlitePool,
}

impl BatchLoader {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Commit one chunk of records.
    ///
    /// Step 1 inserts the chunk with insert-if-absent semantics keyed on
    /// `property_id`; rows whose id already exists (in the store or earlier
    /// in the same chunk) count as skipped, never as errors. Step 2 extends
    /// the index over exactly the rows step 1 committed. Both commit
    /// together; any fault rolls the whole chunk back.
    ///
    /// Chunk sizes must keep thirteen binds per record under SQLite's
    /// host-parameter limit;
    /// [`Config::validate`](crate::config::Config::validate) enforces the
    /// ceiling.
    pub async fn load_chunk(&self, records: &[Property]) -> Result<ChunkOutcome> {
        if records.is_empty() {
            return Ok(ChunkOutcome::default());
        }

        let mut tx = self.pool.begin().await?;

        let mut insert = QueryBuilder::new(
            "INSERT OR IGNORE INTO properties \
             (property_id, owner_name, owner_address, owner_city, owner_state, \
              owner_zip, amount_reported, cash_reported, property_type, \
              holder_name, holder_address, reported_date, raw_payload) ",
        );
        insert.push_values(records, |mut row, record| {
            row.push_bind(&record.property_id)
                .push_bind(&record.owner_name)
                .push_bind(&record.owner_address)
                .push_bind(&record.owner_city)
                .push_bind(&record.owner_state)
                .push_bind(&record.owner_zip)
                .push_bind(record.amount_reported)
                .push_bind(&record.cash_reported)
                .push_bind(&record.property_type)
                .push_bind(&record.holder_name)
                .push_bind(&record.holder_address)
                .push_bind(&record.reported_date)
                .push_bind(&record.raw_payload);
        });

        let inserted = insert.build().execute(&mut *tx).await?.rows_affected();
        let skipped = records.len() as u64 - inserted;

        sqlx::query(EXTEND_INDEX_SQL).execute(&mut *tx).await?;

        tx.commit().await?;

        debug!(inserted, skipped, "Chunk committed");
        Ok(ChunkOutcome { inserted, skipped })
    }

    /// Re-derive any missing tail of the search index from store state.
    ///
    /// [`load_chunk`](Self::load_chunk) already runs this delta inside
    /// every chunk transaction; this standalone form repairs a store whose
    /// index fell behind outside the loader's control (e.g. a database
    /// restored from a partial backup). Returns the number of rows newly
    /// indexed.
    pub async fn extend_index(&self) -> Result<u64> {
        let indexed = sqlx::query(EXTEND_INDEX_SQL)
            .execute(&self.pool)
            .await?
            .rows_affected();
        Ok(indexed)
    }
}

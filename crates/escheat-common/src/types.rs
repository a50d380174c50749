//! Shared domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One unclaimed-property record, normalized from a raw source row.
///
/// `property_id` is the sole identity: two source rows with the same id are
/// the same logical record, and the first one committed wins. All other
/// fields are free text as reported by the holder; `amount_reported` is the
/// only coerced field and defaults to zero when the source value is absent
/// or unparsable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub property_id: String,
    pub owner_name: Option<String>,
    pub owner_address: Option<String>,
    pub owner_city: Option<String>,
    pub owner_state: Option<String>,
    pub owner_zip: Option<String>,
    pub amount_reported: f64,
    pub cash_reported: Option<String>,
    pub property_type: Option<String>,
    pub holder_name: Option<String>,
    pub holder_address: Option<String>,
    pub reported_date: Option<String>,
    /// Serialized form of the original source row, kept for audit and
    /// debugging. Never parsed back.
    pub raw_payload: String,
}

/// Outcome of one ingestion run across one or more source locations.
///
/// `processed` counts rows read from the source tables; rows without any
/// id-bearing field are dropped during normalization, so
/// `processed == inserted + skipped + dropped`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Rows read from all source tables
    pub processed: u64,
    /// Records newly committed to the store
    pub inserted: u64,
    /// Records discarded as duplicates of an already-committed id
    pub skipped: u64,
    /// Rows dropped during normalization for lacking a property id
    pub dropped: u64,
}

impl RunSummary {
    pub fn start() -> Self {
        let now = Utc::now();
        Self {
            run_id: Uuid::new_v4(),
            started_at: now,
            finished_at: now,
            processed: 0,
            inserted: 0,
            skipped: 0,
            dropped: 0,
        }
    }

    pub fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }
}

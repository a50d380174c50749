//! Ingestion pipeline
//!
//! One end-to-end run moves data through three stages, each blind to the
//! others' concerns:
//!
//! 1. [`fetcher`]: retrieve a named ZIP archive and stream the rows of its
//!    single CSV table, schema-free.
//! 2. [`normalizer`]: map each raw row to a canonical
//!    [`Property`](escheat_common::Property), pure and total.
//! 3. [`loader`]: commit records in fixed-size chunks, store and search
//!    index together, first write wins per property id.
//!
//! [`orchestrator`] wires the stages together and is the unit of
//! idempotency: a run may be re-invoked any number of times, including
//! after a mid-run failure, without duplicating or corrupting records.

pub mod fetcher;
pub mod loader;
pub mod normalizer;
pub mod orchestrator;

pub use fetcher::SourceFetcher;
pub use loader::{BatchLoader, ChunkOutcome};
pub use orchestrator::SyncOrchestrator;

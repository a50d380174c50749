//! Escheat Server Library
//!
//! Searchable database and REST service for California's unclaimed
//! property records.
//!
//! # Overview
//!
//! The state periodically republishes its full record dump (and four
//! overlapping amount-tiered sub-dumps) as CSV-in-ZIP archives, millions
//! of rows each. This crate ingests those archives into a SQLite store
//! with an FTS5 search index and serves owner/holder text search, exact
//! id lookup, and claim intake over HTTP:
//!
//! - [`ingest`]: the pipeline (fetch, normalize, batch-load). Chunks
//!   commit store rows and their index entries in one transaction, and
//!   duplicate property ids are discarded first-write-wins, so a run can
//!   be re-invoked at any time, even after a crash or against overlapping
//!   archives, without diverging the index or duplicating records.
//! - [`db`]: pool construction (WAL mode, so readers run concurrently
//!   with an in-flight ingestion) and the search/lookup query contract.
//! - [`api`]: the Axum HTTP surface.
//! - [`config`]: environment-based configuration.
//!
//! # Framework Stack
//!
//! - **Axum**: HTTP service
//! - **SQLx**: SQLite store and FTS5 index access
//! - **Tokio**: async runtime; parsing runs on blocking threads

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod ingest;

//! Escheat Common Library
//!
//! Shared types, logging, and error handling for the escheat workspace.
//!
//! # Overview
//!
//! This crate provides the functionality shared by the server and CLI:
//!
//! - **Error Handling**: the [`EscheatError`] taxonomy and [`Result`] alias
//! - **Logging**: [`logging`] initializes the tracing subscriber
//! - **Types**: the canonical [`Property`] record and ingestion run summary

pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{EscheatError, Result};
pub use types::{Property, RunSummary};

//! Sync orchestrator
//!
//! Drives one end-to-end ingestion run: fetch each source archive, stream
//! its rows through normalization on a blocking thread, and feed the batch
//! loader in fixed-size chunks. Each location is processed fully before
//! the next; a failure aborts the run with the failing location, the chunk
//! offset, and the counts committed before the fault.
//!
//! The run is the unit of idempotency: re-invoking it with the same or a
//! superset of locations is safe; first-write-wins deduplication absorbs
//! every repeat. Loads are strictly sequential within a run (chunk N
//! commits before chunk N+1 begins) because index extension depends on the
//! watermark the previous chunk left behind. Concurrent runs against one
//! store are not supported and must be serialized by the caller.

use std::mem;
use std::ops::ControlFlow;

use anyhow::anyhow;
use tokio::sync::mpsc;
use tokio::task;
use tracing::{debug, error, info};

use escheat_common::{EscheatError, Property, Result, RunSummary};

use super::fetcher::{read_first_table, SourceFetcher};
use super::loader::BatchLoader;
use super::normalizer;

/// Chunks in flight between the parser thread and the loader. Small on
/// purpose: the channel provides backpressure, not buffering.
const CHUNK_CHANNEL_CAPACITY: usize = 2;

struct ParseTotals {
    rows_read: u64,
    rows_dropped: u64,
}

/// One-run ingestion driver. Owns no state beyond its collaborators; all
/// progress lives in the store and its derived index watermark.
pub struct SyncOrchestrator {
    fetcher: SourceFetcher,
    loader: BatchLoader,
    chunk_size: usize,
}

impl SyncOrchestrator {
    pub fn new(fetcher: SourceFetcher, loader: BatchLoader, chunk_size: usize) -> Self {
        Self {
            fetcher,
            loader,
            chunk_size,
        }
    }

    /// Process every location fully, in order.
    pub async fn run(&self, locations: &[String]) -> Result<RunSummary> {
        let mut summary = RunSummary::start();
        info!(
            run_id = %summary.run_id,
            locations = locations.len(),
            "Ingestion run started"
        );

        for location in locations {
            self.run_location(location, &mut summary).await?;
        }

        let summary = summary.finish();
        info!(
            run_id = %summary.run_id,
            processed = summary.processed,
            inserted = summary.inserted,
            skipped = summary.skipped,
            dropped = summary.dropped,
            "Ingestion run complete"
        );
        Ok(summary)
    }

    async fn run_location(&self, location: &str, summary: &mut RunSummary) -> Result<()> {
        let blob = self.fetcher.fetch(location).await?;

        let (chunk_tx, mut chunk_rx) = mpsc::channel::<Vec<Property>>(CHUNK_CHANNEL_CAPACITY);
        let chunk_size = self.chunk_size;
        let parse_location = location.to_string();

        // Extraction and normalization are CPU/IO-bound and synchronous;
        // they run on a blocking thread and hand chunks across the channel.
        let parser = task::spawn_blocking(move || -> Result<ParseTotals> {
            let mut chunk = Vec::with_capacity(chunk_size);
            let mut rows_dropped = 0u64;

            let rows_read = read_first_table(&parse_location, &blob, |raw| {
                let Some(record) = normalizer::normalize(&raw) else {
                    rows_dropped += 1;
                    return Ok(ControlFlow::Continue(()));
                };
                chunk.push(record);
                if chunk.len() >= chunk_size {
                    let full = mem::replace(&mut chunk, Vec::with_capacity(chunk_size));
                    if chunk_tx.blocking_send(full).is_err() {
                        // Loader side hung up; its error is the one that counts.
                        return Ok(ControlFlow::Break(()));
                    }
                }
                Ok(ControlFlow::Continue(()))
            })?;

            if !chunk.is_empty() {
                let _ = chunk_tx.blocking_send(chunk);
            }

            Ok(ParseTotals {
                rows_read,
                rows_dropped,
            })
        });

        let mut chunk_no = 0u64;
        let mut failure: Option<EscheatError> = None;
        while let Some(records) = chunk_rx.recv().await {
            chunk_no += 1;
            match self.loader.load_chunk(&records).await {
                Ok(outcome) => {
                    summary.inserted += outcome.inserted;
                    summary.skipped += outcome.skipped;
                    debug!(
                        location,
                        chunk = chunk_no,
                        inserted = outcome.inserted,
                        skipped = outcome.skipped,
                        "Chunk committed"
                    );
                },
                Err(EscheatError::Database(source)) => {
                    failure = Some(EscheatError::LoadFailed {
                        location: location.to_string(),
                        chunk: chunk_no,
                        inserted: summary.inserted,
                        skipped: summary.skipped,
                        source,
                    });
                    break;
                },
                Err(other) => {
                    failure = Some(other);
                    break;
                },
            }
        }

        // Closing the receiver stops the parser at its next send.
        drop(chunk_rx);
        let parse_outcome = parser.await;

        if let Some(err) = failure {
            error!(
                location,
                inserted = summary.inserted,
                skipped = summary.skipped,
                error = %err,
                "Ingestion run aborted"
            );
            return Err(err);
        }

        let totals = match parse_outcome {
            Ok(Ok(totals)) => totals,
            Ok(Err(err)) => {
                error!(location, error = %err, "Ingestion run aborted while reading source");
                return Err(err);
            },
            Err(join_err) => {
                return Err(EscheatError::FetchFailed {
                    location: location.to_string(),
                    source: anyhow!(join_err).context("row parser task failed"),
                });
            },
        };

        summary.processed += totals.rows_read;
        summary.dropped += totals.rows_dropped;
        info!(
            location,
            rows = totals.rows_read,
            dropped = totals.rows_dropped,
            "Location ingested"
        );
        Ok(())
    }
}

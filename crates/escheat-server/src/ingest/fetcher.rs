//! Source archive fetching and table extraction
//!
//! Retrieves a named archive as a byte blob and exposes the single CSV
//! table it contains as a sequential row source. This layer knows nothing
//! about the table's schema; rows surface as loosely-typed [`RawRow`]s for
//! the normalizer to interpret.
//!
//! No retry happens here. Transport and archive faults surface as
//! `FetchFailed` with the underlying cause; retry policy belongs to
//! whoever re-invokes the run.

use std::io::Cursor;
use std::ops::ControlFlow;
use std::time::Duration;

use anyhow::anyhow;
use serde_json::{Map, Value};
use tracing::{debug, info};

use escheat_common::{EscheatError, Result};

use crate::config::SourceConfig;

/// One raw row of a source table, addressed by header name.
#[derive(Debug)]
pub struct RawRow<'a> {
    headers: &'a csv::StringRecord,
    record: &'a csv::StringRecord,
}

impl<'a> RawRow<'a> {
    pub(crate) fn new(headers: &'a csv::StringRecord, record: &'a csv::StringRecord) -> Self {
        Self { headers, record }
    }

    /// Value of the named column, or `None` when the table has no such
    /// header. Header names are compared after trimming whitespace and a
    /// leading UTF-8 BOM, which state exports carry on the first column.
    pub fn get(&self, field: &str) -> Option<&'a str> {
        let idx = self
            .headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').trim() == field)?;
        self.record.get(idx)
    }

    /// Serialize the whole row as a JSON object for audit retention.
    pub fn to_json(&self) -> String {
        let mut fields = Map::new();
        for (header, value) in self.headers.iter().zip(self.record.iter()) {
            fields.insert(
                header.trim_start_matches('\u{feff}').trim().to_string(),
                Value::String(value.to_string()),
            );
        }
        Value::Object(fields).to_string()
    }
}

/// Downloads source archives from the publication site.
pub struct SourceFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl SourceFetcher {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_secs))
            .build()
            .map_err(|e| EscheatError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Retrieve the named archive as a byte blob.
    pub async fn fetch(&self, location: &str) -> Result<Vec<u8>> {
        let url = format!("{}/{}", self.base_url, location);
        info!(location, url = %url, "Downloading archive");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| fetch_failed(location, anyhow!(e)))?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| fetch_failed(location, anyhow!(e)))?;

        debug!(location, bytes = bytes.len(), "Archive downloaded");
        Ok(bytes.to_vec())
    }
}

fn fetch_failed(location: &str, source: anyhow::Error) -> EscheatError {
    EscheatError::FetchFailed {
        location: location.to_string(),
        source,
    }
}

/// Open the single CSV table inside `blob` and feed its rows to `visit`,
/// one at a time. Returns the number of rows read.
///
/// The table is decoded as a stream: a single pass, one row in flight,
/// restartable only from the start. Non-UTF-8 bytes are replaced rather
/// than failing the row. The visitor returns `Break` to stop early (the
/// remaining rows are not read); an archive without any file entry fails
/// with `ArchiveEmpty`.
pub fn read_first_table<F>(location: &str, blob: &[u8], mut visit: F) -> Result<u64>
where
    F: FnMut(RawRow<'_>) -> Result<ControlFlow<()>>,
{
    let mut archive = zip::ZipArchive::new(Cursor::new(blob))
        .map_err(|e| fetch_failed(location, anyhow!(e).context("unreadable zip archive")))?;

    let entry_index = (0..archive.len())
        .find(|&i| archive.by_index(i).map(|f| f.is_file()).unwrap_or(false))
        .ok_or_else(|| EscheatError::ArchiveEmpty {
            location: location.to_string(),
        })?;

    let entry = archive
        .by_index(entry_index)
        .map_err(|e| fetch_failed(location, anyhow!(e).context("unreadable zip entry")))?;
    debug!(location, table = %entry.name(), "Reading table");

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(entry);

    let headers = reader
        .headers()
        .map_err(|e| fetch_failed(location, anyhow!(e).context("unreadable table header")))?
        .clone();

    let mut rows_read = 0u64;
    let mut record = csv::ByteRecord::new();
    loop {
        let more = reader
            .read_byte_record(&mut record)
            .map_err(|e| fetch_failed(location, anyhow!(e).context("malformed table row")))?;
        if !more {
            break;
        }
        rows_read += 1;

        let row = csv::StringRecord::from_byte_record_lossy(record.clone());
        if visit(RawRow::new(&headers, &row))?.is_break() {
            break;
        }
    }

    Ok(rows_read)
}

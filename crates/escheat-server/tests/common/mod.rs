//! Shared helpers for integration tests

#![allow(dead_code)]

use std::io::{Cursor, Write};

use sqlx::SqlitePool;
use tempfile::TempDir;

use escheat_common::Property;
use escheat_server::config::DatabaseConfig;
use escheat_server::db;

/// A migrated on-disk test database. Keep the `TempDir` alive as long as
/// the pool.
pub async fn setup_db() -> (TempDir, SqlitePool) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = DatabaseConfig {
        path: dir.path().join("test.db").to_string_lossy().into_owned(),
        max_connections: 5,
        busy_timeout_ms: 5_000,
    };
    let pool = db::create_pool(&config).await.expect("create pool");
    db::run_migrations(&pool).await.expect("run migrations");
    (dir, pool)
}

/// Build a one-file ZIP archive holding `csv` as its table.
pub fn zip_fixture(csv: &str) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("records.csv", zip::write::SimpleFileOptions::default())
        .expect("start zip entry");
    writer.write_all(csv.as_bytes()).expect("write zip entry");
    writer.finish().expect("finish zip").into_inner()
}

/// Build a ZIP archive with no entries at all.
pub fn empty_zip_fixture() -> Vec<u8> {
    let writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer.finish().expect("finish zip").into_inner()
}

/// Minimal property for loader-level tests.
pub fn property(id: &str, owner: &str) -> Property {
    Property {
        property_id: id.to_string(),
        owner_name: Some(owner.to_string()),
        owner_address: None,
        owner_city: None,
        owner_state: None,
        owner_zip: None,
        amount_reported: 0.0,
        cash_reported: None,
        property_type: None,
        holder_name: None,
        holder_address: None,
        reported_date: None,
        raw_payload: "{}".to_string(),
    }
}

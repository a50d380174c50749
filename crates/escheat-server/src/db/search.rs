//! Search index and record store queries
//!
//! The read path of the system: token-match queries against the FTS5 index
//! and exact lookups against the record store. The index never returns an
//! id absent from the store; the batch loader's watermark protocol
//! guarantees it, so nothing is re-checked here at query time.

use sqlx::SqlitePool;
use tracing::debug;

use escheat_common::{EscheatError, Property, Result};

/// Minimum accepted query length. A usability guard on the read path, not a
/// property of the index itself.
pub const MIN_QUERY_LEN: usize = 2;

// Helper struct for sqlx row mapping
#[derive(sqlx::FromRow)]
struct PropertyRow {
    property_id: String,
    owner_name: Option<String>,
    owner_address: Option<String>,
    owner_city: Option<String>,
    owner_state: Option<String>,
    owner_zip: Option<String>,
    amount_reported: f64,
    cash_reported: Option<String>,
    property_type: Option<String>,
    holder_name: Option<String>,
    holder_address: Option<String>,
    reported_date: Option<String>,
    raw_payload: String,
}

impl From<PropertyRow> for Property {
    fn from(row: PropertyRow) -> Self {
        Property {
            property_id: row.property_id,
            owner_name: row.owner_name,
            owner_address: row.owner_address,
            owner_city: row.owner_city,
            owner_state: row.owner_state,
            owner_zip: row.owner_zip,
            amount_reported: row.amount_reported,
            cash_reported: row.cash_reported,
            property_type: row.property_type,
            holder_name: row.holder_name,
            holder_address: row.holder_address,
            reported_date: row.reported_date,
            raw_payload: row.raw_payload,
        }
    }
}

/// Rewrite user text into an FTS5 match expression.
///
/// Each whitespace-separated token is double-quoted so FTS5 operator syntax
/// in user input (`NEAR`, `*`, unbalanced quotes) cannot fail the query.
/// Returns `None` when no token carries an indexable character; callers
/// treat that as an empty result set.
fn match_expression(query: &str) -> Option<String> {
    let phrases: Vec<String> = query
        .split_whitespace()
        .filter(|token| token.chars().any(|c| c.is_alphanumeric()))
        .map(|token| format!("\"{}\"", token.replace('"', "\"\"")))
        .collect();

    if phrases.is_empty() {
        None
    } else {
        Some(phrases.join(" "))
    }
}

/// Token-match query against the search index.
///
/// Returns at most `limit` property ids, ranked by the engine's relevance
/// (bm25), ties broken by store insertion order. Queries shorter than
/// [`MIN_QUERY_LEN`] are rejected with `QueryTooShort` before touching the
/// index.
pub async fn query_ids(pool: &SqlitePool, query: &str, limit: u32) -> Result<Vec<String>> {
    let trimmed = query.trim();
    if trimmed.chars().count() < MIN_QUERY_LEN {
        return Err(EscheatError::QueryTooShort { min: MIN_QUERY_LEN });
    }

    let Some(expr) = match_expression(trimmed) else {
        return Ok(Vec::new());
    };
    debug!(query = %trimmed, expr = %expr, limit, "Search index query");

    let ids = sqlx::query_scalar::<_, String>(
        r#"
        SELECT p.property_id
        FROM properties_fts
        JOIN properties p ON p.rowid = properties_fts.rowid
        WHERE properties_fts MATCH ?1
        ORDER BY properties_fts.rank, p.rowid
        LIMIT ?2
        "#,
    )
    .bind(&expr)
    .bind(limit as i64)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}

/// Fetch one record by its property id.
pub async fn lookup(pool: &SqlitePool, property_id: &str) -> Result<Option<Property>> {
    let row = sqlx::query_as::<_, PropertyRow>(
        r#"
        SELECT property_id, owner_name, owner_address, owner_city, owner_state,
               owner_zip, amount_reported, cash_reported, property_type,
               holder_name, holder_address, reported_date, raw_payload
        FROM properties
        WHERE property_id = ?1
        "#,
    )
    .bind(property_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Property::from))
}

/// Search the index, then hydrate each matching id from the record store.
///
/// An empty result is valid, not an error.
pub async fn search(pool: &SqlitePool, query: &str, limit: u32) -> Result<Vec<Property>> {
    let ids = query_ids(pool, query, limit).await?;

    let mut properties = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(property) = lookup(pool, &id).await? {
            properties.push(property);
        }
    }

    Ok(properties)
}

/// Number of committed rows in the record store.
pub async fn store_row_count(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM properties")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Highest store rowid already covered by the search index, 0 when empty.
///
/// This is the watermark the batch loader extends from: computed from index
/// state on every use, never stored separately.
pub async fn index_watermark(pool: &SqlitePool) -> Result<i64> {
    let watermark =
        sqlx::query_scalar::<_, i64>("SELECT IFNULL(MAX(rowid), 0) FROM properties_fts")
            .fetch_one(pool)
            .await?;
    Ok(watermark)
}

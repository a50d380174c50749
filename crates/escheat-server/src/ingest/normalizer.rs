//! Raw row normalization
//!
//! Pure mapping from one loosely-typed source row to the canonical
//! [`Property`]. The same raw row always yields the same record: no I/O,
//! no shared state.
//!
//! The state has renamed columns across republications, so each logical
//! field carries a list of header spellings tried in priority order; the
//! first non-empty value wins and everything else falls back to empty.
//! Normalization never fails a row outright: the only way a row is
//! dropped is when no id-bearing field is present at all.

use escheat_common::Property;

use super::fetcher::RawRow;

const PROPERTY_ID_FIELDS: &[&str] = &["PROPERTY_ID", "Property ID"];
const OWNER_NAME_FIELDS: &[&str] = &["OWNER_NAME", "OWNER_FIRST_NAME"];

/// Normalize one raw row, or `None` when the row carries no property id.
pub fn normalize(row: &RawRow<'_>) -> Option<Property> {
    let property_id = first_of(row, PROPERTY_ID_FIELDS)?;

    Some(Property {
        property_id: property_id.to_string(),
        owner_name: first_of(row, OWNER_NAME_FIELDS).map(str::to_string),
        owner_address: optional(row, "OWNER_ADDRESS"),
        owner_city: optional(row, "OWNER_CITY"),
        owner_state: optional(row, "OWNER_STATE"),
        owner_zip: optional(row, "OWNER_ZIP"),
        amount_reported: amount(row, "AMOUNT_REPORTED"),
        cash_reported: optional(row, "CASH_REPORTED"),
        property_type: optional(row, "PROPERTY_TYPE"),
        holder_name: optional(row, "HOLDER_NAME"),
        holder_address: optional(row, "HOLDER_ADDRESS"),
        reported_date: optional(row, "REPORTED_DATE"),
        raw_payload: row.to_json(),
    })
}

/// First non-empty value among the header spellings for one logical field.
fn first_of<'a>(row: &RawRow<'a>, fields: &[&str]) -> Option<&'a str> {
    fields
        .iter()
        .find_map(|field| row.get(field).map(str::trim).filter(|v| !v.is_empty()))
}

fn optional(row: &RawRow<'_>, field: &str) -> Option<String> {
    row.get(field)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Decimal coercion: absent or unparsable amounts become zero rather than
/// failing the row.
fn amount(row: &RawRow<'_>, field: &str) -> f64 {
    row.get(field)
        .and_then(|v| v.trim().parse::<f64>().ok())
        .unwrap_or(0.0)
}

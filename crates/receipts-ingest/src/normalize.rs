//! Normalization from an uploaded JSON byte stream to a [`Dataset`].
//!
//! The whole upload either normalizes or fails; there is no per-record skip.

use std::collections::{BTreeMap, HashSet};

use receipts_core::{Dataset, LineItem, DERIVED_FIELDS};
use serde_json::{Map, Value};

use crate::date::parse_receipt_date;
use crate::error::IngestionError;

/// Parses `raw` as a JSON array of receipt line items and derives
/// `total_price` and `discount_pct` for every row.
///
/// # Errors
///
/// Returns [`IngestionError`] if the bytes are not valid JSON, are not an
/// array of objects, or any record lacks a required field, carries a
/// non-numeric `price`/`quantity`/`discount`, or has an unparseable `date`.
/// A row whose line total overflows `f64` is rejected as well.
pub fn normalize(raw: &[u8]) -> Result<Dataset, IngestionError> {
    let value: Value = serde_json::from_slice(raw)?;
    let Value::Array(rows) = value else {
        return Err(IngestionError::new(
            "expected a JSON array of receipt objects",
        ));
    };

    let mut columns: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut records = Vec::with_capacity(rows.len());

    for (idx, row) in rows.into_iter().enumerate() {
        let Value::Object(fields) = row else {
            return Err(IngestionError::new(format!(
                "record {idx} is not a JSON object"
            )));
        };
        for key in fields.keys() {
            if seen.insert(key.clone()) {
                columns.push(key.clone());
            }
        }
        records.push(normalize_record(idx, fields)?);
    }

    for derived in DERIVED_FIELDS {
        if seen.insert(derived.to_string()) {
            columns.push(derived.to_string());
        }
    }

    tracing::debug!(
        records = records.len(),
        columns = columns.len(),
        "normalized receipts upload"
    );

    Ok(Dataset::new(columns, records))
}

/// Discount as a percentage of the pre-discount total.
///
/// Returns `None` when `total_price + discount` is zero, where the ratio is
/// undefined.
#[must_use]
pub fn discount_percentage(total_price: f64, discount: f64) -> Option<f64> {
    let gross = total_price + discount;
    if gross == 0.0 {
        return None;
    }
    Some(discount / gross * 100.0)
}

fn normalize_record(idx: usize, mut fields: Map<String, Value>) -> Result<LineItem, IngestionError> {
    let brand = take_string(idx, &mut fields, "brand")?;
    let item = take_string(idx, &mut fields, "item")?;
    let price = take_number(idx, &mut fields, "price")?;
    let quantity = take_integer(idx, &mut fields, "quantity")?;
    let channel = take_string(idx, &mut fields, "channel")?;
    let location = take_string(idx, &mut fields, "location")?;
    let discount = take_number(idx, &mut fields, "discount")?;

    let raw_date = take_string(idx, &mut fields, "date")?;
    let date = parse_receipt_date(&raw_date).ok_or_else(|| {
        IngestionError::new(format!("record {idx}: unparseable date \"{raw_date}\""))
    })?;

    #[allow(clippy::cast_precision_loss)]
    let total_price = price * quantity as f64;
    if !(total_price + discount).is_finite() {
        return Err(IngestionError::new(format!(
            "record {idx}: line total out of range (price {price}, quantity {quantity}, discount {discount})"
        )));
    }
    let discount_pct = discount_percentage(total_price, discount);

    // Derived columns replace same-named input keys.
    for derived in DERIVED_FIELDS {
        fields.remove(derived);
    }
    let extra: BTreeMap<String, Value> = fields.into_iter().collect();

    Ok(LineItem {
        brand,
        item,
        price,
        quantity,
        channel,
        location,
        date,
        discount,
        total_price,
        discount_pct,
        extra,
    })
}

fn take(idx: usize, fields: &mut Map<String, Value>, key: &str) -> Result<Value, IngestionError> {
    match fields.remove(key) {
        Some(Value::Null) | None => Err(IngestionError::new(format!(
            "record {idx}: missing required field \"{key}\""
        ))),
        Some(value) => Ok(value),
    }
}

fn take_string(
    idx: usize,
    fields: &mut Map<String, Value>,
    key: &str,
) -> Result<String, IngestionError> {
    match take(idx, fields, key)? {
        Value::String(s) => Ok(s),
        other => Err(IngestionError::new(format!(
            "record {idx}: field \"{key}\" must be a string, got {other}"
        ))),
    }
}

fn take_number(
    idx: usize,
    fields: &mut Map<String, Value>,
    key: &str,
) -> Result<f64, IngestionError> {
    let value = take(idx, fields, key)?;
    value.as_f64().ok_or_else(|| {
        IngestionError::new(format!(
            "record {idx}: field \"{key}\" must be a number, got {value}"
        ))
    })
}

/// Reads an integer-valued number. `2.0` is accepted; `2.5` is not.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn take_integer(
    idx: usize,
    fields: &mut Map<String, Value>,
    key: &str,
) -> Result<i64, IngestionError> {
    let value = take(idx, fields, key)?;
    if let Some(n) = value.as_i64() {
        return Ok(n);
    }
    match value.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() <= i64::MAX as f64 => Ok(f as i64),
        _ => Err(IngestionError::new(format!(
            "record {idx}: field \"{key}\" must be an integer, got {value}"
        ))),
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;

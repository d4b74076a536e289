use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::Serialize;
use serde_json::Value;

/// Keys every uploaded line item must carry.
pub const REQUIRED_FIELDS: [&str; 8] = [
    "brand", "item", "price", "quantity", "channel", "location", "date", "discount",
];

/// Columns computed during normalization, appended after the input columns.
pub const DERIVED_FIELDS: [&str; 2] = ["total_price", "discount_pct"];

/// Sample upload shown to users who need to know what the dashboard accepts.
pub const EXPECTED_FORMAT: &str = r#"[
  {
    "brand": "Brand A",
    "item": "Product X",
    "price": 29.99,
    "quantity": 2,
    "channel": "D2C",
    "location": "New York",
    "date": "2023-07-15T14:30:00",
    "discount": 5.00
  },
  ...
]"#;

/// One receipt line item after normalization.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItem {
    pub brand: String,
    pub item: String,
    /// Unit price.
    pub price: f64,
    pub quantity: i64,
    /// Sales channel as written in the upload, e.g. `"D2C"` or `"Retail"`.
    pub channel: String,
    pub location: String,
    /// Purchase time. Inputs without an offset are read as UTC.
    pub date: DateTime<FixedOffset>,
    /// Absolute discount applied to the whole line.
    pub discount: f64,
    /// `price * quantity`.
    pub total_price: f64,
    /// Discount as a percentage of the pre-discount total
    /// (`total_price + discount`). `None` when that total is zero.
    pub discount_pct: Option<f64>,
    /// Any keys beyond the required ones, kept verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl LineItem {
    /// Returns the value of `column` for this record, or `None` when the
    /// record does not carry it.
    #[must_use]
    pub fn value(&self, column: &str) -> Option<Value> {
        let value = match column {
            "brand" => Value::from(self.brand.clone()),
            "item" => Value::from(self.item.clone()),
            "price" => Value::from(self.price),
            "quantity" => Value::from(self.quantity),
            "channel" => Value::from(self.channel.clone()),
            "location" => Value::from(self.location.clone()),
            "date" => Value::from(self.date.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            "discount" => Value::from(self.discount),
            "total_price" => Value::from(self.total_price),
            "discount_pct" => self.discount_pct.map_or(Value::Null, Value::from),
            other => return self.extra.get(other).cloned(),
        };
        Some(value)
    }
}

/// The normalized receipts table: rows in upload order plus the column set
/// observed across them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    columns: Vec<String>,
    records: Vec<LineItem>,
}

impl Dataset {
    #[must_use]
    pub fn new(columns: Vec<String>, records: Vec<LineItem>) -> Self {
        Self { columns, records }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Column names in first-seen order, derived columns last.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn records(&self) -> &[LineItem] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LineItem> {
        self.records.iter()
    }

    /// Cell lookup by row index and column name.
    #[must_use]
    pub fn value(&self, row: usize, column: &str) -> Option<Value> {
        self.records.get(row).and_then(|r| r.value(column))
    }
}

impl<'a> IntoIterator for &'a Dataset {
    type Item = &'a LineItem;
    type IntoIter = std::slice::Iter<'a, LineItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_item(extra: BTreeMap<String, Value>) -> LineItem {
        LineItem {
            brand: "Brand A".to_string(),
            item: "Product X".to_string(),
            price: 10.0,
            quantity: 2,
            channel: "D2C".to_string(),
            location: "New York".to_string(),
            date: DateTime::parse_from_rfc3339("2023-07-15T14:30:00+00:00").unwrap(),
            discount: 5.0,
            total_price: 20.0,
            discount_pct: Some(20.0),
            extra,
        }
    }

    #[test]
    fn value_reads_required_and_derived_columns() {
        let item = make_item(BTreeMap::new());
        assert_eq!(item.value("brand"), Some(Value::from("Brand A")));
        assert_eq!(item.value("quantity"), Some(Value::from(2)));
        assert_eq!(item.value("total_price"), Some(Value::from(20.0)));
        assert_eq!(
            item.value("date"),
            Some(Value::from("2023-07-15T14:30:00Z"))
        );
    }

    #[test]
    fn value_null_discount_pct_is_json_null() {
        let mut item = make_item(BTreeMap::new());
        item.discount_pct = None;
        assert_eq!(item.value("discount_pct"), Some(Value::Null));
    }

    #[test]
    fn value_missing_extra_column_is_none() {
        let mut extra = BTreeMap::new();
        extra.insert("store_id".to_string(), Value::from(7));
        let with = make_item(extra);
        let without = make_item(BTreeMap::new());
        let ds = Dataset::new(Vec::new(), vec![with, without]);
        assert_eq!(ds.value(0, "store_id"), Some(Value::from(7)));
        assert_eq!(ds.value(1, "store_id"), None);
        assert_eq!(ds.value(2, "brand"), None);
    }

    #[test]
    fn serialize_flattens_extra_and_emits_null_pct() {
        let mut extra = BTreeMap::new();
        extra.insert("store_id".to_string(), Value::from(7));
        let mut item = make_item(extra);
        item.discount_pct = None;
        let json = serde_json::to_value(&item).expect("serialize");
        assert_eq!(json["store_id"], 7);
        assert!(json["discount_pct"].is_null());
        assert_eq!(json["date"], "2023-07-15T14:30:00Z");
    }

    #[test]
    fn value_date_matches_serialized_date() {
        let mut item = make_item(BTreeMap::new());
        for raw in ["2023-07-15T14:30:00+00:00", "2023-07-15T09:30:00.250-05:00"] {
            item.date = DateTime::parse_from_rfc3339(raw).unwrap();
            let json = serde_json::to_value(&item).expect("serialize");
            assert_eq!(item.value("date"), Some(json["date"].clone()), "{raw}");
        }
    }

    #[test]
    fn expected_format_lists_every_required_field() {
        for field in REQUIRED_FIELDS {
            assert!(
                EXPECTED_FORMAT.contains(&format!("\"{field}\"")),
                "sample is missing {field}"
            );
        }
    }
}

//! Aggregate row normalization
//!
//! The aggregation service hands back rows as loosely typed records: one
//! label field (a period or a category) plus one or more numeric fields.
//! This module turns them into the flat shapes the forecaster and the
//! insight engine work on.
//!
//! Field order matters. The metric column is auto-detected as the *first*
//! numeric field of a row, so [`AggregateRow`] keeps its fields in an
//! explicit ordered list and JSON objects are read in document order.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Result;

/// Field name holding the period label in time-series rows
pub const DEFAULT_PERIOD_FIELD: &str = "period";

/// Labels that mark a missing dimension value upstream
const MISSING_KEYS: [&str; 2] = ["undefined", "null"];

/// Replace non-finite numbers with 0
pub fn safe_number(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

/// A single value inside an aggregate row
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Null,
}

impl FieldValue {
    /// Whether this value counts as a metric column during auto-detection
    pub fn is_number(&self) -> bool {
        matches!(self, FieldValue::Number(_))
    }

    /// Lenient numeric coercion. May return NaN; pass through
    /// [`safe_number`] before using the result.
    pub fn to_number(&self) -> f64 {
        match self {
            FieldValue::Number(x) => *x,
            FieldValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
            FieldValue::Bool(b) => {
                if *b {
                    1.0
                } else {
                    0.0
                }
            }
            FieldValue::Null => 0.0,
        }
    }

    /// Render the value as a category or period label
    pub fn to_label(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Number(x) if x.is_infinite() => {
                if *x > 0.0 {
                    "Infinity".to_string()
                } else {
                    "-Infinity".to_string()
                }
            }
            FieldValue::Number(x) => x.to_string(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Null => "null".to_string(),
        }
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => FieldValue::Null,
            serde_json::Value::Bool(b) => FieldValue::Bool(b),
            serde_json::Value::Number(n) => FieldValue::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => FieldValue::Text(s),
            other => FieldValue::Text(other.to_string()),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        FieldValue::Number(x)
    }
}

impl From<i64> for FieldValue {
    fn from(x: i64) -> Self {
        FieldValue::Number(x as f64)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Number(x) => serializer.serialize_f64(*x),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Null => serializer.serialize_unit(),
        }
    }
}

/// One record from an upstream grouping step, with fields in a fixed order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateRow {
    fields: Vec<(String, FieldValue)>,
}

impl AggregateRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style field append (see [`AggregateRow::set`])
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field. A repeated name keeps its original position.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<FieldValue>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Fields in row order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// First field whose value is numeric, skipping `exclude`
    pub fn first_numeric_field(&self, exclude: &str) -> Option<(&str, f64)> {
        self.fields().find_map(|(name, value)| match value {
            FieldValue::Number(x) if name != exclude => Some((name, *x)),
            _ => None,
        })
    }

    /// Label of a field, `"undefined"` when the field is absent
    pub fn label_of(&self, name: &str) -> String {
        self.get(name)
            .map(FieldValue::to_label)
            .unwrap_or_else(|| "undefined".to_string())
    }

    /// Coerced numeric value of a field (absent fields coerce to 0)
    pub fn number_of(&self, name: &str) -> f64 {
        safe_number(self.get(name).map(FieldValue::to_number).unwrap_or(f64::NAN))
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for AggregateRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = AggregateRow::new();
        for (k, v) in iter {
            row.set(k, v);
        }
        row
    }
}

impl Serialize for AggregateRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct AggregateRowVisitor;

impl<'de> Visitor<'de> for AggregateRowVisitor {
    type Value = AggregateRow;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an aggregate row object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Self::Value, A::Error> {
        let mut row = AggregateRow::new();
        while let Some((name, value)) = access.next_entry::<String, serde_json::Value>()? {
            row.set(name, FieldValue::from(value));
        }
        Ok(row)
    }
}

impl<'de> Deserialize<'de> for AggregateRow {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(AggregateRowVisitor)
    }
}

/// A `(period, value)` observation in caller-supplied chronological order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePoint {
    pub period: String,
    pub value: f64,
}

impl TimePoint {
    pub fn new(period: impl Into<String>, value: f64) -> Self {
        Self {
            period: period.into(),
            value: safe_number(value),
        }
    }
}

/// A category label with its aggregate value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupPoint {
    pub key: String,
    pub value: f64,
}

impl GroupPoint {
    pub fn new(key: impl Into<String>, value: f64) -> Self {
        Self {
            key: key.into(),
            value: safe_number(value),
        }
    }
}

/// Convert time-bucket rows into a series.
///
/// Each row contributes one point: the label of `period_field`, and the
/// first numeric field other than the period (0 when the row has none).
pub fn series_from_rows(rows: &[AggregateRow], period_field: &str) -> Vec<TimePoint> {
    rows.iter()
        .map(|row| {
            let value = row
                .first_numeric_field(period_field)
                .map(|(_, x)| x)
                .unwrap_or(0.0);
            TimePoint::new(row.label_of(period_field), value)
        })
        .collect()
}

/// Convert category rows into group points.
///
/// The dimension is the first field of the first row and the metric is the
/// first numeric field of that row. Both choices apply to every row. If the
/// first row has no numeric field there is no metric and nothing is returned.
pub fn groups_from_rows(rows: &[AggregateRow]) -> Vec<GroupPoint> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };
    let Some((dimension, _)) = first.fields().next() else {
        return Vec::new();
    };
    let Some((metric, _)) = first.first_numeric_field(dimension) else {
        return Vec::new();
    };

    rows.iter()
        .map(|row| GroupPoint::new(row.label_of(dimension), row.number_of(metric)))
        .filter(|g| !MISSING_KEYS.contains(&g.key.as_str()))
        .collect()
}

/// Parse a JSON array of row objects, preserving each object's key order
pub fn parse_rows_json(content: &str) -> Result<Vec<AggregateRow>> {
    Ok(serde_json::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_number() {
        assert_eq!(safe_number(3.5), 3.5);
        assert_eq!(safe_number(f64::NAN), 0.0);
        assert_eq!(safe_number(f64::INFINITY), 0.0);
        assert_eq!(safe_number(f64::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_json_preserves_field_order() {
        let rows = parse_rows_json(r#"[{"zone": "North", "visits": 4, "applications": 9}]"#)
            .unwrap();
        let names: Vec<&str> = rows[0].fields().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["zone", "visits", "applications"]);
    }

    #[test]
    fn test_series_picks_first_numeric_field() {
        let rows = parse_rows_json(
            r#"[
                {"count": 12, "period": "2024-01", "sum": 99},
                {"period": "2024-02", "label": "x", "sum": 7, "count": 3}
            ]"#,
        )
        .unwrap();
        let series = series_from_rows(&rows, DEFAULT_PERIOD_FIELD);
        assert_eq!(series[0], TimePoint::new("2024-01", 12.0));
        assert_eq!(series[1], TimePoint::new("2024-02", 7.0));
    }

    #[test]
    fn test_series_without_numeric_field_defaults_to_zero() {
        let rows = vec![AggregateRow::new().with("period", "Q1").with("note", "n/a")];
        let series = series_from_rows(&rows, DEFAULT_PERIOD_FIELD);
        assert_eq!(series, vec![TimePoint::new("Q1", 0.0)]);
    }

    #[test]
    fn test_series_numeric_period_and_missing_period() {
        let rows = vec![
            AggregateRow::new().with("period", 2020_i64).with("value", 1.5),
            AggregateRow::new().with("value", 2.0),
        ];
        let series = series_from_rows(&rows, DEFAULT_PERIOD_FIELD);
        assert_eq!(series[0].period, "2020");
        assert_eq!(series[1].period, "undefined");
    }

    #[test]
    fn test_groups_use_first_row_layout() {
        let rows = parse_rows_json(
            r#"[
                {"district": "A", "label": "x", "total": 10},
                {"total": "25", "district": "B"},
                {"district": "C"}
            ]"#,
        )
        .unwrap();
        let groups = groups_from_rows(&rows);
        assert_eq!(
            groups,
            vec![
                GroupPoint::new("A", 10.0),
                GroupPoint::new("B", 25.0),
                GroupPoint::new("C", 0.0),
            ]
        );
    }

    #[test]
    fn test_groups_drop_missing_keys() {
        let rows = parse_rows_json(
            r#"[
                {"district": "A", "total": 1},
                {"district": null, "total": 2},
                {"total": 3},
                {"district": "null", "total": 4},
                {"district": "D", "total": 5}
            ]"#,
        )
        .unwrap();
        let keys: Vec<String> = groups_from_rows(&rows).into_iter().map(|g| g.key).collect();
        assert_eq!(keys, vec!["A", "D"]);
    }

    #[test]
    fn test_groups_without_metric_are_empty() {
        let rows = vec![
            AggregateRow::new().with("district", "A").with("total", "10"),
            AggregateRow::new().with("district", "B").with("total", 4.0),
        ];
        assert!(groups_from_rows(&rows).is_empty());
        assert!(groups_from_rows(&[]).is_empty());
    }

    #[test]
    fn test_field_value_coercion() {
        assert_eq!(FieldValue::Text(" 42 ".into()).to_number(), 42.0);
        assert_eq!(FieldValue::Text(String::new()).to_number(), 0.0);
        assert!(FieldValue::Text("abc".into()).to_number().is_nan());
        assert_eq!(FieldValue::Bool(true).to_number(), 1.0);
        assert_eq!(FieldValue::Null.to_number(), 0.0);
        assert_eq!(FieldValue::Number(3.0).to_label(), "3");
        assert_eq!(FieldValue::Number(0.25).to_label(), "0.25");
        assert_eq!(FieldValue::Null.to_label(), "null");
    }

    #[test]
    fn test_set_keeps_position() {
        let mut row = AggregateRow::new().with("a", 1.0).with("b", 2.0);
        row.set("a", 5.0);
        let fields: Vec<(&str, &FieldValue)> = row.fields().collect();
        assert_eq!(fields[0], ("a", &FieldValue::Number(5.0)));
        assert_eq!(row.len(), 2);
    }

    #[test]
    fn test_parse_rows_json_rejects_non_array() {
        assert!(parse_rows_json(r#"{"period": "x"}"#).is_err());
    }
}

//! Widget payloads and the reshaping rules that produce them.
//!
//! Each planned query declares a [`Shape`]; [`Shape::reshape`] turns the raw
//! rows of a [`QueryResult`] into the matching [`Payload`]. A query that
//! matched nothing always yields a defined value: `0` for scalars and an
//! empty list or series otherwise.

use serde::Serialize;

use crate::analytics::QueryResult;

/// Maximum number of items in a label list.
pub const MAX_LIST_ITEMS: usize = 10;

/// Labels longer than this many characters are truncated.
pub const MAX_LABEL_CHARS: usize = 50;

const TRUNCATION_MARKER: &str = " ...";
const PERCENT_SUFFIX: &str = "%";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ReshapeError {
    #[error("row {row} has no column {column}")]
    MissingColumn { row: usize, column: usize },

    #[error("row {row} has non-numeric value '{value}'")]
    InvalidNumber { row: usize, value: String },
}

/// Numeric scalar value, serialized as a bare JSON number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Count(i64),
    Rate(f64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListItem {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

/// Display payload pushed to a dashboard widget.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Payload {
    Scalar {
        current: ScalarValue,
        #[serde(skip_serializing_if = "Option::is_none")]
        suffix: Option<String>,
    },
    List {
        items: Vec<ListItem>,
    },
    Series {
        points: Vec<Point>,
        moreinfo: String,
    },
}

impl Payload {
    pub fn count(value: i64) -> Self {
        Self::Scalar {
            current: ScalarValue::Count(value),
            suffix: None,
        }
    }

    pub fn percent(value: ScalarValue) -> Self {
        Self::Scalar {
            current: value,
            suffix: Some(PERCENT_SUFFIX.to_string()),
        }
    }
}

/// How a query's rows are turned into a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Integer scalar from the first cell.
    Count,
    /// Float scalar from the first cell, 2 decimals, `%` suffix.
    Percent,
    /// Label/value list from the first two columns.
    Labels,
    /// Point series, indexed by row position.
    Series,
}

impl Shape {
    /// `moreinfo` is only used by [`Shape::Series`].
    pub fn reshape(self, result: &QueryResult, moreinfo: &str) -> Result<Payload, ReshapeError> {
        match self {
            Self::Count => count(result),
            Self::Percent => percent(result),
            Self::Labels => labels(result),
            Self::Series => series(result, moreinfo),
        }
    }
}

fn count(result: &QueryResult) -> Result<Payload, ReshapeError> {
    let value = match result.first_cell() {
        Some(cell) => parse_count(0, cell)?,
        None => 0,
    };
    Ok(Payload::count(value))
}

fn percent(result: &QueryResult) -> Result<Payload, ReshapeError> {
    let value = match result.first_cell() {
        Some(cell) => ScalarValue::Rate(round2(parse_float(0, cell)?)),
        None => ScalarValue::Count(0),
    };
    Ok(Payload::percent(value))
}

fn labels(result: &QueryResult) -> Result<Payload, ReshapeError> {
    let items = result
        .rows
        .iter()
        .take(MAX_LIST_ITEMS)
        .enumerate()
        .map(|(i, row)| {
            Ok(ListItem {
                label: truncate_label(cell(row, i, 0)?),
                value: cell(row, i, 1)?.to_string(),
            })
        })
        .collect::<Result<Vec<_>, ReshapeError>>()?;
    Ok(Payload::List { items })
}

fn series(result: &QueryResult, moreinfo: &str) -> Result<Payload, ReshapeError> {
    let points = result
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let last = row.last().ok_or(ReshapeError::MissingColumn { row: i, column: 0 })?;
            Ok(Point {
                x: i as i64,
                y: parse_count(i, last)?,
            })
        })
        .collect::<Result<Vec<_>, ReshapeError>>()?;
    Ok(Payload::Series {
        points,
        moreinfo: moreinfo.to_string(),
    })
}

fn cell(row: &[String], index: usize, column: usize) -> Result<&str, ReshapeError> {
    row.get(column)
        .map(String::as_str)
        .ok_or(ReshapeError::MissingColumn { row: index, column })
}

/// Integer cell; decimal values are rounded.
fn parse_count(row: usize, value: &str) -> Result<i64, ReshapeError> {
    let value = value.trim();
    if let Ok(n) = value.parse::<i64>() {
        return Ok(n);
    }
    parse_float(row, value).map(|f| f.round() as i64)
}

fn parse_float(row: usize, value: &str) -> Result<f64, ReshapeError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .ok_or_else(|| ReshapeError::InvalidNumber {
            row,
            value: value.to_string(),
        })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn truncate_label(label: &str) -> String {
    match label.char_indices().nth(MAX_LABEL_CHARS) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &label[..cut]),
        None => label.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    fn to_json(payload: &Payload) -> serde_json::Value {
        serde_json::to_value(payload).unwrap()
    }

    #[rstest]
    #[case(Shape::Count, json!({ "current": 0 }))]
    #[case(Shape::Percent, json!({ "current": 0, "suffix": "%" }))]
    #[case(Shape::Labels, json!({ "items": [] }))]
    #[case(Shape::Series, json!({ "points": [], "moreinfo": "Chart: x" }))]
    fn test_empty_result_defaults(#[case] shape: Shape, #[case] expected: serde_json::Value) {
        let payload = shape.reshape(&QueryResult::default(), "Chart: x").unwrap();
        assert_eq!(to_json(&payload), expected);
    }

    #[test]
    fn test_count_from_first_cell() {
        let payload = Shape::Count
            .reshape(&QueryResult::from_rows([["5000"]]), "")
            .unwrap();
        assert_eq!(payload, Payload::count(5000));
        assert_eq!(to_json(&payload), json!({ "current": 5000 }));
    }

    #[test]
    fn test_count_rounds_decimal_cell() {
        let payload = Shape::Count
            .reshape(&QueryResult::from_rows([["41.6"]]), "")
            .unwrap();
        assert_eq!(payload, Payload::count(42));
    }

    #[rstest]
    #[case("45.6789", 45.68)]
    #[case("12", 12.0)]
    #[case("0.004", 0.0)]
    fn test_percent_rounds_to_two_decimals(#[case] cell: &str, #[case] expected: f64) {
        let payload = Shape::Percent
            .reshape(&QueryResult::from_rows([[cell]]), "")
            .unwrap();
        assert_eq!(payload, Payload::percent(ScalarValue::Rate(expected)));
    }

    #[test]
    fn test_percent_serializes_with_suffix() {
        let payload = Shape::Percent
            .reshape(&QueryResult::from_rows([["45.6789"]]), "")
            .unwrap();
        assert_eq!(to_json(&payload), json!({ "current": 45.68, "suffix": "%" }));
    }

    #[test]
    fn test_labels_keep_order_and_values_verbatim() {
        let result = QueryResult::from_rows([["Organic Search", "1200"], ["Direct", "900"]]);
        let payload = Shape::Labels.reshape(&result, "").unwrap();
        assert_eq!(
            to_json(&payload),
            json!({
                "items": [
                    { "label": "Organic Search", "value": "1200" },
                    { "label": "Direct", "value": "900" }
                ]
            })
        );
    }

    #[test]
    fn test_labels_capped_at_ten_items() {
        let rows: Vec<Vec<String>> = (0..15)
            .map(|i| vec![format!("source-{i}"), (100 - i).to_string()])
            .collect();
        let payload = Shape::Labels
            .reshape(&QueryResult::from_rows(rows), "")
            .unwrap();

        let Payload::List { items } = payload else {
            panic!("expected a list payload");
        };
        assert_eq!(items.len(), MAX_LIST_ITEMS);
        assert_eq!(items[0].label, "source-0");
        assert_eq!(items[9].label, "source-9");
    }

    #[rstest]
    #[case(50, false)]
    #[case(49, false)]
    #[case(51, true)]
    #[case(120, true)]
    fn test_label_truncation(#[case] len: usize, #[case] truncated: bool) {
        let label = "a".repeat(len);
        let result = truncate_label(&label);
        if truncated {
            assert_eq!(result, format!("{} ...", "a".repeat(50)));
        } else {
            assert_eq!(result, label);
        }
    }

    #[test]
    fn test_label_truncation_counts_characters() {
        let label = "é".repeat(60);
        assert_eq!(truncate_label(&label), format!("{} ...", "é".repeat(50)));
    }

    #[test]
    fn test_series_uses_row_index_for_x() {
        let result = QueryResult::from_rows([["20240101", "10"], ["20240102", "15"]]);
        let payload = Shape::Series
            .reshape(&result, "Chart: 1/1/2024 - 1/31/2024")
            .unwrap();
        assert_eq!(
            to_json(&payload),
            json!({
                "points": [{ "x": 0, "y": 10 }, { "x": 1, "y": 15 }],
                "moreinfo": "Chart: 1/1/2024 - 1/31/2024"
            })
        );
    }

    #[test]
    fn test_series_invalid_cell_is_error() {
        let result = QueryResult::from_rows([["20240101", "10"], ["20240102", "n/a"]]);
        let err = Shape::Series.reshape(&result, "").unwrap_err();
        assert_eq!(
            err,
            ReshapeError::InvalidNumber {
                row: 1,
                value: "n/a".into()
            }
        );
    }

    #[test]
    fn test_labels_missing_value_column() {
        let result = QueryResult::from_rows([vec!["Direct"]]);
        let err = Shape::Labels.reshape(&result, "").unwrap_err();
        assert_eq!(err, ReshapeError::MissingColumn { row: 0, column: 1 });
    }

    #[test]
    fn test_count_invalid_cell_is_error() {
        let err = Shape::Count
            .reshape(&QueryResult::from_rows([["lots"]]), "")
            .unwrap_err();
        assert!(matches!(err, ReshapeError::InvalidNumber { row: 0, .. }));
    }
}

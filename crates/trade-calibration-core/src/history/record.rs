use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::coerce::{parse_entry_date, parse_optional_money, SymbolSet};
use crate::types::Money;

pub const DATE_IN_COLUMN: &str = "DATE IN";
pub const INVESTMENT_COLUMN: &str = "INVESTMENT (EURO)";
pub const RESULT_COLUMN: &str = "RESULT";

// ---------------------------------------------------------------------------
// Raw rows
// ---------------------------------------------------------------------------

/// One row of a trade log as decoded from CSV, JSON or YAML. Any scalar is
/// accepted and kept as text; other columns are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTradeRow {
    #[serde(rename = "DATE IN", default, deserialize_with = "lenient_text")]
    pub date_in: Option<String>,
    #[serde(rename = "INVESTMENT (EURO)", default, deserialize_with = "lenient_text")]
    pub investment: Option<String>,
    #[serde(rename = "RESULT", default, deserialize_with = "lenient_text")]
    pub result: Option<String>,
}

impl RawTradeRow {
    /// Build a row from `(column, value)` pairs, e.g. a CSV header zipped
    /// with a record. Column names are matched after trimming.
    pub fn from_fields<'a, I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut row = RawTradeRow::default();
        for (column, value) in fields {
            let value = Some(value.to_string());
            match column.trim() {
                DATE_IN_COLUMN => row.date_in = value,
                INVESTMENT_COLUMN => row.investment = value,
                RESULT_COLUMN => row.result = value,
                _ => {}
            }
        }
        row
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Null => None,
        Value::String(s) => Some(s),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        other => Some(other.to_string()),
    }))
}

// ---------------------------------------------------------------------------
// Typed records
// ---------------------------------------------------------------------------

/// Entry date of a trade after coercion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum EntryDate {
    /// Empty or absent; the trade is skipped entirely.
    Missing,
    /// Present but not a calendar date; the trade counts, its month does not.
    Unparseable(String),
    Date(NaiveDate),
}

impl EntryDate {
    pub fn from_raw(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            None | Some("") => EntryDate::Missing,
            Some(text) => match parse_entry_date(text) {
                Some(d) => EntryDate::Date(d),
                None => EntryDate::Unparseable(text.to_string()),
            },
        }
    }

    pub fn is_admitted(&self) -> bool {
        !matches!(self, EntryDate::Missing)
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            EntryDate::Date(d) => Some(*d),
            _ => None,
        }
    }
}

/// A trade with its three calibration fields coerced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeRecord {
    pub date_in: EntryDate,
    pub investment: Money,
    /// Signed profit/loss; absent or unparseable is zero
    pub result: Money,
}

impl TradeRecord {
    pub fn from_raw(row: &RawTradeRow, symbols: &SymbolSet) -> Self {
        TradeRecord {
            date_in: EntryDate::from_raw(row.date_in.as_deref()),
            investment: parse_optional_money(row.investment.as_deref(), symbols),
            result: parse_optional_money(row.result.as_deref(), symbols),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    #[test]
    fn test_deserialize_mixed_scalars() {
        let rows: Vec<RawTradeRow> = serde_json::from_str(
            r#"[
                {"DATE IN": "2024-01-01", "INVESTMENT (EURO)": 100, "RESULT": "50"},
                {"DATE IN": "bad-date", "INVESTMENT (EURO)": "foo", "RESULT": null},
                {"ASSET": "DAX", "RESULT": true}
            ]"#,
        )
        .unwrap();

        assert_eq!(rows[0].date_in.as_deref(), Some("2024-01-01"));
        assert_eq!(rows[0].investment.as_deref(), Some("100"));
        assert_eq!(rows[1].result, None);
        assert_eq!(rows[2].date_in, None);
        assert_eq!(rows[2].result.as_deref(), Some("true"));
    }

    #[test]
    fn test_from_fields_matches_trimmed_columns() {
        let row = RawTradeRow::from_fields([
            (" DATE IN ", "2024-02-03"),
            ("ASSET", "EURUSD"),
            ("INVESTMENT (EURO)", "€1,000.00"),
            ("RESULT", "-€12.50"),
        ]);
        assert_eq!(row.date_in.as_deref(), Some("2024-02-03"));
        assert_eq!(row.investment.as_deref(), Some("€1,000.00"));
        assert_eq!(row.result.as_deref(), Some("-€12.50"));
    }

    #[test]
    fn test_entry_date_states() {
        assert_eq!(EntryDate::from_raw(None), EntryDate::Missing);
        assert_eq!(EntryDate::from_raw(Some("   ")), EntryDate::Missing);
        assert_eq!(
            EntryDate::from_raw(Some("bad-date")),
            EntryDate::Unparseable("bad-date".into())
        );
        let d = EntryDate::from_raw(Some("2024-01-01"));
        assert!(d.is_admitted());
        assert_eq!(d.date(), NaiveDate::from_ymd_opt(2024, 1, 1));
        assert!(EntryDate::Unparseable("x".into()).is_admitted());
        assert!(!EntryDate::Missing.is_admitted());
    }

    #[test]
    fn test_trade_record_coercion() {
        let row = RawTradeRow {
            date_in: Some("bad-date".into()),
            investment: Some("foo".into()),
            result: None,
        };
        let record = TradeRecord::from_raw(&row, &SymbolSet::default());
        assert!(record.date_in.is_admitted());
        assert_eq!(record.date_in.date(), None);
        assert_eq!(record.investment, Decimal::ZERO);
        assert_eq!(record.result, Decimal::ZERO);

        let row = RawTradeRow {
            date_in: Some("2024-01-01".into()),
            investment: Some("€1,234.56".into()),
            result: Some("-$20".into()),
        };
        let record = TradeRecord::from_raw(&row, &SymbolSet::default());
        assert_eq!(record.investment, dec!(1234.56));
        assert_eq!(record.result, dec!(-20));
    }

    #[test]
    fn test_entry_date_serializes_with_status() {
        let json = serde_json::to_value(EntryDate::from_raw(Some("2024-01-01"))).unwrap();
        assert_eq!(json["status"], "date");
        assert_eq!(json["value"], "2024-01-01");
        let json = serde_json::to_value(EntryDate::Missing).unwrap();
        assert_eq!(json["status"], "missing");
    }
}

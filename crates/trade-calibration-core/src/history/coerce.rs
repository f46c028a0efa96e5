use chrono::{DateTime, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::warn;

use crate::types::{Currency, Money};
use crate::{CalibrationError, CalibrationResult};

// ---------------------------------------------------------------------------
// Currency symbols
// ---------------------------------------------------------------------------

/// Currency symbols removed from monetary text before it is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolSet {
    symbols: Vec<String>,
}

impl SymbolSet {
    /// Build a set from arbitrary symbol strings. Duplicates are dropped and
    /// longer symbols are stripped first, so "US$" goes before "$".
    pub fn new<I, S>(symbols: I) -> CalibrationResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for symbol in symbols {
            let symbol = symbol.into();
            if symbol.trim().is_empty() {
                return Err(CalibrationError::InvalidInput {
                    field: "currency_symbols".into(),
                    reason: "Currency symbols must be non-empty".into(),
                });
            }
            if !out.contains(&symbol) {
                out.push(symbol);
            }
        }
        out.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
        Ok(Self { symbols: out })
    }

    pub fn from_currencies(currencies: &[Currency]) -> CalibrationResult<Self> {
        Self::new(currencies.iter().map(|c| c.symbol().to_string()))
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Remove every occurrence of every symbol.
    pub fn strip(&self, text: &str) -> String {
        let mut out = text.to_string();
        for symbol in &self.symbols {
            if out.contains(symbol.as_str()) {
                out = out.replace(symbol.as_str(), "");
            }
        }
        out
    }
}

impl Default for SymbolSet {
    /// Euro, dollar, pound and yen.
    fn default() -> Self {
        let symbols = [Currency::EUR, Currency::USD, Currency::GBP, Currency::JPY]
            .iter()
            .map(|c| c.symbol().to_string())
            .collect();
        Self { symbols }
    }
}

// ---------------------------------------------------------------------------
// Money
// ---------------------------------------------------------------------------

/// Parse free-form monetary text ("€1,234.56", "-$80", "12,5") into Money.
///
/// Symbols are stripped, thousands-separator commas removed and the first
/// remaining comma read as the decimal separator. The leading numeric prefix
/// is then parsed; anything unparseable is zero. Amounts beyond the Decimal
/// range saturate to `Decimal::MAX` / `Decimal::MIN`.
pub fn parse_money(raw: &str, symbols: &SymbolSet) -> Money {
    let stripped = symbols.strip(raw);
    let normalized = normalize_separators(&stripped);
    match leading_decimal(&normalized) {
        Some(v) if !v.is_zero() => v,
        _ => Decimal::ZERO,
    }
}

/// Absent fields parse as zero.
pub fn parse_optional_money(raw: Option<&str>, symbols: &SymbolSet) -> Money {
    raw.map_or(Decimal::ZERO, |text| parse_money(text, symbols))
}

fn normalize_separators(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut decimal_seen = false;
    for (i, &c) in chars.iter().enumerate() {
        if c != ',' {
            out.push(c);
        } else if is_thousands_comma(&chars, i) {
            continue;
        } else if !decimal_seen {
            out.push('.');
            decimal_seen = true;
        } else {
            out.push(c);
        }
    }
    out
}

/// A digit, the comma, exactly three digits, then no further digit.
fn is_thousands_comma(chars: &[char], i: usize) -> bool {
    let preceded = i > 0 && chars[i - 1].is_ascii_digit();
    let group = chars
        .get(i + 1..i + 4)
        .is_some_and(|g| g.iter().all(|c| c.is_ascii_digit()));
    let closed = chars.get(i + 4).map_or(true, |c| !c.is_ascii_digit());
    preceded && group && closed
}

/// Longest prefix of the form `[+-]digits[.digits][e[+-]digits]`.
fn leading_decimal(text: &str) -> Option<Decimal> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut i = 0;
    let mut literal = String::new();

    if let Some(&sign) = bytes.first() {
        if sign == b'+' || sign == b'-' {
            if sign == b'-' {
                literal.push('-');
            }
            i += 1;
        }
    }

    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_part = &s[int_start..i];

    let mut frac_part = "";
    if i < bytes.len() && bytes[i] == b'.' {
        let frac_start = i + 1;
        let mut j = frac_start;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        frac_part = &s[frac_start..j];
        i = j;
    }

    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    literal.push_str(if int_part.is_empty() { "0" } else { int_part });
    if !frac_part.is_empty() {
        literal.push('.');
        literal.push_str(frac_part);
    }

    let zero_mantissa = literal.chars().all(|c| matches!(c, '-' | '0' | '.'));
    let mut negative_exponent = false;

    let parsed = if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            negative_exponent = bytes[j] == b'-';
            j += 1;
        }
        let exp_digits = j;
        while j < bytes.len() && bytes[j].is_ascii_digit() {
            j += 1;
        }
        if j > exp_digits {
            literal.push('e');
            literal.push_str(&s[i + 1..j]);
            Decimal::from_scientific(&literal)
        } else {
            negative_exponent = false;
            Decimal::from_str(&literal)
        }
    } else {
        Decimal::from_str(&literal)
    };

    match parsed {
        Ok(v) => Some(v),
        // too small to represent
        Err(_) if zero_mantissa || negative_exponent => Some(Decimal::ZERO),
        Err(_) => {
            warn!(amount = %literal, "amount exceeds Decimal range; saturating");
            Some(if literal.starts_with('-') {
                Decimal::MIN
            } else {
                Decimal::MAX
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse an entry date. Date-times keep the calendar date as written; the
/// offset is never applied.
pub fn parse_entry_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    DATE_FORMATS
        .iter()
        .find_map(|f| NaiveDate::parse_from_str(text, f).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
                .map(|dt| dt.date())
        })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn money(raw: &str) -> Money {
        parse_money(raw, &SymbolSet::default())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_euro_with_thousands_separator() {
        assert_eq!(money("€1,234.56"), dec!(1234.56));
    }

    #[test]
    fn test_dollar_and_negative_amounts() {
        assert_eq!(money("$850"), dec!(850));
        assert_eq!(money("-$80.25"), dec!(-80.25));
        assert_eq!(money("$-80.25"), dec!(-80.25));
        assert_eq!(money("-€1,070.00"), dec!(-1070));
    }

    #[test]
    fn test_multiple_thousands_groups() {
        assert_eq!(money("€1,234,567.89"), dec!(1234567.89));
        assert_eq!(money("$12,000"), dec!(12000));
    }

    #[test]
    fn test_decimal_comma() {
        assert_eq!(money("12,5"), dec!(12.5));
        assert_eq!(money("-45,20 €"), dec!(-45.20));
        assert_eq!(money("1234,56"), dec!(1234.56));
    }

    #[test]
    fn test_only_first_remaining_comma_is_decimal() {
        // second comma stops the numeric prefix
        assert_eq!(money("1,5,7"), dec!(1.5));
    }

    #[test]
    fn test_leading_prefix_only() {
        assert_eq!(money("12abc"), dec!(12));
        assert_eq!(money("  42.5 EUR"), dec!(42.5));
        assert_eq!(money(".5"), dec!(0.5));
        assert_eq!(money("7."), dec!(7));
        assert_eq!(money("+15"), dec!(15));
    }

    #[test]
    fn test_exponent_notation() {
        assert_eq!(money("1.5e3"), dec!(1500));
        assert_eq!(money("2E-2"), dec!(0.02));
        // dangling exponent marker is not part of the number
        assert_eq!(money("3e"), dec!(3));
    }

    #[test]
    fn test_out_of_range_amounts_saturate() {
        assert_eq!(money("5e50"), Decimal::MAX);
        assert_eq!(money("-€1e40"), Decimal::MIN);
        assert_eq!(money("12345678901234567890123456789012"), Decimal::MAX);
        assert_eq!(money("-12,345,678,901,234,567,890,123,456,789,012"), Decimal::MIN);
    }

    #[test]
    fn test_unrepresentably_small_amounts_are_zero() {
        assert_eq!(money("1e-50"), Decimal::ZERO);
        assert_eq!(money("0e50"), Decimal::ZERO);
    }

    #[test]
    fn test_garbage_is_zero() {
        assert_eq!(money("foo"), Decimal::ZERO);
        assert_eq!(money(""), Decimal::ZERO);
        assert_eq!(money("null"), Decimal::ZERO);
        assert_eq!(money("-"), Decimal::ZERO);
        assert_eq!(money("€"), Decimal::ZERO);
    }

    #[test]
    fn test_negative_zero_is_plain_zero() {
        let v = money("-0.00");
        assert_eq!(v, Decimal::ZERO);
        assert!(!v.is_sign_negative());
    }

    #[test]
    fn test_absent_money_is_zero() {
        assert_eq!(
            parse_optional_money(None, &SymbolSet::default()),
            Decimal::ZERO
        );
        assert_eq!(
            parse_optional_money(Some("€10"), &SymbolSet::default()),
            dec!(10)
        );
    }

    #[test]
    fn test_custom_symbol_set() {
        let symbols = SymbolSet::new(["CHF", "Fr."]).unwrap();
        assert_eq!(parse_money("CHF 1,200.50", &symbols), dec!(1200.50));
        // the euro sign is not configured, so the prefix is not numeric
        assert_eq!(parse_money("€10", &symbols), Decimal::ZERO);
    }

    #[test]
    fn test_longer_symbols_stripped_first() {
        let symbols = SymbolSet::new(["$", "US$"]).unwrap();
        assert_eq!(symbols.symbols()[0], "US$");
        assert_eq!(parse_money("US$99", &symbols), dec!(99));
    }

    #[test]
    fn test_symbol_set_rejects_empty_symbol() {
        assert!(SymbolSet::new(["€", " "]).is_err());
    }

    #[test]
    fn test_symbol_set_from_currencies() {
        let symbols = SymbolSet::from_currencies(&[Currency::GBP, Currency::GBP]).unwrap();
        assert_eq!(symbols.symbols(), &["£".to_string()]);
        assert_eq!(parse_money("£3,000", &symbols), dec!(3000));
    }

    #[test]
    fn test_parse_iso_and_slash_dates() {
        assert_eq!(parse_entry_date("2024-01-15"), Some(date(2024, 1, 15)));
        assert_eq!(parse_entry_date(" 2024/03/02 "), Some(date(2024, 3, 2)));
        assert_eq!(parse_entry_date("03/02/2024"), Some(date(2024, 3, 2)));
    }

    #[test]
    fn test_parse_named_month_dates() {
        assert_eq!(parse_entry_date("Jan 5, 2024"), Some(date(2024, 1, 5)));
        assert_eq!(parse_entry_date("5 March 2024"), Some(date(2024, 3, 5)));
    }

    #[test]
    fn test_parse_datetimes_keep_written_date() {
        assert_eq!(
            parse_entry_date("2024-02-01T00:30:00+02:00"),
            Some(date(2024, 2, 1))
        );
        assert_eq!(
            parse_entry_date("2023-12-31T23:59:59"),
            Some(date(2023, 12, 31))
        );
        assert_eq!(
            parse_entry_date("2024-06-10 09:15"),
            Some(date(2024, 6, 10))
        );
    }

    #[test]
    fn test_unparseable_dates() {
        assert_eq!(parse_entry_date("bad-date"), None);
        assert_eq!(parse_entry_date(""), None);
        assert_eq!(parse_entry_date("2024-02-30"), None);
        assert_eq!(parse_entry_date("13/01/2024"), None);
    }
}

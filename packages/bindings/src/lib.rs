use napi::Result as NapiResult;
use napi_derive::napi;

use trade_calibration_core::history::aggregate::{self, HistoricalPerformanceInput};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Accepts either `{ "trades": [...], "currency_symbols": [...] }` or a bare
/// array of trade rows.
fn parse_trade_log(input_json: &str) -> NapiResult<HistoricalPerformanceInput> {
    let value: serde_json::Value = serde_json::from_str(input_json).map_err(to_napi_error)?;
    if value.is_array() {
        let trades = serde_json::from_value(value).map_err(to_napi_error)?;
        return Ok(HistoricalPerformanceInput {
            trades,
            currency_symbols: None,
        });
    }
    serde_json::from_value(value).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Historical performance
// ---------------------------------------------------------------------------

/// Returns the calibration envelope as JSON. Decimal metrics are encoded as
/// strings (`"historicalWinRate": "0.6969…"`) to keep full precision; parse
/// them with `Number()` where a JS number is needed. `years` stays numeric.
#[napi]
pub fn compute_historical_performance(input_json: String) -> NapiResult<String> {
    let input = parse_trade_log(&input_json)?;
    let output = aggregate::compute_historical_performance(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Returns the coerced records as JSON; `investment` and `result` are decimal
/// strings.
#[napi]
pub fn normalize_trade_records(input_json: String) -> NapiResult<String> {
    let input = parse_trade_log(&input_json)?;
    let records = aggregate::normalize_trade_log(&input).map_err(to_napi_error)?;
    serde_json::to_string(&records).map_err(to_napi_error)
}

use clap::Args;
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;

use trade_calibration_core::history::aggregate::{self, HistoricalPerformanceInput};
use trade_calibration_core::history::record::RawTradeRow;

use crate::input;
use crate::input::stdin::StdinPayload;

/// Arguments for historical calibration
#[derive(Args)]
pub struct CalibrateArgs {
    /// Path to a trade log (.csv, .json, .yaml or .yml)
    #[arg(long)]
    pub input: Option<String>,

    /// Comma-separated currency symbols to strip (default: "€,$,£,¥")
    #[arg(long, value_delimiter = ',')]
    pub symbols: Option<Vec<String>>,
}

/// Arguments for row normalization
#[derive(Args)]
pub struct NormalizeArgs {
    /// Path to a trade log (.csv, .json, .yaml or .yml)
    #[arg(long)]
    pub input: Option<String>,

    /// Comma-separated currency symbols to strip (default: "€,$,£,¥")
    #[arg(long, value_delimiter = ',')]
    pub symbols: Option<Vec<String>>,
}

/// JSON/YAML logs are either a bare list of rows or a full input object.
#[derive(Deserialize)]
#[serde(untagged)]
enum TradeLog {
    Full(HistoricalPerformanceInput),
    Rows(Vec<RawTradeRow>),
}

impl From<TradeLog> for HistoricalPerformanceInput {
    fn from(log: TradeLog) -> Self {
        match log {
            TradeLog::Full(input) => input,
            TradeLog::Rows(trades) => HistoricalPerformanceInput {
                trades,
                currency_symbols: None,
            },
        }
    }
}

fn load_trade_log(
    path: Option<&str>,
    symbols: Option<Vec<String>>,
) -> Result<HistoricalPerformanceInput, Box<dyn std::error::Error>> {
    let mut log: HistoricalPerformanceInput = if let Some(path) = path {
        let extension = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match extension.as_deref() {
            Some("csv") => HistoricalPerformanceInput {
                trades: input::file::read_csv_rows(path)?,
                currency_symbols: None,
            },
            Some("yaml") | Some("yml") => input::file::read_yaml::<TradeLog>(path)?.into(),
            Some("json") => input::file::read_json::<TradeLog>(path)?.into(),
            _ => {
                return Err(format!(
                    "Unsupported trade log '{}': expected .csv, .json, .yaml or .yml",
                    path
                )
                .into())
            }
        }
    } else if let Some(payload) = input::stdin::read_stdin()? {
        match payload {
            StdinPayload::Json(data) => serde_json::from_value::<TradeLog>(data)
                .map_err(|_| {
                    "stdin must hold a JSON list of trade rows or an object with \"trades\""
                })?
                .into(),
            StdinPayload::Csv(text) => HistoricalPerformanceInput {
                trades: input::file::parse_csv_rows(text.as_bytes(), "stdin")?,
                currency_symbols: None,
            },
        }
    } else {
        return Err("--input <trades.csv|json|yaml> or stdin required for calibration".into());
    };

    if symbols.is_some() {
        log.currency_symbols = symbols;
    }
    Ok(log)
}

pub fn run_calibrate(args: CalibrateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let log = load_trade_log(args.input.as_deref(), args.symbols)?;
    let result = aggregate::compute_historical_performance(&log)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_normalize(args: NormalizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let log = load_trade_log(args.input.as_deref(), args.symbols)?;
    let records = aggregate::normalize_trade_log(&log)?;
    Ok(serde_json::to_value(records)?)
}

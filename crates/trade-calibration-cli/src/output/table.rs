use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::{Map, Value};
use std::str::FromStr;
use tabled::{builder::Builder, Table};

use super::{flatten_object, plain_value};

/// Human labels for calibration fields.
fn label(key: &str) -> &str {
    match key {
        "success" => "Success",
        "historicalWinRate" => "Win rate",
        "historicalAvgInvestmentPerOp" => "Avg investment / op",
        "historicalAvgTradesPerMonth" => "Avg trades / month",
        "suggestedRoiTargetPercent" => "Suggested ROI target",
        "suggestedLossPerFailedOpPercent" => "Suggested loss / failed op",
        "years" => "Years",
        other => other,
    }
}

/// Ratio fields are shown as percentages, money and counts to 2 dp.
fn display(key: &str, value: &Value) -> String {
    let as_decimal = value.as_str().and_then(|s| Decimal::from_str(s).ok());
    match (key, as_decimal) {
        (
            "historicalWinRate" | "suggestedRoiTargetPercent" | "suggestedLossPerFailedOpPercent",
            Some(d),
        ) => format!("{:.2}%", round2(d * Decimal::ONE_HUNDRED)),
        ("historicalAvgInvestmentPerOp" | "historicalAvgTradesPerMonth", Some(d)) => {
            format!("{:.2}", round2(d))
        }
        _ => plain_value(value),
    }
}

fn round2(d: Decimal) -> Decimal {
    d.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => match map.get("result") {
            Some(Value::Object(result)) => print_envelope(result, map),
            _ => print_fields(map),
        },
        Value::Array(rows) => print_rows(rows),
        _ => println!("{}", value),
    }
}

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Metric", "Value"]);
    for (key, val) in map {
        builder.push_record([label(key).to_string(), display(key, val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_envelope(result: &Map<String, Value>, envelope: &Map<String, Value>) {
    print_fields(result);

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn print_rows(rows: &[Value]) {
    if rows.is_empty() {
        println!("(no trades)");
        return;
    }

    let flat: Vec<Vec<(String, Value)>> = rows
        .iter()
        .filter_map(|row| row.as_object().map(flatten_object))
        .collect();
    let mut headers: Vec<String> = Vec::new();
    for row in &flat {
        for (key, _) in row {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }

    let mut builder = Builder::default();
    let mut header_row = vec!["#".to_string()];
    header_row.extend(headers.iter().cloned());
    builder.push_record(header_row);

    for (idx, row) in flat.iter().enumerate() {
        let mut record = vec![(idx + 1).to_string()];
        record.extend(headers.iter().map(|h| {
            row.iter()
                .find(|(k, _)| k == h)
                .map(|(_, v)| plain_value(v))
                .unwrap_or_default()
        }));
        builder.push_record(record);
    }
    println!("{}", Table::from(builder));
}

use serde_json::Value;

use super::plain_value;

/// Calibration outputs in order of interest.
const PRIORITY_KEYS: [&str; 5] = [
    "suggestedRoiTargetPercent",
    "suggestedLossPerFailedOpPercent",
    "historicalWinRate",
    "historicalAvgInvestmentPerOp",
    "historicalAvgTradesPerMonth",
];

/// Print one `key: value` line per calibration output, or the bare value
/// for anything else.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    match result_obj {
        Value::Object(map) => {
            let mut printed = false;
            for key in PRIORITY_KEYS {
                if let Some(val) = map.get(key).filter(|v| !v.is_null()) {
                    println!("{}: {}", key, plain_value(val));
                    printed = true;
                }
            }
            if !printed {
                if let Some((key, val)) = map.iter().next() {
                    println!("{}: {}", key, plain_value(val));
                }
            }
        }
        // normalize output: just count the rows
        Value::Array(rows) => println!("{}", rows.len()),
        other => println!("{}", plain_value(other)),
    }
}

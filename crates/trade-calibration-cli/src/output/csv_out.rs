use serde_json::Value;
use std::io;

use super::{flatten_object, plain_value};

/// Write output as CSV to stdout.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match value {
        Value::Object(map) => {
            // Calibration envelope: two-column field/value listing of the result
            let fields = match map.get("result") {
                Some(Value::Object(result)) => result,
                _ => map,
            };
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in fields {
                let _ = wtr.write_record([key.as_str(), &plain_value(val)]);
            }
        }
        Value::Array(rows) => write_rows(&mut wtr, rows),
        _ => {
            let _ = wtr.write_record([&plain_value(value)]);
        }
    }

    let _ = wtr.flush();
}

/// One line per normalized trade, nested fields flattened into columns.
fn write_rows(wtr: &mut csv::Writer<io::StdoutLock<'_>>, rows: &[Value]) {
    let flat: Vec<Vec<(String, Value)>> = rows
        .iter()
        .filter_map(|row| row.as_object().map(flatten_object))
        .collect();

    // status-only dates ("missing") have no value column, so collect every key
    let mut headers: Vec<String> = Vec::new();
    for row in &flat {
        for (key, _) in row {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
    }
    if headers.is_empty() {
        return;
    }

    let _ = wtr.write_record(&headers);
    for row in &flat {
        let record: Vec<String> = headers
            .iter()
            .map(|h| {
                row.iter()
                    .find(|(k, _)| k == h)
                    .map(|(_, v)| plain_value(v))
                    .unwrap_or_default()
            })
            .collect();
        let _ = wtr.write_record(&record);
    }
}

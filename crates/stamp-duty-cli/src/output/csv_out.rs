use serde_json::Value;
use std::io;

use super::fee_rows;

/// Write output as CSV to stdout. A calculation becomes one row per fee.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    if let Some(rows) = fee_rows(value) {
        let _ = wtr.write_record(["ordinal", "label", "amount_inr"]);
        for row in rows {
            let _ = wtr.write_record([
                cell(&row["ordinal"]),
                cell(&row["label"]),
                cell(&row["amount_inr"]),
            ]);
        }
    } else {
        match value {
            Value::Array(arr) => write_array_csv(&mut wtr, arr),
            Value::Object(map) => {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    let _ = wtr.write_record([key.as_str(), &cell(val)]);
                }
            }
            _ => {
                let _ = wtr.write_record([&cell(value)]);
            }
        }
    }

    let _ = wtr.flush();
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    let Some(first) = arr.first() else {
        return;
    };

    if let Value::Object(first) = first {
        let headers: Vec<&str> = first.keys().map(String::as_str).collect();
        let _ = wtr.write_record(&headers);
        for map in arr.iter().filter_map(Value::as_object) {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(*h).map(cell).unwrap_or_default())
                .collect();
            let _ = wtr.write_record(&row);
        }
    } else {
        let _ = wtr.write_record(["jurisdiction"]);
        for item in arr {
            let _ = wtr.write_record([&cell(item)]);
        }
    }
}

fn cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

use serde_json::{Map, Value};
use tabled::{builder::Builder, settings::Style, Table};

use super::{fee_rows, format_inr};

/// Format output as a table using the tabled crate.
pub fn print_table(value: &Value) {
    if let Some(rows) = fee_rows(value) {
        print_fee_table(rows, value);
        return;
    }
    match value {
        Value::Array(arr) => print_array_table(arr),
        Value::Object(map) => print_flat_object(map),
        _ => println!("{value}"),
    }
}

fn print_fee_table(rows: &[Value], envelope: &Value) {
    let result = &envelope["result"];

    if let Some(Value::Object(inputs)) = result.get("inputs") {
        print_flat_object(inputs);
        println!();
    }

    let mut builder = Builder::default();
    builder.push_record(["#", "Fee", "Amount (INR)"]);
    for row in rows {
        builder.push_record([
            format_value(&row["ordinal"]),
            format_value(&row["label"]),
            format_inr(&format_value(&row["amount_inr"])),
        ]);
    }
    builder.push_record([
        String::new(),
        "Grand Total".to_string(),
        format_inr(&format_value(&result["totals"]["grand_total"])),
    ]);
    let mut table = builder.build();
    table.with(Style::modern());
    println!("{table}");

    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {w}");
            }
        }
    }

    if let Some(Value::String(disclaimer)) = result.get("disclaimer") {
        println!("\n{disclaimer}");
    }
}

fn print_flat_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);
        for map in arr.iter().filter_map(Value::as_object) {
            let row: Vec<String> = headers
                .iter()
                .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                .collect();
            builder.push_record(row);
        }
        println!("{}", Table::from(builder));
    } else {
        let mut builder = Builder::default();
        builder.push_record(["Jurisdiction"]);
        for item in arr {
            builder.push_record([format_value(item)]);
        }
        println!("{}", Table::from(builder));
    }
}

fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => arr.iter().map(format_value).collect::<Vec<_>>().join(", "),
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

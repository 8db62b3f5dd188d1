use serde_json::Value;

/// Print just the answer: the grand total for a calculation, one name per
/// line for a list.
pub fn print_minimal(value: &Value) {
    if let Some(total) = value
        .get("result")
        .and_then(|r| r.get("totals"))
        .and_then(|t| t.get("grand_total"))
    {
        println!("{}", scalar(total));
        return;
    }

    match value {
        Value::Array(items) => {
            for item in items {
                println!("{}", scalar(item));
            }
        }
        Value::Object(map) => {
            for (key, val) in map {
                println!("{key}: {}", scalar(val));
            }
        }
        _ => println!("{}", scalar(value)),
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

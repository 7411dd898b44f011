//! Builders for the expression shapes the engine emits.

use serde_json::{Value, json};

/// Round to three decimals and emit whole numbers as integers.
pub fn num(value: f64) -> Value {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded.fract() == 0.0 && rounded.abs() < 1e15 {
        json!(rounded as i64)
    } else {
        json!(rounded)
    }
}

/// `["get", attr]`
pub fn get(attribute: &str) -> Value {
    json!(["get", attribute])
}

/// `["==", ["get", attr], value]`
pub fn equals(attribute: &str, value: Value) -> Value {
    json!(["==", get(attribute), value])
}

/// `["match", ["get", attr], [values...], true, false]`
pub fn one_of(attribute: &str, values: Vec<Value>) -> Value {
    json!(["match", get(attribute), values, true, false])
}

/// `["has", attr]`
pub fn has(attribute: &str) -> Value {
    json!(["has", attribute])
}

/// `["!", expr]`
pub fn not(expression: Value) -> Value {
    json!(["!", expression])
}

/// Combine clauses: none, the single clause, or `["all", ...]`.
pub fn all(mut clauses: Vec<Value>) -> Option<Value> {
    match clauses.len() {
        0 => None,
        1 => clauses.pop(),
        _ => {
            let mut expression = vec![json!("all")];
            expression.extend(clauses);
            Some(Value::Array(expression))
        }
    }
}

/// `["interpolate", ["linear"], ["zoom"], z0, v0, ...]`
pub fn interpolate_linear(stops: &[(f64, f64)]) -> Value {
    interpolate(json!(["linear"]), stops)
}

/// `["interpolate", ["exponential", base], ["zoom"], z0, v0, ...]`
pub fn interpolate_exponential(base: f64, stops: &[(f64, f64)]) -> Value {
    interpolate(json!(["exponential", num(base)]), stops)
}

fn interpolate(curve: Value, stops: &[(f64, f64)]) -> Value {
    let mut expression = vec![json!("interpolate"), curve, json!(["zoom"])];
    for (zoom, value) in stops {
        expression.push(num(*zoom));
        expression.push(num(*value));
    }
    Value::Array(expression)
}

/// Multiply every output value of an interpolate expression, leaving zoom stops
/// alone.
pub fn scale_interpolate(expression: &Value, factor: f64) -> Value {
    let Some(items) = expression.as_array() else {
        return expression.clone();
    };
    if items.first().and_then(Value::as_str) != Some("interpolate") {
        return expression.clone();
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| match item.as_f64() {
            // stops start at index 3 and alternate zoom, value
            Some(n) if i >= 3 && (i - 3) % 2 == 1 => num(n * factor),
            _ => item.clone(),
        })
        .collect::<Vec<_>>()
        .into()
}

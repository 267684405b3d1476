//! Turns raw collection records into [`Marker`] values.
//!
//! Records are loosely typed JSON objects. A record is kept only if every
//! required field of its category is present and truthy; anything else is
//! dropped whole, never partially converted.

use serde_json::Value;

use crate::categories::FieldMap;
use crate::models::Marker;

/// Loose JavaScript-style truthiness:
/// `null`, `false`, `0`, `NaN` and `""` are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Normalizes every record, skipping the ones that fail validation.
pub fn normalize_records(records: &[Value], fields: &FieldMap) -> Vec<Marker> {
    records
        .iter()
        .filter_map(|record| normalize_record(record, fields))
        .collect()
}

/// Normalizes a single record, or `None` if it is malformed.
pub fn normalize_record(record: &Value, fields: &FieldMap) -> Option<Marker> {
    let obj = record.as_object()?;
    let truthy = |name: &str| obj.get(name).filter(|v| is_truthy(v));

    let latitude = truthy(fields.latitude).and_then(coordinate)?;
    let longitude = truthy(fields.longitude).and_then(coordinate)?;

    let contact = match fields.contact {
        Some(name) => Some(text(truthy(name)?)),
        None => None,
    };

    let address = fields
        .address
        .and_then(|name| obj.get(name))
        .filter(|v| !v.is_null())
        .map(text);

    let pop_up = obj.get(fields.label).map(text).unwrap_or_default();

    Some(Marker {
        geocode: [latitude, longitude],
        pop_up,
        contact,
        address,
    })
}

fn coordinate(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    // "0" and "NaN" strings are truthy as text but not usable coordinates
    (parsed != 0.0 && parsed.is_finite()).then_some(parsed)
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

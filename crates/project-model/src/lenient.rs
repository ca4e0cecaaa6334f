//! Forgiving field decoders for project documents.
//!
//! Project files are written by several generations of the editor and are
//! sometimes hand-edited. A bad field falls back to its default instead of
//! failing the whole document.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::clip::{normalize_speed, Transition, TransitionKind, DEFAULT_TRANSITION_SEC};

/// Read a number that may have been stored as a JSON string.
pub(crate) fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

/// Read an integer, truncating fractional numbers.
pub(crate) fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f.trunc() as i64))
        }
        _ => None,
    }
}

fn flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub(crate) fn id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => crate::clip::new_id(),
        other => other.to_string(),
    })
}

pub(crate) fn seconds<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(number(&value).unwrap_or(0.0).max(0.0))
}

pub(crate) fn speed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(normalize_speed(number(&value), 1.0))
}

pub(crate) fn volume<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(number(&value).unwrap_or(1.0).max(0.0))
}

pub(crate) fn flag_or_false<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(flag(&value).unwrap_or(false))
}

pub(crate) fn flag_or_true<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(flag(&value).unwrap_or(true))
}

pub(crate) fn fps<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(integer(&value)
        .filter(|fps| *fps > 0)
        .map(|fps| fps.min(i64::from(u32::MAX)) as u32)
        .unwrap_or(crate::project::DEFAULT_FPS))
}

/// Accepts `null`, a bare kind string (older files), or `{kind, duration}`.
pub(crate) fn transition<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<Transition>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match &value {
        Value::String(kind) => kind
            .parse::<TransitionKind>()
            .ok()
            .map(|kind| Transition::new(kind, DEFAULT_TRANSITION_SEC)),
        Value::Object(map) => {
            let kind = map
                .get("kind")
                .and_then(Value::as_str)
                .and_then(|k| k.parse::<TransitionKind>().ok());
            let duration = map
                .get("duration")
                .or_else(|| map.get("duration_sec"))
                .and_then(number)
                .unwrap_or(DEFAULT_TRANSITION_SEC);
            kind.filter(|_| duration > 0.0)
                .map(|kind| Transition::new(kind, duration))
        }
        _ => None,
    })
}

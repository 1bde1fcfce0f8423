//! Tolerant field decoders for judge payloads.
//!
//! The judge pipeline is stitched from several services and they disagree on
//! scalar encodings: exit codes arrive as `"0"` or `0`, timings as `"0.01"`
//! or `0.01`, and absent lists as `null`.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

/// Integer given as a number, a numeric string, an empty string or `null`.
pub(crate) fn int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Scalar>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Scalar::Int(v)) => Ok(Some(v)),
        Some(Scalar::Float(v)) => Ok(Some(v.round() as i64)),
        Some(Scalar::Bool(v)) => Err(D::Error::custom(format!(
            "expected an integer, found boolean {v}"
        ))),
        Some(Scalar::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<i64>()
                .or_else(|_| s.parse::<f64>().map(|v| v.round() as i64))
                .map(Some)
                .map_err(|_| D::Error::custom(format!("expected an integer, found {s:?}")))
        }
    }
}

/// Free text that may be sent as any scalar or `null`.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        None => String::new(),
        Some(Scalar::Text(s)) => s,
        Some(Scalar::Int(v)) => v.to_string(),
        Some(Scalar::Float(v)) => v.to_string(),
        Some(Scalar::Bool(v)) => v.to_string(),
    })
}

/// A list that may be `null`.
pub(crate) fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

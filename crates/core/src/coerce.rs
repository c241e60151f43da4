//! String-or-number coercion for count fields.
//!
//! The legacy client submits lot counts and quantities either as JSON numbers
//! or as free-form strings from text inputs. Counts are always stored as
//! non-negative integers: strings are parsed, negatives clamp to zero, and
//! unparseable input coerces to zero (the `Number(x) || 0` contract).

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawCount {
    Int(i64),
    Float(f64),
    Text(String),
    Null,
}

impl RawCount {
    fn coerce(self) -> u32 {
        match self {
            RawCount::Int(n) => u32::try_from(n).unwrap_or(0),
            RawCount::Float(f) if f.is_finite() && f > 0.0 => f as u32,
            RawCount::Float(_) => 0,
            RawCount::Text(s) => match s.trim().parse::<f64>() {
                Ok(f) if f.is_finite() && f > 0.0 => f as u32,
                _ => 0,
            },
            RawCount::Null => 0,
        }
    }
}

/// Deserialize a count field, coercing strings and clamping to zero.
pub(crate) fn count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(RawCount::deserialize(deserializer)?.coerce())
}

/// Deserialize an optional count field. Absent and explicit-null both give
/// `None`; anything else coerces like [`count`].
pub(crate) fn opt_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawCount>::deserialize(deserializer)?;
    Ok(match raw {
        None | Some(RawCount::Null) => None,
        Some(v) => Some(v.coerce()),
    })
}

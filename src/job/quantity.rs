//! Resource quantities (`"500m"`, `"256Mi"`, `"1.5"`, `"2e3"`).

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuantityError {
    #[error("quantity is empty")]
    Empty,

    #[error("invalid quantity '{0}': expected a number with an optional suffix")]
    InvalidNumber(String),

    #[error("invalid quantity '{value}': unknown suffix '{suffix}'")]
    UnknownSuffix { value: String, suffix: String },
}

/// A validated resource quantity.
///
/// Keeps the original spelling for output and exposes the numeric value in
/// base units (cores, bytes) for comparison.
///
/// # Examples
///
/// ```
/// use karo::job::Quantity;
///
/// let cpu: Quantity = "500m".parse().unwrap();
/// assert_eq!(cpu.value(), 0.5);
///
/// let mem: Quantity = "256Mi".parse().unwrap();
/// assert_eq!(mem.value(), 256.0 * 1024.0 * 1024.0);
///
/// assert!("12parsecs".parse::<Quantity>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    raw: String,
    value: f64,
}

impl Quantity {
    /// Value in base units.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Scale of a unit suffix as `(multiplier, divisor)`.
fn scale(suffix: &str) -> Option<(f64, f64)> {
    const KI: f64 = 1024.0;
    let scale = match suffix {
        "" => (1.0, 1.0),
        "n" => (1.0, 1e9),
        "u" => (1.0, 1e6),
        "m" => (1.0, 1e3),
        "k" => (1e3, 1.0),
        "M" => (1e6, 1.0),
        "G" => (1e9, 1.0),
        "T" => (1e12, 1.0),
        "P" => (1e15, 1.0),
        "E" => (1e18, 1.0),
        "Ki" => (KI, 1.0),
        "Mi" => (KI * KI, 1.0),
        "Gi" => (KI * KI * KI, 1.0),
        "Ti" => (KI * KI * KI * KI, 1.0),
        "Pi" => (KI * KI * KI * KI * KI, 1.0),
        "Ei" => (KI * KI * KI * KI * KI * KI, 1.0),
        _ => return None,
    };
    Some(scale)
}

/// Signed decimal integer; no other spelling is an exponent.
fn parse_exponent(exp: &str) -> Option<i32> {
    let digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    exp.parse().ok()
}

impl FromStr for Quantity {
    type Err = QuantityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        if raw.is_empty() {
            return Err(QuantityError::Empty);
        }

        let unsigned = raw.strip_prefix(['+', '-']).unwrap_or(raw);
        let digits_end = unsigned
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(unsigned.len());
        let (number, mut suffix) = unsigned.split_at(digits_end);

        if number.is_empty() || number == "." || number.matches('.').count() > 1 {
            return Err(QuantityError::InvalidNumber(raw.to_string()));
        }

        // Decimal exponent form (1e3, 5E-2) only when the suffix is not a unit.
        let mut exponent = 0i32;
        if scale(suffix).is_none() {
            if let Some(exp) = suffix.strip_prefix(['e', 'E']) {
                exponent = parse_exponent(exp)
                    .ok_or_else(|| QuantityError::InvalidNumber(raw.to_string()))?;
                suffix = "";
            }
        }

        let (multiplier, divisor) = scale(suffix).ok_or_else(|| QuantityError::UnknownSuffix {
            value: raw.to_string(),
            suffix: suffix.to_string(),
        })?;

        let magnitude: f64 = number
            .parse()
            .map_err(|_| QuantityError::InvalidNumber(raw.to_string()))?;
        let sign = if raw.starts_with('-') { -1.0 } else { 1.0 };

        let mut value = sign * magnitude * multiplier / divisor;
        if exponent >= 0 {
            value *= 10f64.powi(exponent);
        } else {
            value /= 10f64.powi(-exponent);
        }

        Ok(Quantity {
            raw: raw.to_string(),
            value,
        })
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

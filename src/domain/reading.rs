// Validated measurement values
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Literal label shown for a field that failed validation.
pub const NOT_CONNECTED: &str = "Not connected";

/// Outcome of decoding one raw payload field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    Valid(f64),
    Invalid,
}

/// Inclusive range a reading must fall in to be treated as a real measurement.
///
/// Readings outside it come from disconnected or failed sensors (the station
/// reports 999 for a dead temperature probe and -1 for O₂/humidity).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlausibilityBound {
    pub min: f64,
    pub max: f64,
}

impl PlausibilityBound {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

/// A `{min, max}` config table where either key may be left out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundOverride {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl BoundOverride {
    pub fn is_empty(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    /// `base` with whichever keys were given replaced.
    pub fn over(self, base: PlausibilityBound) -> PlausibilityBound {
        PlausibilityBound::new(self.min.unwrap_or(base.min), self.max.unwrap_or(base.max))
    }
}

impl Reading {
    /// Decode a raw JSON field: numbers and numeric strings are coerced, everything
    /// else (null, booleans, "?", NaN, out-of-bound values) is `Invalid`.
    pub fn decode(raw: &Value, bound: &PlausibilityBound) -> Self {
        let number = match raw {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };

        match number {
            Some(v) if v.is_finite() && bound.contains(v) => Reading::Valid(v),
            _ => Reading::Invalid,
        }
    }
}

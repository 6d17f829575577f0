//! Property values delivered by the live session, plus display domains.
//!
//! The host is not trusted to keep values inside their nominal range, so
//! mixer readings go through [`Pan`] and [`Volume`], which clamp before
//! anything is displayed.

use std::fmt;

use serde::Serialize;

use crate::{EntityPath, SessionError, SessionResult};

/// A single property value as read from or pushed by the session.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Reference to another entity (e.g. the selected track)
    Path(EntityPath),
}

impl PropertyValue {
    /// Short type name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::Path(_) => "path",
        }
    }

    /// Booleans, or integers treated as 0 = false.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    /// Finite numbers only; NaN and infinities are not usable readings.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) if f.is_finite() => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&EntityPath> {
        match self {
            Self::Path(p) => Some(p),
            _ => None,
        }
    }

    /// Converts to a bool or reports the mismatch for `property`.
    pub fn expect_bool(&self, property: &str) -> SessionResult<bool> {
        self.as_bool().ok_or_else(|| self.mismatch(property, "bool"))
    }

    /// Converts to a finite number or reports the mismatch for `property`.
    pub fn expect_f64(&self, property: &str) -> SessionResult<f64> {
        self.as_f64().ok_or_else(|| self.mismatch(property, "number"))
    }

    /// Converts to owned text or reports the mismatch for `property`.
    pub fn expect_text(&self, property: &str) -> SessionResult<String> {
        self.as_text()
            .map(str::to_string)
            .ok_or_else(|| self.mismatch(property, "text"))
    }

    /// Converts to an entity path or reports the mismatch for `property`.
    pub fn expect_path(&self, property: &str) -> SessionResult<EntityPath> {
        self.as_path()
            .cloned()
            .ok_or_else(|| self.mismatch(property, "path"))
    }

    fn mismatch(&self, property: &str, expected: &'static str) -> SessionError {
        SessionError::UnexpectedValue {
            property: property.to_string(),
            expected,
            actual: self.kind(),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v:.2}"),
            Self::Text(s) => f.write_str(s),
            Self::Path(p) => write!(f, "{p}"),
        }
    }
}

// ============================================================================
// Clamped Mixer Domains
// ============================================================================

/// Which side of the stereo field a pan reading points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanDirection {
    Left,
    Center,
    Right,
}

/// Pan position clamped to [-1, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pan(f64);

impl Pan {
    /// Readings closer to zero than this display as centre.
    const CENTER_EPSILON: f64 = 0.005;

    pub fn clamped(raw: f64) -> Self {
        Self(raw.clamp(-1.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn direction(&self) -> PanDirection {
        if self.0.abs() < Self::CENTER_EPSILON {
            PanDirection::Center
        } else if self.0 < 0.0 {
            PanDirection::Left
        } else {
            PanDirection::Right
        }
    }
}

impl fmt::Display for Pan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction() {
            PanDirection::Center => f.write_str("C"),
            PanDirection::Left => write!(f, "{:.2} L", self.0.abs()),
            PanDirection::Right => write!(f, "{:.2} R", self.0),
        }
    }
}

/// Fader level clamped to [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Volume(f64);

impl Volume {
    pub fn clamped(raw: f64) -> Self {
        Self(raw.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }
}

impl fmt::Display for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_conversions() {
        assert_eq!(PropertyValue::Bool(true).as_bool(), Some(true));
        assert_eq!(PropertyValue::Int(0).as_bool(), Some(false));
        assert_eq!(PropertyValue::Text("x".into()).as_bool(), None);
        assert_eq!(PropertyValue::Int(3).as_f64(), Some(3.0));
        assert_eq!(PropertyValue::Float(f64::NAN).as_f64(), None);
        assert_eq!(PropertyValue::Float(f64::INFINITY).as_f64(), None);
    }

    #[test]
    fn test_expect_reports_mismatch() {
        let err = PropertyValue::Text("fast".into())
            .expect_f64("tempo")
            .unwrap_err();
        assert_eq!(
            err,
            SessionError::UnexpectedValue {
                property: "tempo".to_string(),
                expected: "number",
                actual: "text",
            }
        );
    }

    #[test]
    fn test_pan_is_clamped() {
        assert_eq!(Pan::clamped(1.02).value(), 1.0);
        assert_eq!(Pan::clamped(-1.5).value(), -1.0);
        assert_eq!(Pan::clamped(0.3).value(), 0.3);
    }

    #[test]
    fn test_pan_direction_and_display() {
        assert_eq!(Pan::clamped(0.0).direction(), PanDirection::Center);
        assert_eq!(Pan::clamped(0.001).direction(), PanDirection::Center);
        assert_eq!(Pan::clamped(-0.25).direction(), PanDirection::Left);
        assert_eq!(Pan::clamped(1.07).to_string(), "1.00 R");
        assert_eq!(Pan::clamped(-0.25).to_string(), "0.25 L");
        assert_eq!(Pan::clamped(0.0).to_string(), "C");
    }

    #[test]
    fn test_volume_is_clamped() {
        assert_eq!(Volume::clamped(1.3).to_string(), "1.00");
        assert_eq!(Volume::clamped(-0.1).value(), 0.0);
        assert_eq!(Volume::clamped(0.85).to_string(), "0.85");
    }
}

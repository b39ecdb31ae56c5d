//! Core types for spark-dom.
//!
//! These are the small value types shared by the virtual node model, the
//! surface and the reconciliation engine.

use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Namespace
// =============================================================================

/// Element namespace on the live surface.
///
/// Elements are HTML unless they (or an ancestor) carry the SVG hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
}

impl Namespace {
    #[inline]
    pub const fn is_svg(self) -> bool {
        matches!(self, Namespace::Svg)
    }
}

// =============================================================================
// Attribute Values
// =============================================================================

/// Value of a single element attribute.
///
/// Everything ends up as text on the surface. Booleans follow presence
/// semantics: `Bool(true)` writes an empty attribute, `Bool(false)` means the
/// attribute is absent and is never written.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Float(f64),
}

impl AttrValue {
    /// Whether this value should exist on the surface at all.
    #[inline]
    pub fn is_present(&self) -> bool {
        !matches!(self, AttrValue::Bool(false))
    }

    /// Text written to the surface, `None` when the attribute is absent.
    pub fn to_surface(&self) -> Option<String> {
        match self {
            AttrValue::Bool(false) => None,
            AttrValue::Bool(true) => Some(String::new()),
            other => Some(other.to_string()),
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Str(s) => f.write_str(s),
            AttrValue::Bool(b) => write!(f, "{b}"),
            AttrValue::Int(i) => write!(f, "{i}"),
            AttrValue::Float(x) => write!(f, "{x}"),
        }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        AttrValue::Str(value.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(value: String) -> Self {
        AttrValue::Str(value)
    }
}

impl From<&String> for AttrValue {
    fn from(value: &String) -> Self {
        AttrValue::Str(value.clone())
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        AttrValue::Bool(value)
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        AttrValue::Int(value)
    }
}

impl From<i32> for AttrValue {
    fn from(value: i32) -> Self {
        AttrValue::Int(i64::from(value))
    }
}

impl From<u32> for AttrValue {
    fn from(value: u32) -> Self {
        AttrValue::Int(i64::from(value))
    }
}

impl From<usize> for AttrValue {
    fn from(value: usize) -> Self {
        AttrValue::Int(value as i64)
    }
}

impl From<f64> for AttrValue {
    fn from(value: f64) -> Self {
        AttrValue::Float(value)
    }
}

/// Attribute mapping of an element.
///
/// Ordered so that the surface sees attribute writes in a stable order.
pub type Attributes = BTreeMap<String, AttrValue>;

// =============================================================================
// Tests
// =============================================================================

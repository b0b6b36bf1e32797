//! Core data types for livetune-rs
//!
//! This module contains the value model shared by virtual fields, bindings
//! and the presentation layer.
//!
//! # Main Types
//!
//! - [`FieldKind`] - Declared kind of a pipeline field
//! - [`FieldValue`] - A decoded value of one of those kinds
//! - [`InputMode`] - Which characters a text box accepts for a kind
//!
//! # Multi-component kinds
//!
//! Points, scalars and rectangles are rendered as several text boxes (one per
//! component). Components are addressed by index and are always decimals.

use serde::{Deserialize, Serialize};

/// Declared kind of a pipeline field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// 64-bit signed integer
    Integer,
    /// 64-bit floating point
    Decimal,
    /// Free text
    Text,
    /// Boolean toggle
    Boolean,
    /// One choice out of a fixed set of labels
    Enumerated,
    /// 2D point (x, y)
    Point,
    /// Four-channel scalar (e.g. a color)
    Scalar,
    /// Rectangle (x, y, width, height)
    Rect,
}

impl FieldKind {
    /// Number of text boxes a widget renders for this kind
    pub fn component_count(&self) -> usize {
        match self {
            FieldKind::Point => 2,
            FieldKind::Scalar | FieldKind::Rect => 4,
            _ => 1,
        }
    }

    /// Number of combo boxes a widget renders for this kind
    pub fn combo_count(&self) -> usize {
        match self {
            FieldKind::Enumerated => 1,
            _ => 0,
        }
    }

    /// Input restriction for text boxes of this kind
    pub fn input_mode(&self) -> InputMode {
        match self {
            FieldKind::Integer => InputMode::NumbersOnly,
            FieldKind::Decimal | FieldKind::Point | FieldKind::Scalar | FieldKind::Rect => {
                InputMode::NumbersOnlyDecimal
            }
            FieldKind::Text | FieldKind::Boolean | FieldKind::Enumerated => InputMode::FreeText,
        }
    }

    /// Whether this kind is numeric
    pub fn is_numeric(&self) -> bool {
        self.input_mode().is_numeric()
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldKind::Integer => write!(f, "integer"),
            FieldKind::Decimal => write!(f, "decimal"),
            FieldKind::Text => write!(f, "text"),
            FieldKind::Boolean => write!(f, "boolean"),
            FieldKind::Enumerated => write!(f, "enumerated"),
            FieldKind::Point => write!(f, "point"),
            FieldKind::Scalar => write!(f, "scalar"),
            FieldKind::Rect => write!(f, "rect"),
        }
    }
}

/// Which characters a text box accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputMode {
    /// Integers only (decimal, `0x` hex or `0b` binary)
    NumbersOnly,
    /// Integers and decimals
    NumbersOnlyDecimal,
    /// Anything
    FreeText,
}

impl InputMode {
    /// Returns true for either numbers-only mode
    pub fn is_numeric(&self) -> bool {
        matches!(self, InputMode::NumbersOnly | InputMode::NumbersOnlyDecimal)
    }
}

/// A decoded field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    Integer(i64),
    Decimal(f64),
    Text(String),
    Boolean(bool),
    /// Selected option index
    Enumerated(usize),
    Point([f64; 2]),
    Scalar([f64; 4]),
    Rect([f64; 4]),
}

impl FieldValue {
    /// The kind this value belongs to
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Integer(_) => FieldKind::Integer,
            FieldValue::Decimal(_) => FieldKind::Decimal,
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::Boolean(_) => FieldKind::Boolean,
            FieldValue::Enumerated(_) => FieldKind::Enumerated,
            FieldValue::Point(_) => FieldKind::Point,
            FieldValue::Scalar(_) => FieldKind::Scalar,
            FieldValue::Rect(_) => FieldKind::Rect,
        }
    }

    /// Change-detection equality.
    ///
    /// Value equality for every kind; decimals compare bit patterns after
    /// normalizing zero, so NaN equals NaN and `-0.0` equals `0.0`.
    pub fn same_as(&self, other: &FieldValue) -> bool {
        match (self, other) {
            (FieldValue::Decimal(a), FieldValue::Decimal(b)) => same_f64(*a, *b),
            (FieldValue::Point(a), FieldValue::Point(b)) => same_components(a, b),
            (FieldValue::Scalar(a), FieldValue::Scalar(b))
            | (FieldValue::Rect(a), FieldValue::Rect(b)) => same_components(a, b),
            (a, b) => a == b,
        }
    }

    /// Components as decimals, for multi-component kinds
    pub fn components(&self) -> Option<&[f64]> {
        match self {
            FieldValue::Point(v) => Some(v),
            FieldValue::Scalar(v) | FieldValue::Rect(v) => Some(v),
            _ => None,
        }
    }

    fn components_mut(&mut self) -> Option<&mut [f64]> {
        match self {
            FieldValue::Point(v) => Some(v),
            FieldValue::Scalar(v) | FieldValue::Rect(v) => Some(v),
            _ => None,
        }
    }

    /// Value of a single component as shown in one text box.
    ///
    /// Single-component kinds only have index 0, which is the value itself.
    pub fn component(&self, index: usize) -> Option<FieldValue> {
        match self.components() {
            Some(values) => values.get(index).map(|v| FieldValue::Decimal(*v)),
            None if index == 0 => Some(self.clone()),
            None => None,
        }
    }

    /// Returns a copy with one component replaced by a decimal
    pub fn with_component(&self, index: usize, value: f64) -> Option<FieldValue> {
        let mut updated = self.clone();
        let slot = updated.components_mut()?.get_mut(index)?;
        *slot = value;
        Some(updated)
    }

    /// Format for a text box; `parse_input` of the result yields the same value
    pub fn format(&self, options: &[String]) -> String {
        match self {
            FieldValue::Integer(v) => v.to_string(),
            FieldValue::Decimal(v) => v.to_string(),
            FieldValue::Text(v) => v.clone(),
            FieldValue::Boolean(v) => v.to_string(),
            FieldValue::Enumerated(index) => options
                .get(*index)
                .cloned()
                .unwrap_or_else(|| index.to_string()),
            FieldValue::Point(v) => join_components(v),
            FieldValue::Scalar(v) | FieldValue::Rect(v) => join_components(v),
        }
    }
}

fn same_f64(a: f64, b: f64) -> bool {
    if a == 0.0 && b == 0.0 {
        return true;
    }
    a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
}

fn same_components(a: &[f64], b: &[f64]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| same_f64(*x, *y))
}

fn join_components(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Failure to parse a text box entry; carries what was expected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputError {
    pub expected: &'static str,
}

/// Parse an integer, supporting `0x` hex and `0b` binary prefixes
pub fn parse_integer(input: &str) -> Result<i64, InputError> {
    let input = input.trim();
    let err = InputError {
        expected: "an integer",
    };

    if let Ok(value) = input.parse::<i64>() {
        return Ok(value);
    }

    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    let magnitude = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        parse_magnitude(hex, 16)
    } else if let Some(bin) = digits
        .strip_prefix("0b")
        .or_else(|| digits.strip_prefix("0B"))
    {
        parse_magnitude(bin, 2)
    } else {
        None
    };
    let magnitude = magnitude.ok_or(err)?;

    let value = if negative {
        0i64.checked_sub_unsigned(magnitude)
    } else {
        i64::try_from(magnitude).ok()
    };
    value.ok_or(err)
}

/// Unsigned digits after a radix prefix; the sign may only precede the prefix
fn parse_magnitude(digits: &str, radix: u32) -> Option<u64> {
    if digits.starts_with(['+', '-']) {
        return None;
    }
    u64::from_str_radix(digits, radix).ok()
}

/// Parse a decimal number
pub fn parse_decimal(input: &str) -> Result<f64, InputError> {
    let input = input.trim();
    if let Ok(value) = input.parse::<f64>() {
        return Ok(value);
    }
    parse_integer(input)
        .map(|v| v as f64)
        .map_err(|_| InputError {
            expected: "a number",
        })
}

/// Parse a boolean toggle entry
pub fn parse_boolean(input: &str) -> Result<bool, InputError> {
    match input.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(InputError {
            expected: "true or false",
        }),
    }
}

/// Parse an enumerated entry, by label first and then by index
pub fn parse_option(input: &str, options: &[String]) -> Result<usize, InputError> {
    let input = input.trim();
    let err = InputError {
        expected: "one of the listed options",
    };
    if let Some(index) = options.iter().position(|o| o == input) {
        return Ok(index);
    }
    // Option-less fields are edited by raw index
    match input.parse::<usize>() {
        Ok(index) if options.is_empty() || index < options.len() => Ok(index),
        _ => Err(err),
    }
}

/// Parse one text box entry for a kind (component entries are decimals)
pub fn parse_input(kind: FieldKind, input: &str, options: &[String]) -> Result<FieldValue, InputError> {
    Ok(match kind {
        FieldKind::Integer => FieldValue::Integer(parse_integer(input)?),
        FieldKind::Decimal => FieldValue::Decimal(parse_decimal(input)?),
        FieldKind::Text => FieldValue::Text(input.to_string()),
        FieldKind::Boolean => FieldValue::Boolean(parse_boolean(input)?),
        FieldKind::Enumerated => FieldValue::Enumerated(parse_option(input, options)?),
        FieldKind::Point | FieldKind::Scalar | FieldKind::Rect => {
            FieldValue::Decimal(parse_decimal(input)?)
        }
    })
}

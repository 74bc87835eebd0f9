//! Declared member types and the coercion of wire values into them.

use serde_json::{Number, Value};
use std::fmt;
use thiserror::Error;

/// A wire value that cannot be converted to the declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert {value} to {expected}")]
pub struct CoercionError {
    pub value: String,
    pub expected: String,
}

impl CoercionError {
    fn new(value: &Value, expected: &ValueType) -> Self {
        Self {
            value: value.to_string(),
            expected: expected.name().to_string(),
        }
    }
}

/// A named enumeration whose values travel as variant names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumType {
    pub name: String,
    pub variants: Vec<String>,
}

/// The type a property, parameter or event payload is declared with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    Bool,
    Int,
    UInt,
    Float,
    String,
    /// Any JSON value, passed through untouched.
    Json,
    Enum(EnumType),
}

impl ValueType {
    /// An enumeration type with the given variant names, in ordinal order.
    #[must_use]
    pub fn enumeration<I, S>(name: &str, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Enum(EnumType {
            name: name.to_string(),
            variants: variants.into_iter().map(Into::into).collect(),
        })
    }

    /// The type name reported on the wire.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Bool => "bool",
            Self::Int => "i64",
            Self::UInt => "u64",
            Self::Float => "f64",
            Self::String => "string",
            Self::Json => "json",
            Self::Enum(e) => &e.name,
        }
    }

    /// Convert `value` to this type.
    ///
    /// Strings are parsed for the scalar types. Enumerations accept an
    /// ordinal, a numeric string or a case-insensitive variant name, and
    /// always produce the canonical variant name.
    pub fn coerce(&self, value: &Value) -> Result<Value, CoercionError> {
        let fail = || CoercionError::new(value, self);
        match (self, value) {
            (Self::Json, v) => Ok(v.clone()),
            (_, Value::Null) => Err(fail()),

            (Self::Bool, Value::Bool(_)) => Ok(value.clone()),
            (Self::Bool, Value::Number(n)) => match n.as_u64() {
                Some(0) => Ok(Value::Bool(false)),
                Some(1) => Ok(Value::Bool(true)),
                _ => Err(fail()),
            },
            (Self::Bool, Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(fail()),
            },

            (Self::Int, Value::Number(n)) => as_i64(n).map(Value::from).ok_or_else(fail),
            (Self::Int, Value::String(s)) => {
                s.trim().parse::<i64>().map(Value::from).map_err(|_| fail())
            }

            (Self::UInt, Value::Number(n)) => as_u64(n).map(Value::from).ok_or_else(fail),
            (Self::UInt, Value::String(s)) => {
                s.trim().parse::<u64>().map(Value::from).map_err(|_| fail())
            }

            (Self::Float, Value::Number(n)) => n
                .as_f64()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(fail),
            (Self::Float, Value::String(s)) => s
                .trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(fail),

            (Self::String, Value::String(_)) => Ok(value.clone()),
            (Self::String, Value::Number(n)) => Ok(Value::String(n.to_string())),
            (Self::String, Value::Bool(b)) => Ok(Value::String(b.to_string())),

            (Self::Enum(e), Value::Number(n)) => n
                .as_u64()
                .and_then(|ordinal| e.variant_at(ordinal))
                .ok_or_else(fail),
            (Self::Enum(e), Value::String(s)) => {
                let text = s.trim();
                match text.parse::<u64>() {
                    Ok(ordinal) => e.variant_at(ordinal),
                    Err(_) => e
                        .variants
                        .iter()
                        .find(|v| v.eq_ignore_ascii_case(text))
                        .map(|v| Value::String(v.clone())),
                }
                .ok_or_else(fail)
            }

            _ => Err(fail()),
        }
    }
}

impl EnumType {
    fn variant_at(&self, ordinal: u64) -> Option<Value> {
        let index = usize::try_from(ordinal).ok()?;
        self.variants.get(index).map(|v| Value::String(v.clone()))
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn as_i64(n: &Number) -> Option<i64> {
    if let Some(i) = n.as_i64() {
        return Some(i);
    }
    let f = n.as_f64()?;
    let in_range = f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64;
    in_range.then(|| f as i64)
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn as_u64(n: &Number) -> Option<u64> {
    if let Some(u) = n.as_u64() {
        return Some(u);
    }
    let f = n.as_f64()?;
    let in_range = f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64;
    in_range.then(|| f as u64)
}

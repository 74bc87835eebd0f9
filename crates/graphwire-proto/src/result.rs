//! Per-node dispatch outcome.

use crate::info::{InfoKind, InfoNode};
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Outcome category attached to a node after dispatch.
///
/// Encoded on the wire as its integer ordinal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ErrorCode {
    #[default]
    Ok,
    /// No member with the requested name, or a write on a read-only property.
    MissingMember,
    /// A node-group key is absent or its value is null.
    MissingNode,
    /// A value could not be coerced to the declared type.
    InvalidParameter,
    /// The underlying getter, setter, invoker or subscription raised.
    Exception,
}

impl ErrorCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "Ok",
            Self::MissingMember => "MissingMember",
            Self::MissingNode => "MissingNode",
            Self::InvalidParameter => "InvalidParameter",
            Self::Exception => "Exception",
        }
    }
}

impl From<ErrorCode> for u8 {
    fn from(code: ErrorCode) -> Self {
        code as u8
    }
}

impl TryFrom<u8> for ErrorCode {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Ok),
            1 => Ok(Self::MissingMember),
            2 => Ok(Self::MissingNode),
            3 => Ok(Self::InvalidParameter),
            4 => Ok(Self::Exception),
            other => Err(format!("unknown error code {other}")),
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payload carried by a [`InfoResult`].
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ResultValue {
    #[default]
    Empty,
    /// A plain JSON value (property value, exception message).
    Json(Value),
    /// A nested info node (metadata snapshot).
    Info(Box<InfoNode>),
}

impl ResultValue {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_info(&self) -> Option<&InfoNode> {
        match self {
            Self::Info(node) => Some(node),
            _ => None,
        }
    }
}

impl From<Value> for ResultValue {
    fn from(value: Value) -> Self {
        if value.is_null() {
            Self::Empty
        } else {
            Self::Json(value)
        }
    }
}

/// Outcome of the last dispatch of a node: error code, type name and value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InfoResult {
    pub error_code: ErrorCode,
    pub type_name: String,
    pub value: ResultValue,
}

impl InfoResult {
    /// A successful outcome with no payload.
    #[must_use]
    pub fn ok() -> Self {
        Self::default()
    }

    /// A successful outcome carrying a typed JSON value.
    #[must_use]
    pub fn ok_value(type_name: impl Into<String>, value: Value) -> Self {
        Self {
            error_code: ErrorCode::Ok,
            type_name: type_name.into(),
            value: value.into(),
        }
    }

    /// A successful outcome wrapping a metadata snapshot.
    #[must_use]
    pub fn ok_info(node: InfoNode) -> Self {
        Self {
            error_code: ErrorCode::Ok,
            type_name: node.kind().as_str().to_string(),
            value: ResultValue::Info(Box::new(node)),
        }
    }

    /// A failed outcome with a human-readable message.
    #[must_use]
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error_code: code,
            type_name: "String".to_string(),
            value: ResultValue::Json(Value::String(message.into())),
        }
    }

    /// A captured exception: the raising type's name and its message.
    #[must_use]
    pub fn exception(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: ErrorCode::Exception,
            type_name: type_name.into(),
            value: ResultValue::Json(Value::String(message.into())),
        }
    }

    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error_code == ErrorCode::Ok
    }

    /// The message of a failed outcome, if the value is a string.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.value.as_json().and_then(Value::as_str)
    }
}

impl Serialize for InfoResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if self.error_code != ErrorCode::Ok {
            map.serialize_entry("errorCode", &self.error_code)?;
        }
        if !self.type_name.is_empty() {
            map.serialize_entry("type", &self.type_name)?;
        }
        match &self.value {
            ResultValue::Empty => {}
            ResultValue::Json(value) => map.serialize_entry("value", value)?,
            ResultValue::Info(node) => map.serialize_entry("value", node.as_ref())?,
        }
        map.end()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawResult {
    #[serde(default)]
    error_code: ErrorCode,
    #[serde(rename = "type", default)]
    type_name: String,
    #[serde(default)]
    value: Option<Value>,
}

impl<'de> Deserialize<'de> for InfoResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawResult::deserialize(deserializer)?;

        // The type name tells nested snapshots apart from plain values.
        let value = match (raw.value, InfoKind::from_type_name(&raw.type_name)) {
            (None, _) => ResultValue::Empty,
            (Some(value), Some(kind)) => {
                let node = InfoNode::from_value(kind, value).map_err(D::Error::custom)?;
                ResultValue::Info(Box::new(node))
            }
            (Some(value), None) => ResultValue::from(value),
        };

        Ok(Self {
            error_code: raw.error_code,
            type_name: raw.type_name,
            value,
        })
    }
}

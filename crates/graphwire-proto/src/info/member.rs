//! Member nodes: methods, parameters, properties and events.

use super::{is_false, InfoHeader};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A method request or description.
///
/// `execute == false` asks for metadata only. Parameter order mirrors the
/// target method's declared signature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MethodInfo {
    #[serde(flatten)]
    pub header: InfoHeader,
    #[serde(default, skip_serializing_if = "is_false")]
    pub execute: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<ParameterInfo>,
}

impl MethodInfo {
    #[must_use]
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            header: InfoHeader::new(name, help),
            ..Self::default()
        }
    }

    /// Mark the method for invocation.
    #[must_use]
    pub fn with_execute(mut self, execute: bool) -> Self {
        self.execute = execute;
        self
    }

    /// Append a positional parameter.
    #[must_use]
    pub fn with_param(mut self, param: ParameterInfo) -> Self {
        self.params.push(param);
        self
    }

    #[must_use]
    pub fn shallow_copy(&self) -> Self {
        Self {
            header: self.header.clone(),
            ..Self::default()
        }
    }
}

/// A positional method parameter.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterInfo {
    #[serde(flatten)]
    pub header: InfoHeader,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl ParameterInfo {
    #[must_use]
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            header: InfoHeader::new(name, help),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into()).filter(|v| !v.is_null());
        self
    }

    #[must_use]
    pub fn shallow_copy(&self) -> Self {
        Self {
            header: self.header.clone(),
            ..Self::default()
        }
    }
}

/// A property read/write request or description.
///
/// A present `value` on a request expresses write intent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyInfo {
    #[serde(flatten)]
    pub header: InfoHeader,
    #[serde(rename = "type", default, skip_serializing_if = "String::is_empty")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub read: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub write: bool,
}

impl PropertyInfo {
    #[must_use]
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            header: InfoHeader::new(name, help),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into()).filter(|v| !v.is_null());
        self
    }

    #[must_use]
    pub fn is_write(&self) -> bool {
        self.value.is_some()
    }

    #[must_use]
    pub fn shallow_copy(&self) -> Self {
        Self {
            header: self.header.clone(),
            ..Self::default()
        }
    }
}

/// Subscription intent carried by an [`EventInfo`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum SubscribeAction {
    /// Metadata only; feedback messages always carry this.
    #[default]
    None,
    Subscribe,
    Unsubscribe,
}

impl From<SubscribeAction> for u8 {
    fn from(action: SubscribeAction) -> Self {
        action as u8
    }
}

impl TryFrom<u8> for SubscribeAction {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Subscribe),
            2 => Ok(Self::Unsubscribe),
            other => Err(format!("unknown subscribe action {other}")),
        }
    }
}

fn is_none_action(action: &SubscribeAction) -> bool {
    *action == SubscribeAction::None
}

/// An event subscription request, description or feedback leaf.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInfo {
    #[serde(flatten)]
    pub header: InfoHeader,
    #[serde(default, skip_serializing_if = "is_none_action")]
    pub subscribe_action: SubscribeAction,
}

impl EventInfo {
    #[must_use]
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            header: InfoHeader::new(name, help),
            subscribe_action: SubscribeAction::None,
        }
    }

    #[must_use]
    pub fn with_action(mut self, action: SubscribeAction) -> Self {
        self.subscribe_action = action;
        self
    }

    #[must_use]
    pub fn shallow_copy(&self) -> Self {
        Self {
            header: self.header.clone(),
            subscribe_action: SubscribeAction::None,
        }
    }
}

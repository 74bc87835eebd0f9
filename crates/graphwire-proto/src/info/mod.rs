//! The Info Tree: a closed set of node kinds describing one addressable
//! request or response.
//!
//! Every node shares an [`InfoHeader`] (name, help, last dispatch result).
//! [`InfoNode`] is the tagged union over the seven kinds; serialization is
//! a single match over the tag.

mod class;
mod member;
mod node;

pub use class::ClassInfo;
pub use member::{EventInfo, MethodInfo, ParameterInfo, PropertyInfo, SubscribeAction};
pub use node::{NodeGroupInfo, NodeInfo};

use crate::normalize;
use crate::result::InfoResult;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Contract violations when assembling a tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("{kind} with name '{name}' already exists")]
    DuplicateName { kind: InfoKind, name: String },

    #[error("node group '{group}' already has key {key}")]
    DuplicateKey { group: String, key: u32 },

    #[error("{parent} does not accept a {child} child")]
    IncompatibleChild { parent: InfoKind, child: InfoKind },

    #[error("node group '{group}' needs an explicit key for a new child")]
    KeyRequired { group: String },

    #[error("malformed path: {0}")]
    MalformedPath(String),
}

/// Fields shared by every node kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfoHeader {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<InfoResult>,
}

impl InfoHeader {
    /// Build a header, normalizing name and help.
    #[must_use]
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            name: normalize::name(name),
            help: normalize::help(help),
            result: None,
        }
    }
}

/// Discriminant of [`InfoNode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfoKind {
    Class,
    Method,
    Property,
    Parameter,
    Event,
    Node,
    NodeGroup,
}

impl InfoKind {
    /// Type name used in result payloads.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Class => "ClassInfo",
            Self::Method => "MethodInfo",
            Self::Property => "PropertyInfo",
            Self::Parameter => "ParameterInfo",
            Self::Event => "EventInfo",
            Self::Node => "NodeInfo",
            Self::NodeGroup => "NodeGroupInfo",
        }
    }

    /// Lowercase label used in human-readable messages.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Method => "method",
            Self::Property => "property",
            Self::Parameter => "parameter",
            Self::Event => "event",
            Self::Node => "node",
            Self::NodeGroup => "node group",
        }
    }

    #[must_use]
    pub fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "ClassInfo" => Some(Self::Class),
            "MethodInfo" => Some(Self::Method),
            "PropertyInfo" => Some(Self::Property),
            "ParameterInfo" => Some(Self::Parameter),
            "EventInfo" => Some(Self::Event),
            "NodeInfo" => Some(Self::Node),
            "NodeGroupInfo" => Some(Self::NodeGroup),
            _ => None,
        }
    }
}

impl std::fmt::Display for InfoKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any node of the Info Tree.
#[derive(Debug, Clone, PartialEq)]
pub enum InfoNode {
    Class(ClassInfo),
    Method(MethodInfo),
    Property(PropertyInfo),
    Parameter(ParameterInfo),
    Event(EventInfo),
    Node(NodeInfo),
    NodeGroup(NodeGroupInfo),
}

/// Borrowed view of a child node, as yielded by [`InfoNode::children`].
#[derive(Debug, Clone, Copy)]
pub enum InfoRef<'a> {
    Class(&'a ClassInfo),
    Keyed(u32, &'a ClassInfo),
    Method(&'a MethodInfo),
    Property(&'a PropertyInfo),
    Parameter(&'a ParameterInfo),
    Event(&'a EventInfo),
    Node(&'a NodeInfo),
    NodeGroup(&'a NodeGroupInfo),
}

impl InfoRef<'_> {
    #[must_use]
    pub fn kind(&self) -> InfoKind {
        match self {
            Self::Class(_) | Self::Keyed(..) => InfoKind::Class,
            Self::Method(_) => InfoKind::Method,
            Self::Property(_) => InfoKind::Property,
            Self::Parameter(_) => InfoKind::Parameter,
            Self::Event(_) => InfoKind::Event,
            Self::Node(_) => InfoKind::Node,
            Self::NodeGroup(_) => InfoKind::NodeGroup,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Class(c) | Self::Keyed(_, c) => &c.header.name,
            Self::Method(m) => &m.header.name,
            Self::Property(p) => &p.header.name,
            Self::Parameter(p) => &p.header.name,
            Self::Event(e) => &e.header.name,
            Self::Node(n) => &n.header.name,
            Self::NodeGroup(g) => &g.header.name,
        }
    }
}

impl InfoNode {
    #[must_use]
    pub fn kind(&self) -> InfoKind {
        match self {
            Self::Class(_) => InfoKind::Class,
            Self::Method(_) => InfoKind::Method,
            Self::Property(_) => InfoKind::Property,
            Self::Parameter(_) => InfoKind::Parameter,
            Self::Event(_) => InfoKind::Event,
            Self::Node(_) => InfoKind::Node,
            Self::NodeGroup(_) => InfoKind::NodeGroup,
        }
    }

    #[must_use]
    pub fn header(&self) -> &InfoHeader {
        match self {
            Self::Class(c) => &c.header,
            Self::Method(m) => &m.header,
            Self::Property(p) => &p.header,
            Self::Parameter(p) => &p.header,
            Self::Event(e) => &e.header,
            Self::Node(n) => &n.header,
            Self::NodeGroup(g) => &g.header,
        }
    }

    pub fn header_mut(&mut self) -> &mut InfoHeader {
        match self {
            Self::Class(c) => &mut c.header,
            Self::Method(m) => &mut m.header,
            Self::Property(p) => &mut p.header,
            Self::Parameter(p) => &mut p.header,
            Self::Event(e) => &mut e.header,
            Self::Node(n) => &mut n.header,
            Self::NodeGroup(g) => &mut g.header,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.header().name
    }

    /// Duplicate name, help and result only; children are not copied.
    #[must_use]
    pub fn shallow_copy(&self) -> Self {
        match self {
            Self::Class(c) => Self::Class(c.shallow_copy()),
            Self::Method(m) => Self::Method(m.shallow_copy()),
            Self::Property(p) => Self::Property(p.shallow_copy()),
            Self::Parameter(p) => Self::Parameter(p.shallow_copy()),
            Self::Event(e) => Self::Event(e.shallow_copy()),
            Self::Node(n) => Self::Node(n.shallow_copy()),
            Self::NodeGroup(g) => Self::NodeGroup(g.shallow_copy()),
        }
    }

    /// Add `child` to the collection matching its kind.
    ///
    /// Events, properties and parameters are leaves and accept nothing.
    pub fn add_child(&mut self, child: InfoNode) -> Result<(), TreeError> {
        match self {
            Self::Class(c) => c.add_child(child),
            Self::Method(m) => match child {
                Self::Parameter(p) => {
                    m.params.push(p);
                    Ok(())
                }
                other => Err(TreeError::IncompatibleChild {
                    parent: InfoKind::Method,
                    child: other.kind(),
                }),
            },
            Self::Node(n) => match child {
                Self::Class(c) if n.class.is_none() => {
                    n.class = Some(c);
                    Ok(())
                }
                Self::Class(_) => Err(TreeError::DuplicateName {
                    kind: InfoKind::Class,
                    name: n.header.name.clone(),
                }),
                other => Err(TreeError::IncompatibleChild {
                    parent: InfoKind::Node,
                    child: other.kind(),
                }),
            },
            Self::NodeGroup(g) => match child {
                Self::Class(_) => Err(TreeError::KeyRequired {
                    group: g.header.name.clone(),
                }),
                other => Err(TreeError::IncompatibleChild {
                    parent: InfoKind::NodeGroup,
                    child: other.kind(),
                }),
            },
            Self::Property(_) | Self::Parameter(_) | Self::Event(_) => {
                Err(TreeError::IncompatibleChild {
                    parent: self.kind(),
                    child: child.kind(),
                })
            }
        }
    }

    /// The node's own child collection.
    #[must_use]
    pub fn children(&self) -> Vec<InfoRef<'_>> {
        match self {
            Self::Class(c) => c.children(),
            Self::Method(m) => m.params.iter().map(InfoRef::Parameter).collect(),
            Self::Node(n) => n.class.iter().map(InfoRef::Class).collect(),
            Self::NodeGroup(g) => g.nodes.iter().map(|(k, c)| InfoRef::Keyed(*k, c)).collect(),
            Self::Property(_) | Self::Parameter(_) | Self::Event(_) => Vec::new(),
        }
    }

    /// Decode a node of a known kind from a JSON value.
    pub fn from_value(kind: InfoKind, value: Value) -> Result<Self, serde_json::Error> {
        Ok(match kind {
            InfoKind::Class => Self::Class(serde_json::from_value(value)?),
            InfoKind::Method => Self::Method(serde_json::from_value(value)?),
            InfoKind::Property => Self::Property(serde_json::from_value(value)?),
            InfoKind::Parameter => Self::Parameter(serde_json::from_value(value)?),
            InfoKind::Event => Self::Event(serde_json::from_value(value)?),
            InfoKind::Node => Self::Node(serde_json::from_value(value)?),
            InfoKind::NodeGroup => Self::NodeGroup(serde_json::from_value(value)?),
        })
    }
}

impl Serialize for InfoNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Class(c) => c.serialize(serializer),
            Self::Method(m) => m.serialize(serializer),
            Self::Property(p) => p.serialize(serializer),
            Self::Parameter(p) => p.serialize(serializer),
            Self::Event(e) => e.serialize(serializer),
            Self::Node(n) => n.serialize(serializer),
            Self::NodeGroup(g) => g.serialize(serializer),
        }
    }
}

macro_rules! impl_from_kind {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for InfoNode {
                fn from(node: $ty) -> Self {
                    Self::$variant(node)
                }
            }
        )*
    };
}

impl_from_kind! {
    Class => ClassInfo,
    Method => MethodInfo,
    Property => PropertyInfo,
    Parameter => ParameterInfo,
    Event => EventInfo,
    Node => NodeInfo,
    NodeGroup => NodeGroupInfo,
}

pub(crate) fn is_false(value: &bool) -> bool {
    !*value
}

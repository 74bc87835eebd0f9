use super::{
    is_false, EventInfo, InfoHeader, InfoKind, InfoNode, InfoRef, MethodInfo, NodeGroupInfo,
    NodeInfo, PropertyInfo, TreeError,
};
use serde::{Deserialize, Serialize};

/// The non-leaf node: one addressed object and the members requested on it.
///
/// Each collection holds uniquely named entries; the `add_*` methods enforce
/// this. Decoded messages are taken as they come.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassInfo {
    #[serde(flatten)]
    pub header: InfoHeader,
    /// The instance is a remote facade.
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_proxy: bool,
    /// Contract names the instance can be addressed as.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub proxy_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<EventInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub methods: Vec<MethodInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nodes: Vec<NodeInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub node_groups: Vec<NodeGroupInfo>,
}

fn ensure_unique<'a>(
    mut names: impl Iterator<Item = &'a str>,
    kind: InfoKind,
    name: &str,
) -> Result<(), TreeError> {
    if names.any(|existing| existing == name) {
        return Err(TreeError::DuplicateName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

impl ClassInfo {
    #[must_use]
    pub fn new(name: &str, help: &str) -> Self {
        Self {
            header: InfoHeader::new(name, help),
            ..Self::default()
        }
    }

    /// True when all six collections are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.proxy_types.is_empty()
            && self.events.is_empty()
            && self.methods.is_empty()
            && self.properties.is_empty()
            && self.nodes.is_empty()
            && self.node_groups.is_empty()
    }

    #[must_use]
    pub fn shallow_copy(&self) -> Self {
        Self {
            header: self.header.clone(),
            ..Self::default()
        }
    }

    pub fn add_proxy_type(&mut self, contract: impl Into<String>) -> Result<(), TreeError> {
        let contract = contract.into();
        ensure_unique(
            self.proxy_types.iter().map(String::as_str),
            InfoKind::Class,
            &contract,
        )?;
        self.proxy_types.push(contract);
        Ok(())
    }

    pub fn add_event(&mut self, event: EventInfo) -> Result<(), TreeError> {
        ensure_unique(
            self.events.iter().map(|e| e.header.name.as_str()),
            InfoKind::Event,
            &event.header.name,
        )?;
        self.events.push(event);
        Ok(())
    }

    pub fn add_method(&mut self, method: MethodInfo) -> Result<(), TreeError> {
        ensure_unique(
            self.methods.iter().map(|m| m.header.name.as_str()),
            InfoKind::Method,
            &method.header.name,
        )?;
        self.methods.push(method);
        Ok(())
    }

    pub fn add_property(&mut self, property: PropertyInfo) -> Result<(), TreeError> {
        ensure_unique(
            self.properties.iter().map(|p| p.header.name.as_str()),
            InfoKind::Property,
            &property.header.name,
        )?;
        self.properties.push(property);
        Ok(())
    }

    pub fn add_node(&mut self, node: NodeInfo) -> Result<(), TreeError> {
        ensure_unique(
            self.nodes.iter().map(|n| n.header.name.as_str()),
            InfoKind::Node,
            &node.header.name,
        )?;
        self.nodes.push(node);
        Ok(())
    }

    pub fn add_node_group(&mut self, group: NodeGroupInfo) -> Result<(), TreeError> {
        ensure_unique(
            self.node_groups.iter().map(|g| g.header.name.as_str()),
            InfoKind::NodeGroup,
            &group.header.name,
        )?;
        self.node_groups.push(group);
        Ok(())
    }

    /// Add `child` to the collection matching its kind.
    pub fn add_child(&mut self, child: InfoNode) -> Result<(), TreeError> {
        match child {
            InfoNode::Event(e) => self.add_event(e),
            InfoNode::Method(m) => self.add_method(m),
            InfoNode::Property(p) => self.add_property(p),
            InfoNode::Node(n) => self.add_node(n),
            InfoNode::NodeGroup(g) => self.add_node_group(g),
            other => Err(TreeError::IncompatibleChild {
                parent: InfoKind::Class,
                child: other.kind(),
            }),
        }
    }

    /// Events, methods, properties, nodes and node groups, in that order.
    #[must_use]
    pub fn children(&self) -> Vec<InfoRef<'_>> {
        self.events
            .iter()
            .map(InfoRef::Event)
            .chain(self.methods.iter().map(InfoRef::Method))
            .chain(self.properties.iter().map(InfoRef::Property))
            .chain(self.nodes.iter().map(InfoRef::Node))
            .chain(self.node_groups.iter().map(InfoRef::NodeGroup))
            .collect()
    }

    #[must_use]
    pub fn event(&self, name: &str) -> Option<&EventInfo> {
        self.events.iter().find(|e| e.header.name == name)
    }

    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.header.name == name)
    }

    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyInfo> {
        self.properties.iter().find(|p| p.header.name == name)
    }

    #[must_use]
    pub fn node(&self, name: &str) -> Option<&NodeInfo> {
        self.nodes.iter().find(|n| n.header.name == name)
    }

    #[must_use]
    pub fn node_group(&self, name: &str) -> Option<&NodeGroupInfo> {
        self.node_groups.iter().find(|g| g.header.name == name)
    }

    pub fn event_mut(&mut self, name: &str) -> Option<&mut EventInfo> {
        self.events.iter_mut().find(|e| e.header.name == name)
    }

    pub fn method_mut(&mut self, name: &str) -> Option<&mut MethodInfo> {
        self.methods.iter_mut().find(|m| m.header.name == name)
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut PropertyInfo> {
        self.properties.iter_mut().find(|p| p.header.name == name)
    }

    pub fn node_mut(&mut self, name: &str) -> Option<&mut NodeInfo> {
        self.nodes.iter_mut().find(|n| n.header.name == name)
    }

    pub fn node_group_mut(&mut self, name: &str) -> Option<&mut NodeGroupInfo> {
        self.node_groups.iter_mut().find(|g| g.header.name == name)
    }
}

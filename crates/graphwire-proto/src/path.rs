//! Minimal root-to-leaf addressing paths.
//!
//! A path is a stack of steps recorded while walking a tree: a class, then a
//! node or a keyed node-group entry leading to the next class, and so on,
//! optionally ending in a member leaf. [`materialize`] rebuilds the smallest
//! tree that addresses exactly that leaf.

use crate::info::{ClassInfo, EventInfo, InfoNode, NodeGroupInfo, NodeInfo, TreeError};

/// One step of an addressing path.
#[derive(Debug, Clone, PartialEq)]
pub enum PathStep {
    Class(ClassInfo),
    Node(NodeInfo),
    /// A node group and the key of the entry that was followed.
    Keyed(NodeGroupInfo, u32),
    /// A terminal member: event, property or method.
    Leaf(InfoNode),
}

impl PathStep {
    /// A class step carrying only the class name and help.
    #[must_use]
    pub fn class(class: &ClassInfo) -> Self {
        Self::Class(bare_class(class))
    }

    #[must_use]
    pub fn node(node: &NodeInfo) -> Self {
        Self::Node(bare_node(node))
    }

    #[must_use]
    pub fn keyed(group: &NodeGroupInfo, key: u32) -> Self {
        Self::Keyed(bare_group(group), key)
    }
}

// Containers on a path only address the leaf; results never travel along.

fn bare_class(class: &ClassInfo) -> ClassInfo {
    let mut class = class.shallow_copy();
    class.header.result = None;
    class
}

fn bare_node(node: &NodeInfo) -> NodeInfo {
    let mut node = node.shallow_copy();
    node.header.result = None;
    node
}

fn bare_group(group: &NodeGroupInfo) -> NodeGroupInfo {
    let mut group = group.shallow_copy();
    group.header.result = None;
    group
}

/// Rebuild a root-to-leaf chain from `steps`.
///
/// Classes and containers are shallow-copied without their results; the
/// leaf is copied whole so a method keeps its parameters and an event its
/// action.
pub fn materialize(steps: &[PathStep]) -> Result<ClassInfo, TreeError> {
    let Some((first, rest)) = steps.split_first() else {
        return Err(TreeError::MalformedPath("empty path".to_string()));
    };
    let PathStep::Class(class) = first else {
        return Err(TreeError::MalformedPath(
            "path must start with a class".to_string(),
        ));
    };

    let mut class = bare_class(class);
    match rest.split_first() {
        None => {}
        Some((PathStep::Leaf(leaf), tail)) => {
            if !tail.is_empty() {
                return Err(TreeError::MalformedPath(
                    "leaf must be the last step".to_string(),
                ));
            }
            class.add_child(leaf.clone())?;
        }
        Some((PathStep::Node(node), tail)) => {
            let node = bare_node(node).with_class(materialize(tail)?);
            class.add_node(node)?;
        }
        Some((PathStep::Keyed(group, key), tail)) => {
            let mut group = bare_group(group);
            group.insert(*key, materialize(tail)?)?;
            class.add_node_group(group)?;
        }
        Some((PathStep::Class(_), _)) => {
            return Err(TreeError::MalformedPath(
                "a class must follow a node or a keyed group".to_string(),
            ));
        }
    }
    Ok(class)
}

/// Decompose a single-chain tree back into its steps.
///
/// Every class on the way must have exactly one child.
pub fn steps_of(root: &ClassInfo) -> Result<Vec<PathStep>, TreeError> {
    let mut steps = Vec::new();
    let mut class = root;
    loop {
        steps.push(PathStep::class(class));
        let count = class.events.len()
            + class.methods.len()
            + class.properties.len()
            + class.nodes.len()
            + class.node_groups.iter().map(|g| g.nodes.len()).sum::<usize>();
        if count != 1 {
            return Err(TreeError::MalformedPath(format!(
                "class '{}' has {count} children, expected one",
                class.header.name
            )));
        }

        if let Some(node) = class.nodes.first() {
            steps.push(PathStep::node(node));
            class = node.class.as_ref().ok_or_else(|| {
                TreeError::MalformedPath(format!("node '{}' has no class", node.header.name))
            })?;
            continue;
        }
        if let Some((group, (key, next))) = class
            .node_groups
            .iter()
            .find_map(|g| g.nodes.iter().next().map(|entry| (g, entry)))
        {
            steps.push(PathStep::keyed(group, *key));
            class = next;
            continue;
        }

        let leaf = if let Some(event) = class.events.first() {
            InfoNode::Event(event.clone())
        } else if let Some(property) = class.properties.first() {
            InfoNode::Property(property.clone())
        } else if let Some(method) = class.methods.first() {
            InfoNode::Method(method.clone())
        } else {
            return Err(TreeError::MalformedPath("path has no leaf".to_string()));
        };
        steps.push(PathStep::Leaf(leaf));
        return Ok(steps);
    }
}

/// The event leaf at the end of a single chain, if any.
pub fn leaf_event_mut(class: &mut ClassInfo) -> Option<&mut EventInfo> {
    if !class.events.is_empty() {
        return class.events.first_mut();
    }
    let next = if let Some(node) = class.nodes.first_mut() {
        node.class.as_mut()?
    } else {
        class.node_groups.first_mut()?.nodes.values_mut().next()?
    };
    leaf_event_mut(next)
}

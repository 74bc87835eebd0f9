//! Metadata snapshots of live instances.
//!
//! A snapshot describes what an instance exposes: its members with their
//! declared types and, for readable properties, current values. Nested
//! objects are described only while the remaining depth is above zero.

use crate::registry::{
    type_id_of, CapabilityRegistry, EventDescriptor, Instance, Member, MemberKind,
    MethodDescriptor, NodeDescriptor, NodeGroupDescriptor, PropertyDescriptor,
};
use graphwire_proto::{
    ClassInfo, EventInfo, MethodInfo, NodeGroupInfo, NodeInfo, ParameterInfo, PropertyInfo,
};
use tracing::trace;

/// Describe `instance` and, up to `depth` levels down, its nested objects.
#[must_use]
pub fn class(registry: &dyn CapabilityRegistry, instance: &Instance, depth: usize) -> ClassInfo {
    let Some(summary) = registry.type_summary(instance) else {
        return ClassInfo::default();
    };
    trace!(contract = %summary.contract, depth, "Snapshot");

    let mut class = ClassInfo::new(&summary.contract, &summary.help);
    class.is_proxy = summary.is_proxy;
    class.proxy_types = summary.proxy_types;

    let type_id = type_id_of(instance);
    for member in registry.enumerate(MemberKind::Event, type_id) {
        if let Member::Event(d) = member {
            class.events.push(event(&d));
        }
    }
    for member in registry.enumerate(MemberKind::Method, type_id) {
        if let Member::Method(d) = member {
            class.methods.push(method(&d));
        }
    }
    for member in registry.enumerate(MemberKind::Property, type_id) {
        if let Member::Property(d) = member {
            class.properties.push(property(registry, &d, instance));
        }
    }
    for member in registry.enumerate(MemberKind::Node, type_id) {
        if let Member::Node(d) = member {
            class.nodes.push(node(registry, &d, instance, depth));
        }
    }
    for member in registry.enumerate(MemberKind::NodeGroup, type_id) {
        if let Member::NodeGroup(d) = member {
            class.node_groups.push(node_group(registry, &d, instance, depth));
        }
    }
    class
}

#[must_use]
pub fn method(descriptor: &MethodDescriptor) -> MethodInfo {
    let mut method = MethodInfo::new(&descriptor.name, &descriptor.help);
    method.params = descriptor
        .params
        .iter()
        .map(|p| ParameterInfo::new(&p.name, &p.help).with_type(p.value_type.name()))
        .collect();
    method
}

#[must_use]
pub fn event(descriptor: &EventDescriptor) -> EventInfo {
    EventInfo::new(&descriptor.name, &descriptor.help)
}

/// Describe a property, including its current value when it can be read.
#[must_use]
pub fn property(
    registry: &dyn CapabilityRegistry,
    descriptor: &PropertyDescriptor,
    instance: &Instance,
) -> PropertyInfo {
    let mut property = PropertyInfo::new(&descriptor.name, &descriptor.help);
    property.type_name = descriptor.value_type.name().to_string();
    property.read = descriptor.can_read();
    property.write = descriptor.can_write();
    if property.read {
        if let Ok(value) = registry.get(descriptor, instance) {
            property.value = Some(value).filter(|v| !v.is_null());
        }
    }
    property
}

#[must_use]
pub fn node(
    registry: &dyn CapabilityRegistry,
    descriptor: &NodeDescriptor,
    instance: &Instance,
    depth: usize,
) -> NodeInfo {
    let mut node = NodeInfo::new(&descriptor.name, &descriptor.help);
    if depth > 0 {
        if let Some(nested) = registry.node(descriptor, instance) {
            node.class = Some(class(registry, &nested, depth - 1));
        }
    }
    node
}

#[must_use]
pub fn node_group(
    registry: &dyn CapabilityRegistry,
    descriptor: &NodeGroupDescriptor,
    instance: &Instance,
    depth: usize,
) -> NodeGroupInfo {
    let mut group = NodeGroupInfo::new(&descriptor.name, &descriptor.help);
    if depth > 0 {
        for (key, nested) in registry.node_group(descriptor, instance) {
            if let Some(nested) = nested {
                group.nodes.insert(key, class(registry, &nested, depth - 1));
            }
        }
    }
    group
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{
        MethodDef, NodeDef, NodeGroupDef, PropertyDef, StaticRegistry, TypeBuilder, ValueType,
    };
    use serde_json::json;
    use std::sync::Arc;

    struct Leaf;

    struct Branch {
        leaf: Arc<Leaf>,
        leaves: Vec<Arc<Leaf>>,
    }

    fn registry() -> StaticRegistry {
        StaticRegistry::builder()
            .register(
                TypeBuilder::<Leaf>::new("Leaf")
                    .help("a leaf")
                    .property(PropertyDef::new("Colour", ValueType::String).get(|_: &Leaf| "green"))
                    .property(PropertyDef::new("Secret", ValueType::String).set(
                        |_: &Leaf, _: String| Ok(()),
                    )),
            )
            .unwrap()
            .register(
                TypeBuilder::<Branch>::new("Branch")
                    .method(
                        MethodDef::new("Grow")
                            .param("Length", ValueType::Float)
                            .param("Direction", ValueType::enumeration("Dir", ["Up", "Down"])),
                    )
                    .node(NodeDef::new("Tip", |b: &Branch| Some(Arc::clone(&b.leaf))))
                    .node_group(NodeGroupDef::new("Leaves", |b: &Branch| {
                        (1..)
                            .zip(b.leaves.iter().map(|l| Some(Arc::clone(l))))
                            .collect()
                    })),
            )
            .unwrap()
            .build()
    }

    fn branch() -> Instance {
        Arc::new(Branch {
            leaf: Arc::new(Leaf),
            leaves: vec![Arc::new(Leaf), Arc::new(Leaf)],
        })
    }

    #[test]
    fn test_depth_zero_lists_members_only() {
        let registry = registry();
        let snap = class(&registry, &branch(), 0);

        assert_eq!(snap.header.name, "Branch");
        assert_eq!(snap.node("Tip").unwrap().class, None);
        assert_eq!(snap.node_group("Leaves").unwrap().node_count(), 0);

        let grow = snap.method("Grow").unwrap();
        let types: Vec<&str> = grow.params.iter().map(|p| p.type_name.as_str()).collect();
        assert_eq!(types, ["f64", "Dir"]);
    }

    #[test]
    fn test_depth_one_describes_nested_objects() {
        let registry = registry();
        let snap = class(&registry, &branch(), 1);

        let tip = snap.node("Tip").unwrap().class.as_ref().unwrap();
        assert_eq!(tip.header.help, "A leaf.");
        let colour = tip.property("Colour").unwrap();
        assert_eq!(colour.value, Some(json!("green")));
        assert!(colour.read && !colour.write);

        let secret = tip.property("Secret").unwrap();
        assert_eq!(secret.value, None);
        assert!(!secret.read && secret.write);

        let leaves = snap.node_group("Leaves").unwrap();
        assert_eq!(leaves.nodes.keys().copied().collect::<Vec<_>>(), [1, 2]);
        // Depth is exhausted one level down.
        assert!(leaves.get(1).unwrap().property("Colour").is_some());
    }

    #[test]
    fn test_unregistered_instance_is_empty() {
        let registry = registry();
        let other: Instance = Arc::new("plain string");
        assert!(class(&registry, &other, 3).is_empty());
    }
}

//! Capability Registry: member discovery and access for live instances.
//!
//! Dispatch never inspects domain types directly. It asks a
//! [`CapabilityRegistry`] to resolve a member by kind and name on a live
//! [`Instance`], then reads, writes, invokes or subscribes through the
//! returned descriptor. [`StaticRegistry`] is the table-driven implementation
//! built from typed [`TypeBuilder`] registrations at startup.

pub mod define;
pub mod event;
pub mod member;
pub mod static_registry;
pub mod value;

pub use define::{EventDef, MethodDef, NodeDef, NodeGroupDef, PropertyDef};
pub use event::{EventCallback, EventPayload, EventSource, EventToken};
pub use member::{
    Args, EventDescriptor, Fault, Member, MemberError, MemberKind, MethodDescriptor,
    NodeDescriptor, NodeGroupDescriptor, ParamDescriptor, PropertyDescriptor,
};
pub use static_registry::{RegistryBuilder, StaticRegistry, TypeBuilder};
pub use value::{CoercionError, EnumType, ValueType};

use serde_json::Value;
use std::any::{Any, TypeId};
use std::sync::Arc;
use thiserror::Error;

/// A live object in the addressed graph.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// The concrete runtime type of an instance.
#[must_use]
pub fn type_id_of(instance: &Instance) -> TypeId {
    let target: &dyn Any = &**instance;
    target.type_id()
}

/// Identity of an instance: the address of its allocation.
pub(crate) fn address_of(instance: &Instance) -> usize {
    Arc::as_ptr(instance).cast::<()>() as usize
}

/// Registration mistakes, reported when the registry is built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("{contract} declares {kind} '{name}' more than once")]
    DuplicateMember {
        contract: String,
        kind: MemberKind,
        name: String,
    },

    #[error("type {rust_type} is registered more than once")]
    DuplicateType { rust_type: &'static str },
}

/// Contract-level facts about a registered type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSummary {
    pub contract: String,
    pub help: String,
    pub is_proxy: bool,
    /// Contract names the type can be addressed as, its own first.
    pub proxy_types: Vec<String>,
}

/// Member discovery and access over live instances.
///
/// Implementations provide discovery. Access goes through the resolved
/// descriptors and rarely needs overriding.
pub trait CapabilityRegistry: Send + Sync {
    /// Contract facts for the instance's concrete type, if registered.
    fn type_summary(&self, instance: &Instance) -> Option<TypeSummary>;

    /// Resolve a member by declared contract name.
    fn resolve(&self, kind: MemberKind, instance: &Instance, name: &str) -> Option<Member>;

    /// All members of one kind declared for a type, in declaration order.
    fn enumerate(&self, kind: MemberKind, type_id: TypeId) -> Vec<Member>;

    fn type_name(&self, instance: &Instance) -> Option<String> {
        self.type_summary(instance).map(|s| s.contract)
    }

    fn get(&self, property: &PropertyDescriptor, instance: &Instance) -> Result<Value, Fault> {
        property.read(&**instance)
    }

    fn set(
        &self,
        property: &PropertyDescriptor,
        instance: &Instance,
        value: &Value,
    ) -> Result<(), MemberError> {
        property.write(&**instance, value)
    }

    fn invoke(
        &self,
        method: &MethodDescriptor,
        instance: &Instance,
        args: &[Value],
    ) -> Result<(), MemberError> {
        method.invoke(&**instance, args)
    }

    fn attach_event(
        &self,
        event: &EventDescriptor,
        instance: &Instance,
        callback: EventCallback,
    ) -> Result<EventToken, Fault> {
        let source = event_source(event, instance)?;
        Ok(source.attach(callback))
    }

    fn detach_event(
        &self,
        event: &EventDescriptor,
        instance: &Instance,
        token: EventToken,
    ) -> Result<(), Fault> {
        let source = event_source(event, instance)?;
        if source.detach(token) {
            Ok(())
        } else {
            Err(Fault::new(
                "NotAttached",
                format!("no handler {token:?} on {}", event.name),
            ))
        }
    }

    /// The nested instance behind a node, if present.
    fn node(&self, node: &NodeDescriptor, instance: &Instance) -> Option<Instance> {
        node.resolve(&**instance)
    }

    fn node_group(
        &self,
        group: &NodeGroupDescriptor,
        instance: &Instance,
    ) -> Vec<(u32, Option<Instance>)> {
        group.entries(&**instance)
    }

    fn property(&self, instance: &Instance, name: &str) -> Option<Arc<PropertyDescriptor>> {
        match self.resolve(MemberKind::Property, instance, name)? {
            Member::Property(d) => Some(d),
            _ => None,
        }
    }

    fn method(&self, instance: &Instance, name: &str) -> Option<Arc<MethodDescriptor>> {
        match self.resolve(MemberKind::Method, instance, name)? {
            Member::Method(d) => Some(d),
            _ => None,
        }
    }

    fn event(&self, instance: &Instance, name: &str) -> Option<Arc<EventDescriptor>> {
        match self.resolve(MemberKind::Event, instance, name)? {
            Member::Event(d) => Some(d),
            _ => None,
        }
    }

    fn node_member(&self, instance: &Instance, name: &str) -> Option<Arc<NodeDescriptor>> {
        match self.resolve(MemberKind::Node, instance, name)? {
            Member::Node(d) => Some(d),
            _ => None,
        }
    }

    fn node_group_member(
        &self,
        instance: &Instance,
        name: &str,
    ) -> Option<Arc<NodeGroupDescriptor>> {
        match self.resolve(MemberKind::NodeGroup, instance, name)? {
            Member::NodeGroup(d) => Some(d),
            _ => None,
        }
    }
}

fn event_source(event: &EventDescriptor, instance: &Instance) -> Result<EventSource, Fault> {
    event
        .source(&**instance)
        .ok_or_else(|| Fault::new("NoEventSource", format!("{} has no source", event.name)))
}

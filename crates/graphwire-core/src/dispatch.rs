//! Dispatch Engine: executes a request tree against a live object graph.
//!
//! Each member in the request is resolved by name on the instance its class
//! addresses and the outcome is written into that member's `result`. The
//! response is the request tree itself, so it mirrors the request's shape.
//! Nothing a request contains makes dispatch fail as a whole; every problem
//! is reported on the node it concerns and siblings carry on.

use crate::config::Config;
use crate::feedback::FeedbackCache;
use crate::registry::{CapabilityRegistry, Instance, MemberError, MemberKind};
use crate::requestor::Requestor;
use crate::snapshot;
use graphwire_proto::{
    ClassInfo, ErrorCode, EventInfo, InfoNode, InfoResult, MethodInfo, NodeGroupInfo, NodeInfo,
    PathStep, PropertyInfo, SubscribeAction,
};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Explicit context for one dispatch: the graph root and who is asking.
#[derive(Clone)]
pub struct Session {
    pub root: Instance,
    pub requestor: Arc<dyn Requestor>,
}

impl Session {
    #[must_use]
    pub fn new(root: Instance, requestor: Arc<dyn Requestor>) -> Self {
        Self { root, requestor }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("requestor", &self.requestor.label())
            .finish_non_exhaustive()
    }
}

fn missing(kind: MemberKind, name: &str) -> InfoResult {
    InfoResult::error(
        ErrorCode::MissingMember,
        format!("No {kind} with name {name}."),
    )
}

fn member_failure(err: MemberError) -> InfoResult {
    match err {
        MemberError::Coercion(e) => InfoResult::error(ErrorCode::InvalidParameter, e.to_string()),
        MemberError::ParameterCount { expected, actual } => InfoResult::error(
            ErrorCode::InvalidParameter,
            format!("Expected {expected} parameters, got {actual}."),
        ),
        MemberError::Fault(f) => InfoResult::exception(f.type_name, f.message),
    }
}

/// Matches request trees against live instances.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<dyn CapabilityRegistry>,
    feedback: FeedbackCache,
    metadata_depth: usize,
}

impl Dispatcher {
    #[must_use]
    pub fn new(registry: Arc<dyn CapabilityRegistry>, feedback: FeedbackCache) -> Self {
        Self {
            registry,
            feedback,
            metadata_depth: crate::config::DEFAULT_METADATA_DEPTH,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: &Config) -> Self {
        self.metadata_depth = config.metadata_depth;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<dyn CapabilityRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn feedback(&self) -> &FeedbackCache {
        &self.feedback
    }

    /// Execute `request` against the session root, writing results in place.
    pub fn dispatch(&self, session: &Session, request: &mut ClassInfo) {
        let mut walk = Walk {
            session,
            path: Vec::new(),
        };
        self.dispatch_class(&mut walk, &session.root, request);
    }

    fn dispatch_class(&self, walk: &mut Walk<'_>, instance: &Instance, class: &mut ClassInfo) {
        if class.is_empty() {
            self.fill_snapshot(instance, class);
            return;
        }

        walk.path.push(PathStep::class(class));
        for event in &mut class.events {
            self.dispatch_event(walk, instance, event);
        }
        for method in &mut class.methods {
            self.dispatch_method(instance, method);
        }
        for property in &mut class.properties {
            self.dispatch_property(instance, property);
        }
        for node in &mut class.nodes {
            self.dispatch_node(walk, instance, node);
        }
        for group in &mut class.node_groups {
            self.dispatch_node_group(walk, instance, group);
        }
        walk.path.pop();
    }

    /// Answer an empty class with a description of the instance.
    fn fill_snapshot(&self, instance: &Instance, class: &mut ClassInfo) {
        let snap = snapshot::class(self.registry.as_ref(), instance, self.metadata_depth);
        if class.header.name.is_empty() {
            class.header.name = snap.header.name;
        }
        if class.header.help.is_empty() {
            class.header.help = snap.header.help;
        }
        class.is_proxy = snap.is_proxy;
        class.proxy_types = snap.proxy_types;
        class.events = snap.events;
        class.methods = snap.methods;
        class.properties = snap.properties;
        class.nodes = snap.nodes;
        class.node_groups = snap.node_groups;
        class.header.result = Some(InfoResult::ok());
    }

    fn dispatch_property(&self, instance: &Instance, property: &mut PropertyInfo) {
        let name = &property.header.name;
        let Some(descriptor) = self.registry.property(instance, name) else {
            property.header.result = Some(missing(MemberKind::Property, name));
            return;
        };

        let write = property.is_write();
        if write {
            if !descriptor.can_write() {
                property.header.result = Some(InfoResult::error(
                    ErrorCode::MissingMember,
                    format!("Property {name} is read-only."),
                ));
                return;
            }
            let value = property.value.clone().unwrap_or(Value::Null);
            if let Err(err) = self.registry.set(&descriptor, instance, &value) {
                debug!(property = %name, %err, "Property write failed");
                property.header.result = Some(member_failure(err));
                return;
            }
        }

        property.header.result = Some(if descriptor.can_read() {
            match self.registry.get(&descriptor, instance) {
                Ok(value) => InfoResult::ok_value(descriptor.value_type.name(), value),
                Err(fault) => InfoResult::exception(fault.type_name, fault.message),
            }
        } else if write {
            InfoResult::ok()
        } else {
            InfoResult::error(
                ErrorCode::MissingMember,
                format!("Property {name} is write-only."),
            )
        });
    }

    fn dispatch_method(&self, instance: &Instance, method: &mut MethodInfo) {
        let name = &method.header.name;
        let Some(descriptor) = self.registry.method(instance, name) else {
            method.header.result = Some(missing(MemberKind::Method, name));
            return;
        };

        if !method.execute {
            method.header.result = Some(InfoResult::ok_info(InfoNode::Method(snapshot::method(
                &descriptor,
            ))));
            return;
        }

        let args: Vec<Value> = method
            .params
            .iter()
            .map(|p| p.value.clone().unwrap_or(Value::Null))
            .collect();
        trace!(method = %name, args = args.len(), "Invoking");
        method.header.result = Some(match self.registry.invoke(&descriptor, instance, &args) {
            Ok(()) => InfoResult::ok(),
            Err(err) => {
                debug!(method = %name, %err, "Invocation failed");
                member_failure(err)
            }
        });
    }

    fn dispatch_event(&self, walk: &Walk<'_>, instance: &Instance, event: &mut EventInfo) {
        let name = &event.header.name;
        let Some(descriptor) = self.registry.event(instance, name) else {
            event.header.result = Some(missing(MemberKind::Event, name));
            return;
        };

        let requestor = &walk.session.requestor;
        let outcome = match event.subscribe_action {
            SubscribeAction::None => {
                event.header.result = Some(InfoResult::ok_info(InfoNode::Event(
                    snapshot::event(&descriptor),
                )));
                return;
            }
            SubscribeAction::Subscribe => {
                let mut path = walk.path.clone();
                path.push(PathStep::Leaf(InfoNode::Event(event.shallow_copy())));
                self.feedback
                    .subscribe(requestor, instance, &descriptor, &path)
            }
            SubscribeAction::Unsubscribe => {
                self.feedback.unsubscribe(requestor, instance, &descriptor)
            }
        };

        event.header.result = Some(match outcome {
            Ok(()) => InfoResult::ok(),
            Err(fault) => InfoResult::exception(fault.type_name, fault.message),
        });
    }

    fn dispatch_node(&self, walk: &mut Walk<'_>, instance: &Instance, node: &mut NodeInfo) {
        let name = &node.header.name;
        let Some(descriptor) = self.registry.node_member(instance, name) else {
            node.header.result = Some(missing(MemberKind::Node, name));
            return;
        };
        let Some(nested) = self.registry.node(&descriptor, instance) else {
            node.header.result = Some(InfoResult::error(
                ErrorCode::MissingNode,
                format!("Node {name} is not present."),
            ));
            return;
        };

        walk.path.push(PathStep::node(node));
        self.dispatch_class(walk, &nested, node.class_mut());
        walk.path.pop();
        node.header.result = Some(InfoResult::ok());
    }

    fn dispatch_node_group(
        &self,
        walk: &mut Walk<'_>,
        instance: &Instance,
        group: &mut NodeGroupInfo,
    ) {
        let name = &group.header.name;
        let Some(descriptor) = self.registry.node_group_member(instance, name) else {
            group.header.result = Some(missing(MemberKind::NodeGroup, name));
            return;
        };

        if group.nodes.is_empty() {
            let snap = snapshot::node_group(
                self.registry.as_ref(),
                &descriptor,
                instance,
                self.metadata_depth,
            );
            group.nodes = snap.nodes;
            if group.header.help.is_empty() {
                group.header.help = snap.header.help;
            }
            group.header.result = Some(InfoResult::ok());
            return;
        }

        let entries = self.registry.node_group(&descriptor, instance);
        let step = group.shallow_copy();
        for (key, class) in &mut group.nodes {
            let nested = entries
                .iter()
                .find(|(k, _)| k == key)
                .and_then(|(_, nested)| nested.clone());
            let Some(nested) = nested else {
                class.header.result = Some(InfoResult::error(
                    ErrorCode::MissingNode,
                    format!("No node with key {key} in {}.", step.header.name),
                ));
                continue;
            };

            walk.path.push(PathStep::keyed(&step, *key));
            self.dispatch_class(walk, &nested, class);
            walk.path.pop();
        }
        group.header.result = Some(InfoResult::ok());
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("feedback", &self.feedback)
            .field("metadata_depth", &self.metadata_depth)
            .finish_non_exhaustive()
    }
}

/// State carried down one dispatch pass.
struct Walk<'a> {
    session: &'a Session,
    /// Shallow copies of the containers above the current class.
    path: Vec<PathStep>,
}

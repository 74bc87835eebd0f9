//! Fluent construction of request trees.
//!
//! ```ignore
//! let request = CommandBuilder::new("Robot")
//!     .set_property("Mode", "Running")
//!     .at_node("Arm")
//!     .call_method("MoveTo")
//!     .param("X", 10)
//!     .param("Y", 4)
//!     .complete_method()
//!     .to_root()
//!     .at_node_group("Axes")
//!     .at_key(2)
//!     .subscribe_event("PositionChanged")
//!     .complete();
//! ```
//!
//! Every step is an upsert: addressing a member or container that already
//! exists reuses it.

use graphwire_proto::path::{self, PathStep};
use graphwire_proto::{
    normalize, ClassInfo, EventInfo, InfoNode, MethodInfo, NodeGroupInfo, NodeInfo,
    ParameterInfo, PropertyInfo, SubscribeAction, TreeError,
};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Step {
    Node(String),
    Keyed(String, u32),
}

fn entry<'a, T>(
    items: &'a mut Vec<T>,
    name: &str,
    name_of: impl Fn(&T) -> &str,
    make: impl FnOnce() -> T,
) -> &'a mut T {
    let index = match items.iter().position(|item| name_of(item) == name) {
        Some(index) => index,
        None => {
            items.push(make());
            items.len() - 1
        }
    };
    &mut items[index]
}

fn node_entry<'a>(class: &'a mut ClassInfo, name: &str) -> &'a mut NodeInfo {
    entry(
        &mut class.nodes,
        name,
        |n| n.header.name.as_str(),
        || NodeInfo::new(name, ""),
    )
}

fn group_entry<'a>(class: &'a mut ClassInfo, name: &str) -> &'a mut NodeGroupInfo {
    entry(
        &mut class.node_groups,
        name,
        |g| g.header.name.as_str(),
        || NodeGroupInfo::new(name, ""),
    )
}

/// A cursor over an in-progress request, positioned at one class.
#[derive(Debug, Clone, Default)]
pub struct CommandBuilder {
    root: ClassInfo,
    cursor: Vec<Step>,
}

impl CommandBuilder {
    /// Start a request addressed to the root contract `name`.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            root: ClassInfo::new(name, ""),
            cursor: Vec::new(),
        }
    }

    /// Rebuild the minimal request addressing the end of `steps`.
    pub fn from_path(steps: &[PathStep]) -> Result<ClassInfo, TreeError> {
        path::materialize(steps)
    }

    /// Turn a received feedback tree into a request that subscribes to, or
    /// unsubscribes from, the same event.
    pub fn event_request(
        feedback: &ClassInfo,
        action: SubscribeAction,
    ) -> Result<ClassInfo, TreeError> {
        let mut steps = path::steps_of(feedback)?;
        match steps.last_mut() {
            Some(PathStep::Leaf(InfoNode::Event(event))) => {
                *event = event.shallow_copy().with_action(action);
                event.header.result = None;
            }
            _ => {
                return Err(TreeError::MalformedPath(
                    "feedback does not end in an event".to_string(),
                ))
            }
        }
        path::materialize(&steps)
    }

    /// Descend into the fixed child node `name`.
    #[must_use]
    pub fn at_node(mut self, name: &str) -> Self {
        let name = normalize::name(name);
        node_entry(self.current(), &name);
        self.cursor.push(Step::Node(name));
        self
    }

    /// Open the node group `name`; pick an entry with the returned cursor.
    #[must_use]
    pub fn at_node_group(mut self, name: &str) -> GroupCursor {
        let name = normalize::name(name);
        group_entry(self.current(), &name);
        GroupCursor {
            builder: self,
            group: name,
        }
    }

    /// Back to the enclosing class.
    #[must_use]
    pub fn up(mut self) -> Self {
        self.cursor.pop();
        self
    }

    #[must_use]
    pub fn to_root(mut self) -> Self {
        self.cursor.clear();
        self
    }

    #[must_use]
    pub fn get_property(mut self, name: &str) -> Self {
        self.property(name);
        self
    }

    /// Request a write. A null value is a plain read.
    #[must_use]
    pub fn set_property(mut self, name: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        self.property(name).value = Some(value).filter(|v| !v.is_null());
        self
    }

    /// Ask for a method's description without invoking it.
    #[must_use]
    pub fn get_method(mut self, name: &str) -> Self {
        let method = self.method(name);
        method.execute = false;
        method.params.clear();
        self
    }

    /// Open a method invocation; close it with [`MethodCall::complete_method`].
    #[must_use]
    pub fn call_method(self, name: &str) -> MethodCall {
        MethodCall {
            builder: self,
            method: MethodInfo::new(name, "").with_execute(true),
        }
    }

    /// Ask for an event's description.
    #[must_use]
    pub fn get_event(self, name: &str) -> Self {
        self.event(name, SubscribeAction::None)
    }

    #[must_use]
    pub fn subscribe_event(self, name: &str) -> Self {
        self.event(name, SubscribeAction::Subscribe)
    }

    #[must_use]
    pub fn unsubscribe_event(self, name: &str) -> Self {
        self.event(name, SubscribeAction::Unsubscribe)
    }

    /// Finish and return the root of the request.
    #[must_use]
    pub fn complete(self) -> ClassInfo {
        self.root
    }

    fn event(mut self, name: &str, action: SubscribeAction) -> Self {
        let name = normalize::name(name);
        entry(
            &mut self.current().events,
            &name,
            |e| e.header.name.as_str(),
            || EventInfo::new(&name, ""),
        )
        .subscribe_action = action;
        self
    }

    fn property(&mut self, name: &str) -> &mut PropertyInfo {
        let name = normalize::name(name);
        entry(
            &mut self.current().properties,
            &name,
            |p| p.header.name.as_str(),
            || PropertyInfo::new(&name, ""),
        )
    }

    fn method(&mut self, name: &str) -> &mut MethodInfo {
        let name = normalize::name(name);
        entry(
            &mut self.current().methods,
            &name,
            |m| m.header.name.as_str(),
            || MethodInfo::new(&name, ""),
        )
    }

    /// The class under the cursor, created along the way if needed.
    fn current(&mut self) -> &mut ClassInfo {
        let mut class = &mut self.root;
        for step in &self.cursor {
            class = match step {
                Step::Node(name) => node_entry(class, name).class_mut(),
                Step::Keyed(group, key) => group_entry(class, group)
                    .nodes
                    .entry(*key)
                    .or_default(),
            };
        }
        class
    }
}

/// Parameter context of a method invocation being built.
#[derive(Debug, Clone)]
pub struct MethodCall {
    builder: CommandBuilder,
    method: MethodInfo,
}

impl MethodCall {
    /// Add the next positional argument.
    #[must_use]
    pub fn param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.method
            .params
            .push(ParameterInfo::new(name, "").with_value(value));
        self
    }

    /// Close the invocation, replacing any earlier request for the same
    /// method on this class.
    #[must_use]
    pub fn complete_method(mut self) -> CommandBuilder {
        let name = self.method.header.name.clone();
        *self.builder.method(&name) = self.method;
        self.builder
    }
}

/// Cursor positioned on a node group, waiting for a key.
#[derive(Debug, Clone)]
pub struct GroupCursor {
    builder: CommandBuilder,
    group: String,
}

impl GroupCursor {
    /// Descend into the entry at `key`, creating it empty if needed.
    #[must_use]
    pub fn at_key(mut self, key: u32) -> CommandBuilder {
        group_entry(self.builder.current(), &self.group)
            .nodes
            .entry(key)
            .or_default();
        self.builder.cursor.push(Step::Keyed(self.group, key));
        self.builder
    }

    /// Put `class` at `key`, replacing any entry there, and descend into it.
    #[must_use]
    pub fn add_key(mut self, key: u32, class: ClassInfo) -> CommandBuilder {
        group_entry(self.builder.current(), &self.group)
            .nodes
            .insert(key, class);
        self.builder.cursor.push(Step::Keyed(self.group, key));
        self.builder
    }

    /// Leave the group without keys: a metadata query for all entries.
    #[must_use]
    pub fn query(self) -> CommandBuilder {
        self.builder
    }
}

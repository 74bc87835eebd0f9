//! Type-erased member descriptors.
//!
//! Descriptors are built once per type by the typed definitions in
//! [`super::define`] and shared through `Arc`. Each one carries the closures
//! that reach into a concrete instance; the instance arrives as `&dyn Any`
//! and is downcast inside.

use super::event::EventSource;
use super::value::{CoercionError, ValueType};
use super::Instance;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// An error raised by domain code while a member was being used.
///
/// Dispatch reports it back as an `Exception` result carrying both fields.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{type_name}: {message}")]
pub struct Fault {
    pub type_name: String,
    pub message: String,
}

impl Fault {
    #[must_use]
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Capture any error, named after its Rust type.
    #[must_use]
    pub fn from_error<E: std::error::Error>(err: &E) -> Self {
        let full = std::any::type_name::<E>();
        let short = full.rsplit("::").next().unwrap_or(full);
        Self::new(short, err.to_string())
    }

    pub(crate) fn type_mismatch(expected: &str) -> Self {
        Self::new("TypeMismatch", format!("instance is not a {expected}"))
    }
}

/// Why a write or an invocation did not happen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemberError {
    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error("expected {expected} parameters, got {actual}")]
    ParameterCount { expected: usize, actual: usize },

    #[error(transparent)]
    Fault(#[from] Fault),
}

/// The kinds of member a type can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Property,
    Method,
    Event,
    Node,
    NodeGroup,
}

impl MemberKind {
    /// Lowercase label used in diagnostics.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Property => "property",
            Self::Method => "method",
            Self::Event => "event",
            Self::Node => "node",
            Self::NodeGroup => "node group",
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Coerced arguments handed to a method body, in declaration order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: Vec<Value>,
}

impl Args {
    #[must_use]
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// Deserialize the argument at `index`.
    pub fn get<V: DeserializeOwned>(&self, index: usize) -> Result<V, MemberError> {
        let expected = std::any::type_name::<V>();
        let value = self.values.get(index).ok_or_else(|| CoercionError {
            value: format!("argument {index}"),
            expected: expected.to_string(),
        })?;
        serde_json::from_value(value.clone()).map_err(|_| {
            MemberError::Coercion(CoercionError {
                value: value.to_string(),
                expected: expected.to_string(),
            })
        })
    }

    #[must_use]
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

pub(crate) type Getter = Arc<dyn Fn(&dyn Any) -> Result<Value, Fault> + Send + Sync>;
pub(crate) type Setter = Arc<dyn Fn(&dyn Any, Value) -> Result<(), MemberError> + Send + Sync>;
pub(crate) type Invoker = Arc<dyn Fn(&dyn Any, &Args) -> Result<(), MemberError> + Send + Sync>;
pub(crate) type SourceAccessor = Arc<dyn Fn(&dyn Any) -> Option<EventSource> + Send + Sync>;
pub(crate) type NodeAccessor = Arc<dyn Fn(&dyn Any) -> Option<Instance> + Send + Sync>;
pub(crate) type GroupAccessor = Arc<dyn Fn(&dyn Any) -> Vec<(u32, Option<Instance>)> + Send + Sync>;

/// Maps a derived instance to the embedded base it inherits members from.
pub(crate) type Projection = Arc<dyn Fn(&dyn Any) -> Option<&dyn Any> + Send + Sync>;

/// Pins a closure to the higher-ranked signature of [`Projection`].
pub(crate) fn projection<F>(f: F) -> Projection
where
    F: for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync + 'static,
{
    Arc::new(f)
}

pub(crate) fn downcast<T: Any>(target: &dyn Any) -> Result<&T, Fault> {
    target
        .downcast_ref::<T>()
        .ok_or_else(|| Fault::type_mismatch(std::any::type_name::<T>()))
}

fn project<'a>(projection: &Projection, target: &'a dyn Any) -> Result<&'a dyn Any, Fault> {
    projection(target).ok_or_else(|| Fault::type_mismatch("derived type"))
}

pub struct PropertyDescriptor {
    pub name: String,
    pub help: String,
    pub value_type: ValueType,
    pub(crate) getter: Option<Getter>,
    pub(crate) setter: Option<Setter>,
}

impl PropertyDescriptor {
    #[must_use]
    pub fn can_read(&self) -> bool {
        self.getter.is_some()
    }

    #[must_use]
    pub fn can_write(&self) -> bool {
        self.setter.is_some()
    }

    pub fn read(&self, target: &dyn Any) -> Result<Value, Fault> {
        let getter = self
            .getter
            .as_ref()
            .ok_or_else(|| Fault::new("WriteOnly", format!("{} cannot be read", self.name)))?;
        getter(target)
    }

    /// Coerce `value` to the declared type and store it.
    pub fn write(&self, target: &dyn Any, value: &Value) -> Result<(), MemberError> {
        let setter = self
            .setter
            .as_ref()
            .ok_or_else(|| Fault::new("ReadOnly", format!("{} cannot be written", self.name)))?;
        let value = self.value_type.coerce(value)?;
        setter(target, value)
    }

    pub(crate) fn rebase(&self, projection: &Projection) -> Self {
        Self {
            name: self.name.clone(),
            help: self.help.clone(),
            value_type: self.value_type.clone(),
            getter: self.getter.clone().map(|getter| -> Getter {
                let projection = Arc::clone(projection);
                Arc::new(move |target: &dyn Any| getter(project(&projection, target)?))
            }),
            setter: self.setter.clone().map(|setter| -> Setter {
                let projection = Arc::clone(projection);
                Arc::new(move |target: &dyn Any, value: Value| {
                    setter(project(&projection, target)?, value)
                })
            }),
        }
    }
}

/// A declared method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDescriptor {
    pub name: String,
    pub help: String,
    pub value_type: ValueType,
}

pub struct MethodDescriptor {
    pub name: String,
    pub help: String,
    pub params: Vec<ParamDescriptor>,
    pub(crate) invoker: Invoker,
}

impl MethodDescriptor {
    /// Coerce `args` positionally to the declared parameters and invoke.
    pub fn invoke(&self, target: &dyn Any, args: &[Value]) -> Result<(), MemberError> {
        if args.len() != self.params.len() {
            return Err(MemberError::ParameterCount {
                expected: self.params.len(),
                actual: args.len(),
            });
        }
        let values = self
            .params
            .iter()
            .zip(args)
            .map(|(param, arg)| param.value_type.coerce(arg))
            .collect::<Result<Vec<_>, _>>()?;
        (self.invoker)(target, &Args::new(values))
    }

    pub(crate) fn rebase(&self, projection: &Projection) -> Self {
        let invoker = Arc::clone(&self.invoker);
        let projection = Arc::clone(projection);
        Self {
            name: self.name.clone(),
            help: self.help.clone(),
            params: self.params.clone(),
            invoker: Arc::new(move |target: &dyn Any, args: &Args| {
                invoker(project(&projection, target)?, args)
            }),
        }
    }
}

pub struct EventDescriptor {
    pub name: String,
    pub help: String,
    /// Declared type of the values the event carries.
    pub payload_type: ValueType,
    pub(crate) source: SourceAccessor,
}

impl EventDescriptor {
    #[must_use]
    pub fn source(&self, target: &dyn Any) -> Option<EventSource> {
        (self.source)(target)
    }

    pub(crate) fn rebase(&self, projection: &Projection) -> Self {
        let source = Arc::clone(&self.source);
        let projection = Arc::clone(projection);
        Self {
            name: self.name.clone(),
            help: self.help.clone(),
            payload_type: self.payload_type.clone(),
            source: Arc::new(move |target: &dyn Any| source(projection(target)?)),
        }
    }
}

pub struct NodeDescriptor {
    pub name: String,
    pub help: String,
    pub(crate) accessor: NodeAccessor,
}

impl NodeDescriptor {
    /// The nested instance, or `None` when it is currently absent.
    #[must_use]
    pub fn resolve(&self, target: &dyn Any) -> Option<Instance> {
        (self.accessor)(target)
    }

    pub(crate) fn rebase(&self, projection: &Projection) -> Self {
        let accessor = Arc::clone(&self.accessor);
        let projection = Arc::clone(projection);
        Self {
            name: self.name.clone(),
            help: self.help.clone(),
            accessor: Arc::new(move |target: &dyn Any| accessor(projection(target)?)),
        }
    }
}

pub struct NodeGroupDescriptor {
    pub name: String,
    pub help: String,
    pub(crate) accessor: GroupAccessor,
}

impl NodeGroupDescriptor {
    /// Current entries in key order. A `None` value is a key whose object is
    /// absent.
    #[must_use]
    pub fn entries(&self, target: &dyn Any) -> Vec<(u32, Option<Instance>)> {
        (self.accessor)(target)
    }

    pub(crate) fn rebase(&self, projection: &Projection) -> Self {
        let accessor = Arc::clone(&self.accessor);
        let projection = Arc::clone(projection);
        Self {
            name: self.name.clone(),
            help: self.help.clone(),
            accessor: Arc::new(move |target: &dyn Any| match projection(target) {
                Some(base) => accessor(base),
                None => Vec::new(),
            }),
        }
    }
}

macro_rules! impl_descriptor_debug {
    ($($ty:ident),*) => {
        $(impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("name", &self.name)
                    .field("help", &self.help)
                    .finish_non_exhaustive()
            }
        })*
    };
}

impl_descriptor_debug!(
    PropertyDescriptor,
    MethodDescriptor,
    EventDescriptor,
    NodeDescriptor,
    NodeGroupDescriptor
);

/// A resolved member of any kind.
#[derive(Debug, Clone)]
pub enum Member {
    Property(Arc<PropertyDescriptor>),
    Method(Arc<MethodDescriptor>),
    Event(Arc<EventDescriptor>),
    Node(Arc<NodeDescriptor>),
    NodeGroup(Arc<NodeGroupDescriptor>),
}

impl Member {
    #[must_use]
    pub fn kind(&self) -> MemberKind {
        match self {
            Self::Property(_) => MemberKind::Property,
            Self::Method(_) => MemberKind::Method,
            Self::Event(_) => MemberKind::Event,
            Self::Node(_) => MemberKind::Node,
            Self::NodeGroup(_) => MemberKind::NodeGroup,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Property(d) => &d.name,
            Self::Method(d) => &d.name,
            Self::Event(d) => &d.name,
            Self::Node(d) => &d.name,
            Self::NodeGroup(d) => &d.name,
        }
    }

    pub(crate) fn rebase(&self, projection: &Projection) -> Self {
        match self {
            Self::Property(d) => Self::Property(Arc::new(d.rebase(projection))),
            Self::Method(d) => Self::Method(Arc::new(d.rebase(projection))),
            Self::Event(d) => Self::Event(Arc::new(d.rebase(projection))),
            Self::Node(d) => Self::Node(Arc::new(d.rebase(projection))),
            Self::NodeGroup(d) => Self::NodeGroup(Arc::new(d.rebase(projection))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fault_from_error_uses_short_type_name() {
        let err = "x".parse::<i32>().unwrap_err();
        let fault = Fault::from_error(&err);
        assert_eq!(fault.type_name, "ParseIntError");
        assert_eq!(fault.message, "invalid digit found in string");
    }

    #[test]
    fn test_args_get_deserializes() {
        let args = Args::new(vec![json!(2.5), json!("Fast")]);
        assert_eq!(args.get::<f64>(0).unwrap(), 2.5);
        assert_eq!(args.get::<String>(1).unwrap(), "Fast");
        assert!(matches!(args.get::<u8>(1), Err(MemberError::Coercion(_))));
        assert!(matches!(args.get::<u8>(5), Err(MemberError::Coercion(_))));
    }

    #[test]
    fn test_invoke_checks_parameter_count() {
        let method = MethodDescriptor {
            name: "Move".to_string(),
            help: String::new(),
            params: vec![ParamDescriptor {
                name: "X".to_string(),
                help: String::new(),
                value_type: ValueType::Int,
            }],
            invoker: Arc::new(|_: &dyn Any, _: &Args| Ok(())),
        };
        let target = 0_u8;
        let err = method.invoke(&target, &[]).unwrap_err();
        assert_eq!(
            err,
            MemberError::ParameterCount {
                expected: 1,
                actual: 0
            }
        );
        assert!(matches!(
            method.invoke(&target, &[json!("left")]),
            Err(MemberError::Coercion(_))
        ));
        assert!(method.invoke(&target, &[json!("3")]).is_ok());
    }
}

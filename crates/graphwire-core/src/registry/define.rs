//! Typed member definitions.
//!
//! Each definition takes closures over the concrete type `T` and erases them
//! into a descriptor when the type is registered:
//!
//! ```ignore
//! TypeBuilder::<Motor>::new("Motor")
//!     .property(
//!         PropertyDef::new("Speed", ValueType::Float)
//!             .get(|m: &Motor| m.speed())
//!             .set(|m: &Motor, v: f64| m.set_speed(v)),
//!     )
//!     .method(
//!         MethodDef::new("Stop").invoke(|m: &Motor, _| {
//!             m.stop();
//!             Ok(())
//!         }),
//!     )
//! ```

use super::event::EventSource;
use super::member::{
    downcast, Args, EventDescriptor, Fault, GroupAccessor, Getter, Invoker, MemberError,
    MethodDescriptor, NodeAccessor, NodeDescriptor, NodeGroupDescriptor, ParamDescriptor,
    PropertyDescriptor, Setter, SourceAccessor,
};
use super::value::{CoercionError, ValueType};
use super::Instance;
use graphwire_proto::normalize;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

type Marker<T> = PhantomData<fn(&T)>;

pub struct PropertyDef<T> {
    name: String,
    help: String,
    value_type: ValueType,
    getter: Option<Getter>,
    setter: Option<Setter>,
    _marker: Marker<T>,
}

impl<T: Any + Send + Sync> PropertyDef<T> {
    #[must_use]
    pub fn new(name: &str, value_type: ValueType) -> Self {
        Self {
            name: normalize::name(name),
            help: String::new(),
            value_type,
            getter: None,
            setter: None,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn help(mut self, help: &str) -> Self {
        self.help = normalize::help(help);
        self
    }

    /// Make the property readable.
    #[must_use]
    pub fn get<V, F>(self, f: F) -> Self
    where
        V: Serialize,
        F: Fn(&T) -> V + Send + Sync + 'static,
    {
        self.try_get(move |target: &T| Ok(f(target)))
    }

    /// Make the property readable through a getter that can fail.
    #[must_use]
    pub fn try_get<V, F>(mut self, f: F) -> Self
    where
        V: Serialize,
        F: Fn(&T) -> Result<V, Fault> + Send + Sync + 'static,
    {
        self.getter = Some(Arc::new(move |target: &dyn Any| {
            let value = f(downcast::<T>(target)?)?;
            serde_json::to_value(value).map_err(|e| Fault::from_error(&e))
        }));
        self
    }

    /// Make the property writable. The setter receives the already coerced
    /// value deserialized as `V`.
    #[must_use]
    pub fn set<V, F>(mut self, f: F) -> Self
    where
        V: DeserializeOwned,
        F: Fn(&T, V) -> Result<(), Fault> + Send + Sync + 'static,
    {
        self.setter = Some(Arc::new(move |target: &dyn Any, value: Value| {
            let target = downcast::<T>(target)?;
            let typed = serde_json::from_value::<V>(value.clone()).map_err(|_| CoercionError {
                value: value.to_string(),
                expected: std::any::type_name::<V>().to_string(),
            })?;
            f(target, typed).map_err(MemberError::from)
        }));
        self
    }

    pub(crate) fn into_descriptor(self) -> PropertyDescriptor {
        PropertyDescriptor {
            name: self.name,
            help: self.help,
            value_type: self.value_type,
            getter: self.getter,
            setter: self.setter,
        }
    }
}

pub struct MethodDef<T> {
    name: String,
    help: String,
    params: Vec<ParamDescriptor>,
    invoker: Option<Invoker>,
    _marker: Marker<T>,
}

impl<T: Any + Send + Sync> MethodDef<T> {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: normalize::name(name),
            help: String::new(),
            params: Vec::new(),
            invoker: None,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn help(mut self, help: &str) -> Self {
        self.help = normalize::help(help);
        self
    }

    /// Declare the next positional parameter.
    #[must_use]
    pub fn param(mut self, name: &str, value_type: ValueType) -> Self {
        self.params.push(ParamDescriptor {
            name: normalize::name(name),
            help: String::new(),
            value_type,
        });
        self
    }

    /// Set the method body. Arguments arrive coerced to the declared
    /// parameter types.
    #[must_use]
    pub fn invoke<F>(mut self, f: F) -> Self
    where
        F: Fn(&T, &Args) -> Result<(), MemberError> + Send + Sync + 'static,
    {
        self.invoker = Some(Arc::new(move |target: &dyn Any, args: &Args| {
            f(downcast::<T>(target)?, args)
        }));
        self
    }

    pub(crate) fn into_descriptor(self) -> MethodDescriptor {
        let invoker = match self.invoker {
            Some(invoker) => invoker,
            None => {
                let name = self.name.clone();
                let missing: Invoker = Arc::new(move |_: &dyn Any, _: &Args| {
                    Err(MemberError::Fault(Fault::new(
                        "NotImplemented",
                        format!("{name} has no body"),
                    )))
                });
                missing
            }
        };
        MethodDescriptor {
            name: self.name,
            help: self.help,
            params: self.params,
            invoker,
        }
    }
}

pub struct EventDef<T> {
    name: String,
    help: String,
    payload_type: ValueType,
    source: SourceAccessor,
    _marker: Marker<T>,
}

impl<T: Any + Send + Sync> EventDef<T> {
    /// An event whose source is reached through `source`.
    #[must_use]
    pub fn new<F>(name: &str, payload_type: ValueType, source: F) -> Self
    where
        F: Fn(&T) -> EventSource + Send + Sync + 'static,
    {
        Self {
            name: normalize::name(name),
            help: String::new(),
            payload_type,
            source: Arc::new(move |target: &dyn Any| target.downcast_ref::<T>().map(&source)),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn help(mut self, help: &str) -> Self {
        self.help = normalize::help(help);
        self
    }

    pub(crate) fn into_descriptor(self) -> EventDescriptor {
        EventDescriptor {
            name: self.name,
            help: self.help,
            payload_type: self.payload_type,
            source: self.source,
        }
    }
}

pub struct NodeDef<T> {
    name: String,
    help: String,
    accessor: NodeAccessor,
    _marker: Marker<T>,
}

impl<T: Any + Send + Sync> NodeDef<T> {
    /// A nested object reached through `get`; `None` means it is absent.
    #[must_use]
    pub fn new<C, F>(name: &str, get: F) -> Self
    where
        C: Any + Send + Sync,
        F: Fn(&T) -> Option<Arc<C>> + Send + Sync + 'static,
    {
        Self {
            name: normalize::name(name),
            help: String::new(),
            accessor: Arc::new(move |target: &dyn Any| {
                let child = get(target.downcast_ref::<T>()?)?;
                Some(child as Instance)
            }),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn help(mut self, help: &str) -> Self {
        self.help = normalize::help(help);
        self
    }

    pub(crate) fn into_descriptor(self) -> NodeDescriptor {
        NodeDescriptor {
            name: self.name,
            help: self.help,
            accessor: self.accessor,
        }
    }
}

pub struct NodeGroupDef<T> {
    name: String,
    help: String,
    accessor: GroupAccessor,
    _marker: Marker<T>,
}

impl<T: Any + Send + Sync> NodeGroupDef<T> {
    /// A keyed collection listed by `entries`. A `None` entry is a key whose
    /// object is absent.
    #[must_use]
    pub fn new<C, F>(name: &str, entries: F) -> Self
    where
        C: Any + Send + Sync,
        F: Fn(&T) -> Vec<(u32, Option<Arc<C>>)> + Send + Sync + 'static,
    {
        Self {
            name: normalize::name(name),
            help: String::new(),
            accessor: Arc::new(move |target: &dyn Any| {
                let Some(target) = target.downcast_ref::<T>() else {
                    return Vec::new();
                };
                entries(target)
                    .into_iter()
                    .map(|(key, child)| (key, child.map(|c| c as Instance)))
                    .collect()
            }),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn help(mut self, help: &str) -> Self {
        self.help = normalize::help(help);
        self
    }

    pub(crate) fn into_descriptor(self) -> NodeGroupDescriptor {
        NodeGroupDescriptor {
            name: self.name,
            help: self.help,
            accessor: self.accessor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Lamp {
        level: Mutex<u8>,
    }

    #[test]
    fn test_property_get_and_set() {
        let prop = PropertyDef::new("brightness level", ValueType::UInt)
            .help("current level")
            .get(|l: &Lamp| *l.level.lock().unwrap())
            .set(|l: &Lamp, v: u8| {
                *l.level.lock().unwrap() = v;
                Ok(())
            })
            .into_descriptor();

        assert_eq!(prop.name, "BrightnessLevel");
        assert_eq!(prop.help, "Current level.");

        let lamp = Lamp::default();
        prop.write(&lamp, &json!("40")).unwrap();
        assert_eq!(prop.read(&lamp).unwrap(), json!(40));

        // Coerces to u64 but does not fit the setter's u8.
        assert!(matches!(
            prop.write(&lamp, &json!(300)),
            Err(MemberError::Coercion(_))
        ));
    }

    #[test]
    fn test_wrong_instance_type_is_fault() {
        let prop = PropertyDef::new("Level", ValueType::UInt)
            .get(|l: &Lamp| *l.level.lock().unwrap())
            .into_descriptor();
        let err = prop.read(&"not a lamp").unwrap_err();
        assert_eq!(err.type_name, "TypeMismatch");
    }

    #[test]
    fn test_method_without_body_faults() {
        let method = MethodDef::<Lamp>::new("Blink").into_descriptor();
        let err = method.invoke(&Lamp::default(), &[]).unwrap_err();
        assert!(matches!(err, MemberError::Fault(f) if f.type_name == "NotImplemented"));
    }

    #[test]
    fn test_node_group_entries() {
        struct Strip {
            lamps: Vec<Option<Arc<Lamp>>>,
        }
        let group = NodeGroupDef::new("Lamps", |s: &Strip| {
            s.lamps
                .iter()
                .enumerate()
                .map(|(i, l)| (u32::try_from(i).unwrap(), l.clone()))
                .collect()
        })
        .into_descriptor();

        let strip = Strip {
            lamps: vec![Some(Arc::new(Lamp::default())), None],
        };
        let entries = group.entries(&strip);
        assert_eq!(entries.len(), 2);
        assert!(entries[0].1.is_some());
        assert!(entries[1].1.is_none());
    }
}

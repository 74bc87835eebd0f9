use super::define::{EventDef, MethodDef, NodeDef, NodeGroupDef, PropertyDef};
use super::member::{projection, Member, MemberKind};
use super::{type_id_of, CapabilityRegistry, Instance, RegistryError, TypeSummary};
use graphwire_proto::normalize;
use std::any::{Any, TypeId};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

/// Typed registration of one domain type.
///
/// Members declared directly on the builder must have unique names per kind.
/// Members folded in through [`TypeBuilder::include`] can be overridden by a
/// later declaration with the same name.
pub struct TypeBuilder<T> {
    rust_type: &'static str,
    summary: TypeSummary,
    members: Vec<Member>,
    declared: HashSet<(MemberKind, String)>,
    duplicates: Vec<(MemberKind, String)>,
    _marker: PhantomData<fn(&T)>,
}

impl<T: Any + Send + Sync> TypeBuilder<T> {
    #[must_use]
    pub fn new(contract: &str) -> Self {
        let contract = normalize::name(contract);
        Self {
            rust_type: std::any::type_name::<T>(),
            summary: TypeSummary {
                contract: contract.clone(),
                help: String::new(),
                is_proxy: false,
                proxy_types: vec![contract],
            },
            members: Vec::new(),
            declared: HashSet::new(),
            duplicates: Vec::new(),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn help(mut self, help: &str) -> Self {
        self.summary.help = normalize::help(help);
        self
    }

    /// Mark instances of this type as remote facades.
    #[must_use]
    pub fn proxy(mut self) -> Self {
        self.summary.is_proxy = true;
        self
    }

    #[must_use]
    pub fn property(self, def: PropertyDef<T>) -> Self {
        self.declare(Member::Property(Arc::new(def.into_descriptor())))
    }

    #[must_use]
    pub fn method(self, def: MethodDef<T>) -> Self {
        self.declare(Member::Method(Arc::new(def.into_descriptor())))
    }

    #[must_use]
    pub fn event(self, def: EventDef<T>) -> Self {
        self.declare(Member::Event(Arc::new(def.into_descriptor())))
    }

    #[must_use]
    pub fn node(self, def: NodeDef<T>) -> Self {
        self.declare(Member::Node(Arc::new(def.into_descriptor())))
    }

    #[must_use]
    pub fn node_group(self, def: NodeGroupDef<T>) -> Self {
        self.declare(Member::NodeGroup(Arc::new(def.into_descriptor())))
    }

    /// Inherit every member of `base`, reached through `project`.
    ///
    /// Requests naming the base contract then resolve against `T` as well.
    #[must_use]
    pub fn include<B, F>(mut self, base: TypeBuilder<B>, project: F) -> Self
    where
        B: Any + Send + Sync,
        F: Fn(&T) -> &B + Send + Sync + 'static,
    {
        let projection = projection(move |target: &dyn Any| {
            target
                .downcast_ref::<T>()
                .map(|derived| project(derived) as &dyn Any)
        });
        self.members
            .extend(base.members.iter().map(|m| m.rebase(&projection)));
        self.duplicates.extend(base.duplicates);
        for contract in base.summary.proxy_types {
            if !self.summary.proxy_types.contains(&contract) {
                self.summary.proxy_types.push(contract);
            }
        }
        self
    }

    fn declare(mut self, member: Member) -> Self {
        let key = (member.kind(), member.name().to_string());
        if !self.declared.insert(key.clone()) {
            self.duplicates.push(key);
        }
        self.members.push(member);
        self
    }
}

/// Collects type registrations; [`RegistryBuilder::build`] freezes them.
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    types: HashMap<TypeId, Registration>,
}

impl RegistryBuilder {
    pub fn register<T: Any + Send + Sync>(
        mut self,
        ty: TypeBuilder<T>,
    ) -> Result<Self, RegistryError> {
        if let Some((kind, name)) = ty.duplicates.into_iter().next() {
            return Err(RegistryError::DuplicateMember {
                contract: ty.summary.contract,
                kind,
                name,
            });
        }
        if self.types.contains_key(&TypeId::of::<T>()) {
            return Err(RegistryError::DuplicateType {
                rust_type: ty.rust_type,
            });
        }
        self.types.insert(
            TypeId::of::<T>(),
            Registration {
                summary: ty.summary,
                members: ty.members,
            },
        );
        Ok(self)
    }

    #[must_use]
    pub fn build(self) -> StaticRegistry {
        StaticRegistry {
            types: self.types,
            index: RwLock::new(HashMap::new()),
        }
    }
}

#[derive(Debug)]
struct Registration {
    summary: TypeSummary,
    members: Vec<Member>,
}

/// Resolved members of one type, later declarations overriding earlier ones.
struct MemberIndex {
    ordered: HashMap<MemberKind, Vec<Member>>,
    by_name: HashMap<(MemberKind, String), Member>,
}

impl MemberIndex {
    fn build(registration: &Registration) -> Self {
        let mut ordered: HashMap<MemberKind, Vec<Member>> = HashMap::new();
        let mut by_name = HashMap::new();
        for member in &registration.members {
            let key = (member.kind(), member.name().to_string());
            let slot = ordered.entry(member.kind()).or_default();
            if by_name.contains_key(&key) {
                if let Some(existing) = slot.iter_mut().find(|m| m.name() == member.name()) {
                    *existing = member.clone();
                }
            } else {
                slot.push(member.clone());
            }
            by_name.insert(key, member.clone());
        }
        Self { ordered, by_name }
    }
}

/// A registry backed by a table of typed registrations.
pub struct StaticRegistry {
    types: HashMap<TypeId, Registration>,
    index: RwLock<HashMap<TypeId, Arc<MemberIndex>>>,
}

impl StaticRegistry {
    #[must_use]
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Number of types whose member index has been built.
    #[must_use]
    pub fn indexed_len(&self) -> usize {
        self.index
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn index_for(&self, type_id: TypeId) -> Option<Arc<MemberIndex>> {
        {
            let index = self.index.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(members) = index.get(&type_id) {
                return Some(Arc::clone(members));
            }
        }

        let registration = self.types.get(&type_id)?;
        let mut index = self.index.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have built it between the two locks.
        let members = index.entry(type_id).or_insert_with(|| {
            debug!(contract = %registration.summary.contract, "Building member index");
            Arc::new(MemberIndex::build(registration))
        });
        Some(Arc::clone(members))
    }
}

impl CapabilityRegistry for StaticRegistry {
    fn type_summary(&self, instance: &Instance) -> Option<TypeSummary> {
        self.types
            .get(&type_id_of(instance))
            .map(|r| r.summary.clone())
    }

    fn resolve(&self, kind: MemberKind, instance: &Instance, name: &str) -> Option<Member> {
        let index = self.index_for(type_id_of(instance))?;
        let member = index.by_name.get(&(kind, name.to_string())).cloned();
        if member.is_none() {
            debug!(kind = %kind, name, "Member not found");
        }
        member
    }

    fn enumerate(&self, kind: MemberKind, type_id: TypeId) -> Vec<Member> {
        self.index_for(type_id)
            .and_then(|index| index.ordered.get(&kind).cloned())
            .unwrap_or_default()
    }
}

impl fmt::Debug for StaticRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let contracts: Vec<&str> = self
            .types
            .values()
            .map(|r| r.summary.contract.as_str())
            .collect();
        f.debug_struct("StaticRegistry")
            .field("types", &contracts)
            .finish_non_exhaustive()
    }
}

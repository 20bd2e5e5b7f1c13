//! Member catalog: polymorphic, identity-cached descriptors over the host's
//! members, method groups, and the lazily discovered namespace tree.

mod members;
mod method_group;
mod namespace;

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, RwLock};

use blake3::Hasher;

use crate::metadata::{
    HostMember, HostMemberKind, MemberId, MetadataProvider, Overload, TypeHierarchy, Visibility,
};
use crate::types::Ty;

pub use members::{
    AccessTarget, BoundMember, CustomMember, EventMember, FieldMember, MemberDescriptor,
    MemberKind, MemberRef, PropertyMember,
};
pub use method_group::MethodGroup;
pub use namespace::{NamespaceEntry, NamespaceTree};

/// Stable 64-bit identity: the first eight bytes of a blake3 digest over the
/// NUL-separated parts.
pub(crate) fn identity(parts: &[&str]) -> u64 {
    let mut hasher = Hasher::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update(&[0]);
    }
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct GroupKey {
    owner: Ty,
    name: Arc<str>,
    ids: Vec<MemberId>,
}

struct Cache<K, V> {
    entries: RwLock<HashMap<K, V>>,
}

impl<K: Eq + Hash, V: Clone> Cache<K, V> {
    fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    // Read first, then build outside any lock and publish under the write lock;
    // a racing builder loses and both callers observe the first published value.
    fn get_or_insert_with(&self, key: K, build: impl FnOnce() -> V) -> V {
        {
            let entries = match self.entries.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(hit) = entries.get(&key) {
                return hit.clone();
            }
        }
        let value = build();
        let mut entries = match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        entries.entry(key).or_insert(value).clone()
    }
}

/// Entry point for member discovery. Every descriptor handed out is cached, so
/// the same host member seen through the same type always yields the same
/// `Arc`.
pub struct Catalog {
    provider: Arc<dyn MetadataProvider>,
    private_binding: bool,
    members: Cache<(MemberId, Ty), MemberRef>,
    groups: Cache<GroupKey, MemberRef>,
    lookups: Cache<(Ty, Arc<str>), Vec<MemberRef>>,
    namespaces: Cache<Arc<str>, MemberRef>,
    type_groups: Cache<Vec<Ty>, MemberRef>,
    tree: NamespaceTree,
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("private_binding", &self.private_binding)
            .finish_non_exhaustive()
    }
}

impl Catalog {
    #[must_use]
    pub fn new(provider: Arc<dyn MetadataProvider>, private_binding: bool) -> Self {
        Self {
            provider,
            private_binding,
            members: Cache::new(),
            groups: Cache::new(),
            lookups: Cache::new(),
            namespaces: Cache::new(),
            type_groups: Cache::new(),
            tree: NamespaceTree::default(),
        }
    }

    #[must_use]
    pub fn provider(&self) -> &dyn MetadataProvider {
        self.provider.as_ref()
    }

    #[must_use]
    pub fn hierarchy(&self) -> TypeHierarchy<'_> {
        TypeHierarchy::new(self.provider.as_ref())
    }

    #[must_use]
    pub fn private_binding(&self) -> bool {
        self.private_binding
    }

    fn visible(&self, visibility: Visibility) -> bool {
        visibility.is_public() || self.private_binding
    }

    /// Descriptor for `host` as seen through `extending`.
    #[must_use]
    pub fn member(&self, host: &HostMember, extending: &Ty) -> MemberRef {
        self.members
            .get_or_insert_with((host.id, extending.clone()), || {
                Arc::new(MemberDescriptor::from_host(host, extending))
            })
    }

    /// Method group over `overloads` as seen through `owner`.
    #[must_use]
    pub fn method_group(&self, owner: &Ty, name: &str, overloads: Vec<Arc<Overload>>) -> MemberRef {
        let key = GroupKey {
            owner: owner.clone(),
            name: Arc::from(name),
            ids: overloads.iter().map(|overload| overload.id).collect(),
        };
        self.groups.get_or_insert_with(key, || {
            let ids = overloads
                .iter()
                .map(|overload| overload.id.0.to_string())
                .collect::<Vec<_>>()
                .join(",");
            let all_static = overloads.iter().all(|overload| overload.is_static);
            Arc::new(MemberDescriptor::synthetic(
                identity(&["group", &owner.to_string(), name, &ids]),
                Arc::from(name),
                owner.clone(),
                all_static,
                MemberKind::MethodGroup(MethodGroup::new(overloads, Vec::new())),
            ))
        })
    }

    /// Visible members named `name` on `ty` and its ancestors, most-derived
    /// first. Methods of the name collapse into one group placed where the first
    /// of them was found; a base overload whose signature a derived overload
    /// repeats is hidden.
    #[must_use]
    pub fn lookup(&self, ty: &Ty, name: &str) -> Vec<MemberRef> {
        self.lookups
            .get_or_insert_with((ty.clone(), Arc::from(name)), || self.collect(ty, name))
    }

    fn collect(&self, ty: &Ty, name: &str) -> Vec<MemberRef> {
        enum Slot {
            Member(MemberRef),
            Group,
        }
        let mut slots = Vec::new();
        let mut overloads: Vec<Arc<Overload>> = Vec::new();
        for owner in self.hierarchy().lineage(ty) {
            for host in self.provider.declared_members(&owner) {
                if &*host.name != name || !self.visible(host.visibility) {
                    continue;
                }
                match &host.kind {
                    HostMemberKind::Method(overload) => {
                        if overloads.iter().any(|seen| seen.same_signature(overload)) {
                            continue;
                        }
                        if overloads.is_empty() {
                            slots.push(Slot::Group);
                        }
                        overloads.push(Arc::clone(overload));
                    }
                    HostMemberKind::Constructor(_) => {}
                    _ => slots.push(Slot::Member(self.member(&host, ty))),
                }
            }
        }
        let group = (!overloads.is_empty()).then(|| self.method_group(ty, name, overloads));
        let found: Vec<MemberRef> = slots
            .into_iter()
            .filter_map(|slot| match slot {
                Slot::Member(member) => Some(member),
                Slot::Group => group.clone(),
            })
            .collect();
        tracing::trace!(
            target: "catalog",
            owner = %ty,
            name,
            found = found.len(),
            "member lookup"
        );
        found
    }

    /// Names of all visible members on `ty` and its ancestors, sorted.
    #[must_use]
    pub fn member_names(&self, ty: &Ty) -> Vec<Arc<str>> {
        let mut names: Vec<Arc<str>> = self
            .hierarchy()
            .lineage(ty)
            .iter()
            .flat_map(|owner| self.provider.declared_members(owner))
            .filter(|host| {
                self.visible(host.visibility)
                    && !matches!(host.kind, HostMemberKind::Constructor(_))
            })
            .map(|host| Arc::clone(&host.name))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Visible constructors declared on `ty`.
    #[must_use]
    pub fn constructors(&self, ty: &Ty) -> Vec<Arc<Overload>> {
        self.provider
            .declared_members(ty)
            .iter()
            .filter(|host| self.visible(host.visibility))
            .filter_map(|host| match &host.kind {
                HostMemberKind::Constructor(overload) => Some(Arc::clone(overload)),
                _ => None,
            })
            .collect()
    }

    /// Descriptor for the namespace at `path` (`""` is the root).
    #[must_use]
    pub fn namespace(&self, path: &str) -> MemberRef {
        let path: Arc<str> = Arc::from(path);
        self.namespaces.get_or_insert_with(Arc::clone(&path), || {
            let name = path.rsplit('.').next().unwrap_or_default();
            Arc::new(MemberDescriptor::synthetic(
                identity(&["namespace", &path]),
                Arc::from(name),
                Ty::NamespaceObj,
                true,
                MemberKind::Namespace(Arc::clone(&path)),
            ))
        })
    }

    #[must_use]
    pub fn type_group(&self, tys: Vec<Ty>) -> MemberRef {
        self.type_groups.get_or_insert_with(tys.clone(), || {
            let rendered = tys.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
            let name = tys.first().map(Ty::short_name).unwrap_or_default();
            Arc::new(MemberDescriptor::synthetic(
                identity(&["type-group", &rendered]),
                Arc::from(name),
                Ty::NamespaceObj,
                true,
                MemberKind::TypeGroup(tys),
            ))
        })
    }

    /// Member `name` of the namespace at `path`, as a descriptor.
    #[must_use]
    pub fn namespace_member(&self, path: &str, name: &str) -> Option<MemberRef> {
        let entry = self.tree.try_get(self.provider.as_ref(), path, name)?;
        Some(match entry {
            NamespaceEntry::Namespace(child) => self.namespace(&child),
            NamespaceEntry::Type(ty) => {
                let key = identity(&["namespace-type", &ty.to_string()]);
                self.type_groups.get_or_insert_with(vec![ty.clone()], || {
                    Arc::new(MemberDescriptor::synthetic(
                        key,
                        Arc::from(name),
                        Ty::NamespaceObj,
                        true,
                        MemberKind::NestedType(ty),
                    ))
                })
            }
            NamespaceEntry::TypeGroup(tys) => self.type_group(tys),
        })
    }

    #[must_use]
    pub fn namespace_member_names(&self, path: &str) -> Vec<Arc<str>> {
        self.tree.member_names(self.provider.as_ref(), path)
    }
}

#[cfg(test)]
mod tests;

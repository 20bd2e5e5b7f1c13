use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::metadata::{MetadataProvider, SourceId};
use crate::types::Ty;

/// What a name resolves to inside a namespace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NamespaceEntry {
    Namespace(Arc<str>),
    Type(Ty),
    TypeGroup(Vec<Ty>),
}

#[derive(Default)]
struct Node {
    children: BTreeSet<Arc<str>>,
    types: BTreeMap<Arc<str>, Vec<(SourceId, Ty)>>,
    resolved: HashMap<Arc<str>, NamespaceEntry>,
}

#[derive(Default)]
struct TreeState {
    loaded: HashSet<SourceId>,
    nodes: HashMap<Arc<str>, Node>,
}

/// Namespace hierarchy discovered lazily from the host's type sources.
#[derive(Default)]
pub struct NamespaceTree {
    state: RwLock<TreeState>,
}

fn child_path(parent: &str, child: &str) -> Arc<str> {
    if parent.is_empty() {
        Arc::from(child)
    } else {
        Arc::from(format!("{parent}.{child}"))
    }
}

impl NamespaceTree {
    fn read(&self) -> RwLockReadGuard<'_, TreeState> {
        match self.state.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, TreeState> {
        match self.state.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Fold in any source the provider reports that has not been scanned yet.
    pub fn ensure_loaded(&self, provider: &dyn MetadataProvider) {
        let sources = provider.sources();
        let pending = {
            let state = self.read();
            sources
                .iter()
                .any(|source| !state.loaded.contains(source))
        };
        if !pending {
            return;
        }
        let mut state = self.write();
        for source in sources {
            if state.loaded.insert(source) {
                let names = provider.source_types(source);
                tracing::trace!(
                    target: "catalog",
                    source = source.0,
                    types = names.len(),
                    "namespace source loaded"
                );
                for full in names {
                    discover(&mut state, source, &full);
                }
            }
        }
    }

    pub fn try_get(
        &self,
        provider: &dyn MetadataProvider,
        path: &str,
        name: &str,
    ) -> Option<NamespaceEntry> {
        self.ensure_loaded(provider);
        {
            let state = self.read();
            let node = state.nodes.get(path)?;
            if let Some(hit) = node.resolved.get(name) {
                return Some(hit.clone());
            }
        }
        let mut state = self.write();
        let node = state.nodes.get_mut(path)?;
        if let Some(hit) = node.resolved.get(name) {
            return Some(hit.clone());
        }
        let entry = match node.types.get(name) {
            Some(types) if types.len() == 1 => NamespaceEntry::Type(types[0].1.clone()),
            Some(types) => NamespaceEntry::TypeGroup(types.iter().map(|(_, ty)| ty.clone()).collect()),
            None if node.children.contains(name) => NamespaceEntry::Namespace(child_path(path, name)),
            None => return None,
        };
        node.resolved.insert(Arc::from(name), entry.clone());
        Some(entry)
    }

    /// Child namespaces and type names under `path`, sorted and de-duplicated.
    pub fn member_names(&self, provider: &dyn MetadataProvider, path: &str) -> Vec<Arc<str>> {
        self.ensure_loaded(provider);
        let state = self.read();
        let Some(node) = state.nodes.get(path) else {
            return Vec::new();
        };
        let names: BTreeSet<Arc<str>> = node
            .children
            .iter()
            .chain(node.types.keys())
            .cloned()
            .collect();
        names.into_iter().collect()
    }
}

fn discover(state: &mut TreeState, source: SourceId, full: &str) {
    let (namespace, simple) = full.rsplit_once('.').unwrap_or(("", full));
    let mut path: Arc<str> = Arc::from("");
    state.nodes.entry(Arc::clone(&path)).or_default();
    if !namespace.is_empty() {
        for piece in namespace.split('.') {
            let next = child_path(&path, piece);
            let parent = state.nodes.entry(Arc::clone(&path)).or_default();
            if parent.children.insert(Arc::from(piece)) {
                parent.resolved.remove(piece);
            }
            state.nodes.entry(Arc::clone(&next)).or_default();
            path = next;
        }
    }
    let node = state.nodes.entry(path).or_default();
    node.types
        .entry(Arc::from(simple))
        .or_default()
        .push((source, Ty::named(full)));
    node.resolved.remove(simple);
}

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use super::identity;
use super::members::{MemberDescriptor, MemberKind, MemberRef};
use crate::metadata::Overload;
use crate::types::Ty;

/// Every visible overload of one name on one type, most-derived first.
pub struct MethodGroup {
    overloads: Vec<Arc<Overload>>,
    type_args: Vec<Ty>,
    instantiations: RwLock<HashMap<Vec<Ty>, MemberRef>>,
}

impl fmt::Debug for MethodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodGroup")
            .field("overloads", &self.overloads.len())
            .field("type_args", &self.type_args)
            .finish_non_exhaustive()
    }
}

impl MethodGroup {
    pub(super) fn new(overloads: Vec<Arc<Overload>>, type_args: Vec<Ty>) -> Self {
        Self {
            overloads,
            type_args,
            instantiations: RwLock::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn overloads(&self) -> &[Arc<Overload>] {
        &self.overloads
    }

    /// Explicit type arguments supplied through [`MemberDescriptor::make_generic`].
    #[must_use]
    pub fn type_args(&self) -> &[Ty] {
        &self.type_args
    }

    #[must_use]
    pub fn contains_static(&self) -> bool {
        self.overloads.iter().any(|overload| overload.is_static)
    }

    #[must_use]
    pub fn contains_instance(&self) -> bool {
        self.overloads.iter().any(|overload| !overload.is_static)
    }
}

impl MemberDescriptor {
    /// Group restricted to the overloads taking exactly `type_args.len()` type
    /// parameters. Instantiations are cached per argument list.
    #[must_use]
    pub fn make_generic(self: &Arc<Self>, type_args: &[Ty]) -> Option<MemberRef> {
        let MemberKind::MethodGroup(group) = self.kind() else {
            return None;
        };
        let key = type_args.to_vec();
        {
            let cache = match group.instantiations.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            if let Some(hit) = cache.get(&key) {
                return Some(Arc::clone(hit));
            }
        }
        let overloads: Vec<Arc<Overload>> = group
            .overloads
            .iter()
            .filter(|overload| overload.generic_arity == type_args.len())
            .cloned()
            .collect();
        if overloads.is_empty() {
            return None;
        }
        let rendered = type_args
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let member = Arc::new(MemberDescriptor::synthetic(
            identity(&["generic", &self.key().to_string(), &rendered]),
            Arc::from(self.name()),
            self.declaring().clone(),
            !overloads.iter().any(|overload| !overload.is_static),
            MemberKind::MethodGroup(MethodGroup::new(overloads, key.clone())),
        ));
        let mut cache = match group.instantiations.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Some(Arc::clone(cache.entry(key).or_insert(member)))
    }
}

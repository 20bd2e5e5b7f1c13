use super::{MetadataProvider, TypeKind};
use crate::types::Ty;

/// Inheritance queries over a [`MetadataProvider`].
#[derive(Clone, Copy)]
pub struct TypeHierarchy<'a> {
    provider: &'a dyn MetadataProvider,
}

impl<'a> TypeHierarchy<'a> {
    #[must_use]
    pub fn new(provider: &'a dyn MetadataProvider) -> Self {
        Self { provider }
    }

    /// `ty`, its base chain, its interfaces, and finally `Any`.
    #[must_use]
    pub fn lineage(&self, ty: &Ty) -> Vec<Ty> {
        let mut chain = vec![ty.clone()];
        let mut interfaces = Vec::new();
        let mut cursor = ty.clone();
        while let Some(shape) = self.provider.type_shape(&cursor) {
            for iface in shape.interfaces {
                if !interfaces.contains(&iface) {
                    interfaces.push(iface);
                }
            }
            match shape.base {
                Some(base) if !chain.contains(&base) => {
                    chain.push(base.clone());
                    cursor = base;
                }
                _ => break,
            }
        }
        // Interfaces inherit their own super-interfaces.
        let mut index = 0;
        while index < interfaces.len() {
            if let Some(shape) = self.provider.type_shape(&interfaces[index]) {
                for iface in shape.interfaces {
                    if !interfaces.contains(&iface) {
                        interfaces.push(iface);
                    }
                }
            }
            index += 1;
        }
        for iface in interfaces {
            if !chain.contains(&iface) {
                chain.push(iface);
            }
        }
        if !chain.contains(&Ty::Any) {
            chain.push(Ty::Any);
        }
        chain
    }

    /// Reference assignability; boxing into `Any` counts as assignable.
    #[must_use]
    pub fn is_assignable(&self, from: &Ty, to: &Ty) -> bool {
        if from == to || *to == Ty::Any {
            return true;
        }
        match (from, to) {
            (Ty::Null, _) => !self.provider.is_value_type(to) && !matches!(to, Ty::Void),
            (Ty::Named(_), Ty::Named(_)) => self.lineage(from).contains(to),
            (Ty::Array(from_element), Ty::Array(to_element)) => {
                !self.provider.is_value_type(from_element)
                    && self.is_assignable(from_element, to_element)
            }
            _ => false,
        }
    }

    /// Strict subtype relation between declaring types.
    #[must_use]
    pub fn is_strict_subtype(&self, sub: &Ty, sup: &Ty) -> bool {
        sub != sup && self.lineage(sub).contains(sup)
    }

    #[must_use]
    pub fn is_delegate(&self, ty: &Ty) -> bool {
        self.provider
            .type_shape(ty)
            .is_some_and(|shape| shape.kind == TypeKind::Delegate)
    }
}

/// Most specific type every entry is assignable to, falling back to `Any`.
#[must_use]
pub fn common_ancestor(provider: &dyn MetadataProvider, tys: &[Ty]) -> Ty {
    let hierarchy = TypeHierarchy::new(provider);
    let Some(first) = tys.first() else {
        return Ty::Void;
    };
    if tys.iter().all(|ty| ty == first) {
        return first.clone();
    }
    let concrete: Vec<&Ty> = tys.iter().filter(|ty| **ty != Ty::Null).collect();
    let seed = concrete.first().copied().unwrap_or(first);
    for candidate in hierarchy.lineage(seed) {
        if concrete
            .iter()
            .all(|ty| hierarchy.is_assignable(ty, &candidate))
            && (concrete.len() == tys.len() || !provider.is_value_type(&candidate))
        {
            return candidate;
        }
    }
    Ty::Any
}

//! Host metadata surface consumed by the binder.
//!
//! The binder never owns type or member definitions; it queries them through
//! [`MetadataProvider`]. [`HostRegistry`] is an in-memory provider used by hosts that
//! describe their types programmatically and by the test-suite.

mod hierarchy;
mod registry;

use std::sync::Arc;

use crate::types::{ConstValue, Ty};

pub use hierarchy::{TypeHierarchy, common_ancestor};
pub use registry::{HostRegistry, MemberBuilder, OverloadBuilder, TypeBuilder};

/// Identity of a member within its provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(pub u64);

/// Identity of a metadata source (an assembly, a module, a package).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Visibility {
    Public,
    Internal,
    Private,
}

impl Visibility {
    #[must_use]
    pub fn is_public(self) -> bool {
        matches!(self, Visibility::Public)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Class,
    Struct,
    Interface,
    Delegate,
}

/// Shape of a host type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeShape {
    pub ty: Ty,
    pub kind: TypeKind,
    pub base: Option<Ty>,
    pub interfaces: Vec<Ty>,
    /// Name of the member used for `target[index]` (defaults to `Item`).
    pub default_member: Option<Arc<str>>,
    pub generic_params_unresolved: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ParamKind {
    Normal,
    /// Collects trailing positional arguments.
    ParamsArray,
    /// Collects keyword arguments with no matching parameter.
    ParamsDict,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ParamInfo {
    pub name: Arc<str>,
    pub ty: Ty,
    pub kind: ParamKind,
    pub default: Option<ConstValue>,
    pub is_out: bool,
}

impl ParamInfo {
    #[must_use]
    pub fn new(name: impl AsRef<str>, ty: Ty) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            ty,
            kind: ParamKind::Normal,
            default: None,
            is_out: false,
        }
    }

    #[must_use]
    pub fn with_default(mut self, value: ConstValue) -> Self {
        self.default = Some(value);
        self
    }

    #[must_use]
    pub fn params_array(mut self) -> Self {
        self.kind = ParamKind::ParamsArray;
        self
    }

    #[must_use]
    pub fn params_dict(mut self) -> Self {
        self.kind = ParamKind::ParamsDict;
        self
    }

    #[must_use]
    pub fn out(mut self) -> Self {
        self.is_out = true;
        self
    }

    /// Element type collected by a params-array parameter.
    #[must_use]
    pub fn element_ty(&self) -> Ty {
        match (&self.kind, &self.ty) {
            (ParamKind::ParamsArray, Ty::Array(element)) => (**element).clone(),
            (ParamKind::ParamsArray, _) => Ty::Any,
            _ => self.ty.clone(),
        }
    }
}

/// One callable signature: a method, constructor or accessor.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Overload {
    pub id: MemberId,
    pub name: Arc<str>,
    pub declaring: Ty,
    pub params: Vec<ParamInfo>,
    pub ret: Ty,
    pub is_static: bool,
    pub visibility: Visibility,
    pub generic_arity: usize,
    pub no_side_effects: bool,
    /// Conversion operators flagged explicit-only never serve implicit requests.
    pub explicit_conversion: bool,
}

impl Overload {
    /// Render as `Name(T1, T2)` for diagnostics.
    #[must_use]
    pub fn signature(&self) -> String {
        let params = self
            .params
            .iter()
            .map(|param| match param.kind {
                ParamKind::Normal => param.ty.to_string(),
                ParamKind::ParamsArray => format!("params {}", param.ty),
                ParamKind::ParamsDict => format!("**{}", param.name),
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{}({params})", self.name)
    }

    #[must_use]
    pub fn has_params_array(&self) -> bool {
        self.params
            .iter()
            .any(|param| param.kind == ParamKind::ParamsArray)
    }

    #[must_use]
    pub fn out_count(&self) -> usize {
        self.params.iter().filter(|param| param.is_out).count()
    }

    /// Parameter types excluding the collectors, used to detect hidden overloads.
    #[must_use]
    pub fn same_signature(&self, other: &Overload) -> bool {
        self.is_static == other.is_static
            && self.generic_arity == other.generic_arity
            && self.params.len() == other.params.len()
            && self
                .params
                .iter()
                .zip(&other.params)
                .all(|(left, right)| left.ty == right.ty && left.kind == right.kind)
    }
}

/// Accessor of a property.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Accessor {
    pub visibility: Visibility,
}

impl Accessor {
    pub const PUBLIC: Accessor = Accessor {
        visibility: Visibility::Public,
    };
    pub const PRIVATE: Accessor = Accessor {
        visibility: Visibility::Private,
    };
}

/// Capabilities of a host-defined member kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Capabilities {
    pub get: bool,
    pub set: bool,
    pub delete: bool,
    pub invoke: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostMemberKind {
    Field {
        ty: Ty,
        read_only: bool,
        literal: Option<ConstValue>,
    },
    Property {
        ty: Ty,
        getter: Option<Accessor>,
        setter: Option<Accessor>,
        deleter: Option<Accessor>,
        index_params: Vec<ParamInfo>,
    },
    Method(Arc<Overload>),
    Constructor(Arc<Overload>),
    Event {
        handler: Ty,
    },
    NestedType(Ty),
    Custom {
        ty: Ty,
        capabilities: Capabilities,
    },
}

/// Raw member record as declared by the host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostMember {
    pub id: MemberId,
    pub name: Arc<str>,
    pub declaring: Ty,
    pub is_static: bool,
    pub visibility: Visibility,
    pub no_side_effects: bool,
    pub kind: HostMemberKind,
}

/// Read-only view of the host's type system.
pub trait MetadataProvider: Send + Sync {
    fn type_shape(&self, ty: &Ty) -> Option<TypeShape>;

    /// Members declared directly on `ty`, not including inherited ones.
    fn declared_members(&self, ty: &Ty) -> Vec<Arc<HostMember>>;

    fn sources(&self) -> Vec<SourceId>;

    /// Fully qualified names of the top-level types a source contributes.
    fn source_types(&self, source: SourceId) -> Vec<Arc<str>>;

    fn is_value_type(&self, ty: &Ty) -> bool {
        match ty {
            Ty::Prim(prim) => prim.is_value_type(),
            Ty::Optional(_) => true,
            Ty::Named(_) => self
                .type_shape(ty)
                .is_some_and(|shape| shape.kind == TypeKind::Struct),
            _ => false,
        }
    }

    fn default_member(&self, ty: &Ty) -> Arc<str> {
        self.type_shape(ty)
            .and_then(|shape| shape.default_member)
            .unwrap_or_else(|| Arc::from("Item"))
    }

    fn has_unresolved_generics(&self, ty: &Ty) -> bool {
        self.type_shape(ty)
            .is_some_and(|shape| shape.generic_params_unresolved)
    }
}

#[cfg(test)]
mod tests;

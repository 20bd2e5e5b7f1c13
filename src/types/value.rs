use std::sync::Arc;

use super::{ConstValue, Ty, TypeId};
use crate::catalog::{MemberKind, MemberRef};

/// Runtime value observed at a dynamic call site.
#[derive(Clone, Debug)]
pub enum Value {
    Const(ConstValue),
    /// Host object instance; `id` is its identity within the host heap.
    Object {
        ty: TypeId,
        id: u64,
    },
    Array {
        element: Ty,
        items: Vec<Value>,
    },
    /// Keyword dictionary; entry order is the host's iteration order.
    Map(Vec<(Arc<str>, Value)>),
    Type(Ty),
    /// Namespace value identified by its dotted path.
    Namespace(Arc<str>),
    Member(MemberRef),
    Optional {
        inner: Ty,
        value: Option<Box<Value>>,
    },
    Wrapped {
        inner: Ty,
        value: Box<Value>,
    },
}

/// Identity used by instance guards.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum InstanceKey {
    Object(u64),
    Type(Ty),
    Namespace(Arc<str>),
    Member(u64),
}

impl Value {
    #[must_use]
    pub fn object(ty: impl AsRef<str>, id: u64) -> Self {
        Value::Object {
            ty: TypeId::new(ty),
            id,
        }
    }

    #[must_use]
    pub fn i32(value: i32) -> Self {
        Value::Const(ConstValue::i32(value))
    }

    #[must_use]
    pub fn str(value: impl AsRef<str>) -> Self {
        Value::Const(ConstValue::str(value))
    }

    #[must_use]
    pub fn null() -> Self {
        Value::Const(ConstValue::Null)
    }

    /// Exact runtime type of the value.
    #[must_use]
    pub fn runtime_type(&self) -> Ty {
        match self {
            Value::Const(constant) => constant.ty(),
            Value::Object { ty, .. } => Ty::Named(ty.clone()),
            Value::Array { element, .. } => Ty::Array(Box::new(element.clone())),
            Value::Map(_) => Ty::Map,
            Value::Type(_) => Ty::Meta,
            Value::Namespace(_) => Ty::NamespaceObj,
            Value::Member(member) => match member.kind() {
                MemberKind::Bound(_) => Ty::BoundMemberObj,
                _ => Ty::MemberObj,
            },
            Value::Optional { inner, .. } => Ty::Optional(Box::new(inner.clone())),
            Value::Wrapped { inner, .. } => Ty::Wrapper(Box::new(inner.clone())),
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Const(ConstValue::Null))
    }

    /// Identity for values that are dispatched on by instance rather than by type.
    #[must_use]
    pub fn instance_key(&self) -> Option<InstanceKey> {
        match self {
            Value::Object { id, .. } => Some(InstanceKey::Object(*id)),
            Value::Type(ty) => Some(InstanceKey::Type(ty.clone())),
            Value::Namespace(path) => Some(InstanceKey::Namespace(Arc::clone(path))),
            Value::Member(member) => Some(InstanceKey::Member(member.key())),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_constant(&self) -> Option<&ConstValue> {
        match self {
            Value::Const(constant) => Some(constant),
            _ => None,
        }
    }
}

impl std::fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceKey::Object(id) => write!(f, "object#{id}"),
            InstanceKey::Type(ty) => write!(f, "typeof({ty})"),
            InstanceKey::Namespace(path) => write!(f, "namespace {path}"),
            InstanceKey::Member(key) => write!(f, "member#{key:016x}"),
        }
    }
}

//! Structural type model shared by the catalog, the resolvers and the plan IR.

mod numeric;
mod value;

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

pub use numeric::{PromotionCoords, implicit_numeric, prefer_signed};
pub use value::{InstanceKey, Value};

/// Fully qualified name of a host type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(Arc<str>);

impl TypeId {
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    /// Trailing segment of the qualified name (`Geometry.Point` -> `Point`).
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Built-in scalar types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Primitive {
    Bool,
    Char,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Str,
}

impl Primitive {
    pub const NUMERIC: [Primitive; 10] = [
        Primitive::U8,
        Primitive::U16,
        Primitive::U32,
        Primitive::U64,
        Primitive::I8,
        Primitive::I16,
        Primitive::I32,
        Primitive::I64,
        Primitive::F32,
        Primitive::F64,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Bool => "bool",
            Primitive::Char => "char",
            Primitive::U8 => "u8",
            Primitive::U16 => "u16",
            Primitive::U32 => "u32",
            Primitive::U64 => "u64",
            Primitive::I8 => "i8",
            Primitive::I16 => "i16",
            Primitive::I32 => "i32",
            Primitive::I64 => "i64",
            Primitive::F32 => "f32",
            Primitive::F64 => "f64",
            Primitive::Str => "string",
        }
    }

    /// Name used when composing `ConvertTo<Name>` conversion members.
    #[must_use]
    pub fn host_name(self) -> &'static str {
        match self {
            Primitive::Bool => "Boolean",
            Primitive::Char => "Char",
            Primitive::U8 => "Byte",
            Primitive::U16 => "UInt16",
            Primitive::U32 => "UInt32",
            Primitive::U64 => "UInt64",
            Primitive::I8 => "SByte",
            Primitive::I16 => "Int16",
            Primitive::I32 => "Int32",
            Primitive::I64 => "Int64",
            Primitive::F32 => "Single",
            Primitive::F64 => "Double",
            Primitive::Str => "String",
        }
    }

    #[must_use]
    pub fn is_numeric(self) -> bool {
        self.promotion_coords().is_some()
    }

    #[must_use]
    pub fn is_integer(self) -> bool {
        matches!(
            self,
            Primitive::U8
                | Primitive::U16
                | Primitive::U32
                | Primitive::U64
                | Primitive::I8
                | Primitive::I16
                | Primitive::I32
                | Primitive::I64
        )
    }

    #[must_use]
    pub fn is_signed(self) -> bool {
        matches!(
            self,
            Primitive::I8
                | Primitive::I16
                | Primitive::I32
                | Primitive::I64
                | Primitive::F32
                | Primitive::F64
        )
    }

    #[must_use]
    pub fn is_float(self) -> bool {
        matches!(self, Primitive::F32 | Primitive::F64)
    }

    /// Every primitive except strings is stored inline.
    #[must_use]
    pub fn is_value_type(self) -> bool {
        !matches!(self, Primitive::Str)
    }

    #[must_use]
    pub fn promotion_coords(self) -> Option<PromotionCoords> {
        numeric::coords(self)
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Structural type of an expression or value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Ty {
    /// Universal type; every value converts to it.
    Any,
    /// Type of the null literal.
    Null,
    Void,
    Prim(Primitive),
    Named(TypeId),
    Optional(Box<Ty>),
    Array(Box<Ty>),
    /// Generic wrapper exposing its payload through `Value`.
    Wrapper(Box<Ty>),
    /// Keyword dictionary.
    Map,
    /// Runtime type of type-values.
    Meta,
    NamespaceObj,
    MemberObj,
    BoundMemberObj,
}

impl Ty {
    #[must_use]
    pub fn named(name: impl AsRef<str>) -> Self {
        Ty::Named(TypeId::new(name))
    }

    #[must_use]
    pub fn optional(inner: Ty) -> Self {
        Ty::Optional(Box::new(inner))
    }

    #[must_use]
    pub fn array(element: Ty) -> Self {
        Ty::Array(Box::new(element))
    }

    #[must_use]
    pub fn wrapper(inner: Ty) -> Self {
        Ty::Wrapper(Box::new(inner))
    }

    pub const BOOL: Ty = Ty::Prim(Primitive::Bool);
    pub const I32: Ty = Ty::Prim(Primitive::I32);
    pub const STR: Ty = Ty::Prim(Primitive::Str);

    #[must_use]
    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            Ty::Prim(prim) => Some(*prim),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_named(&self) -> Option<&TypeId> {
        match self {
            Ty::Named(id) => Some(id),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.as_primitive().is_some_and(Primitive::is_numeric)
    }

    #[must_use]
    pub fn is_integer(&self) -> bool {
        self.as_primitive().is_some_and(Primitive::is_integer)
    }

    /// Short name used when composing `ConvertTo<Name>` members and diagnostics.
    #[must_use]
    pub fn short_name(&self) -> String {
        match self {
            Ty::Prim(prim) => prim.host_name().to_string(),
            Ty::Named(id) => id.simple_name().to_string(),
            other => other.to_string(),
        }
    }
}

impl From<Primitive> for Ty {
    fn from(prim: Primitive) -> Self {
        Ty::Prim(prim)
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Any => f.write_str("any"),
            Ty::Null => f.write_str("null"),
            Ty::Void => f.write_str("void"),
            Ty::Prim(prim) => write!(f, "{prim}"),
            Ty::Named(id) => write!(f, "{id}"),
            Ty::Optional(inner) => write!(f, "{inner}?"),
            Ty::Array(element) => write!(f, "{element}[]"),
            Ty::Wrapper(inner) => write!(f, "Wrapper<{inner}>"),
            Ty::Map => f.write_str("map"),
            Ty::Meta => f.write_str("type"),
            Ty::NamespaceObj => f.write_str("namespace"),
            Ty::MemberObj => f.write_str("member"),
            Ty::BoundMemberObj => f.write_str("bound-member"),
        }
    }
}

/// Compile-time constant embedded in plans.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ConstValue {
    Null,
    Bool(bool),
    Char(char),
    Int { ty: Primitive, value: i128 },
    Float { ty: Primitive, bits: u64 },
    Str(Arc<str>),
    Type(Ty),
}

impl ConstValue {
    #[must_use]
    pub fn i32(value: i32) -> Self {
        ConstValue::Int {
            ty: Primitive::I32,
            value: i128::from(value),
        }
    }

    #[must_use]
    pub fn int(ty: Primitive, value: i128) -> Self {
        ConstValue::Int { ty, value }
    }

    #[must_use]
    pub fn f64(value: f64) -> Self {
        ConstValue::Float {
            ty: Primitive::F64,
            bits: value.to_bits(),
        }
    }

    #[must_use]
    pub fn str(value: impl AsRef<str>) -> Self {
        ConstValue::Str(Arc::from(value.as_ref()))
    }

    #[must_use]
    pub fn ty(&self) -> Ty {
        match self {
            ConstValue::Null => Ty::Null,
            ConstValue::Bool(_) => Ty::BOOL,
            ConstValue::Char(_) => Ty::Prim(Primitive::Char),
            ConstValue::Int { ty, .. } | ConstValue::Float { ty, .. } => Ty::Prim(*ty),
            ConstValue::Str(_) => Ty::STR,
            ConstValue::Type(_) => Ty::Meta,
        }
    }

    /// Zero value of a primitive, when the primitive has one.
    #[must_use]
    pub fn zero(prim: Primitive) -> Option<Self> {
        match prim {
            Primitive::Bool => Some(ConstValue::Bool(false)),
            Primitive::Char => Some(ConstValue::Char('\0')),
            Primitive::F32 | Primitive::F64 => Some(ConstValue::Float {
                ty: prim,
                bits: 0f64.to_bits(),
            }),
            Primitive::Str => None,
            int => Some(ConstValue::Int { ty: int, value: 0 }),
        }
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Null => f.write_str("null"),
            ConstValue::Bool(value) => write!(f, "{value}"),
            ConstValue::Char(value) => write!(f, "{value:?}"),
            ConstValue::Int { ty, value } => write!(f, "{value}_{ty}"),
            ConstValue::Float { ty, bits } => write!(f, "{}_{ty}", f64::from_bits(*bits)),
            ConstValue::Str(value) => write!(f, "{value:?}"),
            ConstValue::Type(ty) => write!(f, "typeof({ty})"),
        }
    }
}

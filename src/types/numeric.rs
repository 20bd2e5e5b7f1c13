use super::Primitive;

/// Position of a numeric type in the promotion lattice: `width` grows with the
/// storage size, `kind` is 0 for unsigned, 1 for signed and 2 for floating point.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PromotionCoords {
    pub width: u8,
    pub kind: u8,
}

pub(super) fn coords(prim: Primitive) -> Option<PromotionCoords> {
    let (width, kind) = match prim {
        Primitive::U8 => (0, 0),
        Primitive::U16 => (1, 0),
        Primitive::U32 => (2, 0),
        Primitive::U64 => (3, 0),
        Primitive::I8 => (0, 1),
        Primitive::I16 => (1, 1),
        Primitive::I32 => (2, 1),
        Primitive::I64 => (3, 1),
        Primitive::F32 => (1, 2),
        Primitive::F64 => (2, 2),
        Primitive::Bool | Primitive::Char | Primitive::Str => return None,
    };
    Some(PromotionCoords { width, kind })
}

/// Whether `from` widens to `to` without loss according to the promotion table.
#[must_use]
pub fn implicit_numeric(from: Primitive, to: Primitive) -> bool {
    match (coords(from), coords(to)) {
        (Some(from), Some(to)) => from.width <= to.width && from.kind <= to.kind,
        _ => false,
    }
}

/// Signed-over-unsigned preference between two numeric types that do not
/// convert into each other. Returns `Some(true)` when `left` is preferred.
#[must_use]
pub fn prefer_signed(left: Primitive, right: Primitive) -> Option<bool> {
    if !left.is_numeric() || !right.is_numeric() {
        return None;
    }
    if implicit_numeric(left, right) || implicit_numeric(right, left) {
        return None;
    }
    match (left.is_signed(), right.is_signed()) {
        (true, false) => Some(true),
        (false, true) => Some(false),
        _ => None,
    }
}

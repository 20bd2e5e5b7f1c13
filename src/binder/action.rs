use std::fmt;
use std::sync::Arc;

use super::{FailureMode, Operator};
use crate::conversions::ConversionMode;
use crate::overloads::CallShape;
use crate::types::Ty;

/// A dynamic operation as issued by a call site. Actions compare and hash by
/// value so equal operations share cached rules and combo plans.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum BinderAction {
    /// Operands: target.
    GetMember { name: Arc<str>, mode: FailureMode },
    /// Operands: target, value.
    SetMember { name: Arc<str> },
    /// Operands: target.
    DeleteMember { name: Arc<str> },
    /// Operands: callee, then one per shape entry.
    Invoke { shape: CallShape },
    /// Operands: type value, then one per shape entry.
    Create { shape: CallShape },
    /// Operands: value.
    Convert { to: Ty, mode: ConversionMode },
    /// Operands: one per operator operand.
    Operate { op: Operator },
    /// Operands: target, then `indices` index values.
    GetIndex { indices: usize },
    /// Operands: target, `indices` index values, value.
    SetIndex { indices: usize },
}

impl BinderAction {
    #[must_use]
    pub fn get_member(name: &str) -> Self {
        BinderAction::GetMember {
            name: Arc::from(name),
            mode: FailureMode::Throw,
        }
    }

    #[must_use]
    pub fn set_member(name: &str) -> Self {
        BinderAction::SetMember {
            name: Arc::from(name),
        }
    }

    /// Number of operands the action consumes.
    #[must_use]
    pub fn arity(&self) -> usize {
        match self {
            BinderAction::GetMember { .. }
            | BinderAction::DeleteMember { .. }
            | BinderAction::Convert { .. } => 1,
            BinderAction::SetMember { .. } => 2,
            BinderAction::Invoke { shape } | BinderAction::Create { shape } => shape.len() + 1,
            BinderAction::Operate { op } => op.arity(),
            BinderAction::GetIndex { indices } => indices + 1,
            BinderAction::SetIndex { indices } => indices + 2,
        }
    }
}

impl fmt::Display for BinderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinderAction::GetMember { name, mode } => match mode {
                FailureMode::Throw => write!(f, "get {name}"),
                FailureMode::NoThrow => write!(f, "get? {name}"),
            },
            BinderAction::SetMember { name } => write!(f, "set {name}"),
            BinderAction::DeleteMember { name } => write!(f, "delete {name}"),
            BinderAction::Invoke { shape } => write!(f, "invoke{shape}"),
            BinderAction::Create { shape } => write!(f, "new{shape}"),
            BinderAction::Convert { to, mode } => write!(f, "convert {to} {mode}"),
            BinderAction::Operate { op } => write!(f, "operate {op}"),
            BinderAction::GetIndex { indices } => write!(f, "get-index/{indices}"),
            BinderAction::SetIndex { indices } => write!(f, "set-index/{indices}"),
        }
    }
}

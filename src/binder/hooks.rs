//! Names of the type-level members the binder consults before and after its
//! standard resolution, and the operator method table.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;

use super::{DefaultBinder, Operator};
use crate::error::Result;
use crate::ir::{BoundValue, Expr, GuardSet, TempId};
use crate::metadata::Overload;
use crate::overloads::{BindingTarget, CallShape};
use crate::types::{ConstValue, Ty};

/// Consulted before member lookup on reads; returns the operation-failed
/// sentinel to fall through to standard resolution.
pub const GET_CUSTOM_MEMBER: &str = "GetCustomMember";
/// Consulted when a read finds no member.
pub const GET_BOUND_MEMBER: &str = "GetBoundMember";
/// Consulted before member lookup on writes.
pub const SET_MEMBER: &str = "SetMember";
/// Consulted when a write finds no member.
pub const SET_MEMBER_AFTER: &str = "SetMemberAfter";
pub const DELETE_MEMBER: &str = "DeleteMember";
/// Makes instances of a type callable.
pub const CALL: &str = "Call";
pub const COMPARE: &str = "Compare";

/// Method names implementing one operator.
#[derive(Debug, Clone, Copy)]
pub struct OperatorInfo {
    pub name: &'static str,
    pub alternate: Option<&'static str>,
}

static OPERATORS: Lazy<HashMap<Operator, OperatorInfo>> = Lazy::new(|| {
    let entry = |name, alternate| OperatorInfo { name, alternate };
    HashMap::from([
        (Operator::Add, entry("op_Addition", Some("Add"))),
        (Operator::Subtract, entry("op_Subtraction", Some("Subtract"))),
        (Operator::Multiply, entry("op_Multiply", Some("Multiply"))),
        (Operator::Divide, entry("op_Division", Some("Divide"))),
        (Operator::Modulo, entry("op_Modulus", Some("Mod"))),
        (Operator::LeftShift, entry("op_LeftShift", Some("LeftShift"))),
        (Operator::RightShift, entry("op_RightShift", Some("RightShift"))),
        (Operator::BitAnd, entry("op_BitwiseAnd", Some("BitwiseAnd"))),
        (Operator::BitOr, entry("op_BitwiseOr", Some("BitwiseOr"))),
        (Operator::ExclusiveOr, entry("op_ExclusiveOr", Some("Xor"))),
        (Operator::Equal, entry("op_Equality", Some("Equals"))),
        (Operator::NotEqual, entry("op_Inequality", None)),
        (Operator::LessThan, entry("op_LessThan", None)),
        (Operator::LessThanOrEqual, entry("op_LessThanOrEqual", None)),
        (Operator::GreaterThan, entry("op_GreaterThan", None)),
        (Operator::GreaterThanOrEqual, entry("op_GreaterThanOrEqual", None)),
        (Operator::Negate, entry("op_UnaryNegation", Some("Negate"))),
        (Operator::Not, entry("op_LogicalNot", None)),
        (Operator::IsTrue, entry("op_True", None)),
    ])
});

#[must_use]
pub fn operator_info(op: Operator) -> Option<&'static OperatorInfo> {
    OPERATORS.get(&op)
}

/// Resolved call to a hook method.
pub(super) struct HookCall {
    pub body: Expr,
    pub ret: Ty,
    pub guards: GuardSet,
}

impl DefaultBinder {
    /// Overloads of the method `name` visible on `owner`.
    pub(super) fn method_overloads(&self, owner: &Ty, name: &str) -> Vec<Arc<Overload>> {
        self.catalog()
            .lookup(owner, name)
            .iter()
            .filter_map(|member| member.as_method_group())
            .flat_map(|group| group.overloads().iter().cloned())
            .collect()
    }

    /// Call `hook` on `instance` passing the member name and any extra arguments.
    /// `None` when the type declares no applicable hook.
    pub(super) fn call_hook(
        &self,
        hook: &str,
        instance: &BoundValue,
        name: &str,
        extra: &[BoundValue],
    ) -> Result<Option<HookCall>> {
        let owner = instance.limit_type();
        let candidates = self.method_overloads(&owner, hook);
        if candidates.is_empty() {
            return Ok(None);
        }
        let mut args = vec![instance.clone(), BoundValue::constant(ConstValue::str(name))];
        args.extend(extra.iter().cloned());
        let call = match self
            .overloads()
            .resolve(hook, &candidates, &args, &CallShape::positional(args.len()))?
        {
            BindingTarget::Success(call) => {
                tracing::trace!(target: "binder", hook, owner = %owner, name, "hook applies");
                Some(HookCall {
                    body: call.make_call(),
                    ret: call.result_ty(),
                    guards: call.guards.clone(),
                })
            }
            BindingTarget::Failure(_) => None,
        };
        Ok(call)
    }
}

/// `(tmp = call) != <operation-failed>`: the test of a fall-through hook.
pub(super) fn succeeded(temp: &TempId, call: Expr) -> Expr {
    Expr::binary(
        Operator::NotEqual,
        Expr::assign(Expr::Temp(temp.clone()), call),
        Expr::OperationFailed,
    )
}

use super::{Expr, Guard, GuardSet, TempId};
use crate::types::{ConstValue, Ty, Value};

/// An operand of a dynamic operation: how to compute it, what it is statically
/// known to be, optionally its observed runtime value, and the guards it already
/// depends on.
#[derive(Clone, Debug)]
pub struct BoundValue {
    pub expr: Expr,
    pub static_ty: Ty,
    pub value: Option<Value>,
    pub guards: GuardSet,
}

impl BoundValue {
    #[must_use]
    pub fn new(expr: Expr, static_ty: Ty) -> Self {
        Self {
            expr,
            static_ty,
            value: None,
            guards: GuardSet::new(),
        }
    }

    /// Site input `index` statically typed `Any` with an observed value.
    #[must_use]
    pub fn input(index: usize, value: Value) -> Self {
        Self::typed_input(index, Ty::Any, value)
    }

    #[must_use]
    pub fn typed_input(index: usize, static_ty: Ty, value: Value) -> Self {
        Self {
            expr: Expr::Input(index),
            static_ty,
            value: Some(value),
            guards: GuardSet::new(),
        }
    }

    #[must_use]
    pub fn constant(value: ConstValue) -> Self {
        Self {
            expr: Expr::Constant(value.clone()),
            static_ty: value.ty(),
            value: Some(Value::Const(value)),
            guards: GuardSet::new(),
        }
    }

    /// Runtime type when a value was observed, else the static type.
    #[must_use]
    pub fn limit_type(&self) -> Ty {
        self.value
            .as_ref()
            .map_or_else(|| self.static_ty.clone(), Value::runtime_type)
    }

    /// Nothing can be decided about this operand yet.
    #[must_use]
    pub fn needs_deferral(&self) -> bool {
        self.value.is_none() && self.static_ty == Ty::Any
    }

    /// Guard pinning the operand's runtime type, when one is needed.
    #[must_use]
    pub fn type_guard(&self) -> Option<Guard> {
        if self.value.is_none() || self.expr.is_constant() {
            return None;
        }
        Some(Guard::TypeExact {
            target: self.expr.clone(),
            ty: self.limit_type(),
        })
    }

    /// Guard pinning the operand's identity, for values dispatched on by instance.
    #[must_use]
    pub fn instance_guard(&self) -> Option<Guard> {
        if self.expr.is_constant() {
            return None;
        }
        let key = self.value.as_ref()?.instance_key()?;
        Some(Guard::Instance {
            target: self.expr.clone(),
            key,
        })
    }

    /// Operand restricted to its runtime type: the type guard is recorded and the
    /// expression is typed as the runtime type.
    #[must_use]
    pub fn restrict(&self) -> BoundValue {
        let mut restricted = self.clone();
        if let Some(guard) = self.type_guard() {
            restricted.guards.push(guard);
        }
        let limit = self.limit_type();
        if limit != self.static_ty {
            restricted.expr = Expr::convert(self.expr.clone(), limit.clone());
            restricted.static_ty = limit;
        }
        restricted
    }

    /// Same as [`restrict`](Self::restrict) but keeps the original expression typing.
    #[must_use]
    pub fn restrict_type_only(&self) -> BoundValue {
        let mut restricted = self.clone();
        if let Some(guard) = self.type_guard() {
            restricted.guards.push(guard);
        }
        restricted
    }
}

/// How a rule finishes when its guards hold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    Value,
    Thrown,
    ContinueResolution,
}

/// Cacheable decision plan produced by one resolution.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BoundRule {
    pub body: Expr,
    pub result_ty: Ty,
    pub guards: GuardSet,
    pub outcome: Outcome,
    pub temps: Vec<TempId>,
}

impl BoundRule {
    #[must_use]
    pub fn value(body: Expr, result_ty: Ty) -> Self {
        Self {
            body,
            result_ty,
            guards: GuardSet::new(),
            outcome: Outcome::Value,
            temps: Vec::new(),
        }
    }

    #[must_use]
    pub fn thrown(body: Expr) -> Self {
        Self {
            body,
            result_ty: Ty::Void,
            guards: GuardSet::new(),
            outcome: Outcome::Thrown,
            temps: Vec::new(),
        }
    }

    /// Rule asking the caller to resolve again once more is known about the operands.
    #[must_use]
    pub fn defer(guards: GuardSet) -> Self {
        Self {
            body: Expr::ContinueResolution,
            result_ty: Ty::Any,
            guards,
            outcome: Outcome::ContinueResolution,
            temps: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_guards(mut self, guards: &GuardSet) -> Self {
        self.guards = guards.merge(&self.guards);
        self
    }

    #[must_use]
    pub fn is_thrown(&self) -> bool {
        self.outcome == Outcome::Thrown
    }

    #[must_use]
    pub fn is_deferred(&self) -> bool {
        self.outcome == Outcome::ContinueResolution
    }

    /// Produced value as an operand for a follow-up operation.
    #[must_use]
    pub fn as_bound_value(&self) -> BoundValue {
        BoundValue {
            expr: self.body.clone(),
            static_ty: self.result_ty.clone(),
            value: None,
            guards: self.guards.clone(),
        }
    }
}

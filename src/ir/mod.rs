//! Plan IR: the expression tree a rule's body is built from, the guard sets that
//! keep it valid, and the values and rules exchanged between the binder components.

mod bound;
mod guards;
mod pretty;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use crate::binder::{BinderAction, Operator};
use crate::catalog::MemberRef;
use crate::diagnostics::Diagnostic;
use crate::metadata::{MemberId, Overload};
use crate::types::{ConstValue, Ty};

pub use bound::{BoundRule, BoundValue, Outcome};
pub use guards::{Guard, GuardSet};
pub use pretty::{FragmentCompiler, TextCompiler, render_rule};

/// Named temporary introduced by a rule.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TempId(pub Arc<str>);

impl TempId {
    #[must_use]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }
}

/// Target of a call expression.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Callee {
    pub declaring: Ty,
    pub name: Arc<str>,
    pub id: MemberId,
    pub is_static: bool,
    pub no_side_effects: bool,
    pub ret: Ty,
}

impl Callee {
    #[must_use]
    pub fn of(overload: &Overload) -> Self {
        Self {
            declaring: overload.declaring.clone(),
            name: Arc::clone(&overload.name),
            id: overload.id,
            is_static: overload.is_static,
            no_side_effects: overload.no_side_effects,
            ret: overload.ret.clone(),
        }
    }

    /// Accessor call synthesized for a property (`get_Name`, `set_Name`, `delete_Name`).
    #[must_use]
    pub fn accessor(
        prefix: &str,
        declaring: &Ty,
        name: &str,
        id: MemberId,
        is_static: bool,
        no_side_effects: bool,
        ret: Ty,
    ) -> Self {
        Self {
            declaring: declaring.clone(),
            name: Arc::from(format!("{prefix}_{name}")),
            id,
            is_static,
            no_side_effects,
            ret,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub declaring: Ty,
    pub name: Arc<str>,
    pub ty: Ty,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Expr {
    Constant(ConstValue),
    Default(Ty),
    /// Site input by position.
    Input(usize),
    /// Variable read from the enclosing host expression tree.
    Variable(Arc<str>),
    Temp(TempId),
    Field {
        target: Option<Box<Expr>>,
        field: FieldRef,
    },
    Call {
        target: Option<Box<Expr>>,
        callee: Callee,
        args: Vec<Expr>,
    },
    New {
        ty: Ty,
        callee: Option<Callee>,
        args: Vec<Expr>,
    },
    Assign {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Block {
        temps: Vec<TempId>,
        body: Vec<Expr>,
    },
    Condition {
        test: Box<Expr>,
        then: Box<Expr>,
        otherwise: Box<Expr>,
        ty: Ty,
    },
    Throw {
        diagnostic: Box<Diagnostic>,
        ty: Ty,
        light: bool,
    },
    Convert {
        value: Box<Expr>,
        to: Ty,
    },
    TypeIs {
        value: Box<Expr>,
        ty: Ty,
    },
    /// Binary operation; `method` is set when a user-defined operator implements it.
    Binary {
        op: Operator,
        left: Box<Expr>,
        right: Box<Expr>,
        method: Option<Callee>,
    },
    Unary {
        op: Operator,
        operand: Box<Expr>,
    },
    ArrayIndex {
        array: Box<Expr>,
        index: Box<Expr>,
    },
    MapGet {
        map: Box<Expr>,
        key: Arc<str>,
    },
    BuildArray {
        element: Ty,
        items: Vec<Expr>,
    },
    BuildMap {
        entries: Vec<(Arc<str>, Expr)>,
    },
    /// Payload of a `Wrapper<T>` value.
    WrapperValue(Box<Expr>),
    /// Evaluate `body`; on a runtime fault produce `default(ty)` instead.
    TryDefault {
        body: Box<Expr>,
        ty: Ty,
    },
    MemberValue(MemberRef),
    MakeBound {
        member: MemberRef,
        instance: Box<Expr>,
    },
    /// Instance captured by a bound-member value.
    BoundInstance(Box<Expr>),
    /// Sentinel returned by non-throwing operations that did not apply.
    OperationFailed,
    /// Resolution could not finish with the information available.
    ContinueResolution,
    /// Redo the resolution of one fused constituent with already computed arguments.
    Rebind {
        constituent: usize,
        args: Vec<Expr>,
    },
    /// Unfused dynamic operation left in place.
    Dynamic {
        action: Box<BinderAction>,
        args: Vec<Expr>,
    },
}

impl Expr {
    #[must_use]
    pub fn constant(value: ConstValue) -> Self {
        Expr::Constant(value)
    }

    #[must_use]
    pub fn convert(value: Expr, to: Ty) -> Self {
        Expr::Convert {
            value: Box::new(value),
            to,
        }
    }

    #[must_use]
    pub fn call(target: Option<Expr>, callee: Callee, args: Vec<Expr>) -> Self {
        Expr::Call {
            target: target.map(Box::new),
            callee,
            args,
        }
    }

    #[must_use]
    pub fn assign(target: Expr, value: Expr) -> Self {
        Expr::Assign {
            target: Box::new(target),
            value: Box::new(value),
        }
    }

    #[must_use]
    pub fn binary(op: Operator, left: Expr, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            method: None,
        }
    }

    #[must_use]
    pub fn unary(op: Operator, operand: Expr) -> Self {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    #[must_use]
    pub fn block(temps: Vec<TempId>, body: Vec<Expr>) -> Self {
        Expr::Block { temps, body }
    }

    #[must_use]
    pub fn temp(name: &str) -> Self {
        Expr::Temp(TempId::new(name))
    }

    #[must_use]
    pub fn is_constant(&self) -> bool {
        matches!(self, Expr::Constant(_) | Expr::Default(_))
    }

    /// Replace every `ContinueResolution` marker with `replacement`.
    #[must_use]
    pub fn replace_continuation(self, replacement: &Expr) -> Expr {
        let swap = |expr: Box<Expr>| Box::new(expr.replace_continuation(replacement));
        let swap_all = |exprs: Vec<Expr>| {
            exprs
                .into_iter()
                .map(|expr| expr.replace_continuation(replacement))
                .collect()
        };
        match self {
            Expr::ContinueResolution => replacement.clone(),
            Expr::Block { temps, body } => Expr::Block {
                temps,
                body: swap_all(body),
            },
            Expr::Condition {
                test,
                then,
                otherwise,
                ty,
            } => Expr::Condition {
                test: swap(test),
                then: swap(then),
                otherwise: swap(otherwise),
                ty,
            },
            Expr::Assign { target, value } => Expr::Assign {
                target,
                value: swap(value),
            },
            Expr::Convert { value, to } => Expr::Convert {
                value: swap(value),
                to,
            },
            Expr::TryDefault { body, ty } => Expr::TryDefault { body: swap(body), ty },
            other => other,
        }
    }
}

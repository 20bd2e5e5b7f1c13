use std::fmt;

use super::hooks::{COMPARE, operator_info};
use super::{DefaultBinder, ErrorPolicy};
use crate::diagnostics::Diagnostic;
use crate::error::{Error, Result};
use crate::ir::{BoundRule, BoundValue, Expr, GuardSet};
use crate::overloads::{BindingTarget, CallShape};
use crate::types::{ConstValue, Primitive, Ty};

/// Operators understood by [`DefaultBinder::resolve_operation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    LeftShift,
    RightShift,
    BitAnd,
    BitOr,
    ExclusiveOr,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    Negate,
    Not,
    IsTrue,
}

impl Operator {
    #[must_use]
    pub fn arity(self) -> usize {
        match self {
            Operator::Negate | Operator::Not | Operator::IsTrue => 1,
            _ => 2,
        }
    }

    #[must_use]
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Operator::Equal
                | Operator::NotEqual
                | Operator::LessThan
                | Operator::LessThanOrEqual
                | Operator::GreaterThan
                | Operator::GreaterThanOrEqual
        )
    }

    /// Comparison whose negation this operator is.
    #[must_use]
    pub fn inverted(self) -> Option<Operator> {
        match self {
            Operator::LessThan => Some(Operator::GreaterThanOrEqual),
            Operator::GreaterThanOrEqual => Some(Operator::LessThan),
            Operator::LessThanOrEqual => Some(Operator::GreaterThan),
            Operator::GreaterThan => Some(Operator::LessThanOrEqual),
            Operator::Equal => Some(Operator::NotEqual),
            Operator::NotEqual => Some(Operator::Equal),
            _ => None,
        }
    }

    fn is_bitwise(self) -> bool {
        matches!(
            self,
            Operator::LeftShift
                | Operator::RightShift
                | Operator::BitAnd
                | Operator::BitOr
                | Operator::ExclusiveOr
        )
    }

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Subtract | Operator::Negate => "-",
            Operator::Multiply => "*",
            Operator::Divide => "/",
            Operator::Modulo => "%",
            Operator::LeftShift => "<<",
            Operator::RightShift => ">>",
            Operator::BitAnd => "&",
            Operator::BitOr => "|",
            Operator::ExclusiveOr => "^",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::Not => "!",
            Operator::IsTrue => "?",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl DefaultBinder {
    /// Rule applying `op` to `args`.
    ///
    /// Comparisons try a user operator on either operand, a `Compare` member,
    /// the inverted operator, null tests and finally primitive comparison. Other
    /// operators try the forward and reverse user operator, then primitive
    /// arithmetic and the default unary meanings.
    pub fn resolve_operation(
        &self,
        op: Operator,
        args: &[BoundValue],
        policy: &ErrorPolicy,
    ) -> Result<BoundRule> {
        if args.len() != op.arity() {
            return Err(Error::internal(format!(
                "operator {op} takes {} operands, {} given",
                op.arity(),
                args.len()
            )));
        }
        let mut guards = GuardSet::new();
        for arg in args {
            guards.extend(&arg.guards);
        }
        if args.iter().any(BoundValue::needs_deferral) {
            return Ok(self.trace("operate", op.symbol(), BoundRule::defer(guards)));
        }
        let restricted: Vec<BoundValue> = args.iter().map(BoundValue::restrict).collect();
        let found = if op.is_comparison() {
            self.comparison(op, &restricted)?
        } else {
            self.either_operator(op, &restricted)?
                .or_else(|| primitive_arithmetic(op, &restricted))
                .or_else(|| default_unary(op, &restricted))
        };
        let rule = match found {
            Some(rule) => rule.with_guards(&guards),
            None => {
                let operands: Vec<Ty> = restricted.iter().map(BoundValue::limit_type).collect();
                let mut failed = guards;
                for arg in &restricted {
                    failed.extend(&arg.guards);
                }
                self.failure(
                    Diagnostic::bad_operands(op.symbol(), &operands),
                    Ty::BOOL,
                    policy,
                    &failed,
                )
            }
        };
        Ok(self.trace("operate", op.symbol(), rule))
    }

    // Operator method declared on `owner`'s type, under its canonical or
    // alternate name.
    fn user_operator(&self, op: Operator, owner: &BoundValue, args: &[BoundValue]) -> Result<Option<BoundRule>> {
        let Some(info) = operator_info(op) else {
            return Ok(None);
        };
        let owner_ty = owner.limit_type();
        if owner_ty.as_primitive().is_some() {
            return Ok(None);
        }
        for name in std::iter::once(info.name).chain(info.alternate) {
            if let Some(rule) = self.call_method(&owner_ty, name, args)? {
                return Ok(Some(rule));
            }
        }
        Ok(None)
    }

    // Forward operator on operand 0, then the reverse one on operand 1.
    fn either_operator(&self, op: Operator, args: &[BoundValue]) -> Result<Option<BoundRule>> {
        if let Some(rule) = self.user_operator(op, &args[0], args)? {
            return Ok(Some(rule));
        }
        match args.get(1) {
            Some(second) => self.user_operator(op, second, args),
            None => Ok(None),
        }
    }

    fn call_method(&self, owner: &Ty, name: &str, args: &[BoundValue]) -> Result<Option<BoundRule>> {
        let candidates = self.method_overloads(owner, name);
        if candidates.is_empty() {
            return Ok(None);
        }
        let rule = match self
            .overloads()
            .resolve(name, &candidates, args, &CallShape::positional(args.len()))?
        {
            BindingTarget::Success(call) => {
                Some(BoundRule::value(call.make_call(), call.result_ty()).with_guards(&call.guards))
            }
            BindingTarget::Failure(_) => None,
        };
        Ok(rule)
    }

    fn compare_member(&self, op: Operator, args: &[BoundValue]) -> Result<Option<BoundRule>> {
        let owner = args[0].limit_type();
        let Some(compared) = self.call_method(&owner, COMPARE, args)? else {
            return Ok(None);
        };
        let body = Expr::binary(
            op,
            Expr::convert(compared.body.clone(), Ty::I32),
            Expr::Constant(ConstValue::i32(0)),
        );
        Ok(Some(BoundRule::value(body, Ty::BOOL).with_guards(&compared.guards)))
    }

    fn inverted_operator(&self, op: Operator, args: &[BoundValue]) -> Result<Option<BoundRule>> {
        let Some(inverse) = op.inverted() else {
            return Ok(None);
        };
        let Some(found) = self.either_operator(inverse, args)? else {
            return Ok(None);
        };
        Ok(Some(
            BoundRule::value(Expr::unary(Operator::Not, found.body.clone()), Ty::BOOL)
                .with_guards(&found.guards),
        ))
    }

    fn comparison(&self, op: Operator, args: &[BoundValue]) -> Result<Option<BoundRule>> {
        if let Some(rule) = self.either_operator(op, args)? {
            return Ok(Some(rule));
        }
        if let Some(rule) = self.compare_member(op, args)? {
            return Ok(Some(rule));
        }
        if let Some(rule) = self.inverted_operator(op, args)? {
            return Ok(Some(rule));
        }
        Ok(self
            .null_comparison(op, args)
            .or_else(|| primitive_comparison(op, args)))
    }

    // `x == null` and `x != null` for reference and optional operands.
    fn null_comparison(&self, op: Operator, args: &[BoundValue]) -> Option<BoundRule> {
        if !matches!(op, Operator::Equal | Operator::NotEqual) {
            return None;
        }
        let (null, other) = match (args[0].limit_type(), args[1].limit_type()) {
            (Ty::Null, _) => (&args[0], &args[1]),
            (_, Ty::Null) => (&args[1], &args[0]),
            _ => return None,
        };
        let other_ty = other.limit_type();
        let provider = self.catalog().provider();
        if provider.is_value_type(&other_ty) && !matches!(other_ty, Ty::Optional(_)) {
            return None;
        }
        let guards = null.guards.merge(&other.guards);
        Some(
            BoundRule::value(
                Expr::binary(op, other.expr.clone(), Expr::Constant(ConstValue::Null)),
                Ty::BOOL,
            )
            .with_guards(&guards),
        )
    }
}

fn same_primitive(args: &[BoundValue]) -> Option<Primitive> {
    let first = args.first()?.limit_type().as_primitive()?;
    args.iter()
        .all(|arg| arg.limit_type() == Ty::Prim(first))
        .then_some(first)
}

fn operand_guards(args: &[BoundValue]) -> GuardSet {
    let mut guards = GuardSet::new();
    for arg in args {
        guards.extend(&arg.guards);
    }
    guards
}

fn primitive_comparison(op: Operator, args: &[BoundValue]) -> Option<BoundRule> {
    let prim = same_primitive(args)?;
    let comparable = prim.is_numeric()
        || (matches!(op, Operator::Equal | Operator::NotEqual)
            && matches!(prim, Primitive::Bool | Primitive::Char | Primitive::Str));
    if !comparable {
        return None;
    }
    Some(
        BoundRule::value(
            Expr::binary(op, args[0].expr.clone(), args[1].expr.clone()),
            Ty::BOOL,
        )
        .with_guards(&operand_guards(args)),
    )
}

fn primitive_arithmetic(op: Operator, args: &[BoundValue]) -> Option<BoundRule> {
    if args.len() != 2 {
        return None;
    }
    let prim = same_primitive(args)?;
    let applies = if op.is_bitwise() {
        prim.is_integer() || (prim == Primitive::Bool && !matches!(op, Operator::LeftShift | Operator::RightShift))
    } else {
        prim.is_numeric()
    };
    if !applies {
        return None;
    }
    Some(
        BoundRule::value(
            Expr::binary(op, args[0].expr.clone(), args[1].expr.clone()),
            Ty::Prim(prim),
        )
        .with_guards(&operand_guards(args)),
    )
}

fn default_unary(op: Operator, args: &[BoundValue]) -> Option<BoundRule> {
    let [operand] = args else {
        return None;
    };
    let ty = operand.limit_type();
    let prim = ty.as_primitive()?;
    let body = match op {
        Operator::IsTrue if prim == Primitive::Bool => operand.expr.clone(),
        Operator::Negate if prim.is_numeric() => Expr::unary(op, operand.expr.clone()),
        Operator::Not if prim.is_integer() || prim == Primitive::Bool => {
            Expr::unary(op, operand.expr.clone())
        }
        _ => return None,
    };
    let result = if op == Operator::IsTrue { Ty::BOOL } else { ty };
    Some(BoundRule::value(body, result).with_guards(&operand.guards))
}

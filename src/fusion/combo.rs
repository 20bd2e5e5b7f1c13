use super::{ComboPlan, ParameterMapping};
use crate::binder::DefaultBinder;
use crate::error::{Error, Result};
use crate::ir::{BoundRule, BoundValue, Expr, GuardSet, Outcome, TempId};
use crate::types::Ty;

/// Bind every constituent of `plan` in order and sequence the results into
/// one rule. `inputs` are the combo site's operands, positionally.
///
/// Each intermediate result is stored in a temporary the later constituents
/// read. A constituent after the first that cannot be resolved yet becomes a
/// `Rebind` of just that constituent over the already computed operands; a
/// constituent that throws ends the sequence.
pub fn bind_combo(binder: &DefaultBinder, plan: &ComboPlan, inputs: &[BoundValue]) -> Result<BoundRule> {
    let Some(last) = plan.constituents.len().checked_sub(1) else {
        return Err(Error::internal("combo plan has no constituents"));
    };
    let mut guards = GuardSet::new();
    let mut temps: Vec<TempId> = Vec::new();
    let mut body: Vec<Expr> = Vec::with_capacity(plan.len());
    let mut results: Vec<BoundValue> = Vec::with_capacity(last);
    let mut result_ty = Ty::Any;
    let mut outcome = Outcome::Value;

    for (index, constituent) in plan.constituents.iter().enumerate() {
        let args = constituent
            .mapping
            .iter()
            .map(|mapping| operand(mapping, inputs, &results))
            .collect::<Result<Vec<_>>>()?;
        let rule = binder.bind(&constituent.action, &args)?;
        guards.extend(&rule.guards);
        for temp in &rule.temps {
            if !temps.contains(temp) {
                temps.push(temp.clone());
            }
        }

        let (expr, ty) = if rule.is_deferred() {
            if index == 0 {
                tracing::debug!(target: "fusion", action = %constituent.action, "first constituent deferred");
                return Ok(BoundRule::defer(guards));
            }
            let rebind = Expr::Rebind {
                constituent: index,
                args: args.iter().map(|arg| arg.expr.clone()).collect(),
            };
            (rule.body.replace_continuation(&rebind), Ty::Any)
        } else {
            (rule.body, rule.result_ty)
        };

        if rule.outcome == Outcome::Thrown {
            tracing::debug!(target: "fusion", action = %constituent.action, constituent = index, "constituent throws");
            body.push(expr);
            result_ty = Ty::Void;
            outcome = Outcome::Thrown;
            break;
        }
        if index == last {
            body.push(expr);
            result_ty = ty;
            break;
        }
        let temp = TempId::new(format!("comboTemp{index}"));
        temps.push(temp.clone());
        body.push(Expr::assign(Expr::Temp(temp.clone()), expr));
        results.push(BoundValue::new(Expr::Temp(temp), ty));
    }

    tracing::debug!(
        target: "fusion",
        constituents = plan.len(),
        outcome = %outcome,
        result = %result_ty,
        guards = guards.len(),
        "combo bound"
    );
    Ok(BoundRule {
        body: Expr::block(Vec::new(), body),
        result_ty,
        guards,
        outcome,
        temps,
    })
}

fn operand(mapping: &ParameterMapping, inputs: &[BoundValue], results: &[BoundValue]) -> Result<BoundValue> {
    match mapping {
        ParameterMapping::Parameter(index) => inputs
            .get(*index)
            .cloned()
            .ok_or_else(|| Error::internal(format!("combo input {index} was not supplied"))),
        ParameterMapping::SubRuleResult(index) => results
            .get(*index)
            .cloned()
            .ok_or_else(|| Error::internal(format!("constituent #{index} is used before it is bound"))),
        ParameterMapping::Constant(value) => Ok(BoundValue::constant(value.clone())),
    }
}

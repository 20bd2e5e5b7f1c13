use super::DefaultBinder;
use crate::conversions::ConversionMode;
use crate::ir::{BoundRule, BoundValue, Expr};
use crate::types::Ty;

impl DefaultBinder {
    /// Rule converting `value` to `to`. Best-effort modes never throw: a failed
    /// conversion yields the default of `to`, and so does a user conversion that
    /// faults at run time.
    #[must_use]
    pub fn resolve_convert(&self, value: &BoundValue, to: &Ty, mode: ConversionMode) -> BoundRule {
        let subject = to.to_string();
        if value.needs_deferral() && *to != Ty::Any {
            return self.trace("convert", &subject, BoundRule::defer(value.guards.clone()));
        }
        let mut rule = self.conversions().convert_to(value, to, mode);
        if mode.is_best_effort() {
            rule.body = guard_faults(rule.body, to);
        }
        self.trace("convert", &subject, rule)
    }
}

fn guard_faults(body: Expr, to: &Ty) -> Expr {
    match body {
        call @ Expr::Call { .. } => Expr::TryDefault {
            body: Box::new(call),
            ty: to.clone(),
        },
        Expr::Convert { value, to: Ty::Any } if matches!(*value, Expr::Call { .. }) => Expr::convert(
            Expr::TryDefault {
                body: value,
                ty: to.clone(),
            },
            Ty::Any,
        ),
        other => other,
    }
}

use crate::ir::Expr;

/// Whether evaluating `expr` provably has no observable effect, so it may be
/// evaluated ahead of the operations it is fused with.
#[must_use]
pub fn is_side_effect_free(expr: &Expr) -> bool {
    match expr {
        Expr::Input(_)
        | Expr::Variable(_)
        | Expr::Temp(_)
        | Expr::Constant(_)
        | Expr::Default(_) => true,
        Expr::TypeIs { value, .. } => is_side_effect_free(value),
        // Overloaded operators run user code.
        Expr::Binary {
            left,
            right,
            method: None,
            ..
        } => is_side_effect_free(left) && is_side_effect_free(right),
        Expr::Call {
            target,
            callee,
            args,
        } => {
            callee.no_side_effects
                && target.as_deref().is_none_or(is_side_effect_free)
                && args.iter().all(is_side_effect_free)
        }
        Expr::Condition {
            test,
            then,
            otherwise,
            ..
        } => is_side_effect_free(test) && is_side_effect_free(then) && is_side_effect_free(otherwise),
        _ => false,
    }
}

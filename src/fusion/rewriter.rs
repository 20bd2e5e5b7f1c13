use super::side_effects::is_side_effect_free;
use super::{ComboPlan, ComboSite, Constituent, FusionArg, FusionNode, ParameterMapping};
use crate::ir::Expr;

/// Flatten `root` and the operations nested in its operands into one combo
/// site. Nested operations become earlier constituents; the root is last.
#[must_use]
pub fn fuse(root: FusionNode) -> ComboSite {
    let mut rewriter = Rewriter::default();
    let _ = rewriter.visit(root);
    let site = ComboSite {
        plan: ComboPlan {
            constituents: rewriter.constituents,
        },
        inputs: rewriter.inputs,
    };
    tracing::debug!(
        target: "fusion",
        constituents = site.plan.len(),
        inputs = site.inputs.len(),
        identity = %format!("{:016x}", site.plan.identity()),
        "fused"
    );
    site
}

#[derive(Default)]
struct Rewriter {
    constituents: Vec<Constituent>,
    inputs: Vec<Expr>,
}

fn is_parameter_read(expr: &Expr) -> bool {
    matches!(expr, Expr::Input(_) | Expr::Variable(_) | Expr::Temp(_))
}

impl Rewriter {
    // Operands are visited left to right. Once an operand may have side effects
    // it and everything after it are passed through unfused, so evaluation
    // order is kept.
    fn visit(&mut self, node: FusionNode) -> usize {
        let FusionNode { action, args } = node;
        let mut mapping = Vec::with_capacity(args.len());
        let mut fusing = true;
        for arg in args {
            if !fusing {
                mapping.push(ParameterMapping::Parameter(self.push_input(arg.into_expr())));
                continue;
            }
            let entry = match arg {
                FusionArg::Node(child) => ParameterMapping::SubRuleResult(self.visit(*child)),
                FusionArg::Expr(Expr::Constant(value)) => ParameterMapping::Constant(value),
                FusionArg::Expr(expr) if is_parameter_read(&expr) => {
                    ParameterMapping::Parameter(self.share_input(expr))
                }
                FusionArg::Expr(expr) => {
                    fusing = is_side_effect_free(&expr);
                    if !fusing {
                        tracing::trace!(target: "fusion", action = %action, operand = %expr, "fusion stops");
                    }
                    ParameterMapping::Parameter(self.push_input(expr))
                }
            };
            mapping.push(entry);
        }
        self.constituents.push(Constituent { action, mapping });
        self.constituents.len() - 1
    }

    fn push_input(&mut self, expr: Expr) -> usize {
        self.inputs.push(expr);
        self.inputs.len() - 1
    }

    fn share_input(&mut self, expr: Expr) -> usize {
        match self.inputs.iter().position(|input| *input == expr) {
            Some(index) => index,
            None => self.push_input(expr),
        }
    }
}

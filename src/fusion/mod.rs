//! Combo binding: fuses a tree of dependent dynamic operations into one plan
//! whose constituents are bound in order, each feeding its result to the next.

mod combo;
mod rewriter;
mod side_effects;

use std::fmt;

use crate::binder::BinderAction;
use crate::catalog::identity;
use crate::ir::Expr;
use crate::types::ConstValue;

pub use combo::bind_combo;
pub use rewriter::fuse;
pub use side_effects::is_side_effect_free;

/// One dynamic operation whose operands are either plain expressions or the
/// results of nested operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FusionNode {
    pub action: BinderAction,
    pub args: Vec<FusionArg>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FusionArg {
    Node(Box<FusionNode>),
    Expr(Expr),
}

impl FusionNode {
    #[must_use]
    pub fn new(action: BinderAction, args: Vec<FusionArg>) -> Self {
        Self { action, args }
    }

    /// The operation as an unfused dynamic expression.
    #[must_use]
    pub fn into_dynamic(self) -> Expr {
        Expr::Dynamic {
            action: Box::new(self.action),
            args: self.args.into_iter().map(FusionArg::into_expr).collect(),
        }
    }
}

impl FusionArg {
    #[must_use]
    pub fn node(node: FusionNode) -> Self {
        FusionArg::Node(Box::new(node))
    }

    #[must_use]
    pub fn into_expr(self) -> Expr {
        match self {
            FusionArg::Node(node) => node.into_dynamic(),
            FusionArg::Expr(expr) => expr,
        }
    }
}

impl From<Expr> for FusionArg {
    fn from(expr: Expr) -> Self {
        FusionArg::Expr(expr)
    }
}

impl From<FusionNode> for FusionArg {
    fn from(node: FusionNode) -> Self {
        FusionArg::node(node)
    }
}

/// Where a constituent operand comes from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ParameterMapping {
    /// Combo site input by position.
    Parameter(usize),
    /// Result of an earlier constituent.
    SubRuleResult(usize),
    /// Literal hoisted out of the input list.
    Constant(ConstValue),
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Constituent {
    pub action: BinderAction,
    pub mapping: Vec<ParameterMapping>,
}

/// Ordered constituents of a fused operation. Constituents only refer to
/// results of constituents before them; the last one produces the value.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ComboPlan {
    pub constituents: Vec<Constituent>,
}

impl ComboPlan {
    /// Stable digest of the constituent actions and their mappings.
    #[must_use]
    pub fn identity(&self) -> u64 {
        let parts: Vec<String> = self
            .constituents
            .iter()
            .map(Constituent::to_string)
            .collect();
        let parts: Vec<&str> = parts.iter().map(String::as_str).collect();
        identity(&parts)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.constituents.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.constituents.is_empty()
    }
}

/// A fused call site: the plan plus the expressions feeding its parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComboSite {
    pub plan: ComboPlan,
    pub inputs: Vec<Expr>,
}

impl fmt::Display for ParameterMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParameterMapping::Parameter(index) => write!(f, "${index}"),
            ParameterMapping::SubRuleResult(index) => write!(f, "#{index}"),
            ParameterMapping::Constant(value) => write!(f, "{value}"),
        }
    }
}

impl fmt::Display for Constituent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.action)?;
        for (index, mapping) in self.mapping.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{mapping}")?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for ComboPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, constituent) in self.constituents.iter().enumerate() {
            if index > 0 {
                f.write_str("\n")?;
            }
            write!(f, "#{index} = {constituent}")?;
        }
        Ok(())
    }
}

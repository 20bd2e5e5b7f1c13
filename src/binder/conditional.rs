use crate::error::{Error, Result};
use crate::ir::{BoundRule, Expr, GuardSet, Outcome, TempId};
use crate::metadata::{MetadataProvider, common_ancestor};
use crate::types::Ty;

/// Accumulates `(test, branch)` pairs plus a final branch and folds them into one
/// rule of nested conditions, right to left.
#[derive(Debug, Default)]
pub struct ConditionalBuilder {
    conditions: Vec<(Expr, BoundRule)>,
    finish: Option<BoundRule>,
    temps: Vec<TempId>,
    guards: GuardSet,
}

impl ConditionalBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// `branch` applies when `test` holds; later branches apply otherwise.
    pub fn add_condition(&mut self, test: Expr, branch: BoundRule) {
        self.conditions.push((test, branch));
    }

    /// Final branch, taken when no condition held.
    pub fn finish_condition(&mut self, branch: BoundRule) {
        self.finish = Some(branch);
    }

    /// Final branch that reports a failure.
    pub fn finish_error(&mut self, body: Expr) {
        self.finish = Some(BoundRule::thrown(body));
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finish.is_some()
    }

    pub fn add_temp(&mut self, temp: TempId) {
        if !self.temps.contains(&temp) {
            self.temps.push(temp);
        }
    }

    pub fn add_guards(&mut self, guards: &GuardSet) {
        self.guards.extend(guards);
    }

    /// Fold into one rule. The result type is the common ancestor of the
    /// value-producing branches.
    pub fn finalize(self, provider: &dyn MetadataProvider) -> Result<BoundRule> {
        let Some(finish) = self.finish else {
            return Err(Error::internal("conditional rule has no final branch"));
        };
        let mut guards = self.guards;
        let mut temps = self.temps;
        for branch in self.conditions.iter().map(|(_, branch)| branch).chain([&finish]) {
            guards.extend(&branch.guards);
            for temp in &branch.temps {
                if !temps.contains(temp) {
                    temps.push(temp.clone());
                }
            }
        }
        if self.conditions.is_empty() {
            return Ok(BoundRule {
                guards,
                temps,
                ..finish
            });
        }
        let produced: Vec<Ty> = self
            .conditions
            .iter()
            .map(|(_, branch)| branch)
            .chain([&finish])
            .filter(|branch| branch.outcome == Outcome::Value)
            .map(|branch| branch.result_ty.clone())
            .collect();
        let ty = if produced.is_empty() {
            Ty::Any
        } else {
            common_ancestor(provider, &produced)
        };
        let mut body = finish.body;
        for (test, branch) in self.conditions.into_iter().rev() {
            body = Expr::Condition {
                test: Box::new(test),
                then: Box::new(branch.body),
                otherwise: Box::new(body),
                ty: ty.clone(),
            };
        }
        Ok(BoundRule {
            body,
            result_ty: ty,
            guards,
            outcome: Outcome::Value,
            temps,
        })
    }
}

//! Default binder: turns one dynamic operation plus its operands into a guarded
//! rule, consulting the catalog, the conversion resolver and overload resolution.

mod action;
mod conditional;
mod convert;
mod get_member;
pub mod hooks;
mod index;
mod invoke;
mod operations;
mod set_member;

use std::sync::Arc;

pub use action::BinderAction;
pub use conditional::ConditionalBuilder;
pub use operations::Operator;

use crate::binder_config::{self, BinderConfig};
use crate::catalog::Catalog;
use crate::conversions::ConversionResolver;
use crate::diagnostics::Diagnostic;
use crate::error::{Error, Result};
use crate::ir::{BoundRule, BoundValue, Expr, GuardSet};
use crate::metadata::MetadataProvider;
use crate::overloads::OverloadResolver;
use crate::types::Ty;

/// How a failed operation reports itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FailureMode {
    /// The rule throws the failure diagnostic.
    #[default]
    Throw,
    /// The rule yields the operation-failed sentinel.
    NoThrow,
}

/// What a caller wants in place of a rule that could not be bound.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    #[default]
    Throw,
    NoThrow,
    /// Use the caller's rule instead.
    Fallback(Box<BoundRule>),
}

impl From<FailureMode> for ErrorPolicy {
    fn from(mode: FailureMode) -> Self {
        match mode {
            FailureMode::Throw => ErrorPolicy::Throw,
            FailureMode::NoThrow => ErrorPolicy::NoThrow,
        }
    }
}

/// Answer to an introspection query, valid while `guards` hold.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Introspected<T> {
    pub value: T,
    pub guards: GuardSet,
}

pub struct DefaultBinder {
    catalog: Catalog,
    config: BinderConfig,
}

impl std::fmt::Debug for DefaultBinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultBinder")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DefaultBinder {
    /// Binder over `provider` using the process-wide configuration.
    #[must_use]
    pub fn new(provider: Arc<dyn MetadataProvider>) -> Self {
        Self::with_config(provider, binder_config::current())
    }

    #[must_use]
    pub fn with_config(provider: Arc<dyn MetadataProvider>, config: BinderConfig) -> Self {
        Self {
            catalog: Catalog::new(provider, config.private_binding),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub fn conversions(&self) -> ConversionResolver<'_> {
        ConversionResolver::new(&self.catalog, self.config.light_exceptions)
    }

    #[must_use]
    pub fn overloads(&self) -> OverloadResolver<'_> {
        OverloadResolver::new(
            &self.catalog,
            self.conversions(),
            self.config.min_narrowing,
            self.config.max_narrowing,
        )
    }

    /// Bind `action` over `args`, laid out as [`BinderAction::arity`] describes.
    pub fn bind(&self, action: &BinderAction, args: &[BoundValue]) -> Result<BoundRule> {
        if args.len() != action.arity() {
            return Err(Error::internal(format!(
                "`{action}` expects {} operands, {} given",
                action.arity(),
                args.len()
            )));
        }
        match action {
            BinderAction::GetMember { name, mode } => {
                self.resolve_get(name, &args[0], &ErrorPolicy::from(*mode))
            }
            BinderAction::SetMember { name } => {
                self.resolve_set(name, &args[0], &args[1], &ErrorPolicy::Throw)
            }
            BinderAction::DeleteMember { name } => {
                self.resolve_delete(name, &args[0], &ErrorPolicy::Throw)
            }
            BinderAction::Invoke { shape } => {
                self.resolve_invoke(&args[0], &args[1..], shape, &ErrorPolicy::Throw)
            }
            BinderAction::Create { shape } => {
                self.resolve_create(&args[0], &args[1..], shape, &ErrorPolicy::Throw)
            }
            BinderAction::Convert { to, mode } => Ok(self.resolve_convert(&args[0], to, *mode)),
            BinderAction::Operate { op } => self.resolve_operation(*op, args, &ErrorPolicy::Throw),
            BinderAction::GetIndex { .. } => {
                self.resolve_get_index(&args[0], &args[1..], &ErrorPolicy::Throw)
            }
            BinderAction::SetIndex { .. } => {
                let (value, rest) = args[1..]
                    .split_last()
                    .ok_or_else(|| Error::internal("index assignment without a value"))?;
                self.resolve_set_index(&args[0], rest, value, &ErrorPolicy::Throw)
            }
        }
    }

    /// Rule reporting `diagnostic` according to `policy`.
    pub(crate) fn failure(
        &self,
        diagnostic: Diagnostic,
        ty: Ty,
        policy: &ErrorPolicy,
        guards: &GuardSet,
    ) -> BoundRule {
        match policy {
            ErrorPolicy::Throw => BoundRule::thrown(self.throw_expr(diagnostic, ty)).with_guards(guards),
            ErrorPolicy::NoThrow => BoundRule::value(Expr::OperationFailed, Ty::Any).with_guards(guards),
            ErrorPolicy::Fallback(rule) => rule.as_ref().clone().with_guards(guards),
        }
    }

    pub(crate) fn throw_expr(&self, diagnostic: Diagnostic, ty: Ty) -> Expr {
        Expr::Throw {
            diagnostic: Box::new(diagnostic),
            ty,
            light: self.config.light_exceptions,
        }
    }

    /// Fold a member operation's result into a rule; recoverable failures follow
    /// `policy`, internal errors propagate.
    pub(crate) fn settle(
        &self,
        result: Result<BoundRule>,
        ty: Ty,
        policy: &ErrorPolicy,
        guards: &GuardSet,
    ) -> Result<BoundRule> {
        match result {
            Ok(rule) => Ok(rule.with_guards(guards)),
            Err(Error::Binding(diagnostic)) => Ok(self.failure(diagnostic, ty, policy, guards)),
            Err(other) => Err(other),
        }
    }

    pub(crate) fn trace(&self, action: &str, subject: &str, rule: BoundRule) -> BoundRule {
        tracing::debug!(
            target: "binder",
            action,
            subject,
            outcome = %rule.outcome,
            result = %rule.result_ty,
            guards = rule.guards.len(),
            "bound"
        );
        rule
    }
}

#[cfg(test)]
mod tests;

use std::sync::Arc;

use super::hooks::CALL;
use super::{DefaultBinder, ErrorPolicy, Introspected};
use crate::catalog::{MemberKind, MemberRef};
use crate::diagnostics::Diagnostic;
use crate::error::Result;
use crate::ir::{BoundRule, BoundValue, Expr, Guard, GuardSet};
use crate::metadata::{Overload, ParamKind};
use crate::overloads::{BindingTarget, CallShape};
use crate::types::{Ty, Value};

/// What an invocation target resolved to, before overload resolution.
struct CallPlan {
    name: Arc<str>,
    candidates: Vec<Arc<Overload>>,
    /// Receiver prepended to the arguments as an implicit instance.
    instance: Option<BoundValue>,
    guards: GuardSet,
}

fn group_overloads(member: &MemberRef) -> Option<Vec<Arc<Overload>>> {
    match member.kind() {
        MemberKind::MethodGroup(group) => Some(group.overloads().to_vec()),
        MemberKind::Method(overload) => Some(vec![Arc::clone(overload)]),
        _ => None,
    }
}

impl DefaultBinder {
    // Delegate, method value, bound method, `Call` hook, in that order.
    fn call_plan(&self, target: &BoundValue) -> Option<CallPlan> {
        let hierarchy = self.catalog().hierarchy();
        let limit = target.limit_type();
        if hierarchy.is_delegate(&limit) {
            let restricted = target.restrict();
            return Some(CallPlan {
                name: Arc::from("Invoke"),
                candidates: self.method_overloads(&limit, "Invoke"),
                guards: restricted.guards.clone(),
                instance: Some(restricted),
            });
        }
        if let Some(Value::Member(member)) = &target.value {
            let mut guards = target.guards.clone();
            if let Some(guard) = target.instance_guard() {
                guards.push(guard);
            }
            if let Some(candidates) = group_overloads(member) {
                return Some(CallPlan {
                    name: Arc::from(member.name()),
                    candidates,
                    instance: None,
                    guards,
                });
            }
            if let MemberKind::Bound(bound) = member.kind() {
                let candidates = group_overloads(&bound.member)?;
                let captured = bound.instance.limit_type();
                let expr = Expr::BoundInstance(Box::new(target.expr.clone()));
                guards.push(Guard::TypeExact {
                    target: expr.clone(),
                    ty: captured.clone(),
                });
                return Some(CallPlan {
                    name: Arc::from(bound.member.name()),
                    candidates,
                    instance: Some(BoundValue::new(
                        Expr::convert(expr, captured.clone()),
                        captured,
                    )),
                    guards,
                });
            }
            return None;
        }
        let candidates = self.method_overloads(&limit, CALL);
        if candidates.is_empty() {
            return None;
        }
        let restricted = target.restrict();
        Some(CallPlan {
            name: Arc::from(CALL),
            candidates,
            guards: restricted.guards.clone(),
            instance: Some(restricted),
        })
    }

    /// Rule calling `target` with `args` written as `shape`.
    pub fn resolve_invoke(
        &self,
        target: &BoundValue,
        args: &[BoundValue],
        shape: &CallShape,
        policy: &ErrorPolicy,
    ) -> Result<BoundRule> {
        let mut guards = target.guards.clone();
        for arg in args {
            guards.extend(&arg.guards);
        }
        if target.needs_deferral() || args.iter().any(BoundValue::needs_deferral) {
            return Ok(self.trace("invoke", "call", BoundRule::defer(guards)));
        }
        let Some(plan) = self.call_plan(target) else {
            let restricted = target.restrict();
            let rule = self.failure(
                Diagnostic::not_callable(&restricted.limit_type()),
                Ty::Any,
                policy,
                &guards.merge(&restricted.guards),
            );
            return Ok(self.trace("invoke", "call", rule));
        };
        let (full_args, full_shape) = match &plan.instance {
            Some(instance) => {
                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(instance.clone());
                full.extend(args.iter().cloned());
                (full, shape.prepend_instance())
            }
            None => (args.to_vec(), shape.clone()),
        };
        if self.config().trace_resolution {
            for candidate in &plan.candidates {
                tracing::trace!(target: "overloads", name = %plan.name, candidate = %candidate.signature(), "candidate");
            }
        }
        guards.extend(&plan.guards);
        let rule = match self
            .overloads()
            .resolve(&plan.name, &plan.candidates, &full_args, &full_shape)?
        {
            BindingTarget::Success(call) => {
                BoundRule::value(call.make_call(), call.result_ty()).with_guards(&guards.merge(&call.guards))
            }
            BindingTarget::Failure(failure) => {
                self.failure(failure.to_diagnostic(), Ty::Any, policy, &argument_guards(guards, args))
            }
        };
        Ok(self.trace("invoke", &plan.name, rule))
    }

    /// Rule constructing an instance of the type value `target`.
    pub fn resolve_create(
        &self,
        target: &BoundValue,
        args: &[BoundValue],
        shape: &CallShape,
        policy: &ErrorPolicy,
    ) -> Result<BoundRule> {
        let mut guards = target.guards.clone();
        for arg in args {
            guards.extend(&arg.guards);
        }
        if target.needs_deferral() || args.iter().any(BoundValue::needs_deferral) {
            return Ok(self.trace("create", "new", BoundRule::defer(guards)));
        }
        let Some(Value::Type(ty)) = &target.value else {
            let restricted = target.restrict();
            let rule = self.failure(
                Diagnostic::not_callable(&restricted.limit_type()),
                Ty::Any,
                policy,
                &guards.merge(&restricted.guards),
            );
            return Ok(self.trace("create", "new", rule));
        };
        if let Some(guard) = target.instance_guard() {
            guards.push(guard);
        }
        let subject = ty.to_string();
        let constructors = self.catalog().constructors(ty);
        let provider = self.catalog().provider();
        if constructors.is_empty() && args.is_empty() && provider.is_value_type(ty) {
            let rule = BoundRule::value(
                Expr::New {
                    ty: ty.clone(),
                    callee: None,
                    args: Vec::new(),
                },
                ty.clone(),
            )
            .with_guards(&guards);
            return Ok(self.trace("create", &subject, rule));
        }
        let rule = match self.overloads().resolve(&ty.short_name(), &constructors, args, shape)? {
            BindingTarget::Success(call) => {
                BoundRule::value(call.make_new(ty), ty.clone()).with_guards(&guards.merge(&call.guards))
            }
            BindingTarget::Failure(failure) => {
                self.failure(failure.to_diagnostic(), ty.clone(), policy, &argument_guards(guards, args))
            }
        };
        Ok(self.trace("create", &subject, rule))
    }

    /// Whether `target` can be invoked.
    #[must_use]
    pub fn is_callable(&self, target: &BoundValue) -> Introspected<bool> {
        match self.call_plan(target) {
            Some(plan) => Introspected {
                value: !plan.candidates.is_empty(),
                guards: plan.guards,
            },
            None => Introspected {
                value: false,
                guards: target.restrict().guards,
            },
        }
    }

    /// Parameter lists of every overload `target` would dispatch to, rendered as
    /// `Type name, Type name`.
    #[must_use]
    pub fn call_signatures(&self, target: &BoundValue) -> Introspected<Vec<String>> {
        match self.call_plan(target) {
            Some(plan) => Introspected {
                value: plan.candidates.iter().map(|overload| render_params(overload)).collect(),
                guards: plan.guards,
            },
            None => Introspected {
                value: Vec::new(),
                guards: target.restrict().guards,
            },
        }
    }
}

fn render_params(overload: &Overload) -> String {
    overload
        .params
        .iter()
        .map(|param| match param.kind {
            ParamKind::Normal => format!("{} {}", param.ty, param.name),
            ParamKind::ParamsArray => format!("params {} {}", param.ty, param.name),
            ParamKind::ParamsDict => format!("**{}", param.name),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

// Failed calls depend on every argument's runtime type.
fn argument_guards(mut guards: GuardSet, args: &[BoundValue]) -> GuardSet {
    for arg in args {
        if let Some(guard) = arg.type_guard() {
            guards.push(guard);
        }
    }
    guards
}

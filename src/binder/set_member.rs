use super::hooks::{DELETE_MEMBER, SET_MEMBER, SET_MEMBER_AFTER};
use super::{ConditionalBuilder, DefaultBinder, ErrorPolicy};
use crate::catalog::{AccessTarget, MemberKind};
use crate::diagnostics::Diagnostic;
use crate::error::{Error, Result};
use crate::ir::{BoundRule, BoundValue, Expr, TempId};
use crate::types::Ty;

impl DefaultBinder {
    /// Rule assigning `value` to member `name` of `target`. The rule yields the
    /// assigned value.
    pub fn resolve_set(
        &self,
        name: &str,
        target: &BoundValue,
        value: &BoundValue,
        policy: &ErrorPolicy,
    ) -> Result<BoundRule> {
        if target.needs_deferral() || value.needs_deferral() {
            let guards = target.guards.merge(&value.guards);
            return Ok(self.trace("set", name, BoundRule::defer(guards)));
        }
        let receiver = self.receiver(target);
        let value = value.restrict_type_only();
        let mut builder = ConditionalBuilder::new();
        builder.add_guards(&receiver.guards);
        builder.add_guards(&value.guards);

        if let Some(instance) = &receiver.instance {
            self.assignment_hook(&mut builder, SET_MEMBER, instance, name, &value)?;
            if builder.is_finished() {
                let rule = builder.finalize(self.catalog().provider())?;
                return Ok(self.trace("set", name, rule));
            }
        }

        let members = self.catalog().lookup(&receiver.through, name);
        match self.pick_member(&members, &receiver.through) {
            Some(member) => {
                let result = match member.kind() {
                    MemberKind::Field(_)
                    | MemberKind::Property(_)
                    | MemberKind::Custom(_)
                    | MemberKind::Bound(_) => {
                        let access = match &receiver.instance {
                            Some(instance) => AccessTarget::instance(instance.clone()),
                            None => AccessTarget::static_on(receiver.through.clone()),
                        };
                        member.set_value(self, &access, &value)
                    }
                    MemberKind::Event(_) => Err(Diagnostic::read_only_member(
                        name,
                        "events can only be subscribed to",
                    )
                    .into()),
                    other => Err(Diagnostic::read_only_member(
                        name,
                        &format!("a {} cannot be assigned", other.describe()),
                    )
                    .into()),
                };
                match result {
                    Ok(rule) => builder.finish_condition(rule),
                    Err(Error::Binding(diagnostic)) => {
                        self.finish_failure(&mut builder, diagnostic, value.static_ty.clone(), policy);
                    }
                    Err(other) => return Err(other),
                }
            }
            None => {
                if let Some(instance) = &receiver.instance {
                    self.assignment_hook(&mut builder, SET_MEMBER_AFTER, instance, name, &value)?;
                }
                if !builder.is_finished() {
                    let diagnostic = Diagnostic::member_not_found(&receiver.through, name);
                    self.finish_failure(&mut builder, diagnostic, value.static_ty.clone(), policy);
                }
            }
        }
        let rule = builder.finalize(self.catalog().provider())?;
        Ok(self.trace("set", name, rule))
    }

    // A hook returning `bool` reports whether it handled the assignment and
    // becomes a condition; any other hook finishes the rule.
    fn assignment_hook(
        &self,
        builder: &mut ConditionalBuilder,
        hook: &str,
        instance: &BoundValue,
        name: &str,
        value: &BoundValue,
    ) -> Result<()> {
        let temp = TempId::new("setValue");
        let stored = BoundValue::new(Expr::Temp(temp.clone()), value.limit_type());
        let Some(call) = self.call_hook(hook, instance, name, std::slice::from_ref(&stored))? else {
            return Ok(());
        };
        builder.add_temp(temp.clone());
        builder.add_guards(&call.guards);
        let store = Expr::assign(Expr::Temp(temp.clone()), value.expr.clone());
        if call.ret == Ty::BOOL {
            builder.add_condition(
                Expr::block(Vec::new(), vec![store, call.body]),
                BoundRule::value(Expr::Temp(temp), value.static_ty.clone()),
            );
        } else {
            builder.finish_condition(BoundRule::value(
                Expr::block(Vec::new(), vec![store, call.body, Expr::Temp(temp)]),
                value.static_ty.clone(),
            ));
        }
        Ok(())
    }

    /// Rule deleting member `name` of `target`.
    pub fn resolve_delete(&self, name: &str, target: &BoundValue, policy: &ErrorPolicy) -> Result<BoundRule> {
        if target.needs_deferral() {
            return Ok(self.trace("delete", name, BoundRule::defer(target.guards.clone())));
        }
        let receiver = self.receiver(target);
        let access = match &receiver.instance {
            Some(instance) => AccessTarget::instance(instance.clone()),
            None => AccessTarget::static_on(receiver.through.clone()),
        };
        let members = self.catalog().lookup(&receiver.through, name);
        let deletable = self
            .pick_member(&members, &receiver.through)
            .filter(|member| member.capabilities().delete);
        let result = match (deletable, &receiver.instance) {
            (Some(member), _) => member.delete_value(self, &access),
            (None, Some(instance)) => match self.call_hook(DELETE_MEMBER, instance, name, &[])? {
                Some(call) => Ok(BoundRule::value(call.body, call.ret).with_guards(&call.guards)),
                None => Err(Diagnostic::not_deletable(&receiver.through, name).into()),
            },
            (None, None) => Err(Diagnostic::not_deletable(&receiver.through, name).into()),
        };
        let rule = self.settle(result, Ty::Void, policy, &receiver.guards)?;
        Ok(self.trace("delete", name, rule))
    }
}

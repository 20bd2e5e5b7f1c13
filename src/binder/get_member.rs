use std::sync::Arc;

use super::hooks::{self, GET_BOUND_MEMBER, GET_CUSTOM_MEMBER};
use super::{ConditionalBuilder, DefaultBinder, ErrorPolicy, Introspected};
use crate::catalog::{AccessTarget, MemberDescriptor, MemberKind, MemberRef};
use crate::diagnostics::Diagnostic;
use crate::error::{Error, Result};
use crate::ir::{BoundRule, BoundValue, Expr, GuardSet, TempId};
use crate::types::{Ty, Value};

/// Receiver of a member operation after restriction.
pub(super) struct Receiver {
    /// `None` for static access through a type value or a namespace.
    pub instance: Option<BoundValue>,
    pub through: Ty,
    pub namespace: Option<Arc<str>>,
    pub guards: GuardSet,
}

impl DefaultBinder {
    pub(super) fn receiver(&self, target: &BoundValue) -> Receiver {
        let pinned = || {
            let mut guards = target.guards.clone();
            if let Some(guard) = target.instance_guard() {
                guards.push(guard);
            }
            guards
        };
        match &target.value {
            Some(Value::Type(ty)) => Receiver {
                instance: None,
                through: ty.clone(),
                namespace: None,
                guards: pinned(),
            },
            Some(Value::Namespace(path)) => Receiver {
                instance: None,
                through: Ty::NamespaceObj,
                namespace: Some(Arc::clone(path)),
                guards: pinned(),
            },
            _ => {
                let restricted = target.restrict();
                Receiver {
                    through: restricted.limit_type(),
                    guards: restricted.guards.clone(),
                    instance: Some(restricted),
                    namespace: None,
                }
            }
        }
    }

    /// The member of `members` to operate on: the most-derived one whose
    /// declaring type applies to `through`. Same-named nested types merge into
    /// one type group.
    pub(super) fn pick_member(&self, members: &[MemberRef], through: &Ty) -> Option<MemberRef> {
        let types: Vec<Ty> = members
            .iter()
            .filter_map(|member| match member.kind() {
                MemberKind::NestedType(ty) => Some(ty.clone()),
                _ => None,
            })
            .collect();
        if types.len() > 1 && types.len() == members.len() {
            return Some(self.catalog().type_group(types));
        }
        let hierarchy = self.catalog().hierarchy();
        members
            .iter()
            .find(|member| {
                member.declaring() == through || hierarchy.is_strict_subtype(through, member.declaring())
            })
            .or_else(|| members.first())
            .cloned()
    }

    pub(super) fn finish_failure(
        &self,
        builder: &mut ConditionalBuilder,
        diagnostic: Diagnostic,
        ty: Ty,
        policy: &ErrorPolicy,
    ) {
        let rule = self.failure(diagnostic, ty, policy, &GuardSet::new());
        if rule.is_thrown() {
            builder.finish_error(rule.body);
        } else {
            builder.finish_condition(rule);
        }
    }

    // A hook returning the operation-failed sentinel falls through to the next branch.
    fn fallthrough_hook(
        &self,
        builder: &mut ConditionalBuilder,
        hook: &str,
        instance: &BoundValue,
        name: &str,
    ) -> Result<()> {
        let Some(call) = self.call_hook(hook, instance, name, &[])? else {
            return Ok(());
        };
        let temp = TempId::new("getVal");
        builder.add_temp(temp.clone());
        builder.add_guards(&call.guards);
        builder.add_condition(
            hooks::succeeded(&temp, call.body),
            BoundRule::value(Expr::Temp(temp), call.ret),
        );
        Ok(())
    }

    /// Rule reading member `name` of `target`.
    pub fn resolve_get(&self, name: &str, target: &BoundValue, policy: &ErrorPolicy) -> Result<BoundRule> {
        if target.needs_deferral() {
            return Ok(self.trace("get", name, BoundRule::defer(target.guards.clone())));
        }
        let receiver = self.receiver(target);
        if let Some(path) = &receiver.namespace {
            let result = match self.catalog().namespace_member(path, name) {
                Some(member) => member.get_value(self, &AccessTarget::static_on(Ty::NamespaceObj)),
                None => Err(Diagnostic::member_not_found(&Ty::NamespaceObj, name)
                    .with_note(format!("namespace `{path}` has no member `{name}`"))
                    .into()),
            };
            let rule = self.settle(result, Ty::Any, policy, &receiver.guards)?;
            return Ok(self.trace("get", name, rule));
        }

        let members = self.catalog().lookup(&receiver.through, name);
        let mut builder = ConditionalBuilder::new();
        builder.add_guards(&receiver.guards);
        if let Some(instance) = &receiver.instance {
            self.fallthrough_hook(&mut builder, GET_CUSTOM_MEMBER, instance, name)?;
        }
        match self.pick_member(&members, &receiver.through) {
            Some(member) => {
                let member = match &receiver.instance {
                    Some(instance) => MemberDescriptor::bind_to_instance(&member, instance.clone()),
                    None => member,
                };
                match member.get_value(self, &AccessTarget::static_on(receiver.through.clone())) {
                    Ok(rule) => builder.finish_condition(rule),
                    Err(Error::Binding(diagnostic)) => {
                        self.finish_failure(&mut builder, diagnostic, Ty::Any, policy);
                    }
                    Err(other) => return Err(other),
                }
            }
            None => {
                if let Some(instance) = &receiver.instance {
                    self.fallthrough_hook(&mut builder, GET_BOUND_MEMBER, instance, name)?;
                }
                let diagnostic = Diagnostic::member_not_found(&receiver.through, name);
                self.finish_failure(&mut builder, diagnostic, Ty::Any, policy);
            }
        }
        let rule = builder.finalize(self.catalog().provider())?;
        Ok(self.trace("get", name, rule))
    }

    /// Names of the members reachable through `target`, sorted.
    #[must_use]
    pub fn member_names(&self, target: &BoundValue) -> Introspected<Vec<Arc<str>>> {
        let receiver = self.receiver(target);
        let value = match &receiver.namespace {
            Some(path) => self.catalog().namespace_member_names(path),
            None => self.catalog().member_names(&receiver.through),
        };
        Introspected {
            value,
            guards: receiver.guards,
        }
    }
}

use std::sync::Arc;

use super::{DefaultBinder, ErrorPolicy};
use crate::catalog::MemberKind;
use crate::conversions::ConversionMode;
use crate::diagnostics::Diagnostic;
use crate::error::Result;
use crate::ir::{BoundRule, BoundValue, Expr, GuardSet, TempId};
use crate::metadata::{Overload, ParamInfo};
use crate::overloads::{BindingTarget, CallShape, NarrowingLevel};
use crate::types::Ty;

struct ElementAccess {
    place: Expr,
    element: Ty,
    guards: GuardSet,
}

fn operand_guards<'a>(operands: impl IntoIterator<Item = &'a BoundValue>) -> GuardSet {
    let mut guards = GuardSet::new();
    for operand in operands {
        guards.extend(&operand.guards);
    }
    guards
}

impl DefaultBinder {
    /// Rule reading `target[indices]`.
    pub fn resolve_get_index(
        &self,
        target: &BoundValue,
        indices: &[BoundValue],
        policy: &ErrorPolicy,
    ) -> Result<BoundRule> {
        let guards = operand_guards(std::iter::once(target).chain(indices));
        if target.needs_deferral() || indices.iter().any(BoundValue::needs_deferral) {
            return Ok(self.trace("get-index", "[]", BoundRule::defer(guards)));
        }
        if let Some(access) = self.element_access(target, indices) {
            let rule = BoundRule::value(access.place, access.element).with_guards(&guards.merge(&access.guards));
            return Ok(self.trace("get-index", "[]", rule));
        }
        let receiver = target.restrict();
        let mut args = vec![receiver.clone()];
        args.extend(indices.iter().cloned());
        let rule = self.call_indexer(&receiver, &args, None, policy, &guards, |call| call)?;
        Ok(self.trace("get-index", "get", rule))
    }

    /// Rule assigning `value` to `target[indices]`; the rule yields the value.
    pub fn resolve_set_index(
        &self,
        target: &BoundValue,
        indices: &[BoundValue],
        value: &BoundValue,
        policy: &ErrorPolicy,
    ) -> Result<BoundRule> {
        let guards = operand_guards(std::iter::once(target).chain(indices).chain([value]));
        if target.needs_deferral()
            || value.needs_deferral()
            || indices.iter().any(BoundValue::needs_deferral)
        {
            return Ok(self.trace("set-index", "[]", BoundRule::defer(guards)));
        }
        let value = value.restrict_type_only();
        let guards = guards.merge(&value.guards);
        if let Some(access) = self.element_access(target, indices) {
            let guards = guards.merge(&access.guards);
            let rule = match self.conversions().convert_expr(
                &value,
                &access.element,
                ConversionMode::ExplicitRequired,
            ) {
                Some(converted) => BoundRule::value(
                    Expr::block(
                        Vec::new(),
                        vec![Expr::assign(access.place, converted), value.expr.clone()],
                    ),
                    value.static_ty.clone(),
                )
                .with_guards(&guards),
                None => self.failure(
                    Diagnostic::conversion_not_possible(&value.limit_type(), &access.element),
                    value.static_ty.clone(),
                    policy,
                    &guards,
                ),
            };
            return Ok(self.trace("set-index", "[]", rule));
        }

        // The value is evaluated once into a temporary the setter reads.
        let temp = TempId::new("arg2Temp");
        let stored = BoundValue::new(Expr::Temp(temp.clone()), value.limit_type());
        let receiver = target.restrict();
        let mut args = vec![receiver.clone()];
        args.extend(indices.iter().cloned());
        args.push(stored);
        let store = Expr::assign(Expr::Temp(temp.clone()), value.expr.clone());
        let yielded = Expr::Temp(temp.clone());
        let rule = self.call_indexer(&receiver, &args, Some(temp), policy, &guards, |call| {
            Expr::block(Vec::new(), vec![store, call, yielded])
        })?;
        Ok(self.trace("set-index", "set", rule))
    }

    fn element_access(&self, target: &BoundValue, indices: &[BoundValue]) -> Option<ElementAccess> {
        let [index] = indices else {
            return None;
        };
        let array = target.restrict();
        let Ty::Array(element) = array.limit_type() else {
            return None;
        };
        let index = index.restrict();
        let conversions = self.conversions();
        if !conversions.can_convert(&index.limit_type(), &Ty::I32, NarrowingLevel::All) {
            return None;
        }
        let converted = conversions.convert_expr(&index, &Ty::I32, ConversionMode::ExplicitRequired)?;
        Some(ElementAccess {
            place: Expr::ArrayIndex {
                array: Box::new(array.expr.clone()),
                index: Box::new(converted),
            },
            element: *element,
            guards: array.guards.merge(&index.guards),
        })
    }

    // Indexed properties named by the type's default member, one overload per
    // distinct index signature; derived declarations hide base ones.
    fn indexers(&self, ty: &Ty, setter: bool) -> (Arc<str>, Vec<Arc<Overload>>) {
        let name = self.catalog().provider().default_member(ty);
        let prefix = if setter { "set" } else { "get" };
        let mut found: Vec<Arc<Overload>> = Vec::new();
        for member in self.catalog().lookup(ty, &name) {
            let MemberKind::Property(property) = member.kind() else {
                continue;
            };
            let accessor = if setter { property.setter } else { property.getter };
            let (Some(accessor), Some(id)) = (accessor, member.member_id()) else {
                continue;
            };
            if property.index_params.is_empty()
                || !(accessor.visibility.is_public() || self.config().private_binding)
            {
                continue;
            }
            let mut params = property.index_params.clone();
            if setter {
                params.push(ParamInfo::new("value", property.ty.clone()));
            }
            let overload = Overload {
                id,
                name: Arc::from(format!("{prefix}_{name}")),
                declaring: member.declaring().clone(),
                params,
                ret: if setter { Ty::Void } else { property.ty.clone() },
                is_static: member.is_static(),
                visibility: accessor.visibility,
                generic_arity: 0,
                no_side_effects: member.no_side_effects(),
                explicit_conversion: false,
            };
            if !found.iter().any(|seen| seen.same_signature(&overload)) {
                found.push(Arc::new(overload));
            }
        }
        (name, found)
    }

    // `stored` is the setter's value temporary; getters pass `None`.
    fn call_indexer(
        &self,
        receiver: &BoundValue,
        args: &[BoundValue],
        stored: Option<TempId>,
        policy: &ErrorPolicy,
        guards: &GuardSet,
        finish: impl FnOnce(Expr) -> Expr,
    ) -> Result<BoundRule> {
        let setter = stored.is_some();
        let ty = receiver.limit_type();
        let guards = guards.merge(&receiver.guards);
        let (name, candidates) = self.indexers(&ty, setter);
        if candidates.is_empty() {
            let diagnostic = Diagnostic::member_not_found(&ty, &name).with_note(format!("`{ty}` has no indexer"));
            return Ok(self.failure(diagnostic, Ty::Any, policy, &guards));
        }
        let accessor = if setter { "set_" } else { "get_" };
        let shape = CallShape::with_instance(args.len() - 1);
        match self
            .overloads()
            .resolve(&format!("{accessor}{name}"), &candidates, args, &shape)?
        {
            BindingTarget::Success(call) => {
                let result = match args.last() {
                    Some(value) if setter => value.static_ty.clone(),
                    _ => call.result_ty(),
                };
                let mut rule =
                    BoundRule::value(finish(call.make_call()), result).with_guards(&guards.merge(&call.guards));
                rule.temps.extend(stored);
                Ok(rule)
            }
            BindingTarget::Failure(failure) => {
                let mut failed = guards;
                for arg in args.iter().skip(1) {
                    if let Some(guard) = arg.type_guard() {
                        failed.push(guard);
                    }
                }
                Ok(self.failure(failure.to_diagnostic(), Ty::Any, policy, &failed))
            }
        }
    }
}

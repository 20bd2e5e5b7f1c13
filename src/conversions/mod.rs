//! Conversion resolver: decides whether and how a value converts to a target
//! type, and ranks conversions for overload resolution.

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::diagnostics::Diagnostic;
use crate::ir::{BoundRule, BoundValue, Callee, Expr};
use crate::metadata::Overload;
use crate::overloads::NarrowingLevel;
use crate::types::{Primitive, Ty, implicit_numeric};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConversionMode {
    /// Implicit conversions only; failure throws.
    ImplicitRequired,
    /// Explicit conversions allowed; failure throws.
    ExplicitRequired,
    /// Implicit conversions only; failure yields the default value.
    ImplicitBestEffort,
    /// Explicit conversions allowed; failure yields the default value.
    ExplicitBestEffort,
}

impl ConversionMode {
    #[must_use]
    pub fn is_explicit(self) -> bool {
        matches!(
            self,
            ConversionMode::ExplicitRequired | ConversionMode::ExplicitBestEffort
        )
    }

    #[must_use]
    pub fn is_best_effort(self) -> bool {
        matches!(
            self,
            ConversionMode::ImplicitBestEffort | ConversionMode::ExplicitBestEffort
        )
    }
}

impl std::fmt::Display for ConversionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ConversionMode::ImplicitRequired => "implicit",
            ConversionMode::ExplicitRequired => "explicit",
            ConversionMode::ImplicitBestEffort => "implicit-try",
            ConversionMode::ExplicitBestEffort => "explicit-try",
        })
    }
}

/// Cost of a conversion, best first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConversionRank {
    Identity,
    NumericPromotion,
    OptionalWrap,
    WrapperUnwrap,
    UserImplicit,
    NumericNarrowing,
    OptionalUnwrap,
    BoolCoercion,
    UserExplicit,
}

impl ConversionRank {
    /// Narrowing level at which overload resolution starts accepting this rank.
    #[must_use]
    pub fn required_level(self) -> NarrowingLevel {
        match self {
            ConversionRank::Identity
            | ConversionRank::NumericPromotion
            | ConversionRank::OptionalWrap
            | ConversionRank::WrapperUnwrap
            | ConversionRank::UserImplicit => NarrowingLevel::None,
            ConversionRank::NumericNarrowing => NarrowingLevel::One,
            ConversionRank::OptionalUnwrap => NarrowingLevel::Two,
            ConversionRank::BoolCoercion => NarrowingLevel::Three,
            ConversionRank::UserExplicit => NarrowingLevel::All,
        }
    }
}

struct UserConversion {
    overload: Arc<Overload>,
    implicit: bool,
    unwrap: bool,
}

#[derive(Clone, Copy)]
pub struct ConversionResolver<'a> {
    catalog: &'a Catalog,
    light_exceptions: bool,
}

impl<'a> ConversionResolver<'a> {
    #[must_use]
    pub fn new(catalog: &'a Catalog, light_exceptions: bool) -> Self {
        Self {
            catalog,
            light_exceptions,
        }
    }

    fn numeric_pair(from: &Ty, to: &Ty) -> Option<(Primitive, Primitive)> {
        match (from.as_primitive(), to.as_primitive()) {
            (Some(from), Some(to)) if from.is_numeric() && to.is_numeric() => Some((from, to)),
            _ => None,
        }
    }

    /// Best rank under which `from` converts to `to`, if any.
    #[must_use]
    pub fn classify(&self, from: &Ty, to: &Ty) -> Option<ConversionRank> {
        let hierarchy = self.catalog.hierarchy();
        if from == to || *to == Ty::Any || hierarchy.is_assignable(from, to) {
            return Some(ConversionRank::Identity);
        }
        let numeric = Self::numeric_pair(from, to);
        if numeric.is_some_and(|(from, to)| implicit_numeric(from, to)) {
            return Some(ConversionRank::NumericPromotion);
        }
        // Implicit wrapping takes only null or the exact inner type.
        if let Ty::Optional(inner) = to {
            if *from == Ty::Null || from == inner.as_ref() {
                return Some(ConversionRank::OptionalWrap);
            }
        }
        if let Ty::Wrapper(inner) = from {
            if hierarchy.is_assignable(inner, to)
                || Self::numeric_pair(inner, to).is_some_and(|(from, to)| implicit_numeric(from, to))
            {
                return Some(ConversionRank::WrapperUnwrap);
            }
        }
        if self.user_conversion(from, to, false).is_some() {
            return Some(ConversionRank::UserImplicit);
        }
        if numeric.is_some() {
            return Some(ConversionRank::NumericNarrowing);
        }
        if let Ty::Optional(inner) = to {
            if let Some(rank) = self.classify(from, inner) {
                return Some(rank.max(ConversionRank::NumericNarrowing));
            }
        }
        if let Ty::Optional(inner) = from {
            if self
                .classify(inner, to)
                .is_some_and(|rank| rank <= ConversionRank::NumericNarrowing)
            {
                return Some(ConversionRank::OptionalUnwrap);
            }
        }
        if *to == Ty::BOOL && from.is_numeric() {
            return Some(ConversionRank::BoolCoercion);
        }
        if self.user_conversion(from, to, true).is_some() {
            return Some(ConversionRank::UserExplicit);
        }
        None
    }

    #[must_use]
    pub fn can_convert(&self, from: &Ty, to: &Ty, level: NarrowingLevel) -> bool {
        self.classify(from, to)
            .is_some_and(|rank| rank.required_level() <= level)
    }

    // Source type first, then destination; implicit-named members before
    // explicit-named ones, which only explicit requests consult.
    fn user_conversion(&self, from: &Ty, to: &Ty, explicit: bool) -> Option<UserConversion> {
        let (check, unwrap) = match from {
            Ty::Wrapper(inner) => (inner.as_ref(), true),
            other => (other, false),
        };
        let convert_to = format!("ConvertTo{}", to.short_name());
        let mut attempts = vec![("op_Implicit", true), (convert_to.as_str(), true)];
        if explicit {
            attempts.push(("op_Explicit", false));
            attempts.push((convert_to.as_str(), false));
        }
        let hierarchy = self.catalog.hierarchy();
        for (name, implicit) in attempts {
            for owner in [check, to] {
                for member in self.catalog.lookup(owner, name) {
                    let Some(group) = member.as_method_group() else {
                        continue;
                    };
                    let found = group.overloads().iter().find(|overload| {
                        overload.is_static
                            && !(implicit && overload.explicit_conversion)
                            && overload.ret == *to
                            && overload.params.len() == 1
                            && hierarchy.is_assignable(check, &overload.params[0].ty)
                    });
                    if let Some(overload) = found {
                        return Some(UserConversion {
                            overload: Arc::clone(overload),
                            implicit,
                            unwrap,
                        });
                    }
                }
            }
        }
        None
    }

    /// Conversion expression for `value`, tried against its static type and
    /// then its runtime type. `None` when no conversion applies.
    #[must_use]
    pub fn convert_expr(&self, value: &BoundValue, to: &Ty, mode: ConversionMode) -> Option<Expr> {
        if *to == Ty::Any {
            return Some(typed(value, to));
        }
        let limit = value.limit_type();
        let known = if limit == value.static_ty {
            vec![limit]
        } else {
            vec![value.static_ty.clone(), limit]
        };
        known
            .iter()
            .find_map(|known| self.try_all(value, known, to, mode))
    }

    fn try_all(&self, value: &BoundValue, known: &Ty, to: &Ty, mode: ConversionMode) -> Option<Expr> {
        let hierarchy = self.catalog.hierarchy();
        let provider = self.catalog.provider();
        if hierarchy.is_assignable(known, to) {
            return Some(typed(value, to));
        }
        if let Ty::Wrapper(inner) = known {
            if hierarchy.is_assignable(inner, to) {
                return Some(Expr::WrapperValue(Box::new(typed(value, known))));
            }
        }
        if let Some(conversion) = self.user_conversion(known, to, mode.is_explicit()) {
            let arg = if conversion.unwrap {
                Expr::WrapperValue(Box::new(typed(value, known)))
            } else {
                typed(value, known)
            };
            let call = Expr::call(None, Callee::of(&conversion.overload), vec![arg]);
            if !conversion.implicit && mode == ConversionMode::ExplicitBestEffort {
                return Some(Expr::TryDefault {
                    body: Box::new(call),
                    ty: to.clone(),
                });
            }
            return Some(call);
        }
        let unwrapped = match known {
            Ty::Wrapper(inner) => Some((
                inner.as_ref(),
                Expr::WrapperValue(Box::new(typed(value, known))),
            )),
            _ => None,
        };
        let (numeric_ty, numeric_expr) = unwrapped.unwrap_or_else(|| (known, typed(value, known)));
        if let Some((from, to_prim)) = Self::numeric_pair(numeric_ty, to) {
            if implicit_numeric(from, to_prim) || mode.is_explicit() {
                return Some(Expr::convert(numeric_expr, to.clone()));
            }
        }
        if mode.is_explicit() && *to == Ty::BOOL && known.is_numeric() {
            return Some(Expr::convert(typed(value, known), Ty::BOOL));
        }
        if let Ty::Optional(inner) = to {
            if *known == Ty::Null {
                return Some(Expr::Default(to.clone()));
            }
            if known == inner.as_ref() {
                return Some(Expr::convert(typed(value, known), to.clone()));
            }
            if mode.is_explicit() && *known != Ty::Any {
                return match self.try_all(value, known, inner, mode) {
                    Some(converted) => Some(Expr::convert(converted, to.clone())),
                    None if mode.is_best_effort() => Some(Expr::Default(to.clone())),
                    None => None,
                };
            }
        }
        if let Ty::Optional(inner) = known {
            if mode.is_explicit() {
                let inner_ty = inner.as_ref().clone();
                let unwrapped =
                    BoundValue::new(Expr::convert(typed(value, known), inner_ty.clone()), inner_ty);
                if let Some(converted) = self.try_all(&unwrapped, inner, to, mode) {
                    return Some(converted);
                }
            }
        }
        if *known == Ty::Null && !provider.is_value_type(to) && *to != Ty::Void {
            return Some(Expr::convert(value.expr.clone(), to.clone()));
        }
        None
    }

    /// Full conversion rule, guarded on the value's runtime type.
    #[must_use]
    pub fn convert_to(&self, value: &BoundValue, to: &Ty, mode: ConversionMode) -> BoundRule {
        let mut guards = value.guards.clone();
        if let Some(guard) = value.type_guard() {
            guards.push(guard);
        }
        let (body, ty) = match self.convert_expr(value, to, mode) {
            Some(body) => (body, to.clone()),
            None if mode.is_best_effort() => (Expr::Default(to.clone()), to.clone()),
            None => {
                let diagnostic = Diagnostic::conversion_not_possible(&value.limit_type(), to);
                tracing::debug!(
                    target: "binder",
                    action = "convert",
                    from = %value.limit_type(),
                    to = %to,
                    %mode,
                    outcome = "thrown",
                    "conversion not possible"
                );
                return BoundRule::thrown(Expr::Throw {
                    diagnostic: Box::new(diagnostic),
                    ty: to.clone(),
                    light: self.light_exceptions,
                })
                .with_guards(&guards);
            }
        };
        let (body, ty) = if mode.is_best_effort() && self.catalog.provider().is_value_type(to) {
            (Expr::convert(body, Ty::Any), Ty::Any)
        } else {
            (body, ty)
        };
        BoundRule::value(body, ty).with_guards(&guards)
    }
}

// Value typed as `known`: the original expression when it already is.
fn typed(value: &BoundValue, known: &Ty) -> Expr {
    if value.static_ty == *known {
        value.expr.clone()
    } else {
        Expr::convert(value.expr.clone(), known.clone())
    }
}

#[cfg(test)]
mod tests;

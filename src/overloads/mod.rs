//! Overload resolution: maps call-site arguments onto candidate signatures,
//! widens the accepted conversions tier by tier and picks the unique best
//! candidate.

mod arguments;

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use crate::catalog::Catalog;
use crate::conversions::{ConversionMode, ConversionRank, ConversionResolver};
use crate::diagnostics::Diagnostic;
use crate::error::{Error, Result};
use crate::ir::{BoundValue, Callee, Expr, GuardSet};
use crate::metadata::Overload;
use crate::types::{Ty, prefer_signed};

use arguments::{ActualArgs, ExpandError, Mapping, Slot, arity, map_arguments};
pub use arguments::MappingError;

/// How much narrowing a conversion may involve, least first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NarrowingLevel {
    None,
    One,
    Two,
    Three,
    All,
}

impl NarrowingLevel {
    pub const LEVELS: [NarrowingLevel; 5] = [
        NarrowingLevel::None,
        NarrowingLevel::One,
        NarrowingLevel::Two,
        NarrowingLevel::Three,
        NarrowingLevel::All,
    ];

    #[must_use]
    pub fn parse(spec: &str) -> Option<Self> {
        match spec.trim().to_ascii_lowercase().as_str() {
            "none" | "0" => Some(NarrowingLevel::None),
            "one" | "1" => Some(NarrowingLevel::One),
            "two" | "2" => Some(NarrowingLevel::Two),
            "three" | "3" => Some(NarrowingLevel::Three),
            "all" => Some(NarrowingLevel::All),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NarrowingLevel::None => "none",
            NarrowingLevel::One => "one",
            NarrowingLevel::Two => "two",
            NarrowingLevel::Three => "three",
            NarrowingLevel::All => "all",
        }
    }
}

impl fmt::Display for NarrowingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How one call-site argument was written.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArgKind {
    Positional,
    Named(Arc<str>),
    /// `*args`: expands to positional arguments.
    SplatList,
    /// `**kwargs`: expands to keyword arguments.
    SplatDict,
    /// Receiver supplied by the binder rather than the caller.
    ImplicitInstance,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CallShape {
    pub kinds: Vec<ArgKind>,
}

impl CallShape {
    #[must_use]
    pub fn new(kinds: Vec<ArgKind>) -> Self {
        Self { kinds }
    }

    #[must_use]
    pub fn positional(count: usize) -> Self {
        Self {
            kinds: vec![ArgKind::Positional; count],
        }
    }

    /// Receiver followed by `count` positional arguments.
    #[must_use]
    pub fn with_instance(count: usize) -> Self {
        let mut kinds = vec![ArgKind::ImplicitInstance];
        kinds.extend(std::iter::repeat_n(ArgKind::Positional, count));
        Self { kinds }
    }

    #[must_use]
    pub fn prepend_instance(&self) -> Self {
        let mut kinds = Vec::with_capacity(self.kinds.len() + 1);
        kinds.push(ArgKind::ImplicitInstance);
        kinds.extend(self.kinds.iter().cloned());
        Self { kinds }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl fmt::Display for CallShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (index, kind) in self.kinds.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            match kind {
                ArgKind::Positional => f.write_str("_")?,
                ArgKind::Named(name) => write!(f, "{name}=")?,
                ArgKind::SplatList => f.write_str("*")?,
                ArgKind::SplatDict => f.write_str("**")?,
                ArgKind::ImplicitInstance => f.write_str("self")?,
            }
        }
        f.write_str(")")
    }
}

/// Why one candidate did not apply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallFailureReason {
    Mapping(MappingError),
    Conversion {
        position: usize,
        expected: Ty,
        actual: Ty,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallFailure {
    pub overload: Arc<Overload>,
    pub reason: CallFailureReason,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindingFailure {
    CallFailures {
        name: Arc<str>,
        failures: Vec<CallFailure>,
    },
    Ambiguous {
        signatures: Vec<String>,
    },
    IncorrectArgumentCount {
        name: Arc<str>,
        min: usize,
        max: Option<usize>,
        actual: usize,
    },
    NoCallableMethod {
        name: Arc<str>,
    },
}

impl BindingFailure {
    #[must_use]
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            BindingFailure::Ambiguous { signatures } => Diagnostic::ambiguous_overload(signatures),
            BindingFailure::IncorrectArgumentCount {
                name,
                min,
                max,
                actual,
            } => Diagnostic::incorrect_argument_count(name, *min, *max, *actual),
            BindingFailure::NoCallableMethod { name } => {
                Diagnostic::no_applicable_overload(name, Some("no callable overload".to_string()))
            }
            BindingFailure::CallFailures { name, failures } => {
                let keyword = failures.iter().find_map(|failure| match &failure.reason {
                    CallFailureReason::Mapping(MappingError::DuplicateKeyword(keyword)) => {
                        Some(Diagnostic::duplicate_keyword(name, keyword))
                    }
                    CallFailureReason::Mapping(MappingError::UnassignableKeyword(keyword)) => {
                        Some(Diagnostic::unassignable_keyword(name, keyword))
                    }
                    _ => None,
                });
                if let Some(diagnostic) = keyword {
                    if failures.iter().all(|failure| {
                        matches!(
                            failure.reason,
                            CallFailureReason::Mapping(
                                MappingError::DuplicateKeyword(_)
                                    | MappingError::UnassignableKeyword(_)
                            )
                        )
                    }) {
                        return diagnostic;
                    }
                }
                let detail = failures.iter().find_map(|failure| match &failure.reason {
                    CallFailureReason::Conversion {
                        expected, actual, ..
                    } => Some(format!("expected {expected}, got {actual}")),
                    CallFailureReason::Mapping(_) => None,
                });
                let mut diagnostic = Diagnostic::no_applicable_overload(name, detail);
                for failure in failures {
                    diagnostic = diagnostic.with_note(format!("candidate: {}", failure.overload.signature()));
                }
                diagnostic
            }
        }
    }
}

/// Successful resolution of one call.
#[derive(Clone, Debug)]
pub struct BoundCall {
    pub overload: Arc<Overload>,
    pub level: NarrowingLevel,
    /// Arguments in canonical order, restricted where the choice depended on them.
    pub args: Vec<BoundValue>,
    /// Receiver converted to the declaring type (instance candidates only).
    pub instance: Option<Expr>,
    /// One expression per parameter, converted to the parameter type.
    pub call_args: Vec<Expr>,
    pub guards: GuardSet,
}

impl BoundCall {
    #[must_use]
    pub fn make_call(&self) -> Expr {
        Expr::call(
            self.instance.clone(),
            Callee::of(&self.overload),
            self.call_args.clone(),
        )
    }

    #[must_use]
    pub fn make_new(&self, ty: &Ty) -> Expr {
        Expr::New {
            ty: ty.clone(),
            callee: Some(Callee::of(&self.overload)),
            args: self.call_args.clone(),
        }
    }

    #[must_use]
    pub fn result_ty(&self) -> Ty {
        self.overload.ret.clone()
    }
}

#[derive(Clone, Debug)]
pub enum BindingTarget {
    Success(Box<BoundCall>),
    Failure(BindingFailure),
}

impl BindingTarget {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, BindingTarget::Success(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Preference {
    Left,
    Right,
    Equal,
    Ambiguous,
}

impl Preference {
    fn combine(self, other: Preference) -> Preference {
        match (self, other) {
            (Preference::Equal, other) | (other, Preference::Equal) => other,
            (left, right) if left == right => left,
            _ => Preference::Ambiguous,
        }
    }

    fn from_ordering(ordering: Ordering) -> Preference {
        match ordering {
            Ordering::Less => Preference::Left,
            Ordering::Greater => Preference::Right,
            Ordering::Equal => Preference::Equal,
        }
    }
}

pub struct OverloadResolver<'a> {
    catalog: &'a Catalog,
    conversions: ConversionResolver<'a>,
    min_level: NarrowingLevel,
    max_level: NarrowingLevel,
}

impl<'a> OverloadResolver<'a> {
    #[must_use]
    pub fn new(
        catalog: &'a Catalog,
        conversions: ConversionResolver<'a>,
        min_level: NarrowingLevel,
        max_level: NarrowingLevel,
    ) -> Self {
        Self {
            catalog,
            conversions,
            min_level,
            max_level,
        }
    }

    /// Pick the overload of `name` the arguments bind to. Recoverable binding
    /// failures are reported in the returned target; an error means the
    /// resolver accepted a conversion it cannot build.
    pub fn resolve(
        &self,
        name: &str,
        candidates: &[Arc<Overload>],
        args: &[BoundValue],
        shape: &CallShape,
    ) -> Result<BindingTarget> {
        let name: Arc<str> = Arc::from(name);
        let target = self.resolve_inner(&name, candidates, args, shape)?;
        let outcome = match &target {
            BindingTarget::Success(_) => "success",
            BindingTarget::Failure(BindingFailure::Ambiguous { .. }) => "ambiguous",
            BindingTarget::Failure(BindingFailure::IncorrectArgumentCount { .. }) => {
                "incorrect-argument-count"
            }
            BindingTarget::Failure(_) => "no-applicable-overload",
        };
        let level = match &target {
            BindingTarget::Success(call) => call.level.as_str(),
            BindingTarget::Failure(_) => self.max_level.as_str(),
        };
        tracing::debug!(
            target: "overloads",
            name = %name,
            candidates = candidates.len(),
            args = args.len(),
            narrowing = level,
            outcome,
            "overload resolution"
        );
        Ok(target)
    }

    fn resolve_inner(
        &self,
        name: &Arc<str>,
        candidates: &[Arc<Overload>],
        args: &[BoundValue],
        shape: &CallShape,
    ) -> Result<BindingTarget> {
        if candidates.is_empty() {
            return Ok(BindingTarget::Failure(BindingFailure::NoCallableMethod {
                name: Arc::clone(name),
            }));
        }
        let actual = match ActualArgs::expand(args, shape) {
            Ok(actual) => actual,
            Err(ExpandError::DuplicateKeyword(keyword)) => {
                return Ok(BindingTarget::Failure(BindingFailure::CallFailures {
                    name: Arc::clone(name),
                    failures: candidates
                        .iter()
                        .map(|overload| CallFailure {
                            overload: Arc::clone(overload),
                            reason: CallFailureReason::Mapping(MappingError::DuplicateKeyword(
                                Arc::clone(&keyword),
                            )),
                        })
                        .collect(),
                }));
            }
            Err(ExpandError::OpaqueSplat(_)) => {
                return Ok(BindingTarget::Failure(BindingFailure::NoCallableMethod {
                    name: Arc::clone(name),
                }));
            }
        };

        let mut mapped = Vec::new();
        let mut failures = Vec::new();
        for overload in candidates {
            match map_arguments(overload, &actual) {
                Ok(mapping) => mapped.push(mapping),
                Err(error) => failures.push(CallFailure {
                    overload: Arc::clone(overload),
                    reason: CallFailureReason::Mapping(error),
                }),
            }
        }
        if mapped.is_empty() {
            let counts_only = failures.iter().all(|failure| {
                matches!(
                    failure.reason,
                    CallFailureReason::Mapping(MappingError::ArgumentCount { .. })
                )
            });
            if counts_only {
                return Ok(BindingTarget::Failure(self.count_failure(name, candidates, &failures)));
            }
            return Ok(BindingTarget::Failure(BindingFailure::CallFailures {
                name: Arc::clone(name),
                failures,
            }));
        }

        let canonical = actual.canonical();
        let mut conversion_failures = Vec::new();
        for level in NarrowingLevel::LEVELS {
            if level < self.min_level || level > self.max_level {
                continue;
            }
            conversion_failures.clear();
            let mut applicable = Vec::new();
            for mapping in &mapped {
                match self.first_mismatch(mapping, &canonical, level) {
                    None => applicable.push(mapping),
                    Some(reason) => conversion_failures.push(CallFailure {
                        overload: Arc::clone(&mapping.overload),
                        reason,
                    }),
                }
            }
            match applicable.len() {
                0 => continue,
                1 => return self.success(applicable[0], &mapped, &actual, level),
                _ => {}
            }
            let best: Vec<&Mapping> = applicable
                .iter()
                .copied()
                .filter(|candidate| {
                    applicable.iter().all(|other| {
                        std::ptr::eq(*candidate, *other)
                            || self.compare(candidate, other, &canonical, name) == Preference::Left
                    })
                })
                .collect();
            if let [winner] = best.as_slice() {
                return self.success(winner, &mapped, &actual, level);
            }
            return Ok(BindingTarget::Failure(BindingFailure::Ambiguous {
                signatures: applicable
                    .iter()
                    .map(|mapping| {
                        format!("{}.{}", mapping.overload.declaring, mapping.overload.signature())
                    })
                    .collect(),
            }));
        }
        failures.extend(conversion_failures);
        Ok(BindingTarget::Failure(BindingFailure::CallFailures {
            name: Arc::clone(name),
            failures,
        }))
    }

    fn count_failure(
        &self,
        name: &Arc<str>,
        candidates: &[Arc<Overload>],
        failures: &[CallFailure],
    ) -> BindingFailure {
        let mut min = usize::MAX;
        let mut max = Some(0);
        let mut actual = 0;
        for failure in failures {
            if let CallFailureReason::Mapping(MappingError::ArgumentCount {
                min: low,
                max: high,
                actual: given,
            }) = &failure.reason
            {
                min = min.min(*low);
                max = match (max, high) {
                    (Some(current), Some(high)) => Some(current.max(*high)),
                    _ => None,
                };
                actual = *given;
            }
        }
        if min == usize::MAX {
            let (low, high) = candidates.first().map_or((0, Some(0)), |first| arity(first));
            min = low;
            max = high;
        }
        BindingFailure::IncorrectArgumentCount {
            name: Arc::clone(name),
            min,
            max,
            actual,
        }
    }

    fn first_mismatch(
        &self,
        mapping: &Mapping,
        canonical: &[&BoundValue],
        level: NarrowingLevel,
    ) -> Option<CallFailureReason> {
        for (position, (arg, param_ty)) in canonical.iter().zip(&mapping.arg_types).enumerate() {
            let Some(param_ty) = param_ty else {
                continue;
            };
            let limit = arg.limit_type();
            if !self.conversions.can_convert(&limit, param_ty, level) {
                return Some(CallFailureReason::Conversion {
                    position,
                    expected: param_ty.clone(),
                    actual: limit,
                });
            }
        }
        None
    }

    fn rank(&self, arg: &BoundValue, param_ty: &Ty) -> ConversionRank {
        self.conversions
            .classify(&arg.limit_type(), param_ty)
            .unwrap_or(ConversionRank::UserExplicit)
    }

    // Parameter-wise comparison, then the tie-breakers for equivalent candidates.
    fn compare(&self, left: &Mapping, right: &Mapping, canonical: &[&BoundValue], name: &str) -> Preference {
        let mut preference = Preference::Equal;
        for (position, arg) in canonical.iter().enumerate() {
            let (Some(Some(left_ty)), Some(Some(right_ty))) =
                (left.arg_types.get(position), right.arg_types.get(position))
            else {
                continue;
            };
            preference = preference.combine(self.compare_params(arg, left_ty, right_ty));
            if preference == Preference::Ambiguous {
                return preference;
            }
        }
        if preference != Preference::Equal {
            return preference;
        }
        self.compare_equivalent(left, right, canonical, name)
    }

    fn compare_params(&self, arg: &BoundValue, left: &Ty, right: &Ty) -> Preference {
        if left == right {
            return Preference::Equal;
        }
        let left_to_right = self.conversions.can_convert(left, right, NarrowingLevel::None);
        let right_to_left = self.conversions.can_convert(right, left, NarrowingLevel::None);
        match (left_to_right, right_to_left) {
            (true, false) => return Preference::Left,
            (false, true) => return Preference::Right,
            _ => {}
        }
        if let (Some(left_prim), Some(right_prim)) = (left.as_primitive(), right.as_primitive()) {
            match prefer_signed(left_prim, right_prim) {
                Some(true) => return Preference::Left,
                Some(false) => return Preference::Right,
                None => {}
            }
        }
        Preference::from_ordering(self.rank(arg, left).cmp(&self.rank(arg, right)))
    }

    fn compare_equivalent(
        &self,
        left: &Mapping,
        right: &Mapping,
        canonical: &[&BoundValue],
        name: &str,
    ) -> Preference {
        let (a, b) = (&left.overload, &right.overload);
        let visibility = Preference::from_ordering(
            b.visibility.is_public().cmp(&a.visibility.is_public()),
        );
        if visibility != Preference::Equal {
            return visibility;
        }
        let generic = Preference::from_ordering((a.generic_arity > 0).cmp(&(b.generic_arity > 0)));
        if generic != Preference::Equal {
            return generic;
        }
        let outs = Preference::from_ordering(a.out_count().cmp(&b.out_count()));
        if outs != Preference::Equal {
            return outs;
        }
        let form = Preference::from_ordering(left.expanded.cmp(&right.expanded));
        if form != Preference::Equal {
            return form;
        }
        let worst = |mapping: &Mapping| {
            canonical
                .iter()
                .zip(&mapping.arg_types)
                .filter_map(|(arg, ty)| ty.as_ref().map(|ty| self.rank(arg, ty)))
                .max()
                .unwrap_or(ConversionRank::Identity)
        };
        let priority = Preference::from_ordering(worst(left).cmp(&worst(right)));
        if priority != Preference::Equal {
            return priority;
        }
        let hierarchy = self.catalog.hierarchy();
        if hierarchy.is_strict_subtype(&a.declaring, &b.declaring) {
            return Preference::Left;
        }
        if hierarchy.is_strict_subtype(&b.declaring, &a.declaring) {
            return Preference::Right;
        }
        let exact = Preference::from_ordering((&*b.name == name).cmp(&(&*a.name == name)));
        if exact != Preference::Equal {
            return exact;
        }
        Preference::Ambiguous
    }

    fn success(
        &self,
        chosen: &Mapping,
        mapped: &[Mapping],
        actual: &ActualArgs,
        level: NarrowingLevel,
    ) -> Result<BindingTarget> {
        let canonical = actual.canonical();
        let hierarchy = self.catalog.hierarchy();
        let mode = if level == NarrowingLevel::None {
            ConversionMode::ImplicitRequired
        } else {
            ConversionMode::ExplicitRequired
        };
        let mut guards = actual.guards.clone();
        let mut restricted = Vec::with_capacity(canonical.len());
        let mut converted: Vec<Option<Expr>> = Vec::with_capacity(canonical.len());
        for (position, arg) in canonical.iter().enumerate() {
            let Some(param_ty) = &chosen.arg_types[position] else {
                restricted.push((*arg).clone());
                converted.push(None);
                continue;
            };
            let overloaded = mapped.iter().any(|other| {
                other.arg_types.get(position).is_some_and(|ty| ty.as_ref() != Some(param_ty))
            });
            let value = if *param_ty == Ty::Any {
                if overloaded { arg.restrict_type_only() } else { (*arg).clone() }
            } else if overloaded || !hierarchy.is_assignable(&arg.static_ty, param_ty) {
                arg.restrict()
            } else {
                (*arg).clone()
            };
            guards.extend(&value.guards);
            let Some(expr) = self.conversions.convert_expr(&value, param_ty, mode) else {
                return Err(Error::internal(format!(
                    "`{}` was applicable at narrowing level {level} but `{}` has no {mode} conversion to `{param_ty}`",
                    chosen.overload.signature(),
                    value.limit_type()
                )));
            };
            restricted.push(value);
            converted.push(Some(expr));
        }
        let take = |index: usize| converted[index].clone().unwrap_or(Expr::Default(Ty::Any));
        let instance = chosen.instance.map(take);
        let call_args = chosen
            .overload
            .params
            .iter()
            .zip(&chosen.slots)
            .map(|(param, slot)| match slot {
                Slot::Arg(index) => take(*index),
                Slot::Default(value) => Expr::Constant(value.clone()),
                Slot::Out(ty) => Expr::Default(ty.clone()),
                Slot::ParamsArray(indices) => Expr::BuildArray {
                    element: param.element_ty(),
                    items: indices.iter().map(|index| take(*index)).collect(),
                },
                Slot::ParamsDict(entries) => Expr::BuildMap {
                    entries: entries
                        .iter()
                        .map(|(key, index)| (Arc::clone(key), take(*index)))
                        .collect(),
                },
            })
            .collect();
        Ok(BindingTarget::Success(Box::new(BoundCall {
            overload: Arc::clone(&chosen.overload),
            level,
            args: restricted,
            instance,
            call_args,
            guards,
        })))
    }
}

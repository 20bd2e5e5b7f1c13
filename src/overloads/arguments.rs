use std::sync::Arc;

use super::{ArgKind, CallShape};
use crate::ir::{BoundValue, Expr, Guard, GuardSet};
use crate::metadata::{Overload, ParamKind};
use crate::types::{ConstValue, Ty, Value};

/// Call-site arguments after splats are expanded.
#[derive(Clone, Debug)]
pub(super) struct ActualArgs {
    pub instance: Option<BoundValue>,
    pub positional: Vec<BoundValue>,
    pub named: Vec<(Arc<str>, BoundValue)>,
    /// Length and key guards introduced by expanding splats.
    pub guards: GuardSet,
    pub collapsed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum ExpandError {
    DuplicateKeyword(Arc<str>),
    /// A splat argument with no observed collection value.
    OpaqueSplat(usize),
}

impl ActualArgs {
    pub fn expand(args: &[BoundValue], shape: &CallShape) -> Result<Self, ExpandError> {
        let mut actual = ActualArgs {
            instance: None,
            positional: Vec::new(),
            named: Vec::new(),
            guards: GuardSet::new(),
            collapsed: false,
        };
        for (index, (arg, kind)) in args.iter().zip(shape.kinds.iter()).enumerate() {
            match kind {
                ArgKind::Positional => actual.positional.push(arg.clone()),
                ArgKind::ImplicitInstance => actual.instance = Some(arg.clone()),
                ArgKind::Named(name) => actual.push_named(Arc::clone(name), arg.clone())?,
                ArgKind::SplatList => {
                    let Some(Value::Array { items, .. }) = &arg.value else {
                        return Err(ExpandError::OpaqueSplat(index));
                    };
                    actual.guards.extend(&arg.guards);
                    // Pin the list type so a map of equal size misses.
                    if let Some(guard) = arg.type_guard() {
                        actual.guards.push(guard);
                    }
                    actual.guards.push(Guard::Length {
                        target: arg.expr.clone(),
                        len: items.len(),
                    });
                    for (position, item) in items.iter().enumerate() {
                        let position = i32::try_from(position).unwrap_or(i32::MAX);
                        actual.positional.push(BoundValue {
                            expr: Expr::ArrayIndex {
                                array: Box::new(arg.expr.clone()),
                                index: Box::new(Expr::Constant(ConstValue::i32(position))),
                            },
                            static_ty: Ty::Any,
                            value: Some(item.clone()),
                            guards: GuardSet::new(),
                        });
                    }
                    actual.collapsed = true;
                }
                ArgKind::SplatDict => {
                    let Some(Value::Map(entries)) = &arg.value else {
                        return Err(ExpandError::OpaqueSplat(index));
                    };
                    let mut keys: Vec<Arc<str>> =
                        entries.iter().map(|(key, _)| Arc::clone(key)).collect();
                    keys.sort();
                    actual.guards.extend(&arg.guards);
                    actual.guards.push(Guard::Keys {
                        target: arg.expr.clone(),
                        keys,
                    });
                    for (key, item) in entries {
                        let value = BoundValue {
                            expr: Expr::MapGet {
                                map: Box::new(arg.expr.clone()),
                                key: Arc::clone(key),
                            },
                            static_ty: Ty::Any,
                            value: Some(item.clone()),
                            guards: GuardSet::new(),
                        };
                        actual.push_named(Arc::clone(key), value)?;
                    }
                    actual.collapsed = true;
                }
            }
        }
        Ok(actual)
    }

    fn push_named(&mut self, name: Arc<str>, value: BoundValue) -> Result<(), ExpandError> {
        if self.named.iter().any(|(seen, _)| *seen == name) {
            return Err(ExpandError::DuplicateKeyword(name));
        }
        self.named.push((name, value));
        Ok(())
    }

    /// Arguments in canonical order: instance, positional, then keywords.
    pub fn canonical(&self) -> Vec<&BoundValue> {
        self.instance
            .iter()
            .chain(self.positional.iter())
            .chain(self.named.iter().map(|(_, value)| value))
            .collect()
    }

    pub fn count(&self) -> usize {
        self.positional.len() + self.named.len()
    }
}

/// How one parameter is supplied.
#[derive(Clone, Debug)]
pub(super) enum Slot {
    /// Canonical argument index.
    Arg(usize),
    Default(ConstValue),
    Out(Ty),
    ParamsArray(Vec<usize>),
    ParamsDict(Vec<(Arc<str>, usize)>),
}

/// Arguments of one call mapped onto one candidate.
#[derive(Clone, Debug)]
pub(super) struct Mapping {
    pub overload: Arc<Overload>,
    /// Canonical index of the receiver for instance candidates.
    pub instance: Option<usize>,
    pub slots: Vec<Slot>,
    /// Parameter type each canonical argument is converted to; `None` when the
    /// argument is dropped (the receiver of a static candidate).
    pub arg_types: Vec<Option<Ty>>,
    pub expanded: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MappingError {
    ArgumentCount {
        min: usize,
        max: Option<usize>,
        actual: usize,
    },
    DuplicateKeyword(Arc<str>),
    UnassignableKeyword(Arc<str>),
}

pub(super) fn arity(overload: &Overload) -> (usize, Option<usize>) {
    let normal = overload
        .params
        .iter()
        .filter(|param| param.kind == ParamKind::Normal);
    let min = normal
        .clone()
        .filter(|param| param.default.is_none() && !param.is_out)
        .count();
    let max = (!overload.has_params_array()).then(|| normal.count());
    (min, max)
}

/// Map the call's arguments onto `overload`'s parameters. Keywords bind first.
pub(super) fn map_arguments(overload: &Arc<Overload>, actual: &ActualArgs) -> Result<Mapping, MappingError> {
    let has_instance = actual.instance.is_some();
    let positional_base = usize::from(has_instance);
    let named_base = positional_base + actual.positional.len();
    let total = named_base + actual.named.len();
    let mut arg_types: Vec<Option<Ty>> = vec![None; total];

    // Receiver: the implicit instance, or else the first positional argument.
    let mut positional: Vec<usize> = (positional_base..named_base).collect();
    let instance = if overload.is_static {
        None
    } else if has_instance {
        Some(0)
    } else if positional.is_empty() {
        let (min, max) = arity(overload);
        return Err(MappingError::ArgumentCount {
            min: min + 1,
            max: max.map(|max| max + 1),
            actual: actual.count(),
        });
    } else {
        Some(positional.remove(0))
    };
    if let Some(index) = instance {
        arg_types[index] = Some(overload.declaring.clone());
    }

    let mut slots: Vec<Option<Slot>> = vec![None; overload.params.len()];
    let dict_param = overload
        .params
        .iter()
        .position(|param| param.kind == ParamKind::ParamsDict);
    let mut dict_entries = Vec::new();
    for (offset, (name, _)) in actual.named.iter().enumerate() {
        let index = named_base + offset;
        let target = overload
            .params
            .iter()
            .position(|param| param.kind == ParamKind::Normal && param.name == *name);
        match target {
            Some(position) => {
                slots[position] = Some(Slot::Arg(index));
                arg_types[index] = Some(overload.params[position].ty.clone());
            }
            None if dict_param.is_some() => {
                dict_entries.push((Arc::clone(name), index));
                arg_types[index] = Some(Ty::Any);
            }
            None => return Err(MappingError::UnassignableKeyword(Arc::clone(name))),
        }
    }

    let normal: Vec<usize> = overload
        .params
        .iter()
        .enumerate()
        .filter(|(_, param)| param.kind == ParamKind::Normal)
        .map(|(position, _)| position)
        .collect();
    let mut remaining = positional.into_iter();
    for &position in &normal {
        if remaining.as_slice().is_empty() {
            break;
        }
        if slots[position].is_some() {
            // A positional argument reaches a parameter already bound by keyword.
            return Err(MappingError::DuplicateKeyword(Arc::clone(
                &overload.params[position].name,
            )));
        }
        if let Some(index) = remaining.next() {
            slots[position] = Some(Slot::Arg(index));
            arg_types[index] = Some(overload.params[position].ty.clone());
        }
    }

    let leftover: Vec<usize> = remaining.collect();
    let array_param = overload
        .params
        .iter()
        .position(|param| param.kind == ParamKind::ParamsArray);
    let mut expanded = false;
    match array_param {
        Some(position) => {
            let param = &overload.params[position];
            let passes_array = leftover.len() == 1
                && actual
                    .canonical()
                    .get(leftover[0])
                    .is_some_and(|arg| matches!(arg.limit_type(), Ty::Array(_)));
            if passes_array {
                slots[position] = Some(Slot::Arg(leftover[0]));
                arg_types[leftover[0]] = Some(param.ty.clone());
            } else {
                expanded = true;
                for &index in &leftover {
                    arg_types[index] = Some(param.element_ty());
                }
                slots[position] = Some(Slot::ParamsArray(leftover));
            }
        }
        None if !leftover.is_empty() => {
            let (min, max) = arity(overload);
            return Err(MappingError::ArgumentCount {
                min,
                max,
                actual: actual.count() - usize::from(instance.is_some() && !has_instance),
            });
        }
        None => {}
    }
    if let Some(position) = dict_param {
        slots[position] = Some(Slot::ParamsDict(dict_entries));
    }

    let mut filled = Vec::with_capacity(slots.len());
    for (position, slot) in slots.into_iter().enumerate() {
        let param = &overload.params[position];
        match slot {
            Some(slot) => filled.push(slot),
            None if param.is_out => filled.push(Slot::Out(param.ty.clone())),
            None => match &param.default {
                Some(default) => filled.push(Slot::Default(default.clone())),
                None => {
                    let (min, max) = arity(overload);
                    return Err(MappingError::ArgumentCount {
                        min,
                        max,
                        actual: actual.count() - usize::from(instance.is_some() && !has_instance),
                    });
                }
            },
        }
    }

    Ok(Mapping {
        overload: Arc::clone(overload),
        instance,
        slots: filled,
        arg_types,
        expanded,
    })
}

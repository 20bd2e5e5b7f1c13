use std::sync::Arc;

use super::Expr;
use crate::catalog::MemberKind;
use crate::types::{ConstValue, InstanceKey, Ty, Value};

/// One condition under which a rule stays valid.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Guard {
    /// The runtime type of `target` is exactly `ty`.
    TypeExact { target: Expr, ty: Ty },
    /// `target` is the given instance.
    Instance { target: Expr, key: InstanceKey },
    NotNull { target: Expr },
    /// `target` is a collection of exactly `len` elements.
    Length { target: Expr, len: usize },
    /// `target` is a keyword dictionary with exactly these keys (sorted).
    Keys { target: Expr, keys: Vec<Arc<str>> },
    /// Arbitrary boolean test.
    Test(Expr),
}

/// Ordered, de-duplicated conjunction of guards.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct GuardSet {
    guards: Vec<Guard>,
}

impl GuardSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn single(guard: Guard) -> Self {
        Self {
            guards: vec![guard],
        }
    }

    pub fn push(&mut self, guard: Guard) {
        if !self.guards.contains(&guard) {
            self.guards.push(guard);
        }
    }

    pub fn extend(&mut self, other: &GuardSet) {
        for guard in &other.guards {
            self.push(guard.clone());
        }
    }

    /// Conjunction of both sets, keeping `self`'s order first.
    #[must_use]
    pub fn merge(&self, other: &GuardSet) -> GuardSet {
        let mut merged = self.clone();
        merged.extend(other);
        merged
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Guard> {
        self.guards.iter()
    }

    #[must_use]
    pub fn contains(&self, guard: &Guard) -> bool {
        self.guards.contains(guard)
    }

    /// Evaluate against concrete site inputs. Guards whose target cannot be
    /// resolved from the inputs count as failed.
    #[must_use]
    pub fn holds(&self, inputs: &[Value]) -> bool {
        self.guards.iter().all(|guard| guard.holds(inputs))
    }
}

impl<'a> IntoIterator for &'a GuardSet {
    type Item = &'a Guard;
    type IntoIter = std::slice::Iter<'a, Guard>;

    fn into_iter(self) -> Self::IntoIter {
        self.guards.iter()
    }
}

impl Guard {
    #[must_use]
    pub fn holds(&self, inputs: &[Value]) -> bool {
        match self {
            Guard::TypeExact { target, ty } => {
                resolve(target, inputs).is_some_and(|value| value.runtime_type() == *ty)
            }
            Guard::Instance { target, key } => resolve(target, inputs)
                .and_then(|value| value.instance_key())
                .is_some_and(|actual| actual == *key),
            Guard::NotNull { target } => {
                resolve(target, inputs).is_some_and(|value| !value.is_null())
            }
            Guard::Length { target, len } => match resolve(target, inputs) {
                Some(Value::Array { items, .. }) => items.len() == *len,
                Some(Value::Map(entries)) => entries.len() == *len,
                _ => false,
            },
            Guard::Keys { target, keys } => match resolve(target, inputs) {
                Some(Value::Map(entries)) => {
                    let mut actual: Vec<Arc<str>> =
                        entries.iter().map(|(key, _)| Arc::clone(key)).collect();
                    actual.sort();
                    actual == *keys
                }
                _ => false,
            },
            Guard::Test(Expr::Constant(ConstValue::Bool(value))) => *value,
            Guard::Test(_) => false,
        }
    }
}

fn resolve(expr: &Expr, inputs: &[Value]) -> Option<Value> {
    match expr {
        Expr::Input(index) => inputs.get(*index).cloned(),
        Expr::Constant(constant) => Some(Value::Const(constant.clone())),
        Expr::Convert { value, .. } => resolve(value, inputs),
        Expr::ArrayIndex { array, index } => {
            let Some(Value::Array { items, .. }) = resolve(array, inputs) else {
                return None;
            };
            let Expr::Constant(ConstValue::Int { value, .. }) = index.as_ref() else {
                return None;
            };
            usize::try_from(*value)
                .ok()
                .and_then(|position| items.get(position).cloned())
        }
        Expr::MapGet { map, key } => match resolve(map, inputs)? {
            Value::Map(entries) => entries
                .into_iter()
                .find(|(name, _)| name == key)
                .map(|(_, value)| value),
            _ => None,
        },
        Expr::WrapperValue(inner) => match resolve(inner, inputs)? {
            Value::Wrapped { value, .. } => Some(*value),
            _ => None,
        },
        Expr::BoundInstance(inner) => match resolve(inner, inputs)? {
            Value::Member(member) => match member.kind() {
                MemberKind::Bound(bound) => bound.instance.value.clone(),
                _ => None,
            },
            _ => None,
        },
        _ => None,
    }
}

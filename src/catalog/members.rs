use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::identity;
use super::method_group::MethodGroup;
use crate::binder::DefaultBinder;
use crate::conversions::ConversionMode;
use crate::diagnostics::Diagnostic;
use crate::error::{Error, Result};
use crate::ir::{BoundRule, BoundValue, Callee, Expr, FieldRef};
use crate::metadata::{
    Accessor, Capabilities, HostMember, HostMemberKind, MemberId, Overload, ParamInfo, Visibility,
};
use crate::types::{ConstValue, Ty};

/// Shared handle to an identity-cached member descriptor.
pub type MemberRef = Arc<MemberDescriptor>;

#[derive(Debug)]
pub struct FieldMember {
    pub ty: Ty,
    pub read_only: bool,
    pub literal: Option<ConstValue>,
}

#[derive(Debug)]
pub struct PropertyMember {
    pub ty: Ty,
    pub getter: Option<Accessor>,
    pub setter: Option<Accessor>,
    pub deleter: Option<Accessor>,
    pub index_params: Vec<ParamInfo>,
}

#[derive(Debug)]
pub struct EventMember {
    pub handler: Ty,
}

/// Member paired with the instance it was read from.
#[derive(Debug)]
pub struct BoundMember {
    pub member: MemberRef,
    pub instance: BoundValue,
}

#[derive(Debug)]
pub struct CustomMember {
    pub ty: Ty,
    pub capabilities: Capabilities,
}

#[derive(Debug)]
pub enum MemberKind {
    Field(FieldMember),
    Property(PropertyMember),
    Method(Arc<Overload>),
    MethodGroup(MethodGroup),
    Constructor(Arc<Overload>),
    Event(EventMember),
    NestedType(Ty),
    /// Several same-named types merged into one entry.
    TypeGroup(Vec<Ty>),
    /// Namespace identified by its dotted path.
    Namespace(Arc<str>),
    Bound(BoundMember),
    Custom(CustomMember),
}

impl MemberKind {
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            MemberKind::Field(_) => "field",
            MemberKind::Property(_) => "property",
            MemberKind::Method(_) | MemberKind::MethodGroup(_) => "method",
            MemberKind::Constructor(_) => "constructor",
            MemberKind::Event(_) => "event",
            MemberKind::NestedType(_) | MemberKind::TypeGroup(_) => "type",
            MemberKind::Namespace(_) => "namespace",
            MemberKind::Bound(_) => "bound member",
            MemberKind::Custom(_) => "custom member",
        }
    }
}

/// Polymorphic view over a host member, created once per (member, extending type).
#[derive(Debug)]
pub struct MemberDescriptor {
    key: u64,
    name: Arc<str>,
    declaring: Ty,
    id: Option<MemberId>,
    is_static: bool,
    visibility: Visibility,
    no_side_effects: bool,
    kind: MemberKind,
}

impl PartialEq for MemberDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for MemberDescriptor {}

impl Hash for MemberDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl MemberDescriptor {
    pub(super) fn from_host(host: &HostMember, extending: &Ty) -> Self {
        let kind = match &host.kind {
            HostMemberKind::Field {
                ty,
                read_only,
                literal,
            } => MemberKind::Field(FieldMember {
                ty: ty.clone(),
                read_only: *read_only,
                literal: literal.clone(),
            }),
            HostMemberKind::Property {
                ty,
                getter,
                setter,
                deleter,
                index_params,
            } => MemberKind::Property(PropertyMember {
                ty: ty.clone(),
                getter: *getter,
                setter: *setter,
                deleter: *deleter,
                index_params: index_params.clone(),
            }),
            HostMemberKind::Method(overload) => MemberKind::Method(Arc::clone(overload)),
            HostMemberKind::Constructor(overload) => {
                MemberKind::Constructor(Arc::clone(overload))
            }
            HostMemberKind::Event { handler } => MemberKind::Event(EventMember {
                handler: handler.clone(),
            }),
            HostMemberKind::NestedType(ty) => MemberKind::NestedType(ty.clone()),
            HostMemberKind::Custom { ty, capabilities } => MemberKind::Custom(CustomMember {
                ty: ty.clone(),
                capabilities: *capabilities,
            }),
        };
        let extending_name = extending.to_string();
        let declaring_name = host.declaring.to_string();
        let id = host.id.0.to_string();
        Self {
            key: identity(&["member", &declaring_name, &host.name, &id, &extending_name]),
            name: Arc::clone(&host.name),
            declaring: host.declaring.clone(),
            id: Some(host.id),
            is_static: host.is_static,
            visibility: host.visibility,
            no_side_effects: host.no_side_effects,
            kind,
        }
    }

    pub(super) fn synthetic(
        key: u64,
        name: Arc<str>,
        declaring: Ty,
        is_static: bool,
        kind: MemberKind,
    ) -> Self {
        Self {
            key,
            name,
            declaring,
            id: None,
            is_static,
            visibility: Visibility::Public,
            no_side_effects: true,
            kind,
        }
    }

    #[must_use]
    pub fn key(&self) -> u64 {
        self.key
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn declaring(&self) -> &Ty {
        &self.declaring
    }

    #[must_use]
    pub fn member_id(&self) -> Option<MemberId> {
        self.id
    }

    #[must_use]
    pub fn is_static(&self) -> bool {
        self.is_static
    }

    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    #[must_use]
    pub fn no_side_effects(&self) -> bool {
        self.no_side_effects
    }

    #[must_use]
    pub fn kind(&self) -> &MemberKind {
        &self.kind
    }

    #[must_use]
    pub fn as_method_group(&self) -> Option<&MethodGroup> {
        match &self.kind {
            MemberKind::MethodGroup(group) => Some(group),
            _ => None,
        }
    }

    /// What the descriptor lets callers do with the member.
    #[must_use]
    pub fn capabilities(&self) -> Capabilities {
        match &self.kind {
            MemberKind::Field(field) => Capabilities {
                get: true,
                set: !field.read_only && field.literal.is_none(),
                delete: false,
                invoke: false,
            },
            MemberKind::Property(property) => Capabilities {
                get: property.getter.is_some(),
                set: property.setter.is_some(),
                delete: property.deleter.is_some(),
                invoke: false,
            },
            MemberKind::Method(_)
            | MemberKind::MethodGroup(_)
            | MemberKind::Constructor(_)
            | MemberKind::NestedType(_)
            | MemberKind::TypeGroup(_) => Capabilities {
                get: true,
                set: false,
                delete: false,
                invoke: true,
            },
            MemberKind::Event(_) | MemberKind::Namespace(_) => Capabilities {
                get: true,
                ..Capabilities::default()
            },
            MemberKind::Bound(bound) => bound.member.capabilities(),
            MemberKind::Custom(custom) => custom.capabilities,
        }
    }

    /// Type of the value produced by reading the member.
    #[must_use]
    pub fn value_ty(&self) -> Ty {
        match &self.kind {
            MemberKind::Field(FieldMember { ty, .. })
            | MemberKind::Property(PropertyMember { ty, .. })
            | MemberKind::Custom(CustomMember { ty, .. }) => ty.clone(),
            MemberKind::NestedType(_) => Ty::Meta,
            MemberKind::Namespace(_) => Ty::NamespaceObj,
            MemberKind::Bound(_) => Ty::BoundMemberObj,
            _ => Ty::MemberObj,
        }
    }

    fn visible(&self, binder: &DefaultBinder, accessor: Accessor) -> bool {
        accessor.visibility.is_public() || binder.config().private_binding
    }

    fn instance_expr(&self, instance: &BoundValue) -> Expr {
        if instance.static_ty == self.declaring {
            instance.expr.clone()
        } else {
            Expr::convert(instance.expr.clone(), self.declaring.clone())
        }
    }

    fn value_access(self: &Arc<Self>, instance: Option<&BoundValue>) -> (Expr, Ty) {
        match instance {
            Some(instance) => (
                Expr::MakeBound {
                    member: Arc::clone(self),
                    instance: Box::new(instance.expr.clone()),
                },
                Ty::BoundMemberObj,
            ),
            None => (Expr::MemberValue(Arc::clone(self)), self.value_ty()),
        }
    }

    fn accessor_callee(&self, prefix: &str, ret: Ty) -> Result<Callee> {
        let id = self
            .id
            .ok_or_else(|| Error::internal(format!("accessor on synthetic member `{}`", self.name)))?;
        Ok(Callee::accessor(
            prefix,
            &self.declaring,
            &self.name,
            id,
            self.is_static,
            self.no_side_effects,
            ret,
        ))
    }

    /// Rule reading the member through `target`.
    pub fn get_value(self: &Arc<Self>, binder: &DefaultBinder, target: &AccessTarget) -> Result<BoundRule> {
        let provider = binder.catalog().provider();
        match &self.kind {
            MemberKind::Field(field) => {
                if let Some(literal) = &field.literal {
                    return Ok(BoundRule::value(
                        Expr::Constant(literal.clone()),
                        field.ty.clone(),
                    ));
                }
                let field_ref = FieldRef {
                    declaring: self.declaring.clone(),
                    name: Arc::clone(&self.name),
                    ty: field.ty.clone(),
                };
                if self.is_static {
                    if provider.has_unresolved_generics(&self.declaring) {
                        return Err(
                            Diagnostic::generic_parameters_unresolved(&self.declaring, &self.name)
                                .into(),
                        );
                    }
                    return Ok(BoundRule::value(
                        Expr::Field {
                            target: None,
                            field: field_ref,
                        },
                        field.ty.clone(),
                    ));
                }
                let Some(instance) = &target.instance else {
                    return Err(Diagnostic::missing_instance(&self.declaring, &self.name).into());
                };
                Ok(BoundRule::value(
                    Expr::Field {
                        target: Some(Box::new(self.instance_expr(instance))),
                        field: field_ref,
                    },
                    field.ty.clone(),
                ))
            }
            MemberKind::Property(property) => {
                if !property.index_params.is_empty() {
                    let (expr, ty) = self.value_access(target.instance.as_ref());
                    return Ok(BoundRule::value(expr, ty));
                }
                let readable = property
                    .getter
                    .is_some_and(|getter| self.visible(binder, getter));
                if !readable {
                    return Err(Diagnostic::member_not_found(&target.through, &self.name)
                        .with_note(format!("property `{}` has no readable getter", self.name))
                        .into());
                }
                if provider.has_unresolved_generics(&self.declaring) {
                    return Err(Diagnostic::generic_parameters_unresolved(
                        &self.declaring,
                        &self.name,
                    )
                    .into());
                }
                let callee = self.accessor_callee("get", property.ty.clone())?;
                let body = match (self.is_static, &target.instance) {
                    (true, None) => Expr::call(None, callee, Vec::new()),
                    (false, Some(instance)) => {
                        Expr::call(Some(self.instance_expr(instance)), callee, Vec::new())
                    }
                    (true, Some(_)) => {
                        return Err(Diagnostic::static_instance_mismatch(format!(
                            "static property `{}` of `{}` cannot be read through an instance",
                            self.name, self.declaring
                        ))
                        .into());
                    }
                    (false, None) => {
                        return Err(Diagnostic::static_instance_mismatch(format!(
                            "instance property `{}` of `{}` cannot be read without an instance",
                            self.name, self.declaring
                        ))
                        .into());
                    }
                };
                Ok(BoundRule::value(body, property.ty.clone()))
            }
            MemberKind::Method(_) | MemberKind::Event(_) => {
                let instance = target.instance.as_ref().filter(|_| !self.is_static);
                let (expr, ty) = self.value_access(instance);
                Ok(BoundRule::value(expr, ty))
            }
            MemberKind::MethodGroup(group) => {
                let instance = target
                    .instance
                    .as_ref()
                    .filter(|_| group.contains_instance());
                let (expr, ty) = self.value_access(instance);
                Ok(BoundRule::value(expr, ty))
            }
            MemberKind::Constructor(_) | MemberKind::TypeGroup(_) | MemberKind::Namespace(_) => {
                let (expr, ty) = self.value_access(None);
                Ok(BoundRule::value(expr, ty))
            }
            MemberKind::NestedType(ty) => Ok(BoundRule::value(
                Expr::Constant(ConstValue::Type(ty.clone())),
                Ty::Meta,
            )),
            MemberKind::Bound(bound) => bound.member.get_value(binder, &bound.access_target()),
            MemberKind::Custom(custom) => {
                if !custom.capabilities.get {
                    return Err(Diagnostic::member_not_found(&target.through, &self.name)
                        .with_note(format!("`{}` cannot be read", self.name))
                        .into());
                }
                let callee = self.accessor_callee("get", custom.ty.clone())?;
                let instance = target.instance.as_ref().map(|inst| self.instance_expr(inst));
                Ok(BoundRule::value(
                    Expr::call(instance, callee, Vec::new()),
                    custom.ty.clone(),
                ))
            }
        }
    }

    /// Rule assigning `value` to the member through `target`; the rule yields the value.
    pub fn set_value(
        self: &Arc<Self>,
        binder: &DefaultBinder,
        target: &AccessTarget,
        value: &BoundValue,
    ) -> Result<BoundRule> {
        let provider = binder.catalog().provider();
        match &self.kind {
            MemberKind::Field(field) => {
                if field.read_only || field.literal.is_some() {
                    return Err(Diagnostic::read_only_member(&self.name, "field is read-only").into());
                }
                let converted = self.convert_value(binder, value, &field.ty)?;
                let field_ref = FieldRef {
                    declaring: self.declaring.clone(),
                    name: Arc::clone(&self.name),
                    ty: field.ty.clone(),
                };
                if self.is_static {
                    if target.through != self.declaring && target.instance.is_none() {
                        return Err(self.derived_static_assignment(&target.through).into());
                    }
                    if provider.has_unresolved_generics(&self.declaring) {
                        return Err(Diagnostic::generic_parameters_unresolved(
                            &self.declaring,
                            &self.name,
                        )
                        .into());
                    }
                    let place = Expr::Field {
                        target: None,
                        field: field_ref,
                    };
                    return Ok(BoundRule::value(Expr::assign(place, converted), field.ty.clone()));
                }
                if provider.is_value_type(&self.declaring) {
                    return Err(Diagnostic::read_only_member(
                        &self.name,
                        &format!("cannot assign to a field of value type `{}`", self.declaring),
                    )
                    .into());
                }
                let Some(instance) = &target.instance else {
                    return Err(Diagnostic::missing_instance(&self.declaring, &self.name).into());
                };
                let place = Expr::Field {
                    target: Some(Box::new(self.instance_expr(instance))),
                    field: field_ref,
                };
                Ok(BoundRule::value(Expr::assign(place, converted), field.ty.clone()))
            }
            MemberKind::Property(property) => {
                if !property.index_params.is_empty() {
                    return Err(Diagnostic::read_only_member(
                        &self.name,
                        "indexed property requires index arguments",
                    )
                    .into());
                }
                let writable = property
                    .setter
                    .is_some_and(|setter| self.visible(binder, setter));
                if !writable {
                    return Err(Diagnostic::read_only_member(
                        &self.name,
                        "property has no accessible setter",
                    )
                    .into());
                }
                match (self.is_static, &target.instance) {
                    (true, Some(_)) => {
                        return Err(Diagnostic::static_instance_mismatch(format!(
                            "static property `{}` of `{}` cannot be assigned through an instance",
                            self.name, self.declaring
                        ))
                        .into());
                    }
                    (false, None) => {
                        return Err(Diagnostic::static_instance_mismatch(format!(
                            "instance property `{}` of `{}` cannot be assigned without an instance",
                            self.name, self.declaring
                        ))
                        .into());
                    }
                    (true, None) if target.through != self.declaring => {
                        return Err(self.derived_static_assignment(&target.through).into());
                    }
                    _ => {}
                }
                if provider.has_unresolved_generics(&self.declaring) {
                    return Err(Diagnostic::generic_parameters_unresolved(
                        &self.declaring,
                        &self.name,
                    )
                    .into());
                }
                let converted = self.convert_value(binder, value, &property.ty)?;
                let callee = self.accessor_callee("set", Ty::Void)?;
                let instance = target.instance.as_ref().map(|inst| self.instance_expr(inst));
                let body = Expr::block(
                    Vec::new(),
                    vec![Expr::call(instance, callee, vec![converted]), value.expr.clone()],
                );
                Ok(BoundRule::value(body, value.static_ty.clone()))
            }
            MemberKind::Bound(bound) => {
                bound
                    .member
                    .set_value(binder, &bound.access_target(), value)
            }
            MemberKind::Custom(custom) => {
                if !custom.capabilities.set {
                    return Err(
                        Diagnostic::read_only_member(&self.name, "member cannot be assigned").into(),
                    );
                }
                let converted = self.convert_value(binder, value, &custom.ty)?;
                let callee = self.accessor_callee("set", Ty::Void)?;
                let instance = target.instance.as_ref().map(|inst| self.instance_expr(inst));
                let body = Expr::block(
                    Vec::new(),
                    vec![Expr::call(instance, callee, vec![converted]), value.expr.clone()],
                );
                Ok(BoundRule::value(body, value.static_ty.clone()))
            }
            other => Err(Diagnostic::read_only_member(
                &self.name,
                &format!("a {} cannot be assigned", other.describe()),
            )
            .into()),
        }
    }

    /// Rule removing the member through `target`.
    pub fn delete_value(self: &Arc<Self>, binder: &DefaultBinder, target: &AccessTarget) -> Result<BoundRule> {
        let deletable = match &self.kind {
            MemberKind::Property(property) => property
                .deleter
                .is_some_and(|deleter| self.visible(binder, deleter)),
            MemberKind::Custom(custom) => custom.capabilities.delete,
            MemberKind::Bound(bound) => {
                return bound.member.delete_value(binder, &bound.access_target());
            }
            _ => false,
        };
        if !deletable {
            return Err(Diagnostic::not_deletable(&target.through, &self.name).into());
        }
        let callee = self.accessor_callee("delete", Ty::Void)?;
        let instance = target.instance.as_ref().map(|inst| self.instance_expr(inst));
        Ok(BoundRule::value(
            Expr::call(instance, callee, Vec::new()),
            Ty::Void,
        ))
    }

    fn convert_value(&self, binder: &DefaultBinder, value: &BoundValue, to: &Ty) -> Result<Expr> {
        binder
            .conversions()
            .convert_expr(value, to, ConversionMode::ExplicitRequired)
            .ok_or_else(|| Diagnostic::conversion_not_possible(&value.limit_type(), to).into())
    }

    fn derived_static_assignment(&self, through: &Ty) -> Diagnostic {
        Diagnostic::static_instance_mismatch(format!(
            "static member `{}` of `{}` cannot be assigned through derived type `{through}`",
            self.name, self.declaring
        ))
    }

    /// Pair an instance member with `instance`; static members are returned unchanged.
    #[must_use]
    pub fn bind_to_instance(member: &MemberRef, instance: BoundValue) -> MemberRef {
        let binds = match &member.kind {
            MemberKind::Field(_)
            | MemberKind::Property(_)
            | MemberKind::Method(_)
            | MemberKind::Event(_)
            | MemberKind::Custom(_) => !member.is_static,
            MemberKind::MethodGroup(group) => group.contains_instance(),
            _ => false,
        };
        if !binds {
            return Arc::clone(member);
        }
        let key = identity(&["bound", &member.key.to_string()]);
        Arc::new(Self::synthetic(
            key,
            Arc::clone(&member.name),
            member.declaring.clone(),
            false,
            MemberKind::Bound(BoundMember {
                member: Arc::clone(member),
                instance,
            }),
        ))
    }
}

impl BoundMember {
    /// Access target for the captured instance.
    #[must_use]
    pub fn access_target(&self) -> AccessTarget {
        AccessTarget {
            instance: Some(self.instance.clone()),
            through: self.instance.limit_type(),
        }
    }
}

/// Receiver of a member access: the instance (absent for static access) and the
/// type the member was looked up through.
#[derive(Clone, Debug)]
pub struct AccessTarget {
    pub instance: Option<BoundValue>,
    pub through: Ty,
}

impl AccessTarget {
    #[must_use]
    pub fn instance(instance: BoundValue) -> Self {
        let through = instance.limit_type();
        Self {
            instance: Some(instance),
            through,
        }
    }

    #[must_use]
    pub fn static_on(through: Ty) -> Self {
        Self {
            instance: None,
            through,
        }
    }
}

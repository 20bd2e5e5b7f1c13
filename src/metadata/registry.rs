use std::collections::HashMap;
use std::sync::Arc;

use super::{
    Accessor, Capabilities, HostMember, HostMemberKind, MemberId, MetadataProvider, Overload,
    ParamInfo, SourceId, TypeKind, TypeShape, Visibility,
};
use crate::types::{ConstValue, Ty};

/// In-memory [`MetadataProvider`] populated through builders.
#[derive(Debug, Default)]
pub struct HostRegistry {
    shapes: HashMap<Ty, TypeShape>,
    members: HashMap<Ty, Vec<Arc<HostMember>>>,
    sources: Vec<(SourceId, Vec<Arc<str>>)>,
    next_member: u64,
}

impl HostRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare (or reopen) a type. Primitive types may be reopened to attach members.
    pub fn define(&mut self, ty: Ty, kind: TypeKind) -> TypeBuilder<'_> {
        self.shapes.entry(ty.clone()).or_insert_with(|| TypeShape {
            ty: ty.clone(),
            kind,
            base: None,
            interfaces: Vec::new(),
            default_member: None,
            generic_params_unresolved: false,
        });
        TypeBuilder { registry: self, ty }
    }

    pub fn class(&mut self, name: &str) -> TypeBuilder<'_> {
        self.define(Ty::named(name), TypeKind::Class)
    }

    pub fn structure(&mut self, name: &str) -> TypeBuilder<'_> {
        self.define(Ty::named(name), TypeKind::Struct)
    }

    pub fn interface(&mut self, name: &str) -> TypeBuilder<'_> {
        self.define(Ty::named(name), TypeKind::Interface)
    }

    pub fn delegate(&mut self, name: &str) -> TypeBuilder<'_> {
        self.define(Ty::named(name), TypeKind::Delegate)
    }

    /// Register a metadata source contributing the given fully qualified type names.
    pub fn add_source<S: AsRef<str>>(&mut self, type_names: &[S]) -> SourceId {
        let id = SourceId(u32::try_from(self.sources.len()).unwrap_or(u32::MAX));
        let names = type_names
            .iter()
            .map(|name| Arc::from(name.as_ref()))
            .collect();
        self.sources.push((id, names));
        id
    }

    fn attach(&mut self, ty: &Ty, member: MemberBuilder) {
        self.next_member += 1;
        let id = MemberId(self.next_member);
        let MemberBuilder {
            name,
            is_static,
            visibility,
            no_side_effects,
            kind,
        } = member;
        let kind = match kind {
            PendingKind::Ready(kind) => kind,
            PendingKind::Method(builder) => {
                HostMemberKind::Method(Arc::new(builder.finish(id, ty, is_static, visibility)))
            }
            // Constructors take no receiver.
            PendingKind::Constructor(builder) => HostMemberKind::Constructor(Arc::new(
                builder.finish(id, ty, true, visibility),
            )),
        };
        let record = HostMember {
            id,
            name,
            declaring: ty.clone(),
            is_static,
            visibility,
            no_side_effects,
            kind,
        };
        self.members
            .entry(ty.clone())
            .or_default()
            .push(Arc::new(record));
    }
}

impl MetadataProvider for HostRegistry {
    fn type_shape(&self, ty: &Ty) -> Option<TypeShape> {
        self.shapes.get(ty).cloned()
    }

    fn declared_members(&self, ty: &Ty) -> Vec<Arc<HostMember>> {
        self.members.get(ty).cloned().unwrap_or_default()
    }

    fn sources(&self) -> Vec<SourceId> {
        self.sources.iter().map(|(id, _)| *id).collect()
    }

    fn source_types(&self, source: SourceId) -> Vec<Arc<str>> {
        self.sources
            .iter()
            .find(|(id, _)| *id == source)
            .map(|(_, names)| names.clone())
            .unwrap_or_default()
    }
}

/// Builder returned by [`HostRegistry::define`].
pub struct TypeBuilder<'a> {
    registry: &'a mut HostRegistry,
    ty: Ty,
}

impl TypeBuilder<'_> {
    fn shape(&mut self) -> Option<&mut TypeShape> {
        self.registry.shapes.get_mut(&self.ty)
    }

    #[must_use]
    pub fn base(mut self, base: Ty) -> Self {
        if let Some(shape) = self.shape() {
            shape.base = Some(base);
        }
        self
    }

    #[must_use]
    pub fn implements(mut self, iface: Ty) -> Self {
        if let Some(shape) = self.shape() {
            shape.interfaces.push(iface);
        }
        self
    }

    #[must_use]
    pub fn default_member(mut self, name: &str) -> Self {
        if let Some(shape) = self.shape() {
            shape.default_member = Some(Arc::from(name));
        }
        self
    }

    #[must_use]
    pub fn unresolved_generics(mut self) -> Self {
        if let Some(shape) = self.shape() {
            shape.generic_params_unresolved = true;
        }
        self
    }

    #[must_use]
    pub fn member(self, member: MemberBuilder) -> Self {
        self.registry.attach(&self.ty, member);
        self
    }

    #[must_use]
    pub fn ty(&self) -> Ty {
        self.ty.clone()
    }
}

enum PendingKind {
    Ready(HostMemberKind),
    Method(OverloadBuilder),
    Constructor(OverloadBuilder),
}

/// Describes one member before it is attached to a type.
pub struct MemberBuilder {
    name: Arc<str>,
    is_static: bool,
    visibility: Visibility,
    no_side_effects: bool,
    kind: PendingKind,
}

impl MemberBuilder {
    fn new(name: &str, kind: PendingKind) -> Self {
        Self {
            name: Arc::from(name),
            is_static: false,
            visibility: Visibility::Public,
            no_side_effects: false,
            kind,
        }
    }

    #[must_use]
    pub fn field(name: &str, ty: Ty) -> Self {
        Self::new(
            name,
            PendingKind::Ready(HostMemberKind::Field {
                ty,
                read_only: false,
                literal: None,
            }),
        )
    }

    #[must_use]
    pub fn literal(name: &str, value: ConstValue) -> Self {
        let mut builder = Self::new(
            name,
            PendingKind::Ready(HostMemberKind::Field {
                ty: value.ty(),
                read_only: true,
                literal: Some(value),
            }),
        );
        builder.is_static = true;
        builder
    }

    #[must_use]
    pub fn property(name: &str, ty: Ty) -> Self {
        Self::new(
            name,
            PendingKind::Ready(HostMemberKind::Property {
                ty,
                getter: Some(Accessor::PUBLIC),
                setter: Some(Accessor::PUBLIC),
                deleter: None,
                index_params: Vec::new(),
            }),
        )
    }

    /// Indexed property (`this[...]`), named after the type's default member.
    #[must_use]
    pub fn indexer(name: &str, ty: Ty, index_params: Vec<ParamInfo>) -> Self {
        Self::new(
            name,
            PendingKind::Ready(HostMemberKind::Property {
                ty,
                getter: Some(Accessor::PUBLIC),
                setter: Some(Accessor::PUBLIC),
                deleter: None,
                index_params,
            }),
        )
    }

    #[must_use]
    pub fn method(overload: OverloadBuilder) -> Self {
        let name = Arc::clone(&overload.name);
        let is_static = overload.is_static;
        let no_side_effects = overload.no_side_effects;
        let mut builder = Self::new(&name, PendingKind::Method(overload));
        builder.is_static = is_static;
        builder.no_side_effects = no_side_effects;
        builder
    }

    #[must_use]
    pub fn constructor(overload: OverloadBuilder) -> Self {
        Self::new(".ctor", PendingKind::Constructor(overload))
    }

    #[must_use]
    pub fn event(name: &str, handler: Ty) -> Self {
        Self::new(name, PendingKind::Ready(HostMemberKind::Event { handler }))
    }

    #[must_use]
    pub fn nested_type(name: &str, ty: Ty) -> Self {
        let mut builder = Self::new(name, PendingKind::Ready(HostMemberKind::NestedType(ty)));
        builder.is_static = true;
        builder
    }

    #[must_use]
    pub fn custom(name: &str, ty: Ty, capabilities: Capabilities) -> Self {
        Self::new(
            name,
            PendingKind::Ready(HostMemberKind::Custom { ty, capabilities }),
        )
    }

    #[must_use]
    pub fn static_(mut self) -> Self {
        self.is_static = true;
        if let PendingKind::Method(overload) = &mut self.kind {
            overload.is_static = true;
        }
        self
    }

    #[must_use]
    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    #[must_use]
    pub fn pure(mut self) -> Self {
        self.no_side_effects = true;
        if let PendingKind::Method(overload) = &mut self.kind {
            overload.no_side_effects = true;
        }
        self
    }

    #[must_use]
    pub fn read_only(mut self) -> Self {
        if let PendingKind::Ready(HostMemberKind::Field { read_only, .. }) = &mut self.kind {
            *read_only = true;
        }
        if let PendingKind::Ready(HostMemberKind::Property { setter, .. }) = &mut self.kind {
            *setter = None;
        }
        self
    }

    #[must_use]
    pub fn private_setter(mut self) -> Self {
        if let PendingKind::Ready(HostMemberKind::Property { setter, .. }) = &mut self.kind {
            *setter = Some(Accessor::PRIVATE);
        }
        self
    }

    #[must_use]
    pub fn write_only(mut self) -> Self {
        if let PendingKind::Ready(HostMemberKind::Property { getter, .. }) = &mut self.kind {
            *getter = None;
        }
        self
    }

    #[must_use]
    pub fn deletable(mut self) -> Self {
        if let PendingKind::Ready(HostMemberKind::Property { deleter, .. }) = &mut self.kind {
            *deleter = Some(Accessor::PUBLIC);
        }
        self
    }
}

/// Describes one overload of a method or constructor.
pub struct OverloadBuilder {
    name: Arc<str>,
    params: Vec<ParamInfo>,
    ret: Ty,
    is_static: bool,
    generic_arity: usize,
    no_side_effects: bool,
    explicit_conversion: bool,
}

impl OverloadBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            params: Vec::new(),
            ret: Ty::Void,
            is_static: false,
            generic_arity: 0,
            no_side_effects: false,
            explicit_conversion: false,
        }
    }

    #[must_use]
    pub fn param(mut self, name: &str, ty: Ty) -> Self {
        self.params.push(ParamInfo::new(name, ty));
        self
    }

    #[must_use]
    pub fn param_info(mut self, param: ParamInfo) -> Self {
        self.params.push(param);
        self
    }

    #[must_use]
    pub fn returns(mut self, ret: Ty) -> Self {
        self.ret = ret;
        self
    }

    #[must_use]
    pub fn static_(mut self) -> Self {
        self.is_static = true;
        self
    }

    #[must_use]
    pub fn generic(mut self, arity: usize) -> Self {
        self.generic_arity = arity;
        self
    }

    #[must_use]
    pub fn pure(mut self) -> Self {
        self.no_side_effects = true;
        self
    }

    #[must_use]
    pub fn explicit_conversion(mut self) -> Self {
        self.explicit_conversion = true;
        self
    }

    fn finish(self, id: MemberId, declaring: &Ty, is_static: bool, visibility: Visibility) -> Overload {
        Overload {
            id,
            name: self.name,
            declaring: declaring.clone(),
            params: self.params,
            ret: self.ret,
            is_static: is_static || self.is_static,
            visibility,
            generic_arity: self.generic_arity,
            no_side_effects: self.no_side_effects,
            explicit_conversion: self.explicit_conversion,
        }
    }
}

impl Capabilities {
    #[must_use]
    pub fn read_write() -> Self {
        Self {
            get: true,
            set: true,
            delete: false,
            invoke: false,
        }
    }
}

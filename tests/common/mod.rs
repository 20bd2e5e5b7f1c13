use std::sync::Arc;

use dynbind::metadata::{MemberBuilder, OverloadBuilder};
use dynbind::{BinderConfig, BoundValue, DefaultBinder, HostRegistry, MemberRef, Ty, Value};

/// Host model shared by the integration tests: an `Api` class with a pair of
/// static `f` overloads, an `Account` with a privately settable `Owner`, and a
/// `Point` with two integer fields.
pub fn registry() -> HostRegistry {
    let mut registry = HostRegistry::new();
    let _ = registry
        .class("Api")
        .member(MemberBuilder::method(
            OverloadBuilder::new("f")
                .static_()
                .param("value", Ty::I32)
                .returns(Ty::I32),
        ))
        .member(MemberBuilder::method(
            OverloadBuilder::new("f")
                .static_()
                .param("value", Ty::STR)
                .returns(Ty::STR),
        ));
    let _ = registry
        .class("Account")
        .member(MemberBuilder::property("Owner", Ty::STR).private_setter())
        .member(MemberBuilder::property("Balance", Ty::I32));
    let _ = registry
        .class("Point")
        .member(MemberBuilder::field("X", Ty::I32))
        .member(MemberBuilder::field("Y", Ty::I32));
    registry
}

#[allow(dead_code)]
pub fn binder() -> DefaultBinder {
    binder_with(BinderConfig::default())
}

#[allow(dead_code)]
pub fn binder_with(config: BinderConfig) -> DefaultBinder {
    DefaultBinder::with_config(Arc::new(registry()), config)
}

/// The method group `Api.f` as a runtime member value.
#[allow(dead_code)]
pub fn api_f(binder: &DefaultBinder) -> MemberRef {
    binder
        .catalog()
        .lookup(&Ty::named("Api"), "f")
        .into_iter()
        .next()
        .unwrap_or_else(|| panic!("Api.f is registered"))
}

#[allow(dead_code)]
pub fn object(index: usize, ty: &str, id: u64) -> BoundValue {
    BoundValue::input(index, Value::object(ty, id))
}

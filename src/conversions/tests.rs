use std::sync::Arc;

use super::*;
use crate::metadata::{HostRegistry, MemberBuilder, OverloadBuilder};
use crate::types::{ConstValue, Value};

fn catalog() -> Catalog {
    let mut registry = HostRegistry::new();
    let meters = Ty::named("Meters");
    let _ = registry
        .structure("Meters")
        .member(MemberBuilder::method(
            OverloadBuilder::new("op_Implicit")
                .static_()
                .param("value", meters.clone())
                .returns(Ty::Prim(Primitive::F64)),
        ))
        .member(MemberBuilder::method(
            OverloadBuilder::new("op_Explicit")
                .static_()
                .param("value", meters.clone())
                .returns(Ty::I32),
        ))
        .member(MemberBuilder::method(
            OverloadBuilder::new("ConvertToString")
                .static_()
                .explicit_conversion()
                .param("value", meters)
                .returns(Ty::STR),
        ));
    let _ = registry.class("Shape");
    let _ = registry.class("Circle").base(Ty::named("Shape"));
    Catalog::new(Arc::new(registry), false)
}

fn i32_input(value: i32) -> BoundValue {
    BoundValue::input(0, Value::i32(value))
}

#[test]
fn ranks_follow_the_documented_order() {
    let catalog = catalog();
    let resolver = ConversionResolver::new(&catalog, false);
    let i64 = Ty::Prim(Primitive::I64);
    let u8 = Ty::Prim(Primitive::U8);
    assert_eq!(resolver.classify(&Ty::I32, &Ty::I32), Some(ConversionRank::Identity));
    assert_eq!(
        resolver.classify(&Ty::named("Circle"), &Ty::named("Shape")),
        Some(ConversionRank::Identity)
    );
    assert_eq!(resolver.classify(&Ty::I32, &i64), Some(ConversionRank::NumericPromotion));
    assert_eq!(
        resolver.classify(&Ty::I32, &Ty::optional(Ty::I32)),
        Some(ConversionRank::OptionalWrap)
    );
    assert_eq!(
        resolver.classify(&Ty::wrapper(Ty::I32), &Ty::I32),
        Some(ConversionRank::WrapperUnwrap)
    );
    assert_eq!(
        resolver.classify(&Ty::named("Meters"), &Ty::Prim(Primitive::F64)),
        Some(ConversionRank::UserImplicit)
    );
    assert_eq!(resolver.classify(&i64, &u8), Some(ConversionRank::NumericNarrowing));
    assert_eq!(
        resolver.classify(&Ty::optional(Ty::I32), &Ty::I32),
        Some(ConversionRank::OptionalUnwrap)
    );
    assert_eq!(resolver.classify(&Ty::I32, &Ty::BOOL), Some(ConversionRank::BoolCoercion));
    assert_eq!(
        resolver.classify(&Ty::named("Meters"), &Ty::I32),
        Some(ConversionRank::UserExplicit)
    );
    assert_eq!(resolver.classify(&Ty::STR, &Ty::I32), None);
}

#[test]
fn explicit_only_conversions_never_serve_implicit_requests() {
    let catalog = catalog();
    let resolver = ConversionResolver::new(&catalog, false);
    let meters = BoundValue::input(0, Value::object("Meters", 1));
    assert!(
        resolver
            .convert_expr(&meters, &Ty::STR, ConversionMode::ImplicitRequired)
            .is_none()
    );
    assert_eq!(
        resolver.classify(&Ty::named("Meters"), &Ty::STR),
        Some(ConversionRank::UserExplicit)
    );
}

#[test]
fn narrowing_levels_gate_conversions() {
    let catalog = catalog();
    let resolver = ConversionResolver::new(&catalog, false);
    let i64 = Ty::Prim(Primitive::I64);
    assert!(resolver.can_convert(&Ty::I32, &i64, NarrowingLevel::None));
    assert!(!resolver.can_convert(&i64, &Ty::I32, NarrowingLevel::None));
    assert!(resolver.can_convert(&i64, &Ty::I32, NarrowingLevel::One));
    assert!(!resolver.can_convert(&Ty::I32, &Ty::BOOL, NarrowingLevel::Two));
    assert!(resolver.can_convert(&Ty::I32, &Ty::BOOL, NarrowingLevel::Three));
}

#[test]
fn identity_conversion_returns_the_value_under_a_type_guard() {
    let catalog = catalog();
    let resolver = ConversionResolver::new(&catalog, false);
    let rule = resolver.convert_to(&i32_input(4), &Ty::I32, ConversionMode::ImplicitRequired);
    assert_eq!(rule.outcome, crate::ir::Outcome::Value);
    assert_eq!(rule.body, Expr::convert(Expr::Input(0), Ty::I32));
    assert_eq!(rule.guards.len(), 1);
    assert!(rule.guards.holds(&[Value::i32(9)]));
    assert!(!rule.guards.holds(&[Value::str("nine")]));
}

#[test]
fn conversion_to_any_needs_no_cast() {
    let catalog = catalog();
    let resolver = ConversionResolver::new(&catalog, false);
    let rule = resolver.convert_to(&i32_input(4), &Ty::Any, ConversionMode::ImplicitRequired);
    assert_eq!(rule.body, Expr::Input(0));
    assert_eq!(rule.result_ty, Ty::Any);
}

#[test]
fn best_effort_failure_yields_boxed_default() {
    let catalog = catalog();
    let resolver = ConversionResolver::new(&catalog, false);
    let text = BoundValue::input(0, Value::str("abc"));
    let rule = resolver.convert_to(&text, &Ty::I32, ConversionMode::ExplicitBestEffort);
    assert_eq!(rule.body, Expr::convert(Expr::Default(Ty::I32), Ty::Any));
    assert_eq!(rule.result_ty, Ty::Any);
    assert!(!rule.is_thrown());
}

#[test]
fn required_failure_throws_conversion_not_possible() {
    let catalog = catalog();
    let resolver = ConversionResolver::new(&catalog, true);
    let text = BoundValue::input(0, Value::str("abc"));
    let rule = resolver.convert_to(&text, &Ty::I32, ConversionMode::ImplicitRequired);
    assert!(rule.is_thrown());
    let Expr::Throw {
        diagnostic, light, ..
    } = &rule.body
    else {
        panic!("expected a throw, found {:?}", rule.body);
    };
    assert!(*light);
    assert_eq!(diagnostic.code.code, crate::diagnostics::codes::CONVERSION_NOT_POSSIBLE);
}

#[test]
fn explicit_user_conversion_is_wrapped_in_best_effort_mode() {
    let catalog = catalog();
    let resolver = ConversionResolver::new(&catalog, false);
    let meters = BoundValue::input(0, Value::object("Meters", 1));
    let Some(Expr::TryDefault { body, ty }) =
        resolver.convert_expr(&meters, &Ty::I32, ConversionMode::ExplicitBestEffort)
    else {
        panic!("expected a guarded explicit conversion");
    };
    assert_eq!(ty, Ty::I32);
    assert!(matches!(*body, Expr::Call { ref callee, .. } if &*callee.name == "op_Explicit"));
    let Some(Expr::Call { callee, .. }) =
        resolver.convert_expr(&meters, &Ty::I32, ConversionMode::ExplicitRequired)
    else {
        panic!("expected a plain explicit conversion call");
    };
    assert_eq!(&*callee.name, "op_Explicit");
}

#[test]
fn wrapper_payload_is_unwrapped() {
    let catalog = catalog();
    let resolver = ConversionResolver::new(&catalog, false);
    let wrapped = BoundValue::input(
        0,
        Value::Wrapped {
            inner: Ty::I32,
            value: Box::new(Value::i32(3)),
        },
    );
    let converted = resolver.convert_expr(&wrapped, &Ty::I32, ConversionMode::ImplicitRequired);
    assert_eq!(
        converted,
        Some(Expr::WrapperValue(Box::new(Expr::convert(
            Expr::Input(0),
            Ty::wrapper(Ty::I32)
        ))))
    );
}

#[test]
fn null_converts_to_empty_optional_and_references() {
    let catalog = catalog();
    let resolver = ConversionResolver::new(&catalog, false);
    let null = BoundValue::constant(ConstValue::Null);
    assert_eq!(
        resolver.convert_expr(&null, &Ty::optional(Ty::I32), ConversionMode::ImplicitRequired),
        Some(Expr::Default(Ty::optional(Ty::I32)))
    );
    assert!(
        resolver
            .convert_expr(&null, &Ty::named("Shape"), ConversionMode::ImplicitRequired)
            .is_some()
    );
    assert!(
        resolver
            .convert_expr(&null, &Ty::I32, ConversionMode::ImplicitRequired)
            .is_none()
    );
}

#[test]
fn explicit_numeric_narrowing_casts() {
    let catalog = catalog();
    let resolver = ConversionResolver::new(&catalog, false);
    let wide = BoundValue::input(0, Value::Const(ConstValue::int(Primitive::I64, 7)));
    let u8 = Ty::Prim(Primitive::U8);
    assert!(
        resolver
            .convert_expr(&wide, &u8, ConversionMode::ImplicitRequired)
            .is_none()
    );
    assert_eq!(
        resolver.convert_expr(&wide, &u8, ConversionMode::ExplicitRequired),
        Some(Expr::convert(
            Expr::convert(Expr::Input(0), Ty::Prim(Primitive::I64)),
            u8
        ))
    );
}

#[test]
fn widening_into_an_optional_is_a_narrowing_level_conversion() {
    let catalog = catalog();
    let resolver = ConversionResolver::new(&catalog, false);
    let i64 = Ty::Prim(Primitive::I64);
    let target = Ty::optional(i64.clone());
    assert_eq!(
        resolver.classify(&Ty::I32, &target),
        Some(ConversionRank::NumericNarrowing)
    );
    assert!(!resolver.can_convert(&Ty::I32, &target, NarrowingLevel::None));
    assert!(
        resolver
            .convert_expr(&i32_input(4), &target, ConversionMode::ImplicitRequired)
            .is_none()
    );
    assert_eq!(
        resolver.convert_expr(&i32_input(4), &target, ConversionMode::ExplicitRequired),
        Some(Expr::convert(
            Expr::convert(Expr::convert(Expr::Input(0), Ty::I32), i64),
            target
        ))
    );
}

#[test]
fn optional_unwrap_converts_explicitly() {
    let catalog = catalog();
    let resolver = ConversionResolver::new(&catalog, false);
    let maybe = BoundValue::new(Expr::Input(0), Ty::optional(Ty::I32));
    assert!(
        resolver
            .convert_expr(&maybe, &Ty::I32, ConversionMode::ImplicitRequired)
            .is_none()
    );
    assert_eq!(
        resolver.convert_expr(&maybe, &Ty::I32, ConversionMode::ExplicitRequired),
        Some(Expr::convert(Expr::Input(0), Ty::I32))
    );
}

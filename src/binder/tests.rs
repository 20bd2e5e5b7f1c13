use super::*;

use expect_test::expect;

use crate::catalog::MemberDescriptor;
use crate::conversions::ConversionMode;
use crate::diagnostics::codes;
use crate::ir::{Outcome, TempId};
use crate::metadata::{HostRegistry, MemberBuilder, OverloadBuilder, ParamInfo};
use crate::overloads::CallShape;
use crate::types::{ConstValue, Value};

fn registry() -> HostRegistry {
    let point = || Ty::named("Point");
    let mut registry = HostRegistry::new();
    let _ = registry
        .class("Point")
        .member(MemberBuilder::field("X", Ty::I32))
        .member(MemberBuilder::field("Y", Ty::I32))
        .member(MemberBuilder::property("Name", Ty::STR).private_setter())
        .member(MemberBuilder::property("Label", Ty::STR).read_only())
        .member(MemberBuilder::property("Tag", Ty::STR).deletable())
        .member(MemberBuilder::method(
            OverloadBuilder::new("Move").param("dx", Ty::I32).returns(point()),
        ))
        .member(MemberBuilder::method(
            OverloadBuilder::new("Origin").static_().returns(point()),
        ))
        .member(MemberBuilder::constructor(
            OverloadBuilder::new(".ctor")
                .param("x", Ty::I32)
                .param("y", Ty::I32),
        ));
    let _ = registry
        .class("Bag")
        .member(MemberBuilder::property("Count", Ty::I32).read_only())
        .member(MemberBuilder::method(
            OverloadBuilder::new("GetCustomMember")
                .param("name", Ty::STR)
                .returns(Ty::Any),
        ))
        .member(MemberBuilder::indexer(
            "Item",
            Ty::I32,
            vec![ParamInfo::new("key", Ty::STR)],
        ));
    let _ = registry.delegate("Callback").member(MemberBuilder::method(
        OverloadBuilder::new("Invoke").param("x", Ty::I32).returns(Ty::I32),
    ));
    let _ = registry
        .structure("Meters")
        .member(MemberBuilder::method(
            OverloadBuilder::new("op_Addition")
                .static_()
                .param("left", Ty::named("Meters"))
                .param("right", Ty::named("Meters"))
                .returns(Ty::named("Meters")),
        ))
        .member(MemberBuilder::method(
            OverloadBuilder::new("op_Addition")
                .static_()
                .param("left", Ty::I32)
                .param("right", Ty::named("Meters"))
                .returns(Ty::named("Meters")),
        ));
    let _ = registry.class("Version").member(MemberBuilder::method(
        OverloadBuilder::new("Compare")
            .param("other", Ty::named("Version"))
            .returns(Ty::I32),
    ));
    let _ = registry.class("Flag").member(MemberBuilder::method(
        OverloadBuilder::new("op_Equality")
            .static_()
            .param("left", Ty::named("Flag"))
            .param("right", Ty::named("Flag"))
            .returns(Ty::BOOL),
    ));
    let _ = registry
        .class("Record")
        .member(MemberBuilder::property("Known", Ty::I32))
        .member(MemberBuilder::method(
            OverloadBuilder::new("SetMember")
                .param("name", Ty::STR)
                .param("value", Ty::Any)
                .returns(Ty::BOOL),
        ))
        .member(MemberBuilder::method(
            OverloadBuilder::new("GetBoundMember")
                .param("name", Ty::STR)
                .returns(Ty::Any),
        ))
        .member(MemberBuilder::method(
            OverloadBuilder::new("DeleteMember")
                .param("name", Ty::STR)
                .returns(Ty::Void),
        ));
    let _ = registry.class("Sink").member(MemberBuilder::method(
        OverloadBuilder::new("SetMemberAfter")
            .param("name", Ty::STR)
            .param("value", Ty::Any)
            .returns(Ty::Void),
    ));
    let _ = registry
        .class("Config")
        .member(MemberBuilder::property("Version", Ty::STR).static_())
        .member(MemberBuilder::property("Title", Ty::STR))
        .member(MemberBuilder::field("Value", Ty::I32));
    let _ = registry.class("Settings").base(Ty::named("Config"));
    let _ = registry
        .class("Pool")
        .unresolved_generics()
        .member(MemberBuilder::field("Shared", Ty::I32).static_());
    let _ = registry.class("Functor").member(MemberBuilder::method(
        OverloadBuilder::new("Call").param("x", Ty::I32).returns(Ty::STR),
    ));
    registry
}

fn binder() -> DefaultBinder {
    DefaultBinder::with_config(Arc::new(registry()), BinderConfig::default())
}

fn point(index: usize) -> BoundValue {
    BoundValue::input(index, Value::object("Point", 1))
}

fn int(index: usize, value: i32) -> BoundValue {
    BoundValue::input(index, Value::i32(value))
}

fn text(index: usize, value: &str) -> BoundValue {
    BoundValue::input(index, Value::str(value))
}

fn thrown_code(rule: &BoundRule) -> &str {
    let Expr::Throw { diagnostic, .. } = &rule.body else {
        panic!("expected a throw, found {}", rule.body);
    };
    &diagnostic.code.code
}

fn thrown_message(rule: &BoundRule) -> &str {
    let Expr::Throw { diagnostic, .. } = &rule.body else {
        panic!("expected a throw, found {}", rule.body);
    };
    &diagnostic.message
}

fn object(index: usize, ty: &str) -> BoundValue {
    BoundValue::input(index, Value::object(ty, 1))
}

fn type_value(index: usize, ty: &str) -> BoundValue {
    BoundValue::input(index, Value::Type(Ty::named(ty)))
}

#[test]
fn field_read_is_guarded_on_the_receiver_type() {
    let binder = binder();
    let rule = binder
        .resolve_get("X", &point(0), &ErrorPolicy::Throw)
        .expect("get binds");
    assert_eq!(rule.outcome, Outcome::Value);
    assert_eq!(rule.result_ty, Ty::I32);
    assert!(matches!(&rule.body, Expr::Field { field, .. } if &*field.name == "X"));
    assert!(rule.guards.holds(&[Value::object("Point", 7)]));
    assert!(!rule.guards.holds(&[Value::object("Bag", 7)]));
}

#[test]
fn missing_member_throws_member_not_found() {
    let binder = binder();
    let rule = binder
        .resolve_get("Z", &point(0), &ErrorPolicy::Throw)
        .expect("get binds");
    assert!(rule.is_thrown());
    assert_eq!(thrown_code(&rule), codes::MEMBER_NOT_FOUND);
}

#[test]
fn no_throw_get_yields_the_failure_sentinel() {
    let binder = binder();
    let action = BinderAction::GetMember {
        name: Arc::from("Z"),
        mode: FailureMode::NoThrow,
    };
    let rule = binder.bind(&action, &[point(0)]).expect("get binds");
    assert!(!rule.is_thrown());
    assert_eq!(rule.body, Expr::OperationFailed);
}

#[test]
fn fallback_rule_replaces_the_failure_under_receiver_guards() {
    let binder = binder();
    let fallback = BoundRule::value(Expr::Constant(ConstValue::i32(7)), Ty::I32);
    let rule = binder
        .resolve_get("Z", &point(0), &ErrorPolicy::Fallback(Box::new(fallback)))
        .expect("get binds");
    assert_eq!(rule.body, Expr::Constant(ConstValue::i32(7)));
    assert_eq!(rule.result_ty, Ty::I32);
    assert!(!rule.guards.is_empty());
}

#[test]
fn custom_member_hook_runs_before_standard_lookup() {
    let binder = binder();
    let bag = BoundValue::input(0, Value::object("Bag", 2));
    let rule = binder
        .resolve_get("Count", &bag, &ErrorPolicy::Throw)
        .expect("get binds");
    let Expr::Condition {
        test, otherwise, ..
    } = &rule.body
    else {
        panic!("expected a hook condition, found {}", rule.body);
    };
    assert!(test.to_string().contains("GetCustomMember("));
    assert!(matches!(otherwise.as_ref(), Expr::Call { callee, .. } if &*callee.name == "get_Count"));
    assert_eq!(rule.temps, vec![TempId::new("getVal")]);
    assert_eq!(rule.result_ty, Ty::Any);
}

#[test]
fn unknown_operands_defer() {
    let binder = binder();
    let unknown = BoundValue::new(Expr::Input(0), Ty::Any);
    let rule = binder
        .resolve_get("X", &unknown, &ErrorPolicy::Throw)
        .expect("get binds");
    assert!(rule.is_deferred());
    let rule = binder
        .resolve_operation(Operator::Add, &[int(0, 1), BoundValue::new(Expr::Input(1), Ty::Any)], &ErrorPolicy::Throw)
        .expect("operation binds");
    assert!(rule.is_deferred());
}

#[test]
fn field_assignment_converts_the_value() {
    let binder = binder();
    let rule = binder
        .resolve_set("X", &point(0), &int(1, 5), &ErrorPolicy::Throw)
        .expect("set binds");
    assert!(matches!(rule.body, Expr::Assign { .. }));
    assert!(rule.guards.holds(&[Value::object("Point", 1), Value::i32(9)]));
    assert!(!rule.guards.holds(&[Value::object("Point", 1), Value::str("9")]));
}

#[test]
fn private_setter_reports_read_only() {
    let binder = binder();
    let rule = binder
        .resolve_set("Name", &point(0), &text(1, "p"), &ErrorPolicy::Throw)
        .expect("set binds");
    assert!(rule.is_thrown());
    assert_eq!(thrown_code(&rule), codes::READ_ONLY_MEMBER);
}

#[test]
fn private_binding_opens_private_setters() {
    let config = BinderConfig::default().with_private_binding(true);
    let binder = DefaultBinder::with_config(Arc::new(registry()), config);
    let rule = binder
        .resolve_set("Name", &point(0), &text(1, "p"), &ErrorPolicy::Throw)
        .expect("set binds");
    assert!(!rule.is_thrown());
    assert!(rule.body.to_string().contains("set_Name"));
}

#[test]
fn methods_cannot_be_assigned() {
    let binder = binder();
    let rule = binder
        .resolve_set("Move", &point(0), &int(1, 1), &ErrorPolicy::Throw)
        .expect("set binds");
    assert_eq!(thrown_code(&rule), codes::READ_ONLY_MEMBER);
}

#[test]
fn delete_calls_the_deleter_or_reports_not_deletable() {
    let binder = binder();
    let rule = binder
        .resolve_delete("Tag", &point(0), &ErrorPolicy::Throw)
        .expect("delete binds");
    assert!(matches!(&rule.body, Expr::Call { callee, .. } if &*callee.name == "delete_Tag"));
    let rule = binder
        .resolve_delete("X", &point(0), &ErrorPolicy::Throw)
        .expect("delete binds");
    assert_eq!(thrown_code(&rule), codes::NOT_DELETABLE);
}

#[test]
fn delegate_invocation_calls_invoke() {
    let binder = binder();
    let callback = BoundValue::input(0, Value::object("Callback", 3));
    let rule = binder
        .resolve_invoke(&callback, &[int(1, 2)], &CallShape::positional(1), &ErrorPolicy::Throw)
        .expect("invoke binds");
    assert_eq!(rule.result_ty, Ty::I32);
    assert!(matches!(&rule.body, Expr::Call { callee, .. } if &*callee.name == "Invoke"));
}

#[test]
fn call_hook_makes_instances_callable() {
    let binder = binder();
    let functor = BoundValue::input(0, Value::object("Functor", 4));
    let rule = binder
        .resolve_invoke(&functor, &[int(1, 2)], &CallShape::positional(1), &ErrorPolicy::Throw)
        .expect("invoke binds");
    assert_eq!(rule.result_ty, Ty::STR);
    assert!(matches!(&rule.body, Expr::Call { callee, .. } if &*callee.name == "Call"));
}

#[test]
fn static_method_value_is_invoked_without_receiver() {
    let binder = binder();
    let origin = binder.catalog().lookup(&Ty::named("Point"), "Origin")[0].clone();
    let target = BoundValue::input(0, Value::Member(origin));
    let rule = binder
        .resolve_invoke(&target, &[], &CallShape::positional(0), &ErrorPolicy::Throw)
        .expect("invoke binds");
    assert_eq!(rule.result_ty, Ty::named("Point"));
    assert!(matches!(&rule.body, Expr::Call { target: None, .. }));
}

#[test]
fn bound_method_value_calls_through_the_captured_instance() {
    let binder = binder();
    let group = binder.catalog().lookup(&Ty::named("Point"), "Move")[0].clone();
    let bound = MemberDescriptor::bind_to_instance(&group, point(1).restrict());
    let target = BoundValue::input(0, Value::Member(bound));
    let rule = binder
        .resolve_invoke(&target, &[int(2, 3)], &CallShape::positional(1), &ErrorPolicy::Throw)
        .expect("invoke binds");
    assert_eq!(rule.result_ty, Ty::named("Point"));
    assert!(rule.body.to_string().contains("instance($0)"));
}

#[test]
fn invoking_a_number_is_not_callable() {
    let binder = binder();
    let rule = binder
        .resolve_invoke(&int(0, 1), &[], &CallShape::positional(0), &ErrorPolicy::Throw)
        .expect("invoke binds");
    assert_eq!(thrown_code(&rule), codes::NOT_CALLABLE);
}

#[test]
fn create_resolves_constructors_without_receiver() {
    let binder = binder();
    let ty = BoundValue::input(0, Value::Type(Ty::named("Point")));
    let rule = binder
        .resolve_create(&ty, &[int(1, 1), int(2, 2)], &CallShape::positional(2), &ErrorPolicy::Throw)
        .expect("create binds");
    assert_eq!(rule.result_ty, Ty::named("Point"));
    assert!(matches!(&rule.body, Expr::New { callee: Some(_), args, .. } if args.len() == 2));
    assert!(rule.guards.holds(&[Value::Type(Ty::named("Point")), Value::i32(3), Value::i32(4)]));
    assert!(!rule.guards.holds(&[Value::Type(Ty::named("Bag")), Value::i32(3), Value::i32(4)]));
}

#[test]
fn value_types_without_constructors_build_defaults() {
    let binder = binder();
    let ty = BoundValue::input(0, Value::Type(Ty::named("Meters")));
    let rule = binder
        .resolve_create(&ty, &[], &CallShape::positional(0), &ErrorPolicy::Throw)
        .expect("create binds");
    assert!(matches!(&rule.body, Expr::New { callee: None, .. }));
}

#[test]
fn best_effort_conversion_of_text_to_int_yields_default() {
    let binder = binder();
    let rule = binder.resolve_convert(&text(0, "abc"), &Ty::I32, ConversionMode::ExplicitBestEffort);
    assert!(!rule.is_thrown());
    assert_eq!(rule.body, Expr::convert(Expr::Default(Ty::I32), Ty::Any));
}

#[test]
fn required_conversion_failure_throws() {
    let binder = binder();
    let action = BinderAction::Convert {
        to: Ty::I32,
        mode: ConversionMode::ImplicitRequired,
    };
    let rule = binder.bind(&action, &[text(0, "abc")]).expect("convert binds");
    assert_eq!(thrown_code(&rule), codes::CONVERSION_NOT_POSSIBLE);
}

#[test]
fn primitive_addition_keeps_the_operand_type() {
    let binder = binder();
    let rule = binder
        .resolve_operation(Operator::Add, &[int(0, 1), int(1, 2)], &ErrorPolicy::Throw)
        .expect("operation binds");
    assert_eq!(rule.result_ty, Ty::I32);
    assert_eq!(rule.body.to_string(), "(($0 as i32) + ($1 as i32))");
    assert_eq!(rule.guards.len(), 2);
}

#[test]
fn user_operator_is_preferred_over_primitives() {
    let binder = binder();
    let left = BoundValue::input(0, Value::object("Meters", 1));
    let right = BoundValue::input(1, Value::object("Meters", 2));
    let rule = binder
        .resolve_operation(Operator::Add, &[left, right], &ErrorPolicy::Throw)
        .expect("operation binds");
    assert_eq!(rule.result_ty, Ty::named("Meters"));
    assert!(matches!(&rule.body, Expr::Call { callee, .. } if &*callee.name == "op_Addition"));
}

#[test]
fn mismatched_operands_report_bad_operands() {
    let binder = binder();
    let args = [text(0, "a"), BoundValue::input(1, Value::Const(ConstValue::Bool(true)))];
    let rule = binder
        .resolve_operation(Operator::Add, &args, &ErrorPolicy::Throw)
        .expect("operation binds");
    assert_eq!(thrown_code(&rule), codes::BAD_OPERANDS);
    let rule = binder
        .resolve_operation(Operator::Add, &args, &ErrorPolicy::NoThrow)
        .expect("operation binds");
    assert_eq!(rule.body, Expr::OperationFailed);
}

#[test]
fn reference_compares_against_null() {
    let binder = binder();
    let null = BoundValue::constant(ConstValue::Null);
    let rule = binder
        .resolve_operation(Operator::Equal, &[point(0), null], &ErrorPolicy::Throw)
        .expect("operation binds");
    assert_eq!(rule.result_ty, Ty::BOOL);
    assert_eq!(rule.body.to_string(), "(($0 as Point) == null)");
}

#[test]
fn unary_operators_on_primitives() {
    let binder = binder();
    let rule = binder
        .resolve_operation(Operator::Negate, &[int(0, 4)], &ErrorPolicy::Throw)
        .expect("operation binds");
    assert_eq!(rule.result_ty, Ty::I32);
    assert_eq!(rule.body.to_string(), "(-($0 as i32))");
    let truth = BoundValue::input(0, Value::Const(ConstValue::Bool(false)));
    let rule = binder
        .resolve_operation(Operator::IsTrue, &[truth], &ErrorPolicy::Throw)
        .expect("operation binds");
    assert_eq!(rule.result_ty, Ty::BOOL);
}

#[test]
fn array_elements_are_read_directly() {
    let binder = binder();
    let array = BoundValue::input(
        0,
        Value::Array {
            element: Ty::I32,
            items: vec![Value::i32(1), Value::i32(2)],
        },
    );
    let rule = binder
        .resolve_get_index(&array, &[int(1, 0)], &ErrorPolicy::Throw)
        .expect("index binds");
    assert_eq!(rule.result_ty, Ty::I32);
    assert!(matches!(rule.body, Expr::ArrayIndex { .. }));
}

#[test]
fn indexer_get_and_set_call_the_accessors() {
    let binder = binder();
    let bag = BoundValue::input(0, Value::object("Bag", 2));
    let rule = binder
        .resolve_get_index(&bag, &[text(1, "k")], &ErrorPolicy::Throw)
        .expect("index binds");
    assert_eq!(rule.result_ty, Ty::I32);
    assert!(matches!(&rule.body, Expr::Call { callee, .. } if &*callee.name == "get_Item"));

    let rule = binder
        .resolve_set_index(&bag, &[text(1, "k")], &int(2, 5), &ErrorPolicy::Throw)
        .expect("index binds");
    assert!(!rule.is_thrown());
    assert_eq!(rule.temps, vec![TempId::new("arg2Temp")]);
    assert!(rule.body.to_string().contains("set_Item"));
}

#[test]
fn types_without_indexers_report_the_missing_member() {
    let binder = binder();
    let rule = binder
        .resolve_get_index(&point(0), &[int(1, 0)], &ErrorPolicy::Throw)
        .expect("index binds");
    assert_eq!(thrown_code(&rule), codes::MEMBER_NOT_FOUND);
}

#[test]
fn bind_checks_operand_count() {
    let binder = binder();
    let err = binder
        .bind(&BinderAction::set_member("X"), &[point(0)])
        .expect_err("arity mismatch");
    assert!(matches!(err, Error::Internal { .. }));
}

#[test]
fn actions_describe_their_operands() {
    let invoke = BinderAction::Invoke {
        shape: CallShape::positional(2),
    };
    assert_eq!(invoke.arity(), 3);
    assert_eq!(invoke.to_string(), "invoke(_, _)");
    assert_eq!(BinderAction::SetIndex { indices: 1 }.arity(), 3);
    assert_eq!(
        BinderAction::Operate {
            op: Operator::Negate
        }
        .arity(),
        1
    );
    let quiet = BinderAction::GetMember {
        name: Arc::from("X"),
        mode: FailureMode::NoThrow,
    };
    assert_eq!(quiet.to_string(), "get? X");
}

#[test]
fn conditional_builder_folds_branches_right_to_left() {
    let registry = registry();
    let mut builder = ConditionalBuilder::new();
    builder.add_condition(
        Expr::Constant(ConstValue::Bool(true)),
        BoundRule::value(Expr::Constant(ConstValue::i32(1)), Ty::I32),
    );
    builder.add_temp(TempId::new("t"));
    builder.add_temp(TempId::new("t"));
    builder.finish_condition(BoundRule::value(Expr::Constant(ConstValue::i32(2)), Ty::I32));
    assert!(builder.is_finished());
    let rule = builder.finalize(&registry).expect("finished builder");
    assert_eq!(rule.result_ty, Ty::I32);
    assert_eq!(rule.temps.len(), 1);
    assert_eq!(rule.body.to_string(), "(if true then 1_i32 else 2_i32)");

    let err = ConditionalBuilder::new()
        .finalize(&registry)
        .expect_err("no final branch");
    assert!(matches!(err, Error::Internal { .. }));
}

#[test]
fn introspection_reports_names_and_signatures() {
    let binder = binder();
    let names = binder.member_names(&point(0));
    assert!(names.value.iter().any(|name| &**name == "Move"));
    assert!(names.value.iter().any(|name| &**name == "X"));
    assert!(names.guards.holds(&[Value::object("Point", 1)]));

    let callback = BoundValue::input(0, Value::object("Callback", 3));
    assert!(binder.is_callable(&callback).value);
    assert_eq!(binder.call_signatures(&callback).value, vec!["i32 x".to_string()]);
    assert!(!binder.is_callable(&int(0, 1)).value);
}

#[test]
fn light_exceptions_mark_thrown_failures() {
    let config = BinderConfig::default().with_light_exceptions(true);
    let binder = DefaultBinder::with_config(Arc::new(registry()), config);
    let rule = binder
        .resolve_get("Z", &point(0), &ErrorPolicy::Throw)
        .expect("get binds");
    assert!(matches!(rule.body, Expr::Throw { light: true, .. }));
}

#[test]
fn comparison_falls_back_to_the_compare_member() {
    let binder = binder();
    let rule = binder
        .resolve_operation(Operator::LessThan, &[object(0, "Version"), object(1, "Version")], &ErrorPolicy::Throw)
        .expect("operation binds");
    assert_eq!(rule.result_ty, Ty::BOOL);
    let Expr::Binary {
        op, left, right, ..
    } = &rule.body
    else {
        panic!("expected a comparison, found {}", rule.body);
    };
    assert_eq!(*op, Operator::LessThan);
    assert!(left.to_string().contains("Compare("), "{left}");
    assert_eq!(right.as_ref(), &Expr::Constant(ConstValue::i32(0)));
    assert!(rule.guards.holds(&[Value::object("Version", 1), Value::object("Version", 2)]));
    assert!(!rule.guards.holds(&[Value::object("Version", 1), Value::object("Flag", 2)]));
}

#[test]
fn comparison_negates_the_inverted_operator() {
    let binder = binder();
    let rule = binder
        .resolve_operation(Operator::NotEqual, &[object(0, "Flag"), object(1, "Flag")], &ErrorPolicy::Throw)
        .expect("operation binds");
    assert_eq!(rule.result_ty, Ty::BOOL);
    let Expr::Unary { op, operand } = &rule.body else {
        panic!("expected a negation, found {}", rule.body);
    };
    assert_eq!(*op, Operator::Not);
    assert!(matches!(operand.as_ref(), Expr::Call { callee, .. } if &*callee.name == "op_Equality"));
}

#[test]
fn reverse_operator_is_found_on_the_second_operand() {
    let binder = binder();
    let rule = binder
        .resolve_operation(Operator::Add, &[int(0, 2), object(1, "Meters")], &ErrorPolicy::Throw)
        .expect("operation binds");
    assert_eq!(rule.result_ty, Ty::named("Meters"));
    let Expr::Call { callee, args, .. } = &rule.body else {
        panic!("expected an operator call, found {}", rule.body);
    };
    assert_eq!(&*callee.name, "op_Addition");
    assert_eq!(args.len(), 2);
    assert!(rule.guards.holds(&[Value::i32(5), Value::object("Meters", 3)]));
    assert!(!rule.guards.holds(&[Value::str("5"), Value::object("Meters", 3)]));
}

#[test]
fn set_member_hook_reporting_bool_guards_the_standard_assignment() {
    let binder = binder();
    let rule = binder
        .resolve_set("Known", &object(0, "Record"), &int(1, 4), &ErrorPolicy::Throw)
        .expect("set binds");
    let Expr::Condition {
        test,
        then,
        otherwise,
        ..
    } = &rule.body
    else {
        panic!("expected a hook condition, found {}", rule.body);
    };
    assert!(test.to_string().contains("SetMember("), "{test}");
    assert_eq!(then.as_ref(), &Expr::Temp(TempId::new("setValue")));
    assert!(otherwise.to_string().contains("set_Known"), "{otherwise}");
    assert_eq!(rule.temps, vec![TempId::new("setValue")]);
}

#[test]
fn set_member_after_hook_handles_unknown_members() {
    let binder = binder();
    let rule = binder
        .resolve_set("Anything", &object(0, "Sink"), &text(1, "v"), &ErrorPolicy::Throw)
        .expect("set binds");
    assert!(!rule.is_thrown());
    let Expr::Block { body, .. } = &rule.body else {
        panic!("expected the hook block, found {}", rule.body);
    };
    assert!(body[1].to_string().contains("SetMemberAfter("), "{}", body[1]);
    assert_eq!(body.last(), Some(&Expr::Temp(TempId::new("setValue"))));
    assert_eq!(rule.temps, vec![TempId::new("setValue")]);

    let rule = binder
        .resolve_set("Anything", &point(0), &text(1, "v"), &ErrorPolicy::Throw)
        .expect("set binds");
    assert_eq!(thrown_code(&rule), codes::MEMBER_NOT_FOUND);
}

#[test]
fn bound_member_hook_runs_when_lookup_finds_nothing() {
    let binder = binder();
    let rule = binder
        .resolve_get("Missing", &object(0, "Record"), &ErrorPolicy::Throw)
        .expect("get binds");
    let Expr::Condition {
        test, otherwise, ..
    } = &rule.body
    else {
        panic!("expected a hook condition, found {}", rule.body);
    };
    assert!(test.to_string().contains("GetBoundMember("), "{test}");
    let Expr::Throw { diagnostic, .. } = otherwise.as_ref() else {
        panic!("expected a throw, found {otherwise}");
    };
    assert_eq!(diagnostic.code.code, codes::MEMBER_NOT_FOUND);
    assert_eq!(rule.temps, vec![TempId::new("getVal")]);

    // Found members never consult the hook.
    let rule = binder
        .resolve_get("Known", &object(0, "Record"), &ErrorPolicy::Throw)
        .expect("get binds");
    assert!(matches!(&rule.body, Expr::Call { callee, .. } if &*callee.name == "get_Known"));
}

#[test]
fn delete_member_hook_replaces_not_deletable() {
    let binder = binder();
    let rule = binder
        .resolve_delete("Known", &object(0, "Record"), &ErrorPolicy::Throw)
        .expect("delete binds");
    assert_eq!(rule.result_ty, Ty::Void);
    let Expr::Call { callee, args, .. } = &rule.body else {
        panic!("expected the hook call, found {}", rule.body);
    };
    assert_eq!(&*callee.name, "DeleteMember");
    assert_eq!(args[0], Expr::Constant(ConstValue::str("Known")));
}

#[test]
fn static_property_reads_through_an_instance_but_cannot_be_assigned_there() {
    let binder = binder();
    let rule = binder
        .resolve_get("Version", &object(0, "Config"), &ErrorPolicy::Throw)
        .expect("get binds");
    assert!(matches!(&rule.body, Expr::Call { target: None, callee, .. } if &*callee.name == "get_Version"));

    let rule = binder
        .resolve_set("Version", &object(0, "Config"), &text(1, "2"), &ErrorPolicy::Throw)
        .expect("set binds");
    assert_eq!(thrown_code(&rule), codes::STATIC_INSTANCE_MISMATCH);
    expect!["static property `Version` of `Config` cannot be assigned through an instance"]
        .assert_eq(thrown_message(&rule));
}

#[test]
fn instance_members_need_an_instance() {
    let binder = binder();
    let rule = binder
        .resolve_get("Title", &type_value(0, "Config"), &ErrorPolicy::Throw)
        .expect("get binds");
    assert_eq!(thrown_code(&rule), codes::STATIC_INSTANCE_MISMATCH);
    expect!["instance property `Title` of `Config` cannot be read without an instance"]
        .assert_eq(thrown_message(&rule));

    let rule = binder
        .resolve_get("Value", &type_value(0, "Config"), &ErrorPolicy::Throw)
        .expect("get binds");
    assert_eq!(thrown_code(&rule), codes::MISSING_INSTANCE);
    expect!["`Config::Value` is an instance member and requires an instance"]
        .assert_eq(thrown_message(&rule));
}

#[test]
fn statics_of_open_generic_types_are_unresolved() {
    let binder = binder();
    let rule = binder
        .resolve_get("Shared", &type_value(0, "Pool"), &ErrorPolicy::Throw)
        .expect("get binds");
    assert_eq!(thrown_code(&rule), codes::GENERIC_PARAMETERS_UNRESOLVED);
    expect!["cannot access `Shared` on `Pool`: generic parameters are unresolved"]
        .assert_eq(thrown_message(&rule));
}

#[test]
fn static_assignment_through_a_derived_type_is_rejected() {
    let binder = binder();
    let rule = binder
        .resolve_get("Version", &type_value(0, "Settings"), &ErrorPolicy::Throw)
        .expect("get binds");
    assert!(!rule.is_thrown());

    let rule = binder
        .resolve_set("Version", &type_value(0, "Settings"), &text(1, "2"), &ErrorPolicy::Throw)
        .expect("set binds");
    assert_eq!(thrown_code(&rule), codes::STATIC_INSTANCE_MISMATCH);
    expect!["static member `Version` of `Config` cannot be assigned through derived type `Settings`"]
        .assert_eq(thrown_message(&rule));

    let rule = binder
        .resolve_set("Version", &type_value(0, "Config"), &text(1, "2"), &ErrorPolicy::Throw)
        .expect("set binds");
    assert!(!rule.is_thrown());
    assert!(rule.body.to_string().contains("set_Version"));
}

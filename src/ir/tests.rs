use super::*;

use expect_test::expect;

use crate::types::{Primitive, Value};

fn point_rule() -> BoundRule {
    let mut guards = GuardSet::new();
    guards.push(Guard::TypeExact {
        target: Expr::Input(0),
        ty: Ty::named("Point"),
    });
    guards.push(Guard::NotNull {
        target: Expr::Input(1),
    });
    let temp = TempId::new("sum");
    BoundRule {
        body: Expr::block(
            vec![temp.clone()],
            vec![
                Expr::assign(
                    Expr::Temp(temp.clone()),
                    Expr::binary(
                        Operator::Add,
                        Expr::convert(Expr::Input(1), Ty::I32),
                        Expr::Constant(ConstValue::i32(1)),
                    ),
                ),
                Expr::Temp(temp.clone()),
            ],
        ),
        result_ty: Ty::I32,
        guards,
        outcome: Outcome::Value,
        temps: vec![temp],
    }
}

#[test]
fn renders_rules_for_dumps() {
    expect![[r#"
        rule value -> i32
          guard typeof($0) == Point
          guard $1 != null
          temp %sum
          body { let %sum; %sum = (($1 as i32) + 1_i32); %sum }"#]]
    .assert_eq(&render_rule(&point_rule()));
}

#[test]
fn text_compiler_counts_what_it_compiles() {
    let mut compiler = TextCompiler::default();
    let rule = point_rule();
    let first = compiler.compile(&rule).expect("compiles");
    let _ = compiler.compile(&rule).expect("compiles");
    assert_eq!(first, render_rule(&rule));
    assert_eq!(compiler.compiled(), 2);
}

#[test]
fn guard_sets_drop_duplicates_and_keep_order() {
    let by_type = Guard::TypeExact {
        target: Expr::Input(0),
        ty: Ty::I32,
    };
    let not_null = Guard::NotNull {
        target: Expr::Input(1),
    };
    let mut left = GuardSet::single(by_type.clone());
    left.push(by_type.clone());
    assert_eq!(left.len(), 1);

    let right = GuardSet::single(not_null.clone());
    let merged = right.merge(&left);
    assert_eq!(merged.iter().cloned().collect::<Vec<_>>(), vec![not_null, by_type]);
}

#[test]
fn guards_evaluate_against_site_inputs() {
    let inputs = [
        Value::object("Point", 7),
        Value::Array {
            element: Ty::I32,
            items: vec![Value::i32(1), Value::str("two")],
        },
        Value::Map(vec![
            (Arc::from("b"), Value::i32(2)),
            (Arc::from("a"), Value::null()),
        ]),
    ];
    let holds = |guard: Guard| guard.holds(&inputs);

    assert!(holds(Guard::TypeExact {
        target: Expr::Input(0),
        ty: Ty::named("Point"),
    }));
    assert!(holds(Guard::Instance {
        target: Expr::Input(0),
        key: crate::types::InstanceKey::Object(7),
    }));
    assert!(!holds(Guard::Instance {
        target: Expr::Input(0),
        key: crate::types::InstanceKey::Object(8),
    }));
    assert!(holds(Guard::Length {
        target: Expr::Input(1),
        len: 2,
    }));
    assert!(holds(Guard::TypeExact {
        target: Expr::ArrayIndex {
            array: Box::new(Expr::Input(1)),
            index: Box::new(Expr::Constant(ConstValue::i32(1))),
        },
        ty: Ty::STR,
    }));
    assert!(holds(Guard::Keys {
        target: Expr::Input(2),
        keys: vec![Arc::from("a"), Arc::from("b")],
    }));
    assert!(!holds(Guard::NotNull {
        target: Expr::MapGet {
            map: Box::new(Expr::Input(2)),
            key: Arc::from("a"),
        },
    }));
    assert!(!holds(Guard::NotNull {
        target: Expr::Input(3),
    }));
    assert!(holds(Guard::Test(Expr::Constant(ConstValue::Bool(true)))));
    assert!(!holds(Guard::Test(Expr::Variable(Arc::from("flag")))));
}

#[test]
fn continuation_markers_are_replaced_inside_branches() {
    let body = Expr::Condition {
        test: Box::new(Expr::TypeIs {
            value: Box::new(Expr::Input(0)),
            ty: Ty::STR,
        }),
        then: Box::new(Expr::convert(Expr::Input(0), Ty::STR)),
        otherwise: Box::new(Expr::ContinueResolution),
        ty: Ty::Any,
    };
    let replaced = body.replace_continuation(&Expr::Default(Ty::STR));
    assert_eq!(
        replaced.to_string(),
        "(if ($0 is string) then ($0 as string) else default(string))"
    );
}

#[test]
fn restricting_an_operand_pins_its_runtime_type() {
    let operand = BoundValue::input(0, Value::i32(5));
    let restricted = operand.restrict();
    assert_eq!(restricted.static_ty, Ty::I32);
    assert_eq!(restricted.expr.to_string(), "($0 as i32)");
    assert!(restricted.guards.contains(&Guard::TypeExact {
        target: Expr::Input(0),
        ty: Ty::I32,
    }));

    let constant = BoundValue::constant(ConstValue::int(Primitive::I64, 3));
    assert!(constant.type_guard().is_none());
    assert!(constant.restrict().guards.is_empty());
    assert!(BoundValue::new(Expr::Input(1), Ty::Any).needs_deferral());
}

#[test]
fn deferred_rules_keep_the_guards_seen_so_far() {
    let guards = GuardSet::single(Guard::NotNull {
        target: Expr::Input(0),
    });
    let rule = BoundRule::defer(guards.clone());
    assert!(rule.is_deferred());
    assert_eq!(rule.guards, guards);
    assert_eq!(rule.as_bound_value().expr, Expr::ContinueResolution);
}

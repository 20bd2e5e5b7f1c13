use std::hint::black_box;
use std::sync::Arc;

use criterion::{Criterion, criterion_group, criterion_main};

use dynbind::fusion::{FusionArg, FusionNode, bind_combo, fuse};
use dynbind::metadata::{MemberBuilder, OverloadBuilder};
use dynbind::types::Primitive;
use dynbind::{
    BinderAction, BinderConfig, BoundValue, CallShape, ConstValue, DefaultBinder, ErrorPolicy,
    Expr, HostRegistry, Operator, Ty, Value,
};

const PARAM_TYPES: [Ty; 4] = [
    Ty::I32,
    Ty::Prim(Primitive::I64),
    Ty::Prim(Primitive::F64),
    Ty::STR,
];

fn binder() -> DefaultBinder {
    let mut registry = HostRegistry::new();
    let mut class = registry.class("Api");
    for first in &PARAM_TYPES {
        for second in &PARAM_TYPES {
            class = class.member(MemberBuilder::method(
                OverloadBuilder::new("Mix")
                    .static_()
                    .param("first", first.clone())
                    .param("second", second.clone())
                    .returns(first.clone()),
            ));
        }
    }
    let _ = registry
        .class("Point")
        .member(MemberBuilder::field("X", Ty::I32))
        .member(MemberBuilder::field("Y", Ty::I32));
    DefaultBinder::with_config(Arc::new(registry), BinderConfig::default())
}

fn bench_invoke(c: &mut Criterion) {
    let binder = binder();
    let Some(group) = binder.catalog().lookup(&Ty::named("Api"), "Mix").into_iter().next() else {
        panic!("Api.Mix is registered");
    };
    let target = BoundValue::input(0, Value::Member(group));
    let args = [
        BoundValue::input(1, Value::i32(3)),
        BoundValue::input(2, Value::Const(ConstValue::int(Primitive::I64, 4))),
    ];
    let shape = CallShape::positional(2);

    c.bench_function("invoke_sixteen_overloads", |b| {
        b.iter(|| {
            binder
                .resolve_invoke(black_box(&target), black_box(&args), &shape, &ErrorPolicy::Throw)
                .expect("invoke binds")
        });
    });
}

fn bench_member_access(c: &mut Criterion) {
    let binder = binder();
    let action = BinderAction::get_member("X");
    let args = [BoundValue::input(0, Value::object("Point", 1))];

    c.bench_function("get_field", |b| {
        b.iter(|| binder.bind(black_box(&action), black_box(&args)).expect("get binds"));
    });
}

fn bench_fused_sum(c: &mut Criterion) {
    let binder = binder();
    let a = || FusionArg::Expr(Expr::Variable("a".into()));
    let site = fuse(FusionNode::new(
        BinderAction::Operate { op: Operator::Add },
        vec![
            FusionNode::new(BinderAction::get_member("X"), vec![a()]).into(),
            FusionNode::new(BinderAction::get_member("Y"), vec![a()]).into(),
        ],
    ));
    let inputs = [BoundValue::input(0, Value::object("Point", 1))];

    c.bench_function("combo_sum_of_fields", |b| {
        b.iter(|| bind_combo(&binder, black_box(&site.plan), black_box(&inputs)).expect("combo binds"));
    });
}

criterion_group!(benches, bench_invoke, bench_member_access, bench_fused_sum);
criterion_main!(benches);

use super::*;
use crate::types::Primitive;

fn sample() -> HostRegistry {
    let mut registry = HostRegistry::new();
    let _ = registry.interface("IShape");
    let _ = registry
        .class("Shape")
        .implements(Ty::named("IShape"))
        .member(MemberBuilder::property("Area", Ty::Prim(Primitive::F64)));
    let _ = registry.class("Circle").base(Ty::named("Shape"));
    let _ = registry.structure("Money");
    registry
}

#[test]
fn lineage_walks_bases_then_interfaces_then_any() {
    let registry = sample();
    let hierarchy = TypeHierarchy::new(&registry);
    assert_eq!(
        hierarchy.lineage(&Ty::named("Circle")),
        vec![
            Ty::named("Circle"),
            Ty::named("Shape"),
            Ty::named("IShape"),
            Ty::Any
        ]
    );
}

#[test]
fn null_is_assignable_only_to_reference_types() {
    let registry = sample();
    let hierarchy = TypeHierarchy::new(&registry);
    assert!(hierarchy.is_assignable(&Ty::Null, &Ty::named("Shape")));
    assert!(hierarchy.is_assignable(&Ty::Null, &Ty::STR));
    assert!(!hierarchy.is_assignable(&Ty::Null, &Ty::named("Money")));
    assert!(!hierarchy.is_assignable(&Ty::Null, &Ty::I32));
}

#[test]
fn arrays_are_covariant_for_reference_elements() {
    let registry = sample();
    let hierarchy = TypeHierarchy::new(&registry);
    assert!(hierarchy.is_assignable(
        &Ty::array(Ty::named("Circle")),
        &Ty::array(Ty::named("Shape"))
    ));
    assert!(!hierarchy.is_assignable(&Ty::array(Ty::I32), &Ty::array(Ty::Any)));
}

#[test]
fn common_ancestor_prefers_shared_base() {
    let registry = sample();
    assert_eq!(
        common_ancestor(&registry, &[Ty::named("Circle"), Ty::named("Shape")]),
        Ty::named("Shape")
    );
    assert_eq!(
        common_ancestor(&registry, &[Ty::named("Circle"), Ty::Null]),
        Ty::named("Circle")
    );
    assert_eq!(common_ancestor(&registry, &[Ty::I32, Ty::STR]), Ty::Any);
}

#[test]
fn members_receive_distinct_ids_and_declaring_type() {
    let registry = sample();
    let members = registry.declared_members(&Ty::named("Shape"));
    assert_eq!(members.len(), 1);
    assert_eq!(members[0].declaring, Ty::named("Shape"));
    assert!(registry.is_value_type(&Ty::named("Money")));
    assert!(!registry.is_value_type(&Ty::named("Shape")));
    assert_eq!(&*registry.default_member(&Ty::named("Shape")), "Item");
}

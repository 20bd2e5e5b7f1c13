use super::*;
use crate::metadata::{HostRegistry, MemberBuilder, OverloadBuilder};

fn registry() -> HostRegistry {
    let mut registry = HostRegistry::new();
    let _ = registry
        .class("Animal")
        .member(MemberBuilder::method(
            OverloadBuilder::new("Speak").returns(Ty::STR),
        ))
        .member(MemberBuilder::method(
            OverloadBuilder::new("Speak")
                .param("times", Ty::I32)
                .returns(Ty::STR),
        ))
        .member(MemberBuilder::property("Name", Ty::STR))
        .member(MemberBuilder::field("secret", Ty::I32).private());
    let _ = registry
        .class("Dog")
        .base(Ty::named("Animal"))
        .member(MemberBuilder::method(
            OverloadBuilder::new("Speak").returns(Ty::STR),
        ))
        .member(MemberBuilder::property("Name", Ty::STR))
        .member(MemberBuilder::method(
            OverloadBuilder::new("Fetch").generic(1).returns(Ty::Any),
        ))
        .member(MemberBuilder::method(
            OverloadBuilder::new("Fetch").returns(Ty::Any),
        ));
    let _ = registry.add_source(&["Zoo.Animals.Dog", "Zoo.Keeper", "Zoo.Animals"]);
    let _ = registry.add_source(&["Zoo.Keeper"]);
    registry
}

fn catalog(private_binding: bool) -> Catalog {
    Catalog::new(Arc::new(registry()), private_binding)
}

#[test]
fn lookup_returns_most_derived_members_first() {
    let catalog = catalog(false);
    let found = catalog.lookup(&Ty::named("Dog"), "Name");
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].declaring(), &Ty::named("Dog"));
    assert_eq!(found[1].declaring(), &Ty::named("Animal"));
}

#[test]
fn methods_collapse_into_one_group_with_hidden_base_overloads() {
    let catalog = catalog(false);
    let found = catalog.lookup(&Ty::named("Dog"), "Speak");
    assert_eq!(found.len(), 1);
    let Some(group) = found[0].as_method_group() else {
        panic!("expected a method group, found {:?}", found[0].kind());
    };
    let owners: Vec<_> = group
        .overloads()
        .iter()
        .map(|overload| (overload.declaring.to_string(), overload.params.len()))
        .collect();
    assert_eq!(owners, vec![("Dog".to_string(), 0), ("Animal".to_string(), 1)]);
}

#[test]
fn descriptors_are_identity_cached() {
    let catalog = catalog(false);
    let first = catalog.lookup(&Ty::named("Dog"), "Name");
    let second = catalog.lookup(&Ty::named("Dog"), "Name");
    assert!(Arc::ptr_eq(&first[0], &second[0]));
    let group_a = catalog.lookup(&Ty::named("Dog"), "Speak");
    let group_b = catalog.lookup(&Ty::named("Dog"), "Speak");
    assert!(Arc::ptr_eq(&group_a[0], &group_b[0]));
    assert_eq!(group_a[0].key(), group_b[0].key());
}

#[test]
fn same_member_through_different_types_gets_distinct_descriptors() {
    let catalog = catalog(false);
    let via_dog = catalog.lookup(&Ty::named("Dog"), "Name");
    let via_animal = catalog.lookup(&Ty::named("Animal"), "Name");
    assert_ne!(via_dog[1].key(), via_animal[0].key());
}

#[test]
fn private_members_require_private_binding() {
    assert!(catalog(false).lookup(&Ty::named("Animal"), "secret").is_empty());
    assert_eq!(catalog(true).lookup(&Ty::named("Animal"), "secret").len(), 1);
}

#[test]
fn member_names_are_sorted_and_unique() {
    let names = catalog(false).member_names(&Ty::named("Dog"));
    let names: Vec<&str> = names.iter().map(|name| &**name).collect();
    assert_eq!(names, vec!["Fetch", "Name", "Speak"]);
}

#[test]
fn make_generic_filters_by_arity_and_caches() {
    let catalog = catalog(false);
    let group = catalog.lookup(&Ty::named("Dog"), "Fetch").remove(0);
    let Some(generic) = group.make_generic(&[Ty::STR]) else {
        panic!("expected a generic instantiation");
    };
    let Some(again) = group.make_generic(&[Ty::STR]) else {
        panic!("expected a cached instantiation");
    };
    assert!(Arc::ptr_eq(&generic, &again));
    let Some(inner) = generic.as_method_group() else {
        panic!("expected a method group, found {:?}", generic.kind());
    };
    assert_eq!(inner.overloads().len(), 1);
    assert_eq!(inner.type_args(), &[Ty::STR]);
    assert!(group.make_generic(&[Ty::STR, Ty::I32]).is_none());
}

#[test]
fn namespaces_resolve_lazily_and_types_win_over_namespaces() {
    let catalog = catalog(false);
    let Some(zoo) = catalog.namespace_member("", "Zoo") else {
        panic!("expected namespace Zoo");
    };
    assert!(matches!(zoo.kind(), MemberKind::Namespace(path) if &**path == "Zoo"));
    // `Zoo.Animals` is both a namespace and a type; the type wins.
    let Some(animals) = catalog.namespace_member("Zoo", "Animals") else {
        panic!("expected Zoo.Animals");
    };
    assert!(matches!(animals.kind(), MemberKind::NestedType(ty) if *ty == Ty::named("Zoo.Animals")));
    assert!(catalog.namespace_member("Zoo", "Missing").is_none());
}

#[test]
fn same_named_types_from_several_sources_merge_into_a_group() {
    let catalog = catalog(false);
    let Some(keeper) = catalog.namespace_member("Zoo", "Keeper") else {
        panic!("expected Zoo.Keeper");
    };
    let MemberKind::TypeGroup(tys) = keeper.kind() else {
        panic!("expected a type group, found {:?}", keeper.kind());
    };
    assert_eq!(tys.len(), 2);
    let names = catalog.namespace_member_names("Zoo");
    let names: Vec<&str> = names.iter().map(|name| &**name).collect();
    assert_eq!(names, vec!["Animals", "Keeper"]);
}

#[test]
fn identity_is_stable_and_order_sensitive() {
    assert_eq!(identity(&["a", "b"]), identity(&["a", "b"]));
    assert_ne!(identity(&["a", "b"]), identity(&["b", "a"]));
    assert_ne!(identity(&["ab"]), identity(&["a", "b"]));
}

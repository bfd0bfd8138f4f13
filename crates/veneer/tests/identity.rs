//! What a delegator claims to be: class, type predicates, equality and case matching.

use pretty_assertions::assert_eq;
use veneer::{ArgValues, ClassId, Runtime, Value};

/// A `Coffee` instance wrapped once in `Wrapper`.
struct Fixture {
    rt: Runtime,
    coffee: ClassId,
    wrapper: ClassId,
    target: Value,
    proxy: Value,
}

fn fixture() -> Fixture {
    let mut rt = Runtime::new();
    let coffee = rt.define_class("Coffee", None).unwrap();
    let wrapper = rt.define_delegator_class("Wrapper").unwrap();
    let target = rt.instantiate(coffee, ArgValues::new()).unwrap();
    let proxy = rt.wrap(wrapper, target.clone()).unwrap();
    Fixture {
        rt,
        coffee,
        wrapper,
        target,
        proxy,
    }
}

#[test]
fn class_is_the_target_class() {
    let Fixture {
        mut rt, coffee, proxy, ..
    } = fixture();
    assert_eq!(rt.call(&proxy, "class", ArgValues::new()).unwrap(), Value::Class(coffee));
    assert_eq!(rt.reported_class(&proxy).unwrap(), coffee);
    // the real class is still the wrapper
    assert_eq!(rt.class_name_of(&proxy).unwrap(), "Wrapper");
}

#[test]
fn type_predicates_accept_target_and_wrapper_classes() {
    let Fixture {
        mut rt,
        coffee,
        wrapper,
        proxy,
        ..
    } = fixture();
    let core = *rt.core();

    assert!(rt.is_a(&proxy, coffee).unwrap());
    assert!(rt.is_a(&proxy, wrapper).unwrap());
    assert!(rt.is_a(&proxy, core.delegator).unwrap());
    assert!(rt.kind_of(&proxy, core.object).unwrap());
    assert!(!rt.is_a(&proxy, core.string).unwrap());

    assert!(rt.instance_of(&proxy, coffee).unwrap());
    assert!(rt.instance_of(&proxy, wrapper).unwrap());
    assert!(rt.instance_of(&proxy, core.delegator).unwrap());
    assert!(rt.instance_of(&proxy, core.basic_object).unwrap());
    // Object is outside the wrapper chain and Coffee is not an exact Object
    assert!(!rt.instance_of(&proxy, core.object).unwrap());
    assert!(!rt.instance_of(&proxy, core.string).unwrap());
}

#[test]
fn nested_wrappers_answer_for_every_layer() {
    let Fixture {
        mut rt,
        coffee,
        wrapper,
        proxy,
        ..
    } = fixture();
    let outer_class = rt.define_delegator_class("Outer").unwrap();
    let outer = rt.wrap(outer_class, proxy).unwrap();

    assert!(rt.is_a(&outer, outer_class).unwrap());
    assert!(rt.is_a(&outer, wrapper).unwrap());
    assert!(rt.is_a(&outer, coffee).unwrap());

    let identity = rt.type_identity(&outer).unwrap();
    let core = *rt.core();
    assert_eq!(identity.reported, coffee);
    assert_eq!(identity.ancestors, vec![coffee, core.object, core.basic_object]);
    assert_eq!(identity.wrapper_layers, vec![outer_class, wrapper]);
    assert!(identity.includes(wrapper));
    assert!(identity.includes(core.object));
    assert!(!identity.includes(core.string));
}

#[test]
fn equality_forwards_and_identity_stays_with_the_proxy() {
    let mut rt = Runtime::new();
    let wrapper = rt.define_delegator_class("Wrapper").unwrap();
    let target = Value::str("latte");
    let proxy = rt.wrap(wrapper, target.clone()).unwrap();

    assert!(rt.equals(&proxy, &Value::str("latte")).unwrap());
    assert_eq!(
        rt.call(&proxy, "eql?", [Value::str("latte")].into()).unwrap(),
        Value::Bool(true)
    );
    assert!(!rt.same_object(&proxy, &target).unwrap());
    assert!(rt.same_object(&proxy, &proxy).unwrap());

    let proxy_hash = rt.call(&proxy, "hash", ArgValues::new()).unwrap();
    let target_hash = rt.call(&target, "hash", ArgValues::new()).unwrap();
    assert_eq!(proxy_hash, target_hash);

    assert_eq!(
        rt.call(&proxy, "__id__", ArgValues::new()).unwrap(),
        Value::Int(proxy.object_id())
    );
    assert_eq!(rt.object_id(&proxy).unwrap(), proxy.object_id());
    assert_ne!(rt.object_id(&proxy).unwrap(), target.object_id());
}

#[test]
fn plain_targets_compare_by_identity() {
    let Fixture {
        mut rt, target, proxy, ..
    } = fixture();
    // the target's `==` asks whether the argument is itself
    assert!(rt.equals(&proxy, &target).unwrap());
    assert!(!rt.equals(&target, &proxy).unwrap());
}

#[test]
fn ordering_forwards() {
    let mut rt = Runtime::new();
    let wrapper = rt.define_delegator_class("Wrapper").unwrap();
    let three = rt.wrap(wrapper, Value::Int(3)).unwrap();

    assert_eq!(rt.call(&three, "<=>", [Value::Int(5)].into()).unwrap(), Value::Int(-1));
    assert_eq!(rt.call(&three, "<", [Value::Int(5)].into()).unwrap(), Value::Bool(true));
}

#[test]
fn class_case_match_uses_the_real_class() {
    let Fixture {
        mut rt,
        coffee,
        wrapper,
        proxy,
        ..
    } = fixture();
    let core = *rt.core();

    assert!(!rt.case_match(&Value::Class(coffee), &proxy).unwrap());
    assert!(rt.case_match(&Value::Class(wrapper), &proxy).unwrap());
    assert!(rt.case_match(&Value::Class(core.delegator), &proxy).unwrap());
    assert!(rt.case_match(&Value::Class(core.basic_object), &proxy).unwrap());
}

#[test]
fn extended_classes_match_their_wrapped_instances() {
    let Fixture {
        mut rt, coffee, proxy, ..
    } = fixture();
    rt.extend_case_match(coffee).unwrap();
    assert!(rt.case_match(&Value::Class(coffee), &proxy).unwrap());

    let espresso = rt.define_class("Espresso", Some(coffee)).unwrap();
    let shot = rt.instantiate(espresso, ArgValues::new()).unwrap();
    let wrapper = rt.class_named("Wrapper").unwrap();
    let wrapped_shot = rt.wrap(wrapper, shot).unwrap();
    assert!(rt.case_match(&Value::Class(espresso), &wrapped_shot).unwrap());
    assert!(!rt.case_match(&Value::Class(espresso), &proxy).unwrap());

    let core = *rt.core();
    assert!(!rt.case_match(&Value::Class(core.string), &proxy).unwrap());
}

#[test]
fn instance_case_match_forwards() {
    let mut rt = Runtime::new();
    let wrapper = rt.define_delegator_class("Wrapper").unwrap();
    let five = rt.wrap(wrapper, Value::Int(5)).unwrap();

    assert!(rt.case_match(&five, &Value::Int(5)).unwrap());
    assert!(!rt.case_match(&five, &Value::Int(6)).unwrap());
}

#[test]
fn frozen_state_is_the_targets() {
    let Fixture {
        mut rt, target, proxy, ..
    } = fixture();
    assert_eq!(rt.call(&proxy, "frozen?", ArgValues::new()).unwrap(), Value::Bool(false));
    rt.call(&proxy, "freeze", ArgValues::new()).unwrap();
    assert_eq!(rt.call(&target, "frozen?", ArgValues::new()).unwrap(), Value::Bool(true));
    assert_eq!(rt.call(&proxy, "frozen?", ArgValues::new()).unwrap(), Value::Bool(true));
}

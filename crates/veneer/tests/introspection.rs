//! Method listings, `respond_to?`, `Method` objects and layer reports on delegators.

use pretty_assertions::assert_eq;
use veneer::{ArgValues, ClassId, ExcType, LayerReport, Runtime, Value};

/// `Coffee` with `cost`, `origin` and a private `recipe`.
fn coffee_class(rt: &mut Runtime) -> ClassId {
    let coffee = rt.define_class("Coffee", None).unwrap();
    rt.define_method(coffee, "cost", |_, _| Ok(Value::Int(2))).unwrap();
    rt.define_method(coffee, "origin", |_, _| Ok(Value::str("Colombia"))).unwrap();
    rt.define_private_method(coffee, "recipe", |_, _| Ok(Value::str("secret"))).unwrap();
    coffee
}

/// `Milk` overrides `cost` and adds `milk_type`.
fn milk_class(rt: &mut Runtime) -> ClassId {
    let milk = rt.define_delegator_class("Milk").unwrap();
    rt.define_method(milk, "cost", |rt, frame| {
        let inner = rt.call_super(frame, ArgValues::new())?;
        rt.call(&inner, "+", [Value::Float(0.4)].into())
    })
    .unwrap();
    rt.define_method(milk, "milk_type", |_, _| Ok(Value::symbol("oat"))).unwrap();
    milk
}

fn with_milk(rt: &mut Runtime) -> Value {
    let coffee = coffee_class(rt);
    let milk = milk_class(rt);
    let target = rt.instantiate(coffee, ArgValues::new()).unwrap();
    rt.wrap(milk, target).unwrap()
}

#[test]
fn methods_lists_target_operations_first_then_the_wrappers() {
    let mut rt = Runtime::new();
    let proxy = with_milk(&mut rt);

    let names = rt.available_operations(&proxy).unwrap();
    let leading: Vec<&str> = names.iter().take(2).map(String::as_str).collect();
    assert_eq!(leading, vec!["cost", "origin"]);
    for expected in ["milk_type", "class", "to_s", "__getobj__", "__setobj__", "object_id"] {
        assert!(names.contains(expected), "missing {expected}");
    }
    assert!(!names.contains("recipe"));
    assert!(!names.contains("method_missing"));

    let listed = rt.call(&proxy, "methods", ArgValues::new()).unwrap();
    let listed = listed.as_array().unwrap();
    assert_eq!(listed.len(), names.len());
    assert_eq!(listed.iter().filter(|name| name.as_name() == Some("cost")).count(), 1);
}

#[test]
fn respond_to_matches_dispatch() {
    let mut rt = Runtime::new();
    let proxy = with_milk(&mut rt);

    assert!(rt.responds_to(&proxy, "cost", false).unwrap());
    assert!(rt.responds_to(&proxy, "origin", false).unwrap());
    assert!(rt.responds_to(&proxy, "milk_type", false).unwrap());
    assert!(rt.responds_to(&proxy, "__getobj__", false).unwrap());
    assert!(!rt.responds_to(&proxy, "fly", false).unwrap());

    assert!(!rt.responds_to(&proxy, "recipe", false).unwrap());
    assert!(rt.responds_to(&proxy, "recipe", true).unwrap());
}

#[test]
fn method_objects_stay_bound_to_the_proxy() {
    let mut rt = Runtime::new();
    let proxy = with_milk(&mut rt);
    let milk = rt.class_named("Milk").unwrap();

    let origin = rt.method_object(&proxy, "origin").unwrap();
    assert_eq!(rt.call(&origin, "receiver", ArgValues::new()).unwrap(), proxy);
    assert_eq!(rt.call(&origin, "name", ArgValues::new()).unwrap(), Value::symbol("origin"));
    assert_eq!(rt.call(&origin, "owner", ArgValues::new()).unwrap(), Value::Nil);
    assert_eq!(rt.call(&origin, "call", ArgValues::new()).unwrap(), Value::str("Colombia"));
    assert_eq!(rt.inspect(&origin).unwrap(), "#<Method: Milk#origin>");

    let cost = rt.method_object(&proxy, "cost").unwrap();
    assert_eq!(rt.call(&cost, "owner", ArgValues::new()).unwrap(), Value::Class(milk));
    assert_eq!(rt.call(&cost, "call", ArgValues::new()).unwrap(), Value::Float(2.4));

    let err = rt.method_object(&proxy, "fly").unwrap_err();
    assert_eq!(err.exc_type(), ExcType::NotFound);
}

#[test]
fn layer_report_splits_wrapper_operations() {
    let mut rt = Runtime::new();
    let proxy = with_milk(&mut rt);

    assert_eq!(
        rt.layer_report(&proxy).unwrap(),
        LayerReport {
            wrapper_only: vec!["milk_type".to_owned()],
            shared: vec!["cost".to_owned()],
        }
    );
}

#[test]
fn layer_report_works_through_nested_wrappers() {
    let mut rt = Runtime::new();
    let inner = with_milk(&mut rt);
    let sugar = rt.define_delegator_class("Sugar").unwrap();
    rt.define_method(sugar, "sweetness", |_, _| Ok(Value::Int(1))).unwrap();
    rt.define_method(sugar, "milk_type", |_, _| Ok(Value::symbol("none"))).unwrap();
    let outer = rt.wrap(sugar, inner).unwrap();
    rt.define_singleton_method(&outer, "cost", |_, _| Ok(Value::Int(0))).unwrap();

    assert_eq!(
        rt.layer_report(&outer).unwrap(),
        LayerReport {
            wrapper_only: vec!["sweetness".to_owned()],
            shared: vec!["cost".to_owned(), "milk_type".to_owned()],
        }
    );
}

#[test]
fn layer_report_rejects_plain_objects() {
    let mut rt = Runtime::new();
    let coffee = coffee_class(&mut rt);
    let plain = rt.instantiate(coffee, ArgValues::new()).unwrap();

    let err = rt.layer_report(&plain).unwrap_err();
    assert_eq!(err.exc_type(), ExcType::TypeError);
    assert_eq!(err.message(), Some("Coffee is not a delegator"));
}

#[test]
fn inspect_shows_wrapper_and_target() {
    let mut rt = Runtime::new();
    let wrapper = rt.define_delegator_class("Wrapper").unwrap();
    let proxy = rt.wrap(wrapper, Value::str("latte")).unwrap();

    assert_eq!(
        rt.inspect(&proxy).unwrap(),
        format!("#<Wrapper:{} obj: \"latte\">", proxy.object_id())
    );

    let outer = rt.wrap(wrapper, proxy.clone()).unwrap();
    assert_eq!(
        rt.inspect(&outer).unwrap(),
        format!(
            "#<Wrapper:{} obj: #<Wrapper:{} obj: \"latte\">>",
            outer.object_id(),
            proxy.object_id()
        )
    );
}

#[test]
fn instance_methods_lists_own_definitions() {
    let mut rt = Runtime::new();
    with_milk(&mut rt);
    let milk = rt.class_named("Milk").unwrap();

    let own = rt
        .call(&Value::Class(milk), "instance_methods", [Value::Bool(false)].into())
        .unwrap();
    assert_eq!(own, Value::array(vec![Value::symbol("cost"), Value::symbol("milk_type")]));
    assert_eq!(
        rt.call(&Value::Class(milk), "method_defined?", [Value::symbol("__getobj__")].into())
            .unwrap(),
        Value::Bool(true)
    );
    assert_eq!(
        rt.call(&Value::Class(milk), "method_defined?", [Value::symbol("to_s")].into())
            .unwrap(),
        Value::Bool(false)
    );
}

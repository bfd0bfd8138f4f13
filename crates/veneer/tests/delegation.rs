//! Forwarding, overriding and super fall-through on delegators.
//!
//! These tests drive wrappers the way a decorator is normally used: a plain
//! `Coffee` object at the bottom, wrapper classes layered on top that
//! override a few operations and forward the rest.

use pretty_assertions::assert_eq;
use veneer::{ArgValues, ClassId, ExcType, Exception, Runtime, Value};

/// Defines `Coffee` with `cost`, `origin`, a block-taking `brew`, a raising `spill`
/// and a private `recipe`.
fn coffee_class(rt: &mut Runtime) -> ClassId {
    let coffee = rt.define_class("Coffee", None).unwrap();
    rt.define_method(coffee, "cost", |_, _| Ok(Value::Int(2))).unwrap();
    rt.define_method(coffee, "origin", |_, _| Ok(Value::str("Colombia"))).unwrap();
    rt.define_method(coffee, "brew", |rt, frame| {
        let block = frame.args().require_block("brew")?.clone();
        let cups = frame
            .arg(0)
            .and_then(Value::as_int)
            .ok_or_else(|| Exception::runtime_error("cups must be an Integer"))?;
        block(rt, [Value::Int(cups * 2), Value::str("hot")].into())
    })
    .unwrap();
    rt.define_method(coffee, "spill", |_, _| Err(Exception::runtime_error("too hot to hold")))
        .unwrap();
    rt.define_private_method(coffee, "recipe", |_, _| Ok(Value::str("secret"))).unwrap();
    coffee
}

/// Defines a wrapper class whose `cost` adds `extra` to whatever `super` returns.
fn topping(rt: &mut Runtime, name: &str, extra: f64) -> ClassId {
    let class = rt.define_delegator_class(name).unwrap();
    rt.define_method(class, "cost", move |rt, frame| {
        let inner = rt.call_super(frame, ArgValues::new())?;
        rt.call(&inner, "+", [Value::Float(extra)].into())
    })
    .unwrap();
    class
}

fn plain_coffee(rt: &mut Runtime) -> (ClassId, Value) {
    let coffee = coffee_class(rt);
    let object = rt.instantiate(coffee, ArgValues::new()).unwrap();
    (coffee, object)
}

#[test]
fn unknown_messages_are_forwarded() {
    let mut rt = Runtime::new();
    let (_, coffee) = plain_coffee(&mut rt);
    let wrapper = rt.define_delegator_class("Wrapper").unwrap();
    let proxy = rt.wrap(wrapper, coffee).unwrap();

    assert_eq!(rt.call(&proxy, "origin", ArgValues::new()).unwrap(), Value::str("Colombia"));
    assert_eq!(rt.call(&proxy, "cost", ArgValues::new()).unwrap(), Value::Int(2));
}

#[test]
fn wrapper_methods_win_and_super_reaches_the_target() {
    let mut rt = Runtime::new();
    let (_, coffee) = plain_coffee(&mut rt);
    let milk = topping(&mut rt, "Milk", 0.4);
    let with_milk = rt.wrap(milk, coffee).unwrap();

    assert_eq!(rt.call(&with_milk, "cost", ArgValues::new()).unwrap(), Value::Float(2.4));
}

#[test]
fn stacked_wrappers_compose() {
    let mut rt = Runtime::new();
    let (_, coffee) = plain_coffee(&mut rt);
    let milk = topping(&mut rt, "Milk", 0.4);
    let sugar = topping(&mut rt, "Sugar", 0.2);
    let with_milk = rt.wrap(milk, coffee).unwrap();
    let with_sugar = rt.wrap(sugar, with_milk).unwrap();

    let cost = rt.call(&with_sugar, "cost", ArgValues::new()).unwrap();
    assert_eq!(rt.to_s(&cost).unwrap(), "2.6");
    assert_eq!(
        rt.call(&with_sugar, "origin", ArgValues::new()).unwrap(),
        Value::str("Colombia")
    );
}

#[test]
fn arguments_and_blocks_are_forwarded_unchanged() {
    let mut rt = Runtime::new();
    let (_, coffee) = plain_coffee(&mut rt);
    let wrapper = rt.define_delegator_class("Wrapper").unwrap();
    let proxy = rt.wrap(wrapper, coffee).unwrap();

    let args = ArgValues::from([Value::Int(3)]).with_block(|_, yielded| Ok(Value::array(yielded.positional().to_vec())));
    let brewed = rt.call(&proxy, "brew", args).unwrap();
    assert_eq!(brewed, Value::array(vec![Value::Int(6), Value::str("hot")]));

    let err = rt.call(&proxy, "brew", [Value::Int(1)].into()).unwrap_err();
    assert_eq!(err.exc_type(), ExcType::InvalidOperand);
    assert_eq!(err.message(), Some("no block given to 'brew'"));
}

#[test]
fn builtin_targets_receive_variadic_arguments() {
    let mut rt = Runtime::new();
    let wrapper = rt.define_delegator_class("Wrapper").unwrap();
    let sizes = Value::array(vec![Value::symbol("small"), Value::symbol("large")]);
    let proxy = rt.wrap(wrapper, sizes).unwrap();

    assert_eq!(rt.call(&proxy, "fetch", [Value::Int(-1)].into()).unwrap(), Value::symbol("large"));
    assert_eq!(rt.call(&proxy, "length", ArgValues::new()).unwrap(), Value::Int(2));
    let joined = rt.call(&proxy, "join", [Value::str("/")].into()).unwrap();
    assert_eq!(joined, Value::str("small/large"));
}

#[test]
fn errors_from_the_target_propagate_as_raised() {
    let mut rt = Runtime::new();
    let (_, coffee) = plain_coffee(&mut rt);
    let wrapper = rt.define_delegator_class("Wrapper").unwrap();
    let proxy = rt.wrap(wrapper, coffee).unwrap();

    let err = rt.call(&proxy, "spill", ArgValues::new()).unwrap_err();
    assert_eq!(err, Exception::runtime_error("too hot to hold"));
}

#[test]
fn missing_operations_report_the_target_type() {
    let mut rt = Runtime::new();
    let (_, coffee) = plain_coffee(&mut rt);
    let milk = topping(&mut rt, "Milk", 0.4);
    let sugar = topping(&mut rt, "Sugar", 0.2);
    let with_milk = rt.wrap(milk, coffee).unwrap();
    let with_sugar = rt.wrap(sugar, with_milk).unwrap();

    let err = rt.call(&with_sugar, "fly", ArgValues::new()).unwrap_err();
    assert_eq!(err.exc_type(), ExcType::NotFound);
    assert_eq!(err.message(), Some("undefined method 'fly' for an instance of Coffee"));
    let missing = err.missing_operation().unwrap();
    assert_eq!(missing.operation, "fly");
    assert_eq!(missing.receiver_type, "Coffee");
}

#[test]
fn private_target_methods_are_not_forwarded() {
    let mut rt = Runtime::new();
    let (_, coffee) = plain_coffee(&mut rt);
    let wrapper = rt.define_delegator_class("Wrapper").unwrap();
    let proxy = rt.wrap(wrapper, coffee.clone()).unwrap();

    let err = rt.call(&proxy, "recipe", ArgValues::new()).unwrap_err();
    assert_eq!(err.exc_type(), ExcType::NotFound);
    assert_eq!(rt.send(&coffee, "recipe", ArgValues::new()).unwrap(), Value::str("secret"));
}

#[test]
fn base_surface_operations_reach_the_target() {
    let mut rt = Runtime::new();
    let wrapper = rt.define_delegator_class("Wrapper").unwrap();
    let nothing = rt.wrap(wrapper, Value::Nil).unwrap();
    let five = rt.wrap(wrapper, Value::Int(5)).unwrap();

    assert_eq!(rt.call(&nothing, "!", ArgValues::new()).unwrap(), Value::Bool(true));
    assert_eq!(rt.call(&nothing, "nil?", ArgValues::new()).unwrap(), Value::Bool(true));
    assert_eq!(rt.call(&five, "!", ArgValues::new()).unwrap(), Value::Bool(false));
    assert_eq!(rt.call(&five, "==", [Value::Int(5)].into()).unwrap(), Value::Bool(true));
    assert_eq!(rt.call(&five, "!=", [Value::Int(5)].into()).unwrap(), Value::Bool(false));
    assert_eq!(rt.to_s(&five).unwrap(), "5");
}

#[test]
fn instance_eval_runs_against_the_target() {
    let mut rt = Runtime::new();
    let wrapper = rt.define_delegator_class("Wrapper").unwrap();
    let target = Value::str("latte");
    let proxy = rt.wrap(wrapper, target.clone()).unwrap();

    let args = ArgValues::new().with_block(|_, yielded| Ok(yielded.positional()[0].clone()));
    let evaluated = rt.call(&proxy, "instance_eval", args).unwrap();
    assert!(evaluated.identical(&target));
}

#[test]
fn undefining_a_wrapper_method_restores_forwarding() {
    let mut rt = Runtime::new();
    let (_, coffee) = plain_coffee(&mut rt);
    let milk = topping(&mut rt, "Milk", 0.4);
    let decaf = rt.define_class("Decaf", Some(milk)).unwrap();
    rt.undef_method(decaf, "cost").unwrap();
    let proxy = rt.wrap(decaf, coffee).unwrap();

    assert_eq!(rt.call(&proxy, "cost", ArgValues::new()).unwrap(), Value::Int(2));

    rt.remove_method(decaf, "cost").unwrap();
    assert_eq!(rt.call(&proxy, "cost", ArgValues::new()).unwrap(), Value::Float(2.4));
}

#[test]
fn super_in_a_wrapper_subclass_reaches_the_parent_wrapper_first() {
    let mut rt = Runtime::new();
    let (_, coffee) = plain_coffee(&mut rt);
    let milk = topping(&mut rt, "Milk", 0.4);
    let decaf = rt.define_class("Decaf", Some(milk)).unwrap();
    rt.define_method(decaf, "cost", |rt, frame| {
        let inner = rt.call_super(frame, ArgValues::new())?;
        rt.call(&inner, "+", [Value::Float(0.5)].into())
    })
    .unwrap();
    let proxy = rt.wrap(decaf, coffee).unwrap();

    // Decaf#cost -> Milk#cost -> forwarded to Coffee#cost
    assert_eq!(rt.call(&proxy, "cost", ArgValues::new()).unwrap(), Value::Float(2.9));
    assert_eq!(rt.call(&proxy, "origin", ArgValues::new()).unwrap(), Value::str("Colombia"));

    rt.remove_method(milk, "cost").unwrap();
    assert_eq!(rt.call(&proxy, "cost", ArgValues::new()).unwrap(), Value::Float(2.5));
}

#[test]
fn singleton_methods_on_a_proxy_can_call_super() {
    let mut rt = Runtime::new();
    let (_, coffee) = plain_coffee(&mut rt);
    let wrapper = rt.define_delegator_class("Wrapper").unwrap();
    let proxy = rt.wrap(wrapper, coffee).unwrap();
    rt.define_singleton_method(&proxy, "cost", |rt, frame| {
        let inner = rt.call_super(frame, ArgValues::new())?;
        rt.call(&inner, "+", [Value::Int(1)].into())
    })
    .unwrap();

    assert_eq!(rt.call(&proxy, "cost", ArgValues::new()).unwrap(), Value::Int(3));
}

#[test]
fn delegation_to_self_is_rejected() {
    let mut rt = Runtime::new();
    let wrapper = rt.define_delegator_class("Wrapper").unwrap();
    let proxy = rt.wrap(wrapper, Value::Int(1)).unwrap();

    let err = rt.set_target(&proxy, proxy.clone()).unwrap_err();
    assert_eq!(err.exc_type(), ExcType::InvalidOperand);
    assert_eq!(err.message(), Some("Delegation to self is not allowed."));
    assert_eq!(rt.target_of(&proxy).unwrap(), Value::Int(1));

    let replaced = rt.set_target(&proxy, Value::str("oat")).unwrap();
    assert_eq!(replaced, Value::str("oat"));
    assert_eq!(
        rt.call(&proxy, "__getobj__", ArgValues::new()).unwrap(),
        Value::str("oat")
    );
}

#[test]
fn new_through_the_class_requires_a_target() {
    let mut rt = Runtime::new();
    let wrapper = rt.define_delegator_class("Wrapper").unwrap();

    let proxy = rt.call(&Value::Class(wrapper), "new", [Value::Int(7)].into()).unwrap();
    assert_eq!(rt.target_of(&proxy).unwrap(), Value::Int(7));

    let err = rt.call(&Value::Class(wrapper), "new", ArgValues::new()).unwrap_err();
    assert_eq!(err.exc_type(), ExcType::InvalidOperand);
    assert_eq!(
        err.message(),
        Some("wrong number of arguments calling 'initialize' (given 0, expected 1)")
    );
}

#[test]
fn releasing_a_proxy_keeps_its_target() {
    let mut rt = Runtime::new();
    let (_, coffee) = plain_coffee(&mut rt);
    let wrapper = rt.define_delegator_class("Wrapper").unwrap();
    let proxy = rt.wrap(wrapper, coffee.clone()).unwrap();

    rt.release(&proxy).unwrap();
    assert_eq!(rt.call(&coffee, "cost", ArgValues::new()).unwrap(), Value::Int(2));
    let err = rt.call(&proxy, "cost", ArgValues::new()).unwrap_err();
    assert_eq!(err.exc_type(), ExcType::RuntimeError);

    let stats = rt.heap_stats();
    assert_eq!(stats.live_objects, 1);
    assert_eq!(stats.released_slots, 1);
}

#[test]
fn class_ids_from_another_runtime_are_rejected() {
    let mut home = Runtime::new();
    let mut last = home.define_class("Coffee", None).unwrap();
    for name in ["Milk", "Sugar", "Foam", "Syrup"] {
        last = home.define_delegator_class(name).unwrap();
    }

    let mut rt = Runtime::new();
    let local_wrapper = rt.define_delegator_class("Wrapper").unwrap();

    let err = rt.wrap(last, Value::Int(1)).unwrap_err();
    assert_eq!(err.exc_type(), ExcType::TypeError);
    assert!(err.message().is_some_and(|message| message.starts_with("unknown class")));

    assert!(rt.define_method(last, "cost", |_, _| Ok(Value::Int(0))).is_err());
    assert!(rt.undef_method(last, "cost").is_err());
    assert!(rt.remove_method(last, "cost").is_err());
    assert!(rt.define_class("Latte", Some(last)).is_err());
    assert!(rt.class_named("Latte").is_none());
    assert!(rt.class_name(last).is_err());
    assert!(!rt.is_delegator_class(last));
    let err = rt.call(&Value::Class(last), "name", ArgValues::new()).unwrap_err();
    assert_eq!(err.exc_type(), ExcType::TypeError);

    // an index this runtime also uses still belongs to the other table
    let foreign_object = home.core().object;
    assert!(rt.class_name(foreign_object).is_err());
    assert!(rt.instantiate(foreign_object, ArgValues::new()).is_err());
    assert_eq!(rt.heap_stats().live_objects, 0);

    assert_eq!(rt.class_name(local_wrapper).unwrap(), "Wrapper");
}

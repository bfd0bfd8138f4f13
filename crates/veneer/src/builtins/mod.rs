//! Builtin method surfaces.
//!
//! Each builtin class's methods are a strum enum whose serialized names are
//! the message names; [`install`] writes every variant into its class's
//! method table at bootstrap, and [`call`] routes an invocation to the module
//! implementing that class.

pub(crate) mod array;
pub(crate) mod basic_object;
pub(crate) mod class;
pub(crate) mod delegator;
pub(crate) mod kernel;
pub(crate) mod method;
pub(crate) mod nil_bool;
pub(crate) mod numeric;
pub(crate) mod string;

pub(crate) use array::ArrayMethod;
pub(crate) use basic_object::BasicObjectMethod;
pub(crate) use class::ClassMethod;
pub(crate) use delegator::DelegatorMethod;
pub(crate) use kernel::KernelMethod;
pub(crate) use method::MethodMethod;
pub(crate) use nil_bool::{BooleanMethod, NilMethod};
pub(crate) use numeric::{FloatMethod, IntegerMethod};
pub(crate) use string::{StringMethod, SymbolMethod};
use strum::IntoEnumIterator;

use crate::{
    args::CallFrame,
    exception::{ExcType, RunResult},
    runtime::{CoreClasses, Runtime},
    types::{ClassId, ClassTable, MethodBody, Visibility},
    value::Value,
};

/// A builtin method, tagged with the surface it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Builtin {
    BasicObject(BasicObjectMethod),
    Kernel(KernelMethod),
    Delegator(DelegatorMethod),
    Class(ClassMethod),
    Method(MethodMethod),
    Integer(IntegerMethod),
    Float(FloatMethod),
    String(StringMethod),
    Symbol(SymbolMethod),
    Array(ArrayMethod),
    Nil(NilMethod),
    Boolean(BooleanMethod),
}

/// Common shape of the per-class builtin enums.
pub(crate) trait BuiltinSurface: Copy + IntoEnumIterator + Into<&'static str> {
    fn visibility(self) -> Visibility {
        Visibility::Public
    }
}

/// Runs a builtin method.
pub(crate) fn call(rt: &mut Runtime, builtin: Builtin, frame: &CallFrame) -> RunResult<Value> {
    match builtin {
        Builtin::BasicObject(method) => basic_object::call(rt, method, frame),
        Builtin::Kernel(method) => kernel::call(rt, method, frame),
        Builtin::Delegator(method) => delegator::call(rt, method, frame),
        Builtin::Class(method) => class::call(rt, method, frame),
        Builtin::Method(method) => method::call(rt, method, frame),
        Builtin::Integer(method) => numeric::call_integer(rt, method, frame),
        Builtin::Float(method) => numeric::call_float(rt, method, frame),
        Builtin::String(method) => string::call_string(rt, method, frame),
        Builtin::Symbol(method) => string::call_symbol(rt, method, frame),
        Builtin::Array(method) => array::call(rt, method, frame),
        Builtin::Nil(method) => nil_bool::call_nil(rt, method, frame),
        Builtin::Boolean(method) => nil_bool::call_boolean(rt, method, frame),
    }
}

/// Installs every builtin surface except `Delegator`'s, which is prepared separately.
pub(crate) fn install(classes: &mut ClassTable, core: &CoreClasses) {
    install_surface(classes, core.basic_object, Builtin::BasicObject);
    install_surface(classes, core.object, Builtin::Kernel);
    install_surface(classes, core.class, Builtin::Class);
    install_surface(classes, core.method, Builtin::Method);
    install_surface(classes, core.integer, Builtin::Integer);
    install_surface(classes, core.float, Builtin::Float);
    install_surface(classes, core.string, Builtin::String);
    install_surface(classes, core.symbol, Builtin::Symbol);
    install_surface(classes, core.array, Builtin::Array);
    install_surface(classes, core.nil, Builtin::Nil);
    install_surface(classes, core.true_class, Builtin::Boolean);
    install_surface(classes, core.false_class, Builtin::Boolean);
}

pub(crate) fn install_surface<M: BuiltinSurface>(classes: &mut ClassTable, class: ClassId, wrap: fn(M) -> Builtin) {
    let table = &mut classes.get_mut(class).methods;
    for method in M::iter() {
        table.define(method.into(), MethodBody::Builtin(wrap(method)), method.visibility());
    }
}

// ============================================================================
// Argument helpers shared by the surfaces
// ============================================================================

/// An operation name passed as a symbol or string.
pub(crate) fn name_arg(value: &Value) -> RunResult<&str> {
    value
        .as_name()
        .ok_or_else(|| ExcType::type_error(format!("{} is not a symbol nor a string", short_repr(value))))
}

/// A class operand, as taken by `is_a?` and friends.
pub(crate) fn class_arg(value: &Value) -> RunResult<ClassId> {
    value
        .as_class()
        .ok_or_else(|| ExcType::type_error("class or module required"))
}

/// An integer operand.
pub(crate) fn int_arg(rt: &Runtime, value: &Value, what: &str) -> RunResult<i64> {
    value.as_int().ok_or_else(|| {
        ExcType::type_error(format!(
            "no implicit conversion of {} into Integer for {what}",
            rt.class_name_of(value).unwrap_or_else(|_| "object".to_owned())
        ))
    })
}

/// Inspects a value, requiring `inspect` to return a string.
pub(crate) fn inspect_value(rt: &mut Runtime, value: &Value) -> RunResult<String> {
    string_result(rt.call(value, "inspect", crate::ArgValues::new())?, "inspect")
}

/// Converts a value with `to_s`, requiring a string back.
pub(crate) fn to_s_value(rt: &mut Runtime, value: &Value) -> RunResult<String> {
    string_result(rt.call(value, "to_s", crate::ArgValues::new())?, "to_s")
}

fn string_result(value: Value, operation: &str) -> RunResult<String> {
    match value {
        Value::Str(s) => Ok(s.to_string()),
        _ => Err(ExcType::type_error(format!("{operation} did not return a String"))),
    }
}

/// Short description for error messages that must not dispatch.
fn short_repr(value: &Value) -> String {
    match value {
        Value::Nil => "nil".to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => f.to_string(),
        Value::Str(s) => format!("{s:?}"),
        Value::Symbol(s) => format!(":{s}"),
        Value::Array(items) => format!("[..{} items]", items.len()),
        Value::Class(_) => "class".to_owned(),
        Value::Ref(_) => "object".to_owned(),
    }
}

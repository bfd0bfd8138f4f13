//! Methods every `Object` has.

use strum::{EnumIter, IntoStaticStr};

use super::{BuiltinSurface, basic_object::send_named, class_arg, inspect_value, name_arg};
use crate::{
    args::{ArgValues, CallFrame},
    exception::{ExcType, RunResult},
    runtime::{CopyKind, Runtime},
    types::{BoundMethod, HeapData, HeapObject, MethodEntry, Visibility},
    value::{Value, stable_hash},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum KernelMethod {
    Class,
    #[strum(serialize = "is_a?")]
    IsA,
    #[strum(serialize = "kind_of?")]
    KindOf,
    #[strum(serialize = "instance_of?")]
    InstanceOf,
    #[strum(serialize = "respond_to?")]
    RespondTo,
    Methods,
    Method,
    SingletonMethods,
    Dup,
    Clone,
    ObjectId,
    Inspect,
    ToS,
    Hash,
    #[strum(serialize = "nil?")]
    Nil,
    #[strum(serialize = "eql?")]
    Eql,
    #[strum(serialize = "===")]
    CaseEq,
    #[strum(serialize = "<=>")]
    Cmp,
    Send,
    PublicSend,
    InstanceVariableGet,
    InstanceVariableSet,
    InstanceVariables,
    #[strum(serialize = "frozen?")]
    Frozen,
    Freeze,
    InitializeDup,
    InitializeClone,
    InitializeCopy,
}

impl BuiltinSurface for KernelMethod {
    fn visibility(self) -> Visibility {
        match self {
            Self::InitializeDup | Self::InitializeClone | Self::InitializeCopy => Visibility::Private,
            _ => Visibility::Public,
        }
    }
}

pub(crate) fn call(rt: &mut Runtime, method: KernelMethod, frame: &CallFrame) -> RunResult<Value> {
    let receiver = frame.receiver();
    let args = frame.args();
    let name = frame.name();
    match method {
        KernelMethod::Class => {
            args.check_zero_args(name)?;
            Ok(Value::Class(rt.class_of(receiver)?))
        }
        KernelMethod::IsA | KernelMethod::KindOf => {
            let class = class_arg(args.get_one_arg(name)?)?;
            let real = rt.class_of(receiver)?;
            Ok(Value::Bool(rt.classes.is_subclass_of(real, class)))
        }
        KernelMethod::InstanceOf => {
            let class = class_arg(args.get_one_arg(name)?)?;
            Ok(Value::Bool(rt.class_of(receiver)? == class))
        }
        KernelMethod::RespondTo => {
            let (operation, include_private) = args.get_one_two_args(name)?;
            let include_private = include_private.is_some_and(Value::is_truthy);
            respond_to(rt, receiver, name_arg(operation)?, include_private).map(Value::Bool)
        }
        KernelMethod::Methods => {
            let all = args.get_zero_one_arg(name)?.is_none_or(Value::is_truthy);
            let names = rt.method_names(receiver, all)?;
            Ok(names_to_array(names))
        }
        KernelMethod::SingletonMethods => {
            args.check_zero_args(name)?;
            let names = rt.singleton_method_names(receiver)?;
            Ok(names_to_array(names))
        }
        KernelMethod::Method => {
            let operation = name_arg(args.get_one_arg(name)?)?;
            method_object(rt, receiver, operation)
        }
        KernelMethod::Dup => {
            args.check_zero_args(name)?;
            rt.copy_object(receiver, CopyKind::Dup)
        }
        KernelMethod::Clone => {
            args.check_zero_args(name)?;
            rt.copy_object(receiver, CopyKind::Clone)
        }
        KernelMethod::ObjectId => {
            args.check_zero_args(name)?;
            Ok(Value::Int(receiver.object_id()))
        }
        KernelMethod::Inspect => {
            args.check_zero_args(name)?;
            default_inspect(rt, receiver).map(Value::from)
        }
        KernelMethod::ToS => {
            args.check_zero_args(name)?;
            let class = rt.class_of(receiver)?;
            Ok(Value::from(format!(
                "#<{}:0x{:016x}>",
                rt.classes.get(class).name(),
                receiver.object_id()
            )))
        }
        KernelMethod::Hash => {
            args.check_zero_args(name)?;
            Ok(Value::Int(hash_int(stable_hash(&receiver.object_id()))))
        }
        KernelMethod::Nil => {
            args.check_zero_args(name)?;
            Ok(Value::Bool(false))
        }
        KernelMethod::Eql => {
            let other = args.get_one_arg(name)?;
            Ok(Value::Bool(receiver.identical(other)))
        }
        KernelMethod::CaseEq => {
            let other = args.get_one_arg(name)?;
            Ok(Value::Bool(identical_or_equal(rt, receiver, other)?))
        }
        KernelMethod::Cmp => {
            let other = args.get_one_arg(name)?;
            if identical_or_equal(rt, receiver, other)? {
                Ok(Value::Int(0))
            } else {
                Ok(Value::Nil)
            }
        }
        KernelMethod::Send => send_named(rt, receiver, args.clone(), name, true),
        KernelMethod::PublicSend => send_named(rt, receiver, args.clone(), name, false),
        KernelMethod::InstanceVariableGet => {
            let ivar = ivar_name(args.get_one_arg(name)?)?;
            rt.ivar_get(receiver, ivar)
        }
        KernelMethod::InstanceVariableSet => {
            let (ivar, value) = args.get_two_args(name)?;
            let ivar = ivar_name(ivar)?;
            rt.ivar_set(receiver, ivar, value.clone())?;
            Ok(value.clone())
        }
        KernelMethod::InstanceVariables => {
            args.check_zero_args(name)?;
            let names = match receiver {
                Value::Ref(id) => rt
                    .heap
                    .get(*id)?
                    .ivars
                    .keys()
                    .map(|ivar| Value::symbol(ivar))
                    .collect(),
                _ => Vec::new(),
            };
            Ok(Value::array(names))
        }
        KernelMethod::Frozen => {
            args.check_zero_args(name)?;
            let frozen = match receiver {
                Value::Ref(id) => rt.heap.get(*id)?.frozen,
                Value::Class(_) => false,
                _ => true,
            };
            Ok(Value::Bool(frozen))
        }
        KernelMethod::Freeze => {
            args.check_zero_args(name)?;
            if let Value::Ref(id) = receiver {
                rt.heap.get_mut(*id)?.frozen = true;
            }
            Ok(receiver.clone())
        }
        KernelMethod::InitializeDup | KernelMethod::InitializeClone => {
            let original = args.get_one_arg(name)?.clone();
            rt.send(receiver, "initialize_copy", [original].into())
        }
        KernelMethod::InitializeCopy => {
            args.get_one_arg(name)?;
            Ok(Value::Nil)
        }
    }
}

/// `respond_to?`: public methods (or any when `include_private`), then `respond_to_missing?`.
pub(crate) fn respond_to(rt: &mut Runtime, receiver: &Value, operation: &str, include_private: bool) -> RunResult<bool> {
    if rt.lookup(receiver, operation)?.callable(include_private).is_some() {
        return Ok(true);
    }
    let answer = rt.send(
        receiver,
        "respond_to_missing?",
        [Value::symbol(operation), Value::Bool(include_private)].into(),
    )?;
    Ok(answer.is_truthy())
}

/// `method(name)`: a `Method` object for a directly callable or `respond_to_missing?` operation.
fn method_object(rt: &mut Runtime, receiver: &Value, operation: &str) -> RunResult<Value> {
    let owner = match rt.lookup(receiver, operation)?.callable(true) {
        Some(found) => Some(found.owner),
        None => {
            let answer = rt.send(
                receiver,
                "respond_to_missing?",
                [Value::symbol(operation), Value::Bool(true)].into(),
            )?;
            if !answer.is_truthy() {
                return Err(rt.not_found(receiver, operation));
            }
            None
        }
    };
    let bound = BoundMethod {
        receiver: receiver.clone(),
        name: operation.to_owned(),
        owner,
    };
    let id = rt
        .heap
        .allocate(HeapObject::with_data(rt.core.method, HeapData::Method(bound)));
    Ok(Value::Ref(id))
}

/// `#<Name:0x... @a=1, @b=2>`
fn default_inspect(rt: &mut Runtime, receiver: &Value) -> RunResult<String> {
    let class = rt.class_of(receiver)?;
    let mut out = format!("#<{}:0x{:016x}", rt.classes.get(class).name(), receiver.object_id());
    if let Value::Ref(id) = receiver {
        let ivars: Vec<(String, Value)> = rt
            .heap
            .get(*id)?
            .ivars
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        for (index, (name, value)) in ivars.iter().enumerate() {
            out.push_str(if index == 0 { " " } else { ", " });
            out.push_str(name);
            out.push('=');
            out.push_str(&inspect_value(rt, value)?);
        }
    }
    out.push('>');
    Ok(out)
}

fn identical_or_equal(rt: &mut Runtime, receiver: &Value, other: &Value) -> RunResult<bool> {
    if receiver.identical(other) {
        return Ok(true);
    }
    Ok(rt.call(receiver, "==", [other.clone()].into())?.is_truthy())
}

fn ivar_name(value: &Value) -> RunResult<&str> {
    let name = name_arg(value)?;
    if name.len() > 1 && name.starts_with('@') && !name[1..].starts_with('@') {
        Ok(name)
    } else {
        Err(ExcType::type_error(format!("'{name}' is not allowed as an instance variable name")))
    }
}

pub(crate) fn names_to_array(names: impl IntoIterator<Item = String>) -> Value {
    Value::array(names.into_iter().map(|name| Value::symbol(&name)).collect())
}

/// Folds a 64-bit hash into the non-negative integer range.
pub(crate) fn hash_int(hash: u64) -> i64 {
    (hash >> 1) as i64
}

/// Whether the table entry is a public definition.
pub(crate) fn is_public(entry: &MethodEntry) -> bool {
    matches!(
        entry,
        MethodEntry::Defined {
            visibility: Visibility::Public,
            ..
        }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instance_variable_names_need_a_single_sigil() {
        assert!(ivar_name(&Value::symbol("@coffee")).is_ok());
        assert!(ivar_name(&Value::str("@@class_var")).is_err());
        assert!(ivar_name(&Value::symbol("coffee")).is_err());
        assert!(ivar_name(&Value::Int(1)).is_err());
    }

    #[test]
    fn default_inspect_lists_instance_variables() {
        let mut rt = Runtime::new();
        let target = rt.define_class("Target", None).unwrap();
        let object = rt.instantiate(target, ArgValues::new()).unwrap();
        rt.ivar_set(&object, "@cost", Value::Int(2)).unwrap();
        rt.ivar_set(&object, "@name", Value::str("drip")).unwrap();

        let inspected = rt.inspect(&object).unwrap();
        assert!(inspected.starts_with("#<Target:0x"), "{inspected}");
        assert!(inspected.ends_with(" @cost=2, @name=\"drip\">"), "{inspected}");
    }
}

//! The delegator base surface.
//!
//! `Delegator` descends from `BasicObject`, not `Object`, so it starts with
//! almost nothing; [`prepare_surface`] further undefines the few inherited
//! operations a wrapper must forward (`!`, `==`, `!=`, `instance_eval`,
//! `instance_exec`), copies in the handful of `Kernel` methods a wrapper
//! answers itself, and installs the delegation machinery. Everything else
//! reaches `method_missing` and is forwarded to the target.

use indexmap::IndexSet;
use strum::{EnumIter, IntoEnumIterator, IntoStaticStr};

use super::{Builtin, BuiltinSurface, KernelMethod, class_arg, inspect_value, install_surface, name_arg};
use crate::{
    args::{ArgValues, CallFrame},
    exception::{ExcType, RunResult},
    runtime::{CoreClasses, Runtime},
    types::{ClassTable, MethodBody, Visibility},
    value::Value,
};

/// Tag in the first slot of a delegator's marshal payload.
pub(crate) const FORMAT_V1: &str = "__v1__";

/// `BasicObject` operations a delegator answers itself rather than forwarding.
const KEPT_BASIC_OBJECT: [&str; 5] = ["equal?", "__id__", "__send__", "method_missing", "respond_to_missing?"];

/// `Kernel` operations copied onto the delegator base.
const KEPT_KERNEL: [KernelMethod; 6] = [
    KernelMethod::Dup,
    KernelMethod::Clone,
    KernelMethod::Method,
    KernelMethod::Methods,
    KernelMethod::RespondTo,
    KernelMethod::ObjectId,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum DelegatorMethod {
    Initialize,
    #[strum(serialize = "__getobj__")]
    GetObj,
    #[strum(serialize = "__setobj__")]
    SetObj,
    Inspect,
    Methods,
    MethodMissing,
    #[strum(serialize = "respond_to_missing?")]
    RespondToMissing,
    #[strum(serialize = "is_a?")]
    IsA,
    #[strum(serialize = "kind_of?")]
    KindOf,
    #[strum(serialize = "instance_of?")]
    InstanceOf,
    MarshalDump,
    MarshalLoad,
    InitializeDup,
    InitializeClone,
}

impl BuiltinSurface for DelegatorMethod {
    fn visibility(self) -> Visibility {
        match self {
            Self::Initialize
            | Self::MethodMissing
            | Self::RespondToMissing
            | Self::InitializeDup
            | Self::InitializeClone => Visibility::Private,
            _ => Visibility::Public,
        }
    }
}

/// Strips the inherited surface off the `Delegator` class and installs its own.
pub(crate) fn prepare_surface(classes: &mut ClassTable, core: &CoreClasses) {
    let base = core.delegator;
    {
        let table = &mut classes.get_mut(base).methods;
        for method in super::BasicObjectMethod::iter() {
            let name: &'static str = method.into();
            if !KEPT_BASIC_OBJECT.contains(&name) {
                table.undefine(name);
            }
        }
        for method in KEPT_KERNEL {
            table.define(method.into(), MethodBody::Builtin(Builtin::Kernel(method)), method.visibility());
        }
    }
    install_surface(classes, base, Builtin::Delegator);
}

pub(crate) fn call(rt: &mut Runtime, method: DelegatorMethod, frame: &CallFrame) -> RunResult<Value> {
    let receiver = frame.receiver();
    let args = frame.args();
    let name = frame.name();
    match method {
        DelegatorMethod::Initialize => {
            let target = args.get_one_arg("initialize")?.clone();
            rt.store_target(receiver, target)?;
            Ok(Value::Nil)
        }
        DelegatorMethod::GetObj => {
            args.check_zero_args(name)?;
            rt.target_of(receiver)
        }
        DelegatorMethod::SetObj => {
            let target = args.get_one_arg(name)?.clone();
            rt.store_target(receiver, target.clone())?;
            Ok(target)
        }
        DelegatorMethod::Inspect => {
            args.check_zero_args(name)?;
            let target = rt.target_of(receiver)?;
            let class = rt.class_of(receiver)?;
            let class_name = rt.classes.get(class).name().to_owned();
            let target_inspect = inspect_value(rt, &target)?;
            Ok(Value::from(format!(
                "#<{class_name}:{} obj: {target_inspect}>",
                receiver.object_id()
            )))
        }
        DelegatorMethod::Methods => {
            let all = args.get_zero_one_arg(name)?.is_none_or(Value::is_truthy);
            let target = rt.target_of(receiver)?;
            let forwarded = rt.call(&target, "methods", [Value::Bool(all)].into())?;
            let mut names: IndexSet<String> = symbol_names(&forwarded)?.into_iter().collect();
            names.extend(rt.method_names(receiver, all)?);
            Ok(super::kernel::names_to_array(names))
        }
        DelegatorMethod::MethodMissing => {
            let Some((operation, rest)) = args.clone().split_first() else {
                return Err(ExcType::arg_count("method_missing", "1+", 0));
            };
            let operation = name_arg(&operation)?;
            let target = rt.target_of(receiver)?;
            let answers = rt.call(&target, "respond_to?", [Value::symbol(operation)].into())?;
            if answers.is_truthy() {
                rt.trace_forward(operation, &target)?;
                rt.send(&target, operation, rest)
            } else {
                Err(rt.not_found(receiver, operation))
            }
        }
        DelegatorMethod::RespondToMissing => {
            let (operation, include_private) = args.get_one_two_args(name)?;
            let target = rt.target_of(receiver)?;
            let mut probe = vec![operation.clone()];
            if let Some(flag) = include_private {
                probe.push(flag.clone());
            }
            Ok(Value::Bool(rt.call(&target, "respond_to?", probe.into())?.is_truthy()))
        }
        DelegatorMethod::IsA | DelegatorMethod::KindOf | DelegatorMethod::InstanceOf => {
            let class = class_arg(args.get_one_arg(name)?)?;
            // all three accept the wrapper's own chain, then ask the target
            let real = rt.class_of(receiver)?;
            if rt.classes.is_subclass_of(real, class) {
                return Ok(Value::Bool(true));
            }
            let target = rt.target_of(receiver)?;
            Ok(Value::Bool(rt.call(&target, name, [Value::Class(class)].into())?.is_truthy()))
        }
        DelegatorMethod::MarshalDump => {
            args.check_zero_args(name)?;
            let target = rt.target_of(receiver)?;
            Ok(Value::array(vec![Value::symbol(FORMAT_V1), target]))
        }
        DelegatorMethod::MarshalLoad => {
            let payload = args.get_one_arg(name)?;
            match payload.as_array() {
                Some([Value::Symbol(version), target]) if &**version == FORMAT_V1 => {
                    let target = target.clone();
                    rt.send(receiver, "__setobj__", [target].into())?;
                    Ok(Value::Nil)
                }
                Some([Value::Symbol(version), _]) => Err(ExcType::type_error(format!(
                    "unsupported delegator marshal format :{version}"
                ))),
                _ => Err(ExcType::type_error("malformed delegator marshal payload")),
            }
        }
        DelegatorMethod::InitializeDup | DelegatorMethod::InitializeClone => {
            let original = args.get_one_arg(name)?;
            let target = rt.target_of(original)?;
            let copy_op = if method == DelegatorMethod::InitializeDup {
                "dup"
            } else {
                "clone"
            };
            let copied = rt.call(&target, copy_op, ArgValues::new())?;
            rt.store_target(receiver, copied)?;
            Ok(Value::Nil)
        }
    }
}

fn symbol_names(value: &Value) -> RunResult<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| ExcType::type_error("methods did not return an Array"))?;
    Ok(items
        .iter()
        .filter_map(Value::as_name)
        .map(str::to_owned)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Lookup, MethodEntry};

    #[test]
    fn prepared_surface_hides_equality_and_keeps_identity() {
        let rt = Runtime::new();
        let base = rt.core().delegator;
        for stripped in ["!", "==", "!=", "instance_eval", "instance_exec"] {
            assert!(
                matches!(rt.classes.find_from(Some(base), stripped), Lookup::Undefined),
                "{stripped} should be undefined"
            );
        }
        for kept in ["equal?", "__id__", "__send__", "object_id", "respond_to?", "dup", "clone", "method"] {
            assert!(
                matches!(rt.classes.find_from(Some(base), kept), Lookup::Found(_)),
                "{kept} should be defined"
            );
        }
        assert!(matches!(
            rt.classes.get(base).methods.get("initialize"),
            Some(MethodEntry::Defined { .. })
        ));
        assert!(matches!(rt.classes.find_from(Some(base), "class"), Lookup::Missing));
    }
}

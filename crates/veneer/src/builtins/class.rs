//! Methods of class objects.

use strum::{EnumIter, IntoStaticStr};

use super::{BuiltinSurface, class_arg, kernel::names_to_array, name_arg};
use crate::{
    args::CallFrame,
    case_match,
    exception::{ExcType, RunResult},
    runtime::Runtime,
    types::ClassId,
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum ClassMethod {
    New,
    #[strum(serialize = "===")]
    CaseEq,
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "<=")]
    Le,
    Name,
    ToS,
    Inspect,
    Superclass,
    Ancestors,
    InstanceMethods,
    #[strum(serialize = "method_defined?")]
    MethodDefined,
}

impl BuiltinSurface for ClassMethod {}

pub(crate) fn call(rt: &mut Runtime, method: ClassMethod, frame: &CallFrame) -> RunResult<Value> {
    let class = receiver_class(rt, frame)?;
    let args = frame.args();
    let name = frame.name();
    match method {
        ClassMethod::New => rt.instantiate(class, args.clone()),
        ClassMethod::CaseEq => {
            let value = args.get_one_arg(name)?;
            case_match::class_case_eq(rt, class, value).map(Value::Bool)
        }
        ClassMethod::Eq => {
            let other = args.get_one_arg(name)?;
            Ok(Value::Bool(other.as_class() == Some(class)))
        }
        ClassMethod::Le => {
            let other = class_arg(args.get_one_arg(name)?)?;
            Ok(Value::Bool(rt.classes.is_subclass_of(class, other)))
        }
        ClassMethod::Name | ClassMethod::ToS | ClassMethod::Inspect => {
            args.check_zero_args(name)?;
            Ok(Value::str(rt.classes.get(class).name()))
        }
        ClassMethod::Superclass => {
            args.check_zero_args(name)?;
            Ok(rt.classes.get(class).superclass().map_or(Value::Nil, Value::Class))
        }
        ClassMethod::Ancestors => {
            args.check_zero_args(name)?;
            let ancestors = rt.classes.ancestors(class).into_iter().map(Value::Class).collect();
            Ok(Value::array(ancestors))
        }
        ClassMethod::InstanceMethods => {
            let all = args.get_zero_one_arg(name)?.is_none_or(Value::is_truthy);
            Ok(names_to_array(rt.instance_method_names(class, all)))
        }
        ClassMethod::MethodDefined => {
            let operation = name_arg(args.get_one_arg(name)?)?;
            let found = rt.classes.find_from(Some(class), operation).callable(false);
            Ok(Value::Bool(found.is_some()))
        }
    }
}

fn receiver_class(rt: &Runtime, frame: &CallFrame) -> RunResult<ClassId> {
    let class = frame
        .receiver()
        .as_class()
        .ok_or_else(|| ExcType::type_error("class method called on a non-class receiver"))?;
    rt.classes.check(class)
}

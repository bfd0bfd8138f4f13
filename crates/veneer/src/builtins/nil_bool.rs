//! `NilClass`, `TrueClass` and `FalseClass`.

use strum::{EnumIter, IntoStaticStr};

use super::BuiltinSurface;
use crate::{
    args::CallFrame,
    exception::{ExcType, RunResult},
    runtime::Runtime,
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum NilMethod {
    ToS,
    ToA,
    Inspect,
    #[strum(serialize = "nil?")]
    Nil,
    #[strum(serialize = "&")]
    And,
    #[strum(serialize = "|")]
    Or,
}

impl BuiltinSurface for NilMethod {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum BooleanMethod {
    ToS,
    Inspect,
    #[strum(serialize = "&")]
    And,
    #[strum(serialize = "|")]
    Or,
    #[strum(serialize = "^")]
    Xor,
}

impl BuiltinSurface for BooleanMethod {}

pub(crate) fn call_nil(_rt: &mut Runtime, method: NilMethod, frame: &CallFrame) -> RunResult<Value> {
    let args = frame.args();
    let name = frame.name();
    match method {
        NilMethod::ToS => {
            args.check_zero_args(name)?;
            Ok(Value::str(""))
        }
        NilMethod::ToA => {
            args.check_zero_args(name)?;
            Ok(Value::array(Vec::new()))
        }
        NilMethod::Inspect => {
            args.check_zero_args(name)?;
            Ok(Value::str("nil"))
        }
        NilMethod::Nil => {
            args.check_zero_args(name)?;
            Ok(Value::Bool(true))
        }
        NilMethod::And => {
            args.get_one_arg(name)?;
            Ok(Value::Bool(false))
        }
        NilMethod::Or => Ok(Value::Bool(args.get_one_arg(name)?.is_truthy())),
    }
}

pub(crate) fn call_boolean(_rt: &mut Runtime, method: BooleanMethod, frame: &CallFrame) -> RunResult<Value> {
    let Value::Bool(b) = *frame.receiver() else {
        return Err(ExcType::type_error("boolean method on a non-boolean receiver"));
    };
    let args = frame.args();
    let name = frame.name();
    match method {
        BooleanMethod::ToS | BooleanMethod::Inspect => {
            args.check_zero_args(name)?;
            Ok(Value::str(if b { "true" } else { "false" }))
        }
        BooleanMethod::And | BooleanMethod::Or | BooleanMethod::Xor => {
            let other = args.get_one_arg(name)?.is_truthy();
            Ok(Value::Bool(match method {
                BooleanMethod::And => b && other,
                BooleanMethod::Or => b || other,
                _ => b != other,
            }))
        }
    }
}

//! The root surface every object starts from.

use strum::{EnumIter, IntoStaticStr};

use super::{BuiltinSurface, name_arg};
use crate::{
    args::{ArgValues, CallFrame},
    exception::{ExcType, RunResult},
    runtime::Runtime,
    types::Visibility,
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
pub(crate) enum BasicObjectMethod {
    #[strum(serialize = "!")]
    Not,
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    NotEq,
    #[strum(serialize = "equal?")]
    Equal,
    #[strum(serialize = "__id__")]
    Id,
    #[strum(serialize = "__send__")]
    Send,
    #[strum(serialize = "instance_eval")]
    InstanceEval,
    #[strum(serialize = "instance_exec")]
    InstanceExec,
    #[strum(serialize = "method_missing")]
    MethodMissing,
    #[strum(serialize = "respond_to_missing?")]
    RespondToMissing,
    #[strum(serialize = "initialize")]
    Initialize,
}

impl BuiltinSurface for BasicObjectMethod {
    fn visibility(self) -> Visibility {
        match self {
            Self::MethodMissing | Self::RespondToMissing | Self::Initialize => Visibility::Private,
            _ => Visibility::Public,
        }
    }
}

pub(crate) fn call(rt: &mut Runtime, method: BasicObjectMethod, frame: &CallFrame) -> RunResult<Value> {
    let receiver = frame.receiver();
    let args = frame.args();
    match method {
        BasicObjectMethod::Not => {
            args.check_zero_args("!")?;
            Ok(Value::Bool(!receiver.is_truthy()))
        }
        BasicObjectMethod::Eq | BasicObjectMethod::Equal => {
            let other = args.get_one_arg(frame.name())?;
            Ok(Value::Bool(receiver.identical(other)))
        }
        BasicObjectMethod::NotEq => {
            let other = args.get_one_arg("!=")?.clone();
            let equal = rt.call(receiver, "==", [other].into())?;
            Ok(Value::Bool(!equal.is_truthy()))
        }
        BasicObjectMethod::Id => {
            args.check_zero_args("__id__")?;
            Ok(Value::Int(receiver.object_id()))
        }
        BasicObjectMethod::Send => send_named(rt, receiver, args.clone(), frame.name(), true),
        BasicObjectMethod::InstanceEval => {
            args.check_zero_args("instance_eval")?;
            let block = args.require_block("instance_eval")?;
            block(rt, [receiver.clone()].into())
        }
        BasicObjectMethod::InstanceExec => {
            let block = args.require_block("instance_exec")?;
            let mut yielded = ArgValues::from_vec(args.positional().to_vec());
            yielded.prepend(receiver.clone());
            block(rt, yielded)
        }
        BasicObjectMethod::MethodMissing => {
            let name = frame
                .arg(0)
                .ok_or_else(|| ExcType::arg_count("method_missing", "1+", 0))?;
            let name = name_arg(name)?;
            Err(rt.not_found(receiver, name))
        }
        BasicObjectMethod::RespondToMissing => {
            args.get_one_two_args("respond_to_missing?")?;
            Ok(Value::Bool(false))
        }
        BasicObjectMethod::Initialize => {
            args.check_zero_args("initialize")?;
            Ok(Value::Nil)
        }
    }
}

/// `send`, `__send__` and `public_send`: the first argument names the operation.
pub(crate) fn send_named(
    rt: &mut Runtime,
    receiver: &Value,
    args: ArgValues,
    via: &str,
    allow_private: bool,
) -> RunResult<Value> {
    let Some((name, rest)) = args.split_first() else {
        return Err(ExcType::arg_count(via, "1+", 0));
    };
    let name = name_arg(&name)?;
    if allow_private {
        rt.send(receiver, name, rest)
    } else {
        rt.call(receiver, name, rest)
    }
}

use strum::{EnumIter, IntoStaticStr};

use super::BuiltinSurface;
use crate::{
    args::CallFrame,
    exception::{ExcType, RunResult},
    runtime::Runtime,
    types::{BoundMethod, MethodOwner},
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum MethodMethod {
    Call,
    Receiver,
    Name,
    Owner,
    Inspect,
}

impl BuiltinSurface for MethodMethod {}

pub(crate) fn call(rt: &mut Runtime, method: MethodMethod, frame: &CallFrame) -> RunResult<Value> {
    let bound = bound_method(rt, frame.receiver())?;
    let args = frame.args();
    match method {
        MethodMethod::Call => rt.send(&bound.receiver, &bound.name, args.clone()),
        MethodMethod::Receiver => {
            args.check_zero_args("receiver")?;
            Ok(bound.receiver)
        }
        MethodMethod::Name => {
            args.check_zero_args("name")?;
            Ok(Value::symbol(&bound.name))
        }
        MethodMethod::Owner => {
            args.check_zero_args("owner")?;
            Ok(match bound.owner {
                Some(MethodOwner::Class(class)) => Value::Class(class),
                Some(MethodOwner::Singleton) | None => Value::Nil,
            })
        }
        MethodMethod::Inspect => {
            args.check_zero_args("inspect")?;
            let class = rt.class_of(&bound.receiver)?;
            Ok(Value::from(format!(
                "#<Method: {}#{}>",
                rt.classes.get(class).name(),
                bound.name
            )))
        }
    }
}

fn bound_method(rt: &Runtime, receiver: &Value) -> RunResult<BoundMethod> {
    receiver
        .heap_id()
        .map(|id| rt.heap.get(id))
        .transpose()?
        .and_then(|object| object.bound_method().cloned())
        .ok_or_else(|| ExcType::type_error("not a Method object"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ArgValues;

    #[test]
    fn method_object_resends_to_receiver() {
        let mut rt = Runtime::new();
        let method = rt
            .call(&Value::Int(40), "method", [Value::symbol("+")].into())
            .unwrap();
        let sum = rt.call(&method, "call", [Value::Int(2)].into()).unwrap();
        assert_eq!(sum, Value::Int(42));
        let owner = rt.call(&method, "owner", ArgValues::new()).unwrap();
        assert_eq!(owner, Value::Class(rt.core().integer));
        assert_eq!(rt.inspect(&method).unwrap(), "#<Method: Integer#+>");
    }
}

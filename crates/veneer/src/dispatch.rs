//! Message dispatch.
//!
//! A send looks the name up on the receiver's singleton table and then along
//! its real class chain. A public definition (or any definition, for `send`)
//! runs; an undefined marker, a missing name, or a private method reached by a
//! public call all end in the receiver's `method_missing`, which for
//! delegators is where forwarding happens.

use std::rc::Rc;

use crate::{
    args::{ArgValues, CallFrame},
    builtins,
    exception::{ExcType, Exception, RunResult},
    runtime::Runtime,
    types::{FoundMethod, Lookup, MethodBody, MethodEntry, MethodOwner},
    value::Value,
};

impl Runtime {
    /// Sends `name` as a public call: private methods are not reachable.
    pub fn call(&mut self, receiver: &Value, name: &str, args: ArgValues) -> RunResult<Value> {
        self.dispatch(receiver, name, args, false)
    }

    /// Sends `name` ignoring visibility, as `send`/`__send__` do.
    pub fn send(&mut self, receiver: &Value, name: &str, args: ArgValues) -> RunResult<Value> {
        self.dispatch(receiver, name, args, true)
    }

    /// Invokes the next definition of the running method above where it was found.
    ///
    /// When no ancestor defines it, the message falls through to the
    /// receiver's `method_missing`; for a delegator that forwards the original
    /// name and arguments to the target.
    pub fn call_super(&mut self, frame: &CallFrame, args: ArgValues) -> RunResult<Value> {
        let start = match frame.owner() {
            MethodOwner::Singleton => Some(self.class_of(frame.receiver())?),
            MethodOwner::Class(class) => self.classes.get(class).superclass(),
        };
        self.enter()?;
        let result = match self.classes.find_from(start, frame.name()).callable(true) {
            Some(found) => self.invoke(frame.receiver().clone(), frame.name(), found, args),
            None => {
                self.tracer.on_super_fallthrough(frame.name(), self.depth);
                self.invoke_method_missing(frame.receiver(), frame.name(), args)
            }
        };
        self.depth -= 1;
        result
    }

    fn dispatch(&mut self, receiver: &Value, name: &str, args: ArgValues, allow_private: bool) -> RunResult<Value> {
        self.enter()?;
        let result = match self.lookup(receiver, name) {
            Ok(lookup) => match lookup.callable(allow_private) {
                Some(found) => self.invoke(receiver.clone(), name, found, args),
                None => self.invoke_method_missing(receiver, name, args),
            },
            Err(err) => Err(err),
        };
        self.depth -= 1;
        result
    }

    fn enter(&mut self) -> RunResult<()> {
        self.limits.check_depth(self.depth + 1)?;
        self.depth += 1;
        Ok(())
    }

    /// Resolves `name` for `receiver` without running anything.
    pub(crate) fn lookup(&self, receiver: &Value, name: &str) -> RunResult<Lookup> {
        let class = match receiver {
            Value::Ref(id) => {
                let object = self.heap.get(*id)?;
                if let Some(table) = &object.singleton {
                    match table.get(name) {
                        Some(MethodEntry::Defined { body, visibility }) => {
                            return Ok(Lookup::Found(FoundMethod {
                                owner: MethodOwner::Singleton,
                                body: body.clone(),
                                visibility: *visibility,
                            }));
                        }
                        Some(MethodEntry::Undefined) => return Ok(Lookup::Undefined),
                        None => {}
                    }
                }
                object.class
            }
            other => self.class_of(other)?,
        };
        Ok(self.classes.find_from(Some(class), name))
    }

    fn invoke(&mut self, receiver: Value, name: &str, found: FoundMethod, args: ArgValues) -> RunResult<Value> {
        match found.owner {
            MethodOwner::Singleton => self.tracer.on_local(name, "singleton", self.depth),
            MethodOwner::Class(class) => self.tracer.on_local(name, self.classes.get(class).name(), self.depth),
        }
        let frame = CallFrame {
            receiver,
            name: Rc::from(name),
            owner: found.owner,
            args,
        };
        match found.body {
            MethodBody::Builtin(builtin) => builtins::call(self, builtin, &frame),
            MethodBody::Host(body) => body(self, &frame),
        }
    }

    /// Hands an unanswered message to the receiver's `method_missing`.
    fn invoke_method_missing(&mut self, receiver: &Value, name: &str, mut args: ArgValues) -> RunResult<Value> {
        match self.lookup(receiver, "method_missing")?.callable(true) {
            Some(found) => {
                args.prepend(Value::symbol(name));
                self.invoke(receiver.clone(), "method_missing", found, args)
            }
            None => Err(self.not_found(receiver, name)),
        }
    }

    /// Builds the `NotFound` error for `operation` on `receiver`.
    ///
    /// The reported type is the class of the innermost non-delegator reached
    /// by following targets, read structurally so a broken `class` on a
    /// target cannot mask the original error.
    pub(crate) fn not_found(&mut self, receiver: &Value, operation: &str) -> Exception {
        let receiver_type = self.reported_type_name(receiver);
        self.tracer.on_not_found(operation, &receiver_type);
        ExcType::not_found(operation, &receiver_type)
    }

    fn reported_type_name(&self, receiver: &Value) -> String {
        let mut current = receiver.clone();
        for _ in 0..self.limits.max_depth {
            match self.target_of(&current) {
                Ok(target) => current = target,
                Err(_) => break,
            }
        }
        self.class_name_of(&current)
            .unwrap_or_else(|_| "released object".to_owned())
    }

    /// Reports a delegator forwarding `operation` to `target`.
    pub(crate) fn trace_forward(&mut self, operation: &str, target: &Value) -> RunResult<()> {
        let target_type = self.class_name_of(target)?;
        self.tracer.on_forward(operation, &target_type, self.depth);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DispatchLimits, NoopTracer, types::Visibility};

    #[test]
    fn private_methods_need_send() {
        let mut rt = Runtime::new();
        let plain = rt.define_class("Plain", None).unwrap();
        rt.define_private_method(plain, "secret", |_, _| Ok(Value::Int(7))).unwrap();
        let object = rt.instantiate(plain, ArgValues::new()).unwrap();

        let err = rt.call(&object, "secret", ArgValues::new()).unwrap_err();
        assert_eq!(err.exc_type(), ExcType::NotFound);
        assert_eq!(rt.send(&object, "secret", ArgValues::new()).unwrap(), Value::Int(7));
        assert!(matches!(
            rt.lookup(&object, "secret").unwrap(),
            Lookup::Found(FoundMethod {
                visibility: Visibility::Private,
                ..
            })
        ));
    }

    #[test]
    fn depth_counter_unwinds_after_errors() {
        let mut rt = Runtime::with_config(DispatchLimits::new().max_depth(8), NoopTracer);
        let plain = rt.define_class("Plain", None).unwrap();
        rt.define_method(plain, "spin", |rt, frame| rt.call(frame.receiver(), "spin", ArgValues::new()))
            .unwrap();
        let object = rt.instantiate(plain, ArgValues::new()).unwrap();

        let err = rt.call(&object, "spin", ArgValues::new()).unwrap_err();
        assert_eq!(err.exc_type(), ExcType::RecursionError);
        assert_eq!(rt.depth, 0);
        assert_eq!(rt.call(&Value::Int(1), "+", [Value::Int(1)].into()).unwrap(), Value::Int(2));
    }

    #[test]
    fn singleton_methods_shadow_the_class() {
        let mut rt = Runtime::new();
        let plain = rt.define_class("Plain", None).unwrap();
        rt.define_method(plain, "size", |_, _| Ok(Value::Int(1))).unwrap();
        rt.define_method(plain, "label", |_, _| Ok(Value::str("plain"))).unwrap();
        let object = rt.instantiate(plain, ArgValues::new()).unwrap();
        rt.define_singleton_method(&object, "size", |rt, frame| {
            let inner = rt.call_super(frame, ArgValues::new())?;
            rt.call(&inner, "+", [Value::Int(10)].into())
        })
        .unwrap();

        assert_eq!(rt.call(&object, "size", ArgValues::new()).unwrap(), Value::Int(11));
        assert_eq!(rt.call(&object, "label", ArgValues::new()).unwrap(), Value::str("plain"));
    }
}

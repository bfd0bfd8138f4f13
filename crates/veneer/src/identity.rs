//! Host-side shorthands for the identity and equality messages.
//!
//! Each of these is a plain message send, so a delegator answers them exactly
//! as it would answer the message: `object_id`, `equal?` and `__id__` from
//! its own identity, everything else from its target.

use crate::{
    args::ArgValues,
    builtins::{inspect_value, to_s_value},
    exception::{ExcType, RunResult},
    runtime::Runtime,
    types::ClassId,
    value::Value,
};

impl Runtime {
    /// `respond_to?(operation, include_private)`.
    pub fn responds_to(&mut self, value: &Value, operation: &str, include_private: bool) -> RunResult<bool> {
        let answer = self.call(
            value,
            "respond_to?",
            [Value::symbol(operation), Value::Bool(include_private)].into(),
        )?;
        Ok(answer.is_truthy())
    }

    /// The class `value` claims to be; the target's class for a delegator.
    pub fn reported_class(&mut self, value: &Value) -> RunResult<ClassId> {
        self.call(value, "class", ArgValues::new())?
            .as_class()
            .ok_or_else(|| ExcType::type_error("class did not return a class"))
    }

    pub fn is_a(&mut self, value: &Value, class: ClassId) -> RunResult<bool> {
        self.predicate(value, "is_a?", class)
    }

    pub fn kind_of(&mut self, value: &Value, class: ClassId) -> RunResult<bool> {
        self.predicate(value, "kind_of?", class)
    }

    pub fn instance_of(&mut self, value: &Value, class: ClassId) -> RunResult<bool> {
        self.predicate(value, "instance_of?", class)
    }

    fn predicate(&mut self, value: &Value, operation: &str, class: ClassId) -> RunResult<bool> {
        Ok(self.call(value, operation, [Value::Class(class)].into())?.is_truthy())
    }

    /// `a == b`.
    pub fn equals(&mut self, a: &Value, b: &Value) -> RunResult<bool> {
        Ok(self.call(a, "==", [b.clone()].into())?.is_truthy())
    }

    /// `a.equal?(b)`: same object.
    pub fn same_object(&mut self, a: &Value, b: &Value) -> RunResult<bool> {
        Ok(self.call(a, "equal?", [b.clone()].into())?.is_truthy())
    }

    /// `object_id`.
    pub fn object_id(&mut self, value: &Value) -> RunResult<i64> {
        self.call(value, "object_id", ArgValues::new())?
            .as_int()
            .ok_or_else(|| ExcType::type_error("object_id did not return an Integer"))
    }

    /// `inspect`, which must return a string.
    pub fn inspect(&mut self, value: &Value) -> RunResult<String> {
        inspect_value(self, value)
    }

    /// `to_s`, which must return a string.
    pub fn to_s(&mut self, value: &Value) -> RunResult<String> {
        to_s_value(self, value)
    }

    /// `dup`.
    pub fn dup(&mut self, value: &Value) -> RunResult<Value> {
        self.call(value, "dup", ArgValues::new())
    }

    /// `clone`.
    pub fn clone_object(&mut self, value: &Value) -> RunResult<Value> {
        self.call(value, "clone", ArgValues::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delegator_reports_target_class_but_keeps_its_identity() {
        let mut rt = Runtime::new();
        let wrapper = rt.define_delegator_class("Wrapper").unwrap();
        let target = Value::str("target");
        let proxy = rt.wrap(wrapper, target.clone()).unwrap();

        assert_eq!(rt.reported_class(&proxy).unwrap(), rt.core().string);
        assert!(rt.equals(&proxy, &target).unwrap());
        assert!(!rt.same_object(&proxy, &target).unwrap());
        assert_eq!(rt.object_id(&proxy).unwrap(), proxy.object_id());
        assert_ne!(rt.object_id(&proxy).unwrap(), target.object_id());
    }
}

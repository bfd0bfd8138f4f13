//! Case-match (`===`) for classes, with an opt-in delegator-aware extension.
//!
//! By default `Class#===` checks the value's real class chain, so a wrapper
//! around a `String` does not match `String`. Once a class is extended with
//! [`Runtime::extend_case_match`], its `===` also consults `value.is_a?(class)`,
//! which delegators answer from their target.

use crate::{
    exception::RunResult,
    runtime::Runtime,
    types::ClassId,
    value::Value,
};

impl Runtime {
    /// Makes `class === value` also accept values whose `is_a?(class)` is true.
    ///
    /// Subclasses of `class` inherit the extension. Extending twice has no
    /// further effect.
    pub fn extend_case_match(&mut self, class: ClassId) -> RunResult<()> {
        let class = self.classes.check(class)?;
        self.classes.set_case_match_ext(class);
        Ok(())
    }

    /// Whether `class` or one of its superclasses was extended.
    #[must_use]
    pub fn case_match_extended(&self, class: ClassId) -> bool {
        self.classes.contains(class)
            && self
                .classes
                .ancestors(class)
                .into_iter()
                .any(|ancestor| self.classes.get(ancestor).case_match_ext())
    }

    /// `pattern === value`.
    pub fn case_match(&mut self, pattern: &Value, value: &Value) -> RunResult<bool> {
        Ok(self.call(pattern, "===", [value.clone()].into())?.is_truthy())
    }
}

/// `Class#===`.
pub(crate) fn class_case_eq(rt: &mut Runtime, class: ClassId, value: &Value) -> RunResult<bool> {
    let real = rt.class_of(value)?;
    if rt.classes.is_subclass_of(real, class) {
        return Ok(true);
    }
    if !rt.case_match_extended(class) {
        return Ok(false);
    }
    Ok(rt.call(value, "is_a?", [Value::Class(class)].into())?.is_truthy())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_inherited_by_subclasses_only() {
        let mut rt = Runtime::new();
        let base = rt.define_class("Beverage", None).unwrap();
        let child = rt.define_class("Espresso", Some(base)).unwrap();
        rt.extend_case_match(child).unwrap();
        rt.extend_case_match(child).unwrap();
        assert!(rt.case_match_extended(child));
        assert!(!rt.case_match_extended(base));

        let grandchild = rt.define_class("Doppio", Some(child)).unwrap();
        assert!(rt.case_match_extended(grandchild));
    }
}

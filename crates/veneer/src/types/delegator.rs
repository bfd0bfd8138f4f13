//! The target cell held by every delegator.

use crate::{
    exception::{ExcType, RunResult},
    heap::HeapId,
    value::Value,
};

/// Holds a delegator's single target reference.
///
/// The field is private and [`TargetCell::set`] is its only mutator, so the
/// self-delegation check cannot be bypassed by construction, copying or
/// unmarshalling.
#[derive(Debug, Clone)]
pub(crate) struct TargetCell {
    target: Value,
}

impl TargetCell {
    /// A cell for a freshly allocated delegator whose `initialize` has not run yet.
    pub fn unset() -> Self {
        Self { target: Value::Nil }
    }

    pub fn get(&self) -> &Value {
        &self.target
    }

    /// Replaces the target held by the delegator `owner`.
    ///
    /// Fails without touching the cell when `target` is `owner` itself.
    /// Longer cycles through other delegators are not detected.
    pub fn set(&mut self, owner: HeapId, target: Value) -> RunResult<()> {
        if target.heap_id() == Some(owner) {
            return Err(ExcType::self_delegation());
        }
        self.target = target;
        Ok(())
    }
}

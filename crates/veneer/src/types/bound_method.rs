use super::MethodOwner;
use crate::value::Value;

/// A `Method` object returned by `method(name)`.
///
/// Calling it sends `name` to `receiver` again, so a method obtained from a
/// delegator for an operation only its target has still dispatches through
/// the delegator.
#[derive(Debug, Clone)]
pub(crate) struct BoundMethod {
    pub receiver: Value,
    pub name: String,
    /// `None` when the receiver only answers the name through `respond_to_missing?`.
    pub owner: Option<MethodOwner>,
}

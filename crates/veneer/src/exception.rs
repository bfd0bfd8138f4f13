use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, IntoStaticStr};

/// Result type alias for operations that can raise inside the runtime.
pub type RunResult<T> = Result<T, Exception>;

/// Error kinds the runtime can raise.
///
/// Uses strum derives for automatic `Display`, `FromStr`, and `Into<&'static str>` implementations.
/// The string representation matches the variant name exactly (e.g., `NotFound` -> "NotFound").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, Serialize, Deserialize)]
pub enum ExcType {
    /// A bad operand: wrong argument count, a malformed name, or a delegator asked to wrap itself.
    InvalidOperand,
    /// Neither the receiver's own surface nor its `method_missing` answered the operation.
    NotFound,
    /// An operand had the wrong type for the operation.
    TypeError,
    ZeroDivisionError,
    /// Integer arithmetic overflowed.
    RangeError,
    IndexError,
    /// Mutation of a frozen object.
    FrozenError,
    /// The dispatch depth limit was exceeded.
    RecursionError,
    /// Generic error, raised by host-defined methods or by misuse of the runtime.
    RuntimeError,
}

impl ExcType {
    /// Wrong number of arguments passed to `name`.
    #[must_use]
    pub(crate) fn arg_count(name: &str, expected: &str, given: usize) -> Exception {
        Exception::new(
            Self::InvalidOperand,
            format!("wrong number of arguments calling '{name}' (given {given}, expected {expected})"),
        )
    }

    /// A delegator was asked to forward to itself.
    #[must_use]
    pub(crate) fn self_delegation() -> Exception {
        Exception::new(Self::InvalidOperand, "Delegation to self is not allowed.")
    }

    /// No surface answered `operation`; `receiver_type` is the receiver's reported class name.
    #[must_use]
    pub(crate) fn not_found(operation: &str, receiver_type: &str) -> Exception {
        Exception {
            exc_type: Self::NotFound,
            message: Some(format!(
                "undefined method '{operation}' for an instance of {receiver_type}"
            )),
            missing: Some(MissingOperation {
                operation: operation.to_owned(),
                receiver_type: receiver_type.to_owned(),
            }),
        }
    }

    #[must_use]
    pub(crate) fn type_error(message: impl Into<String>) -> Exception {
        Exception::new(Self::TypeError, message)
    }

    #[must_use]
    pub(crate) fn frozen(receiver_type: &str) -> Exception {
        Exception::new(Self::FrozenError, format!("can't modify frozen {receiver_type}"))
    }

    #[must_use]
    pub(crate) fn released_object() -> Exception {
        Exception::new(Self::RuntimeError, "use of released object")
    }
}

/// The operation and receiver type attached to a `NotFound` error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingOperation {
    /// Name of the operation that nothing answered.
    pub operation: String,
    /// The receiver's reported class name, which for a delegator is its target's class.
    pub receiver_type: String,
}

/// An error raised inside the runtime.
///
/// Errors raised by host-defined methods and by forwarded calls pass through
/// dispatch unchanged, so a caller sees exactly the value that was raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exception {
    exc_type: ExcType,
    message: Option<String>,
    missing: Option<MissingOperation>,
}

impl Exception {
    /// Creates an error with a message.
    #[must_use]
    pub fn new(exc_type: ExcType, message: impl Into<String>) -> Self {
        Self {
            exc_type,
            message: Some(message.into()),
            missing: None,
        }
    }

    /// Shorthand for a `RuntimeError`, the kind host methods usually raise.
    #[must_use]
    pub fn runtime_error(message: impl Into<String>) -> Self {
        Self::new(ExcType::RuntimeError, message)
    }

    #[must_use]
    pub fn exc_type(&self) -> ExcType {
        self.exc_type
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// For `NotFound` errors, the missing operation and reported receiver type.
    #[must_use]
    pub fn missing_operation(&self) -> Option<&MissingOperation> {
        self.missing.as_ref()
    }
}

impl fmt::Display for Exception {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{}: {message}", self.exc_type),
            None => write!(f, "{}", self.exc_type),
        }
    }
}

impl std::error::Error for Exception {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_carries_operation_and_receiver_type() {
        let exc = ExcType::not_found("fly", "Coffee");
        assert_eq!(exc.exc_type(), ExcType::NotFound);
        let missing = exc.missing_operation().unwrap();
        assert_eq!(missing.operation, "fly");
        assert_eq!(missing.receiver_type, "Coffee");
        assert_eq!(exc.to_string(), "NotFound: undefined method 'fly' for an instance of Coffee");
    }

    #[test]
    fn exc_type_round_trips_through_its_name() {
        let parsed: ExcType = "InvalidOperand".parse().unwrap();
        assert_eq!(parsed, ExcType::InvalidOperand);
        let name: &'static str = ExcType::FrozenError.into();
        assert_eq!(name, "FrozenError");
    }
}

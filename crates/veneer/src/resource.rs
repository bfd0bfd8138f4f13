use std::fmt;

use crate::exception::{ExcType, Exception};

/// Default maximum nesting of dispatches before `RecursionError` is raised.
///
/// Every `call`/`send` counts as one level, including the `respond_to?` probe
/// a delegator makes before forwarding, so one wrapping layer costs about two
/// levels. The value keeps the host stack comfortably within a default
/// 2 MiB thread stack in debug builds.
pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 200;

/// Limits applied to a [`Runtime`](crate::Runtime).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchLimits {
    /// Maximum nesting of dispatches.
    pub max_depth: usize,
}

impl Default for DispatchLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DISPATCH_DEPTH,
        }
    }
}

impl DispatchLimits {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum dispatch depth.
    #[must_use]
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Called before entering a dispatch at `depth` (1-based).
    pub(crate) fn check_depth(&self, depth: usize) -> Result<(), ResourceError> {
        if depth > self.max_depth {
            Err(ResourceError::Recursion {
                limit: self.max_depth,
                depth,
            })
        } else {
            Ok(())
        }
    }
}

/// Error returned when a configured limit is exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// Maximum dispatch depth exceeded.
    Recursion { limit: usize, depth: usize },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recursion { limit, depth } => {
                write!(f, "stack level too deep: dispatch depth {depth} > {limit}")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

impl From<ResourceError> for Exception {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::Recursion { .. } => Self::new(ExcType::RecursionError, err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_at_limit_is_allowed() {
        let limits = DispatchLimits::new().max_depth(3);
        assert!(limits.check_depth(3).is_ok());
        assert_eq!(
            limits.check_depth(4),
            Err(ResourceError::Recursion { limit: 3, depth: 4 })
        );
    }

    #[test]
    fn recursion_maps_to_recursion_error() {
        let exc: Exception = ResourceError::Recursion { limit: 1, depth: 2 }.into();
        assert_eq!(exc.exc_type(), ExcType::RecursionError);
    }
}

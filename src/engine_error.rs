//! Error taxonomy of the engine. Validation and capability failures map to
//! HTTP 400 at the boundary; internal numerical failures map to 500.
//! Non-convergence is deliberately NOT represented here: solvers report it
//! through their result structs and the response stays 200.

use std::fmt;

/// Unified error for request decoding and engine-side validation.
#[derive(Debug)]
pub enum EngineError {
    /// Malformed or out-of-range input that does not fit a more specific variant.
    Validation(String),
    /// Two arrays that must agree in length do not.
    InvalidLength { expected: usize, found: usize },
    /// A numeric field contained NaN or infinity.
    NonFinite(&'static str),
    /// Chain preset id not present in the registry.
    UnknownChain(String),
    /// Degree-of-freedom count outside `[1, MAX_DOF]`.
    DofOutOfRange(usize),
    /// A request exceeded one of the decode-time resource ceilings.
    ResourceLimit {
        what: &'static str,
        limit: usize,
        found: usize,
    },
    /// Numerical failure the solver could not recover from.
    Internal(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            EngineError::Validation(ref msg) => write!(f, "{}", msg),
            EngineError::InvalidLength { expected, found } => {
                write!(f, "invalid length: expected {}, found {}", expected, found)
            }
            EngineError::NonFinite(field) => {
                write!(f, "non-finite value in '{}'", field)
            }
            EngineError::UnknownChain(ref id) => write!(f, "unknown chain '{}'", id),
            EngineError::DofOutOfRange(dof) => {
                write!(f, "joint count {} outside supported range", dof)
            }
            EngineError::ResourceLimit { what, limit, found } => {
                write!(f, "{} limit exceeded: {} > {}", what, found, limit)
            }
            EngineError::Internal(ref msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for EngineError {}

impl EngineError {
    /// True for failures that are the server's fault rather than the caller's.
    pub fn is_internal(&self) -> bool {
        matches!(self, EngineError::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let e = EngineError::InvalidLength {
            expected: 5,
            found: 3,
        };
        assert_eq!(e.to_string(), "invalid length: expected 5, found 3");

        let e = EngineError::UnknownChain("wristwatch".into());
        assert_eq!(e.to_string(), "unknown chain 'wristwatch'");
    }

    #[test]
    fn test_internal_classification() {
        assert!(EngineError::Internal("singular".into()).is_internal());
        assert!(!EngineError::DofOutOfRange(65).is_internal());
        assert!(!EngineError::NonFinite("target_position").is_internal());
    }
}

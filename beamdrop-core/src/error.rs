//! Structured error types for the BeamDrop bridge.
//!
//! Library crates return `BridgeError`; the `beamdrop` binary wraps it in
//! `anyhow` at the edge. Every variant maps to a stable wire `kind` so rendered
//! pages can branch on it without parsing messages.

use std::fmt;
use thiserror::Error;

/// Boxed cause carried by [`BridgeError::InvocationFailed`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// What a lookup or registration was addressing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Service,
    Method,
    Event,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Resource::Service => "service",
            Resource::Method => "method",
            Resource::Event => "event",
        };
        f.write_str(name)
    }
}

/// Main error type for bridge operations
#[derive(Error, Debug)]
pub enum BridgeError {
    /// Unknown service, method or event name
    #[error("unknown {resource} '{name}'")]
    NotFound { resource: Resource, name: String },

    /// Call arguments did not match the declared signature
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// Payload type does not match the type registered for the event
    #[error("event '{event}' carries {expected}, got {actual}")]
    TypeMismatch {
        event: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Event name registered twice with different payload types
    #[error("event '{event}' already registered as {registered}, cannot re-register as {requested}")]
    TypeConflict {
        event: String,
        registered: &'static str,
        requested: &'static str,
    },

    /// Name already taken in the service registry
    #[error("{resource} '{name}' is already registered")]
    Duplicate { resource: Resource, name: String },

    /// The target method returned an error
    #[error("{service}.{method} failed: {source}")]
    InvocationFailed {
        service: String,
        method: String,
        #[source]
        source: BoxError,
    },

    /// Host is not accepting work (not started, or shutting down)
    #[error("host unavailable: {reason}")]
    Unavailable { reason: String },

    /// Configuration error
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// Startup or run-loop failure; terminates the process
    #[error("fatal: {reason}")]
    Fatal { reason: String },
}

/// Result type alias for bridge operations
pub type Result<T> = std::result::Result<T, BridgeError>;

impl BridgeError {
    pub fn not_found(resource: Resource, name: impl Into<String>) -> Self {
        Self::NotFound {
            resource,
            name: name.into(),
        }
    }

    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn duplicate(resource: Resource, name: impl Into<String>) -> Self {
        Self::Duplicate {
            resource,
            name: name.into(),
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    pub fn fatal(reason: impl Into<String>) -> Self {
        Self::Fatal {
            reason: reason.into(),
        }
    }

    /// Stable wire identifier for this error, shared with the UI.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidArgument { .. } | Self::TypeMismatch { .. } => "invalid_argument",
            Self::TypeConflict { .. } => "type_conflict",
            Self::Duplicate { .. } => "duplicate",
            Self::InvocationFailed { .. } => "invocation_failed",
            Self::Unavailable { .. } => "unavailable",
            Self::Config { .. } => "config",
            Self::Fatal { .. } => "fatal",
        }
    }

    /// Whether this error must abort the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BridgeError::not_found(Resource::Service, "Missing");
        assert_eq!(err.to_string(), "unknown service 'Missing'");

        let err = BridgeError::TypeConflict {
            event: "x".into(),
            registered: "i64",
            requested: "alloc::string::String",
        };
        assert!(err.to_string().contains("already registered as i64"));
    }

    #[test]
    fn test_type_mismatch_reports_invalid_argument() {
        let err = BridgeError::TypeMismatch {
            event: "time".into(),
            expected: "alloc::string::String",
            actual: "i32",
        };
        assert_eq!(err.kind(), "invalid_argument");
        assert!(!err.is_fatal());
    }

    #[test]
    fn test_invocation_failed_keeps_source() {
        use std::error::Error as _;

        let err = BridgeError::InvocationFailed {
            service: "GreetService".into(),
            method: "Greet".into(),
            source: "boom".into(),
        };
        assert_eq!(err.kind(), "invocation_failed");
        assert_eq!(err.source().map(|s| s.to_string()), Some("boom".to_string()));
    }
}

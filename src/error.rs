//! Error types used by the broadcaster and its endpoints.
//!
//! This module defines three enums:
//!
//! - [`TryRecvError`]: outcome of a non-blocking receive on an endpoint.
//! - [`ConvertError`]: a broadcast value did not match the type a typed view declared.
//! - [`SendError`]: outcome of a single delivery attempt (crate-internal).
//!
//! None of these are returned by the broadcaster operations themselves: fan-out,
//! registration and removal have no recoverable failure modes. A [`ConvertError`]
//! is a producer contract violation and is raised as a panic in the forwarding task.

use thiserror::Error;

/// # Errors produced by [`Receiver::try_recv`](crate::Receiver::try_recv).
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TryRecvError {
    /// No value is buffered right now, but the endpoint is still open.
    #[error("endpoint is empty")]
    Empty,

    /// The endpoint was closed by `reset`/`close` and every buffered value was drained.
    #[error("endpoint is closed")]
    Closed,
}

impl TryRecvError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use fanout::TryRecvError;
    ///
    /// assert_eq!(TryRecvError::Closed.as_label(), "endpoint_closed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TryRecvError::Empty => "endpoint_empty",
            TryRecvError::Closed => "endpoint_closed",
        }
    }
}

/// # Errors produced when a type-erased value is converted back to a concrete type.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvertError {
    /// The carried value has a different concrete type than the one requested.
    #[error("type mismatch: expected `{expected}`, found `{found}`")]
    TypeMismatch {
        /// Type requested by the receiving side.
        expected: &'static str,
        /// Type actually carried by the payload.
        found: &'static str,
    },
}

impl ConvertError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ConvertError::TypeMismatch { .. } => "convert_type_mismatch",
        }
    }
}

/// # Outcome of a single delivery to one endpoint.
///
/// Only reported through logs; a broadcast never fails because one consumer went away.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// The receiving half was dropped before (or while) the value was delivered.
    #[error("receiver dropped")]
    Disconnected,
}

impl SendError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SendError::Disconnected => "send_disconnected",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        assert_eq!(TryRecvError::Empty.as_label(), "endpoint_empty");
        assert_eq!(TryRecvError::Closed.as_label(), "endpoint_closed");
        assert_eq!(SendError::Disconnected.as_label(), "send_disconnected");

        let err = ConvertError::TypeMismatch {
            expected: "i32",
            found: "&str",
        };
        assert_eq!(err.as_label(), "convert_type_mismatch");
    }

    #[test]
    fn type_mismatch_names_both_types() {
        let err = ConvertError::TypeMismatch {
            expected: "u64",
            found: "alloc::string::String",
        };
        assert_eq!(
            err.to_string(),
            "type mismatch: expected `u64`, found `alloc::string::String`"
        );
    }
}

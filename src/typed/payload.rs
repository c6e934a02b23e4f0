//! # Type-erased carrier for untyped broadcasts.
//!
//! [`Payload`] wraps any `Send + Sync + 'static` value behind an `Arc<dyn Any>`,
//! remembering the concrete type name so a failed conversion can say what it found.
//! Cloning a payload is cheap (one `Arc` clone), which is what fan-out does per listener.

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use crate::error::ConvertError;

/// Cloneable, type-erased broadcast value.
#[derive(Clone)]
pub struct Payload {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl Payload {
    /// Erases `value`.
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            value: Arc::new(value),
            type_name: type_name::<T>(),
        }
    }

    /// Concrete type name of the carried value.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the carried value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.value.is::<T>()
    }

    /// Borrows the carried value as a `T`, if it is one.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Clones the carried value out as a `T`.
    ///
    /// Fails with [`ConvertError::TypeMismatch`] when the value has another type.
    pub fn downcast<T: Any + Clone>(&self) -> Result<T, ConvertError> {
        self.downcast_ref::<T>()
            .cloned()
            .ok_or(ConvertError::TypeMismatch {
                expected: type_name::<T>(),
                found: self.type_name,
            })
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}

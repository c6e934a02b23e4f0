//! Untyped fan-out: the listener registry and the delivery algorithm.
//!
//! ## Contents
//! - [`Broadcaster`] registry of endpoints plus `listen`/`broadcast`/`remove`/`reset`/`close`
//!
//! See [`crate::typed`] for the value-typed wrapper built on top of it.

mod broadcaster;

pub use broadcaster::Broadcaster;

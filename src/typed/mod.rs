//! Value-typed fan-out on top of the untyped [`Broadcaster`](crate::Broadcaster).
//!
//! ## Contents
//! - [`Payload`] cloneable type-erased carrier moved by the untyped broadcaster
//! - [`TypedBroadcaster`] typed `listen`/`broadcast`/`remove` with one forwarder per listener
//! - [`ErrorBroadcaster`], [`SharedError`] the error-reporting instantiation

mod payload;
mod view;

pub use payload::Payload;
pub use view::{ErrorBroadcaster, SharedError, TypedBroadcaster};

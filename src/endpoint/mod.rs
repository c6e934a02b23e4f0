//! Listener endpoints: per-consumer bounded queues created by `listen`.
//!
//! ## Contents
//! - [`Receiver`] the consumer half handed out by `listen`
//! - [`ListenerId`] identity used by `remove`
//! - `Sender` / `channel` crate-internal producer half

mod channel;

pub(crate) use channel::{Sender, channel};
pub use channel::{ListenerId, Receiver};

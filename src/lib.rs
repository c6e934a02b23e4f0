//! # fanout
//!
//! **fanout** is a minimal in-process broadcast primitive for Rust.
//!
//! A single writer pushes a value and every currently registered listener receives
//! exactly that value. It is a building block for fanning status or error events out
//! to several internal observers, not a network message bus.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!                   producer
//!                      │ broadcast(T)
//!                      ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  TypedBroadcaster<T>                                              │
//! │  - erases T into Payload                                          │
//! │  - one forwarder task per listener (Payload → T)                  │
//! └──────────────────────────────┬────────────────────────────────────┘
//!                                ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Broadcaster<Payload>                                             │
//! │  - registry of endpoints (one mutex, held for the whole fan-out)  │
//! │  - concurrent delivery, joined before broadcast() returns         │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!    [endpoint 1]       [endpoint 2]       [endpoint N]     bounded, depth = capacity
//!        ▼                  ▼                  ▼
//!    forwarder 1        forwarder 2        forwarder N      (typed view only)
//!        ▼                  ▼                  ▼
//!    consumer 1         consumer 2         consumer N
//! ```
//!
//! ### Endpoint lifecycle
//! ```text
//! listen() ──► Open ──┬── remove() ──► Open, never written again
//!                     ├── reset()  ──► Closed, unregistered (drains, then None)
//!                     └── close()  ──► Closed, still registered, skipped by broadcast
//! ```
//!
//! ## Features
//! | Area              | Description                                                    | Key types                              |
//! |-------------------|----------------------------------------------------------------|----------------------------------------|
//! | **Fan-out**       | Snapshot delivery to all listeners with backpressure.          | [`Broadcaster`]                        |
//! | **Endpoints**     | Per-listener bounded queues; capacity 0 is a rendezvous.       | [`Receiver`], [`ListenerId`]           |
//! | **Typed view**    | Send and receive a concrete `T` over the untyped carrier.      | [`TypedBroadcaster`], [`Payload`]      |
//! | **Errors**        | Error fan-out with `None` as the "no error" sentinel.          | [`ErrorBroadcaster`], [`SharedError`]  |
//! | **Configuration** | Per-instance endpoint capacity.                                | [`BroadcasterConfig`]                  |
//!
//! ## Logging
//! Registry changes are reported through [`tracing`] at `debug`, deliveries at `trace`,
//! and conversion faults at `error`. The crate never installs a subscriber.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use fanout::{ErrorBroadcaster, SharedError};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let errors = ErrorBroadcaster::new(4);
//!     let mut audit = errors.listen().await;
//!     let mut alerts = errors.listen().await;
//!
//!     let err: SharedError = Arc::new(std::io::Error::other("upstream down"));
//!     errors.broadcast(Some(err)).await;
//!     errors.broadcast(None).await;
//!
//!     assert!(audit.recv().await.flatten().is_some());
//!     assert!(alerts.recv().await.flatten().is_some());
//!     assert!(matches!(audit.recv().await, Some(None)));
//!
//!     errors.reset().await;
//!     assert!(matches!(alerts.recv().await, Some(None)));
//!     assert!(alerts.recv().await.is_none());
//! }
//! ```
mod broadcast;
mod config;
mod endpoint;
mod error;
mod typed;

// ---- Public re-exports ----

pub use broadcast::Broadcaster;
pub use config::BroadcasterConfig;
pub use endpoint::{ListenerId, Receiver};
pub use error::{ConvertError, TryRecvError};
pub use typed::{ErrorBroadcaster, Payload, SharedError, TypedBroadcaster};

//! # Value-typed view over an untyped broadcaster.
//!
//! [`TypedBroadcaster<T>`] lets producers send a `T` and consumers receive a `T`
//! while the underlying [`Broadcaster`] only moves [`Payload`]s.
//!
//! ## Architecture
//! ```text
//! broadcast(T) ──► Payload::new ──► Broadcaster<Payload>
//!                                        │
//!                 ┌──────────────────────┼──────────────────────┐
//!                 ▼                      ▼                      ▼
//!           [raw endpoint]         [raw endpoint]         [raw endpoint]
//!                 │                      │                      │
//!             forwarder              forwarder              forwarder
//!           (downcast::<T>)        (downcast::<T>)        (downcast::<T>)
//!                 ▼                      ▼                      ▼
//!          [typed endpoint]       [typed endpoint]       [typed endpoint]
//!                 ▼                      ▼                      ▼
//!             consumer 1             consumer 2             consumer N
//! ```
//!
//! ## Listener states
//! ```text
//! Open ──(raw endpoint closed by reset/close)──► Draining ──(raw drained)──► Closed
//! ```
//! - `remove` detaches the raw endpoint only: the typed endpoint stays `Open` but silent.
//! - A forwarder stops as soon as its consumer drops the typed endpoint, removed or not.
//!   Records of dropped consumers are pruned on the next `listen`/`len`.
//!
//! ## Locking
//! The view's record lock is always taken before the raw broadcaster's lock, and held
//! across the raw call in `listen`, `remove` and `reset`, so records and raw registry
//! never disagree.
//!
//! ## Conversion faults
//! A raw value that is not a `T` can only come from someone broadcasting on a shared
//! raw broadcaster (see [`TypedBroadcaster::attach`]). The forwarder logs it and panics;
//! the typed endpoint is closed while unwinding so its consumer sees the end of stream.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, trace};

use crate::broadcast::Broadcaster;
use crate::config::BroadcasterConfig;
use crate::endpoint::{self, ListenerId, Receiver, Sender};
use crate::typed::Payload;

/// Shared error value carried by an [`ErrorBroadcaster`].
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// Typed view for fanning out errors; `None` is the "no error" sentinel.
pub type ErrorBroadcaster = TypedBroadcaster<Option<SharedError>>;

/// Links a typed endpoint back to the raw endpoint feeding it.
struct TypedListener<T> {
    /// Watch-only clone of the forwarder's sender; tells when the consumer is gone.
    typed: Sender<T>,
    raw: ListenerId,
}

/// Broadcaster that sends and receives values of one concrete type.
///
/// ### Example
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use fanout::TypedBroadcaster;
///
/// let bc = TypedBroadcaster::<String>::new(1);
/// let mut rx = bc.listen().await;
///
/// bc.broadcast("ready".to_string()).await;
/// assert_eq!(rx.recv().await.as_deref(), Some("ready"));
/// # }
/// ```
pub struct TypedBroadcaster<T> {
    raw: Arc<Broadcaster<Payload>>,
    listeners: Mutex<Vec<TypedListener<T>>>,
    _type: PhantomData<fn(T) -> T>,
}

impl<T> TypedBroadcaster<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Creates a typed view over a fresh broadcaster with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_config(BroadcasterConfig::with_capacity(capacity))
    }

    /// Creates a typed view over a fresh broadcaster built from `config`.
    #[must_use]
    pub fn with_config(config: BroadcasterConfig) -> Self {
        Self::attach(Arc::new(Broadcaster::with_config(config)))
    }

    /// Creates a typed view over an existing untyped broadcaster.
    ///
    /// Several views may share one raw broadcaster; each one must only see values of
    /// its own type, otherwise its forwarders fault.
    #[must_use]
    pub fn attach(raw: Arc<Broadcaster<Payload>>) -> Self {
        Self {
            raw,
            listeners: Mutex::new(Vec::new()),
            _type: PhantomData,
        }
    }

    /// The underlying untyped broadcaster.
    pub fn raw(&self) -> &Arc<Broadcaster<Payload>> {
        &self.raw
    }

    /// Buffering depth of both raw and typed endpoints.
    pub fn capacity(&self) -> usize {
        self.raw.capacity()
    }

    /// Registers a typed listener.
    ///
    /// Spawns the forwarder on the current tokio runtime; panics outside of one.
    pub async fn listen(&self) -> Receiver<T> {
        let mut listeners = self.listeners.lock().await;
        self.prune(&mut listeners).await;

        let raw_rx = self.raw.listen().await;
        let (typed_tx, typed_rx) = endpoint::channel::<T>(self.raw.capacity());
        let raw = raw_rx.id();

        listeners.push(TypedListener {
            typed: typed_tx.clone(),
            raw,
        });
        tokio::spawn(forward(raw_rx, typed_tx));

        debug!(listener = %typed_rx.id(), raw = %raw, ty = type_name::<T>(), "typed listener registered");
        typed_rx
    }

    /// Erases `value` and broadcasts it to every current listener.
    pub async fn broadcast(&self, value: T) {
        self.raw.broadcast(Payload::new(value)).await;
    }

    /// Detaches a typed listener from future broadcasts.
    ///
    /// Unknown endpoints are ignored. The typed endpoint is not closed, and values its
    /// forwarder already picked up are still delivered.
    pub async fn remove(&self, listener: &Receiver<T>) {
        let mut listeners = self.listeners.lock().await;
        let Some(pos) = listeners.iter().position(|l| l.typed.id() == listener.id()) else {
            trace!(listener = %listener.id(), "remove of unknown typed listener");
            return;
        };
        let record = listeners.remove(pos);
        self.raw.remove_id(record.raw).await;
    }

    /// Closes every listener of the raw broadcaster and forgets them.
    pub async fn reset(&self) {
        let mut listeners = self.listeners.lock().await;
        self.raw.reset().await;
        listeners.clear();
    }

    /// Closes every listener of the raw broadcaster, keeping them registered.
    pub async fn close(&self) {
        self.raw.close().await;
    }

    /// Number of typed listeners registered through this view.
    ///
    /// Listeners whose consumer dropped its endpoint are pruned first and not counted.
    pub async fn len(&self) -> usize {
        let mut listeners = self.listeners.lock().await;
        self.prune(&mut listeners).await;
        listeners.len()
    }

    /// Returns `true` if this view has no registered listener.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Forgets records whose consumer is gone and detaches their raw endpoints.
    async fn prune(&self, listeners: &mut Vec<TypedListener<T>>) {
        let mut gone = Vec::new();
        listeners.retain(|l| {
            let disconnected = l.typed.is_disconnected();
            if disconnected {
                gone.push(l.raw);
            }
            !disconnected
        });
        for raw in gone {
            trace!(raw = %raw, "pruning typed listener with dropped consumer");
            self.raw.remove_id(raw).await;
        }
    }
}

impl<T> fmt::Debug for TypedBroadcaster<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedBroadcaster")
            .field("type", &type_name::<T>())
            .field("raw", &self.raw)
            .finish_non_exhaustive()
    }
}

/// Moves values from a raw endpoint to a typed one until the raw endpoint closes
/// or the consumer drops the typed endpoint.
async fn forward<T>(mut raw: Receiver<Payload>, typed: Sender<T>)
where
    T: Clone + Send + Sync + 'static,
{
    let _close_typed = typed.close_on_drop();

    loop {
        let payload = tokio::select! {
            biased;
            payload = raw.recv() => match payload {
                Some(payload) => payload,
                None => break,
            },
            _ = typed.disconnected() => {
                trace!(listener = %typed.id(), "typed receiver dropped, forwarder exiting");
                return;
            }
        };
        let value = match payload.downcast::<T>() {
            Ok(value) => value,
            Err(err) => {
                error!(listener = %typed.id(), error = %err, "broadcast value has the wrong type");
                panic!("typed listener {}: {err}", typed.id());
            }
        };
        if typed.send(value).await.is_err() {
            trace!(listener = %typed.id(), "typed receiver dropped, forwarder exiting");
            return;
        }
    }
    trace!(listener = %typed.id(), "raw endpoint closed, typed endpoint closing");
}

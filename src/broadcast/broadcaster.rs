//! # Fan-out registry and delivery engine.
//!
//! [`Broadcaster`] owns a list of listener endpoints and pushes every broadcast value
//! to all of them at once.
//!
//! ## Architecture
//! ```text
//! broadcast(v)
//!     │  (registry lock held for the whole call)
//!     ├──► clone ──► [endpoint 1] ──► consumer 1
//!     ├──► clone ──► [endpoint 2] ──► consumer 2
//!     └──► clone ──► [endpoint N] ──► consumer N
//!          join_all: returns once every endpoint accepted its copy
//! ```
//!
//! ## Rules
//! - **Snapshot delivery**: recipients are exactly the endpoints registered when
//!   `broadcast` takes the lock; `listen` calls issued meanwhile wait for it.
//! - **Concurrent fan-out**: copies are sent to all recipients concurrently.
//! - **Backpressure**: a full, undrained endpoint blocks the broadcast, and with it every
//!   other operation waiting on the lock. Size `capacity` or drain promptly.
//! - **Remove does not close**: a removed endpoint stays open but never receives again.
//! - **Close is idempotent**: closed endpoints stay registered and are skipped by
//!   `broadcast`; `reset` closes and forgets everything.
//! - **Drop closes**: dropping the broadcaster closes every endpoint still registered.
//! - **Dropped consumers are pruned**: an endpoint whose receiver was dropped leaves the
//!   registry on the next `listen`, `broadcast` or `len`.

use std::fmt;

use futures::future::join_all;
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::config::BroadcasterConfig;
use crate::endpoint::{self, ListenerId, Receiver, Sender};
use crate::typed::Payload;

/// Broadcasts values to every registered listener.
///
/// Defaults to the type-erased [`Payload`] carrier; use a concrete `T` directly or
/// wrap it in a [`TypedBroadcaster`](crate::TypedBroadcaster).
///
/// ### Example
/// ```rust
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// use fanout::Broadcaster;
///
/// let bc: Broadcaster<u32> = Broadcaster::new(1);
/// let mut a = bc.listen().await;
/// let mut b = bc.listen().await;
///
/// bc.broadcast(42).await;
/// assert_eq!(a.recv().await, Some(42));
/// assert_eq!(b.recv().await, Some(42));
///
/// bc.reset().await;
/// assert_eq!(a.recv().await, None);
/// # }
/// ```
pub struct Broadcaster<T = Payload> {
    capacity: usize,
    listeners: Mutex<Vec<Sender<T>>>,
}

impl<T> Broadcaster<T> {
    /// Creates a broadcaster whose endpoints buffer `capacity` values (`0` = unbuffered).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_config(BroadcasterConfig::with_capacity(capacity))
    }

    /// Creates a broadcaster from a [`BroadcasterConfig`].
    #[must_use]
    pub fn with_config(config: BroadcasterConfig) -> Self {
        Self {
            capacity: config.capacity,
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Buffering depth given to every endpoint.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Registers a new listener and returns its receiving half.
    pub async fn listen(&self) -> Receiver<T> {
        let (tx, rx) = endpoint::channel(self.capacity);

        let mut listeners = self.listeners.lock().await;
        prune_disconnected(&mut listeners);
        listeners.push(tx);
        debug!(listener = %rx.id(), listeners = listeners.len(), "listener registered");
        rx
    }

    /// Detaches `listener` from future broadcasts.
    ///
    /// Matches by identity. Unknown endpoints are ignored. The endpoint is **not**
    /// closed: its consumer simply stops receiving.
    pub async fn remove(&self, listener: &Receiver<T>) {
        self.remove_id(listener.id()).await;
    }

    /// Removes the endpoint with the given id; returns whether it was registered.
    pub(crate) async fn remove_id(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock().await;
        let before = listeners.len();
        listeners.retain(|tx| tx.id() != id);
        let removed = listeners.len() != before;
        debug!(listener = %id, removed, listeners = listeners.len(), "listener removed");
        removed
    }

    /// Closes every registered endpoint and empties the registry.
    ///
    /// Consumers drain what is already buffered, then observe closure.
    pub async fn reset(&self) {
        let mut listeners = self.listeners.lock().await;
        for tx in listeners.iter() {
            tx.close();
        }
        debug!(closed = listeners.len(), "broadcaster reset");
        listeners.clear();
    }

    /// Closes every registered endpoint but keeps them registered.
    ///
    /// Closed endpoints are skipped by later broadcasts. Calling `close` or `reset`
    /// again is harmless. Endpoints registered afterwards are open as usual.
    pub async fn close(&self) {
        let listeners = self.listeners.lock().await;
        for tx in listeners.iter() {
            tx.close();
        }
        debug!(closed = listeners.len(), "broadcaster closed");
    }

    /// Number of registered endpoints, closed ones included.
    ///
    /// Endpoints whose receiver was dropped are pruned first and not counted.
    pub async fn len(&self) -> usize {
        let mut listeners = self.listeners.lock().await;
        prune_disconnected(&mut listeners);
        listeners.len()
    }

    /// Returns `true` if no endpoint is registered.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

/// Drops registry entries whose consumer went away.
fn prune_disconnected<T>(listeners: &mut Vec<Sender<T>>) {
    listeners.retain(|tx| {
        let gone = tx.is_disconnected();
        if gone {
            trace!(listener = %tx.id(), "pruning disconnected listener");
        }
        !gone
    });
}

impl<T: Clone> Broadcaster<T> {
    /// Delivers `value` to every endpoint registered at the time of the call.
    ///
    /// Sends run concurrently and the call returns once each recipient accepted its
    /// copy (at capacity 0: once each consumer actually received it). With no open
    /// endpoints it returns immediately.
    pub async fn broadcast(&self, value: T) {
        let mut listeners = self.listeners.lock().await;
        prune_disconnected(&mut listeners);

        let deliveries = listeners
            .iter()
            .filter(|tx| !tx.is_closed())
            .map(|tx| {
                let value = value.clone();
                async move {
                    if let Err(err) = tx.send(value).await {
                        trace!(listener = %tx.id(), reason = err.as_label(), "delivery skipped");
                    }
                }
            })
            .collect::<Vec<_>>();

        let recipients = deliveries.len();
        join_all(deliveries).await;
        prune_disconnected(&mut listeners);
        trace!(recipients, "broadcast delivered");
    }
}

impl<T> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::with_config(BroadcasterConfig::default())
    }
}

impl<T> Drop for Broadcaster<T> {
    fn drop(&mut self) {
        for tx in self.listeners.get_mut().iter() {
            tx.close();
        }
    }
}

impl<T> fmt::Debug for Broadcaster<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Broadcaster");
        s.field("capacity", &self.capacity);
        match self.listeners.try_lock() {
            Ok(listeners) => s.field("listeners", &listeners.len()),
            Err(_) => s.field("listeners", &"<locked>"),
        };
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TryRecvError;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::{sleep, timeout};

    const QUIET: Duration = Duration::from_millis(50);

    #[tokio::test]
    async fn every_listener_gets_the_value_once() {
        let bc = Broadcaster::<u32>::new(1);
        let mut rxs = Vec::new();
        for _ in 0..5 {
            rxs.push(bc.listen().await);
        }

        bc.broadcast(9).await;

        for rx in rxs.iter_mut() {
            assert_eq!(rx.recv().await, Some(9));
            assert_eq!(rx.try_recv(), Err(TryRecvError::Empty));
        }
    }

    #[tokio::test]
    async fn broadcast_without_listeners_returns() {
        let bc = Broadcaster::<u32>::default();
        assert!(bc.is_empty().await);
        timeout(QUIET, bc.broadcast(1))
            .await
            .expect("broadcast with no listeners blocked");
    }

    #[tokio::test]
    async fn preserves_order_per_listener() {
        let bc = Broadcaster::<u32>::new(8);
        let mut a = bc.listen().await;
        let mut b = bc.listen().await;

        for v in 0..5 {
            bc.broadcast(v).await;
        }
        for v in 0..5 {
            assert_eq!(a.recv().await, Some(v));
            assert_eq!(b.recv().await, Some(v));
        }
    }

    #[tokio::test]
    async fn remove_is_by_identity_and_idempotent() {
        let bc = Broadcaster::<u32>::new(1);
        let mut keep = bc.listen().await;
        let mut gone = bc.listen().await;
        assert_eq!(bc.len().await, 2);

        bc.remove(&gone).await;
        bc.remove(&gone).await;
        assert_eq!(bc.len().await, 1);

        bc.broadcast(3).await;
        assert_eq!(keep.recv().await, Some(3));
        assert!(timeout(QUIET, gone.recv()).await.is_err());
        assert!(!gone.is_closed());
    }

    #[tokio::test]
    async fn remove_of_foreign_endpoint_is_noop() {
        let bc = Broadcaster::<u32>::new(1);
        let other = Broadcaster::<u32>::new(1);
        let _mine = bc.listen().await;
        let foreign = other.listen().await;

        bc.remove(&foreign).await;
        assert_eq!(bc.len().await, 1);
    }

    #[tokio::test]
    async fn reset_closes_and_clears() {
        let bc = Broadcaster::<u32>::new(2);
        let mut a = bc.listen().await;
        bc.broadcast(1).await;

        bc.reset().await;
        assert!(bc.is_empty().await);
        assert!(a.is_closed());
        assert_eq!(a.recv().await, Some(1));
        assert_eq!(a.recv().await, None);
    }

    #[tokio::test]
    async fn close_keeps_registry_and_skips_closed() {
        let bc = Broadcaster::<u32>::new(0);
        let mut a = bc.listen().await;
        let mut b = bc.listen().await;

        bc.close().await;
        assert_eq!(bc.len().await, 2);

        timeout(QUIET, bc.broadcast(1))
            .await
            .expect("broadcast after close blocked on closed endpoints");
        assert_eq!(a.recv().await, None);
        assert_eq!(b.recv().await, None);

        bc.close().await;
        bc.reset().await;
        assert!(bc.is_empty().await);
    }

    #[tokio::test]
    async fn listen_after_close_is_open() {
        let bc = Broadcaster::<u32>::new(1);
        let _old = bc.listen().await;
        bc.close().await;

        let mut fresh = bc.listen().await;
        bc.broadcast(5).await;
        assert_eq!(fresh.recv().await, Some(5));
    }

    #[tokio::test]
    async fn dropped_consumer_does_not_block_others() {
        let bc = Broadcaster::<u32>::new(0);
        let dropped = bc.listen().await;
        let mut live = bc.listen().await;
        drop(dropped);

        let bc = Arc::new(bc);
        let producer = {
            let bc = Arc::clone(&bc);
            tokio::spawn(async move { bc.broadcast(2).await })
        };
        assert_eq!(live.recv().await, Some(2));
        timeout(QUIET, producer)
            .await
            .expect("broadcast stuck on dropped consumer")
            .unwrap();
    }

    #[tokio::test]
    async fn dropped_consumers_leave_the_registry() {
        let bc = Broadcaster::<u32>::new(1);
        let mut live = bc.listen().await;
        let gone = bc.listen().await;
        assert_eq!(bc.len().await, 2);

        drop(gone);
        assert_eq!(bc.len().await, 1);

        bc.broadcast(8).await;
        assert_eq!(live.recv().await, Some(8));
        assert_eq!(bc.len().await, 1);

        drop(live);
        assert!(bc.is_empty().await);
    }

    #[tokio::test]
    async fn full_endpoint_applies_backpressure() {
        let bc = Arc::new(Broadcaster::<u32>::new(1));
        let mut rx = bc.listen().await;
        bc.broadcast(1).await;

        let producer = {
            let bc = Arc::clone(&bc);
            tokio::spawn(async move { bc.broadcast(2).await })
        };
        sleep(QUIET).await;
        assert!(!producer.is_finished(), "broadcast ignored a full queue");

        assert_eq!(rx.recv().await, Some(1));
        producer.await.unwrap();
        assert_eq!(rx.recv().await, Some(2));
    }

    #[tokio::test]
    async fn drop_closes_registered_endpoints() {
        let bc = Broadcaster::<u32>::new(1);
        let mut rx = bc.listen().await;
        drop(bc);
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn debug_reports_counts() {
        let bc = Broadcaster::<u32>::new(3);
        let _rx = bc.listen().await;
        let s = format!("{bc:?}");
        assert!(s.contains("capacity: 3"));
        assert!(s.contains("listeners: 1"));
    }
}

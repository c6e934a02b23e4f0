//! # Listener endpoint: a bounded one-way queue from broadcaster to one consumer.
//!
//! [`channel`] builds a linked [`Sender`] / [`Receiver`] pair over a bounded
//! [`tokio::sync::mpsc`] queue.
//!
//! ## Architecture
//! ```text
//! Broadcaster ──► Sender ──► [mpsc queue, depth max(cap, 1)] ──► Receiver ──► consumer
//!                   │                                              ▲
//!                   └──────────── close signal (token) ────────────┘
//!                   ◄──────────── ack (capacity 0 only) ───────────┘
//! ```
//!
//! ## Rules
//! - **Explicit closure**: an endpoint closes only when its close signal fires
//!   (`reset`/`close`). Dropping the broadcaster-side sender leaves it open, so a
//!   removed listener stays open but silent.
//! - **Drain on close**: after closure the receiver yields every buffered value,
//!   then `None`.
//! - **Rendezvous at capacity 0**: each value carries an acknowledgement fired when the
//!   consumer takes it; the send completes only then.
//! - **Dropped consumer**: sends to a dropped receiver fail with [`SendError::Disconnected`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::Stream;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::error::{SendError, TryRecvError};

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one listener endpoint.
///
/// Both halves of an endpoint share the id; `remove` matches on it, never on values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl ListenerId {
    fn next() -> Self {
        Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw numeric id.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Value in flight plus the optional rendezvous acknowledgement.
struct Envelope<T> {
    value: T,
    ack: Option<oneshot::Sender<()>>,
}

impl<T> Envelope<T> {
    fn open(self) -> T {
        if let Some(ack) = self.ack {
            let _ = ack.send(());
        }
        self.value
    }
}

/// Creates a linked endpoint pair with the given buffering depth.
pub(crate) fn channel<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    let id = ListenerId::next();
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let closed = CancellationToken::new();

    let sender = Sender {
        id,
        tx: tx.clone(),
        closed: closed.clone(),
        rendezvous: capacity == 0,
    };
    let receiver = Receiver {
        id,
        rx,
        closed,
        _keepalive: tx,
    };
    (sender, receiver)
}

/// Sending half. Only the broadcaster (or a typed forwarder) writes through it;
/// clones held elsewhere are used to watch for a dropped consumer.
pub(crate) struct Sender<T> {
    id: ListenerId,
    tx: mpsc::Sender<Envelope<T>>,
    closed: CancellationToken,
    rendezvous: bool,
}

impl<T> Sender<T> {
    pub(crate) fn id(&self) -> ListenerId {
        self.id
    }

    /// Places `value` into the queue, waiting for room.
    ///
    /// At capacity 0 also waits until the consumer has taken the value.
    pub(crate) async fn send(&self, value: T) -> Result<(), SendError> {
        if !self.rendezvous {
            return self
                .tx
                .send(Envelope { value, ack: None })
                .await
                .map_err(|_| SendError::Disconnected);
        }

        let (ack, acked) = oneshot::channel();
        self.tx
            .send(Envelope {
                value,
                ack: Some(ack),
            })
            .await
            .map_err(|_| SendError::Disconnected)?;
        acked.await.map_err(|_| SendError::Disconnected)
    }

    /// Signals the consumer that no further values will come. Idempotent.
    pub(crate) fn close(&self) {
        self.closed.cancel();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Returns a guard that closes the endpoint when dropped (including on unwind).
    pub(crate) fn close_on_drop(&self) -> DropGuard {
        self.closed.clone().drop_guard()
    }

    /// Returns `true` once the consumer dropped its [`Receiver`].
    pub(crate) fn is_disconnected(&self) -> bool {
        self.tx.is_closed()
    }

    /// Completes when the consumer drops its [`Receiver`].
    pub(crate) async fn disconnected(&self) {
        self.tx.closed().await;
    }
}

impl<T> Clone for Sender<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            tx: self.tx.clone(),
            closed: self.closed.clone(),
            rendezvous: self.rendezvous,
        }
    }
}

/// Receiving half of a listener endpoint, handed to the consumer by `listen`.
///
/// Values arrive in broadcast order. Once the producer side closes the endpoint,
/// buffered values are still delivered before [`recv`](Self::recv) returns `None`.
pub struct Receiver<T> {
    id: ListenerId,
    rx: mpsc::Receiver<Envelope<T>>,
    closed: CancellationToken,
    // Holding a sender keeps the queue open after the broadcaster drops its half.
    _keepalive: mpsc::Sender<Envelope<T>>,
}

impl<T> Receiver<T> {
    /// Identity of this endpoint.
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Receives the next value.
    ///
    /// Returns `None` once the endpoint was closed and its buffer is drained.
    /// A removed (but not closed) endpoint never returns: it stays pending.
    ///
    /// Cancel safe: dropping the future before completion loses no value.
    pub async fn recv(&mut self) -> Option<T> {
        tokio::select! {
            biased;
            Some(envelope) = self.rx.recv() => Some(envelope.open()),
            _ = self.closed.cancelled() => self.rx.try_recv().ok().map(Envelope::open),
        }
    }

    /// Receives a buffered value without waiting.
    ///
    /// - [`TryRecvError::Empty`]: nothing buffered, endpoint still open.
    /// - [`TryRecvError::Closed`]: endpoint closed and drained.
    pub fn try_recv(&mut self) -> Result<T, TryRecvError> {
        // Read the flag first: every send happens-before close, so an empty
        // queue seen after a set flag is final.
        let closed = self.closed.is_cancelled();
        match self.rx.try_recv() {
            Ok(envelope) => Ok(envelope.open()),
            Err(_) if closed => Err(TryRecvError::Closed),
            Err(_) => Err(TryRecvError::Empty),
        }
    }

    /// Returns `true` once the producer side closed the endpoint.
    ///
    /// Buffered values may still be pending; keep calling `recv` until it yields `None`.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Converts the endpoint into a [`Stream`] that ends when the endpoint closes.
    pub fn into_stream(self) -> impl Stream<Item = T> {
        futures::stream::unfold(self, |mut rx| async move {
            let value = rx.recv().await?;
            Some((value, rx))
        })
    }
}

impl<T> fmt::Debug for Receiver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

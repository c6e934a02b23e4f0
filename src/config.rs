//! # Broadcaster configuration.
//!
//! Provides [`BroadcasterConfig`] settings fixed when a broadcaster is built.
//!
//! Config is used in two ways:
//! 1. **Untyped**: `Broadcaster::with_config(config)`
//! 2. **Typed**: `TypedBroadcaster::with_config(config)`
//!
//! ## Sentinel values
//! - `capacity = 0` → rendezvous: a delivery completes only once the consumer took the value

/// Configuration for a broadcaster instance.
///
/// ## Field semantics
/// - `capacity`: buffering depth of every endpoint created by `listen` (`0` = unbuffered)
///
/// ## Notes
/// Capacity is **per endpoint**, not shared: each listener gets its own queue of this depth.
/// A consumer that stops draining blocks every broadcast once its queue is full, so pick a
/// capacity that covers the longest pause any consumer may take.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BroadcasterConfig {
    /// Buffering depth given to every new listener endpoint.
    ///
    /// - `0` = unbuffered (rendezvous with the consumer)
    /// - `n > 0` = up to `n` values queue before a broadcast waits
    pub capacity: usize,
}

impl BroadcasterConfig {
    /// Creates a config with the given per-endpoint capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Returns `true` when endpoints are unbuffered.
    #[inline]
    pub fn is_rendezvous(&self) -> bool {
        self.capacity == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_rendezvous() {
        let cfg = BroadcasterConfig::default();
        assert_eq!(cfg.capacity, 0);
        assert!(cfg.is_rendezvous());
    }

    #[test]
    fn explicit_capacity() {
        let cfg = BroadcasterConfig::with_capacity(8);
        assert_eq!(cfg.capacity, 8);
        assert!(!cfg.is_rendezvous());
    }
}

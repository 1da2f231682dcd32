//! Session states, events and statistics

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::ErrorCategory;
use crate::types::GroupTag;

/// Lifecycle state of a connection session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Idle,
    Connecting,
    Recording,
    Replaying,
    Paused,
    /// Connected and ready
    Stopped,
    /// Terminal for this connection; a new `connect()` is required
    Disconnected,
}

impl SessionState {
    /// Whether a tick worker runs in this state.
    pub fn is_active(self) -> bool {
        matches!(self, SessionState::Recording | SessionState::Replaying)
    }

    /// Whether a backend connection is held in this state.
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            SessionState::Recording
                | SessionState::Replaying
                | SessionState::Paused
                | SessionState::Stopped
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Something observers of a session may want to know about.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    StateChanged { from: SessionState, to: SessionState },
    /// `connect()` failed; the session is back in `Idle`
    ConnectionFailed { reason: String },
    /// Ticks coalesced because the previous tick's backend work overran
    TicksDropped { count: u64 },
    /// One tick's backend exchange failed
    TickFailed { group: Option<GroupTag>, category: ErrorCategory, consecutive: u32 },
    /// Replay injected the last recorded sample
    ReplayFinished,
    /// Replay position moved by a positioning command
    Repositioned { index: usize, timestamp: i64 },
}

/// Snapshot of session counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionStats {
    /// Ticks processed
    pub ticks: u64,
    /// Ticks coalesced away or lost to a failed backend exchange
    pub dropped_ticks: u64,
    /// Failed backend exchanges
    pub io_failures: u64,
    /// Samples decoded and delivered while recording
    pub samples_delivered: u64,
    /// Samples encoded and sent while replaying
    pub samples_injected: u64,
}

#[derive(Debug, Default)]
pub(crate) struct SessionCounters {
    pub ticks: AtomicU64,
    pub dropped_ticks: AtomicU64,
    pub io_failures: AtomicU64,
    pub samples_delivered: AtomicU64,
    pub samples_injected: AtomicU64,
}

impl SessionCounters {
    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> SessionStats {
        SessionStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            dropped_ticks: self.dropped_ticks.load(Ordering::Relaxed),
            io_failures: self.io_failures.load(Ordering::Relaxed),
            samples_delivered: self.samples_delivered.load(Ordering::Relaxed),
            samples_injected: self.samples_injected.load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        for counter in [
            &self.ticks,
            &self.dropped_ticks,
            &self.io_failures,
            &self.samples_delivered,
            &self.samples_injected,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connected_states() {
        assert!(SessionState::Paused.is_connected());
        assert!(SessionState::Stopped.is_connected());
        assert!(!SessionState::Connecting.is_connected());
        assert!(!SessionState::Disconnected.is_connected());
        assert!(SessionState::Replaying.is_active());
        assert!(!SessionState::Paused.is_active());
    }

    #[test]
    fn counters_snapshot_and_reset() {
        let counters = SessionCounters::default();
        SessionCounters::add(&counters.ticks, 3);
        SessionCounters::add(&counters.samples_injected, 18);
        let stats = counters.snapshot();
        assert_eq!(stats.ticks, 3);
        assert_eq!(stats.samples_injected, 18);

        counters.reset();
        assert_eq!(counters.snapshot(), SessionStats::default());
    }
}

//! Sampling scheduler: logical rate to timer cadence

use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior, interval_at};
use tracing::{debug, warn};

use crate::types::SamplingRate;

/// Frequency in Hz of a sampling rate.
pub fn rate_to_hz(rate: SamplingRate) -> f64 {
    rate.to_hz()
}

/// Supported rate for an arbitrary requested frequency (ceiling match,
/// 30 Hz fallback above 60 Hz).
pub fn hz_to_rate(hz: f64) -> SamplingRate {
    SamplingRate::from_hz(hz)
}

/// One scheduled tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// Sequence number, starting at 0
    pub index: u64,
    /// Scheduled instant of this tick
    pub scheduled: Instant,
    /// Scheduled time since the ticker started
    pub elapsed: Duration,
    /// Ticks coalesced away since the previous tick
    pub dropped: u64,
}

/// Periodic timer that coalesces missed ticks.
///
/// The caller processes one tick to completion before asking for the next,
/// so tick work never overlaps. If that work outlasts the period, the
/// missed deadlines are skipped rather than queued and show up in
/// [`Tick::dropped`].
#[derive(Debug)]
pub struct Ticker {
    interval: Interval,
    period: Duration,
    start: Instant,
    last: Option<Instant>,
    count: u64,
    dropped_total: u64,
}

impl Ticker {
    /// Start ticking at `rate`; the first tick completes immediately.
    pub fn new(rate: SamplingRate) -> Self {
        Self::starting_at(rate, Instant::now())
    }

    /// Start ticking at `rate` with the first tick scheduled at `start`.
    pub fn starting_at(rate: SamplingRate, start: Instant) -> Self {
        let period = rate.period();
        let mut interval = interval_at(start, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        Self { interval, period, start, last: None, count: 0, dropped_total: 0 }
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Switch to `rate` without restarting the elapsed time.
    ///
    /// The next tick is due one new period after the previous one, or at
    /// once if that instant has already passed.
    pub fn set_rate(&mut self, rate: SamplingRate) {
        let period = rate.period();
        if period == self.period {
            return;
        }
        let next = match self.last {
            Some(last) => (last + period).max(Instant::now()),
            None => self.start,
        };
        debug!("Ticker period {:?} -> {:?}", self.period, period);
        self.interval = interval_at(next, period);
        self.interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.period = period;
    }

    /// Total ticks dropped since the ticker started.
    pub fn dropped_total(&self) -> u64 {
        self.dropped_total
    }

    /// Wait for the next tick.
    pub async fn tick(&mut self) -> Tick {
        let scheduled = self.interval.tick().await;

        let dropped = match self.last {
            Some(last) => {
                let gap = scheduled.saturating_duration_since(last).as_nanos();
                let periods = gap / self.period.as_nanos().max(1);
                periods.saturating_sub(1) as u64
            }
            None => 0,
        };
        if dropped > 0 {
            warn!(
                "Tick {}: {} tick(s) dropped, backend slower than {:?}",
                self.count, dropped, self.period
            );
        }

        let tick = Tick {
            index: self.count,
            scheduled,
            elapsed: scheduled.saturating_duration_since(self.start),
            dropped,
        };
        self.last = Some(scheduled);
        self.count += 1;
        self.dropped_total += dropped;
        tick
    }
}

//! Tick worker: drives recording and replay traffic

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::sink::SampleSink;
use super::state::{SessionCounters, SessionEvent, SessionState};
use super::{Shared, lock};
use crate::backend::Backend;
use crate::codec;
use crate::config::ReplayMode;
use crate::scheduler::{Tick, Ticker};
use crate::types::{GroupTag, Recording, SampleBatch, SamplingRate};
use crate::{ErrorCategory, Result, SimError};

pub(crate) type SharedBackend = Arc<AsyncMutex<Box<dyn Backend>>>;
pub(crate) type SharedSink = Arc<Mutex<Box<dyn SampleSink>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Record,
    Replay,
}

/// Why a worker stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerExit {
    /// Cancelled by the session (pause, stop, disconnect)
    Cancelled,
    /// Replay reached the end of the recording
    Finished,
    /// The backend went away or failed too often
    Disconnected,
}

/// Tick rate and replay speed, adjustable while a worker runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Pacing {
    pub rate: SamplingRate,
    /// Replay: recorded milliseconds per elapsed millisecond
    pub speed: f64,
}

pub(crate) struct TickWorker {
    pub mode: Mode,
    pub pacing: watch::Receiver<Pacing>,
    pub backend: SharedBackend,
    pub shared: Arc<Shared>,
    pub groups: Vec<GroupTag>,
    pub cancel: CancellationToken,
    pub max_consecutive_failures: u32,
    /// Recording: timestamp of the first tick, in milliseconds
    pub origin: i64,
    pub sink: Option<SharedSink>,
    /// Replay: samples to inject
    pub source: Arc<Recording>,
    pub replay_mode: ReplayMode,
}

impl TickWorker {
    pub async fn run(mut self) -> WorkerExit {
        let Pacing { rate, speed } = *self.pacing.borrow_and_update();
        info!("{:?} worker started at {} Hz", self.mode, rate.to_hz());
        let counters = &self.shared.counters;
        let mut ticker = Ticker::new(rate);
        let mut clock = ReplayClock::new(speed);
        let mut consecutive_failures = 0u32;

        let exit = loop {
            let tick = tokio::select! {
                _ = self.cancel.cancelled() => break WorkerExit::Cancelled,
                changed = self.pacing.changed() => {
                    if changed.is_err() {
                        break WorkerExit::Cancelled;
                    }
                    let Pacing { rate, speed } = *self.pacing.borrow_and_update();
                    ticker.set_rate(rate);
                    clock.set_speed(speed);
                    continue;
                }
                tick = ticker.tick() => tick,
            };
            SessionCounters::add(&counters.ticks, 1);
            if tick.dropped > 0 {
                SessionCounters::add(&counters.dropped_ticks, tick.dropped);
                self.shared.emit(SessionEvent::TicksDropped { count: tick.dropped });
            }

            // Dropping the in-flight future cancels the backend call
            let outcome = tokio::select! {
                _ = self.cancel.cancelled() => break WorkerExit::Cancelled,
                outcome = self.process(&tick, &mut clock) => outcome,
            };

            match outcome {
                Ok(TickOutcome::Continue) => consecutive_failures = 0,
                Ok(TickOutcome::Finished) => break WorkerExit::Finished,
                Err(e) if e.category() == ErrorCategory::Connection => {
                    error!("Backend connection lost: {}", e);
                    break WorkerExit::Disconnected;
                }
                Err(e) => {
                    consecutive_failures += 1;
                    SessionCounters::add(&counters.io_failures, 1);
                    SessionCounters::add(&counters.dropped_ticks, 1);
                    warn!(
                        "Tick {} failed ({}/{}): {}",
                        tick.index, consecutive_failures, self.max_consecutive_failures, e
                    );
                    self.shared.emit(SessionEvent::TickFailed {
                        group: failed_group(&e),
                        category: e.category(),
                        consecutive: consecutive_failures,
                    });

                    if consecutive_failures > self.max_consecutive_failures {
                        error!(
                            "{} consecutive backend failures, disconnecting",
                            consecutive_failures
                        );
                        break WorkerExit::Disconnected;
                    }
                }
            }
        };

        match exit {
            WorkerExit::Cancelled => {}
            WorkerExit::Finished => {
                self.shared.position.store(0, Ordering::SeqCst);
                self.shared.emit(SessionEvent::ReplayFinished);
                self.shared.transition(SessionState::Stopped);
            }
            WorkerExit::Disconnected => {
                let mut backend = self.backend.lock().await;
                if let Err(e) = backend.close().await {
                    debug!("Closing failed backend: {}", e);
                }
                self.shared.transition(SessionState::Disconnected);
            }
        }

        info!("{:?} worker ended ({:?}, {} ticks)", self.mode, exit, counters.snapshot().ticks);
        exit
    }

    async fn process(&self, tick: &Tick, clock: &mut ReplayClock) -> Result<TickOutcome> {
        match self.mode {
            Mode::Record => self.record_tick(tick).await.map(|_| TickOutcome::Continue),
            Mode::Replay => self.replay_tick(tick, clock).await,
        }
    }

    /// Request one record per group and deliver them as one batch.
    async fn record_tick(&self, tick: &Tick) -> Result<()> {
        let timestamp = self.origin + tick.elapsed.as_millis() as i64;
        let mut samples = Vec::with_capacity(self.groups.len());
        {
            let mut backend = self.backend.lock().await;
            for &tag in &self.groups {
                let record = backend.request(tag).await?;
                samples.push(codec::decode(tag, &record)?);
            }
        }

        let batch = SampleBatch::new(timestamp, samples);
        let count = batch.samples.len() as u64;
        lock(&self.shared.capture).push(batch.clone())?;
        if let Some(sink) = &self.sink
            && let Err(e) = lock(sink).deliver(&batch)
        {
            warn!("Sample sink rejected batch at {} ms: {}", timestamp, e);
        }
        SessionCounters::add(&self.shared.counters.samples_delivered, count);
        trace!("Tick {}: recorded {} samples at {} ms", tick.index, count, timestamp);
        Ok(())
    }

    /// Inject the latest batch the replay clock has reached.
    ///
    /// Batches passed over between two ticks are skipped; a tick that
    /// reaches no new batch injects nothing.
    async fn replay_tick(&self, tick: &Tick, clock: &mut ReplayClock) -> Result<TickOutcome> {
        let len = self.source.len();
        let head = self.shared.position.load(Ordering::SeqCst);
        if clock.expected != Some(head)
            && let Some(batch) = self.source.get(head)
        {
            // Started, resumed or repositioned: the head is due now
            clock.anchor(batch.timestamp, tick.elapsed);
        }
        clock.last_elapsed = tick.elapsed;

        let (index, next) = if head < len {
            let due = clock.at(tick.elapsed);
            let reached =
                self.source.batches()[head..].partition_point(|b| b.timestamp as f64 <= due);
            if reached == 0 {
                return Ok(TickOutcome::Continue);
            }
            (head + reached - 1, head + reached)
        } else if self.replay_mode == ReplayMode::Loop
            && let Some(first) = self.source.get(0)
        {
            debug!("Replay wrapped to the first sample");
            clock.anchor(first.timestamp, tick.elapsed);
            (0, 1)
        } else {
            info!("Replay reached the end of the recording");
            return Ok(TickOutcome::Finished);
        };

        // Claim the batch before sending so a cancelled tick is never repeated
        if self
            .shared
            .position
            .compare_exchange(head, next, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Ok(TickOutcome::Continue);
        }
        clock.expected = Some(next);

        let Some(batch) = self.source.get(index) else {
            return Ok(TickOutcome::Finished);
        };
        let mut backend = self.backend.lock().await;
        for sample in &batch.samples {
            if !self.groups.contains(&sample.tag()) {
                continue;
            }
            backend.send(sample.tag(), &codec::encode(sample)).await?;
            SessionCounters::add(&self.shared.counters.samples_injected, 1);
        }
        trace!("Tick {}: injected batch {} ({} ms)", tick.index, index, batch.timestamp);
        Ok(TickOutcome::Continue)
    }
}

/// Maps worker elapsed time onto recorded time.
#[derive(Debug)]
struct ReplayClock {
    anchor_timestamp: f64,
    anchor_elapsed: Duration,
    last_elapsed: Duration,
    speed: f64,
    /// Position left by the last injection; anything else was set by the session
    expected: Option<usize>,
}

impl ReplayClock {
    fn new(speed: f64) -> Self {
        Self {
            anchor_timestamp: 0.0,
            anchor_elapsed: Duration::ZERO,
            last_elapsed: Duration::ZERO,
            speed,
            expected: None,
        }
    }

    fn anchor(&mut self, timestamp: i64, elapsed: Duration) {
        self.anchor_timestamp = timestamp as f64;
        self.anchor_elapsed = elapsed;
    }

    /// Recorded time, in milliseconds, reached at `elapsed`.
    fn at(&self, elapsed: Duration) -> f64 {
        let since = elapsed.saturating_sub(self.anchor_elapsed);
        self.anchor_timestamp + since.as_micros() as f64 * self.speed / 1000.0
    }

    /// Change speed from the last tick on, without moving the replay head.
    fn set_speed(&mut self, speed: f64) {
        if speed == self.speed {
            return;
        }
        self.anchor_timestamp = self.at(self.last_elapsed);
        self.anchor_elapsed = self.last_elapsed;
        self.speed = speed;
    }
}

enum TickOutcome {
    Continue,
    Finished,
}

fn failed_group(error: &SimError) -> Option<GroupTag> {
    match error {
        SimError::BackendIo { group, .. } => *group,
        _ => None,
    }
}

//! Connection session: the record/replay state machine.
//!
//! A [`ConnectionSession`] owns the backend handle, the registered group
//! layouts and the sampling rate of one logical connection:
//!
//! ```text
//! Idle ──connect──▶ Connecting ──ack──▶ Stopped ──record/replay──▶ Recording/Replaying
//!   ▲                   │                  ▲                          │        ▲
//!   └──failure/timeout──┘                  └────────────stop──────────┤      resume
//!                                                                     ▼        │
//!                                        any ──backend lost──▶ Disconnected  Paused
//! ```
//!
//! State-changing commands take `&mut self`, so callers serialize them.
//! Every transition is published on a watch channel and an event broadcast
//! before the command returns. Read-only queries (state, position, stats)
//! go through shared atomics and channels and may come from anywhere.

mod sink;
mod state;
mod worker;

pub use sink::SampleSink;
pub use state::{SessionEvent, SessionState, SessionStats};

use futures::{Stream, StreamExt};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use self::state::SessionCounters;
use self::worker::{Mode, Pacing, SharedBackend, SharedSink, TickWorker, WorkerExit};
use crate::backend::Backend;
use crate::codec;
use crate::config::SessionConfig;
use crate::registry::BackendRegistry;
use crate::types::{BackendId, GroupTag, Recording, SamplingRate, VariableGroupDefinition};
use crate::{ErrorCategory, Result, SimError};

const EVENT_CAPACITY: usize = 256;

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared between the session and its tick worker.
pub(crate) struct Shared {
    state: watch::Sender<SessionState>,
    events: broadcast::Sender<SessionEvent>,
    pub(crate) counters: SessionCounters,
    /// Replay: index of the next batch to inject
    pub(crate) position: AtomicUsize,
    /// Recording captured so far
    pub(crate) capture: Mutex<Recording>,
}

impl Shared {
    fn new() -> Self {
        let (state, _) = watch::channel(SessionState::Idle);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state,
            events,
            counters: SessionCounters::default(),
            position: AtomicUsize::new(0),
            capture: Mutex::new(Recording::new()),
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Publish a state change. Returns the previous state.
    pub(crate) fn transition(&self, to: SessionState) -> SessionState {
        let from = self.state.send_replace(to);
        if from != to {
            info!("Session {} -> {}", from, to);
            self.emit(SessionEvent::StateChanged { from, to });
        }
        from
    }

    pub(crate) fn emit(&self, event: SessionEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }
}

struct WorkerHandle {
    mode: Mode,
    cancel: CancellationToken,
    join: JoinHandle<WorkerExit>,
}

/// One logical connection to a simulator backend.
///
/// # Example
///
/// ```rust
/// use skyreel::backend::LoopbackBackend;
/// use skyreel::config::SessionConfig;
/// use skyreel::registry::{BackendRegistry, StaticHost};
/// use skyreel::session::{ConnectionSession, SessionState};
/// use skyreel::types::BackendId;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> skyreel::Result<()> {
/// let registry = BackendRegistry::with_probe(StaticHost::new().with_installed(BackendId::Msfs));
/// let mut session = ConnectionSession::with_registry(SessionConfig::default(), registry)?;
///
/// session.connect(LoopbackBackend::new(BackendId::Msfs)).await?;
/// assert_eq!(session.state(), SessionState::Stopped);
///
/// session.record().await?;
/// session.stop().await?;
/// # Ok(())
/// # }
/// ```
pub struct ConnectionSession {
    config: SessionConfig,
    registry: BackendRegistry,
    /// Sampling rate and replay speed, followed by the running worker
    pacing: watch::Sender<Pacing>,
    shared: Arc<Shared>,
    backend: Option<SharedBackend>,
    layouts: Vec<VariableGroupDefinition>,
    sink: Option<SharedSink>,
    replay_source: Option<Arc<Recording>>,
    /// Recording being replayed since the last `replay()` from `Stopped`
    active_source: Arc<Recording>,
    worker: Option<WorkerHandle>,
    paused: Option<Mode>,
}

impl ConnectionSession {
    /// Session probing the real host for installed simulators.
    pub fn new(config: SessionConfig) -> Result<Self> {
        Self::with_registry(config, BackendRegistry::system())
    }

    pub fn with_registry(config: SessionConfig, registry: BackendRegistry) -> Result<Self> {
        config.validate()?;
        codec::verify_layouts()?;
        let rate = config.sampling_rate();
        debug!("Session created: backend={}, rate={:?}", config.backend, rate);
        let (pacing, _) = watch::channel(Pacing { rate, speed: 1.0 });

        Ok(Self {
            config,
            registry,
            pacing,
            shared: Arc::new(Shared::new()),
            backend: None,
            layouts: Vec::new(),
            sink: None,
            replay_source: None,
            active_source: Arc::new(Recording::new()),
            worker: None,
            paused: None,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    pub fn state(&self) -> SessionState {
        self.shared.state()
    }

    /// Watch receiver for the current state.
    pub fn subscribe_state(&self) -> watch::Receiver<SessionState> {
        self.shared.state.subscribe()
    }

    /// Stream of states, starting with the current one.
    ///
    /// A slow reader sees the latest state, not every intermediate one; use
    /// [`events`](Self::events) for the full transition log.
    pub fn state_updates(&self) -> impl Stream<Item = SessionState> + 'static {
        WatchStream::new(self.subscribe_state())
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }

    /// Stream of events published after this call.
    pub fn events(&self) -> impl Stream<Item = SessionEvent> + 'static {
        BroadcastStream::new(self.subscribe_events()).filter_map(|event| async move {
            match event {
                Ok(event) => Some(event),
                Err(e) => {
                    warn!("Event observer fell behind: {}", e);
                    None
                }
            }
        })
    }

    pub fn stats(&self) -> SessionStats {
        self.shared.counters.snapshot()
    }

    pub fn sampling_rate(&self) -> SamplingRate {
        self.pacing.borrow().rate
    }

    /// Change the sampling rate in any state.
    ///
    /// A running worker switches at its next tick without restarting the
    /// recorded timeline.
    pub fn set_sampling_rate(&mut self, hz: f64) -> SamplingRate {
        let rate = SamplingRate::from_hz(hz);
        self.pacing.send_if_modified(|pacing| {
            let changed = pacing.rate != rate;
            pacing.rate = rate;
            changed
        });
        debug!("Sampling rate set to {:?} (requested {} Hz)", rate, hz);
        rate
    }

    /// Replay speed factor; 1.0 is real time.
    pub fn replay_speed(&self) -> f64 {
        self.pacing.borrow().speed
    }

    /// Scale how fast replay moves through recorded time.
    ///
    /// Valid in any state; a running replay continues from its current
    /// position at the new speed.
    ///
    /// # Errors
    ///
    /// Returns a configuration error unless `factor` is finite and positive.
    pub fn set_replay_speed(&mut self, factor: f64) -> Result<()> {
        if !(factor.is_finite() && factor > 0.0) {
            return Err(SimError::configuration(format!(
                "replay speed must be a positive number, got {factor}"
            )));
        }
        self.pacing.send_if_modified(|pacing| {
            let changed = pacing.speed != factor;
            pacing.speed = factor;
            changed
        });
        debug!("Replay speed set to {}x", factor);
        Ok(())
    }

    /// Layouts registered with the connected backend.
    pub fn layouts(&self) -> &[VariableGroupDefinition] {
        &self.layouts
    }

    /// Deliver recorded batches to a storage collaborator as well.
    pub fn set_sink(&mut self, sink: impl SampleSink) {
        self.sink = Some(Arc::new(Mutex::new(Box::new(sink))));
    }

    /// Replay `recording` instead of the captured one.
    ///
    /// Valid whenever no replay is in progress or paused.
    pub fn set_replay_source(&mut self, recording: Recording) -> Result<()> {
        let state = self.state();
        if state.is_active() || state == SessionState::Paused {
            return Err(SimError::invalid_state("set_replay_source", state));
        }
        debug!("Replay source set: {} batches", recording.len());
        self.replay_source = Some(Arc::new(recording));
        Ok(())
    }

    /// Snapshot of the recording captured so far.
    pub fn recording(&self) -> Recording {
        lock(&self.shared.capture).clone()
    }

    pub fn recorded_samples_per_second(&self) -> f64 {
        lock(&self.shared.capture).samples_per_second()
    }

    /// Index of the next batch replay will inject.
    pub fn position(&self) -> usize {
        self.shared.position.load(Ordering::SeqCst)
    }

    /// Timestamp of the replay head: the batch replay will inject next.
    pub fn current_timestamp(&self) -> i64 {
        let index = self.position().min(self.active_source.len().saturating_sub(1));
        self.active_source.get(index).map(|b| b.timestamp).unwrap_or(0)
    }

    /// Open `backend` and register every group layout with it.
    ///
    /// Valid in `Idle` and `Disconnected`. Passes through `Connecting`; ends
    /// in `Stopped`, or back in `Idle` with a connection error.
    pub async fn connect(&mut self, backend: impl Backend) -> Result<()> {
        let state = self.state();
        if !matches!(state, SessionState::Idle | SessionState::Disconnected) {
            return Err(SimError::invalid_state("connect", state));
        }
        let configured = self.config.backend_id();
        let id = backend.id();
        if configured != BackendId::All && configured != id {
            return Err(SimError::configuration(format!(
                "session is configured for {configured}, not {id}"
            )));
        }
        self.halt_worker().await;
        self.backend = None;
        self.layouts.clear();
        self.paused = None;
        self.shared.transition(SessionState::Connecting);

        if !self.registry.is_installed(id) {
            return Err(self.connect_failed(format!("{id} is not installed"), None));
        }
        if !id.is_concrete() {
            return Err(self.connect_failed(format!("{id} is not a connection target"), None));
        }

        let mut backend: Box<dyn Backend> = Box::new(backend);
        let timeout = self.config.handshake_timeout;
        match tokio::time::timeout(timeout, backend.open()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                return Err(self.connect_failed(format!("{id} handshake failed"), Some(e.into())));
            }
            Err(_) => {
                let source = SimError::Timeout { duration: timeout };
                return Err(self.connect_failed(
                    format!("{id} handshake timed out"),
                    Some(source.into()),
                ));
            }
        }

        let mut layouts = Vec::with_capacity(GroupTag::ALL.len());
        for tag in GroupTag::ALL {
            let layout = codec::layout(tag);
            if let Err(e) = backend.register(tag.definition_id(), &layout).await {
                let _ = backend.close().await;
                return Err(self.connect_failed(
                    format!("registering {tag} with {id} failed"),
                    Some(e.into()),
                ));
            }
            debug!(
                "Registered {} ({} bytes) as definition {}",
                tag,
                layout.size(),
                tag.definition_id()
            );
            layouts.push(layout);
        }

        self.backend = Some(Arc::new(AsyncMutex::new(backend)));
        self.layouts = layouts;
        self.shared.counters.reset();
        self.shared.position.store(0, Ordering::SeqCst);
        self.shared.transition(SessionState::Stopped);
        info!("Connected to {} with {} groups", id, self.layouts.len());
        Ok(())
    }

    fn connect_failed(
        &self,
        reason: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    ) -> SimError {
        error!("Connection failed: {}", reason);
        self.shared.transition(SessionState::Idle);
        self.shared.emit(SessionEvent::ConnectionFailed { reason: reason.clone() });
        match source {
            Some(source) => SimError::connection_failed_with_source(reason, source),
            None => SimError::connection_failed(reason),
        }
    }

    /// Start recording, or resume a paused recording.
    pub async fn record(&mut self) -> Result<()> {
        let state = self.state();
        let origin = match (state, self.paused) {
            (SessionState::Stopped, _) => {
                *lock(&self.shared.capture) = Recording::new();
                0
            }
            (SessionState::Paused, Some(Mode::Record)) => {
                // Continue one period after the last captured batch
                let capture = lock(&self.shared.capture);
                if capture.is_empty() {
                    0
                } else {
                    capture.duration() + self.sampling_rate().period().as_millis() as i64
                }
            }
            _ => return Err(SimError::invalid_state("record", state)),
        };
        self.start(Mode::Record, origin, SessionState::Recording)
    }

    /// Start replaying from the current position, or resume a paused replay.
    ///
    /// Replays the source set with [`set_replay_source`](Self::set_replay_source),
    /// or else the recording captured by this session.
    pub async fn replay(&mut self) -> Result<()> {
        let state = self.state();
        match (state, self.paused) {
            (SessionState::Stopped, _) => {
                let source = match &self.replay_source {
                    Some(source) => Arc::clone(source),
                    None => Arc::new(self.recording()),
                };
                if source.is_empty() {
                    return Err(SimError::configuration("nothing to replay: recording is empty"));
                }
                self.active_source = source;
            }
            (SessionState::Paused, Some(Mode::Replay)) => {}
            _ => return Err(SimError::invalid_state("replay", state)),
        }
        self.start(Mode::Replay, 0, SessionState::Replaying)
    }

    fn start(&mut self, mode: Mode, origin: i64, target: SessionState) -> Result<()> {
        let backend = match &self.backend {
            Some(backend) => Arc::clone(backend),
            None => return Err(SimError::invalid_state(format!("{mode:?}"), self.state())),
        };
        let cancel = CancellationToken::new();
        let worker = TickWorker {
            mode,
            pacing: self.pacing.subscribe(),
            backend,
            shared: Arc::clone(&self.shared),
            groups: self.layouts.iter().map(|layout| layout.tag).collect(),
            cancel: cancel.clone(),
            max_consecutive_failures: self.config.max_consecutive_failures,
            origin,
            sink: self.sink.clone(),
            source: Arc::clone(&self.active_source),
            replay_mode: self.config.replay_mode,
        };

        self.paused = None;
        // Publish before the worker can publish its own terminal transition
        self.shared.transition(target);
        let join = tokio::spawn(worker.run());
        self.worker = Some(WorkerHandle { mode, cancel, join });
        Ok(())
    }

    /// Cancel the worker, if any, and wait for it to finish.
    async fn halt_worker(&mut self) -> Option<WorkerExit> {
        let worker = self.worker.take()?;
        worker.cancel.cancel();
        match worker.join.await {
            Ok(exit) => Some(exit),
            Err(e) => {
                error!("{:?} worker failed: {}", worker.mode, e);
                Some(WorkerExit::Disconnected)
            }
        }
    }

    /// Suspend ticking, keeping the backend and the replay position.
    pub async fn pause(&mut self) -> Result<()> {
        let state = self.state();
        let mode = match state {
            SessionState::Recording => Mode::Record,
            SessionState::Replaying => Mode::Replay,
            _ => return Err(SimError::invalid_state("pause", state)),
        };
        if let Some(WorkerExit::Finished | WorkerExit::Disconnected) = self.halt_worker().await {
            // The worker ended on its own first
            return Err(SimError::invalid_state("pause", self.state()));
        }
        self.paused = Some(mode);
        self.shared.transition(SessionState::Paused);
        Ok(())
    }

    /// Stop ticking and reset the replay position.
    ///
    /// Safe at any point, including mid-tick: the in-flight backend call is
    /// dropped. Stopping a stopped session does nothing.
    pub async fn stop(&mut self) -> Result<()> {
        let state = self.state();
        match state {
            SessionState::Recording | SessionState::Replaying | SessionState::Paused => {}
            SessionState::Stopped => return Ok(()),
            _ => return Err(SimError::invalid_state("stop", state)),
        }
        self.halt_worker().await;
        if self.state() == SessionState::Disconnected {
            return Err(SimError::invalid_state("stop", SessionState::Disconnected));
        }
        self.paused = None;
        self.shared.position.store(0, Ordering::SeqCst);
        self.shared.transition(SessionState::Stopped);
        Ok(())
    }

    /// Close the backend. The session ends in `Disconnected`.
    pub async fn disconnect(&mut self) -> Result<()> {
        let state = self.state();
        if matches!(state, SessionState::Idle | SessionState::Disconnected) {
            return Ok(());
        }
        self.halt_worker().await;
        if let Some(backend) = self.backend.take()
            && let Err(e) = backend.lock().await.close().await
        {
            warn!("Closing backend failed: {}", e);
        }
        self.layouts.clear();
        self.paused = None;
        self.shared.transition(SessionState::Disconnected);
        Ok(())
    }

    fn require_replay_position(&self, command: &str) -> Result<()> {
        let state = self.state();
        let replaying = state == SessionState::Replaying
            || (state == SessionState::Paused && self.paused == Some(Mode::Replay));
        if !replaying {
            return Err(SimError::invalid_state(command, state));
        }
        Ok(())
    }

    /// Move the replay head to `index`.
    ///
    /// While paused the batch at the new head is sent right away so the
    /// simulator shows the new position; a running replay picks it up at its
    /// next tick.
    async fn reposition(&mut self, index: usize) -> Result<usize> {
        self.shared.position.store(index, Ordering::SeqCst);
        let timestamp = self.active_source.get(index).map(|b| b.timestamp).unwrap_or(0);
        debug!("Replay repositioned to batch {} ({} ms)", index, timestamp);
        self.shared.emit(SessionEvent::Repositioned { index, timestamp });
        if self.state() == SessionState::Paused {
            self.show(index).await?;
        }
        Ok(index)
    }

    /// Send the batch at `index` to the backend once.
    async fn show(&mut self, index: usize) -> Result<()> {
        let (Some(backend), Some(batch)) = (&self.backend, self.active_source.get(index)) else {
            return Ok(());
        };
        let backend = Arc::clone(backend);
        let batch = batch.clone();
        let mut backend = backend.lock().await;
        for sample in &batch.samples {
            if !self.layouts.iter().any(|layout| layout.tag == sample.tag()) {
                continue;
            }
            match backend.send(sample.tag(), &codec::encode(sample)).await {
                Ok(()) => SessionCounters::add(&self.shared.counters.samples_injected, 1),
                Err(e) if e.category() == ErrorCategory::Connection => {
                    error!("Backend connection lost while repositioning: {}", e);
                    if let Err(e) = backend.close().await {
                        debug!("Closing failed backend: {}", e);
                    }
                    drop(backend);
                    self.backend = None;
                    self.layouts.clear();
                    self.paused = None;
                    self.shared.transition(SessionState::Disconnected);
                    return Err(e);
                }
                Err(e) => {
                    warn!("Showing batch {} failed: {}", index, e);
                    SessionCounters::add(&self.shared.counters.io_failures, 1);
                }
            }
        }
        Ok(())
    }

    fn skip_millis(&self) -> i64 {
        self.config.skip_interval.resolve(self.active_source.duration())
    }

    /// Whether replay has already injected the last batch.
    fn at_end(&self) -> bool {
        self.position() >= self.active_source.len()
    }

    /// Move back by the skip interval. Valid while replaying or paused in replay.
    pub async fn backward(&mut self) -> Result<usize> {
        self.require_replay_position("backward")?;
        let target = (self.current_timestamp() - self.skip_millis()).max(0);
        self.reposition(self.active_source.index_at(target)).await
    }

    /// Move forward by the skip interval, clamped to the last batch.
    ///
    /// Past the last batch the head stays at the end and nothing is sent.
    pub async fn forward(&mut self) -> Result<usize> {
        self.require_replay_position("forward")?;
        if self.at_end() {
            return Ok(self.position());
        }
        let target =
            (self.current_timestamp() + self.skip_millis()).min(self.active_source.duration());
        self.reposition(self.active_source.index_at(target)).await
    }

    /// Return to the first batch.
    pub async fn rewind(&mut self) -> Result<usize> {
        self.require_replay_position("rewind")?;
        self.reposition(0).await
    }

    /// Continue from the first batch at or after `timestamp` (milliseconds).
    pub async fn seek(&mut self, timestamp: i64) -> Result<usize> {
        self.require_replay_position("seek")?;
        let target = timestamp.clamp(0, self.active_source.duration());
        self.reposition(self.active_source.index_at(target)).await
    }

    /// Continue from the last batch.
    ///
    /// Past the last batch the head stays at the end and nothing is sent.
    pub async fn skip_to_end(&mut self) -> Result<usize> {
        self.require_replay_position("skip_to_end")?;
        if self.at_end() {
            return Ok(self.position());
        }
        self.reposition(self.active_source.len().saturating_sub(1)).await
    }
}

impl Drop for ConnectionSession {
    fn drop(&mut self) {
        if let Some(worker) = &self.worker {
            debug!("Dropping session, cancelling {:?} worker", worker.mode);
            worker.cancel.cancel();
        }
    }
}

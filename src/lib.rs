//! Record and replay flight simulator state.
//!
//! Skyreel talks to a flight simulator through named groups of simulation
//! variables with fixed binary layouts. A session samples those groups at a
//! fixed rate while recording and writes them back at the same rate while
//! replaying.
//!
//! # Features
//!
//! - **Backend Registry**: resolve simulator names, detect installed and running simulators
//! - **Wire Codecs**: bit-exact layouts for every variable group, normalized to physical units
//! - **Session State Machine**: connect, record, replay, pause and reposition with explicit states
//! - **Deterministic Ticking**: missed ticks are dropped and counted, never bunched
//!
//! # Quick Start
//!
//! ```rust
//! use skyreel::{Skyreel, SessionConfig, SessionState};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> skyreel::Result<()> {
//! let config = SessionConfig { backend: "MSFS".into(), ..Default::default() };
//! let (mut session, backend) = Skyreel::dry_run(config)?;
//!
//! session.connect(backend).await?;
//! session.record().await?;
//! session.stop().await?;
//! assert_eq!(session.state(), SessionState::Stopped);
//! # Ok(())
//! # }
//! ```

// Core types and error handling
mod error;
pub mod types;

// Wire layer
pub mod codec;
pub mod registry;

// Session architecture
pub mod backend;
pub mod config;
pub mod scheduler;
pub mod session;

// Core exports
pub use error::*;
pub use types::{BackendId, GroupTag, Recording, Sample, SampleBatch, SamplingRate};

// Main API exports
pub use backend::{Backend, LoopbackBackend, LoopbackHandle};
pub use config::{ReplayMode, SessionConfig, SkipInterval};
pub use registry::BackendRegistry;
pub use session::{ConnectionSession, SampleSink, SessionEvent, SessionState, SessionStats};

use registry::StaticHost;
use tracing_subscriber::EnvFilter;

/// Install a `tracing` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Does nothing if a global subscriber is already set.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Unified entry point for simulator sessions.
///
/// # Examples
///
/// ## Detect the local simulator
/// ```rust,no_run
/// use skyreel::{BackendId, Skyreel};
///
/// match Skyreel::detect() {
///     BackendId::None => println!("No simulator installed"),
///     id => println!("Found {}", id),
/// }
/// ```
///
/// ## Session from a configuration file
/// ```rust,no_run
/// use skyreel::{SessionConfig, Skyreel};
///
/// # fn main() -> skyreel::Result<()> {
/// let yaml = std::fs::read_to_string("skyreel.yaml").map_err(|e| {
///     skyreel::SimError::configuration(format!("cannot read configuration: {e}"))
/// })?;
/// let session = Skyreel::session(SessionConfig::from_yaml(&yaml)?)?;
/// # Ok(())
/// # }
/// ```
pub struct Skyreel;

impl Skyreel {
    /// Session against the real host.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the backend name is not recognised
    /// or a setting is out of range.
    pub fn session(config: SessionConfig) -> Result<ConnectionSession> {
        ConnectionSession::new(config)
    }

    /// First installed simulator on this host, preferring a running one.
    pub fn detect() -> BackendId {
        BackendRegistry::system().detect()
    }

    /// Session wired to an in-process loopback simulator.
    ///
    /// The host appears to have the configured backend installed, so the
    /// full connect/record/replay cycle runs without a simulator. `All`
    /// resolves to the first known backend.
    pub fn dry_run(config: SessionConfig) -> Result<(ConnectionSession, LoopbackBackend)> {
        config.validate()?;
        let id = match config.backend_id() {
            BackendId::All => BackendId::KNOWN[0],
            id => id,
        };
        let registry = BackendRegistry::with_probe(StaticHost::new().with_installed(id));
        let session = ConnectionSession::with_registry(config, registry)?;
        Ok((session, LoopbackBackend::new(id)))
    }
}

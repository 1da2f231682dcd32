//! Session configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::registry::BackendRegistry;
use crate::types::{BackendId, SamplingRate};
use crate::{Result, SimError};

/// What replay does after injecting the last recorded sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ReplayMode {
    /// Stop the session
    #[default]
    Normal,
    /// Continue from the first sample
    Loop,
}

/// Configuration consumed by a [`ConnectionSession`](crate::session::ConnectionSession).
///
/// Every key is optional in YAML; missing keys take their defaults.
///
/// ```rust
/// use skyreel::config::{ReplayMode, SessionConfig};
/// use skyreel::types::{BackendId, SamplingRate};
///
/// let yaml = "backend: MSFS\nsample_rate_hz: 18\nreplay_mode: Loop\n";
/// let config = SessionConfig::from_yaml(yaml)?;
/// assert_eq!(config.backend_id(), BackendId::Msfs);
/// assert_eq!(config.sampling_rate(), SamplingRate::Hz20);
/// assert_eq!(config.replay_mode, ReplayMode::Loop);
/// # Ok::<(), skyreel::SimError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Canonical backend name
    pub backend: String,
    /// Requested sampling frequency, mapped onto a supported rate
    pub sample_rate_hz: f64,
    #[serde(with = "millis")]
    pub handshake_timeout: Duration,
    /// Consecutive failed ticks tolerated before the session disconnects
    pub max_consecutive_failures: u32,
    /// Distance moved by backward/forward, in recorded time
    pub skip_interval: SkipInterval,
    pub replay_mode: ReplayMode,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: BackendId::All.name().to_string(),
            sample_rate_hz: SamplingRate::DEFAULT.to_hz(),
            handshake_timeout: Duration::from_secs(5),
            max_consecutive_failures: 10,
            skip_interval: SkipInterval::Absolute(Duration::from_millis(5000)),
            replay_mode: ReplayMode::Normal,
        }
    }
}

impl SessionConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: SessionConfig = serde_yaml_ng::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    /// Reject settings no session can run with.
    pub fn validate(&self) -> Result<()> {
        if self.backend_id() == BackendId::None {
            return Err(SimError::configuration(format!(
                "unrecognised backend name '{}'",
                self.backend
            )));
        }
        if self.max_consecutive_failures == 0 {
            return Err(SimError::configuration("max_consecutive_failures must be at least 1"));
        }
        if self.handshake_timeout.is_zero() {
            return Err(SimError::configuration("handshake_timeout must be positive"));
        }
        self.skip_interval.validate()
    }

    pub fn backend_id(&self) -> BackendId {
        BackendRegistry::name_to_id(&self.backend)
    }

    pub fn sampling_rate(&self) -> SamplingRate {
        SamplingRate::from_hz(self.sample_rate_hz)
    }
}

/// How far backward/forward move the replay head.
///
/// In YAML either a plain number of milliseconds or `{ percent: <p> }`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "SkipIntervalRepr", into = "SkipIntervalRepr")]
pub enum SkipInterval {
    /// Fixed distance in recorded time
    Absolute(Duration),
    /// Share of the recording's duration, in percent
    Percent(f64),
}

impl SkipInterval {
    /// Distance in milliseconds for a recording lasting `duration` milliseconds.
    pub fn resolve(&self, duration: i64) -> i64 {
        match *self {
            SkipInterval::Absolute(interval) => interval.as_millis() as i64,
            SkipInterval::Percent(percent) => (percent * duration as f64 / 100.0).round() as i64,
        }
    }

    fn validate(&self) -> Result<()> {
        match *self {
            SkipInterval::Absolute(interval) if interval.is_zero() => {
                Err(SimError::configuration("skip_interval must be positive"))
            }
            SkipInterval::Percent(percent) if !(percent > 0.0 && percent <= 100.0) => {
                Err(SimError::configuration(format!(
                    "skip_interval percent must be in (0, 100], got {percent}"
                )))
            }
            _ => Ok(()),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum SkipIntervalRepr {
    Millis(u64),
    Percent { percent: f64 },
}

impl From<SkipIntervalRepr> for SkipInterval {
    fn from(repr: SkipIntervalRepr) -> Self {
        match repr {
            SkipIntervalRepr::Millis(millis) => {
                SkipInterval::Absolute(Duration::from_millis(millis))
            }
            SkipIntervalRepr::Percent { percent } => SkipInterval::Percent(percent),
        }
    }
}

impl From<SkipInterval> for SkipIntervalRepr {
    fn from(interval: SkipInterval) -> Self {
        match interval {
            SkipInterval::Absolute(interval) => {
                SkipIntervalRepr::Millis(interval.as_millis() as u64)
            }
            SkipInterval::Percent(percent) => SkipIntervalRepr::Percent { percent },
        }
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

//! Backend registry: which simulator is selected, installed and running.
//!
//! Name lookup is a closed, case-sensitive mapping over the canonical backend
//! names. Host queries go through a [`HostProbe`] and dispatch to one
//! [`Detection`] strategy per concrete backend. A probe that fails is
//! reported as "not installed" / "not running", never as an error.
//!
//! ```rust
//! use skyreel::registry::{BackendRegistry, StaticHost};
//! use skyreel::types::BackendId;
//!
//! let registry = BackendRegistry::with_probe(StaticHost::new());
//! assert_eq!(BackendRegistry::name_to_id("MSFS"), BackendId::Msfs);
//! assert_eq!(BackendRegistry::name_to_id("msfs"), BackendId::None);
//! assert!(!registry.is_installed(BackendId::All));
//! ```

mod detect;
mod probe;
#[cfg(windows)]
mod windows;

pub use detect::{APP_DATA_VAR, Detection, MsfsDetection, Prepar3dV5Detection, detection};
pub use probe::{HostProbe, StaticHost, SystemProbe};

use std::sync::Arc;
use tracing::{debug, warn};

use crate::types::BackendId;

/// Resolves backend names and answers installation/running queries.
#[derive(Clone)]
pub struct BackendRegistry {
    probe: Arc<dyn HostProbe>,
}

impl Default for BackendRegistry {
    fn default() -> Self {
        Self::system()
    }
}

impl std::fmt::Debug for BackendRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRegistry").finish_non_exhaustive()
    }
}

impl BackendRegistry {
    /// Registry probing the real host.
    pub fn system() -> Self {
        Self::with_probe(SystemProbe)
    }

    pub fn with_probe(probe: impl HostProbe + 'static) -> Self {
        Self { probe: Arc::new(probe) }
    }

    /// Map a canonical backend name to its identifier.
    ///
    /// Total: unrecognised input, including the empty string, is `None`.
    pub fn name_to_id(name: &str) -> BackendId {
        BackendId::from_name(name)
    }

    /// Whether the backend is installed.
    ///
    /// `All` is true if any known backend is installed.
    pub fn is_installed(&self, id: BackendId) -> bool {
        match id {
            BackendId::None => false,
            BackendId::All => BackendId::KNOWN.into_iter().any(|known| self.is_installed(known)),
            concrete => self.query(concrete, "installation", |d, host| d.is_installed(host)),
        }
    }

    /// Whether the backend's simulator process is running.
    ///
    /// `All` names no process and is never running.
    pub fn is_running(&self, id: BackendId) -> bool {
        match id {
            BackendId::None | BackendId::All => false,
            concrete => self.query(concrete, "process", |d, host| d.is_running(host)),
        }
    }

    /// First known backend that is installed, preferring one that is running.
    pub fn detect(&self) -> BackendId {
        let installed: Vec<BackendId> =
            BackendId::KNOWN.into_iter().filter(|&id| self.is_installed(id)).collect();
        installed
            .iter()
            .copied()
            .find(|&id| self.is_running(id))
            .or_else(|| installed.first().copied())
            .unwrap_or(BackendId::None)
    }

    fn query(
        &self,
        id: BackendId,
        what: &str,
        check: impl Fn(&dyn Detection, &dyn HostProbe) -> std::io::Result<bool>,
    ) -> bool {
        let Some(strategy) = detection(id) else {
            return false;
        };
        match check(strategy, self.probe.as_ref()) {
            Ok(found) => {
                debug!("{} {} probe: {}", id, what, found);
                found
            }
            Err(e) => {
                warn!("{} {} probe failed, assuming absent: {}", id, what, e);
                false
            }
        }
    }
}

impl StaticHost {
    /// A host on which `id` appears installed.
    ///
    /// Sets a virtual application data root if none is configured yet.
    /// `None` and `All` leave the host unchanged.
    pub fn with_installed(self, id: BackendId) -> Self {
        let Some(strategy) = detection(id) else {
            return self;
        };
        let (host, root) = match self.env_var(APP_DATA_VAR) {
            Some(root) => (self, root),
            None => (self.with_env(APP_DATA_VAR, "/appdata"), "/appdata".to_string()),
        };
        match strategy.install_locations(std::path::Path::new(&root)).into_iter().next() {
            Some(location) => host.with_directory(location),
            None => host,
        }
    }
}

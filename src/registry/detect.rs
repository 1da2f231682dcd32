//! Per-backend detection strategies

use std::io;
use std::path::{Path, PathBuf};

use super::probe::{HostProbe, process_name_matches};
use crate::types::BackendId;

/// Environment variable holding the roaming application data root.
pub const APP_DATA_VAR: &str = "APPDATA";

/// How to tell whether one simulator is installed and running.
pub trait Detection: Send + Sync {
    /// Directories under the application data root whose presence implies
    /// an installation.
    fn install_locations(&self, app_data: &Path) -> Vec<PathBuf>;

    /// Executable name of the running simulator.
    fn executable(&self) -> &'static str;

    fn is_installed(&self, host: &dyn HostProbe) -> io::Result<bool> {
        let Some(app_data) = host.env_var(APP_DATA_VAR) else {
            return Ok(false);
        };
        for location in self.install_locations(Path::new(&app_data)) {
            if host.is_dir(&location)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn is_running(&self, host: &dyn HostProbe) -> io::Result<bool> {
        let executable = self.executable();
        Ok(host.process_names()?.iter().any(|name| process_name_matches(name, executable)))
    }
}

/// Microsoft Flight Simulator (2020), Store and Steam editions.
pub struct MsfsDetection;

impl Detection for MsfsDetection {
    fn install_locations(&self, app_data: &Path) -> Vec<PathBuf> {
        vec![
            app_data.join("Local/Packages/Microsoft.FlightSimulator_8wekyb3d8bbwe"),
            app_data.join("Microsoft Flight Simulator"),
        ]
    }

    fn executable(&self) -> &'static str {
        "FlightSimulator.exe"
    }
}

pub struct Prepar3dV5Detection;

impl Detection for Prepar3dV5Detection {
    fn install_locations(&self, app_data: &Path) -> Vec<PathBuf> {
        vec![app_data.join("Lockheed Martin/Prepar3D v5")]
    }

    fn executable(&self) -> &'static str {
        "Prepar3D.exe"
    }
}

static MSFS: MsfsDetection = MsfsDetection;
static PREPAR3D_V5: Prepar3dV5Detection = Prepar3dV5Detection;

/// Strategy for a concrete backend; `None` for the `None` and `All` markers.
pub fn detection(id: BackendId) -> Option<&'static dyn Detection> {
    match id {
        BackendId::Msfs => Some(&MSFS),
        BackendId::Prepar3dV5 => Some(&PREPAR3D_V5),
        BackendId::None | BackendId::All => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StaticHost;

    #[test]
    fn every_known_backend_has_a_strategy() {
        for id in BackendId::KNOWN {
            assert!(detection(id).is_some(), "{id} has no detection strategy");
        }
        assert!(detection(BackendId::None).is_none());
        assert!(detection(BackendId::All).is_none());
    }

    #[test]
    fn steam_edition_counts_as_installed() {
        let host = StaticHost::new()
            .with_env(APP_DATA_VAR, "/appdata")
            .with_directory("/appdata/Microsoft Flight Simulator");
        assert!(MSFS.is_installed(&host).unwrap());
        assert!(!PREPAR3D_V5.is_installed(&host).unwrap());
    }

    #[test]
    fn missing_app_data_means_not_installed() {
        let host = StaticHost::new().with_directory("/appdata/Microsoft Flight Simulator");
        assert!(!MSFS.is_installed(&host).unwrap());
    }

    #[test]
    fn running_matches_executable_name() {
        let host = StaticHost::new().with_process("explorer.exe").with_process("Prepar3D.exe");
        assert!(PREPAR3D_V5.is_running(&host).unwrap());
        assert!(!MSFS.is_running(&host).unwrap());
    }
}

//! Host environment probes

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

/// Read-only view of the host used to detect simulator installations.
///
/// Every query may fail; callers treat a failed probe as "not found".
pub trait HostProbe: Send + Sync {
    /// Value of an environment variable, if set.
    fn env_var(&self, key: &str) -> Option<String>;

    /// Whether `path` exists and is a directory.
    fn is_dir(&self, path: &Path) -> io::Result<bool>;

    /// Executable names of all running processes.
    fn process_names(&self) -> io::Result<Vec<String>>;
}

/// Probes the real host.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProbe;

impl HostProbe for SystemProbe {
    fn env_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        match std::fs::metadata(path) {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    #[cfg(windows)]
    fn process_names(&self) -> io::Result<Vec<String>> {
        super::windows::process_names()
    }

    #[cfg(not(windows))]
    fn process_names(&self) -> io::Result<Vec<String>> {
        // Simulators under Wine/Proton show up in procfs with a truncated comm
        let mut names = Vec::new();
        for entry in std::fs::read_dir("/proc")? {
            let entry = entry?;
            let is_pid =
                entry.file_name().to_str().is_some_and(|n| n.bytes().all(|b| b.is_ascii_digit()));
            if !is_pid {
                continue;
            }
            // Processes can exit between listing and reading
            if let Ok(comm) = std::fs::read_to_string(entry.path().join("comm")) {
                names.push(comm.trim_end().to_string());
            }
        }
        Ok(names)
    }
}

/// In-memory host for tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct StaticHost {
    env: Vec<(String, String)>,
    directories: HashSet<PathBuf>,
    processes: Vec<String>,
    unavailable: bool,
}

impl StaticHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn with_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.directories.insert(path.into());
        self
    }

    pub fn with_process(mut self, name: impl Into<String>) -> Self {
        self.processes.push(name.into());
        self
    }

    /// Every directory and process query fails with permission denied.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    fn check(&self) -> io::Result<()> {
        if self.unavailable {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "host probing denied"))
        } else {
            Ok(())
        }
    }
}

impl HostProbe for StaticHost {
    fn env_var(&self, key: &str) -> Option<String> {
        self.env.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    }

    fn is_dir(&self, path: &Path) -> io::Result<bool> {
        self.check()?;
        Ok(self.directories.contains(path))
    }

    fn process_names(&self) -> io::Result<Vec<String>> {
        self.check()?;
        Ok(self.processes.clone())
    }
}

/// Compare a reported process name against an executable name.
///
/// procfs truncates names to 15 bytes, so a full-length truncated name
/// matches any executable it is a prefix of.
pub(crate) fn process_name_matches(reported: &str, executable: &str) -> bool {
    const COMM_LEN: usize = 15;
    reported == executable
        || (reported.len() == COMM_LEN && executable.starts_with(reported))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncated_names_match_their_executable() {
        assert!(process_name_matches("FlightSimulator.exe", "FlightSimulator.exe"));
        assert!(!process_name_matches("FlightSimulato", "FlightSimulator.exe"));
        assert!(process_name_matches("FlightSimulator", "FlightSimulator.exe"));
        assert!(process_name_matches("Prepar3D.exe", "Prepar3D.exe"));
        assert!(!process_name_matches("prepar3d.exe", "Prepar3D.exe"));
    }

    #[test]
    fn static_host_reports_configured_state() {
        let host = StaticHost::new()
            .with_env("APPDATA", "C:/Users/pilot/AppData/Roaming")
            .with_directory("C:/sim")
            .with_process("Prepar3D.exe");

        assert_eq!(host.env_var("APPDATA").as_deref(), Some("C:/Users/pilot/AppData/Roaming"));
        assert!(host.is_dir(Path::new("C:/sim")).unwrap());
        assert!(!host.is_dir(Path::new("C:/other")).unwrap());
        assert_eq!(host.process_names().unwrap(), vec!["Prepar3D.exe".to_string()]);
    }

    #[test]
    fn unavailable_host_fails_queries() {
        let host = StaticHost::new().with_directory("C:/sim").unavailable();
        assert!(host.is_dir(Path::new("C:/sim")).is_err());
        assert!(host.process_names().is_err());
    }
}

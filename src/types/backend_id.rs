//! Backend identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies a flight simulator backend.
///
/// `None` means no backend was selected or detected. `All` is a wildcard used
/// in configuration matching and is never a live connection target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BackendId {
    #[default]
    None,
    All,
    /// Microsoft Flight Simulator 2020
    Msfs,
    /// Lockheed Martin Prepar3D v5
    Prepar3dV5,
}

impl BackendId {
    /// Every concrete backend, in detection order.
    pub const KNOWN: [BackendId; 2] = [BackendId::Msfs, BackendId::Prepar3dV5];

    /// Canonical configuration name.
    pub const fn name(self) -> &'static str {
        match self {
            BackendId::None => "",
            BackendId::All => "All",
            BackendId::Msfs => "MSFS",
            BackendId::Prepar3dV5 => "Prepar3D v5",
        }
    }

    /// Resolve a configuration name to its identifier.
    ///
    /// Exact, case-sensitive match against the canonical names. Anything else,
    /// including the empty string, resolves to [`BackendId::None`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "All" => BackendId::All,
            "MSFS" => BackendId::Msfs,
            "Prepar3D v5" => BackendId::Prepar3dV5,
            _ => BackendId::None,
        }
    }

    /// Whether this identifier may be the target of a live connection.
    pub const fn is_concrete(self) -> bool {
        matches!(self, BackendId::Msfs | BackendId::Prepar3dV5)
    }
}

impl fmt::Display for BackendId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendId::None => f.write_str("<none>"),
            other => f.write_str(other.name()),
        }
    }
}

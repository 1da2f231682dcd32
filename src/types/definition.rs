//! Variable group definitions

use serde::{Deserialize, Serialize};
use std::fmt;

use super::WireType;

/// Tag naming one family of simulated variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GroupTag {
    PrimaryFlightControl,
    SecondaryFlightControl,
    AircraftHandle,
    Light,
    SimulationTime,
    TimeZoneInfo,
}

impl GroupTag {
    /// All groups in registration order.
    pub const ALL: [GroupTag; 6] = [
        GroupTag::PrimaryFlightControl,
        GroupTag::SecondaryFlightControl,
        GroupTag::AircraftHandle,
        GroupTag::Light,
        GroupTag::SimulationTime,
        GroupTag::TimeZoneInfo,
    ];

    /// Per-group data definition identifier declared to the backend.
    pub const fn definition_id(self) -> u32 {
        match self {
            GroupTag::PrimaryFlightControl => 1,
            GroupTag::SecondaryFlightControl => 2,
            GroupTag::AircraftHandle => 3,
            GroupTag::Light => 4,
            GroupTag::SimulationTime => 5,
            GroupTag::TimeZoneInfo => 6,
        }
    }
}

impl fmt::Display for GroupTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// One simulated variable within a group layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableDefinition {
    /// Variable name as defined by the simulator
    pub name: &'static str,
    /// Unit tag requested from the simulator (e.g. "Position", "Radians")
    pub unit: &'static str,
    /// Wire data type of the field
    pub data_type: WireType,
    /// Byte offset within the wire record
    pub offset: usize,
}

/// Ordered, tightly packed layout of one variable group.
///
/// Offsets are assigned in declaration order with no padding between fields,
/// so the record size is exactly the sum of the field widths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableGroupDefinition {
    pub tag: GroupTag,
    pub variables: Vec<VariableDefinition>,
    size: usize,
}

impl VariableGroupDefinition {
    /// Build a packed definition from `(name, unit, type)` triples.
    pub fn new(tag: GroupTag, fields: &[(&'static str, &'static str, WireType)]) -> Self {
        let mut offset = 0;
        let variables = fields
            .iter()
            .map(|&(name, unit, data_type)| {
                let variable = VariableDefinition { name, unit, data_type, offset };
                offset += data_type.size();
                variable
            })
            .collect();

        Self { tag, variables, size: offset }
    }

    /// Size in bytes of one wire record.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Get a variable by name.
    pub fn get_variable(&self, name: &str) -> Option<&VariableDefinition> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Get the number of variables.
    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    /// Check that fields are contiguous and cover exactly [`size`](Self::size) bytes.
    pub fn validate(&self) -> crate::Result<()> {
        let mut expected = 0;
        for variable in &self.variables {
            if variable.offset != expected {
                return Err(crate::SimError::configuration(format!(
                    "{}: variable '{}' at offset {} leaves a gap (expected {})",
                    self.tag, variable.name, variable.offset, expected
                )));
            }
            expected += variable.data_type.size();
        }

        if expected != self.size {
            return Err(crate::SimError::configuration(format!(
                "{}: fields cover {} bytes but record size is {}",
                self.tag, expected, self.size
            )));
        }

        Ok(())
    }
}

//! Domain samples exchanged with storage and export collaborators

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::{GroupTag, LightStates};

/// Primary flight controls.
///
/// Positions are percent of travel in [-100, 100]; deflections are radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PrimaryFlightControlData {
    pub rudder_position: f64,
    pub elevator_position: f64,
    pub aileron_position: f64,
    pub rudder_deflection: f64,
    pub elevator_deflection: f64,
    pub left_aileron_deflection: f64,
    pub right_aileron_deflection: f64,
}

/// Secondary flight controls: flaps and spoilers, percent in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SecondaryFlightControlData {
    pub leading_edge_flaps_left_percent: f64,
    pub leading_edge_flaps_right_percent: f64,
    pub trailing_edge_flaps_left_percent: f64,
    pub trailing_edge_flaps_right_percent: f64,
    pub spoilers_handle_percent: f64,
    pub flaps_handle_index: i32,
}

/// Aircraft handles and levers, percent in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AircraftHandleData {
    pub brake_left_percent: f64,
    pub brake_right_percent: f64,
    pub water_rudder_handle_percent: f64,
    pub tailhook_percent: f64,
    pub canopy_open_percent: f64,
    pub folding_wing_left_percent: f64,
    pub folding_wing_right_percent: f64,
    pub gear_handle_down: bool,
    pub smoke_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LightData {
    pub states: LightStates,
}

/// Simulation date and time, local and UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SimulationTimeData {
    pub local: NaiveDateTime,
    pub zulu: NaiveDateTime,
}

/// Time zone and daylight information at the aircraft position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeZoneInfoData {
    /// Offset of local time from UTC, in seconds
    pub time_zone_offset_seconds: i32,
    pub zulu_sunrise: NaiveTime,
    pub zulu_sunset: NaiveTime,
}

/// One decoded sample of a single variable group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Sample {
    PrimaryFlightControl(PrimaryFlightControlData),
    SecondaryFlightControl(SecondaryFlightControlData),
    AircraftHandle(AircraftHandleData),
    Light(LightData),
    SimulationTime(SimulationTimeData),
    TimeZoneInfo(TimeZoneInfoData),
}

impl Sample {
    /// The group this sample belongs to.
    pub fn tag(&self) -> GroupTag {
        match self {
            Sample::PrimaryFlightControl(_) => GroupTag::PrimaryFlightControl,
            Sample::SecondaryFlightControl(_) => GroupTag::SecondaryFlightControl,
            Sample::AircraftHandle(_) => GroupTag::AircraftHandle,
            Sample::Light(_) => GroupTag::Light,
            Sample::SimulationTime(_) => GroupTag::SimulationTime,
            Sample::TimeZoneInfo(_) => GroupTag::TimeZoneInfo,
        }
    }
}

/// Samples captured (or to be injected) on one tick, one per group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleBatch {
    /// Milliseconds since recording start
    pub timestamp: i64,
    pub samples: Vec<Sample>,
}

impl SampleBatch {
    pub fn new(timestamp: i64, samples: Vec<Sample>) -> Self {
        Self { timestamp, samples }
    }

    /// The sample for `tag`, if this batch carries one.
    pub fn get(&self, tag: GroupTag) -> Option<&Sample> {
        self.samples.iter().find(|s| s.tag() == tag)
    }
}

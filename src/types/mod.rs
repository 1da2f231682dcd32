//! Core types for recording and replaying simulator state.
//!
//! ## Architecture
//!
//! The type system mirrors the simulator's data definitions:
//! - [`VariableGroupDefinition`] lists the variables of one group in wire order
//! - [`WireType`] maps to the simulator's data types with size information
//! - [`Sample`] holds one decoded group value in physical units
//! - [`SampleBatch`] and [`Recording`] carry timestamped samples to and from
//!   storage collaborators
//! - [`SamplingRate`] and [`BackendId`] are the closed enumerations consumed
//!   from configuration
//!
//! ## Usage Example
//!
//! ```rust
//! use skyreel::types::{GroupTag, LightData, LightStates, Recording, Sample, SampleBatch};
//!
//! let mut recording = Recording::new();
//! let lights = Sample::Light(LightData { states: LightStates::BEACON | LightStates::STROBE });
//! recording.push(SampleBatch::new(0, vec![lights])).unwrap();
//!
//! assert_eq!(recording.samples_for(GroupTag::Light).count(), 1);
//! ```

mod backend_id;
mod definition;
mod light_states;
mod recording;
mod sample;
mod sampling_rate;
mod wire_type;

pub use backend_id::BackendId;
pub use definition::{GroupTag, VariableDefinition, VariableGroupDefinition};
pub use light_states::LightStates;
pub use recording::Recording;
pub use sample::{
    AircraftHandleData, LightData, PrimaryFlightControlData, Sample, SampleBatch,
    SecondaryFlightControlData, SimulationTimeData, TimeZoneInfoData,
};
pub use sampling_rate::SamplingRate;
pub use wire_type::WireType;

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn backend_names_resolve_exactly(name in ".*") {
            let id = BackendId::from_name(&name);
            match name.as_str() {
                "All" => prop_assert_eq!(id, BackendId::All),
                "MSFS" => prop_assert_eq!(id, BackendId::Msfs),
                "Prepar3D v5" => prop_assert_eq!(id, BackendId::Prepar3dV5),
                _ => prop_assert_eq!(id, BackendId::None),
            }
        }
    }

    #[test]
    fn backend_name_round_trip() {
        for id in [BackendId::All, BackendId::Msfs, BackendId::Prepar3dV5] {
            assert_eq!(BackendId::from_name(id.name()), id);
        }
        assert_eq!(BackendId::from_name(""), BackendId::None);
        assert_eq!(BackendId::from_name("msfs"), BackendId::None);
        assert_eq!(BackendId::from_name(" MSFS"), BackendId::None);
    }

    #[test]
    fn only_concrete_backends_are_connectable() {
        assert!(!BackendId::None.is_concrete());
        assert!(!BackendId::All.is_concrete());
        assert!(BackendId::Msfs.is_concrete());
        assert!(BackendId::Prepar3dV5.is_concrete());
    }

    #[test]
    fn batch_lookup_by_tag() {
        let batch = SampleBatch::new(
            10,
            vec![
                Sample::Light(LightData::default()),
                Sample::TimeZoneInfo(TimeZoneInfoData::default()),
            ],
        );
        assert!(batch.get(GroupTag::Light).is_some());
        assert!(batch.get(GroupTag::TimeZoneInfo).is_some());
        assert!(batch.get(GroupTag::AircraftHandle).is_none());
    }
}

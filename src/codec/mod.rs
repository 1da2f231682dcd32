//! Variable group codecs.
//!
//! Each group of simulated variables owns one fixed, packed wire layout and
//! converts between that layout and a domain sample:
//!
//! - **Layout**: declared once per session to the backend, in field order
//! - **Decode**: wire record -> domain sample (recording), never fails
//! - **Encode**: domain sample -> wire record (replay), always exactly the
//!   declared record size with every byte written
//!
//! Typed codecs implement [`VariableGroupCodec`]. The session works with
//! byte buffers from the backend and dispatches through [`GroupTag`] with
//! [`decode`] and [`encode`], which is where record sizes are checked at the
//! process boundary.
//!
//! # Example
//!
//! ```rust
//! use skyreel::codec::{LightCodec, VariableGroupCodec};
//! use skyreel::types::{LightData, LightStates};
//!
//! let sample = LightData { states: LightStates::LANDING | LightStates::TAXI };
//! let record = LightCodec::encode(&sample);
//! assert_eq!(record.len(), LightCodec::layout().size());
//! assert_eq!(LightCodec::decode(&record), sample);
//! ```

mod aircraft_handle;
mod light;
pub mod normalize;
mod primary_flight_control;
mod secondary_flight_control;
mod simulation_time;
mod time_zone_info;
pub mod wire;

pub use aircraft_handle::AircraftHandleCodec;
pub use light::LightCodec;
pub use primary_flight_control::PrimaryFlightControlCodec;
pub use secondary_flight_control::SecondaryFlightControlCodec;
pub use simulation_time::SimulationTimeCodec;
pub use time_zone_info::TimeZoneInfoCodec;
pub use wire::WireRecord;

use crate::types::{GroupTag, Sample, VariableGroupDefinition, WireType};
use crate::{Result, SimError};

/// Conversion between one group's wire record and its domain sample.
pub trait VariableGroupCodec {
    /// Group handled by this codec
    const TAG: GroupTag;

    /// `(simulator variable, unit, wire type)` in wire order
    const FIELDS: &'static [(&'static str, &'static str, WireType)];

    /// Domain sample type
    type Sample;

    /// Fixed-size wire record
    type Record: WireRecord;

    /// Packed layout declared to the backend. Pure and deterministic.
    fn layout() -> VariableGroupDefinition {
        VariableGroupDefinition::new(Self::TAG, Self::FIELDS)
    }

    /// Convert a wire record into a domain sample.
    fn decode(record: &Self::Record) -> Self::Sample;

    /// Convert a domain sample into a wire record.
    fn encode(sample: &Self::Sample) -> Self::Record;
}

/// Layout of the group identified by `tag`.
pub fn layout(tag: GroupTag) -> VariableGroupDefinition {
    match tag {
        GroupTag::PrimaryFlightControl => PrimaryFlightControlCodec::layout(),
        GroupTag::SecondaryFlightControl => SecondaryFlightControlCodec::layout(),
        GroupTag::AircraftHandle => AircraftHandleCodec::layout(),
        GroupTag::Light => LightCodec::layout(),
        GroupTag::SimulationTime => SimulationTimeCodec::layout(),
        GroupTag::TimeZoneInfo => TimeZoneInfoCodec::layout(),
    }
}

/// Record size in bytes of the group identified by `tag`.
pub fn record_size(tag: GroupTag) -> usize {
    match tag {
        GroupTag::PrimaryFlightControl => {
            <PrimaryFlightControlCodec as VariableGroupCodec>::Record::SIZE
        }
        GroupTag::SecondaryFlightControl => {
            <SecondaryFlightControlCodec as VariableGroupCodec>::Record::SIZE
        }
        GroupTag::AircraftHandle => <AircraftHandleCodec as VariableGroupCodec>::Record::SIZE,
        GroupTag::Light => <LightCodec as VariableGroupCodec>::Record::SIZE,
        GroupTag::SimulationTime => <SimulationTimeCodec as VariableGroupCodec>::Record::SIZE,
        GroupTag::TimeZoneInfo => <TimeZoneInfoCodec as VariableGroupCodec>::Record::SIZE,
    }
}

/// Startup check that every group layout matches its record type.
pub fn verify_layouts() -> Result<()> {
    for tag in GroupTag::ALL {
        let layout = layout(tag);
        layout.validate()?;
        if layout.size() != record_size(tag) {
            return Err(SimError::configuration(format!(
                "{tag}: layout describes {} bytes but the record holds {}",
                layout.size(),
                record_size(tag)
            )));
        }
    }
    Ok(())
}

fn typed_record<C: VariableGroupCodec>(bytes: &[u8]) -> Result<C::Record> {
    C::Record::from_slice(bytes).ok_or_else(|| {
        SimError::backend_io(
            format!("decode ({} bytes received, {} expected)", bytes.len(), C::Record::SIZE),
            Some(C::TAG),
        )
    })
}

/// Decode a record received from the backend.
///
/// The only failure is a record whose length does not match the layout,
/// which can only come from a misbehaving backend.
pub fn decode(tag: GroupTag, bytes: &[u8]) -> Result<Sample> {
    let sample = match tag {
        GroupTag::PrimaryFlightControl => Sample::PrimaryFlightControl(
            PrimaryFlightControlCodec::decode(&typed_record::<PrimaryFlightControlCodec>(bytes)?),
        ),
        GroupTag::SecondaryFlightControl => Sample::SecondaryFlightControl(
            SecondaryFlightControlCodec::decode(&typed_record::<SecondaryFlightControlCodec>(
                bytes,
            )?),
        ),
        GroupTag::AircraftHandle => Sample::AircraftHandle(AircraftHandleCodec::decode(
            &typed_record::<AircraftHandleCodec>(bytes)?,
        )),
        GroupTag::Light => {
            Sample::Light(LightCodec::decode(&typed_record::<LightCodec>(bytes)?))
        }
        GroupTag::SimulationTime => Sample::SimulationTime(SimulationTimeCodec::decode(
            &typed_record::<SimulationTimeCodec>(bytes)?,
        )),
        GroupTag::TimeZoneInfo => Sample::TimeZoneInfo(TimeZoneInfoCodec::decode(
            &typed_record::<TimeZoneInfoCodec>(bytes)?,
        )),
    };
    Ok(sample)
}

/// Encode a sample into the wire record of its group.
pub fn encode(sample: &Sample) -> Vec<u8> {
    match sample {
        Sample::PrimaryFlightControl(data) => PrimaryFlightControlCodec::encode(data).to_vec(),
        Sample::SecondaryFlightControl(data) => SecondaryFlightControlCodec::encode(data).to_vec(),
        Sample::AircraftHandle(data) => AircraftHandleCodec::encode(data).to_vec(),
        Sample::Light(data) => LightCodec::encode(data).to_vec(),
        Sample::SimulationTime(data) => SimulationTimeCodec::encode(data).to_vec(),
        Sample::TimeZoneInfo(data) => TimeZoneInfoCodec::encode(data).to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LightData, LightStates};

    #[test]
    fn all_layouts_match_their_records() {
        verify_layouts().unwrap();
    }

    #[test]
    fn layouts_are_deterministic() {
        for tag in GroupTag::ALL {
            assert_eq!(layout(tag), layout(tag));
            assert_eq!(layout(tag).tag, tag);
        }
    }

    #[test]
    fn decode_rejects_wrong_length_from_backend() {
        let err = decode(GroupTag::Light, &[0u8; 3]).unwrap_err();
        assert!(matches!(err, SimError::BackendIo { group: Some(GroupTag::Light), .. }));
    }

    #[test]
    fn dispatch_round_trip() {
        let sample = Sample::Light(LightData { states: LightStates::CABIN | LightStates::LOGO });
        let bytes = encode(&sample);
        assert_eq!(bytes.len(), record_size(GroupTag::Light));
        assert_eq!(decode(GroupTag::Light, &bytes).unwrap(), sample);
    }

    #[test]
    fn zeroed_records_decode_for_every_group() {
        for tag in GroupTag::ALL {
            let bytes = vec![0u8; record_size(tag)];
            let sample = decode(tag, &bytes).unwrap();
            assert_eq!(sample.tag(), tag);
        }
    }
}

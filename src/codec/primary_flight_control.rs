//! Primary flight controls: rudder, elevator and ailerons

use super::VariableGroupCodec;
use super::normalize::POSITION_PERCENT;
use super::wire::{FieldReader, FieldWriter, packed_size};
use crate::types::{GroupTag, PrimaryFlightControlData, WireType};

const FIELDS: &[(&str, &str, WireType)] = &[
    ("Rudder Position", "Position", WireType::Float32),
    ("Elevator Position", "Position", WireType::Float32),
    ("Aileron Position", "Position", WireType::Float32),
    ("Rudder Deflection", "Radians", WireType::Float32),
    ("Elevator Deflection", "Radians", WireType::Float32),
    ("Aileron Left Deflection", "Radians", WireType::Float32),
    ("Aileron Right Deflection", "Radians", WireType::Float32),
];

const RECORD_SIZE: usize = 28;
const _: () = assert!(packed_size(FIELDS) == RECORD_SIZE);

/// Codec for [`GroupTag::PrimaryFlightControl`].
///
/// Positions travel normalized to [-1, 1]; deflections travel as radians.
pub struct PrimaryFlightControlCodec;

impl VariableGroupCodec for PrimaryFlightControlCodec {
    const TAG: GroupTag = GroupTag::PrimaryFlightControl;
    const FIELDS: &'static [(&'static str, &'static str, WireType)] = FIELDS;
    type Sample = PrimaryFlightControlData;
    type Record = [u8; RECORD_SIZE];

    fn decode(record: &Self::Record) -> Self::Sample {
        let mut r = FieldReader::new(record);
        PrimaryFlightControlData {
            rudder_position: POSITION_PERCENT.from_signed(r.f32()),
            elevator_position: POSITION_PERCENT.from_signed(r.f32()),
            aileron_position: POSITION_PERCENT.from_signed(r.f32()),
            rudder_deflection: f64::from(r.f32()),
            elevator_deflection: f64::from(r.f32()),
            left_aileron_deflection: f64::from(r.f32()),
            right_aileron_deflection: f64::from(r.f32()),
        }
    }

    fn encode(sample: &Self::Sample) -> Self::Record {
        FieldWriter::new()
            .f32(POSITION_PERCENT.to_signed(sample.rudder_position))
            .f32(POSITION_PERCENT.to_signed(sample.elevator_position))
            .f32(POSITION_PERCENT.to_signed(sample.aileron_position))
            .f32(sample.rudder_deflection as f32)
            .f32(sample.elevator_deflection as f32)
            .f32(sample.left_aileron_deflection as f32)
            .f32(sample.right_aileron_deflection as f32)
            .finish()
    }
}

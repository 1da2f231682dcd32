//! Aircraft handles: brakes, water rudder, tailhook, canopy, folding wings, gear and smoke

use super::VariableGroupCodec;
use super::normalize::PERCENT;
use super::wire::{FieldReader, FieldWriter, packed_size};
use crate::types::{AircraftHandleData, GroupTag, WireType};

const FIELDS: &[(&str, &str, WireType)] = &[
    ("Brake Left Position", "Position", WireType::Float32),
    ("Brake Right Position", "Position", WireType::Float32),
    ("Water Rudder Handle Position", "Percent Over 100", WireType::Float32),
    ("Tailhook Position", "Percent Over 100", WireType::Float32),
    ("Canopy Open", "Percent Over 100", WireType::Float32),
    ("Folding Wing Left Percent", "Percent Over 100", WireType::Float32),
    ("Folding Wing Right Percent", "Percent Over 100", WireType::Float32),
    ("Gear Handle Position", "Bool", WireType::Int32),
    ("Smoke Enable", "Bool", WireType::Int32),
];

const RECORD_SIZE: usize = 36;
const _: () = assert!(packed_size(FIELDS) == RECORD_SIZE);

/// Codec for [`GroupTag::AircraftHandle`].
///
/// Brake positions are unsigned positions in [0, 1] on the wire.
pub struct AircraftHandleCodec;

impl VariableGroupCodec for AircraftHandleCodec {
    const TAG: GroupTag = GroupTag::AircraftHandle;
    const FIELDS: &'static [(&'static str, &'static str, WireType)] = FIELDS;
    type Sample = AircraftHandleData;
    type Record = [u8; RECORD_SIZE];

    fn decode(record: &Self::Record) -> Self::Sample {
        let mut r = FieldReader::new(record);
        AircraftHandleData {
            brake_left_percent: PERCENT.from_unit(r.f32()),
            brake_right_percent: PERCENT.from_unit(r.f32()),
            water_rudder_handle_percent: PERCENT.from_unit(r.f32()),
            tailhook_percent: PERCENT.from_unit(r.f32()),
            canopy_open_percent: PERCENT.from_unit(r.f32()),
            folding_wing_left_percent: PERCENT.from_unit(r.f32()),
            folding_wing_right_percent: PERCENT.from_unit(r.f32()),
            gear_handle_down: r.bool(),
            smoke_enabled: r.bool(),
        }
    }

    fn encode(sample: &Self::Sample) -> Self::Record {
        FieldWriter::new()
            .f32(PERCENT.to_unit(sample.brake_left_percent))
            .f32(PERCENT.to_unit(sample.brake_right_percent))
            .f32(PERCENT.to_unit(sample.water_rudder_handle_percent))
            .f32(PERCENT.to_unit(sample.tailhook_percent))
            .f32(PERCENT.to_unit(sample.canopy_open_percent))
            .f32(PERCENT.to_unit(sample.folding_wing_left_percent))
            .f32(PERCENT.to_unit(sample.folding_wing_right_percent))
            .bool(sample.gear_handle_down)
            .bool(sample.smoke_enabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn any_nonzero_bool_decodes_true() {
        let mut record = AircraftHandleCodec::encode(&AircraftHandleData::default());
        record[28..32].copy_from_slice(&(-1i32).to_le_bytes());
        record[32..36].copy_from_slice(&2i32.to_le_bytes());

        let decoded = AircraftHandleCodec::decode(&record);
        assert!(decoded.gear_handle_down);
        assert!(decoded.smoke_enabled);
    }

    #[test]
    fn negative_percent_clamps_to_zero() {
        let sample = AircraftHandleData { canopy_open_percent: -20.0, ..Default::default() };
        let decoded = AircraftHandleCodec::decode(&AircraftHandleCodec::encode(&sample));
        assert_eq!(decoded.canopy_open_percent, 0.0);
    }

    proptest! {
        #[test]
        fn round_trip_within_precision_bound(
            percents in prop::array::uniform7(0.0f64..=100.0),
            gear in any::<bool>(),
            smoke in any::<bool>()
        ) {
            let sample = AircraftHandleData {
                brake_left_percent: percents[0],
                brake_right_percent: percents[1],
                water_rudder_handle_percent: percents[2],
                tailhook_percent: percents[3],
                canopy_open_percent: percents[4],
                folding_wing_left_percent: percents[5],
                folding_wing_right_percent: percents[6],
                gear_handle_down: gear,
                smoke_enabled: smoke,
            };
            let decoded = AircraftHandleCodec::decode(&AircraftHandleCodec::encode(&sample));

            let bound = PERCENT.precision_bound();
            let got = [
                decoded.brake_left_percent,
                decoded.brake_right_percent,
                decoded.water_rudder_handle_percent,
                decoded.tailhook_percent,
                decoded.canopy_open_percent,
                decoded.folding_wing_left_percent,
                decoded.folding_wing_right_percent,
            ];
            for (g, p) in got.iter().zip(percents.iter()) {
                prop_assert!((g - p).abs() <= bound);
            }
            prop_assert_eq!(decoded.gear_handle_down, gear);
            prop_assert_eq!(decoded.smoke_enabled, smoke);
        }
    }
}

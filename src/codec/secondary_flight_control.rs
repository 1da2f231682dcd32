//! Secondary flight controls: flaps and spoilers

use super::VariableGroupCodec;
use super::normalize::PERCENT;
use super::wire::{FieldReader, FieldWriter, packed_size};
use crate::types::{GroupTag, SecondaryFlightControlData, WireType};

const FIELDS: &[(&str, &str, WireType)] = &[
    ("Leading Edge Flaps Left Percent", "Percent Over 100", WireType::Float32),
    ("Leading Edge Flaps Right Percent", "Percent Over 100", WireType::Float32),
    ("Trailing Edge Flaps Left Percent", "Percent Over 100", WireType::Float32),
    ("Trailing Edge Flaps Right Percent", "Percent Over 100", WireType::Float32),
    ("Spoilers Handle Position", "Percent Over 100", WireType::Float32),
    ("Flaps Handle Index", "Number", WireType::Int32),
];

const RECORD_SIZE: usize = 24;
const _: () = assert!(packed_size(FIELDS) == RECORD_SIZE);

/// Codec for [`GroupTag::SecondaryFlightControl`].
pub struct SecondaryFlightControlCodec;

impl VariableGroupCodec for SecondaryFlightControlCodec {
    const TAG: GroupTag = GroupTag::SecondaryFlightControl;
    const FIELDS: &'static [(&'static str, &'static str, WireType)] = FIELDS;
    type Sample = SecondaryFlightControlData;
    type Record = [u8; RECORD_SIZE];

    fn decode(record: &Self::Record) -> Self::Sample {
        let mut r = FieldReader::new(record);
        SecondaryFlightControlData {
            leading_edge_flaps_left_percent: PERCENT.from_unit(r.f32()),
            leading_edge_flaps_right_percent: PERCENT.from_unit(r.f32()),
            trailing_edge_flaps_left_percent: PERCENT.from_unit(r.f32()),
            trailing_edge_flaps_right_percent: PERCENT.from_unit(r.f32()),
            spoilers_handle_percent: PERCENT.from_unit(r.f32()),
            flaps_handle_index: r.i32(),
        }
    }

    fn encode(sample: &Self::Sample) -> Self::Record {
        FieldWriter::new()
            .f32(PERCENT.to_unit(sample.leading_edge_flaps_left_percent))
            .f32(PERCENT.to_unit(sample.leading_edge_flaps_right_percent))
            .f32(PERCENT.to_unit(sample.trailing_edge_flaps_left_percent))
            .f32(PERCENT.to_unit(sample.trailing_edge_flaps_right_percent))
            .f32(PERCENT.to_unit(sample.spoilers_handle_percent))
            .i32(sample.flaps_handle_index)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn layout_lists_flaps_before_handle_index() {
        let layout = SecondaryFlightControlCodec::layout();
        assert_eq!(layout.variable_count(), 6);
        assert_eq!(layout.get_variable("Flaps Handle Index").map(|v| v.offset), Some(20));
        assert_eq!(layout.size(), 24);
    }

    proptest! {
        #[test]
        fn round_trip_within_precision_bound(
            flaps in prop::array::uniform4(0.0f64..=100.0),
            spoilers in 0.0f64..=100.0,
            index in 0i32..8
        ) {
            let sample = SecondaryFlightControlData {
                leading_edge_flaps_left_percent: flaps[0],
                leading_edge_flaps_right_percent: flaps[1],
                trailing_edge_flaps_left_percent: flaps[2],
                trailing_edge_flaps_right_percent: flaps[3],
                spoilers_handle_percent: spoilers,
                flaps_handle_index: index,
            };
            let record = SecondaryFlightControlCodec::encode(&sample);
            let decoded = SecondaryFlightControlCodec::decode(&record);

            let bound = PERCENT.precision_bound();
            prop_assert!((decoded.leading_edge_flaps_left_percent - flaps[0]).abs() <= bound);
            prop_assert!((decoded.leading_edge_flaps_right_percent - flaps[1]).abs() <= bound);
            prop_assert!((decoded.trailing_edge_flaps_left_percent - flaps[2]).abs() <= bound);
            prop_assert!((decoded.trailing_edge_flaps_right_percent - flaps[3]).abs() <= bound);
            prop_assert!((decoded.spoilers_handle_percent - spoilers).abs() <= bound);
            prop_assert_eq!(decoded.flaps_handle_index, index);
        }
    }
}

//! Wire layouts as seen by a simulator

use proptest::prelude::*;
use skyreel::codec::{self, PrimaryFlightControlCodec, VariableGroupCodec};
use skyreel::types::{
    GroupTag, LightData, LightStates, PrimaryFlightControlData, Sample, TimeZoneInfoData, WireType,
};
use skyreel::{ErrorCategory, SimError};

#[test]
fn record_sizes_are_fixed() {
    let sizes: Vec<(GroupTag, usize)> =
        GroupTag::ALL.iter().map(|&tag| (tag, codec::layout(tag).size())).collect();
    assert_eq!(
        sizes,
        vec![
            (GroupTag::PrimaryFlightControl, 28),
            (GroupTag::SecondaryFlightControl, 24),
            (GroupTag::AircraftHandle, 36),
            (GroupTag::Light, 4),
            (GroupTag::SimulationTime, 32),
            (GroupTag::TimeZoneInfo, 12),
        ]
    );
    codec::verify_layouts().unwrap();
}

#[test]
fn fields_are_packed_in_declaration_order() {
    for tag in GroupTag::ALL {
        let layout = codec::layout(tag);
        let mut expected_offset = 0;
        for variable in &layout.variables {
            assert_eq!(variable.offset, expected_offset, "{tag}: {}", variable.name);
            expected_offset += variable.data_type.size();
        }
        assert_eq!(expected_offset, layout.size(), "{tag}");
    }
}

#[test]
fn primary_controls_travel_normalized() {
    let sample = PrimaryFlightControlData {
        rudder_position: 50.0,
        elevator_position: -100.0,
        aileron_position: 0.0,
        rudder_deflection: 0.25,
        ..Default::default()
    };
    let record = PrimaryFlightControlCodec::encode(&sample);

    assert_eq!(record[0..4], 0.5f32.to_le_bytes());
    assert_eq!(record[4..8], (-1.0f32).to_le_bytes());
    assert_eq!(record[8..12], 0.0f32.to_le_bytes());
    assert_eq!(record[12..16], 0.25f32.to_le_bytes());
    assert_eq!(PrimaryFlightControlCodec::decode(&record), sample);

    let layout = PrimaryFlightControlCodec::layout();
    let rudder = layout.get_variable("Rudder Position").unwrap();
    assert_eq!((rudder.unit, rudder.data_type, rudder.offset), ("Position", WireType::Float32, 0));
}

#[test]
fn light_mask_is_little_endian() {
    let sample = Sample::Light(LightData { states: LightStates::LOGO | LightStates::NAVIGATION });
    assert_eq!(codec::encode(&sample), vec![0x01, 0x01, 0x00, 0x00]);
}

#[test]
fn time_zone_offsets_keep_their_sign() {
    let record = [(-18_000i32).to_le_bytes(), 21_600i32.to_le_bytes(), 72_000i32.to_le_bytes()]
        .concat();
    let Sample::TimeZoneInfo(TimeZoneInfoData { time_zone_offset_seconds, zulu_sunrise, .. }) =
        codec::decode(GroupTag::TimeZoneInfo, &record).unwrap()
    else {
        panic!("decoded the wrong group");
    };
    assert_eq!(time_zone_offset_seconds, -18_000);
    assert_eq!(zulu_sunrise.to_string(), "06:00:00");
}

#[test]
fn short_records_are_backend_errors() {
    let err = codec::decode(GroupTag::AircraftHandle, &[0u8; 35]).unwrap_err();
    assert_eq!(err.category(), ErrorCategory::BackendIo);
    assert!(matches!(err, SimError::BackendIo { group: Some(GroupTag::AircraftHandle), .. }));
}

proptest! {
    #[test]
    fn any_record_of_the_right_size_decodes(tag_index in 0usize..6, seed in any::<u64>()) {
        let tag = GroupTag::ALL[tag_index];
        let size = codec::record_size(tag);
        let bytes: Vec<u8> =
            (0..size).map(|i| (seed.rotate_left(i as u32 * 7) & 0xff) as u8).collect();

        let sample = codec::decode(tag, &bytes).unwrap();
        prop_assert_eq!(sample.tag(), tag);
        prop_assert_eq!(codec::encode(&sample).len(), size);
    }
}

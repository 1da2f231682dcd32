//! Time zone offset and zulu sunrise/sunset

use chrono::{NaiveTime, Timelike};

use super::VariableGroupCodec;
use super::wire::{FieldReader, FieldWriter, packed_size};
use crate::types::{GroupTag, TimeZoneInfoData, WireType};

const FIELDS: &[(&str, &str, WireType)] = &[
    ("Time Zone Offset", "Seconds", WireType::Int32),
    ("Zulu Sunrise Time", "Seconds", WireType::Int32),
    ("Zulu Sunset Time", "Seconds", WireType::Int32),
];

const RECORD_SIZE: usize = 12;
const _: () = assert!(packed_size(FIELDS) == RECORD_SIZE);

/// Codec for [`GroupTag::TimeZoneInfo`].
pub struct TimeZoneInfoCodec;

fn time_of_day(seconds: i32) -> NaiveTime {
    u32::try_from(seconds)
        .ok()
        .and_then(|s| NaiveTime::from_num_seconds_from_midnight_opt(s, 0))
        .unwrap_or_default()
}

impl VariableGroupCodec for TimeZoneInfoCodec {
    const TAG: GroupTag = GroupTag::TimeZoneInfo;
    const FIELDS: &'static [(&'static str, &'static str, WireType)] = FIELDS;
    type Sample = TimeZoneInfoData;
    type Record = [u8; RECORD_SIZE];

    fn decode(record: &Self::Record) -> Self::Sample {
        let mut r = FieldReader::new(record);
        TimeZoneInfoData {
            time_zone_offset_seconds: r.i32(),
            zulu_sunrise: time_of_day(r.i32()),
            zulu_sunset: time_of_day(r.i32()),
        }
    }

    fn encode(sample: &Self::Sample) -> Self::Record {
        FieldWriter::new()
            .i32(sample.time_zone_offset_seconds)
            .i32(sample.zulu_sunrise.num_seconds_from_midnight() as i32)
            .i32(sample.zulu_sunset.num_seconds_from_midnight() as i32)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn negative_offset_is_preserved() {
        let sample = TimeZoneInfoData {
            time_zone_offset_seconds: -7 * 3600,
            zulu_sunrise: NaiveTime::from_hms_opt(12, 30, 0).unwrap(),
            zulu_sunset: NaiveTime::from_hms_opt(3, 15, 10).unwrap(),
        };
        assert_eq!(TimeZoneInfoCodec::decode(&TimeZoneInfoCodec::encode(&sample)), sample);
    }

    proptest! {
        #[test]
        fn round_trip(offset in -50_400i32..=50_400, rise in 0u32..86_400, set in 0u32..86_400) {
            let sample = TimeZoneInfoData {
                time_zone_offset_seconds: offset,
                zulu_sunrise: NaiveTime::from_num_seconds_from_midnight_opt(rise, 0).unwrap(),
                zulu_sunset: NaiveTime::from_num_seconds_from_midnight_opt(set, 0).unwrap(),
            };
            prop_assert_eq!(TimeZoneInfoCodec::decode(&TimeZoneInfoCodec::encode(&sample)), sample);
        }
    }
}

//! Aircraft lights

use super::VariableGroupCodec;
use super::wire::{FieldReader, FieldWriter, packed_size};
use crate::types::{GroupTag, LightData, LightStates, WireType};

const FIELDS: &[(&str, &str, WireType)] = &[("Light States", "Mask", WireType::Int32)];

const RECORD_SIZE: usize = 4;
const _: () = assert!(packed_size(FIELDS) == RECORD_SIZE);

/// Codec for [`GroupTag::Light`]. The mask travels bit-for-bit.
pub struct LightCodec;

impl VariableGroupCodec for LightCodec {
    const TAG: GroupTag = GroupTag::Light;
    const FIELDS: &'static [(&'static str, &'static str, WireType)] = FIELDS;
    type Sample = LightData;
    type Record = [u8; RECORD_SIZE];

    fn decode(record: &Self::Record) -> Self::Sample {
        let mut r = FieldReader::new(record);
        LightData { states: LightStates::new(r.i32() as u32) }
    }

    fn encode(sample: &Self::Sample) -> Self::Record {
        FieldWriter::new().i32(sample.states.value() as i32).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn every_mask_round_trips(mask in any::<u32>()) {
            let sample = LightData { states: LightStates::new(mask) };
            prop_assert_eq!(LightCodec::decode(&LightCodec::encode(&sample)), sample);
        }
    }
}

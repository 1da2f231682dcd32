//! Simulation date and time, local and zulu

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use super::VariableGroupCodec;
use super::wire::{FieldReader, FieldWriter, packed_size};
use crate::types::{GroupTag, SimulationTimeData, WireType};

const FIELDS: &[(&str, &str, WireType)] = &[
    ("Local Time", "Seconds", WireType::Int32),
    ("Local Year", "Number", WireType::Int32),
    ("Local Month of Year", "Number", WireType::Int32),
    ("Local Day of Month", "Number", WireType::Int32),
    ("Zulu Time", "Seconds", WireType::Int32),
    ("Zulu Year", "Number", WireType::Int32),
    ("Zulu Month of Year", "Number", WireType::Int32),
    ("Zulu Day of Month", "Number", WireType::Int32),
];

const RECORD_SIZE: usize = 32;
const _: () = assert!(packed_size(FIELDS) == RECORD_SIZE);

/// Codec for [`GroupTag::SimulationTime`].
///
/// Times travel as whole seconds since midnight. A calendar value the
/// simulator reports out of range decodes to the chrono default rather
/// than failing the tick.
pub struct SimulationTimeCodec;

fn read_date_time(r: &mut FieldReader<'_>) -> NaiveDateTime {
    let seconds = r.i32();
    let year = r.i32();
    let month = r.i32();
    let day = r.i32();

    let time = u32::try_from(seconds)
        .ok()
        .and_then(|s| NaiveTime::from_num_seconds_from_midnight_opt(s, 0))
        .unwrap_or_default();
    let date = match (u32::try_from(month), u32::try_from(day)) {
        (Ok(month), Ok(day)) => NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default(),
        _ => NaiveDate::default(),
    };
    date.and_time(time)
}

fn write_date_time<'w>(
    w: &'w mut FieldWriter<[u8; RECORD_SIZE]>,
    value: &NaiveDateTime,
) -> &'w mut FieldWriter<[u8; RECORD_SIZE]> {
    w.i32(value.num_seconds_from_midnight() as i32)
        .i32(value.year())
        .i32(value.month() as i32)
        .i32(value.day() as i32)
}

impl VariableGroupCodec for SimulationTimeCodec {
    const TAG: GroupTag = GroupTag::SimulationTime;
    const FIELDS: &'static [(&'static str, &'static str, WireType)] = FIELDS;
    type Sample = SimulationTimeData;
    type Record = [u8; RECORD_SIZE];

    fn decode(record: &Self::Record) -> Self::Sample {
        let mut r = FieldReader::new(record);
        let local = read_date_time(&mut r);
        let zulu = read_date_time(&mut r);
        SimulationTimeData { local, zulu }
    }

    fn encode(sample: &Self::Sample) -> Self::Record {
        let mut w = FieldWriter::new();
        write_date_time(&mut w, &sample.local);
        write_date_time(&mut w, &sample.zulu);
        w.finish()
    }
}

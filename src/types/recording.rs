//! In-memory recording of sample batches

use serde::{Deserialize, Serialize};

use super::{GroupTag, Sample, SampleBatch};
use crate::{Result, SimError};

/// Ordered sequence of sample batches with non-decreasing timestamps.
///
/// This is the hand-off format to storage and export collaborators: they
/// read it after recording and supply it for replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recording {
    batches: Vec<SampleBatch>,
}

impl Recording {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from batches, rejecting out-of-order timestamps.
    pub fn from_batches(batches: Vec<SampleBatch>) -> Result<Self> {
        let mut recording = Self::new();
        for batch in batches {
            recording.push(batch)?;
        }
        Ok(recording)
    }

    /// Append a batch. Its timestamp must not precede the last one.
    pub fn push(&mut self, batch: SampleBatch) -> Result<()> {
        if let Some(last) = self.batches.last()
            && batch.timestamp < last.timestamp
        {
            return Err(SimError::configuration(format!(
                "sample at {} ms precedes previous sample at {} ms",
                batch.timestamp, last.timestamp
            )));
        }
        self.batches.push(batch);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SampleBatch> {
        self.batches.get(index)
    }

    pub fn batches(&self) -> &[SampleBatch] {
        &self.batches
    }

    /// Timestamp of the last batch, in milliseconds.
    pub fn duration(&self) -> i64 {
        self.batches.last().map(|b| b.timestamp).unwrap_or(0)
    }

    /// Index of the first batch at or after `timestamp`, clamped to the last batch.
    pub fn index_at(&self, timestamp: i64) -> usize {
        let index = self.batches.partition_point(|b| b.timestamp < timestamp);
        index.min(self.batches.len().saturating_sub(1))
    }

    /// All samples of one group with their timestamps, in recorded order.
    pub fn samples_for(&self, tag: GroupTag) -> impl Iterator<Item = (i64, &Sample)> + '_ {
        self.batches.iter().filter_map(move |b| b.get(tag).map(|s| (b.timestamp, s)))
    }

    /// Average captured batches per second over the recording.
    pub fn samples_per_second(&self) -> f64 {
        match self.batches.len() {
            0 | 1 => 0.0,
            n => {
                let span = (self.duration() - self.batches[0].timestamp) as f64 / 1000.0;
                if span > 0.0 { (n - 1) as f64 / span } else { 0.0 }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LightData, LightStates};

    fn light_batch(timestamp: i64) -> SampleBatch {
        SampleBatch::new(
            timestamp,
            vec![Sample::Light(LightData { states: LightStates::BEACON })],
        )
    }

    #[test]
    fn rejects_decreasing_timestamps() {
        let mut recording = Recording::new();
        recording.push(light_batch(0)).unwrap();
        recording.push(light_batch(50)).unwrap();
        recording.push(light_batch(50)).unwrap();
        assert!(recording.push(light_batch(10)).is_err());
        assert_eq!(recording.len(), 3);
    }

    #[test]
    fn index_lookup_clamps() {
        let recording =
            Recording::from_batches((0..10).map(|i| light_batch(i * 100)).collect()).unwrap();
        assert_eq!(recording.index_at(-5), 0);
        assert_eq!(recording.index_at(0), 0);
        assert_eq!(recording.index_at(250), 3);
        assert_eq!(recording.index_at(900), 9);
        assert_eq!(recording.index_at(5_000), 9);
    }

    #[test]
    fn samples_per_second_from_span() {
        let recording =
            Recording::from_batches((0..11).map(|i| light_batch(i * 50)).collect()).unwrap();
        assert!((recording.samples_per_second() - 20.0).abs() < 1e-9);
        assert_eq!(Recording::new().samples_per_second(), 0.0);
    }

    #[test]
    fn samples_for_filters_by_group() {
        let recording = Recording::from_batches(vec![light_batch(0), light_batch(20)]).unwrap();
        assert_eq!(recording.samples_for(GroupTag::Light).count(), 2);
        assert_eq!(recording.samples_for(GroupTag::TimeZoneInfo).count(), 0);
    }
}

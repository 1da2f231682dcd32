//! Storage collaborator boundary

use tokio::sync::mpsc;

use crate::types::SampleBatch;
use crate::{Result, SimError};

/// Receives recorded sample batches, in non-decreasing timestamp order.
pub trait SampleSink: Send + 'static {
    fn deliver(&mut self, batch: &SampleBatch) -> Result<()>;
}

impl SampleSink for mpsc::UnboundedSender<SampleBatch> {
    fn deliver(&mut self, batch: &SampleBatch) -> Result<()> {
        self.send(batch.clone())
            .map_err(|_| SimError::configuration("sample sink receiver dropped"))
    }
}

/// Bounded channels drop the batch rather than stall the tick.
impl SampleSink for mpsc::Sender<SampleBatch> {
    fn deliver(&mut self, batch: &SampleBatch) -> Result<()> {
        self.try_send(batch.clone()).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                SimError::configuration("sample sink is full, batch dropped")
            }
            mpsc::error::TrySendError::Closed(_) => {
                SimError::configuration("sample sink receiver dropped")
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounded_sink_reports_full_channel() {
        let (mut tx, _rx) = mpsc::channel(1);
        let batch = SampleBatch::new(0, Vec::new());
        tx.deliver(&batch).unwrap();
        assert!(tx.deliver(&batch).is_err());
    }

    #[test]
    fn closed_sink_is_an_error() {
        let (mut tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        assert!(tx.deliver(&SampleBatch::new(0, Vec::new())).is_err());
    }
}

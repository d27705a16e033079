//! Hand-off points for samples produced by the engine.

use std::sync::mpsc::Sender;

use super::types::Sample;

/// Receives every sample right after the engine records it.
///
/// Sinks observe; they cannot alter the history.
pub trait SampleSink {
    /// Called once per iteration with the freshly recorded sample.
    fn on_sample(&mut self, sample: &Sample);
}

impl<F: FnMut(&Sample)> SampleSink for F {
    fn on_sample(&mut self, sample: &Sample) {
        self(sample);
    }
}

/// Forwards samples over a channel. A dropped receiver is ignored.
impl SampleSink for Sender<Sample> {
    fn on_sample(&mut self, sample: &Sample) {
        if self.send(sample.clone()).is_err() {
            tracing::trace!(iteration = sample.iteration, "sample receiver dropped");
        }
    }
}

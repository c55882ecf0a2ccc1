//! Decode raw frames and forward them to a [`FrameSink`].

use tracing::{debug, info};

use super::FrameSink;
use crate::error::Result;
use crate::klimalogg::protocol::BASE_STATION;
use crate::klimalogg::{parse_current_weather, FrameStatus};

/// Frame counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessorStats {
    /// Frames decoded completely
    pub decoded: u64,
    /// Frames shorter than the current-weather layout
    pub short: u64,
    /// Lines that were not valid hex
    pub invalid: u64,
}

/// Ties the frame parser to a sink
#[derive(Debug)]
pub struct FrameProcessor<S> {
    sink: S,
    discard_short_frames: bool,
    stats: ProcessorStats,
}

impl<S: FrameSink> FrameProcessor<S> {
    /// Create a processor
    ///
    /// # Arguments
    ///
    /// * `sink` - Destination for decoded frames
    /// * `discard_short_frames` - Drop short frames instead of forwarding
    ///   their all-sentinel placeholder
    pub fn new(sink: S, discard_short_frames: bool) -> Self {
        Self {
            sink,
            discard_short_frames,
            stats: ProcessorStats::default(),
        }
    }

    /// Decode one raw buffer and forward the result
    ///
    /// # Errors
    ///
    /// Only sink failures are returned; short frames are counted, not errors.
    pub fn process(&mut self, data: &[u8]) -> Result<FrameStatus> {
        let parsed = parse_current_weather(data);

        match parsed.status {
            FrameStatus::Complete => {
                self.stats.decoded += 1;
                let base = &parsed.frame.sensors[BASE_STATION];
                info!(
                    "Frame #{}: base {:?} °C, {:?} %, signal {}",
                    self.stats.decoded,
                    base.temperature.value(),
                    base.humidity.value(),
                    parsed.frame.signal_quality
                );
            }
            FrameStatus::Short { length } => {
                self.stats.short += 1;
                if self.discard_short_frames {
                    debug!("Discarding short frame ({} bytes)", length);
                    return Ok(parsed.status);
                }
            }
        }

        self.sink.record(&parsed.frame)?;
        Ok(parsed.status)
    }

    /// Count a line that could not be turned into a frame
    pub fn record_invalid(&mut self) {
        self.stats.invalid += 1;
    }

    /// Counters so far
    pub fn stats(&self) -> ProcessorStats {
        self.stats
    }

    /// Give back the sink
    pub fn into_sink(self) -> S {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KlimaLoggError;
    use crate::klimalogg::protocol::{Reading, CURRENT_WEATHER_MIN_LENGTH};
    use crate::telemetry::MockFrameSink;
    use mockall::predicate::always;

    #[test]
    fn test_complete_frame_is_recorded() {
        let mut sink = MockFrameSink::new();
        sink.expect_record().times(1).returning(|_| Ok(()));

        let mut processor = FrameProcessor::new(sink, true);
        let status = processor.process(&[0u8; CURRENT_WEATHER_MIN_LENGTH]).unwrap();

        assert_eq!(status, FrameStatus::Complete);
        assert_eq!(processor.stats().decoded, 1);
        assert_eq!(processor.stats().short, 0);
    }

    #[test]
    fn test_short_frame_discarded() {
        let mut sink = MockFrameSink::new();
        sink.expect_record().times(0);

        let mut processor = FrameProcessor::new(sink, true);
        let status = processor.process(&[0u8; 100]).unwrap();

        assert_eq!(status, FrameStatus::Short { length: 100 });
        assert_eq!(processor.stats().short, 1);
    }

    #[test]
    fn test_short_frame_forwarded_as_placeholder() {
        let mut sink = MockFrameSink::new();
        sink.expect_record()
            .withf(|frame| frame.sensors.iter().all(|s| s.temperature == Reading::NotPresent))
            .times(1)
            .returning(|_| Ok(()));

        let mut processor = FrameProcessor::new(sink, false);
        processor.process(&[0u8; 10]).unwrap();
        assert_eq!(processor.stats().short, 1);
    }

    #[test]
    fn test_sink_error_propagates() {
        let mut sink = MockFrameSink::new();
        sink.expect_record()
            .with(always())
            .returning(|_| Err(KlimaLoggError::Serial("sink closed".to_string())));

        let mut processor = FrameProcessor::new(sink, true);
        let result = processor.process(&[0u8; CURRENT_WEATHER_MIN_LENGTH]);
        assert!(matches!(result, Err(KlimaLoggError::Serial(_))));
    }

    #[test]
    fn test_disabled_sink_accepts_everything() {
        let mut processor = FrameProcessor::new(None::<MockFrameSink>, false);
        processor.process(&[0u8; CURRENT_WEATHER_MIN_LENGTH]).unwrap();
        processor.process(&[0u8; 3]).unwrap();
        processor.record_invalid();

        assert_eq!(
            processor.stats(),
            ProcessorStats {
                decoded: 1,
                short: 1,
                invalid: 1
            }
        );
        assert!(processor.into_sink().is_none());
    }
}

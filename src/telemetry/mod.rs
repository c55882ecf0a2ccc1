//! # Telemetry Module
//!
//! Hands decoded frames to their consumers.
//!
//! This module handles:
//! - The [`FrameSink`] seam between decoding and output
//! - Formatting frames as JSONL (JSON Lines)
//! - Writing to rotating log files
//! - Counting decoded, short and invalid frames

pub mod logger;
pub mod processor;
pub mod record;

pub use logger::JsonlLogger;
pub use processor::{FrameProcessor, ProcessorStats};
pub use record::FrameRecord;

use crate::error::Result;
use crate::klimalogg::CurrentWeatherFrame;

/// Destination for decoded frames
#[cfg_attr(test, mockall::automock)]
pub trait FrameSink {
    /// Consume one decoded frame
    fn record(&mut self, frame: &CurrentWeatherFrame) -> Result<()>;
}

/// `None` drops every frame (telemetry disabled)
impl<S: FrameSink> FrameSink for Option<S> {
    fn record(&mut self, frame: &CurrentWeatherFrame) -> Result<()> {
        match self {
            Some(sink) => sink.record(frame),
            None => Ok(()),
        }
    }
}

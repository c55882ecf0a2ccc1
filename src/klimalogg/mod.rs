//! # KlimaLogg Protocol Module
//!
//! Decoder for the KlimaLogg Pro weather station current-weather frame.
//!
//! This module handles:
//! - Nibble and BCD digit extraction at arbitrary alignment
//! - Temperature, humidity and timestamp field decoding
//! - "Not present" and "out of factory limits" sentinel detection
//! - Mapping the 9 sensor channels onto one shared frame buffer
//! - Battery status from the alarm block

pub mod nibble;
pub mod protocol;
pub mod decoder;
pub mod parser;

pub use parser::{parse_current_weather, FrameStatus, ParsedFrame};
pub use protocol::{CurrentWeatherFrame, Reading, SensorReading};

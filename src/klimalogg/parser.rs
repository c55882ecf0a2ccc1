//! # Current Weather Frame Parser
//!
//! Walks the sensor position table and runs the field decoders for all nine
//! channels of a current-weather frame.

use chrono::{NaiveDateTime, Utc};
use tracing::{debug, trace, warn};

use super::decoder::{decode_date_time8, decode_humidity, decode_temperature};
use super::nibble::{Nibble, NibblePos};
use super::protocol::*;
use crate::error::{KlimaLoggError, Result};

/// Alarm byte holding the remote sensor battery bits (bit `n` = channel `n + 1`)
const REMOTE_BATTERY_BYTE: usize = 0;

/// Alarm byte holding the base station battery bit
const BASE_BATTERY_BYTE: usize = 1;

/// Base station battery bit in [`BASE_BATTERY_BYTE`]
const BASE_BATTERY_MASK: u8 = 0x80;

/// Outcome of decoding one buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Every channel was decoded
    Complete,
    /// Buffer too short; the frame holds only defaults
    Short { length: usize },
}

/// A decoded frame together with how it was obtained
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFrame {
    pub frame: CurrentWeatherFrame,
    pub status: FrameStatus,
}

impl ParsedFrame {
    /// True if the buffer was long enough to decode
    pub fn is_complete(&self) -> bool {
        self.status == FrameStatus::Complete
    }

    /// Turn a short-frame status into an error
    ///
    /// # Errors
    ///
    /// Returns [`KlimaLoggError::ShortFrame`] if the buffer was too short.
    pub fn into_result(self) -> Result<CurrentWeatherFrame> {
        match self.status {
            FrameStatus::Complete => Ok(self.frame),
            FrameStatus::Short { length } => Err(KlimaLoggError::ShortFrame {
                expected: CURRENT_WEATHER_MIN_LENGTH,
                actual: length,
            }),
        }
    }
}

/// Decode a current-weather frame
///
/// Never fails: a buffer shorter than [`CURRENT_WEATHER_MIN_LENGTH`] yields a
/// frame with every reading at [`Reading::NotPresent`] and
/// [`FrameStatus::Short`]. Invalid fields inside a full-length buffer come
/// back as sentinel readings.
///
/// # Arguments
///
/// * `buffer` - Raw frame as received from the radio
///
/// # Examples
///
/// ```
/// use klimalogg_receiver::klimalogg::parser::{parse_current_weather, FrameStatus};
///
/// let parsed = parse_current_weather(&[0u8; 100]);
/// assert_eq!(parsed.status, FrameStatus::Short { length: 100 });
/// ```
pub fn parse_current_weather(buffer: &[u8]) -> ParsedFrame {
    let mut frame = CurrentWeatherFrame::default();

    if buffer.len() < CURRENT_WEATHER_MIN_LENGTH {
        warn!(
            "Current weather frame too short: {} bytes (need {})",
            buffer.len(),
            CURRENT_WEATHER_MIN_LENGTH
        );
        return ParsedFrame {
            frame,
            status: FrameStatus::Short { length: buffer.len() },
        };
    }

    frame.timestamp = Utc::now();
    frame.signal_quality = buffer[SIGNAL_QUALITY_OFFSET] & SIGNAL_QUALITY_MASK;

    for (channel, sensor) in frame.sensors.iter_mut().enumerate() {
        *sensor = parse_sensor(buffer, channel);
    }

    // The alarm block runs past the minimum length; missing bytes stay zero
    let alarm_end = buffer.len().min(ALARM_DATA_OFFSET + ALARM_DATA_LEN);
    let available = &buffer[ALARM_DATA_OFFSET..alarm_end];
    frame.alarm_data[..available.len()].copy_from_slice(available);

    debug!(
        "Decoded current weather frame ({} bytes, signal quality {})",
        buffer.len(),
        frame.signal_quality
    );

    ParsedFrame {
        frame,
        status: FrameStatus::Complete,
    }
}

/// Decode all fields of one channel
fn parse_sensor(buffer: &[u8], channel: usize) -> SensorReading {
    let pos = &SENSOR_POSITIONS[channel];
    let at = |col: usize, half: Nibble| NibblePos::new(pos[col], half);

    let mut sensor = SensorReading {
        temperature_max: decode_temperature(buffer, at(field::TEMPERATURE_MAX, Nibble::Low)),
        temperature_min: decode_temperature(buffer, at(field::TEMPERATURE_MIN, Nibble::High)),
        temperature: decode_temperature(buffer, at(field::TEMPERATURE, Nibble::Low)),
        ..SensorReading::default()
    };

    if sensor.temperature_max.is_valid() {
        let start = at(field::TEMPERATURE_MAX_TIME, Nibble::Low);
        sensor.temperature_max_time = timestamp(buffer, start, channel, "temperature_max");
    }
    if sensor.temperature_min.is_valid() {
        let start = at(field::TEMPERATURE_MIN_TIME, Nibble::Low);
        sensor.temperature_min_time = timestamp(buffer, start, channel, "temperature_min");
    }

    sensor.humidity_max = decode_humidity(buffer, at(field::HUMIDITY_MAX, Nibble::High));
    sensor.humidity_min = decode_humidity(buffer, at(field::HUMIDITY_MIN, Nibble::High));
    sensor.humidity = decode_humidity(buffer, at(field::HUMIDITY, Nibble::High));

    if sensor.humidity_max.is_valid() {
        let start = at(field::HUMIDITY_MAX_TIME, Nibble::High);
        sensor.humidity_max_time = timestamp(buffer, start, channel, "humidity_max");
    }
    if sensor.humidity_min.is_valid() {
        let start = at(field::HUMIDITY_MIN_TIME, Nibble::High);
        sensor.humidity_min_time = timestamp(buffer, start, channel, "humidity_min");
    }

    sensor
}

fn timestamp(
    buffer: &[u8],
    start: NibblePos,
    channel: usize,
    label: &str,
) -> Option<NaiveDateTime> {
    let ts = decode_date_time8(buffer, start);
    if ts.is_none() {
        trace!("Sensor {}: no valid date for {}", channel, label);
    }
    ts
}

/// Battery status of a channel from the raw alarm block
///
/// The base station (channel 0) is OK while bit 7 of alarm byte 1 is clear;
/// remote sensor `n` (1-8) while bit `n - 1` of alarm byte 0 is clear.
/// Channels outside 0-8 report `false`.
pub fn battery_ok(alarm_data: &[u8; ALARM_DATA_LEN], channel: usize) -> bool {
    match channel {
        BASE_STATION => alarm_data[BASE_BATTERY_BYTE] & BASE_BATTERY_MASK == 0,
        1..=8 => alarm_data[REMOTE_BATTERY_BYTE] & (1 << (channel - 1)) == 0,
        _ => false,
    }
}

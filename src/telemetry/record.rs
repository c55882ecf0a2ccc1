//! JSON shape of one logged frame.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::klimalogg::protocol::{CurrentWeatherFrame, SensorReading};

/// One JSONL record
#[derive(Debug, Serialize)]
pub struct FrameRecord<'a> {
    pub timestamp: DateTime<Utc>,
    pub signal_quality: u8,
    pub sensors: Vec<SensorRecord<'a>>,
    /// Raw alarm block as hex
    pub alarm_data: String,
}

/// One channel inside a [`FrameRecord`]
#[derive(Debug, Serialize)]
pub struct SensorRecord<'a> {
    pub channel: usize,
    pub battery_ok: bool,
    #[serde(flatten)]
    pub reading: &'a SensorReading,
}

impl<'a> From<&'a CurrentWeatherFrame> for FrameRecord<'a> {
    fn from(frame: &'a CurrentWeatherFrame) -> Self {
        let sensors = frame
            .sensors
            .iter()
            .enumerate()
            .map(|(channel, reading)| SensorRecord {
                channel,
                battery_ok: frame.battery_ok(channel),
                reading,
            })
            .collect();

        Self {
            timestamp: frame.timestamp,
            signal_quality: frame.signal_quality,
            sensors,
            alarm_data: hex::encode(frame.alarm_data),
        }
    }
}

//! # KlimaLogg Protocol Constants and Types
//!
//! Core definitions for the current-weather frame sent by the KlimaLogg Pro
//! base station.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

/// Minimum length of a current-weather frame
pub const CURRENT_WEATHER_MIN_LENGTH: usize = 230;

/// Number of sensor channels (base station + 8 remote sensors)
pub const NUM_SENSORS: usize = 9;

/// Channel index of the base station
pub const BASE_STATION: usize = 0;

/// Byte holding the signal quality in its low 7 bits
pub const SIGNAL_QUALITY_OFFSET: usize = 4;

/// Mask applied to the signal quality byte
pub const SIGNAL_QUALITY_MASK: u8 = 0x7F;

/// First byte of the alarm/battery block
pub const ALARM_DATA_OFFSET: usize = 223;

/// Length of the alarm/battery block
pub const ALARM_DATA_LEN: usize = 12;

/// Zero point of the temperature scale (raw 40.0 = 0.0 °C)
pub const TEMPERATURE_OFFSET: f32 = 40.0;

/// Legacy numeric value for a temperature sensor that is not present
pub const TEMPERATURE_NP: f32 = 81.1;

/// Legacy numeric value for a temperature outside factory limits
pub const TEMPERATURE_OFL: f32 = 136.0;

/// Legacy numeric value for a humidity sensor that is not present
pub const HUMIDITY_NP: u8 = 110;

/// Legacy numeric value for a humidity outside factory limits
pub const HUMIDITY_OFL: u8 = 121;

/// Byte distance between the same field of two consecutive sensors
pub const SENSOR_STRIDE: usize = 24;

/// Column indices into [`SENSOR_POSITIONS`].
pub mod field {
    /// Maximum temperature
    pub const TEMPERATURE_MAX: usize = 0;
    /// Minimum temperature
    pub const TEMPERATURE_MIN: usize = 1;
    /// Current temperature
    pub const TEMPERATURE: usize = 2;
    /// Time of maximum temperature
    pub const TEMPERATURE_MAX_TIME: usize = 3;
    /// Time of minimum temperature
    pub const TEMPERATURE_MIN_TIME: usize = 4;
    /// Maximum humidity
    pub const HUMIDITY_MAX: usize = 5;
    /// Minimum humidity
    pub const HUMIDITY_MIN: usize = 6;
    /// Current humidity
    pub const HUMIDITY: usize = 7;
    /// Time of maximum humidity
    pub const HUMIDITY_MAX_TIME: usize = 8;
    /// Time of minimum humidity
    pub const HUMIDITY_MIN_TIME: usize = 9;

    /// Number of columns per sensor
    pub const COUNT: usize = 10;
}

/// Buffer offsets of every field, per sensor channel
///
/// Rows are channels (0 = base station), columns follow [`field`]. Each row
/// is the previous one shifted by [`SENSOR_STRIDE`].
pub const SENSOR_POSITIONS: [[usize; field::COUNT]; NUM_SENSORS] = [
    [26, 28, 29, 18, 22, 15, 16, 17, 7, 11],
    [50, 52, 53, 42, 46, 39, 40, 41, 31, 35],
    [74, 76, 77, 66, 70, 63, 64, 65, 55, 59],
    [98, 100, 101, 90, 94, 87, 88, 89, 79, 83],
    [122, 124, 125, 114, 118, 111, 112, 113, 103, 107],
    [146, 148, 149, 138, 142, 135, 136, 137, 127, 131],
    [170, 172, 173, 162, 166, 159, 160, 161, 151, 155],
    [194, 196, 197, 186, 190, 183, 184, 185, 175, 179],
    [218, 220, 221, 210, 214, 207, 208, 209, 199, 203],
];

/// A decoded measurement, or the reason there is none
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum Reading<T> {
    /// Valid measurement
    Value(T),
    /// Sensor absent or field not populated
    #[default]
    NotPresent,
    /// Measurement outside the sensor's factory limits
    OutOfLimits,
}

impl<T: Copy> Reading<T> {
    /// True for [`Reading::Value`]
    pub fn is_valid(&self) -> bool {
        matches!(self, Reading::Value(_))
    }

    /// The measurement, if valid
    pub fn value(&self) -> Option<T> {
        match self {
            Reading::Value(v) => Some(*v),
            _ => None,
        }
    }
}

/// Temperature in °C
pub type Temperature = Reading<f32>;

/// Relative humidity in %
pub type Humidity = Reading<u8>;

impl Reading<f32> {
    /// Numeric form used by the base station, sentinels included
    pub fn to_protocol_value(&self) -> f32 {
        match self {
            Reading::Value(v) => *v,
            Reading::NotPresent => TEMPERATURE_NP,
            Reading::OutOfLimits => TEMPERATURE_OFL,
        }
    }
}

impl Reading<u8> {
    /// Numeric form used by the base station, sentinels included
    pub fn to_protocol_value(&self) -> u8 {
        match self {
            Reading::Value(v) => *v,
            Reading::NotPresent => HUMIDITY_NP,
            Reading::OutOfLimits => HUMIDITY_OFL,
        }
    }
}

/// Current, max and min values of one sensor channel
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct SensorReading {
    pub temperature: Temperature,
    pub temperature_max: Temperature,
    pub temperature_min: Temperature,

    /// Set only when `temperature_max` is valid
    pub temperature_max_time: Option<NaiveDateTime>,

    /// Set only when `temperature_min` is valid
    pub temperature_min_time: Option<NaiveDateTime>,

    pub humidity: Humidity,
    pub humidity_max: Humidity,
    pub humidity_min: Humidity,

    /// Set only when `humidity_max` is valid
    pub humidity_max_time: Option<NaiveDateTime>,

    /// Set only when `humidity_min` is valid
    pub humidity_min_time: Option<NaiveDateTime>,
}

/// One decoded current-weather snapshot of all channels
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CurrentWeatherFrame {
    /// Wall clock at decode time (not transmitted by the station)
    pub timestamp: DateTime<Utc>,

    /// Signal quality reported by the station (0-127)
    pub signal_quality: u8,

    /// Index 0 is the base station, 1-8 the remote sensors
    pub sensors: [SensorReading; NUM_SENSORS],

    /// Raw alarm/battery block
    pub alarm_data: [u8; ALARM_DATA_LEN],
}

impl CurrentWeatherFrame {
    /// Readings of one channel, if the index is in range
    pub fn sensor(&self, channel: usize) -> Option<&SensorReading> {
        self.sensors.get(channel)
    }

    /// Battery status of one channel
    ///
    /// See [`super::parser::battery_ok`].
    pub fn battery_ok(&self, channel: usize) -> bool {
        super::parser::battery_ok(&self.alarm_data, channel)
    }
}

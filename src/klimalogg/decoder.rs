//! # KlimaLogg Field Decoders
//!
//! Turns nibble windows into typed values: temperatures, humidities and the
//! two timestamp encodings used by the base station.
//!
//! Sentinel precedence is the same for every numeric field: a window with
//! any `F` nibble is out of limits, otherwise a window with any `A`-`E`
//! nibble is not present, otherwise the digits are decoded.

use chrono::{NaiveDate, NaiveDateTime};
use tracing::trace;

use super::nibble::{digit, is_decimal, is_error, is_overflow, two_digits, window, NibblePos};
use super::protocol::{Humidity, Reading, Temperature, TEMPERATURE_OFFSET};

/// Nibbles in a temperature field
const TEMPERATURE_NIBBLES: usize = 3;

/// Nibbles in a humidity field
const HUMIDITY_NIBBLES: usize = 2;

/// Base year of the two-digit year fields
const EPOCH_YEAR: i32 = 2000;

/// 8-nibble timestamp that the station sends for "no date recorded"
pub const NO_DATE_PATTERN: [u8; 8] = [0xA, 0xA, 0x4, 0xA, 0xA, 0x4, 0xA, 0xA];

/// Decode a 3-digit temperature with one decimal place
///
/// `d0 d1 . d2` minus the 40.0 offset, so raw `400` is 0.0 °C and the
/// representable range is -40.0 to 59.9 °C.
///
/// # Examples
///
/// ```
/// use klimalogg_receiver::klimalogg::decoder::decode_temperature;
/// use klimalogg_receiver::klimalogg::nibble::{Nibble, NibblePos};
/// use klimalogg_receiver::klimalogg::protocol::Reading;
///
/// let buf = [0x61, 0x50];
/// let temp = decode_temperature(&buf, NibblePos::new(0, Nibble::High));
/// assert_eq!(temp, Reading::Value(21.5));
/// ```
pub fn decode_temperature(buf: &[u8], start: NibblePos) -> Temperature {
    if is_overflow(buf, start, TEMPERATURE_NIBBLES) {
        return Reading::OutOfLimits;
    }
    if is_error(buf, start, TEMPERATURE_NIBBLES) {
        return Reading::NotPresent;
    }

    // Work in tenths so -3.2 comes out as exactly -3.2f32
    let tenths = u16::from(digit(buf, start)) * 100
        + u16::from(digit(buf, start.advance(1))) * 10
        + u16::from(digit(buf, start.advance(2)));
    let offset_tenths = (TEMPERATURE_OFFSET * 10.0) as i32;

    Reading::Value((i32::from(tenths) - offset_tenths) as f32 / 10.0)
}

/// Decode a 2-digit humidity percentage
pub fn decode_humidity(buf: &[u8], start: NibblePos) -> Humidity {
    if is_overflow(buf, start, HUMIDITY_NIBBLES) {
        return Reading::OutOfLimits;
    }
    if is_error(buf, start, HUMIDITY_NIBBLES) {
        return Reading::NotPresent;
    }

    Reading::Value(two_digits(buf, start))
}

/// Decode the 8-nibble timestamp used for max/min records
///
/// Layout, in nibble order from `start`:
///
/// ```text
/// n0 n1 | n2    | n3 n4 | n5   | n6   | n7
/// year  | month | day   | tim1 | tim2 | tim3
/// ```
///
/// Hour and minute are spread over `tim1`..`tim3` with a carry: a `tim1` of
/// 10 or more adds 10 to the hour, and a `tim2` of 10 or more adds another
/// 10 to the hour while dropping 10 from the minute tens.
///
/// Returns `None` for the "no date" pattern and for anything that is not a
/// real calendar date and time of day.
pub fn decode_date_time8(buf: &[u8], start: NibblePos) -> Option<NaiveDateTime> {
    if window(buf, start, NO_DATE_PATTERN.len()).eq(NO_DATE_PATTERN) {
        trace!("no date recorded at byte {}", start.byte);
        return None;
    }

    let year = i32::from(two_digits(buf, start)) + EPOCH_YEAR;
    let month = u32::from(digit(buf, start.advance(2)));
    let day = u32::from(two_digits(buf, start.advance(3)));
    let tim1 = u32::from(digit(buf, start.advance(5)));
    let tim2 = u32::from(digit(buf, start.advance(6)));
    let tim3 = u32::from(digit(buf, start.advance(7)));

    let (hour, minute) = split_hour_minute(tim1, tim2, tim3);
    build_date_time(year, month, day, hour, minute)
}

/// Hour/minute reconstruction for the 8-nibble timestamp
fn split_hour_minute(tim1: u32, tim2: u32, tim3: u32) -> (u32, u32) {
    let mut hour = if tim1 >= 10 { tim1 + 10 } else { tim1 };

    let mut minute = if tim2 >= 10 {
        hour += 10;
        (tim2 - 10) * 10
    } else {
        tim2 * 10
    };
    minute += tim3;

    (hour, minute)
}

/// Decode the 10-nibble timestamp: five 2-digit fields
///
/// Year (+2000), month, day, hour, minute. Any field containing a nibble
/// above 9 invalidates the whole timestamp.
pub fn decode_date_time10(buf: &[u8], start: NibblePos) -> Option<NaiveDateTime> {
    let mut fields = [0u32; 5];

    for (i, slot) in fields.iter_mut().enumerate() {
        let pos = start.advance(i * 2);
        if !is_decimal(buf, pos, 2) {
            trace!("bogus date field {} at byte {}", i, pos.byte);
            return None;
        }
        *slot = u32::from(two_digits(buf, pos));
    }

    let [year, month, day, hour, minute] = fields;
    build_date_time(year as i32 + EPOCH_YEAR, month, day, hour, minute)
}

fn build_date_time(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> Option<NaiveDateTime> {
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) || hour > 23 || minute > 59 {
        trace!(
            "bad date conversion: {}-{:02}-{:02} {:02}:{:02}",
            year,
            month,
            day,
            hour,
            minute
        );
        return None;
    }

    // Bounds above still admit e.g. 31 February
    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, 0)
}

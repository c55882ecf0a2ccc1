//! # Frame Source Module
//!
//! Reads raw KlimaLogg frames from the radio bridge.
//!
//! The radio side hands over one received buffer per line, hex encoded.
//! The same framing is used for a live serial bridge and for capture files,
//! so both are read through [`FrameReceiver`].
//!
//! This module handles:
//! - Opening the serial bridge (8N1, no flow control)
//! - Opening capture files
//! - Line framing and hex decoding
//! - Skipping blank lines and `#` comments

use bytes::Bytes;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio_serial::SerialPortBuilderExt;
use tracing::{debug, info, warn};

use crate::error::{KlimaLoggError, Result};

/// Default baud rate of the serial radio bridge
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default bridge device paths to try (in order of preference)
pub const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyUSB0", // USB-to-serial adapters
    "/dev/ttyACM0", // USB CDC devices
];

/// One raw frame as read from the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    /// Line number in the source (1-based)
    pub line: u64,
    /// Frame bytes
    pub data: Bytes,
}

/// Line-oriented hex frame reader
pub struct FrameReceiver<R> {
    lines: Lines<R>,
    source: String,
    line: u64,
}

impl<R> std::fmt::Debug for FrameReceiver<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameReceiver")
            .field("source", &self.source)
            .field("line", &self.line)
            .finish_non_exhaustive()
    }
}

impl<R: AsyncBufRead + Unpin> FrameReceiver<R> {
    /// Wrap any buffered async reader
    ///
    /// # Arguments
    ///
    /// * `reader` - Line-oriented hex frame stream
    /// * `source` - Name used in log messages (device path, file name)
    pub fn new(reader: R, source: impl Into<String>) -> Self {
        Self {
            lines: reader.lines(),
            source: source.into(),
            line: 0,
        }
    }

    /// Read the next frame
    ///
    /// # Returns
    ///
    /// * `Ok(Some(frame))` - Next frame
    /// * `Ok(None)` - End of stream
    ///
    /// # Errors
    ///
    /// Returns [`KlimaLoggError::InvalidHex`] for a malformed line; the
    /// stream stays usable and the next call moves on to the following line.
    /// I/O failures are returned as [`KlimaLoggError::Io`].
    pub async fn next_frame(&mut self) -> Result<Option<RawFrame>> {
        loop {
            let Some(text) = self.lines.next_line().await? else {
                return Ok(None);
            };
            self.line += 1;

            match decode_hex_line(&text) {
                Ok(Some(data)) => {
                    debug!("{}:{}: read frame ({} bytes)", self.source, self.line, data.len());
                    return Ok(Some(RawFrame {
                        line: self.line,
                        data,
                    }));
                }
                Ok(None) => continue,
                Err(e) => {
                    warn!("{}:{}: {}", self.source, self.line, e);
                    return Err(e);
                }
            }
        }
    }

    /// Name of the underlying source
    pub fn source(&self) -> &str {
        &self.source
    }
}

impl FrameReceiver<BufReader<tokio_serial::SerialStream>> {
    /// Open the serial bridge, trying the default device paths
    ///
    /// # Errors
    ///
    /// Returns [`KlimaLoggError::SourceNotFound`] if no device could be opened
    pub fn open_serial(baud_rate: u32) -> Result<Self> {
        Self::open_with_paths(DEFAULT_DEVICE_PATHS, baud_rate)
    }

    /// Open the serial bridge with custom device paths
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try (e.g., &["/dev/ttyUSB0"])
    /// * `baud_rate` - Bridge baud rate
    pub fn open_with_paths(paths: &[&str], baud_rate: u32) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match open_port(path, baud_rate) {
                Ok(port) => {
                    info!("Opened radio bridge at {} ({} baud)", path, baud_rate);
                    return Ok(Self::new(BufReader::new(port), *path));
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(KlimaLoggError::SourceNotFound(paths.join(", ")))
    }
}

impl FrameReceiver<BufReader<tokio::fs::File>> {
    /// Open a capture file
    ///
    /// # Errors
    ///
    /// Returns [`KlimaLoggError::Io`] if the file cannot be opened
    pub async fn open_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = tokio::fs::File::open(path).await?;
        info!("Reading frames from {}", path.display());
        Ok(Self::new(BufReader::new(file), path.display().to_string()))
    }
}

/// Open a specific serial port with bridge settings
fn open_port(path: &str, baud_rate: u32) -> Result<tokio_serial::SerialStream> {
    tokio_serial::new(path, baud_rate)
        .data_bits(tokio_serial::DataBits::Eight)
        .parity(tokio_serial::Parity::None)
        .stop_bits(tokio_serial::StopBits::One)
        .flow_control(tokio_serial::FlowControl::None)
        .open_native_async()
        .map_err(|e| KlimaLoggError::Serial(format!("Failed to open {}: {}", path, e)))
}

/// Decode one line of the hex framing
///
/// Whitespace anywhere in the line and a leading `0x` are ignored.
///
/// # Returns
///
/// * `Ok(Some(bytes))` - Frame bytes
/// * `Ok(None)` - Blank line or `#` comment
///
/// # Errors
///
/// Returns [`KlimaLoggError::InvalidHex`] for odd-length or non-hex input
///
/// # Examples
///
/// ```
/// use klimalogg_receiver::serial::decode_hex_line;
///
/// let data = decode_hex_line("0x01 A2 ff").unwrap().unwrap();
/// assert_eq!(&data[..], &[0x01, 0xA2, 0xFF]);
/// ```
pub fn decode_hex_line(line: &str) -> Result<Option<Bytes>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let clean: String = trimmed
        .trim_start_matches("0x")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    if clean.len() % 2 != 0 {
        return Err(KlimaLoggError::InvalidHex(format!(
            "odd number of hex characters: {}",
            clean.len()
        )));
    }

    hex::decode(&clean)
        .map(|bytes| Some(Bytes::from(bytes)))
        .map_err(|e| KlimaLoggError::InvalidHex(e.to_string()))
}

//! # JSONL Telemetry Logger
//!
//! Appends one JSON object per decoded frame to
//! `<log_dir>/weather_<YYYYmmdd_HHMMSS>_<seq>.jsonl`, rotating to a new file
//! every `max_records_per_file` records and keeping only the newest
//! `max_files_to_keep` files.

use chrono::Utc;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::record::FrameRecord;
use super::FrameSink;
use crate::config::TelemetryConfig;
use crate::error::Result;
use crate::klimalogg::CurrentWeatherFrame;

/// Log file name prefix
const FILE_PREFIX: &str = "weather_";

/// Log file extension
const FILE_EXTENSION: &str = ".jsonl";

/// Rotating JSONL writer
#[derive(Debug)]
pub struct JsonlLogger {
    dir: PathBuf,
    max_records_per_file: usize,
    max_files_to_keep: usize,
    writer: Option<BufWriter<File>>,
    current_path: Option<PathBuf>,
    records_in_file: usize,
    sequence: u32,
}

impl JsonlLogger {
    /// Create a logger writing into `dir` (created if missing)
    ///
    /// No file is opened until the first record arrives.
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created
    pub fn new<P: AsRef<Path>>(dir: P, max_records_per_file: usize, max_files_to_keep: usize) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        Ok(Self {
            dir,
            max_records_per_file: max_records_per_file.max(1),
            max_files_to_keep: max_files_to_keep.max(1),
            writer: None,
            current_path: None,
            records_in_file: 0,
            sequence: 0,
        })
    }

    /// Create a logger from the `[telemetry]` section
    pub fn from_config(config: &TelemetryConfig) -> Result<Self> {
        Self::new(&config.log_dir, config.max_records_per_file, config.max_files_to_keep)
    }

    /// Append one frame
    ///
    /// # Errors
    ///
    /// Returns error if serialization or any file operation fails
    pub fn write(&mut self, frame: &CurrentWeatherFrame) -> Result<()> {
        if self.writer.is_none() || self.records_in_file >= self.max_records_per_file {
            self.rotate()?;
        }

        if let Some(writer) = self.writer.as_mut() {
            serde_json::to_writer(&mut *writer, &FrameRecord::from(frame))?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            self.records_in_file += 1;
        }

        Ok(())
    }

    /// Path of the file currently being written
    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// Close the current file and start the next one
    fn rotate(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        let name = format!(
            "{}{}_{:04}{}",
            FILE_PREFIX,
            Utc::now().format("%Y%m%d_%H%M%S"),
            self.sequence,
            FILE_EXTENSION
        );
        self.sequence = self.sequence.wrapping_add(1);

        let path = self.dir.join(name);
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        info!("Telemetry log file: {}", path.display());

        self.writer = Some(BufWriter::new(file));
        self.current_path = Some(path);
        self.records_in_file = 0;

        self.prune()
    }

    /// Delete the oldest log files beyond the retention limit
    fn prune(&self) -> Result<()> {
        let mut files = self.log_files()?;
        if files.len() <= self.max_files_to_keep {
            return Ok(());
        }

        // Names start with the creation time, so lexical order is age order
        files.sort();
        let excess = files.len() - self.max_files_to_keep;
        for old in files.into_iter().take(excess) {
            match fs::remove_file(&old) {
                Ok(()) => debug!("Removed old telemetry log {}", old.display()),
                Err(e) => warn!("Failed to remove {}: {}", old.display(), e),
            }
        }

        Ok(())
    }

    /// Log files in the directory, unsorted
    fn log_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            let is_log = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(FILE_PREFIX) && n.ends_with(FILE_EXTENSION));
            if is_log {
                files.push(path);
            }
        }
        Ok(files)
    }
}

impl FrameSink for JsonlLogger {
    fn record(&mut self, frame: &CurrentWeatherFrame) -> Result<()> {
        self.write(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::klimalogg::protocol::Reading;
    use tempfile::tempdir;

    fn sample_frame(temperature: f32) -> CurrentWeatherFrame {
        let mut frame = CurrentWeatherFrame::default();
        frame.sensors[0].temperature = Reading::Value(temperature);
        frame
    }

    fn count_lines(paths: &[PathBuf]) -> usize {
        paths
            .iter()
            .map(|p| fs::read_to_string(p).unwrap().lines().count())
            .sum()
    }

    #[test]
    fn test_creates_directory_and_writes_lines() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("logs");
        let mut logger = JsonlLogger::new(&dir, 100, 10).unwrap();
        assert!(dir.is_dir());
        assert!(logger.current_path().is_none());

        logger.write(&sample_frame(20.0)).unwrap();
        logger.write(&sample_frame(21.0)).unwrap();

        let path = logger.current_path().unwrap().to_path_buf();
        let name = path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("weather_"));
        assert!(name.ends_with("_0000.jsonl"));

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let second: serde_json::Value = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second["sensors"][0]["temperature"]["value"], 21.0);
    }

    #[test]
    fn test_rotates_after_max_records() {
        let tmp = tempdir().unwrap();
        let mut logger = JsonlLogger::new(tmp.path(), 2, 10).unwrap();

        for i in 0..5 {
            logger.write(&sample_frame(i as f32)).unwrap();
        }

        let files = logger.log_files().unwrap();
        assert_eq!(files.len(), 3);
        assert_eq!(count_lines(&files), 5);
    }

    #[test]
    fn test_keeps_only_newest_files() {
        let tmp = tempdir().unwrap();
        let mut logger = JsonlLogger::new(tmp.path(), 1, 2).unwrap();

        for i in 0..4 {
            logger.write(&sample_frame(i as f32)).unwrap();
        }

        let mut files = logger.log_files().unwrap();
        files.sort();
        assert_eq!(files.len(), 2);
        assert_eq!(files[1], logger.current_path().unwrap());

        let last = fs::read_to_string(&files[1]).unwrap();
        let value: serde_json::Value = serde_json::from_str(last.trim()).unwrap();
        assert_eq!(value["sensors"][0]["temperature"]["value"], 3.0);
    }

    #[test]
    fn test_prune_ignores_foreign_files() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("notes.txt"), "keep me").unwrap();
        let mut logger = JsonlLogger::new(tmp.path(), 1, 1).unwrap();

        logger.write(&sample_frame(1.0)).unwrap();
        logger.write(&sample_frame(2.0)).unwrap();

        assert!(tmp.path().join("notes.txt").exists());
        assert_eq!(logger.log_files().unwrap().len(), 1);
    }

    #[test]
    fn test_from_config() {
        let tmp = tempdir().unwrap();
        let config = TelemetryConfig {
            enabled: true,
            log_dir: tmp.path().join("t").display().to_string(),
            max_records_per_file: 5,
            max_files_to_keep: 3,
            format: "jsonl".to_string(),
        };

        let mut logger = JsonlLogger::from_config(&config).unwrap();
        logger.record(&sample_frame(5.0)).unwrap();
        assert!(logger.current_path().unwrap().starts_with(tmp.path().join("t")));
    }
}

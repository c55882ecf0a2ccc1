//! # KlimaLogg Receiver
//!
//! Reads current-weather frames from a KlimaLogg radio bridge (or a capture
//! file), decodes them and appends the readings to JSONL telemetry logs.
//!
//! Usage: `klimalogg-receiver [CONFIG]` (defaults to `config/default.toml`)

use anyhow::{Context, Result};
use std::env;
use tokio::io::AsyncBufRead;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use klimalogg_receiver::config::{Config, FrameSourceKind, LoggingConfig};
use klimalogg_receiver::error::KlimaLoggError;
use klimalogg_receiver::serial::FrameReceiver;
use klimalogg_receiver::telemetry::{FrameProcessor, FrameSink, JsonlLogger, ProcessorStats};

/// Configuration file used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// File name prefix of the rolling diagnostic log
const DIAGNOSTIC_LOG_PREFIX: &str = "klimalogg.log";

/// Number of frames between status log messages
const LOG_INTERVAL_FRAMES: u64 = 100;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;

    // Must stay alive until exit so buffered log lines get flushed
    let _guard = init_logging(&config.logging);

    info!("KlimaLogg Receiver v{} starting...", env!("CARGO_PKG_VERSION"));

    let sink = if config.telemetry.enabled {
        Some(JsonlLogger::from_config(&config.telemetry).context("Failed to set up telemetry")?)
    } else {
        info!("Telemetry disabled");
        None
    };
    let processor = FrameProcessor::new(sink, config.receiver.discard_short_frames);

    let stats = match config.receiver.source {
        FrameSourceKind::Serial => {
            let receiver = if config.receiver.path.is_empty() {
                FrameReceiver::open_serial(config.receiver.baud_rate)?
            } else {
                FrameReceiver::open_with_paths(&[config.receiver.path.as_str()], config.receiver.baud_rate)?
            };
            run(receiver, processor).await?
        }
        FrameSourceKind::File => {
            let receiver = FrameReceiver::open_file(&config.receiver.path).await?;
            run(receiver, processor).await?
        }
    };

    info!(
        "Frames decoded: {}, short: {}, invalid: {}",
        stats.decoded, stats.short, stats.invalid
    );

    Ok(())
}

/// Set up the tracing subscriber
///
/// `RUST_LOG` takes precedence over the configured level. When a log
/// directory is configured, a daily rolling file is written as well.
fn init_logging(logging: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    match &logging.dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, DIAGNOSTIC_LOG_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(fmt::layer()).init();
            None
        }
    }
}

/// Main receive loop
///
/// Runs until the source ends or Ctrl+C is pressed. Malformed lines are
/// counted and skipped; I/O and sink failures end the loop.
async fn run<R, S>(mut receiver: FrameReceiver<R>, mut processor: FrameProcessor<S>) -> Result<ProcessorStats>
where
    R: AsyncBufRead + Unpin,
    S: FrameSink,
{
    info!("Receiving frames from {}", receiver.source());
    info!("Press Ctrl+C to exit");

    let mut last_log_count: u64 = 0;

    loop {
        tokio::select! {
            next = receiver.next_frame() => {
                match next {
                    Ok(Some(raw)) => {
                        processor.process(&raw.data)?;

                        let stats = processor.stats();
                        if stats.decoded - last_log_count >= LOG_INTERVAL_FRAMES {
                            info!("Decoded {} frames so far", stats.decoded);
                            last_log_count = stats.decoded;
                        }
                    }
                    Ok(None) => {
                        info!("End of frame source {}", receiver.source());
                        break;
                    }
                    Err(KlimaLoggError::InvalidHex(_)) => processor.record_invalid(),
                    Err(e) => {
                        warn!("Frame source failed: {}", e);
                        return Err(e.into());
                    }
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    Ok(processor.stats())
}

#[cfg(test)]
mod tests {
    use super::*;
    use klimalogg_receiver::klimalogg::protocol::CURRENT_WEATHER_MIN_LENGTH;

    #[test]
    fn test_default_config_path() {
        assert_eq!(DEFAULT_CONFIG_PATH, "config/default.toml");
    }

    #[test]
    fn test_log_interval_constant() {
        assert_eq!(LOG_INTERVAL_FRAMES, 100);
    }

    #[test]
    fn test_run_counts_frames_until_end_of_stream() {
        let mut input = "00".repeat(CURRENT_WEATHER_MIN_LENGTH);
        input.push('\n');
        input.push_str("# comment\n");
        input.push_str("zz\n");
        input.push_str("0102\n");

        let stats = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(async {
                let receiver = FrameReceiver::new(input.as_bytes(), "test");
                let processor = FrameProcessor::new(None::<JsonlLogger>, true);
                run(receiver, processor).await
            })
            .unwrap();

        assert_eq!(
            stats,
            ProcessorStats {
                decoded: 1,
                short: 1,
                invalid: 1
            }
        );
    }
}

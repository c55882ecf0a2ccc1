//! # KlimaLogg Receiver Library
//!
//! Receive and decode telemetry from a KlimaLogg Pro weather station.
//!
//! This library provides the frame decoder for the station's current-weather
//! frame (base station + 8 remote thermo-hygro sensors), plus the receiver
//! plumbing around it: a hex frame source, a JSONL telemetry log and the
//! configuration that ties them together.

pub mod config;
pub mod error;
pub mod klimalogg;
pub mod serial;
pub mod telemetry;

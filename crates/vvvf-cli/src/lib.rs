//! vvvf CLI library.
//!
//! This crate provides the command implementations behind the `vvvf`
//! binary: configuration validation and display, offline rendering of
//! telemetry profiles, and real-time playback.

pub mod commands;

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Structured logging setup, driven by the two fields configuration
//! actually carries: `log_level` and `log_file`.
//!
//! Two layers run side by side: a human-readable console layer (so an
//! operator watching the terminal sees the same events) and a
//! non-blocking rolling-file layer that never rotates (the CDR-style
//! append-forever file this system already favors elsewhere). Both are
//! gated by one [`EnvFilter`] seeded from `log_level`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_appender::{
    non_blocking::WorkerGuard,
    rolling::{RollingFileAppender, Rotation},
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cfg::enums::LogLevel;

/// Initializes the global `tracing` subscriber for a binary. Returns the
/// [`WorkerGuard`] for the file layer; it must be kept alive for the
/// process lifetime (dropping it stops the background flush thread).
///
/// `debug_override` raises the console filter to `debug` regardless of
/// `log_level`, mirroring the reference client's `enable_debug` flag.
pub fn init_logger(
    log_level: LogLevel,
    log_file: impl AsRef<Path>,
    debug_override: bool,
) -> Result<WorkerGuard> {
    let level = if debug_override {
        "debug"
    } else {
        match log_level {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    };
    let env_filter = EnvFilter::try_new(level)
        .or_else(|_| EnvFilter::try_from_default_env())
        .context("failed to build log level filter")?;

    let path = PathBuf::from(log_file.as_ref());
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create log directory: {}", dir.display()))?;
    }
    let file_appender = RollingFileAppender::new(
        Rotation::NEVER,
        dir.unwrap_or_else(|| Path::new(".")),
        path.file_name().context("log_file must name a file")?,
    );
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = fmt::layer().with_ansi(true).with_target(false);
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("failed to install global tracing subscriber")?;

    Ok(guard)
}

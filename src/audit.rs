// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Append-only audit (CDR) log: one CSV line per subscriber lifecycle
//! transition.

use std::{
    fmt,
    fs::{File, OpenOptions},
    io::Write,
    path::Path,
    sync::Mutex,
};

use anyhow::{Context, Result};
use chrono::Local;

/// Lifecycle events recorded in the audit log.
///
/// `Create` and `Delete` form the baseline contract (spec §3/§6). `Renew`
/// and `Shutdown` are emitted only when the corresponding policy knob in
/// [`crate::cfg::config::ServerConfig`] is enabled (spec §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditEvent {
    Create,
    Delete,
    Renew,
    Shutdown,
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AuditEvent::Create => "create",
            AuditEvent::Delete => "delete",
            AuditEvent::Renew => "renew",
            AuditEvent::Shutdown => "shutdown",
        })
    }
}

/// A single mutex-guarded append-only sink. Concurrent writers (ingress,
/// reaper) never interleave partial lines because every write acquires the
/// same lock for the duration of a single formatted line.
pub struct AuditLog {
    file: Mutex<File>,
}

impl AuditLog {
    /// Opens (creating if absent) the audit log in append mode. Failure to
    /// open is fatal at startup per spec §4.6/§7.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("cannot open audit log file: {}", path.display()))?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends `<local-timestamp>,<identity>,<event>\n`, flushing
    /// immediately so a tail-follower sees the record promptly.
    pub fn record(&self, identity: &str, event: AuditEvent) -> Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let line = format!("{timestamp},{identity},{event}\n");

        let mut file = self.file.lock().expect("audit log mutex poisoned");
        file.write_all(line.as_bytes())
            .context("failed to append audit record")?;
        file.flush().context("failed to flush audit log")?;
        Ok(())
    }
}

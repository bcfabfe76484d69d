// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use core::fmt;

use serde::{Deserialize, Serialize};

/// Severity levels accepted by `log_level` in both server and client
/// configuration.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}
impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        })
    }
}

/// Policy applied when ingress receives a datagram for an identity that
/// already has an active session.
///
/// The reference implementation observed in the wild is inconsistent
/// here: one variant rejects, another refreshes the session and replies
/// `refreshed`. The baseline contract rejects; `Refresh` is an explicit
/// opt-in.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    #[default]
    Reject,
    Refresh,
}

/// Which audit event the reaper records for a drain-phase removal.
///
/// The reference implementation observed in the wild emits a distinct
/// `shutdown` event during drain instead of reusing `delete`. The
/// baseline contract uses `delete` uniformly; `Shutdown` is an explicit
/// opt-in.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DrainAuditEvent {
    #[default]
    Delete,
    Shutdown,
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{fs, net::IpAddr, path::Path};

use anyhow::{Context, Result, ensure};
use serde::{Deserialize, Serialize};

use crate::cfg::enums::{DrainAuditEvent, DuplicatePolicy, LogLevel};

/// Server-side configuration, loaded from a JSON file (spec §6).
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ServerConfig {
    /// Bind address for the datagram socket.
    pub udp_ip: IpAddr,
    /// Bind port for the datagram socket.
    pub udp_port: u16,
    /// Idle timeout (seconds) after which a session is reaped.
    pub session_timeout_sec: u64,
    /// Audit log path, appended to and created if absent.
    pub cdr_file: String,
    /// Port for the HTTP control surface, bound on all interfaces.
    pub http_port: u16,
    /// Maximum sessions removed per second during drain.
    pub graceful_shutdown_rate: u32,
    /// Operational log path.
    pub log_file: String,
    /// Operational log level.
    pub log_level: LogLevel,
    /// Initial (immutable) denial set.
    #[serde(default)]
    pub blacklist: Vec<String>,
    /// Policy for a duplicate registration within the timeout window.
    /// Ambient extension resolving the reference inconsistency noted in
    /// spec §9; defaults to the baseline contract's behavior.
    #[serde(default)]
    pub duplicate_policy: DuplicatePolicy,
    /// Which audit event the reaper records for drain-phase removals.
    /// Ambient extension resolving the reference inconsistency noted in
    /// spec §9; defaults to the baseline contract's behavior.
    #[serde(default)]
    pub drain_audit_event: DrainAuditEvent,
}

/// Client-side configuration, loaded from a JSON file (spec §6).
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ClientConfig {
    /// Server address to send the registration datagram to.
    pub server_ip: IpAddr,
    /// Server UDP port.
    pub server_port: u16,
    /// Operational log path.
    pub log_file: String,
    /// Operational log level.
    pub log_level: LogLevel,
}

impl ServerConfig {
    /// Loads the configuration from JSON, validates it, and returns the
    /// ready-to-use value. Any failure is fatal at startup per spec §7.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("cannot open config file: {}", path.display()))?;
        let cfg: ServerConfig =
            serde_json::from_str(&raw).context("failed to parse server config JSON")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Validates invariants not expressible in the type system alone.
    fn validate(&self) -> Result<()> {
        ensure!(
            self.session_timeout_sec > 0,
            "session_timeout_sec must be > 0"
        );
        ensure!(
            self.graceful_shutdown_rate > 0,
            "graceful_shutdown_rate must be > 0"
        );
        ensure!(!self.cdr_file.is_empty(), "cdr_file must not be empty");
        ensure!(!self.log_file.is_empty(), "log_file must not be empty");
        ensure!(self.udp_port != 0, "udp_port must be nonzero");
        ensure!(self.http_port != 0, "http_port must be nonzero");
        ensure!(
            self.udp_port != self.http_port,
            "udp_port and http_port must differ"
        );
        Ok(())
    }
}

impl ClientConfig {
    /// Loads the configuration from JSON. Any failure is fatal per spec
    /// §7.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("cannot open config file: {}", path.display()))?;
        let cfg: ClientConfig =
            serde_json::from_str(&raw).context("failed to parse client config JSON")?;
        ensure!(!cfg.log_file.is_empty(), "log_file must not be empty");
        ensure!(cfg.server_port != 0, "server_port must be nonzero");
        Ok(cfg)
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Reaper / drain: the sole deleter of sessions (spec §4.5).

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use tokio::time;
use tracing::{error, info};

use crate::{
    audit::{AuditEvent, AuditLog},
    cfg::{config::ServerConfig, enums::DrainAuditEvent},
    registry::Registry,
};

/// Runs the 1-second tick loop: normal expiry while `!shutting_down`, then
/// rate-limited drain once shutdown is requested. Exits after calling
/// `registry.mark_drain_complete()`.
pub async fn run(cfg: Arc<ServerConfig>, registry: Arc<Registry>, audit: Arc<AuditLog>) {
    let timeout = Duration::from_secs(cfg.session_timeout_sec);
    let mut ticker = time::interval(Duration::from_secs(1));

    loop {
        ticker.tick().await;

        if !registry.is_shutting_down() {
            reap_expired(&registry, &audit, timeout);
            continue;
        }

        drain_one_tick(&cfg, &registry, &audit);
        if registry.size() == 0 {
            registry.mark_drain_complete();
            info!("drain complete");
            return;
        }
    }
}

fn reap_expired(registry: &Registry, audit: &AuditLog, timeout: Duration) {
    let now = Instant::now();
    for identity in registry.snapshot_expired(now, timeout) {
        registry.erase(&identity, || {
            if let Err(e) = audit.record(&identity, AuditEvent::Delete) {
                error!(error = %e, %identity, "failed to append delete audit record");
            }
        });
        info!(%identity, "session expired");
    }
}

fn drain_one_tick(cfg: &ServerConfig, registry: &Registry, audit: &AuditLog) {
    let event = match cfg.drain_audit_event {
        DrainAuditEvent::Delete => AuditEvent::Delete,
        DrainAuditEvent::Shutdown => AuditEvent::Shutdown,
    };
    let rate = cfg.graceful_shutdown_rate as usize;
    registry.take_up_to(rate, |identity| {
        if let Err(e) = audit.record(identity, event) {
            error!(error = %e, %identity, "failed to append drain audit record");
        }
        info!(%identity, "session removed during drain");
    });
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Datagram ingress: the UDP receive loop (spec §4.3).

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use tokio::{net::UdpSocket, time::timeout};
use tracing::{error, info, warn};

use crate::{
    audit::{AuditEvent, AuditLog},
    cfg::{config::ServerConfig, enums::DuplicatePolicy},
    codec,
    registry::{InsertOutcome, Registry},
};

/// Datagrams larger than this are still read (so `recv_from` doesn't
/// truncate silently) but rejected as malformed.
const RECV_BUF_LEN: usize = 64;

const REPLY_CREATED: &[u8] = b"created";
const REPLY_REJECTED: &[u8] = b"rejected";
const REPLY_REFRESHED: &[u8] = b"refreshed";

/// Binds the configured UDP address and runs the receive loop until
/// `registry.is_shutting_down()` is observed. Bind failure is fatal per
/// spec §7.
pub async fn run(cfg: Arc<ServerConfig>, registry: Arc<Registry>, audit: Arc<AuditLog>) -> Result<()> {
    let bind_addr = (cfg.udp_ip, cfg.udp_port);
    let socket = UdpSocket::bind(bind_addr)
        .await
        .with_context(|| format!("cannot bind UDP socket on {}:{}", cfg.udp_ip, cfg.udp_port))?;
    info!(ip = %cfg.udp_ip, port = cfg.udp_port, "UDP ingress listening");

    let mut buf = [0u8; RECV_BUF_LEN];
    while !registry.is_shutting_down() {
        let recv = timeout(Duration::from_secs(1), socket.recv_from(&mut buf)).await;
        let (n, src) = match recv {
            Err(_elapsed) => continue,
            Ok(Err(e)) => {
                error!(error = %e, "recvfrom failed");
                continue;
            },
            Ok(Ok(pair)) => pair,
        };

        let reply = handle_packet(&buf[..n], &cfg, &registry, &audit);
        let Some(reply) = reply else { continue };
        if let Err(e) = socket.send_to(reply, src).await {
            error!(error = %e, %src, "sendto failed");
        }
    }
    Ok(())
}

/// Decides the reply for one received datagram, mutating the registry and
/// appending audit records as needed. Returns `None` when no reply should
/// be sent (wrong size, decode failure).
fn handle_packet(
    packet: &[u8],
    cfg: &ServerConfig,
    registry: &Registry,
    audit: &AuditLog,
) -> Option<&'static [u8]> {
    if packet.len() != codec::PACKED_LEN {
        warn!(len = packet.len(), "dropping datagram of unexpected size");
        return None;
    }

    let identity = match codec::decode(packet) {
        Ok(identity) => identity,
        Err(e) => {
            warn!(error = %e, "dropping datagram with invalid packed-decimal identity");
            return None;
        },
    };

    if registry.is_denied(&identity) {
        info!(%identity, "subscriber denied");
        return Some(REPLY_REJECTED);
    }

    let now = Instant::now();
    let outcome = registry.insert_if_absent(&identity, now, || {
        if let Err(e) = audit.record(&identity, AuditEvent::Create) {
            error!(error = %e, %identity, "failed to append create audit record");
        }
    });

    match outcome {
        InsertOutcome::Inserted => {
            info!(%identity, "session created");
            Some(REPLY_CREATED)
        },
        InsertOutcome::AlreadyPresent => match cfg.duplicate_policy {
            DuplicatePolicy::Reject => {
                info!(%identity, "duplicate registration rejected");
                Some(REPLY_REJECTED)
            },
            DuplicatePolicy::Refresh => {
                registry.renew(&identity, now, || {
                    if let Err(e) = audit.record(&identity, AuditEvent::Renew) {
                        error!(error = %e, %identity, "failed to append renew audit record");
                    }
                });
                info!(%identity, "session refreshed");
                Some(REPLY_REFRESHED)
            },
        },
    }
}

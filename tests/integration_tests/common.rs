// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    time::Duration,
};

use anyhow::{Context, Result};
use mini_pgw::{
    cfg::{
        config::ServerConfig,
        enums::{DrainAuditEvent, DuplicatePolicy, LogLevel},
    },
    server::supervisor,
};
use tokio::{
    net::{TcpListener, UdpSocket},
    task::JoinHandle,
    time::timeout,
};

/// A running server under test, bound to ephemeral ports on loopback.
pub struct Harness {
    pub udp_addr: SocketAddr,
    pub http_port: u16,
    pub cdr_path: std::path::PathBuf,
    _tempdir: tempfile::TempDir,
    handle: JoinHandle<anyhow::Result<()>>,
}

async fn free_udp_addr() -> Result<SocketAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await?;
    Ok(socket.local_addr()?)
}

async fn free_tcp_port() -> Result<u16> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).await?;
    Ok(listener.local_addr()?.port())
}

impl Harness {
    /// Starts a fresh server with the given overrides and the baseline
    /// `duplicate_policy`/`drain_audit_event` (`Reject`/`Delete`). Binds to
    /// ephemeral ports so tests can run concurrently.
    pub async fn start(
        blacklist: Vec<String>,
        session_timeout_sec: u64,
        graceful_shutdown_rate: u32,
    ) -> Result<Self> {
        Self::start_with_policy(
            blacklist,
            session_timeout_sec,
            graceful_shutdown_rate,
            DuplicatePolicy::Reject,
            DrainAuditEvent::Delete,
        )
        .await
    }

    /// Starts a fresh server with an explicit `duplicate_policy` and
    /// `drain_audit_event`, for tests of the non-default policy knobs.
    pub async fn start_with_policy(
        blacklist: Vec<String>,
        session_timeout_sec: u64,
        graceful_shutdown_rate: u32,
        duplicate_policy: DuplicatePolicy,
        drain_audit_event: DrainAuditEvent,
    ) -> Result<Self> {
        let tempdir = tempfile::tempdir().context("tempdir")?;
        let cdr_path = tempdir.path().join("cdr.log");

        // Bind once to discover a free port, then drop and reuse the port
        // number — the supervisor binds it for real. A theoretical race
        // exists between free-port discovery and rebinding; acceptable in
        // a test harness on loopback.
        let udp_probe = free_udp_addr().await?;
        let http_port = free_tcp_port().await?;

        let cfg = ServerConfig {
            udp_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            udp_port: udp_probe.port(),
            session_timeout_sec,
            cdr_file: cdr_path.to_string_lossy().into_owned(),
            http_port,
            graceful_shutdown_rate,
            log_file: tempdir.path().join("server.log").to_string_lossy().into_owned(),
            log_level: LogLevel::Info,
            blacklist,
            duplicate_policy,
            drain_audit_event,
        };
        let udp_addr = SocketAddr::new(cfg.udp_ip, cfg.udp_port);

        let handle = tokio::spawn(supervisor::run(cfg));
        // Give the workers a moment to bind before the first request.
        tokio::time::sleep(Duration::from_millis(100)).await;

        Ok(Self {
            udp_addr,
            http_port,
            cdr_path,
            _tempdir: tempdir,
            handle,
        })
    }

    /// Sends a raw datagram and waits up to one second for the reply.
    pub async fn send_raw(&self, packet: &[u8]) -> Result<Option<Vec<u8>>> {
        let socket = UdpSocket::bind((Ipv4Addr::LOCALHOST, 0)).await?;
        socket.connect(self.udp_addr).await?;
        socket.send(packet).await?;

        let mut buf = [0u8; 64];
        match timeout(Duration::from_millis(500), socket.recv(&mut buf)).await {
            Ok(Ok(n)) => Ok(Some(buf[..n].to_vec())),
            Ok(Err(e)) => Err(e.into()),
            Err(_elapsed) => Ok(None),
        }
    }

    /// Encodes `identity` and sends it, returning the reply as a string.
    pub async fn register(&self, identity: &str) -> Result<Option<String>> {
        let packed = mini_pgw::codec::encode(identity)?;
        let reply = self.send_raw(&packed).await?;
        Ok(reply.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// Performs `GET /check_subscriber?imsi=<identity>` and returns the
    /// response body.
    pub async fn check_subscriber(&self, identity: &str) -> Result<String> {
        let url = format!(
            "http://127.0.0.1:{}/check_subscriber?imsi={identity}",
            self.http_port
        );
        Ok(reqwest::get(url).await?.text().await?)
    }

    /// Performs `GET /stop`.
    pub async fn stop(&self) -> Result<()> {
        let url = format!("http://127.0.0.1:{}/stop", self.http_port);
        reqwest::get(url).await?;
        Ok(())
    }

    /// Waits for the supervisor to fully join after drain completes.
    pub async fn join(self) -> Result<()> {
        timeout(Duration::from_secs(10), self.handle)
            .await
            .context("server did not shut down in time")?
            .context("server task panicked")??;
        Ok(())
    }

    /// Reads every line currently in the audit log.
    pub fn audit_lines(&self) -> Vec<String> {
        std::fs::read_to_string(&self.cdr_path)
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! One-shot datagram client: encode an identity, send it, print whatever
//! the server replies, exit. No retry, no acknowledgement beyond the
//! reply itself (spec §6, grounded on
//! `examples/original_source/src/client/client.cpp`).

use anyhow::{Context, Result, bail};
use tokio::net::UdpSocket;
use tracing::{debug, info};

use crate::{cfg::config::ClientConfig, codec};

/// Largest reply this client will accept (`rejected`/`refreshed` are the
/// longest baseline/ambient replies; padded generously for forward
/// compatibility with a longer server message).
const REPLY_BUF_LEN: usize = 64;

/// Sends the packed-decimal encoding of `identity` to the configured
/// server and returns its reply as a UTF-8 string. Exactly one
/// send/receive round trip; any failure is the caller's to surface as
/// exit code 1 per spec §6/§7.
pub async fn register(cfg: &ClientConfig, identity: &str) -> Result<String> {
    let packed = codec::encode(identity).with_context(|| format!("invalid identity '{identity}'"))?;
    debug!(?packed, "encoded identity");

    let socket = UdpSocket::bind(("0.0.0.0", 0))
        .await
        .context("cannot create UDP socket")?;
    let server_addr = (cfg.server_ip, cfg.server_port);
    socket
        .connect(server_addr)
        .await
        .with_context(|| format!("cannot reach server at {}:{}", cfg.server_ip, cfg.server_port))?;

    let sent = socket
        .send(&packed)
        .await
        .context("sendto failed")?;
    info!(bytes = sent, server = %cfg.server_ip, port = cfg.server_port, "sent registration datagram");

    let mut buf = [0u8; REPLY_BUF_LEN];
    let n = socket.recv(&mut buf).await.context("recvfrom failed")?;
    if n == 0 {
        bail!("server closed connection without a reply");
    }
    let reply = std::str::from_utf8(&buf[..n])
        .context("server reply was not valid UTF-8")?
        .to_string();
    info!(%reply, "received server reply");
    Ok(reply)
}

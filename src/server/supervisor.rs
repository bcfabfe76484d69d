// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

//! Lifecycle supervisor: starts the three workers, waits for drain, joins
//! them, and closes the audit sink (spec §4.7).

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::{audit::AuditLog, cfg::config::ServerConfig, registry::Registry, server};

/// Runs the server to completion: starts ingress, HTTP, and the reaper
/// only after the registry, denial set, and audit sink are ready, then
/// blocks until drain completes and every worker has joined.
pub async fn run(cfg: ServerConfig) -> Result<()> {
    let cfg = Arc::new(cfg);
    let registry = Arc::new(Registry::new(cfg.blacklist.clone()));
    let audit = Arc::new(
        AuditLog::open(&cfg.cdr_file)
            .with_context(|| format!("cannot open audit log: {}", cfg.cdr_file))?,
    );
    info!(
        udp = format!("{}:{}", cfg.udp_ip, cfg.udp_port),
        http_port = cfg.http_port,
        cdr_file = %cfg.cdr_file,
        "starting mini-pgw"
    );

    let mut ingress = tokio::spawn(server::ingress::run(
        cfg.clone(),
        registry.clone(),
        audit.clone(),
    ));
    let mut http = tokio::spawn(server::http::run(cfg.http_port, registry.clone()));
    let reaper = tokio::spawn(server::reaper::run(cfg.clone(), registry.clone(), audit.clone()));

    // Races drain completion against either worker exiting early. Ingress
    // is expected to return `Ok(())` within a tick of `/stop` (it observes
    // `shutting_down` and stops long before drain finishes over several
    // ticks); only an `Err` there is premature. Once a handle resolves
    // `Ok`, `is_finished()` disables its branch so the loop doesn't poll a
    // completed `JoinHandle` again while still waiting on the other one.
    let drain_complete = registry.wait_drain_complete();
    tokio::pin!(drain_complete);
    loop {
        tokio::select! {
            () = &mut drain_complete => {
                info!("drain observed complete, joining workers");
                break;
            }
            res = &mut ingress, if !ingress.is_finished() => {
                res.context("ingress task panicked")?.context("UDP ingress failed")?;
            }
            res = &mut http, if !http.is_finished() => {
                res.context("HTTP task panicked")?.context("HTTP control surface failed")?;
            }
        }
    }

    let (ingress_res, http_res, reaper_res) = tokio::join!(ingress, http, reaper);
    ingress_res.context("ingress task panicked")??;
    http_res.context("HTTP task panicked")??;
    reaper_res.context("reaper task panicked")?;

    info!("mini-pgw shut down cleanly");
    Ok(())
}

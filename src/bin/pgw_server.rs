// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::process::ExitCode;

use anyhow::{Context, Result};
use mini_pgw::{
    cfg::{cli::resolve_config_path, config::ServerConfig, logger::init_logger},
    server::supervisor,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run() -> Result<()> {
    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "pgw-server".to_string());
    let config_path = args
        .next()
        .with_context(|| format!("Usage: {program} <config.json>"))?;

    let path = resolve_config_path(&config_path).context("failed to resolve config path")?;
    let cfg = ServerConfig::load_from_file(&path).context("failed to load server config")?;

    let _logger_guard =
        init_logger(cfg.log_level, &cfg.log_file, false).context("failed to initialize logger")?;

    supervisor::run(cfg).await
}

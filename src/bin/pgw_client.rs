// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::process::ExitCode;

use anyhow::{Context, Result};
use mini_pgw::{
    cfg::{cli::resolve_config_path, config::ClientConfig, logger::init_logger},
    client,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(reply) => {
            println!("{reply}");
            ExitCode::SUCCESS
        },
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        },
    }
}

async fn run() -> Result<String> {
    let mut args = std::env::args();
    let program = args.next().unwrap_or_else(|| "pgw-client".to_string());
    let config_path = args
        .next()
        .with_context(|| format!("Usage: {program} <config.json> <15-digit-identity> [debug]"))?;
    let identity = args
        .next()
        .with_context(|| format!("Usage: {program} <config.json> <15-digit-identity> [debug]"))?;
    let debug_override = matches!(args.next().as_deref(), Some("debug"));

    let path = resolve_config_path(&config_path).context("failed to resolve config path")?;
    let cfg = ClientConfig::load_from_file(&path).context("failed to load client config")?;

    let _logger_guard = init_logger(cfg.log_level, &cfg.log_file, debug_override)
        .context("failed to initialize logger")?;

    client::register(&cfg, &identity).await
}

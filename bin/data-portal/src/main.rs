// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use data_portal::{http::build_router, resolve_config, AppState};
use portal::Session;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser, Debug, Clone)]
#[command(name = "data-portal", about = "Upload a table, explore it, chart it")]
struct Cli {
    #[command(subcommand)]
    cmd: Option<Command>,

    /// Configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Listen address, overrides the configuration file.
    #[arg(long, global = true)]
    addr: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();
    let cli = Cli::parse();
    match cli.cmd.unwrap_or(Command::Serve) {
        Command::Serve => run_server(cli.config, cli.addr).await,
    }
}

async fn run_server(config_path: Option<PathBuf>, addr: Option<String>) -> Result<()> {
    info!("data-portal starting");
    let config = resolve_config(config_path, addr)?;
    let addr: SocketAddr = config
        .server
        .http_addr
        .parse()
        .with_context(|| format!("invalid listen address '{}'", config.server.http_addr))?;
    let body_limit = config.server.body_limit_bytes;

    let session = Session::new(config).context("initialising session")?;
    let app = build_router(AppState::new(session), body_limit);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            warn!(error = %e, %addr, "bind failed, using ephemeral");
            tokio::net::TcpListener::bind("127.0.0.1:0").await?
        }
    };
    let local = listener.local_addr()?;
    info!(%local, "portal listening");

    tokio::select! {
        res = axum::serve(listener, app) => res?,
        _ = tokio::signal::ctrl_c() => {}
    }
    info!("data-portal shutting down");
    Ok(())
}

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
use portal::{PortalConfig, DEFAULT_CONFIG_PATH};
use std::path::PathBuf;
use tracing::{info, warn};

pub const CONFIG_ENV: &str = "PORTAL_CONFIG";
pub const HTTP_ADDR_ENV: &str = "PORTAL_HTTP_ADDR";
pub const BODY_LIMIT_ENV: &str = "PORTAL_BODY_LIMIT_BYTES";

/// File, then environment, then command-line flags; later sources win.
pub fn resolve_config(config_path: Option<PathBuf>, addr: Option<String>) -> Result<PortalConfig> {
    let path = config_path
        .or_else(|| std::env::var(CONFIG_ENV).ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = PortalConfig::load(&path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;

    if let Ok(http_addr) = std::env::var(HTTP_ADDR_ENV) {
        config.server.http_addr = http_addr;
    }
    if let Ok(raw) = std::env::var(BODY_LIMIT_ENV) {
        match raw.parse::<usize>() {
            Ok(limit) => config.server.body_limit_bytes = Some(limit),
            Err(e) => warn!(value = %raw, error = %e, "ignoring {BODY_LIMIT_ENV}"),
        }
    }
    if let Some(addr) = addr {
        config.server.http_addr = addr;
    }
    info!(path = %path.display(), addr = %config.server.http_addr, "configuration resolved");
    Ok(config)
}

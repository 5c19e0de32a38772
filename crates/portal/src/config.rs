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

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/portal.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub server: ServerConfig,
    pub ingest: IngestConfig,
    pub views: ViewConfig,
    pub charts: ChartConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub http_addr: String,
    /// Upload size cap in bytes; unset means no cap.
    pub body_limit_bytes: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: "127.0.0.1:8501".to_string(),
            body_limit_bytes: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub infer_schema_length: usize,
    pub sheet_index: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            infer_schema_length: 1000,
            sheet_index: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    pub default_rows: usize,
    /// Caps the full-table preview; unset returns every row.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_rows: Option<usize>,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_rows: 5,
            preview_rows: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub size_max: f64,
    pub theme: ChartTheme,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            size_max: 20.0,
            theme: ChartTheme::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartTheme {
    pub paper_bgcolor: String,
    pub plot_bgcolor: String,
    pub gridcolor: String,
    pub colorway: Vec<String>,
    pub colorscale: String,
}

impl Default for ChartTheme {
    fn default() -> Self {
        Self {
            paper_bgcolor: "white".to_string(),
            plot_bgcolor: "white".to_string(),
            gridcolor: "#EBF0F8".to_string(),
            colorway: [
                "#636efa", "#EF553B", "#00cc96", "#ab63fa", "#FFA15A", "#19d3f3", "#FF6692",
                "#B6E880", "#FF97FF", "#FECB52",
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            colorscale: "Plasma".to_string(),
        }
    }
}

impl PortalConfig {
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self> {
        let config: PortalConfig = toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads `path`; a missing file yields the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file absent, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content, &path.display().to_string())
    }

    pub fn validate(&self) -> Result<()> {
        if self.ingest.infer_schema_length == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ingest.infer_schema_length".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if !(self.charts.size_max.is_finite() && self.charts.size_max > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "charts.size_max".to_string(),
                value: self.charts.size_max.to_string(),
            }
            .into());
        }
        if self.charts.theme.colorway.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "charts.theme.colorway".to_string(),
                value: "[]".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

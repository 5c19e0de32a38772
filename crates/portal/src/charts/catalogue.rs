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

use crate::dataset::ColumnKind;
use crate::error::{ChartError, PortalError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

const BUILTIN_CATALOGUE: &str = include_str!("../../config/charts.yml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartFamily {
    Line,
    Bar,
    Scatter,
    Pie,
    Sunburst,
}

impl ChartFamily {
    pub const ALL: [ChartFamily; 5] = [
        ChartFamily::Line,
        ChartFamily::Bar,
        ChartFamily::Scatter,
        ChartFamily::Pie,
        ChartFamily::Sunburst,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartFamily::Line => "line",
            ChartFamily::Bar => "bar",
            ChartFamily::Scatter => "scatter",
            ChartFamily::Pie => "pie",
            ChartFamily::Sunburst => "sunburst",
        }
    }
}

impl fmt::Display for ChartFamily {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartFamily {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self> {
        ChartFamily::ALL
            .iter()
            .copied()
            .find(|family| family.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                ChartError::UnknownFamily {
                    name: s.to_string(),
                }
                .into()
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    X,
    Y,
    Color,
    Size,
    Facet,
    Path,
    Values,
    Names,
    Text,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::X => "x",
            Role::Y => "y",
            Role::Color => "color",
            Role::Size => "size",
            Role::Facet => "facet",
            Role::Path => "path",
            Role::Values => "values",
            Role::Names => "names",
            Role::Text => "text",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSpec {
    pub name: Role,
    pub required: bool,
    pub label: String,
    #[serde(default)]
    pub multiple: bool,
    /// Filled by the builder rather than chosen by the user.
    #[serde(default)]
    pub implicit: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepts: Option<Vec<ColumnKind>>,
}

impl RoleSpec {
    pub fn accepts(&self, kind: ColumnKind) -> bool {
        self.accepts
            .as_ref()
            .map_or(true, |kinds| kinds.contains(&kind))
    }

    pub fn expected_kinds(&self) -> String {
        match &self.accepts {
            None => "any column".to_string(),
            Some(kinds) => kinds
                .iter()
                .map(|k| format!("{k} columns"))
                .collect::<Vec<_>>()
                .join(" or "),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartEntry {
    pub family: ChartFamily,
    pub description: String,
    pub roles: Vec<RoleSpec>,
}

impl ChartEntry {
    pub fn role(&self, role: Role) -> Option<&RoleSpec> {
        self.roles.iter().find(|r| r.name == role)
    }

    pub fn required_roles(&self) -> impl Iterator<Item = &RoleSpec> {
        self.roles.iter().filter(|r| r.required)
    }
}

#[derive(Debug, Deserialize)]
struct CatalogueFile {
    charts: Vec<ChartEntry>,
}

#[derive(Debug, Clone)]
pub struct ChartCatalogue {
    charts: Vec<ChartEntry>,
    by_family: HashMap<ChartFamily, usize>,
}

impl ChartCatalogue {
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_CATALOGUE)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: CatalogueFile =
            serde_yaml::from_str(yaml).map_err(|e| ChartError::InvalidCatalogue {
                reason: e.to_string(),
            })?;
        let mut by_family = HashMap::new();
        for (idx, entry) in file.charts.iter().enumerate() {
            if by_family.insert(entry.family, idx).is_some() {
                return Err(ChartError::InvalidCatalogue {
                    reason: format!("duplicate chart family '{}'", entry.family),
                }
                .into());
            }
            let mut seen = HashSet::new();
            for role in &entry.roles {
                if !seen.insert(role.name) {
                    return Err(ChartError::InvalidCatalogue {
                        reason: format!("role '{}' listed twice for '{}'", role.name, entry.family),
                    }
                    .into());
                }
            }
        }
        for family in ChartFamily::ALL {
            if !by_family.contains_key(&family) {
                return Err(ChartError::InvalidCatalogue {
                    reason: format!("chart family '{family}' is not described"),
                }
                .into());
            }
        }
        Ok(Self {
            charts: file.charts,
            by_family,
        })
    }

    pub fn entries(&self) -> &[ChartEntry] {
        &self.charts
    }

    pub fn get(&self, family: ChartFamily) -> &ChartEntry {
        // from_yaml_str guarantees every family is present.
        &self.charts[self.by_family[&family]]
    }
}

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

use super::catalogue::{ChartCatalogue, ChartFamily, Role};
use crate::dataset::column_kind;
use crate::error::{ChartError, PortalError, Result};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Binding {
    Column(String),
    Path(Vec<String>),
}

impl Binding {
    pub fn columns(&self) -> Vec<&str> {
        match self {
            Binding::Column(c) => vec![c.as_str()],
            Binding::Path(cols) => cols.iter().map(String::as_str).collect(),
        }
    }
}

/// Role-to-column mapping for one chart render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub family: ChartFamily,
    pub bindings: BTreeMap<Role, Binding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl ChartSpec {
    pub fn new(family: ChartFamily) -> Self {
        Self {
            family,
            bindings: BTreeMap::new(),
            title: None,
        }
    }

    pub fn bind(mut self, role: Role, column: impl Into<String>) -> Self {
        self.bindings.insert(role, Binding::Column(column.into()));
        self
    }

    pub fn bind_optional(self, role: Role, column: Option<String>) -> Self {
        match column {
            Some(column) if !column.is_empty() => self.bind(role, column),
            _ => self,
        }
    }

    pub fn bind_path(mut self, columns: Vec<String>) -> Self {
        self.bindings.insert(Role::Path, Binding::Path(columns));
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn column(&self, role: Role) -> Option<&str> {
        match self.bindings.get(&role) {
            Some(Binding::Column(c)) => Some(c.as_str()),
            _ => None,
        }
    }

    pub fn path(&self) -> &[String] {
        match self.bindings.get(&Role::Path) {
            Some(Binding::Path(cols)) => cols,
            _ => &[],
        }
    }

    /// Checks required roles, column existence and column kinds against `frame`.
    pub fn validate(&self, frame: &DataFrame, catalogue: &ChartCatalogue) -> Result<()> {
        let entry = catalogue.get(self.family);
        for role in entry.required_roles() {
            let bound = match self.bindings.get(&role.name) {
                Some(Binding::Path(cols)) => !cols.is_empty(),
                Some(Binding::Column(c)) => !c.is_empty(),
                None => false,
            };
            if !bound {
                if role.name == Role::Path {
                    return Err(ChartError::EmptyPath.into());
                }
                return Err(ChartError::MissingRole {
                    family: self.family.to_string(),
                    role: role.name.to_string(),
                }
                .into());
            }
        }
        for (role, binding) in &self.bindings {
            for column in binding.columns() {
                let kind = column_kind(frame, column, "the result table").map_err(|_| {
                    PortalError::from(ChartError::UnknownColumn {
                        role: role.to_string(),
                        column: column.to_string(),
                    })
                })?;
                if let Some(spec) = entry.role(*role) {
                    if !spec.accepts(kind) {
                        return Err(ChartError::DataTypeMismatch {
                            family: self.family.to_string(),
                            role: role.to_string(),
                            column: column.to_string(),
                            expected: spec.expected_kinds(),
                            found: kind.to_string(),
                        }
                        .into());
                    }
                }
            }
        }
        Ok(())
    }
}

/// One chart-builder selection; the variant fixes which roles exist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum ChartRequest {
    Line {
        x: String,
        y: String,
        #[serde(default)]
        color: Option<String>,
    },
    Bar {
        x: String,
        y: String,
        #[serde(default)]
        color: Option<String>,
        #[serde(default)]
        facet: Option<String>,
    },
    Scatter {
        x: String,
        y: String,
        #[serde(default)]
        color: Option<String>,
        #[serde(default)]
        size: Option<String>,
    },
    Pie {
        values: String,
        names: String,
    },
    Sunburst {
        path: Vec<String>,
    },
}

impl ChartRequest {
    pub fn family(&self) -> ChartFamily {
        match self {
            ChartRequest::Line { .. } => ChartFamily::Line,
            ChartRequest::Bar { .. } => ChartFamily::Bar,
            ChartRequest::Scatter { .. } => ChartFamily::Scatter,
            ChartRequest::Pie { .. } => ChartFamily::Pie,
            ChartRequest::Sunburst { .. } => ChartFamily::Sunburst,
        }
    }

    /// Sunburst slices are always sized by `aggregate_column`.
    pub fn into_spec(self, aggregate_column: &str) -> ChartSpec {
        let family = self.family();
        let spec = ChartSpec::new(family);
        match self {
            ChartRequest::Line { x, y, color } => spec
                .bind(Role::X, x)
                .bind(Role::Y, y)
                .bind_optional(Role::Color, color),
            ChartRequest::Bar { x, y, color, facet } => spec
                .bind(Role::X, x)
                .bind(Role::Y, y)
                .bind_optional(Role::Color, color)
                .bind_optional(Role::Facet, facet),
            ChartRequest::Scatter { x, y, color, size } => spec
                .bind(Role::X, x)
                .bind(Role::Y, y)
                .bind_optional(Role::Color, color)
                .bind_optional(Role::Size, size),
            ChartRequest::Pie { values, names } => {
                spec.bind(Role::Values, values).bind(Role::Names, names)
            }
            ChartRequest::Sunburst { path } => spec
                .bind_path(path)
                .bind(Role::Values, aggregate_column),
        }
    }
}

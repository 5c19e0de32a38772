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

use super::catalogue::{ChartFamily, Role};
use super::spec::ChartSpec;
use crate::config::ChartConfig;
use crate::dataset::{column_kind, ColumnKind};
use crate::error::Result;
use crate::table::{column_f64, column_json, float_to_json, json_label};
use crate::value_counts::ValueCountResult;
use indexmap::IndexMap;
use itertools::Itertools;
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use std::collections::HashSet;

const RESULT_TABLE: &str = "the result table";
const FACET_SPACING: f64 = 0.03;
const PATH_SEPARATOR: &str = "/";

/// Plotly figure: a list of traces plus a layout, rendered by plotly.js.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    pub data: Vec<JsonValue>,
    pub layout: JsonValue,
}

impl Figure {
    pub fn trace_count(&self) -> usize {
        self.data.len()
    }

    pub fn trace(&self, idx: usize) -> Option<&JsonValue> {
        self.data.get(idx)
    }
}

/// The three figures drawn for every value-count result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCountFigures {
    pub bar: Figure,
    pub line: Figure,
    pub pie: Figure,
}

enum ColorEncoding {
    None,
    Discrete(Vec<String>),
    Continuous(String, Vec<JsonValue>),
}

pub struct FigureBuilder<'a> {
    config: &'a ChartConfig,
}

impl<'a> FigureBuilder<'a> {
    pub fn new(config: &'a ChartConfig) -> Self {
        Self { config }
    }

    /// Renders an already validated spec over `frame`.
    pub fn build(&self, spec: &ChartSpec, frame: &DataFrame) -> Result<Figure> {
        match spec.family {
            ChartFamily::Line => self.line(spec, frame),
            ChartFamily::Bar => self.bar(spec, frame),
            ChartFamily::Scatter => self.scatter(spec, frame),
            ChartFamily::Pie => self.pie(spec, frame),
            ChartFamily::Sunburst => self.sunburst(spec, frame),
        }
    }

    pub fn value_counts(&self, result: &ValueCountResult) -> Result<ValueCountFigures> {
        let column = result.column.as_str();
        let count = result.count_column.as_str();
        let title = format!("Value counts of {column}");
        let xy = |family| {
            ChartSpec::new(family)
                .bind(Role::X, column)
                .bind(Role::Y, count)
                .bind(Role::Text, count)
                .with_title(title.clone())
        };
        let pie = ChartSpec::new(ChartFamily::Pie)
            .bind(Role::Names, column)
            .bind(Role::Values, count)
            .with_title(title.clone());
        Ok(ValueCountFigures {
            bar: self.build(&xy(ChartFamily::Bar), &result.frame)?,
            line: self.build(&xy(ChartFamily::Line), &result.frame)?,
            pie: self.build(&pie, &result.frame)?,
        })
    }

    fn line(&self, spec: &ChartSpec, frame: &DataFrame) -> Result<Figure> {
        let xy = XySeries::read(spec, frame)?;
        let mode = if xy.text.is_some() {
            "lines+markers+text"
        } else {
            "lines+markers"
        };
        let all_rows: Vec<usize> = (0..xy.x.len()).collect();
        let mut data = Vec::new();
        match self.color_encoding(spec, frame, false)? {
            ColorEncoding::Discrete(labels) => {
                for (idx, (label, rows)) in group_rows(&labels, &all_rows).into_iter().enumerate() {
                    let mut trace = xy.trace("scatter", &rows, "x", "y");
                    trace["mode"] = json!(mode);
                    trace["name"] = json!(label);
                    trace["legendgroup"] = json!(label);
                    trace["showlegend"] = json!(true);
                    let colour = self.colour(idx);
                    trace["line"] = json!({ "color": colour });
                    trace["marker"] = json!({ "color": colour });
                    data.push(trace);
                }
            }
            _ => {
                let mut trace = xy.trace("scatter", &all_rows, "x", "y");
                trace["mode"] = json!(mode);
                if xy.text.is_some() {
                    trace["textposition"] = json!("top center");
                }
                data.push(trace);
            }
        }
        let layout = self.xy_layout(spec);
        Ok(Figure { data, layout })
    }

    fn bar(&self, spec: &ChartSpec, frame: &DataFrame) -> Result<Figure> {
        let xy = XySeries::read(spec, frame)?;
        let all_rows: Vec<usize> = (0..xy.x.len()).collect();
        let facets = match spec.column(Role::Facet) {
            Some(facet) => {
                let labels = labels_of(frame, facet)?;
                group_rows(&labels, &all_rows)
            }
            None => IndexMap::from([(String::new(), all_rows.clone())]),
        };
        let colour = self.color_encoding(spec, frame, true)?;
        let colour_index: IndexMap<String, usize> = match &colour {
            ColorEncoding::Discrete(labels) => labels
                .iter()
                .unique()
                .enumerate()
                .map(|(idx, label)| (label.clone(), idx))
                .collect(),
            _ => IndexMap::new(),
        };

        let mut data = Vec::new();
        let mut shown = HashSet::new();
        for (facet_idx, rows) in facets.values().enumerate() {
            let (xaxis, yaxis) = axis_ids(facet_idx);
            match &colour {
                ColorEncoding::Discrete(labels) => {
                    for (label, subset) in group_rows(labels, rows) {
                        let mut trace = xy.trace("bar", &subset, &xaxis, &yaxis);
                        let idx = colour_index.get(&label).copied().unwrap_or(0);
                        trace["name"] = json!(label);
                        trace["legendgroup"] = json!(label);
                        trace["showlegend"] = json!(shown.insert(label.clone()));
                        trace["marker"] = json!({ "color": self.colour(idx) });
                        data.push(trace);
                    }
                }
                ColorEncoding::Continuous(column, values) => {
                    let mut trace = xy.trace("bar", rows, &xaxis, &yaxis);
                    trace["marker"] = self.continuous_marker(column, values, rows, facet_idx == 0);
                    data.push(trace);
                }
                ColorEncoding::None => {
                    let mut trace = xy.trace("bar", rows, &xaxis, &yaxis);
                    if xy.text.is_some() {
                        trace["textposition"] = json!("auto");
                    }
                    data.push(trace);
                }
            }
        }

        let mut layout = self.xy_layout(spec);
        layout["barmode"] = json!("group");
        if let Some(facet) = spec.column(Role::Facet) {
            self.facet_axes(&mut layout, spec, facet, &facets);
        }
        Ok(Figure { data, layout })
    }

    fn scatter(&self, spec: &ChartSpec, frame: &DataFrame) -> Result<Figure> {
        let xy = XySeries::read(spec, frame)?;
        let all_rows: Vec<usize> = (0..xy.x.len()).collect();
        let sizes = match spec.column(Role::Size) {
            Some(size) => Some(column_f64(frame, size, RESULT_TABLE)?),
            None => None,
        };
        let size_marker = |rows: &[usize]| -> Option<JsonValue> {
            let sizes = sizes.as_ref()?;
            let max = sizes.iter().flatten().copied().fold(f64::NAN, f64::max);
            let sizeref = if max.is_finite() && max > 0.0 {
                2.0 * max / (self.config.size_max * self.config.size_max)
            } else {
                1.0
            };
            Some(json!({
                "size": rows.iter().map(|&r| sizes[r].map_or(JsonValue::Null, float_to_json)).collect::<Vec<_>>(),
                "sizemode": "area",
                "sizeref": sizeref,
                "sizemin": 0,
            }))
        };

        let mut data = Vec::new();
        match self.color_encoding(spec, frame, true)? {
            ColorEncoding::Discrete(labels) => {
                for (idx, (label, rows)) in group_rows(&labels, &all_rows).into_iter().enumerate() {
                    let mut trace = xy.trace("scatter", &rows, "x", "y");
                    trace["mode"] = json!("markers");
                    trace["name"] = json!(label);
                    trace["legendgroup"] = json!(label);
                    trace["showlegend"] = json!(true);
                    let mut marker = size_marker(&rows).unwrap_or_else(|| json!({}));
                    marker["color"] = json!(self.colour(idx));
                    trace["marker"] = marker;
                    data.push(trace);
                }
            }
            ColorEncoding::Continuous(column, values) => {
                let mut trace = xy.trace("scatter", &all_rows, "x", "y");
                trace["mode"] = json!("markers");
                let mut marker = self.continuous_marker(&column, &values, &all_rows, true);
                if let Some(JsonValue::Object(size)) = size_marker(&all_rows) {
                    merge_into(&mut marker, size);
                }
                trace["marker"] = marker;
                data.push(trace);
            }
            ColorEncoding::None => {
                let mut trace = xy.trace("scatter", &all_rows, "x", "y");
                trace["mode"] = json!("markers");
                if let Some(marker) = size_marker(&all_rows) {
                    trace["marker"] = marker;
                }
                data.push(trace);
            }
        }
        Ok(Figure {
            data,
            layout: self.xy_layout(spec),
        })
    }

    fn pie(&self, spec: &ChartSpec, frame: &DataFrame) -> Result<Figure> {
        let names = spec.column(Role::Names).unwrap_or_default();
        let values = spec.column(Role::Values).unwrap_or_default();
        let labels = labels_of(frame, names)?;
        let sizes = column_json(frame, values, RESULT_TABLE)?;
        let trace = json!({
            "type": "pie",
            "labels": labels,
            "values": sizes,
            "hovertemplate": format!("{names}=%{{label}}<br>{values}=%{{value}}<extra></extra>"),
        });
        let mut layout = self.base_layout(spec);
        layout["legend"] = json!({ "tracegroupgap": 0 });
        Ok(Figure {
            data: vec![trace],
            layout,
        })
    }

    fn sunburst(&self, spec: &ChartSpec, frame: &DataFrame) -> Result<Figure> {
        let path = spec.path();
        let levels = path
            .iter()
            .map(|column| labels_of(frame, column))
            .collect::<Result<Vec<_>>>()?;
        let weights = match spec.column(Role::Values) {
            Some(values) => column_f64(frame, values, RESULT_TABLE)?,
            None => vec![Some(1.0); frame.height()],
        };

        // id -> (label, parent, summed value), parents inserted before children
        let mut nodes: IndexMap<String, (String, String, f64)> = IndexMap::new();
        for row in 0..frame.height() {
            let weight = weights[row].unwrap_or(0.0);
            for depth in 0..levels.len() {
                let id = levels[..=depth].iter().map(|l| l[row].as_str()).join(PATH_SEPARATOR);
                let parent = levels[..depth].iter().map(|l| l[row].as_str()).join(PATH_SEPARATOR);
                let node = nodes
                    .entry(id)
                    .or_insert_with(|| (levels[depth][row].clone(), parent, 0.0));
                node.2 += weight;
            }
        }

        let trace = json!({
            "type": "sunburst",
            "ids": nodes.keys().collect::<Vec<_>>(),
            "labels": nodes.values().map(|n| &n.0).collect::<Vec<_>>(),
            "parents": nodes.values().map(|n| &n.1).collect::<Vec<_>>(),
            "values": nodes.values().map(|n| float_to_json(n.2)).collect::<Vec<_>>(),
            "branchvalues": "total",
        });
        Ok(Figure {
            data: vec![trace],
            layout: self.base_layout(spec),
        })
    }

    fn color_encoding(
        &self,
        spec: &ChartSpec,
        frame: &DataFrame,
        allow_continuous: bool,
    ) -> Result<ColorEncoding> {
        let Some(column) = spec.column(Role::Color) else {
            return Ok(ColorEncoding::None);
        };
        let kind = column_kind(frame, column, RESULT_TABLE)?;
        if allow_continuous && kind == ColumnKind::Numeric {
            let values = column_json(frame, column, RESULT_TABLE)?;
            return Ok(ColorEncoding::Continuous(column.to_string(), values));
        }
        Ok(ColorEncoding::Discrete(labels_of(frame, column)?))
    }

    fn continuous_marker(
        &self,
        column: &str,
        values: &[JsonValue],
        rows: &[usize],
        show_scale: bool,
    ) -> JsonValue {
        json!({
            "color": pick(values, rows),
            "showscale": show_scale,
            "colorscale": self.config.theme.colorscale,
            "colorbar": { "title": { "text": column } },
        })
    }

    fn colour(&self, idx: usize) -> &str {
        let colorway = &self.config.theme.colorway;
        colorway
            .get(idx % colorway.len().max(1))
            .map(String::as_str)
            .unwrap_or("#636efa")
    }

    fn base_layout(&self, spec: &ChartSpec) -> JsonValue {
        let theme = &self.config.theme;
        let mut layout = json!({
            "paper_bgcolor": theme.paper_bgcolor,
            "plot_bgcolor": theme.plot_bgcolor,
            "colorway": theme.colorway,
            "margin": { "t": 60 },
        });
        if let Some(title) = &spec.title {
            layout["title"] = json!({ "text": title });
        }
        layout
    }

    fn xy_layout(&self, spec: &ChartSpec) -> JsonValue {
        let grid = &self.config.theme.gridcolor;
        let mut layout = self.base_layout(spec);
        layout["xaxis"] = json!({
            "title": { "text": spec.column(Role::X).unwrap_or_default() },
            "gridcolor": grid,
        });
        layout["yaxis"] = json!({
            "title": { "text": spec.column(Role::Y).unwrap_or_default() },
            "gridcolor": grid,
        });
        if let Some(colour) = spec.column(Role::Color) {
            layout["legend"] = json!({ "title": { "text": colour }, "tracegroupgap": 0 });
        }
        layout
    }

    /// One x axis per facet value laid out side by side, y axes shared.
    fn facet_axes(
        &self,
        layout: &mut JsonValue,
        spec: &ChartSpec,
        facet: &str,
        facets: &IndexMap<String, Vec<usize>>,
    ) {
        let grid = &self.config.theme.gridcolor;
        let count = facets.len().max(1) as f64;
        let width = (1.0 - FACET_SPACING * (count - 1.0)) / count;
        let mut annotations = Vec::new();
        for (idx, label) in facets.keys().enumerate() {
            let start = idx as f64 * (width + FACET_SPACING);
            let end = if idx + 1 == facets.len() { 1.0 } else { start + width };
            let (xaxis, yaxis) = axis_ids(idx);
            let x_key = format!("xaxis{}", &xaxis[1..]);
            let y_key = format!("yaxis{}", &yaxis[1..]);
            layout[x_key.as_str()] = json!({
                "domain": [start, end],
                "anchor": yaxis,
                "gridcolor": grid,
                "title": { "text": spec.column(Role::X).unwrap_or_default() },
            });
            if idx > 0 {
                layout[y_key.as_str()] = json!({
                    "anchor": xaxis,
                    "matches": "y",
                    "showticklabels": false,
                    "gridcolor": grid,
                });
            }
            annotations.push(json!({
                "text": format!("{facet}={label}"),
                "x": (start + end) / 2.0,
                "xref": "paper",
                "xanchor": "center",
                "y": 1.0,
                "yref": "paper",
                "yanchor": "bottom",
                "showarrow": false,
            }));
        }
        layout["annotations"] = JsonValue::Array(annotations);
    }
}

struct XySeries {
    x: Vec<JsonValue>,
    y: Vec<JsonValue>,
    text: Option<Vec<JsonValue>>,
}

impl XySeries {
    fn read(spec: &ChartSpec, frame: &DataFrame) -> Result<Self> {
        let x = column_json(frame, spec.column(Role::X).unwrap_or_default(), RESULT_TABLE)?;
        let y = column_json(frame, spec.column(Role::Y).unwrap_or_default(), RESULT_TABLE)?;
        let text = match spec.column(Role::Text) {
            Some(text) => Some(column_json(frame, text, RESULT_TABLE)?),
            None => None,
        };
        Ok(Self { x, y, text })
    }

    fn trace(&self, kind: &str, rows: &[usize], xaxis: &str, yaxis: &str) -> JsonValue {
        let mut trace = json!({
            "type": kind,
            "x": pick(&self.x, rows),
            "y": pick(&self.y, rows),
            "xaxis": xaxis,
            "yaxis": yaxis,
        });
        if let Some(text) = &self.text {
            trace["text"] = JsonValue::Array(pick(text, rows));
        }
        trace
    }
}

fn labels_of(frame: &DataFrame, column: &str) -> Result<Vec<String>> {
    Ok(column_json(frame, column, RESULT_TABLE)?
        .iter()
        .map(json_label)
        .collect())
}

/// Splits `rows` by label, groups in first-appearance order.
fn group_rows(labels: &[String], rows: &[usize]) -> IndexMap<String, Vec<usize>> {
    let mut groups: IndexMap<String, Vec<usize>> = IndexMap::new();
    for &row in rows {
        groups.entry(labels[row].clone()).or_default().push(row);
    }
    groups
}

fn pick(values: &[JsonValue], rows: &[usize]) -> Vec<JsonValue> {
    rows.iter().map(|&r| values[r].clone()).collect()
}

fn axis_ids(facet_idx: usize) -> (String, String) {
    if facet_idx == 0 {
        ("x".to_string(), "y".to_string())
    } else {
        let n = facet_idx + 1;
        (format!("x{n}"), format!("y{n}"))
    }
}

fn merge_into(target: &mut JsonValue, extra: Map<String, JsonValue>) {
    if let JsonValue::Object(map) = target {
        map.extend(extra);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_grouped_in_first_seen_order() {
        let labels = vec!["b".to_string(), "a".to_string(), "b".to_string()];
        let groups = group_rows(&labels, &[0, 1, 2]);
        assert_eq!(groups.keys().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(groups["b"], vec![0, 2]);
    }

    #[test]
    fn facet_axes_are_numbered_from_two() {
        assert_eq!(axis_ids(0), ("x".to_string(), "y".to_string()));
        assert_eq!(axis_ids(2), ("x3".to_string(), "y3".to_string()));
    }
}

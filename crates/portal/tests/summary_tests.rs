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

use portal::config::IngestConfig;
use portal::ingest::read_dataset;
use portal::summary::{self, Describe};
use portal::{ColumnKind, Dataset};
use serde_json::json;

fn dataset(csv: &str) -> Dataset {
    read_dataset("sales.csv", csv.as_bytes(), &IngestConfig::default()).unwrap()
}

#[test]
fn test_shape_matches_table() {
    let data = dataset("city,sales\nA,10\nB,20\nA,30\n");
    let shape = summary::shape(&data);
    assert_eq!(shape.rows, 3);
    assert_eq!(shape.columns, 2);

    let overview = summary::overview(&data);
    assert_eq!(overview.columns, vec!["city", "sales"]);
    assert_eq!(overview.file_name, "sales.csv");
}

#[test]
fn test_describe_numeric_columns() {
    let data = dataset("city,sales\nA,10\nB,20\nA,30\n");
    let Describe::Numeric(stats) = summary::describe(&data).unwrap() else {
        panic!("expected numeric statistics");
    };
    assert_eq!(stats.len(), 1);
    let sales = &stats[0];
    assert_eq!(sales.column, "sales");
    assert_eq!(sales.count, 3);
    assert_eq!(sales.mean, Some(20.0));
    assert_eq!(sales.std, Some(10.0));
    assert_eq!(sales.min, Some(10.0));
    assert_eq!(sales.q25, Some(15.0));
    assert_eq!(sales.median, Some(20.0));
    assert_eq!(sales.q75, Some(25.0));
    assert_eq!(sales.max, Some(30.0));
}

#[test]
fn test_describe_table_layout() {
    let data = dataset("sales\n10\n20\n30\n");
    let table = summary::describe(&data).unwrap().to_table();
    assert_eq!(table.columns, vec!["statistic", "sales"]);
    assert_eq!(table.row_count(), 8);
    assert_eq!(table.rows[0], vec![json!("count"), json!(3)]);
    assert_eq!(table.rows[5], vec![json!("50%"), json!(20.0)]);
}

#[test]
fn test_describe_text_only_table() {
    let data = dataset("city\nA\nB\nA\n");
    let Describe::Text(stats) = summary::describe(&data).unwrap() else {
        panic!("expected text statistics");
    };
    assert_eq!(stats[0].count, 3);
    assert_eq!(stats[0].unique, 2);
    assert_eq!(stats[0].top, Some(json!("A")));
    assert_eq!(stats[0].freq, 2);
}

#[test]
fn test_head_and_tail_keep_order() {
    let data = dataset("n\n1\n2\n3\n4\n");
    let head = summary::head(&data, 2).unwrap();
    assert_eq!(head.rows, vec![vec![json!(1)], vec![json!(2)]]);

    let tail = summary::tail(&data, 2).unwrap();
    assert_eq!(tail.rows, vec![vec![json!(3)], vec![json!(4)]]);
}

#[test]
fn test_head_and_tail_cap_at_row_count() {
    let data = dataset("n\n1\n2\n3\n");
    assert_eq!(summary::head(&data, 10).unwrap().row_count(), 3);
    assert_eq!(summary::tail(&data, 10).unwrap().row_count(), 3);
    assert_eq!(summary::head(&data, 0).unwrap().row_count(), 0);
}

#[test]
fn test_dtypes_listing() {
    let data = dataset("city,sales\nA,10\n");
    let dtypes = summary::dtypes(&data);
    assert_eq!(dtypes.len(), 2);
    assert_eq!(dtypes[0].column, "city");
    assert_eq!(dtypes[0].kind, ColumnKind::Text);
    assert_eq!(dtypes[1].column, "sales");
    assert_eq!(dtypes[1].kind, ColumnKind::Numeric);
}

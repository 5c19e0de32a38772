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
use portal::value_counts::count_values;
use portal::{Dataset, PortalError, SelectionError, ValueCountRequest};
use serde_json::json;

fn dataset(csv: &str) -> Dataset {
    read_dataset("sales.csv", csv.as_bytes(), &IngestConfig::default()).unwrap()
}

fn request(column: &str, top_rows: usize) -> ValueCountRequest {
    ValueCountRequest {
        column: column.to_string(),
        top_rows,
    }
}

#[test]
fn test_top_value_with_limit_one() {
    let data = dataset("city,sales\nA,10\nB,20\nA,30\n");
    let result = count_values(&data, &request("city", 1)).unwrap();
    let table = result.to_table().unwrap();

    assert_eq!(table.columns, vec!["city", "count"]);
    assert_eq!(table.rows, vec![vec![json!("A"), json!(2)]]);
}

#[test]
fn test_counts_sorted_descending_with_value_tiebreak() {
    let data = dataset("fruit\npear\napple\nfig\napple\npear\napple\n");
    let table = count_values(&data, &request("fruit", 10))
        .unwrap()
        .to_table()
        .unwrap();

    assert_eq!(
        table.rows,
        vec![
            vec![json!("apple"), json!(3)],
            vec![json!("pear"), json!(2)],
            vec![json!("fig"), json!(1)],
        ]
    );
}

#[test]
fn test_counts_respect_limit_and_skip_nulls() {
    let data = dataset("city,n\nA,1\n,2\nB,3\nA,4\nC,5\n");
    let result = count_values(&data, &request("city", 2)).unwrap();

    assert_eq!(result.frame.height(), 2);
    assert!(result.total().unwrap() <= 4);

    let all = count_values(&data, &request("city", 100)).unwrap();
    assert_eq!(all.total().unwrap(), 4);
}

#[test]
fn test_zero_limit_is_rejected() {
    let data = dataset("city\nA\n");
    let err = count_values(&data, &request("city", 0)).unwrap_err();
    assert!(matches!(
        err,
        PortalError::Selection(SelectionError::InvalidRowLimit { value: 0 })
    ));
}

#[test]
fn test_counting_a_column_named_count() {
    let data = dataset("count\n1\n1\n2\n");
    let result = count_values(&data, &request("count", 5)).unwrap();
    assert_eq!(result.count_column, "frequency");
    assert_eq!(result.to_table().unwrap().rows[0], vec![json!(1), json!(2)]);
}

#[test]
fn test_missing_column() {
    let data = dataset("city\nA\n");
    let err = count_values(&data, &request("region", 3)).unwrap_err();
    assert!(matches!(
        err,
        PortalError::Selection(SelectionError::ColumnNotFound { .. })
    ));
}

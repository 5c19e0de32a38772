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
use portal::{ColumnKind, IngestError, PortalError};

#[test]
fn test_csv_upload_reports_parsed_dimensions() {
    let csv = "city,sales,active\nA,10,true\nB,20,false\nA,30,true\n";
    let dataset = read_dataset("sales.csv", csv.as_bytes(), &IngestConfig::default()).unwrap();

    assert_eq!(dataset.row_count(), 3);
    assert_eq!(dataset.column_count(), 3);
    assert_eq!(dataset.column_names(), vec!["city", "sales", "active"]);
    assert_eq!(dataset.metadata().file_name, "sales.csv");
}

#[test]
fn test_csv_column_kinds_are_inferred() {
    let csv = "city,sales,price,active\nA,10,1.5,true\nB,20,2.5,false\n";
    let dataset = read_dataset("sales.csv", csv.as_bytes(), &IngestConfig::default()).unwrap();

    assert_eq!(dataset.column_kind("city").unwrap(), ColumnKind::Text);
    assert_eq!(dataset.column_kind("sales").unwrap(), ColumnKind::Numeric);
    assert_eq!(dataset.column_kind("price").unwrap(), ColumnKind::Numeric);
    assert_eq!(dataset.column_kind("active").unwrap(), ColumnKind::Boolean);
}

#[test]
fn test_uppercase_extension_uses_csv_parser() {
    let csv = "a,b\n1,2\n";
    let dataset = read_dataset("DATA.CSV", csv.as_bytes(), &IngestConfig::default()).unwrap();
    assert_eq!(dataset.row_count(), 1);
}

#[test]
fn test_non_csv_name_is_read_as_spreadsheet() {
    let result = read_dataset("data.xlsx", b"city,sales\nA,1\n", &IngestConfig::default());
    match result {
        Err(PortalError::Ingest(IngestError::Spreadsheet { file, .. })) => {
            assert_eq!(file, "data.xlsx");
        }
        other => panic!("expected spreadsheet error, got {other:?}"),
    }
}

#[test]
fn test_unknown_column_is_reported_with_name() {
    let dataset = read_dataset("s.csv", b"a\n1\n", &IngestConfig::default()).unwrap();
    let err = dataset.require_column("missing").unwrap_err();
    assert_eq!(err.category(), "Selection");
    assert!(err.to_string().contains("missing"));
}

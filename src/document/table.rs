//! Labelled table grids: a header row plus rectangular data rows.
//!
//! Tables travel to the LLM as a JSON array of row objects
//! (`[{"column": "cell", …}]`) and come back in the same shape. This module
//! owns both directions of that mapping, including the cleanup of fenced
//! model responses.

use crate::error::{ContentError, TableShapeError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// One raw table as produced by the PDF parser: rows of optionally-absent cells.
pub type RawTable = Vec<Vec<Option<String>>>;

/// A table with a header row and zero or more data rows of equal width.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableGrid {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TableGrid {
    /// Build a grid, rejecting rows whose width differs from the header.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self, TableShapeError> {
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns.len() {
                return Err(TableShapeError::RaggedRow {
                    row: i + 1,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
        }
        Ok(Self { columns, rows })
    }

    /// Build a grid from a raw parser grid: the first row is the header.
    ///
    /// Absent cells become empty strings. Irregular row widths are a hard
    /// error since they mean the upstream table detection went wrong.
    pub fn from_raw(raw: &[Vec<Option<String>>]) -> Result<Self, TableShapeError> {
        let (header, body) = raw.split_first().ok_or(TableShapeError::Empty)?;
        let columns = header.iter().map(cell_text).collect();
        let rows = body
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();
        Self::new(columns, rows)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of data rows (the header is not counted).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Every cell, header first, in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .chain(self.rows.iter().flatten())
            .map(String::as_str)
    }

    /// JSON keys used for each column.
    ///
    /// Row objects cannot hold two equal keys, so blank headers become
    /// `column_N` and repeated headers get a numeric suffix.
    pub fn record_keys(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let base = if name.trim().is_empty() {
                    format!("column_{}", i + 1)
                } else {
                    name.clone()
                };
                let mut key = base.clone();
                let mut n = 2;
                while !seen.insert(key.clone()) {
                    key = format!("{base}_{n}");
                    n += 1;
                }
                key
            })
            .collect()
    }

    /// Serialise as a compact JSON array of row objects, non-ASCII preserved.
    pub fn to_records_json(&self) -> String {
        let keys = self.record_keys();
        let records: Vec<Value> = self
            .rows
            .iter()
            .map(|row| {
                let object: Map<String, Value> = keys
                    .iter()
                    .cloned()
                    .zip(row.iter().map(|cell| Value::String(cell.clone())))
                    .collect();
                Value::Object(object)
            })
            .collect();
        Value::Array(records).to_string()
    }

    /// Rebuild this grid from a translated JSON array of row objects.
    ///
    /// A ```` ```json ```` wrapper is removed first. Every object must use
    /// the keys from [`record_keys`](Self::record_keys); a missing key gives
    /// an empty cell and an unknown key rejects the response. The result
    /// keeps this grid's header, so keys made up for blank or repeated
    /// headers never reach the output. An empty array is a valid reply for
    /// a header-only table.
    pub fn translated_from_records(&self, response: &str) -> Result<Self, ContentError> {
        let body = strip_code_fence(response);
        let records: Vec<Map<String, Value>> = serde_json::from_str(body)
            .map_err(|e| ContentError::InvalidTable(e.to_string()))?;

        let keys = self.record_keys();
        let mut rows = Vec::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            if let Some(unknown) = record.keys().find(|k| !keys.contains(k)) {
                return Err(ContentError::InvalidTable(format!(
                    "row {} has unknown key '{}'",
                    i + 1,
                    unknown
                )));
            }
            rows.push(
                keys.iter()
                    .map(|k| record.get(k).map(value_text).unwrap_or_default())
                    .collect(),
            );
        }

        Self::new(self.columns.clone(), rows)
            .map_err(|e| ContentError::InvalidTable(e.to_string()))
    }
}

fn cell_text(cell: &Option<String>) -> String {
    cell.clone().unwrap_or_default()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

static RE_FENCED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?si)^```(?:json)?[ \t]*\n?(.*?)\n?```$").unwrap());

/// Remove a ```` ```json … ``` ```` (or bare ```` ``` ````) wrapper around a response.
pub fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    match RE_FENCED.captures(trimmed).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(rows: &[&[Option<&str>]]) -> RawTable {
        rows.iter()
            .map(|r| r.iter().map(|c| c.map(str::to_string)).collect())
            .collect()
    }

    #[test]
    fn from_raw_splits_header_and_rows() {
        let grid = TableGrid::from_raw(&raw(&[
            &[Some("Name"), Some("Qty")],
            &[Some("Apple"), Some("3")],
            &[Some("Pear"), None],
        ]))
        .unwrap();
        assert_eq!(grid.columns(), ["Name", "Qty"]);
        assert_eq!(grid.row_count(), 2);
        assert_eq!(grid.column_count(), 2);
        assert_eq!(grid.rows()[1], vec!["Pear".to_string(), String::new()]);
    }

    #[test]
    fn from_raw_rejects_ragged_rows() {
        let err = TableGrid::from_raw(&raw(&[
            &[Some("a"), Some("b")],
            &[Some("1")],
        ]))
        .unwrap_err();
        assert_eq!(
            err,
            TableShapeError::RaggedRow {
                row: 1,
                expected: 2,
                found: 1
            }
        );
    }

    #[test]
    fn from_raw_rejects_empty_grid() {
        assert_eq!(TableGrid::from_raw(&[]).unwrap_err(), TableShapeError::Empty);
    }

    #[test]
    fn header_only_grid_has_no_rows() {
        let grid = TableGrid::from_raw(&raw(&[&[Some("a"), Some("b")]])).unwrap();
        assert_eq!(grid.row_count(), 0);
        assert_eq!(grid.to_records_json(), "[]");
    }

    #[test]
    fn records_json_keeps_header_order_and_unicode() {
        let grid = TableGrid::new(
            vec!["名前".into(), "b".into()],
            vec![vec!["りんご".into(), "2".into()]],
        )
        .unwrap();
        assert_eq!(grid.to_records_json(), r#"[{"名前":"りんご","b":"2"}]"#);
    }

    #[test]
    fn record_keys_disambiguate_blank_and_repeated_headers() {
        let grid = TableGrid::new(
            vec!["".into(), "x".into(), "x".into()],
            vec![],
        )
        .unwrap();
        assert_eq!(grid.record_keys(), vec!["column_1", "x", "x_2"]);
    }

    fn ab() -> TableGrid {
        TableGrid::new(
            vec!["a".into(), "b".into()],
            vec![vec!["one".into(), "two".into()]],
        )
        .unwrap()
    }

    #[test]
    fn parses_plain_records() {
        let grid = ab().translated_from_records(r#"[{"a":"1","b":"2"}]"#).unwrap();
        assert_eq!(grid.columns(), ["a", "b"]);
        assert_eq!(grid.row_count(), 1);
        assert_eq!(grid.rows()[0], vec!["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn fenced_response_parses_like_plain() {
        let plain = ab().translated_from_records(r#"[{"a":"x","b":"y"}]"#).unwrap();
        for fenced in [
            "```json\n[{\"a\":\"x\",\"b\":\"y\"}]\n```",
            "```JSON\n[{\"a\":\"x\",\"b\":\"y\"}]\n```",
        ] {
            assert_eq!(ab().translated_from_records(fenced).unwrap(), plain);
        }
    }

    #[test]
    fn non_string_values_are_stringified() {
        let grid = TableGrid::new(
            vec!["n".into(), "f".into(), "z".into()],
            vec![vec![String::new(); 3]],
        )
        .unwrap();
        let parsed = grid
            .translated_from_records(r#"[{"n":1,"f":true,"z":null}]"#)
            .unwrap();
        assert_eq!(parsed.rows()[0], vec!["1", "true", ""]);
    }

    #[test]
    fn missing_keys_become_empty_cells() {
        let grid = ab()
            .translated_from_records(r#"[{"a":"1"},{"b":"3","a":"2"}]"#)
            .unwrap();
        assert_eq!(grid.rows()[0], vec!["1", ""]);
        assert_eq!(grid.rows()[1], vec!["2", "3"]);
    }

    #[test]
    fn translated_keys_are_rejected() {
        let err = ab()
            .translated_from_records(r#"[{"A":"1","B":"2"}]"#)
            .unwrap_err();
        assert_eq!(
            err,
            ContentError::InvalidTable("row 1 has unknown key 'A'".into())
        );
    }

    #[test]
    fn header_only_table_accepts_empty_array() {
        let grid = TableGrid::from_raw(&raw(&[&[Some("a"), Some("b")]])).unwrap();
        let parsed = grid.translated_from_records(&grid.to_records_json()).unwrap();
        assert_eq!(parsed.columns(), ["a", "b"]);
        assert_eq!(parsed.row_count(), 0);
    }

    #[test]
    fn blank_and_repeated_headers_keep_source_text() {
        let grid = TableGrid::new(
            vec!["".into(), "x".into(), "x".into()],
            vec![vec!["0".into(), "1".into(), "2".into()]],
        )
        .unwrap();
        let parsed = grid.translated_from_records(&grid.to_records_json()).unwrap();
        assert_eq!(parsed.columns(), ["", "x", "x"]);
        assert_eq!(parsed.rows()[0], vec!["0", "1", "2"]);
    }

    #[test]
    fn rejects_non_json() {
        assert!(matches!(
            ab().translated_from_records("not json"),
            Err(ContentError::InvalidTable(_))
        ));
    }

    #[test]
    fn strip_code_fence_leaves_unfenced_text_alone() {
        assert_eq!(strip_code_fence("  [1]  "), "[1]");
        assert_eq!(strip_code_fence("```\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fence("```json[1]```"), "[1]");
    }
}

//! In-memory text table: the shape every source and joined table takes.
//!
//! RULE: cells are nullable text. Nothing here interprets a value;
//! typing happens in the projector.

use crate::types::Cell;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// A table with no columns and no rows. Stands in for a missing source.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a table from string literals. Empty strings become null cells.
    /// Handy for fixtures.
    pub fn from_strs(columns: &[&str], rows: &[&[&str]]) -> Self {
        let mut table = Self::new(columns.iter().map(|c| c.to_string()).collect());
        for row in rows {
            table.push_row(row.iter().map(|v| non_empty(v)).collect());
        }
        table
    }

    /// Append a row, padding with nulls or truncating to the column count.
    pub fn push_row(&mut self, mut row: Vec<Cell>) {
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the table has no rows, whether or not it has a header.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Position of `name`. On duplicate headers the first one wins.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// Copy of this table with every column name prefixed.
    pub fn with_prefix(&self, prefix: &str) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .map(|c| format!("{prefix}{c}"))
                .collect(),
            rows: self.rows.clone(),
        }
    }
}

/// Map empty text to null. Everything else is kept verbatim.
pub fn non_empty(value: &str) -> Cell {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_rows_are_padded_and_long_rows_truncated() {
        let mut table = Table::new(vec!["a".into(), "b".into()]);
        table.push_row(vec![Some("1".into())]);
        table.push_row(vec![Some("1".into()), Some("2".into()), Some("3".into())]);

        assert_eq!(table.rows()[0], vec![Some("1".to_string()), None]);
        assert_eq!(table.rows()[1].len(), 2);
    }

    #[test]
    fn empty_strings_become_null() {
        let table = Table::from_strs(&["id", "name"], &[&["1", ""]]);
        assert_eq!(table.cell(0, "id"), Some("1"));
        assert_eq!(table.cell(0, "name"), None);
    }

    #[test]
    fn header_only_table_counts_as_empty() {
        let table = Table::new(vec!["id".into()]);
        assert!(table.is_empty());
        assert!(table.has_column("id"));
    }

    #[test]
    fn prefix_applies_to_every_column() {
        let table = Table::from_strs(&["id", "name"], &[&["1", "x"]]).with_prefix("usr_");
        assert_eq!(table.columns(), &["usr_id".to_string(), "usr_name".to_string()]);
        assert_eq!(table.cell(0, "usr_name"), Some("x"));
    }
}

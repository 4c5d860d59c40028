use std::collections::HashMap;
use std::sync::Arc;

use super::row::{CustomDbRow, index_columns};
use crate::types::RowValues;

/// One complete table of rows returned by a query, or by one stage of a procedure call.
///
/// Used as the buffer between a live cursor and the engine (see
/// [`BufferedCursor`](crate::executor::BufferedCursor)) and as the scripted response type of
/// [`MemoryExecutor`](crate::executor::MemoryExecutor).
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<CustomDbRow>,
    /// Column names shared by all rows (to avoid duplicating in each row)
    column_names: Option<Arc<Vec<String>>>,
    column_index: Option<Arc<HashMap<String, usize>>>,
}

impl ResultSet {
    /// Create a new result set with a known capacity
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            results: Vec::with_capacity(capacity),
            column_names: None,
            column_index: None,
        }
    }

    /// Build a result set from column names and row values in one go.
    ///
    /// ```rust
    /// use sql_mapper::prelude::*;
    ///
    /// let rs = ResultSet::from_rows(
    ///     &["id", "name"],
    ///     vec![
    ///         vec![RowValues::Int(1), RowValues::Text("a".into())],
    ///         vec![RowValues::Int(2), RowValues::Null],
    ///     ],
    /// );
    /// assert_eq!(rs.results.len(), 2);
    /// assert!(rs.results[1].get("name").unwrap().is_null());
    /// ```
    #[must_use]
    pub fn from_rows(columns: &[&str], rows: Vec<Vec<RowValues>>) -> ResultSet {
        let mut rs = ResultSet::with_capacity(rows.len());
        rs.set_column_names(Arc::new(
            columns.iter().map(|c| (*c).to_string()).collect(),
        ));
        for row in rows {
            rs.add_row_values(row);
        }
        rs
    }

    /// Set the column names for this result set (to be shared by all rows)
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_index = Some(Arc::new(index_columns(&column_names)));
        self.column_names = Some(column_names);
    }

    /// Get the column names for this result set
    #[must_use]
    pub fn get_column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Add a row to the result set. Ignored until column names are set.
    pub fn add_row_values(&mut self, row_values: Vec<RowValues>) {
        if let (Some(column_names), Some(index)) = (&self.column_names, &self.column_index) {
            let row = CustomDbRow {
                column_names: Arc::clone(column_names),
                rows: row_values,
                column_index_cache: Arc::clone(index),
            };

            self.results.push(row);
        }
    }
}

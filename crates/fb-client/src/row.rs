//! Row representation.
//!
//! A [`Row`] owns its values and shares the column descriptors of the
//! result set it came from. Lookup by key uses the column alias or the
//! column name depending on [`Settings::alias_keys`].

use std::sync::Arc;

use fb_types::{ColumnDesc, ColumnType, FromSql, SqlValue, TypeError};

use crate::config::Settings;

/// A single row fetched from a result set.
#[derive(Clone, PartialEq)]
pub struct Row {
    values: Vec<SqlValue>,
    columns: Arc<[ColumnDesc]>,
    alias_keys: bool,
}

impl Row {
    /// Build a row, widening DATE values when `settings.date_as_date` is off.
    #[must_use]
    pub fn new(values: Vec<SqlValue>, columns: Arc<[ColumnDesc]>, settings: &Settings) -> Self {
        let values = if settings.date_as_date {
            values
        } else {
            values.into_iter().map(SqlValue::widen_date).collect()
        };
        Self {
            values,
            columns,
            alias_keys: settings.alias_keys,
        }
    }

    /// Get a value by index.
    pub fn get<T: FromSql>(&self, index: usize) -> Result<T, TypeError> {
        let value = self
            .values
            .get(index)
            .ok_or_else(|| TypeError::ColumnNotFound(index.to_string()))?;
        T::from_sql(value)
    }

    /// Get a value by key (alias or name, see [`Row::keys`]).
    pub fn get_by_name<T: FromSql>(&self, key: &str) -> Result<T, TypeError> {
        let index = self
            .find(key)
            .ok_or_else(|| TypeError::ColumnNotFound(key.to_owned()))?;
        self.get(index)
    }

    /// Try to get a value by index, returning `None` on any failure.
    #[must_use]
    pub fn try_get<T: FromSql>(&self, index: usize) -> Option<T> {
        self.get(index).ok()
    }

    /// Get the raw value by index.
    #[must_use]
    pub fn get_raw(&self, index: usize) -> Option<&SqlValue> {
        self.values.get(index)
    }

    /// Get the raw value by key.
    #[must_use]
    pub fn get_raw_by_name(&self, key: &str) -> Option<&SqlValue> {
        self.find(key).and_then(|i| self.values.get(i))
    }

    /// Whether the value at `index` is NULL. Missing columns count as NULL.
    #[must_use]
    pub fn is_null(&self, index: usize) -> bool {
        self.values.get(index).is_none_or(SqlValue::is_null)
    }

    /// Index of the column with the given key, case-insensitive.
    #[must_use]
    pub fn find(&self, key: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| self.key_of(c).eq_ignore_ascii_case(key))
    }

    fn key_of<'a>(&self, column: &'a ColumnDesc) -> &'a str {
        if self.alias_keys {
            &column.alias
        } else {
            &column.name
        }
    }

    /// Column keys in column order.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        self.columns.iter().map(|c| self.key_of(c)).collect()
    }

    /// Logical type of the column at `index`.
    #[must_use]
    pub fn column_type(&self, index: usize) -> Option<ColumnType> {
        self.columns.get(index).map(ColumnDesc::column_type)
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row has no values.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Column descriptors.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDesc] {
        &self.columns
    }

    /// Values in column order.
    #[must_use]
    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    /// Take the values out of the row.
    #[must_use]
    pub fn into_values(self) -> Vec<SqlValue> {
        self.values
    }
}

impl std::fmt::Debug for Row {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map()
            .entries(self.columns.iter().map(|c| self.key_of(c)).zip(&self.values))
            .finish()
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a SqlValue;
    type IntoIter = std::slice::Iter<'a, SqlValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

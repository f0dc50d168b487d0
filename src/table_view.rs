// table_view.rs
use crate::error::{Result, RollerError};
use std::collections::BTreeSet;

/// A column that was found in a `Table`. Only `Table::column` hands these out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnId {
    index: usize,
    name: String,
}

impl ColumnId {
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Text-only sheet: named columns of equal length, read-only once built.
#[derive(Debug, Clone)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Vec<String>>,
    row_count: usize,
}

impl Table {
    pub fn new(columns: Vec<(String, Vec<String>)>) -> Result<Self> {
        let row_count = columns.first().map(|(_, values)| values.len()).unwrap_or(0);
        if let Some((name, values)) = columns.iter().find(|(_, values)| values.len() != row_count) {
            return Err(RollerError::RaggedTable {
                column: name.clone(),
                expected: row_count,
                found: values.len(),
            });
        }

        let (names, columns): (Vec<String>, Vec<Vec<String>>) = columns.into_iter().unzip();
        Ok(Self {
            names,
            columns,
            row_count,
        })
    }

    /// Builds a table from a header row and data rows. Short rows are padded
    /// with empty cells and cells past the header are dropped.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let mut columns: Vec<(String, Vec<String>)> = headers
            .into_iter()
            .map(|name| (name, Vec::with_capacity(rows.len())))
            .collect();

        for row in rows {
            let mut cells = row.into_iter();
            for (_, values) in columns.iter_mut() {
                values.push(cells.next().unwrap_or_default());
            }
        }

        Self::new(columns)
    }

    pub fn column(&self, name: &str) -> Result<ColumnId> {
        self.names
            .iter()
            .position(|candidate| candidate == name)
            .map(|index| ColumnId {
                index,
                name: name.to_string(),
            })
            .ok_or_else(|| RollerError::UnknownColumn(name.to_string()))
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    fn values_of(&self, column: &ColumnId) -> Result<&[String]> {
        match (self.names.get(column.index), self.columns.get(column.index)) {
            (Some(name), Some(values)) if *name == column.name => Ok(values),
            _ => Err(RollerError::UnknownColumn(column.name.clone())),
        }
    }

    /// Distinct values of `column` over the rows that match every filter,
    /// sorted lexicographically. Recomputed on each call.
    pub fn visible_values(&self, column: &ColumnId, filters: &FilterSet) -> Result<Vec<String>> {
        let target = self.values_of(column)?;
        let constraints = filters
            .iter()
            .map(|(filter_column, wanted)| Ok((self.values_of(filter_column)?, wanted)))
            .collect::<Result<Vec<_>>>()?;

        let visible: BTreeSet<&str> = (0..self.row_count)
            .filter(|&row| {
                constraints
                    .iter()
                    .all(|(values, wanted)| values[row] == **wanted)
            })
            .map(|row| target[row].as_str())
            .collect();

        tracing::debug!(
            column = column.name(),
            filters = filters.len(),
            visible = visible.len(),
            "computed visible values"
        );

        Ok(visible.into_iter().map(str::to_string).collect())
    }
}

/// Category selections in hierarchy order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    entries: Vec<(ColumnId, String)>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy with `column` set to `value`, replacing any earlier
    /// selection for the same column in place.
    pub fn with(&self, column: ColumnId, value: impl Into<String>) -> Self {
        let value = value.into();
        let mut entries = self.entries.clone();
        match entries.iter_mut().find(|(existing, _)| *existing == column) {
            Some(entry) => entry.1 = value,
            None => entries.push((column, value)),
        }
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ColumnId, &String)> {
        self.entries.iter().map(|(column, value)| (column, value))
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, value)| value.as_str())
    }

    /// Returns a copy without the most recent selection.
    pub fn without_last(&self) -> Self {
        let mut entries = self.entries.clone();
        entries.pop();
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

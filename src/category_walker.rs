// category_walker.rs
use crate::error::{Result, RollerError};
use crate::table_view::{ColumnId, FilterSet, Table};
use regex::Regex;

/// Position in the category hierarchy plus the selections made so far.
///
/// `level` is the index of the category waiting to be chosen, which is also
/// the number of selections already made. Every method that changes the
/// position returns a new walker.
#[derive(Debug, Clone)]
pub struct CategoryWalker<'t> {
    table: &'t Table,
    categories: Vec<ColumnId>,
    sentinel: String,
    level: usize,
    filters: FilterSet,
}

impl<'t> CategoryWalker<'t> {
    /// Picks the category columns out of the table headers and orders them by
    /// the level number in their name. Headers without a number keep their
    /// sheet order after the numbered ones.
    pub fn from_table(table: &'t Table, pattern: &Regex, sentinel: impl Into<String>) -> Result<Self> {
        let level_number = Regex::new(r"\d+")?;

        let mut numbered: Vec<(u64, usize, &str)> = table
            .column_names()
            .enumerate()
            .filter(|(_, name)| pattern.is_match(name))
            .map(|(position, name)| {
                let level = level_number
                    .find(name)
                    .and_then(|m| m.as_str().parse::<u64>().ok())
                    .unwrap_or(u64::MAX);
                (level, position, name)
            })
            .collect();
        numbered.sort();

        if numbered.is_empty() {
            return Err(RollerError::NoCategories);
        }

        let categories = numbered
            .into_iter()
            .map(|(_, _, name)| table.column(name))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            categories = ?categories.iter().map(ColumnId::name).collect::<Vec<_>>(),
            "derived category levels"
        );

        Ok(Self {
            table,
            categories,
            sentinel: sentinel.into(),
            level: 0,
            filters: FilterSet::new(),
        })
    }

    pub fn table(&self) -> &'t Table {
        self.table
    }

    pub fn categories(&self) -> &[ColumnId] {
        &self.categories
    }

    pub fn current_level(&self) -> usize {
        self.level
    }

    pub fn current_column(&self) -> Option<&ColumnId> {
        self.categories.get(self.level)
    }

    pub fn at_final_level(&self) -> bool {
        self.level + 1 == self.categories.len()
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    /// The values a user may pick at the current level. An empty set means
    /// the sheet has a category column with no rows under the parent
    /// selections.
    pub fn visible_choices_for_current_level(&self) -> Result<Vec<String>> {
        let column = self.current_column().ok_or_else(|| {
            RollerError::UnknownColumn(format!("category level {}", self.level + 1))
        })?;

        let choices = self.table.visible_values(column, &self.filters)?;
        if choices.is_empty() {
            return Err(self.no_rows(column));
        }
        Ok(choices)
    }

    /// Whether there is a level worth offering below the selections made so
    /// far: it must exist and must not hold only the skip sentinel.
    pub fn has_next_level(&self) -> Result<bool> {
        let Some(column) = self.current_column() else {
            return Ok(false);
        };

        let choices = self.table.visible_values(column, &self.filters)?;
        match choices.as_slice() {
            [] => Err(self.no_rows(column)),
            [only] if *only == self.sentinel => Ok(false),
            _ => Ok(true),
        }
    }

    /// Records `value` for the current level and moves one level down.
    pub fn apply_choice(&self, value: impl Into<String>) -> Result<Self> {
        let column = self.current_column().cloned().ok_or_else(|| {
            RollerError::UnknownColumn(format!("category level {}", self.level + 1))
        })?;

        Ok(Self {
            filters: self.filters.with(column, value),
            level: self.level + 1,
            ..self.clone()
        })
    }

    /// Undoes the most recent choice. At the top level this is a no-op.
    pub fn back(&self) -> Self {
        Self {
            filters: self.filters.without_last(),
            level: self.level.saturating_sub(1),
            ..self.clone()
        }
    }

    pub fn reset(&self) -> Self {
        Self {
            filters: FilterSet::new(),
            level: 0,
            ..self.clone()
        }
    }

    fn no_rows(&self, column: &ColumnId) -> RollerError {
        let path: Vec<&str> = self.filters.values().collect();
        RollerError::MalformedSource(format!(
            "column '{}' is provided but has 0 rows under [{}]",
            column.name(),
            path.join(", ")
        ))
    }
}

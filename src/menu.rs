// menu.rs
use crate::error::{Result, RollerError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry<D> {
    pub key: String,
    pub label: String,
    pub decision: D,
}

/// A closed set of keyed choices offered at one suspension point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Menu<D> {
    title: String,
    entries: Vec<MenuEntry<D>>,
    break_at: Option<usize>,
}

impl<D> Menu<D> {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            entries: Vec::new(),
            break_at: None,
        }
    }

    pub fn entry(mut self, key: impl Into<String>, label: impl Into<String>, decision: D) -> Self {
        self.entries.push(MenuEntry {
            key: key.into(),
            label: label.into(),
            decision,
        });
        self
    }

    /// Numbers `values` from 1, each mapped to a decision.
    pub fn numbered<F>(mut self, values: &[String], to_decision: F) -> Self
    where
        F: Fn(&str) -> D,
    {
        for (index, value) in values.iter().enumerate() {
            self = self.entry((index + 1).to_string(), value.clone(), to_decision(value));
        }
        self
    }

    /// Visual gap before the next entry. Only rendered when something
    /// precedes it.
    pub fn gap(mut self) -> Self {
        if !self.entries.is_empty() {
            self.break_at = Some(self.entries.len());
        }
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn entries(&self) -> &[MenuEntry<D>] {
        &self.entries
    }

    pub fn break_at(&self) -> Option<usize> {
        self.break_at
    }

    pub fn find(&self, key: &str) -> Option<&MenuEntry<D>> {
        self.entries
            .iter()
            .find(|entry| entry.key.eq_ignore_ascii_case(key.trim()))
    }
}

/// Whatever asks the user. `select` must hand back one of the menu's own
/// entries, retrying internally on bad input.
pub trait PromptProvider {
    fn select<'m, D>(&mut self, menu: &'m Menu<D>) -> Result<&'m MenuEntry<D>>;

    fn show_roll(&mut self, rolled: &str);

    fn report(&mut self, problem: &RollerError);

    fn show_restart(&mut self);
}

//! Label/value reduction for product description blocks.
//!
//! Description blocks are loosely structured: the label set and order vary by
//! product, groups can have different numbers of values, and the markup leaves
//! blank lines between values. [`DescriptionTable::from_entries`] folds the
//! raw entries into label groups with a small state machine:
//!
//! - a non-blank label starts a new active group (resetting any carried value);
//! - an entry with a blank label continues the active group;
//! - a blank value repeats the active group's most recent non-blank value, and
//!   is dropped when the group has none yet.
//!
//! [`DescriptionTable::rows`] then lines groups up row by row, forward-filling
//! shorter groups with their last value.

use crate::page::DescriptionEntry;

/// A label group with its forward-filled values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelGroup {
    pub label: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptionTable {
    groups: Vec<LabelGroup>,
}

/// Folding state: the group currently receiving values.
#[derive(Default)]
struct FillState {
    active: Option<LabelGroup>,
    last_value: Option<String>,
}

impl FillState {
    fn start_group(&mut self, label: &str, done: &mut Vec<LabelGroup>) {
        if let Some(group) = self.active.take() {
            done.push(group);
        }
        self.active = Some(LabelGroup {
            label: label.to_owned(),
            values: Vec::new(),
        });
        self.last_value = None;
    }

    fn push_value(&mut self, value: &str) {
        let Some(group) = self.active.as_mut() else {
            return;
        };
        if value.is_empty() {
            if let Some(previous) = &self.last_value {
                group.values.push(previous.clone());
            }
        } else {
            group.values.push(value.to_owned());
            self.last_value = Some(value.to_owned());
        }
    }
}

impl DescriptionTable {
    #[must_use]
    pub fn from_entries(entries: &[DescriptionEntry]) -> Self {
        let mut groups = Vec::new();
        let mut state = FillState::default();

        for entry in entries {
            let label = entry.label.trim();
            if !label.is_empty() {
                state.start_group(label, &mut groups);
            }
            for value in &entry.values {
                state.push_value(value.trim());
            }
        }
        if let Some(group) = state.active.take() {
            groups.push(group);
        }

        // Groups that never received a value carry no information.
        groups.retain(|g| !g.values.is_empty());
        Self { groups }
    }

    #[must_use]
    pub fn groups(&self) -> &[LabelGroup] {
        &self.groups
    }

    /// Finds a group by label, ignoring ASCII case.
    #[must_use]
    pub fn group(&self, label: &str) -> Option<&LabelGroup> {
        self.groups
            .iter()
            .find(|g| g.label.eq_ignore_ascii_case(label))
    }

    /// Lines groups up into rows. Row `i` holds each group's `i`-th value, or
    /// its last value when the group is shorter.
    #[must_use]
    pub fn rows(&self) -> Vec<DescriptionRow<'_>> {
        let height = self.groups.iter().map(|g| g.values.len()).max().unwrap_or(0);
        (0..height)
            .map(|i| DescriptionRow {
                table: self,
                index: i,
            })
            .collect()
    }
}

/// One forward-filled row of a [`DescriptionTable`].
#[derive(Debug, Clone, Copy)]
pub struct DescriptionRow<'a> {
    table: &'a DescriptionTable,
    index: usize,
}

impl<'a> DescriptionRow<'a> {
    /// Value of the group labelled `label` (ASCII case-insensitive) in this row.
    #[must_use]
    pub fn get(&self, label: &str) -> Option<&'a str> {
        let group = self.table.group(label)?;
        group
            .values
            .get(self.index)
            .or_else(|| group.values.last())
            .map(String::as_str)
    }
}

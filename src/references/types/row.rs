//! Rows that carry a page reference
//!
//! Advantages, skills, spells and equipment rows all have a free-form
//! reference field. Anything implementing [`HasSourceReference`] can be the
//! target of the open-page-reference commands.

use serde::{Deserialize, Serialize};

use super::citation::split_citation_list;

/// A row with a page reference field.
pub trait HasSourceReference {
    /// The raw reference field, e.g. `"B102, CI45"`.
    fn reference(&self) -> &str;

    /// Text to highlight on the page once it is shown (usually the row name).
    fn reference_highlight(&self) -> Option<&str> {
        None
    }

    /// The row's citations, split and trimmed.
    fn references(&self) -> Vec<String> {
        split_citation_list(self.reference())
    }
}

/// Which list a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowKind {
    Advantage,
    Skill,
    Spell,
    Equipment,
    #[default]
    Other,
}

/// A named row with a reference field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceRow {
    #[serde(default)]
    pub kind: RowKind,
    pub name: String,
    #[serde(default)]
    pub reference: String,
}

impl ReferenceRow {
    pub fn new(kind: RowKind, name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            reference: reference.into(),
        }
    }
}

impl HasSourceReference for ReferenceRow {
    fn reference(&self) -> &str {
        &self.reference
    }

    fn reference_highlight(&self) -> Option<&str> {
        let name = self.name.trim();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }
}

/// The command target for a selection: only a single selected row counts.
pub fn command_target<'a, T>(selection: &'a [T]) -> Option<&'a T>
where
    T: HasSourceReference,
{
    match selection {
        [only] => Some(only),
        _ => None,
    }
}

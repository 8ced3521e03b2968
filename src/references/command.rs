//! "Open Page Reference" commands
//!
//! Two variants share the resolver pipeline:
//! - [`OpenMode::First`] opens only the first well-formed citation of the
//!   target row; if none is well formed, the first citation is tried and
//!   reported as skipped.
//! - [`OpenMode::Each`] opens every citation, last to first, so the first
//!   citation is shown last and ends up in front.

use tracing::debug;

use super::resolver::{ReferenceResolver, Resolution, SkipReason};
use super::types::{Citation, HasSourceReference};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    First,
    Each,
}

/// Outcome of running a command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenReport {
    /// Shown citations, in the order they were opened.
    pub opened: Vec<Resolution>,
    /// Skipped citations with the reason, in the order they were tried.
    pub skipped: Vec<(String, SkipReason)>,
}

impl OpenReport {
    pub fn is_empty(&self) -> bool {
        self.opened.is_empty() && self.skipped.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenPageReferenceCommand {
    mode: OpenMode,
}

impl OpenPageReferenceCommand {
    pub const OPEN_ONE: OpenPageReferenceCommand = OpenPageReferenceCommand {
        mode: OpenMode::First,
    };
    pub const OPEN_EACH: OpenPageReferenceCommand = OpenPageReferenceCommand {
        mode: OpenMode::Each,
    };

    pub fn new(mode: OpenMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    pub fn title(&self) -> &'static str {
        match self.mode {
            OpenMode::First => "Open Page Reference",
            OpenMode::Each => "Open Each Page Reference",
        }
    }

    pub fn command_id(&self) -> &'static str {
        match self.mode {
            OpenMode::First => "OpenPageReference",
            OpenMode::Each => "OpenEachPageReferences",
        }
    }

    /// Enabled when there is a target with at least one citation.
    ///
    /// Citations need not be well formed to enable the command.
    pub fn is_enabled(&self, target: Option<&dyn HasSourceReference>) -> bool {
        target.is_some_and(|t| !t.references().is_empty())
    }

    /// Run the command against `target`.
    pub fn perform(
        &self,
        target: Option<&dyn HasSourceReference>,
        resolver: &mut ReferenceResolver<'_>,
    ) -> OpenReport {
        let mut report = OpenReport::default();
        let Some(target) = target else {
            return report;
        };

        let references = target.references();
        if references.is_empty() {
            return report;
        }

        let highlight = target.reference_highlight();
        let selected: Vec<&String> = match self.mode {
            OpenMode::First => references
                .iter()
                .find(|c| Citation::parse(c).is_ok())
                .or_else(|| references.first())
                .into_iter()
                .collect(),
            OpenMode::Each => references.iter().rev().collect(),
        };

        for citation in selected {
            match resolver.resolve(citation, highlight) {
                Ok(resolution) => report.opened.push(resolution),
                Err(reason) => report.skipped.push((citation.clone(), reason)),
            }
        }

        debug!(
            "{}: opened {}, skipped {}",
            self.command_id(),
            report.opened.len(),
            report.skipped.len()
        );
        report
    }
}

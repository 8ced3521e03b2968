//! SheetRefs
//!
//! Resolves the rulebook page references stored on character sheet and library
//! rows (for example `"B102, CI45"`) to PDF files and pages.

pub mod references;

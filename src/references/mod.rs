//! Page reference resolution
//!
//! This module is organized into submodules:
//! - `types` - Citations, the source registry, reference rows and settings
//! - `dialog` - File-selection collaborator used to locate unknown sources
//! - `viewer` - Page viewer backends and per-path viewer sessions
//! - `resolver` - Citation -> file -> viewer dispatch
//! - `command` - "Open Page Reference" / "Open Each Page Reference" commands

pub mod command;
pub mod dialog;
pub mod resolver;
pub mod types;
pub mod viewer;

pub use command::*;
pub use dialog::*;
pub use resolver::*;
pub use types::*;
pub use viewer::*;

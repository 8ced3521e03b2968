//! Type definitions for page reference resolution
//!
//! - `citation` - Reference list splitting and `<prefix><page>` parsing
//! - `registry` - Prefix -> PDF file mappings (memory, JSON file, SQLite)
//! - `row` - Rows that carry a source reference, and selection targeting
//! - `settings` - Application settings and persistence

pub mod citation;
pub mod registry;
pub mod row;
pub mod settings;

// Re-export all public types for convenient access
pub use citation::*;
pub use registry::*;
pub use row::*;
pub use settings::*;

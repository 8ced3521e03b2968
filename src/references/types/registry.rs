//! Source registry
//!
//! Maps a citation prefix (e.g. `B`) to the PDF file that holds that source.
//! Entries are created the first time a prefix is resolved and reused from
//! then on; nothing here deletes an entry unless asked to explicitly.
//!
//! Three stores are provided:
//! - [`MemorySourceRegistry`] - process-local, nothing persisted
//! - [`JsonSourceRegistry`] - a pretty-printed JSON map on disk
//! - [`SqliteSourceRegistry`] - a `source_refs` table in a SQLite database

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// A registered source: the prefix, its file, and a page offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub id: String,
    pub path: PathBuf,
    /// Added to printed page numbers to get the PDF page.
    ///
    /// Books whose front matter is unnumbered need a positive offset.
    #[serde(default)]
    pub page_offset: i32,
}

impl SourceRef {
    pub fn new(id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            page_offset: 0,
        }
    }

    pub fn with_page_offset(mut self, page_offset: i32) -> Self {
        self.page_offset = page_offset;
        self
    }

    /// The 1-based PDF page for a printed page number.
    pub fn page_index(&self, page: u32) -> u32 {
        let index = i64::from(page) + i64::from(self.page_offset);
        index.clamp(1, i64::from(u32::MAX)) as u32
    }
}

/// Storage for prefix -> file mappings.
pub trait SourceRegistry {
    /// Look up the entry registered for `id`.
    fn get(&self, id: &str) -> Result<Option<SourceRef>, String>;

    /// Insert or replace the entry for `entry.id`.
    fn put(&mut self, entry: SourceRef) -> Result<(), String>;

    /// Remove the entry for `id`, returning whether one existed.
    fn remove(&mut self, id: &str) -> Result<bool, String>;

    /// All entries, ordered by prefix.
    fn entries(&self) -> Result<Vec<SourceRef>, String>;
}

/// Look up `id`, optionally treating entries whose file is gone as absent.
///
/// Read failures are logged and reported as absent so the caller can fall
/// back to asking the user for the file.
pub fn lookup_source(
    registry: &dyn SourceRegistry,
    id: &str,
    require_existence: bool,
) -> Option<SourceRef> {
    let entry = match registry.get(id) {
        Ok(entry) => entry?,
        Err(e) => {
            warn!("Failed to read source registry entry for {:?}: {}", id, e);
            return None;
        }
    };

    if require_existence && !entry.path.is_file() {
        debug!(
            "Registered file for prefix {:?} no longer exists: {:?}",
            id, entry.path
        );
        return None;
    }

    Some(entry)
}

// ============================================================================
// In-memory registry
// ============================================================================

#[derive(Debug, Default, Clone)]
pub struct MemorySourceRegistry {
    entries: BTreeMap<String, SourceRef>,
}

impl MemorySourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SourceRegistry for MemorySourceRegistry {
    fn get(&self, id: &str) -> Result<Option<SourceRef>, String> {
        Ok(self.entries.get(id).cloned())
    }

    fn put(&mut self, entry: SourceRef) -> Result<(), String> {
        self.entries.insert(entry.id.clone(), entry);
        Ok(())
    }

    fn remove(&mut self, id: &str) -> Result<bool, String> {
        Ok(self.entries.remove(id).is_some())
    }

    fn entries(&self) -> Result<Vec<SourceRef>, String> {
        Ok(self.entries.values().cloned().collect())
    }
}

// ============================================================================
// JSON file registry
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSourceRef {
    path: PathBuf,
    #[serde(default)]
    page_offset: i32,
}

/// Registry persisted as a JSON object keyed by prefix.
///
/// The whole file is rewritten after every change.
#[derive(Debug)]
pub struct JsonSourceRegistry {
    path: PathBuf,
    entries: BTreeMap<String, SourceRef>,
}

impl JsonSourceRegistry {
    /// Open the registry at `path`; a missing file is an empty registry.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, String> {
        let path = path.into();
        let mut entries = BTreeMap::new();

        if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| format!("Failed to read source registry {:?}: {}", path, e))?;
            if !text.trim().is_empty() {
                let stored: BTreeMap<String, StoredSourceRef> = serde_json::from_str(&text)
                    .map_err(|e| format!("Failed to parse source registry {:?}: {}", path, e))?;
                for (id, s) in stored {
                    entries.insert(
                        id.clone(),
                        SourceRef {
                            id,
                            path: s.path,
                            page_offset: s.page_offset,
                        },
                    );
                }
            }
        }

        debug!("Loaded {} source(s) from {:?}", entries.len(), path);
        Ok(Self { path, entries })
    }

    fn save(&self) -> Result<(), String> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    format!("Failed to create registry directory {:?}: {}", parent, e)
                })?;
            }
        }

        let stored: BTreeMap<&str, StoredSourceRef> = self
            .entries
            .iter()
            .map(|(id, r)| {
                (
                    id.as_str(),
                    StoredSourceRef {
                        path: r.path.clone(),
                        page_offset: r.page_offset,
                    },
                )
            })
            .collect();
        let json = serde_json::to_string_pretty(&stored)
            .map_err(|e| format!("Failed to serialize source registry: {}", e))?;

        // Write a sibling file, then rename over the target.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .map_err(|e| format!("Failed to write source registry {:?}: {}", tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| {
            format!(
                "Failed to move source registry {:?} -> {:?}: {}",
                tmp, self.path, e
            )
        })?;
        Ok(())
    }
}

impl SourceRegistry for JsonSourceRegistry {
    fn get(&self, id: &str) -> Result<Option<SourceRef>, String> {
        Ok(self.entries.get(id).cloned())
    }

    fn put(&mut self, entry: SourceRef) -> Result<(), String> {
        let id = entry.id.clone();
        let previous = self.entries.insert(id.clone(), entry);
        if let Err(e) = self.save() {
            // Keep memory and disk in agreement.
            match previous {
                Some(prev) => self.entries.insert(id, prev),
                None => self.entries.remove(&id),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove(&mut self, id: &str) -> Result<bool, String> {
        let Some(removed) = self.entries.remove(id) else {
            return Ok(false);
        };
        if let Err(e) = self.save() {
            self.entries.insert(removed.id.clone(), removed);
            return Err(e);
        }
        Ok(true)
    }

    fn entries(&self) -> Result<Vec<SourceRef>, String> {
        Ok(self.entries.values().cloned().collect())
    }
}

// ============================================================================
// SQLite registry
// ============================================================================

/// Registry stored in a `source_refs` SQLite table.
pub struct SqliteSourceRegistry {
    conn: rusqlite::Connection,
}

impl SqliteSourceRegistry {
    /// Open or create the database at `path`.
    pub fn open(path: &Path) -> Result<Self, String> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    format!("Failed to create registry directory {:?}: {}", parent, e)
                })?;
            }
        }
        let conn = rusqlite::Connection::open(path)
            .map_err(|e| format!("Failed to open SQLite registry {:?}: {}", path, e))?;
        Self::init(conn)
    }

    /// Open a fresh in-memory database (useful for tests).
    pub fn open_in_memory() -> Result<Self, String> {
        let conn = rusqlite::Connection::open_in_memory()
            .map_err(|e| format!("Failed to open in-memory SQLite registry: {}", e))?;
        Self::init(conn)
    }

    fn init(conn: rusqlite::Connection) -> Result<Self, String> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS source_refs (
                id TEXT PRIMARY KEY NOT NULL,
                path TEXT NOT NULL,
                page_offset INTEGER NOT NULL DEFAULT 0
            );",
        )
        .map_err(|e| format!("Failed to initialize source_refs table: {}", e))?;
        Ok(Self { conn })
    }
}

impl SourceRegistry for SqliteSourceRegistry {
    fn get(&self, id: &str) -> Result<Option<SourceRef>, String> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, path, page_offset FROM source_refs WHERE id = ?1")
            .map_err(|e| format!("Failed to prepare source lookup: {}", e))?;

        let mut rows = stmt
            .query([id])
            .map_err(|e| format!("Failed to query source {:?}: {}", id, e))?;

        let entry = match rows
            .next()
            .map_err(|e| format!("Failed to read source {:?}: {}", id, e))?
        {
            Some(row) => Some(row_to_source_ref(row)?),
            None => None,
        };
        Ok(entry)
    }

    fn put(&mut self, entry: SourceRef) -> Result<(), String> {
        self.conn
            .execute(
                "INSERT INTO source_refs (id, path, page_offset) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET path = excluded.path, page_offset = excluded.page_offset",
                rusqlite::params![
                    entry.id,
                    entry.path.to_string_lossy().to_string(),
                    entry.page_offset
                ],
            )
            .map_err(|e| format!("Failed to store source {:?}: {}", entry.id, e))?;
        Ok(())
    }

    fn remove(&mut self, id: &str) -> Result<bool, String> {
        let changed = self
            .conn
            .execute("DELETE FROM source_refs WHERE id = ?1", [id])
            .map_err(|e| format!("Failed to remove source {:?}: {}", id, e))?;
        Ok(changed > 0)
    }

    fn entries(&self) -> Result<Vec<SourceRef>, String> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, path, page_offset FROM source_refs ORDER BY id")
            .map_err(|e| format!("Failed to prepare source listing: {}", e))?;

        let mut rows = stmt
            .query([])
            .map_err(|e| format!("Failed to list sources: {}", e))?;

        let mut out = Vec::new();
        while let Some(row) = rows
            .next()
            .map_err(|e| format!("Failed to iterate sources: {}", e))?
        {
            out.push(row_to_source_ref(row)?);
        }
        Ok(out)
    }
}

fn row_to_source_ref(row: &rusqlite::Row<'_>) -> Result<SourceRef, String> {
    let id: String = row
        .get(0)
        .map_err(|e| format!("Failed to decode source id: {}", e))?;
    let path: String = row
        .get(1)
        .map_err(|e| format!("Failed to decode path for source {:?}: {}", id, e))?;
    let page_offset: i32 = row
        .get(2)
        .map_err(|e| format!("Failed to decode page offset for source {:?}: {}", id, e))?;
    Ok(SourceRef {
        id,
        path: PathBuf::from(path),
        page_offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_index_applies_offset() {
        let r = SourceRef::new("B", "/books/basic.pdf").with_page_offset(2);
        assert_eq!(r.page_index(102), 104);
    }

    #[test]
    fn test_page_index_clamps_to_first_page() {
        let r = SourceRef::new("B", "/books/basic.pdf").with_page_offset(-10);
        assert_eq!(r.page_index(3), 1);
        assert_eq!(SourceRef::new("B", "x.pdf").page_index(0), 1);
    }
}

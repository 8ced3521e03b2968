//! Page viewer sessions
//!
//! At most one viewer session exists per file. Showing a page in a file that
//! already has a session reuses it and brings it to the front; otherwise a new
//! session is opened. Sessions are keyed by normalized path.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::process::{Child, Command};
use tracing::{debug, info, warn};

pub type SessionId = u64;

/// State of one open view onto a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerSession {
    pub id: SessionId,
    pub path: PathBuf,
    pub page: u32,
    pub highlight: Option<String>,
}

/// The component that actually displays pages.
///
/// Each call receives the session with its target state already applied.
pub trait PageViewer {
    /// Open a new view of `session.path` at `session.page`.
    fn open(&mut self, session: &ViewerSession) -> Result<(), String>;

    /// Move an existing view to `session.page` and apply `session.highlight`.
    fn go_to_page(&mut self, session: &ViewerSession) -> Result<(), String>;

    /// Make the view the visible/focused one.
    fn bring_to_front(&mut self, session: &ViewerSession) -> Result<(), String>;
}

/// Result of [`ViewerSessions::show`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShowOutcome {
    pub session: SessionId,
    /// An existing session was reused.
    pub reused: bool,
    /// The backend was asked to open or move.
    pub navigated: bool,
}

/// Normalize a path for use as a session key.
///
/// Uses the canonical path when the file exists, otherwise folds `.` and `..`
/// components lexically.
pub fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(canonical) = std::fs::canonicalize(path) {
        return canonical;
    }

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Path -> session map in front of a [`PageViewer`] backend.
pub struct ViewerSessions {
    backend: Box<dyn PageViewer>,
    sessions: HashMap<PathBuf, ViewerSession>,
    front: Option<PathBuf>,
    next_id: SessionId,
}

impl ViewerSessions {
    pub fn new(backend: impl PageViewer + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            sessions: HashMap::new(),
            front: None,
            next_id: 1,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn find_session(&self, path: &Path) -> Option<&ViewerSession> {
        self.sessions.get(&normalize_path(path))
    }

    /// The most recently shown session.
    pub fn front(&self) -> Option<&ViewerSession> {
        self.front.as_ref().and_then(|p| self.sessions.get(p))
    }

    /// Show `page` of `path`, reusing the file's session if there is one.
    ///
    /// Showing the same page and highlight again does not navigate.
    pub fn show(
        &mut self,
        path: &Path,
        page: u32,
        highlight: Option<&str>,
    ) -> Result<ShowOutcome, String> {
        let key = normalize_path(path);

        if let Some(session) = self.sessions.get_mut(&key) {
            let same_view = session.page == page && session.highlight.as_deref() == highlight;
            let mut navigated = false;

            if !same_view {
                let previous = (session.page, session.highlight.clone());
                session.page = page;
                session.highlight = highlight.map(str::to_string);
                if let Err(e) = self.backend.go_to_page(session) {
                    session.page = previous.0;
                    session.highlight = previous.1;
                    return Err(e);
                }
                navigated = true;
            }

            if let Err(e) = self.backend.bring_to_front(session) {
                warn!("Failed to bring viewer for {:?} to front: {}", key, e);
            }

            let id = session.id;
            debug!(
                "Reused viewer session {} for {:?} at page {}",
                id, key, page
            );
            self.front = Some(key);
            return Ok(ShowOutcome {
                session: id,
                reused: true,
                navigated,
            });
        }

        let session = ViewerSession {
            id: self.next_id,
            path: key.clone(),
            page,
            highlight: highlight.map(str::to_string),
        };
        self.backend.open(&session)?;
        self.next_id += 1;

        info!(
            "Opened viewer session {} for {:?} at page {}",
            session.id, key, page
        );
        let id = session.id;
        self.sessions.insert(key.clone(), session);
        self.front = Some(key);

        Ok(ShowOutcome {
            session: id,
            reused: false,
            navigated: true,
        })
    }
}

// ============================================================================
// External program viewer
// ============================================================================

/// Launches an external program for each open or page change.
///
/// The argv template substitutes `{path}`, `{page}` and `{highlight}`; e.g.
/// `["okular", "--unique", "-p", "{page}", "{path}"]`. A page change relaunches
/// the program, so it should be one that reuses its window for a file it
/// already shows. Templates without `{page}` (the platform openers) can only
/// open the file; page changes are then not relaunched.
#[derive(Debug)]
pub struct CommandViewer {
    argv: Vec<String>,
    children: Vec<Child>,
}

impl CommandViewer {
    pub fn new(argv: Vec<String>) -> Self {
        let viewer = Self {
            argv,
            children: Vec::new(),
        };
        if !viewer.supports_pages() {
            warn!(
                "Viewer command {:?} has no {{page}} placeholder; files open at their first page",
                viewer.argv
            );
        }
        viewer
    }

    /// Whether the template passes the page number to the program.
    pub fn supports_pages(&self) -> bool {
        self.argv.iter().any(|arg| arg.contains("{page}"))
    }

    /// The argv that would be run for `session`.
    pub fn command_line(&self, session: &ViewerSession) -> Vec<String> {
        let path = session.path.to_string_lossy();
        let page = session.page.to_string();
        let highlight = session.highlight.as_deref().unwrap_or("");

        self.argv
            .iter()
            .map(|arg| {
                arg.replace("{path}", &path)
                    .replace("{page}", &page)
                    .replace("{highlight}", highlight)
            })
            .collect()
    }

    /// Drop handles of viewers that have exited so they are waited on.
    fn reap(&mut self) {
        self.children
            .retain_mut(|child| !matches!(child.try_wait(), Ok(Some(_))));
    }

    fn launch(&mut self, session: &ViewerSession) -> Result<(), String> {
        self.reap();

        let argv = self.command_line(session);
        let Some((program, args)) = argv.split_first() else {
            return Err("No viewer command configured".to_string());
        };

        debug!("Launching viewer: {:?}", argv);
        let child = Command::new(program)
            .args(args)
            .spawn()
            .map_err(|e| format!("Failed to launch viewer {:?}: {}", program, e))?;
        self.children.push(child);
        Ok(())
    }
}

impl PageViewer for CommandViewer {
    fn open(&mut self, session: &ViewerSession) -> Result<(), String> {
        self.launch(session)
    }

    fn go_to_page(&mut self, session: &ViewerSession) -> Result<(), String> {
        if !self.supports_pages() {
            debug!(
                "Viewer for {:?} cannot change pages; leaving it as is",
                session.path
            );
            return Ok(());
        }
        self.launch(session)
    }

    fn bring_to_front(&mut self, session: &ViewerSession) -> Result<(), String> {
        // The external program owns its windows.
        debug!("Viewer for {:?} is external; not raising", session.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_folds_dot_components() {
        let p = normalize_path(Path::new("/no/such/dir/./books/../books/basic.pdf"));
        assert_eq!(p, PathBuf::from("/no/such/dir/books/basic.pdf"));
    }

    #[test]
    fn test_command_line_substitution() {
        let viewer = CommandViewer::new(vec![
            "zathura".to_string(),
            "--page={page}".to_string(),
            "--find={highlight}".to_string(),
            "{path}".to_string(),
        ]);
        let session = ViewerSession {
            id: 1,
            path: PathBuf::from("/books/basic.pdf"),
            page: 102,
            highlight: Some("Stealth".to_string()),
        };
        assert_eq!(
            viewer.command_line(&session),
            vec!["zathura", "--page=102", "--find=Stealth", "/books/basic.pdf"]
        );
    }

    #[test]
    fn test_default_command_passes_page_or_is_flagged() {
        let settings = crate::references::ResolverSettings::default();
        let viewer = CommandViewer::new(settings.viewer_command);
        let session = ViewerSession {
            id: 1,
            path: PathBuf::from("/books/basic.pdf"),
            page: 102,
            highlight: None,
        };
        let argv = viewer.command_line(&session);
        assert!(argv.iter().any(|a| a.contains("102")) || !viewer.supports_pages());
    }

    #[test]
    fn test_pageless_command_does_not_relaunch_on_page_change() {
        let mut viewer = CommandViewer::new(vec![
            "sheetrefs-missing-viewer".to_string(),
            "{path}".to_string(),
        ]);
        assert!(!viewer.supports_pages());

        let session = ViewerSession {
            id: 1,
            path: PathBuf::from("/books/basic.pdf"),
            page: 40,
            highlight: None,
        };
        // Launching would fail, so Ok means nothing was started.
        assert!(viewer.go_to_page(&session).is_ok());
        assert!(viewer.children.is_empty());
        assert!(viewer.open(&session).is_err());
    }

    #[test]
    fn test_page_command_relaunches_on_page_change() {
        let mut viewer = CommandViewer::new(vec![
            "sheetrefs-missing-viewer".to_string(),
            "--page={page}".to_string(),
            "{path}".to_string(),
        ]);
        assert!(viewer.supports_pages());

        let session = ViewerSession {
            id: 1,
            path: PathBuf::from("/books/basic.pdf"),
            page: 40,
            highlight: None,
        };
        assert!(viewer.go_to_page(&session).is_err());
    }

    #[test]
    fn test_empty_command_is_an_error() {
        let mut viewer = CommandViewer::new(Vec::new());
        let session = ViewerSession {
            id: 1,
            path: PathBuf::from("/books/basic.pdf"),
            page: 1,
            highlight: None,
        };
        assert!(viewer.open(&session).is_err());
    }
}

//! Citation resolution
//!
//! Turns one citation string into a page shown in a viewer:
//! split the citation, find (or ask for) the file registered for its prefix,
//! then show the page through [`ViewerSessions`].
//!
//! Every failure is per citation and reported as a [`SkipReason`]; nothing
//! here aborts a batch.

use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::dialog::{locate_prompt, FileLocator};
use super::types::{
    lookup_source, Citation, FileFilterSetting, MalformedCitation, ResolverSettings, SourceRef,
    SourceRegistry,
};
use super::viewer::{SessionId, ViewerSessions};

/// Why a citation was not opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The citation is not `<prefix><page>`.
    Malformed(MalformedCitation),
    /// No file is registered for the prefix and the user cancelled the dialog.
    Cancelled { prefix: String },
    /// There is no viewer to show the page in.
    NoViewer,
    /// The viewer failed to open or navigate.
    Viewer(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(e) => write!(f, "{}", e),
            Self::Cancelled { prefix } => write!(f, "no file located for prefix \"{}\"", prefix),
            Self::NoViewer => write!(f, "no page viewer available"),
            Self::Viewer(e) => write!(f, "viewer error: {}", e),
        }
    }
}

/// A citation that was shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub citation: Citation,
    pub path: PathBuf,
    /// PDF page after the source's page offset.
    pub page: u32,
    pub session: SessionId,
    /// The viewer session already existed.
    pub reused: bool,
    /// The viewer was asked to open or move; false when it already showed
    /// this page and highlight.
    pub navigated: bool,
    /// The located file was stored in the registry during this resolution.
    pub registered: bool,
}

/// Resolves citations against a registry, asking a locator for unknown
/// prefixes, and shows them in a set of viewer sessions.
pub struct ReferenceResolver<'a> {
    registry: &'a mut dyn SourceRegistry,
    locator: &'a mut dyn FileLocator,
    sessions: Option<&'a mut ViewerSessions>,
    filter: FileFilterSetting,
    require_existing_files: bool,
}

impl<'a> ReferenceResolver<'a> {
    pub fn new(
        registry: &'a mut dyn SourceRegistry,
        locator: &'a mut dyn FileLocator,
        sessions: Option<&'a mut ViewerSessions>,
    ) -> Self {
        Self {
            registry,
            locator,
            sessions,
            filter: FileFilterSetting::default(),
            require_existing_files: true,
        }
    }

    /// Apply the file filter and existence policy from `settings`.
    pub fn with_settings(mut self, settings: &ResolverSettings) -> Self {
        self.filter = settings.file_filter.clone();
        self.require_existing_files = settings.require_existing_files;
        self
    }

    pub fn require_existing_files(mut self, require: bool) -> Self {
        self.require_existing_files = require;
        self
    }

    /// Find the registered source for `prefix`, asking the user if needed.
    ///
    /// A located file is registered before it is returned; the flag is false
    /// when the registry refused the write. `None` means the user cancelled.
    pub fn resolve_source(&mut self, prefix: &str) -> Option<(SourceRef, bool)> {
        if let Some(entry) = lookup_source(&*self.registry, prefix, self.require_existing_files) {
            return Some((entry, false));
        }

        let picked = self.locator.locate(&locate_prompt(prefix), &self.filter)?;
        let path = std::path::absolute(&picked).unwrap_or(picked);
        let entry = SourceRef::new(prefix, path);

        let registered = match self.registry.put(entry.clone()) {
            Ok(()) => {
                info!("Registered {:?} for prefix {:?}", entry.path, prefix);
                true
            }
            Err(e) => {
                warn!(
                    "Failed to register {:?} for prefix {:?}: {}",
                    entry.path, prefix, e
                );
                false
            }
        };
        Some((entry, registered))
    }

    /// Resolve one trimmed citation and show its page.
    pub fn resolve(
        &mut self,
        citation: &str,
        highlight: Option<&str>,
    ) -> Result<Resolution, SkipReason> {
        let parsed = Citation::parse(citation).map_err(|e| {
            debug!("Skipping citation {:?}: {}", citation, e);
            SkipReason::Malformed(e)
        })?;

        let Some((source, registered)) = self.resolve_source(&parsed.prefix) else {
            debug!("Skipping citation {:?}: no file located", citation);
            return Err(SkipReason::Cancelled {
                prefix: parsed.prefix,
            });
        };

        let Some(sessions) = self.sessions.as_deref_mut() else {
            debug!("Skipping citation {:?}: no viewer", citation);
            return Err(SkipReason::NoViewer);
        };

        let page = source.page_index(parsed.page);
        let outcome = sessions
            .show(&source.path, page, highlight)
            .map_err(|e| {
                warn!("Failed to show {} in {:?}: {}", parsed, source.path, e);
                SkipReason::Viewer(e)
            })?;

        Ok(Resolution {
            citation: parsed,
            path: source.path,
            page,
            session: outcome.session,
            reused: outcome.reused,
            navigated: outcome.navigated,
            registered,
        })
    }
}

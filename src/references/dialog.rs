//! Locating source files
//!
//! When a citation prefix has no registered file, the user is asked to pick
//! one. The dialog blocks until the user chooses a file or cancels.

use std::path::PathBuf;
use tracing::debug;

use super::types::FileFilterSetting;

/// Prompt shown when asking for the file behind `prefix`.
pub fn locate_prompt(prefix: &str) -> String {
    format!("Locate the PDF file for the prefix \"{}\"", prefix)
}

/// Asks the user for a file. `None` means the user cancelled.
pub trait FileLocator {
    fn locate(&mut self, prompt: &str, filter: &FileFilterSetting) -> Option<PathBuf>;
}

/// Native open-file dialog.
#[derive(Debug, Default, Clone, Copy)]
pub struct RfdFileLocator;

impl FileLocator for RfdFileLocator {
    fn locate(&mut self, prompt: &str, filter: &FileFilterSetting) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new().set_title(prompt);
        if !filter.extensions.is_empty() {
            dialog = dialog.add_filter(filter.name.as_str(), filter.extensions.as_slice());
        }

        let picked = dialog.pick_file();
        debug!("File dialog {:?} returned {:?}", prompt, picked);
        picked
    }
}

/// Never finds anything; every unknown prefix is skipped.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFileLocator;

impl FileLocator for NoFileLocator {
    fn locate(&mut self, prompt: &str, _filter: &FileFilterSetting) -> Option<PathBuf> {
        debug!("Not prompting: {}", prompt);
        None
    }
}

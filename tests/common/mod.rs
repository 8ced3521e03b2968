//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use sheetrefs::references::{FileFilterSetting, FileLocator, PageViewer, ViewerSession};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    Open { id: u64, path: PathBuf, page: u32 },
    GoTo { id: u64, page: u32, highlight: Option<String> },
    Front { id: u64 },
}

/// Records every backend call into a shared log.
#[derive(Clone, Default)]
pub struct RecordingViewer {
    pub events: Rc<RefCell<Vec<ViewerEvent>>>,
    pub fail_open: bool,
}

impl RecordingViewer {
    pub fn new() -> (Self, Rc<RefCell<Vec<ViewerEvent>>>) {
        let viewer = Self::default();
        let events = viewer.events.clone();
        (viewer, events)
    }
}

impl PageViewer for RecordingViewer {
    fn open(&mut self, session: &ViewerSession) -> Result<(), String> {
        if self.fail_open {
            return Err("viewer unavailable".to_string());
        }
        self.events.borrow_mut().push(ViewerEvent::Open {
            id: session.id,
            path: session.path.clone(),
            page: session.page,
        });
        Ok(())
    }

    fn go_to_page(&mut self, session: &ViewerSession) -> Result<(), String> {
        self.events.borrow_mut().push(ViewerEvent::GoTo {
            id: session.id,
            page: session.page,
            highlight: session.highlight.clone(),
        });
        Ok(())
    }

    fn bring_to_front(&mut self, session: &ViewerSession) -> Result<(), String> {
        self.events
            .borrow_mut()
            .push(ViewerEvent::Front { id: session.id });
        Ok(())
    }
}

/// Answers locate requests from a queue; an empty queue cancels.
#[derive(Default)]
pub struct ScriptedLocator {
    pub answers: VecDeque<Option<PathBuf>>,
    pub prompts: Vec<String>,
}

impl ScriptedLocator {
    pub fn answering(answers: impl IntoIterator<Item = Option<PathBuf>>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            prompts: Vec::new(),
        }
    }
}

impl FileLocator for ScriptedLocator {
    fn locate(&mut self, prompt: &str, _filter: &FileFilterSetting) -> Option<PathBuf> {
        self.prompts.push(prompt.to_string());
        self.answers.pop_front().flatten()
    }
}

/// Create an empty file named `name` in `dir`.
pub fn pdf_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"%PDF-1.4\n").expect("write test pdf");
    path
}

//! Requests the editor raises for its host to fulfil (file pickers, prompts).
//!
//! Several editors may share one [`EditorEventBus`]; every event names the
//! instance it is meant for so editors never act on each other's requests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use gpui_content_core::{Path, Point};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(u64);

impl InstanceId {
    /// A process-unique id.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "editor-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EditorRequest {
    OpenFilePicker { position: Option<Point> },
    PromptImageUrl { position: Option<Point> },
    PromptLink { current: Option<String> },
    PromptImageAlt { path: Path, current: String },
    PromptImageCaption { path: Path, current: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditorEvent {
    /// `None` reaches whichever editor polls first.
    pub target: Option<InstanceId>,
    pub request: EditorRequest,
}

#[derive(Clone, Default)]
pub struct EditorEventBus {
    queue: Rc<RefCell<VecDeque<EditorEvent>>>,
}

impl EditorEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&self, event: EditorEvent) {
        tracing::debug!(target_editor = ?event.target, request = ?event.request, "dispatch editor event");
        self.queue.borrow_mut().push_back(event);
    }

    /// Removes and returns the requests addressed to `instance` or to nobody.
    pub fn take_for(&self, instance: InstanceId) -> Vec<EditorRequest> {
        let mut queue = self.queue.borrow_mut();
        let mut taken = Vec::new();
        queue.retain(|event| match event.target {
            Some(target) if target != instance => true,
            _ => {
                taken.push(event.request.clone());
                false
            }
        });
        taken
    }

    pub fn len(&self) -> usize {
        self.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.borrow().is_empty()
    }
}

impl fmt::Debug for EditorEventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorEventBus")
            .field("pending", &self.len())
            .finish()
    }
}

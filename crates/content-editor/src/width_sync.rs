//! Coalesces slider-driven width edits into at most one transaction per frame.

use gpui_content_core::{Editor, ImageBlockAttrs, Path, PercentInput, clamp_percent, selected_image};
use serde_json::json;

use crate::error::EditorError;

/// The selected image as last observed, plus any live width edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSnapshot {
    pub src: Option<String>,
    pub width: u32,
    pub alt: String,
    pub caption: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushOutcome {
    Applied(u32),
    /// The remembered path no longer holds the same image block; the edit was dropped.
    Stale,
    Idle,
}

#[derive(Debug, Default)]
pub struct WidthSync {
    target: Option<Path>,
    snapshot: Option<ImageSnapshot>,
    pending: Option<u32>,
    scheduled: bool,
}

impl WidthSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tracks the node-selected image block, or forgets the target when there is none.
    pub fn observe(&mut self, editor: &Editor) {
        match selected_image(editor) {
            Some((path, attrs)) => {
                let same_image = self.target.as_ref() == Some(&path)
                    && self.snapshot.as_ref().is_some_and(|s| s.src == attrs.src);
                if !same_image && self.pending.take().is_some() {
                    tracing::debug!(?path, "dropping width edit for replaced image");
                }
                let width = self.pending.unwrap_or(attrs.width);
                self.snapshot = Some(snapshot(&attrs, width));
                self.target = Some(path);
            }
            None => {
                self.target = None;
                self.snapshot = None;
            }
        }
    }

    pub fn target(&self) -> Option<&Path> {
        self.target.as_ref()
    }

    pub fn snapshot(&self) -> Option<&ImageSnapshot> {
        self.snapshot.as_ref()
    }

    /// The width the slider should show right now.
    pub fn visible_width(&self) -> Option<u32> {
        self.snapshot.as_ref().map(|s| s.width)
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduled
    }

    /// Records a slider value. Returns `true` when the caller must schedule a
    /// flush for the next frame.
    pub fn request_width<'a>(&mut self, value: impl Into<PercentInput<'a>>) -> bool {
        let width = clamp_percent(value);
        if let Some(snapshot) = &mut self.snapshot {
            snapshot.width = width;
        }
        self.pending = Some(width);
        if self.scheduled {
            return false;
        }
        self.scheduled = true;
        true
    }

    /// Applies the latest pending width, if any, as a single `image.set_attrs`.
    pub fn flush(&mut self, editor: &mut Editor) -> Result<FlushOutcome, EditorError> {
        self.scheduled = false;
        let Some(width) = self.pending.take() else {
            return Ok(FlushOutcome::Idle);
        };

        let current = self
            .target
            .as_ref()
            .and_then(|path| editor.doc().node(path))
            .and_then(ImageBlockAttrs::from_node)
            .filter(|attrs| {
                self.snapshot
                    .as_ref()
                    .is_some_and(|snapshot| snapshot.src == attrs.src)
            });
        let (Some(path), Some(current)) = (self.target.clone(), current) else {
            tracing::debug!(width, target = ?self.target, "dropping width edit for stale image target");
            self.target = None;
            self.snapshot = None;
            return Ok(FlushOutcome::Stale);
        };
        if current.width == width {
            return Ok(FlushOutcome::Idle);
        }

        editor.run_command(
            "image.set_attrs",
            Some(json!({ "path": path, "width": width })),
        )?;
        tracing::debug!(width, ?path, "applied image width");
        Ok(FlushOutcome::Applied(width))
    }
}

fn snapshot(attrs: &ImageBlockAttrs, width: u32) -> ImageSnapshot {
    ImageSnapshot {
        src: attrs.src.clone(),
        width,
        alt: attrs.alt.clone(),
        caption: attrs.caption.clone(),
    }
}

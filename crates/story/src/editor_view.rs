//! The GPUI editing surface around one [`ContentEditor`].

use std::cell::Cell;
use std::collections::HashMap;
use std::io;
use std::ops::Range;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use futures::future::LocalBoxFuture;
use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::notification::Notification;
use gpui_component::slider::{SliderEvent, SliderState, SliderValue};
use gpui_component::{ActiveTheme as _, WindowExt as _};
use gpui_content_core::{
    BlockAlign, DEFAULT_WIDTH_PERCENT, ImageBlockAttrs, ListType, Node, Path, Point as DocPoint, Selection,
    ordered_selection_points, point_for_global_offset, point_global_offset, text_blocks_in_order,
};
use gpui_content_editor::{
    BubbleMenu, ContentEditor, EditorError, EditorRequest, FileReader, ImageSink, ImageSource,
    ImageTextField, ImageTextPrompt, LinkEdit, MemoryImage, PathImage, SlashKey, ToolbarAction,
    apply_action, insert_images_from_files,
};
use serde_json::{Value, json};

use crate::dialogs;
use crate::line_element::{BlockLine, InputLayer, display_text};
use crate::overlays;

pub const CONTEXT: &str = "ContentEditor";

const INDENT_STEP: f32 = 24.;

actions!(
    content_editor,
    [
        Backspace,
        Delete,
        Enter,
        Escape,
        Tab,
        ShiftTab,
        MoveUp,
        MoveDown,
        MoveLeft,
        MoveRight,
        SelectUp,
        SelectDown,
        SelectLeft,
        SelectRight,
        SelectAll,
        Undo,
        Redo,
        Copy,
        Cut,
        Paste,
        ToggleBold,
        ToggleItalic,
        ToggleUnderline,
        SetLink,
        InsertImage,
        InsertImageFromUrl,
    ]
);

pub fn init(cx: &mut App) {
    cx.bind_keys([
        KeyBinding::new("backspace", Backspace, Some(CONTEXT)),
        KeyBinding::new("delete", Delete, Some(CONTEXT)),
        KeyBinding::new("enter", Enter, Some(CONTEXT)),
        KeyBinding::new("escape", Escape, Some(CONTEXT)),
        KeyBinding::new("tab", Tab, Some(CONTEXT)),
        KeyBinding::new("shift-tab", ShiftTab, Some(CONTEXT)),
        KeyBinding::new("up", MoveUp, Some(CONTEXT)),
        KeyBinding::new("down", MoveDown, Some(CONTEXT)),
        KeyBinding::new("left", MoveLeft, Some(CONTEXT)),
        KeyBinding::new("right", MoveRight, Some(CONTEXT)),
        KeyBinding::new("shift-up", SelectUp, Some(CONTEXT)),
        KeyBinding::new("shift-down", SelectDown, Some(CONTEXT)),
        KeyBinding::new("shift-left", SelectLeft, Some(CONTEXT)),
        KeyBinding::new("shift-right", SelectRight, Some(CONTEXT)),
        #[cfg(target_os = "macos")]
        KeyBinding::new("cmd-a", SelectAll, Some(CONTEXT)),
        #[cfg(not(target_os = "macos"))]
        KeyBinding::new("ctrl-a", SelectAll, Some(CONTEXT)),
        #[cfg(target_os = "macos")]
        KeyBinding::new("cmd-z", Undo, Some(CONTEXT)),
        #[cfg(not(target_os = "macos"))]
        KeyBinding::new("ctrl-z", Undo, Some(CONTEXT)),
        #[cfg(target_os = "macos")]
        KeyBinding::new("cmd-shift-z", Redo, Some(CONTEXT)),
        #[cfg(not(target_os = "macos"))]
        KeyBinding::new("ctrl-shift-z", Redo, Some(CONTEXT)),
        #[cfg(not(target_os = "macos"))]
        KeyBinding::new("ctrl-y", Redo, Some(CONTEXT)),
        #[cfg(target_os = "macos")]
        KeyBinding::new("cmd-c", Copy, Some(CONTEXT)),
        #[cfg(not(target_os = "macos"))]
        KeyBinding::new("ctrl-c", Copy, Some(CONTEXT)),
        #[cfg(target_os = "macos")]
        KeyBinding::new("cmd-x", Cut, Some(CONTEXT)),
        #[cfg(not(target_os = "macos"))]
        KeyBinding::new("ctrl-x", Cut, Some(CONTEXT)),
        #[cfg(target_os = "macos")]
        KeyBinding::new("cmd-v", Paste, Some(CONTEXT)),
        #[cfg(not(target_os = "macos"))]
        KeyBinding::new("ctrl-v", Paste, Some(CONTEXT)),
        #[cfg(target_os = "macos")]
        KeyBinding::new("cmd-b", ToggleBold, Some(CONTEXT)),
        #[cfg(not(target_os = "macos"))]
        KeyBinding::new("ctrl-b", ToggleBold, Some(CONTEXT)),
        #[cfg(target_os = "macos")]
        KeyBinding::new("cmd-i", ToggleItalic, Some(CONTEXT)),
        #[cfg(not(target_os = "macos"))]
        KeyBinding::new("ctrl-i", ToggleItalic, Some(CONTEXT)),
        #[cfg(target_os = "macos")]
        KeyBinding::new("cmd-u", ToggleUnderline, Some(CONTEXT)),
        #[cfg(not(target_os = "macos"))]
        KeyBinding::new("ctrl-u", ToggleUnderline, Some(CONTEXT)),
        #[cfg(target_os = "macos")]
        KeyBinding::new("cmd-k", SetLink, Some(CONTEXT)),
        #[cfg(not(target_os = "macos"))]
        KeyBinding::new("ctrl-k", SetLink, Some(CONTEXT)),
        #[cfg(target_os = "macos")]
        KeyBinding::new("cmd-shift-i", InsertImage, Some(CONTEXT)),
        #[cfg(not(target_os = "macos"))]
        KeyBinding::new("ctrl-shift-i", InsertImage, Some(CONTEXT)),
    ]);
}

#[derive(Debug, Clone)]
pub enum ContentEditorEvent {
    /// The document changed; carries the new HTML.
    Changed(SharedString),
}

#[derive(Clone)]
pub(crate) struct LineLayout {
    pub bounds: Bounds<Pixels>,
    pub layout: TextLayout,
    pub len: usize,
}

/// Pointer targets that are not text.
#[derive(Debug, Clone)]
pub(crate) enum HitTarget {
    Void(Path),
    Checkbox(Path),
}

pub struct ContentEditorView {
    pub(crate) focus_handle: FocusHandle,
    content: ContentEditor,
    changed: Rc<Cell<bool>>,
    pub(crate) lines: HashMap<Path, LineLayout>,
    pub(crate) hit_regions: Vec<(Bounds<Pixels>, HitTarget)>,
    /// Window position of the selection start, for the text bubble menu.
    pub(crate) text_bubble_origin: Option<gpui::Point<Pixels>>,
    /// IME preedit range, as global offsets in the focused block.
    pub(crate) ime_marked: Option<Range<usize>>,
    drag_anchor: Option<DocPoint>,
    pub(crate) width_slider: Entity<SliderState>,
    slider_width: Option<u32>,
    decoded_images: HashMap<String, Arc<Image>>,
    _subscriptions: Vec<Subscription>,
}

impl EventEmitter<ContentEditorEvent> for ContentEditorView {}

impl ContentEditorView {
    pub fn new(mut content: ContentEditor, window: &mut Window, cx: &mut Context<Self>) -> Self {
        let changed = Rc::new(Cell::new(false));
        content.on_change({
            let changed = changed.clone();
            move |_| changed.set(true)
        });

        let width_slider = cx.new(|_| {
            SliderState::new()
                .min(10.)
                .max(100.)
                .step(1.)
                .default_value(100.)
        });
        let slider_subscription = cx.subscribe_in(
            &width_slider,
            window,
            |this, _, event: &SliderEvent, window, cx| {
                if let SliderEvent::Change(value) = event {
                    let width = match value {
                        SliderValue::Single(width) => *width,
                        SliderValue::Range(_, end) => *end,
                    };
                    this.set_image_width(f64::from(width), window, cx);
                }
            },
        );

        let focus_handle = cx.focus_handle().tab_stop(true);
        let blur_subscription = cx.on_blur(&focus_handle, window, |this, _, cx| {
            if this.content.slash().is_open() {
                this.content.slash_mut().cancel();
                cx.notify();
            }
        });

        Self {
            focus_handle,
            content,
            changed,
            lines: HashMap::new(),
            hit_regions: Vec::new(),
            text_bubble_origin: None,
            ime_marked: None,
            drag_anchor: None,
            width_slider,
            slider_width: None,
            decoded_images: HashMap::new(),
            _subscriptions: vec![slider_subscription, blur_subscription],
        }
    }

    pub fn content(&self) -> &ContentEditor {
        &self.content
    }

    pub fn html(&self) -> &str {
        self.content.html()
    }

    pub fn focus(&self, window: &mut Window) {
        window.focus(&self.focus_handle);
    }

    /// Replaces the document from outside; see [`ContentEditor::set_content`].
    pub fn set_content(&mut self, html: &str, cx: &mut Context<Self>) -> bool {
        let changed = self.content.set_content(html);
        if changed {
            self.ime_marked = None;
            self.drag_anchor = None;
            cx.notify();
        }
        changed
    }

    pub fn command(
        &mut self,
        id: &str,
        args: Option<Value>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let result = self.content.run_command(id, args);
        self.finish(result, window, cx);
    }

    pub fn apply_toolbar(
        &mut self,
        action: &ToolbarAction,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let result = apply_action(&mut self.content, action);
        self.finish(result, window, cx);
    }

    pub(crate) fn commit_link(
        &mut self,
        edit: &LinkEdit,
        url: &str,
        text: Option<&str>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> bool {
        let result = self.content.commit_link(edit, url, text).map(|_| ());
        self.finish_prompt(result, window, cx)
    }

    pub(crate) fn submit_image_url(
        &mut self,
        url: &str,
        position: Option<DocPoint>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> bool {
        let result = self.content.insert_image_from_url(url, position);
        self.finish_prompt(result, window, cx)
    }

    pub(crate) fn submit_image_text(
        &mut self,
        prompt: &ImageTextPrompt,
        answer: &str,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> bool {
        let result = self
            .content
            .submit_image_text(prompt, Some(answer))
            .map(|_| ());
        self.finish_prompt(result, window, cx)
    }

    /// Like [`Self::finish`], but reports whether the prompt may close.
    fn finish_prompt(
        &mut self,
        result: Result<(), EditorError>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> bool {
        let accepted = !matches!(result, Err(EditorError::Input(_)));
        self.finish(result, window, cx);
        if accepted {
            self.focus(window);
        }
        accepted
    }

    fn finish(&mut self, result: Result<(), EditorError>, window: &mut Window, cx: &mut Context<Self>) {
        if let Err(EditorError::Input(err)) = &result {
            window.push_notification(Notification::new().message(err.to_string()), cx);
        }
        self.ime_marked = None;
        self.sync(window, cx);
    }

    /// Reports content changes and serves requests the editor queued.
    fn sync(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        if self.changed.take() {
            cx.emit(ContentEditorEvent::Changed(
                self.content.html().to_string().into(),
            ));
        }
        for request in self.content.take_requests() {
            self.handle_request(request, window, cx);
        }
        cx.notify();
    }

    fn handle_request(&mut self, request: EditorRequest, window: &mut Window, cx: &mut Context<Self>) {
        tracing::debug!(editor = %self.content.id(), ?request, "serving editor request");
        let view = cx.entity();
        match request {
            EditorRequest::OpenFilePicker { position } => {
                self.open_file_picker(position, window, cx);
            }
            EditorRequest::PromptImageUrl { position } => {
                dialogs::prompt_image_url(view, position, window, cx);
            }
            EditorRequest::PromptLink { .. } => {
                let edit = self.content.begin_link_edit();
                dialogs::prompt_link(view, edit, window, cx);
            }
            EditorRequest::PromptImageAlt { path, .. } => {
                if let Some(prompt) =
                    ImageTextPrompt::at(self.content.editor(), path, ImageTextField::Alt)
                {
                    dialogs::prompt_image_text(view, prompt, window, cx);
                }
            }
            EditorRequest::PromptImageCaption { path, .. } => {
                if let Some(prompt) =
                    ImageTextPrompt::at(self.content.editor(), path, ImageTextField::Caption)
                {
                    dialogs::prompt_image_text(view, prompt, window, cx);
                }
            }
        }
    }

    fn open_file_picker(
        &mut self,
        position: Option<DocPoint>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let Some(ticket) = self.content.file_picker().try_open() else {
            return;
        };
        let picked = cx.prompt_for_paths(PathPromptOptions {
            files: true,
            directories: false,
            multiple: true,
            prompt: Some("Insert".into()),
        });

        cx.spawn_in(window, async move |this, cx| {
            let paths = match picked.await {
                Ok(Ok(Some(paths))) => paths,
                Ok(Err(err)) => {
                    tracing::warn!(%err, "file picker failed");
                    return;
                }
                _ => return,
            };
            drop(ticket);
            let Ok(files) = this.update(cx, |_, cx| path_images(paths, cx)) else {
                return;
            };
            ingest_files(this, files, position, cx).await;
        })
        .detach();
    }

    fn ingest(
        &mut self,
        files: Vec<Box<dyn ImageSource>>,
        position: Option<DocPoint>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        cx.spawn_in(window, async move |this, cx| {
            ingest_files(this, files, position, cx).await;
        })
        .detach();
    }

    pub(crate) fn set_image_width(&mut self, width: f64, window: &mut Window, cx: &mut Context<Self>) {
        if self.content.request_width(width) {
            cx.on_next_frame(window, |this, window, cx| {
                let result = this.content.flush_width().map(|_| ());
                this.finish(result, window, cx);
            });
        }
        cx.notify();
    }

    pub(crate) fn step_image_width(&mut self, delta: i32, window: &mut Window, cx: &mut Context<Self>) {
        let Some(current) = self.content.width_sync().visible_width() else {
            return;
        };
        self.set_image_width(f64::from(current as i32 + delta), window, cx);
    }

    fn select(&mut self, selection: Selection, cx: &mut Context<Self>) {
        self.content.set_selection(selection);
        self.ime_marked = None;
        cx.notify();
    }

    pub(crate) fn global_offset(&self, point: &DocPoint) -> Option<usize> {
        let (child_ix, block) = point.path.split_last()?;
        let Some(Node::Element(el)) = self.content.editor().doc().node(block) else {
            return None;
        };
        Some(point_global_offset(&el.children, *child_ix, point.offset))
    }

    fn point_in(&self, block: &[usize], offset: usize) -> Option<DocPoint> {
        let Some(Node::Element(el)) = self.content.editor().doc().node(block) else {
            return None;
        };
        Some(point_for_global_offset(block, &el.children, offset))
    }

    /// The text block holding the selection focus.
    pub(crate) fn focus_block(&self) -> Option<Path> {
        let editor = self.content.editor();
        let (_, block) = editor.selection().focus.path.split_last()?;
        matches!(editor.doc().node(block), Some(Node::Element(_))).then(|| block.to_vec())
    }

    pub(crate) fn focus_offset(&self) -> Option<usize> {
        self.global_offset(&self.content.editor().selection().focus)
    }

    pub(crate) fn slash_trigger_block(&self) -> Option<Path> {
        self.content
            .slash()
            .session()
            .map(|session| session.range.block.clone())
    }

    pub(crate) fn place_slash_popup(
        &mut self,
        anchor: gpui_content_editor::AnchorBounds,
        cx: &mut Context<Self>,
    ) {
        let current = self.content.slash().session().and_then(|s| s.anchor);
        if current != Some(anchor) {
            self.content.slash_mut().set_anchor(Some(anchor));
            cx.notify();
        }
    }

    /// Global offset of the start of a non-empty selection, when it starts in `block`.
    pub(crate) fn selection_start_in(&self, block: &[usize]) -> Option<usize> {
        let selection = self.content.editor().selection();
        if selection.is_collapsed() {
            return None;
        }
        let (start, _) = ordered_selection_points(selection);
        let (_, start_block) = start.path.split_last()?;
        if start_block != block {
            return None;
        }
        self.global_offset(&start)
    }

    fn text_blocks(&self) -> Vec<(Path, String)> {
        let editor = self.content.editor();
        text_blocks_in_order(editor.doc(), editor.registry())
            .into_iter()
            .map(|block| (block.path, display_text(&block.el.children)))
            .collect()
    }

    fn active_text(&self) -> Option<(Path, String)> {
        let block = self.focus_block()?;
        let Some(Node::Element(el)) = self.content.editor().doc().node(&block) else {
            return None;
        };
        Some((block, display_text(&el.children)))
    }

    /// The selection clipped to the focused block.
    fn active_range(&self) -> Option<Range<usize>> {
        let selection = self.content.editor().selection();
        let block = self.focus_block()?;
        let focus = self.global_offset(&selection.focus)?;
        let anchor = match selection.anchor.path.split_last() {
            Some((_, anchor_block)) if anchor_block == block.as_slice() => {
                self.global_offset(&selection.anchor)?
            }
            _ => focus,
        };
        Some(anchor.min(focus)..anchor.max(focus))
    }

    fn select_in_block(&mut self, block: &[usize], range: Range<usize>) {
        if let (Some(anchor), Some(focus)) =
            (self.point_in(block, range.start), self.point_in(block, range.end))
        {
            self.content.set_selection(Selection { anchor, focus });
        }
    }

    /// The document point nearest to a window position.
    fn point_at_position(&self, position: gpui::Point<Pixels>) -> Option<DocPoint> {
        let distance = |bounds: &Bounds<Pixels>| {
            let axis = |value: Pixels, low: Pixels, high: Pixels| {
                if value < low {
                    f32::from(low - value)
                } else if value > high {
                    f32::from(value - high)
                } else {
                    0.
                }
            };
            let dy = axis(position.y, bounds.top(), bounds.bottom());
            let dx = axis(position.x, bounds.left(), bounds.right());
            dy * 1000. + dx
        };
        let (path, line) = self
            .lines
            .iter()
            .min_by(|(_, a), (_, b)| distance(&a.bounds).total_cmp(&distance(&b.bounds)))?;
        let offset = match line.layout.index_for_position(position) {
            Ok(ix) | Err(ix) => ix,
        };
        self.point_in(path, offset.min(line.len))
    }

    pub(crate) fn pointer_down(
        &mut self,
        position: gpui::Point<Pixels>,
        extend: bool,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let target = self
            .hit_regions
            .iter()
            .find(|(bounds, _)| bounds.contains(&position))
            .map(|(_, target)| target.clone());
        match target {
            Some(HitTarget::Void(path)) => {
                self.command("core.select_node", Some(json!({ "path": path })), window, cx);
            }
            Some(HitTarget::Checkbox(path)) => {
                self.command("list.toggle_checked", Some(json!({ "path": path })), window, cx);
            }
            None => {
                let Some(point) = self.point_at_position(position) else {
                    return;
                };
                let anchor = if extend {
                    self.content.editor().selection().anchor.clone()
                } else {
                    point.clone()
                };
                self.drag_anchor = Some(anchor.clone());
                self.select(
                    Selection {
                        anchor,
                        focus: point,
                    },
                    cx,
                );
            }
        }
    }

    pub(crate) fn pointer_drag(&mut self, position: gpui::Point<Pixels>, cx: &mut Context<Self>) {
        let Some(anchor) = self.drag_anchor.clone() else {
            return;
        };
        if let Some(focus) = self.point_at_position(position) {
            self.select(Selection { anchor, focus }, cx);
        }
    }

    pub(crate) fn pointer_up(&mut self, cx: &mut Context<Self>) {
        if self.drag_anchor.take().is_some() {
            cx.notify();
        }
    }

    fn move_horizontal(&mut self, forward: bool, extend: bool, cx: &mut Context<Self>) {
        let selection = self.content.editor().selection().clone();
        let blocks = self.text_blocks();
        let neighbor = |from: &[usize]| -> Option<(Path, usize)> {
            if forward {
                blocks
                    .iter()
                    .find(|(path, _)| path.as_slice() > from)
                    .map(|(path, _)| (path.clone(), 0))
            } else {
                blocks
                    .iter()
                    .rev()
                    .find(|(path, _)| path.as_slice() < from)
                    .map(|(path, text)| (path.clone(), text.len()))
            }
        };

        if let Some(void) = selection.selected_void_path(self.content.editor().doc()) {
            if let Some((block, offset)) = neighbor(&void)
                && let Some(point) = self.point_in(&block, offset)
            {
                self.select(Selection::collapsed(point), cx);
            }
            return;
        }

        if !extend && !selection.is_collapsed() {
            let (start, end) = ordered_selection_points(&selection);
            self.select(Selection::collapsed(if forward { end } else { start }), cx);
            return;
        }

        let (Some((block, text)), Some(offset)) = (self.active_text(), self.focus_offset()) else {
            return;
        };
        let target = if forward && offset < text.len() {
            Some((block, next_boundary(&text, offset)))
        } else if !forward && offset > 0 {
            Some((block, prev_boundary(&text, offset)))
        } else {
            neighbor(&block)
        };
        let Some(focus) = target.and_then(|(block, offset)| self.point_in(&block, offset)) else {
            return;
        };
        let anchor = if extend {
            selection.anchor
        } else {
            focus.clone()
        };
        self.select(Selection { anchor, focus }, cx);
    }

    fn move_vertical(&mut self, down: bool, extend: bool, cx: &mut Context<Self>) {
        let selection = self.content.editor().selection().clone();
        let (Some(block), Some(offset)) = (self.focus_block(), self.focus_offset()) else {
            return;
        };
        let Some(line) = self.lines.get(&block) else {
            return;
        };
        let Some(caret) = line.layout.position_for_index(offset.min(line.len)) else {
            return;
        };
        let line_height = line.layout.line_height();
        let y = if down {
            caret.y + line_height * 1.5
        } else {
            caret.y - line_height * 0.5
        };
        let Some(focus) = self.point_at_position(point(caret.x, y)) else {
            return;
        };
        let anchor = if extend {
            selection.anchor
        } else {
            focus.clone()
        };
        self.select(Selection { anchor, focus }, cx);
    }

    fn selected_text(&self) -> Option<String> {
        let selection = self.content.editor().selection();
        if selection.is_collapsed() {
            return None;
        }
        let (start, end) = ordered_selection_points(selection);
        let start_block = start.path.split_last()?.1.to_vec();
        let end_block = end.path.split_last()?.1.to_vec();

        let mut parts = Vec::new();
        for (path, text) in self.text_blocks() {
            if path < start_block || path > end_block {
                continue;
            }
            let from = if path == start_block {
                self.global_offset(&start)?
            } else {
                0
            };
            let to = if path == end_block {
                self.global_offset(&end)?
            } else {
                text.len()
            };
            parts.push(text.get(from..to).unwrap_or_default().to_string());
        }
        Some(parts.join("\n"))
    }

    fn backspace(&mut self, _: &Backspace, window: &mut Window, cx: &mut Context<Self>) {
        self.command("core.delete_backward", None, window, cx);
    }

    fn delete(&mut self, _: &Delete, window: &mut Window, cx: &mut Context<Self>) {
        self.command("core.delete_forward", None, window, cx);
    }

    fn enter(&mut self, _: &Enter, window: &mut Window, cx: &mut Context<Self>) {
        if self.content.slash().is_open() {
            self.slash_key(SlashKey::Enter, window, cx);
        } else {
            self.command("core.split_block", None, window, cx);
        }
    }

    fn escape(&mut self, _: &Escape, window: &mut Window, cx: &mut Context<Self>) {
        if self.content.slash().is_open() {
            self.slash_key(SlashKey::Escape, window, cx);
        } else {
            let focus = self.content.editor().selection().focus.clone();
            self.select(Selection::collapsed(focus), cx);
        }
    }

    fn tab(&mut self, _: &Tab, window: &mut Window, cx: &mut Context<Self>) {
        if self.content.slash().is_open() {
            self.slash_key(SlashKey::Tab, window, cx);
        } else {
            self.apply_toolbar(&ToolbarAction::Indent, window, cx);
        }
    }

    fn shift_tab(&mut self, _: &ShiftTab, window: &mut Window, cx: &mut Context<Self>) {
        if self.content.slash().is_open() {
            self.slash_key(SlashKey::ShiftTab, window, cx);
        } else {
            self.apply_toolbar(&ToolbarAction::Outdent, window, cx);
        }
    }

    fn move_up(&mut self, _: &MoveUp, window: &mut Window, cx: &mut Context<Self>) {
        if self.content.slash().is_open() {
            self.slash_key(SlashKey::Up, window, cx);
        } else {
            self.move_vertical(false, false, cx);
        }
    }

    fn move_down(&mut self, _: &MoveDown, window: &mut Window, cx: &mut Context<Self>) {
        if self.content.slash().is_open() {
            self.slash_key(SlashKey::Down, window, cx);
        } else {
            self.move_vertical(true, false, cx);
        }
    }

    fn move_left(&mut self, _: &MoveLeft, _: &mut Window, cx: &mut Context<Self>) {
        self.move_horizontal(false, false, cx);
    }

    fn move_right(&mut self, _: &MoveRight, _: &mut Window, cx: &mut Context<Self>) {
        self.move_horizontal(true, false, cx);
    }

    fn select_up(&mut self, _: &SelectUp, _: &mut Window, cx: &mut Context<Self>) {
        self.move_vertical(false, true, cx);
    }

    fn select_down(&mut self, _: &SelectDown, _: &mut Window, cx: &mut Context<Self>) {
        self.move_vertical(true, true, cx);
    }

    fn select_left(&mut self, _: &SelectLeft, _: &mut Window, cx: &mut Context<Self>) {
        self.move_horizontal(false, true, cx);
    }

    fn select_right(&mut self, _: &SelectRight, _: &mut Window, cx: &mut Context<Self>) {
        self.move_horizontal(true, true, cx);
    }

    fn select_all(&mut self, _: &SelectAll, _: &mut Window, cx: &mut Context<Self>) {
        let blocks = self.text_blocks();
        let (Some((first, _)), Some((last, last_text))) = (blocks.first(), blocks.last()) else {
            return;
        };
        if let (Some(anchor), Some(focus)) =
            (self.point_in(first, 0), self.point_in(last, last_text.len()))
        {
            self.select(Selection { anchor, focus }, cx);
        }
    }

    pub fn undo_redo(&mut self, redo: bool, window: &mut Window, cx: &mut Context<Self>) {
        let moved = if redo {
            self.content.redo()
        } else {
            self.content.undo()
        };
        if moved {
            self.finish(Ok(()), window, cx);
        }
    }

    fn undo(&mut self, _: &Undo, window: &mut Window, cx: &mut Context<Self>) {
        self.undo_redo(false, window, cx);
    }

    fn redo(&mut self, _: &Redo, window: &mut Window, cx: &mut Context<Self>) {
        self.undo_redo(true, window, cx);
    }

    fn copy(&mut self, _: &Copy, _: &mut Window, cx: &mut Context<Self>) {
        if let Some(text) = self.selected_text() {
            cx.write_to_clipboard(ClipboardItem::new_string(text));
        }
    }

    fn cut(&mut self, _: &Cut, window: &mut Window, cx: &mut Context<Self>) {
        if let Some(text) = self.selected_text() {
            cx.write_to_clipboard(ClipboardItem::new_string(text));
            self.command("core.delete_backward", None, window, cx);
        }
    }

    fn paste(&mut self, _: &Paste, window: &mut Window, cx: &mut Context<Self>) {
        let Some(item) = cx.read_from_clipboard() else {
            return;
        };
        let images: Vec<Box<dyn ImageSource>> = item
            .entries()
            .iter()
            .filter_map(|entry| match entry {
                ClipboardEntry::Image(image) => {
                    let mime = image.format().mime_type();
                    let ext = mime.rsplit('/').next().unwrap_or("png");
                    let file = MemoryImage::new(format!("pasted-image.{ext}"), image.bytes().to_vec())
                        .with_mime(mime);
                    Some(Box::new(file) as Box<dyn ImageSource>)
                }
                _ => None,
            })
            .collect();
        if !images.is_empty() {
            self.ingest(images, None, window, cx);
            return;
        }

        let text = item
            .text()
            .unwrap_or_default()
            .replace("\r\n", "\n")
            .replace('\r', "\n");
        if !text.is_empty() {
            self.command("core.insert_text", Some(json!({ "text": text })), window, cx);
        }
    }

    fn toggle_bold(&mut self, _: &ToggleBold, window: &mut Window, cx: &mut Context<Self>) {
        self.apply_toolbar(&ToolbarAction::Bold, window, cx);
    }

    fn toggle_italic(&mut self, _: &ToggleItalic, window: &mut Window, cx: &mut Context<Self>) {
        self.apply_toolbar(&ToolbarAction::Italic, window, cx);
    }

    fn toggle_underline(&mut self, _: &ToggleUnderline, window: &mut Window, cx: &mut Context<Self>) {
        self.apply_toolbar(&ToolbarAction::Underline, window, cx);
    }

    fn set_link(&mut self, _: &SetLink, window: &mut Window, cx: &mut Context<Self>) {
        self.apply_toolbar(&ToolbarAction::Link, window, cx);
    }

    fn insert_image(&mut self, _: &InsertImage, window: &mut Window, cx: &mut Context<Self>) {
        self.apply_toolbar(&ToolbarAction::UploadImage, window, cx);
    }

    fn insert_image_from_url(
        &mut self,
        _: &InsertImageFromUrl,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        self.apply_toolbar(&ToolbarAction::ImageFromUrl, window, cx);
    }

    fn slash_key(&mut self, key: SlashKey, window: &mut Window, cx: &mut Context<Self>) {
        let result = self.content.handle_slash_key(key).map(|_| ());
        self.finish(result, window, cx);
    }

    pub(crate) fn confirm_slash_row(&mut self, row: usize, window: &mut Window, cx: &mut Context<Self>) {
        self.content.slash_mut().select(row);
        let result = self.content.confirm_slash().map(|_| ());
        self.finish(result, window, cx);
        self.focus(window);
    }

    pub(crate) fn hover_slash_row(&mut self, row: usize, cx: &mut Context<Self>) {
        let selected = self.content.slash().session().map(|s| s.selected_index);
        if selected != Some(row) {
            self.content.slash_mut().select(row);
            cx.notify();
        }
    }

    fn image_source(&mut self, src: &str) -> Option<gpui::ImageSource> {
        let Some(rest) = src.strip_prefix("data:") else {
            let lower = src.to_ascii_lowercase();
            return Some(if lower.starts_with("http://") || lower.starts_with("https://") {
                SharedString::from(src.to_string()).into()
            } else {
                PathBuf::from(src).into()
            });
        };
        if let Some(image) = self.decoded_images.get(src) {
            return Some(image.clone().into());
        }
        let (meta, data) = rest.split_once(',')?;
        let format = ImageFormat::from_mime_type(meta.strip_suffix(";base64")?)?;
        let bytes = match STANDARD.decode(data) {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(%err, "undecodable data URL image");
                return None;
            }
        };
        let image = Arc::new(Image::from_bytes(format, bytes));
        self.decoded_images.insert(src.to_string(), image.clone());
        Some(image.into())
    }

    fn sync_width_slider(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let sync = self.content.width_sync();
        let width = sync.visible_width();
        if width == self.slider_width || sync.is_scheduled() {
            return;
        }
        self.slider_width = width;
        if let Some(width) = width {
            self.width_slider.update(cx, |slider, cx| {
                slider.set_value(width as f32, window, cx);
            });
        }
    }

    fn render_nodes(
        &mut self,
        nodes: &[Node],
        parent: &[usize],
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Vec<AnyElement> {
        nodes
            .iter()
            .enumerate()
            .map(|(ix, node)| {
                let mut path = parent.to_vec();
                path.push(ix);
                self.render_node(node, path, window, cx)
            })
            .collect()
    }

    fn render_node(
        &mut self,
        node: &Node,
        path: Path,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> AnyElement {
        let theme = cx.theme().clone();
        let view = cx.entity();
        let selected_void = self
            .content
            .editor()
            .selection()
            .selected_void_path(self.content.editor().doc());
        let is_selected = selected_void.as_deref() == Some(path.as_slice());

        match node {
            Node::Text(_) => div().into_any_element(),
            Node::Void(void) if void.kind == "divider" => div()
                .relative()
                .py(px(10.))
                .child(
                    div()
                        .h(px(1.))
                        .w_full()
                        .bg(if is_selected { theme.ring } else { theme.border }),
                )
                .child(hit_region(view, HitTarget::Void(path)))
                .into_any_element(),
            Node::Void(void) if node.is_image_block() => {
                let attrs = ImageBlockAttrs::from_attrs(&void.attrs);
                let source = attrs.src.as_deref().and_then(|src| self.image_source(src));
                let toolbar = match (is_selected, self.content.bubble_menu()) {
                    (true, BubbleMenu::Image(state)) => Some(overlays::image_toolbar(
                        &view,
                        state,
                        self.content.width_sync().visible_width().unwrap_or(attrs.width),
                        &self.width_slider,
                    )),
                    _ => None,
                };

                div()
                    .w_full()
                    .flex()
                    .justify_center()
                    .py(px(6.))
                    .child(
                        div()
                            .relative()
                            .w(relative(attrs.width as f32 / 100.))
                            .flex()
                            .flex_col()
                            .gap(px(4.))
                            .child(
                                div()
                                    .rounded(px(6.))
                                    .border_2()
                                    .border_color(if is_selected {
                                        theme.ring
                                    } else {
                                        theme.transparent
                                    })
                                    .overflow_hidden()
                                    .map(|this| match source {
                                        Some(source) => this.child(
                                            img(source).w_full().object_fit(ObjectFit::Contain),
                                        ),
                                        None => this
                                            .h(px(120.))
                                            .bg(theme.muted)
                                            .flex()
                                            .items_center()
                                            .justify_center()
                                            .text_color(theme.muted_foreground)
                                            .child(attrs.alt.clone()),
                                    }),
                            )
                            .when(!attrs.caption.is_empty(), |this| {
                                this.child(
                                    div()
                                        .text_center()
                                        .text_sm()
                                        .italic()
                                        .text_color(theme.muted_foreground)
                                        .child(attrs.caption.clone()),
                                )
                            })
                            .child(hit_region(view, HitTarget::Void(path)))
                            .when_some(toolbar, |this, toolbar| {
                                this.child(
                                    div().absolute().top_0().left_0().child(deferred(
                                        anchored()
                                            .anchor(Corner::BottomLeft)
                                            .snap_to_window()
                                            .child(div().pb(px(6.)).child(toolbar)),
                                    )),
                                )
                            }),
                    )
                    .into_any_element()
            }
            Node::Void(void) => div()
                .text_color(theme.muted_foreground)
                .italic()
                .child(format!("[{}]", void.kind))
                .into_any_element(),
            Node::Element(el) => {
                let align = BlockAlign::of(el);
                let indent = el.attrs.get("indent").and_then(Value::as_u64).unwrap_or(0);
                let line = || {
                    div()
                        .w_full()
                        .map(|this| match align {
                            BlockAlign::Center => this.text_center(),
                            BlockAlign::Right => this.text_right(),
                            _ => this,
                        })
                        .child(BlockLine::new(view.clone(), path.clone()))
                };

                match el.kind.as_str() {
                    "paragraph" => line()
                        .pl(px(INDENT_STEP * indent as f32))
                        .into_any_element(),
                    "heading" => {
                        let level = el.attrs.get("level").and_then(Value::as_u64).unwrap_or(1);
                        let size = match level {
                            1 => 28.,
                            2 => 22.,
                            3 => 18.,
                            _ => 16.,
                        };
                        line()
                            .pl(px(INDENT_STEP * indent as f32))
                            .pt(px(6.))
                            .text_size(px(size))
                            .font_weight(FontWeight::BOLD)
                            .into_any_element()
                    }
                    "code_block" => line()
                        .p(px(10.))
                        .rounded(px(6.))
                        .bg(theme.muted)
                        .font_family(theme.mono_font_family.clone())
                        .text_sm()
                        .into_any_element(),
                    "list_item" => {
                        let level = el.attrs.get("list_level").and_then(Value::as_u64).unwrap_or(0);
                        let marker: AnyElement = match ListType::of(el) {
                            Some(ListType::Task) => {
                                let checked =
                                    el.attrs.get("checked").and_then(Value::as_bool).unwrap_or(false);
                                div()
                                    .relative()
                                    .mt(px(3.))
                                    .size(px(14.))
                                    .rounded(px(3.))
                                    .border_1()
                                    .border_color(theme.border)
                                    .when(checked, |this| {
                                        this.bg(theme.primary)
                                            .text_color(theme.primary_foreground)
                                            .text_xs()
                                            .flex()
                                            .items_center()
                                            .justify_center()
                                            .child("✓")
                                    })
                                    .child(hit_region(view.clone(), HitTarget::Checkbox(path.clone())))
                                    .into_any_element()
                            }
                            Some(ListType::Ordered) => {
                                let index =
                                    el.attrs.get("list_index").and_then(Value::as_u64).unwrap_or(1);
                                div().child(format!("{index}.")).into_any_element()
                            }
                            _ => div().child("•").into_any_element(),
                        };
                        div()
                            .flex()
                            .gap(px(8.))
                            .pl(px(INDENT_STEP * level as f32))
                            .child(div().min_w(px(18.)).flex().justify_end().child(marker))
                            .child(line().flex_1())
                            .into_any_element()
                    }
                    "blockquote" => div()
                        .flex()
                        .flex_col()
                        .gap(px(4.))
                        .pl(px(12.))
                        .border_l_4()
                        .border_color(theme.border)
                        .text_color(theme.muted_foreground)
                        .children(self.render_nodes(&el.children, &path, window, cx))
                        .into_any_element(),
                    "table" => {
                        let header = el.attrs.get("header_row").and_then(Value::as_bool).unwrap_or(false);
                        let rows = el.children.iter().enumerate().map(|(row_ix, row)| {
                            let Node::Element(row_el) = row else {
                                return div().into_any_element();
                            };
                            let mut row_path = path.clone();
                            row_path.push(row_ix);
                            let cells = self.render_nodes(&row_el.children, &row_path, window, cx);
                            div()
                                .flex()
                                .when(header && row_ix == 0, |this| {
                                    this.bg(theme.muted).font_weight(FontWeight::SEMIBOLD)
                                })
                                .children(cells.into_iter().map(|cell| {
                                    div()
                                        .flex_1()
                                        .min_w(px(60.))
                                        .p(px(6.))
                                        .border_1()
                                        .border_color(theme.border)
                                        .child(cell)
                                }))
                                .into_any_element()
                        });
                        let rows: Vec<AnyElement> = rows.collect();
                        div()
                            .flex()
                            .flex_col()
                            .rounded(px(4.))
                            .overflow_hidden()
                            .children(rows)
                            .into_any_element()
                    }
                    _ => div()
                        .flex()
                        .flex_col()
                        .gap(px(4.))
                        .children(self.render_nodes(&el.children, &path, window, cx))
                        .into_any_element(),
                }
            }
        }
    }
}

/// Records `target`'s bounds at prepaint so the input layer can route clicks to it.
fn hit_region(view: Entity<ContentEditorView>, target: HitTarget) -> impl IntoElement {
    canvas(
        move |bounds, _, cx| {
            view.update(cx, |view, _| view.hit_regions.push((bounds, target)));
        },
        |_, _, _, _| {},
    )
    .absolute()
    .top_0()
    .left_0()
    .size_full()
}

/// Reads files off the UI thread.
fn path_images(paths: Vec<PathBuf>, cx: &App) -> Vec<Box<dyn ImageSource>> {
    let executor = cx.background_executor().clone();
    let reader: FileReader = Rc::new(
        move |path: PathBuf| -> LocalBoxFuture<'static, io::Result<Vec<u8>>> {
            Box::pin(executor.spawn(async move { std::fs::read(path) }))
        },
    );
    paths
        .into_iter()
        .map(|path| Box::new(PathImage::with_reader(path, reader.clone())) as Box<dyn ImageSource>)
        .collect()
}

async fn ingest_files(
    view: WeakEntity<ContentEditorView>,
    files: Vec<Box<dyn ImageSource>>,
    position: Option<DocPoint>,
    cx: &mut AsyncWindowContext,
) {
    let report = {
        let mut sink = ViewSink {
            view: view.clone(),
            cx: &mut *cx,
        };
        insert_images_from_files(&mut sink, &files, position).await
    };
    if report.failed > 0 {
        let message = format!("{} image(s) could not be inserted", report.failed);
        let _ = view.update_in(cx, |_, window, cx| {
            window.push_notification(Notification::new().message(message), cx);
        });
    }
}

/// Feeds ingested images into a view from an async task.
struct ViewSink<'a> {
    view: WeakEntity<ContentEditorView>,
    cx: &'a mut AsyncWindowContext,
}

impl ImageSink for ViewSink<'_> {
    fn focus(&mut self, point: DocPoint) {
        let _ = self
            .view
            .update(self.cx, |view, cx| view.select(Selection::collapsed(point), cx));
    }

    fn insert_image(&mut self, attrs: ImageBlockAttrs) -> Result<(), EditorError> {
        self.view
            .update_in(self.cx, |view, window, cx| {
                let result = view.content.insert_image(attrs);
                view.sync(window, cx);
                result
            })
            .map_err(|_| EditorError::Closed)?
    }

    fn default_image_width(&mut self) -> u32 {
        self.view
            .update(self.cx, |view, _| view.content.options().default_image_width)
            .unwrap_or(DEFAULT_WIDTH_PERCENT)
    }
}

impl EntityInputHandler for ContentEditorView {
    fn text_for_range(
        &mut self,
        range_utf16: Range<usize>,
        adjusted_range: &mut Option<Range<usize>>,
        _window: &mut Window,
        _cx: &mut Context<Self>,
    ) -> Option<String> {
        let (_, text) = self.active_text()?;
        let start = utf16_to_byte(&text, range_utf16.start);
        let end = utf16_to_byte(&text, range_utf16.end);
        adjusted_range.replace(byte_to_utf16_range(&text, start..end));
        Some(text.get(start..end).unwrap_or_default().to_string())
    }

    fn selected_text_range(
        &mut self,
        _ignore_disabled_input: bool,
        _window: &mut Window,
        _cx: &mut Context<Self>,
    ) -> Option<UTF16Selection> {
        let (_, text) = self.active_text()?;
        let range = self.active_range()?;
        let selection = self.content.editor().selection();
        Some(UTF16Selection {
            range: byte_to_utf16_range(&text, range),
            reversed: selection.focus.path == selection.anchor.path
                && selection.focus.offset < selection.anchor.offset,
        })
    }

    fn marked_text_range(
        &self,
        _window: &mut Window,
        _cx: &mut Context<Self>,
    ) -> Option<Range<usize>> {
        let (_, text) = self.active_text()?;
        self.ime_marked
            .clone()
            .map(|range| byte_to_utf16_range(&text, range))
    }

    fn unmark_text(&mut self, _window: &mut Window, _cx: &mut Context<Self>) {
        self.ime_marked = None;
    }

    fn replace_text_in_range(
        &mut self,
        range_utf16: Option<Range<usize>>,
        new_text: &str,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let Some((block, text)) = self.active_text() else {
            return;
        };
        let range = range_utf16
            .map(|r| utf16_to_byte(&text, r.start)..utf16_to_byte(&text, r.end))
            .or_else(|| self.ime_marked.clone());
        if let Some(range) = range.clone() {
            self.select_in_block(&block, range);
        }

        let inserted = new_text.replace("\r\n", "\n").replace('\r', "\n");
        if inserted.is_empty() {
            if range.is_some_and(|r| r.start < r.end) {
                self.command("core.delete_backward", None, window, cx);
            }
        } else {
            self.command("core.insert_text", Some(json!({ "text": inserted })), window, cx);
        }
        self.ime_marked = None;
    }

    fn replace_and_mark_text_in_range(
        &mut self,
        range_utf16: Option<Range<usize>>,
        new_text: &str,
        new_selected_range_utf16: Option<Range<usize>>,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) {
        let Some((block, text)) = self.active_text() else {
            return;
        };
        let range = range_utf16
            .map(|r| utf16_to_byte(&text, r.start)..utf16_to_byte(&text, r.end))
            .or_else(|| self.ime_marked.clone())
            .or_else(|| self.active_range())
            .unwrap_or(0..0);
        self.select_in_block(&block, range.clone());

        let inserted = new_text.replace("\r\n", "\n").replace('\r', "\n");
        let result = if inserted.is_empty() {
            if range.is_empty() {
                Ok(())
            } else {
                self.content.run_command("core.delete_backward", None)
            }
        } else {
            self.content
                .run_command("core.insert_text", Some(json!({ "text": inserted })))
        };
        self.finish(result, window, cx);

        if inserted.is_empty() {
            return;
        }
        let marked = range.start..range.start + inserted.len();
        if let Some(selected) = new_selected_range_utf16 {
            let start = marked.start + utf16_to_byte(&inserted, selected.start);
            let end = marked.start + utf16_to_byte(&inserted, selected.end);
            self.select_in_block(&block, start..end);
        }
        self.ime_marked = Some(marked);
    }

    fn bounds_for_range(
        &mut self,
        range_utf16: Range<usize>,
        _bounds: Bounds<Pixels>,
        _window: &mut Window,
        _cx: &mut Context<Self>,
    ) -> Option<Bounds<Pixels>> {
        let (block, text) = self.active_text()?;
        let line = self.lines.get(&block)?;
        let start = utf16_to_byte(&text, range_utf16.start);
        let pos = line.layout.position_for_index(start.min(line.len))?;
        Some(Bounds::from_corners(
            pos,
            point(pos.x + px(1.), pos.y + line.layout.line_height()),
        ))
    }

    fn character_index_for_point(
        &mut self,
        point: gpui::Point<Pixels>,
        _window: &mut Window,
        _cx: &mut Context<Self>,
    ) -> Option<usize> {
        let (block, text) = self.active_text()?;
        let line = self.lines.get(&block)?;
        let offset = match line.layout.index_for_position(point) {
            Ok(ix) | Err(ix) => ix,
        };
        Some(byte_to_utf16(&text, offset.min(line.len)))
    }
}

impl Focusable for ContentEditorView {
    fn focus_handle(&self, _cx: &App) -> FocusHandle {
        self.focus_handle.clone()
    }
}

impl Render for ContentEditorView {
    fn render(&mut self, window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme().clone();
        let view = cx.entity();

        self.lines.clear();
        self.hit_regions.clear();
        if !matches!(self.content.bubble_menu(), BubbleMenu::Text(_)) {
            self.text_bubble_origin = None;
        }
        self.sync_width_slider(window, cx);

        let doc = self.content.editor().doc().clone();
        let blocks = self.render_nodes(&doc.children, &[], window, cx);

        let slash_popup = self.content.slash().session().and_then(|session| {
            let anchor = session.anchor?;
            let menu = overlays::slash_menu(&view, session, self.content.slash().items());
            Some(deferred(
                anchored()
                    .position(point(px(anchor.x), px(anchor.y + anchor.height + 4.)))
                    .snap_to_window()
                    .child(menu),
            ))
        });
        let text_bubble = match (self.content.bubble_menu(), self.text_bubble_origin) {
            (BubbleMenu::Text(state), Some(origin)) => Some(deferred(
                anchored()
                    .anchor(Corner::BottomLeft)
                    .position(point(origin.x, origin.y - px(6.)))
                    .snap_to_window()
                    .child(overlays::text_toolbar(&view, state)),
            )),
            _ => None,
        };

        div()
            .id(("content-editor", cx.entity_id()))
            .key_context(CONTEXT)
            .track_focus(&self.focus_handle)
            .tab_index(0)
            .size_full()
            .relative()
            .bg(theme.background)
            .border_1()
            .border_color(theme.border)
            .rounded(theme.radius)
            .on_action(cx.listener(Self::backspace))
            .on_action(cx.listener(Self::delete))
            .on_action(cx.listener(Self::enter))
            .on_action(cx.listener(Self::escape))
            .on_action(cx.listener(Self::tab))
            .on_action(cx.listener(Self::shift_tab))
            .on_action(cx.listener(Self::move_up))
            .on_action(cx.listener(Self::move_down))
            .on_action(cx.listener(Self::move_left))
            .on_action(cx.listener(Self::move_right))
            .on_action(cx.listener(Self::select_up))
            .on_action(cx.listener(Self::select_down))
            .on_action(cx.listener(Self::select_left))
            .on_action(cx.listener(Self::select_right))
            .on_action(cx.listener(Self::select_all))
            .on_action(cx.listener(Self::undo))
            .on_action(cx.listener(Self::redo))
            .on_action(cx.listener(Self::copy))
            .on_action(cx.listener(Self::cut))
            .on_action(cx.listener(Self::paste))
            .on_action(cx.listener(Self::toggle_bold))
            .on_action(cx.listener(Self::toggle_italic))
            .on_action(cx.listener(Self::toggle_underline))
            .on_action(cx.listener(Self::set_link))
            .on_action(cx.listener(Self::insert_image))
            .on_action(cx.listener(Self::insert_image_from_url))
            .on_drop(cx.listener(|this, paths: &ExternalPaths, window, cx| {
                let position = this.point_at_position(window.mouse_position());
                let files = path_images(paths.paths().to_vec(), cx);
                this.ingest(files, position, window, cx);
            }))
            .child(
                div()
                    .id("content-editor-scroll")
                    .size_full()
                    .overflow_y_scroll()
                    .p(px(16.))
                    .child(div().flex().flex_col().gap(px(6.)).children(blocks)),
            )
            .child(
                div()
                    .absolute()
                    .top_0()
                    .left_0()
                    .right_0()
                    .bottom_0()
                    .child(InputLayer::new(view)),
            )
            .children(slash_popup)
            .children(text_bubble)
    }
}

fn prev_boundary(text: &str, offset: usize) -> usize {
    text[..offset.min(text.len())]
        .char_indices()
        .next_back()
        .map_or(0, |(ix, _)| ix)
}

fn next_boundary(text: &str, offset: usize) -> usize {
    text.get(offset..)
        .and_then(|rest| rest.chars().next())
        .map_or(text.len(), |ch| offset + ch.len_utf8())
}

fn utf16_to_byte(s: &str, utf16_ix: usize) -> usize {
    let mut utf16_count = 0;
    for (byte_ix, ch) in s.char_indices() {
        if utf16_count >= utf16_ix {
            return byte_ix;
        }
        utf16_count += ch.len_utf16();
    }
    s.len()
}

fn byte_to_utf16(s: &str, byte_ix: usize) -> usize {
    s[..byte_ix.min(s.len())]
        .chars()
        .map(char::len_utf16)
        .sum()
}

fn byte_to_utf16_range(s: &str, range: Range<usize>) -> Range<usize> {
    byte_to_utf16(s, range.start)..byte_to_utf16(s, range.end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf16_offsets_round_trip_through_multibyte_text() {
        let text = "aé😀b";
        assert_eq!(byte_to_utf16(text, 3), 2);
        assert_eq!(byte_to_utf16(text, 7), 4);
        assert_eq!(utf16_to_byte(text, 4), 7);
        assert_eq!(utf16_to_byte(text, 99), text.len());
        assert_eq!(byte_to_utf16_range(text, 1..7), 1..4);
    }

    #[test]
    fn char_boundaries_step_over_whole_characters() {
        let text = "hé!";
        assert_eq!(next_boundary(text, 1), 3);
        assert_eq!(prev_boundary(text, 3), 1);
        assert_eq!(prev_boundary(text, 0), 0);
        assert_eq!(next_boundary(text, text.len()), text.len());
    }
}

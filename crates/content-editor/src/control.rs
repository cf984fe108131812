use std::fmt;

use gpui_content_core::{
    Document, Editor, ImageBlockAttrs, PercentInput, PluginRegistry, Point, Selection, Transaction, from_html,
    to_html,
};
use serde_json::{Value, json};

use crate::error::EditorError;
use crate::events::{EditorEvent, EditorEventBus, EditorRequest, InstanceId};
use crate::ingest::{FilePickerGuard, ImageSink};
use crate::link::{LinkEdit, LinkOutcome};
use crate::options::EditorOptions;
use crate::prompts::{ImageTextPrompt, normalize_image_url};
use crate::slash::{KeyDisposition, SlashController, SlashKey, SlashOutcome};
use crate::toolbar::BubbleMenu;
use crate::width_sync::{FlushOutcome, WidthSync};

type ChangeCallback = Box<dyn FnMut(&str)>;

/// One editor instance: the document, its menus, and the HTML it reports.
pub struct ContentEditor {
    id: InstanceId,
    options: EditorOptions,
    editor: Editor,
    slash: SlashController,
    width_sync: WidthSync,
    bubble_menu: BubbleMenu,
    bus: EditorEventBus,
    picker: FilePickerGuard,
    on_change: Option<ChangeCallback>,
    html: String,
}

impl ContentEditor {
    pub fn new(id: InstanceId, options: EditorOptions) -> Result<Self, EditorError> {
        let registry = PluginRegistry::content()?;
        let editor = Editor::with_config(
            Document::new(Vec::new()),
            Selection::collapsed(Point::new(vec![0, 0], 0)),
            registry,
            options.editor_config(),
        );
        let mut this = Self {
            id,
            slash: SlashController::new(&options),
            options,
            html: to_html(editor.doc()),
            editor,
            width_sync: WidthSync::new(),
            bubble_menu: BubbleMenu::Hidden,
            bus: EditorEventBus::new(),
            picker: FilePickerGuard::new(),
            on_change: None,
        };
        this.refresh();
        Ok(this)
    }

    /// Shares `bus` with other editors on the same surface.
    pub fn with_bus(mut self, bus: EditorEventBus) -> Self {
        self.bus = bus;
        self
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn slash(&self) -> &SlashController {
        &self.slash
    }

    pub fn slash_mut(&mut self) -> &mut SlashController {
        &mut self.slash
    }

    pub fn width_sync(&self) -> &WidthSync {
        &self.width_sync
    }

    pub fn bubble_menu(&self) -> &BubbleMenu {
        &self.bubble_menu
    }

    pub fn bus(&self) -> &EditorEventBus {
        &self.bus
    }

    pub fn file_picker(&self) -> &FilePickerGuard {
        &self.picker
    }

    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn on_change(&mut self, callback: impl FnMut(&str) + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    /// Loads `html` when its canonical form differs from the current output.
    /// Clears undo history and does not report a change.
    pub fn set_content(&mut self, html: &str) -> bool {
        if html == self.html {
            return false;
        }
        let doc = from_html(html);
        let canonical = to_html(&doc);
        if canonical == self.html {
            return false;
        }
        tracing::info!(editor = %self.id, len = html.len(), "resyncing editor content");
        self.editor.replace_document(doc);
        self.html = to_html(self.editor.doc());
        self.slash.cancel();
        self.refresh();
        true
    }

    pub fn set_selection(&mut self, selection: Selection) {
        self.editor.set_selection(selection);
        self.refresh();
    }

    pub fn run_command(&mut self, id: &str, args: Option<Value>) -> Result<(), EditorError> {
        self.mutate(|editor| editor.run_command(id, args).map_err(EditorError::from))
    }

    pub fn apply(&mut self, tx: Transaction) -> Result<(), EditorError> {
        self.mutate(|editor| editor.apply(tx).map_err(EditorError::from))
    }

    pub fn undo(&mut self) -> bool {
        let mut undone = false;
        let _ = self.mutate(|editor| {
            undone = editor.undo();
            Ok(())
        });
        undone
    }

    pub fn redo(&mut self) -> bool {
        let mut redone = false;
        let _ = self.mutate(|editor| {
            redone = editor.redo();
            Ok(())
        });
        redone
    }

    /// Routes a key to the slash menu while it is open.
    pub fn handle_slash_key(
        &mut self,
        key: SlashKey,
    ) -> Result<(KeyDisposition, Option<SlashOutcome>), EditorError> {
        match self.slash.handle_key(key) {
            KeyDisposition::Confirm => {
                let outcome = self.confirm_slash()?;
                Ok((KeyDisposition::Handled, Some(outcome)))
            }
            other => Ok((other, None)),
        }
    }

    /// Runs the highlighted slash command and forwards its requests to the bus.
    pub fn confirm_slash(&mut self) -> Result<SlashOutcome, EditorError> {
        let slash = &mut self.slash;
        let outcome = Self::mutate_editor(
            &mut self.editor,
            &mut self.html,
            &mut self.on_change,
            |editor| slash.confirm(editor),
        );
        self.refresh();
        let outcome = outcome?;
        for request in &outcome.requests {
            self.request(request.clone());
        }
        Ok(outcome)
    }

    /// Queues a request for this instance's host.
    pub fn request(&self, request: EditorRequest) {
        self.bus.dispatch(EditorEvent {
            target: Some(self.id),
            request,
        });
    }

    pub fn take_requests(&self) -> Vec<EditorRequest> {
        self.bus.take_for(self.id)
    }

    pub fn request_width<'a>(&mut self, value: impl Into<PercentInput<'a>>) -> bool {
        self.width_sync.request_width(value)
    }

    /// The per-frame flush for width edits.
    pub fn flush_width(&mut self) -> Result<FlushOutcome, EditorError> {
        let sync = &mut self.width_sync;
        let outcome = Self::mutate_editor(
            &mut self.editor,
            &mut self.html,
            &mut self.on_change,
            |editor| sync.flush(editor),
        );
        self.refresh();
        outcome
    }

    pub fn begin_link_edit(&self) -> LinkEdit {
        LinkEdit::begin(&self.editor)
    }

    pub fn commit_link(
        &mut self,
        edit: &LinkEdit,
        url_input: &str,
        text: Option<&str>,
    ) -> Result<LinkOutcome, EditorError> {
        self.mutate(|editor| edit.commit(editor, url_input, text))
    }

    /// Inserts an image from a prompted URL, optionally at a document position.
    pub fn insert_image_from_url(
        &mut self,
        input: &str,
        position: Option<Point>,
    ) -> Result<(), EditorError> {
        let src = normalize_image_url(input)?;
        if let Some(point) = position {
            self.focus(point);
        }
        let width = self.options.default_image_width;
        self.insert_image(ImageBlockAttrs::new(src).width(width))
    }

    pub fn submit_image_text(
        &mut self,
        prompt: &ImageTextPrompt,
        answer: Option<&str>,
    ) -> Result<bool, EditorError> {
        self.mutate(|editor| prompt.submit(editor, answer))
    }

    fn mutate<T>(
        &mut self,
        f: impl FnOnce(&mut Editor) -> Result<T, EditorError>,
    ) -> Result<T, EditorError> {
        let result = Self::mutate_editor(&mut self.editor, &mut self.html, &mut self.on_change, f);
        self.refresh();
        result
    }

    /// Runs `f` and reports the new HTML when the document changed.
    fn mutate_editor<T>(
        editor: &mut Editor,
        html: &mut String,
        on_change: &mut Option<ChangeCallback>,
        f: impl FnOnce(&mut Editor) -> Result<T, EditorError>,
    ) -> Result<T, EditorError> {
        let version = editor.version();
        let result = f(editor);
        if let Err(err) = &result {
            tracing::warn!(%err, "editor command failed");
        }
        if editor.version() != version {
            *html = to_html(editor.doc());
            if let Some(callback) = on_change {
                callback(html);
            }
        }
        result
    }

    /// Re-derives the menus from the current document and selection.
    fn refresh(&mut self) {
        self.slash.update(&self.editor);
        self.width_sync.observe(&self.editor);
        self.bubble_menu = BubbleMenu::evaluate(&self.editor);
    }
}

impl ImageSink for ContentEditor {
    fn focus(&mut self, point: Point) {
        self.set_selection(Selection::collapsed(point));
    }

    fn insert_image(&mut self, attrs: ImageBlockAttrs) -> Result<(), EditorError> {
        let mut args = json!({
            "src": attrs.src,
            "alt": attrs.alt,
            "caption": attrs.caption,
            "width": attrs.width,
        });
        if let Some(title) = attrs.title {
            args["title"] = json!(title);
        }
        self.run_command("image.insert", Some(args))
    }

    fn default_image_width(&mut self) -> u32 {
        self.options.default_image_width
    }
}

impl fmt::Debug for ContentEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentEditor")
            .field("id", &self.id)
            .field("html", &self.html)
            .field("slash_open", &self.slash.is_open())
            .finish_non_exhaustive()
    }
}

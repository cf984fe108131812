//! The slash-command menu as an explicit `Idle`/`Open` state machine.
//!
//! The controller only reads the editor in [`SlashController::update`]; the
//! view calls it after every transaction or selection change and renders
//! whatever session results.

use gpui_content_core::{Editor, Node, active_text_block, point_global_offset};

use crate::commands::{CommandContext, CommandItem, TriggerRange, create_items, filter_items};
use crate::error::EditorError;
use crate::events::EditorRequest;
use crate::options::{EditorOptions, TableDefaults};

/// Screen rectangle of the caret the popup hangs from, in view pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlashSession {
    pub query: String,
    pub range: TriggerRange,
    /// Indices into the controller's items.
    pub items: Vec<usize>,
    pub selected_index: usize,
    pub anchor: Option<AnchorBounds>,
}

impl SlashSession {
    pub fn has_results(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn selected_item(&self) -> Option<usize> {
        self.items.get(self.selected_index).copied()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SlashState {
    #[default]
    Idle,
    Open(SlashSession),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlashKey {
    Up,
    Down,
    Tab,
    ShiftTab,
    Enter,
    Escape,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDisposition {
    /// The menu is closed; the key belongs to the document.
    Ignored,
    Handled,
    /// The caller should run [`SlashController::confirm`].
    Confirm,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlashOutcome {
    pub title: String,
    pub requests: Vec<EditorRequest>,
}

pub struct SlashController {
    items: Vec<CommandItem>,
    trigger: char,
    limit: usize,
    enabled: bool,
    table: TableDefaults,
    state: SlashState,
    /// Trigger the user escaped from; it stays closed until the trigger goes away.
    dismissed: Option<TriggerRange>,
}

impl SlashController {
    pub fn new(options: &EditorOptions) -> Self {
        Self::with_items(create_items(), options)
    }

    pub fn with_items(items: Vec<CommandItem>, options: &EditorOptions) -> Self {
        Self {
            items,
            trigger: options.trigger_char,
            limit: options.max_suggestions,
            enabled: options.enable_slash_commands,
            table: options.default_table,
            state: SlashState::Idle,
            dismissed: None,
        }
    }

    pub fn items(&self) -> &[CommandItem] {
        &self.items
    }

    pub fn state(&self) -> &SlashState {
        &self.state
    }

    pub fn session(&self) -> Option<&SlashSession> {
        match &self.state {
            SlashState::Open(session) => Some(session),
            SlashState::Idle => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, SlashState::Open(_))
    }

    /// Open with somewhere to draw. An open session without an anchor stays
    /// alive but hidden until the caret is laid out again.
    pub fn popup_visible(&self) -> bool {
        self.session().is_some_and(|s| s.anchor.is_some())
    }

    /// Opens, refreshes or closes the session for the editor's current state.
    pub fn update(&mut self, editor: &Editor) {
        let Some((range, query)) = self.detect(editor) else {
            self.dismissed = None;
            if self.is_open() {
                tracing::debug!("slash menu closed: trigger no longer at caret");
            }
            self.state = SlashState::Idle;
            return;
        };

        if let Some(dismissed) = &self.dismissed {
            if dismissed.block == range.block && dismissed.start == range.start {
                self.state = SlashState::Idle;
                return;
            }
            self.dismissed = None;
        }

        let items = filter_items(&self.items, &query, self.limit);
        match &mut self.state {
            SlashState::Open(session) => {
                if session.query != query || session.range != range {
                    session.selected_index = 0;
                }
                session.query = query;
                session.range = range;
                session.items = items;
                session.selected_index = session.selected_index.min(session.items.len().saturating_sub(1));
            }
            SlashState::Idle => {
                tracing::debug!(query = %query, "slash menu opened");
                self.state = SlashState::Open(SlashSession {
                    query,
                    range,
                    items,
                    selected_index: 0,
                    anchor: None,
                });
            }
        }
    }

    pub fn set_anchor(&mut self, anchor: Option<AnchorBounds>) {
        if let SlashState::Open(session) = &mut self.state {
            session.anchor = anchor;
        }
    }

    pub fn move_next(&mut self) {
        if let SlashState::Open(session) = &mut self.state {
            let len = session.items.len();
            if len > 0 {
                session.selected_index = (session.selected_index + 1) % len;
            }
        }
    }

    pub fn move_prev(&mut self) {
        if let SlashState::Open(session) = &mut self.state {
            let len = session.items.len();
            if len > 0 {
                session.selected_index = (session.selected_index + len - 1) % len;
            }
        }
    }

    /// Selects a row directly, for pointer hover.
    pub fn select(&mut self, index: usize) {
        if let SlashState::Open(session) = &mut self.state {
            if index < session.items.len() {
                session.selected_index = index;
            }
        }
    }

    pub fn cancel(&mut self) {
        if let SlashState::Open(session) = std::mem::take(&mut self.state) {
            tracing::debug!(query = %session.query, "slash menu cancelled");
            self.dismissed = Some(session.range);
        }
    }

    pub fn handle_key(&mut self, key: SlashKey) -> KeyDisposition {
        let Some(has_results) = self.session().map(SlashSession::has_results) else {
            return KeyDisposition::Ignored;
        };
        match key {
            SlashKey::Down | SlashKey::Tab => self.move_next(),
            SlashKey::Up | SlashKey::ShiftTab => self.move_prev(),
            SlashKey::Enter if has_results => return KeyDisposition::Confirm,
            SlashKey::Enter => {}
            SlashKey::Escape => self.cancel(),
        }
        KeyDisposition::Handled
    }

    /// Runs the selected item against the trigger range and closes the menu.
    pub fn confirm(&mut self, editor: &mut Editor) -> Result<SlashOutcome, EditorError> {
        let (range, item) = {
            let session = self.session().ok_or(EditorError::NothingSelected)?;
            let ix = session.selected_item().ok_or(EditorError::NothingSelected)?;
            let item = self.items.get(ix).ok_or(EditorError::NothingSelected)?;
            (session.range.clone(), item.clone())
        };
        self.state = SlashState::Idle;

        let mut cx = CommandContext::new(editor, range, self.table);
        if let Err(err) = (item.action)(&mut cx) {
            tracing::warn!(title = %item.title, %err, "slash command failed");
            return Err(err.into());
        }
        tracing::info!(title = %item.title, "slash command applied");
        Ok(SlashOutcome {
            title: item.title,
            requests: cx.into_requests(),
        })
    }

    fn detect(&self, editor: &Editor) -> Option<(TriggerRange, String)> {
        if !self.enabled {
            return None;
        }
        let selection = editor.selection();
        if !selection.is_collapsed() {
            return None;
        }
        let (block, el) = active_text_block(editor)?;
        if el.kind == "code_block" {
            return None;
        }

        let child_ix = *selection.focus.path.last()?;
        let caret = point_global_offset(&el.children, child_ix, selection.focus.offset);
        let text = inline_text(&el.children);
        let before = text.get(..caret)?;

        let start = before.rfind(self.trigger)?;
        let query = &before[start + self.trigger.len_utf8()..];
        if query.chars().any(char::is_whitespace) {
            return None;
        }
        if before[..start]
            .chars()
            .next_back()
            .is_some_and(|prev| !prev.is_whitespace())
        {
            return None;
        }

        Some((
            TriggerRange {
                block,
                start,
                end: caret,
            },
            query.to_string(),
        ))
    }
}

/// Block text with each inline void as one space, so offsets match the
/// document's global offsets.
fn inline_text(children: &[Node]) -> String {
    let mut out = String::new();
    for node in children {
        match node {
            Node::Text(t) => out.push_str(&t.text),
            Node::Void(_) => out.push(' '),
            Node::Element(_) => {}
        }
    }
    out
}

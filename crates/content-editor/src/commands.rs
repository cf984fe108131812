//! The slash-menu catalogue: a fixed, ordered list of insertable actions.

use std::fmt;
use std::sync::Arc;

use gpui_content_core::{CommandError, Editor, Path, Point, active_marks};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::events::EditorRequest;
use crate::options::TableDefaults;

/// Glyph shown next to a menu entry. Views map these onto their icon set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandIcon {
    Text,
    Heading1,
    Heading2,
    Heading3,
    BulletList,
    NumberedList,
    TaskList,
    Table,
    AlignLeft,
    AlignCenter,
    AlignRight,
    AlignJustify,
    Quote,
    Divider,
    Image,
    CodeBlock,
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Code,
    Link,
}

/// The typed trigger text, as byte offsets into a text block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerRange {
    pub block: Path,
    pub start: usize,
    pub end: usize,
}

pub struct CommandContext<'a> {
    pub editor: &'a mut Editor,
    pub range: TriggerRange,
    pub table: TableDefaults,
    outbox: Vec<EditorRequest>,
}

impl<'a> CommandContext<'a> {
    pub fn new(editor: &'a mut Editor, range: TriggerRange, table: TableDefaults) -> Self {
        Self {
            editor,
            range,
            table,
            outbox: Vec::new(),
        }
    }

    /// Removes the trigger text, leaving the caret where it started.
    pub fn delete_trigger(&mut self) -> Result<(), CommandError> {
        self.editor.run_command(
            "core.delete_range",
            Some(json!({
                "path": self.range.block,
                "start": self.range.start,
                "end": self.range.end,
            })),
        )
    }

    pub fn run(&mut self, id: &str, args: Option<Value>) -> Result<(), CommandError> {
        self.editor.run_command(id, args)
    }

    pub fn request(&mut self, request: EditorRequest) {
        self.outbox.push(request);
    }

    pub fn caret(&self) -> Point {
        self.editor.selection().focus.clone()
    }

    pub fn into_requests(self) -> Vec<EditorRequest> {
        self.outbox
    }
}

pub type CommandAction = Arc<dyn Fn(&mut CommandContext<'_>) -> Result<(), CommandError> + Send + Sync>;

#[derive(Clone)]
pub struct CommandItem {
    pub title: String,
    pub description: String,
    pub icon: CommandIcon,
    pub action: CommandAction,
}

impl CommandItem {
    fn new(
        title: &str,
        description: &str,
        icon: CommandIcon,
        action: impl Fn(&mut CommandContext<'_>) -> Result<(), CommandError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            title: title.to_string(),
            description: description.to_string(),
            icon,
            action: Arc::new(action),
        }
    }

    /// An item that deletes the trigger and runs one registry command.
    fn command(
        title: &str,
        description: &str,
        icon: CommandIcon,
        id: &'static str,
        args: Option<Value>,
    ) -> Self {
        Self::new(title, description, icon, move |cx| {
            cx.delete_trigger()?;
            cx.run(id, args.clone())
        })
    }

    pub fn matches(&self, query_lower: &str) -> bool {
        self.title.to_lowercase().contains(query_lower)
            || self.description.to_lowercase().contains(query_lower)
    }
}

impl fmt::Debug for CommandItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandItem")
            .field("title", &self.title)
            .field("icon", &self.icon)
            .finish_non_exhaustive()
    }
}

pub const DEFAULT_SUGGESTION_LIMIT: usize = 10;

/// Every slash command, in priority order.
pub fn create_items() -> Vec<CommandItem> {
    use CommandIcon as I;

    vec![
        CommandItem::command("Paragraph", "Plain body text.", I::Text, "block.set_paragraph", None),
        CommandItem::command(
            "Heading 1",
            "Large section heading.",
            I::Heading1,
            "block.set_heading",
            Some(json!({ "level": 1 })),
        ),
        CommandItem::command(
            "Heading 2",
            "Medium section heading.",
            I::Heading2,
            "block.set_heading",
            Some(json!({ "level": 2 })),
        ),
        CommandItem::command(
            "Heading 3",
            "Small section heading.",
            I::Heading3,
            "block.set_heading",
            Some(json!({ "level": 3 })),
        ),
        CommandItem::command(
            "Bullet List",
            "Create a simple bulleted list.",
            I::BulletList,
            "list.toggle_bulleted",
            None,
        ),
        CommandItem::command(
            "Numbered List",
            "Create a list with numbering.",
            I::NumberedList,
            "list.toggle_ordered",
            None,
        ),
        CommandItem::command(
            "Task List",
            "Track tasks with checkboxes.",
            I::TaskList,
            "list.toggle_task",
            None,
        ),
        CommandItem::new("Table", "Insert a grid of rows and columns.", I::Table, |cx| {
            cx.delete_trigger()?;
            let table = cx.table;
            cx.run(
                "table.insert",
                Some(json!({ "rows": table.rows, "cols": table.cols, "header": table.header })),
            )
        }),
        CommandItem::command(
            "Align Left",
            "Align text to the left.",
            I::AlignLeft,
            "block.set_align",
            Some(json!({ "align": "left" })),
        ),
        CommandItem::command(
            "Align Center",
            "Center text.",
            I::AlignCenter,
            "block.set_align",
            Some(json!({ "align": "center" })),
        ),
        CommandItem::command(
            "Align Right",
            "Align text to the right.",
            I::AlignRight,
            "block.set_align",
            Some(json!({ "align": "right" })),
        ),
        CommandItem::command(
            "Justify",
            "Stretch lines to both edges.",
            I::AlignJustify,
            "block.set_align",
            Some(json!({ "align": "justify" })),
        ),
        CommandItem::command("Quote", "Capture a quotation.", I::Quote, "blockquote.toggle", None),
        CommandItem::command(
            "Divider",
            "Separate sections with a line.",
            I::Divider,
            "core.insert_divider",
            None,
        ),
        CommandItem::new("Image", "Upload an image from your device.", I::Image, |cx| {
            cx.delete_trigger()?;
            let position = Some(cx.caret());
            cx.request(EditorRequest::OpenFilePicker { position });
            Ok(())
        }),
        CommandItem::command(
            "Code Block",
            "Show code with monospace formatting.",
            I::CodeBlock,
            "code_block.toggle",
            None,
        ),
        CommandItem::command("Bold", "Make text bold.", I::Bold, "marks.toggle_bold", None),
        CommandItem::command("Italic", "Make text italic.", I::Italic, "marks.toggle_italic", None),
        CommandItem::command(
            "Underline",
            "Underline text.",
            I::Underline,
            "marks.toggle_underline",
            None,
        ),
        CommandItem::command(
            "Strikethrough",
            "Cross text out.",
            I::Strikethrough,
            "marks.toggle_strikethrough",
            None,
        ),
        CommandItem::command(
            "Inline Code",
            "Mark text as code.",
            I::Code,
            "marks.toggle_code",
            None,
        ),
        CommandItem::new("Link", "Add a link to a web page.", I::Link, |cx| {
            cx.delete_trigger()?;
            let current = active_marks(&*cx.editor).link;
            cx.request(EditorRequest::PromptLink { current });
            Ok(())
        }),
    ]
}

/// Indices of the items whose title or description contains `query`,
/// ignoring case, in priority order and capped at `limit`.
pub fn filter_items(items: &[CommandItem], query: &str, limit: usize) -> Vec<usize> {
    let query = query.trim().to_lowercase();
    items
        .iter()
        .enumerate()
        .filter(|(_, item)| query.is_empty() || item.matches(&query))
        .map(|(ix, _)| ix)
        .take(limit)
        .collect()
}

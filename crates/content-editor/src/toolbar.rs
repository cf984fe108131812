//! The two bubble menus and the actions behind their buttons.

use gpui_content_core::{
    BlockAlign, Editor, ImageBlockAttrs, ListType, MAX_INDENT_LEVEL, Marks, Path,
    TableCapabilities, active_heading_level, active_indent_level, active_list_type, active_marks,
    active_text_block, ancestor_element_path, can_lift, can_sink, selected_image,
    table_capabilities,
};
use serde_json::{Value, json};

use crate::control::ContentEditor;
use crate::error::EditorError;
use crate::events::EditorRequest;

/// What the selection covers, computed once per selection change.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionKind {
    Caret,
    TextRange,
    ImageBlock { path: Path, attrs: ImageBlockAttrs },
    OtherNode,
}

impl SelectionKind {
    pub fn of(editor: &Editor) -> Self {
        let selection = editor.selection();
        if let Some(path) = selection.selected_void_path(editor.doc()) {
            return match editor.doc().node(&path).and_then(ImageBlockAttrs::from_node) {
                Some(attrs) => Self::ImageBlock { path, attrs },
                None => Self::OtherNode,
            };
        }
        if selection.is_collapsed() {
            Self::Caret
        } else {
            Self::TextRange
        }
    }
}

/// The active block type, as the heading sub-menu shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStyle {
    Paragraph,
    Heading(u64),
    CodeBlock,
    ListItem,
    Other,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextToolbarState {
    pub marks: Marks,
    pub block: BlockStyle,
    pub align: BlockAlign,
    pub list_type: Option<ListType>,
    pub can_sink: bool,
    pub can_lift: bool,
    /// Block indent level outside lists.
    pub indent: u64,
    pub table: TableCapabilities,
    pub in_code_block: bool,
    pub in_blockquote: bool,
    pub link: Option<String>,
    pub text_color: Option<String>,
    pub highlight_color: Option<String>,
}

impl TextToolbarState {
    pub fn read(editor: &Editor) -> Self {
        let marks = active_marks(editor);
        let block_el = active_text_block(editor);
        let block = match block_el.as_ref().map(|(_, el)| el.kind.as_str()) {
            Some("paragraph") => BlockStyle::Paragraph,
            Some("heading") => BlockStyle::Heading(active_heading_level(editor).unwrap_or(1)),
            Some("code_block") => BlockStyle::CodeBlock,
            Some("list_item") => BlockStyle::ListItem,
            _ => BlockStyle::Other,
        };
        let align = block_el
            .as_ref()
            .map_or(BlockAlign::Left, |(_, el)| BlockAlign::of(el));
        let in_blockquote =
            ancestor_element_path(editor.doc(), &editor.selection().focus.path, "blockquote")
                .is_some();

        Self {
            link: marks.link.clone(),
            text_color: marks.text_color.clone(),
            highlight_color: marks.highlight_color.clone(),
            marks,
            block,
            align,
            list_type: active_list_type(editor),
            can_sink: can_sink(editor),
            can_lift: can_lift(editor),
            indent: active_indent_level(editor),
            table: table_capabilities(editor),
            in_code_block: block == BlockStyle::CodeBlock,
            in_blockquote,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageToolbarState {
    pub path: Path,
    pub attrs: ImageBlockAttrs,
}

impl ImageToolbarState {
    pub fn has_alt(&self) -> bool {
        !self.attrs.alt.is_empty()
    }

    pub fn has_caption(&self) -> bool {
        !self.attrs.caption.is_empty()
    }
}

/// Which bubble menu shows. The text and image menus never show together.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum BubbleMenu {
    #[default]
    Hidden,
    Text(Box<TextToolbarState>),
    Image(ImageToolbarState),
}

impl BubbleMenu {
    pub fn evaluate(editor: &Editor) -> Self {
        match SelectionKind::of(editor) {
            SelectionKind::TextRange => Self::Text(Box::new(TextToolbarState::read(editor))),
            SelectionKind::ImageBlock { path, attrs } => {
                Self::Image(ImageToolbarState { path, attrs })
            }
            SelectionKind::Caret | SelectionKind::OtherNode => Self::Hidden,
        }
    }

    pub fn is_visible(&self) -> bool {
        !matches!(self, Self::Hidden)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolbarAction {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    InlineCode,
    Subscript,
    Superscript,
    Paragraph,
    Heading(u64),
    Align(BlockAlign),
    Indent,
    Outdent,
    List(ListType),
    ClearList,
    Blockquote,
    CodeBlock,
    Divider,
    InsertTable,
    TableRowAbove,
    TableRowBelow,
    TableColLeft,
    TableColRight,
    TableDeleteRow,
    TableDeleteCol,
    TableToggleHeader,
    TableDelete,
    TextColor(String),
    ResetTextColor,
    Highlight(String),
    ResetHighlight,
    Link,
    UploadImage,
    ImageFromUrl,
    EditAlt,
    EditCaption,
}

impl ToolbarAction {
    /// Whether the button is clickable for the current text selection.
    pub fn is_enabled(&self, state: &TextToolbarState) -> bool {
        let table = &state.table;
        match self {
            Self::Indent if state.list_type.is_some() => state.can_sink,
            Self::Outdent if state.list_type.is_some() => state.can_lift,
            Self::Indent => state.indent < MAX_INDENT_LEVEL,
            Self::Outdent => state.indent > 0,
            Self::ClearList => state.list_type.is_some(),
            Self::InsertTable => !table.in_table,
            Self::TableRowAbove | Self::TableRowBelow => table.can_add_row,
            Self::TableColLeft | Self::TableColRight => table.can_add_col,
            Self::TableDeleteRow => table.can_delete_row,
            Self::TableDeleteCol => table.can_delete_col,
            Self::TableToggleHeader | Self::TableDelete => table.in_table,
            _ => true,
        }
    }

    /// Whether the button shows as pressed.
    pub fn is_active(&self, state: &TextToolbarState) -> bool {
        let marks = &state.marks;
        match self {
            Self::Bold => marks.bold,
            Self::Italic => marks.italic,
            Self::Underline => marks.underline,
            Self::Strikethrough => marks.strikethrough,
            Self::InlineCode => marks.code,
            Self::Subscript => marks.subscript,
            Self::Superscript => marks.superscript,
            Self::Paragraph => state.block == BlockStyle::Paragraph,
            Self::Heading(level) => state.block == BlockStyle::Heading(*level),
            Self::Align(align) => state.align == *align,
            Self::List(list_type) => state.list_type == Some(*list_type),
            Self::Blockquote => state.in_blockquote,
            Self::CodeBlock => state.in_code_block,
            Self::TableToggleHeader => state.table.has_header_row,
            Self::TextColor(color) => state.text_color.as_deref() == Some(color.as_str()),
            Self::Highlight(color) => state.highlight_color.as_deref() == Some(color.as_str()),
            Self::Link => state.link.is_some(),
            _ => false,
        }
    }

    /// The registry command behind a plain formatting button.
    fn command(&self, editor: &Editor) -> Option<(&'static str, Option<Value>)> {
        let in_list = active_list_type(editor).is_some();
        let command = match self {
            Self::Bold => ("marks.toggle_bold", None),
            Self::Italic => ("marks.toggle_italic", None),
            Self::Underline => ("marks.toggle_underline", None),
            Self::Strikethrough => ("marks.toggle_strikethrough", None),
            Self::InlineCode => ("marks.toggle_code", None),
            Self::Subscript => ("marks.toggle_subscript", None),
            Self::Superscript => ("marks.toggle_superscript", None),
            Self::Paragraph => ("block.set_paragraph", None),
            Self::Heading(level) => ("block.set_heading", Some(json!({ "level": level }))),
            Self::Align(align) => ("block.set_align", Some(json!({ "align": align.as_str() }))),
            Self::Indent if in_list => ("list.sink", None),
            Self::Indent => ("block.indent_increase", None),
            Self::Outdent if in_list => ("list.lift", None),
            Self::Outdent => ("block.indent_decrease", None),
            Self::List(ListType::Bulleted) => ("list.toggle_bulleted", None),
            Self::List(ListType::Ordered) => ("list.toggle_ordered", None),
            Self::List(ListType::Task) => ("list.toggle_task", None),
            Self::ClearList => ("list.clear", None),
            Self::Blockquote => ("blockquote.toggle", None),
            Self::CodeBlock => ("code_block.toggle", None),
            Self::Divider => ("core.insert_divider", None),
            Self::TableRowAbove => ("table.insert_row_above", None),
            Self::TableRowBelow => ("table.insert_row_below", None),
            Self::TableColLeft => ("table.insert_col_left", None),
            Self::TableColRight => ("table.insert_col_right", None),
            Self::TableDeleteRow => ("table.delete_row", None),
            Self::TableDeleteCol => ("table.delete_col", None),
            Self::TableToggleHeader => ("table.toggle_header_row", None),
            Self::TableDelete => ("table.delete_table", None),
            Self::TextColor(color) => ("marks.set_text_color", Some(json!({ "color": color }))),
            Self::ResetTextColor => ("marks.unset_text_color", None),
            Self::Highlight(color) => {
                ("marks.set_highlight_color", Some(json!({ "color": color })))
            }
            Self::ResetHighlight => ("marks.unset_highlight_color", None),
            Self::InsertTable
            | Self::Link
            | Self::UploadImage
            | Self::ImageFromUrl
            | Self::EditAlt
            | Self::EditCaption => return None,
        };
        Some(command)
    }
}

/// Runs a toolbar button: either a registry command or a request to the host.
pub fn apply_action(editor: &mut ContentEditor, action: &ToolbarAction) -> Result<(), EditorError> {
    if let Some((id, args)) = action.command(editor.editor()) {
        return editor.run_command(id, args);
    }

    let caret = Some(editor.editor().selection().focus.clone());
    match action {
        ToolbarAction::InsertTable => {
            let table = editor.options().default_table;
            editor.run_command(
                "table.insert",
                Some(json!({ "rows": table.rows, "cols": table.cols, "header": table.header })),
            )
        }
        ToolbarAction::Link => {
            let current = active_marks(editor.editor()).link;
            editor.request(EditorRequest::PromptLink { current });
            Ok(())
        }
        ToolbarAction::UploadImage => {
            editor.request(EditorRequest::OpenFilePicker { position: caret });
            Ok(())
        }
        ToolbarAction::ImageFromUrl => {
            editor.request(EditorRequest::PromptImageUrl { position: caret });
            Ok(())
        }
        ToolbarAction::EditAlt | ToolbarAction::EditCaption => {
            let (path, attrs) =
                selected_image(editor.editor()).ok_or(EditorError::NoImageSelected)?;
            let request = if *action == ToolbarAction::EditAlt {
                EditorRequest::PromptImageAlt {
                    path,
                    current: attrs.alt,
                }
            } else {
                EditorRequest::PromptImageCaption {
                    path,
                    current: attrs.caption,
                }
            };
            editor.request(request);
            Ok(())
        }
        _ => Ok(()),
    }
}

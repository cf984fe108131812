use serde_json::Value;

use crate::core::{AttrPatch, Attrs, Document, Editor, ElementNode, Node, Point, Selection};
use crate::ops::{Op, Path, Transaction};
use crate::plugin::{
    CommandError, CommandSpec, ContentPlugin, NodeSpec, NormalizePass, PluginRegistry, QuerySpec,
    commit,
};
use crate::plugins::{replace_block_ops, retype_block};
use crate::tree::{
    active_text_block, ancestor_element_path, element_is_text_block, ordered_selection_points,
    selected_text_blocks, string_arg, visit_nodes,
};

pub const MAX_INDENT_LEVEL: u64 = 8;
pub const MAX_HEADING_LEVEL: u64 = 6;

pub(crate) struct HeadingPlugin;

impl ContentPlugin for HeadingPlugin {
    fn id(&self) -> &'static str {
        "heading"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::text_block("heading")]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(NormalizeHeadingLevels)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("block.set_heading", "Set heading", |editor, args| {
                let level = args
                    .as_ref()
                    .and_then(|v| v.get("level"))
                    .and_then(Value::as_u64)
                    .unwrap_or(1)
                    .clamp(1, MAX_HEADING_LEVEL);
                let result = set_heading(editor, level);
                commit(editor, result, "set heading")
            })
            .description("Turn the selected text blocks into headings.")
            .keywords(["heading", "title", "h1", "h2", "h3"])
            .args_example(serde_json::json!({ "level": 2 })),
            CommandSpec::new("block.set_paragraph", "Set paragraph", |editor, _args| {
                let result = set_paragraph(editor);
                commit(editor, result, "set paragraph")
            })
            .description("Turn the selected text blocks into plain paragraphs.")
            .keywords(["paragraph", "text", "normal"]),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![
            QuerySpec::new("block.kind", |editor, _args| Ok(active_block_kind(editor))),
            QuerySpec::new("block.heading_level", |editor, _args| {
                Ok(active_heading_level(editor).map_or(Value::Null, Value::from))
            }),
        ]
    }
}

struct NormalizeHeadingLevels;

impl NormalizePass for NormalizeHeadingLevels {
    fn id(&self) -> &'static str {
        "heading.normalize_levels"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        visit_nodes(doc, &mut |node, path| {
            let Node::Element(el) = node else {
                return;
            };
            if el.kind != "heading" {
                return;
            }
            let current = el.attrs.get("level").and_then(Value::as_u64);
            let level = current.unwrap_or(1).clamp(1, MAX_HEADING_LEVEL);
            if current != Some(level) {
                ops.push(Op::SetNodeAttrs {
                    path: path.to_vec(),
                    patch: AttrPatch::set("level", level),
                });
            }
        });
        ops
    }
}

pub(crate) struct CodeBlockPlugin;

impl ContentPlugin for CodeBlockPlugin {
    fn id(&self) -> &'static str {
        "code_block"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::text_block("code_block")]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("code_block.toggle", "Toggle code block", |editor, _args| {
                let result = toggle_code_block(editor);
                commit(editor, result, "toggle code block")
            })
            .description("Toggle code block for the selected text blocks.")
            .keywords(["code block", "code", "pre", "monospace"]),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("code_block.is_active", |editor, _args| {
            Ok(Value::Bool(
                active_text_block(editor).is_some_and(|(_, el)| el.kind == "code_block"),
            ))
        })]
    }
}

pub(crate) struct BlockquotePlugin;

impl ContentPlugin for BlockquotePlugin {
    fn id(&self) -> &'static str {
        "blockquote"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::container("blockquote")]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(NormalizeBlockquoteChildren)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("blockquote.toggle", "Toggle blockquote", |editor, _args| {
                let result = if is_in_blockquote(editor) {
                    unwrap_nearest_blockquote(editor)
                } else {
                    wrap_selection_in_blockquote(editor)
                };
                commit(editor, result, "toggle blockquote")
            })
            .description("Wrap the selected blocks in a quote, or unwrap the enclosing quote.")
            .keywords(["blockquote", "quote", "citation"]),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("blockquote.is_active", |editor, _args| {
            Ok(Value::Bool(is_in_blockquote(editor)))
        })]
    }
}

struct NormalizeBlockquoteChildren;

impl NormalizePass for NormalizeBlockquoteChildren {
    fn id(&self) -> &'static str {
        "blockquote.ensure_non_empty"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        visit_nodes(doc, &mut |node, path| {
            if let Node::Element(el) = node {
                if el.kind == "blockquote" && el.children.is_empty() {
                    let mut child = path.to_vec();
                    child.push(0);
                    ops.push(Op::InsertNode {
                        path: child,
                        node: Node::paragraph(""),
                    });
                }
            }
        });
        ops
    }
}

pub(crate) struct AlignPlugin;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockAlign {
    Left,
    Center,
    Right,
    Justify,
}

impl BlockAlign {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "left" => Some(Self::Left),
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            "justify" => Some(Self::Justify),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
            Self::Justify => "justify",
        }
    }

    pub fn of(el: &ElementNode) -> Self {
        el.attrs
            .get("align")
            .and_then(Value::as_str)
            .and_then(Self::parse)
            .unwrap_or(Self::Left)
    }
}

impl ContentPlugin for AlignPlugin {
    fn id(&self) -> &'static str {
        "align"
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(NormalizeAlignAttrs)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("block.set_align", "Set alignment", |editor, args| {
                let align = string_arg(args.as_ref(), "align")
                    .ok_or_else(|| CommandError::new("Missing args.align"))?;
                let align = BlockAlign::parse(&align)
                    .ok_or_else(|| CommandError::new(format!("Invalid align value: {align}")))?;
                let result = set_block_align(editor, align);
                commit(editor, result, "set alignment")
            })
            .description("Set text alignment for the selected blocks.")
            .keywords(["align", "left", "center", "right", "justify"])
            .args_example(serde_json::json!({ "align": "center" })),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("block.align", |editor, _args| {
            Ok(active_text_block(editor).map_or(Value::Null, |(_, el)| {
                Value::String(BlockAlign::of(el).as_str().to_string())
            }))
        })]
    }
}

struct NormalizeAlignAttrs;

impl NormalizePass for NormalizeAlignAttrs {
    fn id(&self) -> &'static str {
        "block.normalize_align_attrs"
    }

    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        visit_nodes(doc, &mut |node, path| {
            let Node::Element(el) = node else {
                return;
            };
            let Some(value) = el.attrs.get("align") else {
                return;
            };
            let keep = match value.as_str().and_then(BlockAlign::parse) {
                Some(BlockAlign::Left) | None => false,
                Some(_) => element_is_text_block(el, registry),
            };
            if !keep {
                ops.push(Op::SetNodeAttrs {
                    path: path.to_vec(),
                    patch: AttrPatch::remove("align"),
                });
            }
        });
        ops
    }
}

pub(crate) struct IndentPlugin;

#[derive(Debug, Clone, Copy)]
enum IndentDirection {
    Increase,
    Decrease,
}

impl ContentPlugin for IndentPlugin {
    fn id(&self) -> &'static str {
        "indent"
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(NormalizeIndentAttrs)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("block.indent_increase", "Increase indent", |editor, _args| {
                let result = adjust_indent(editor, IndentDirection::Increase);
                commit(editor, result, "increase indent")
            })
            .description("Increase the indent level of the selected blocks.")
            .keywords(["indent", "tab", "increase"]),
            CommandSpec::new("block.indent_decrease", "Decrease indent", |editor, _args| {
                let result = adjust_indent(editor, IndentDirection::Decrease);
                commit(editor, result, "decrease indent")
            })
            .description("Decrease the indent level of the selected blocks.")
            .keywords(["indent", "outdent", "decrease"]),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("block.indent_level", |editor, _args| {
            Ok(Value::from(active_indent_level(editor)))
        })]
    }
}

struct NormalizeIndentAttrs;

impl NormalizePass for NormalizeIndentAttrs {
    fn id(&self) -> &'static str {
        "block.normalize_indent_attrs"
    }

    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        visit_nodes(doc, &mut |node, path| {
            let Node::Element(el) = node else {
                return;
            };
            if !element_is_text_block(el, registry) {
                return;
            }
            // `list_level` 0 is meaningful on list items; `indent` 0 is stored as absent.
            for key in ["indent", "list_level"] {
                let Some(value) = el.attrs.get(key) else {
                    continue;
                };
                let patch = match value.as_u64() {
                    None => Some(AttrPatch::remove(key)),
                    Some(0) if key == "indent" => Some(AttrPatch::remove(key)),
                    Some(level) if level > MAX_INDENT_LEVEL => {
                        Some(AttrPatch::set(key, MAX_INDENT_LEVEL))
                    }
                    Some(_) => None,
                };
                if let Some(patch) = patch {
                    ops.push(Op::SetNodeAttrs {
                        path: path.to_vec(),
                        patch,
                    });
                }
            }
        });
        ops
    }
}

/// Which attribute holds nesting for this block, and its current value.
fn level_attr(el: &ElementNode) -> (&'static str, u64) {
    let key = if el.kind == "list_item" {
        "list_level"
    } else {
        "indent"
    };
    let level = el.attrs.get(key).and_then(Value::as_u64).unwrap_or(0);
    (key, level.min(MAX_INDENT_LEVEL))
}

fn active_block_kind(editor: &Editor) -> Value {
    let doc = editor.doc();
    if let Some(path) = editor.selection().selected_void_path(doc) {
        return doc
            .node(&path)
            .and_then(Node::kind)
            .map_or(Value::Null, |kind| Value::String(kind.to_string()));
    }
    active_text_block(editor).map_or(Value::Null, |(_, el)| Value::String(el.kind.clone()))
}

/// Indent level of the active block: `list_level` for list items, `indent` otherwise.
pub fn active_indent_level(editor: &Editor) -> u64 {
    active_text_block(editor).map_or(0, |(_, el)| level_attr(el).1)
}

pub fn active_heading_level(editor: &Editor) -> Option<u64> {
    let (_, el) = active_text_block(editor)?;
    if el.kind != "heading" {
        return None;
    }
    Some(
        el.attrs
            .get("level")
            .and_then(Value::as_u64)
            .unwrap_or(1)
            .clamp(1, MAX_HEADING_LEVEL),
    )
}

fn retype_selected(
    editor: &Editor,
    source: &str,
    mut retype: impl FnMut(&ElementNode) -> Option<ElementNode>,
) -> Result<Transaction, String> {
    let mut ops: Vec<Op> = Vec::new();
    for block in selected_text_blocks(editor)? {
        if let Some(next) = retype(block.el) {
            ops.extend(replace_block_ops(&block.path, Node::Element(next)));
        }
    }
    Ok(Transaction::new(ops)
        .selection_after(editor.selection().clone())
        .source(source))
}

fn set_heading(editor: &Editor, level: u64) -> Result<Transaction, String> {
    retype_selected(editor, "command:block.set_heading", |el| {
        let current = el.attrs.get("level").and_then(Value::as_u64);
        if el.kind == "heading" && current == Some(level) {
            return None;
        }
        let mut extra = Attrs::default();
        extra.insert("level".to_string(), Value::from(level));
        Some(retype_block(el, "heading", extra))
    })
}

fn set_paragraph(editor: &Editor) -> Result<Transaction, String> {
    retype_selected(editor, "command:block.set_paragraph", |el| {
        (el.kind != "paragraph").then(|| retype_block(el, "paragraph", Attrs::default()))
    })
}

fn toggle_code_block(editor: &Editor) -> Result<Transaction, String> {
    let (_, active) = active_text_block(editor).ok_or("Active block is not a text block")?;
    let target = if active.kind == "code_block" {
        "paragraph"
    } else {
        "code_block"
    };
    retype_selected(editor, "command:code_block.toggle", |el| {
        (el.kind != target).then(|| retype_block(el, target, Attrs::default()))
    })
}

fn set_block_align(editor: &Editor, align: BlockAlign) -> Result<Transaction, String> {
    let mut ops: Vec<Op> = Vec::new();
    for block in selected_text_blocks(editor)? {
        if BlockAlign::of(block.el) == align {
            continue;
        }
        let patch = match align {
            BlockAlign::Left => AttrPatch::remove("align"),
            other => AttrPatch::set("align", other.as_str()),
        };
        ops.push(Op::SetNodeAttrs {
            path: block.path.clone(),
            patch,
        });
    }

    Ok(Transaction::new(ops)
        .selection_after(editor.selection().clone())
        .source("command:block.set_align"))
}

fn adjust_indent(editor: &Editor, direction: IndentDirection) -> Result<Transaction, String> {
    let mut ops: Vec<Op> = Vec::new();
    for block in selected_text_blocks(editor)? {
        let (key, current) = level_attr(block.el);
        let next = match direction {
            IndentDirection::Increase => current.saturating_add(1).min(MAX_INDENT_LEVEL),
            IndentDirection::Decrease => current.saturating_sub(1),
        };
        if next == current {
            continue;
        }
        let patch = if next == 0 && key == "indent" {
            AttrPatch::remove(key)
        } else {
            AttrPatch::set(key, next)
        };
        ops.push(Op::SetNodeAttrs {
            path: block.path.clone(),
            patch,
        });
    }

    let source = match direction {
        IndentDirection::Increase => "command:block.indent_increase",
        IndentDirection::Decrease => "command:block.indent_decrease",
    };
    Ok(Transaction::new(ops)
        .selection_after(editor.selection().clone())
        .source(source))
}

fn is_in_blockquote(editor: &Editor) -> bool {
    ancestor_element_path(editor.doc(), &editor.selection().focus.path, "blockquote").is_some()
}

fn wrap_selection_in_blockquote(editor: &Editor) -> Result<Transaction, String> {
    let sel = editor.selection().clone();
    let (start, end) = ordered_selection_points(&sel);
    let block_of = |point: &Point| -> Result<Path, String> {
        if editor.doc().node(&point.path).is_some_and(|n| matches!(n, Node::Void(_))) {
            return Ok(point.path.clone());
        }
        point
            .path
            .split_last()
            .map(|(_, p)| p.to_vec())
            .ok_or_else(|| "Selection is not in a block".to_string())
    };
    let start_block_path = block_of(&start)?;
    let end_block_path = block_of(&end)?;

    let (&start_ix, start_parent) = start_block_path
        .split_last()
        .ok_or_else(|| "Selection start is not a block node".to_string())?;
    let (&end_ix, end_parent) = end_block_path
        .split_last()
        .ok_or_else(|| "Selection end is not a block node".to_string())?;
    if start_parent != end_parent {
        return Err("Selection must be within a single block container".into());
    }
    let (start_ix, end_ix) = (start_ix.min(end_ix), start_ix.max(end_ix));

    let parent_children = editor
        .doc()
        .children_at(start_parent)
        .ok_or_else(|| "Selection parent is not a container".to_string())?;
    if end_ix >= parent_children.len() {
        return Err("Selection block range is out of bounds".into());
    }

    let quote = Node::element(
        "blockquote",
        Attrs::default(),
        parent_children[start_ix..=end_ix].to_vec(),
    );

    let mut ops: Vec<Op> = (start_ix..=end_ix)
        .rev()
        .map(|ix| {
            let mut path = start_parent.to_vec();
            path.push(ix);
            Op::RemoveNode { path }
        })
        .collect();
    let mut insert_path = start_parent.to_vec();
    insert_path.push(start_ix);
    ops.push(Op::InsertNode {
        path: insert_path,
        node: quote,
    });

    let depth = start_parent.len();
    let remap = |point: &Point| -> Point {
        if !point.path.starts_with(start_parent) || point.path.len() <= depth {
            return point.clone();
        }
        let block_ix = point.path[depth];
        if block_ix < start_ix || block_ix > end_ix {
            return point.clone();
        }
        let mut path = start_parent.to_vec();
        path.push(start_ix);
        path.push(block_ix - start_ix);
        path.extend_from_slice(&point.path[depth + 1..]);
        Point::new(path, point.offset)
    };

    Ok(Transaction::new(ops)
        .selection_after(Selection {
            anchor: remap(&sel.anchor),
            focus: remap(&sel.focus),
        })
        .source("command:blockquote.toggle"))
}

fn unwrap_nearest_blockquote(editor: &Editor) -> Result<Transaction, String> {
    let sel = editor.selection().clone();
    let Some(quote_path) = ancestor_element_path(editor.doc(), &sel.focus.path, "blockquote")
    else {
        return Ok(Transaction::new(Vec::new()));
    };
    let (&quote_ix, parent_path) = quote_path
        .split_last()
        .ok_or_else(|| "Invalid blockquote path".to_string())?;
    let Some(Node::Element(quote)) = editor.doc().node(&quote_path) else {
        return Err("Blockquote node not found".into());
    };

    let mut ops = vec![Op::RemoveNode {
        path: quote_path.clone(),
    }];
    for (i, node) in quote.children.iter().cloned().enumerate() {
        let mut path = parent_path.to_vec();
        path.push(quote_ix + i);
        ops.push(Op::InsertNode { path, node });
    }

    let depth = quote_path.len();
    let remap = |point: &Point| -> Point {
        if point.path.len() <= depth || !point.path.starts_with(&quote_path) {
            return point.clone();
        }
        let mut path = parent_path.to_vec();
        path.push(quote_ix + point.path[depth]);
        path.extend_from_slice(&point.path[depth + 1..]);
        Point::new(path, point.offset)
    };

    Ok(Transaction::new(ops)
        .selection_after(Selection {
            anchor: remap(&sel.anchor),
            focus: remap(&sel.focus),
        })
        .source("command:blockquote.toggle"))
}

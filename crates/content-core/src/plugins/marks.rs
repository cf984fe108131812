use serde_json::Value;

use crate::core::{Editor, Marks, Node, Point, Selection, TextNode, clamp_to_char_boundary};
use crate::ops::{Op, Transaction};
use crate::plugin::{CommandError, CommandSpec, ContentPlugin, QueryError, QuerySpec, commit};
use crate::tree::{
    apply_marks_in_block, is_point_in_block, point_for_global_offset, point_global_offset,
    replace_children_ops, selected_text_blocks, string_arg, total_inline_text_len,
};

pub(crate) struct MarksPlugin;

type MarkGet = fn(&Marks) -> bool;
type MarkSet = fn(&mut Marks, bool);

/// Boolean marks: command suffix, label, accessors, keywords.
fn bool_marks() -> [(&'static str, &'static str, MarkGet, MarkSet, &'static [&'static str]); 7] {
    [
        ("bold", "Bold", |m| m.bold, |m, v| m.bold = v, &["bold", "strong"]),
        ("italic", "Italic", |m| m.italic, |m, v| m.italic = v, &["italic", "emphasis"]),
        ("underline", "Underline", |m| m.underline, |m, v| m.underline = v, &["underline"]),
        (
            "strikethrough",
            "Strikethrough",
            |m| m.strikethrough,
            |m, v| m.strikethrough = v,
            &["strikethrough", "strike"],
        ),
        ("code", "Inline code", |m| m.code, |m, v| m.code = v, &["code", "monospace"]),
        (
            "subscript",
            "Subscript",
            |m| m.subscript,
            |m, v| {
                m.subscript = v;
                if v {
                    m.superscript = false;
                }
            },
            &["subscript", "sub"],
        ),
        (
            "superscript",
            "Superscript",
            |m| m.superscript,
            |m, v| {
                m.superscript = v;
                if v {
                    m.subscript = false;
                }
            },
            &["superscript", "sup"],
        ),
    ]
}

impl ContentPlugin for MarksPlugin {
    fn id(&self) -> &'static str {
        "marks"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        let mut commands: Vec<CommandSpec> = bool_marks()
            .into_iter()
            .map(|(name, label, get, set, keywords)| {
                let id = format!("marks.toggle_{name}");
                let source = format!("command:{id}");
                CommandSpec::new(id, format!("Toggle {}", label.to_lowercase()), move |editor, _args| {
                    let result = toggle_bool_mark(editor, get, set, &source);
                    commit(editor, result, "toggle mark")
                })
                .description(format!("Toggle {} on the selection or caret.", label.to_lowercase()))
                .keywords(keywords.iter().copied().chain(["mark"]))
            })
            .collect();

        commands.extend([
            CommandSpec::new("marks.set_link", "Set link", |editor, args| {
                let url = string_arg(args.as_ref(), "url")
                    .ok_or_else(|| CommandError::new("Missing args.url"))?;
                let result = set_optional_string_mark(
                    editor,
                    |m, v| m.link = v,
                    Some(url),
                    "command:marks.set_link",
                );
                commit(editor, result, "set link")
            })
            .description("Set the link mark on the selection or caret.")
            .keywords(["link", "url", "hyperlink"])
            .args_example(serde_json::json!({ "url": "https://example.com" })),
            CommandSpec::new("marks.unset_link", "Unset link", |editor, _args| {
                let result = set_optional_string_mark(
                    editor,
                    |m, v| m.link = v,
                    None,
                    "command:marks.unset_link",
                );
                commit(editor, result, "unset link")
            })
            .description("Remove the link mark from the selection or caret.")
            .keywords(["link", "unlink", "url", "hyperlink"]),
            CommandSpec::new("marks.insert_link", "Insert link", |editor, args| {
                let url = string_arg(args.as_ref(), "url")
                    .ok_or_else(|| CommandError::new("Missing args.url"))?;
                let text = string_arg(args.as_ref(), "text")
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| url.clone());
                let result = insert_link(editor, url, text);
                commit(editor, result, "insert link")
            })
            .description("Insert linked text at the caret.")
            .keywords(["link", "url", "hyperlink"])
            .args_example(serde_json::json!({ "url": "https://example.com", "text": "Example" })),
            CommandSpec::new("marks.set_text_color", "Set text color", |editor, args| {
                let color = string_arg(args.as_ref(), "color")
                    .ok_or_else(|| CommandError::new("Missing args.color"))?;
                let result = set_optional_string_mark(
                    editor,
                    |m, v| m.text_color = v,
                    Some(color),
                    "command:marks.set_text_color",
                );
                commit(editor, result, "set text color")
            })
            .description("Set the text color (args.color as a CSS color).")
            .keywords(["color", "text color", "foreground"])
            .args_example(serde_json::json!({ "color": "#DC2626" })),
            CommandSpec::new("marks.unset_text_color", "Unset text color", |editor, _args| {
                let result = set_optional_string_mark(
                    editor,
                    |m, v| m.text_color = v,
                    None,
                    "command:marks.unset_text_color",
                );
                commit(editor, result, "unset text color")
            })
            .description("Remove the text color from the selection or caret.")
            .keywords(["color", "text color", "reset"]),
            CommandSpec::new("marks.set_highlight_color", "Set highlight color", |editor, args| {
                let color = string_arg(args.as_ref(), "color")
                    .ok_or_else(|| CommandError::new("Missing args.color"))?;
                let result = set_optional_string_mark(
                    editor,
                    |m, v| m.highlight_color = v,
                    Some(color),
                    "command:marks.set_highlight_color",
                );
                commit(editor, result, "set highlight color")
            })
            .description("Set the highlight color (args.color as a CSS color).")
            .keywords(["highlight", "background", "color"])
            .args_example(serde_json::json!({ "color": "#FEF08A" })),
            CommandSpec::new(
                "marks.unset_highlight_color",
                "Unset highlight color",
                |editor, _args| {
                    let result = set_optional_string_mark(
                        editor,
                        |m, v| m.highlight_color = v,
                        None,
                        "command:marks.unset_highlight_color",
                    );
                    commit(editor, result, "unset highlight color")
                },
            )
            .description("Remove the highlight color from the selection or caret.")
            .keywords(["highlight", "background", "reset"]),
        ]);
        commands
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![
            QuerySpec::new("marks.get_active", |editor, _args| {
                serde_json::to_value(active_marks(editor))
                    .map_err(|err| QueryError::new(format!("Failed to encode marks: {err}")))
            }),
            QuerySpec::new("marks.has_link_active", |editor, _args| {
                Ok(Value::Bool(active_marks(editor).link.is_some()))
            }),
        ]
    }
}

/// Marks of the text leaf holding the caret, or for a range the marks every
/// selected text leaf shares.
pub fn active_marks(editor: &Editor) -> Marks {
    let focus_marks = || match editor.doc().node(&editor.selection().focus.path) {
        Some(Node::Text(text)) => text.marks.clone(),
        _ => Marks::default(),
    };
    if editor.selection().is_collapsed() {
        return focus_marks();
    }

    let leaves = match selected_text_leaves(editor) {
        Ok(leaves) => leaves,
        Err(_) => return focus_marks(),
    };
    let mut leaves = leaves.into_iter();
    let Some(first) = leaves.next() else {
        return focus_marks();
    };
    leaves.fold(first.marks.clone(), |acc, leaf| shared_marks(acc, &leaf.marks))
}

fn shared_marks(mut acc: Marks, other: &Marks) -> Marks {
    for (_, _, get, set, _) in bool_marks() {
        if get(&acc) && !get(other) {
            set(&mut acc, false);
        }
    }
    if acc.text_color != other.text_color {
        acc.text_color = None;
    }
    if acc.highlight_color != other.highlight_color {
        acc.highlight_color = None;
    }
    if acc.link != other.link {
        acc.link = None;
    }
    acc
}

/// Text leaves overlapping the selection range, in document order.
fn selected_text_leaves(editor: &Editor) -> Result<Vec<&TextNode>, String> {
    let sel = editor.selection();
    let (start, end) = crate::tree::ordered_selection_points(sel);
    let blocks = selected_text_blocks(editor)?;
    let last = blocks.len().saturating_sub(1);
    let mut leaves = Vec::new();

    for (ix, block) in blocks.iter().enumerate() {
        let children = block.el.children.as_slice();
        let total_len = total_inline_text_len(children);
        let start_global = if ix == 0 {
            point_global_offset(children, start.path.last().copied().unwrap_or(0), start.offset)
        } else {
            0
        };
        let end_global = if ix == last {
            point_global_offset(children, end.path.last().copied().unwrap_or(0), end.offset)
        } else {
            total_len
        };
        if start_global >= end_global {
            continue;
        }

        let mut cursor = 0usize;
        for node in children {
            let node_start = cursor;
            cursor += match node {
                Node::Text(t) => t.text.len(),
                Node::Void(_) => 1,
                Node::Element(_) => 0,
            };
            if end_global <= node_start || start_global >= cursor {
                continue;
            }
            if let Node::Text(t) = node {
                leaves.push(t);
            }
        }
    }

    Ok(leaves)
}

fn all_selected_text_nodes_have_mark(editor: &Editor, get: MarkGet) -> Result<bool, String> {
    Ok(selected_text_leaves(editor)?
        .iter()
        .all(|leaf| get(&leaf.marks)))
}

fn toggle_bool_mark(
    editor: &Editor,
    get: MarkGet,
    set: MarkSet,
    source: &str,
) -> Result<Transaction, String> {
    if editor.selection().is_collapsed() {
        return toggle_mark_at_caret(editor, |mut marks| {
            let target = !get(&marks);
            set(&mut marks, target);
            marks
        })
        .map(|(ops, selection_after)| {
            Transaction::new(ops)
                .selection_after(selection_after)
                .source(source)
        });
    }

    let target = !all_selected_text_nodes_have_mark(editor, get)?;
    apply_mark_range(editor, &|mut marks: Marks| {
        set(&mut marks, target);
        marks
    })
    .map(|(ops, selection_after)| {
        Transaction::new(ops)
            .selection_after(selection_after)
            .source(source)
    })
}

fn set_optional_string_mark(
    editor: &Editor,
    set: fn(&mut Marks, Option<String>),
    value: Option<String>,
    source: &str,
) -> Result<Transaction, String> {
    let apply = |mut marks: Marks| {
        set(&mut marks, value.clone());
        marks
    };
    let result = if editor.selection().is_collapsed() {
        toggle_mark_at_caret(editor, apply)
    } else {
        apply_mark_range(editor, &apply)
    };
    result.map(|(ops, selection_after)| {
        Transaction::new(ops)
            .selection_after(selection_after)
            .source(source)
    })
}

/// Splits the focused leaf so the caret sits in an empty leaf with the new marks.
fn toggle_mark_at_caret(
    editor: &Editor,
    apply: impl Fn(Marks) -> Marks,
) -> Result<(Vec<Op>, Selection), String> {
    let focus = editor.selection().focus.clone();
    let (&child_ix, block_path) = focus
        .path
        .split_last()
        .ok_or_else(|| "Selection is not in a text node".to_string())?;

    let Some(Node::Element(el)) = editor.doc().node(block_path) else {
        return Err("Selection is not in a text block".into());
    };
    let Some(Node::Text(text)) = el.children.get(child_ix) else {
        return Err("Selection is not in a text node".into());
    };

    let cursor = clamp_to_char_boundary(&text.text, focus.offset);
    let marks_before = text.marks.clone();
    let marks_after = apply(marks_before.clone());

    if text.text.is_empty() {
        return Ok((
            vec![Op::SetTextMarks {
                path: focus.path.clone(),
                marks: marks_after,
            }],
            Selection::collapsed(Point::new(focus.path.clone(), 0)),
        ));
    }

    let mut replacement: Vec<Node> = Vec::new();
    let mut caret_child_ix = child_ix;

    let left = text.text.get(..cursor).unwrap_or("");
    let right = text.text.get(cursor..).unwrap_or("");

    if !left.is_empty() {
        replacement.push(Node::marked_text(left, marks_before.clone()));
        caret_child_ix += 1;
    }
    replacement.push(Node::Text(TextNode {
        text: String::new(),
        marks: marks_after,
    }));
    if !right.is_empty() {
        replacement.push(Node::marked_text(right, marks_before));
    }

    let mut ops = vec![Op::RemoveNode {
        path: focus.path.clone(),
    }];
    for (i, node) in replacement.into_iter().enumerate() {
        let mut path = block_path.to_vec();
        path.push(child_ix + i);
        ops.push(Op::InsertNode { path, node });
    }

    let mut caret_path = block_path.to_vec();
    caret_path.push(caret_child_ix);
    Ok((ops, Selection::collapsed(Point::new(caret_path, 0))))
}

fn apply_mark_range(
    editor: &Editor,
    apply: &dyn Fn(Marks) -> Marks,
) -> Result<(Vec<Op>, Selection), String> {
    let sel = editor.selection();
    let (start, end) = crate::tree::ordered_selection_points(sel);
    let blocks = selected_text_blocks(editor)?;
    let last = blocks.len().saturating_sub(1);

    let mut ops: Vec<Op> = Vec::new();
    let mut new_anchor = sel.anchor.clone();
    let mut new_focus = sel.focus.clone();

    for (ix, block) in blocks.iter().enumerate() {
        let children = block.el.children.as_slice();
        let total_len = total_inline_text_len(children);
        if total_len == 0 {
            continue;
        }

        let start_global = if ix == 0 {
            point_global_offset(children, start.path.last().copied().unwrap_or(0), start.offset)
        } else {
            0
        };
        let end_global = if ix == last {
            point_global_offset(children, end.path.last().copied().unwrap_or(0), end.offset)
        } else {
            total_len
        };
        if start_global >= end_global {
            continue;
        }

        let new_children = apply_marks_in_block(children, start_global, end_global, apply);

        for point in [&mut new_anchor, &mut new_focus] {
            if is_point_in_block(point, &block.path) {
                let global = point_global_offset(
                    children,
                    point.path.last().copied().unwrap_or(0),
                    point.offset,
                );
                *point = point_for_global_offset(&block.path, &new_children, global);
            }
        }

        ops.extend(replace_children_ops(&block.path, children.len(), new_children));
    }

    Ok((
        ops,
        Selection {
            anchor: new_anchor,
            focus: new_focus,
        },
    ))
}

fn insert_link(editor: &Editor, url: String, text: String) -> Result<Transaction, String> {
    let focus = editor.selection().focus.clone();
    let (&child_ix, block_path) = focus
        .path
        .split_last()
        .ok_or_else(|| "Selection is not in a text node".to_string())?;
    let Some(Node::Text(leaf)) = editor.doc().node(&focus.path) else {
        return Err("Selection is not in a text node".into());
    };

    let cursor = clamp_to_char_boundary(&leaf.text, focus.offset);
    let left = leaf.text.get(..cursor).unwrap_or("");
    let right = leaf.text.get(cursor..).unwrap_or("");

    let mut link_marks = leaf.marks.clone();
    link_marks.link = Some(url);

    let mut replacement: Vec<Node> = Vec::new();
    if !left.is_empty() {
        replacement.push(Node::marked_text(left, leaf.marks.clone()));
    }
    let link_ix = child_ix + replacement.len();
    let link_len = text.len();
    replacement.push(Node::marked_text(text, link_marks));
    if !right.is_empty() {
        replacement.push(Node::marked_text(right, leaf.marks.clone()));
    }

    let mut ops = vec![Op::RemoveNode {
        path: focus.path.clone(),
    }];
    for (i, node) in replacement.into_iter().enumerate() {
        let mut path = block_path.to_vec();
        path.push(child_ix + i);
        ops.push(Op::InsertNode { path, node });
    }

    let mut caret_path = block_path.to_vec();
    caret_path.push(link_ix);
    Ok(Transaction::new(ops)
        .selection_after(Selection::collapsed(Point::new(caret_path, link_len)))
        .source("command:marks.insert_link"))
}

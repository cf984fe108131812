use crate::core::{
    Attrs, Document, Editor, ElementNode, Node, Point, Selection, clamp_to_char_boundary,
};
use crate::ops::{Op, Path, Transaction};
use crate::plugin::{
    ChildConstraint, CommandError, CommandSpec, ContentPlugin, NodeSpec, NormalizePass,
    PluginRegistry, commit,
};
use crate::plugins::{replace_block_ops, retype_block};
use crate::tree::{
    active_text_block, element_is_text_block, first_point_in, insertion_point_after_focus,
    last_text_point, ordered_selection_points, parse_path_arg, point_for_global_offset,
    point_global_offset, replace_children_ops, selected_text_blocks, slice_inline, string_arg,
    total_inline_text_len,
};

pub(crate) struct ParagraphPlugin;

impl ContentPlugin for ParagraphPlugin {
    fn id(&self) -> &'static str {
        "core.paragraph"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::text_block("paragraph")]
    }
}

pub(crate) struct DividerPlugin;

impl ContentPlugin for DividerPlugin {
    fn id(&self) -> &'static str {
        "core.divider"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::void_block("divider")]
    }
}

pub(crate) struct NormalizePlugin;

impl ContentPlugin for NormalizePlugin {
    fn id(&self) -> &'static str {
        "core.normalize"
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![
            Box::new(EnsureNonEmptyDocument),
            Box::new(EnsureTextBlocksHaveLeaf),
            Box::new(MergeAdjacentTextLeaves),
        ]
    }
}

struct EnsureNonEmptyDocument;

impl NormalizePass for EnsureNonEmptyDocument {
    fn id(&self) -> &'static str {
        "core.ensure_non_empty_document"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        if doc.children.is_empty() {
            return vec![Op::InsertNode {
                path: vec![0],
                node: Node::paragraph(""),
            }];
        }
        Vec::new()
    }
}

struct EnsureTextBlocksHaveLeaf;

impl NormalizePass for EnsureTextBlocksHaveLeaf {
    fn id(&self) -> &'static str {
        "core.ensure_text_blocks_have_leaf"
    }

    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        fn walk(
            children: &[Node],
            path: &mut Vec<usize>,
            registry: &PluginRegistry,
            ops: &mut Vec<Op>,
        ) {
            for (ix, node) in children.iter().enumerate() {
                let Node::Element(el) = node else {
                    continue;
                };

                path.push(ix);

                let spec_children = registry
                    .node_spec(&el.kind)
                    .map(|s| s.children.clone())
                    .unwrap_or(ChildConstraint::Any);

                if spec_children == ChildConstraint::InlineOnly {
                    if !el.children.iter().any(|n| matches!(n, Node::Text(_))) {
                        let mut insert_path = path.clone();
                        insert_path.push(0);
                        ops.push(Op::InsertNode {
                            path: insert_path,
                            node: Node::text(""),
                        });
                    }
                } else {
                    walk(&el.children, path, registry, ops);
                }

                path.pop();
            }
        }

        let mut ops = Vec::new();
        walk(&doc.children, &mut Vec::new(), registry, &mut ops);
        ops
    }
}

struct MergeAdjacentTextLeaves;

impl NormalizePass for MergeAdjacentTextLeaves {
    fn id(&self) -> &'static str {
        "core.merge_adjacent_text_leaves"
    }

    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        fn merge_block(el: &ElementNode, path: &[usize], ops: &mut Vec<Op>) {
            let mut ix = el.children.len();
            while ix > 0 {
                ix -= 1;
                let Node::Text(right) = &el.children[ix] else {
                    continue;
                };

                let mut start = ix;
                while start > 0 {
                    let Some(Node::Text(left)) = el.children.get(start - 1) else {
                        break;
                    };
                    if left.marks != right.marks {
                        break;
                    }
                    start -= 1;
                }

                if start == ix {
                    continue;
                }

                let Some(Node::Text(first)) = el.children.get(start) else {
                    continue;
                };
                let appended: String = el.children[start + 1..=ix]
                    .iter()
                    .filter_map(|node| match node {
                        Node::Text(t) => Some(t.text.as_str()),
                        _ => None,
                    })
                    .collect();

                if !appended.is_empty() {
                    let mut insert_text_path = path.to_vec();
                    insert_text_path.push(start);
                    ops.push(Op::InsertText {
                        path: insert_text_path,
                        offset: first.text.len(),
                        text: appended,
                    });
                }

                for remove_ix in (start + 1..=ix).rev() {
                    let mut remove_path = path.to_vec();
                    remove_path.push(remove_ix);
                    ops.push(Op::RemoveNode { path: remove_path });
                }

                ix = start;
            }
        }

        fn walk(
            children: &[Node],
            path: &mut Vec<usize>,
            registry: &PluginRegistry,
            ops: &mut Vec<Op>,
        ) {
            for (ix, node) in children.iter().enumerate() {
                let Node::Element(el) = node else {
                    continue;
                };

                path.push(ix);

                let spec_children = registry
                    .node_spec(&el.kind)
                    .map(|s| s.children.clone())
                    .unwrap_or_else(|| {
                        if el.children.iter().any(|n| matches!(n, Node::Text(_))) {
                            ChildConstraint::InlineOnly
                        } else {
                            ChildConstraint::Any
                        }
                    });

                if spec_children == ChildConstraint::InlineOnly {
                    if el.children.len() >= 2 {
                        merge_block(el, path, ops);
                    }
                } else {
                    walk(&el.children, path, registry, ops);
                }

                path.pop();
            }
        }

        let mut ops = Vec::new();
        walk(&doc.children, &mut Vec::new(), registry, &mut ops);
        ops
    }
}

pub(crate) struct CoreCommandsPlugin;

impl ContentPlugin for CoreCommandsPlugin {
    fn id(&self) -> &'static str {
        "core.commands"
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("core.insert_divider", "Insert divider", |editor, _args| {
                let result = insert_divider(editor);
                commit(editor, result, "insert divider")
            })
            .description("Insert a divider block and a trailing paragraph.")
            .keywords(["divider", "separator", "hr", "horizontal rule"]),
            CommandSpec::new("core.split_block", "Split block", |editor, _args| {
                if !editor.selection().is_collapsed() {
                    let result = delete_selection(editor);
                    commit(editor, result, "delete selection")?;
                }
                let result = split_block(editor);
                commit(editor, result, "split block")
            })
            .description("Split the active text block at the caret (Enter).")
            .keywords(["enter", "newline", "split"]),
            CommandSpec::new("core.delete_backward", "Delete backward", |editor, _args| {
                let result = delete_backward(editor);
                commit(editor, result, "delete backward")
            })
            .description("Delete the selection or the character before the caret.")
            .keywords(["backspace", "delete"]),
            CommandSpec::new("core.delete_forward", "Delete forward", |editor, _args| {
                let result = delete_forward(editor);
                commit(editor, result, "delete forward")
            })
            .description("Delete the selection or the character after the caret.")
            .keywords(["delete"]),
            CommandSpec::new("core.select_node", "Select node", |editor, args| {
                let path = parse_path_arg(args.as_ref())
                    .ok_or_else(|| CommandError::new("Missing args.path"))?;
                match editor.doc().node(&path) {
                    Some(Node::Void(_)) => {
                        editor.set_selection(Selection::node(path));
                        Ok(())
                    }
                    _ => Err(CommandError::new("Only void nodes can be selected as a node")),
                }
            })
            .description("Select a void block (image, divider) as a whole.")
            .args_example(serde_json::json!({ "path": [1] })),
            CommandSpec::new("core.delete_range", "Delete range", |editor, args| {
                let args = args.as_ref();
                let path = parse_path_arg(args)
                    .ok_or_else(|| CommandError::new("Missing args.path"))?;
                let offset = |key: &str| {
                    args.and_then(|v| v.get(key))
                        .and_then(|v| v.as_u64())
                        .and_then(|v| usize::try_from(v).ok())
                        .ok_or_else(|| CommandError::new(format!("Missing args.{key}")))
                };
                let (start, end) = (offset("start")?, offset("end")?);
                let result = delete_block_range(editor, &path, start, end);
                commit(editor, result, "delete range")
            })
            .description("Delete text between two offsets of a text block.")
            .args_example(serde_json::json!({ "path": [0], "start": 0, "end": 5 })),
            CommandSpec::new("core.insert_text", "Insert text", |editor, args| {
                let text = string_arg(args.as_ref(), "text")
                    .ok_or_else(|| CommandError::new("Missing args.text"))?;
                if !editor.selection().is_collapsed() {
                    let result = delete_selection(editor);
                    commit(editor, result, "delete selection")?;
                }
                let result = insert_text(editor, text);
                commit(editor, result, "insert text")
            })
            .description("Insert text at the caret, replacing the selection.")
            .args_example(serde_json::json!({ "text": "hello" })),
        ]
    }
}

fn insert_divider(editor: &Editor) -> Result<Transaction, String> {
    let (parent_path, insert_at) = insertion_point_after_focus(editor);

    let divider_path = child_path(&parent_path, insert_at);
    let paragraph_path = child_path(&parent_path, insert_at + 1);
    let text_path = child_path(&paragraph_path, 0);

    Ok(Transaction::new(vec![
        Op::InsertNode {
            path: divider_path,
            node: Node::divider(),
        },
        Op::InsertNode {
            path: paragraph_path,
            node: Node::paragraph(""),
        },
    ])
    .selection_after(Selection::collapsed(Point::new(text_path, 0)))
    .source("command:core.insert_divider"))
}

fn child_path(parent: &[usize], ix: usize) -> Path {
    let mut path = parent.to_vec();
    path.push(ix);
    path
}

/// Concatenates inline content, dropping empty leaves unless nothing else remains.
fn join_inline(left: Vec<Node>, right: Vec<Node>) -> Vec<Node> {
    let fallback = left.first().cloned();
    let joined: Vec<Node> = left
        .into_iter()
        .chain(right)
        .filter(|node| !matches!(node, Node::Text(t) if t.text.is_empty()))
        .collect();
    if joined.is_empty() {
        return vec![fallback.unwrap_or_else(|| Node::text(""))];
    }
    joined
}

fn text_block_at<'a>(editor: &'a Editor, path: &[usize]) -> Result<&'a ElementNode, String> {
    match editor.doc().node(path) {
        Some(Node::Element(el)) if element_is_text_block(el, editor.registry()) => Ok(el),
        _ => Err("Path is not a text block".into()),
    }
}

fn delete_block_range(
    editor: &Editor,
    block_path: &[usize],
    start: usize,
    end: usize,
) -> Result<Transaction, String> {
    let el = text_block_at(editor, block_path)?;
    let total = total_inline_text_len(&el.children);
    let (start, end) = (start.min(total), end.min(total));
    if start >= end {
        return Ok(Transaction::new(Vec::new()));
    }

    let joined = join_inline(
        slice_inline(&el.children, 0, start),
        slice_inline(&el.children, end, total),
    );
    let caret = point_for_global_offset(block_path, &joined, start);
    Ok(
        Transaction::new(replace_children_ops(block_path, el.children.len(), joined))
            .selection_after(Selection::collapsed(caret))
            .source("command:core.delete_range"),
    )
}

fn delete_selection(editor: &Editor) -> Result<Transaction, String> {
    let sel = editor.selection();
    if let Some(path) = sel.selected_void_path(editor.doc()) {
        return remove_void(editor, &path);
    }
    if sel.is_collapsed() {
        return Ok(Transaction::new(Vec::new()));
    }

    let (start, end) = ordered_selection_points(sel);
    let blocks = selected_text_blocks(editor)?;
    let (Some(first), Some(last)) = (blocks.first(), blocks.last()) else {
        return Ok(Transaction::new(Vec::new()));
    };

    let start_global = point_global_offset(
        &first.el.children,
        start.path.last().copied().unwrap_or(0),
        start.offset,
    );
    let end_global = point_global_offset(
        &last.el.children,
        end.path.last().copied().unwrap_or(0),
        end.offset,
    );

    if blocks.len() == 1 {
        return delete_block_range(editor, &first.path, start_global, end_global);
    }

    let last_total = total_inline_text_len(&last.el.children);
    let (first_ix, first_parent) = first
        .path
        .split_last()
        .ok_or_else(|| "Invalid block path".to_string())?;
    let (last_ix, last_parent) = last
        .path
        .split_last()
        .ok_or_else(|| "Invalid block path".to_string())?;

    let mut ops: Vec<Op> = Vec::new();
    let joined;
    if first_parent == last_parent {
        joined = join_inline(
            slice_inline(&first.el.children, 0, start_global),
            slice_inline(&last.el.children, end_global, last_total),
        );
        for ix in (first_ix + 1..=*last_ix).rev() {
            ops.push(Op::RemoveNode {
                path: child_path(first_parent, ix),
            });
        }
    } else {
        // Blocks in different containers keep their structure; only text goes.
        joined = slice_inline(&first.el.children, 0, start_global);
        for block in blocks.iter().skip(1) {
            let remaining = if block.path == last.path {
                slice_inline(&block.el.children, end_global, last_total)
            } else {
                vec![Node::text("")]
            };
            ops.extend(replace_children_ops(
                &block.path,
                block.el.children.len(),
                remaining,
            ));
        }
    }

    let caret = point_for_global_offset(&first.path, &joined, start_global);
    ops.extend(replace_children_ops(
        &first.path,
        first.el.children.len(),
        joined,
    ));

    Ok(Transaction::new(ops)
        .selection_after(Selection::collapsed(caret))
        .source("command:core.delete_selection"))
}

fn remove_void(editor: &Editor, path: &[usize]) -> Result<Transaction, String> {
    let (&ix, parent) = path
        .split_last()
        .ok_or_else(|| "Invalid node path".to_string())?;
    let siblings = editor
        .doc()
        .children_at(parent)
        .ok_or_else(|| "Invalid node path".to_string())?;

    let target = if ix > 0 {
        siblings
            .get(ix - 1)
            .and_then(|prev| last_text_point(prev, &child_path(parent, ix - 1)))
    } else {
        siblings
            .get(ix + 1)
            .and_then(|next| first_point_in(next, &child_path(parent, ix)))
    };

    let tx = Transaction::new(vec![Op::RemoveNode {
        path: path.to_vec(),
    }])
    .source("command:core.remove_node");
    Ok(match target {
        Some(point) => tx.selection_after(Selection::collapsed(point)),
        None => tx,
    })
}

fn split_block(editor: &Editor) -> Result<Transaction, String> {
    if let Some(void_path) = editor.selection().selected_void_path(editor.doc()) {
        let (&ix, parent) = void_path
            .split_last()
            .ok_or_else(|| "Invalid node path".to_string())?;
        let paragraph_path = child_path(parent, ix + 1);
        let text_path = child_path(&paragraph_path, 0);
        return Ok(Transaction::new(vec![Op::InsertNode {
            path: paragraph_path,
            node: Node::paragraph(""),
        }])
        .selection_after(Selection::collapsed(Point::new(text_path, 0)))
        .source("command:core.split_block"));
    }

    let (block_path, el) = active_text_block(editor).ok_or("No active text block")?;
    let focus = editor.selection().focus.clone();

    if el.kind == "code_block" {
        let offset = match editor.doc().node(&focus.path) {
            Some(Node::Text(t)) => clamp_to_char_boundary(&t.text, focus.offset),
            _ => return Err("Selection is not in a text node".into()),
        };
        return Ok(Transaction::new(vec![Op::InsertText {
            path: focus.path.clone(),
            offset,
            text: "\n".to_string(),
        }])
        .selection_after(Selection::collapsed(Point::new(focus.path, offset + 1)))
        .source("command:core.split_block"));
    }

    let total = total_inline_text_len(&el.children);
    if el.kind == "list_item" && total == 0 {
        let paragraph = retype_block(el, "paragraph", Attrs::default());
        return Ok(Transaction::new(Vec::from(replace_block_ops(
            &block_path,
            Node::Element(paragraph),
        )))
        .selection_after(editor.selection().clone())
        .source("command:core.split_block"));
    }

    let global = point_global_offset(
        &el.children,
        focus.path.last().copied().unwrap_or(0),
        focus.offset,
    );
    let left = slice_inline(&el.children, 0, global);
    let right = slice_inline(&el.children, global, total);

    let next = match el.kind.as_str() {
        "heading" if global >= total => retype_block(el, "paragraph", Attrs::default()),
        "list_item" => {
            let mut attrs = el.attrs.clone();
            attrs.remove("list_index");
            if attrs.contains_key("checked") {
                attrs.insert("checked".to_string(), serde_json::Value::Bool(false));
            }
            ElementNode {
                kind: el.kind.clone(),
                attrs,
                children: Vec::new(),
            }
        }
        _ => ElementNode {
            kind: el.kind.clone(),
            attrs: el.attrs.clone(),
            children: Vec::new(),
        },
    };
    let next = ElementNode {
        children: right,
        ..next
    };

    let (&block_ix, parent) = block_path
        .split_last()
        .ok_or_else(|| "Invalid block path".to_string())?;
    let next_path = child_path(parent, block_ix + 1);
    let caret = first_point_in(&Node::Element(next.clone()), &next_path)
        .unwrap_or_else(|| Point::new(child_path(&next_path, 0), 0));

    let mut ops = replace_children_ops(&block_path, el.children.len(), left);
    ops.push(Op::InsertNode {
        path: next_path,
        node: Node::Element(next),
    });

    Ok(Transaction::new(ops)
        .selection_after(Selection::collapsed(caret))
        .source("command:core.split_block"))
}

fn prev_char_boundary(text: &str, offset: usize) -> usize {
    text[..offset]
        .char_indices()
        .next_back()
        .map(|(ix, _)| ix)
        .unwrap_or(0)
}

fn next_char_boundary(text: &str, offset: usize) -> usize {
    text[offset..]
        .chars()
        .next()
        .map(|c| offset + c.len_utf8())
        .unwrap_or(offset)
}

fn delete_backward(editor: &Editor) -> Result<Transaction, String> {
    let sel = editor.selection();
    if sel.selected_void_path(editor.doc()).is_some() || !sel.is_collapsed() {
        return delete_selection(editor);
    }

    let (block_path, el) = active_text_block(editor).ok_or("No active text block")?;
    let focus = sel.focus.clone();
    let leaf_ix = focus.path.last().copied().unwrap_or(0);

    if let Some(Node::Text(t)) = el.children.get(leaf_ix) {
        let offset = clamp_to_char_boundary(&t.text, focus.offset);
        if offset > 0 {
            let start = prev_char_boundary(&t.text, offset);
            return Ok(Transaction::new(vec![Op::RemoveText {
                path: focus.path.clone(),
                range: start..offset,
            }])
            .selection_after(Selection::collapsed(Point::new(focus.path, start)))
            .source("command:core.delete_backward"));
        }
    }

    // Caret at the start of its leaf: reach into earlier leaves of the block.
    for ix in (0..leaf_ix).rev() {
        match &el.children[ix] {
            Node::Text(t) if t.text.is_empty() => continue,
            Node::Text(t) => {
                let end = t.text.len();
                let start = prev_char_boundary(&t.text, end);
                return Ok(Transaction::new(vec![Op::RemoveText {
                    path: child_path(&block_path, ix),
                    range: start..end,
                }])
                .source("command:core.delete_backward"));
            }
            Node::Void(_) => {
                return Ok(Transaction::new(vec![Op::RemoveNode {
                    path: child_path(&block_path, ix),
                }])
                .source("command:core.delete_backward"));
            }
            Node::Element(_) => {}
        }
    }

    if el.kind == "list_item" {
        let paragraph = retype_block(el, "paragraph", Attrs::default());
        return Ok(Transaction::new(Vec::from(replace_block_ops(
            &block_path,
            Node::Element(paragraph),
        )))
        .selection_after(sel.clone())
        .source("command:core.delete_backward"));
    }

    let (&block_ix, parent) = block_path
        .split_last()
        .ok_or_else(|| "Invalid block path".to_string())?;
    if block_ix == 0 {
        return Ok(Transaction::new(Vec::new()));
    }
    let prev_path = child_path(parent, block_ix - 1);
    let Some(prev) = editor.doc().node(&prev_path) else {
        return Ok(Transaction::new(Vec::new()));
    };

    match prev {
        Node::Void(_) => Ok(Transaction::new(Vec::new()).selection_after(Selection::node(prev_path))),
        Node::Element(prev_el) if element_is_text_block(prev_el, editor.registry()) => {
            Ok(merge_blocks(&prev_path, prev_el, &block_path, el))
        }
        other => Ok(Transaction::new(Vec::new()).selection_after(Selection::collapsed(
            last_text_point(other, &prev_path).unwrap_or_else(|| focus.clone()),
        ))),
    }
}

fn delete_forward(editor: &Editor) -> Result<Transaction, String> {
    let sel = editor.selection();
    if sel.selected_void_path(editor.doc()).is_some() || !sel.is_collapsed() {
        return delete_selection(editor);
    }

    let (block_path, el) = active_text_block(editor).ok_or("No active text block")?;
    let focus = sel.focus.clone();
    let leaf_ix = focus.path.last().copied().unwrap_or(0);

    if let Some(Node::Text(t)) = el.children.get(leaf_ix) {
        let offset = clamp_to_char_boundary(&t.text, focus.offset);
        if offset < t.text.len() {
            let end = next_char_boundary(&t.text, offset);
            return Ok(Transaction::new(vec![Op::RemoveText {
                path: focus.path.clone(),
                range: offset..end,
            }])
            .selection_after(sel.clone())
            .source("command:core.delete_forward"));
        }
    }

    for ix in leaf_ix + 1..el.children.len() {
        match &el.children[ix] {
            Node::Text(t) if t.text.is_empty() => continue,
            Node::Text(t) => {
                let end = next_char_boundary(&t.text, 0);
                return Ok(Transaction::new(vec![Op::RemoveText {
                    path: child_path(&block_path, ix),
                    range: 0..end,
                }])
                .selection_after(sel.clone())
                .source("command:core.delete_forward"));
            }
            Node::Void(_) => {
                return Ok(Transaction::new(vec![Op::RemoveNode {
                    path: child_path(&block_path, ix),
                }])
                .selection_after(sel.clone())
                .source("command:core.delete_forward"));
            }
            Node::Element(_) => {}
        }
    }

    let (&block_ix, parent) = block_path
        .split_last()
        .ok_or_else(|| "Invalid block path".to_string())?;
    let next_path = child_path(parent, block_ix + 1);
    match editor.doc().node(&next_path) {
        Some(Node::Void(_)) => {
            Ok(Transaction::new(Vec::new()).selection_after(Selection::node(next_path)))
        }
        Some(Node::Element(next_el))
            if element_is_text_block(next_el, editor.registry()) =>
        {
            Ok(merge_blocks(&block_path, el, &next_path, next_el))
        }
        _ => Ok(Transaction::new(Vec::new())),
    }
}

/// Moves the content of `second` to the end of `first` and removes `second`.
fn merge_blocks(
    first_path: &[usize],
    first: &ElementNode,
    second_path: &[usize],
    second: &ElementNode,
) -> Transaction {
    let first_len = total_inline_text_len(&first.children);
    let joined = join_inline(first.children.clone(), second.children.clone());
    let caret = point_for_global_offset(first_path, &joined, first_len);

    let mut ops = vec![Op::RemoveNode {
        path: second_path.to_vec(),
    }];
    ops.extend(replace_children_ops(
        first_path,
        first.children.len(),
        joined,
    ));

    Transaction::new(ops)
        .selection_after(Selection::collapsed(caret))
        .source("command:core.merge_blocks")
}

fn insert_text(editor: &Editor, text: String) -> Result<Transaction, String> {
    let focus = editor.selection().focus.clone();
    let Some(Node::Text(t)) = editor.doc().node(&focus.path) else {
        return Err("Selection is not in a text node".into());
    };
    let offset = clamp_to_char_boundary(&t.text, focus.offset);
    let caret = offset + text.len();
    Ok(Transaction::new(vec![Op::InsertText {
        path: focus.path.clone(),
        offset,
        text,
    }])
    .selection_after(Selection::collapsed(Point::new(focus.path, caret)))
    .source("command:core.insert_text"))
}

//! Read-only helpers for walking the document tree.

use serde_json::Value;

use crate::core::{
    Document, Editor, ElementNode, Marks, Node, Point, Selection, TextNode, clamp_to_char_boundary,
};
use crate::ops::Path;
use crate::plugin::{ChildConstraint, PluginRegistry};

/// Inline voids occupy one offset unit in a text block.
const INLINE_VOID_LEN: usize = 1;

pub struct TextBlock<'a> {
    pub path: Path,
    pub el: &'a ElementNode,
}

pub fn element_is_text_block(el: &ElementNode, registry: &PluginRegistry) -> bool {
    match registry.node_spec(&el.kind).map(|s| &s.children) {
        Some(ChildConstraint::InlineOnly) => true,
        Some(_) => false,
        None => el
            .children
            .iter()
            .any(|n| matches!(n, Node::Text(_) | Node::Void(_))),
    }
}

pub fn text_blocks_in_order<'a>(doc: &'a Document, registry: &PluginRegistry) -> Vec<TextBlock<'a>> {
    fn walk<'a>(
        nodes: &'a [Node],
        path: &mut Vec<usize>,
        registry: &PluginRegistry,
        out: &mut Vec<TextBlock<'a>>,
    ) {
        for (ix, node) in nodes.iter().enumerate() {
            let Node::Element(el) = node else {
                continue;
            };

            path.push(ix);

            if element_is_text_block(el, registry) {
                out.push(TextBlock {
                    path: path.clone(),
                    el,
                });
            } else {
                walk(&el.children, path, registry, out);
            }

            path.pop();
        }
    }

    let mut out = Vec::new();
    walk(&doc.children, &mut Vec::new(), registry, &mut out);
    out
}

/// The text block holding the selection focus.
pub fn active_text_block(editor: &Editor) -> Option<(Path, &ElementNode)> {
    let focus = &editor.selection().focus;
    let (_, block_path) = focus.path.split_last()?;
    match editor.doc().node(block_path)? {
        Node::Element(el) if element_is_text_block(el, editor.registry()) => {
            Some((block_path.to_vec(), el))
        }
        _ => None,
    }
}

/// Text blocks touched by the selection, in document order.
pub(crate) fn selected_text_blocks<'a>(
    editor: &'a Editor,
) -> Result<Vec<TextBlock<'a>>, String> {
    let (start, end) = ordered_selection_points(editor.selection());
    let Some(start_block_path) = start.path.split_last().map(|(_, p)| p.to_vec()) else {
        return Err("Selection start is not in a text block".into());
    };
    let Some(end_block_path) = end.path.split_last().map(|(_, p)| p.to_vec()) else {
        return Err("Selection end is not in a text block".into());
    };

    let blocks = text_blocks_in_order(editor.doc(), editor.registry());
    let start_index = blocks
        .iter()
        .position(|b| b.path == start_block_path)
        .ok_or_else(|| "Selection start is not in a text block".to_string())?;
    let end_index = blocks
        .iter()
        .position(|b| b.path == end_block_path)
        .ok_or_else(|| "Selection end is not in a text block".to_string())?;

    let (a, b) = if start_index <= end_index {
        (start_index, end_index)
    } else {
        (end_index, start_index)
    };
    Ok(blocks.into_iter().take(b + 1).skip(a).collect())
}

pub fn ancestor_element_path(doc: &Document, path: &[usize], kind: &str) -> Option<Path> {
    for len in (1..=path.len()).rev() {
        let candidate = &path[..len];
        if let Some(Node::Element(el)) = doc.node(candidate) {
            if el.kind == kind {
                return Some(candidate.to_vec());
            }
        }
    }
    None
}

/// Parent path and index right after the block holding the focus (or the selected void).
pub(crate) fn insertion_point_after_focus(editor: &Editor) -> (Path, usize) {
    let focus = &editor.selection().focus;
    let block_path: &[usize] = match editor.doc().node(&focus.path) {
        Some(Node::Void(_)) => &focus.path,
        _ => focus.path.split_last().map(|(_, p)| p).unwrap_or(&[]),
    };

    match block_path.split_last() {
        Some((block_ix, parent)) => (parent.to_vec(), block_ix + 1),
        None => (Vec::new(), editor.doc().children.len()),
    }
}

pub fn ordered_selection_points(sel: &Selection) -> (Point, Point) {
    let mut start = sel.anchor.clone();
    let mut end = sel.focus.clone();

    if start.path == end.path {
        if end.offset < start.offset {
            std::mem::swap(&mut start, &mut end);
        }
        return (start, end);
    }
    if end.path < start.path {
        std::mem::swap(&mut start, &mut end);
    }
    (start, end)
}

pub fn is_point_in_block(point: &Point, block_path: &[usize]) -> bool {
    point.path.len() == block_path.len() + 1 && point.path.starts_with(block_path)
}

fn inline_len(node: &Node) -> usize {
    match node {
        Node::Text(t) => t.text.len(),
        Node::Void(_) => INLINE_VOID_LEN,
        Node::Element(_) => 0,
    }
}

pub fn total_inline_text_len(children: &[Node]) -> usize {
    children.iter().map(inline_len).sum()
}

/// Plain text of a text block, with inline voids rendered as a placeholder.
pub fn block_text(children: &[Node]) -> String {
    let mut out = String::new();
    for node in children {
        match node {
            Node::Text(t) => out.push_str(&t.text),
            Node::Void(_) => out.push('\u{fffc}'),
            Node::Element(_) => {}
        }
    }
    out
}

pub fn point_global_offset(children: &[Node], child_ix: usize, offset: usize) -> usize {
    let mut global = 0usize;
    for (ix, node) in children.iter().enumerate() {
        match node {
            Node::Text(t) => {
                if ix < child_ix {
                    global += t.text.len();
                    continue;
                }
                if ix == child_ix {
                    global += clamp_to_char_boundary(&t.text, offset);
                }
                break;
            }
            Node::Void(_) => {
                if ix < child_ix {
                    global += INLINE_VOID_LEN;
                    continue;
                }
                if ix == child_ix {
                    global += offset.min(INLINE_VOID_LEN);
                }
                break;
            }
            Node::Element(_) => {}
        }
    }
    global
}

pub fn point_for_global_offset(block_path: &[usize], children: &[Node], global_offset: usize) -> Point {
    let mut remaining = global_offset;
    for (child_ix, node) in children.iter().enumerate() {
        match node {
            Node::Text(t) => {
                if remaining < t.text.len() {
                    let mut path = block_path.to_vec();
                    path.push(child_ix);
                    return Point::new(path, clamp_to_char_boundary(&t.text, remaining));
                }
                if remaining == t.text.len() {
                    if matches!(children.get(child_ix + 1), Some(Node::Text(_))) {
                        let mut path = block_path.to_vec();
                        path.push(child_ix + 1);
                        return Point::new(path, 0);
                    }
                    let mut path = block_path.to_vec();
                    path.push(child_ix);
                    return Point::new(path, t.text.len());
                }
                remaining = remaining.saturating_sub(t.text.len());
            }
            Node::Void(_) => {
                if remaining <= INLINE_VOID_LEN {
                    for (ix, prev) in children.iter().enumerate().take(child_ix).rev() {
                        if let Node::Text(t) = prev {
                            let mut path = block_path.to_vec();
                            path.push(ix);
                            return Point::new(path, t.text.len());
                        }
                    }
                    for (ix, next) in children.iter().enumerate().skip(child_ix + 1) {
                        if matches!(next, Node::Text(_)) {
                            let mut path = block_path.to_vec();
                            path.push(ix);
                            return Point::new(path, 0);
                        }
                    }
                    break;
                }
                remaining = remaining.saturating_sub(INLINE_VOID_LEN);
            }
            Node::Element(_) => {}
        }
    }

    // Fallback to end of last text node.
    for (child_ix, node) in children.iter().enumerate().rev() {
        if let Node::Text(t) = node {
            let mut path = block_path.to_vec();
            path.push(child_ix);
            return Point::new(path, t.text.len());
        }
    }

    let mut path = block_path.to_vec();
    path.push(0);
    Point::new(path, 0)
}

/// Inline content between two global offsets, splitting text leaves at the edges.
///
/// Never returns an empty list: an empty slice yields one empty leaf carrying
/// the marks found at `start`.
pub fn slice_inline(children: &[Node], start: usize, end: usize) -> Vec<Node> {
    let mut out: Vec<Node> = Vec::new();
    let mut cursor = 0usize;
    let mut edge_marks: Option<Marks> = None;

    for node in children {
        let node_start = cursor;
        let node_end = cursor + inline_len(node);
        cursor = node_end;

        match node {
            Node::Text(t) => {
                if edge_marks.is_none() && start >= node_start && start <= node_end {
                    edge_marks = Some(t.marks.clone());
                }
                if node_end <= start || node_start >= end {
                    continue;
                }
                let from = clamp_to_char_boundary(&t.text, start.saturating_sub(node_start));
                let to = clamp_to_char_boundary(&t.text, end.saturating_sub(node_start));
                let text = t.text.get(from..to).unwrap_or("");
                if text.is_empty() {
                    continue;
                }
                out.push(Node::Text(TextNode {
                    text: text.to_string(),
                    marks: t.marks.clone(),
                }));
            }
            Node::Void(_) => {
                if node_start >= start && node_end <= end {
                    out.push(node.clone());
                }
            }
            Node::Element(_) => {}
        }
    }

    if out.is_empty() {
        out.push(Node::Text(TextNode {
            text: String::new(),
            marks: edge_marks.unwrap_or_default(),
        }));
    }
    out
}

pub fn apply_marks_in_block(
    children: &[Node],
    start_global: usize,
    end_global: usize,
    apply: &dyn Fn(Marks) -> Marks,
) -> Vec<Node> {
    if start_global >= end_global {
        return children.to_vec();
    }

    let mut out: Vec<Node> = Vec::new();
    let mut cursor = 0usize;

    for node in children {
        let Node::Text(t) = node else {
            cursor += inline_len(node);
            out.push(node.clone());
            continue;
        };
        let node_start = cursor;
        let node_end = cursor + t.text.len();
        cursor = node_end;

        if end_global <= node_start || start_global >= node_end {
            out.push(node.clone());
            continue;
        }

        let sel_start = clamp_to_char_boundary(
            &t.text,
            start_global.saturating_sub(node_start).min(t.text.len()),
        );
        let sel_end = clamp_to_char_boundary(
            &t.text,
            end_global.saturating_sub(node_start).min(t.text.len()),
        );

        if sel_start == 0 && sel_end == t.text.len() {
            let mut next = t.clone();
            next.marks = apply(next.marks);
            out.push(Node::Text(next));
            continue;
        }

        let prefix = t.text.get(..sel_start).unwrap_or("");
        let middle = t.text.get(sel_start..sel_end).unwrap_or("");
        let suffix = t.text.get(sel_end..).unwrap_or("");

        if !prefix.is_empty() {
            out.push(Node::marked_text(prefix, t.marks.clone()));
        }
        if !middle.is_empty() {
            out.push(Node::marked_text(middle, apply(t.marks.clone())));
        }
        if !suffix.is_empty() {
            out.push(Node::marked_text(suffix, t.marks.clone()));
        }
    }

    if out.is_empty() {
        out.push(Node::text(""));
    }

    out
}

/// The last caret position inside `node`, relative to `path`.
pub(crate) fn last_text_point(node: &Node, path: &[usize]) -> Option<Point> {
    match node {
        Node::Text(t) => Some(Point::new(path.to_vec(), t.text.len())),
        Node::Void(_) => Some(Point::new(path.to_vec(), 0)),
        Node::Element(el) => el.children.iter().enumerate().rev().find_map(|(ix, child)| {
            let mut child_path = path.to_vec();
            child_path.push(ix);
            last_text_point(child, &child_path)
        }),
    }
}

/// The first caret position inside `node`, relative to `path`.
pub(crate) fn first_point_in(node: &Node, path: &[usize]) -> Option<Point> {
    match node {
        Node::Text(_) | Node::Void(_) => Some(Point::new(path.to_vec(), 0)),
        Node::Element(el) => el.children.iter().enumerate().find_map(|(ix, child)| {
            let mut child_path = path.to_vec();
            child_path.push(ix);
            first_point_in(child, &child_path)
        }),
    }
}

pub(crate) fn parse_path_arg(args: Option<&Value>) -> Option<Vec<usize>> {
    let path = args?.get("path")?.as_array()?;
    let mut out = Vec::with_capacity(path.len());
    for v in path {
        out.push(usize::try_from(v.as_u64()?).ok()?);
    }
    Some(out)
}

pub(crate) fn string_arg(args: Option<&Value>, key: &str) -> Option<String> {
    args?.get(key)?.as_str().map(str::to_string)
}

/// Replacement ops for every child of the element at `block_path`.
pub(crate) fn replace_children_ops(
    block_path: &[usize],
    old_len: usize,
    children: Vec<Node>,
) -> Vec<crate::ops::Op> {
    let mut ops = Vec::with_capacity(old_len + children.len());
    for child_ix in (0..old_len).rev() {
        let mut path = block_path.to_vec();
        path.push(child_ix);
        ops.push(crate::ops::Op::RemoveNode { path });
    }
    for (child_ix, node) in children.into_iter().enumerate() {
        let mut path = block_path.to_vec();
        path.push(child_ix);
        ops.push(crate::ops::Op::InsertNode { path, node });
    }
    ops
}

/// Visits every node in document order together with its path.
pub(crate) fn visit_nodes(doc: &Document, visit: &mut dyn FnMut(&Node, &[usize])) {
    fn walk(nodes: &[Node], path: &mut Vec<usize>, visit: &mut dyn FnMut(&Node, &[usize])) {
        for (ix, node) in nodes.iter().enumerate() {
            path.push(ix);
            visit(node, path);
            if let Node::Element(el) = node {
                walk(&el.children, path, visit);
            }
            path.pop();
        }
    }
    walk(&doc.children, &mut Vec::new(), visit);
}

use serde_json::{Value, json};

use crate::core::{AttrPatch, Document, Editor, Node, Point, Selection};
use crate::image::{IMAGE_BLOCK_KIND, ImageBlockAttrs, clamp_percent};
use crate::ops::{Op, Path, Transaction};
use crate::plugin::{
    CommandError, CommandSpec, ContentPlugin, NodeSpec, NormalizePass, PluginRegistry, QuerySpec,
    commit,
};
use crate::tree::{
    active_text_block, element_is_text_block, first_point_in, insertion_point_after_focus,
    parse_path_arg, string_arg, total_inline_text_len, visit_nodes,
};

pub(crate) struct ImagePlugin;

impl ContentPlugin for ImagePlugin {
    fn id(&self) -> &'static str {
        "image"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::void_block(IMAGE_BLOCK_KIND)]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![Box::new(NormalizeImageBlockAttrs)]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        vec![
            CommandSpec::new("image.insert", "Insert image", |editor, args| {
                let args = args.as_ref();
                let src = string_arg(args, "src")
                    .filter(|s| !s.trim().is_empty())
                    .ok_or_else(|| CommandError::new("Missing args.src"))?;
                let mut attrs = ImageBlockAttrs::new(src)
                    .alt(string_arg(args, "alt").unwrap_or_default())
                    .caption(string_arg(args, "caption").unwrap_or_default())
                    .width(args.and_then(|v| v.get("width")));
                attrs.title = string_arg(args, "title").filter(|t| !t.is_empty());
                let at = parse_path_arg(args);
                let result = insert_image(editor, &attrs, at);
                commit(editor, result, "insert image")
            })
            .description("Insert an image block after the current block.")
            .keywords(["image", "picture", "photo", "img"])
            .args_example(json!({ "src": "https://example.com/a.png", "alt": "A", "width": 60 })),
            CommandSpec::new("image.set_attrs", "Set image attributes", |editor, args| {
                let result = set_image_attrs(editor, args.as_ref());
                commit(editor, result, "update image")
            })
            .description("Update width, alt, caption or title of an image block.")
            .keywords(["image", "width", "caption", "alt"])
            .args_example(json!({ "path": [1], "width": 55 })),
        ]
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![QuerySpec::new("image.selected", |editor, _args| {
            Ok(selected_image(editor).map_or(Value::Null, |(path, attrs)| {
                json!({ "path": path, "attrs": attrs })
            }))
        })]
    }
}

/// The node-selected image block, if any.
pub fn selected_image(editor: &Editor) -> Option<(Path, ImageBlockAttrs)> {
    let path = editor.selection().selected_void_path(editor.doc())?;
    let attrs = ImageBlockAttrs::from_node(editor.doc().node(&path)?)?;
    Some((path, attrs))
}

/// Inserts after the focused block, or replaces it when it is an empty paragraph.
///
/// `at` names a block path to insert before, for drops between blocks.
fn insert_image(
    editor: &Editor,
    attrs: &ImageBlockAttrs,
    at: Option<Path>,
) -> Result<Transaction, String> {
    let doc = editor.doc();
    let mut ops: Vec<Op> = Vec::new();

    let image_path: Path = match at {
        Some(path) => {
            let (&ix, parent) = path
                .split_last()
                .ok_or_else(|| "Invalid insert path".to_string())?;
            let len = doc
                .children_at(parent)
                .ok_or_else(|| "Invalid insert path".to_string())?
                .len();
            let mut clamped = parent.to_vec();
            clamped.push(ix.min(len));
            clamped
        }
        None => match active_text_block(editor) {
            Some((block_path, el))
                if el.kind == "paragraph" && total_inline_text_len(&el.children) == 0 =>
            {
                ops.push(Op::RemoveNode {
                    path: block_path.clone(),
                });
                block_path
            }
            _ => {
                let (parent, ix) = insertion_point_after_focus(editor);
                let mut path = parent;
                path.push(ix);
                path
            }
        },
    };

    ops.push(Op::InsertNode {
        path: image_path.clone(),
        node: Node::image_block(attrs),
    });

    // Land the caret in a text block right after the image, creating one if needed.
    let (&image_ix, parent) = image_path
        .split_last()
        .ok_or_else(|| "Invalid insert path".to_string())?;
    let mut next_path = parent.to_vec();
    next_path.push(image_ix + 1);

    let replaced_paragraph = ops.len() == 2;
    let following = doc.children_at(parent).and_then(|children| {
        let old_ix = if replaced_paragraph { image_ix + 1 } else { image_ix };
        children.get(old_ix)
    });
    let caret = match following {
        Some(Node::Element(el)) if element_is_text_block(el, editor.registry()) => {
            first_point_in(&Node::Element(el.clone()), &next_path)
        }
        _ => None,
    };
    let caret = match caret {
        Some(point) => point,
        None => {
            ops.push(Op::InsertNode {
                path: next_path.clone(),
                node: Node::paragraph(""),
            });
            next_path.push(0);
            Point::new(next_path, 0)
        }
    };

    Ok(Transaction::new(ops)
        .selection_after(Selection::collapsed(caret))
        .source("command:image.insert"))
}

fn set_image_attrs(editor: &Editor, args: Option<&Value>) -> Result<Transaction, String> {
    let path = parse_path_arg(args)
        .or_else(|| selected_image(editor).map(|(path, _)| path))
        .ok_or_else(|| "Missing args.path".to_string())?;
    let current = editor
        .doc()
        .node(&path)
        .and_then(ImageBlockAttrs::from_node)
        .ok_or_else(|| "Path is not an image block".to_string())?;

    let mut patch = AttrPatch::default();
    if let Some(width) = args.and_then(|v| v.get("width")) {
        let width = clamp_percent(width);
        if width != current.width {
            patch.set.insert("width".to_string(), Value::from(width));
        }
    }
    for key in ["alt", "caption"] {
        if let Some(value) = string_arg(args, key) {
            patch.set.insert(key.to_string(), Value::String(value));
        }
    }
    match args.and_then(|v| v.get("title")) {
        Some(Value::String(title)) if !title.is_empty() => {
            patch.set.insert("title".to_string(), Value::String(title.clone()));
        }
        Some(Value::String(_) | Value::Null) if current.title.is_some() => {
            patch.remove.push("title".to_string());
        }
        _ => {}
    }

    if patch.set.is_empty() && patch.remove.is_empty() {
        return Ok(Transaction::new(Vec::new()));
    }
    Ok(Transaction::new(vec![Op::SetNodeAttrs { path, patch }])
        .selection_after(editor.selection().clone())
        .source("command:image.set_attrs"))
}

/// Stored widths always pass through `clamp_percent`; text attributes are never missing.
struct NormalizeImageBlockAttrs;

impl NormalizePass for NormalizeImageBlockAttrs {
    fn id(&self) -> &'static str {
        "image.normalize_attrs"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        visit_nodes(doc, &mut |node, path| {
            let Node::Void(void) = node else {
                return;
            };
            if void.kind != IMAGE_BLOCK_KIND {
                return;
            }

            let mut patch = AttrPatch::default();
            let width = clamp_percent(void.attrs.get("width"));
            if void.attrs.get("width").and_then(Value::as_u64) != Some(u64::from(width)) {
                patch.set.insert("width".to_string(), Value::from(width));
            }
            for key in ["alt", "caption"] {
                if !void.attrs.get(key).is_some_and(Value::is_string) {
                    patch.set.insert(key.to_string(), Value::String(String::new()));
                }
            }
            if !patch.set.is_empty() {
                ops.push(Op::SetNodeAttrs {
                    path: path.to_vec(),
                    patch,
                });
            }
        });
        ops
    }
}

mod blocks;
mod core;
mod image;
mod list;
mod marks;
mod table;

pub use self::blocks::{
    BlockAlign, MAX_HEADING_LEVEL, MAX_INDENT_LEVEL, active_heading_level, active_indent_level,
};
pub use self::image::selected_image;
pub use self::list::{ListType, MAX_LIST_LEVEL, active_list_type, can_lift, can_sink};
pub use self::marks::active_marks;
pub use self::table::{
    DEFAULT_TABLE_COLS, DEFAULT_TABLE_ROWS, TableCapabilities, table_capabilities, table_node,
};

use crate::core::{Attrs, ElementNode, Node};
use crate::ops::Op;
use crate::plugin::ContentPlugin;

pub(crate) fn core_plugins() -> Vec<Box<dyn ContentPlugin>> {
    vec![
        Box::new(core::ParagraphPlugin),
        Box::new(core::DividerPlugin),
        Box::new(core::NormalizePlugin),
        Box::new(core::CoreCommandsPlugin),
    ]
}

pub(crate) fn content_plugins() -> Vec<Box<dyn ContentPlugin>> {
    let mut plugins = core_plugins();
    plugins.extend([
        Box::new(marks::MarksPlugin) as Box<dyn ContentPlugin>,
        Box::new(blocks::HeadingPlugin),
        Box::new(blocks::CodeBlockPlugin),
        Box::new(blocks::BlockquotePlugin),
        Box::new(blocks::AlignPlugin),
        Box::new(blocks::IndentPlugin),
        Box::new(list::ListPlugin),
        Box::new(table::TablePlugin),
        Box::new(image::ImagePlugin),
    ]);
    plugins
}

/// Attributes owned by a particular text block kind.
const KIND_SPECIFIC_ATTRS: [&str; 6] = [
    "level",
    "list_type",
    "list_level",
    "list_index",
    "checked",
    "language",
];

/// Turns a text block into another kind, keeping only attributes every text block shares.
pub(crate) fn retype_block(el: &ElementNode, kind: &str, extra: Attrs) -> ElementNode {
    let mut attrs = el.attrs.clone();
    for key in KIND_SPECIFIC_ATTRS {
        attrs.remove(key);
    }

    // Nesting carries over between `indent` and `list_level`.
    let level = el.attrs.get("list_level").cloned();
    match (kind == "list_item", level) {
        (true, Some(level)) => {
            attrs.insert("list_level".to_string(), level);
        }
        (true, None) => {
            if let Some(indent) = attrs.remove("indent") {
                attrs.insert("list_level".to_string(), indent);
            }
        }
        (false, Some(level)) => {
            attrs.entry("indent".to_string()).or_insert(level);
        }
        (false, None) => {}
    }

    attrs.extend(extra);
    ElementNode {
        kind: kind.to_string(),
        attrs,
        children: el.children.clone(),
    }
}

/// Swaps the block at `path` for `node` in place.
pub(crate) fn replace_block_ops(path: &[usize], node: Node) -> [Op; 2] {
    [
        Op::RemoveNode {
            path: path.to_vec(),
        },
        Op::InsertNode {
            path: path.to_vec(),
            node,
        },
    ]
}

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{AttrPatch, Attrs, Document, Editor, ElementNode, Node};
use crate::ops::{Op, Transaction};
use crate::plugin::{
    CommandSpec, ContentPlugin, NodeSpec, NormalizePass, PluginRegistry, QueryError, QuerySpec,
    commit,
};
use crate::plugins::blocks::MAX_INDENT_LEVEL;
use crate::plugins::{replace_block_ops, retype_block};
use crate::tree::{active_text_block, parse_path_arg, selected_text_blocks, string_arg};

pub const MAX_LIST_LEVEL: u64 = MAX_INDENT_LEVEL;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListType {
    Bulleted,
    Ordered,
    Task,
}

impl ListType {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "bulleted" => Some(Self::Bulleted),
            "ordered" => Some(Self::Ordered),
            "task" => Some(Self::Task),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bulleted => "bulleted",
            Self::Ordered => "ordered",
            Self::Task => "task",
        }
    }

    pub fn of(el: &ElementNode) -> Option<Self> {
        if el.kind != "list_item" {
            return None;
        }
        el.attrs
            .get("list_type")
            .and_then(Value::as_str)
            .and_then(Self::parse)
    }
}

pub(crate) struct ListPlugin;

impl ContentPlugin for ListPlugin {
    fn id(&self) -> &'static str {
        "list"
    }

    fn node_specs(&self) -> Vec<NodeSpec> {
        vec![NodeSpec::text_block("list_item")]
    }

    fn normalize_passes(&self) -> Vec<Box<dyn NormalizePass>> {
        vec![
            Box::new(NormalizeListItemAttrs),
            Box::new(NormalizeOrderedListIndices),
        ]
    }

    fn commands(&self) -> Vec<CommandSpec> {
        let toggles = [
            (ListType::Bulleted, "Bulleted list", ["list", "bulleted", "unordered", "ul"]),
            (ListType::Ordered, "Numbered list", ["list", "ordered", "numbered", "ol"]),
            (ListType::Task, "Task list", ["list", "task", "todo", "checkbox"]),
        ];
        let mut commands: Vec<CommandSpec> = toggles
            .into_iter()
            .map(|(list_type, label, keywords)| {
                CommandSpec::new(
                    format!("list.toggle_{}", list_type.as_str()),
                    format!("Toggle {}", label.to_lowercase()),
                    move |editor, _args| {
                        let result = toggle_list(editor, list_type);
                        commit(editor, result, "toggle list")
                    },
                )
                .description(format!("Toggle {} for the selected blocks.", label.to_lowercase()))
                .keywords(keywords)
            })
            .collect();

        commands.extend([
            CommandSpec::new("list.sink", "Sink list item", |editor, _args| {
                let result = shift_level(editor, 1);
                commit(editor, result, "sink list item")
            })
            .description("Nest the active list item under its previous sibling.")
            .keywords(["list", "indent", "nest", "sink"]),
            CommandSpec::new("list.lift", "Lift list item", |editor, _args| {
                let result = shift_level(editor, -1);
                commit(editor, result, "lift list item")
            })
            .description("Move the active list item one level out.")
            .keywords(["list", "outdent", "lift"]),
            CommandSpec::new("list.clear", "Clear list", |editor, _args| {
                let result = clear_list(editor);
                commit(editor, result, "clear list")
            })
            .description("Convert the selected list items back to paragraphs.")
            .keywords(["list", "unwrap", "paragraph"]),
            CommandSpec::new("list.toggle_checked", "Toggle checked", |editor, args| {
                let result = toggle_checked(editor, args.as_ref());
                commit(editor, result, "toggle checked")
            })
            .description("Check or uncheck a task item (args.path, or the active block).")
            .keywords(["task", "todo", "check", "done"])
            .args_example(serde_json::json!({ "path": [0] })),
        ]);
        commands
    }

    fn queries(&self) -> Vec<QuerySpec> {
        vec![
            QuerySpec::new("list.active_type", |editor, _args| {
                Ok(active_list_type(editor).map_or(Value::Null, |t| Value::String(t.as_str().into())))
            }),
            QuerySpec::new("list.is_active", |editor, args| {
                let expected = string_arg(args.as_ref(), "type")
                    .ok_or_else(|| QueryError::new("Missing args.type"))?;
                Ok(Value::Bool(
                    active_list_type(editor).is_some_and(|t| t.as_str() == expected),
                ))
            }),
            QuerySpec::new("list.can_sink", |editor, _args| Ok(Value::Bool(can_sink(editor)))),
            QuerySpec::new("list.can_lift", |editor, _args| Ok(Value::Bool(can_lift(editor)))),
        ]
    }
}

pub fn active_list_type(editor: &Editor) -> Option<ListType> {
    active_text_block(editor).and_then(|(_, el)| ListType::of(el))
}

fn list_level(el: &ElementNode) -> u64 {
    el.attrs.get("list_level").and_then(Value::as_u64).unwrap_or(0)
}

/// A list item can nest when its previous sibling is a list item at least as deep.
pub fn can_sink(editor: &Editor) -> bool {
    let Some((path, el)) = active_text_block(editor) else {
        return false;
    };
    if ListType::of(el).is_none() {
        return false;
    }
    let level = list_level(el);
    if level >= MAX_LIST_LEVEL {
        return false;
    }
    let Some((&ix, parent)) = path.split_last() else {
        return false;
    };
    let Some(prev_ix) = ix.checked_sub(1) else {
        return false;
    };
    match editor.doc().children_at(parent).and_then(|c| c.get(prev_ix)) {
        Some(Node::Element(prev)) if ListType::of(prev).is_some() => list_level(prev) >= level,
        _ => false,
    }
}

pub fn can_lift(editor: &Editor) -> bool {
    active_text_block(editor)
        .is_some_and(|(_, el)| ListType::of(el).is_some() && list_level(el) > 0)
}

fn toggle_list(editor: &Editor, list_type: ListType) -> Result<Transaction, String> {
    let blocks = selected_text_blocks(editor)?;
    let all_of_type = blocks.iter().all(|b| ListType::of(b.el) == Some(list_type));

    let mut ops: Vec<Op> = Vec::new();
    for block in &blocks {
        let next = if all_of_type {
            retype_block(block.el, "paragraph", Attrs::default())
        } else if ListType::of(block.el) == Some(list_type) {
            continue;
        } else {
            let mut extra = Attrs::default();
            extra.insert("list_type".to_string(), Value::from(list_type.as_str()));
            if list_type == ListType::Task {
                extra.insert("checked".to_string(), Value::Bool(false));
            }
            retype_block(block.el, "list_item", extra)
        };
        ops.extend(replace_block_ops(&block.path, Node::Element(next)));
    }

    Ok(Transaction::new(ops)
        .selection_after(editor.selection().clone())
        .source(format!("command:list.toggle_{}", list_type.as_str())))
}

fn shift_level(editor: &Editor, delta: i8) -> Result<Transaction, String> {
    let allowed = if delta > 0 {
        can_sink(editor)
    } else {
        can_lift(editor)
    };
    let Some((path, el)) = active_text_block(editor).filter(|_| allowed) else {
        return Ok(Transaction::new(Vec::new()));
    };

    let level = list_level(el);
    let next = if delta > 0 {
        level + 1
    } else {
        level.saturating_sub(1)
    };
    Ok(Transaction::new(vec![Op::SetNodeAttrs {
        path,
        patch: AttrPatch::set("list_level", next),
    }])
    .selection_after(editor.selection().clone())
    .source(if delta > 0 {
        "command:list.sink"
    } else {
        "command:list.lift"
    }))
}

fn clear_list(editor: &Editor) -> Result<Transaction, String> {
    let mut ops: Vec<Op> = Vec::new();
    for block in selected_text_blocks(editor)? {
        if block.el.kind == "list_item" {
            let next = retype_block(block.el, "paragraph", Attrs::default());
            ops.extend(replace_block_ops(&block.path, Node::Element(next)));
        }
    }
    Ok(Transaction::new(ops)
        .selection_after(editor.selection().clone())
        .source("command:list.clear"))
}

fn toggle_checked(editor: &Editor, args: Option<&Value>) -> Result<Transaction, String> {
    let block_path = parse_path_arg(args)
        .or_else(|| active_text_block(editor).map(|(path, _)| path))
        .ok_or_else(|| "No active block".to_string())?;

    let Some(Node::Element(el)) = editor.doc().node(&block_path) else {
        return Err("Path is not a task item".into());
    };
    if ListType::of(el) != Some(ListType::Task) {
        return Err("Path is not a task item".into());
    }

    let checked = el.attrs.get("checked").and_then(Value::as_bool).unwrap_or(false);
    Ok(Transaction::new(vec![Op::SetNodeAttrs {
        path: block_path,
        patch: AttrPatch::set("checked", !checked),
    }])
    .selection_after(editor.selection().clone())
    .source("command:list.toggle_checked"))
}

struct NormalizeListItemAttrs;

impl NormalizePass for NormalizeListItemAttrs {
    fn id(&self) -> &'static str {
        "list.normalize_item_attrs"
    }

    fn run(&self, doc: &Document, _registry: &PluginRegistry) -> Vec<Op> {
        let mut ops = Vec::new();
        crate::tree::visit_nodes(doc, &mut |node, path| {
            let Node::Element(el) = node else {
                return;
            };
            if el.kind != "list_item" {
                return;
            }
            let mut patch = AttrPatch::default();
            let list_type = ListType::of(el).unwrap_or_else(|| {
                patch.set.insert(
                    "list_type".to_string(),
                    Value::from(ListType::Bulleted.as_str()),
                );
                ListType::Bulleted
            });
            let checked = el.attrs.get("checked");
            match list_type {
                ListType::Task if !checked.is_some_and(Value::is_boolean) => {
                    patch.set.insert("checked".to_string(), Value::Bool(false));
                }
                ListType::Bulleted | ListType::Ordered if checked.is_some() => {
                    patch.remove.push("checked".to_string());
                }
                _ => {}
            }
            if !patch.set.is_empty() || !patch.remove.is_empty() {
                ops.push(Op::SetNodeAttrs {
                    path: path.to_vec(),
                    patch,
                });
            }
        });
        ops
    }
}

/// Numbers ordered items per nesting level within each run of sibling list items.
struct NormalizeOrderedListIndices;

impl NormalizePass for NormalizeOrderedListIndices {
    fn id(&self) -> &'static str {
        "list.normalize_ordered_indices"
    }

    fn run(&self, doc: &Document, registry: &PluginRegistry) -> Vec<Op> {
        fn number_container(
            children: &[Node],
            parent_path: &mut Vec<usize>,
            registry: &PluginRegistry,
            ops: &mut Vec<Op>,
        ) {
            let mut counters = [0u64; MAX_LIST_LEVEL as usize + 1];

            for (ix, node) in children.iter().enumerate() {
                let list_item = match node {
                    Node::Element(el) => ListType::of(el).map(|t| (t, el)),
                    _ => None,
                };
                let Some((list_type, el)) = list_item else {
                    counters = [0; MAX_LIST_LEVEL as usize + 1];
                    continue;
                };

                let level = (list_level(el).min(MAX_LIST_LEVEL)) as usize;
                for deeper in counters.iter_mut().skip(level + 1) {
                    *deeper = 0;
                }

                let mut path = parent_path.clone();
                path.push(ix);
                let current = el.attrs.get("list_index");

                if list_type != ListType::Ordered {
                    counters[level] = 0;
                    if current.is_some() {
                        ops.push(Op::SetNodeAttrs {
                            path,
                            patch: AttrPatch::remove("list_index"),
                        });
                    }
                    continue;
                }

                counters[level] += 1;
                let desired = Value::from(counters[level]);
                if current != Some(&desired) {
                    ops.push(Op::SetNodeAttrs {
                        path,
                        patch: AttrPatch::set("list_index", desired),
                    });
                }
            }

            for (ix, node) in children.iter().enumerate() {
                let Node::Element(el) = node else {
                    continue;
                };
                if el.children.is_empty() || crate::tree::element_is_text_block(el, registry) {
                    continue;
                }
                parent_path.push(ix);
                number_container(&el.children, parent_path, registry, ops);
                parent_path.pop();
            }
        }

        let mut ops = Vec::new();
        number_container(&doc.children, &mut Vec::new(), registry, &mut ops);
        ops
    }
}

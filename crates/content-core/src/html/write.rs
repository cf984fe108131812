use std::fmt::Write as _;

use serde_json::Value;

use crate::core::{Document, ElementNode, Marks, Node, TextNode, VoidNode};
use crate::image::{IMAGE_BLOCK_KIND, ImageBlockAttrs};
use crate::plugins::{BlockAlign, ListType};

/// Serializes a document to the HTML handed to callers.
///
/// An empty document still produces a single empty paragraph.
pub fn to_html(doc: &Document) -> String {
    let mut out = String::new();
    write_blocks(&doc.children, &mut out);
    if out.is_empty() {
        out.push_str("<p></p>");
    }
    out
}

/// Consecutive list items share list elements; `list_level` opens nested lists inside
/// the previous item.
fn write_blocks(children: &[Node], out: &mut String) {
    let mut open_lists: Vec<ListType> = Vec::new();

    for child in children {
        match child {
            Node::Element(el) if el.kind == "list_item" => {
                write_list_item(el, &mut open_lists, out);
            }
            _ => {
                close_lists(&mut open_lists, 0, out);
                write_block(child, out);
            }
        }
    }
    close_lists(&mut open_lists, 0, out);
}

fn write_list_item(el: &ElementNode, open_lists: &mut Vec<ListType>, out: &mut String) {
    let list_type = ListType::of(el).unwrap_or(ListType::Bulleted);
    let requested = el
        .attrs
        .get("list_level")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let level = usize::try_from(requested)
        .unwrap_or(usize::MAX)
        .min(open_lists.len());

    close_lists(open_lists, level + 1, out);
    match open_lists.last() {
        Some(current) if open_lists.len() == level + 1 && *current == list_type => {
            out.push_str("</li>");
        }
        Some(_) if open_lists.len() == level + 1 => {
            close_lists(open_lists, level, out);
            open_list(list_type, open_lists, out);
        }
        _ => open_list(list_type, open_lists, out),
    }

    if list_type == ListType::Task {
        let checked = el.attrs.get("checked").and_then(Value::as_bool).unwrap_or(false);
        let _ = write!(out, r#"<li data-type="taskItem" data-checked="{checked}">"#);
    } else {
        out.push_str("<li>");
    }
    let _ = write!(out, "<p{}>", text_block_attrs(el));
    write_inline(&el.children, out);
    out.push_str("</p>");
}

fn open_list(list_type: ListType, open_lists: &mut Vec<ListType>, out: &mut String) {
    out.push_str(match list_type {
        ListType::Bulleted => "<ul>",
        ListType::Ordered => "<ol>",
        ListType::Task => r#"<ul data-type="taskList">"#,
    });
    open_lists.push(list_type);
}

fn close_lists(open_lists: &mut Vec<ListType>, keep: usize, out: &mut String) {
    while open_lists.len() > keep {
        let Some(list_type) = open_lists.pop() else {
            break;
        };
        out.push_str("</li>");
        out.push_str(if list_type == ListType::Ordered {
            "</ol>"
        } else {
            "</ul>"
        });
    }
}

fn write_block(node: &Node, out: &mut String) {
    match node {
        Node::Element(el) => match el.kind.as_str() {
            "paragraph" => {
                let _ = write!(out, "<p{}>", text_block_attrs(el));
                write_inline(&el.children, out);
                out.push_str("</p>");
            }
            "heading" => {
                let level = el
                    .attrs
                    .get("level")
                    .and_then(Value::as_u64)
                    .unwrap_or(1)
                    .clamp(1, 6);
                let _ = write!(out, "<h{level}{}>", text_block_attrs(el));
                write_inline(&el.children, out);
                let _ = write!(out, "</h{level}>");
            }
            "code_block" => write_code_block(el, out),
            "blockquote" => {
                out.push_str("<blockquote>");
                write_blocks(&el.children, out);
                out.push_str("</blockquote>");
            }
            "table" => write_table(el, out),
            _ => write_blocks(&el.children, out),
        },
        Node::Void(void) => write_void(void, out),
        Node::Text(text) => {
            out.push_str("<p>");
            write_leaf(text, out);
            out.push_str("</p>");
        }
    }
}

fn write_void(void: &VoidNode, out: &mut String) {
    match void.kind.as_str() {
        "divider" => out.push_str("<hr>"),
        IMAGE_BLOCK_KIND => write_image_block(&ImageBlockAttrs::from_attrs(&void.attrs), out),
        _ => {}
    }
}

/// `figure[data-type=image-block] > img`, with a caption only when one is set.
fn write_image_block(attrs: &ImageBlockAttrs, out: &mut String) {
    let width = attrs.width;
    let _ = write!(
        out,
        r#"<figure data-type="image-block" data-width="{width}"><img src="{}" alt="{}""#,
        escape_attr(attrs.src.as_deref().unwrap_or_default()),
        escape_attr(&attrs.alt),
    );
    if let Some(title) = &attrs.title {
        let _ = write!(out, r#" title="{}""#, escape_attr(title));
    }
    let _ = write!(out, r#" style="width: {width}%;" data-width="{width}">"#);
    if !attrs.caption.is_empty() {
        let _ = write!(out, "<figcaption>{}</figcaption>", escape_text(&attrs.caption));
    }
    out.push_str("</figure>");
}

fn write_code_block(el: &ElementNode, out: &mut String) {
    out.push_str("<pre><code");
    if let Some(language) = el
        .attrs
        .get("language")
        .and_then(Value::as_str)
        .filter(|l| !l.is_empty())
    {
        let _ = write!(out, r#" class="language-{}""#, escape_attr(language));
    }
    out.push('>');
    let code: String = el.children.iter().map(Node::text_content).collect();
    out.push_str(&escape_text(&code));
    out.push_str("</code></pre>");
}

fn write_table(el: &ElementNode, out: &mut String) {
    let header_row = el
        .attrs
        .get("header_row")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    out.push_str("<table><tbody>");
    let rows = el.children.iter().filter_map(|row| match row {
        Node::Element(row) if row.kind == "table_row" => Some(row),
        _ => None,
    });
    for (row_ix, row) in rows.enumerate() {
        let tag = if header_row && row_ix == 0 { "th" } else { "td" };
        out.push_str("<tr>");
        for cell in &row.children {
            let Node::Element(cell) = cell else {
                continue;
            };
            let _ = write!(out, "<{tag}>");
            write_blocks(&cell.children, out);
            let _ = write!(out, "</{tag}>");
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
}

fn text_block_attrs(el: &ElementNode) -> String {
    let mut attrs = String::new();
    let align = BlockAlign::of(el);
    if align != BlockAlign::Left {
        let _ = write!(attrs, r#" style="text-align: {};""#, align.as_str());
    }
    if let Some(indent) = el
        .attrs
        .get("indent")
        .and_then(Value::as_u64)
        .filter(|indent| *indent > 0)
    {
        let _ = write!(attrs, r#" data-indent="{indent}""#);
    }
    attrs
}

fn write_inline(children: &[Node], out: &mut String) {
    for child in children {
        match child {
            Node::Text(text) => write_leaf(text, out),
            Node::Element(el) => write_inline(&el.children, out),
            Node::Void(_) => {}
        }
    }
}

/// Wrappers open outermost first: link, highlight, color, then the boolean marks.
fn write_leaf(leaf: &TextNode, out: &mut String) {
    if leaf.text.is_empty() {
        return;
    }

    let marks = &leaf.marks;
    let mut closers: Vec<&'static str> = Vec::new();

    if let Some(href) = &marks.link {
        let _ = write!(out, r#"<a href="{}">"#, escape_attr(href));
        closers.push("</a>");
    }
    if let Some(color) = &marks.highlight_color {
        let color = escape_attr(color);
        let _ = write!(
            out,
            r#"<mark data-color="{color}" style="background-color: {color};">"#
        );
        closers.push("</mark>");
    }
    if let Some(color) = &marks.text_color {
        let _ = write!(out, r#"<span style="color: {};">"#, escape_attr(color));
        closers.push("</span>");
    }
    for (enabled, open, close) in boolean_mark_tags(marks) {
        if enabled {
            out.push_str(open);
            closers.push(close);
        }
    }

    for (ix, line) in leaf.text.split('\n').enumerate() {
        if ix > 0 {
            out.push_str("<br>");
        }
        out.push_str(&escape_text(line));
    }

    for close in closers.iter().rev() {
        out.push_str(close);
    }
}

fn boolean_mark_tags(marks: &Marks) -> [(bool, &'static str, &'static str); 7] {
    [
        (marks.bold, "<strong>", "</strong>"),
        (marks.italic, "<em>", "</em>"),
        (marks.underline, "<u>", "</u>"),
        (marks.strikethrough, "<s>", "</s>"),
        (marks.code, "<code>", "</code>"),
        (marks.subscript, "<sub>", "</sub>"),
        (marks.superscript, "<sup>", "</sup>"),
    ]
}

pub(crate) fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

pub(crate) fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_quotes_only_in_attributes() {
        assert_eq!(escape_text(r#"a < "b" & c"#), r#"a &lt; "b" &amp; c"#);
        assert_eq!(escape_attr(r#"say "hi""#), "say &quot;hi&quot;");
    }
}

use std::cell::RefCell;

use html5ever::tendril::StrTendril;
use html5ever::tokenizer::{
    BufferQueue, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use serde_json::Value;

use crate::core::{Attrs, Document, Marks, Node, TextNode};
use crate::html::style_property;
use crate::image::{ImageBlockAttrs, clamp_percent};
use crate::plugins::{BlockAlign, ListType, MAX_LIST_LEVEL};

/// Parses stored HTML into a document.
///
/// Unknown tags are dropped but their text is kept. A document with no blocks gets a
/// single empty paragraph.
pub fn from_html(html: &str) -> Document {
    let dom = build_dom(tokenize(html));
    let mut blocks = Vec::new();
    blocks_from(&dom, &mut blocks);
    if blocks.is_empty() {
        blocks.push(Node::paragraph(""));
    }
    tracing::trace!(blocks = blocks.len(), "parsed html");
    Document::new(blocks)
}

#[derive(Debug)]
enum HtmlToken {
    Start {
        name: String,
        attrs: Vec<(String, String)>,
        self_closing: bool,
    },
    End(String),
    Text(String),
}

struct HtmlSink {
    tokens: RefCell<Vec<HtmlToken>>,
}

impl TokenSink for HtmlSink {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        match token {
            Token::TagToken(tag) => {
                let name = tag.name.to_string();
                let token = match tag.kind {
                    TagKind::StartTag => HtmlToken::Start {
                        name,
                        attrs: tag
                            .attrs
                            .iter()
                            .map(|a| (a.name.local.to_string(), a.value.to_string()))
                            .collect(),
                        self_closing: tag.self_closing,
                    },
                    TagKind::EndTag => HtmlToken::End(name),
                };
                self.tokens.borrow_mut().push(token);
            }
            Token::CharacterTokens(s) => {
                self.tokens.borrow_mut().push(HtmlToken::Text(s.to_string()));
            }
            _ => {}
        }
        TokenSinkResult::Continue
    }
}

fn tokenize(html: &str) -> Vec<HtmlToken> {
    let sink = HtmlSink {
        tokens: RefCell::new(Vec::new()),
    };
    let tokenizer = Tokenizer::new(sink, TokenizerOpts::default());
    let mut queue = BufferQueue::default();
    queue.push_back(StrTendril::from(html));
    let _ = tokenizer.feed(&mut queue);
    tokenizer.end();
    tokenizer.sink.tokens.into_inner()
}

#[derive(Debug, Clone)]
enum HtmlNode {
    Element(HtmlElement),
    Text(String),
}

#[derive(Debug, Clone, Default)]
struct HtmlElement {
    name: String,
    attrs: Vec<(String, String)>,
    children: Vec<HtmlNode>,
}

impl HtmlElement {
    fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn style(&self, property: &str) -> Option<&str> {
        self.attr("style").and_then(|style| style_property(style, property))
    }

    fn elements(&self) -> impl Iterator<Item = &HtmlElement> {
        self.children.iter().filter_map(|child| match child {
            HtmlNode::Element(el) => Some(el),
            HtmlNode::Text(_) => None,
        })
    }

    fn find(&self, name: &str) -> Option<&HtmlElement> {
        self.elements()
            .find_map(|el| if el.name == name { Some(el) } else { el.find(name) })
    }
}

const VOID_TAGS: [&str; 9] = ["img", "br", "hr", "input", "meta", "link", "col", "source", "wbr"];

const BLOCK_TAGS: [&str; 24] = [
    "p", "div", "h1", "h2", "h3", "h4", "h5", "h6", "pre", "blockquote", "ul", "ol", "li",
    "table", "thead", "tbody", "tfoot", "tr", "figure", "hr", "section", "article", "header",
    "footer",
];

fn is_block_tag(name: &str) -> bool {
    BLOCK_TAGS.contains(&name) || matches!(name, "main" | "nav" | "aside" | "body" | "html")
}

fn is_ignored_tag(name: &str) -> bool {
    matches!(name, "head" | "title" | "script" | "style" | "template")
}

/// A forgiving tree builder: block starts close an open `<p>`, sibling `<li>`/`<tr>`/cells
/// close their predecessor, and unmatched end tags are ignored.
fn build_dom(tokens: Vec<HtmlToken>) -> Vec<HtmlNode> {
    let mut stack: Vec<HtmlElement> = vec![HtmlElement::default()];

    for token in tokens {
        match token {
            HtmlToken::Start {
                name,
                attrs,
                self_closing,
            } => {
                close_implied(&mut stack, &name);
                let element = HtmlElement {
                    name,
                    attrs,
                    children: Vec::new(),
                };
                if self_closing || VOID_TAGS.contains(&element.name.as_str()) {
                    append(&mut stack, HtmlNode::Element(element));
                } else {
                    stack.push(element);
                }
            }
            HtmlToken::End(name) => {
                if let Some(ix) = stack.iter().rposition(|el| el.name == name) {
                    if ix > 0 {
                        pop_until(&mut stack, ix);
                    }
                }
            }
            HtmlToken::Text(text) => append(&mut stack, HtmlNode::Text(text)),
        }
    }

    pop_until(&mut stack, 1);
    stack.pop().map(|root| root.children).unwrap_or_default()
}

fn close_implied(stack: &mut Vec<HtmlElement>, starting: &str) {
    if is_block_tag(starting) {
        let scope = ["li", "td", "th", "blockquote", "figure"];
        if let Some(ix) = open_in_scope(stack, &["p"], &scope) {
            pop_until(stack, ix);
        }
    }
    let implied = match starting {
        "li" => open_in_scope(stack, &["li"], &["ul", "ol"]),
        "tr" => open_in_scope(stack, &["tr"], &["table"]),
        "td" | "th" => open_in_scope(stack, &["td", "th"], &["tr"]),
        _ => None,
    };
    if let Some(ix) = implied {
        pop_until(stack, ix);
    }
}

/// Stack index of the innermost open `names` element not shadowed by a `scope` element.
fn open_in_scope(stack: &[HtmlElement], names: &[&str], scope: &[&str]) -> Option<usize> {
    let ix = stack.iter().rposition(|el| names.contains(&el.name.as_str()))?;
    let scope_ix = stack.iter().rposition(|el| scope.contains(&el.name.as_str()));
    (ix > 0 && scope_ix.is_none_or(|scope_ix| scope_ix < ix)).then_some(ix)
}

/// Closes every element from the top of the stack down to and including `ix`.
fn pop_until(stack: &mut Vec<HtmlElement>, ix: usize) {
    while stack.len() > ix.max(1) {
        let Some(element) = stack.pop() else {
            break;
        };
        append(stack, HtmlNode::Element(element));
    }
}

fn append(stack: &mut [HtmlElement], node: HtmlNode) {
    if let Some(top) = stack.last_mut() {
        top.children.push(node);
    }
}

/// Inline content collected for one text block. Images split the block in two.
enum Inline {
    Text(TextNode),
    Image(ImageBlockAttrs),
}

fn blocks_from(nodes: &[HtmlNode], out: &mut Vec<Node>) {
    let mut pending: Vec<Inline> = Vec::new();

    for node in nodes {
        match node {
            HtmlNode::Element(el) if is_block_tag(&el.name) => {
                flush_text_block("paragraph", Attrs::default(), &mut pending, false, out);
                block_from(el, out);
            }
            _ => collect_inline(std::slice::from_ref(node), &Marks::default(), &mut pending),
        }
    }
    flush_text_block("paragraph", Attrs::default(), &mut pending, false, out);
}

fn block_from(el: &HtmlElement, out: &mut Vec<Node>) {
    match el.name.as_str() {
        "p" => {
            let mut items = Vec::new();
            collect_inline(&el.children, &Marks::default(), &mut items);
            flush_text_block("paragraph", text_block_attrs(el), &mut items, true, out);
        }
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level: u64 = el.name[1..].parse().unwrap_or(1);
            let mut attrs = text_block_attrs(el);
            attrs.insert("level".to_string(), Value::from(level));
            let mut items = Vec::new();
            collect_inline(&el.children, &Marks::default(), &mut items);
            flush_text_block("heading", attrs, &mut items, true, out);
        }
        "pre" => out.push(code_block_from(el)),
        "blockquote" => {
            let mut inner = Vec::new();
            blocks_from(&el.children, &mut inner);
            if inner.is_empty() {
                inner.push(Node::paragraph(""));
            }
            out.push(Node::element("blockquote", Attrs::default(), inner));
        }
        "hr" => out.push(Node::divider()),
        "ul" | "ol" => list_from(el, 0, out),
        "li" => list_item_from(el, ListType::Bulleted, 0, out),
        "table" => {
            if let Some(table) = table_from(el) {
                out.push(table);
            }
        }
        "figure" => match image_from_figure(el) {
            Some(image) => out.push(image),
            None => blocks_from(&el.children, out),
        },
        _ => blocks_from(&el.children, out),
    }
}

fn text_block_attrs(el: &HtmlElement) -> Attrs {
    let mut attrs = Attrs::default();
    if let Some(align) = el
        .style("text-align")
        .or_else(|| el.attr("align"))
        .map(|value| value.trim().to_ascii_lowercase())
        .and_then(|value| BlockAlign::parse(&value))
        .filter(|align| *align != BlockAlign::Left)
    {
        attrs.insert("align".to_string(), Value::from(align.as_str()));
    }
    if let Some(indent) = el
        .attr("data-indent")
        .and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|indent| *indent > 0)
    {
        attrs.insert("indent".to_string(), Value::from(indent));
    }
    attrs
}

/// Emits the collected inline items as blocks of `kind`, splitting around images.
///
/// With `keep_empty`, a block that collected nothing still yields an empty block.
fn flush_text_block(
    kind: &str,
    attrs: Attrs,
    items: &mut Vec<Inline>,
    keep_empty: bool,
    out: &mut Vec<Node>,
) {
    let mut emitted = false;
    let mut leaves: Vec<TextNode> = Vec::new();

    let emit_leaves = |leaves: &mut Vec<TextNode>, out: &mut Vec<Node>, force: bool| {
        let children = finish_leaves(std::mem::take(leaves));
        if force || children.is_some() {
            let children = children.unwrap_or_else(|| vec![Node::text("")]);
            out.push(Node::element(kind, attrs.clone(), children));
        }
    };

    for item in items.drain(..) {
        match item {
            Inline::Text(leaf) => leaves.push(leaf),
            Inline::Image(image) => {
                emit_leaves(&mut leaves, out, false);
                out.push(Node::image_block(&image));
                emitted = true;
            }
        }
    }
    let force = keep_empty && !emitted;
    emit_leaves(&mut leaves, out, force);
}

/// Merges equally marked neighbours and trims the block edges. `None` when no text is left.
fn finish_leaves(leaves: Vec<TextNode>) -> Option<Vec<Node>> {
    let mut merged: Vec<TextNode> = Vec::new();
    for leaf in leaves {
        match merged.last_mut() {
            Some(last) if last.marks == leaf.marks => last.text.push_str(&leaf.text),
            _ => merged.push(leaf),
        }
    }

    if let Some(first) = merged.first_mut() {
        first.text = first.text.trim_start_matches(' ').to_string();
    }
    if let Some(last) = merged.last_mut() {
        last.text = last.text.trim_end_matches(' ').to_string();
    }
    merged.retain(|leaf| !leaf.text.is_empty());

    if merged.is_empty() {
        return None;
    }
    Some(merged.into_iter().map(Node::Text).collect())
}

fn collect_inline(nodes: &[HtmlNode], marks: &Marks, out: &mut Vec<Inline>) {
    for node in nodes {
        let el = match node {
            HtmlNode::Text(text) => {
                let text = collapse_whitespace(text);
                if !text.is_empty() {
                    out.push(Inline::Text(TextNode {
                        text,
                        marks: marks.clone(),
                    }));
                }
                continue;
            }
            HtmlNode::Element(el) => el,
        };

        match el.name.as_str() {
            name if is_ignored_tag(name) => {}
            "br" => out.push(Inline::Text(TextNode {
                text: "\n".to_string(),
                marks: marks.clone(),
            })),
            "img" => out.push(Inline::Image(image_attrs_from_img(el, None, None))),
            "figure" => {
                if let Some(image) = figure_image_attrs(el) {
                    out.push(Inline::Image(image));
                }
            }
            _ => {
                let marks = marks_for(el, marks);
                collect_inline(&el.children, &marks, out);
            }
        }
    }
}

fn marks_for(el: &HtmlElement, outer: &Marks) -> Marks {
    let mut marks = outer.clone();
    match el.name.as_str() {
        "strong" | "b" => marks.bold = true,
        "em" | "i" => marks.italic = true,
        "u" => marks.underline = true,
        "s" | "strike" | "del" => marks.strikethrough = true,
        "code" => marks.code = true,
        "sub" => {
            marks.subscript = true;
            marks.superscript = false;
        }
        "sup" => {
            marks.superscript = true;
            marks.subscript = false;
        }
        "a" => {
            if let Some(href) = el.attr("href").filter(|href| !href.trim().is_empty()) {
                marks.link = Some(href.trim().to_string());
            }
        }
        "mark" => {
            let color = el
                .attr("data-color")
                .or_else(|| el.style("background-color"))
                .unwrap_or("yellow");
            marks.highlight_color = Some(color.to_string());
        }
        _ => {}
    }
    if el.name != "mark" {
        if let Some(color) = el.style("background-color") {
            marks.highlight_color = Some(color.to_string());
        }
    }
    if let Some(color) = el.style("color") {
        marks.text_color = Some(color.to_string());
    }
    marks
}

/// Formatting whitespace (any run containing a line break or tab) becomes one space.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut run = String::new();
    for ch in text.chars() {
        if ch.is_ascii_whitespace() {
            run.push(ch);
            continue;
        }
        flush_whitespace_run(&mut run, &mut out);
        out.push(ch);
    }
    flush_whitespace_run(&mut run, &mut out);
    out
}

fn flush_whitespace_run(run: &mut String, out: &mut String) {
    if run.is_empty() {
        return;
    }
    if run.chars().any(|ch| ch != ' ') {
        out.push(' ');
    } else {
        out.push_str(run);
    }
    run.clear();
}

fn code_block_from(pre: &HtmlElement) -> Node {
    let code = pre.find("code");
    let language = code
        .and_then(|code| code.attr("class"))
        .into_iter()
        .flat_map(str::split_whitespace)
        .find_map(|class| class.strip_prefix("language-"))
        .map(str::to_string)
        .or_else(|| pre.attr("data-language").map(str::to_string));

    let mut text = String::new();
    raw_text(&pre.children, &mut text);
    if let Some(stripped) = text.strip_prefix('\n') {
        text = stripped.to_string();
    }

    let mut attrs = Attrs::default();
    if let Some(language) = language.filter(|l| !l.is_empty()) {
        attrs.insert("language".to_string(), Value::from(language));
    }
    Node::element("code_block", attrs, vec![Node::text(text)])
}

fn raw_text(nodes: &[HtmlNode], out: &mut String) {
    for node in nodes {
        match node {
            HtmlNode::Text(text) => out.push_str(text),
            HtmlNode::Element(el) if el.name == "br" => out.push('\n'),
            HtmlNode::Element(el) => raw_text(&el.children, out),
        }
    }
}

fn list_from(list: &HtmlElement, level: u64, out: &mut Vec<Node>) {
    let list_type = match (list.name.as_str(), list.attr("data-type")) {
        ("ol", _) => ListType::Ordered,
        (_, Some("taskList")) => ListType::Task,
        _ => ListType::Bulleted,
    };
    for child in list.elements() {
        match child.name.as_str() {
            "li" => list_item_from(child, list_type, level, out),
            "ul" | "ol" => list_from(child, (level + 1).min(MAX_LIST_LEVEL), out),
            _ => {}
        }
    }
}

fn list_item_from(li: &HtmlElement, list_type: ListType, level: u64, out: &mut Vec<Node>) {
    let list_type = if li.attr("data-type") == Some("taskItem") {
        ListType::Task
    } else {
        list_type
    };

    let mut attrs = Attrs::default();
    let mut items = Vec::new();
    let mut nested = Vec::new();
    for child in &li.children {
        match child {
            HtmlNode::Element(el) if matches!(el.name.as_str(), "ul" | "ol") => nested.push(el),
            HtmlNode::Element(el) if el.name == "p" => {
                if attrs.is_empty() {
                    attrs = text_block_attrs(el);
                }
                collect_inline(&el.children, &Marks::default(), &mut items);
            }
            other => collect_inline(std::slice::from_ref(other), &Marks::default(), &mut items),
        }
    }

    attrs.remove("indent");
    attrs.insert("list_type".to_string(), Value::from(list_type.as_str()));
    attrs.insert("list_level".to_string(), Value::from(level));
    if list_type == ListType::Task {
        let checked = li.attr("data-checked") == Some("true");
        attrs.insert("checked".to_string(), Value::Bool(checked));
    }
    flush_text_block("list_item", attrs, &mut items, true, out);

    for list in nested {
        list_from(list, (level + 1).min(MAX_LIST_LEVEL), out);
    }
}

fn table_from(table: &HtmlElement) -> Option<Node> {
    let mut rows: Vec<&HtmlElement> = Vec::new();
    for child in table.elements() {
        match child.name.as_str() {
            "tr" => rows.push(child),
            "thead" | "tbody" | "tfoot" => {
                rows.extend(child.elements().filter(|el| el.name == "tr"));
            }
            _ => {}
        }
    }

    fn cells_of(row: &HtmlElement) -> Vec<&HtmlElement> {
        row.elements()
            .filter(|el| matches!(el.name.as_str(), "td" | "th"))
            .collect()
    }
    let first = rows.first()?;
    let first_cells = cells_of(first);
    let header_row = !first_cells.is_empty() && first_cells.iter().all(|cell| cell.name == "th");
    let cols = rows.iter().map(|row| cells_of(row).len()).max().unwrap_or(0).max(1);

    let rows = rows
        .iter()
        .map(|row| {
            let mut cells: Vec<Node> = cells_of(row)
                .into_iter()
                .map(|cell| {
                    let mut blocks = Vec::new();
                    blocks_from(&cell.children, &mut blocks);
                    if blocks.is_empty() {
                        blocks.push(Node::paragraph(""));
                    }
                    Node::element("table_cell", Attrs::default(), blocks)
                })
                .collect();
            while cells.len() < cols {
                cells.push(Node::element(
                    "table_cell",
                    Attrs::default(),
                    vec![Node::paragraph("")],
                ));
            }
            Node::element("table_row", Attrs::default(), cells)
        })
        .collect();

    let mut attrs = Attrs::default();
    attrs.insert("header_row".to_string(), Value::Bool(header_row));
    Some(Node::element("table", attrs, rows))
}

fn image_from_figure(figure: &HtmlElement) -> Option<Node> {
    figure_image_attrs(figure).map(|attrs| Node::image_block(&attrs))
}

/// `figure[data-type=image-block]` or any figure wrapping an `img`.
fn figure_image_attrs(figure: &HtmlElement) -> Option<ImageBlockAttrs> {
    let img = figure.find("img")?;
    let caption = figure.find("figcaption").map(|caption| {
        let mut text = String::new();
        raw_text(&caption.children, &mut text);
        collapse_whitespace(&text).trim().to_string()
    });
    Some(image_attrs_from_img(img, figure.attr("data-width"), caption))
}

/// Width precedence: the wrapper's `data-width`, the image's `data-width`, then its
/// inline style width.
fn image_attrs_from_img(
    img: &HtmlElement,
    wrapper_width: Option<&str>,
    caption: Option<String>,
) -> ImageBlockAttrs {
    let width = wrapper_width
        .or_else(|| img.attr("data-width"))
        .or_else(|| img.style("width"));

    ImageBlockAttrs {
        src: img.attr("src").filter(|src| !src.is_empty()).map(str::to_string),
        alt: img.attr("alt").unwrap_or_default().to_string(),
        title: img.attr("title").filter(|t| !t.is_empty()).map(str::to_string),
        caption: caption.unwrap_or_default(),
        width: clamp_percent(width),
    }
}

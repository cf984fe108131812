//! Link URL normalization and the link editing flow.

use gpui_content_core::{Editor, Node, Point, Selection, active_marks};
use serde_json::json;

use crate::error::{EditorError, InputError};

const KEPT_SCHEMES: [&str; 4] = ["http:", "https:", "mailto:", "tel:"];
const BLOCKED_SCHEMES: [&str; 3] = ["javascript:", "data:", "vbscript:"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// The input was cleared: remove the link.
    Unset,
    Url(String),
}

pub fn normalize_link(input: &str) -> Result<LinkTarget, InputError> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(LinkTarget::Unset);
    }
    if input.chars().any(char::is_whitespace) {
        return Err(InputError::InvalidLinkUrl);
    }

    let lower = input.to_ascii_lowercase();
    if BLOCKED_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
        return Err(InputError::InvalidLinkUrl);
    }
    if KEPT_SCHEMES.iter().any(|scheme| lower.starts_with(scheme)) {
        return Ok(LinkTarget::Url(input.to_string()));
    }
    if input.starts_with('#') || (input.starts_with('/') && !input.starts_with("//")) {
        return Ok(LinkTarget::Url(input.to_string()));
    }
    if let Some(rest) = input.strip_prefix("//") {
        return looks_like_host(rest)
            .then(|| LinkTarget::Url(format!("https://{rest}")))
            .ok_or(InputError::InvalidLinkUrl);
    }
    if has_scheme(&lower) {
        return Err(InputError::InvalidLinkUrl);
    }
    if lower.starts_with("www.") || looks_like_host(input) {
        return Ok(LinkTarget::Url(format!("https://{input}")));
    }
    Err(InputError::InvalidLinkUrl)
}

/// `scheme:` per RFC 3986, but not `host:port`.
fn has_scheme(lower: &str) -> bool {
    let Some((scheme, rest)) = lower.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    let is_port = rest
        .split(['/', '?', '#'])
        .next()
        .is_some_and(|port| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()));
    valid && !is_port
}

fn looks_like_host(input: &str) -> bool {
    let host = input
        .split(['/', '?', '#'])
        .next()
        .unwrap_or_default();
    let host = host.rsplit_once('@').map_or(host, |(_, h)| h);
    let host = host.split_once(':').map_or(host, |(h, _)| h);
    if host.eq_ignore_ascii_case("localhost") {
        return true;
    }
    let labels: Vec<&str> = host.split('.').collect();
    labels.len() >= 2
        && labels.iter().all(|label| {
            !label.is_empty() && label.chars().all(|c| c.is_alphanumeric() || c == '-')
        })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    Unset,
    Applied(String),
    Inserted { url: String, text: String },
}

/// What the link prompt needs to know about the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEdit {
    pub current: Option<String>,
    /// The selection is empty and not inside a link, so link text must be asked for.
    pub needs_text: bool,
}

impl LinkEdit {
    pub fn begin(editor: &Editor) -> Self {
        let current = active_marks(editor).link;
        let needs_text = editor.selection().is_collapsed() && current.is_none();
        Self { current, needs_text }
    }

    /// Applies the prompt answers. `text` is only read when [`Self::needs_text`].
    pub fn commit(
        &self,
        editor: &mut Editor,
        url_input: &str,
        text: Option<&str>,
    ) -> Result<LinkOutcome, EditorError> {
        let target = normalize_link(url_input)?;

        if editor.selection().is_collapsed() {
            if let Some(range) = link_range_at_caret(editor) {
                editor.set_selection(range);
            }
        }

        match target {
            LinkTarget::Unset => {
                editor.run_command("marks.unset_link", None)?;
                Ok(LinkOutcome::Unset)
            }
            LinkTarget::Url(url) if self.needs_text && editor.selection().is_collapsed() => {
                let text = text
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .ok_or(InputError::EmptyLinkText)?
                    .to_string();
                editor.run_command(
                    "marks.insert_link",
                    Some(json!({ "url": url, "text": text })),
                )?;
                Ok(LinkOutcome::Inserted { url, text })
            }
            LinkTarget::Url(url) => {
                editor.run_command("marks.set_link", Some(json!({ "url": url })))?;
                Ok(LinkOutcome::Applied(url))
            }
        }
    }
}

/// The whole run of linked text around a collapsed caret.
pub fn link_range_at_caret(editor: &Editor) -> Option<Selection> {
    let focus = &editor.selection().focus;
    let (&leaf_ix, block) = focus.path.split_last()?;
    let Node::Element(el) = editor.doc().node(block)? else {
        return None;
    };
    let link_of = |ix: usize| match el.children.get(ix) {
        Some(Node::Text(t)) => t.marks.link.as_deref(),
        _ => None,
    };
    let link = link_of(leaf_ix)?;

    let mut first = leaf_ix;
    while first > 0 && link_of(first - 1) == Some(link) {
        first -= 1;
    }
    let mut last = leaf_ix;
    while link_of(last + 1) == Some(link) {
        last += 1;
    }
    let end_len = match el.children.get(last) {
        Some(Node::Text(t)) => t.text.len(),
        _ => 0,
    };

    let mut start_path = block.to_vec();
    start_path.push(first);
    let mut end_path = block.to_vec();
    end_path.push(last);
    Some(Selection {
        anchor: Point::new(start_path, 0),
        focus: Point::new(end_path, end_len),
    })
}

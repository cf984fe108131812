use std::ops::Range;

use gpui::*;
use gpui_component::ActiveTheme as _;
use gpui_content_core::{Marks, Node, Path, ordered_selection_points};
use gpui_content_editor::AnchorBounds;

use crate::editor_view::{ContentEditorView, LineLayout};

/// Block text with each inline void as one space, so byte offsets in the
/// rendered string equal the document's global offsets.
pub(crate) fn display_text(children: &[Node]) -> String {
    let mut out = String::new();
    for node in children {
        match node {
            Node::Text(t) => out.push_str(&t.text),
            Node::Void(_) => out.push(' '),
            Node::Element(_) => {}
        }
    }
    out
}

pub(crate) fn parse_color(hex: &str) -> Option<Hsla> {
    Rgba::try_from(hex).ok().map(Hsla::from)
}

fn styled_for_marks(base: &TextStyle, marks: &Marks, cx: &App) -> TextStyle {
    let theme = cx.theme();
    let mut style = base.clone();
    if marks.bold {
        style.font_weight = FontWeight::BOLD;
    }
    if marks.italic {
        style.font_style = FontStyle::Italic;
    }
    if marks.code {
        style.font_family = theme.mono_font_family.clone();
        style.background_color = Some(theme.muted);
    }
    if let Some(color) = marks.text_color.as_deref().and_then(parse_color) {
        style.color = color;
    }
    if let Some(color) = marks.highlight_color.as_deref().and_then(parse_color) {
        style.background_color = Some(color);
    }
    if marks.link.is_some() {
        style.color = theme.blue;
    }
    if marks.underline || marks.link.is_some() {
        style.underline = Some(UnderlineStyle {
            thickness: px(1.),
            color: Some(style.color),
            wavy: false,
        });
    }
    if marks.strikethrough {
        style.strikethrough = Some(StrikethroughStyle {
            thickness: px(1.),
            color: Some(style.color),
        });
    }
    if marks.subscript || marks.superscript {
        style.color = style.color.opacity(0.8);
    }
    style
}

/// Splits `segments` at the edges of `marked` and underlines the inside.
fn underline_marked(segments: Vec<(usize, TextStyle)>, marked: Range<usize>) -> Vec<TextRun> {
    let mut runs = Vec::new();
    let mut start = 0;
    for (len, style) in segments {
        let end = start + len;
        let cuts = [start, marked.start.clamp(start, end), marked.end.clamp(start, end), end];
        for pair in cuts.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if a >= b {
                continue;
            }
            let mut piece = style.clone();
            if a >= marked.start && b <= marked.end {
                piece.underline = Some(UnderlineStyle {
                    thickness: px(1.),
                    color: Some(piece.color),
                    wavy: false,
                });
            }
            runs.push(piece.to_run(b - a));
        }
        start = end;
    }
    runs
}

/// One text block, laid out as a single wrapped `StyledText`.
pub(crate) struct BlockLine {
    view: Entity<ContentEditorView>,
    path: Path,
    styled_text: StyledText,
    len: usize,
}

impl BlockLine {
    pub(crate) fn new(view: Entity<ContentEditorView>, path: Path) -> Self {
        Self {
            view,
            path,
            styled_text: StyledText::new(SharedString::default()),
            len: 0,
        }
    }
}

impl IntoElement for BlockLine {
    type Element = Self;

    fn into_element(self) -> Self::Element {
        self
    }
}

impl Element for BlockLine {
    type RequestLayoutState = ();
    type PrepaintState = Hitbox;

    fn id(&self) -> Option<ElementId> {
        None
    }

    fn source_location(&self) -> Option<&'static std::panic::Location<'static>> {
        None
    }

    fn request_layout(
        &mut self,
        global_element_id: Option<&GlobalElementId>,
        inspector_id: Option<&InspectorElementId>,
        window: &mut Window,
        cx: &mut App,
    ) -> (LayoutId, Self::RequestLayoutState) {
        let base = window.text_style();
        let (text, segments, marked, placeholder) = {
            let view = self.view.read(cx);
            let editor = view.content().editor();
            let Some(Node::Element(el)) = editor.doc().node(&self.path) else {
                return (window.request_layout(Style::default(), [], cx), ());
            };

            let text = display_text(&el.children);
            let segments: Vec<(usize, TextStyle)> = el
                .children
                .iter()
                .filter_map(|node| match node {
                    Node::Text(t) if !t.text.is_empty() => {
                        Some((t.text.len(), styled_for_marks(&base, &t.marks, cx)))
                    }
                    Node::Void(_) => Some((1, base.clone())),
                    _ => None,
                })
                .collect();
            let active = view.focus_block().as_deref() == Some(self.path.as_slice());
            let marked = active.then(|| view.ime_marked.clone()).flatten();
            let placeholder = (active && text.is_empty() && el.kind == "paragraph")
                .then(|| SharedString::from(view.content().options().placeholder.clone()));
            (text, segments, marked, placeholder)
        };

        self.len = text.len();
        self.styled_text = if text.is_empty() {
            match placeholder {
                Some(placeholder) => {
                    let mut style = base.clone();
                    style.color = cx.theme().muted_foreground;
                    let run = style.to_run(placeholder.len());
                    StyledText::new(placeholder).with_runs(vec![run])
                }
                None => StyledText::new(" ").with_runs(vec![base.to_run(1)]),
            }
        } else {
            let runs = match marked.filter(|r| r.start < r.end && r.end <= text.len()) {
                Some(marked) => underline_marked(segments, marked),
                None => segments
                    .into_iter()
                    .map(|(len, style)| style.to_run(len))
                    .collect(),
            };
            StyledText::new(text).with_runs(runs)
        };

        let (layout_id, _) = self
            .styled_text
            .request_layout(global_element_id, inspector_id, window, cx);
        (layout_id, ())
    }

    fn prepaint(
        &mut self,
        id: Option<&GlobalElementId>,
        inspector_id: Option<&InspectorElementId>,
        bounds: Bounds<Pixels>,
        _: &mut Self::RequestLayoutState,
        window: &mut Window,
        cx: &mut App,
    ) -> Self::PrepaintState {
        self.styled_text
            .prepaint(id, inspector_id, bounds, &mut (), window, cx);

        let layout = self.styled_text.layout().clone();
        let path = self.path.clone();
        let len = self.len;
        self.view.update(cx, |view, cx| {
            let line_height = layout.line_height();
            let slash_anchor = view
                .slash_trigger_block()
                .filter(|block| *block == path)
                .and_then(|_| view.focus_offset())
                .and_then(|offset| layout.position_for_index(offset.min(len)))
                .map(|pos| AnchorBounds {
                    x: f32::from(pos.x),
                    y: f32::from(pos.y),
                    width: 1.,
                    height: f32::from(line_height),
                });
            if let Some(anchor) = slash_anchor {
                view.place_slash_popup(anchor, cx);
            }

            if let Some(start) = view.selection_start_in(&path) {
                let origin = layout
                    .position_for_index(start.min(len))
                    .or(Some(bounds.origin));
                if view.text_bubble_origin != origin {
                    view.text_bubble_origin = origin;
                    cx.notify();
                }
            }

            view.lines.insert(
                path.clone(),
                LineLayout {
                    bounds,
                    layout: layout.clone(),
                    len,
                },
            );
        });

        window.insert_hitbox(bounds, HitboxBehavior::Normal)
    }

    fn paint(
        &mut self,
        global_id: Option<&GlobalElementId>,
        _: Option<&InspectorElementId>,
        bounds: Bounds<Pixels>,
        _: &mut Self::RequestLayoutState,
        hitbox: &mut Self::PrepaintState,
        window: &mut Window,
        cx: &mut App,
    ) {
        window.set_cursor_style(CursorStyle::IBeam, hitbox);

        let (selection, focused) = {
            let view = self.view.read(cx);
            (
                view.content().editor().selection().clone(),
                view.focus_handle.is_focused(window),
            )
        };
        let layout = self.styled_text.layout().clone();
        let line_height = layout.line_height();
        let selection_color = cx.theme().selection;
        let caret_color = window.text_style().color;

        let (start, end) = ordered_selection_points(&selection);
        let start_block = start.path.split_last().map(|(_, block)| block);
        let end_block = end.path.split_last().map(|(_, block)| block);
        let path = self.path.as_slice();

        if !selection.is_collapsed() {
            let from = match start_block {
                Some(block) if block == path => self.view.read(cx).global_offset(&start),
                Some(block) if block < path => Some(0),
                _ => None,
            };
            let to = match end_block {
                Some(block) if block == path => self.view.read(cx).global_offset(&end),
                Some(block) if block > path => Some(self.len),
                _ => None,
            };
            if let (Some(from), Some(to)) = (from, to)
                && from < to
            {
                let position = |ix: usize| {
                    layout
                        .position_for_index(ix.min(self.len))
                        .or_else(|| layout.position_for_index(layout.len()))
                };
                if let (Some(a), Some(b)) = (position(from), position(to)) {
                    for quad_bounds in selection_quads(bounds, a, b, line_height) {
                        window.paint_quad(fill(quad_bounds, selection_color));
                    }
                }
            }
        }

        self.styled_text
            .paint(global_id, None, bounds, &mut (), &mut (), window, cx);

        if selection.is_collapsed() && focused && end_block == Some(path) {
            let offset = self.view.read(cx).global_offset(&selection.focus);
            if let Some(pos) = offset.and_then(|offset| {
                layout
                    .position_for_index(offset.min(self.len))
                    .or_else(|| layout.position_for_index(layout.len()))
            }) {
                window.paint_quad(fill(
                    Bounds::from_corners(pos, point(pos.x + px(1.5), pos.y + line_height)),
                    caret_color,
                ));
            }
        }
    }
}

/// Highlight rectangles between two caret positions, one per wrapped line band.
fn selection_quads(
    bounds: Bounds<Pixels>,
    a: gpui::Point<Pixels>,
    b: gpui::Point<Pixels>,
    line_height: Pixels,
) -> Vec<Bounds<Pixels>> {
    if a.y == b.y {
        return vec![Bounds::from_corners(a, point(b.x, b.y + line_height))];
    }
    let mut quads = vec![Bounds::from_corners(
        a,
        point(bounds.right(), a.y + line_height),
    )];
    if b.y > a.y + line_height {
        quads.push(Bounds::from_corners(
            point(bounds.left(), a.y + line_height),
            point(bounds.right(), b.y),
        ));
    }
    quads.push(Bounds::from_corners(
        point(bounds.left(), b.y),
        point(b.x, b.y + line_height),
    ));
    quads
}

/// Transparent layer over the document that owns IME input and pointer selection.
pub(crate) struct InputLayer {
    view: Entity<ContentEditorView>,
}

impl InputLayer {
    pub(crate) fn new(view: Entity<ContentEditorView>) -> Self {
        Self { view }
    }
}

impl IntoElement for InputLayer {
    type Element = Self;

    fn into_element(self) -> Self::Element {
        self
    }
}

impl Element for InputLayer {
    type RequestLayoutState = ();
    type PrepaintState = Hitbox;

    fn id(&self) -> Option<ElementId> {
        None
    }

    fn source_location(&self) -> Option<&'static std::panic::Location<'static>> {
        None
    }

    fn request_layout(
        &mut self,
        _global_id: Option<&GlobalElementId>,
        _inspector_id: Option<&InspectorElementId>,
        window: &mut Window,
        cx: &mut App,
    ) -> (LayoutId, Self::RequestLayoutState) {
        let mut style = Style::default();
        style.size.width = relative(1.).into();
        style.size.height = relative(1.).into();
        (window.request_layout(style, [], cx), ())
    }

    fn prepaint(
        &mut self,
        _id: Option<&GlobalElementId>,
        _inspector_id: Option<&InspectorElementId>,
        bounds: Bounds<Pixels>,
        _state: &mut Self::RequestLayoutState,
        window: &mut Window,
        cx: &mut App,
    ) -> Self::PrepaintState {
        // External drags must reach the editor's drop target underneath.
        let behavior = if cx.has_active_drag() {
            HitboxBehavior::Normal
        } else {
            HitboxBehavior::BlockMouseExceptScroll
        };
        window.insert_hitbox(bounds, behavior)
    }

    fn paint(
        &mut self,
        _global_id: Option<&GlobalElementId>,
        _inspector_id: Option<&InspectorElementId>,
        bounds: Bounds<Pixels>,
        _request: &mut Self::RequestLayoutState,
        hitbox: &mut Self::PrepaintState,
        window: &mut Window,
        cx: &mut App,
    ) {
        let focus_handle = self.view.read(cx).focus_handle.clone();
        window.handle_input(
            &focus_handle,
            ElementInputHandler::new(bounds, self.view.clone()),
            cx,
        );
        window.set_cursor_style(CursorStyle::IBeam, hitbox);

        window.on_mouse_event({
            let view = self.view.clone();
            let hitbox = hitbox.clone();
            move |event: &MouseDownEvent, phase, window, cx| {
                if !phase.bubble() || event.button != MouseButton::Left {
                    return;
                }
                if !hitbox.is_hovered(window) {
                    return;
                }
                let focus_handle = view.read(cx).focus_handle.clone();
                window.focus(&focus_handle);
                view.update(cx, |view, cx| {
                    view.pointer_down(event.position, event.modifiers.shift, window, cx);
                });
            }
        });

        window.on_mouse_event({
            let view = self.view.clone();
            move |event: &MouseMoveEvent, _phase, _window, cx| {
                if event.pressed_button != Some(MouseButton::Left) {
                    return;
                }
                view.update(cx, |view, cx| view.pointer_drag(event.position, cx));
            }
        });

        window.on_mouse_event({
            let view = self.view.clone();
            move |event: &MouseUpEvent, _phase, _window, cx| {
                if event.button != MouseButton::Left {
                    return;
                }
                view.update(cx, |view, cx| view.pointer_up(cx));
            }
        });
    }
}

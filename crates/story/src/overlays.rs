//! The bubble menus and the slash popup.

use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::popover::Popover;
use gpui_component::slider::{Slider, SliderState};
use gpui_component::{ActiveTheme as _, Disableable as _, Selectable as _};
use gpui_content_components::slash_menu::SlashMenu;
use gpui_content_components::toolbar::{
    SwatchButton, ToolbarButton, ToolbarIcon, ToolbarSeparator, ToolbarStepper,
};
use gpui_content_core::{BlockAlign, ListType};
use gpui_content_editor::{
    BlockStyle, CommandItem, HIGHLIGHT_COLORS, ImageToolbarState, SlashSession, Swatch,
    TEXT_COLORS, TextToolbarState, ToolbarAction,
};

use crate::editor_view::ContentEditorView;
use crate::line_element::parse_color;

const WIDTH_STEP: i32 = 5;

fn run(
    view: &Entity<ContentEditorView>,
    action: ToolbarAction,
) -> impl Fn(&ClickEvent, &mut Window, &mut App) + 'static {
    let view = view.clone();
    move |_, window, cx| {
        view.update(cx, |view, cx| view.apply_toolbar(&action, window, cx));
    }
}

fn bar(cx: &App) -> Div {
    let theme = cx.theme();
    div()
        .flex()
        .items_center()
        .gap(px(2.))
        .p(px(4.))
        .bg(theme.popover)
        .border_1()
        .border_color(theme.border)
        .rounded(theme.radius)
        .shadow_md()
}

fn panel(cx: &App) -> Div {
    let theme = cx.theme();
    div()
        .p(px(4.))
        .bg(theme.popover)
        .border_1()
        .border_color(theme.border)
        .rounded(theme.radius)
        .shadow_md()
}

struct MenuEntry {
    id: &'static str,
    icon: ToolbarIcon,
    label: &'static str,
    action: ToolbarAction,
}

fn entry(id: &'static str, icon: ToolbarIcon, label: &'static str, action: ToolbarAction) -> MenuEntry {
    MenuEntry {
        id,
        icon,
        label,
        action,
    }
}

/// A dropdown of labelled actions that closes after one is picked.
fn menu_popover(
    id: &'static str,
    trigger: ToolbarButton,
    view: &Entity<ContentEditorView>,
    state: &TextToolbarState,
    entries: Vec<MenuEntry>,
) -> Popover {
    let view = view.clone();
    let state = state.clone();
    Popover::new(id)
        .appearance(false)
        .trigger(trigger.dropdown().on_click(|_, _, _| {}))
        .content(move |_, _window, cx| {
            let theme = cx.theme().clone();
            let popover = cx.entity();
            let rows = entries.iter().map(|entry| {
                let enabled = entry.action.is_enabled(&state);
                let active = entry.action.is_active(&state);
                let view = view.clone();
                let popover = popover.clone();
                let action = entry.action.clone();

                div()
                    .id(entry.id)
                    .flex()
                    .items_center()
                    .gap(px(8.))
                    .h(px(30.))
                    .px(px(8.))
                    .rounded(px(4.))
                    .text_sm()
                    .text_color(theme.popover_foreground)
                    .when(active, |this| {
                        this.bg(theme.accent).text_color(theme.accent_foreground)
                    })
                    .when(!enabled, |this| this.opacity(0.5).cursor_not_allowed())
                    .when(enabled, |this| {
                        this.cursor_pointer()
                            .hover(|this| {
                                this.bg(theme.accent).text_color(theme.accent_foreground)
                            })
                            .on_mouse_down(MouseButton::Left, move |_, window, cx| {
                                window.prevent_default();
                                view.update(cx, |view, cx| view.apply_toolbar(&action, window, cx));
                                popover.update(cx, |state, cx| state.dismiss(window, cx));
                            })
                    })
                    .child(entry.icon)
                    .child(entry.label)
            });

            panel(cx)
                .min_w(px(180.))
                .flex()
                .flex_col()
                .gap(px(2.))
                .children(rows)
        })
}

/// A grid of color chips plus a reset chip.
fn swatch_popover(
    id: &'static str,
    trigger: ToolbarButton,
    view: &Entity<ContentEditorView>,
    palette: &'static [Swatch],
    active: Option<String>,
    set: fn(String) -> ToolbarAction,
    reset: ToolbarAction,
) -> Popover {
    let view = view.clone();
    Popover::new(id)
        .appearance(false)
        .trigger(trigger.dropdown().on_click(|_, _, _| {}))
        .content(move |_, _window, cx| {
            let popover = cx.entity();
            let chip = |ix: usize, color: Option<Hsla>, label: &'static str, action: ToolbarAction, selected: bool| {
                let view = view.clone();
                let popover = popover.clone();
                SwatchButton::new((id, ix), color, label)
                    .selected(selected)
                    .on_click(move |_, window, cx| {
                        view.update(cx, |view, cx| view.apply_toolbar(&action, window, cx));
                        popover.update(cx, |state, cx| state.dismiss(window, cx));
                    })
            };

            let chips = palette.iter().enumerate().map(|(ix, swatch)| {
                chip(
                    ix + 1,
                    parse_color(swatch.value),
                    swatch.name,
                    set(swatch.value.to_string()),
                    active.as_deref() == Some(swatch.value),
                )
            });

            panel(cx).w(px(176.)).child(
                div()
                    .flex()
                    .flex_wrap()
                    .gap(px(4.))
                    .child(chip(0, None, "Reset", reset.clone(), active.is_none()))
                    .children(chips),
            )
        })
}

fn button(
    id: &'static str,
    icon: ToolbarIcon,
    tooltip: &'static str,
    action: ToolbarAction,
    view: &Entity<ContentEditorView>,
    state: &TextToolbarState,
) -> ToolbarButton {
    ToolbarButton::icon(id, icon)
        .tooltip(tooltip)
        .selected(action.is_active(state))
        .disabled(!action.is_enabled(state))
        .on_click(run(view, action))
}

/// Floating formatting bar for a non-empty text selection.
#[derive(IntoElement)]
pub(crate) struct TextBubble {
    view: Entity<ContentEditorView>,
    state: TextToolbarState,
}

pub(crate) fn text_toolbar(view: &Entity<ContentEditorView>, state: &TextToolbarState) -> TextBubble {
    TextBubble {
        view: view.clone(),
        state: state.clone(),
    }
}

impl RenderOnce for TextBubble {
    fn render(self, _: &mut Window, cx: &mut App) -> impl IntoElement {
        let view = &self.view;
        let state = &self.state;

        let block_icon = match state.block {
            BlockStyle::Heading(1) => ToolbarIcon::Heading1,
            BlockStyle::Heading(2) => ToolbarIcon::Heading2,
            BlockStyle::Heading(_) => ToolbarIcon::Heading3,
            BlockStyle::CodeBlock => ToolbarIcon::CodeBlock,
            _ => ToolbarIcon::Paragraph,
        };
        let align_icon = match state.align {
            BlockAlign::Left => ToolbarIcon::AlignLeft,
            BlockAlign::Center => ToolbarIcon::AlignCenter,
            BlockAlign::Right => ToolbarIcon::AlignRight,
            BlockAlign::Justify => ToolbarIcon::AlignJustify,
        };
        let list_icon = match state.list_type {
            Some(ListType::Ordered) => ToolbarIcon::ListOrdered,
            Some(ListType::Task) => ToolbarIcon::ListTodo,
            _ => ToolbarIcon::List,
        };
        let text_color = state.text_color.as_deref().and_then(parse_color);
        let highlight = state.highlight_color.as_deref().and_then(parse_color);

        bar(cx)
            .id("content-text-bubble")
            .on_mouse_down(MouseButton::Left, |_, window, cx| {
                window.prevent_default();
                cx.stop_propagation();
            })
            .child(menu_popover(
                "bubble-block-type",
                ToolbarButton::icon("bubble-block-type-trigger", block_icon).tooltip("Turn into"),
                view,
                state,
                vec![
                    entry("block-paragraph", ToolbarIcon::Paragraph, "Text", ToolbarAction::Paragraph),
                    entry("block-h1", ToolbarIcon::Heading1, "Heading 1", ToolbarAction::Heading(1)),
                    entry("block-h2", ToolbarIcon::Heading2, "Heading 2", ToolbarAction::Heading(2)),
                    entry("block-h3", ToolbarIcon::Heading3, "Heading 3", ToolbarAction::Heading(3)),
                    entry("block-quote", ToolbarIcon::Quote, "Quote", ToolbarAction::Blockquote),
                    entry("block-code", ToolbarIcon::CodeBlock, "Code block", ToolbarAction::CodeBlock),
                ],
            ))
            .child(ToolbarSeparator)
            .child(button("bubble-bold", ToolbarIcon::Bold, "Bold", ToolbarAction::Bold, view, state))
            .child(button("bubble-italic", ToolbarIcon::Italic, "Italic", ToolbarAction::Italic, view, state))
            .child(button(
                "bubble-underline",
                ToolbarIcon::Underline,
                "Underline",
                ToolbarAction::Underline,
                view,
                state,
            ))
            .child(button(
                "bubble-strikethrough",
                ToolbarIcon::Strikethrough,
                "Strikethrough",
                ToolbarAction::Strikethrough,
                view,
                state,
            ))
            .child(button("bubble-code", ToolbarIcon::Code, "Inline code", ToolbarAction::InlineCode, view, state))
            .child(
                ToolbarButton::new("bubble-subscript")
                    .tooltip("Subscript")
                    .selected(ToolbarAction::Subscript.is_active(state))
                    .on_click(run(view, ToolbarAction::Subscript))
                    .child(div().text_xs().child("x₂")),
            )
            .child(
                ToolbarButton::new("bubble-superscript")
                    .tooltip("Superscript")
                    .selected(ToolbarAction::Superscript.is_active(state))
                    .on_click(run(view, ToolbarAction::Superscript))
                    .child(div().text_xs().child("x²")),
            )
            .child(ToolbarSeparator)
            .child(swatch_popover(
                "bubble-text-color",
                ToolbarButton::icon("bubble-text-color-trigger", ToolbarIcon::Baseline)
                    .tooltip("Text color")
                    .when_some(text_color, |this, color| this.text_color(color)),
                view,
                &TEXT_COLORS,
                state.text_color.clone(),
                ToolbarAction::TextColor,
                ToolbarAction::ResetTextColor,
            ))
            .child(swatch_popover(
                "bubble-highlight",
                ToolbarButton::icon("bubble-highlight-trigger", ToolbarIcon::Highlighter)
                    .tooltip("Highlight")
                    .when_some(highlight, |this, color| this.text_color(color)),
                view,
                &HIGHLIGHT_COLORS,
                state.highlight_color.clone(),
                ToolbarAction::Highlight,
                ToolbarAction::ResetHighlight,
            ))
            .child(button(
                "bubble-link",
                if state.link.is_some() {
                    ToolbarIcon::LinkUrl
                } else {
                    ToolbarIcon::Link
                },
                "Link",
                ToolbarAction::Link,
                view,
                state,
            ))
            .child(ToolbarSeparator)
            .child(menu_popover(
                "bubble-align",
                ToolbarButton::icon("bubble-align-trigger", align_icon).tooltip("Align"),
                view,
                state,
                vec![
                    entry("align-left", ToolbarIcon::AlignLeft, "Left", ToolbarAction::Align(BlockAlign::Left)),
                    entry(
                        "align-center",
                        ToolbarIcon::AlignCenter,
                        "Center",
                        ToolbarAction::Align(BlockAlign::Center),
                    ),
                    entry("align-right", ToolbarIcon::AlignRight, "Right", ToolbarAction::Align(BlockAlign::Right)),
                    entry(
                        "align-justify",
                        ToolbarIcon::AlignJustify,
                        "Justify",
                        ToolbarAction::Align(BlockAlign::Justify),
                    ),
                ],
            ))
            .child(menu_popover(
                "bubble-list",
                ToolbarButton::icon("bubble-list-trigger", list_icon)
                    .tooltip("List")
                    .selected(state.list_type.is_some()),
                view,
                state,
                vec![
                    entry("list-bulleted", ToolbarIcon::List, "Bulleted list", ToolbarAction::List(ListType::Bulleted)),
                    entry(
                        "list-ordered",
                        ToolbarIcon::ListOrdered,
                        "Numbered list",
                        ToolbarAction::List(ListType::Ordered),
                    ),
                    entry("list-task", ToolbarIcon::ListTodo, "Task list", ToolbarAction::List(ListType::Task)),
                    entry("list-clear", ToolbarIcon::Paragraph, "Clear list", ToolbarAction::ClearList),
                ],
            ))
            .child(button(
                "bubble-outdent",
                ToolbarIcon::IndentDecrease,
                "Outdent",
                ToolbarAction::Outdent,
                view,
                state,
            ))
            .child(button(
                "bubble-indent",
                ToolbarIcon::IndentIncrease,
                "Indent",
                ToolbarAction::Indent,
                view,
                state,
            ))
            .child(ToolbarSeparator)
            .child(menu_popover(
                "bubble-insert",
                ToolbarButton::icon("bubble-insert-trigger", ToolbarIcon::Plus).tooltip("Insert"),
                view,
                state,
                vec![
                    entry("insert-divider", ToolbarIcon::Divider, "Divider", ToolbarAction::Divider),
                    entry("insert-upload", ToolbarIcon::FileUp, "Upload image", ToolbarAction::UploadImage),
                    entry("insert-url", ToolbarIcon::Image, "Image from URL", ToolbarAction::ImageFromUrl),
                ],
            ))
            .child(menu_popover(
                "bubble-table",
                ToolbarButton::icon("bubble-table-trigger", ToolbarIcon::Table)
                    .tooltip("Table")
                    .selected(state.table.in_table),
                view,
                state,
                vec![
                    entry("table-insert", ToolbarIcon::Table, "Insert table", ToolbarAction::InsertTable),
                    entry("table-row-above", ToolbarIcon::Plus, "Row above", ToolbarAction::TableRowAbove),
                    entry("table-row-below", ToolbarIcon::Plus, "Row below", ToolbarAction::TableRowBelow),
                    entry("table-col-left", ToolbarIcon::Plus, "Column left", ToolbarAction::TableColLeft),
                    entry("table-col-right", ToolbarIcon::Plus, "Column right", ToolbarAction::TableColRight),
                    entry("table-delete-row", ToolbarIcon::Minus, "Delete row", ToolbarAction::TableDeleteRow),
                    entry("table-delete-col", ToolbarIcon::Minus, "Delete column", ToolbarAction::TableDeleteCol),
                    entry(
                        "table-header",
                        ToolbarIcon::Bold,
                        "Header row",
                        ToolbarAction::TableToggleHeader,
                    ),
                    entry("table-delete", ToolbarIcon::Trash, "Delete table", ToolbarAction::TableDelete),
                ],
            ))
    }
}

/// Width, alt and caption controls for a selected image block.
#[derive(IntoElement)]
pub(crate) struct ImageBubble {
    view: Entity<ContentEditorView>,
    state: ImageToolbarState,
    width: u32,
    slider: Entity<SliderState>,
}

pub(crate) fn image_toolbar(
    view: &Entity<ContentEditorView>,
    state: &ImageToolbarState,
    width: u32,
    slider: &Entity<SliderState>,
) -> ImageBubble {
    ImageBubble {
        view: view.clone(),
        state: state.clone(),
        width,
        slider: slider.clone(),
    }
}

impl RenderOnce for ImageBubble {
    fn render(self, _: &mut Window, cx: &mut App) -> impl IntoElement {
        let view = &self.view;
        let step = |delta: i32| {
            let view = view.clone();
            move |_: &ClickEvent, window: &mut Window, cx: &mut App| {
                view.update(cx, |view, cx| view.step_image_width(delta, window, cx));
            }
        };
        let remove = {
            let view = view.clone();
            move |_: &ClickEvent, window: &mut Window, cx: &mut App| {
                view.update(cx, |view, cx| view.command("core.delete_backward", None, window, cx));
            }
        };

        bar(cx)
            .id("content-image-bubble")
            .on_mouse_down(MouseButton::Left, |_, _, cx| cx.stop_propagation())
            .child(
                div()
                    .w(px(120.))
                    .px(px(6.))
                    .child(Slider::new(&self.slider)),
            )
            .child(
                ToolbarStepper::new("image-width-step", format!("{}%", self.width))
                    .on_decrement(step(-WIDTH_STEP))
                    .on_increment(step(WIDTH_STEP)),
            )
            .child(ToolbarSeparator)
            .child(
                ToolbarButton::icon("image-alt", ToolbarIcon::AltText)
                    .tooltip("Alt text")
                    .selected(self.state.has_alt())
                    .on_click(run(view, ToolbarAction::EditAlt)),
            )
            .child(
                ToolbarButton::icon("image-caption", ToolbarIcon::Caption)
                    .tooltip("Caption")
                    .selected(self.state.has_caption())
                    .on_click(run(view, ToolbarAction::EditCaption)),
            )
            .child(ToolbarSeparator)
            .child(
                ToolbarButton::icon("image-remove", ToolbarIcon::Trash)
                    .tooltip("Remove image")
                    .on_click(remove),
            )
    }
}

pub(crate) fn slash_menu(
    view: &Entity<ContentEditorView>,
    session: &SlashSession,
    items: &[CommandItem],
) -> SlashMenu {
    let confirm = view.clone();
    let hover = view.clone();
    SlashMenu::new("content-slash-menu", session, items)
        .on_confirm(move |row, window, cx| {
            confirm.update(cx, |view, cx| view.confirm_slash_row(row, window, cx));
        })
        .on_hover(move |row, _, cx| {
            hover.update(cx, |view, cx| view.hover_slash_row(row, cx));
        })
}

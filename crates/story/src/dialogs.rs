//! Modal prompts for links, image URLs and image text.

use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::dialog::DialogButtonProps;
use gpui_component::input::{Input, InputState};
use gpui_component::{ActiveTheme as _, StyledExt as _, WindowExt as _};
use gpui_content_core::Point as DocPoint;
use gpui_content_editor::{ImageTextPrompt, LinkEdit};

use crate::editor_view::ContentEditorView;

fn field(label: &'static str, input: &Entity<InputState>, cx: &App) -> Div {
    div()
        .flex()
        .flex_col()
        .gap(px(4.))
        .child(
            div()
                .text_xs()
                .text_color(cx.theme().muted_foreground)
                .child(label),
        )
        .child(Input::new(input).w_full())
}

fn text_input(
    placeholder: &'static str,
    value: impl Into<SharedString>,
    window: &mut Window,
    cx: &mut Context<ContentEditorView>,
) -> Entity<InputState> {
    let value = value.into();
    cx.new(|cx| {
        InputState::new(window, cx)
            .placeholder(placeholder)
            .default_value(value)
    })
}

fn refocus(view: &Entity<ContentEditorView>, window: &mut Window, cx: &mut App) {
    view.read(cx).focus(window);
}

/// Asks for a link URL, and for link text when nothing is selected.
pub fn prompt_link(
    view: Entity<ContentEditorView>,
    edit: LinkEdit,
    window: &mut Window,
    cx: &mut Context<ContentEditorView>,
) {
    let url = text_input(
        "https://example.com",
        edit.current.clone().unwrap_or_default(),
        window,
        cx,
    );
    let text = edit
        .needs_text
        .then(|| text_input("Link text", "", window, cx));
    let title = if edit.current.is_some() {
        "Edit link"
    } else {
        "Insert link"
    };
    window.focus(&url.focus_handle(cx));

    window.open_dialog(cx, move |dialog, _window, cx| {
        let body = div()
            .flex()
            .flex_col()
            .gap(px(10.))
            .p(px(12.))
            .child(field("URL", &url, cx))
            .when_some(text.as_ref(), |this, text| this.child(field("Text", text, cx)))
            .when(edit.current.is_some(), |this| {
                this.child(
                    div()
                        .text_xs()
                        .text_color(cx.theme().muted_foreground)
                        .child("Clear the URL to remove the link."),
                )
            });

        dialog
            .confirm()
            .title(div().text_sm().font_semibold().child(title))
            .button_props(
                DialogButtonProps::default()
                    .ok_text("Apply")
                    .cancel_text("Cancel"),
            )
            .child(body)
            .on_ok({
                let view = view.clone();
                let url = url.clone();
                let text = text.clone();
                let edit = edit.clone();
                move |_, window, cx| {
                    let url = url.read(cx).value().to_string();
                    let text = text.as_ref().map(|text| text.read(cx).value().to_string());
                    view.update(cx, |view, cx| {
                        view.commit_link(&edit, &url, text.as_deref(), window, cx)
                    })
                }
            })
            .on_cancel({
                let view = view.clone();
                move |_, window, cx| {
                    refocus(&view, window, cx);
                    true
                }
            })
    });
}

/// Asks for an image URL and inserts the image at `position`.
pub fn prompt_image_url(
    view: Entity<ContentEditorView>,
    position: Option<DocPoint>,
    window: &mut Window,
    cx: &mut Context<ContentEditorView>,
) {
    let url = text_input("https://example.com/image.png", "", window, cx);
    window.focus(&url.focus_handle(cx));

    window.open_dialog(cx, move |dialog, _window, cx| {
        dialog
            .confirm()
            .title(div().text_sm().font_semibold().child("Insert image from URL"))
            .button_props(
                DialogButtonProps::default()
                    .ok_text("Insert")
                    .cancel_text("Cancel"),
            )
            .child(
                div()
                    .p(px(12.))
                    .child(field("Image URL", &url, cx)),
            )
            .on_ok({
                let view = view.clone();
                let url = url.clone();
                let position = position.clone();
                move |_, window, cx| {
                    let input = url.read(cx).value().to_string();
                    view.update(cx, |view, cx| {
                        view.submit_image_url(&input, position.clone(), window, cx)
                    })
                }
            })
            .on_cancel({
                let view = view.clone();
                move |_, window, cx| {
                    refocus(&view, window, cx);
                    true
                }
            })
    });
}

/// Asks for the alt text or caption of one image block.
pub fn prompt_image_text(
    view: Entity<ContentEditorView>,
    prompt: ImageTextPrompt,
    window: &mut Window,
    cx: &mut Context<ContentEditorView>,
) {
    let label = prompt.field.label();
    let input = text_input(label, prompt.initial.clone(), window, cx);
    window.focus(&input.focus_handle(cx));

    window.open_dialog(cx, move |dialog, _window, cx| {
        dialog
            .confirm()
            .title(div().text_sm().font_semibold().child(label))
            .button_props(
                DialogButtonProps::default()
                    .ok_text("Save")
                    .cancel_text("Cancel"),
            )
            .child(div().p(px(12.)).child(field(label, &input, cx)))
            .on_ok({
                let view = view.clone();
                let input = input.clone();
                let prompt = prompt.clone();
                move |_, window, cx| {
                    let answer = input.read(cx).value().to_string();
                    view.update(cx, |view, cx| {
                        view.submit_image_text(&prompt, &answer, window, cx)
                    })
                }
            })
            .on_cancel({
                let view = view.clone();
                move |_, window, cx| {
                    refocus(&view, window, cx);
                    true
                }
            })
    });
}

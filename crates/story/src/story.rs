use std::path::PathBuf;

use gpui::prelude::FluentBuilder as _;
use gpui::*;
use gpui_component::button::{Button, ButtonVariants as _};
use gpui_component::menu::AppMenuBar;
use gpui_component::notification::Notification;
use gpui_component::{
    ActiveTheme as _, Disableable as _, Sizable as _, TitleBar, WindowExt as _,
};
use gpui_content_components::toolbar::{ToolbarButton, ToolbarIcon, ToolbarSeparator};
use gpui_content_editor::{ContentEditor, EditorOptions, InstanceId, ToolbarAction};

use crate::app_menus::{About, LoadSample, Open, Save, SaveAs};
use crate::editor_view::{ContentEditorEvent, ContentEditorView};

pub const SAMPLE_HTML: &str = concat!(
    "<h1>Content editor</h1>",
    "<p>Type <code>/</code> at the start of a line for the command menu. ",
    "Select text to <strong>format</strong> it, <em>color</em> it or ",
    r#"<a href="https://example.com">link</a> it.</p>"#,
    r#"<ul data-type="taskList">"#,
    r#"<li data-type="taskItem" data-checked="true"><p>Drop or paste an image</p></li>"#,
    r#"<li data-type="taskItem" data-checked="false"><p>Resize it from its toolbar</p></li>"#,
    "</ul>",
    "<blockquote><p>Everything you type is mirrored as HTML on the right.</p></blockquote>",
    "<hr>",
    "<p></p>",
);

/// An editor configured from the environment, seeded with [`SAMPLE_HTML`].
pub fn sample_editor() -> anyhow::Result<ContentEditor> {
    let options = EditorOptions::from_env()?;
    let mut content = ContentEditor::new(InstanceId::next(), options)?;
    content.set_content(SAMPLE_HTML);
    Ok(content)
}

pub struct ContentStory {
    app_menu_bar: Entity<AppMenuBar>,
    editor: Entity<ContentEditorView>,
    html: SharedString,
    file_path: Option<PathBuf>,
    _subscriptions: Vec<Subscription>,
}

impl ContentStory {
    pub fn new(
        app_menu_bar: Entity<AppMenuBar>,
        content: ContentEditor,
        window: &mut Window,
        cx: &mut Context<Self>,
    ) -> Self {
        let html: SharedString = content.html().to_string().into();
        let editor = cx.new(|cx| ContentEditorView::new(content, window, cx));
        let subscription = cx.subscribe(&editor, |this, _, event: &ContentEditorEvent, cx| {
            let ContentEditorEvent::Changed(html) = event;
            this.html = html.clone();
            cx.notify();
        });
        editor.read(cx).focus(window);

        Self {
            app_menu_bar,
            editor,
            html,
            file_path: None,
            _subscriptions: vec![subscription],
        }
    }

    pub fn view(
        app_menu_bar: Entity<AppMenuBar>,
        content: ContentEditor,
        window: &mut Window,
        cx: &mut App,
    ) -> Entity<Self> {
        cx.new(|cx| Self::new(app_menu_bar, content, window, cx))
    }

    fn load_html(&mut self, html: &str, window: &mut Window, cx: &mut Context<Self>) {
        let changed = self
            .editor
            .update(cx, |editor, cx| editor.set_content(html, cx));
        if changed {
            self.html = self.editor.read(cx).html().to_string().into();
        }
        self.editor.read(cx).focus(window);
        cx.notify();
    }

    fn open_from_file(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let picked = cx.prompt_for_paths(PathPromptOptions {
            files: true,
            directories: false,
            multiple: false,
            prompt: Some("Open HTML".into()),
        });

        cx.spawn_in(window, async move |this, window| {
            let path: PathBuf = picked.await.ok()?.ok()??.into_iter().next()?;
            let content = match std::fs::read_to_string(&path) {
                Ok(content) => content,
                Err(err) => {
                    let message = format!("Failed to open {}: {err}", path.display());
                    window
                        .update(|window, cx| {
                            window.push_notification(Notification::new().message(message), cx);
                        })
                        .ok();
                    return None;
                }
            };
            this.update_in(window, |this, window, cx| {
                this.file_path = Some(path);
                this.load_html(&content, window, cx);
            })
            .ok();
            Some(())
        })
        .detach();
    }

    fn save_as(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let html = self.html.to_string();
        let directory = self
            .file_path
            .as_ref()
            .and_then(|path| path.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
        let suggested_name = self
            .file_path
            .as_ref()
            .and_then(|p| p.file_name().map(|name| name.to_string_lossy().to_string()))
            .unwrap_or_else(|| "content.html".to_string());

        let picked = cx.prompt_for_new_path(&directory, Some(&suggested_name));
        cx.spawn_in(window, async move |this, window| {
            let path: PathBuf = picked.await.ok()?.ok()??;
            let saved = write_html(&path, &html, window);
            if saved {
                this.update(window, |this, _| this.file_path = Some(path)).ok();
            }
            Some(())
        })
        .detach();
    }

    fn save_to_file(&mut self, window: &mut Window, cx: &mut Context<Self>) {
        let Some(path) = self.file_path.clone() else {
            self.save_as(window, cx);
            return;
        };
        let html = self.html.to_string();
        cx.spawn_in(window, async move |_, window| {
            write_html(&path, &html, window);
        })
        .detach();
    }

    fn run(&mut self, action: ToolbarAction, window: &mut Window, cx: &mut Context<Self>) {
        self.editor.update(cx, |editor, cx| {
            editor.apply_toolbar(&action, window, cx);
            editor.focus(window);
        });
    }
}

fn write_html(path: &std::path::Path, html: &str, window: &mut AsyncWindowContext) -> bool {
    let (saved, message) = match std::fs::write(path, html) {
        Ok(()) => {
            tracing::info!(path = %path.display(), "saved content");
            (true, format!("Saved to {}", path.display()))
        }
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "failed to save content");
            (false, format!("Failed to save: {err}"))
        }
    };
    window
        .update(|window, cx| {
            window.push_notification(Notification::new().message(message), cx);
        })
        .ok();
    saved
}

impl Render for ContentStory {
    fn render(&mut self, _window: &mut Window, cx: &mut Context<Self>) -> impl IntoElement {
        let theme = cx.theme().clone();
        let editor = self.editor.read(cx).content().editor();
        let can_undo = editor.can_undo();
        let can_redo = editor.can_redo();

        div()
            .size_full()
            .flex()
            .flex_col()
            .bg(theme.muted)
            .on_action(cx.listener(|this, _: &Open, window, cx| this.open_from_file(window, cx)))
            .on_action(cx.listener(|this, _: &Save, window, cx| this.save_to_file(window, cx)))
            .on_action(cx.listener(|this, _: &SaveAs, window, cx| this.save_as(window, cx)))
            .on_action(cx.listener(|this, _: &LoadSample, window, cx| {
                this.load_html(SAMPLE_HTML, window, cx);
            }))
            .on_action(cx.listener(|_, _: &About, window, cx| {
                window.push_notification(
                    Notification::new().message(concat!(
                        "Content editor ",
                        env!("CARGO_PKG_VERSION")
                    )),
                    cx,
                );
            }))
            .child(
                TitleBar::new().child(div().flex().items_center().child(self.app_menu_bar.clone())),
            )
            .child(
                div()
                    .flex()
                    .flex_row()
                    .items_center()
                    .gap(px(6.))
                    .p(px(8.))
                    .bg(theme.background)
                    .border_b_1()
                    .border_color(theme.border)
                    .on_mouse_down(MouseButton::Left, |_, _, cx| cx.stop_propagation())
                    .child(
                        ToolbarButton::icon("undo", ToolbarIcon::Undo)
                            .disabled(!can_undo)
                            .tooltip("Undo")
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.editor.update(cx, |editor, cx| {
                                    editor.undo_redo(false, window, cx);
                                    editor.focus(window);
                                });
                            })),
                    )
                    .child(
                        ToolbarButton::icon("redo", ToolbarIcon::Redo)
                            .disabled(!can_redo)
                            .tooltip("Redo")
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.editor.update(cx, |editor, cx| {
                                    editor.undo_redo(true, window, cx);
                                    editor.focus(window);
                                });
                            })),
                    )
                    .child(ToolbarSeparator)
                    .child(
                        ToolbarButton::icon("insert-image", ToolbarIcon::FileUp)
                            .tooltip("Upload image")
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.run(ToolbarAction::UploadImage, window, cx);
                            })),
                    )
                    .child(
                        ToolbarButton::icon("insert-image-url", ToolbarIcon::Image)
                            .tooltip("Image from URL")
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.run(ToolbarAction::ImageFromUrl, window, cx);
                            })),
                    )
                    .child(
                        ToolbarButton::icon("insert-divider", ToolbarIcon::Divider)
                            .tooltip("Divider")
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.run(ToolbarAction::Divider, window, cx);
                            })),
                    )
                    .child(
                        ToolbarButton::icon("unlink", ToolbarIcon::Unlink)
                            .tooltip("Remove link")
                            .on_click(cx.listener(|this, _, window, cx| {
                                this.editor.update(cx, |editor, cx| {
                                    editor.command("marks.unset_link", None, window, cx);
                                    editor.focus(window);
                                });
                            })),
                    )
                    .child(ToolbarSeparator)
                    .child(
                        Button::new("open")
                            .label("Open")
                            .small()
                            .ghost()
                            .tooltip("Open HTML")
                            .on_click(cx.listener(|this, _, window, cx| this.open_from_file(window, cx))),
                    )
                    .child(
                        Button::new("save")
                            .label("Save")
                            .small()
                            .ghost()
                            .on_click(cx.listener(|this, _, window, cx| this.save_to_file(window, cx))),
                    )
                    .when_some(self.file_path.as_ref(), |this, path| {
                        this.child(
                            div()
                                .text_xs()
                                .text_color(theme.muted_foreground)
                                .child(path.display().to_string()),
                        )
                    }),
            )
            .child(
                div()
                    .flex_1()
                    .min_h(px(0.))
                    .flex()
                    .flex_row()
                    .gap(px(8.))
                    .p(px(8.))
                    .child(div().flex_1().min_w(px(0.)).child(self.editor.clone()))
                    .child(
                        div()
                            .id("html-preview")
                            .w(px(360.))
                            .flex_none()
                            .overflow_y_scroll()
                            .p(px(10.))
                            .bg(theme.background)
                            .border_1()
                            .border_color(theme.border)
                            .rounded(theme.radius)
                            .font_family(theme.mono_font_family.clone())
                            .text_xs()
                            .text_color(theme.muted_foreground)
                            .child(self.html.clone()),
                    ),
            )
    }
}

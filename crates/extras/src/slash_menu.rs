use std::rc::Rc;

use gpui::InteractiveElement as _;
use gpui::StatefulInteractiveElement as _;
use gpui::prelude::FluentBuilder as _;
use gpui::{
    App, ElementId, IntoElement, MouseButton, ParentElement, RenderOnce, SharedString, Styled,
    Window, div, px,
};
use gpui_component::{ActiveTheme as _, Icon, StyledExt as _};
use gpui_content_editor::{CommandItem, SlashSession};

use crate::toolbar::ToolbarIcon;

type RowHandler = Rc<dyn Fn(usize, &mut Window, &mut App)>;

#[derive(Clone)]
pub struct SlashMenuRow {
    pub title: SharedString,
    pub description: SharedString,
    pub icon: ToolbarIcon,
}

impl From<&CommandItem> for SlashMenuRow {
    fn from(item: &CommandItem) -> Self {
        Self {
            title: item.title.clone().into(),
            description: item.description.clone().into(),
            icon: item.icon.into(),
        }
    }
}

/// The popup list for an open slash session. Row indices passed to the
/// handlers are positions within the filtered session, not the item list.
#[derive(IntoElement)]
pub struct SlashMenu {
    id: ElementId,
    rows: Vec<SlashMenuRow>,
    selected: usize,
    on_confirm: Option<RowHandler>,
    on_hover: Option<RowHandler>,
}

impl SlashMenu {
    pub fn new(id: impl Into<ElementId>, session: &SlashSession, items: &[CommandItem]) -> Self {
        let rows = session
            .items
            .iter()
            .filter_map(|&ix| items.get(ix))
            .map(SlashMenuRow::from)
            .collect();
        Self {
            id: id.into(),
            rows,
            selected: session.selected_index,
            on_confirm: None,
            on_hover: None,
        }
    }

    pub fn on_confirm(mut self, handler: impl Fn(usize, &mut Window, &mut App) + 'static) -> Self {
        self.on_confirm = Some(Rc::new(handler));
        self
    }

    pub fn on_hover(mut self, handler: impl Fn(usize, &mut Window, &mut App) + 'static) -> Self {
        self.on_hover = Some(Rc::new(handler));
        self
    }
}

impl RenderOnce for SlashMenu {
    fn render(self, _: &mut Window, cx: &mut App) -> impl IntoElement {
        let theme = cx.theme();
        let base = div()
            .id(self.id.clone())
            .w(px(280.))
            .max_h(px(320.))
            .overflow_y_scroll()
            .p(px(4.))
            .rounded(px(8.))
            .border_1()
            .border_color(theme.border)
            .bg(theme.popover)
            .shadow_lg()
            .on_mouse_down(MouseButton::Left, |_, window, _| window.prevent_default());

        if self.rows.is_empty() {
            return base.child(
                div()
                    .px(px(8.))
                    .py(px(6.))
                    .text_size(px(13.))
                    .text_color(theme.muted_foreground)
                    .child("No results"),
            );
        }

        base.children(self.rows.into_iter().enumerate().map(|(ix, row)| {
            let selected = ix == self.selected;
            let on_confirm = self.on_confirm.clone();
            let on_hover = self.on_hover.clone();

            div()
                .id(ElementId::NamedInteger("slash-row".into(), ix as u64))
                .flex()
                .items_center()
                .gap(px(10.))
                .px(px(8.))
                .py(px(6.))
                .rounded(px(6.))
                .cursor_pointer()
                .when(selected, |this| this.bg(theme.accent))
                .when_some(on_hover, |this, on_hover| {
                    this.on_hover(move |hovered, window, cx| {
                        if *hovered {
                            on_hover(ix, window, cx);
                        }
                    })
                })
                .when_some(on_confirm, |this, on_confirm| {
                    this.on_click(move |_, window, cx| on_confirm(ix, window, cx))
                })
                .child(
                    div()
                        .flex()
                        .items_center()
                        .justify_center()
                        .size(px(32.))
                        .rounded(px(6.))
                        .border_1()
                        .border_color(theme.border)
                        .bg(theme.background)
                        .child(Icon::new(row.icon).size_4()),
                )
                .child(
                    div()
                        .flex()
                        .flex_col()
                        .min_w_0()
                        .child(
                            div()
                                .text_size(px(13.))
                                .font_semibold()
                                .text_color(theme.foreground)
                                .child(row.title),
                        )
                        .child(
                            div()
                                .text_size(px(12.))
                                .text_color(theme.muted_foreground)
                                .truncate()
                                .child(row.description),
                        ),
                )
        }))
    }
}

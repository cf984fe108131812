//! Buttons and controls for the editor's floating toolbars.
//!
//! Every control swallows its mouse-down so clicking the toolbar never moves
//! focus out of the editor it is acting on.

use std::rc::Rc;

use gpui::InteractiveElement as _;
use gpui::StatefulInteractiveElement as _;
use gpui::prelude::FluentBuilder as _;
use gpui::{
    AnyElement, App, ClickEvent, ElementId, Hsla, IntoElement, MouseButton, ParentElement, Pixels,
    RenderOnce, SharedString, StyleRefinement, Styled, Window, div, px,
};
use gpui_component::tooltip::Tooltip;
use gpui_component::{ActiveTheme as _, Disableable, Icon, IconNamed, Selectable, StyledExt as _};
use gpui_content_editor::CommandIcon;

type ClickHandler = Rc<dyn Fn(&ClickEvent, &mut Window, &mut App)>;

#[derive(IntoElement, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolbarIcon {
    AlignCenter,
    AlignJustify,
    AlignLeft,
    AlignRight,
    Baseline,
    Bold,
    ChevronDown,
    Code,
    CodeBlock,
    FileUp,
    Heading1,
    Heading2,
    Heading3,
    Highlighter,
    Image,
    IndentDecrease,
    IndentIncrease,
    Italic,
    Link,
    LinkUrl,
    List,
    ListOrdered,
    ListTodo,
    Caption,
    Minus,
    Paragraph,
    Plus,
    Quote,
    Redo,
    Divider,
    Strikethrough,
    Table,
    Trash,
    AltText,
    Underline,
    Undo,
    Unlink,
}

impl IconNamed for ToolbarIcon {
    fn path(self) -> SharedString {
        let name = match self {
            Self::AlignCenter => "align-center",
            Self::AlignJustify => "align-justify",
            Self::AlignLeft => "align-left",
            Self::AlignRight => "align-right",
            Self::Baseline => "baseline",
            Self::Bold => "bold",
            Self::ChevronDown => "chevron-down",
            Self::Code => "code",
            Self::CodeBlock => "code-xml",
            Self::FileUp => "file-up",
            Self::Heading1 => "heading-1",
            Self::Heading2 => "heading-2",
            Self::Heading3 => "heading-3",
            Self::Highlighter => "highlighter",
            Self::Image => "image",
            Self::IndentDecrease => "indent-decrease",
            Self::IndentIncrease => "indent-increase",
            Self::Italic => "italic",
            Self::Link => "link",
            Self::LinkUrl => "link-2",
            Self::List => "list",
            Self::ListOrdered => "list-ordered",
            Self::ListTodo => "list-todo",
            Self::Caption => "message-square-text",
            Self::Minus => "minus",
            Self::Paragraph => "pilcrow",
            Self::Plus => "plus",
            Self::Quote => "quote",
            Self::Redo => "redo-2",
            Self::Divider => "separator-horizontal",
            Self::Strikethrough => "strikethrough",
            Self::Table => "table",
            Self::Trash => "trash",
            Self::AltText => "type",
            Self::Underline => "underline",
            Self::Undo => "undo-2",
            Self::Unlink => "unlink",
        };
        format!("icons/{name}.svg").into()
    }
}

impl RenderOnce for ToolbarIcon {
    fn render(self, _: &mut Window, _: &mut App) -> impl IntoElement {
        Icon::new(self)
    }
}

impl From<CommandIcon> for ToolbarIcon {
    fn from(icon: CommandIcon) -> Self {
        match icon {
            CommandIcon::Text => Self::Paragraph,
            CommandIcon::Heading1 => Self::Heading1,
            CommandIcon::Heading2 => Self::Heading2,
            CommandIcon::Heading3 => Self::Heading3,
            CommandIcon::BulletList => Self::List,
            CommandIcon::NumberedList => Self::ListOrdered,
            CommandIcon::TaskList => Self::ListTodo,
            CommandIcon::Table => Self::Table,
            CommandIcon::AlignLeft => Self::AlignLeft,
            CommandIcon::AlignCenter => Self::AlignCenter,
            CommandIcon::AlignRight => Self::AlignRight,
            CommandIcon::AlignJustify => Self::AlignJustify,
            CommandIcon::Quote => Self::Quote,
            CommandIcon::Divider => Self::Divider,
            CommandIcon::Image => Self::Image,
            CommandIcon::CodeBlock => Self::CodeBlock,
            CommandIcon::Bold => Self::Bold,
            CommandIcon::Italic => Self::Italic,
            CommandIcon::Underline => Self::Underline,
            CommandIcon::Strikethrough => Self::Strikethrough,
            CommandIcon::Code => Self::Code,
            CommandIcon::Link => Self::Link,
        }
    }
}

/// A square-ish toolbar button holding an icon, a label, or both.
#[derive(IntoElement)]
pub struct ToolbarButton {
    id: ElementId,
    style: StyleRefinement,
    tooltip: Option<SharedString>,
    disabled: bool,
    selected: bool,
    chevron: bool,
    text_color: Option<Hsla>,
    children: Vec<AnyElement>,
    on_click: Option<ClickHandler>,
    min_width: Pixels,
}

impl ToolbarButton {
    pub fn new(id: impl Into<ElementId>) -> Self {
        Self {
            id: id.into(),
            style: StyleRefinement::default(),
            tooltip: None,
            disabled: false,
            selected: false,
            chevron: false,
            text_color: None,
            children: Vec::new(),
            on_click: None,
            min_width: px(28.),
        }
    }

    pub fn icon(id: impl Into<ElementId>, icon: impl IconNamed) -> Self {
        Self::new(id).child(Icon::new(icon))
    }

    pub fn tooltip(mut self, tooltip: impl Into<SharedString>) -> Self {
        self.tooltip = Some(tooltip.into());
        self
    }

    /// Adds a trailing chevron, for buttons that open a menu.
    pub fn dropdown(mut self) -> Self {
        self.chevron = true;
        self
    }

    pub fn min_width(mut self, min_width: Pixels) -> Self {
        self.min_width = min_width;
        self
    }

    pub fn text_color(mut self, color: Hsla) -> Self {
        self.text_color = Some(color);
        self
    }

    pub fn on_click(
        mut self,
        on_click: impl Fn(&ClickEvent, &mut Window, &mut App) + 'static,
    ) -> Self {
        self.on_click = Some(Rc::new(on_click));
        self
    }
}

impl ParentElement for ToolbarButton {
    fn extend(&mut self, elements: impl IntoIterator<Item = AnyElement>) {
        self.children.extend(elements);
    }
}

impl Styled for ToolbarButton {
    fn style(&mut self) -> &mut StyleRefinement {
        &mut self.style
    }
}

impl Selectable for ToolbarButton {
    fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    fn is_selected(&self) -> bool {
        self.selected
    }
}

impl Disableable for ToolbarButton {
    fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

impl RenderOnce for ToolbarButton {
    fn render(self, _window: &mut Window, cx: &mut App) -> impl IntoElement {
        let theme = cx.theme();
        let enabled = !self.disabled;
        let on_click = self.on_click.filter(|_| enabled);

        let mut muted = theme.muted_foreground;
        muted.a *= 0.6;
        let fg = if enabled {
            self.text_color.unwrap_or(theme.foreground)
        } else {
            muted
        };

        div()
            .id(self.id)
            .flex()
            .items_center()
            .justify_center()
            .gap(px(4.))
            .h(px(28.))
            .min_w(self.min_width)
            .px(px(6.))
            .rounded(px(6.))
            .text_size(px(12.))
            .font_weight(gpui::FontWeight::MEDIUM)
            .text_color(fg)
            .when(enabled, |this| {
                this.cursor_pointer()
                    .hover(|this| this.bg(theme.muted))
                    .active(|this| this.bg(theme.accent).text_color(theme.accent_foreground))
            })
            .when(self.selected, |this| {
                this.bg(theme.accent).text_color(theme.accent_foreground)
            })
            .refine_style(&self.style)
            .on_mouse_down(MouseButton::Left, |_, window, _| window.prevent_default())
            .when_some(on_click, |this, on_click| {
                this.on_click(move |event, window, cx| on_click(event, window, cx))
            })
            .children(self.children)
            .when(self.chevron, |this| {
                this.child(
                    Icon::new(ToolbarIcon::ChevronDown)
                        .size_3p5()
                        .text_color(theme.muted_foreground),
                )
            })
            .when_some(self.tooltip, |this, tooltip| {
                this.tooltip(move |window, cx| Tooltip::new(tooltip.clone()).build(window, cx))
            })
    }
}

#[derive(IntoElement)]
pub struct ToolbarSeparator;

impl RenderOnce for ToolbarSeparator {
    fn render(self, _: &mut Window, cx: &mut App) -> impl IntoElement {
        div()
            .mx(px(4.))
            .h(px(18.))
            .w(px(1.))
            .bg(cx.theme().border)
    }
}

/// A color chip. `None` renders the "reset" chip.
#[derive(IntoElement)]
pub struct SwatchButton {
    id: ElementId,
    color: Option<Hsla>,
    label: SharedString,
    selected: bool,
    on_click: Option<ClickHandler>,
}

impl SwatchButton {
    pub fn new(id: impl Into<ElementId>, color: Option<Hsla>, label: impl Into<SharedString>) -> Self {
        Self {
            id: id.into(),
            color,
            label: label.into(),
            selected: false,
            on_click: None,
        }
    }

    pub fn on_click(
        mut self,
        on_click: impl Fn(&ClickEvent, &mut Window, &mut App) + 'static,
    ) -> Self {
        self.on_click = Some(Rc::new(on_click));
        self
    }
}

impl Selectable for SwatchButton {
    fn selected(mut self, selected: bool) -> Self {
        self.selected = selected;
        self
    }

    fn is_selected(&self) -> bool {
        self.selected
    }
}

impl RenderOnce for SwatchButton {
    fn render(self, _: &mut Window, cx: &mut App) -> impl IntoElement {
        let theme = cx.theme();
        let label = self.label.clone();

        div()
            .id(self.id)
            .size(px(20.))
            .rounded(px(4.))
            .border_1()
            .border_color(if self.selected { theme.ring } else { theme.border })
            .cursor_pointer()
            .map(|this| match self.color {
                Some(color) => this.bg(color),
                None => this.bg(theme.background).child(
                    div()
                        .size_full()
                        .flex()
                        .items_center()
                        .justify_center()
                        .text_size(px(10.))
                        .text_color(theme.muted_foreground)
                        .child("×"),
                ),
            })
            .on_mouse_down(MouseButton::Left, |_, window, _| window.prevent_default())
            .when_some(self.on_click, |this, on_click| {
                this.on_click(move |event, window, cx| on_click(event, window, cx))
            })
            .tooltip(move |window, cx| Tooltip::new(label.clone()).build(window, cx))
    }
}

/// Minus / value / plus, for nudging a number in fixed steps.
#[derive(IntoElement)]
pub struct ToolbarStepper {
    id: SharedString,
    disabled: bool,
    value: SharedString,
    on_decrement: Option<ClickHandler>,
    on_increment: Option<ClickHandler>,
}

impl ToolbarStepper {
    pub fn new(id: impl Into<SharedString>, value: impl Into<SharedString>) -> Self {
        Self {
            id: id.into(),
            disabled: false,
            value: value.into(),
            on_decrement: None,
            on_increment: None,
        }
    }

    pub fn on_decrement(
        mut self,
        on_click: impl Fn(&ClickEvent, &mut Window, &mut App) + 'static,
    ) -> Self {
        self.on_decrement = Some(Rc::new(on_click));
        self
    }

    pub fn on_increment(
        mut self,
        on_click: impl Fn(&ClickEvent, &mut Window, &mut App) + 'static,
    ) -> Self {
        self.on_increment = Some(Rc::new(on_click));
        self
    }
}

impl Disableable for ToolbarStepper {
    fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

impl RenderOnce for ToolbarStepper {
    fn render(self, _: &mut Window, cx: &mut App) -> impl IntoElement {
        let theme = cx.theme();
        let child_id = |name: &str| SharedString::from(format!("{}-{name}", self.id));

        let mut minus = ToolbarButton::icon(child_id("minus"), ToolbarIcon::Minus)
            .tooltip("Smaller")
            .disabled(self.disabled);
        if let Some(on_click) = self.on_decrement {
            minus = minus.on_click(move |event, window, cx| on_click(event, window, cx));
        }
        let mut plus = ToolbarButton::icon(child_id("plus"), ToolbarIcon::Plus)
            .tooltip("Larger")
            .disabled(self.disabled);
        if let Some(on_click) = self.on_increment {
            plus = plus.on_click(move |event, window, cx| on_click(event, window, cx));
        }

        div()
            .id(self.id)
            .flex()
            .items_center()
            .gap(px(2.))
            .rounded(px(6.))
            .bg(theme.muted.opacity(0.6))
            .child(minus)
            .child(
                div()
                    .min_w(px(40.))
                    .text_center()
                    .text_size(px(12.))
                    .font_family(theme.mono_font_family.clone())
                    .text_color(theme.foreground)
                    .child(self.value),
            )
            .child(plus)
    }
}

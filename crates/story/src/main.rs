use gpui::*;
use gpui_component::{Root, TitleBar};
use gpui_content_components::assets::ContentAssets;
use gpui_content_editor_story::story::{ContentStory, sample_editor};
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let content = sample_editor()?;
    let app = Application::new().with_assets(ContentAssets::new());

    app.run(move |cx| {
        gpui_component::init(cx);
        gpui_content_editor_story::init(cx);
        cx.activate(true);

        cx.spawn(async move |cx| {
            cx.open_window(
                WindowOptions {
                    titlebar: Some(TitleBar::title_bar_options()),
                    ..Default::default()
                },
                |window, cx| {
                    window.set_window_title("Content Editor");
                    let menu_bar =
                        gpui_content_editor_story::app_menus::init("Content Editor", window, cx);
                    let view = ContentStory::view(menu_bar, content, window, cx);
                    cx.new(|cx| Root::new(view, window, cx))
                },
            )?;

            Ok::<_, anyhow::Error>(())
        })
        .detach();
    });
    Ok(())
}

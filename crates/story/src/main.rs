use gpui::*;
use gpui_component::Root;

use gpui_manos_layers_story::layers::{LayersExample, demo_layers};
use gpui_manos_layers_story::logging;

fn main() {
    logging::init();
    let app = Application::new();

    app.run(move |cx| {
        gpui_component::init(cx);
        cx.activate(true);

        cx.spawn(async move |cx| {
            let (layers, registry) = demo_layers()?;
            cx.open_window(
                WindowOptions {
                    titlebar: Some(TitlebarOptions {
                        title: Some("Layers".into()),
                        appears_transparent: false,
                        traffic_light_position: None,
                    }),
                    ..Default::default()
                },
                |window, cx| {
                    let view = LayersExample::view(layers, registry, window, cx);
                    cx.new(|cx| Root::new(view, window, cx))
                },
            )?;

            Ok::<_, anyhow::Error>(())
        })
        .detach();
    });
}

use chronoscape::engine::core::app_setup::create_app;
use chronoscape::engine::core::config::GalaxyConfig;

fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    let config = {
        use clap::Parser;
        GalaxyConfig::parse()
    };

    // No command line in the browser
    #[cfg(target_arch = "wasm32")]
    let config = GalaxyConfig::default();

    let mut app = create_app(config);

    #[cfg(target_arch = "wasm32")]
    {
        wasm_bindgen_futures::spawn_local(async move {
            app.run();
        });
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        app.run();
    }
}

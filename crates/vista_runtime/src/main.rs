//! Vista Viewer Runtime
//!
//! Headless driver for the viewport stack. It:
//! - Loads viewer settings (TOML) and boot options
//! - Lays out several viewports and acquires a software rendering context
//! - Runs the registry and surface loops for a number of host frames
//! - Feeds scripted input through the camera controller
//!
//! Run with: cargo run -p vista_runtime -- --frames 300 --layout grid2x2
//!       or: cargo run --bin vista

mod boot_config;
mod viewer;

use boot_config::BootConfig;
use vista_viewport::ViewerSettings;

use crate::viewer::Viewer;

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    log::info!("Vista viewer v{}", env!("CARGO_PKG_VERSION"));

    let config = BootConfig::load();
    config.print_summary();

    let mut settings = match config.resolved_settings_path() {
        Some(path) => ViewerSettings::load_or_default(&path),
        None => ViewerSettings::default(),
    };
    if let Some(layout) = config.layout {
        settings.layout = layout;
    }

    if let Err(e) = run(&config, settings) {
        log::error!("Viewer failed: {}", e);
        std::process::exit(1);
    }
}

fn run(config: &BootConfig, settings: ViewerSettings) -> Result<(), Box<dyn std::error::Error>> {
    let mut viewer = Viewer::new(settings, config.viewports)?;
    viewer.start()?;
    viewer.run(config.frames, config.frame_interval_ms);

    for line in viewer.status_text() {
        println!("{}", line);
    }

    if let Some(path) = &config.export_path {
        viewer.export_snapshot(path)?;
    }

    if config.save_settings {
        match config.resolved_settings_path() {
            Some(path) => viewer.settings().save(&path)?,
            None => log::warn!("No config directory; settings not saved"),
        }
    }

    viewer.shutdown();
    Ok(())
}

//! Boot configuration for the viewer runtime
//!
//! Sources, later ones winning:
//! 1. Built-in defaults
//! 2. Environment (`VISTA_SETTINGS`, `VISTA_FRAMES`, `VISTA_LAYOUT`)
//! 3. Command line (`--settings <path>`, `--frames <n>`, `--layout <name>`,
//!    `--viewports <n>`, `--export <path>`, `--save-settings`)

use std::path::PathBuf;

use vista_viewport::{Layout, ViewerSettings};

/// Runtime launch options
#[derive(Clone, Debug, PartialEq)]
pub struct BootConfig {
    /// Settings file; the platform default when unset
    pub settings_path: Option<PathBuf>,
    /// Frames to run before exiting
    pub frames: usize,
    /// Simulated host frame interval (ms)
    pub frame_interval_ms: f64,
    /// Overrides the layout from the settings file
    pub layout: Option<Layout>,
    pub viewports: usize,
    /// Write the final registry snapshot here
    pub export_path: Option<PathBuf>,
    /// Write the effective settings back before exiting
    pub save_settings: bool,
}

impl Default for BootConfig {
    fn default() -> Self {
        Self {
            settings_path: None,
            frames: 180,
            frame_interval_ms: 1000.0 / 60.0,
            layout: None,
            viewports: 4,
            export_path: None,
            save_settings: false,
        }
    }
}

impl BootConfig {
    /// Load from the process environment and arguments
    pub fn load() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("VISTA_SETTINGS") {
            if !path.is_empty() {
                config.settings_path = Some(PathBuf::from(path));
            }
        }
        if let Some(frames) = std::env::var("VISTA_FRAMES").ok().and_then(|v| v.parse().ok()) {
            config.frames = frames;
        }
        if let Some(layout) = std::env::var("VISTA_LAYOUT").ok().and_then(|v| parse_layout(&v)) {
            config.layout = Some(layout);
        }

        config.apply_args(std::env::args().skip(1));
        config
    }

    /// Apply command-line flags; unknown flags and bad values are logged and skipped
    pub fn apply_args<I>(&mut self, args: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--settings" => self.settings_path = args.next().map(PathBuf::from),
                "--export" => self.export_path = args.next().map(PathBuf::from),
                "--save-settings" => self.save_settings = true,
                "--frames" => match args.next().and_then(|v| v.parse().ok()) {
                    Some(frames) => self.frames = frames,
                    None => log::warn!("--frames expects a number"),
                },
                "--viewports" => match args.next().and_then(|v| v.parse().ok()) {
                    Some(count) => self.viewports = count,
                    None => log::warn!("--viewports expects a number"),
                },
                "--layout" => match args.next().as_deref().and_then(parse_layout) {
                    Some(layout) => self.layout = Some(layout),
                    None => log::warn!("--layout expects single|horizontal|vertical|grid2x2|grid3x3|custom"),
                },
                other => log::warn!("Ignoring unknown argument '{}'", other),
            }
        }
    }

    /// Settings path to use, if any
    pub fn resolved_settings_path(&self) -> Option<PathBuf> {
        self.settings_path.clone().or_else(ViewerSettings::default_path)
    }

    pub fn print_summary(&self) {
        log::info!("Boot Configuration:");
        log::info!("  Frames: {} @ {:.2} ms", self.frames, self.frame_interval_ms);
        log::info!("  Viewports: {}", self.viewports);
        if let Some(layout) = self.layout {
            log::info!("  Layout override: {:?}", layout);
        }
        match self.resolved_settings_path() {
            Some(path) => log::info!("  Settings: {}", path.display()),
            None => log::info!("  Settings: defaults (no config dir)"),
        }
    }
}

/// Parse a layout name, case-insensitive
pub fn parse_layout(name: &str) -> Option<Layout> {
    match name.trim().to_ascii_lowercase().as_str() {
        "single" => Some(Layout::Single),
        "horizontal" => Some(Layout::Horizontal),
        "vertical" => Some(Layout::Vertical),
        "grid2x2" => Some(Layout::Grid2x2),
        "grid3x3" => Some(Layout::Grid3x3),
        "custom" => Some(Layout::Custom),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_layout() {
        assert_eq!(parse_layout("Grid2x2"), Some(Layout::Grid2x2));
        assert_eq!(parse_layout(" horizontal "), Some(Layout::Horizontal));
        assert_eq!(parse_layout("diagonal"), None);
    }

    #[test]
    fn test_apply_args() {
        let mut config = BootConfig::default();
        config.apply_args(args(&[
            "--frames",
            "30",
            "--layout",
            "vertical",
            "--settings",
            "/tmp/vista.toml",
            "--save-settings",
        ]));

        assert_eq!(config.frames, 30);
        assert_eq!(config.layout, Some(Layout::Vertical));
        assert_eq!(config.settings_path, Some(PathBuf::from("/tmp/vista.toml")));
        assert!(config.save_settings);
    }

    #[test]
    fn test_bad_values_keep_defaults() {
        let mut config = BootConfig::default();
        config.apply_args(args(&["--frames", "many", "--layout", "spiral", "--bogus"]));
        assert_eq!(config, BootConfig::default());
    }
}

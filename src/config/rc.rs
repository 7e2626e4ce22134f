use crate::document_model::MAX_NESTING_DEPTH;
use crate::view::renderer::DEFAULT_MAX_DEPTH;
use crate::view::{Screen, Theme};
use log::{LevelFilter, debug, warn};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const RC_FILE_NAME: &str = ".purexmlrc";

#[derive(Debug, Clone, PartialEq)]
pub struct RcConfig {
    pub indent: usize,
    pub show_line_numbers: bool,
    pub show_toolbar: bool,
    pub mouse: bool,
    pub color: bool,
    pub start_collapsed: bool,
    pub max_depth: usize,
    pub log_level: LevelFilter,
}

impl Default for RcConfig {
    fn default() -> Self {
        Self {
            indent: 2,
            show_line_numbers: false,
            show_toolbar: true,
            mouse: true,
            color: true,
            start_collapsed: false,
            max_depth: DEFAULT_MAX_DEPTH,
            log_level: LevelFilter::Info,
        }
    }
}

impl RcConfig {
    pub fn theme(&self) -> Theme {
        if self.color {
            Theme::default()
        } else {
            Theme::monochrome()
        }
    }

    pub fn apply_to_screen(&self, screen: &mut Screen) {
        screen.set_indent(self.indent);
        screen.set_line_numbers(self.show_line_numbers);
        screen.set_toolbar(self.show_toolbar);
        screen.set_theme(self.theme());
    }
}

pub struct RcLoader;

impl RcLoader {
    /// Get the path to the RC file
    /// Looks for .purexmlrc in:
    /// 1. Current directory
    /// 2. Home directory (~/.purexmlrc)
    pub fn get_rc_path() -> Option<PathBuf> {
        let current_rc = Path::new(RC_FILE_NAME);
        if current_rc.exists() {
            return Some(current_rc.to_path_buf());
        }

        if let Ok(home) = env::var("HOME") {
            let home_rc = Path::new(&home).join(RC_FILE_NAME);
            if home_rc.exists() {
                return Some(home_rc);
            }
        }

        None
    }

    /// Load and parse the RC file, falling back to defaults
    pub fn load_config() -> RcConfig {
        match Self::get_rc_path() {
            Some(rc_path) => Self::load_from_path(&rc_path),
            None => RcConfig::default(),
        }
    }

    pub fn load_from_path(rc_path: &Path) -> RcConfig {
        let mut config = RcConfig::default();
        match fs::read_to_string(rc_path) {
            Ok(content) => {
                debug!("loading settings from {}", rc_path.display());
                Self::parse_config_content(&content, &mut config);
            }
            Err(e) => {
                // an unreadable rc file is not fatal
                warn!("could not read {}: {e}", rc_path.display());
            }
        }
        config
    }

    fn parse_config_content(content: &str, config: &mut RcConfig) {
        for line in content.lines() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with('#') || line.starts_with('"') {
                continue;
            }

            Self::parse_config_line(line, config);
        }
    }

    fn parse_config_line(line: &str, config: &mut RcConfig) {
        // Remove inline comments
        let line = match line.find('#') {
            Some(pos) => &line[..pos],
            None => line,
        }
        .trim();

        if let Some(stripped) = line.strip_prefix("set ") {
            let setting = stripped.trim();
            match setting {
                "nu" | "number" => config.show_line_numbers = true,
                "nonu" | "nonumber" => config.show_line_numbers = false,
                "toolbar" => config.show_toolbar = true,
                "notoolbar" => config.show_toolbar = false,
                "mouse" => config.mouse = true,
                "nomouse" => config.mouse = false,
                "color" => config.color = true,
                "nocolor" => config.color = false,
                "collapsed" => config.start_collapsed = true,
                "nocollapsed" => config.start_collapsed = false,
                _ => {
                    if let Some((key, value)) = setting.split_once('=') {
                        Self::apply_value(key.trim(), value.trim(), config);
                    }
                }
            }
        }
        // Handle direct key-value pairs
        else if let Some((key, value)) = line.split_once('=') {
            Self::apply_value(key.trim(), value.trim(), config);
        }
    }

    fn apply_value(key: &str, value: &str, config: &mut RcConfig) {
        match key {
            "indent" | "shiftwidth" | "sw" => {
                if let Ok(indent) = value.parse::<usize>() {
                    if (1..=8).contains(&indent) {
                        config.indent = indent;
                    }
                }
            }
            "maxdepth" | "max_depth" => {
                if let Ok(depth) = value.parse::<usize>() {
                    if depth > 0 {
                        config.max_depth = depth.min(MAX_NESTING_DEPTH);
                    }
                }
            }
            "loglevel" | "log_level" => {
                if let Ok(level) = value.parse::<LevelFilter>() {
                    config.log_level = level;
                }
            }
            "linenumbers" | "line_numbers" | "number" => {
                config.show_line_numbers = Self::parse_bool(value);
            }
            "toolbar" | "show_toolbar" => config.show_toolbar = Self::parse_bool(value),
            "mouse" => config.mouse = Self::parse_bool(value),
            "color" | "colour" => config.color = Self::parse_bool(value),
            "collapsed" | "start_collapsed" => config.start_collapsed = Self::parse_bool(value),
            _ => {} // Unknown setting, ignore
        }
    }

    fn parse_bool(value: &str) -> bool {
        value == "true" || value == "1" || value == "yes"
    }

    /// Generate a sample RC file content
    pub fn generate_sample_rc() -> String {
        r#"# pure-xml-view configuration file (.purexmlrc)
# Lines starting with # or " are comments

# Display settings
set nu                 # Show line numbers (or set nonu to disable)
set toolbar            # Show the toolbar row (or set notoolbar)
set color              # Colour the markup (or set nocolor)
set indent=2           # Columns per nesting level (1-8)

# Behaviour
set mouse              # Click -/+ to toggle (or set nomouse)
set nocollapsed        # Start with everything expanded
set maxdepth=1024      # Refuse documents nested deeper than this
set loglevel=info      # off, error, warn, info, debug or trace

# Alternative key=value syntax:
# indent=4
# line_numbers=true
# show_toolbar=false
# log_level=debug
"#
        .to_string()
    }
}

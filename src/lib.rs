pub mod cli;
pub mod config;
pub mod controller;
pub mod document_model;
pub mod view;

use crate::config::RcConfig;
use crate::controller::XmlView;
use crate::view::html;
use crate::view::terminal::write_lines;
use log::LevelFilter;
use simplelog::{Config, WriteLogger};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("could not read input: {0}")]
    Input(#[source] io::Error),
    #[error("could not write output: {0}")]
    Output(#[source] io::Error),
    #[error("could not open log file {path}: {source}")]
    LogFile {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("logger already initialised: {0}")]
    Logger(#[from] log::SetLoggerError),
}

/// Send log records to `path`. Without a log file nothing is logged, since
/// the interactive viewer owns the terminal.
pub fn init_logging(path: &Path, level: LevelFilter) -> Result<(), AppError> {
    let log_file = File::create(path).map_err(|source| AppError::LogFile {
        path: path.display().to_string(),
        source,
    })?;
    WriteLogger::init(level, Config::default(), log_file)?;
    Ok(())
}

/// One-line description of the settings in effect, for the log. The rc file
/// is read before logging can start, so this is where its effect shows up.
pub fn settings_summary(config: &RcConfig, rc_path: Option<&Path>) -> String {
    let source = match rc_path {
        Some(path) => path.display().to_string(),
        None => "defaults".to_string(),
    };
    format!(
        "settings from {source}: indent={} number={} toolbar={} mouse={} color={} collapsed={} maxdepth={}",
        config.indent,
        config.show_line_numbers,
        config.show_toolbar,
        config.mouse,
        config.color,
        config.start_collapsed,
        config.max_depth,
    )
}

/// Write the current tree of `view` as indented text
pub fn print_tree<W: Write>(out: &mut W, view: &XmlView, config: &RcConfig) -> Result<(), AppError> {
    let theme = config.theme();
    let theme = config.color.then_some(&theme);
    write_lines(out, &view.visible_lines(), config.indent, theme).map_err(AppError::Output)
}

/// Write `view` as a standalone HTML page
pub fn print_html<W: Write>(out: &mut W, view: &XmlView, title: &str) -> Result<(), AppError> {
    let page = html::render_page(&view.to_html_fragment(), title);
    out.write_all(page.as_bytes()).map_err(AppError::Output)
}

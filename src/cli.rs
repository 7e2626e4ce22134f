use crate::config::RcConfig;
use clap::Parser;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "pure-xml-view")]
#[command(version, about = "View XML as a collapsible tree", long_about = None)]
pub struct Args {
    /// XML file to show; reads stdin when absent or `-`
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Print a standalone HTML page instead of opening the viewer
    #[arg(long, conflicts_with = "print")]
    pub html: bool,

    /// Print the tree to stdout instead of opening the viewer
    #[arg(long)]
    pub print: bool,

    /// Start with every element collapsed
    #[arg(short, long)]
    pub collapsed: bool,

    /// Write a debug log to this file
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Disable colours
    #[arg(long)]
    pub no_color: bool,

    /// Columns per nesting level
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u8).range(1..=8))]
    pub indent: Option<u8>,

    /// Show line numbers
    #[arg(short = 'n', long)]
    pub number: bool,
}

impl Args {
    /// The file to read, or None for stdin
    pub fn source_path(&self) -> Option<&Path> {
        self.file
            .as_deref()
            .filter(|path| path.as_os_str() != "-")
    }

    pub fn read_input(&self) -> io::Result<String> {
        match self.source_path() {
            Some(path) => fs::read_to_string(path),
            None => {
                let mut text = String::new();
                io::stdin().read_to_string(&mut text)?;
                Ok(text)
            }
        }
    }

    /// Flags win over the rc file; an absent flag leaves the file's value
    pub fn apply_to(&self, config: &mut RcConfig) {
        if self.collapsed {
            config.start_collapsed = true;
        }
        if self.no_color {
            config.color = false;
        }
        if self.number {
            config.show_line_numbers = true;
        }
        if let Some(indent) = self.indent {
            config.indent = indent as usize;
        }
    }
}

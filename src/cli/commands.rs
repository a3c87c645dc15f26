use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::model::task::Priority;

#[derive(Parser)]
#[command(name = "tm", about = concat!("taskman v", env!("CARGO_PKG_VERSION"), " - a small local task list"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Keep saved tasks in this directory instead of the configured one
    #[arg(short = 'D', long = "data-dir", global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Add a task to the end of the list
    Add(AddArgs),
    /// List tasks, optionally only those whose title contains SEARCH
    #[command(alias = "ls")]
    List(ListArgs),
    /// Mark a task done, or not done if it already is
    #[command(alias = "done")]
    Toggle(ToggleArgs),
    /// Delete tasks by their position in a listing
    #[command(alias = "delete")]
    Rm(RmArgs),
    /// Show suggested categories
    Categories,
    /// Show or change configuration
    #[command(subcommand)]
    Config(ConfigCmd),
}

#[derive(Args)]
pub struct AddArgs {
    /// Task title (words are joined with spaces)
    #[arg(required = true, num_args = 1..)]
    pub title: Vec<String>,
    /// Priority: low, medium or high (default from config)
    #[arg(short, long)]
    pub priority: Option<Priority>,
    /// Category (default from config)
    #[arg(short, long)]
    pub category: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// Only show tasks whose title contains this text (case-insensitive)
    pub search: Option<String>,
}

#[derive(Args)]
pub struct ToggleArgs {
    /// Task id, or a unique prefix of it
    pub id: String,
}

#[derive(Args)]
pub struct RmArgs {
    /// Positions as shown by `tm list` (1-based)
    #[arg(required = true, num_args = 1..)]
    pub positions: Vec<usize>,
    /// Positions refer to `tm list SEARCH` with this search text
    #[arg(short, long)]
    pub search: Option<String>,
}

#[derive(Subcommand)]
pub enum ConfigCmd {
    /// Print the effective configuration and where it was read from
    Show,
    /// Set a value, e.g. `tm config set defaults.category Work`
    Set(ConfigSetArgs),
}

#[derive(Args)]
pub struct ConfigSetArgs {
    /// Dotted key: storage.data_dir, defaults.priority, defaults.category,
    /// ui.max_title_width, ui.color
    pub key: String,
    pub value: String,
}

//! Command-line interface
//!
//! - [`commands`]: One function per subcommand, writing to caller-supplied streams

pub mod commands;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use crate::config::{Config, DEFAULT_INDEX_URL, INDEX_URL_ENV};

pub use commands::execute;

#[derive(Debug, Parser)]
#[command(name = "qypi")]
#[command(version, about = "Query & search PyPI from the command line")]
pub struct Cli {
    /// Package index to query
    #[arg(
        short,
        long,
        value_name = "URL",
        env = INDEX_URL_ENV,
        default_value = DEFAULT_INDEX_URL,
        global = true
    )]
    pub index_url: String,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn config(&self) -> Config {
        Config::new(self.index_url.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Show package details
    Info {
        /// Print a single JSON array instead of one document per package
        #[arg(short, long)]
        array: bool,
        /// Allow pre-releases when picking the latest version
        #[arg(long)]
        pre: bool,
        /// Packages as NAME or NAME=VERSION
        packages: Vec<String>,
    },
    /// Print package descriptions
    Readme {
        #[arg(long)]
        pre: bool,
        packages: Vec<String>,
    },
    /// List every release of each package
    Releases { packages: Vec<String> },
    /// List the files of each package release
    Files {
        #[arg(long)]
        pre: bool,
        packages: Vec<String>,
    },
    /// List all packages on the index
    List,
    /// Search packages by FIELD:TERM (bare terms search descriptions)
    Search {
        #[arg(required = true)]
        terms: Vec<String>,
    },
    /// List packages with all of the given classifiers
    Browse {
        /// Read additional classifiers from FILE, one per line ("-" for stdin)
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,
        classifiers: Vec<String>,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Info { .. } => "info",
            Command::Readme { .. } => "readme",
            Command::Releases { .. } => "releases",
            Command::Files { .. } => "files",
            Command::List => "list",
            Command::Search { .. } => "search",
            Command::Browse { .. } => "browse",
        }
    }
}

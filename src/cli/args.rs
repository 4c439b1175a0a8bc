//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::application::{EncodingPolicy, OutputFormat};

/// Build and render the banking feature catalog as a rooted tree
#[derive(Parser, Debug)]
#[command(name = "featuretree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Catalog JSON file (default: builtin catalog)
    #[arg(short, long, global = true, value_hint = ValueHint::FilePath)]
    pub catalog: Option<PathBuf>,

    /// Treatment of non-integer feature_order tokens (default from settings)
    #[arg(long, global = true, value_enum)]
    pub encoding: Option<EncodingPolicy>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render the feature tree
    Tree {
        /// Output format (default from settings)
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Validate the catalog and list diagnostics
    Check {
        /// Fail when any feature fell back to the root
        #[arg(long)]
        strict: bool,
    },

    /// List leaf features
    Leaves,

    /// Show the path from the root to a feature
    Path {
        /// Feature id
        id: u32,
    },

    /// Show tree statistics
    Info,

    /// Show effective settings
    Config,

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

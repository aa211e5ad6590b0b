use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// API key (overrides the configuration file)
    #[arg(long, env = "EVB_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Submit a media file with edit commands
    Edit {
        /// Input media file
        #[arg(short, long)]
        input: PathBuf,

        /// Edit commands, e.g. "tt=hello, volume=-5, reverse"
        #[arg(short = 'C', long)]
        commands: String,

        /// Extension for the uploaded file name (defaults to the input's)
        #[arg(long)]
        ext: Option<String>,

        /// Download the edited media to this path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show account usage statistics
    Stats,

    /// List the available edit commands
    Commands,

    /// Write a default configuration file
    InitConfig {
        /// Destination path
        #[arg(short, long, default_value = "evb.toml")]
        output: PathBuf,
    },
}

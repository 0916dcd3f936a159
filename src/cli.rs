//! CLI definitions for tabpilot.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// tabpilot CLI.
#[derive(Parser)]
#[command(name = "tabpilot")]
#[command(about = "Drive your browser with a language model")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: ~/.tabpilot/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run a single prompt and print the answer
    Ask {
        /// What to ask the assistant
        prompt: String,

        #[command(flatten)]
        session: SessionArgs,
    },

    /// Interactive session over stdin; history carries across prompts
    Chat {
        #[command(flatten)]
        session: SessionArgs,
    },

    /// Print the browser tool catalog as JSON
    Tools,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Load and validate the configuration, printing any warnings
    Check,
}

/// Per-session overrides on top of the configuration file.
#[derive(Args, Debug, Clone, Default)]
pub(crate) struct SessionArgs {
    /// Run proposed actions without asking
    #[arg(long)]
    pub auto_approve: bool,

    /// Maximum tool-executing rounds per prompt
    #[arg(long)]
    pub max_rounds: Option<u32>,

    /// Preferred model; configured fallbacks still apply
    #[arg(long)]
    pub model: Option<String>,

    /// API key for the generation backend
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,
}

impl SessionArgs {
    /// Whether any flag changes the loaded configuration.
    pub fn overrides_config(&self) -> bool {
        self.auto_approve || self.max_rounds.is_some() || self.model.is_some()
    }
}

use clap::{Args, Parser, Subcommand};
use std::net::IpAddr;
use std::path::PathBuf;

/// Environment variable holding the OpenRouter key.
pub const API_KEY_ENV_VAR: &str = "OPENROUTER_API_KEY";

#[derive(Parser, Debug)]
#[command(author, version, about = "Recipe search service with model-backed generation", long_about = None)]
pub struct Cli {
    /// Path to the JSON recipe collection; created from the bundled seed if missing
    #[arg(long, env = "RECIPES_PATH", default_value = "data/recipes.json", global = true)]
    pub recipes_path: PathBuf,

    /// Name of the environment variable that holds the model API key
    #[arg(long, default_value = API_KEY_ENV_VAR, global = true)]
    pub api_key_env_var: String,

    /// Model used for recipe generation
    #[arg(long, env = "RECIPE_MODEL", global = true)]
    pub model: Option<String>,

    /// Unsplash access key for image backfill
    #[arg(long, env = "UNSPLASH_ACCESS_KEY", hide_env_values = true, global = true)]
    pub unsplash_access_key: Option<String>,

    /// Log level for this crate (RUST_LOG overrides it)
    #[arg(long, env = "LOG_LEVEL", default_value = "info", global = true)]
    pub log_level: String,

    #[command(flatten)]
    pub serve: ServeArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Listen address, used by `serve` and by a bare invocation.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct ServeArgs {
    #[arg(long, env = "HOST", default_value = "0.0.0.0", global = true)]
    pub host: IpAddr,
    #[arg(long, env = "PORT", default_value_t = 5000, global = true)]
    pub port: u16,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve,
    /// Generate recipes once and print them
    Generate {
        #[arg(short, long, default_value_t = 1)]
        n: usize,
    },
    /// Replace example.com placeholder images with real ones
    UpdateImages,
}

impl Cli {
    /// `serve` when no subcommand is given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

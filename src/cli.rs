use clap::Parser;
use std::path::PathBuf;

/// Config file looked up in the working directory when nothing else is given
pub const LOCAL_CONFIG_FILE: &str = "wikistats.toml";

/// Get the per-user config file location
/// Uses platform-specific config directories:
/// - Linux: ~/.config/wikistats/config.toml
/// - macOS: ~/Library/Application Support/wikistats/config.toml
/// - Windows: %APPDATA%/wikistats/config.toml
pub fn default_user_config() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("wikistats").join("config.toml"))
}

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "wikistats")]
#[command(about = "Run SQL reports and publish them as chart tables to a Confluence wiki")]
#[command(version)]
pub struct CliArgs {
    /// Path to the report configuration (TOML)
    /// Default: $WIKISTATS_CONFIG, then ./wikistats.toml, then the user config dir
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Run queries and print the markup instead of publishing it
    #[arg(long)]
    pub dry_run: bool,

    /// Only handle reports with these titles (configuration order is kept)
    /// Can specify multiple: --only "Weekly Signups" "Revenue"
    #[arg(long, value_name = "TITLE", num_args = 1..)]
    pub only: Vec<String>,

    /// Print a JSON summary of the run to stdout
    #[arg(long)]
    pub json: bool,
}

impl CliArgs {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        CliArgs::parse()
    }

    /// Validate argument combinations
    pub fn validate(&self) -> Result<(), String> {
        if self.only.iter().any(|t| t.trim().is_empty()) {
            return Err("--only titles must not be empty".to_string());
        }

        Ok(())
    }
}

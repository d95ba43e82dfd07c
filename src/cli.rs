use clap::{Parser, Subcommand, ValueEnum};

use crate::commands;
use crate::error::Result;

/// Classpilot CLI - hands-free course video advancement in a live browser
#[derive(Parser)]
#[command(name = "classpilot")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// CDP port or WebSocket URL (overrides the saved session)
    #[arg(long, env = "CLASSPILOT_CDP", global = true)]
    pub cdp: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Connect to a running browser
    Connect {
        /// CDP endpoint (port or WebSocket URL)
        endpoint: String,
    },

    /// Open a URL in a new tab
    Open {
        /// URL to open
        url: String,
    },

    /// Show settings, session and player status
    Status,

    /// Scrape and print the course-material list
    List,

    /// Advance to the next unfinished item once
    Next,

    /// Watch the course tab and advance automatically
    Run,

    /// Playback policy toggles
    Settings {
        #[command(subcommand)]
        command: SettingsCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommands {
    /// Show current settings
    Show,

    /// Set a settings flag
    Set {
        /// Flag to change
        key: SettingKey,
        /// on/off (also accepts true/false)
        value: String,
    },

    /// Show the settings file path
    Path,
}

/// The persisted toggle each settings command addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SettingKey {
    /// Master switch
    Enabled,
    /// Start playback automatically when a player is found
    Autoplay,
    /// Keep advancing while the tab is backgrounded
    Background,
    /// Redirect to the chapter page on completion
    ReturnToChapter,
    /// Hide the on-page toggle buttons
    HideUi,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Set a configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },

    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },

    /// Show configuration file path
    Path,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Connect { endpoint } => commands::connect::run(self, endpoint).await,
            Commands::Open { url } => commands::open::run(self, url).await,
            Commands::Status => commands::status::run(self).await,
            Commands::List => commands::list::run(self).await,
            Commands::Next => commands::next::run(self).await,
            Commands::Run => commands::run::run(self).await,
            Commands::Settings { command } => commands::settings::run(self, command).await,
            Commands::Config { command } => commands::config::run(self, command).await,
        }
    }
}

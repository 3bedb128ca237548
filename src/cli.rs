//! Command-line argument parsing for QueryDesk.
//!
//! Uses clap for arguments. Also parses the backslash meta-commands
//! understood by the interactive shell.

use clap::Parser;
use querydesk::config::{Config, ConnectionConfig, ConnectionProfile};
use querydesk::error::{QueryDeskError, Result};
use querydesk::render::OutputFormat;
use std::path::PathBuf;

/// Profile name used when none is given.
const DEFAULT_PROFILE: &str = "default";

/// A small SQL shell for PostgreSQL, MySQL and SQLite.
#[derive(Parser, Debug)]
#[command(name = "querydesk")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Connection URL (e.g., postgres://host:5432/db, mysql://host/db, sqlite://file.db)
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Database user
    #[arg(short = 'U', long, value_name = "USER")]
    pub user: Option<String>,

    /// Database password
    #[arg(long, value_name = "PASSWORD")]
    pub password: Option<String>,

    /// Driver identifier (postgres, mysql, sqlite, or a JDBC driver class name)
    #[arg(long, value_name = "DRIVER")]
    pub driver: Option<String>,

    /// Connection id recorded in history entries
    #[arg(long, value_name = "ID")]
    pub id: Option<i64>,

    /// Use named connection from config
    #[arg(short = 'c', long, value_name = "NAME")]
    pub connection: Option<String>,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Execute a single statement and exit
    #[arg(short = 'e', long = "execute", value_name = "SQL")]
    pub execute: Option<String>,

    /// Output format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text", env = "QUERYDESK_FORMAT")]
    pub format: String,

    /// Write logs to the state directory instead of stderr
    #[arg(long)]
    pub log_file: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Connection fields given on the command line.
    pub fn to_profile(&self) -> ConnectionProfile {
        ConnectionProfile {
            id: self.id,
            url: self.url.clone(),
            username: self.user.clone(),
            password: self.password.clone(),
            driver: self.driver.clone(),
        }
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Returns the named connection to use, if specified.
    pub fn connection_name(&self) -> Option<&str> {
        self.connection.as_deref()
    }

    /// Parses the output format from the --format argument.
    pub fn parse_output_format(&self) -> std::result::Result<OutputFormat, String> {
        self.format.parse()
    }

    /// Resolves the connection to open.
    ///
    /// Precedence, highest first: CLI arguments, the profile named by `-c`,
    /// the `default` profile (skipped when `--url` is given), environment
    /// variables.
    pub fn resolve_connection(&self, config: &Config) -> Result<ConnectionConfig> {
        let (name, mut profile) = match self.connection_name() {
            Some(name) => {
                let profile = config.get_connection(Some(name)).cloned().ok_or_else(|| {
                    QueryDeskError::config(format!(
                        "Connection '{}' not found in config file",
                        name
                    ))
                })?;
                (name.to_string(), profile)
            }
            None if self.url.is_some() => ("cli".to_string(), ConnectionProfile::default()),
            None => (
                DEFAULT_PROFILE.to_string(),
                config.get_connection(None).cloned().unwrap_or_default(),
            ),
        };

        profile.merge(&self.to_profile());
        profile.apply_env_defaults();

        if profile.url.is_none() {
            return Err(QueryDeskError::config(
                "No database connection configured. Use --url, -c NAME or QUERYDESK_URL",
            ));
        }

        profile.into_config(name)
    }
}

/// A backslash command typed at the shell prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaCommand {
    History,
    Recent(usize),
    Search(String),
    Show(i64),
    Clear,
    Quit,
    Help,
}

impl MetaCommand {
    /// Number of entries `\recent` shows without an argument.
    pub const DEFAULT_RECENT: usize = 10;

    /// Parses a line starting with `\`. Returns `None` for anything else.
    pub fn parse(line: &str) -> Option<std::result::Result<Self, String>> {
        let line = line.trim();
        let rest = line.strip_prefix('\\')?;
        let (cmd, arg) = match rest.split_once(char::is_whitespace) {
            Some((cmd, arg)) => (cmd, arg.trim()),
            None => (rest, ""),
        };

        let parsed = match cmd {
            "history" | "h" => Ok(Self::History),
            "recent" | "r" if arg.is_empty() => Ok(Self::Recent(Self::DEFAULT_RECENT)),
            "recent" | "r" => arg
                .parse()
                .map(Self::Recent)
                .map_err(|_| format!("Invalid count: '{arg}'")),
            "search" | "s" if arg.is_empty() => Err("Usage: \\search TERM".to_string()),
            "search" | "s" => Ok(Self::Search(arg.to_string())),
            "show" => arg
                .parse()
                .map(Self::Show)
                .map_err(|_| "Usage: \\show ID".to_string()),
            "clear" => Ok(Self::Clear),
            "q" | "quit" => Ok(Self::Quit),
            "?" | "help" => Ok(Self::Help),
            other => Err(format!("Unknown command: \\{other}. Type \\? for help")),
        };
        Some(parsed)
    }

    pub fn help_text() -> &'static str {
        "\\history        list recorded statements\n\
         \\recent [N]     last N statements (default 10)\n\
         \\search TERM    statements containing TERM\n\
         \\show ID        details of one statement\n\
         \\clear          clear history\n\
         \\q              quit"
    }
}

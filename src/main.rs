//! QueryDesk - a small SQL shell over a single database connection.

mod cli;

use std::io::{IsTerminal, Write};

use anyhow::{Context, Result};
use cli::{Cli, MetaCommand};
use querydesk::config::Config;
use querydesk::connection;
use querydesk::history::HistoryTracker;
use querydesk::logging;
use querydesk::render::{self, OutputFormat};
use querydesk::session::{Session, SessionHandle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};

const PROMPT: &str = "querydesk> ";
const CONTINUATION_PROMPT: &str = "       ..> ";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    let log_path = cli.log_file.then(logging::log_path);
    logging::init(log_path.as_deref());

    if let Err(e) = run(cli).await {
        error!("{:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let format = cli
        .parse_output_format()
        .map_err(anyhow::Error::msg)?;

    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let connection_config = cli.resolve_connection(&config)?;
    info!("Connection: {}", connection_config.display_string());

    let connection = connection::open(connection_config)
        .await
        .context("Could not open connection")?;
    let history = HistoryTracker::with_max_entries(config.history.max_entries);
    let session = Session::spawn(connection, history);

    let outcome = match &cli.execute {
        Some(sql) => run_once(&session, sql, format).await,
        None => run_shell(&session, format).await,
    };

    session.close().await?;
    outcome
}

/// Executes one statement. A failed statement makes the process exit non-zero.
async fn run_once(session: &SessionHandle, sql: &str, format: OutputFormat) -> Result<()> {
    let result = session.execute(sql).await?;
    println!("{}", render::render_result(&result, format));

    match result.error_message() {
        Some(message) => Err(anyhow::anyhow!(message.to_string())),
        None => Ok(()),
    }
}

/// Reads statements from stdin until EOF or `\q`.
///
/// A statement ends with a line whose last character is `;`; the trailing
/// semicolon is not sent. Anything left over at EOF runs as a final statement.
async fn run_shell(session: &SessionHandle, format: OutputFormat) -> Result<()> {
    let interactive = std::io::stdin().is_terminal();
    if interactive {
        println!("Connected to {}. Type \\? for help.", session.name());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut buffer = String::new();

    loop {
        if interactive {
            print_prompt(if buffer.is_empty() { PROMPT } else { CONTINUATION_PROMPT });
        }

        let Some(line) = lines.next_line().await? else {
            break;
        };

        if buffer.is_empty() {
            if line.trim().is_empty() {
                continue;
            }
            if let Some(parsed) = MetaCommand::parse(&line) {
                match parsed {
                    Ok(MetaCommand::Quit) => return Ok(()),
                    Ok(cmd) => run_meta(session, cmd, format).await?,
                    Err(message) => eprintln!("{message}"),
                }
                continue;
            }
        }

        if !buffer.is_empty() {
            buffer.push('\n');
        }
        buffer.push_str(&line);

        if let Some(statement) = buffer.trim_end().strip_suffix(';') {
            let statement = statement.to_string();
            buffer.clear();
            execute_and_print(session, &statement, format).await?;
        }
    }

    if !buffer.trim().is_empty() {
        execute_and_print(session, &buffer, format).await?;
    }

    Ok(())
}

async fn execute_and_print(session: &SessionHandle, sql: &str, format: OutputFormat) -> Result<()> {
    let result = session.execute(sql).await?;
    println!("{}", render::render_result(&result, format));
    Ok(())
}

async fn run_meta(session: &SessionHandle, cmd: MetaCommand, format: OutputFormat) -> Result<()> {
    match cmd {
        MetaCommand::History => {
            let entries = session.history().await?;
            println!("{}", render::render_history(&entries, format));
        }
        MetaCommand::Recent(n) => {
            let entries = session.recent(n).await?;
            println!("{}", render::render_history(&entries, format));
        }
        MetaCommand::Search(term) => {
            let entries = session.search(term).await?;
            println!("{}", render::render_history(&entries, format));
        }
        MetaCommand::Show(id) => match session.history_entry(id).await? {
            Some(entry) => println!("{}", render::render_entry(&entry, format)),
            None => eprintln!("No history entry #{id}"),
        },
        MetaCommand::Clear => {
            session.clear_history().await?;
            println!("History cleared.");
        }
        MetaCommand::Help => println!("{}", MetaCommand::help_text()),
        MetaCommand::Quit => {}
    }
    Ok(())
}

fn print_prompt(prompt: &str) {
    print!("{prompt}");
    let _ = std::io::stdout().flush();
}

//! Binary entrypoint for the Shadowtext CLI.
//!
//! Commands:
//! - `play [--instance <name>]` - open the game prompt, optionally resuming a saved game
//! - `new <story> <name>` - start a new saved game from a story and play it
//! - `stories` - list the stories available to `new`
//! - `init` - write a starter `config.toml` and create the data directories
//!
//! See the library crate docs for module-level details: `shadowtext::`.
use std::io::Write;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{error, info, warn};
use tokio::io::{AsyncBufReadExt, BufReader};

use shadowtext::adventure::{AdventureError, CommandEngine, GameSession, Response};
use shadowtext::config::Config;

#[derive(Parser)]
#[command(name = "shadowtext")]
#[command(about = "A data-driven single-player text adventure engine")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging to the console (-v, -vv for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the game prompt
    Play {
        /// Saved game to resume (overrides game.autoload)
        #[arg(short, long)]
        instance: Option<String>,
    },
    /// Start a new saved game from a story
    New {
        /// Story directory name, see `stories`
        story: String,
        /// Name of the new saved game
        name: String,
    },
    /// List available stories
    Stories,
    /// Write a default configuration and create the data directories
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = match Config::load(&cli.config).await {
        Ok(config) => Some(config),
        Err(e) => {
            if !matches!(cli.command, Commands::Init) {
                eprintln!("{} (using defaults)", e);
            }
            None
        }
    };
    init_logging(loaded.as_ref(), cli.verbose);
    let config = loaded.unwrap_or_default();
    config.validate()?;

    match cli.command {
        Commands::Init => init(&cli.config, &config).await?,
        Commands::Stories => {
            let session = GameSession::new(&config.game.stories_dir, &config.game.saves_dir);
            let stories = session.list_stories()?;
            if stories.is_empty() {
                println!("No stories found in {}", config.game.stories_dir);
            }
            for summary in stories {
                println!("{:<20} {}", summary.dir_name, summary.story.name);
            }
        }
        Commands::New { story, name } => {
            let opening = format!("new {} {}", story, name);
            play(&config, Some(opening)).await?;
        }
        Commands::Play { instance } => {
            let opening = instance
                .or_else(|| config.game.autoload.clone())
                .map(|name| format!("load {}", name));
            play(&config, opening).await?;
        }
    }
    Ok(())
}

async fn init(config_path: &str, config: &Config) -> Result<()> {
    info!("Initializing Shadowtext in the current directory");
    if tokio::fs::try_exists(config_path).await.unwrap_or(false) {
        println!("{} already exists, leaving it untouched", config_path);
    } else {
        Config::create_default(config_path).await?;
        println!("Wrote default configuration to {}", config_path);
    }
    for dir in [&config.game.stories_dir, &config.game.saves_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| anyhow!("Failed to create {}: {}", dir, e))?;
    }
    println!(
        "Put story packages under {} and run `shadowtext play`",
        config.game.stories_dir
    );
    Ok(())
}

/// Read commands from stdin one line at a time until `exit` or end of input.
async fn play(config: &Config, opening: Option<String>) -> Result<()> {
    let mut session = GameSession::new(&config.game.stories_dir, &config.game.saves_dir);
    let mut engine = CommandEngine::new();
    let interactive = atty::is(atty::Stream::Stdin);
    info!(
        "Starting Shadowtext v{} (stories: {}, saves: {})",
        env!("CARGO_PKG_VERSION"),
        config.game.stories_dir,
        config.game.saves_dir
    );

    match opening {
        Some(line) => {
            if !run_turn(&mut engine, &mut session, &line)? && !session.is_active() {
                return Err(anyhow!("could not start game with '{}'", line));
            }
        }
        None => println!("Type 'new' to pick a story, 'load' to resume, 'help' for commands."),
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if session.exit_requested() {
            break;
        }
        if interactive {
            print!("> ");
            std::io::stdout().flush()?;
        }
        let Some(line) = lines.next_line().await? else {
            break;
        };
        run_turn(&mut engine, &mut session, &line)?;
    }
    info!("Session finished");
    Ok(())
}

/// Print the outcome of one command. Returns false when it was refused.
fn run_turn(engine: &mut CommandEngine, session: &mut GameSession, line: &str) -> Result<bool> {
    match engine.execute(session, line) {
        Ok(response) => {
            print_response(&response);
            Ok(!response.is_error())
        }
        Err(e @ AdventureError::PositionWrite { .. }) => {
            // The move itself happened; only the save is behind.
            error!("{}", e);
            eprintln!("Warning: your position could not be saved ({})", e);
            Ok(true)
        }
        Err(e) => Err(e.into()),
    }
}

fn print_response(response: &Response) {
    if response.lines.is_empty() {
        return;
    }
    println!("{}", response.text());
    println!();
}

fn init_logging(config: Option<&Config>, verbosity: u8) {
    let mut builder = env_logger::Builder::new();
    // Without -v the console belongs to the game; logs only go to the file.
    let configured = config
        .and_then(|cfg| cfg.logging.level.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Info);
    let level = match verbosity {
        0 => configured,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(level);
    let echo = verbosity > 0 && atty::is(atty::Stream::Stderr);

    let log_file = config
        .and_then(|cfg| cfg.logging.file.as_ref())
        .and_then(|file| {
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(file)
                .map_err(|e| eprintln!("Cannot open log file {}: {}", file, e))
                .ok()
        });

    match log_file {
        Some(f) => {
            let file = std::sync::Mutex::new(f);
            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());
                if let Ok(mut guard) = file.lock() {
                    let _ = writeln!(guard, "{}", line);
                }
                if echo {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None if verbosity > 0 => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
        None => {
            // Nowhere quiet to log to: keep only warnings and errors on stderr.
            builder.filter_level(log::LevelFilter::Warn);
            builder.format(|fmt, record| writeln!(fmt, "[{}] {}", record.level(), record.args()));
        }
    }
    if builder.try_init().is_err() {
        warn!("Logger already initialized");
    }
}

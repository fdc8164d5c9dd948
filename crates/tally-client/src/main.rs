//! Tally command-line client: log events and query experiment assignments.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tally_client::{
    Config, DeliveryConfig, EventArguments, EventRecord, HttpTransport, LogEvent, Paths, Tally,
    UserData,
};
use tally_config_and_utils::{init_with_config, LogConfig};
use tally_outbox::EventQueue;
use tally_storage::{create_file_store, PersistedState};
use tally_wire::UNIT_SEPARATOR;

/// Tally command-line interface.
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Log analytics events and look up A/B test variants")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level
    #[arg(short, long, global = true)]
    log_level: Option<String>,

    /// Base directory for config, stored state and logs. Defaults to ~/.tally
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,

    /// Application id, overriding config and environment
    #[arg(long, global = true)]
    app_id: Option<String>,

    /// Seconds to wait for queued events to be delivered before exiting
    #[arg(long, default_value_t = 30, global = true)]
    wait_secs: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Log an event
    Log {
        /// Event name
        event: String,

        /// Revenue attached to the event
        #[arg(long)]
        revenue: Option<f64>,

        /// Event argument as key=value; repeatable
        #[arg(long = "arg", value_parser = parse_key_value)]
        args: Vec<(String, String)>,

        /// Pre-encoded argument block, sent unchanged apart from sanitizing
        #[arg(long, conflicts_with_all = ["args", "json_args"])]
        raw_args: Option<String>,

        /// JSON object of arguments; only string values are kept
        #[arg(long, conflicts_with = "args")]
        json_args: Option<String>,
    },
    /// Print the variant letter assigned for an experiment
    Ab {
        /// Experiment name
        experiment: String,
    },
    /// Print the user id, optionally replacing it first
    UserId {
        /// New user id
        #[arg(long)]
        set: Option<String>,
    },
    /// List events still waiting for delivery
    Pending,
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{}`", s))?;
    if key.is_empty() {
        return Err(format!("empty key in `{}`", s));
    }
    Ok((key.to_string(), value.to_string()))
}

fn print_records(records: &[EventRecord]) {
    for record in records {
        println!(
            "{}\t{}\t{}",
            record.time.to_rfc3339(),
            record.event,
            record.added_arguments.replace(UNIT_SEPARATOR, " ")
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    paths.ensure_dirs()?;

    let mut config = Config::load(&paths).context("loading config")?;
    if let Some(app_id) = cli.app_id {
        config.app_id = Some(app_id);
    }

    init_with_config(LogConfig {
        default_level: cli.log_level.unwrap_or_else(|| config.log_level.clone()),
        log_path: Some(paths.log_file()),
        also_stderr: true,
        ..LogConfig::default()
    })?;

    let store = Arc::new(create_file_store(&paths).context("opening state store")?);
    let user_data = UserData::detect().with_app("tally-cli", env!("CARGO_PKG_VERSION"));
    let start = || -> Result<Tally> {
        let transport = Arc::new(HttpTransport::new(&DeliveryConfig::default())?);
        Ok(Tally::start(&config, store.clone(), transport, &user_data)?)
    };

    let tally = match cli.command {
        // Listing only reads the snapshot; starting the client would begin delivery.
        Commands::Pending => {
            let queue = EventQueue::new(PersistedState::new(store.clone()));
            queue.restore();
            print_records(&queue.snapshot());
            return Ok(());
        }
        Commands::Log {
            event,
            revenue,
            args,
            raw_args,
            json_args,
        } => {
            let arguments = match (raw_args, json_args) {
                (Some(raw), _) => EventArguments::Raw(raw),
                (None, Some(json)) => {
                    EventArguments::from_json(&json).context("parsing --json-args")?
                }
                (None, None) => args.into_iter().collect(),
            };
            let tally = start()?;
            tally.log(
                LogEvent::new(event)
                    .revenue(revenue.unwrap_or(0.0))
                    .arguments(arguments),
            );
            tally
        }
        Commands::Ab { experiment } => {
            let tally = start()?;
            println!("{}", tally.ab_test(&experiment));
            tally
        }
        Commands::UserId { set } => {
            let tally = start()?;
            if let Some(user_id) = set {
                tally.set_user_id(&user_id);
            }
            println!("{}", tally.user_id());
            tally
        }
    };

    if !tally.flush(Duration::from_secs(cli.wait_secs)).await {
        eprintln!(
            "{} event(s) still pending; delivery resumes on the next run",
            tally.pending()
        );
    }

    Ok(())
}

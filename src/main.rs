//! roster-bot - CLI for the event participant roster
//!
//! Runs the same lookups as the Telegram bot straight against Airtable:
//! fuzzy name search, room/floor lookups, lists, export, stats and schedule.
//!
//! CHANGELOG:
//! - 10/19/2026 - notify command for sending the daily report by hand
//! - 10/19/2026 - Initial CLI

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use roster_bot::{commands, output};

/// Participant roster CLI - Airtable lookups without the bot.
#[derive(Parser, Debug)]
#[command(name = "roster-bot")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Compact JSON output (no whitespace)
    #[arg(long, global = true)]
    compact: bool,

    /// Comma-separated field allowlist
    #[arg(long, global = true)]
    fields: Option<String>,

    /// Truncate text fields to this length
    #[arg(long, global = true)]
    max_text_chars: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    // =========================================================================
    // SEARCH
    // =========================================================================
    /// Fuzzy search participants by name (Russian or English)
    Search {
        /// Name or part of a name
        query: String,

        /// Minimum similarity, 0.0-1.0 (default: SEARCH_THRESHOLD)
        #[arg(short, long)]
        threshold: Option<f64>,

        /// Max results (default: SEARCH_LIMIT)
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Who lives in a room
    Room {
        /// Room number, e.g. 203 or 12A
        room: String,
    },

    /// Who lives on a floor
    Floor {
        /// Floor number
        floor: u32,
    },

    // =========================================================================
    // PARTICIPANTS
    // =========================================================================
    /// List participants
    List {
        /// all, candidates or team
        #[arg(short, long, default_value = "all")]
        role: String,
    },

    /// Show every field of one participant
    Show {
        /// Airtable record id
        id: String,
    },

    /// Export all participants to CSV
    Export {
        /// Output file or directory (default: participants_<date>_<id>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    // =========================================================================
    // REPORTS
    // =========================================================================
    /// Participant statistics
    Stats,

    /// Event schedule
    Schedule {
        /// today, tomorrow or week
        #[arg(default_value = "today")]
        range: String,

        /// Treat this date (YYYY-MM-DD) as today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Send the daily report to NOTIFY_CHAT_IDS now
    Notify {
        /// Report date (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Print the report instead of sending it
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let output_controls = output::OutputControls {
        json: cli.json,
        compact: cli.compact,
        fields: cli.fields.clone(),
        max_text_chars: cli.max_text_chars,
    };

    let result = match cli.command {
        Command::Search { query, threshold, limit } => {
            commands::search::name(&query, threshold, limit, &output_controls)
        }
        Command::Room { room } => commands::search::room(&room, &output_controls),
        Command::Floor { floor } => commands::search::floor(floor, &output_controls),
        Command::List { role } => commands::participants::list(&role, &output_controls),
        Command::Show { id } => commands::participants::show(&id, &output_controls),
        Command::Export { output } => {
            commands::participants::export(output.as_deref(), &output_controls)
        }
        Command::Stats => commands::stats::run(&output_controls),
        Command::Schedule { range, date } => {
            commands::schedule::run(&range, date, &output_controls)
        }
        Command::Notify { date, dry_run } => {
            commands::notify::run(date, dry_run, &output_controls)
        }
    };

    match result {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            if cli.json {
                println!("{}", output::format_error(&format!("{:#}", e)));
            } else {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::from(1)
        }
    }
}

//! roster-bot-daemon - runs the Telegram bot in the background.
//!
//! CHANGELOG:
//! - 10/19/2026 - Stop waits for the process to exit
//! - 10/19/2026 - Initial implementation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use roster_bot::bot::BotServer;
use roster_bot::config::{state_dir, Settings};
use roster_bot::lock::InstanceLock;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

#[derive(Parser)]
#[command(name = "roster-bot-daemon")]
#[command(about = "Long-polling Telegram bot for the participant roster")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Start {
        /// Run in foreground (don't daemonize)
        #[arg(long)]
        foreground: bool,
    },

    /// Stop the bot
    Stop,

    /// Check whether the bot is running
    Status,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env().context("Failed to load settings")?;

    match cli.command {
        Commands::Start { foreground } => cmd_start(&settings, foreground),
        Commands::Stop => cmd_stop(&settings.pid_file),
        Commands::Status => cmd_status(&settings.pid_file),
    }
}

extern "C" fn on_terminate(_signal: libc::c_int) {
    SHUTDOWN.store(true, Ordering::SeqCst);
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();
}

fn run(settings: &Settings) -> Result<()> {
    // Only one poller per token; Telegram rejects concurrent getUpdates.
    let _lock = InstanceLock::acquire(&settings.lock_file)?;

    // SAFETY: the handler only stores to an atomic
    unsafe {
        libc::signal(libc::SIGTERM, on_terminate as libc::sighandler_t);
        libc::signal(libc::SIGINT, on_terminate as libc::sighandler_t);
    }

    let mut server = BotServer::from_settings(settings).context("Failed to start bot")?;
    server.serve(&SHUTDOWN)?;
    Ok(())
}

fn cmd_start(settings: &Settings, foreground: bool) -> Result<()> {
    settings.telegram_token()?;

    if foreground {
        init_tracing();
        tracing::info!("starting in foreground");
        return run(settings);
    }

    let dir = state_dir();
    std::fs::create_dir_all(&dir)?;
    if let Some(parent) = settings.pid_file.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let log = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("bot.log"))?;

    use daemonize::Daemonize;

    let daemonize = Daemonize::new()
        .pid_file(&settings.pid_file)
        .working_directory("/tmp")
        .stderr(log);

    match daemonize.start() {
        Ok(_) => {
            init_tracing();
            if let Err(e) = run(settings) {
                tracing::error!("bot exited: {:#}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Failed to daemonize: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}

fn read_pid(pid_file: &Path) -> Result<i32> {
    let pid_str = std::fs::read_to_string(pid_file)
        .with_context(|| format!("No pid file at {}", pid_file.display()))?;
    pid_str
        .trim()
        .parse()
        .with_context(|| format!("Bad pid in {}", pid_file.display()))
}

fn is_alive(pid: i32) -> bool {
    // SAFETY: signal 0 only checks that the process exists
    unsafe { libc::kill(pid, 0) == 0 }
}

fn cmd_stop(pid_file: &Path) -> Result<()> {
    let pid = read_pid(pid_file)?;

    // SAFETY: plain syscall on a pid we read from our own pid file
    unsafe {
        libc::kill(pid, libc::SIGTERM);
    }

    // The poll loop notices the flag after the current getUpdates returns.
    for _ in 0..40 {
        if !is_alive(pid) {
            break;
        }
        std::thread::sleep(Duration::from_secs(1));
    }

    if is_alive(pid) {
        anyhow::bail!("Bot (pid {}) did not stop", pid);
    }
    let _ = std::fs::remove_file(pid_file);
    println!("Bot stopped (pid {})", pid);
    Ok(())
}

fn cmd_status(pid_file: &Path) -> Result<()> {
    match read_pid(pid_file) {
        Ok(pid) if is_alive(pid) => {
            println!("Bot running (pid {})", pid);
            Ok(())
        }
        _ => {
            println!("Bot not running");
            std::process::exit(1);
        }
    }
}

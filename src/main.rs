mod api;
mod browser;
mod cli;
mod credentials;
mod detail;
mod error;
mod fmt;
mod models;
mod pager;
mod paginator;
#[cfg(feature = "pdf")]
mod pdf;
mod report;
mod settings;
mod tasks;
mod tui;

use std::io::IsTerminal;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, ConfigCommands, DetailCommands};

const LOG_ENV: &str = "GAPAKEREM_LOG";

/// Whether the command takes over the terminal, in which case logs go to a file.
fn owns_terminal(command: &Option<Commands>) -> bool {
    match command {
        None | Some(Commands::Dashboard) => true,
        Some(Commands::Report { output, .. }) => {
            output.output.is_none()
                && output.mode.as_deref() != Some("export")
                && output.format.is_none()
                && std::io::stdout().is_terminal()
        }
        _ => false,
    }
}

fn init_logging(to_file: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    if to_file {
        let path = settings::load_settings().log_path();
        let file = path
            .parent()
            .map(std::fs::create_dir_all)
            .transpose()
            .and_then(|_| {
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&path)
            });
        if let Ok(file) = file {
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
            return;
        }
    }
    builder.with_writer(std::io::stderr).init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(owns_terminal(&cli.command));

    let result = match cli.command {
        None | Some(Commands::Dashboard) => cli::dashboard::run(),
        Some(Commands::Login { username }) => cli::login::login(username),
        Some(Commands::Logout) => cli::login::logout(),
        Some(Commands::Status) => cli::status::run(),
        Some(Commands::Config { command }) => match command {
            None | Some(ConfigCommands::Show) => cli::config::show(),
            Some(ConfigCommands::Set { key, value }) => cli::config::set(&key, &value),
        },
        Some(Commands::Report { period, output }) => cli::report::dispatch(period, output),
        #[cfg(feature = "pdf")]
        Some(Commands::Print { period }) => cli::print::run(&period),
        Some(Commands::Trips { command: Some(DetailCommands::Show { id }), .. }) => {
            cli::details::run_trip(&id)
        }
        Some(Commands::Trips { kind, command: None, list }) => {
            cli::listing_kind(kind).and_then(|kind| cli::lists::run_trips(kind, &list))
        }
        Some(Commands::Users { command: Some(DetailCommands::Show { id }), .. }) => {
            cli::details::run_user(&id)
        }
        Some(Commands::Users { command: None, list }) => cli::lists::run_users(&list),
        Some(Commands::Bookings { command: Some(DetailCommands::Show { id }), .. }) => {
            cli::details::run_booking(&id)
        }
        Some(Commands::Bookings { kind, command: None, list }) => {
            cli::listing_kind(kind).and_then(|kind| cli::lists::run_bookings(kind, &list))
        }
        Some(Commands::Guides { list }) => cli::lists::run_guides(&list),
        Some(Commands::Porters { list }) => cli::lists::run_porters(&list),
        Some(Commands::Completions { shell }) => cli::completions(shell),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

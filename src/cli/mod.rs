pub mod config;
pub mod dashboard;
pub mod details;
#[cfg(feature = "pdf")]
pub mod export;
pub mod lists;
pub mod login;
#[cfg(feature = "pdf")]
pub mod print;
pub mod report;
pub mod status;

use std::sync::Arc;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::api::ApiClient;
use crate::credentials::default_store;
use crate::error::{AppError, Result};
use crate::models::TripKind;
use crate::report::ReportPeriod;
use crate::settings::Settings;

/// Build an API client from saved settings and the default credential store.
pub(crate) fn client(settings: &Settings) -> Result<ApiClient> {
    ApiClient::new(settings, Arc::from(default_store()))
}

#[derive(Parser)]
#[command(
    name = "gapakerem",
    version,
    about = "Terminal admin console for GaPakeRem Adventure: trips, bookings and monthly reports."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in as an admin and store the session token.
    Login {
        /// Admin username (prompted when omitted)
        #[arg(long)]
        username: Option<String>,
    },
    /// Forget the stored session token.
    Logout,
    /// Show API endpoint, data directory and login state.
    Status,
    /// Show or change settings.
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Monthly trip report: interactive view, text, or export.
    Report {
        #[command(flatten)]
        period: PeriodArgs,
        #[command(flatten)]
        output: ReportOutputArgs,
    },
    /// Render the monthly report and send it to the printer.
    #[cfg(feature = "pdf")]
    Print {
        #[command(flatten)]
        period: PeriodArgs,
    },
    /// List open or private trips, or show one trip.
    #[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
    Trips {
        #[arg(required = true)]
        kind: Option<TripKindArg>,
        #[command(subcommand)]
        command: Option<DetailCommands>,
        #[command(flatten)]
        list: ListArgs,
    },
    /// List registered users, or show one user.
    #[command(args_conflicts_with_subcommands = true)]
    Users {
        #[command(subcommand)]
        command: Option<DetailCommands>,
        #[command(flatten)]
        list: ListArgs,
    },
    /// List bookings for open or private trips, or show one booking.
    #[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
    Bookings {
        #[arg(required = true)]
        kind: Option<TripKindArg>,
        #[command(subcommand)]
        command: Option<DetailCommands>,
        #[command(flatten)]
        list: ListArgs,
    },
    /// List guides.
    Guides {
        #[command(flatten)]
        list: ListArgs,
    },
    /// List porters.
    Porters {
        #[command(flatten)]
        list: ListArgs,
    },
    /// Open the full-screen dashboard (the default with no subcommand).
    Dashboard,
    /// Print shell completions.
    Completions {
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print every setting.
    Show,
    /// Change one setting.
    Set {
        /// Setting name, e.g. api_base_url
        key: String,
        value: String,
    },
}

#[derive(Subcommand)]
pub enum DetailCommands {
    /// Show one record, read-only.
    Show {
        /// Record id as listed
        id: String,
    },
}

#[derive(Args, Clone, Debug, Default)]
pub struct PeriodArgs {
    /// Month: 01-12 (default: this month)
    #[arg(long)]
    pub month: Option<String>,
    /// Year: YYYY (default: this year)
    #[arg(long)]
    pub year: Option<String>,
}

impl PeriodArgs {
    /// Validate against the supported report years, defaulting to today.
    pub fn resolve(&self, settings: &Settings) -> Result<ReportPeriod> {
        let years = settings.report_years();
        let current = ReportPeriod::current(&years);
        let month = self.month.clone().unwrap_or_else(|| current.month.value());
        let year = self.year.clone().unwrap_or_else(|| current.year.to_string());
        ReportPeriod::parse(&month, &year, &years)
    }
}

#[derive(Args, Clone, Debug, Default)]
pub struct ReportOutputArgs {
    /// Output file path (implies export)
    #[arg(long)]
    pub output: Option<String>,
    /// Output mode: view, export
    #[arg(long, value_parser = ["view", "export"])]
    pub mode: Option<String>,
    /// Export format: pdf, text
    #[arg(long, value_parser = ["pdf", "text"])]
    pub format: Option<String>,
}

#[derive(Args, Clone, Debug)]
pub struct ListArgs {
    /// Page number (clamped to the available pages)
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    /// Case-insensitive name filter
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum TripKindArg {
    Open,
    Private,
}

impl From<TripKindArg> for TripKind {
    fn from(arg: TripKindArg) -> Self {
        match arg {
            TripKindArg::Open => TripKind::Open,
            TripKindArg::Private => TripKind::Private,
        }
    }
}

/// The kind a listing needs; clap already demands it unless `show` is used.
pub fn listing_kind(kind: Option<TripKindArg>) -> Result<TripKind> {
    kind.map(TripKind::from)
        .ok_or_else(|| AppError::Other("expected a trip kind: open or private".into()))
}

pub fn completions(shell: clap_complete::Shell) -> Result<()> {
    use clap::CommandFactory;
    let mut cmd = Cli::command();
    clap_complete::generate(shell, &mut cmd, "gapakerem", &mut std::io::stdout());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_period_args_resolve() {
        let settings = Settings::default();
        let args = PeriodArgs {
            month: Some("04".into()),
            year: Some("2024".into()),
        };
        let p = args.resolve(&settings).unwrap();
        assert_eq!(p.month.number(), 4);
        assert_eq!(p.year, 2024);
    }

    #[test]
    fn test_period_args_reject_bad_input() {
        let settings = Settings::default();
        let bad_month = PeriodArgs {
            month: Some("13".into()),
            year: Some("2024".into()),
        };
        assert!(bad_month.resolve(&settings).is_err());
        let bad_year = PeriodArgs {
            month: Some("01".into()),
            year: Some("2019".into()),
        };
        assert!(bad_year.resolve(&settings).is_err());
        let garbled_year = PeriodArgs {
            month: Some("01".into()),
            year: Some("20x4".into()),
        };
        assert!(garbled_year.resolve(&settings).is_err());
    }

    #[test]
    fn test_period_args_default_to_now() {
        let p = PeriodArgs::default().resolve(&Settings::default()).unwrap();
        assert!(p.year >= 2023);
    }

    #[test]
    fn test_parse_trips_command() {
        let cli = Cli::try_parse_from(["gapakerem", "trips", "private", "--page", "3", "--search", "rinjani"]).unwrap();
        match cli.command {
            Some(Commands::Trips { kind, command: None, list }) => {
                assert!(matches!(listing_kind(kind).unwrap(), TripKind::Private));
                assert_eq!(list.page, 3);
                assert_eq!(list.search.as_deref(), Some("rinjani"));
            }
            _ => panic!("expected trips"),
        }
    }

    #[test]
    fn test_parse_show_commands() {
        let cli = Cli::try_parse_from(["gapakerem", "trips", "show", "12"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Trips { kind: None, command: Some(DetailCommands::Show { ref id }), .. }) if id == "12"
        ));
        let cli = Cli::try_parse_from(["gapakerem", "users", "show", "5"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Users { command: Some(DetailCommands::Show { ref id }), .. }) if id == "5"
        ));
        let cli = Cli::try_parse_from(["gapakerem", "bookings", "show", "b-17"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Bookings { command: Some(DetailCommands::Show { ref id }), .. }) if id == "b-17"
        ));
    }

    #[test]
    fn test_listing_still_requires_kind() {
        assert!(Cli::try_parse_from(["gapakerem", "trips"]).is_err());
        assert!(Cli::try_parse_from(["gapakerem", "bookings", "--page", "2"]).is_err());
        assert!(Cli::try_parse_from(["gapakerem", "trips", "show"]).is_err());
        assert!(listing_kind(None).is_err());
    }
}

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Deserialize;

use crate::input::coerce_number;
use crate::linkage::SharedUsage;

#[derive(Parser, Debug)]
#[command(
    name = "ccquote",
    about = "Monthly cost estimates for contact-center platforms"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output format: table (default), json
    #[arg(long, global = true)]
    pub format: Option<OutputFormat>,

    /// Directory holding saved defaults (overrides config and platform default)
    #[arg(long, global = true)]
    pub store_dir: Option<PathBuf>,

    /// Chat channels, pushed into every pricing model
    #[arg(long, global = true, allow_hyphen_values = true)]
    pub chat_channels: Option<String>,

    /// Call channels, pushed into every pricing model
    #[arg(long, global = true, allow_hyphen_values = true)]
    pub call_channels: Option<String>,

    /// Advisor seats, pushed into every pricing model
    #[arg(long, global = true, allow_hyphen_values = true)]
    pub seats: Option<String>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct EditArgs {
    /// Override a parameter, e.g. `--set seats=40`. Repeatable; applied in order.
    /// Run `ccquote defaults fields <BUNDLE>` to list field names.
    #[arg(long = "set", value_name = "FIELD=VALUE", allow_hyphen_values = true)]
    pub assignments: Vec<String>,

    /// Save the resulting parameters as the new defaults
    #[arg(long)]
    pub save: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Seat subscription + token + STT model (USD)
    SeatToken(EditArgs),
    /// Per-unit consumption model (USD)
    Consumption(EditArgs),
    /// Per-unit model with tiered discounts and margin (KRW)
    Tiered(EditArgs),
    /// All three models plus the combined KRW total
    All {
        /// Save shared quantities and every model's parameters as defaults
        #[arg(long)]
        save: bool,
    },
    /// List plan tiers and what each seat includes
    Plans,
    /// Inspect or reset saved defaults
    Defaults {
        #[command(subcommand)]
        action: DefaultsAction,
    },
    /// Recompute all models whenever saved defaults or config change
    Watch {
        /// Minimum seconds between refreshes (debounce)
        #[arg(long, default_value = "1")]
        interval: u64,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum DefaultsAction {
    /// Print the saved parameters merged over built-in defaults
    Show { bundle: BundleName },
    /// Delete saved parameters
    Reset { bundle: BundleName },
    /// List the field names `--set` accepts
    Fields { bundle: BundleName },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BundleName {
    Linkage,
    SeatToken,
    Consumption,
    Tiered,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Table,
    Json,
}

impl Cli {
    /// Shared quantities given on the command line. Malformed numbers count as 0.
    pub fn shared_usage(&self) -> SharedUsage {
        SharedUsage {
            chat_channels: self.chat_channels.as_deref().map(coerce_number),
            call_channels: self.call_channels.as_deref().map(coerce_number),
            seats: self.seats.as_deref().map(coerce_number),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeated_assignments_in_order() {
        let cli = Cli::parse_from([
            "ccquote",
            "tiered",
            "--set",
            "advisor_seats=250",
            "--set",
            "global_discount=5",
            "--save",
        ]);
        let Command::Tiered(args) = cli.command else {
            panic!("expected tiered");
        };
        assert_eq!(args.assignments, vec!["advisor_seats=250", "global_discount=5"]);
        assert!(args.save);
    }

    #[test]
    fn shared_flags_coerce() {
        let cli = Cli::parse_from([
            "ccquote",
            "all",
            "--seats",
            "40",
            "--chat-channels",
            "lots",
            "--call-channels",
            "-2",
        ]);
        let shared = cli.shared_usage();
        assert_eq!(shared.seats, Some(40.0));
        assert_eq!(shared.chat_channels, Some(0.0));
        assert_eq!(shared.call_channels, Some(-2.0));
    }

    #[test]
    fn bundle_names_are_kebab_case() {
        let cli = Cli::parse_from(["ccquote", "defaults", "show", "seat-token"]);
        assert!(matches!(
            cli.command,
            Command::Defaults {
                action: DefaultsAction::Show {
                    bundle: BundleName::SeatToken
                }
            }
        ));
    }
}

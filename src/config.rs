use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Deserialize;

use crate::cli::OutputFormat;
use crate::rates::{
    ConsumptionRates, PlanCatalog, PlanTermsOverride, PlanTier, RateCard, SeatTokenRates,
    TieredRates,
};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub format: Option<OutputFormat>,
    pub store_dir: Option<PathBuf>,
    pub plans: BTreeMap<PlanTier, PlanTermsOverride>,
    pub rates: RateOverrides,
}

/// Any subset of unit prices; missing fields keep their built-in value.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RateOverrides {
    pub seat_token: SeatTokenRates,
    pub consumption: ConsumptionRates,
    pub tiered: TieredRates,
}

impl Config {
    pub fn rate_card(&self) -> RateCard {
        RateCard {
            seat_token: self.rates.seat_token.sanitized(),
            consumption: self.rates.consumption.sanitized(),
            tiered: self.rates.tiered.sanitized(),
            plans: PlanCatalog::default().with_overrides(&self.plans),
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "ccquote").map(|d| d.config_dir().join("config.toml"))
}

pub fn load_config() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let Ok(data) = fs::read_to_string(&path) else {
        return Config::default();
    };
    parse_config(&data).unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "invalid config, using defaults");
        Config::default()
    })
}

pub fn parse_config(data: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_gives_builtin_rates() {
        let config = parse_config("").unwrap();
        assert_eq!(config.rate_card(), RateCard::default());
        assert!(config.format.is_none());
    }

    #[test]
    fn partial_overrides() {
        let config = parse_config(
            r#"
format = "json"
store_dir = "/tmp/quotes"

[plans.CX4]
seat_price = 250

[rates.seat_token]
chatbot_per_session = 0.025

[rates.tiered]
qa_seat = 70000
"#,
        )
        .unwrap();

        assert_eq!(config.format, Some(OutputFormat::Json));
        assert_eq!(config.store_dir, Some(PathBuf::from("/tmp/quotes")));

        let card = config.rate_card();
        assert_eq!(card.plans.terms(PlanTier::CX4).seat_price, 250.0);
        assert_eq!(card.plans.terms(PlanTier::CX4).free_tokens_per_seat, 30.0);
        assert_eq!(card.seat_token.chatbot_per_session, 0.025);
        assert_eq!(card.seat_token.callbot_per_minute, 0.06);
        assert_eq!(card.tiered.qa_seat, 70_000.0);
        assert_eq!(card.tiered.kms_seat, 50_000.0);
        assert_eq!(card.consumption, ConsumptionRates::default());
    }

    #[test]
    fn invalid_rates_never_price_below_zero() {
        use crate::engine::seat_token::{SeatTokenEngine, SeatTokenInput};
        use crate::engine::tiered::{TieredEngine, TieredInput};
        use crate::engine::PricingEngine;

        let config = parse_config(
            r#"
[rates.seat_token]
chatbot_per_session = -1

[rates.tiered]
qa_seat = nan
"#,
        )
        .unwrap();
        let card = config.rate_card();
        assert_eq!(card.seat_token.chatbot_per_session, 0.0);
        assert_eq!(card.tiered.qa_seat, 0.0);

        let seat_token = SeatTokenEngine::new(&card);
        let base = SeatTokenInput {
            chatbot_channels: 1.0,
            chatbot_sessions_per_day: 5.0,
            ..Default::default()
        };
        let more = SeatTokenInput {
            chatbot_sessions_per_day: 10.0,
            ..base.clone()
        };
        assert!(seat_token.compute(&more).grand_total >= seat_token.compute(&base).grand_total);

        let tiered = TieredEngine::new(&card).compute(&TieredInput {
            qa_seats: 1.0,
            kms_seats: 1.0,
            ..Default::default()
        });
        assert_eq!(tiered.subtotal, 50_000.0);
        assert_eq!(tiered.grand_total, 50_000.0);
    }

    #[test]
    fn unknown_plan_is_rejected() {
        assert!(parse_config("[plans.CX9]\nseat_price = 1").is_err());
    }
}

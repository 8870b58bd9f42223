//! Unit prices for each pricing model.
//!
//! Tables are built once at startup (defaults plus `config.toml` overrides)
//! and never change afterwards.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::input::non_negative;

/// Free STT minutes granted by one add-on pack.
pub const ADDON_STT_MINUTES_PER_PACK: f64 = 1400.0;

/// A configured unit price. Negative or non-finite prices are logged and
/// replaced with 0.
fn unit_price(name: &str, price: f64) -> f64 {
    if price.is_finite() && price >= 0.0 {
        price
    } else {
        tracing::warn!(rate = name, value = price, "invalid unit price, using 0");
        0.0
    }
}

/// Seat-token model prices, USD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeatTokenRates {
    pub callbot_per_minute: f64,
    pub chatbot_per_session: f64,
    pub advisor_stt_per_minute: f64,
    pub advisor_token_each: f64,
}

impl Default for SeatTokenRates {
    fn default() -> Self {
        Self {
            callbot_per_minute: 0.06,
            chatbot_per_session: 0.02,
            advisor_stt_per_minute: 0.01,
            advisor_token_each: 1.0,
        }
    }
}

impl SeatTokenRates {
    pub fn sanitized(&self) -> Self {
        Self {
            callbot_per_minute: unit_price("seat_token.callbot_per_minute", self.callbot_per_minute),
            chatbot_per_session: unit_price(
                "seat_token.chatbot_per_session",
                self.chatbot_per_session,
            ),
            advisor_stt_per_minute: unit_price(
                "seat_token.advisor_stt_per_minute",
                self.advisor_stt_per_minute,
            ),
            advisor_token_each: unit_price("seat_token.advisor_token_each", self.advisor_token_each),
        }
    }
}

/// Consumption model prices, USD. Voice minutes cost the same for callbot
/// and advisor traffic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumptionRates {
    pub chat_per_session: f64,
    pub voice_per_minute: f64,
}

impl Default for ConsumptionRates {
    fn default() -> Self {
        Self {
            chat_per_session: 0.01,
            voice_per_minute: 0.038,
        }
    }
}

impl ConsumptionRates {
    pub fn sanitized(&self) -> Self {
        Self {
            chat_per_session: unit_price("consumption.chat_per_session", self.chat_per_session),
            voice_per_minute: unit_price("consumption.voice_per_minute", self.voice_per_minute),
        }
    }
}

/// Tiered model prices, KRW per unit per month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TieredRates {
    pub chatbot_channel: f64,
    pub callbot_channel: f64,
    pub advisor_seat: f64,
    pub ta_seat: f64,
    pub qa_seat: f64,
    pub kms_seat: f64,
    pub stt_channel: f64,
    pub tts_channel: f64,
}

impl Default for TieredRates {
    fn default() -> Self {
        Self {
            chatbot_channel: 300_000.0,
            callbot_channel: 450_000.0,
            advisor_seat: 150_000.0,
            ta_seat: 80_000.0,
            qa_seat: 60_000.0,
            kms_seat: 50_000.0,
            stt_channel: 100_000.0,
            tts_channel: 80_000.0,
        }
    }
}

impl TieredRates {
    pub fn sanitized(&self) -> Self {
        Self {
            chatbot_channel: unit_price("tiered.chatbot_channel", self.chatbot_channel),
            callbot_channel: unit_price("tiered.callbot_channel", self.callbot_channel),
            advisor_seat: unit_price("tiered.advisor_seat", self.advisor_seat),
            ta_seat: unit_price("tiered.ta_seat", self.ta_seat),
            qa_seat: unit_price("tiered.qa_seat", self.qa_seat),
            kms_seat: unit_price("tiered.kms_seat", self.kms_seat),
            stt_channel: unit_price("tiered.stt_channel", self.stt_channel),
            tts_channel: unit_price("tiered.tts_channel", self.tts_channel),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PlanTier {
    #[serde(alias = "cx1")]
    CX1,
    #[serde(alias = "cx2")]
    CX2,
    #[serde(alias = "cx3")]
    CX3,
    #[serde(alias = "cx4")]
    CX4,
}

impl PlanTier {
    pub const ALL: [PlanTier; 4] = [PlanTier::CX1, PlanTier::CX2, PlanTier::CX3, PlanTier::CX4];
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlanTier::CX1 => "CX1",
            PlanTier::CX2 => "CX2",
            PlanTier::CX3 => "CX3",
            PlanTier::CX4 => "CX4",
        };
        f.write_str(name)
    }
}

/// What one seat on a plan costs and includes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanTerms {
    /// USD per seat per month.
    pub seat_price: f64,
    pub free_stt_minutes_per_seat: f64,
    pub free_tokens_per_seat: f64,
}

/// Partial override of a plan's terms, as read from config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct PlanTermsOverride {
    pub seat_price: Option<f64>,
    pub free_stt_minutes_per_seat: Option<f64>,
    pub free_tokens_per_seat: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PlanCatalog {
    plans: BTreeMap<PlanTier, PlanTerms>,
}

impl Default for PlanCatalog {
    fn default() -> Self {
        let terms = |seat_price, free_stt_minutes_per_seat, free_tokens_per_seat| PlanTerms {
            seat_price,
            free_stt_minutes_per_seat,
            free_tokens_per_seat,
        };
        Self {
            plans: BTreeMap::from([
                (PlanTier::CX1, terms(75.0, 100.0, 0.0)),
                (PlanTier::CX2, terms(115.0, 100.0, 0.0)),
                (PlanTier::CX3, terms(155.0, 1500.0, 0.0)),
                (PlanTier::CX4, terms(240.0, 3000.0, 30.0)),
            ]),
        }
    }
}

impl PlanCatalog {
    pub fn terms(&self, tier: PlanTier) -> PlanTerms {
        self.plans.get(&tier).copied().unwrap_or(PlanTerms {
            seat_price: 0.0,
            free_stt_minutes_per_seat: 0.0,
            free_tokens_per_seat: 0.0,
        })
    }

    /// Apply overrides, clamping every value to `>= 0`.
    pub fn with_overrides(mut self, overrides: &BTreeMap<PlanTier, PlanTermsOverride>) -> Self {
        for (tier, o) in overrides {
            let entry = self.plans.entry(*tier).or_insert(PlanTerms {
                seat_price: 0.0,
                free_stt_minutes_per_seat: 0.0,
                free_tokens_per_seat: 0.0,
            });
            if let Some(v) = o.seat_price {
                entry.seat_price = non_negative(v);
            }
            if let Some(v) = o.free_stt_minutes_per_seat {
                entry.free_stt_minutes_per_seat = non_negative(v);
            }
            if let Some(v) = o.free_tokens_per_seat {
                entry.free_tokens_per_seat = non_negative(v);
            }
        }
        self
    }
}

/// Every rate table the engines need.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateCard {
    pub seat_token: SeatTokenRates,
    pub consumption: ConsumptionRates,
    pub tiered: TieredRates,
    pub plans: PlanCatalog,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_plan_schedule() {
        let catalog = PlanCatalog::default();
        assert_eq!(catalog.terms(PlanTier::CX1).seat_price, 75.0);
        assert_eq!(catalog.terms(PlanTier::CX3).free_stt_minutes_per_seat, 1500.0);
        assert_eq!(catalog.terms(PlanTier::CX4).free_tokens_per_seat, 30.0);
    }

    #[test]
    fn overrides_are_partial_and_clamped() {
        let overrides = BTreeMap::from([(
            PlanTier::CX2,
            PlanTermsOverride {
                seat_price: Some(120.0),
                free_tokens_per_seat: Some(-5.0),
                ..Default::default()
            },
        )]);
        let catalog = PlanCatalog::default().with_overrides(&overrides);
        let cx2 = catalog.terms(PlanTier::CX2);
        assert_eq!(cx2.seat_price, 120.0);
        assert_eq!(cx2.free_stt_minutes_per_seat, 100.0);
        assert_eq!(cx2.free_tokens_per_seat, 0.0);
        assert_eq!(catalog.terms(PlanTier::CX1), PlanCatalog::default().terms(PlanTier::CX1));
    }

    #[test]
    fn invalid_unit_prices_become_zero() {
        let rates = TieredRates {
            qa_seat: f64::NAN,
            tts_channel: -10.0,
            stt_channel: f64::INFINITY,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(rates.qa_seat, 0.0);
        assert_eq!(rates.tts_channel, 0.0);
        assert_eq!(rates.stt_channel, 0.0);
        assert_eq!(rates.kms_seat, 50_000.0);

        let rates = SeatTokenRates {
            chatbot_per_session: -1.0,
            ..Default::default()
        }
        .sanitized();
        assert_eq!(rates.chatbot_per_session, 0.0);
        assert_eq!(rates.callbot_per_minute, 0.06);
        assert_eq!(ConsumptionRates::default().sanitized(), ConsumptionRates::default());
    }

    #[test]
    fn plan_tier_accepts_lowercase() {
        let tier: PlanTier = serde_json::from_str("\"cx3\"").unwrap();
        assert_eq!(tier, PlanTier::CX3);
        assert_eq!(tier.to_string(), "CX3");
    }
}

//! Pay-per-use billing: chat sessions and voice minutes.

use serde::{Deserialize, Serialize};

use super::{EngineKind, LineItem, PricingEngine};
use crate::input::{non_negative, percent, ParameterBundle};
use crate::rates::{ConsumptionRates, RateCard};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumptionInput {
    pub chat_count: f64,
    pub chat_consults_per_day: f64,
    pub chat_sessions_per_consult: f64,
    pub chat_business_days: f64,

    pub callbot_count: f64,
    pub callbot_consults_per_day: f64,
    pub callbot_avg_minutes: f64,
    pub callbot_business_days: f64,

    pub advisor_count: f64,
    pub advisor_consults_per_day: f64,
    pub advisor_avg_minutes: f64,
    pub advisor_business_days: f64,

    pub discount_percent: f64,
    /// KRW per USD.
    pub exchange_rate: f64,
}

impl Default for ConsumptionInput {
    fn default() -> Self {
        Self {
            chat_count: 0.0,
            chat_consults_per_day: 0.0,
            chat_sessions_per_consult: 0.0,
            chat_business_days: 30.0,
            callbot_count: 0.0,
            callbot_consults_per_day: 0.0,
            callbot_avg_minutes: 0.0,
            callbot_business_days: 30.0,
            advisor_count: 0.0,
            advisor_consults_per_day: 0.0,
            advisor_avg_minutes: 0.0,
            advisor_business_days: 22.0,
            discount_percent: 0.0,
            exchange_rate: 1380.0,
        }
    }
}

impl ParameterBundle for ConsumptionInput {
    const KEY: &'static str = "consumption";

    fn sanitized(&self) -> Self {
        Self {
            chat_count: non_negative(self.chat_count),
            chat_consults_per_day: non_negative(self.chat_consults_per_day),
            chat_sessions_per_consult: non_negative(self.chat_sessions_per_consult),
            chat_business_days: non_negative(self.chat_business_days),
            callbot_count: non_negative(self.callbot_count),
            callbot_consults_per_day: non_negative(self.callbot_consults_per_day),
            callbot_avg_minutes: non_negative(self.callbot_avg_minutes),
            callbot_business_days: non_negative(self.callbot_business_days),
            advisor_count: non_negative(self.advisor_count),
            advisor_consults_per_day: non_negative(self.advisor_consults_per_day),
            advisor_avg_minutes: non_negative(self.advisor_avg_minutes),
            advisor_business_days: non_negative(self.advisor_business_days),
            discount_percent: percent(self.discount_percent),
            exchange_rate: non_negative(self.exchange_rate),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionBreakdown {
    pub chat_sessions: f64,
    pub chat: f64,
    pub callbot_minutes: f64,
    pub callbot: f64,
    pub advisor_minutes: f64,
    pub advisor: f64,
    pub pre_discount_total: f64,
    pub discount_percent: f64,
    pub grand_total: f64,
}

pub struct ConsumptionEngine {
    rates: ConsumptionRates,
}

impl ConsumptionEngine {
    pub fn new(card: &RateCard) -> Self {
        Self {
            rates: card.consumption.clone(),
        }
    }
}

fn monthly_volume(count: f64, per_day: f64, multiplier: f64, days: f64) -> f64 {
    count * per_day * multiplier * days
}

impl PricingEngine for ConsumptionEngine {
    type Input = ConsumptionInput;
    type Breakdown = ConsumptionBreakdown;

    const KIND: EngineKind = EngineKind::Consumption;

    fn compute(&self, input: &ConsumptionInput) -> ConsumptionBreakdown {
        let i = input.sanitized();
        let r = &self.rates;

        let chat_sessions = monthly_volume(
            i.chat_count,
            i.chat_consults_per_day,
            i.chat_sessions_per_consult,
            i.chat_business_days,
        );
        let callbot_minutes = monthly_volume(
            i.callbot_count,
            i.callbot_consults_per_day,
            i.callbot_avg_minutes,
            i.callbot_business_days,
        );
        let advisor_minutes = monthly_volume(
            i.advisor_count,
            i.advisor_consults_per_day,
            i.advisor_avg_minutes,
            i.advisor_business_days,
        );

        let chat = chat_sessions * r.chat_per_session;
        let callbot = callbot_minutes * r.voice_per_minute;
        let advisor = advisor_minutes * r.voice_per_minute;

        let pre_discount_total = chat + callbot + advisor;
        let grand_total = (pre_discount_total * (1.0 - i.discount_percent / 100.0)).max(0.0);

        ConsumptionBreakdown {
            chat_sessions,
            chat,
            callbot_minutes,
            callbot,
            advisor_minutes,
            advisor,
            pre_discount_total,
            discount_percent: i.discount_percent,
            grand_total,
        }
    }

    fn grand_total(breakdown: &ConsumptionBreakdown) -> f64 {
        breakdown.grand_total
    }

    fn krw_rate(input: &ConsumptionInput) -> f64 {
        input.exchange_rate
    }

    fn line_items(&self, b: &ConsumptionBreakdown) -> Vec<LineItem> {
        vec![
            LineItem::count("Chat sessions", b.chat_sessions),
            LineItem::money("Chat", b.chat),
            LineItem::count("Callbot minutes", b.callbot_minutes),
            LineItem::money("Callbot", b.callbot),
            LineItem::count("Advisor minutes", b.advisor_minutes),
            LineItem::money("Advisor", b.advisor),
            LineItem::money("Total before discount", b.pre_discount_total),
            LineItem::percent("Discount", b.discount_percent),
            LineItem::money("Grand total", b.grand_total),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CombinedTotal;

    fn engine() -> ConsumptionEngine {
        ConsumptionEngine::new(&RateCard::default())
    }

    fn sample() -> ConsumptionInput {
        ConsumptionInput {
            chat_count: 2.0,
            chat_consults_per_day: 100.0,
            chat_sessions_per_consult: 3.0,
            chat_business_days: 30.0,
            callbot_count: 1.0,
            callbot_consults_per_day: 50.0,
            callbot_avg_minutes: 2.0,
            callbot_business_days: 30.0,
            advisor_count: 10.0,
            advisor_consults_per_day: 40.0,
            advisor_avg_minutes: 5.0,
            advisor_business_days: 22.0,
            ..Default::default()
        }
    }

    #[test]
    fn defaults_cost_nothing() {
        let b = engine().compute(&ConsumptionInput::default());
        assert_eq!(b.grand_total, 0.0);
    }

    #[test]
    fn per_category_volume_and_cost() {
        let b = engine().compute(&sample());
        assert_eq!(b.chat_sessions, 18_000.0);
        assert!((b.chat - 180.0).abs() < 1e-9);
        assert_eq!(b.callbot_minutes, 3000.0);
        assert!((b.callbot - 114.0).abs() < 1e-9);
        assert_eq!(b.advisor_minutes, 44_000.0);
        assert!((b.advisor - 1672.0).abs() < 1e-9);
        assert!((b.pre_discount_total - 1966.0).abs() < 1e-9);
        assert_eq!(b.grand_total, b.pre_discount_total);
    }

    #[test]
    fn discount_is_bounded() {
        for d in [-10.0, 0.0, 25.0, 100.0, 400.0, f64::INFINITY] {
            let b = engine().compute(&ConsumptionInput {
                discount_percent: d,
                ..sample()
            });
            assert!(b.grand_total >= 0.0, "discount {d}");
            assert!(b.grand_total <= b.pre_discount_total, "discount {d}");
        }
        let b = engine().compute(&ConsumptionInput {
            discount_percent: 50.0,
            ..sample()
        });
        assert!((b.grand_total - 983.0).abs() < 1e-9);
    }

    #[test]
    fn zero_in_any_factor_zeroes_the_category() {
        let b = engine().compute(&ConsumptionInput {
            chat_sessions_per_consult: 0.0,
            callbot_business_days: 0.0,
            ..sample()
        });
        assert_eq!(b.chat, 0.0);
        assert_eq!(b.callbot, 0.0);
        assert!(b.advisor > 0.0);
    }

    #[test]
    fn monotonic_in_each_quantity() {
        let e = engine();
        let before = e.compute(&sample());
        let more_chat = e.compute(&ConsumptionInput {
            chat_count: 3.0,
            ..sample()
        });
        let more_voice = e.compute(&ConsumptionInput {
            advisor_avg_minutes: 6.0,
            ..sample()
        });
        assert!(more_chat.chat > before.chat);
        assert!(more_voice.advisor > before.advisor);
        assert_eq!(more_voice.callbot, before.callbot);
    }

    #[test]
    fn quote_converts_with_own_rate() {
        let input = ConsumptionInput {
            exchange_rate: 1000.0,
            ..sample()
        };
        let mut combined = CombinedTotal::default();
        let b = engine().quote(&input, &mut combined);
        assert!((combined.totals[&EngineKind::Consumption] - b.grand_total * 1000.0).abs() < 1e-6);
    }

    #[test]
    fn compute_is_idempotent() {
        let e = engine();
        assert_eq!(e.compute(&sample()), e.compute(&sample()));
    }
}

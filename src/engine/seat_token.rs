//! Seat subscription + token + STT billing.
//!
//! Seats buy a plan tier that includes free STT minutes and free AI tokens.
//! Usage above the free allowance is billed per unit; free tokens left unused
//! are credited back against the total.

use serde::{Deserialize, Serialize};

use super::{EngineKind, LineItem, PricingEngine};
use crate::input::{non_negative, percent, ParameterBundle};
use crate::rates::{
    PlanCatalog, PlanTier, RateCard, SeatTokenRates, ADDON_STT_MINUTES_PER_PACK,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeatTokenInput {
    pub plan: PlanTier,
    pub seats: f64,
    /// Replaces the plan's seat price when set.
    pub seat_price_override: Option<f64>,
    /// Replaces the plan's free tokens per seat when set.
    pub free_tokens_per_seat_override: Option<f64>,
    pub addon_packs: f64,

    pub chatbot_channels: f64,
    pub chatbot_sessions_per_day: f64,
    pub chatbot_business_days: f64,

    pub callbot_channels: f64,
    pub callbot_calls_per_day: f64,
    pub callbot_avg_call_minutes: f64,
    pub callbot_business_days: f64,

    pub advisor_calls_per_day: f64,
    pub advisor_avg_call_minutes: f64,
    pub advisor_business_days: f64,
    /// Monthly tokens per advisor; total usage is this times `seats`.
    pub advisor_tokens_per_agent: f64,

    pub discount_percent: f64,
    /// KRW per USD.
    pub exchange_rate: f64,
}

impl Default for SeatTokenInput {
    fn default() -> Self {
        Self {
            plan: PlanTier::CX4,
            seats: 100.0,
            seat_price_override: None,
            free_tokens_per_seat_override: None,
            addon_packs: 0.0,
            chatbot_channels: 0.0,
            chatbot_sessions_per_day: 0.0,
            chatbot_business_days: 22.0,
            callbot_channels: 0.0,
            callbot_calls_per_day: 0.0,
            callbot_avg_call_minutes: 0.0,
            callbot_business_days: 22.0,
            advisor_calls_per_day: 100.0,
            advisor_avg_call_minutes: 3.0,
            advisor_business_days: 22.0,
            advisor_tokens_per_agent: 0.0,
            discount_percent: 0.0,
            exchange_rate: 1370.0,
        }
    }
}

impl ParameterBundle for SeatTokenInput {
    const KEY: &'static str = "seat-token";

    fn sanitized(&self) -> Self {
        Self {
            plan: self.plan,
            seats: non_negative(self.seats),
            seat_price_override: self.seat_price_override.map(non_negative),
            free_tokens_per_seat_override: self.free_tokens_per_seat_override.map(non_negative),
            addon_packs: non_negative(self.addon_packs),
            chatbot_channels: non_negative(self.chatbot_channels),
            chatbot_sessions_per_day: non_negative(self.chatbot_sessions_per_day),
            chatbot_business_days: non_negative(self.chatbot_business_days),
            callbot_channels: non_negative(self.callbot_channels),
            callbot_calls_per_day: non_negative(self.callbot_calls_per_day),
            callbot_avg_call_minutes: non_negative(self.callbot_avg_call_minutes),
            callbot_business_days: non_negative(self.callbot_business_days),
            advisor_calls_per_day: non_negative(self.advisor_calls_per_day),
            advisor_avg_call_minutes: non_negative(self.advisor_avg_call_minutes),
            advisor_business_days: non_negative(self.advisor_business_days),
            advisor_tokens_per_agent: non_negative(self.advisor_tokens_per_agent),
            discount_percent: percent(self.discount_percent),
            exchange_rate: non_negative(self.exchange_rate),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeatTokenBreakdown {
    pub seat_price: f64,
    pub subscription: f64,

    pub chatbot_sessions: f64,
    pub chatbot: f64,

    pub callbot_minutes: f64,
    pub callbot: f64,

    pub stt_minutes: f64,
    pub free_stt_minutes: f64,
    pub billable_stt_minutes: f64,
    pub stt: f64,

    pub used_tokens: f64,
    pub free_tokens: f64,
    pub billable_tokens: f64,
    pub token: f64,
    pub unused_free_tokens: f64,
    pub unused_token_credit: f64,

    /// STT plus token charges.
    pub advisor_usage: f64,
    pub pre_discount_total: f64,
    pub discount_percent: f64,
    pub discount_amount: f64,
    pub grand_total: f64,
    /// Same as `grand_total` with the subscription left out.
    pub no_subscription_total: f64,
}

pub struct SeatTokenEngine {
    rates: SeatTokenRates,
    plans: PlanCatalog,
}

impl SeatTokenEngine {
    pub fn new(card: &RateCard) -> Self {
        Self {
            rates: card.seat_token.clone(),
            plans: card.plans.clone(),
        }
    }
}

fn discounted(amount: f64, discount_percent: f64) -> f64 {
    (amount * (1.0 - discount_percent / 100.0)).max(0.0)
}

impl PricingEngine for SeatTokenEngine {
    type Input = SeatTokenInput;
    type Breakdown = SeatTokenBreakdown;

    const KIND: EngineKind = EngineKind::SeatToken;

    fn compute(&self, input: &SeatTokenInput) -> SeatTokenBreakdown {
        let i = input.sanitized();
        let r = &self.rates;
        let terms = self.plans.terms(i.plan);

        let seat_price = i.seat_price_override.unwrap_or(terms.seat_price);
        let free_tokens_per_seat = i
            .free_tokens_per_seat_override
            .unwrap_or(terms.free_tokens_per_seat);

        let subscription = i.seats * seat_price;

        let chatbot_sessions =
            i.chatbot_channels * i.chatbot_sessions_per_day * i.chatbot_business_days;
        let chatbot = chatbot_sessions * r.chatbot_per_session;

        let callbot_minutes = i.callbot_channels
            * i.callbot_calls_per_day
            * i.callbot_avg_call_minutes
            * i.callbot_business_days;
        let callbot = callbot_minutes * r.callbot_per_minute;

        let stt_minutes = i.seats
            * i.advisor_calls_per_day
            * i.advisor_avg_call_minutes
            * i.advisor_business_days;
        let free_stt_minutes = i.seats * terms.free_stt_minutes_per_seat
            + i.addon_packs * ADDON_STT_MINUTES_PER_PACK;
        let billable_stt_minutes = (stt_minutes - free_stt_minutes).max(0.0);
        let stt = billable_stt_minutes * r.advisor_stt_per_minute;

        let used_tokens = i.seats * i.advisor_tokens_per_agent;
        let free_tokens = i.seats * free_tokens_per_seat;
        let billable_tokens = (used_tokens - free_tokens).max(0.0);
        let token = billable_tokens * r.advisor_token_each;

        let unused_free_tokens = (free_tokens - used_tokens).max(0.0);
        let unused_token_credit = unused_free_tokens * r.advisor_token_each;

        let advisor_usage = stt + token;
        let usage = chatbot + callbot + advisor_usage;

        let pre_discount_total = (subscription + usage - unused_token_credit).max(0.0);
        let grand_total = discounted(pre_discount_total, i.discount_percent);
        let no_subscription_total =
            discounted((usage - unused_token_credit).max(0.0), i.discount_percent);

        SeatTokenBreakdown {
            seat_price,
            subscription,
            chatbot_sessions,
            chatbot,
            callbot_minutes,
            callbot,
            stt_minutes,
            free_stt_minutes,
            billable_stt_minutes,
            stt,
            used_tokens,
            free_tokens,
            billable_tokens,
            token,
            unused_free_tokens,
            unused_token_credit,
            advisor_usage,
            pre_discount_total,
            discount_percent: i.discount_percent,
            discount_amount: pre_discount_total - grand_total,
            grand_total,
            no_subscription_total,
        }
    }

    fn grand_total(breakdown: &SeatTokenBreakdown) -> f64 {
        breakdown.grand_total
    }

    fn krw_rate(input: &SeatTokenInput) -> f64 {
        input.exchange_rate
    }

    fn line_items(&self, b: &SeatTokenBreakdown) -> Vec<LineItem> {
        vec![
            LineItem::money("Seat price", b.seat_price),
            LineItem::money("Subscription", b.subscription),
            LineItem::count("Chatbot sessions", b.chatbot_sessions),
            LineItem::money("Chatbot", b.chatbot),
            LineItem::count("Callbot minutes", b.callbot_minutes),
            LineItem::money("Callbot", b.callbot),
            LineItem::count("Advisor STT minutes", b.stt_minutes),
            LineItem::count("Free STT minutes", b.free_stt_minutes),
            LineItem::count("Billable STT minutes", b.billable_stt_minutes),
            LineItem::money("STT", b.stt),
            LineItem::count("Tokens used", b.used_tokens),
            LineItem::count("Free tokens", b.free_tokens),
            LineItem::count("Billable tokens", b.billable_tokens),
            LineItem::money("Tokens", b.token),
            LineItem::money("Advisor usage (STT + tokens)", b.advisor_usage),
            LineItem::count("Unused free tokens", b.unused_free_tokens),
            LineItem::money("Unused token credit", -b.unused_token_credit),
            LineItem::money("Total before discount", b.pre_discount_total),
            LineItem::percent("Discount", b.discount_percent),
            LineItem::money("Discount amount", -b.discount_amount),
            LineItem::money("Total without subscription", b.no_subscription_total),
            LineItem::money("Grand total", b.grand_total),
        ]
    }
}

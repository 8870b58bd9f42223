//! Per-unit licences in KRW with tiered discounts and a margin on top.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{EngineKind, LineItem, PricingEngine};
use crate::discount::{Category, DiscountSpec};
use crate::input::{assign_field, non_negative, percent, ParameterBundle};
use crate::rates::{RateCard, TieredRates};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TieredInput {
    pub chatbot_channels: f64,
    pub callbot_channels: f64,
    pub advisor_seats: f64,
    pub ta_seats: f64,
    pub qa_seats: f64,
    pub kms_seats: f64,
    pub stt_channels: f64,
    pub tts_channels: f64,

    #[serde(flatten)]
    pub discounts: DiscountSpec,
    /// Last global discount written; already folded into `discounts`.
    pub global_discount: Option<f64>,
    pub margin_percent: f64,
}

impl TieredInput {
    pub fn quantity(&self, category: Category) -> f64 {
        match category {
            Category::Chatbot => self.chatbot_channels,
            Category::Callbot => self.callbot_channels,
            Category::Advisor => self.advisor_seats,
            Category::Ta => self.ta_seats,
            Category::Qa => self.qa_seats,
            Category::Kms => self.kms_seats,
            Category::Stt => self.stt_channels,
            Category::Tts => self.tts_channels,
        }
    }

    /// Set a quantity and re-derive its tier discount.
    pub fn set_quantity(&mut self, category: Category, quantity: f64) {
        let slot = match category {
            Category::Chatbot => &mut self.chatbot_channels,
            Category::Callbot => &mut self.callbot_channels,
            Category::Advisor => &mut self.advisor_seats,
            Category::Ta => &mut self.ta_seats,
            Category::Qa => &mut self.qa_seats,
            Category::Kms => &mut self.kms_seats,
            Category::Stt => &mut self.stt_channels,
            Category::Tts => &mut self.tts_channels,
        };
        *slot = quantity;
        self.discounts.quantity_changed(category, non_negative(quantity));
    }
}

impl ParameterBundle for TieredInput {
    const KEY: &'static str = "tiered";

    fn sanitized(&self) -> Self {
        Self {
            chatbot_channels: non_negative(self.chatbot_channels),
            callbot_channels: non_negative(self.callbot_channels),
            advisor_seats: non_negative(self.advisor_seats),
            ta_seats: non_negative(self.ta_seats),
            qa_seats: non_negative(self.qa_seats),
            kms_seats: non_negative(self.kms_seats),
            stt_channels: non_negative(self.stt_channels),
            tts_channels: non_negative(self.tts_channels),
            discounts: self.discounts.clamped(),
            global_discount: self.global_discount.map(percent),
            margin_percent: non_negative(self.margin_percent),
        }
    }

    /// Quantity edits re-derive the category's tier discount; a global
    /// discount edit overwrites every category; a category discount edit
    /// overwrites that category.
    fn assign(&mut self, field: &str, raw: &str) -> Result<()> {
        assign_field(self, field, raw)?;

        if let Some(category) = Category::from_quantity_field(field) {
            self.set_quantity(category, self.quantity(category));
        } else if let Some(category) = Category::from_discount_field(field) {
            let pct = self.discounts.get(category);
            self.discounts.set(category, pct);
        } else if field == "global_discount" {
            if let Some(pct) = self.global_discount {
                self.discounts.set_global(pct);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryCost {
    pub category: Category,
    pub quantity: f64,
    pub unit_price: f64,
    pub discount_percent: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TieredBreakdown {
    pub categories: Vec<CategoryCost>,
    /// Sum of quantity × unit price before any discount.
    pub list_total: f64,
    pub subtotal: f64,
    pub margin_percent: f64,
    pub margin_amount: f64,
    pub grand_total: f64,
}

pub struct TieredEngine {
    rates: TieredRates,
}

impl TieredEngine {
    pub fn new(card: &RateCard) -> Self {
        Self {
            rates: card.tiered.clone(),
        }
    }

    fn unit_price(&self, category: Category) -> f64 {
        let r = &self.rates;
        match category {
            Category::Chatbot => r.chatbot_channel,
            Category::Callbot => r.callbot_channel,
            Category::Advisor => r.advisor_seat,
            Category::Ta => r.ta_seat,
            Category::Qa => r.qa_seat,
            Category::Kms => r.kms_seat,
            Category::Stt => r.stt_channel,
            Category::Tts => r.tts_channel,
        }
    }
}

impl PricingEngine for TieredEngine {
    type Input = TieredInput;
    type Breakdown = TieredBreakdown;

    const KIND: EngineKind = EngineKind::Tiered;

    fn compute(&self, input: &TieredInput) -> TieredBreakdown {
        let i = input.sanitized();

        let categories: Vec<CategoryCost> = Category::ALL
            .into_iter()
            .map(|category| {
                let quantity = i.quantity(category);
                let unit_price = self.unit_price(category);
                let discount_percent = i.discounts.get(category);
                CategoryCost {
                    category,
                    quantity,
                    unit_price,
                    discount_percent,
                    cost: quantity * unit_price * (1.0 - discount_percent / 100.0),
                }
            })
            .collect();

        let list_total = categories.iter().map(|c| c.quantity * c.unit_price).sum::<f64>();
        let subtotal = categories.iter().map(|c| c.cost).sum::<f64>().max(0.0);
        // Margin is applied to the already-discounted subtotal.
        let margin_amount = (subtotal * i.margin_percent / 100.0).round();

        TieredBreakdown {
            categories,
            list_total,
            subtotal,
            margin_percent: i.margin_percent,
            margin_amount,
            grand_total: subtotal + margin_amount,
        }
    }

    fn grand_total(breakdown: &TieredBreakdown) -> f64 {
        breakdown.grand_total
    }

    fn krw_rate(_input: &TieredInput) -> f64 {
        1.0
    }

    fn line_items(&self, b: &TieredBreakdown) -> Vec<LineItem> {
        let mut lines = Vec::with_capacity(b.categories.len() * 2 + 5);
        for c in &b.categories {
            lines.push(LineItem::money(c.category.label(), c.cost));
            lines.push(LineItem::percent(c.category.discount_label(), c.discount_percent));
        }
        lines.push(LineItem::money("List total", b.list_total));
        lines.push(LineItem::money("Subtotal (discounted)", b.subtotal));
        lines.push(LineItem::percent("Margin", b.margin_percent));
        lines.push(LineItem::money("Margin amount", b.margin_amount));
        lines.push(LineItem::money("Grand total", b.grand_total));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::CombinedTotal;

    fn engine() -> TieredEngine {
        TieredEngine::new(&RateCard::default())
    }

    fn cost_of(b: &TieredBreakdown, category: Category) -> f64 {
        b.categories
            .iter()
            .find(|c| c.category == category)
            .map(|c| c.cost)
            .unwrap()
    }

    #[test]
    fn empty_quote_is_zero() {
        let b = engine().compute(&TieredInput::default());
        assert_eq!(b.categories.len(), 8);
        assert_eq!(b.grand_total, 0.0);
    }

    #[test]
    fn per_category_discount_applies() {
        let input = TieredInput {
            advisor_seats: 10.0,
            discounts: DiscountSpec {
                advisor: 10.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let b = engine().compute(&input);
        assert_eq!(cost_of(&b, Category::Advisor), 1_350_000.0);
        assert_eq!(b.list_total, 1_500_000.0);
        assert_eq!(b.subtotal, 1_350_000.0);
    }

    #[test]
    fn margin_is_added_after_discount() {
        let mut card = RateCard::default();
        card.tiered.tts_channel = 125.0;
        let input = TieredInput {
            tts_channels: 10.0,
            discounts: DiscountSpec {
                tts: 20.0,
                ..Default::default()
            },
            margin_percent: 40.0,
            ..Default::default()
        };
        let b = TieredEngine::new(&card).compute(&input);
        assert_eq!(b.list_total, 1250.0);
        assert_eq!(b.subtotal, 1000.0);
        assert_eq!(b.margin_amount, 400.0);
        assert_eq!(b.grand_total, 1400.0);
    }

    #[test]
    fn margin_is_rounded_and_unbounded_above() {
        let mut card = RateCard::default();
        card.tiered.qa_seat = 333.0;
        let input = TieredInput {
            qa_seats: 1.0,
            margin_percent: 250.0,
            ..Default::default()
        };
        let b = TieredEngine::new(&card).compute(&input);
        assert_eq!(b.margin_amount, 833.0);
        assert_eq!(b.grand_total, 1166.0);

        let b = TieredEngine::new(&card).compute(&TieredInput {
            margin_percent: -30.0,
            ..input
        });
        assert_eq!(b.margin_percent, 0.0);
        assert_eq!(b.grand_total, 333.0);
    }

    #[test]
    fn out_of_range_discounts_are_clamped() {
        let input = TieredInput {
            stt_channels: 2.0,
            tts_channels: 2.0,
            discounts: DiscountSpec {
                stt: 180.0,
                tts: -20.0,
                ..Default::default()
            },
            ..Default::default()
        };
        let b = engine().compute(&input);
        assert_eq!(cost_of(&b, Category::Stt), 0.0);
        assert_eq!(cost_of(&b, Category::Tts), 160_000.0);
        assert!(b.subtotal <= b.list_total);
    }

    #[test]
    fn quantity_edit_applies_tier_discount() {
        let mut input = TieredInput::default();
        input.assign("advisor_seats", "200").unwrap();
        assert_eq!(input.discounts.advisor, 10.0);

        input.assign("callbot_channels", "600").unwrap();
        assert_eq!(input.discounts.callbot, 0.0);

        input.assign("kms_seats", "49").unwrap();
        assert_eq!(input.discounts.kms, 0.0);
        input.assign("kms_seats", "50").unwrap();
        assert_eq!(input.discounts.kms, 5.0);
    }

    #[test]
    fn edits_resolve_in_order() {
        let mut input = TieredInput::default();
        input.assign("advisor_seats", "400").unwrap();
        input.assign("global_discount", "7").unwrap();
        assert!(Category::ALL.iter().all(|c| input.discounts.get(*c) == 7.0));

        input.assign("qa_discount", "2").unwrap();
        input.assign("chatbot_channels", "60").unwrap();
        assert_eq!(input.discounts.qa, 2.0);
        assert_eq!(input.discounts.chatbot, 5.0);
        assert_eq!(input.discounts.advisor, 7.0);

        input.assign("qa_discount", "140").unwrap();
        assert_eq!(input.discounts.qa, 100.0);
    }

    #[test]
    fn discounts_round_trip_through_flat_json() {
        let mut input = TieredInput::default();
        input.assign("ta_seats", "250").unwrap();
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["ta_discount"], 10.0);
        assert_eq!(json["ta_seats"], 250.0);
        let back: TieredInput = serde_json::from_value(json).unwrap();
        assert_eq!(back, input);
    }

    #[test]
    fn monotonic_in_quantity_at_fixed_discount() {
        let e = engine();
        let base = TieredInput {
            chatbot_channels: 10.0,
            ..Default::default()
        };
        let more = TieredInput {
            chatbot_channels: 11.0,
            ..base.clone()
        };
        assert!(
            cost_of(&e.compute(&more), Category::Chatbot)
                > cost_of(&e.compute(&base), Category::Chatbot)
        );
    }

    #[test]
    fn quote_emits_native_krw() {
        let input = TieredInput {
            kms_seats: 2.0,
            ..Default::default()
        };
        let mut combined = CombinedTotal::default();
        let b = engine().quote(&input, &mut combined);
        assert_eq!(b.grand_total, 100_000.0);
        assert_eq!(combined.totals[&EngineKind::Tiered], 100_000.0);
    }

    #[test]
    fn compute_is_idempotent() {
        let input = TieredInput {
            advisor_seats: 123.0,
            margin_percent: 12.5,
            ..Default::default()
        };
        let e = engine();
        assert_eq!(e.compute(&input), e.compute(&input));
    }
}

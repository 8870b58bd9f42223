pub mod consumption;
pub mod seat_token;
pub mod tiered;

use std::collections::BTreeMap;
use std::fmt::Debug;

use serde::Serialize;

use crate::exchange::Currency;
use crate::input::ParameterBundle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineKind {
    SeatToken,
    Consumption,
    Tiered,
}

impl EngineKind {
    pub fn title(self) -> &'static str {
        match self {
            EngineKind::SeatToken => "Seat + token (SaaS)",
            EngineKind::Consumption => "Consumption (cloud)",
            EngineKind::Tiered => "Tiered + margin (on-premise)",
        }
    }

    pub fn native_currency(self) -> Currency {
        match self {
            EngineKind::SeatToken => Currency::Usd { decimals: 0 },
            EngineKind::Consumption => Currency::Usd { decimals: 3 },
            EngineKind::Tiered => Currency::Krw,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LineKind {
    /// Amount in the engine's native currency.
    Money,
    Count,
    Percent,
}

/// One labelled value of a breakdown, for display.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    pub label: &'static str,
    pub value: f64,
    pub kind: LineKind,
}

impl LineItem {
    pub fn money(label: &'static str, value: f64) -> Self {
        Self {
            label,
            value,
            kind: LineKind::Money,
        }
    }

    pub fn count(label: &'static str, value: f64) -> Self {
        Self {
            label,
            value,
            kind: LineKind::Count,
        }
    }

    pub fn percent(label: &'static str, value: f64) -> Self {
        Self {
            label,
            value,
            kind: LineKind::Percent,
        }
    }
}

/// Receives each engine's grand total, in KRW, whenever it is computed.
pub trait TotalListener {
    fn on_total(&mut self, engine: EngineKind, total_krw: f64);
}

/// A pure pricing model: usage parameters in, cost breakdown out.
pub trait PricingEngine {
    type Input: ParameterBundle;
    type Breakdown: Serialize + Clone + PartialEq + Debug;

    const KIND: EngineKind;

    /// Compute a fresh breakdown. Input is sanitized first, so this is total
    /// over any field values.
    fn compute(&self, input: &Self::Input) -> Self::Breakdown;

    fn grand_total(breakdown: &Self::Breakdown) -> f64;

    /// Multiplier from the native currency to KRW.
    fn krw_rate(input: &Self::Input) -> f64;

    fn line_items(&self, breakdown: &Self::Breakdown) -> Vec<LineItem>;

    /// Line items that are currency amounts.
    fn display_totals(&self, breakdown: &Self::Breakdown) -> Vec<LineItem> {
        self.line_items(breakdown)
            .into_iter()
            .filter(|l| l.kind == LineKind::Money)
            .collect()
    }

    /// Compute and report the grand total to `listener`.
    fn quote(&self, input: &Self::Input, listener: &mut dyn TotalListener) -> Self::Breakdown {
        let breakdown = self.compute(input);
        let total = Self::grand_total(&breakdown);
        let krw = total * Self::krw_rate(&input.sanitized());
        tracing::debug!(engine = ?Self::KIND, total, krw, "computed quote");
        listener.on_total(Self::KIND, krw);
        breakdown
    }
}

/// Latest KRW grand total per engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CombinedTotal {
    pub totals: BTreeMap<EngineKind, f64>,
}

impl CombinedTotal {
    pub fn sum(&self) -> f64 {
        self.totals.values().sum()
    }
}

impl TotalListener for CombinedTotal {
    fn on_total(&mut self, engine: EngineKind, total_krw: f64) {
        self.totals.insert(engine, total_krw);
    }
}

//! Loading, quoting and saving every engine's parameters together.

use serde::Serialize;

use crate::cli::OutputFormat;
use crate::engine::consumption::{ConsumptionBreakdown, ConsumptionEngine, ConsumptionInput};
use crate::engine::seat_token::{SeatTokenBreakdown, SeatTokenEngine, SeatTokenInput};
use crate::engine::tiered::{TieredBreakdown, TieredEngine, TieredInput};
use crate::engine::{CombinedTotal, PricingEngine};
use crate::input::ParameterBundle;
use crate::linkage::{Bundles, SharedUsage};
use crate::output;
use crate::rates::RateCard;
use crate::storage::{self, KeyValueStore};

/// Saved defaults of every engine. Each is merged over the built-in
/// defaults with the saved shared quantities already pushed in, so fields
/// an engine bundle never saved still follow the linkage.
pub fn load_bundles(store: &dyn KeyValueStore) -> Bundles {
    let mut seeded = Bundles::default();
    seeded.broadcast(&load_shared(store));

    Bundles {
        seat_token: storage::load(store, SeatTokenInput::KEY, seeded.seat_token),
        consumption: storage::load(store, ConsumptionInput::KEY, seeded.consumption),
        tiered: storage::load(store, TieredInput::KEY, seeded.tiered),
    }
}

pub fn load_shared(store: &dyn KeyValueStore) -> SharedUsage {
    storage::load(store, SharedUsage::KEY, SharedUsage::default())
}

/// Save one bundle and tell the user where it went.
pub fn save_bundle<T: ParameterBundle>(store: &mut dyn KeyValueStore, value: &T) -> bool {
    let saved = storage::save(store, T::KEY, value);
    if saved {
        match store.location() {
            Some(dir) => eprintln!("Saved {} defaults to {}", T::KEY, dir.display()),
            None => eprintln!("Saved {} defaults for this session", T::KEY),
        }
    }
    saved
}

/// Persist shared quantity changes and the bundles they were pushed into.
pub fn save_shared(store: &mut dyn KeyValueStore, changes: &SharedUsage, bundles: &Bundles) {
    let mut stored = load_shared(store);
    stored.merge(&changes.sanitized());
    save_bundle(store, &stored);
    save_bundle(store, &bundles.seat_token);
    save_bundle(store, &bundles.consumption);
    save_bundle(store, &bundles.tiered);
}

pub struct Engines {
    pub seat_token: SeatTokenEngine,
    pub consumption: ConsumptionEngine,
    pub tiered: TieredEngine,
}

impl Engines {
    pub fn new(card: &RateCard) -> Self {
        Self {
            seat_token: SeatTokenEngine::new(card),
            consumption: ConsumptionEngine::new(card),
            tiered: TieredEngine::new(card),
        }
    }

    /// Quote every engine, collecting their KRW totals.
    pub fn quote_all(&self, bundles: &Bundles) -> AllReport {
        let mut combined = CombinedTotal::default();
        let seat_token = self.seat_token.quote(&bundles.seat_token, &mut combined);
        let consumption = self.consumption.quote(&bundles.consumption, &mut combined);
        let tiered = self.tiered.quote(&bundles.tiered, &mut combined);
        AllReport {
            total_krw: combined.sum(),
            inputs: bundles.clone(),
            seat_token,
            consumption,
            tiered,
            combined,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllReport {
    pub inputs: Bundles,
    pub seat_token: SeatTokenBreakdown,
    pub consumption: ConsumptionBreakdown,
    pub tiered: TieredBreakdown,
    pub combined: CombinedTotal,
    pub total_krw: f64,
}

pub fn print_all(engines: &Engines, report: &AllReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => output::print_json(report),
        OutputFormat::Table => {
            let inputs = &report.inputs;
            output::print_breakdown(
                &engines.seat_token,
                &report.seat_token,
                SeatTokenEngine::krw_rate(&inputs.seat_token.sanitized()),
            );
            output::print_breakdown(
                &engines.consumption,
                &report.consumption,
                ConsumptionEngine::krw_rate(&inputs.consumption.sanitized()),
            );
            output::print_breakdown(&engines.tiered, &report.tiered, 1.0);
            output::print_combined(&report.combined);
        }
    }
}

use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, CellAlignment, ContentArrangement, Table};
use serde::Serialize;

use crate::engine::{CombinedTotal, LineItem, LineKind, PricingEngine};
use crate::exchange::{format_count, format_krw, to_krw, Currency};
use crate::rates::{PlanCatalog, PlanTier};

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn amount_cell(text: String) -> Cell {
    Cell::new(text).set_alignment(CellAlignment::Right)
}

fn value_text(line: &LineItem, currency: Currency) -> String {
    match line.kind {
        LineKind::Money => currency.format(line.value),
        LineKind::Count => format_count(line.value),
        LineKind::Percent => format!("{}%", format_count(line.value)),
    }
}

/// One engine's breakdown. Money lines get a KRW column unless the engine
/// already prices in KRW.
pub fn breakdown_table<E: PricingEngine>(
    engine: &E,
    breakdown: &E::Breakdown,
    krw_rate: f64,
) -> Table {
    let currency = E::KIND.native_currency();
    let show_krw = currency != Currency::Krw;

    let mut table = new_table();
    let mut header = vec![Cell::new("Item"), Cell::new(currency.code())];
    if show_krw {
        header.push(Cell::new("KRW"));
    }
    table.set_header(header);

    for line in engine.line_items(breakdown) {
        let mut row = vec![Cell::new(line.label), amount_cell(value_text(&line, currency))];
        if show_krw {
            let krw = match line.kind {
                LineKind::Money => format_krw(to_krw(line.value, krw_rate)),
                _ => String::new(),
            };
            row.push(amount_cell(krw));
        }
        table.add_row(row);
    }
    table
}

pub fn print_breakdown<E: PricingEngine>(engine: &E, breakdown: &E::Breakdown, krw_rate: f64) {
    println!("{}", E::KIND.title());
    println!("{}", breakdown_table(engine, breakdown, krw_rate));
}

pub fn combined_table(combined: &CombinedTotal) -> Table {
    let mut table = new_table();
    table.set_header(vec![Cell::new("Model"), Cell::new("Monthly total (KRW)")]);
    for (kind, total) in &combined.totals {
        table.add_row(vec![Cell::new(kind.title()), amount_cell(format_krw(*total))]);
    }
    table.add_row(vec![
        Cell::new("TOTAL"),
        amount_cell(format_krw(combined.sum())),
    ]);
    table
}

pub fn print_combined(combined: &CombinedTotal) {
    println!("Combined");
    println!("{}", combined_table(combined));
}

pub fn plans_table(catalog: &PlanCatalog) -> Table {
    let mut table = new_table();
    table.set_header(vec![
        Cell::new("Plan"),
        Cell::new("USD / seat / month"),
        Cell::new("Free STT minutes / seat"),
        Cell::new("Free tokens / seat"),
    ]);
    for tier in PlanTier::ALL {
        let terms = catalog.terms(tier);
        table.add_row(vec![
            Cell::new(tier.to_string()),
            amount_cell(Currency::Usd { decimals: 0 }.format(terms.seat_price)),
            amount_cell(format_count(terms.free_stt_minutes_per_seat)),
            amount_cell(format_count(terms.free_tokens_per_seat)),
        ]);
    }
    table
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("JSON serialization failed")
    );
}

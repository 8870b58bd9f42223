mod cli;
mod config;
mod discount;
mod engine;
mod exchange;
mod input;
mod linkage;
mod output;
mod rates;
mod report;
mod storage;
mod watch;

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{BundleName, Cli, Command, DefaultsAction, EditArgs, OutputFormat};
use engine::consumption::{ConsumptionEngine, ConsumptionInput};
use engine::seat_token::{SeatTokenEngine, SeatTokenInput};
use engine::tiered::{TieredEngine, TieredInput};
use engine::{CombinedTotal, PricingEngine};
use input::{parse_assignment, ParameterBundle};
use linkage::{Bundles, SharedUsage};
use storage::KeyValueStore;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

/// Quote a single engine: saved defaults, then shared quantities, then
/// `--set` edits in the order given.
fn quote_one<E, F>(
    engine: &E,
    store: &mut dyn KeyValueStore,
    shared: &SharedUsage,
    args: &EditArgs,
    format: OutputFormat,
    pick: F,
) -> Result<()>
where
    E: PricingEngine,
    F: Fn(&mut Bundles) -> &mut E::Input,
{
    let mut bundles = report::load_bundles(store);
    bundles.broadcast(shared);

    let input = pick(&mut bundles);
    for raw in &args.assignments {
        let (field, value) = parse_assignment(raw)?;
        input
            .assign(&field, &value)
            .with_context(|| format!("--set {raw}"))?;
    }
    let input = input.clone();

    let mut combined = CombinedTotal::default();
    let breakdown = engine.quote(&input, &mut combined);

    match format {
        OutputFormat::Table => {
            output::print_breakdown(engine, &breakdown, E::krw_rate(&input.sanitized()));
        }
        OutputFormat::Json => {
            let totals: serde_json::Map<String, serde_json::Value> = engine
                .display_totals(&breakdown)
                .into_iter()
                .map(|line| (line.label.to_string(), line.value.into()))
                .collect();
            output::print_json(&serde_json::json!({
                "engine": E::KIND,
                "currency": E::KIND.native_currency().code(),
                "input": input,
                "breakdown": breakdown,
                "display_totals": totals,
                "total_krw": combined.sum(),
            }))
        }
    }

    if args.save {
        if shared.is_empty() {
            report::save_bundle(store, &input);
        } else {
            report::save_shared(store, shared, &bundles);
        }
    }
    Ok(())
}

fn quote_all(
    engines: &report::Engines,
    store: &mut dyn KeyValueStore,
    shared: &SharedUsage,
    save: bool,
    format: OutputFormat,
) {
    let mut bundles = report::load_bundles(store);
    bundles.broadcast(shared);

    let report = engines.quote_all(&bundles);
    report::print_all(engines, &report, format);

    if save {
        report::save_shared(store, shared, &bundles);
    }
}

fn show<T: ParameterBundle>(store: &dyn KeyValueStore) {
    output::print_json(&storage::load(store, T::KEY, T::default()));
}

fn reset<T: ParameterBundle>(store: &mut dyn KeyValueStore) {
    match store.remove(T::KEY) {
        Ok(()) => eprintln!("Reset {} defaults", T::KEY),
        Err(e) => tracing::warn!(key = T::KEY, error = %e, "failed to reset bundle"),
    }
}

fn fields<T: ParameterBundle>() {
    let mut names = T::field_names();
    names.sort();
    for name in names {
        println!("{name}");
    }
}

fn defaults(store: &mut dyn KeyValueStore, action: &DefaultsAction) {
    match *action {
        DefaultsAction::Show { bundle } => match bundle {
            BundleName::Linkage => show::<SharedUsage>(store),
            BundleName::SeatToken => show::<SeatTokenInput>(store),
            BundleName::Consumption => show::<ConsumptionInput>(store),
            BundleName::Tiered => show::<TieredInput>(store),
        },
        DefaultsAction::Reset { bundle } => match bundle {
            BundleName::Linkage => reset::<SharedUsage>(store),
            BundleName::SeatToken => reset::<SeatTokenInput>(store),
            BundleName::Consumption => reset::<ConsumptionInput>(store),
            BundleName::Tiered => reset::<TieredInput>(store),
        },
        DefaultsAction::Fields { bundle } => match bundle {
            BundleName::Linkage => fields::<SharedUsage>(),
            BundleName::SeatToken => fields::<SeatTokenInput>(),
            BundleName::Consumption => fields::<ConsumptionInput>(),
            BundleName::Tiered => fields::<TieredInput>(),
        },
    }
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = config::load_config();
    let card = config.rate_card();
    let format = cli.format.or(config.format).unwrap_or(OutputFormat::Table);

    let mut store = storage::default_store(cli.store_dir.clone().or(config.store_dir));
    let shared = cli.shared_usage();

    match &cli.command {
        Command::SeatToken(args) => quote_one(
            &SeatTokenEngine::new(&card),
            store.as_mut(),
            &shared,
            args,
            format,
            |b| &mut b.seat_token,
        )?,
        Command::Consumption(args) => quote_one(
            &ConsumptionEngine::new(&card),
            store.as_mut(),
            &shared,
            args,
            format,
            |b| &mut b.consumption,
        )?,
        Command::Tiered(args) => quote_one(
            &TieredEngine::new(&card),
            store.as_mut(),
            &shared,
            args,
            format,
            |b| &mut b.tiered,
        )?,
        Command::All { save } => quote_all(
            &report::Engines::new(&card),
            store.as_mut(),
            &shared,
            *save,
            format,
        ),
        Command::Plans => match format {
            OutputFormat::Table => println!("{}", output::plans_table(&card.plans)),
            OutputFormat::Json => output::print_json(&card.plans),
        },
        Command::Defaults { action } => defaults(store.as_mut(), action),
        Command::Watch { interval } => {
            watch::run(store.as_ref(), format, Duration::from_secs(*interval))?
        }
    }

    Ok(())
}

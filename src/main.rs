//! vmcharge - Compute billing charges for cloud instances from their action history

use clap::Parser;
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vmcharge::{
    InstanceBiller,
    cli::{Cli, Command},
};
use vmcharge_core::{InstanceId, Result, timezone::DisplayZone};
use vmcharge_pricing::{ChargeCalculator, ChargeTable, Totals};
use vmcharge_provider_json::DataLoader;
use vmcharge_terminal::get_formatter;

fn init_logging(quiet: bool) {
    // The --quiet flag overrides RUST_LOG
    let filter = if quiet {
        tracing_subscriber::EnvFilter::new("warn")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("vmcharge=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Open the instance data directory and build a biller over it
fn open_biller(
    data_dir: Option<&Path>,
    table: ChargeTable,
) -> Result<(Arc<DataLoader>, InstanceBiller)> {
    let loader = Arc::new(match data_dir {
        Some(dir) => DataLoader::with_dir(dir),
        None => DataLoader::new()?,
    });
    info!("Reading instance data from {}", loader.instances_dir().display());

    let biller = InstanceBiller::new(loader.clone(), ChargeCalculator::new(Arc::new(table)));
    Ok((loader, biller))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet);

    if !is_terminal::is_terminal(std::io::stderr()) {
        colored::control::set_override(false);
    }

    let zone = DisplayZone::from_cli(cli.timezone.as_deref(), cli.utc)?;
    info!("Displaying times in {}", zone.name());

    let table = match &cli.rates {
        Some(path) => ChargeTable::from_file(path)?,
        None => ChargeTable::builtin(),
    };
    let formatter = get_formatter(cli.json, zone);

    match cli.command {
        Command::Charge {
            instances,
            all,
            window,
        } => {
            let (start, end) = window.resolve()?;
            let (loader, biller) = open_biller(cli.data_dir.as_deref(), table)?;
            let ids = if all {
                loader.list_instances()?
            } else {
                instances.into_iter().map(InstanceId::new).collect()
            };
            info!(
                "Billing {} instances from {} to {}",
                ids.len(),
                start.to_rfc3339(),
                end.to_rfc3339()
            );

            let (charges, failures) = biller.charge_many(&ids, start, end);
            let totals = Totals::from_charges(&charges)?;
            println!("{}", formatter.format_charges(&charges, &totals, &failures));

            if !failures.is_empty() {
                eprintln!(
                    "{} {} of {} instances could not be billed",
                    "error:".red().bold(),
                    failures.len(),
                    ids.len()
                );
                std::process::exit(1);
            }
        }
        Command::Intervals { instance, window } => {
            let (start, end) = window.resolve()?;
            let (_, biller) = open_biller(cli.data_dir.as_deref(), table)?;
            let charge = biller.charge_instance(&InstanceId::new(instance), start, end)?;
            println!("{}", formatter.format_intervals(&charge));
        }
        Command::Rates => {
            println!("{}", formatter.format_rates(&table));
        }
    }

    Ok(())
}

use anyhow::Result;
use clap::Parser;
use handover_common::Variant;
use handover_controller::{Config, Scenario, TerminalRegistry};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "handover-controller")]
#[command(about = "Fuzzy-logic LTE handover controller", long_about = None)]
struct Args {
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Scenario of timed measurement events to replay
    #[arg(short, long)]
    scenario: Option<String>,

    #[arg(short, long)]
    verbose: bool,

    /// Override the configured fuzzy variant (type1 | type2)
    #[arg(long, value_parser = parse_variant)]
    variant: Option<Variant>,

    /// Fixed predictor seed for reproducible runs
    #[arg(long)]
    seed: Option<u64>,

    /// Write the effective configuration to this path and exit
    #[arg(long)]
    write_config: Option<String>,
}

fn parse_variant(s: &str) -> Result<Variant, String> {
    match s.to_ascii_lowercase().as_str() {
        "type1" | "type-1" | "t1" => Ok(Variant::Type1),
        "type2" | "type-2" | "t2" => Ok(Variant::Type2),
        other => Err(format!("unknown variant '{}', expected type1 or type2", other)),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = if args.verbose {
        "handover_controller=trace,handover_common=debug"
    } else {
        "handover_controller=info,handover_common=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!("╔════════════════════════════════════════╗");
    info!("║   Handover Controller v0.1.0           ║");
    info!("╚════════════════════════════════════════╝");

    let mut config = Config::load(&args.config).unwrap_or_else(|e| {
        warn!("Config not loaded ({:#}), using defaults", e);
        Config::default()
    });
    if let Some(variant) = args.variant {
        config.variant = variant;
    }
    if let Some(seed) = args.seed {
        config.predictor_seed = Some(seed);
    }
    config.validate()?;

    if let Some(path) = &args.write_config {
        config.save(path)?;
        info!("Configuration written to {}", path);
        return Ok(());
    }

    let registry = TerminalRegistry::new(&config);
    let calibration = registry.orchestrator_config();
    info!("Variant: {}", config.variant);
    info!(
        "Trigger: {:?} {} | staleness window {:.2}s | retention {}",
        calibration.policy.comparison,
        calibration.policy.threshold,
        calibration.staleness_window,
        calibration.retention
    );
    for request in registry.report_config().requests() {
        info!(
            "Report config: measId {} event {:?} RSRQ threshold {} every {} ms",
            request.meas_id, request.event, request.rsrq_threshold, request.interval_ms
        );
    }

    let Some(path) = &args.scenario else {
        info!("No scenario given, nothing to replay");
        return Ok(());
    };

    let scenario = Scenario::load(path)?;
    info!("Replaying {} events from {}", scenario.events.len(), path);

    let issued = scenario.replay(&registry);
    for entry in &issued {
        println!("{:>8.3}s  handover {}", entry.time, entry.command);
    }

    registry.metrics().get_stats().print_summary();

    Ok(())
}

use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use cogscreen_app::{parse_override, render, run_offline, run_realtime, write_json, AppConfig};
use cogscreen_core::{SettingOverride, TestVariant};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "cogscreen",
    version,
    about = "Timed cognitive screening runs (CPT, TMT, Digit Span)"
)]
struct Cli {
    /// TOML run configuration
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Test to run, overriding the file
    #[arg(long, value_enum)]
    variant: Option<VariantArg>,

    /// Run against the wall clock instead of a virtual one
    #[arg(long)]
    realtime: bool,

    /// Seed for stimulus selection and the simulated participant
    #[arg(long)]
    seed: Option<u64>,

    /// Write the JSON summary here
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Setting override, applied after the file's (e.g. --set targetProbability=0.5)
    #[arg(long = "set", value_name = "LABEL=VALUE", value_parser = parse_set)]
    overrides: Vec<SettingOverride>,

    /// Print the resolved test configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum VariantArg {
    Cpt,
    Tmt,
    DigitSpan,
}

impl From<VariantArg> for TestVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Cpt => TestVariant::Cpt,
            VariantArg::Tmt => TestVariant::Tmt,
            VariantArg::DigitSpan => TestVariant::DigitSpan,
        }
    }
}

fn parse_set(arg: &str) -> Result<SettingOverride, String> {
    parse_override(arg).map_err(|e| e.to_string())
}

fn run(cli: Cli) -> Result<()> {
    let mut app = match &cli.config {
        Some(path) => AppConfig::load_from(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => AppConfig::default(),
    };
    if let Some(variant) = cli.variant {
        app.run.variant = variant.into();
    }
    app.run.realtime |= cli.realtime;
    if cli.seed.is_some() {
        app.run.seed = cli.seed;
    }
    if cli.output.is_some() {
        app.run.output = cli.output;
    }

    let mut overrides = app.setting_overrides();
    overrides.extend(cli.overrides);
    let config = cogscreen_engine::resolve(app.run.variant, &overrides);

    if cli.print_config {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let seed = app.run.seed.unwrap_or_else(rand::random);
    info!(
        "running {} with seed {} ({})",
        app.run.variant.name(),
        seed,
        if app.run.realtime { "real time" } else { "offline" }
    );

    let report = if app.run.realtime {
        run_realtime(config, seed)
    } else {
        run_offline(config, seed)
    };

    print!("{}", render(&report.summary));
    if let Some(stats) = &report.jitter {
        println!(
            "Poll loop: {:.1} Hz, jitter {:.3} ms over {} samples",
            stats.effective_hz,
            stats.jitter_ns / 1_000_000.0,
            stats.samples
        );
    }
    if let Some(path) = &app.run.output {
        write_json(path, &report.summary)?;
        println!("Results written to {}", path.display());
    }
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("cogscreen=info")),
        )
        .init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}

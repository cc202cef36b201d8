mod logging;
mod output;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use fever_dose_core::{
    Config, Formulary, FormularyError, Market, RawDosageInput, WeightChart,
};

#[derive(Parser)]
#[command(name = "fever-dose")]
#[command(about = "Pediatric fever medicine dosage calculator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Formulary JSON file (defaults to the bundled formulary)
    #[arg(long, global = true)]
    formulary: Option<PathBuf>,

    /// Configuration TOML file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate doses for every product
    Calc {
        /// Body weight in kg
        #[arg(long)]
        weight: f64,

        /// Age, in --unit
        #[arg(long)]
        age: f64,

        /// Age unit (months, years)
        #[arg(long, default_value = "months")]
        unit: String,

        /// Only products sold in this market (ko, en)
        #[arg(long)]
        market: Option<String>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate a formulary file
    Validate {
        /// Formulary JSON file
        path: PathBuf,
    },

    /// Print the dose chart across the weight grid
    Chart {
        /// Only products sold in this market (ko, en)
        #[arg(long)]
        market: Option<String>,

        /// Override the chart age in months
        #[arg(long)]
        age_months: Option<u32>,

        /// Print the chart as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_with_level(if cli.verbose { "debug" } else { "warn" });

    let config = Config::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Calc {
            weight,
            age,
            unit,
            market,
            json,
        } => {
            let formulary = load_formulary(cli.formulary.as_deref())?;
            cmd_calc(&config, &formulary, weight, age, unit, market, json)
        }
        Commands::Validate { path } => cmd_validate(&path),
        Commands::Chart {
            market,
            age_months,
            json,
        } => {
            let formulary = load_formulary(cli.formulary.as_deref())?;
            cmd_chart(&config, &formulary, market, age_months, json)
        }
    }
}

fn load_formulary(path: Option<&Path>) -> Result<Formulary> {
    match path {
        Some(path) => Formulary::load(path)
            .with_context(|| format!("Failed to load formulary {}", path.display())),
        None => Ok(Formulary::bundled()?.clone()),
    }
}

fn parse_market(market: Option<String>) -> Result<Option<Market>> {
    Ok(market.map(|m| m.parse::<Market>()).transpose()?)
}

fn cmd_calc(
    config: &Config,
    formulary: &Formulary,
    weight: f64,
    age: f64,
    unit: String,
    market: Option<String>,
    json: bool,
) -> Result<()> {
    let input = RawDosageInput {
        weight,
        age,
        age_unit: unit,
    }
    .validate(&config.input)?;

    let market = parse_market(market)?;
    let products = match market {
        Some(market) => formulary.for_market(market),
        None => formulary.clone(),
    };

    let results = config.calculator().calculate_all(&input, products.products());
    tracing::debug!(count = results.len(), "calculated dosages");

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print!(
            "{}",
            output::render_results(&results, market.unwrap_or(Market::Ko))
        );
    }
    Ok(())
}

fn cmd_validate(path: &Path) -> Result<()> {
    match Formulary::load(path) {
        Ok(formulary) => {
            println!("{}: {} products, no issues", path.display(), formulary.len());
            Ok(())
        }
        Err(FormularyError::Invalid(issues)) => {
            for issue in &issues {
                eprintln!("  - {}", issue);
            }
            bail!(
                "{}: {} issue(s) found",
                path.display(),
                issues.len()
            );
        }
        Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
    }
}

fn cmd_chart(
    config: &Config,
    formulary: &Formulary,
    market: Option<String>,
    age_months: Option<u32>,
    json: bool,
) -> Result<()> {
    let market = parse_market(market)?;
    let products = match market {
        Some(market) => formulary.for_market(market),
        None => formulary.clone(),
    };

    let mut spec = config.chart;
    if let Some(age_months) = age_months {
        spec.age_months = age_months;
    }

    let chart = WeightChart::build(&config.calculator(), products.products(), &spec);

    if json {
        println!("{}", serde_json::to_string_pretty(&chart)?);
    } else {
        print!(
            "{}",
            output::render_chart(&chart, products.products(), market.unwrap_or(Market::Ko))
        );
    }
    Ok(())
}

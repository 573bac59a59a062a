//! Command-line front end.

use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::{ArgAction, Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use time::Month;
use tracing::{info, warn};

use fba_fee_calculator::domain::{
    category_insights, CalculationError, CalculationOptions, CalculatorSettings, FbaCalculation,
    FeeCalculator, FeeSchedule, PricingInput, ProductDimensions,
};
use fba_fee_calculator::infra::{ScheduleLoadError, ScheduleSource};
use fba_fee_calculator::util::{
    assets,
    persistence::{self, SettingsError},
    version::version_label,
};

#[derive(Parser)]
#[command(name = "fba-calc")]
#[command(about = "Amazon FBA fee and profitability calculator")]
#[command(version = version_label())]
pub struct Cli {
    /// Fee schedule JSON to use instead of the configured or embedded one.
    #[arg(long, global = true)]
    pub schedule: Option<PathBuf>,
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fee breakdown and profit for one product.
    Fees {
        #[arg(long)]
        price: f64,
        #[arg(long)]
        cost: f64,
        #[arg(long)]
        category: String,
        #[command(flatten)]
        dimensions: DimensionArgs,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Storage and fulfillment spend for a month of inventory and sales.
    Monthly {
        #[arg(long)]
        price: f64,
        #[arg(long)]
        category: String,
        #[command(flatten)]
        dimensions: DimensionArgs,
        #[arg(long)]
        inventory: u32,
        #[arg(long)]
        average_sales: f64,
        #[arg(long)]
        month: Option<u8>,
    },
    /// Units needed to recoup fixed costs at 2x-4x product cost.
    BreakEven {
        #[arg(long)]
        cost: f64,
        #[arg(long)]
        category: String,
        #[command(flatten)]
        dimensions: DimensionArgs,
        #[arg(long, default_value_t = 0.0)]
        fixed_costs: f64,
        #[command(flatten)]
        options: OptionArgs,
    },
    /// Return rate, margin and pricing tips for a category.
    Insights {
        #[arg(long)]
        category: String,
    },
    /// Calculate fees for every product in a JSON file.
    Batch {
        #[arg(long)]
        input: PathBuf,
    },
    /// Summary of the active fee schedule.
    Schedule,
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Print the settings file location and its contents.
    Show,
    /// Write default settings.
    Init {
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[derive(Args)]
pub struct DimensionArgs {
    /// Inches.
    #[arg(long)]
    pub length: f64,
    #[arg(long)]
    pub width: f64,
    #[arg(long)]
    pub height: f64,
    /// Pounds.
    #[arg(long)]
    pub weight: f64,
}

impl From<&DimensionArgs> for ProductDimensions {
    fn from(args: &DimensionArgs) -> Self {
        ProductDimensions::new(args.length, args.width, args.height, args.weight)
    }
}

#[derive(Args)]
pub struct OptionArgs {
    /// Calendar month 1-12; defaults to the current month.
    #[arg(long)]
    pub month: Option<u8>,
    #[arg(long, default_value_t = false)]
    pub oversized: bool,
    #[arg(long, default_value_t = false)]
    pub long_term_storage: bool,
    /// Overrides the `include_returns` setting for this call.
    #[arg(long, action = ArgAction::Set)]
    pub include_returns: Option<bool>,
    #[arg(long)]
    pub target_margin: Option<f64>,
}

impl OptionArgs {
    fn resolve(&self, settings: &CalculatorSettings) -> Result<CalculationOptions, AppError> {
        let base = settings.base_options();
        Ok(CalculationOptions {
            month: parse_month(self.month.map(i64::from))?,
            is_oversized: self.oversized,
            long_term_storage: self.long_term_storage,
            include_returns: self.include_returns.unwrap_or(base.include_returns),
            target_margin: self.target_margin.or(base.target_margin),
        })
    }
}

/// One entry of a `batch` input file.
#[derive(Debug, Deserialize)]
struct BatchEntry {
    #[serde(flatten)]
    input: PricingInput,
    #[serde(default)]
    month: Option<i64>,
    #[serde(default)]
    is_oversized: bool,
    #[serde(default)]
    long_term_storage: bool,
    #[serde(default)]
    include_returns: Option<bool>,
}

#[derive(Debug, Serialize)]
struct BatchOutcome {
    index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<FbaCalculation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Schedule(#[from] ScheduleLoadError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Calculation(#[from] CalculationError),
    #[error("invalid month {0}, expected 1-12")]
    InvalidMonth(i64),
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid batch input: {0}")]
    BatchInput(#[source] serde_json::Error),
    #[error("settings already exist at {0} (use --force to overwrite)")]
    SettingsExist(PathBuf),
    #[error("failed to encode output: {0}")]
    Output(#[from] serde_json::Error),
}

impl AppError {
    /// Bad user input exits with 2, everything else with 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Calculation(_) | Self::InvalidMonth(_) | Self::BatchInput(_) => 2,
            _ => 1,
        }
    }
}

pub fn run(cli: Cli) -> Result<(), AppError> {
    let settings = persistence::load_settings().unwrap_or_else(|err| {
        warn!(error = %err, "ignoring unreadable settings");
        CalculatorSettings::default()
    });

    if let Commands::Settings { command } = &cli.command {
        return run_settings(command, &settings);
    }

    let source = schedule_source(cli.schedule.as_deref(), &settings);
    let schedule = source.load()?;
    info!(source = %source, name = %schedule.name, "using fee schedule");
    let calculator = FeeCalculator::new(&schedule);

    match &cli.command {
        Commands::Fees {
            price,
            cost,
            category,
            dimensions,
            options,
        } => {
            let options = options.resolve(&settings)?;
            let dimensions = ProductDimensions::from(dimensions);
            let result =
                calculator.calculate_fees(*price, *cost, category, &dimensions, &options)?;
            print_json(&result)
        }
        Commands::Monthly {
            price,
            category,
            dimensions,
            inventory,
            average_sales,
            month,
        } => {
            let estimate = calculator.estimate_monthly_fees(
                *inventory,
                &ProductDimensions::from(dimensions),
                *average_sales,
                *price,
                category,
                parse_month(month.map(i64::from))?,
            )?;
            print_json(&estimate)
        }
        Commands::BreakEven {
            cost,
            category,
            dimensions,
            fixed_costs,
            options,
        } => {
            let options = options.resolve(&settings)?;
            let analysis = calculator.break_even_analysis(
                *cost,
                category,
                &ProductDimensions::from(dimensions),
                *fixed_costs,
                &options,
            )?;
            print_json(&analysis)
        }
        Commands::Insights { category } => {
            let insight = category_insights(&schedule, category);
            print_json(&json!({ "category": category, "insight": insight }))
        }
        Commands::Batch { input } => {
            let outcomes = run_batch(&calculator, input, &settings)?;
            print_json(&outcomes)
        }
        Commands::Schedule => print_json(&schedule_summary(&schedule, &source)),
        Commands::Settings { .. } => Ok(()),
    }
}

fn schedule_source(flag: Option<&Path>, settings: &CalculatorSettings) -> ScheduleSource {
    flag.map(Path::to_path_buf)
        .or_else(|| settings.schedule_path.clone())
        .map(ScheduleSource::File)
        .unwrap_or_default()
}

fn run_batch(
    calculator: &FeeCalculator<'_>,
    input: &Path,
    settings: &CalculatorSettings,
) -> Result<Vec<BatchOutcome>, AppError> {
    let data = fs::read_to_string(input).map_err(|source| AppError::Read {
        path: input.to_path_buf(),
        source,
    })?;
    let entries: Vec<BatchEntry> = serde_json::from_str(&data).map_err(AppError::BatchInput)?;
    let base = settings.base_options();

    let outcomes: Vec<BatchOutcome> = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let outcome = parse_month(entry.month).and_then(|month| {
                let options = CalculationOptions {
                    month,
                    is_oversized: entry.is_oversized,
                    long_term_storage: entry.long_term_storage,
                    include_returns: entry.include_returns.unwrap_or(base.include_returns),
                    target_margin: base.target_margin,
                };
                Ok(calculator.calculate(&entry.input, &options)?)
            });
            match outcome {
                Ok(result) => BatchOutcome {
                    index,
                    result: Some(result),
                    error: None,
                },
                Err(err) => {
                    warn!(index, error = %err, "batch entry rejected");
                    BatchOutcome {
                        index,
                        result: None,
                        error: Some(err.to_string()),
                    }
                }
            }
        })
        .collect();

    info!(
        total = outcomes.len(),
        failed = outcomes.iter().filter(|o| o.error.is_some()).count(),
        "batch complete"
    );
    Ok(outcomes)
}

fn run_settings(command: &SettingsCommand, settings: &CalculatorSettings) -> Result<(), AppError> {
    match command {
        SettingsCommand::Show => {
            let path = persistence::settings_file();
            print_json(&json!({ "path": path, "settings": settings }))
        }
        SettingsCommand::Init { force } => {
            let path = persistence::settings_file().ok_or(SettingsError::StorageUnavailable)?;
            if path.exists() && !force {
                return Err(AppError::SettingsExist(path));
            }
            persistence::save_settings_to(&path, &CalculatorSettings::default())?;
            print_json(&json!({ "path": path }))
        }
    }
}

fn schedule_summary(schedule: &FeeSchedule, source: &ScheduleSource) -> serde_json::Value {
    json!({
        "name": schedule.name,
        "effective_from": schedule.effective_from,
        "source": source.to_string(),
        "bundled": assets::schedule_names(),
        "categories": schedule.referral.rates.keys().collect::<Vec<_>>(),
        "default_referral_rate": schedule.referral.default_rate,
        "peak_months": schedule.storage.peak_months,
        "target_margin": schedule.pricing.target_margin,
        "assumed_fee_rate": schedule.pricing.assumed_fee_rate,
    })
}

fn parse_month(month: Option<i64>) -> Result<Option<Month>, AppError> {
    month
        .map(|value| {
            u8::try_from(value)
                .ok()
                .and_then(|number| Month::try_from(number).ok())
                .ok_or(AppError::InvalidMonth(value))
        })
        .transpose()
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

//! ecoyield CLI: yield prediction and sustainability scoring from the terminal.
//!
//! Usage:
//!   ecoyield crops
//!   ecoyield predict --crop rice --n 80 --p 40 --k 40 \
//!       --temperature 25 --humidity 70 --ph 6.5 --rainfall 200 [--json]
//!   ecoyield interactive [--fallback-crop rice]
//!
//! Global options:
//!   --config PATH      TOML config (default: $ECOYIELD_CONFIG, else built-in defaults)
//!   --artifacts DIR    Override the artifact directory
//!   --strict-ranges    Reject inputs outside the agronomic ranges
//!   -v, -vv            More logging on stderr (RUST_LOG wins when set)

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ecoyield::{EcoYield, EcoYieldConfig, FieldParameters, SustainabilityResult};

#[derive(Parser)]
#[command(name = "ecoyield")]
#[command(about = "Crop yield prediction and nutrient-efficiency scoring")]
#[command(version)]
struct Cli {
    /// Config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Artifact directory holding the model and crop codec
    #[arg(long, global = true)]
    artifacts: Option<PathBuf>,

    /// Reject inputs outside the agronomic ranges
    #[arg(long, global = true)]
    strict_ranges: bool,

    /// Increase log verbosity
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported crops in training order
    Crops,

    /// Predict yield and score sustainability for one field
    Predict {
        #[command(flatten)]
        field: FieldArgs,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Prompt for field parameters on stdin
    Interactive {
        /// Substitute this crop for names outside the vocabulary
        #[arg(long)]
        fallback_crop: Option<String>,
    },
}

#[derive(Args)]
struct FieldArgs {
    /// Crop name (see `ecoyield crops`)
    #[arg(long)]
    crop: String,

    /// Nitrogen, kg/ha
    #[arg(long = "n", allow_negative_numbers = true, value_parser = finite_f64)]
    nitrogen: f64,

    /// Phosphorus, kg/ha
    #[arg(long = "p", allow_negative_numbers = true, value_parser = finite_f64)]
    phosphorus: f64,

    /// Potassium, kg/ha
    #[arg(long = "k", allow_negative_numbers = true, value_parser = finite_f64)]
    potassium: f64,

    /// Temperature, degrees C
    #[arg(long, allow_negative_numbers = true, value_parser = finite_f64)]
    temperature: f64,

    /// Relative humidity, %
    #[arg(long, allow_negative_numbers = true, value_parser = finite_f64)]
    humidity: f64,

    /// Soil pH
    #[arg(long, allow_negative_numbers = true, value_parser = finite_f64)]
    ph: f64,

    /// Rainfall, mm
    #[arg(long, allow_negative_numbers = true, value_parser = finite_f64)]
    rainfall: f64,
}

/// Parse a finite `f64`; NaN and infinities are rejected at the command line.
fn finite_f64(raw: &str) -> Result<f64, String> {
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        Ok(v) => Err(format!("{v} is not a finite number")),
        Err(e) => Err(e.to_string()),
    }
}

impl From<FieldArgs> for FieldParameters {
    fn from(a: FieldArgs) -> Self {
        FieldParameters::new(
            a.crop,
            a.nitrogen,
            a.phosphorus,
            a.potassium,
            a.temperature,
            a.humidity,
            a.ph,
            a.rainfall,
        )
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let eco = build_pipeline(&cli)?;

    match cli.command {
        Commands::Crops => cmd_crops(&eco),
        Commands::Predict { field, json } => cmd_predict(&eco, field.into(), json),
        Commands::Interactive { fallback_crop } => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            cmd_interactive(&eco, fallback_crop.as_deref(), stdin.lock(), stdout.lock())
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .init();
}

fn build_pipeline(cli: &Cli) -> Result<EcoYield> {
    let mut config = match &cli.config {
        Some(path) => EcoYieldConfig::load(path)?,
        None => EcoYieldConfig::from_env().context("failed loading $ECOYIELD_CONFIG")?,
    };
    if let Some(dir) = &cli.artifacts {
        config.artifacts.dir = dir.clone();
    }
    if cli.strict_ranges {
        config.validation.strict = true;
    }
    info!(artifacts = %config.artifacts.dir.display(), strict = config.validation.strict, "configured");
    Ok(EcoYield::from_config(&config))
}

fn cmd_crops(eco: &EcoYield) -> Result<()> {
    let mut out = io::stdout().lock();
    for crop in eco.vocabulary()? {
        writeln!(out, "{crop}")?;
    }
    Ok(())
}

#[derive(Serialize)]
struct Report<'a> {
    crop: &'a str,
    #[serde(flatten)]
    result: &'a SustainabilityResult,
    status: &'static str,
    color: &'static str,
}

fn cmd_predict(eco: &EcoYield, params: FieldParameters, json: bool) -> Result<()> {
    let result = eco
        .evaluate(&params)
        .with_context(|| format!("evaluation failed for crop '{}'", params.crop))?;

    let mut out = io::stdout().lock();
    if json {
        let report = Report {
            crop: &params.crop,
            result: &result,
            status: result.band().label(),
            color: result.band().color(),
        };
        serde_json::to_writer_pretty(&mut out, &report)?;
        writeln!(out)?;
    } else {
        print_result(&mut out, &params.crop, &result)?;
    }
    Ok(())
}

fn print_result<W: Write>(out: &mut W, crop: &str, result: &SustainabilityResult) -> io::Result<()> {
    writeln!(out, "Crop:            {crop}")?;
    writeln!(out, "Predicted yield: {:.2} t/ha", result.yield_estimate())?;
    writeln!(out, "Total chemicals: {:.2} kg/ha", result.total_nutrients())?;
    writeln!(out, "Efficiency:      {:.4}", result.efficiency())?;
    writeln!(out, "Status:          {}", result.band().label())?;
    writeln!(out, "Recommendation:  {}", result.recommendation())?;
    Ok(())
}

fn cmd_interactive<R: BufRead, W: Write>(
    eco: &EcoYield,
    fallback: Option<&str>,
    mut input: R,
    mut out: W,
) -> Result<()> {
    let vocabulary = eco.vocabulary()?;
    if let Some(fallback) = fallback {
        if !vocabulary.iter().any(|c| c == fallback) {
            bail!("fallback crop '{fallback}' is not a supported crop");
        }
    }
    writeln!(out, "Supported crops: {}", vocabulary.join(", "))?;

    loop {
        let Some(crop) = prompt(&mut input, &mut out, "Crop (empty to quit)")? else {
            return Ok(());
        };
        if crop.is_empty() {
            return Ok(());
        }

        let crop = if vocabulary.iter().any(|c| *c == crop) {
            crop
        } else if let Some(fallback) = fallback {
            warn!(requested = %crop, fallback, "unknown crop, substituting fallback");
            writeln!(out, "Unknown crop '{crop}', using '{fallback}' instead.")?;
            fallback.to_owned()
        } else {
            writeln!(out, "Unknown crop '{crop}'. Choose one of the supported crops.")?;
            continue;
        };

        let mut values = [0.0; 7];
        let labels = [
            "Nitrogen (kg/ha)",
            "Phosphorus (kg/ha)",
            "Potassium (kg/ha)",
            "Temperature (C)",
            "Humidity (%)",
            "pH",
            "Rainfall (mm)",
        ];
        for (slot, label) in values.iter_mut().zip(labels) {
            let Some(v) = prompt_number(&mut input, &mut out, label)? else {
                return Ok(());
            };
            *slot = v;
        }
        let [n, p, k, temperature, humidity, ph, rainfall] = values;
        let params = FieldParameters::new(crop, n, p, k, temperature, humidity, ph, rainfall);

        match eco.evaluate(&params) {
            Ok(result) => {
                writeln!(out)?;
                print_result(&mut out, &params.crop, &result)?;
                writeln!(out)?;
            }
            Err(e) if e.is_input_error() => writeln!(out, "Invalid input: {e}")?,
            Err(e) => return Err(e.into()),
        }
    }
}

/// Read one trimmed line. `None` on end of input.
fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> Result<Option<String>> {
    write!(out, "{label}: ")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_owned()))
}

fn prompt_number<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    label: &str,
) -> Result<Option<f64>> {
    loop {
        let Some(raw) = prompt(input, out, label)? else {
            return Ok(None);
        };
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => return Ok(Some(v)),
            _ => writeln!(out, "'{raw}' is not a number, try again.")?,
        }
    }
}

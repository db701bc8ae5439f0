// IBAN Check - command line front end

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use iban_check::{
    compute_check_digits, normalize, validate, BatchReport, BatchValidator, CountryRegistry, Outcome,
    ValidationError,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "iban-check", version, about = "Validate International Bank Account Numbers")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate one or more IBANs given on the command line
    Validate {
        /// IBANs; quote ones that contain spaces
        #[arg(required = true)]
        ibans: Vec<String>,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate files with one IBAN per line ('#' comments allowed), or directories of them
    Check {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Write a CSV report of every checked line
        #[arg(long)]
        csv: Option<PathBuf>,
    },

    /// List supported countries with their length and BBAN layout
    Countries,

    /// Build an IBAN from a country code and BBAN by computing its check digits
    Generate { country: String, bban: String },
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns whether every input was valid
fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Command::Validate { ibans, json } => run_validate(&ibans, json),
        Command::Check { paths, csv } => run_check(&paths, csv),
        Command::Countries => {
            run_countries();
            Ok(true)
        }
        Command::Generate { country, bban } => run_generate(&country, &bban),
    }
}

fn run_validate(ibans: &[String], json: bool) -> Result<bool> {
    if json {
        let report = BatchValidator::default().check_all("args", ibans);
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(report.summary.all_valid());
    }

    let mut all_valid = true;
    for input in ibans {
        match validate(input) {
            Ok(iban) => println!("✓ {}", iban),
            Err(err) => {
                all_valid = false;
                print_rejection(input, &err);
            }
        }
    }
    Ok(all_valid)
}

fn print_rejection(input: &str, err: &ValidationError) {
    if err.is_advisory() {
        println!("? {}: {}", input, err);
    } else {
        println!("✗ {}: {}", input, err);
    }
}

fn run_check(paths: &[PathBuf], csv: Option<PathBuf>) -> Result<bool> {
    let validator = BatchValidator::default();
    let mut report = BatchReport::new();

    for path in paths {
        report.extend(validator.check_path(path)?);
    }

    for entry in report.invalid_entries() {
        match &entry.outcome {
            Outcome::Unsupported { message, .. } => {
                println!("? {}:{}: {}: {}", entry.source, entry.line, entry.input, message)
            }
            Outcome::Invalid { message, .. } => {
                println!("✗ {}:{}: {}: {}", entry.source, entry.line, entry.input, message)
            }
            Outcome::Valid { .. } => {}
        }
    }
    println!("{}", report.summary.summary());

    if let Some(csv_path) = csv {
        report
            .write_csv_file(&csv_path)
            .with_context(|| format!("Failed to write report to {:?}", csv_path))?;
        println!("✓ CSV report written to {:?}", csv_path);
    }

    Ok(report.summary.all_valid())
}

fn run_countries() {
    let registry = CountryRegistry::global();

    println!("{:<4} {:>6}  {:<20} {}", "CODE", "LENGTH", "LAYOUT", "PATTERN");
    for rule in registry.rules() {
        let pattern = match registry.matcher(rule.code) {
            Ok(matcher) => matcher.pattern(),
            Err(err) => format!("<{}>", err),
        };
        println!("{:<4} {:>6}  {:<20} {}", rule.code, rule.length, rule.layout, pattern);
    }
}

fn run_generate(country: &str, bban: &str) -> Result<bool> {
    let country = normalize(country);
    let bban = normalize(bban);

    let check_digits = compute_check_digits(&country, &bban)?;
    let iban = validate(&format!("{}{}{}", country, check_digits, bban))?;
    println!("{}", iban);
    Ok(true)
}

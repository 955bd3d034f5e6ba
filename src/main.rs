//! CLI binary for checking XML documents against a rule file.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, bail};
use clap::{Parser, ValueEnum};
use xmlassert::{Format, PathEvaluator, Report};

#[derive(Parser)]
#[command(name = "xmlassert", version, about = "Declarative assertions over XML documents")]
struct Cli {
    /// Path to the YAML rule file
    #[arg(short, long)]
    rules: PathBuf,

    /// XML documents to check
    #[arg(required = true)]
    documents: Vec<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Yaml,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup tracing; RUST_LOG wins over -v.
    let default = if cli.verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cmd_check(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(2)
        }
    }
}

/// Returns whether every document passed every rule.
fn cmd_check(cli: &Cli) -> anyhow::Result<bool> {
    let evaluator = PathEvaluator::new();

    let source = std::fs::read_to_string(&cli.rules)
        .with_context(|| format!("failed to read rule file {}", cli.rules.display()))?;
    let file = xmlassert::parse_rules(&source)
        .with_context(|| format!("failed to parse rule file {}", cli.rules.display()))?;

    let validation = xmlassert::validate_rules(&file, &evaluator);
    for warning in &validation.warnings {
        tracing::warn!("{}: {}", cli.rules.display(), warning);
    }
    if !validation.is_valid() {
        for error in &validation.errors {
            eprintln!("{}: {}", cli.rules.display(), error);
        }
        bail!(
            "rule file {} has {} error(s)",
            cli.rules.display(),
            validation.errors.len()
        );
    }
    let rules = xmlassert::compile(&file)?;

    let mut all_passed = true;
    for path in &cli.documents {
        let report = check_document(path, &rules, &evaluator)?;
        all_passed &= report.passed();
        print_report(path, &report, cli.format)?;
    }

    Ok(all_passed)
}

fn check_document(
    path: &Path,
    rules: &[xmlassert::ValidationRule],
    evaluator: &PathEvaluator,
) -> anyhow::Result<Report> {
    let xml = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let doc = xmlassert::parse_document(&xml)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let _span = tracing::info_span!("document", path = %path.display()).entered();
    let report = xmlassert::run(&doc, rules, evaluator)
        .with_context(|| format!("failed to evaluate rules against {}", path.display()))?;
    Ok(report)
}

fn print_report(path: &Path, report: &Report, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            for outcome in &report.outcomes {
                let status = if outcome.passed { "PASS" } else { "FAIL" };
                println!("{} {}: {}", status, path.display(), outcome.rule);
                for diagnostic in &outcome.diagnostics {
                    println!("    {}", diagnostic.message);
                }
            }
            println!(
                "{}: {} passed, {} failed",
                path.display(),
                report.summary.passed,
                report.summary.failed
            );
        }
        OutputFormat::Json => println!("{}", xmlassert::serialize_report(report, Format::Json)?),
        OutputFormat::Yaml => print!("{}", xmlassert::serialize_report(report, Format::Yaml)?),
    }
    Ok(())
}

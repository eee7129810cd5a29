//! normform CLI: normalize relations described in a YAML or JSON document.

use clap::{Parser, Subcommand, ValueEnum};
use normform_core::prelude::{NormalForm, NormalizeConfig};
use normform_exec::Engine;
use normform_planner::{
    build_plan, enforce, parse_document, validate_dependencies, DocumentConfig, RelationDef,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "normform")]
#[command(about = "Normalize relations from 1NF up to 5NF", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize every relation in a document
    Run {
        /// Path to the input document (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Target normal form: 1NF, 2NF, 3NF, BCNF, 4NF or 5NF (overrides config)
        #[arg(short, long)]
        target: Option<NormalForm>,

        /// Write the resulting relations here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Maximum parallel tasks (overrides config)
        #[arg(long)]
        max_parallel: Option<usize>,

        /// Widest relation the 5NF join search will consider (overrides config)
        #[arg(long)]
        max_join_attributes: Option<usize>,

        /// Reject dependencies that mention unknown attributes
        #[arg(long)]
        strict: bool,
    },

    /// Parse a document and check its dependencies
    Validate {
        /// Path to the input document (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Treat dependency warnings as errors
        #[arg(long)]
        strict: bool,
    },

    /// Show the stage chain and search sizes for a document (EXPLAIN)
    Explain {
        /// Path to the input document (YAML or JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Target normal form (overrides config)
        #[arg(short, long)]
        target: Option<NormalForm>,

        #[arg(long, value_enum, default_value_t = ExplainFormat::Text)]
        format: ExplainFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ExplainFormat {
    Text,
    Json,
}

/// Settings given on the command line. They win over the document and env.
#[derive(Debug, Default)]
struct CliOverrides {
    target: Option<NormalForm>,
    max_parallel: Option<usize>,
    max_join_attributes: Option<usize>,
    strict: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            target,
            output,
            max_parallel,
            max_join_attributes,
            strict,
        } => {
            let overrides = CliOverrides {
                target,
                max_parallel,
                max_join_attributes,
                strict,
            };
            match run_document(&input, output.as_deref(), &overrides) {
                Ok(true) => {}
                Ok(false) => std::process::exit(1),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Validate { input, strict } => {
            if let Err(e) = validate_document(&input, strict) {
                eprintln!("Validation failed: {}", e);
                std::process::exit(1);
            }
            println!("✓ Document is valid");
        }
        Commands::Explain {
            input,
            target,
            format,
        } => {
            let overrides = CliOverrides {
                target,
                ..CliOverrides::default()
            };
            if let Err(e) = explain_document(&input, &overrides, format) {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }
}

/// Returns `Ok(false)` when some source relation failed; the others are
/// still written.
fn run_document(
    input: &Path,
    output: Option<&Path>,
    overrides: &CliOverrides,
) -> Result<bool, Box<dyn std::error::Error>> {
    let src = fs::read_to_string(input)?;
    let parsed = parse_document(&src)?;

    let config = layer_config(NormalizeConfig::from_env(), &parsed.config, overrides);
    let plan = build_plan(parsed.relations, parsed.deps, config)?;
    for w in &plan.warnings {
        eprintln!("warning: {}", w);
    }

    let engine = Engine::new(&plan.config)?;
    let report = engine.run(&plan)?;

    let defs: Vec<RelationDef> = report.relations().map(RelationDef::from).collect();
    let json = serde_json::to_string_pretty(&defs)?;
    match output {
        Some(path) => fs::write(path, json + "\n")?,
        None => println!("{}", json),
    }

    for (source, err) in report.failures() {
        eprintln!("✗ {}: {}", source, err);
    }

    let m = &report.manifest;
    let status = if report.is_success() { "✓" } else { "✗" };
    eprintln!("{} Normalized to {} ({} relations out)", status, m.target, defs.len());
    eprintln!("  Run: {}", m.id.0);
    eprintln!("  Duration: {}ms", m.duration_ms());
    eprintln!("  Input hash: {}", m.input_hash);
    if let Some(h) = &m.output_hash {
        eprintln!("  Output hash: {}", h);
    }
    if m.failures > 0 {
        eprintln!("  Failures: {}", m.failures);
    }
    tracing::info!(
        run = %m.id.0,
        target = %m.target,
        outputs = defs.len(),
        failures = m.failures,
        duration_ms = m.duration_ms(),
        input_hash = %m.input_hash,
        "run finished"
    );

    Ok(report.is_success())
}

fn validate_document(input: &Path, strict: bool) -> Result<(), Box<dyn std::error::Error>> {
    let src = fs::read_to_string(input)?;
    let parsed = parse_document(&src)?;
    let strict = strict || parsed.config.strict_dependencies.unwrap_or(false);

    let warnings = validate_dependencies(&parsed.relations, &parsed.deps);
    for w in &warnings {
        eprintln!("warning: {}", w);
    }
    enforce(&warnings, strict)?;

    println!(
        "  {} relations, {} FDs, {} MVDs",
        parsed.relations.len(),
        parsed.deps.fds.len(),
        parsed.deps.mvds.len()
    );
    Ok(())
}

fn explain_document(
    input: &Path,
    overrides: &CliOverrides,
    format: ExplainFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let src = fs::read_to_string(input)?;
    let parsed = parse_document(&src)?;
    let config = layer_config(NormalizeConfig::from_env(), &parsed.config, overrides);
    let plan = build_plan(parsed.relations, parsed.deps, config)?;
    let explain = plan.explain();

    if format == ExplainFormat::Json {
        println!("{}", serde_json::to_string_pretty(&explain)?);
        return Ok(());
    }

    println!("Normalization Plan");
    println!("==================");
    println!();
    println!("Target: {}", explain.target);
    let chain: Vec<String> = explain.stages.iter().map(ToString::to_string).collect();
    println!("Stages: {}", chain.join(" → "));
    println!("Relations: {}", explain.relations);
    println!();
    println!("Functional dependencies ({}):", explain.fds.len());
    for fd in &explain.fds {
        println!("  {}", fd);
    }
    println!("Multivalued dependencies ({}):", explain.mvds.len());
    for mvd in &explain.mvds {
        println!("  {}", mvd);
    }
    if !explain.warnings.is_empty() {
        println!();
        println!("Warnings:");
        for w in &explain.warnings {
            println!("  {}", w);
        }
    }
    if let Some(search) = &explain.join_search {
        println!();
        println!(
            "Join search (max {} attributes):",
            plan.config.max_join_attributes
        );
        for est in search {
            if est.skipped {
                println!(
                    "  {}: {} attributes, skipped",
                    est.relation, est.attributes
                );
            } else {
                println!(
                    "  {}: {} attributes, {} rows, {} candidates",
                    est.relation, est.attributes, est.rows, est.candidates
                );
            }
        }
    }

    Ok(())
}

/// Defaults < env < document < command line.
fn layer_config(
    mut cfg: NormalizeConfig,
    doc: &DocumentConfig,
    cli: &CliOverrides,
) -> NormalizeConfig {
    doc.apply(&mut cfg);
    apply_cli_overrides(&mut cfg, cli);
    cfg
}

fn apply_cli_overrides(cfg: &mut NormalizeConfig, cli: &CliOverrides) {
    if let Some(target) = cli.target {
        cfg.target = target;
    }
    if let Some(parallel) = cli.max_parallel {
        cfg.max_parallel_tasks = parallel;
    }
    if let Some(max) = cli.max_join_attributes {
        cfg.max_join_attributes = max;
    }
    if cli.strict {
        cfg.strict_dependencies = true;
    }
}

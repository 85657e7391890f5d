//! Tighten CLI - batch driver for the modifier rule engine
//!
//! Architecture: Application Layer - the CLI coordinates user interactions with domain services
//! - Translates user commands to engine operations
//! - Handles external concerns like file I/O, process exit codes, and terminal output
//! - Exit codes: 0 nothing to add, 1 modifiers were added, 2 failure

use clap::{Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tighten::{
    metrics_json, CompilationUnit, DiagnosticSink, DiagnosticStyle, ModifierRule, TightenConfig,
    TightenEngine, TightenError, TightenResult,
};
use walkdir::WalkDir;

/// Tighten - immutability and visibility narrowing for serialized syntax trees
#[derive(Parser)]
#[command(name = "tighten")]
#[command(version = "0.1.0")]
#[command(about = "Marks declarations immutable and narrows visibility in compilation units")]
#[command(
    long_about = "Tighten replays its compiler-plugin rules over compilation units serialized as JSON: fields, parameters and locals gain the final modifier, fields become private and methods get an explicit visibility, unless an opt-out annotation says otherwise."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the rules over compilation units (files or directories of .json units)
    Check {
        /// Paths to process
        paths: Vec<PathBuf>,

        /// Diagnostic output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormatArg>,

        /// Comma-separated packages to leave alone (subpackages included)
        #[arg(long)]
        ignore_packages: Option<String>,

        /// Write modified units back to their files
        #[arg(long)]
        write: bool,

        /// Disable parallel processing
        #[arg(long)]
        no_parallel: bool,
    },

    /// List available rules
    Rules,

    /// Explain what a specific rule does
    Explain {
        /// Rule ID to explain
        rule_id: String,
    },
}

#[derive(Copy, Clone, ValueEnum, PartialEq)]
enum OutputFormatArg {
    Human,
    Parseable,
    Json,
}

impl From<OutputFormatArg> for DiagnosticStyle {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => DiagnosticStyle::Human,
            OutputFormatArg::Parseable | OutputFormatArg::Json => DiagnosticStyle::Parseable,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match run_command(cli) {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
    }
}

fn run_command(cli: Cli) -> TightenResult<i32> {
    match cli.command {
        Commands::Check {
            paths,
            format,
            ignore_packages,
            write,
            no_parallel,
        } => run_check(cli.config, paths, format, ignore_packages, write, no_parallel),
        Commands::Rules => run_list_rules(),
        Commands::Explain { rule_id } => run_explain(rule_id),
    }
}

fn run_check(
    config_path: Option<PathBuf>,
    paths: Vec<PathBuf>,
    format: Option<OutputFormatArg>,
    ignore_packages: Option<String>,
    write: bool,
    no_parallel: bool,
) -> TightenResult<i32> {
    // Load configuration
    let mut config = if let Some(config_path) = config_path {
        TightenConfig::from_file(config_path)?
    } else {
        // Try to find default config file
        let default_configs = ["tighten.yaml", "tighten.yml", ".tighten.yaml"];
        let mut config = None;

        for config_name in &default_configs {
            if let Some(loaded) = TightenConfig::load_optional(config_name)? {
                config = Some(loaded);
                break;
            }
        }

        config.unwrap_or_default()
    };

    // Command-line switches win over the config file
    if let Some(format) = format {
        config.diagnostics.style = format.into();
    }
    if let Some(packages) = ignore_packages {
        config.apply_plugin_args(&[format!("--ignore-packages={}", packages)])?;
    }

    let json_output = format == Some(OutputFormatArg::Json);
    let mut engine = TightenEngine::with_config(config)?;
    if json_output {
        // diagnostics land in the JSON document instead of stderr
        let (sink, _lines) = DiagnosticSink::buffer();
        engine = engine.with_diagnostic_sink(sink);
    }

    engine.announce();

    // Use current directory if no paths specified
    let paths = if paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        paths
    };

    let unit_files = discover_unit_files(&paths)?;
    let mut units = load_units(&unit_files)?;

    let processed: usize = if no_parallel {
        units
            .iter_mut()
            .map(|unit| engine.process_unit(unit) as usize)
            .sum()
    } else {
        units
            .par_iter_mut()
            .map(|unit| engine.process_unit(unit) as usize)
            .sum()
    };

    engine.finish();

    if write {
        for (path, unit) in unit_files.iter().zip(&units) {
            let contents = serde_json::to_string_pretty(unit).map_err(|e| {
                TightenError::config(format!(
                    "Failed to serialize unit '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            fs::write(path, contents + "\n")?;
        }
    }

    if json_output {
        let document = serde_json::json!({
            "units": unit_files.len(),
            "processed": processed,
            "modifiers_added": engine.added_total(),
            "rules": metrics_json(engine.metrics(), engine.rules()),
            "diagnostics": engine.reporter().collected(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&document)
                .map_err(|e| TightenError::config(format!("JSON serialization failed: {}", e)))?
        );
    }

    if engine.added_total() > 0 {
        Ok(1) // Exit code 1 when declarations were tightened
    } else {
        Ok(0) // Exit code 0 when everything was already tight
    }
}

/// Expand files and directories into a sorted list of unit files
fn discover_unit_files(paths: &[PathBuf]) -> TightenResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
        } else if path.is_dir() {
            for entry in WalkDir::new(path).into_iter().filter_map(Result::ok) {
                if entry.file_type().is_file()
                    && entry.path().extension().map(|e| e == "json").unwrap_or(false)
                {
                    files.push(entry.path().to_path_buf());
                }
            }
        } else {
            return Err(TightenError::config(format!(
                "Path '{}' does not exist",
                path.display()
            )));
        }
    }

    files.sort();
    files.dedup();
    Ok(files)
}

fn load_units(files: &[PathBuf]) -> TightenResult<Vec<CompilationUnit>> {
    files
        .iter()
        .map(|path| {
            let contents = fs::read_to_string(path)?;
            serde_json::from_str(&contents)
                .map_err(|e| TightenError::unit_format(path.display().to_string(), e.to_string()))
        })
        .collect()
}

fn run_list_rules() -> TightenResult<i32> {
    println!("📋 Available rules\n");

    for rule in ModifierRule::ALL {
        println!(
            "  {:<27} [{}] {}",
            rule.rule_id(),
            rule.modifier(),
            rule.description()
        );
    }

    Ok(0)
}

fn run_explain(rule_id: String) -> TightenResult<i32> {
    match ModifierRule::from_id(&rule_id) {
        Some(rule) => {
            println!("📖 Rule: {}", rule.rule_id());
            println!("   Modifier: {}", rule.modifier());
            println!("   Scope: {}", rule.scope_class().as_str());
            println!("   Opt-out annotation: @{}", rule.marker());
            println!();
            println!("   {}", rule.description());
            Ok(0)
        }
        None => {
            eprintln!("❌ Rule '{}' not found", rule_id);
            println!();
            println!("Available rules:");
            for rule in ModifierRule::ALL {
                println!("  - {}", rule.rule_id());
            }
            Ok(1)
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();
}

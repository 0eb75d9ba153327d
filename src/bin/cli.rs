//! Archlint CLI - scan a workspace against architecture rules.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use archlint::paths::relative_to;
use archlint::{
    built_in_rules, start_watching, ArchlintConfig, Orchestrator, ReportFormat, ScanOptions,
    ScanResult, Severity, SupportedLanguage, DEFAULT_DEBOUNCE_MS,
};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "archlint")]
#[command(about = "Archlint - architecture rules over the module dependency graph", long_about = None)]
struct Cli {
    /// Working directory (default: current directory)
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the workspace against the configured rules
    Scan {
        /// Optional path or glob narrowing the scan scope
        target: Option<String>,

        /// Path to an archlint.toml file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Attempt to automatically fix fixable violations
        #[arg(long)]
        fix: bool,

        /// Print verbose logs while scanning
        #[arg(long)]
        verbose: bool,

        /// Output mode for violations ('table' | 'list' | 'json')
        #[arg(long, default_value = "table")]
        report: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,

        /// Watch for file changes and re-run the scan
        #[arg(long)]
        watch: bool,

        /// Write a scan metrics summary JSON to the given path
        #[arg(long)]
        metrics: Option<PathBuf>,
    },

    /// List the built-in rules
    Rules,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MetricsSummary {
    timestamp: String,
    duration_ms: f64,
    files_scanned: usize,
    violation_count: usize,
    by_rule: BTreeMap<String, usize>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "archlint=debug" } else { "archlint=warn" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Scan {
            target,
            config,
            fix,
            verbose,
            report,
            pretty,
            watch,
            metrics,
        } => {
            init_tracing(verbose);

            let format: ReportFormat = report.parse()?;
            let loaded = match &config {
                Some(path) => ArchlintConfig::load(path)?,
                None => ArchlintConfig::discover(&cli.root)?,
            };

            let orchestrator = Orchestrator::new(&cli.root, loaded)?.with_reporter(Box::new(
                move |batch| {
                    if let Ok(rendered) = archlint::report::render(batch, format, pretty) {
                        println!("{rendered}");
                    }
                },
            ));

            let options = ScanOptions {
                target,
                fix,
                verbose,
                changed_files: None,
            };

            let run_scan = |changed_files: Option<Vec<String>>| -> Result<ScanResult> {
                let result = orchestrator.scan(&ScanOptions {
                    changed_files,
                    ..options.clone()
                })?;

                let rendered = archlint::report::render(&result.violations, format, pretty)?;
                println!("{rendered}");

                if let Some(path) = &metrics {
                    emit_metrics(path, &result)?;
                }

                Ok(result)
            };

            let result = run_scan(None)?;
            let mut exit = exit_for(&result);

            if !watch {
                return Ok(exit);
            }

            let patterns = orchestrator.scan_patterns();
            let (_handle, rx) = start_watching(&patterns.root, DEFAULT_DEBOUNCE_MS)?;
            println!(
                "[archlint] Watching {} patterns from {}",
                patterns.include.len(),
                patterns.root.display()
            );

            while let Ok(paths) = rx.recv() {
                let changed = relative_changed_files(&patterns.root, &paths);
                if changed.is_empty() {
                    continue;
                }

                println!("[archlint] Re-scanning after changes: {}", changed.join(", "));
                match run_scan(Some(changed)) {
                    Ok(result) => exit = exit_for(&result),
                    Err(e) => eprintln!("Error: {e:#}"),
                }
            }

            Ok(exit)
        }

        Commands::Rules => {
            init_tracing(false);

            for rule in built_in_rules(&Default::default()) {
                let meta = rule.meta();
                let severity = match meta.severity {
                    Severity::Error => "error",
                    Severity::Warning => "warning",
                };
                println!("{:40}  {:8}  {}", rule.id(), severity, meta.description);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_for(result: &ScanResult) -> ExitCode {
    if result.violations.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Map a debounced batch of absolute paths to root-relative source files.
fn relative_changed_files(root: &Path, paths: &[PathBuf]) -> Vec<String> {
    let mut changed: Vec<String> = paths
        .iter()
        .filter(|path| SupportedLanguage::from_path(path).is_some())
        .map(|path| relative_to(root, path))
        .filter(|relative| !relative.is_empty() && !relative.starts_with(".."))
        .filter(|relative| !relative.split('/').any(|s| s == "node_modules" || s == ".git"))
        .collect();
    changed.sort();
    changed.dedup();
    changed
}

fn emit_metrics(path: &Path, result: &ScanResult) -> Result<()> {
    let mut by_rule: BTreeMap<String, usize> = BTreeMap::new();
    for violation in &result.violations {
        *by_rule.entry(violation.rule_id.clone()).or_default() += 1;
    }

    let summary = MetricsSummary {
        timestamp: chrono::Utc::now().to_rfc3339(),
        duration_ms: result.duration_ms,
        files_scanned: result.files.len(),
        violation_count: result.violations.len(),
        by_rule,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating metrics directory for {}", path.display()))?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("writing metrics to {}", path.display()))?;

    Ok(())
}

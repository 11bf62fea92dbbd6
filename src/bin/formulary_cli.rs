//! Formulary CLI - Bridge interface for the web service
//!
//! Commands: ingredients, categories, sources, stats, classify, check, summary, badge, weight
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 when a formula verdict is STOP

use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use formulary_core::{
    catalog::IngredientFilter, classify, color_for, dose::serving_size_display, ComplianceEngine,
    ComplianceStatus, Formula, IngredientCatalog, ENGINE_VERSION,
};

#[derive(Parser)]
#[command(name = "formulary-cli")]
#[command(about = "Formulary CLI - Ingredient Safety & Formula Compliance")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to the ingredient catalog (JSON)
    #[arg(short, long, env = "FORMULARY_CATALOG", default_value = "ingredients.json", global = true)]
    catalog: PathBuf,

    /// Verbose logging on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List catalog ingredients, ordered by name
    Ingredients {
        #[arg(long)]
        category: Option<String>,

        #[arg(long)]
        source: Option<String>,

        /// Substring of the safety text
        #[arg(long)]
        safety: Option<String>,

        /// Drop ingredients whose safety text names a restricted keyword
        #[arg(long)]
        exclude_risk: bool,
    },

    /// Distinct ingredient categories
    Categories,

    /// Distinct ingredient sources
    Sources,

    /// Catalog counts by safety level
    Stats,

    /// Classify a free-text safety descriptor
    Classify {
        #[arg(short, long)]
        text: String,
    },

    /// Full compliance report for a formula
    Check {
        /// JSON payload (Formula)
        #[arg(short, long)]
        payload: String,
    },

    /// Status and counts only
    Summary {
        #[arg(short, long)]
        payload: String,
    },

    /// List-view status badge
    Badge {
        #[arg(short, long)]
        payload: String,
    },

    /// Total mass of a formula in milligrams
    Weight {
        #[arg(short, long)]
        payload: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install logger: {}", e);
    }

    let catalog_path = cli.catalog.as_path();

    match cli.command {
        Commands::Ingredients { category, source, safety, exclude_risk } => {
            with_engine(catalog_path, |engine| {
                let filter = IngredientFilter { category, source, safety, exclude_risk };
                let ingredients: Vec<_> = engine
                    .lookup()
                    .search(&filter)
                    .into_iter()
                    .map(|i| json!({
                        "id": i.id,
                        "name": i.name,
                        "category": i.category,
                        "source": i.source,
                        "safety": i.safety,
                        "safetyLevel": i.safety_tier(),
                        "safetyColor": i.safety_color().hex(),
                        "tierSource": i.tier_source(),
                    }))
                    .collect();
                emit(&ingredients)
            })
        }

        Commands::Categories => with_engine(catalog_path, |engine| emit(&engine.lookup().categories())),

        Commands::Sources => with_engine(catalog_path, |engine| emit(&engine.lookup().sources())),

        Commands::Stats => with_engine(catalog_path, |engine| emit(&engine.lookup().stats())),

        Commands::Classify { text } => {
            let tier = classify(&text);
            let color = color_for(tier);
            emit(&json!({
                "safety": text,
                "safetyLevel": tier,
                "safetyColor": color,
                "safetyColorHex": color.hex(),
            }))
        }

        Commands::Check { payload } => {
            let formula = match parse_formula(&payload) {
                Ok(f) => f,
                Err(code) => return code,
            };
            with_engine(catalog_path, |engine| match engine.check_compliance(&formula) {
                Ok(report) => {
                    let status = report.result.status;
                    emit_verdict(&json!({ "success": true, "report": report }), status)
                }
                Err(e) => fail(e),
            })
        }

        Commands::Summary { payload } => {
            let formula = match parse_formula(&payload) {
                Ok(f) => f,
                Err(code) => return code,
            };
            with_engine(catalog_path, |engine| match engine.compliance_summary(&formula) {
                Ok(summary) => emit_verdict(&summary, summary.status),
                Err(e) => fail(e),
            })
        }

        Commands::Badge { payload } => {
            let formula = match parse_formula(&payload) {
                Ok(f) => f,
                Err(code) => return code,
            };
            with_engine(catalog_path, |engine| match engine.compliance_badge(&formula) {
                Ok(badge) => emit_verdict(&badge, badge.status),
                Err(e) => fail(e),
            })
        }

        // No catalog needed: weight depends on doses only
        Commands::Weight { payload } => {
            let formula = match parse_formula(&payload) {
                Ok(f) => f,
                Err(code) => return code,
            };
            match formula.total_weight_mg() {
                Ok(total) => emit(&json!({
                    "formula": formula.name,
                    "totalWeightMg": total,
                    "servingSize": serving_size_display(total),
                })),
                Err(e) => fail(e),
            }
        }
    }
}

fn with_engine<F>(catalog_path: &Path, run: F) -> ExitCode
where
    F: FnOnce(&ComplianceEngine) -> ExitCode,
{
    match load_catalog(catalog_path) {
        Ok(catalog) => run(&ComplianceEngine::new(catalog)),
        Err(code) => code,
    }
}

fn load_catalog(path: &Path) -> Result<IngredientCatalog, ExitCode> {
    match IngredientCatalog::load_from_file(path) {
        Ok(catalog) => {
            info!(engine = ENGINE_VERSION, catalog = catalog.version(), "catalog ready");
            Ok(catalog)
        }
        Err(e) => {
            error!(path = %path.display(), "failed to load catalog: {}", e);
            Err(fail(format!("Failed to load catalog: {}", e)))
        }
    }
}

fn parse_formula(payload: &str) -> Result<Formula, ExitCode> {
    serde_json::from_str(payload).map_err(|e| fail(format!("Invalid payload: {}", e)))
}

fn emit<T: Serialize>(value: &T) -> ExitCode {
    if print_json(value) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn emit_verdict<T: Serialize>(value: &T, status: ComplianceStatus) -> ExitCode {
    match (print_json(value), status) {
        (false, _) => ExitCode::FAILURE,
        (true, ComplianceStatus::Stop) => ExitCode::from(2),
        (true, _) => ExitCode::SUCCESS,
    }
}

fn print_json<T: Serialize>(value: &T) -> bool {
    match serde_json::to_string_pretty(value) {
        Ok(out) => {
            println!("{}", out);
            true
        }
        Err(e) => {
            error!("failed to serialize output: {}", e);
            false
        }
    }
}

fn fail(message: impl Display) -> ExitCode {
    println!("{}", json!({ "success": false, "error": message.to_string() }));
    ExitCode::FAILURE
}

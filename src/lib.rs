//! Formulary Core - Ingredient Safety & Formula Compliance Engine
//!
//! # Guarantees
//! 1. Classification Is Ordered: first matching keyword rule wins
//! 2. One Status Derivation: report, summary and badge share `derive_status`
//! 3. UNKNOWN Never Escalates
//! 4. Evaluation Is Pure: same items, same verdict, same fingerprint
//! 5. Unsupported Units Fail Fast

pub mod classifier;
pub mod policy;
pub mod dose;
pub mod formula;
pub mod catalog;
pub mod compliance;
pub mod hashing;
pub mod pipeline;

pub use classifier::{classify, color_for, ColorCode, SafetyTier};
pub use policy::{TierSource, UNKNOWN_TIER_BUCKET};
pub use dose::{total_weight_mg, Dose, DoseUnit};
pub use formula::{Formula, FormulaError, FormulaItem};
pub use catalog::{Ingredient, IngredientCatalog, IngredientLookup, CatalogError};
pub use compliance::{
    derive_status, evaluate_full, evaluate_summary, quick_badge, Badge, ComplianceIssue,
    ComplianceResult, ComplianceStatus, ComplianceSummary, DosedIngredient, SummaryCounts,
};
pub use pipeline::{ComplianceEngine, ComplianceReport, PipelineError};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

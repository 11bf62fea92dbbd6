//! Compliance Engine - Single Entry Point
//!
//! Resolves formula items against the ingredient lookup, then hands the
//! resolved items to the pure evaluators. Full checks and summaries refuse
//! empty formulas; the list badge reports them as EMPTY.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::catalog::{CatalogError, IngredientCatalog, IngredientLookup};
use crate::compliance::{
    evaluate_full, evaluate_summary, quick_badge, Badge, ComplianceResult, ComplianceSummary,
    DosedIngredient,
};
use crate::dose::serving_size_display;
use crate::formula::{Formula, FormulaError, FormulaId};
use crate::hashing::evaluation_fingerprint;
use crate::ENGINE_VERSION;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Formula has no ingredients")]
    EmptyFormula,

    #[error("Ingredient not found: {0}")]
    IngredientNotFound(String),

    #[error(transparent)]
    Formula(#[from] FormulaError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A verdict plus the formula metadata it was produced for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceReport {
    pub id: String,
    pub formula_id: Option<FormulaId>,
    pub formula_name: String,
    pub region: String,
    pub checked_at: DateTime<Utc>,
    pub engine_version: String,
    pub total_weight_mg: Decimal,
    pub serving_size: String,
    pub fingerprint: String,
    #[serde(flatten)]
    pub result: ComplianceResult,
}

pub struct ComplianceEngine<L = IngredientCatalog> {
    lookup: L,
}

impl<L: IngredientLookup> ComplianceEngine<L> {
    pub fn new(lookup: L) -> Self {
        Self { lookup }
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Join every item with its ingredient, in formula order.
    pub fn resolve(&self, formula: &Formula) -> Result<Vec<DosedIngredient>, PipelineError> {
        formula
            .items()
            .iter()
            .map(|item| {
                self.lookup
                    .ingredient(&item.ingredient_id)
                    .map(|ingredient| DosedIngredient::new(ingredient, item))
                    .ok_or_else(|| PipelineError::IngredientNotFound(item.ingredient_id.clone()))
            })
            .collect()
    }

    /// Full compliance report.
    pub fn check_compliance(&self, formula: &Formula) -> Result<ComplianceReport, PipelineError> {
        let items = self.resolve_non_empty(formula)?;
        let result = evaluate_full(&items);
        let fingerprint = evaluation_fingerprint(&items, &result, ENGINE_VERSION)?;
        let total_weight_mg = formula.total_weight_mg()?;

        debug!(
            formula = %formula.name,
            status = ?result.status,
            issues = result.issues.len(),
            "compliance check complete"
        );

        Ok(ComplianceReport {
            id: Uuid::new_v4().to_string(),
            formula_id: formula.id.clone(),
            formula_name: formula.name.clone(),
            region: formula.region.clone(),
            checked_at: Utc::now(),
            engine_version: ENGINE_VERSION.to_string(),
            total_weight_mg,
            serving_size: serving_size_display(total_weight_mg),
            fingerprint,
            result,
        })
    }

    pub fn compliance_summary(&self, formula: &Formula) -> Result<ComplianceSummary, PipelineError> {
        let items = self.resolve_non_empty(formula)?;
        Ok(evaluate_summary(&items))
    }

    /// Badge for list views. Empty formulas get an EMPTY badge.
    pub fn compliance_badge(&self, formula: &Formula) -> Result<Badge, PipelineError> {
        let items = self.resolve(formula)?;
        Ok(quick_badge(&items))
    }

    fn resolve_non_empty(&self, formula: &Formula) -> Result<Vec<DosedIngredient>, PipelineError> {
        if formula.is_empty() {
            return Err(PipelineError::EmptyFormula);
        }
        self.resolve(formula)
    }
}

impl Default for ComplianceEngine<IngredientCatalog> {
    fn default() -> Self {
        Self::new(IngredientCatalog::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Ingredient;
    use crate::compliance::ComplianceStatus;
    use crate::dose::DoseUnit;
    use crate::formula::FormulaItem;

    fn engine() -> ComplianceEngine {
        let mut catalog = IngredientCatalog::new();
        catalog.register(Ingredient::new("vit-c", "Vitamin C", "General dietary use"));
        catalog.register(Ingredient::new("ephedra", "Ephedra", "Restricted use only"));
        ComplianceEngine::new(catalog)
    }

    #[test]
    fn test_unknown_ingredient_is_an_error() {
        let mut formula = Formula::new("Broken");
        formula
            .add_item(FormulaItem::new("nope", Decimal::ONE, DoseUnit::Mg))
            .unwrap();
        let err = engine().check_compliance(&formula).unwrap_err();
        assert!(matches!(err, PipelineError::IngredientNotFound(id) if id == "nope"));
    }

    #[test]
    fn test_empty_formula_paths() {
        let formula = Formula::new("Empty");
        let engine = engine();
        assert!(matches!(engine.check_compliance(&formula), Err(PipelineError::EmptyFormula)));
        assert!(matches!(engine.compliance_summary(&formula), Err(PipelineError::EmptyFormula)));
        assert_eq!(engine.compliance_badge(&formula).unwrap().status, ComplianceStatus::Empty);
    }

    #[test]
    fn test_report_metadata() {
        let mut formula = Formula::new("Morning").with_id("f-1").with_region("US");
        formula
            .add_item(FormulaItem::new("vit-c", Decimal::new(1500, 0), DoseUnit::Mg))
            .unwrap();
        let report = engine().check_compliance(&formula).unwrap();
        assert_eq!(report.formula_id.as_deref(), Some("f-1"));
        assert_eq!(report.serving_size, "1.50 g");
        assert_eq!(report.fingerprint.len(), 64);
        assert_eq!(report.result.status, ComplianceStatus::Approved);
    }

    #[test]
    fn test_oversized_dose_is_a_formula_error() {
        let mut formula = Formula::new("Huge");
        formula
            .add_item(FormulaItem::new("vit-c", Decimal::MAX, DoseUnit::G))
            .unwrap();
        let err = engine().check_compliance(&formula).unwrap_err();
        assert!(matches!(err, PipelineError::Formula(FormulaError::DoseOutOfRange(_))));
        // Summary and badge do not depend on weight
        assert!(engine().compliance_summary(&formula).is_ok());
    }
}

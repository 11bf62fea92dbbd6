//! Compliance Evaluation - Tiers to Verdicts
//!
//! Classification produces tiers. `derive_status` maps tier counts to a
//! status. The full report, the summary and the list badge all run the
//! same classification pass and the same `derive_status`, so they agree.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{Ingredient, IngredientId};
use crate::classifier::{ColorCode, SafetyTier};
use crate::dose::Dose;
use crate::formula::FormulaItem;
use crate::policy::{bucket_for, raises_issue, resolve_tier, SummaryBucket};

/// One formula item joined with the ingredient data evaluation needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DosedIngredient {
    pub ingredient_id: IngredientId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub safety: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_tier: Option<SafetyTier>,
    pub dose: Dose,
}

impl DosedIngredient {
    pub fn new(ingredient: &Ingredient, item: &FormulaItem) -> Self {
        Self {
            ingredient_id: ingredient.id.clone(),
            name: ingredient.name.clone(),
            category: ingredient.category.clone(),
            safety: ingredient.safety.clone(),
            declared_tier: ingredient.declared_tier,
            dose: item.dose(),
        }
    }

    pub fn tier(&self) -> SafetyTier {
        resolve_tier(self.declared_tier, &self.safety).0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ComplianceStatus {
    Approved,
    Warning,
    Stop,
    Empty,
}

impl ComplianceStatus {
    pub fn can_proceed(&self) -> bool {
        matches!(self, ComplianceStatus::Approved | ComplianceStatus::Warning)
    }

    pub fn message(&self) -> &'static str {
        match self {
            ComplianceStatus::Approved => "All ingredients are cleared for general dietary use",
            ComplianceStatus::Warning => "Formula contains ingredients that require caution",
            ComplianceStatus::Stop => "Formula contains restricted or high-risk ingredients and cannot proceed",
            ComplianceStatus::Empty => "Formula has no ingredients",
        }
    }

    pub fn badge_color(&self) -> ColorCode {
        match self {
            ComplianceStatus::Approved => ColorCode::Green,
            ComplianceStatus::Warning => ColorCode::Amber,
            ComplianceStatus::Stop => ColorCode::Red,
            ComplianceStatus::Empty => ColorCode::Grey,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCounts {
    pub safe: usize,
    pub caution: usize,
    pub risk: usize,
}

impl SummaryCounts {
    pub fn record(&mut self, tier: SafetyTier) {
        match bucket_for(tier) {
            SummaryBucket::Safe => self.safe += 1,
            SummaryBucket::Caution => self.caution += 1,
            SummaryBucket::Risk => self.risk += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.safe + self.caution + self.risk
    }
}

/// The one place status precedence lives: RISK, then CAUTION, then clear.
pub fn derive_status(counts: &SummaryCounts) -> ComplianceStatus {
    if counts.total() == 0 {
        ComplianceStatus::Empty
    } else if counts.risk > 0 {
        ComplianceStatus::Stop
    } else if counts.caution > 0 {
        ComplianceStatus::Warning
    } else {
        ComplianceStatus::Approved
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceIssue {
    pub ingredient_id: IngredientId,
    pub ingredient_name: String,
    /// Dose value and unit with no separator, e.g. "500mg"
    pub dose: String,
    pub category: String,
    pub severity: SafetyTier,
    pub safety: String,
    pub message: String,
    pub action: String,
}

impl ComplianceIssue {
    fn for_item(item: &DosedIngredient, tier: SafetyTier) -> Option<Self> {
        if !raises_issue(tier) {
            return None;
        }
        let advisory = advisory_for(tier, &item.safety);
        Some(Self {
            ingredient_id: item.ingredient_id.clone(),
            ingredient_name: item.name.clone(),
            dose: item.dose.to_string(),
            category: item.category.clone(),
            severity: tier,
            safety: item.safety.clone(),
            message: advisory.message.to_string(),
            action: advisory.action.to_string(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceResult {
    pub status: ComplianceStatus,
    pub status_message: String,
    pub can_proceed: bool,
    pub total_ingredients: usize,
    pub summary: SummaryCounts,
    pub issues: Vec<ComplianceIssue>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceSummary {
    pub status: ComplianceStatus,
    pub summary: SummaryCounts,
    pub total_ingredients: usize,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Badge {
    pub status: ComplianceStatus,
    pub badge_color: ColorCode,
}

impl From<ComplianceStatus> for Badge {
    fn from(status: ComplianceStatus) -> Self {
        Self { status, badge_color: status.badge_color() }
    }
}

/// Message and recommended action attached to an issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Advisory {
    pub keywords: &'static [&'static str],
    pub message: &'static str,
    pub action: &'static str,
}

/// CAUTION advisories, first keyword match wins.
pub const CAUTION_ADVISORIES: &[Advisory] = &[
    Advisory {
        keywords: &["topical", "external"],
        message: "Not approved for oral use; labelled for topical or external application",
        action: "Remove from formula or verify an alternative approved use",
    },
    Advisory {
        keywords: &["alkaloids", "processing required"],
        message: "Requires special processing before it is safe to ingest",
        action: "Verify the supplier's processing method and certificate of analysis",
    },
];

pub const GENERAL_CAUTION: Advisory = Advisory {
    keywords: &[],
    message: "Use with caution; review safety data for the intended population",
    action: "Review dosage limits and add appropriate label warnings",
};

pub const RISK_ADVISORY: Advisory = Advisory {
    keywords: &[],
    message: "Restricted or controlled ingredient; requires regulatory review",
    action: "Remove from formula or obtain regulatory clearance before manufacture",
};

pub fn advisory_for(tier: SafetyTier, safety_text: &str) -> &'static Advisory {
    if tier == SafetyTier::Risk {
        return &RISK_ADVISORY;
    }
    let lowered = safety_text.to_lowercase();
    CAUTION_ADVISORIES
        .iter()
        .find(|a| a.keywords.iter().any(|k| lowered.contains(k)))
        .unwrap_or(&GENERAL_CAUTION)
}

/// Single classification pass shared by every verdict.
fn classified<'a, I>(items: I) -> impl Iterator<Item = (&'a DosedIngredient, SafetyTier)>
where
    I: IntoIterator<Item = &'a DosedIngredient>,
{
    items.into_iter().map(|item| (item, item.tier()))
}

/// Full verdict with one issue per CAUTION or RISK item, in item order.
pub fn evaluate_full(items: &[DosedIngredient]) -> ComplianceResult {
    let mut summary = SummaryCounts::default();
    let mut issues = vec![];

    for (item, tier) in classified(items) {
        summary.record(tier);
        issues.extend(ComplianceIssue::for_item(item, tier));
    }

    let status = derive_status(&summary);
    debug!(
        status = ?status,
        safe = summary.safe,
        caution = summary.caution,
        risk = summary.risk,
        "evaluated formula"
    );

    ComplianceResult {
        status,
        status_message: status.message().to_string(),
        can_proceed: status.can_proceed(),
        total_ingredients: items.len(),
        summary,
        issues,
    }
}

/// Counts and status only.
pub fn evaluate_summary(items: &[DosedIngredient]) -> ComplianceSummary {
    let mut summary = SummaryCounts::default();
    for (_, tier) in classified(items) {
        summary.record(tier);
    }

    ComplianceSummary {
        status: derive_status(&summary),
        summary,
        total_ingredients: items.len(),
    }
}

/// List-view badge. Stops consuming items at the first RISK.
pub fn quick_badge<'a, I>(items: I) -> Badge
where
    I: IntoIterator<Item = &'a DosedIngredient>,
{
    let mut seen = SummaryCounts::default();
    for (_, tier) in classified(items) {
        seen.record(tier);
        if tier == SafetyTier::Risk {
            break;
        }
    }
    Badge::from(derive_status(&seen))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dose::DoseUnit;
    use rust_decimal::Decimal;

    fn item(id: &str, name: &str, safety: &str, value: i64, unit: DoseUnit) -> DosedIngredient {
        DosedIngredient {
            ingredient_id: id.to_string(),
            name: name.to_string(),
            category: "Herbs".to_string(),
            safety: safety.to_string(),
            declared_tier: None,
            dose: Dose::new(Decimal::new(value, 0), unit),
        }
    }

    fn safe() -> DosedIngredient {
        item("1", "Vitamin C", "General dietary use", 500, DoseUnit::Mg)
    }

    fn caution() -> DosedIngredient {
        item("2", "Ginseng Extract", "Use with caution during pregnancy", 100, DoseUnit::Mg)
    }

    fn risk() -> DosedIngredient {
        item("3", "Controlled Substance", "Restricted use only", 10, DoseUnit::Mg)
    }

    #[test]
    fn test_single_safe_is_approved() {
        let result = evaluate_full(&[safe()]);
        assert_eq!(result.status, ComplianceStatus::Approved);
        assert!(result.can_proceed);
        assert_eq!(result.summary, SummaryCounts { safe: 1, caution: 0, risk: 0 });
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_caution_gives_warning() {
        let result = evaluate_full(&[safe(), caution()]);
        assert_eq!(result.status, ComplianceStatus::Warning);
        assert!(result.can_proceed);
        assert_eq!(result.issues.len(), 1);
        let issue = &result.issues[0];
        assert_eq!(issue.severity, SafetyTier::Caution);
        assert_eq!(issue.ingredient_name, "Ginseng Extract");
        assert_eq!(issue.dose, "100mg");
        assert_eq!(issue.message, GENERAL_CAUTION.message);
    }

    #[test]
    fn test_risk_gives_stop() {
        let result = evaluate_full(&[risk()]);
        assert_eq!(result.status, ComplianceStatus::Stop);
        assert!(!result.can_proceed);
        assert_eq!(result.summary, SummaryCounts { safe: 0, caution: 0, risk: 1 });
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].severity, SafetyTier::Risk);
        assert_eq!(result.issues[0].action, RISK_ADVISORY.action);
    }

    #[test]
    fn test_unknown_counts_as_safe_without_issue() {
        let unknown = item("4", "Mystery Root", "Traditional folk remedy", 5, DoseUnit::G);
        let result = evaluate_full(&[unknown]);
        assert_eq!(result.status, ComplianceStatus::Approved);
        assert_eq!(result.summary.safe, 1);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_issue_order_follows_items() {
        let result = evaluate_full(&[risk(), safe(), caution()]);
        let names: Vec<_> = result.issues.iter().map(|i| i.ingredient_name.as_str()).collect();
        assert_eq!(names, vec!["Controlled Substance", "Ginseng Extract"]);
    }

    #[test]
    fn test_caution_advisories() {
        let topical = advisory_for(SafetyTier::Caution, "Topical use only");
        assert_eq!(topical.action, CAUTION_ADVISORIES[0].action);

        let external = advisory_for(SafetyTier::Caution, "External application");
        assert_eq!(external, topical);

        let alkaloids = advisory_for(SafetyTier::Caution, "Contains alkaloids");
        assert_eq!(alkaloids.action, CAUTION_ADVISORIES[1].action);

        let processing = advisory_for(SafetyTier::Caution, "Processing required before use");
        assert_eq!(processing, alkaloids);

        // RISK never uses the keyword table
        assert_eq!(advisory_for(SafetyTier::Risk, "Restricted; topical"), &RISK_ADVISORY);
    }

    #[test]
    fn test_empty_is_consistent() {
        let none: Vec<DosedIngredient> = vec![];
        assert_eq!(evaluate_full(&none).status, ComplianceStatus::Empty);
        assert!(!evaluate_full(&none).can_proceed);
        assert_eq!(evaluate_summary(&none).status, ComplianceStatus::Empty);
        assert_eq!(quick_badge(&none).badge_color, ColorCode::Grey);
    }

    #[test]
    fn test_summary_matches_full() {
        let items = vec![safe(), caution(), risk()];
        let full = evaluate_full(&items);
        let summary = evaluate_summary(&items);
        assert_eq!(summary.status, full.status);
        assert_eq!(summary.summary, full.summary);
        assert_eq!(summary.total_ingredients, 3);
    }

    #[test]
    fn test_badge_short_circuits_on_risk() {
        let items = vec![safe(), risk(), caution(), safe()];
        let mut consumed = 0;
        let badge = quick_badge(items.iter().inspect(|_| consumed += 1));
        assert_eq!(badge.status, ComplianceStatus::Stop);
        assert_eq!(badge.badge_color, ColorCode::Red);
        assert_eq!(consumed, 2);
    }

    #[test]
    fn test_declared_tier_flows_into_issue() {
        let mut declared = safe();
        declared.declared_tier = Some(SafetyTier::Risk);
        let result = evaluate_full(&[declared]);
        assert_eq!(result.status, ComplianceStatus::Stop);
        assert_eq!(result.issues[0].severity, SafetyTier::Risk);
    }
}

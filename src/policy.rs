//! Tier Policy
//!
//! Decides where an ingredient's tier comes from and which summary
//! bucket it is tallied in, so the evaluator never branches on either.

use serde::{Deserialize, Serialize};

use crate::classifier::{classify, SafetyTier};

/// Where a tier came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierSource {
    /// Structured tier recorded on the ingredient at data entry
    Declared,
    /// Keyword classification of the free-text safety descriptor
    Derived,
}

impl Default for TierSource {
    fn default() -> Self {
        Self::Derived
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryBucket {
    Safe,
    Caution,
    Risk,
}

/// Bucket for ingredients whose safety text matched no rule.
///
/// UNKNOWN is tallied as safe and never raises an issue.
pub const UNKNOWN_TIER_BUCKET: SummaryBucket = SummaryBucket::Safe;

pub fn bucket_for(tier: SafetyTier) -> SummaryBucket {
    match tier {
        SafetyTier::Safe => SummaryBucket::Safe,
        SafetyTier::Caution => SummaryBucket::Caution,
        SafetyTier::Risk => SummaryBucket::Risk,
        SafetyTier::Unknown => UNKNOWN_TIER_BUCKET,
    }
}

/// Only CAUTION and RISK ingredients are explained in a verdict.
pub fn raises_issue(tier: SafetyTier) -> bool {
    matches!(tier, SafetyTier::Caution | SafetyTier::Risk)
}

/// A declared tier is authoritative; free text is the fallback.
pub fn resolve_tier(declared: Option<SafetyTier>, safety_text: &str) -> (SafetyTier, TierSource) {
    match declared {
        Some(tier) => (tier, TierSource::Declared),
        None => (classify(safety_text), TierSource::Derived),
    }
}

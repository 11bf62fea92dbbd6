//! Safety Classifier - Free Text to Tiers
//!
//! Rules are data, evaluated in order. The first rule whose keywords
//! appear in the lowercased safety text decides the tier; later rules
//! never override an earlier match.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SafetyTier {
    Safe,
    Caution,
    Risk,
    Unknown,
}

impl SafetyTier {
    pub const ALL: [SafetyTier; 4] = [
        SafetyTier::Safe,
        SafetyTier::Caution,
        SafetyTier::Risk,
        SafetyTier::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyTier::Safe => "SAFE",
            SafetyTier::Caution => "CAUTION",
            SafetyTier::Risk => "RISK",
            SafetyTier::Unknown => "UNKNOWN",
        }
    }

    /// Severity rank for status derivation. UNKNOWN ranks with SAFE.
    pub fn severity(&self) -> u8 {
        match self {
            SafetyTier::Risk => 2,
            SafetyTier::Caution => 1,
            SafetyTier::Safe | SafetyTier::Unknown => 0,
        }
    }
}

impl fmt::Display for SafetyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Display color. Serialized by name; `hex()` gives the UI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorCode {
    Green,
    Amber,
    Red,
    Grey,
}

impl ColorCode {
    pub fn hex(&self) -> &'static str {
        match self {
            ColorCode::Green => "#4caf50",
            ColorCode::Amber => "#ff9800",
            ColorCode::Red => "#f44336",
            ColorCode::Grey => "#757575",
        }
    }
}

pub const SAFE_KEYWORDS: &[&str] = &["general dietary use"];

pub const CAUTION_KEYWORDS: &[&str] = &[
    "caution",
    "topical",
    "external",
    "processing required",
    "alkaloids",
];

pub const RISK_KEYWORDS: &[&str] = &["restricted", "controlled", "high-risk"];

/// One entry of the ordered keyword table.
#[derive(Debug, Clone, Copy)]
pub struct TierRule {
    pub tier: SafetyTier,
    pub keywords: &'static [&'static str],
}

impl TierRule {
    /// `lowered` must already be lowercase.
    pub fn matches(&self, lowered: &str) -> bool {
        self.keywords.iter().any(|keyword| lowered.contains(keyword))
    }
}

/// Priority order matters: SAFE before CAUTION before RISK.
pub const TIER_RULES: &[TierRule] = &[
    TierRule { tier: SafetyTier::Safe, keywords: SAFE_KEYWORDS },
    TierRule { tier: SafetyTier::Caution, keywords: CAUTION_KEYWORDS },
    TierRule { tier: SafetyTier::Risk, keywords: RISK_KEYWORDS },
];

/// Classify a safety descriptor. Total over all strings.
pub fn classify(safety_text: &str) -> SafetyTier {
    let lowered = safety_text.to_lowercase();
    TIER_RULES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map(|rule| rule.tier)
        .unwrap_or(SafetyTier::Unknown)
}

pub fn color_for(tier: SafetyTier) -> ColorCode {
    match tier {
        SafetyTier::Safe => ColorCode::Green,
        SafetyTier::Caution => ColorCode::Amber,
        SafetyTier::Risk => ColorCode::Red,
        SafetyTier::Unknown => ColorCode::Grey,
    }
}

/// True when the text names any RISK keyword, regardless of which tier
/// the full rule table would pick. Used by catalog filtering.
pub fn mentions_risk_keyword(text: &str) -> bool {
    let lowered = text.to_lowercase();
    RISK_KEYWORDS.iter().any(|keyword| lowered.contains(keyword))
}

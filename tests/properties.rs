//! Property tests for classification and verdict consistency.
//!
//! Run with: `cargo test --test properties`

use proptest::prelude::*;
use rust_decimal::Decimal;

use formulary_core::{
    classifier::{CAUTION_KEYWORDS, RISK_KEYWORDS},
    classify, evaluate_full, evaluate_summary, quick_badge, Dose, DoseUnit, DosedIngredient,
    SafetyTier,
};

fn filler() -> impl Strategy<Value = String> {
    // Lowercase words that cannot spell any keyword
    proptest::string::string_regex("[b-dfgjkmnpqvwxyz ]{0,24}").unwrap()
}

fn random_case(text: String, flips: Vec<bool>) -> String {
    text.chars()
        .zip(flips.into_iter().chain(std::iter::repeat(false)))
        .map(|(c, upper)| if upper { c.to_ascii_uppercase() } else { c })
        .collect()
}

fn safety_text() -> impl Strategy<Value = String> {
    let keyword = prop_oneof![
        Just("general dietary use"),
        proptest::sample::select(CAUTION_KEYWORDS),
        proptest::sample::select(RISK_KEYWORDS),
        Just("traditional use"),
        Just(""),
    ];
    (keyword, filler()).prop_map(|(k, f)| format!("{} {}", f, k))
}

fn unit() -> impl Strategy<Value = DoseUnit> {
    proptest::sample::select(DoseUnit::ALL.to_vec())
}

fn dosed_ingredient() -> impl Strategy<Value = DosedIngredient> {
    (safety_text(), 0i64..100_000, unit(), 0u32..3).prop_map(|(safety, value, unit, scale)| {
        DosedIngredient {
            ingredient_id: format!("id-{}", value),
            name: format!("Ingredient {}", value),
            category: "Herbs".to_string(),
            safety,
            declared_tier: None,
            dose: Dose::new(Decimal::new(value, scale), unit),
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    /// PROPERTY: "general dietary use" in any case always classifies SAFE.
    #[test]
    fn property_safe_phrase_always_wins(
        prefix in filler(),
        other in proptest::sample::select([CAUTION_KEYWORDS, RISK_KEYWORDS].concat()),
        flips in proptest::collection::vec(any::<bool>(), 0..40),
    ) {
        let text = random_case(format!("{}{} general dietary use", prefix, other), flips);
        prop_assert_eq!(classify(&text), SafetyTier::Safe);
    }

    /// PROPERTY: a CAUTION keyword beats a RISK keyword wherever they appear.
    #[test]
    fn property_caution_precedes_risk(
        caution in proptest::sample::select(CAUTION_KEYWORDS),
        risk in proptest::sample::select(RISK_KEYWORDS),
        risk_first in any::<bool>(),
    ) {
        let text = if risk_first {
            format!("{} then {}", risk, caution)
        } else {
            format!("{} then {}", caution, risk)
        };
        prop_assert_eq!(classify(&text), SafetyTier::Caution);
    }

    /// PROPERTY: `classify` never panics on arbitrary input.
    #[test]
    fn property_classify_is_total(s in ".{0,128}") {
        let _ = classify(&s);
    }

    /// PROPERTY: full report, summary and badge agree on status.
    #[test]
    fn property_verdicts_agree(items in proptest::collection::vec(dosed_ingredient(), 0..12)) {
        let full = evaluate_full(&items);
        let summary = evaluate_summary(&items);
        let badge = quick_badge(&items);

        prop_assert_eq!(full.status, summary.status);
        prop_assert_eq!(full.status, badge.status);
        prop_assert_eq!(full.summary, summary.summary);
        prop_assert_eq!(full.summary.total(), items.len());
    }

    /// PROPERTY: every issue matches its item's tier; SAFE/UNKNOWN raise none.
    #[test]
    fn property_issues_match_tiers(items in proptest::collection::vec(dosed_ingredient(), 0..12)) {
        let result = evaluate_full(&items);
        let expected: Vec<_> = items
            .iter()
            .map(|i| i.tier())
            .filter(|t| matches!(t, SafetyTier::Caution | SafetyTier::Risk))
            .collect();
        let actual: Vec<_> = result.issues.iter().map(|i| i.severity).collect();
        prop_assert_eq!(actual, expected);
    }

    /// PROPERTY: evaluation has no hidden state.
    #[test]
    fn property_evaluation_idempotent(items in proptest::collection::vec(dosed_ingredient(), 0..8)) {
        prop_assert_eq!(evaluate_full(&items), evaluate_full(&items));
    }
}

//! Evaluation Fingerprints - SHA-256 over Canonical JSON
//!
//! Same resolved items and same verdict always give the same fingerprint,
//! whatever the key order of the serialized structs.

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::compliance::{ComplianceResult, DosedIngredient};

/// SHA-256 of bytes as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Serialize with object keys sorted at every depth and no whitespace.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(value)?;
    serde_json::to_string(&sorted(value))
}

fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sorted(v))).collect::<Map<_, _>>())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}

/// fingerprint = sha256(engine_version + ":" + canonical(items) + ":" + canonical(result))
pub fn evaluation_fingerprint(
    items: &[DosedIngredient],
    result: &ComplianceResult,
    engine_version: &str,
) -> Result<String, serde_json::Error> {
    let combined = format!(
        "{}:{}:{}",
        engine_version,
        canonical_json(&items)?,
        canonical_json(result)?
    );
    Ok(sha256_hex(combined.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::evaluate_full;
    use crate::dose::{Dose, DoseUnit};
    use rust_decimal::Decimal;
    use serde_json::json;

    fn items() -> Vec<DosedIngredient> {
        vec![DosedIngredient {
            ingredient_id: "kava".into(),
            name: "Kava Root".into(),
            category: "Herbs".into(),
            safety: "Contains alkaloids".into(),
            declared_tier: None,
            dose: Dose::new(Decimal::new(250, 0), DoseUnit::Mg),
        }]
    }

    #[test]
    fn test_canonical_json_sorted() {
        let obj = json!({"z": 1, "a": {"y": 2, "b": 3}});
        assert_eq!(canonical_json(&obj).unwrap(), r#"{"a":{"b":3,"y":2},"z":1}"#);
    }

    #[test]
    fn test_sha256_known_value() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_fingerprint_stable_and_input_sensitive() {
        let items = items();
        let result = evaluate_full(&items);
        let first = evaluation_fingerprint(&items, &result, "1.0.0").unwrap();
        let second = evaluation_fingerprint(&items, &evaluate_full(&items), "1.0.0").unwrap();
        assert_eq!(first, second);

        let mut changed = items.clone();
        changed[0].dose = Dose::new(Decimal::new(300, 0), DoseUnit::Mg);
        let third = evaluation_fingerprint(&changed, &evaluate_full(&changed), "1.0.0").unwrap();
        assert_ne!(first, third);
    }
}

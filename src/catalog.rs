//! Ingredient Catalog - Read-Only Lookup for Evaluation
//!
//! The catalog is loaded from a versioned JSON document. Names are unique:
//! a repeated name replaces the earlier entry, and blank names are skipped.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::classifier::{color_for, mentions_risk_keyword, ColorCode, SafetyTier};
use crate::compliance::SummaryCounts;
use crate::policy::{resolve_tier, TierSource};
use crate::ENGINE_VERSION;

pub type IngredientId = String;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid catalog document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid version string: {0}")]
    InvalidVersion(String),

    #[error("Catalog {0} requires engine >= {1}, current is {2}")]
    EngineVersionMismatch(String, String, String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub source: String,
    /// Free-text safety descriptor, the input to classification
    #[serde(default)]
    pub safety: String,
    #[serde(default)]
    pub evidence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_tier: Option<SafetyTier>,
}

impl Ingredient {
    pub fn new(id: impl Into<IngredientId>, name: impl Into<String>, safety: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category: String::new(),
            source: String::new(),
            safety: safety.into(),
            evidence: String::new(),
            declared_tier: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_declared_tier(mut self, tier: SafetyTier) -> Self {
        self.declared_tier = Some(tier);
        self
    }

    pub fn safety_tier(&self) -> SafetyTier {
        resolve_tier(self.declared_tier, &self.safety).0
    }

    pub fn tier_source(&self) -> TierSource {
        resolve_tier(self.declared_tier, &self.safety).1
    }

    pub fn safety_color(&self) -> ColorCode {
        color_for(self.safety_tier())
    }

    fn trimmed(self) -> Self {
        fn trim(value: String) -> String {
            value.trim().to_string()
        }

        Self {
            name: trim(self.name),
            category: trim(self.category),
            source: trim(self.source),
            safety: trim(self.safety),
            evidence: trim(self.evidence),
            ..self
        }
    }
}

/// Ingredient lookup consumed by the compliance engine.
pub trait IngredientLookup {
    fn ingredient(&self, id: &str) -> Option<&Ingredient>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogDocument {
    pub catalog_version: String,
    pub engine_min_version: String,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
}

/// Case-insensitive substring filters; empty fields match everything.
#[derive(Debug, Clone, Default)]
pub struct IngredientFilter {
    pub category: Option<String>,
    pub source: Option<String>,
    pub safety: Option<String>,
    pub exclude_risk: bool,
}

impl IngredientFilter {
    pub fn matches(&self, ingredient: &Ingredient) -> bool {
        fn contains(haystack: &str, needle: &Option<String>) -> bool {
            match needle {
                Some(n) if !n.is_empty() => haystack.to_lowercase().contains(&n.to_lowercase()),
                _ => true,
            }
        }

        contains(&ingredient.category, &self.category)
            && contains(&ingredient.source, &self.source)
            && contains(&ingredient.safety, &self.safety)
            && !(self.exclude_risk && mentions_risk_keyword(&ingredient.safety))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total: usize,
    /// UNKNOWN ingredients are counted in no level
    pub by_safety_level: SummaryCounts,
    /// Distinct category values, a blank category counting as one
    pub categories: usize,
}

pub struct IngredientCatalog {
    version: String,
    ingredients: HashMap<IngredientId, Ingredient>,
}

impl IngredientCatalog {
    pub fn new() -> Self {
        Self {
            version: "0.0.0".to_string(),
            ingredients: HashMap::new(),
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path)?;
        let document: CatalogDocument = serde_json::from_str(&content)?;
        let catalog = Self::from_document(document)?;
        info!(
            path = %path.display(),
            version = %catalog.version,
            ingredients = catalog.len(),
            "loaded ingredient catalog"
        );
        Ok(catalog)
    }

    pub fn from_document(document: CatalogDocument) -> Result<Self, CatalogError> {
        check_engine_version(&document)?;

        let mut catalog = Self::new();
        catalog.version = document.catalog_version;
        for (index, ingredient) in document.ingredients.into_iter().enumerate() {
            let ingredient = ingredient.trimmed();
            if ingredient.name.is_empty() {
                warn!(entry = index, id = %ingredient.id, "skipping catalog entry with no name");
                continue;
            }
            catalog.register(ingredient);
        }
        Ok(catalog)
    }

    /// Insert or replace by unique name. Returns every entry displaced:
    /// the one sharing the name and, if different, the one sharing the id.
    pub fn register(&mut self, ingredient: Ingredient) -> Vec<Ingredient> {
        let mut displaced = Vec::new();

        let existing_id = self.ingredients
            .values()
            .find(|i| i.name == ingredient.name)
            .map(|i| i.id.clone());
        if let Some(old) = existing_id.and_then(|id| self.ingredients.remove(&id)) {
            debug!(name = %old.name, "replacing catalog entry");
            displaced.push(old);
        }

        if let Some(clash) = self.ingredients.insert(ingredient.id.clone(), ingredient) {
            warn!(id = %clash.id, name = %clash.name, "catalog id reused by another name, dropping entry");
            displaced.push(clash);
        }
        displaced
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn get(&self, id: &str) -> Option<&Ingredient> {
        self.ingredients.get(id)
    }

    pub fn len(&self) -> usize {
        self.ingredients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ingredients.is_empty()
    }

    /// All ingredients ordered by name.
    pub fn list(&self) -> Vec<&Ingredient> {
        self.search(&IngredientFilter::default())
    }

    pub fn search(&self, filter: &IngredientFilter) -> Vec<&Ingredient> {
        let mut found: Vec<_> = self.ingredients
            .values()
            .filter(|i| filter.matches(i))
            .collect();
        found.sort_by(|a, b| a.name.cmp(&b.name));
        found
    }

    pub fn categories(&self) -> Vec<String> {
        self.distinct(|i| &i.category)
    }

    pub fn sources(&self) -> Vec<String> {
        self.distinct(|i| &i.source)
    }

    pub fn stats(&self) -> CatalogStats {
        let mut by_safety_level = SummaryCounts::default();
        for ingredient in self.ingredients.values() {
            match ingredient.safety_tier() {
                SafetyTier::Safe => by_safety_level.safe += 1,
                SafetyTier::Caution => by_safety_level.caution += 1,
                SafetyTier::Risk => by_safety_level.risk += 1,
                SafetyTier::Unknown => {}
            }
        }

        CatalogStats {
            total: self.len(),
            by_safety_level,
            categories: self.ingredients
                .values()
                .map(|i| i.category.as_str())
                .collect::<BTreeSet<_>>()
                .len(),
        }
    }

    fn distinct<F>(&self, field: F) -> Vec<String>
    where
        F: Fn(&Ingredient) -> &String,
    {
        self.ingredients
            .values()
            .map(|i| field(i))
            .filter(|value| !value.is_empty())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

impl IngredientLookup for IngredientCatalog {
    fn ingredient(&self, id: &str) -> Option<&Ingredient> {
        self.get(id)
    }
}

impl Default for IngredientCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn check_engine_version(document: &CatalogDocument) -> Result<(), CatalogError> {
    let engine_ver = semver::Version::parse(ENGINE_VERSION)
        .map_err(|_| CatalogError::InvalidVersion(ENGINE_VERSION.to_string()))?;
    let min_ver = semver::Version::parse(&document.engine_min_version)
        .map_err(|_| CatalogError::InvalidVersion(document.engine_min_version.clone()))?;

    if engine_ver < min_ver {
        return Err(CatalogError::EngineVersionMismatch(
            document.catalog_version.clone(),
            document.engine_min_version.clone(),
            ENGINE_VERSION.to_string(),
        ));
    }
    Ok(())
}

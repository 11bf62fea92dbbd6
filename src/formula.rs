//! Formulas - Ordered Ingredient Doses
//!
//! A formula owns its items. At most one item per ingredient, doses are
//! never negative, and items stay ordered by their `order` hint with
//! insertion order breaking ties.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::IngredientId;
use crate::dose::{total_weight_mg, Dose, DoseUnit};

pub type FormulaId = String;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormulaError {
    #[error("Unsupported dose unit: {0} (expected mg, mcg, g or IU)")]
    UnsupportedUnit(String),

    #[error("Dose for ingredient {0} must not be negative")]
    NegativeDose(IngredientId),

    #[error("Ingredient {0} is already in this formula")]
    DuplicateIngredient(IngredientId),

    #[error("Dose {0} is too large to convert to milligrams")]
    DoseOutOfRange(String),

    #[error("Total formula weight is too large to represent")]
    WeightOutOfRange,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FormulaItem {
    pub ingredient_id: IngredientId,
    pub dose_value: Decimal,
    pub dose_unit: DoseUnit,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub order: u32,
}

impl FormulaItem {
    pub fn new(ingredient_id: impl Into<IngredientId>, dose_value: Decimal, dose_unit: DoseUnit) -> Self {
        Self {
            ingredient_id: ingredient_id.into(),
            dose_value,
            dose_unit,
            notes: String::new(),
            order: 0,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_order(mut self, order: u32) -> Self {
        self.order = order;
        self
    }

    pub fn dose(&self) -> Dose {
        Dose::new(self.dose_value, self.dose_unit)
    }
}

/// Wire shape of a formula before its item invariants are checked.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FormulaDraft {
    #[serde(default)]
    id: Option<FormulaId>,
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    region: String,
    #[serde(default)]
    items: Vec<FormulaItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "FormulaDraft")]
pub struct Formula {
    pub id: Option<FormulaId>,
    pub name: String,
    pub description: String,
    pub region: String,
    items: Vec<FormulaItem>,
}

impl Formula {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: String::new(),
            region: String::new(),
            items: vec![],
        }
    }

    pub fn with_id(mut self, id: impl Into<FormulaId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Add an item, keeping the collection ordered.
    pub fn add_item(&mut self, item: FormulaItem) -> Result<(), FormulaError> {
        if item.dose_value < Decimal::ZERO {
            return Err(FormulaError::NegativeDose(item.ingredient_id));
        }
        if self.contains(&item.ingredient_id) {
            return Err(FormulaError::DuplicateIngredient(item.ingredient_id));
        }

        let position = self.items
            .iter()
            .position(|existing| existing.order > item.order)
            .unwrap_or(self.items.len());
        self.items.insert(position, item);
        Ok(())
    }

    pub fn remove_item(&mut self, ingredient_id: &str) -> Option<FormulaItem> {
        let index = self.items.iter().position(|i| i.ingredient_id == ingredient_id)?;
        Some(self.items.remove(index))
    }

    pub fn contains(&self, ingredient_id: &str) -> bool {
        self.items.iter().any(|i| i.ingredient_id == ingredient_id)
    }

    pub fn items(&self) -> &[FormulaItem] {
        &self.items
    }

    pub fn ingredient_count(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_weight_mg(&self) -> Result<Decimal, FormulaError> {
        let doses: Vec<Dose> = self.items.iter().map(FormulaItem::dose).collect();
        total_weight_mg(&doses)
    }
}

impl TryFrom<FormulaDraft> for Formula {
    type Error = FormulaError;

    fn try_from(draft: FormulaDraft) -> Result<Self, Self::Error> {
        let mut formula = Formula {
            id: draft.id,
            name: draft.name,
            description: draft.description,
            region: draft.region,
            items: Vec::with_capacity(draft.items.len()),
        };
        for item in draft.items {
            formula.add_item(item)?;
        }
        Ok(formula)
    }
}

//! Doses and Weight Aggregation
//!
//! Mass units convert to milligrams. IU has no mass equivalent and is
//! left out of weight totals. Totals are rounded half-even to 2 places.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::formula::FormulaError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DoseUnit {
    Mg,
    Mcg,
    G,
    Iu,
}

impl DoseUnit {
    pub const ALL: [DoseUnit; 4] = [DoseUnit::Mg, DoseUnit::Mcg, DoseUnit::G, DoseUnit::Iu];

    pub fn as_str(&self) -> &'static str {
        match self {
            DoseUnit::Mg => "mg",
            DoseUnit::Mcg => "mcg",
            DoseUnit::G => "g",
            DoseUnit::Iu => "IU",
        }
    }

    /// Multiplier to milligrams, `None` for IU.
    pub fn mg_factor(&self) -> Option<Decimal> {
        match self {
            DoseUnit::Mg => Some(Decimal::ONE),
            DoseUnit::G => Some(Decimal::ONE_THOUSAND),
            DoseUnit::Mcg => Some(Decimal::new(1, 3)),
            DoseUnit::Iu => None,
        }
    }
}

impl fmt::Display for DoseUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DoseUnit {
    type Err = FormulaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DoseUnit::ALL
            .into_iter()
            .find(|unit| unit.as_str() == s)
            .ok_or_else(|| FormulaError::UnsupportedUnit(s.to_string()))
    }
}

impl TryFrom<String> for DoseUnit {
    type Error = FormulaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DoseUnit> for String {
    fn from(unit: DoseUnit) -> Self {
        unit.as_str().to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dose {
    pub value: Decimal,
    pub unit: DoseUnit,
}

impl Dose {
    pub fn new(value: Decimal, unit: DoseUnit) -> Self {
        Self { value, unit }
    }

    /// Mass in milligrams, `Ok(None)` for IU.
    pub fn to_mg(&self) -> Result<Option<Decimal>, FormulaError> {
        match self.unit.mg_factor() {
            Some(factor) => self
                .value
                .checked_mul(factor)
                .map(Some)
                .ok_or_else(|| FormulaError::DoseOutOfRange(self.to_string())),
            None => Ok(None),
        }
    }
}

/// "500mg", "0.5g", "400IU": no separator, trailing zeros dropped.
impl fmt::Display for Dose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value.normalize(), self.unit)
    }
}

/// Sum of all mass doses in milligrams, in item order.
pub fn total_weight_mg<'a, I>(doses: I) -> Result<Decimal, FormulaError>
where
    I: IntoIterator<Item = &'a Dose>,
{
    let total = doses.into_iter().try_fold(Decimal::ZERO, |acc, dose| match dose.to_mg()? {
        Some(mg) => acc.checked_add(mg).ok_or(FormulaError::WeightOutOfRange),
        None => Ok(acc),
    })?;
    Ok(to_hundredths(total))
}

/// Label serving size: grams above 1000 mg, milligrams otherwise.
pub fn serving_size_display(total_mg: Decimal) -> String {
    if total_mg > Decimal::ONE_THOUSAND {
        format!("{} g", to_hundredths(total_mg / Decimal::ONE_THOUSAND))
    } else {
        format!("{} mg", to_hundredths(total_mg))
    }
}

fn to_hundredths(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven);
    rounded.rescale(2);
    rounded
}

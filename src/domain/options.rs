//! Filter-option extraction.
//!
//! Scans the whole current document, not a filtered subset, so the filter
//! UI always reflects every value present in the menu.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::menu::MenuDocument;
use crate::domain::vocab;

/// Distinct selectable values present in the document, each sorted
/// lexicographically. Calorie labels keep that lexicographic order even
/// though it differs from bucket order ("600+" sorts after "100-200" but
/// before "700" would); the contract documents this as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    #[serde(rename = "dishTypes")]
    pub dish_types: Vec<String>,
    pub allergens: Vec<String>,
    #[serde(rename = "calorieRanges")]
    pub calorie_ranges: Vec<String>,
}

/// [`FilterOptions`] plus the static spice scale, the exact payload of the
/// filter-options endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOptionsPayload {
    #[serde(flatten)]
    pub options: FilterOptions,
    #[serde(rename = "spiceLevels")]
    pub spice_levels: Vec<u8>,
}

impl FilterOptionsPayload {
    pub fn new(options: FilterOptions) -> Self {
        Self {
            options,
            spice_levels: vocab::SPICE_LEVELS.to_vec(),
        }
    }
}

pub fn extract_filter_options(document: &MenuDocument) -> FilterOptions {
    let mut categories = BTreeSet::new();
    let mut dish_types = BTreeSet::new();
    let mut allergens = BTreeSet::new();
    let mut calorie_ranges = BTreeSet::new();

    for category in &document.categories {
        categories.insert(category.category.clone());
        for dish in &category.dishes {
            for option in &dish.options {
                dish_types.extend(option.dish_type.iter().cloned());
                allergens.extend(option.allergens.iter().cloned());
                if !option.calorie_range.is_empty() {
                    calorie_ranges.insert(option.calorie_range.clone());
                }
            }
        }
    }

    FilterOptions {
        categories: categories.into_iter().collect(),
        dish_types: dish_types.into_iter().collect(),
        allergens: allergens.into_iter().collect(),
        calorie_ranges: calorie_ranges.into_iter().collect(),
    }
}

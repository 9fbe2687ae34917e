//! Fixed selection vocabularies shared by validation and filter options.

use std::collections::HashSet;

use once_cell::sync::Lazy;

/// Dietary/ingredient tags an option may carry.
pub const DISH_TYPES: &[&str] = &[
    "Vegetarian",
    "Vegan",
    "Chicken",
    "Lamb",
    "Indian Paneer",
    "Prawn",
    "Kng Prawn",
    "Fish",
    "Meat (Mutton)",
    "Gluten free",
    "Sweet",
    "Sour",
    "Creamy",
    "Healthy",
];

/// Declared substances of concern, used for exclusion filtering.
pub const ALLERGENS: &[&str] = &[
    "Eggs",
    "Fish",
    "Milk",
    "Mustard",
    "Tree Nut (Almond / Cashew Nut)",
    "Sesame Seed",
    "Sulphur dioxide (sulphites)",
    "Soya",
    "Celery",
    "Cereals (Gluten, Wheat)",
    "Cereals (Gluten, Barley)",
    "Cereals (Gluten, Rye)",
    "Cereals (Gluten, Oats)",
    "Crustaceans",
    "No Allergen",
    "Peanut",
    "Molluscs",
];

/// Bucketed calorie labels. Ordered by bucket, not lexicographically.
pub const CALORIE_RANGES: &[&str] = &[
    "0-100", "100-200", "200-300", "300-400", "400-500", "500-600", "600+",
];

/// Display scale advertised through the filter-options endpoint.
///
/// Write-side validation bounds `spice_level` to 1..=4; the public UI
/// scale has always been five points. The mismatch is inherited contract,
/// kept visible instead of silently widened.
pub const SPICE_LEVELS: &[u8] = &[1, 2, 3, 4, 5];

/// Upper bound accepted when persisting a dish's spice level.
pub const MAX_SPICE_LEVEL: u8 = 4;

static DISH_TYPE_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| DISH_TYPES.iter().copied().collect());
static ALLERGEN_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ALLERGENS.iter().copied().collect());
static CALORIE_RANGE_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| CALORIE_RANGES.iter().copied().collect());

pub fn is_dish_type(value: &str) -> bool {
    DISH_TYPE_SET.contains(value)
}

pub fn is_allergen(value: &str) -> bool {
    ALLERGEN_SET.contains(value)
}

pub fn is_calorie_range(value: &str) -> bool {
    CALORIE_RANGE_SET.contains(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_membership() {
        assert!(is_dish_type("Vegan"));
        assert!(!is_dish_type("vegan"));
        assert!(is_allergen("Milk"));
        assert!(!is_allergen("Dairy"));
        assert!(is_calorie_range("600+"));
        assert!(!is_calorie_range("700+"));
    }

    #[test]
    fn spice_scales_disagree_by_one() {
        assert_eq!(SPICE_LEVELS.last(), Some(&5));
        assert_eq!(MAX_SPICE_LEVEL, 4);
    }
}

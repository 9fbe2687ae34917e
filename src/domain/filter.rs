//! Dish filtering semantics.
//!
//! Five independent dimensions, AND-combined per dish. A dimension with no
//! value supplied is vacuously true. Inclusion dimensions fail closed on
//! missing data; the allergen exclusion fails open (an option without
//! declared allergens cannot match an exclusion).

use serde::{Deserialize, Serialize};

use crate::domain::menu::FlattenedDish;

/// Request-scoped filter values, already normalized: multi-select sets are
/// sorted and deduplicated, empty means "dimension not active".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub spice_level: Option<u8>,
    pub categories: Vec<String>,
    pub dish_types: Vec<String>,
    pub allergens: Vec<String>,
    pub calorie_range: Option<String>,
}

impl FilterSpec {
    pub fn is_empty(&self) -> bool {
        self.spice_level.is_none()
            && self.categories.is_empty()
            && self.dish_types.is_empty()
            && self.allergens.is_empty()
            && self.calorie_range.is_none()
    }
}

/// Keep the dishes passing every active dimension, in input order.
pub fn filter_dishes(dishes: &[FlattenedDish], spec: &FilterSpec) -> Vec<FlattenedDish> {
    dishes
        .iter()
        .filter(|dish| matches(dish, spec))
        .cloned()
        .collect()
}

fn matches(dish: &FlattenedDish, spec: &FilterSpec) -> bool {
    if let Some(level) = spec.spice_level
        && dish.spice_level != level
    {
        return false;
    }

    if !spec.categories.is_empty() && !spec.categories.iter().any(|c| *c == dish.category) {
        return false;
    }

    if !spec.dish_types.is_empty() {
        let any_option_matches = dish.options.iter().any(|option| {
            option
                .dish_type
                .iter()
                .any(|value| spec.dish_types.iter().any(|wanted| wanted == value))
        });
        if !any_option_matches {
            return false;
        }
    }

    if let Some(range) = &spec.calorie_range {
        let any_option_matches = dish
            .options
            .iter()
            .any(|option| option.calorie_range == *range);
        if !any_option_matches {
            return false;
        }
    }

    if !spec.allergens.is_empty() {
        let any_option_excluded = dish.options.iter().any(|option| {
            option
                .allergens
                .iter()
                .any(|value| spec.allergens.iter().any(|excluded| excluded == value))
        });
        if any_option_excluded {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::menu::fixtures::{dish, document, option};
    use crate::domain::menu::flatten;

    fn sample() -> Vec<crate::domain::menu::FlattenedDish> {
        let mut curry_option = option("a", 9.5);
        curry_option.dish_type = vec!["Chicken".to_string()];
        let mut rice_option = option("b", 3.5);
        rice_option.allergens = vec!["Milk".to_string()];
        rice_option.calorie_range = "100-200".to_string();

        let doc = document(vec![
            ("Curry", vec![dish("d1", "Korma", 2, vec![curry_option])]),
            ("Rice", vec![dish("d2", "Pilau", 2, vec![rice_option])]),
        ]);
        flatten(&doc)
    }

    #[test]
    fn empty_spec_returns_everything_in_order() {
        let dishes = sample();
        let result = filter_dishes(&dishes, &FilterSpec::default());
        assert_eq!(result, dishes);
    }

    #[test]
    fn dimensions_are_and_combined() {
        let dishes = sample();
        let spec = FilterSpec {
            spice_level: Some(2),
            categories: vec!["Curry".to_string()],
            ..Default::default()
        };
        let result = filter_dishes(&dishes, &spec);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].dish_id, "d1");
    }

    #[test]
    fn spice_level_is_exact_equality() {
        let dishes = sample();
        let spec = FilterSpec {
            spice_level: Some(3),
            ..Default::default()
        };
        assert!(filter_dishes(&dishes, &spec).is_empty());
    }

    #[test]
    fn allergen_exclusion_drops_matching_dishes() {
        let dishes = sample();
        let spec = FilterSpec {
            allergens: vec!["Milk".to_string()],
            ..Default::default()
        };
        let result = filter_dishes(&dishes, &spec);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].dish_id, "d1");
    }

    #[test]
    fn dish_type_matches_any_option() {
        let mut plain = option("a", 5.0);
        plain.dish_type = vec!["Vegetarian".to_string()];
        let mut chicken = option("b", 6.0);
        chicken.dish_type = vec!["Chicken".to_string()];
        let doc = document(vec![(
            "Curry",
            vec![dish("d1", "Mixed", 1, vec![plain, chicken])],
        )]);
        let dishes = flatten(&doc);

        let spec = FilterSpec {
            dish_types: vec!["Chicken".to_string()],
            ..Default::default()
        };
        assert_eq!(filter_dishes(&dishes, &spec).len(), 1);

        let spec = FilterSpec {
            dish_types: vec!["Vegan".to_string()],
            ..Default::default()
        };
        assert!(filter_dishes(&dishes, &spec).is_empty());
    }

    #[test]
    fn calorie_range_matches_any_option() {
        let dishes = sample();
        let spec = FilterSpec {
            calorie_range: Some("100-200".to_string()),
            ..Default::default()
        };
        let result = filter_dishes(&dishes, &spec);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].dish_id, "d2");
    }

    #[test]
    fn zero_option_dish_fails_closed_for_inclusion() {
        let doc = document(vec![("Curry", vec![dish("d1", "Ghost", 1, vec![])])]);
        let dishes = flatten(&doc);

        let spec = FilterSpec {
            dish_types: vec!["Chicken".to_string()],
            ..Default::default()
        };
        assert!(filter_dishes(&dishes, &spec).is_empty());

        // The exclusion filter fails open: nothing to exclude on.
        let spec = FilterSpec {
            allergens: vec!["Milk".to_string()],
            ..Default::default()
        };
        assert_eq!(filter_dishes(&dishes, &spec).len(), 1);
    }

    #[test]
    fn unmatched_category_yields_empty_success() {
        let dishes = sample();
        let spec = FilterSpec {
            categories: vec!["NonexistentCategory".to_string()],
            ..Default::default()
        };
        assert!(filter_dishes(&dishes, &spec).is_empty());
    }

    #[test]
    fn filtering_is_idempotent() {
        let dishes = sample();
        let spec = FilterSpec {
            spice_level: Some(2),
            allergens: vec!["Milk".to_string()],
            ..Default::default()
        };
        let once = filter_dishes(&dishes, &spec);
        let twice = filter_dishes(&once, &spec);
        assert_eq!(once, twice);
    }
}

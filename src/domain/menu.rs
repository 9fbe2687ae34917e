//! The menu aggregate and its derived read views.
//!
//! A deployment owns exactly one [`MenuDocument`]: an ordered tree of
//! categories, dishes and purchasable options. The tree is treated as an
//! immutable value between load and save; services transform a copy and
//! ask the store to replace the whole document.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::DomainError;
use crate::domain::vocab;

/// How many dishes the featured strip shows at most.
pub const FEATURED_DISH_LIMIT: usize = 7;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MenuDocument {
    #[serde(default)]
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub category_id: String,
    pub category: String,
    #[serde(default)]
    pub dishes: Vec<Dish>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    #[serde(default)]
    pub dish_id: String,
    pub dish_title: String,
    pub spice_level: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub options: Vec<DishOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishOption {
    #[serde(default)]
    pub option_id: String,
    pub option_name: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub detailed_description: String,
    pub price: f64,
    #[serde(default)]
    pub dish_type: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default)]
    pub calorie_range: String,
    #[serde(default)]
    pub nutrition: Nutrition,
}

/// Structured nutrition facts. Opaque to filtering, pass-through only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutrition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_kj: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_kcal: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub of_which_saturates: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carbohydrate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub of_which_sugars: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_weight_grams: Option<f64>,
}

/// A dish denormalized for query and display: the dish joined with its
/// parent category name plus two computed scalars. Never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlattenedDish {
    pub dish_id: String,
    pub dish_title: String,
    pub spice_level: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    pub options: Vec<DishOption>,
    pub category: String,
    pub description: String,
    #[serde(rename = "lowestPrice")]
    pub lowest_price: f64,
}

/// Flatten the category tree into one record per dish, category-major,
/// dish-minor, preserving document order.
pub fn flatten(document: &MenuDocument) -> Vec<FlattenedDish> {
    document
        .categories
        .iter()
        .flat_map(|category| {
            category.dishes.iter().map(|dish| FlattenedDish {
                dish_id: dish.dish_id.clone(),
                dish_title: dish.dish_title.clone(),
                spice_level: dish.spice_level,
                image_url: dish.image_url.clone(),
                is_featured: dish.is_featured,
                options: dish.options.clone(),
                category: category.category.clone(),
                description: dish
                    .options
                    .first()
                    .map(|option| option.short_description.clone())
                    .unwrap_or_default(),
                lowest_price: dish
                    .options
                    .iter()
                    .map(|option| option.price)
                    .fold(f64::INFINITY, f64::min),
            })
        })
        .collect()
}

/// Flattened dishes marked as featured, capped at [`FEATURED_DISH_LIMIT`].
pub fn featured_dishes(document: &MenuDocument) -> Vec<FlattenedDish> {
    flatten(document)
        .into_iter()
        .filter(|dish| dish.is_featured)
        .take(FEATURED_DISH_LIMIT)
        .collect()
}

/// Assign fresh UUIDs to every entity created without an identifier.
/// Existing identifiers are never touched.
pub fn assign_missing_ids(document: &mut MenuDocument) {
    for category in &mut document.categories {
        if category.category_id.is_empty() {
            category.category_id = Uuid::new_v4().to_string();
        }
        for dish in &mut category.dishes {
            assign_missing_dish_ids(dish);
        }
    }
}

pub fn assign_missing_dish_ids(dish: &mut Dish) {
    if dish.dish_id.is_empty() {
        dish.dish_id = Uuid::new_v4().to_string();
    }
    for option in &mut dish.options {
        if option.option_id.is_empty() {
            option.option_id = Uuid::new_v4().to_string();
        }
    }
}

pub fn validate_category(category: &Category) -> Result<(), DomainError> {
    if category.category.trim().is_empty() {
        return Err(DomainError::validation("category name must not be empty"));
    }
    for dish in &category.dishes {
        validate_dish(dish)?;
    }
    Ok(())
}

pub fn validate_dish(dish: &Dish) -> Result<(), DomainError> {
    if dish.dish_title.trim().is_empty() {
        return Err(DomainError::validation("dish title must not be empty"));
    }
    if dish.spice_level < 1 || dish.spice_level > vocab::MAX_SPICE_LEVEL {
        return Err(DomainError::validation(format!(
            "spice level {} outside 1..={}",
            dish.spice_level,
            vocab::MAX_SPICE_LEVEL
        )));
    }
    if dish.options.is_empty() {
        return Err(DomainError::validation(format!(
            "dish `{}` must have at least one option",
            dish.dish_title
        )));
    }
    for option in &dish.options {
        validate_option(option)?;
    }
    Ok(())
}

pub fn validate_option(option: &DishOption) -> Result<(), DomainError> {
    if option.option_name.trim().is_empty() {
        return Err(DomainError::validation("option name must not be empty"));
    }
    if !(option.price > 0.0) {
        return Err(DomainError::validation(format!(
            "option `{}` price must be positive",
            option.option_name
        )));
    }
    if option.dish_type.is_empty() {
        return Err(DomainError::validation(format!(
            "option `{}` must declare at least one dish type",
            option.option_name
        )));
    }
    for value in &option.dish_type {
        if !vocab::is_dish_type(value) {
            return Err(DomainError::validation(format!(
                "unknown dish type `{value}`"
            )));
        }
    }
    for value in &option.allergens {
        if !vocab::is_allergen(value) {
            return Err(DomainError::validation(format!("unknown allergen `{value}`")));
        }
    }
    if !vocab::is_calorie_range(&option.calorie_range) {
        return Err(DomainError::validation(format!(
            "unknown calorie range `{}`",
            option.calorie_range
        )));
    }
    Ok(())
}

pub fn validate_document(document: &MenuDocument) -> Result<(), DomainError> {
    for category in &document.categories {
        validate_category(category)?;
    }
    Ok(())
}

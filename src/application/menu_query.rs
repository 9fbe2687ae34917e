//! Read-side query service.
//!
//! Every query is cache-backed with the read-through pattern: cache lookup,
//! then store fetch on miss, then cache write. Store failures propagate to
//! the caller; cache failures never do, and failures are never cached.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::application::repos::{MenuRepo, RepoError};
use crate::cache::{
    CacheConfig, FILTER_OPTIONS_KEY, FULL_MENU_KEY, MenuCache, filtered_menu_key,
};
use crate::domain::error::DomainError;
use crate::domain::filter::{FilterSpec, filter_dishes};
use crate::domain::menu::{FlattenedDish, MenuDocument, featured_dishes, flatten};
use crate::domain::options::{FilterOptionsPayload, extract_filter_options};
use crate::domain::vocab;

const TARGET: &str = "piatto::query";

#[derive(Clone)]
pub struct MenuQueryService {
    repo: Arc<dyn MenuRepo>,
    cache: Arc<MenuCache>,
    config: CacheConfig,
}

impl MenuQueryService {
    pub fn new(repo: Arc<dyn MenuRepo>, cache: Arc<MenuCache>, config: CacheConfig) -> Self {
        Self {
            repo,
            cache,
            config,
        }
    }

    /// The whole menu document. `RepoError::NotFound` on an uninitialized
    /// deployment is an expected outcome, not a crash condition.
    pub async fn full_menu(&self) -> Result<MenuDocument, RepoError> {
        if let Some(document) = self.cache.get_json::<MenuDocument>(FULL_MENU_KEY).await {
            debug!(target: TARGET, key = FULL_MENU_KEY, "served from cache");
            return Ok(document);
        }

        let record = self.repo.load_menu().await?.ok_or(RepoError::NotFound)?;
        // The record's version is storage bookkeeping; only the document
        // value crosses this boundary or enters the cache.
        self.cache
            .set_json(FULL_MENU_KEY, &record.document, self.config.full_menu_ttl())
            .await;
        Ok(record.document)
    }

    /// The flattened menu narrowed by `spec`. An empty result is a
    /// success, never an error.
    pub async fn filtered_menu(&self, spec: &FilterSpec) -> Result<Vec<FlattenedDish>, RepoError> {
        let key = filtered_menu_key(spec);
        if let Some(dishes) = self.cache.get_json::<Vec<FlattenedDish>>(&key).await {
            debug!(target: TARGET, key, "served from cache");
            return Ok(dishes);
        }

        let document = self.full_menu().await?;
        let dishes = filter_dishes(&flatten(&document), spec);
        self.cache
            .set_json(&key, &dishes, self.config.filtered_menu_ttl())
            .await;
        Ok(dishes)
    }

    /// Distinct selectable values in the current document plus the static
    /// spice scale.
    pub async fn filter_options(&self) -> Result<FilterOptionsPayload, RepoError> {
        if let Some(payload) = self
            .cache
            .get_json::<FilterOptionsPayload>(FILTER_OPTIONS_KEY)
            .await
        {
            debug!(target: TARGET, key = FILTER_OPTIONS_KEY, "served from cache");
            return Ok(payload);
        }

        let document = self.full_menu().await?;
        let payload = FilterOptionsPayload::new(extract_filter_options(&document));
        self.cache
            .set_json(
                FILTER_OPTIONS_KEY,
                &payload,
                self.config.filter_options_ttl(),
            )
            .await;
        Ok(payload)
    }

    /// Featured dishes, straight from the store (uncached).
    pub async fn featured(&self) -> Result<Vec<FlattenedDish>, RepoError> {
        let record = self.repo.load_menu().await?.ok_or(RepoError::NotFound)?;
        Ok(featured_dishes(&record.document))
    }
}

/// Wire-shape filter parameters as they arrive over HTTP. Multi-select
/// values are accepted both as comma-separated strings (query strings) and
/// as arrays (JSON bodies); normalization into a [`FilterSpec`] happens
/// here so the domain never sees encoding variants.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilterParams {
    #[serde(rename = "spiceLevel")]
    pub spice_level: Option<u8>,
    pub categories: Option<MultiSelect>,
    #[serde(rename = "dishTypes")]
    pub dish_types: Option<MultiSelect>,
    pub allergens: Option<MultiSelect>,
    #[serde(rename = "calorieRange")]
    pub calorie_range: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum MultiSelect {
    One(String),
    Many(Vec<String>),
}

impl MultiSelect {
    /// Split comma-separated strings, trim whitespace, drop empties, then
    /// sort and deduplicate. Array order is deliberately not preserved:
    /// the canonical form is what cache keys are derived from.
    fn normalize(&self) -> Vec<String> {
        let mut values: Vec<String> = match self {
            MultiSelect::One(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
                .collect(),
            MultiSelect::Many(items) => items
                .iter()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .collect(),
        };
        values.sort();
        values.dedup();
        values
    }
}

impl FilterParams {
    pub fn into_spec(self) -> Result<FilterSpec, DomainError> {
        if let Some(level) = self.spice_level
            && !(1..=vocab::MAX_SPICE_LEVEL).contains(&level)
        {
            return Err(DomainError::validation(format!(
                "spiceLevel {level} outside 1..={}",
                vocab::MAX_SPICE_LEVEL
            )));
        }

        let dish_types = self
            .dish_types
            .as_ref()
            .map(MultiSelect::normalize)
            .unwrap_or_default();
        for value in &dish_types {
            if !vocab::is_dish_type(value) {
                return Err(DomainError::validation(format!(
                    "unknown dish type `{value}`"
                )));
            }
        }

        let allergens = self
            .allergens
            .as_ref()
            .map(MultiSelect::normalize)
            .unwrap_or_default();
        for value in &allergens {
            if !vocab::is_allergen(value) {
                return Err(DomainError::validation(format!("unknown allergen `{value}`")));
            }
        }

        if let Some(range) = self.calorie_range.as_deref()
            && !vocab::is_calorie_range(range)
        {
            return Err(DomainError::validation(format!(
                "unknown calorie range `{range}`"
            )));
        }

        Ok(FilterSpec {
            spice_level: self.spice_level,
            categories: self
                .categories
                .as_ref()
                .map(MultiSelect::normalize)
                .unwrap_or_default(),
            dish_types,
            allergens,
            calorie_range: self.calorie_range,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::filtered_menu_key;

    #[test]
    fn comma_string_and_array_normalize_identically() {
        let from_string = FilterParams {
            spice_level: Some(2),
            categories: Some(MultiSelect::One("A,B".to_string())),
            ..Default::default()
        }
        .into_spec()
        .unwrap();

        let from_array = FilterParams {
            spice_level: Some(2),
            categories: Some(MultiSelect::Many(vec!["B".to_string(), "A".to_string()])),
            ..Default::default()
        }
        .into_spec()
        .unwrap();

        assert_eq!(from_string, from_array);
        assert_eq!(
            filtered_menu_key(&from_string),
            filtered_menu_key(&from_array)
        );
    }

    #[test]
    fn whitespace_and_empties_are_dropped() {
        let spec = FilterParams {
            allergens: Some(MultiSelect::One(" Milk , Eggs ,, ".to_string())),
            ..Default::default()
        }
        .into_spec()
        .unwrap();
        assert_eq!(spec.allergens, ["Eggs", "Milk"]);
    }

    #[test]
    fn out_of_range_spice_level_is_rejected() {
        let result = FilterParams {
            spice_level: Some(5),
            ..Default::default()
        }
        .into_spec();
        assert!(result.is_err());
    }

    #[test]
    fn unknown_vocabulary_values_are_rejected() {
        let bad_type = FilterParams {
            dish_types: Some(MultiSelect::One("Mystery".to_string())),
            ..Default::default()
        };
        assert!(bad_type.into_spec().is_err());

        let bad_range = FilterParams {
            calorie_range: Some("900+".to_string()),
            ..Default::default()
        };
        assert!(bad_range.into_spec().is_err());
    }

    #[test]
    fn free_form_categories_pass_through() {
        let spec = FilterParams {
            categories: Some(MultiSelect::One("House Specials".to_string())),
            ..Default::default()
        }
        .into_spec()
        .unwrap();
        assert_eq!(spec.categories, ["House Specials"]);
    }
}

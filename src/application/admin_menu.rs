//! Write-side admin service: the mutation gateway.
//!
//! Every mutation follows the same shape: load the record, transform the
//! document as an immutable value, replace it under the loaded version,
//! then clear the cached menu namespace. Invalidation is best-effort and
//! never fails a mutation that already persisted; a version mismatch
//! surfaces as a conflict for the caller to retry.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::application::repos::{MenuRepo, RepoError};
use crate::cache::MenuCache;
use crate::domain::error::DomainError;
use crate::domain::menu::{
    self, Category, Dish, DishOption, MenuDocument, assign_missing_dish_ids, assign_missing_ids,
};

const TARGET: &str = "piatto::admin";

#[derive(Debug, Error)]
pub enum AdminMenuError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

/// Partial dish update. Absent fields keep their stored values; supplying
/// `options` replaces the whole option list; an explicit `"image_url":
/// null` clears the stored image. Identifiers never change.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DishPatch {
    pub dish_title: Option<String>,
    pub spice_level: Option<u8>,
    #[serde(default, deserialize_with = "present")]
    pub image_url: Option<Option<String>>,
    pub is_featured: Option<bool>,
    pub options: Option<Vec<DishOption>>,
}

/// Distinguishes an absent `image_url` (keep) from an explicit `null`
/// (clear): any present value deserializes to `Some(..)`.
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Clone)]
pub struct AdminMenuService {
    repo: Arc<dyn MenuRepo>,
    cache: Arc<MenuCache>,
}

impl AdminMenuService {
    pub fn new(repo: Arc<dyn MenuRepo>, cache: Arc<MenuCache>) -> Self {
        Self { repo, cache }
    }

    /// Uncached whole-document read for the admin panel.
    pub async fn menu(&self) -> Result<MenuDocument, AdminMenuError> {
        let record = self.repo.load_menu().await?.ok_or(RepoError::NotFound)?;
        Ok(record.document)
    }

    pub async fn add_dish(
        &self,
        category_id: &str,
        mut dish: Dish,
    ) -> Result<Dish, AdminMenuError> {
        assign_missing_dish_ids(&mut dish);
        menu::validate_dish(&dish)?;

        let added = dish.clone();
        self.mutate("add_dish", move |mut document| {
            let category = document
                .categories
                .iter_mut()
                .find(|candidate| candidate.category_id == category_id)
                .ok_or(DomainError::not_found("category"))?;
            category.dishes.push(dish);
            Ok(document)
        })
        .await?;
        Ok(added)
    }

    pub async fn update_dish(
        &self,
        dish_id: &str,
        patch: DishPatch,
    ) -> Result<Dish, AdminMenuError> {
        let mut updated: Option<Dish> = None;
        self.mutate("update_dish", |mut document| {
            let dish = document
                .categories
                .iter_mut()
                .flat_map(|category| category.dishes.iter_mut())
                .find(|candidate| candidate.dish_id == dish_id)
                .ok_or(DomainError::not_found("dish"))?;

            if let Some(title) = patch.dish_title.clone() {
                dish.dish_title = title;
            }
            if let Some(level) = patch.spice_level {
                dish.spice_level = level;
            }
            if let Some(image) = patch.image_url.clone() {
                dish.image_url = image;
            }
            if let Some(featured) = patch.is_featured {
                dish.is_featured = featured;
            }
            if let Some(options) = patch.options.clone() {
                dish.options = options;
            }
            assign_missing_dish_ids(dish);
            menu::validate_dish(dish)?;
            updated = Some(dish.clone());
            Ok(document)
        })
        .await?;

        // mutate() only succeeds once the closure has filled this in.
        updated.ok_or_else(|| DomainError::not_found("dish").into())
    }

    pub async fn delete_dish(&self, dish_id: &str) -> Result<(), AdminMenuError> {
        self.mutate("delete_dish", |mut document| {
            let mut found = false;
            for category in &mut document.categories {
                let before = category.dishes.len();
                category.dishes.retain(|dish| dish.dish_id != dish_id);
                found |= category.dishes.len() != before;
            }
            if !found {
                return Err(DomainError::not_found("dish"));
            }
            Ok(document)
        })
        .await
    }

    pub async fn add_category(&self, mut category: Category) -> Result<Category, AdminMenuError> {
        if category.category_id.is_empty() {
            category.category_id = uuid::Uuid::new_v4().to_string();
        }
        for dish in &mut category.dishes {
            assign_missing_dish_ids(dish);
        }
        menu::validate_category(&category)?;

        let added = category.clone();
        self.mutate("add_category", move |mut document| {
            document.categories.push(category);
            Ok(document)
        })
        .await?;
        Ok(added)
    }

    pub async fn delete_category(&self, category_id: &str) -> Result<(), AdminMenuError> {
        self.mutate("delete_category", |mut document| {
            let before = document.categories.len();
            document
                .categories
                .retain(|category| category.category_id != category_id);
            if document.categories.len() == before {
                return Err(DomainError::not_found("category"));
            }
            Ok(document)
        })
        .await
    }

    /// Remove one option from a dish. Removing the last option is refused:
    /// a dish with zero options is invalid.
    pub async fn delete_option(
        &self,
        dish_id: &str,
        option_id: &str,
    ) -> Result<(), AdminMenuError> {
        self.mutate("delete_option", |mut document| {
            let dish = document
                .categories
                .iter_mut()
                .flat_map(|category| category.dishes.iter_mut())
                .find(|candidate| candidate.dish_id == dish_id)
                .ok_or(DomainError::not_found("dish"))?;

            let before = dish.options.len();
            dish.options.retain(|option| option.option_id != option_id);
            if dish.options.len() == before {
                return Err(DomainError::not_found("option"));
            }
            if dish.options.is_empty() {
                return Err(DomainError::validation(
                    "cannot remove the last option of a dish",
                ));
            }
            Ok(document)
        })
        .await
    }

    /// Bulk replace of the whole menu.
    pub async fn replace_menu(
        &self,
        mut document: MenuDocument,
    ) -> Result<MenuDocument, AdminMenuError> {
        assign_missing_ids(&mut document);
        menu::validate_document(&document)?;

        let replacement = document.clone();
        self.mutate("replace_menu", move |_| Ok(document)).await?;
        Ok(replacement)
    }

    /// Operator escape hatch: clear cached views without touching the store.
    pub async fn clear_cache(&self) {
        self.cache.clear_namespace().await;
        info!(target: TARGET, "cache cleared by operator");
    }

    /// Load, transform, conditionally replace, invalidate.
    async fn mutate<F>(&self, operation: &'static str, transform: F) -> Result<(), AdminMenuError>
    where
        F: FnOnce(MenuDocument) -> Result<MenuDocument, DomainError>,
    {
        let record = self.repo.load_menu().await?.ok_or(RepoError::NotFound)?;
        let next = transform(record.document)?;
        let version = self.repo.replace_menu(&next, record.version).await?;
        info!(target: TARGET, operation, version, "menu mutated");

        self.cache.clear_namespace().await;
        Ok(())
    }
}

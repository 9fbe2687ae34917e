#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use piatto::application::repos::{MenuRecord, MenuRepo, RepoError};
use piatto::cache::{CacheBackend, CacheBackendError};
use piatto::domain::menu::{Category, Dish, DishOption, MenuDocument, Nutrition};

/// Store fake backed by a mutex, counting document loads so tests can
/// observe whether a read was served from cache or from the store.
#[derive(Default)]
pub struct InMemoryMenuRepo {
    state: Mutex<Option<MenuRecord>>,
    load_calls: AtomicUsize,
}

impl InMemoryMenuRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: MenuDocument) -> Self {
        Self {
            state: Mutex::new(Some(MenuRecord {
                document,
                version: 1,
            })),
            load_calls: AtomicUsize::new(0),
        }
    }

    pub fn load_calls(&self) -> usize {
        self.load_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MenuRepo for InMemoryMenuRepo {
    async fn await_ready(&self, _timeout: Duration) -> Result<(), RepoError> {
        Ok(())
    }

    async fn load_menu(&self) -> Result<Option<MenuRecord>, RepoError> {
        self.load_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().await.clone())
    }

    async fn replace_menu(
        &self,
        document: &MenuDocument,
        expected_version: i64,
    ) -> Result<i64, RepoError> {
        let mut state = self.state.lock().await;
        match state.as_mut() {
            Some(record) if record.version == expected_version => {
                record.document = document.clone();
                record.version += 1;
                Ok(record.version)
            }
            Some(_) => Err(RepoError::Conflict {
                expected: expected_version,
            }),
            None => Err(RepoError::NotFound),
        }
    }

    async fn create_menu(&self, document: &MenuDocument) -> Result<i64, RepoError> {
        let mut state = self.state.lock().await;
        if state.is_some() {
            return Err(RepoError::Conflict { expected: 0 });
        }
        *state = Some(MenuRecord {
            document: document.clone(),
            version: 1,
        });
        Ok(1)
    }
}

/// Cache backend fake that keeps entries in a map and ignores TTLs.
#[derive(Default)]
pub struct InMemoryCacheBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl InMemoryCacheBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.lock().await.contains_key(key)
    }
}

#[async_trait]
impl CacheBackend for InMemoryCacheBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, CacheBackendError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(
        &self,
        key: &str,
        value: String,
        _ttl: Duration,
    ) -> Result<(), CacheBackendError> {
        self.entries.lock().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheBackendError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }

    async fn delete_by_prefix(&self, prefix: &str) -> Result<(), CacheBackendError> {
        self.entries
            .lock()
            .await
            .retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }
}

/// Cache backend that fails every operation, for degradation tests.
pub struct FailingCacheBackend;

#[async_trait]
impl CacheBackend for FailingCacheBackend {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheBackendError> {
        Err(CacheBackendError::Backend("backend down".to_string()))
    }

    async fn set(
        &self,
        _key: &str,
        _value: String,
        _ttl: Duration,
    ) -> Result<(), CacheBackendError> {
        Err(CacheBackendError::Backend("backend down".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheBackendError> {
        Err(CacheBackendError::Backend("backend down".to_string()))
    }

    async fn delete_by_prefix(&self, _prefix: &str) -> Result<(), CacheBackendError> {
        Err(CacheBackendError::Backend("backend down".to_string()))
    }
}

pub fn option(name: &str, price: f64) -> DishOption {
    DishOption {
        option_id: format!("opt-{name}"),
        option_name: name.to_string(),
        short_description: format!("{name} short"),
        detailed_description: String::new(),
        price,
        dish_type: vec!["Vegetarian".to_string()],
        ingredients: vec![],
        allergens: vec![],
        calorie_range: "200-300".to_string(),
        nutrition: Nutrition::default(),
    }
}

pub fn dish(id: &str, title: &str, spice: u8, options: Vec<DishOption>) -> Dish {
    Dish {
        dish_id: id.to_string(),
        dish_title: title.to_string(),
        spice_level: spice,
        image_url: None,
        is_featured: false,
        options,
    }
}

pub fn document(categories: Vec<(&str, Vec<Dish>)>) -> MenuDocument {
    MenuDocument {
        categories: categories
            .into_iter()
            .enumerate()
            .map(|(index, (name, dishes))| Category {
                category_id: format!("cat-{index}"),
                category: name.to_string(),
                dishes,
            })
            .collect(),
    }
}

//! Provider registry
//!
//! In-memory registry for storing and retrieving calendar provider
//! adapters by slug.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::providers::{CalendarProvider, GoogleCalendarProvider};

/// Error type for registry operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    #[error("Provider '{name}' not found")]
    ProviderNotFound { name: String },
}

/// Registry mapping provider slugs to adapter implementations
#[derive(Clone, Default)]
pub struct Registry {
    providers: HashMap<String, Arc<dyn CalendarProvider>>,
}

impl Registry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Build a registry with every provider the configuration enables.
    pub fn from_config(config: &AppConfig) -> Self {
        let mut registry = Self::new();

        registry.register(
            "google",
            Arc::new(GoogleCalendarProvider::new(
                config.google.client_id.clone().unwrap_or_default(),
                config.google.client_secret.clone().unwrap_or_default(),
                config.google.api_base.clone(),
                config.google.token_url.clone(),
            )),
        );

        registry
    }

    /// Register a provider under a slug
    pub fn register(&mut self, slug: &str, provider: Arc<dyn CalendarProvider>) {
        self.providers.insert(slug.to_string(), provider);
    }

    /// Get a provider by slug
    pub fn get(&self, slug: &str) -> Result<Arc<dyn CalendarProvider>, RegistryError> {
        self.providers
            .get(slug)
            .cloned()
            .ok_or_else(|| RegistryError::ProviderNotFound {
                name: slug.to_string(),
            })
    }

    /// Registered slugs, sorted for stable ordering
    pub fn slugs(&self) -> Vec<String> {
        let mut slugs: Vec<_> = self.providers.keys().cloned().collect();
        slugs.sort();
        slugs
    }
}

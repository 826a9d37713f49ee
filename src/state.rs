//! Shared application state for all routes. Built once in `main` and passed down; no globals.

use crate::config::AppConfig;
use crate::generator::GeneratorFactory;
use crate::store::PostStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: PostStore,
    pub generators: Arc<dyn GeneratorFactory>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(store: PostStore, generators: Arc<dyn GeneratorFactory>, config: AppConfig) -> Self {
        AppState {
            store,
            generators,
            config: Arc::new(config),
        }
    }
}

//! Business logic services

pub mod cache;
pub mod catalog;
pub mod external;
pub mod loans;
pub mod preferences;
pub mod stocks;

use std::sync::Arc;

use crate::repository::Repository;

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub repository: Repository,
    pub catalog: catalog::CatalogService,
    pub stocks: stocks::StocksService,
    pub loans: loans::LoansService,
    pub preferences: preferences::PreferencesService,
    pub cache: cache::CacheService,
}

impl Services {
    /// Wire every service around one repository, lookup client and cache
    pub fn new(
        repository: Repository,
        lookup: Arc<dyn external::ExternalLookup>,
        cache: cache::CacheService,
    ) -> Self {
        Self {
            catalog: catalog::CatalogService::new(repository.clone(), Arc::clone(&lookup), cache.clone()),
            stocks: stocks::StocksService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone()),
            preferences: preferences::PreferencesService::new(repository.clone(), lookup),
            cache,
            repository,
        }
    }
}

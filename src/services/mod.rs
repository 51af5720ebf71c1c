//! Business logic services

pub mod auth;
pub mod catalog;
pub mod loans;
pub mod stats;

use std::sync::Arc;

use crate::{clock::Clock, config::AuthConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, auth_config: AuthConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), auth_config),
            catalog: catalog::CatalogService::new(repository.clone(), clock.clone()),
            loans: loans::LoansService::new(repository.clone(), clock.clone()),
            stats: stats::StatsService::new(repository, clock),
        }
    }
}

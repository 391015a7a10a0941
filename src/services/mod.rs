//! Business logic services

pub mod accounts;
pub mod catalog;
pub mod circulation;
pub mod stats;

use crate::{
    config::{AuthConfig, CirculationConfig, CleanupConfig},
    error::AppResult,
    repository::Repository,
};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub accounts: accounts::AccountsService,
    pub catalog: catalog::CatalogService,
    pub circulation: circulation::CirculationService,
    pub stats: stats::StatsService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(
        repository: Repository,
        auth_config: AuthConfig,
        circulation_config: CirculationConfig,
        cleanup_config: CleanupConfig,
    ) -> Self {
        Self {
            accounts: accounts::AccountsService::new(
                repository.clone(),
                auth_config,
                cleanup_config,
            ),
            catalog: catalog::CatalogService::new(repository.clone()),
            circulation: circulation::CirculationService::new(
                repository.clone(),
                circulation_config,
            ),
            stats: stats::StatsService::new(repository.clone()),
            repository,
        }
    }

    /// Readiness probe: confirm the database answers
    pub async fn db_ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.repository.pool)
            .await?;
        Ok(())
    }
}

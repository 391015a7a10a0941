//! Administrative entry point: delete accounts whose registration was
//! rejected longer ago than the configured retention window. Intended to
//! be run periodically (e.g. from cron).

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use carrel_server::{config::AppConfig, repository::Repository, services::Services};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().expect("Failed to load configuration");

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("carrel_server={}", config.logging.level).into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&config.database.url)
        .await
        .expect("Failed to connect to database");

    let repository = Repository::new(pool);
    let services = Services::new(
        repository,
        config.auth.clone(),
        config.circulation.clone(),
        config.cleanup.clone(),
    );

    let deleted = services.accounts.purge_rejected().await?;

    if deleted > 0 {
        tracing::info!(
            "Successfully deleted {} rejected account(s) past the {}h retention window",
            deleted,
            config.cleanup.rejected_retention_hours
        );
    } else {
        tracing::info!("No rejected accounts eligible for deletion yet");
    }

    Ok(())
}

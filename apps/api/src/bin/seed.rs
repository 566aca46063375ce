use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use admin_cell::SeedService;
use shared_config::AppConfig;

/// Creates the default admin account and sample departments.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env();
    let report = SeedService::new(&config).run().await?;

    info!(
        "Seeding finished: admin created = {}, departments created = {}",
        report.admin_created, report.departments_created
    );
    Ok(())
}

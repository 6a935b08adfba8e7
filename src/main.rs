use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use milan_climate_etl::config::Config;
use milan_climate_etl::services::EtlService;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing with environment filter support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,milan_climate_etl=debug")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    info!("Starting Milan climate ETL with config: {:?}", config);

    let service = EtlService::new(&config);
    let inserted = service.run().await?;
    info!(
        "Wrote {} station rows to {}",
        inserted,
        config.database_path.display()
    );

    println!("ETL completed successfully.");
    Ok(())
}

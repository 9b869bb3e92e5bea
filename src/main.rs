use dotenvy::dotenv;
use recurbook::{
    ProjectionScheduler,
    config::{database, settings},
    errors::Result,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load settings; a missing or unusable config.toml means defaults
    let settings = settings::load_default_settings();

    // 4. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Run the scheduler until Ctrl-C
    let scheduler = ProjectionScheduler::new(db, settings.scheduler.to_scheduler_config());
    let shutdown = CancellationToken::new();
    scheduler.start(&shutdown);

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl-C, shutting down");
    shutdown.cancel();

    Ok(())
}

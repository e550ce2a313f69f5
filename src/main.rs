use dotenvy::dotenv;
use pointboard::{
    config::{database, seed},
    core::{art_type, report, settings, user},
    errors::Result,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since env vars can be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the seed configuration
    let seed_config = seed::load_default_config()
        .inspect_err(|e| error!("Critical error loading seed configuration: {}", e))?;

    // 4. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed empty tables
    let users = user::seed_users(&db, &seed_config.users).await?;
    let art_types = art_type::seed_art_types(&db, &seed_config.art_types).await?;
    let seeded_settings = settings::seed_settings(&db, seed_config.settings).await?;
    info!(users, art_types, seeded_settings, "Seeding finished.");

    // 6. Log where things stand today
    let now = chrono::Local::now();
    let rollup = report::generate_report(
        &db,
        &report::TimeFilter::Today,
        report::DesignerFilter::All,
        &now,
    )
    .await?;
    info!("{}", report::format_rollup_summary(&rollup));

    Ok(())
}

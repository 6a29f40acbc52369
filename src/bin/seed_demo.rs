use clap::Parser;
use dotenvy::dotenv;
use shelter_backend::config::AppConfig;
use shelter_backend::infrastructure::{database, seed};
use shelter_backend::services::auth_service::AuthService;
use std::env;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Create the schema and fill it with demo users and animals
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    /// Number of demo animals to insert
    #[arg(long, default_value_t = 500)]
    count: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seed_demo=info,shelter_backend=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🌱 Starting demo data seeding...");

    let config = AppConfig::from_env();
    let password = env::var("SEED_PASSWORD").unwrap_or_else(|_| "password123".to_string());

    info!("🔌 Connecting to database...");
    let db = database::setup_database(&config.database_url).await?;

    let auth = AuthService::new(db.clone(), config);
    seed::seed_users(&auth, &["admin", "user"], &password).await?;

    let inserted = seed::seed_demo_animals(&db, args.count).await?;
    info!("✅ Done: {} animals inserted.", inserted);

    Ok(())
}

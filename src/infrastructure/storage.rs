use crate::config::AppConfig;
use crate::services::storage::LocalStorageService;
use std::sync::Arc;
use tracing::info;

pub async fn setup_storage(config: &AppConfig) -> anyhow::Result<Arc<LocalStorageService>> {
    info!("🗂️  Upload store: {}", config.upload_dir);

    tokio::fs::create_dir_all(&config.upload_dir).await?;

    Ok(Arc::new(LocalStorageService::new(&config.upload_dir)))
}

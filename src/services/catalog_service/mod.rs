use crate::api::error::AppError;
use crate::config::AppConfig;
use crate::entities::{prelude::*, *};
use crate::services::storage::StorageService;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set};
use std::sync::Arc;
use tracing::info;

pub mod delete;
pub mod query;
pub mod types;
pub mod upload;

pub use query::AnimalFilter;
pub use types::{AnimalForm, AnimalInput, AnimalPage, UploadedImage};

pub struct CatalogService {
    db: DatabaseConnection,
    storage: Arc<dyn StorageService>,
    config: AppConfig,
}

impl CatalogService {
    pub fn new(db: DatabaseConnection, storage: Arc<dyn StorageService>, config: AppConfig) -> Self {
        Self {
            db,
            storage,
            config,
        }
    }

    pub async fn find(&self, id: i32) -> Result<Option<animals::Model>, AppError> {
        Ok(Animals::find_by_id(id).one(&self.db).await?)
    }

    pub async fn get(&self, id: i32) -> Result<animals::Model, AppError> {
        self.find(id).await?.ok_or_else(|| not_found(id))
    }

    /// Overwrite every mutable field. The image and `date_added` are untouched.
    /// Concurrent writers race freely; the last update wins.
    pub async fn update(&self, id: i32, input: AnimalInput) -> Result<animals::Model, AppError> {
        input.check()?;

        let animal = self.get(id).await?;
        let mut active: animals::ActiveModel = animal.into();
        active.name = Set(input.name);
        active.animal_type = Set(input.animal_type);
        active.age = Set(input.age);
        active.gender = Set(input.gender);
        active.health_status = Set(input.health_status);
        active.description = Set(input.description);

        let updated = active.update(&self.db).await.map_err(|e| match e {
            // Deleted between the read and the write
            DbErr::RecordNotUpdated => not_found(id),
            e => AppError::Storage(e),
        })?;

        info!(animal_id = updated.id, name = %updated.name, "animal_updated");
        Ok(updated)
    }
}

pub(crate) fn not_found(id: i32) -> AppError {
    AppError::NotFound(format!("Animal {} not found", id))
}

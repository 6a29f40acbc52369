use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use sea_orm::EntityTrait;
use tracing::{info, warn};

use super::{CatalogService, not_found};

impl CatalogService {
    /// Remove the record, then its image. A missing or undeletable image file
    /// is logged and does not fail the delete.
    pub async fn delete(&self, id: i32) -> Result<animals::Model, AppError> {
        let animal = self.get(id).await?;

        // Row first: a failed delete must not leave a record without its image
        let res = Animals::delete_by_id(id).exec(&self.db).await?;
        if res.rows_affected == 0 {
            // Lost a race with another delete
            return Err(not_found(id));
        }

        if let Some(filename) = animal.image_filename.as_deref() {
            if let Err(e) = self.storage.delete_file(filename).await {
                warn!(animal_id = id, "⚠️ Could not remove image {}: {}", filename, e);
            }
        }

        info!(animal_id = id, name = %animal.name, "animal_deleted");
        Ok(animal)
    }
}

use crate::api::error::AppError;
use crate::entities::animals;
use crate::utils::validation::{generate_image_filename, validate_image_upload};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use tracing::{info, warn};

use super::CatalogService;
use super::types::{AnimalInput, UploadedImage};

impl CatalogService {
    /// Insert a new animal, storing its image first when one is supplied.
    /// Nothing is written if validation of the fields or the image fails.
    pub async fn create(
        &self,
        input: AnimalInput,
        image: Option<UploadedImage>,
    ) -> Result<animals::Model, AppError> {
        input.check()?;

        let image = image.filter(|img| !img.is_empty());
        let image_filename = match image {
            Some(img) => Some(self.store_image(img).await?),
            None => None,
        };

        let animal = animals::ActiveModel {
            name: Set(input.name),
            animal_type: Set(input.animal_type),
            age: Set(input.age),
            gender: Set(input.gender),
            health_status: Set(input.health_status),
            description: Set(input.description),
            image_filename: Set(image_filename.clone()),
            date_added: Set(Utc::now()),
            ..Default::default()
        };

        let created = match animal.insert(&self.db).await {
            Ok(created) => created,
            Err(e) => {
                if let Some(filename) = image_filename {
                    if let Err(cleanup) = self.storage.delete_file(&filename).await {
                        warn!("⚠️ Orphaned image {} left in upload store: {}", filename, cleanup);
                    }
                }
                return Err(AppError::Storage(e));
            }
        };

        info!(
            animal_id = created.id,
            name = %created.name,
            image = ?created.image_filename,
            "animal_created"
        );
        Ok(created)
    }

    async fn store_image(&self, image: UploadedImage) -> Result<String, AppError> {
        let ext = validate_image_upload(&image.file_name, &image.data, &self.config)?;
        let filename = generate_image_filename(&ext);

        self.storage
            .upload_file(&filename, image.data)
            .await
            .map_err(|e| AppError::FileIo(format!("Failed to save image {}: {}", filename, e)))?;

        Ok(filename)
    }
}

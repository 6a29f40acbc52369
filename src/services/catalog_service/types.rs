use crate::api::error::AppError;
use crate::entities::animals;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Raw animal form fields exactly as submitted. Kept as strings so a failed
/// submission can be echoed back into the form.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
#[serde(default)]
pub struct AnimalForm {
    pub name: String,
    #[serde(rename = "type")]
    pub animal_type: String,
    pub age: String,
    pub gender: String,
    pub health_status: String,
    pub description: String,
}

impl AnimalForm {
    /// Trim, parse and validate into an [`AnimalInput`].
    pub fn into_input(self) -> Result<AnimalInput, AppError> {
        let age_raw = self.age.trim();
        let age = age_raw.parse::<i32>().map_err(|_| {
            AppError::Validation(format!("Age must be a whole number, got '{}'", age_raw))
        })?;

        let input = AnimalInput {
            name: self.name.trim().to_string(),
            animal_type: self.animal_type.trim().to_string(),
            age,
            gender: none_if_blank(&self.gender),
            health_status: none_if_blank(&self.health_status),
            description: self.description.trim().to_string(),
        };
        input.check()?;
        Ok(input)
    }
}

impl From<&animals::Model> for AnimalForm {
    fn from(animal: &animals::Model) -> Self {
        Self {
            name: animal.name.clone(),
            animal_type: animal.animal_type.clone(),
            age: animal.age.to_string(),
            gender: animal.gender.clone().unwrap_or_default(),
            health_status: animal.health_status.clone().unwrap_or_default(),
            description: animal.description.clone(),
        }
    }
}

fn none_if_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Validated fields for creating or updating an animal record.
#[derive(Debug, Clone, PartialEq, Validate)]
pub struct AnimalInput {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "Type is required"))]
    pub animal_type: String,
    #[validate(range(min = 0, max = 100, message = "Age must be between 0 and 100"))]
    pub age: i32,
    pub gender: Option<String>,
    pub health_status: Option<String>,
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,
}

impl AnimalInput {
    pub fn check(&self) -> Result<(), AppError> {
        self.validate().map_err(|errors| {
            let mut fields: Vec<String> = errors
                .field_errors()
                .iter()
                .flat_map(|(_, errs)| errs.iter())
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            fields.sort();
            AppError::Validation(fields.join("; "))
        })
    }
}

/// An image file received with the creation form. The client's declared
/// content type is ignored; the bytes are sniffed instead.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl UploadedImage {
    /// Browsers send an empty file part when no file was chosen.
    pub fn is_empty(&self) -> bool {
        self.file_name.is_empty() && self.data.is_empty()
    }
}

/// One page of the animal listing.
#[derive(Debug, Clone, Serialize)]
pub struct AnimalPage {
    pub animals: Vec<animals::Model>,
    pub animal_types: Vec<String>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

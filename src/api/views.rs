//! View data handed to the page renderer, serialized as JSON.

use crate::api::flash::Flash;
use crate::entities::animals;
use crate::services::auth_service::Principal;
use crate::services::catalog_service::AnimalForm;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AnimalView {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub animal_type: String,
    pub age: i32,
    pub gender: Option<String>,
    pub health_status: Option<String>,
    pub description: String,
    pub image_filename: Option<String>,
    pub date_added: DateTime<Utc>,
}

impl From<animals::Model> for AnimalView {
    fn from(animal: animals::Model) -> Self {
        Self {
            id: animal.id,
            name: animal.name,
            animal_type: animal.animal_type,
            age: animal.age,
            gender: animal.gender,
            health_status: animal.health_status,
            description: animal.description,
            image_filename: animal.image_filename,
            date_added: animal.date_added,
        }
    }
}

/// Listing page: one page of animals plus everything the filter bar needs.
#[derive(Debug, Serialize, ToSchema)]
pub struct IndexView {
    pub animals: Vec<AnimalView>,
    pub animal_types: Vec<String>,
    pub page: u64,
    pub total_pages: u64,
    pub total: u64,
    pub search_query: String,
    pub type_filter: String,
    pub current_user: Option<Principal>,
    pub flash: Option<Flash>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnimalDetailView {
    pub animal: AnimalView,
    pub current_user: Option<Principal>,
    pub flash: Option<Flash>,
}

/// Add/edit form. `animal_id` is set when editing.
#[derive(Debug, Serialize, ToSchema)]
pub struct AnimalFormView {
    pub animal_id: Option<i32>,
    pub form: AnimalForm,
    pub current_user: Option<Principal>,
    pub flash: Option<Flash>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthFormView {
    pub next: Option<String>,
    pub flash: Option<Flash>,
}

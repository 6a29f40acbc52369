use crate::api::error::AppError;
use crate::entities::{prelude::*, *};
use crate::utils::pagination::{PageRequest, total_pages};
use sea_orm::{
    ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};

use super::CatalogService;
use super::types::AnimalPage;

/// Optional listing predicates. Both are ANDed; a missing one imposes nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnimalFilter {
    /// Substring of the animal name (SQL `LIKE`, store collation)
    pub search: Option<String>,
    /// Exact animal type
    pub animal_type: Option<String>,
}

impl AnimalFilter {
    /// Blank values mean "no filter". The search term is trimmed, the type is not.
    pub fn new(search: Option<&str>, animal_type: Option<&str>) -> Self {
        Self {
            search: search
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            animal_type: animal_type.filter(|t| !t.is_empty()).map(str::to_string),
        }
    }

    pub fn condition(&self) -> Condition {
        Condition::all()
            .add_option(
                self.search
                    .as_deref()
                    .map(|s| animals::Column::Name.contains(s)),
            )
            .add_option(
                self.animal_type
                    .as_deref()
                    .map(|t| animals::Column::AnimalType.eq(t)),
            )
    }
}

impl CatalogService {
    /// Newest first; the distinct type list ignores the active filters.
    pub async fn list(
        &self,
        request: PageRequest,
        filter: &AnimalFilter,
    ) -> Result<AnimalPage, AppError> {
        let select = Animals::find().filter(filter.condition());

        let total = select.clone().count(&self.db).await?;

        // Pages past the end are empty without asking the store
        let animals = if request.offset() >= total {
            Vec::new()
        } else {
            select
                .order_by_desc(animals::Column::DateAdded)
                .order_by_desc(animals::Column::Id)
                .limit(request.per_page)
                .offset(request.offset())
                .all(&self.db)
                .await?
        };

        let animal_types = self.animal_types().await?;

        Ok(AnimalPage {
            animals,
            animal_types,
            page: request.page,
            per_page: request.per_page,
            total,
            total_pages: total_pages(total, request.per_page),
        })
    }

    pub async fn animal_types(&self) -> Result<Vec<String>, AppError> {
        let types = Animals::find()
            .select_only()
            .column(animals::Column::AnimalType)
            .distinct()
            .order_by_asc(animals::Column::AnimalType)
            .into_tuple::<String>()
            .all(&self.db)
            .await?;
        Ok(types)
    }
}

use crate::AppState;
use crate::api::error::AppError;
use crate::api::flash::{Flash, push_flash, take_flash};
use crate::api::session::session_token;
use crate::api::views::{AnimalDetailView, AnimalFormView, AnimalView, IndexView};
use crate::services::auth_service::Principal;
use crate::services::catalog_service::{AnimalFilter, AnimalForm, UploadedImage};
use crate::utils::pagination::PageRequest;
use axum::{
    Extension, Form, Json,
    extract::{Multipart, Path, Query, State, multipart::MultipartError},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;

#[derive(Deserialize, Default)]
pub struct IndexQuery {
    pub page: Option<String>,
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub animal_type: Option<String>,
}

impl IndexQuery {
    /// Unparsable pages fall back to the first page.
    fn page(&self) -> i64 {
        self.page
            .as_deref()
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(1)
    }
}

#[utoipa::path(
    get,
    path = "/",
    params(
        ("page" = Option<i64>, Query, description = "1-based page, values below 1 are treated as 1"),
        ("search" = Option<String>, Query, description = "Substring of the animal name"),
        ("type" = Option<String>, Query, description = "Exact animal type")
    ),
    responses(
        (status = 200, description = "One page of animals", body = IndexView)
    ),
    tag = "animals"
)]
pub async fn index(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<IndexQuery>,
) -> Result<Response, AppError> {
    let current_user = state
        .auth_service
        .current_principal(session_token(&jar).as_deref())
        .await?;

    let filter = AnimalFilter::new(query.search.as_deref(), query.animal_type.as_deref());
    let request = PageRequest::new(query.page(), state.config.page_size);
    let page = state.catalog_service.list(request, &filter).await?;

    let (jar, flash) = take_flash(jar);
    let view = IndexView {
        animals: page.animals.into_iter().map(AnimalView::from).collect(),
        animal_types: page.animal_types,
        page: page.page,
        total_pages: page.total_pages,
        total: page.total,
        search_query: filter.search.unwrap_or_default(),
        type_filter: filter.animal_type.unwrap_or_default(),
        current_user,
        flash,
    };
    Ok((jar, Json(view)).into_response())
}

#[utoipa::path(
    get,
    path = "/animal/{id}",
    params(("id" = i32, Path, description = "Animal ID")),
    responses(
        (status = 200, description = "Animal details", body = AnimalDetailView),
        (status = 404, description = "No such animal")
    ),
    tag = "animals"
)]
pub async fn animal_details(
    State(state): State<AppState>,
    jar: CookieJar,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let animal = state.catalog_service.get(id).await?;
    let current_user = state
        .auth_service
        .current_principal(session_token(&jar).as_deref())
        .await?;

    let (jar, flash) = take_flash(jar);
    let view = AnimalDetailView {
        animal: animal.into(),
        current_user,
        flash,
    };
    Ok((jar, Json(view)).into_response())
}

#[utoipa::path(
    get,
    path = "/add",
    responses(
        (status = 200, description = "Empty animal form", body = AnimalFormView),
        (status = 303, description = "Not logged in")
    ),
    tag = "animals"
)]
pub async fn add_page(Extension(principal): Extension<Principal>, jar: CookieJar) -> Response {
    let (jar, flash) = take_flash(jar);
    let view = AnimalFormView {
        animal_id: None,
        form: AnimalForm::default(),
        current_user: Some(principal),
        flash,
    };
    (jar, Json(view)).into_response()
}

fn form_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("Malformed form data: {}", e.body_text()))
    }
}

async fn read_animal_multipart(
    mut multipart: Multipart,
) -> Result<(AnimalForm, Option<UploadedImage>), AppError> {
    let mut form = AnimalForm::default();
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(form_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let data = field.bytes().await.map_err(form_error)?.to_vec();
            image = Some(UploadedImage { file_name, data });
            continue;
        }

        let value = field.text().await.map_err(form_error)?;
        match name.as_str() {
            "name" => form.name = value,
            "type" => form.animal_type = value,
            "age" => form.age = value,
            "gender" => form.gender = value,
            "health_status" => form.health_status = value,
            "description" => form.description = value,
            _ => {}
        }
    }

    Ok((form, image))
}

/// Re-render a form after a correctable error, echoing the submitted values.
fn form_rejected(
    jar: CookieJar,
    error: AppError,
    animal_id: Option<i32>,
    form: AnimalForm,
    principal: Principal,
) -> Result<Response, AppError> {
    if !error.is_user_facing() {
        return Err(error);
    }
    let view = AnimalFormView {
        animal_id,
        form,
        current_user: Some(principal),
        flash: Some(Flash::danger(error.user_message())),
    };
    Ok((error.status(), jar, Json(view)).into_response())
}

#[utoipa::path(
    post,
    path = "/add",
    request_body(content = AnimalForm, description = "Animal fields plus an optional `image` file", content_type = "multipart/form-data"),
    responses(
        (status = 303, description = "Created, redirect to /"),
        (status = 415, description = "Image type not allowed", body = AnimalFormView),
        (status = 422, description = "Missing or invalid field", body = AnimalFormView)
    ),
    tag = "animals"
)]
pub async fn add_animal(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    jar: CookieJar,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let (form, image) = match read_animal_multipart(multipart).await {
        Ok(parsed) => parsed,
        Err(e) => return form_rejected(jar, e, None, AnimalForm::default(), principal),
    };

    let input = match form.clone().into_input() {
        Ok(input) => input,
        Err(e) => return form_rejected(jar, e, None, form, principal),
    };

    let animal = match state.catalog_service.create(input, image).await {
        Ok(animal) => animal,
        Err(e) => return form_rejected(jar, e, None, form, principal),
    };

    tracing::info!(animal_id = animal.id, user_id = principal.user_id, "animal_added_via_form");
    let jar = push_flash(
        jar,
        Flash::success(format!("Animal \"{}\" added successfully!", animal.name)),
    );
    Ok((jar, Redirect::to("/")).into_response())
}

#[utoipa::path(
    get,
    path = "/edit/{id}",
    params(("id" = i32, Path, description = "Animal ID")),
    responses(
        (status = 200, description = "Pre-filled animal form", body = AnimalFormView),
        (status = 404, description = "No such animal")
    ),
    tag = "animals"
)]
pub async fn edit_page(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    jar: CookieJar,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let animal = state.catalog_service.get(id).await?;
    let (jar, flash) = take_flash(jar);
    let view = AnimalFormView {
        animal_id: Some(animal.id),
        form: AnimalForm::from(&animal),
        current_user: Some(principal),
        flash,
    };
    Ok((jar, Json(view)).into_response())
}

#[utoipa::path(
    post,
    path = "/edit/{id}",
    params(("id" = i32, Path, description = "Animal ID")),
    request_body(content = AnimalForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Updated, redirect to /animal/{id}"),
        (status = 404, description = "No such animal"),
        (status = 422, description = "Missing or invalid field", body = AnimalFormView)
    ),
    tag = "animals"
)]
pub async fn edit_animal(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    jar: CookieJar,
    Path(id): Path<i32>,
    Form(form): Form<AnimalForm>,
) -> Result<Response, AppError> {
    // 404 takes precedence over form errors
    state.catalog_service.get(id).await?;

    let input = match form.clone().into_input() {
        Ok(input) => input,
        Err(e) => return form_rejected(jar, e, Some(id), form, principal),
    };

    let animal = state.catalog_service.update(id, input).await?;

    let jar = push_flash(
        jar,
        Flash::success(format!("Animal \"{}\" updated successfully!", animal.name)),
    );
    Ok((jar, Redirect::to(&format!("/animal/{}", animal.id))).into_response())
}

#[utoipa::path(
    post,
    path = "/delete/{id}",
    params(("id" = i32, Path, description = "Animal ID")),
    responses(
        (status = 303, description = "Deleted, redirect to /"),
        (status = 404, description = "No such animal")
    ),
    tag = "animals"
)]
pub async fn delete_animal(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    jar: CookieJar,
    Path(id): Path<i32>,
) -> Result<Response, AppError> {
    let animal = state.catalog_service.delete(id).await?;

    tracing::info!(animal_id = id, user_id = principal.user_id, "animal_removed_via_form");
    let jar = push_flash(
        jar,
        Flash::info(format!("Record for \"{}\" has been deleted.", animal.name)),
    );
    Ok((jar, Redirect::to("/")).into_response())
}

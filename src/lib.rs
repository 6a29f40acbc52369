pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::auth_service::AuthService;
use crate::services::catalog_service::CatalogService;
use crate::services::storage::StorageService;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::auth::register_page,
        api::handlers::auth::register,
        api::handlers::auth::login_page,
        api::handlers::auth::login,
        api::handlers::auth::logout,
        api::handlers::animals::index,
        api::handlers::animals::animal_details,
        api::handlers::animals::add_page,
        api::handlers::animals::add_animal,
        api::handlers::animals::edit_page,
        api::handlers::animals::edit_animal,
        api::handlers::animals::delete_animal,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::auth::RegisterForm,
            api::handlers::auth::LoginForm,
            api::handlers::health::HealthResponse,
            api::views::AnimalView,
            api::views::IndexView,
            api::views::AnimalDetailView,
            api::views::AnimalFormView,
            api::views::AuthFormView,
            api::flash::Flash,
            api::flash::FlashLevel,
            services::auth_service::Principal,
            services::catalog_service::AnimalForm,
        )
    ),
    tags(
        (name = "auth", description = "Registration, login and logout"),
        (name = "animals", description = "Animal records"),
        (name = "system", description = "Health and metadata")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub storage: Arc<dyn StorageService>,
    pub auth_service: Arc<AuthService>,
    pub catalog_service: Arc<CatalogService>,
    pub config: AppConfig,
}

impl AppState {
    /// Wire the services over a shared connection and upload store.
    pub fn new(db: DatabaseConnection, storage: Arc<dyn StorageService>, config: AppConfig) -> Self {
        let auth_service = Arc::new(AuthService::new(db.clone(), config.clone()));
        let catalog_service = Arc::new(CatalogService::new(
            db.clone(),
            storage.clone(),
            config.clone(),
        ));
        Self {
            db,
            storage,
            auth_service,
            catalog_service,
            config,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(api::handlers::health::health_check))
        .route("/api-docs/openapi.json", get(api::handlers::openapi_json))
        .route(
            "/register",
            get(api::handlers::auth::register_page).post(api::handlers::auth::register),
        )
        .route(
            "/login",
            get(api::handlers::auth::login_page).post(api::handlers::auth::login),
        )
        .route(
            "/logout",
            get(api::handlers::auth::logout).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::auth_middleware,
            )),
        )
        .route("/", get(api::handlers::animals::index))
        .route("/animal/:id", get(api::handlers::animals::animal_details))
        .route(
            "/add",
            get(api::handlers::animals::add_page)
                .post(api::handlers::animals::add_animal)
                .layer(DefaultBodyLimit::max(
                    state.config.max_file_size + 1024 * 1024, // 1MB for the text fields and multipart framing
                ))
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::auth_middleware,
                )),
        )
        .route(
            "/edit/:id",
            get(api::handlers::animals::edit_page)
                .post(api::handlers::animals::edit_animal)
                .layer(from_fn_with_state(
                    state.clone(),
                    api::middleware::auth::auth_middleware,
                )),
        )
        .route(
            "/delete/:id",
            post(api::handlers::animals::delete_animal).layer(from_fn_with_state(
                state.clone(),
                api::middleware::auth::auth_middleware,
            )),
        )
        .layer(from_fn(api::middleware::metrics::metrics_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get(api::middleware::request_id::REQUEST_ID_HEADER)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                })
                .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                    tracing::info!("📥 {} {}", request.method(), request.uri());
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            "📤 Finished in {:?} with status {}",
                            latency,
                            response.status()
                        );
                    },
                ),
        )
        // Outermost, so the trace span already sees the generated id
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .with_state(state)
}

use crate::AppState;
use crate::api::error::AppError;
use crate::api::flash::{Flash, push_flash, take_flash};
use crate::api::session::{clear_session_cookie, session_token, set_session_cookie};
use crate::api::views::AuthFormView;
use crate::services::auth_service::Principal;
use axum::{
    Extension, Form, Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Deserialize, ToSchema, Validate)]
pub struct RegisterForm {
    #[validate(length(min = 3, max = 64, message = "Username must be 3 to 64 characters"))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize, Default)]
pub struct NextQuery {
    pub next: Option<String>,
}

async fn current_principal(state: &AppState, jar: &CookieJar) -> Result<Option<Principal>, AppError> {
    state
        .auth_service
        .current_principal(session_token(jar).as_deref())
        .await
}

/// Only same-site absolute paths are followed after login.
fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

#[utoipa::path(
    get,
    path = "/register",
    responses(
        (status = 200, description = "Registration form", body = AuthFormView),
        (status = 303, description = "Already logged in")
    ),
    tag = "auth"
)]
pub async fn register_page(State(state): State<AppState>, jar: CookieJar) -> Result<Response, AppError> {
    if current_principal(&state, &jar).await?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let (jar, flash) = take_flash(jar);
    Ok((jar, Json(AuthFormView { next: None, flash })).into_response())
}

#[utoipa::path(
    post,
    path = "/register",
    request_body(content = RegisterForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Registered, redirect to /login; or rejected, redirect to /register")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(mut form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    if current_principal(&state, &jar).await?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    form.username = form.username.trim().to_string();
    if let Err(errors) = form.validate() {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(_, errs)| errs.iter())
            .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .collect();
        messages.sort();
        let jar = push_flash(jar, Flash::danger(messages.join(" ")));
        return Ok((jar, Redirect::to("/register")).into_response());
    }

    match state.auth_service.register(&form.username, &form.password).await {
        Ok(_) => {
            let jar = push_flash(jar, Flash::success("Registration successful! You can now log in."));
            Ok((jar, Redirect::to("/login")).into_response())
        }
        Err(e @ AppError::DuplicateUsername(_)) => {
            let jar = push_flash(jar, Flash::danger(e.user_message()));
            Ok((jar, Redirect::to("/register")).into_response())
        }
        Err(e) => Err(e),
    }
}

#[utoipa::path(
    get,
    path = "/login",
    params(("next" = Option<String>, Query, description = "Path to return to after login")),
    responses(
        (status = 200, description = "Login form", body = AuthFormView),
        (status = 303, description = "Already logged in")
    ),
    tag = "auth"
)]
pub async fn login_page(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<NextQuery>,
) -> Result<Response, AppError> {
    if current_principal(&state, &jar).await?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }
    let (jar, flash) = take_flash(jar);
    Ok((
        jar,
        Json(AuthFormView {
            next: query.next,
            flash,
        }),
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/login",
    params(("next" = Option<String>, Query, description = "Path to return to after login")),
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "Logged in, session cookie set"),
        (status = 401, description = "Invalid credentials", body = AuthFormView)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    if current_principal(&state, &jar).await?.is_some() {
        return Ok(Redirect::to("/").into_response());
    }

    let principal = match state
        .auth_service
        .authenticate(form.username.trim(), &form.password)
        .await
    {
        Ok(principal) => principal,
        Err(e @ AppError::InvalidCredentials) => {
            tracing::info!(username = %form.username.trim(), "login_failed");
            let view = AuthFormView {
                next: query.next,
                flash: Some(Flash::danger(e.user_message())),
            };
            return Ok((StatusCode::UNAUTHORIZED, Json(view)).into_response());
        }
        Err(e) => return Err(e),
    };

    if let Err(e) = state.auth_service.purge_expired_sessions().await {
        tracing::warn!("⚠️ Session cleanup failed: {}", e);
    }

    let session = state.auth_service.start_session(&principal).await?;
    let jar = set_session_cookie(jar, session, state.config.secure_cookies);
    let jar = push_flash(jar, Flash::success("Logged in successfully!"));
    let target = safe_next(query.next.as_deref()).to_string();
    Ok((jar, Redirect::to(&target)).into_response())
}

#[utoipa::path(
    get,
    path = "/logout",
    responses(
        (status = 303, description = "Session ended, redirect to /")
    ),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    jar: CookieJar,
) -> Result<Response, AppError> {
    state
        .auth_service
        .logout(session_token(&jar).as_deref())
        .await?;
    tracing::info!(user_id = principal.user_id, "user_logged_out");

    let jar = clear_session_cookie(jar);
    let jar = push_flash(jar, Flash::info("You have been logged out."));
    Ok((jar, Redirect::to("/")).into_response())
}

#[cfg(test)]
mod tests {
    use super::safe_next;

    #[test]
    fn next_must_be_a_local_path() {
        assert_eq!(safe_next(Some("/add")), "/add");
        assert_eq!(safe_next(Some("//evil.example")), "/");
        assert_eq!(safe_next(Some("https://evil.example")), "/");
        assert_eq!(safe_next(Some("/\\evil")), "/");
        assert_eq!(safe_next(None), "/");
    }
}

use crate::AppState;
use crate::api::error::AppError;
use crate::api::session::{clear_session_cookie, session_token};
use axum::{
    extract::{Request, State},
    http::{Method, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::CookieJar;

/// Gate for routes that need a logged-in user. Inserts the resolved
/// `Principal` into request extensions or answers with `AppError::Unauthorized`.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let jar = CookieJar::from_headers(req.headers());
    let token = session_token(&jar);

    match state.auth_service.current_principal(token.as_deref()).await {
        Ok(Some(principal)) => {
            req.extensions_mut().insert(principal);
            next.run(req).await
        }
        Ok(None) => {
            let jar = if token.is_some() {
                clear_session_cookie(jar)
            } else {
                jar
            };
            let target = login_redirect(req.method(), req.uri());
            (jar, AppError::Unauthorized(target)).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Only GET targets are worth returning to after login.
fn login_redirect(method: &Method, uri: &Uri) -> String {
    if *method != Method::GET {
        return "/login".to_string();
    }
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    match serde_urlencoded::to_string(&[("next", path)]) {
        Ok(query) => format!("/login?{}", query),
        Err(_) => "/login".to_string(),
    }
}

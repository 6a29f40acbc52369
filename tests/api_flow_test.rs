use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use sea_orm::{Database, DatabaseConnection, EntityTrait, PaginatorTrait};
use serde_json::Value;
use shelter_backend::config::AppConfig;
use shelter_backend::entities::prelude::*;
use shelter_backend::infrastructure::database;
use shelter_backend::services::storage::{LocalStorageService, StorageService};
use shelter_backend::{AppState, create_app};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

const BOUNDARY: &str = "----shelter-test-boundary";
const PNG_HEADER: [u8; 16] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
];

struct TestApp {
    app: Router,
    db: DatabaseConnection,
    state: AppState,
    upload_path: PathBuf,
    _upload_dir: TempDir,
}

async fn setup_with(config: AppConfig) -> TestApp {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    database::run_migrations(&db).await.unwrap();

    let upload_dir = tempfile::tempdir().unwrap();
    let upload_path = upload_dir.path().to_path_buf();
    let config = AppConfig {
        upload_dir: upload_path.to_string_lossy().to_string(),
        ..config
    };
    let storage: Arc<dyn StorageService> = Arc::new(LocalStorageService::new(&upload_path));
    let state = AppState::new(db.clone(), storage, config);

    TestApp {
        app: create_app(state.clone()),
        db,
        state,
        upload_path,
        _upload_dir: upload_dir,
    }
}

async fn setup() -> TestApp {
    setup_with(AppConfig::default()).await
}

/// Minimal browser-like cookie store.
#[derive(Default)]
struct Cookies(BTreeMap<String, String>);

impl Cookies {
    fn absorb(&mut self, response: &Response) {
        for value in response.headers().get_all(header::SET_COOKIE) {
            let raw = value.to_str().unwrap();
            let pair = raw.split(';').next().unwrap();
            let (name, value) = pair.split_once('=').unwrap();
            if value.is_empty() || raw.contains("Max-Age=0") {
                self.0.remove(name);
            } else {
                self.0.insert(name.to_string(), value.to_string());
            }
        }
    }

    fn header(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("; ")
    }

    fn get(&self, name: &str) -> Option<&String> {
        self.0.get(name)
    }
}

impl TestApp {
    async fn send(&self, cookies: &mut Cookies, mut request: Request<Body>) -> Response {
        if !cookies.0.is_empty() {
            request
                .headers_mut()
                .insert(header::COOKIE, cookies.header().parse().unwrap());
        }
        let response = self.app.clone().oneshot(request).await.unwrap();
        cookies.absorb(&response);
        response
    }

    async fn get(&self, cookies: &mut Cookies, uri: &str) -> Response {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(cookies, request).await
    }

    async fn post_form(&self, cookies: &mut Cookies, uri: &str, body: &str) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(cookies, request).await
    }

    async fn post_multipart(&self, cookies: &mut Cookies, uri: &str, body: Vec<u8>) -> Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(body))
            .unwrap();
        self.send(cookies, request).await
    }

    async fn logged_in(&self, username: &str) -> Cookies {
        self.state
            .auth_service
            .register(username, "password123")
            .await
            .unwrap();
        let mut cookies = Cookies::default();
        let response = self
            .post_form(
                &mut cookies,
                "/login",
                &format!("username={}&password=password123", username),
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(cookies.get("shelter_session").is_some());
        cookies
    }

    fn stored_files(&self) -> usize {
        std::fs::read_dir(&self.upload_path).unwrap().count()
    }
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

fn animal_multipart(fields: &[(&str, &str)], image: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, data)) = image {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

const REX: &[(&str, &str)] = &[
    ("name", "Rex"),
    ("type", "Dog"),
    ("age", "3"),
    ("gender", ""),
    ("health_status", "Healthy"),
    ("description", "friendly"),
];

#[tokio::test]
async fn test_register_login_logout_flow() {
    let t = setup().await;
    let mut cookies = Cookies::default();

    let response = t
        .post_form(&mut cookies, "/register", "username=alice&password=password123")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let page = json_body(t.get(&mut cookies, "/login").await).await;
    assert_eq!(page["flash"]["level"], "success");
    assert_eq!(
        page["flash"]["message"],
        "Registration successful! You can now log in."
    );
    // Flash is shown once
    let page = json_body(t.get(&mut cookies, "/login").await).await;
    assert!(page["flash"].is_null());

    let response = t
        .post_form(&mut cookies, "/register", "username=alice&password=different")
        .await;
    assert_eq!(location(&response), "/register");
    let page = json_body(t.get(&mut cookies, "/register").await).await;
    assert_eq!(page["flash"]["level"], "danger");
    assert_eq!(page["flash"]["message"], "A user with that name already exists.");
    assert_eq!(Users::find().count(&t.db).await.unwrap(), 1);

    let response = t
        .post_form(&mut cookies, "/login", "username=alice&password=wrong")
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(cookies.get("shelter_session").is_none());
    let page = json_body(response).await;
    assert_eq!(page["flash"]["message"], "Invalid username or password.");

    let response = t
        .post_form(&mut cookies, "/login", "username=alice&password=password123")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    let token = cookies.get("shelter_session").cloned().unwrap();

    let index = json_body(t.get(&mut cookies, "/").await).await;
    assert_eq!(index["current_user"]["username"], "alice");
    assert_eq!(index["flash"]["message"], "Logged in successfully!");

    // Logged-in users are bounced away from the auth forms
    let response = t.get(&mut cookies, "/login").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let response = t.get(&mut cookies, "/logout").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(cookies.get("shelter_session").is_none());

    let index = json_body(t.get(&mut cookies, "/").await).await;
    assert!(index["current_user"].is_null());
    assert_eq!(index["flash"]["message"], "You have been logged out.");

    // Replaying the old token after logout does not authenticate
    let mut replay = Cookies::default();
    replay.0.insert("shelter_session".to_string(), token);
    let response = t.get(&mut replay, "/add").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?next=%2Fadd");
    // The dead session cookie is cleared and the login page explains why
    assert!(replay.get("shelter_session").is_none());
    let page = json_body(t.get(&mut replay, "/login").await).await;
    assert_eq!(page["flash"]["level"], "warning");
    assert_eq!(page["flash"]["message"], "Please log in to access this page.");
}

#[tokio::test]
async fn test_registration_rejects_short_credentials() {
    let t = setup().await;
    let mut cookies = Cookies::default();

    let response = t
        .post_form(&mut cookies, "/register", "username=al&password=123")
        .await;
    assert_eq!(location(&response), "/register");
    let page = json_body(t.get(&mut cookies, "/register").await).await;
    assert_eq!(page["flash"]["level"], "danger");
    assert_eq!(Users::find().count(&t.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_login_required_routes_redirect() {
    let t = setup().await;
    let mut cookies = Cookies::default();

    let response = t.get(&mut cookies, "/add").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?next=%2Fadd");

    let page = json_body(t.get(&mut cookies, "/login?next=%2Fadd").await).await;
    assert_eq!(page["next"], "/add");
    assert_eq!(page["flash"]["level"], "warning");
    assert_eq!(page["flash"]["message"], "Please log in to access this page.");

    let response = t.post_form(&mut cookies, "/delete/1", "").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let response = t.get(&mut cookies, "/edit/1").await;
    assert_eq!(location(&response), "/login?next=%2Fedit%2F1");

    let response = t.get(&mut cookies, "/logout").await;
    assert!(location(&response).starts_with("/login"));

    // Logging in honours the original destination
    t.state
        .auth_service
        .register("alice", "password123")
        .await
        .unwrap();
    let response = t
        .post_form(
            &mut cookies,
            "/login?next=%2Fadd",
            "username=alice&password=password123",
        )
        .await;
    assert_eq!(location(&response), "/add");
    let response = t.get(&mut cookies, "/add").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_animal_crud_over_http() {
    let t = setup().await;
    let mut cookies = t.logged_in("alice").await;

    let body = animal_multipart(REX, Some(("rex.png", &PNG_HEADER)));
    let response = t.post_multipart(&mut cookies, "/add", body).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let index = json_body(t.get(&mut cookies, "/").await).await;
    assert_eq!(index["flash"]["message"], "Animal \"Rex\" added successfully!");
    assert_eq!(index["total"], 1);
    let rex = &index["animals"][0];
    assert_eq!(rex["name"], "Rex");
    assert_eq!(rex["type"], "Dog");
    assert!(rex["gender"].is_null());
    assert_eq!(rex["health_status"], "Healthy");
    let id = rex["id"].as_i64().unwrap();
    let image = rex["image_filename"].as_str().unwrap().to_string();
    assert!(t.upload_path.join(&image).exists());

    let details = json_body(t.get(&mut cookies, &format!("/animal/{}", id)).await).await;
    assert_eq!(details["animal"]["description"], "friendly");

    let form = json_body(t.get(&mut cookies, &format!("/edit/{}", id)).await).await;
    assert_eq!(form["animal_id"], id);
    assert_eq!(form["form"]["age"], "3");

    let response = t
        .post_form(
            &mut cookies,
            &format!("/edit/{}", id),
            "name=Rex&type=Dog&age=4&description=friendly",
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), format!("/animal/{}", id));

    let details = json_body(t.get(&mut cookies, &format!("/animal/{}", id)).await).await;
    assert_eq!(details["animal"]["age"], 4);
    assert_eq!(details["animal"]["image_filename"], image.as_str());
    assert_eq!(details["flash"]["message"], "Animal \"Rex\" updated successfully!");

    let response = t
        .post_form(&mut cookies, &format!("/delete/{}", id), "")
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
    assert!(!t.upload_path.join(&image).exists());

    let index = json_body(t.get(&mut cookies, "/").await).await;
    assert_eq!(index["flash"]["message"], "Record for \"Rex\" has been deleted.");

    let response = t.get(&mut cookies, &format!("/animal/{}", id)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = t
        .post_form(&mut cookies, &format!("/delete/{}", id), "")
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_disallowed_image_rerenders_form_without_persisting() {
    let t = setup().await;
    let mut cookies = t.logged_in("alice").await;

    let body = animal_multipart(REX, Some(("rex.exe", &PNG_HEADER)));
    let response = t.post_multipart(&mut cookies, "/add", body).await;
    assert_eq!(response.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);

    let form = json_body(response).await;
    assert_eq!(form["form"]["name"], "Rex");
    assert_eq!(form["form"]["type"], "Dog");
    assert_eq!(form["flash"]["level"], "danger");

    assert_eq!(Animals::find().count(&t.db).await.unwrap(), 0);
    assert_eq!(t.stored_files(), 0);
}

#[tokio::test]
async fn test_oversized_image_is_rejected() {
    let t = setup_with(AppConfig {
        max_file_size: 8,
        ..AppConfig::default()
    })
    .await;
    let mut cookies = t.logged_in("alice").await;

    let body = animal_multipart(REX, Some(("rex.png", &PNG_HEADER)));
    let response = t.post_multipart(&mut cookies, "/add", body).await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(Animals::find().count(&t.db).await.unwrap(), 0);
    assert_eq!(t.stored_files(), 0);
}

#[tokio::test]
async fn test_missing_fields_are_reported() {
    let t = setup().await;
    let mut cookies = t.logged_in("alice").await;

    let fields = [("name", "  "), ("type", "Dog"), ("age", "3"), ("description", "")];
    let response = t
        .post_multipart(&mut cookies, "/add", animal_multipart(&fields, None))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let form = json_body(response).await;
    assert!(form["animal_id"].is_null());
    assert_eq!(form["form"]["type"], "Dog");

    let fields = [("name", "Rex"), ("type", "Dog"), ("age", "old"), ("description", "x")];
    let response = t
        .post_multipart(&mut cookies, "/add", animal_multipart(&fields, None))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(Animals::find().count(&t.db).await.unwrap(), 0);
}

#[tokio::test]
async fn test_index_query_parameters() {
    let t = setup().await;
    let mut cookies = t.logged_in("alice").await;

    for (name, kind) in [("Rex", "Собака"), ("Мурка", "Кішка"), ("Rexy", "Кішка")] {
        let fields = [("name", name), ("type", kind), ("age", "2"), ("description", "ok")];
        let response = t
            .post_multipart(&mut cookies, "/add", animal_multipart(&fields, None))
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }
    let mut anonymous = Cookies::default();

    let index = json_body(t.get(&mut anonymous, "/?page=0").await).await;
    assert_eq!(index["page"], 1);
    assert_eq!(index["total"], 3);
    assert_eq!(index["total_pages"], 1);
    assert!(index["current_user"].is_null());

    let index = json_body(t.get(&mut anonymous, "/?page=abc").await).await;
    assert_eq!(index["page"], 1);

    let index = json_body(t.get(&mut anonymous, "/?page=7").await).await;
    assert_eq!(index["animals"].as_array().unwrap().len(), 0);

    let index = json_body(t.get(&mut anonymous, "/?search=ex&type=%D0%9A%D1%96%D1%88%D0%BA%D0%B0").await).await;
    assert_eq!(index["search_query"], "ex");
    assert_eq!(index["type_filter"], "Кішка");
    let names: Vec<&str> = index["animals"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Rexy"]);
    assert_eq!(index["animal_types"], serde_json::json!(["Кішка", "Собака"]));
}

#[tokio::test]
async fn test_huge_page_numbers_return_empty_page() {
    let t = setup().await;
    let mut cookies = t.logged_in("alice").await;
    let fields = [("name", "Rex"), ("type", "Dog"), ("age", "2"), ("description", "ok")];
    let response = t
        .post_multipart(&mut cookies, "/add", animal_multipart(&fields, None))
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let mut anonymous = Cookies::default();
    for page in ["9223372036854775807", "2000000000000000000"] {
        let response = t.get(&mut anonymous, &format!("/?page={}", page)).await;
        assert_eq!(response.status(), StatusCode::OK, "page={}", page);
        let index = json_body(response).await;
        assert_eq!(index["animals"].as_array().unwrap().len(), 0, "page={}", page);
        assert_eq!(index["total"], 1);
        assert_eq!(index["total_pages"], 1);
    }

    // The server keeps answering afterwards
    let index = json_body(t.get(&mut anonymous, "/").await).await;
    assert_eq!(index["animals"][0]["name"], "Rex");
}

#[tokio::test]
async fn test_unknown_and_malformed_ids() {
    let t = setup().await;
    let mut cookies = Cookies::default();

    let response = t.get(&mut cookies, "/animal/404").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = t.get(&mut cookies, "/animal/rex").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut cookies = t.logged_in("alice").await;
    let response = t.get(&mut cookies, "/edit/404").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let response = t
        .post_form(&mut cookies, "/edit/404", "name=Rex&type=Dog&age=4&description=x")
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_health_and_openapi() {
    let t = setup().await;
    let mut cookies = Cookies::default();

    let response = t.get(&mut cookies, "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let health = json_body(response).await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["database"], "connected");

    let doc = json_body(t.get(&mut cookies, "/api-docs/openapi.json").await).await;
    assert!(doc["paths"]["/animal/{id}"].is_object());
    assert!(doc["paths"]["/add"]["post"].is_object());
}

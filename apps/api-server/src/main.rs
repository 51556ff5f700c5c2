//! api-server: HTTP JSON API for the message catalog.
//!
//! Serves the domain, key message and language endpoints used by the admin
//! frontend:
//! - Storage: In-memory (default) or SQLite (file) when the `sqlite` feature is enabled.
//! - Demo data: the I18N domain and the en/es/de/fr/zh catalog are seeded into empty stores.
//! - CORS: Configurable via CORS_ALLOW_ORIGIN (origin string) for the admin frontend.
//!
//! Run:
//! ```bash
//! # pretty logs (default); PORT optional
//! cargo run -p api-server
//!
//! # persistent storage
//! STORAGE_PROVIDER=sqlite DB_PATH=./data/catalog.db cargo run -p api-server
//! ```
//!
//! Configuration: See `config.rs` for all environment variables.

mod config;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, put},
    Json, Router,
};
use catalog::service::{DomainService, KeyMessageService, LanguageService};
use catalog::{CoreError, Domain, KeyMessage, Language, LanguageTag};
use serde::Deserialize;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use store::{AnyRepo, UuidIds};

type Domains = DomainService<AnyRepo, AnyRepo, AnyRepo, UuidIds>;
type Messages = KeyMessageService<AnyRepo, AnyRepo, UuidIds>;
type Languages = LanguageService<AnyRepo, AnyRepo>;

#[derive(Clone)]
struct AppState {
    domains: Arc<Domains>,
    messages: Arc<Messages>,
    languages: Arc<Languages>,
}

impl AppState {
    fn new(repo: AnyRepo) -> Self {
        Self {
            domains: Arc::new(DomainService::new(
                repo.clone(),
                repo.clone(),
                repo.clone(),
                UuidIds,
            )),
            messages: Arc::new(KeyMessageService::new(repo.clone(), repo.clone(), UuidIds)),
            languages: Arc::new(LanguageService::new(repo.clone(), repo)),
        }
    }
}

#[tokio::main]
async fn main() {
    // Load and validate config first (fail fast on misconfiguration)
    let cfg = match config::Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    init_tracing(&cfg);

    let state = AppState::new(store::build_repo(&cfg));

    // CORS - already validated in Config::from_env()
    let cors = if cfg.cors_allow_origin == HeaderValue::from_static("*") {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list([cfg.cors_allow_origin.clone()]))
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
                axum::http::Method::DELETE,
                axum::http::Method::OPTIONS,
            ])
            .allow_headers([axum::http::header::CONTENT_TYPE])
    };
    let app = router(state).layer(cors);

    let addr: SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!(%addr, err = %e, "failed to bind");
            std::process::exit(1);
        }
    };
    info!(%addr, "api-server listening");
    if let Err(e) = axum::serve(listener, app).await {
        error!(err = %e, "server error");
        std::process::exit(1);
    }
}

fn router(state: AppState) -> Router {
    // Request ID header name
    let x_request_id = axum::http::HeaderName::from_static("x-request-id");

    Router::new()
        .route("/api/domains", get(list_domains).post(create_domain))
        .route(
            "/api/domains/:id",
            get(get_domain).put(update_domain).delete(delete_domain),
        )
        .route(
            "/api/domains/:id/messages",
            get(find_messages).post(create_message),
        )
        .route(
            "/api/domains/:id/messages/:message_id",
            put(update_message).delete(delete_message),
        )
        .route("/api/languages", get(list_languages).post(create_language))
        .route("/api/languages/tags", get(list_language_tags))
        .route("/api/languages/:code", delete(delete_language))
        .layer(PropagateRequestIdLayer::new(x_request_id.clone()))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }),
        )
        .layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid))
        .with_state(state)
}

fn init_tracing(cfg: &config::Config) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    match cfg.log_format {
        config::LogFormat::Json => {
            registry
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_timer(fmt::time::SystemTime)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
        config::LogFormat::Pretty => {
            registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_target(true)
                        .with_writer(std::io::stdout),
                )
                .init();
        }
    }
}

/// Map a core error onto its status code and JSON body.
fn error_response(op: &'static str, err: CoreError) -> Response {
    let (status, body) = http_common::core_error_response(&err);
    let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    if status.is_server_error() {
        error!(op, err = %err, "request failed");
    } else {
        warn!(op, err = %err, status = status.as_u16(), "request rejected");
    }
    (status, Json(body)).into_response()
}

fn parse_tag(raw: &str) -> Result<LanguageTag, Response> {
    LanguageTag::new(raw).map_err(|e| error_response("parse_language_tag", e))
}

/// Unwrap a JSON body, answering malformed ones with a 400 error body.
fn json_body<T>(op: &'static str, body: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    match body {
        Ok(Json(value)) => Ok(value),
        Err(rejection) => {
            let message = rejection.body_text();
            warn!(op, err = %message, "request body rejected");
            let body = http_common::json_error_with_message("invalid_request", &message);
            Err((StatusCode::BAD_REQUEST, Json(body)).into_response())
        }
    }
}

// ============ Domains ============

#[derive(Deserialize)]
struct DomainFilter {
    #[serde(default)]
    code: Option<String>,
}

async fn list_domains(
    State(state): State<AppState>,
    Query(filter): Query<DomainFilter>,
) -> Response {
    let result = match filter.code.as_deref().filter(|c| !c.is_empty()) {
        Some(code) => match state.domains.find_by_code(code) {
            Ok(d) => Ok(vec![d]),
            Err(CoreError::NotFound) => Ok(Vec::new()),
            Err(e) => Err(e),
        },
        None => state.domains.get_domains(),
    };
    match result {
        Ok(domains) => Json(domains).into_response(),
        Err(e) => error_response("list_domains", e),
    }
}

async fn get_domain(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.domains.get_domain(&id) {
        Ok(d) => Json(d).into_response(),
        Err(e) => error_response("get_domain", e),
    }
}

async fn create_domain(
    State(state): State<AppState>,
    body: Result<Json<Domain>, JsonRejection>,
) -> Response {
    let mut domain = match json_body("create_domain", body) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    domain.id = None;
    match state.domains.save_domain(domain) {
        Ok(saved) => {
            info!(id = ?saved.id, code = %saved.code, "domain created");
            (StatusCode::CREATED, Json(saved)).into_response()
        }
        Err(e) => error_response("create_domain", e),
    }
}

async fn update_domain(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Domain>, JsonRejection>,
) -> Response {
    let mut domain = match json_body("update_domain", body) {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    domain.id = Some(id);
    match state.domains.save_domain(domain) {
        Ok(saved) => {
            info!(id = ?saved.id, "domain updated");
            Json(saved).into_response()
        }
        Err(e) => error_response("update_domain", e),
    }
}

async fn delete_domain(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    match state.domains.delete_domain(&id) {
        Ok(removed_messages) => {
            info!(%id, removed_messages, "domain deleted");
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => error_response("delete_domain", e),
    }
}

// ============ Key messages ============

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MessageFilter {
    language_tag: String,
    #[serde(default)]
    key: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

async fn find_messages(
    State(state): State<AppState>,
    Path(domain_id): Path<String>,
    Query(filter): Query<MessageFilter>,
) -> Response {
    let tag = match parse_tag(&filter.language_tag) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    match state.messages.find_messages(
        &domain_id,
        &tag,
        filter.key.as_deref(),
        filter.content.as_deref(),
    ) {
        Ok(found) => Json(found).into_response(),
        Err(e) => error_response("find_messages", e),
    }
}

async fn create_message(
    State(state): State<AppState>,
    Path(domain_id): Path<String>,
    body: Result<Json<KeyMessage>, JsonRejection>,
) -> Response {
    let mut message = match json_body("create_message", body) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    message.id = None;
    message.domain_id = domain_id;
    match state.messages.save_message(message) {
        Ok(saved) => {
            info!(id = ?saved.id, key = %saved.key, tag = %saved.language_tag, "message created");
            (StatusCode::CREATED, Json(saved)).into_response()
        }
        Err(e) => error_response("create_message", e),
    }
}

async fn update_message(
    State(state): State<AppState>,
    Path((domain_id, message_id)): Path<(String, String)>,
    body: Result<Json<KeyMessage>, JsonRejection>,
) -> Response {
    let mut message = match json_body("update_message", body) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    message.id = Some(message_id);
    message.domain_id = domain_id;
    match state.messages.save_message(message) {
        Ok(saved) => Json(saved).into_response(),
        Err(e) => error_response("update_message", e),
    }
}

async fn delete_message(
    State(state): State<AppState>,
    Path((domain_id, message_id)): Path<(String, String)>,
) -> Response {
    match state.messages.delete_message(&domain_id, &message_id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("delete_message", e),
    }
}

// ============ Languages ============

async fn list_languages(State(state): State<AppState>) -> Response {
    match state.languages.find_languages() {
        Ok(all) => Json(all).into_response(),
        Err(e) => error_response("list_languages", e),
    }
}

async fn list_language_tags(State(state): State<AppState>) -> Response {
    match state.languages.find_language_tags() {
        Ok(tags) => Json(tags).into_response(),
        Err(e) => error_response("list_language_tags", e),
    }
}

async fn create_language(
    State(state): State<AppState>,
    body: Result<Json<Language>, JsonRejection>,
) -> Response {
    let language = match json_body("create_language", body) {
        Ok(l) => l,
        Err(resp) => return resp,
    };
    match state.languages.create_language(language) {
        Ok(created) => {
            info!(code = %created.code, "language created");
            (StatusCode::CREATED, Json(created)).into_response()
        }
        Err(e) => error_response("create_language", e),
    }
}

async fn delete_language(State(state): State<AppState>, Path(code): Path<String>) -> Response {
    let tag = match parse_tag(&code) {
        Ok(t) => t,
        Err(resp) => return resp,
    };
    match state.languages.delete_language(&tag) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => error_response("delete_language", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn app() -> Router {
        router(AppState::new(AnyRepo::memory(true)))
    }

    async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(v) => {
                req = req.header("content-type", "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        let resp = router.clone().oneshot(req.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn new_domain(code: &str) -> Value {
        json!({
            "code": code,
            "description": "Shop front",
            "defaultLanguageTag": "fr",
            "supportedLanguageTags": ["fr", "en"]
        })
    }

    #[tokio::test]
    async fn lists_seeded_domain() {
        let router = app();
        let (status, body) = send(&router, "GET", "/api/domains", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!([{
                "id": "1",
                "code": "I18N",
                "description": "I18n domain",
                "defaultLanguageTag": "en",
                "supportedLanguageTags": ["en", "fr"]
            }])
        );

        let (_, body) = send(&router, "GET", "/api/domains?code=I18N", None).await;
        assert_eq!(body[0]["id"], "1");
        let (status, body) = send(&router, "GET", "/api/domains?code=NOPE", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn create_update_and_delete_domain() {
        let router = app();
        let (status, created) = send(&router, "POST", "/api/domains", Some(new_domain("SHOP"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["supportedLanguageTags"], json!(["en", "fr"]));
        let id = created["id"].as_str().unwrap().to_string();

        let (status, _) = send(&router, "POST", "/api/domains", Some(new_domain("SHOP"))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let mut edited = created.clone();
        edited["description"] = json!("Storefront");
        let (status, body) = send(&router, "PUT", &format!("/api/domains/{id}"), Some(edited)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["description"], "Storefront");

        let (status, body) = send(&router, "DELETE", &format!("/api/domains/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(body, Value::Null);
        let (status, body) = send(&router, "GET", &format!("/api/domains/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "not_found");
    }

    #[tokio::test]
    async fn invalid_domain_reports_every_field() {
        let router = app();
        let body = json!({"code": "", "description": "", "supportedLanguageTags": []});
        let (status, body) = send(&router, "POST", "/api/domains", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_request");
        let codes: Vec<&str> = body["error"]["fields"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["code"].as_str().unwrap())
            .collect();
        assert!(codes.contains(&"domain.code.required"));
        assert!(codes.contains(&"domain.description.required"));
        assert!(codes.contains(&"domain.supportedLanguageTags.required"));
    }

    #[tokio::test]
    async fn empty_default_tag_is_reported_as_missing() {
        let router = app();
        let body = json!({
            "code": "SHOP",
            "description": "Shop front",
            "defaultLanguageTag": "",
            "supportedLanguageTags": ["fr"]
        });
        let (status, body) = send(&router, "POST", "/api/domains", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_request");
        assert_eq!(
            body["error"]["fields"],
            json!([{"field": "defaultLanguageTag", "code": "domain.defaultLanguageTag.required"}])
        );
    }

    #[tokio::test]
    async fn malformed_tags_in_bodies_are_bad_requests() {
        let router = app();
        let en_us = json!({"code": "en_US", "label": "English (US)", "englishLabel": "English (US)"});
        let (status, body) = send(&router, "POST", "/api/languages", Some(en_us)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_request");
        assert!(body["error"]["message"].as_str().unwrap().contains("en_US"));

        let mut domain = new_domain("SHOP");
        domain["supportedLanguageTags"] = json!(["fr", "x"]);
        let (status, body) = send(&router, "POST", "/api/domains", Some(domain)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_request");

        let msg = json!({"key": "test.one", "languageTag": "", "content": "Hi"});
        let (status, body) = send(&router, "POST", "/api/domains/1/messages", Some(msg)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_request");
    }

    #[tokio::test]
    async fn messages_are_searched_and_created() {
        let router = app();
        let (status, body) =
            send(&router, "GET", "/api/domains/1/messages?languageTag=en", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);

        let (_, body) = send(
            &router,
            "GET",
            "/api/domains/1/messages?languageTag=en&content=two",
            None,
        )
        .await;
        assert_eq!(body, json!([{
            "id": "2",
            "domainId": "1",
            "key": "test.two",
            "languageTag": "en",
            "content": "Test Two"
        }]));

        let msg = json!({"key": "test.one", "languageTag": "fr", "content": "Essai un"});
        let (status, created) =
            send(&router, "POST", "/api/domains/1/messages", Some(msg.clone())).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["domainId"], "1");
        let (status, _) = send(&router, "POST", "/api/domains/1/messages", Some(msg)).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let id = created["id"].as_str().unwrap();
        let edited = json!({"key": "test.one", "languageTag": "fr", "content": "Test un"});
        let (status, body) = send(
            &router,
            "PUT",
            &format!("/api/domains/1/messages/{id}"),
            Some(edited),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["content"], "Test un");

        let (status, _) =
            send(&router, "DELETE", &format!("/api/domains/1/messages/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
    }

    #[tokio::test]
    async fn message_lookups_reject_bad_input() {
        let router = app();
        let (status, _) =
            send(&router, "GET", "/api/domains/9/messages?languageTag=en", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, body) =
            send(&router, "GET", "/api/domains/1/messages?languageTag=1x", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid_request");

        let msg = json!({"key": "a", "languageTag": "de", "content": "Eins"});
        let (status, body) = send(&router, "POST", "/api/domains/1/messages", Some(msg)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["fields"][0]["code"],
            "keyMessage.languageTag.unsupported"
        );
    }

    #[tokio::test]
    async fn language_catalog_endpoints() {
        let router = app();
        let (status, body) = send(&router, "GET", "/api/languages/tags", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(["en", "es", "de", "fr", "zh"]));

        let (_, body) = send(&router, "GET", "/api/languages", None).await;
        assert_eq!(body[1], json!({"code": "es", "label": "Español", "englishLabel": "Spanish"}));

        let (status, body) = send(&router, "DELETE", "/api/languages/en", None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "conflict");
        let (status, _) = send(&router, "DELETE", "/api/languages/zh", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let it = json!({"code": "it", "label": "Italiano", "englishLabel": "Italian"});
        let (status, _) = send(&router, "POST", "/api/languages", Some(it)).await;
        assert_eq!(status, StatusCode::CREATED);
        let (_, body) = send(&router, "GET", "/api/languages/tags", None).await;
        assert_eq!(body, json!(["en", "es", "de", "fr", "it"]));
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let resp = app()
            .oneshot(
                Request::builder()
                    .uri("/api/languages/tags")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert!(resp.headers().contains_key("x-request-id"));
    }
}

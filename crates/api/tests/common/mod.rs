//! Shared helpers for the API integration tests.
#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::header::{ACCEPT_LANGUAGE, AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Method, Request};
use axum::Router;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

use hearth_api::auth::jwt::{generate_access_token, JwtConfig};
use hearth_api::config::ServerConfig;
use hearth_api::router::build_app_router;
use hearth_api::state::AppState;
use hearth_core::localization::{Catalog, Translations};
use hearth_events::EventBus;

pub const TEST_ORIGIN: &str = "http://localhost:8081";

pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec![TEST_ORIGIN.to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "test-secret-for-integration-tests".to_string(),
            access_token_expiry_mins: 60,
        },
        locales_dir: PathBuf::from("locales"),
        default_locale: "en".to_string(),
        push_gateway_url: None,
        reminder_interval_secs: 60,
        reminder_window_mins: 30,
    }
}

fn test_translations() -> Translations {
    let mut translations = Translations::new("en");
    translations.insert(
        "en",
        Catalog::from_pairs([("Household", "Household"), ("Cleaning", "Cleaning")]),
    );
    translations.insert(
        "de",
        Catalog::from_pairs([("Household", "Haushalt"), ("Cleaning", "Putzen")]),
    );
    translations
}

/// A router wired like the binary, plus the bus it publishes to.
pub struct TestApp {
    pub router: Router,
    pub bus: Arc<EventBus>,
    config: ServerConfig,
}

impl TestApp {
    /// Bearer token for `person_id`.
    pub fn token(&self, person_id: i64) -> String {
        generate_access_token(person_id, &self.config.jwt).expect("token")
    }

    pub async fn send(&self, request: Request<Body>) -> axum::response::Response {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, person_id: i64) -> axum::response::Response {
        self.send(self.request(Method::GET, uri, person_id).body(Body::empty()).unwrap())
            .await
    }

    pub async fn get_localized(
        &self,
        uri: &str,
        person_id: i64,
        language: &str,
    ) -> axum::response::Response {
        self.send(
            self.request(Method::GET, uri, person_id)
                .header(ACCEPT_LANGUAGE, language)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(
        &self,
        uri: &str,
        person_id: i64,
        body: serde_json::Value,
    ) -> axum::response::Response {
        self.send_json(Method::POST, uri, person_id, body).await
    }

    pub async fn put_json(
        &self,
        uri: &str,
        person_id: i64,
        body: serde_json::Value,
    ) -> axum::response::Response {
        self.send_json(Method::PUT, uri, person_id, body).await
    }

    pub async fn delete(&self, uri: &str, person_id: i64) -> axum::response::Response {
        self.send(
            self.request(Method::DELETE, uri, person_id)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    async fn send_json(
        &self,
        method: Method,
        uri: &str,
        person_id: i64,
        body: serde_json::Value,
    ) -> axum::response::Response {
        self.send(
            self.request(method, uri, person_id)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    fn request(&self, method: Method, uri: &str, person_id: i64) -> axum::http::request::Builder {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(AUTHORIZATION, format!("Bearer {}", self.token(person_id)))
    }
}

pub fn build_test_app(pool: PgPool) -> TestApp {
    let config = test_config();
    let bus = Arc::new(EventBus::default());

    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        event_bus: Arc::clone(&bus),
        translations: Arc::new(test_translations()),
    };

    TestApp {
        router: build_app_router(state, &config),
        bus,
        config,
    }
}

/// Read the response body as JSON.
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Unauthenticated GET.
pub async fn get(app: Router, uri: &str) -> axum::response::Response {
    app.oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

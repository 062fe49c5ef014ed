#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sonaa_api::auth::jwt::{generate_access_token, JwtConfig};
use sonaa_api::auth::password::hash_password;
use sonaa_api::config::ServerConfig;
use sonaa_api::router::build_app_router;
use sonaa_api::state::AppState;
use sonaa_core::access::Capabilities;
use sonaa_core::types::DbId;
use sonaa_db::memory::{InMemoryDirectory, InMemoryProjectStore};
use tower::ServiceExt;

pub const PASSWORD: &str = "test_password_123!";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5500".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: "integration-test-secret-long-enough".to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

/// Users seeded into every test app.
pub struct Users {
    /// Every capability.
    pub admin: DbId,
    /// `can_add_project` only.
    pub manager: DbId,
    /// `can_approve_stages` only.
    pub reviewer: DbId,
    /// No capabilities; used as stage assignees.
    pub designer: DbId,
    pub writer: DbId,
    pub outsider: DbId,
}

pub struct TestApp {
    pub router: Router,
    pub users: Users,
    pub config: ServerConfig,
}

impl TestApp {
    /// Fresh in-memory stores behind the production router and middleware.
    pub fn new() -> Self {
        let directory = InMemoryDirectory::new();
        let hash = hash_password(PASSWORD).expect("hashing should succeed");

        let users = Users {
            admin: directory.add_user("Admin", "admin@sonaa.test", &hash, Some("Admin"), Capabilities::all()),
            manager: directory.add_user(
                "Manager",
                "manager@sonaa.test",
                &hash,
                Some("Manager"),
                Capabilities {
                    can_add_project: true,
                    ..Capabilities::default()
                },
            ),
            reviewer: directory.add_user(
                "Reviewer",
                "reviewer@sonaa.test",
                &hash,
                Some("Reviewer"),
                Capabilities {
                    can_approve_stages: true,
                    ..Capabilities::default()
                },
            ),
            designer: directory.add_user("Designer", "designer@sonaa.test", &hash, None, Capabilities::default()),
            writer: directory.add_user("Writer", "writer@sonaa.test", &hash, None, Capabilities::default()),
            outsider: directory.add_user("Outsider", "outsider@sonaa.test", &hash, None, Capabilities::default()),
        };

        let config = test_config();
        let state = AppState {
            projects: Arc::new(InMemoryProjectStore::new()),
            directory: Arc::new(directory),
            config: Arc::new(config.clone()),
        };

        Self {
            router: build_app_router(state, &config),
            users,
            config,
        }
    }

    pub fn token(&self, user_id: DbId) -> String {
        generate_access_token(user_id, &self.config.jwt).expect("token generation should succeed")
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        user: Option<DbId>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user_id) = user {
            builder = builder.header("authorization", format!("Bearer {}", self.token(user_id)));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap()
    }

    pub async fn get(&self, uri: &str, user: DbId) -> (StatusCode, Value) {
        split(self.send(Method::GET, uri, Some(user), None).await).await
    }

    pub async fn post(&self, uri: &str, user: DbId, body: Value) -> (StatusCode, Value) {
        split(self.send(Method::POST, uri, Some(user), Some(body)).await).await
    }

    pub async fn put(&self, uri: &str, user: DbId, body: Value) -> (StatusCode, Value) {
        split(self.send(Method::PUT, uri, Some(user), Some(body)).await).await
    }

    /// Create the two-stage project used across tests: "S1" for the designer,
    /// then "S2" for the writer. Returns the project id.
    pub async fn create_two_stage_project(&self) -> DbId {
        let (status, json) = self
            .post("/api/v1/projects", self.users.manager, two_stage_body(&self.users))
            .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        json["id"].as_i64().expect("project id")
    }
}

pub fn two_stage_body(users: &Users) -> Value {
    json!({
        "name": "Brand refresh",
        "client_id": 7,
        "project_type": "one_time",
        "project_deadline": "2099-12-31",
        "project_description": "Logo and guidelines",
        "workflow": [
            { "name": "S1", "assigned_to": users.designer, "stage_deadline": "2099-01-10" },
            { "name": "S2", "assigned_to": users.writer, "stage_deadline": "2099-01-20" }
        ]
    })
}

/// Collect a response into its status and JSON body (`Null` when empty).
pub async fn split(response: Response<Body>) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

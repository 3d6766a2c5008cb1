//! In-memory fakes and request helpers shared by the API tests.
#![allow(dead_code)]

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use dispatch_api::auth::service::AuthService;
use dispatch_api::auth::AuthConfig;
use dispatch_api::{create_app, AppState};
use dispatch_domain::{
    CreateUser, Dispatch, DispatchError, DispatchFilter, DispatchRepository, DispatchResult,
    DispatchService, User, UserRepository,
};

#[derive(Default)]
pub struct InMemoryUserRepository {
    users: Mutex<Vec<User>>,
    next_id: AtomicI64,
}

impl InMemoryUserRepository {
    pub fn deactivate(&self, email: &str) {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.email == email) {
            user.is_active = false;
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &CreateUser) -> DispatchResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.username == user.username) {
            return Err(DispatchError::validation_error("Username already registered"));
        }
        if users.iter().any(|u| u.email == user.email) {
            return Err(DispatchError::validation_error("Email already registered"));
        }
        let created = User {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            is_active: true,
            created_at: chrono::Utc::now(),
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> DispatchResult<Option<User>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> DispatchResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> DispatchResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }
}

#[derive(Default)]
pub struct InMemoryDispatchRepository {
    rows: Mutex<Vec<Dispatch>>,
    next_id: AtomicI64,
}

impl InMemoryDispatchRepository {
    fn matches(dispatch: &Dispatch, filter: &DispatchFilter) -> bool {
        filter.status.is_none_or(|s| dispatch.status == s)
            && filter.date.is_none_or(|d| dispatch.date == d)
            && filter.area.as_ref().is_none_or(|a| &dispatch.area == a)
            && filter.owner_id.is_none_or(|o| dispatch.owner_id == Some(o))
    }
}

#[async_trait]
impl DispatchRepository for InMemoryDispatchRepository {
    async fn create(&self, dispatch: &Dispatch) -> DispatchResult<Dispatch> {
        let mut rows = self.rows.lock().unwrap();
        let mut created = dispatch.clone();
        created.id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        rows.push(created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: i64) -> DispatchResult<Option<Dispatch>> {
        Ok(self.rows.lock().unwrap().iter().find(|d| d.id == id).cloned())
    }

    async fn list(&self, filter: &DispatchFilter) -> DispatchResult<Vec<Dispatch>> {
        let rows = self.rows.lock().unwrap();
        let skip = filter.offset.unwrap_or(0).max(0) as usize;
        let limit = filter.limit.unwrap_or(i64::MAX).max(0) as usize;
        Ok(rows
            .iter()
            .filter(|d| Self::matches(d, filter))
            .skip(skip)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self, filter: &DispatchFilter) -> DispatchResult<i64> {
        let rows = self.rows.lock().unwrap();
        Ok(rows.iter().filter(|d| Self::matches(d, filter)).count() as i64)
    }

    async fn update(&self, dispatch: &Dispatch) -> DispatchResult<()> {
        let mut rows = self.rows.lock().unwrap();
        match rows.iter_mut().find(|d| d.id == dispatch.id) {
            Some(row) => {
                *row = dispatch.clone();
                Ok(())
            }
            None => Err(DispatchError::dispatch_not_found(dispatch.id)),
        }
    }
}

pub struct TestApp {
    pub app: Router,
    pub users: Arc<InMemoryUserRepository>,
    pub dispatches: Arc<InMemoryDispatchRepository>,
}

pub fn test_app() -> TestApp {
    let users = Arc::new(InMemoryUserRepository::default());
    let dispatches = Arc::new(InMemoryDispatchRepository::default());

    let auth_config = AuthConfig {
        jwt_secret: "integration-test-secret".to_string(),
        access_token_expire_minutes: 30,
    };
    let state = AppState {
        dispatch_service: Arc::new(DispatchService::new(
            dispatches.clone() as Arc<dyn DispatchRepository>
        )),
        auth_service: Arc::new(AuthService::new(
            &auth_config,
            users.clone() as Arc<dyn UserRepository>,
        )),
    };

    TestApp {
        app: create_app(state),
        users,
        dispatches,
    }
}

pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

/// Registers a user and returns their access token.
pub async fn signup(app: &Router, username: &str, email: &str) -> String {
    let (status, body) = request(
        app,
        "POST",
        "/api/auth/signup",
        None,
        Some(json!({ "username": username, "email": email, "password": "pass1234" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
    body["data"]["access_token"].as_str().unwrap().to_string()
}

pub async fn create_dispatch(app: &Router, token: &str, area: &str) -> i64 {
    let (status, body) = request(
        app,
        "POST",
        "/api/dispatches",
        Some(token),
        Some(json!({ "area": area })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body["data"]["id"].as_i64().unwrap()
}

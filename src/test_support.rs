// src/test_support.rs
//! Fixtures shared by the unit and HTTP tests.
use axum::{
    Router,
    body::{Body, Bytes, to_bytes},
    http::{
        HeaderMap, Request, StatusCode,
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
    },
};
use cookie::Cookie;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tower::ServiceExt;

use crate::{
    auth::{HashCost, SESSION_COOKIE},
    models::{
        car::{Car, CarDraft},
        driver::{Driver, NewDriver},
        manufacturer::{Manufacturer, ManufacturerDraft},
    },
    routes,
    services::{CarOperations, DriverOperations, ManufacturerOperations, SessionOperations, StorageService},
    state::{AppConfig, AppState},
};

pub fn memory_state() -> Arc<AppState> {
    let config = AppConfig {
        password_hash_cost: HashCost::minimal(),
        ..AppConfig::default()
    };
    Arc::new(AppState::with_storage(config, StorageService::new_memory()).unwrap())
}

pub async fn create_manufacturer(state: &AppState, name: &str, country: &str) -> Manufacturer {
    state
        .manufacturer_service
        .create_manufacturer(ManufacturerDraft {
            name: name.to_string(),
            country: country.to_string(),
        })
        .await
        .unwrap()
}

pub async fn create_driver(state: &AppState, username: &str, password: &str, license_number: &str) -> Driver {
    state
        .driver_service
        .create_user(
            NewDriver::new(username)
                .with_password(password)
                .with_license(license_number),
        )
        .await
        .unwrap()
}

pub async fn create_superuser(state: &AppState, username: &str, password: &str) -> Driver {
    state.driver_service.create_superuser(username, password).await.unwrap()
}

pub async fn create_car(state: &AppState, model: &str, manufacturer_id: u64, driver_ids: &[u64]) -> Car {
    state
        .car_service
        .create_car(CarDraft {
            model: model.to_string(),
            manufacturer_id,
            driver_ids: driver_ids.iter().copied().collect::<BTreeSet<_>>(),
        })
        .await
        .unwrap()
}

/// Drives the full router in process, carrying the session cookie between
/// requests.
pub struct TestClient {
    app: Router,
    state: Arc<AppState>,
    cookie: Option<String>,
}

impl TestClient {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            app: routes::router(state.clone()),
            state,
            cookie: None,
        }
    }

    /// Starts a session for `driver` without going through the login form.
    pub async fn force_login(&mut self, driver: &Driver) {
        let session = self.state.session_service.begin(driver.id).await.unwrap();
        self.cookie = Some(format!("{}={}", SESSION_COOKIE, session.id));
    }

    pub async fn login(&mut self, username: &str, password: &str) -> TestResponse {
        let response = self
            .post(routes::LOGIN, &[("username", username), ("password", password)])
            .await;
        if let Some(cookie) = response.session_cookie() {
            self.cookie = Some(cookie);
        }
        response
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Request::builder().method("GET").uri(uri), Body::empty()).await
    }

    pub async fn post(&self, uri: &str, form: &[(&str, &str)]) -> TestResponse {
        let body = serde_urlencoded::to_string(form).unwrap();
        let builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        self.send(builder, Body::from(body)).await
    }

    /// POST without a body, as a bare confirmation button would send.
    pub async fn post_empty(&self, uri: &str) -> TestResponse {
        self.send(Request::builder().method("POST").uri(uri), Body::empty()).await
    }

    async fn send(&self, mut builder: axum::http::request::Builder, body: Body) -> TestResponse {
        if let Some(cookie) = &self.cookie {
            builder = builder.header(COOKIE, cookie);
        }
        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse { status, headers, body }
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn location(&self) -> Option<&str> {
        self.headers.get(LOCATION).and_then(|value| value.to_str().ok())
    }

    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn template(&self) -> String {
        self.json()["template"].as_str().unwrap_or_default().to_string()
    }

    pub fn context(&self) -> Value {
        self.json()["context"].clone()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// `name=value` of a session cookie set by this response, unless it is a
    /// removal.
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| Cookie::parse(value.to_string()).ok())
            .find(|cookie| cookie.name() == SESSION_COOKIE && !cookie.value().is_empty())
            .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
    }

    pub fn clears_session(&self) -> bool {
        self.headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .filter_map(|value| Cookie::parse(value.to_string()).ok())
            .any(|cookie| cookie.name() == SESSION_COOKIE && cookie.value().is_empty())
    }
}

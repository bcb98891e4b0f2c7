// src/handlers/auth_handler.rs
use axum::{
    Form,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;

use crate::{
    auth::extractor::{removal_cookie, session_cookie, session_id},
    errors::{TaxiResult, ValidationError},
    forms::{FormData, LoginForm},
    handlers::{Page, form_context, found, validated},
    routes,
    services::{DriverOperations, SessionOperations},
    state::AppState,
};

/// Only local absolute paths are followed after login.
fn is_safe_redirect(next: &str) -> bool {
    next.starts_with('/') && !next.starts_with("//") && !next.contains('\\')
}

fn login_form_page(data: &FormData, errors: &[ValidationError], next: &str) -> Page {
    Page::new(
        LoginForm::TEMPLATE,
        json!({
            "form": form_context::<LoginForm>(data, &LoginForm::SECRET_FIELDS, errors),
            "next": next,
        }),
    )
}

pub async fn login_page(Query(query): Query<Vec<(String, String)>>) -> Page {
    let query = FormData::from(query);
    login_form_page(&FormData::new(), &[], &query.value("next"))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<Vec<(String, String)>>,
    Form(form): Form<Vec<(String, String)>>,
) -> TaxiResult<Response> {
    let data = FormData::from(form);
    let query = FormData::from(query);
    let next = match data.value("next") {
        next if next.is_empty() => query.value("next"),
        next => next,
    };

    let driver = match validated(LoginForm::clean(&data, &*state.driver_service).await)? {
        Ok(driver) => driver,
        Err(errors) => {
            return Ok(login_form_page(&data, &errors, &next)
                .status(StatusCode::BAD_REQUEST)
                .into_response());
        }
    };

    // A new login always gets a new session.
    if let Some(previous) = session_id(&headers) {
        state.session_service.end(&previous).await?;
    }
    let session = state.session_service.begin(driver.id).await?;
    state.driver_service.record_login(driver.id).await?;
    tracing::info!("Driver {} logged in", driver.username);

    let target = if is_safe_redirect(&next) { next.as_str() } else { routes::INDEX };
    Ok(([(SET_COOKIE, session_cookie(&session))], found(target)).into_response())
}

pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> TaxiResult<Response> {
    if let Some(session_id) = session_id(&headers) {
        if state.session_service.end(&session_id).await? {
            tracing::info!("Session {} ended", session_id);
        }
    }
    Ok(([(SET_COOKIE, removal_cookie())], found(routes::LOGIN)).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{self, TestClient};

    #[test]
    fn test_safe_redirects() {
        assert!(is_safe_redirect("/cars/?page=2"));
        assert!(!is_safe_redirect("https://example.com/"));
        assert!(!is_safe_redirect("//example.com/"));
        assert!(!is_safe_redirect(""));
    }

    #[tokio::test]
    async fn test_login_page() {
        let client = TestClient::new(test_support::memory_state());
        let response = client.get("/accounts/login/?next=%2Fcars%2F").await;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.template(), "registration/login.html");
        assert_eq!(response.context()["next"], "/cars/");
    }

    #[tokio::test]
    async fn test_login_redirects_to_next() {
        let state = test_support::memory_state();
        let driver = test_support::create_driver(&state, "driver", "password123", "ABC12345").await;
        let mut client = TestClient::new(state.clone());

        let response = client
            .post(
                "/accounts/login/?next=%2Fcars%2F",
                &[("username", "driver"), ("password", "password123")],
            )
            .await;
        assert_eq!(response.status, StatusCode::FOUND);
        assert_eq!(response.location(), Some("/cars/"));
        assert!(response.session_cookie().is_some());

        let response = client.login("driver", "password123").await;
        assert_eq!(response.location(), Some(routes::INDEX));
        let stored = state.driver_service.require_driver(driver.id).await.unwrap();
        assert!(stored.last_login.is_some());

        assert_eq!(client.get(routes::CAR_LIST).await.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_ignores_foreign_next() {
        let state = test_support::memory_state();
        test_support::create_driver(&state, "driver", "password123", "ABC12345").await;
        let client = TestClient::new(state);

        let response = client
            .post(
                routes::LOGIN,
                &[
                    ("username", "driver"),
                    ("password", "password123"),
                    ("next", "https://example.com/"),
                ],
            )
            .await;
        assert_eq!(response.location(), Some(routes::INDEX));
    }

    #[tokio::test]
    async fn test_invalid_login_rerenders_form() {
        let state = test_support::memory_state();
        test_support::create_driver(&state, "driver", "password123", "ABC12345").await;
        let mut client = TestClient::new(state);

        let response = client.login("driver", "wrong-password").await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert!(response.session_cookie().is_none());

        let context = response.context();
        let form = &context["form"];
        assert_eq!(form["data"]["username"], "driver");
        assert!(form["data"].get("password").is_none());
        assert_eq!(
            form["errors"]["__all__"][0],
            crate::forms::login_form::INVALID_LOGIN
        );
    }

    #[tokio::test]
    async fn test_logout() {
        let state = test_support::memory_state();
        let driver = test_support::create_driver(&state, "driver", "password123", "ABC12345").await;
        let mut client = TestClient::new(state);
        client.force_login(&driver).await;
        assert_eq!(client.get(routes::INDEX).await.status, StatusCode::OK);

        let response = client.post_empty(routes::LOGOUT).await;
        assert_eq!(response.status, StatusCode::FOUND);
        assert_eq!(response.location(), Some(routes::LOGIN));
        assert!(response.clears_session());

        // The old cookie no longer authenticates.
        assert_eq!(client.get(routes::INDEX).await.status, StatusCode::FOUND);
    }
}

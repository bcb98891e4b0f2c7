// src/auth/extractor.rs
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::COOKIE, request::Parts},
    response::{IntoResponse, Response},
};
use cookie::{Cookie, SameSite};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    errors::{TaxiError, TaxiResult},
    handlers::found,
    models::{driver::Driver, session::Session},
    routes,
    services::{DriverOperations, SessionOperations},
    state::AppState,
};

pub const SESSION_COOKIE: &str = "sessionid";

/// The logged-in driver together with the session that authenticated them.
#[derive(Debug, Clone)]
pub struct CurrentDriver {
    pub session: Session,
    pub driver: Driver,
}

/// A logged-in driver with console access.
#[derive(Debug, Clone)]
pub struct StaffDriver(pub CurrentDriver);

pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE)
        .and_then(|cookie| Uuid::parse_str(cookie.value()).ok())
}

/// Resolves the request's session cookie. Unknown or expired sessions, and
/// sessions of deleted or inactive drivers, resolve to `None`.
pub async fn resolve(state: &AppState, headers: &HeaderMap) -> TaxiResult<Option<CurrentDriver>> {
    let Some(session_id) = session_id(headers) else {
        return Ok(None);
    };
    let Some(session) = state.session_service.get_session(&session_id).await? else {
        return Ok(None);
    };
    let Some(driver) = state.driver_service.get_driver(session.driver_id).await? else {
        return Ok(None);
    };
    if !driver.is_active {
        return Ok(None);
    }
    Ok(Some(CurrentDriver { session, driver }))
}

/// `Set-Cookie` value carrying a freshly started session.
pub fn session_cookie(session: &Session) -> String {
    Cookie::build((SESSION_COOKIE, session.id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
        .to_string()
}

/// `Set-Cookie` value that clears the session cookie.
pub fn removal_cookie() -> String {
    let mut cookie = Cookie::build((SESSION_COOKIE, "")).path("/").build();
    cookie.make_removal();
    cookie.to_string()
}

/// 302 to the login page, remembering where the visitor was going.
pub fn login_redirect(next: &str) -> Response {
    match serde_urlencoded::to_string([("next", next)]) {
        Ok(query) => found(format!("{}?{}", routes::LOGIN, query)),
        Err(_) => found(routes::LOGIN),
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for CurrentDriver {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        match resolve(state, &parts.headers).await {
            Ok(Some(current)) => Ok(current),
            Ok(None) => {
                let next = parts
                    .uri
                    .path_and_query()
                    .map(|path| path.as_str())
                    .unwrap_or(routes::INDEX);
                tracing::debug!("Anonymous request to {}, redirecting to login", next);
                Err(login_redirect(next))
            }
            Err(err) => Err(err.into_response()),
        }
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for StaffDriver {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let current = CurrentDriver::from_request_parts(parts, state).await?;
        if !current.driver.is_staff {
            tracing::warn!("Driver {} denied console access", current.driver.id);
            return Err(TaxiError::forbidden("Staff access required").into_response());
        }
        Ok(StaffDriver(current))
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for the taxi fleet service
#[derive(Debug)]
pub enum TaxiError {
    // HTTP errors
    Forbidden(String),
    NotFound(String),
    InternalServer(String),

    // Storage errors
    StorageConnection(String),
    StorageQuery(String),
    StorageSerialization(String),

    // Business logic errors
    ManufacturerNotFound(u64),
    DriverNotFound(u64),
    CarNotFound(u64),
    UsernameTaken(String),
    LicenseTaken(String),

    // Validation errors
    ValidationFailed(Vec<ValidationError>),

    // Configuration and setup errors
    ConfigurationError(String),
    InvalidConfiguration(String),

    // Security errors
    PasswordHash(String),
}

/// A single field-level problem. `field` is `__all__` for errors that are not
/// tied to one input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub const NON_FIELD: &'static str = "__all__";

    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl fmt::Display for TaxiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaxiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            TaxiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            TaxiError::InternalServer(msg) => write!(f, "Internal server error: {}", msg),

            TaxiError::StorageConnection(msg) => write!(f, "Storage connection error: {}", msg),
            TaxiError::StorageQuery(msg) => write!(f, "Storage query error: {}", msg),
            TaxiError::StorageSerialization(msg) => write!(f, "Storage serialization error: {}", msg),

            TaxiError::ManufacturerNotFound(id) => write!(f, "Manufacturer not found: {}", id),
            TaxiError::DriverNotFound(id) => write!(f, "Driver not found: {}", id),
            TaxiError::CarNotFound(id) => write!(f, "Car not found: {}", id),
            TaxiError::UsernameTaken(username) => write!(f, "Username already taken: {}", username),
            TaxiError::LicenseTaken(license) => write!(f, "License number already taken: {}", license),

            TaxiError::ValidationFailed(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }

            TaxiError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            TaxiError::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),

            TaxiError::PasswordHash(msg) => write!(f, "Password hashing error: {}", msg),
        }
    }
}

impl std::error::Error for TaxiError {}

impl IntoResponse for TaxiError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details) = match self {
            TaxiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            TaxiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),

            TaxiError::ValidationFailed(errors) => {
                let details = serde_json::to_value(&errors).ok();
                (StatusCode::BAD_REQUEST, "validation_failed", "Validation errors occurred".to_string(), details)
            }

            TaxiError::ManufacturerNotFound(id) => {
                (StatusCode::NOT_FOUND, "manufacturer_not_found", format!("Manufacturer not found: {}", id), None)
            }
            TaxiError::DriverNotFound(id) => {
                (StatusCode::NOT_FOUND, "driver_not_found", format!("Driver not found: {}", id), None)
            }
            TaxiError::CarNotFound(id) => (StatusCode::NOT_FOUND, "car_not_found", format!("Car not found: {}", id), None),
            TaxiError::UsernameTaken(username) => {
                (StatusCode::CONFLICT, "username_taken", format!("Username already taken: {}", username), None)
            }
            TaxiError::LicenseTaken(license) => {
                (StatusCode::CONFLICT, "license_taken", format!("License number already taken: {}", license), None)
            }

            // All other errors are treated as internal server errors
            other => {
                tracing::error!("request failed: {}", other);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", other.to_string(), None)
            }
        };

        let error_response = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, axum::Json(error_response)).into_response()
    }
}

// Convenience type alias for Results
pub type TaxiResult<T> = Result<T, TaxiError>;

impl From<argon2::password_hash::Error> for TaxiError {
    fn from(err: argon2::password_hash::Error) -> Self {
        TaxiError::PasswordHash(err.to_string())
    }
}

// Helper functions for creating common errors
impl TaxiError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        TaxiError::Forbidden(msg.into())
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        TaxiError::NotFound(resource.into())
    }

    pub fn internal_error(msg: impl Into<String>) -> Self {
        TaxiError::InternalServer(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            TaxiError::NotFound(_)
                | TaxiError::ManufacturerNotFound(_)
                | TaxiError::DriverNotFound(_)
                | TaxiError::CarNotFound(_)
        )
    }
}

// src/models/driver.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stored in place of a hash for accounts created without a password.
pub const UNUSABLE_PASSWORD: &str = "!";

/// A driver is the fleet's user account: it logs in, shows up on cars and is
/// the only kind of user the service knows about.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Driver {
    pub id: u64,
    pub username: String,
    /// PHC-formatted Argon2 hash, or [`UNUSABLE_PASSWORD`].
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub license_number: String,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_active: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl Driver {
    pub fn has_usable_password(&self) -> bool {
        !self.password.starts_with(UNUSABLE_PASSWORD)
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.username, self.first_name, self.last_name)
    }
}

// Request models
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct NewDriver {
    pub username: String,
    pub password: Option<String>, // Will be hashed
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub license_number: String,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl NewDriver {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            ..Default::default()
        }
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_license(mut self, license_number: impl Into<String>) -> Self {
        self.license_number = license_number.into();
        self
    }

    pub fn with_names(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }
}

/// Partial update; `None` leaves the stored value untouched.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct DriverUpdate {
    pub license_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

// Response model (never carries the password hash)
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DriverResponse {
    pub id: u64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub license_number: String,
    pub is_staff: bool,
    pub display: String,
}

impl From<&Driver> for DriverResponse {
    fn from(driver: &Driver) -> Self {
        Self {
            id: driver.id,
            username: driver.username.clone(),
            first_name: driver.first_name.clone(),
            last_name: driver.last_name.clone(),
            email: driver.email.clone(),
            license_number: driver.license_number.clone(),
            is_staff: driver.is_staff,
            display: driver.to_string(),
        }
    }
}

impl From<Driver> for DriverResponse {
    fn from(driver: Driver) -> Self {
        DriverResponse::from(&driver)
    }
}

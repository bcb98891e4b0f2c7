// src/forms/driver_form.rs
use serde::{Deserialize, Serialize};

use crate::{
    errors::TaxiResult,
    forms::{Field, FieldErrors, Form, FormData, REQUIRED, optional_char, required_char},
    models::driver::{Driver, DriverUpdate, NewDriver},
    services::DriverOperations,
};

const USERNAME_MAX_LEN: usize = 150;
const NAME_MAX_LEN: usize = 150;
const PASSWORD_MIN_LEN: usize = 8;
const LICENSE_LEN: usize = 8;

const DUPLICATE_LICENSE: &str = "A driver with this license number already exists.";

/// Checks the fixed license format: three uppercase letters followed by five
/// digits. Returns one message per failed rule.
pub fn validate_license_number(value: &str) -> Vec<&'static str> {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() != LICENSE_LEN {
        return vec!["License number should consist of 8 characters"];
    }

    let mut messages = Vec::new();
    if !chars[..3].iter().all(|c| c.is_ascii_uppercase()) {
        messages.push("First 3 characters should be uppercase letters");
    }
    if !chars[3..].iter().all(|c| c.is_ascii_digit()) {
        messages.push("Last 5 characters should be digits");
    }
    messages
}

fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

async fn clean_license(
    data: &FormData,
    errors: &mut FieldErrors,
    drivers: &dyn DriverOperations,
    current_driver: Option<u64>,
) -> TaxiResult<String> {
    let license_number = data.value("license_number");
    if license_number.is_empty() {
        errors.add("license_number", REQUIRED);
        return Ok(license_number);
    }

    let problems = validate_license_number(&license_number);
    if !problems.is_empty() {
        for message in problems {
            errors.add("license_number", message);
        }
        return Ok(license_number);
    }

    if let Some(other) = drivers.get_driver_by_license(&license_number).await? {
        if Some(other.id) != current_driver {
            errors.add("license_number", DUPLICATE_LICENSE);
        }
    }
    Ok(license_number)
}

/// Validated registration data, exactly as submitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverCreation {
    pub username: String,
    pub password1: String,
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
}

impl DriverCreation {
    pub fn into_new_driver(self) -> NewDriver {
        NewDriver::new(self.username)
            .with_password(self.password1)
            .with_names(self.first_name, self.last_name)
            .with_license(self.license_number)
    }
}

pub struct DriverCreationForm;

impl DriverCreationForm {
    pub const TEMPLATE: &'static str = "taxi/driver_form.html";
    pub const SECRET_FIELDS: [&'static str; 2] = ["password1", "password2"];

    pub async fn clean(data: &FormData, drivers: &dyn DriverOperations) -> TaxiResult<DriverCreation> {
        let mut errors = FieldErrors::new();

        let username = required_char(data, &mut errors, "username", USERNAME_MAX_LEN);
        if !username.is_empty() && !errors.has("username") {
            if !is_valid_username(&username) {
                errors.add(
                    "username",
                    "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
                );
            } else if drivers.get_driver_by_username(&username).await?.is_some() {
                errors.add("username", "A user with that username already exists.");
            }
        }

        // Passwords are never trimmed.
        let password1 = data.get("password1").unwrap_or_default().to_string();
        let password2 = data.get("password2").unwrap_or_default().to_string();
        if password1.is_empty() {
            errors.add("password1", REQUIRED);
        }
        if password2.is_empty() {
            errors.add("password2", REQUIRED);
        }
        if !password1.is_empty() && !password2.is_empty() {
            if password1 != password2 {
                errors.add("password2", "The two password fields didn\u{2019}t match.");
            } else {
                if password2.chars().count() < PASSWORD_MIN_LEN {
                    errors.add(
                        "password2",
                        format!(
                            "This password is too short. It must contain at least {} characters.",
                            PASSWORD_MIN_LEN
                        ),
                    );
                }
                if password2.chars().all(|c| c.is_ascii_digit()) {
                    errors.add("password2", "This password is entirely numeric.");
                }
            }
        }

        let first_name = optional_char(data, &mut errors, "first_name", NAME_MAX_LEN);
        let last_name = optional_char(data, &mut errors, "last_name", NAME_MAX_LEN);
        let license_number = clean_license(data, &mut errors, drivers, None).await?;

        errors.finish(|| DriverCreation {
            username,
            password1,
            password2,
            first_name,
            last_name,
            license_number,
        })
    }
}

impl Form for DriverCreationForm {
    fn fields() -> Vec<Field> {
        vec![
            Field::text("username", "Username", true),
            Field::password("password1", "Password"),
            Field::password("password2", "Password confirmation"),
            Field::text("first_name", "First name", false),
            Field::text("last_name", "Last name", false),
            Field::text("license_number", "License number", true),
        ]
    }
}

pub struct DriverLicenseUpdateForm;

impl DriverLicenseUpdateForm {
    pub const TEMPLATE: &'static str = "taxi/driver_form.html";

    pub fn initial(driver: &Driver) -> FormData {
        FormData::new()
            .with("license_number", driver.license_number.clone())
            .with("first_name", driver.first_name.clone())
            .with("last_name", driver.last_name.clone())
    }

    /// Names are only changed when the field was submitted at all.
    pub async fn clean(data: &FormData, drivers: &dyn DriverOperations, driver_id: u64) -> TaxiResult<DriverUpdate> {
        let mut errors = FieldErrors::new();
        let license_number = clean_license(data, &mut errors, drivers, Some(driver_id)).await?;

        let mut optional = |name: &str| {
            data.contains(name)
                .then(|| optional_char(data, &mut errors, name, NAME_MAX_LEN))
        };
        let first_name = optional("first_name");
        let last_name = optional("last_name");

        errors.finish(|| DriverUpdate {
            license_number: Some(license_number),
            first_name,
            last_name,
            email: None,
        })
    }
}

impl Form for DriverLicenseUpdateForm {
    fn fields() -> Vec<Field> {
        vec![
            Field::text("license_number", "License number", true),
            Field::text("first_name", "First name", false),
            Field::text("last_name", "Last name", false),
        ]
    }
}

// src/forms/login_form.rs
use crate::{
    errors::{TaxiResult, ValidationError},
    forms::{Field, FieldErrors, Form, FormData, REQUIRED, required_char},
    models::driver::Driver,
    services::DriverOperations,
};

pub const INVALID_LOGIN: &str =
    "Please enter a correct username and password. Note that both fields may be case-sensitive.";

pub struct LoginForm;

impl LoginForm {
    pub const TEMPLATE: &'static str = "registration/login.html";
    pub const SECRET_FIELDS: [&'static str; 1] = ["password"];

    /// Yields the authenticated driver.
    pub async fn clean(data: &FormData, drivers: &dyn DriverOperations) -> TaxiResult<Driver> {
        let mut errors = FieldErrors::new();
        let username = required_char(data, &mut errors, "username", 150);
        let password = data.get("password").unwrap_or_default().to_string();
        if password.is_empty() {
            errors.add("password", REQUIRED);
        }

        if errors.is_empty() {
            match drivers.authenticate(&username, &password).await? {
                Some(driver) => return Ok(driver),
                None => {
                    tracing::warn!("Rejected login for {}", username);
                    errors.add(ValidationError::NON_FIELD, INVALID_LOGIN);
                }
            }
        }

        Err(errors.into_error())
    }
}

impl Form for LoginForm {
    fn fields() -> Vec<Field> {
        vec![Field::text("username", "Username", true), Field::password("password", "Password")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TaxiError;
    use crate::test_support;

    #[tokio::test]
    async fn test_login_form() {
        let state = test_support::memory_state();
        let driver = test_support::create_driver(&state, "driver", "password123", "ABC12345").await;

        let data = FormData::new().with("username", "driver").with("password", "password123");
        let authenticated = LoginForm::clean(&data, &*state.driver_service).await.unwrap();
        assert_eq!(authenticated.id, driver.id);

        let data = FormData::new().with("username", "driver").with("password", "wrong-password");
        let Err(TaxiError::ValidationFailed(errors)) = LoginForm::clean(&data, &*state.driver_service).await else {
            panic!("expected validation errors");
        };
        assert_eq!(errors, vec![ValidationError::new(ValidationError::NON_FIELD, INVALID_LOGIN)]);

        let Err(TaxiError::ValidationFailed(errors)) = LoginForm::clean(&FormData::new(), &*state.driver_service).await
        else {
            panic!("expected validation errors");
        };
        assert_eq!(errors.len(), 2);
    }
}

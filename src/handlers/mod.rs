// src/handlers/mod.rs
pub mod admin_handler;
pub mod auth_handler;
pub mod car_handler;
pub mod driver_handler;
pub mod index_handler;
pub mod manufacturer_handler;

use axum::{
    Json,
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};

use crate::{
    auth::CurrentDriver,
    errors::{TaxiError, TaxiResult, ValidationError},
    forms::{Form, FormData, errors_by_field},
    models::driver::DriverResponse,
    pagination::Paginated,
};

/// A rendered page: the template to use and its context.
#[derive(Debug)]
pub struct Page {
    status: StatusCode,
    template: &'static str,
    context: Value,
}

impl Page {
    pub fn new(template: &'static str, context: Value) -> Self {
        Self {
            status: StatusCode::OK,
            template,
            context,
        }
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Adds the logged-in driver as `user`.
    pub fn for_user(mut self, current: &CurrentDriver) -> Self {
        if let Value::Object(context) = &mut self.context {
            context.insert("user".to_string(), json!(DriverResponse::from(&current.driver)));
        }
        self
    }
}

impl IntoResponse for Page {
    fn into_response(self) -> Response {
        let body = json!({
            "template": self.template,
            "context": self.context,
        });
        (self.status, Json(body)).into_response()
    }
}

/// `302 Found` to `location`.
pub fn found(location: impl AsRef<str>) -> Response {
    (StatusCode::FOUND, [(LOCATION, location.as_ref().to_string())]).into_response()
}

/// Context entry describing a form: its fields, current values and errors.
pub fn form_context<F: Form>(data: &FormData, hidden: &[&str], errors: &[ValidationError]) -> Value {
    json!({
        "fields": F::fields(),
        "data": data.to_json(hidden),
        "errors": errors_by_field(errors),
    })
}

/// Context entries shared by every list page.
pub fn list_context<T: serde::Serialize>(name: &str, page: &Paginated<T>, search_form: Value) -> Value {
    let mut context = serde_json::Map::new();
    context.insert(name.to_string(), json!(page.object_list));
    context.insert("is_paginated".to_string(), json!(page.is_paginated));
    context.insert("page_obj".to_string(), json!(page.page_obj));
    context.insert("search_form".to_string(), search_form);
    Value::Object(context)
}

/// Splits a form result into the validated value or the errors to re-render
/// with. Any other failure is propagated.
pub fn validated<T>(result: TaxiResult<T>) -> TaxiResult<Result<T, Vec<ValidationError>>> {
    match result {
        Ok(value) => Ok(Ok(value)),
        Err(TaxiError::ValidationFailed(errors)) => Ok(Err(errors)),
        Err(err) => Err(err),
    }
}

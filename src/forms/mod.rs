// src/forms/mod.rs
//! Form layer: turns raw submitted values into validated domain values.
//!
//! Every form is a unit struct with a `fields()` description used for
//! rendering and a `clean` function returning either the validated value or
//! `TaxiError::ValidationFailed` carrying one `ValidationError` per problem.
pub mod car_form;
pub mod driver_form;
pub mod login_form;
pub mod manufacturer_form;
pub mod search;

pub use car_form::CarForm;
pub use driver_form::{DriverCreation, DriverCreationForm, DriverLicenseUpdateForm, validate_license_number};
pub use login_form::LoginForm;
pub use manufacturer_form::ManufacturerForm;
pub use search::{CarModelSearchForm, DriverUsernameSearchForm, ManufacturerNameSearchForm, SearchForm};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::{TaxiError, TaxiResult, ValidationError};

pub const REQUIRED: &str = "This field is required.";
pub const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";

/// Submitted form values. Keeps every `(name, value)` pair in order, so
/// multi-valued inputs such as checkbox lists survive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((name.into(), value.into()));
        self
    }

    /// Last submitted value for `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.pairs.iter().any(|(key, _)| key == name)
    }

    /// Trimmed value, empty when the field was not submitted.
    pub fn value(&self, name: &str) -> String {
        self.get(name).map(str::trim).unwrap_or_default().to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// JSON view used when re-rendering a bound form. Repeated names become
    /// arrays; names listed in `hidden` (passwords) are left out.
    pub fn to_json(&self, hidden: &[&str]) -> Value {
        let mut map = Map::new();
        for (key, value) in &self.pairs {
            if hidden.iter().any(|name| name == key) {
                continue;
            }
            match map.get_mut(key) {
                Some(Value::Array(values)) => values.push(Value::String(value.clone())),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, Value::String(value.clone())]);
                }
                None => {
                    map.insert(key.clone(), Value::String(value.clone()));
                }
            }
        }
        Value::Object(map)
    }
}

impl From<Vec<(String, String)>> for FormData {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    Text,
    Password,
    Select,
    CheckboxSelectMultiple,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Widget {
    pub kind: WidgetKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: &'static str,
    pub label: &'static str,
    pub required: bool,
    pub widget: Widget,
}

impl Field {
    pub fn text(name: &'static str, label: &'static str, required: bool) -> Self {
        Self::with_widget(name, label, required, WidgetKind::Text)
    }

    pub fn password(name: &'static str, label: &'static str) -> Self {
        Self::with_widget(name, label, true, WidgetKind::Password)
    }

    pub fn with_widget(name: &'static str, label: &'static str, required: bool, kind: WidgetKind) -> Self {
        Self {
            name,
            label,
            required,
            widget: Widget { kind, placeholder: None },
        }
    }

    pub fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.widget.placeholder = Some(placeholder);
        self
    }
}

pub trait Form {
    fn fields() -> Vec<Field>;

    fn field(name: &str) -> Option<Field> {
        Self::fields().into_iter().find(|field| field.name == name)
    }
}

/// Collects field errors while a form is being cleaned.
#[derive(Debug, Default)]
pub struct FieldErrors {
    errors: Vec<ValidationError>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(ValidationError::new(field, message));
    }

    pub fn has(&self, field: &str) -> bool {
        self.errors.iter().any(|error| error.field == field)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_error(self) -> TaxiError {
        TaxiError::ValidationFailed(self.errors)
    }

    /// Yields `value` when nothing was recorded, the collected errors otherwise.
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> TaxiResult<T> {
        if self.errors.is_empty() {
            Ok(value())
        } else {
            Err(TaxiError::ValidationFailed(self.errors))
        }
    }
}

/// Required single-line text, trimmed, at most `max_len` characters.
pub(crate) fn required_char(data: &FormData, errors: &mut FieldErrors, name: &str, max_len: usize) -> String {
    let value = data.value(name);
    if value.is_empty() {
        errors.add(name, REQUIRED);
    } else {
        check_max_len(errors, name, &value, max_len);
    }
    value
}

pub(crate) fn optional_char(data: &FormData, errors: &mut FieldErrors, name: &str, max_len: usize) -> String {
    let value = data.value(name);
    check_max_len(errors, name, &value, max_len);
    value
}

fn check_max_len(errors: &mut FieldErrors, name: &str, value: &str, max_len: usize) {
    let len = value.chars().count();
    if len > max_len {
        errors.add(
            name,
            format!("Ensure this value has at most {} characters (it has {}).", max_len, len),
        );
    }
}

/// Groups validation errors by field, the shape form pages expose.
pub fn errors_by_field(errors: &[ValidationError]) -> Value {
    let mut map = Map::new();
    for error in errors {
        let entry = map
            .entry(error.field.clone())
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(messages) = entry {
            messages.push(Value::String(error.message.clone()));
        }
    }
    Value::Object(map)
}

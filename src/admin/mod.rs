// src/admin/mod.rs
//! Admin console registrations.
//!
//! A [`ModelAdmin`] describes how one model is listed and shown in the
//! console; rows are produced from a flat JSON record of the object so the
//! console handlers stay model-agnostic.
use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::{
    car::CarDetail,
    driver::Driver,
    manufacturer::Manufacturer,
};

pub const APP_LABEL: &str = "taxi";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Fieldset {
    pub name: Option<&'static str>,
    pub fields: &'static [&'static str],
}

impl Fieldset {
    const fn new(name: Option<&'static str>, fields: &'static [&'static str]) -> Self {
        Self { name, fields }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelAdmin {
    pub model: &'static str,
    pub verbose_name_plural: &'static str,
    pub list_display: &'static [&'static str],
    pub list_filter: &'static [&'static str],
    pub search_fields: &'static [&'static str],
    pub fieldsets: Vec<Fieldset>,
}

impl ModelAdmin {
    pub fn driver() -> Self {
        Self {
            model: "driver",
            verbose_name_plural: "drivers",
            list_display: &["username", "email", "first_name", "last_name", "is_staff", "license_number"],
            list_filter: &["is_staff", "is_superuser", "is_active"],
            search_fields: &["username", "first_name", "last_name", "email"],
            fieldsets: vec![
                Fieldset::new(None, &["username", "password"]),
                Fieldset::new(Some("Personal info"), &["first_name", "last_name", "email"]),
                Fieldset::new(Some("Permissions"), &["is_active", "is_staff", "is_superuser"]),
                Fieldset::new(Some("Important dates"), &["last_login", "date_joined"]),
                Fieldset::new(Some("Additional info"), &["license_number"]),
            ],
        }
    }

    pub fn car() -> Self {
        Self {
            model: "car",
            verbose_name_plural: "cars",
            list_display: &["model", "manufacturer"],
            list_filter: &["manufacturer"],
            search_fields: &["model"],
            fieldsets: vec![Fieldset::new(None, &["model", "manufacturer", "drivers"])],
        }
    }

    pub fn manufacturer() -> Self {
        Self {
            model: "manufacturer",
            verbose_name_plural: "manufacturers",
            list_display: &["name", "country"],
            list_filter: &[],
            search_fields: &["name"],
            fieldsets: vec![Fieldset::new(None, &["name", "country"])],
        }
    }

    /// Case-insensitive match of every whitespace-separated term against any
    /// search field.
    pub fn matches_search(&self, record: &Map<String, Value>, query: &str) -> bool {
        query.split_whitespace().all(|term| {
            let term = term.to_lowercase();
            self.search_fields
                .iter()
                .any(|field| display_value(record.get(*field)).to_lowercase().contains(&term))
        })
    }

    /// Applies `list_filter` parameters. Unknown parameters are ignored.
    pub fn matches_filters(&self, record: &Map<String, Value>, filters: &[(&str, &str)]) -> bool {
        filters.iter().all(|(name, wanted)| {
            if !self.list_filter.iter().any(|filter| filter == name) {
                return true;
            }
            let key = format!("{}_id", name);
            let value = record.get(&key).or_else(|| record.get(*name));
            filter_value(value) == *wanted
        })
    }

    pub fn row(&self, record: &Map<String, Value>) -> Vec<String> {
        self.list_display
            .iter()
            .map(|field| display_value(record.get(*field)))
            .collect()
    }

    pub fn fieldset_values(&self, record: &Map<String, Value>) -> Value {
        let sets = self
            .fieldsets
            .iter()
            .map(|fieldset| {
                let fields: Map<String, Value> = fieldset
                    .fields
                    .iter()
                    .map(|field| (field.to_string(), Value::String(display_value(record.get(*field)))))
                    .collect();
                serde_json::json!({"name": fieldset.name, "fields": fields})
            })
            .collect();
        Value::Array(sets)
    }
}

fn display_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => (if *b { "True" } else { "False" }).to_string(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| display_value(Some(item)))
            .collect::<Vec<_>>()
            .join(", "),
        Some(other) => other.to_string(),
    }
}

fn filter_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::Bool(b)) => (if *b { "1" } else { "0" }).to_string(),
        other => display_value(other),
    }
}

/// Flat record of a driver. The password hash is reduced to its algorithm.
pub fn driver_record(driver: &Driver) -> Map<String, Value> {
    let password = if driver.has_usable_password() {
        driver
            .password
            .split('$')
            .nth(1)
            .map(|algorithm| format!("algorithm: {}", algorithm))
            .unwrap_or_else(|| "Invalid password format or unknown hashing algorithm.".to_string())
    } else {
        "No password set.".to_string()
    };

    let mut record = Map::new();
    record.insert("id".into(), driver.id.into());
    record.insert("username".into(), driver.username.clone().into());
    record.insert("password".into(), password.into());
    record.insert("first_name".into(), driver.first_name.clone().into());
    record.insert("last_name".into(), driver.last_name.clone().into());
    record.insert("email".into(), driver.email.clone().into());
    record.insert("license_number".into(), driver.license_number.clone().into());
    record.insert("is_active".into(), driver.is_active.into());
    record.insert("is_staff".into(), driver.is_staff.into());
    record.insert("is_superuser".into(), driver.is_superuser.into());
    record.insert("date_joined".into(), driver.date_joined.to_rfc3339().into());
    record.insert(
        "last_login".into(),
        driver.last_login.map(|at| at.to_rfc3339()).into(),
    );
    record.insert("display".into(), driver.to_string().into());
    record
}

pub fn car_record(car: &CarDetail) -> Map<String, Value> {
    let mut record = Map::new();
    record.insert("id".into(), car.id.into());
    record.insert("model".into(), car.model.clone().into());
    record.insert("manufacturer".into(), car.manufacturer.to_string().into());
    record.insert("manufacturer_id".into(), car.manufacturer.id.to_string().into());
    record.insert(
        "drivers".into(),
        car.drivers
            .iter()
            .map(|driver| Value::String(driver.display.clone()))
            .collect::<Vec<_>>()
            .into(),
    );
    record.insert("display".into(), car.model.clone().into());
    record
}

pub fn manufacturer_record(manufacturer: &Manufacturer) -> Map<String, Value> {
    let mut record = Map::new();
    record.insert("id".into(), manufacturer.id.into());
    record.insert("name".into(), manufacturer.name.clone().into());
    record.insert("country".into(), manufacturer.country.clone().into());
    record.insert("display".into(), manufacturer.to_string().into());
    record
}

/// Registry of the models the console exposes.
#[derive(Debug, Clone)]
pub struct AdminSite {
    models: Vec<ModelAdmin>,
}

impl AdminSite {
    pub fn taxi() -> Self {
        Self {
            models: vec![ModelAdmin::car(), ModelAdmin::driver(), ModelAdmin::manufacturer()],
        }
    }

    pub fn models(&self) -> &[ModelAdmin] {
        &self.models
    }

    pub fn get(&self, model: &str) -> Option<&ModelAdmin> {
        self.models.iter().find(|admin| admin.model == model)
    }
}

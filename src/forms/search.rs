// src/forms/search.rs
use crate::forms::{Field, Form, FormData};

/// Single optional text field used to narrow a list page.
pub trait SearchForm: Form {
    const FIELD: &'static str;

    /// Trimmed query; empty when nothing was submitted.
    fn clean(data: &FormData) -> String {
        data.value(Self::FIELD)
    }

    /// Case-insensitive substring match. An empty query matches everything.
    fn matches(query: &str, candidate: &str) -> bool {
        query.is_empty() || candidate.to_lowercase().contains(&query.to_lowercase())
    }
}

pub struct CarModelSearchForm;
pub struct ManufacturerNameSearchForm;
pub struct DriverUsernameSearchForm;

impl Form for CarModelSearchForm {
    fn fields() -> Vec<Field> {
        vec![Field::text(Self::FIELD, "", false).placeholder("Search by model")]
    }
}

impl SearchForm for CarModelSearchForm {
    const FIELD: &'static str = "model";
}

impl Form for ManufacturerNameSearchForm {
    fn fields() -> Vec<Field> {
        vec![Field::text(Self::FIELD, "", false).placeholder("Search by name")]
    }
}

impl SearchForm for ManufacturerNameSearchForm {
    const FIELD: &'static str = "name";
}

impl Form for DriverUsernameSearchForm {
    fn fields() -> Vec<Field> {
        vec![Field::text(Self::FIELD, "", false).placeholder("Search by username")]
    }
}

impl SearchForm for DriverUsernameSearchForm {
    const FIELD: &'static str = "username";
}

// src/forms/manufacturer_form.rs
use crate::{
    errors::TaxiResult,
    forms::{Field, FieldErrors, Form, FormData, required_char},
    models::manufacturer::{Manufacturer, ManufacturerDraft},
};

pub struct ManufacturerForm;

impl ManufacturerForm {
    pub const TEMPLATE: &'static str = "taxi/manufacturer_form.html";

    pub fn initial(manufacturer: &Manufacturer) -> FormData {
        FormData::new()
            .with("name", manufacturer.name.clone())
            .with("country", manufacturer.country.clone())
    }

    pub fn clean(data: &FormData) -> TaxiResult<ManufacturerDraft> {
        let mut errors = FieldErrors::new();
        let name = required_char(data, &mut errors, "name", 255);
        let country = required_char(data, &mut errors, "country", 255);
        errors.finish(|| ManufacturerDraft { name, country })
    }
}

impl Form for ManufacturerForm {
    fn fields() -> Vec<Field> {
        vec![Field::text("name", "Name", true), Field::text("country", "Country", true)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TaxiError;

    #[test]
    fn test_clean() {
        let data = FormData::new().with("name", "Toyota").with("country", " Japan ");
        let draft = ManufacturerForm::clean(&data).unwrap();
        assert_eq!(draft.name, "Toyota");
        assert_eq!(draft.country, "Japan");

        let result = ManufacturerForm::clean(&FormData::new().with("name", "Toyota"));
        let Err(TaxiError::ValidationFailed(errors)) = result else {
            panic!("expected validation errors");
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "country");
    }
}

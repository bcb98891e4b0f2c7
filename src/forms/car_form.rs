// src/forms/car_form.rs
use std::collections::BTreeSet;

use crate::{
    errors::TaxiResult,
    forms::{Field, FieldErrors, Form, FormData, INVALID_CHOICE, REQUIRED, WidgetKind, required_char},
    models::car::{Car, CarDraft},
    services::{DriverOperations, ManufacturerOperations},
};

pub struct CarForm;

impl CarForm {
    pub const TEMPLATE: &'static str = "taxi/car_form.html";

    /// Initial values for editing an existing car.
    pub fn initial(car: &Car) -> FormData {
        let mut data = FormData::new()
            .with("model", car.model.clone())
            .with("manufacturer", car.manufacturer_id.to_string());
        for driver_id in &car.driver_ids {
            data = data.with("drivers", driver_id.to_string());
        }
        data
    }

    pub async fn clean(
        data: &FormData,
        manufacturers: &dyn ManufacturerOperations,
        drivers: &dyn DriverOperations,
    ) -> TaxiResult<CarDraft> {
        let mut errors = FieldErrors::new();
        let model = required_char(data, &mut errors, "model", 255);

        let raw_manufacturer = data.value("manufacturer");
        let mut manufacturer_id = 0;
        if raw_manufacturer.is_empty() {
            errors.add("manufacturer", REQUIRED);
        } else {
            let found = match raw_manufacturer.parse::<u64>() {
                Ok(id) => manufacturers.get_manufacturer(id).await?,
                Err(_) => None,
            };
            match found {
                Some(manufacturer) => manufacturer_id = manufacturer.id,
                None => errors.add("manufacturer", INVALID_CHOICE),
            }
        }

        let mut driver_ids = BTreeSet::new();
        for raw in data.get_all("drivers") {
            let raw = raw.trim();
            let found = match raw.parse::<u64>() {
                Ok(id) => drivers.get_driver(id).await?,
                Err(_) => None,
            };
            match found {
                Some(driver) => {
                    driver_ids.insert(driver.id);
                }
                None => {
                    errors.add(
                        "drivers",
                        format!("Select a valid choice. {} is not one of the available choices.", raw),
                    );
                    break;
                }
            }
        }

        errors.finish(|| CarDraft {
            model,
            manufacturer_id,
            driver_ids,
        })
    }
}

impl Form for CarForm {
    fn fields() -> Vec<Field> {
        vec![
            Field::text("model", "Model", true),
            Field::with_widget("manufacturer", "Manufacturer", true, WidgetKind::Select),
            Field::with_widget("drivers", "Drivers", false, WidgetKind::CheckboxSelectMultiple),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TaxiError;
    use crate::test_support;

    #[test]
    fn test_drivers_use_checkboxes() {
        let drivers = CarForm::field("drivers").unwrap();
        assert_eq!(drivers.widget.kind, WidgetKind::CheckboxSelectMultiple);
        assert!(!drivers.required);
    }

    #[tokio::test]
    async fn test_valid_car_form() {
        let state = test_support::memory_state();
        let manufacturer = test_support::create_manufacturer(&state, "TestManufacturer", "TestCountry").await;
        let driver1 = test_support::create_driver(&state, "driver1", "password123", "QWE12345").await;
        let driver2 = test_support::create_driver(&state, "driver2", "password123", "EWQ67890").await;

        let data = FormData::new()
            .with("model", "TestModel")
            .with("manufacturer", manufacturer.id.to_string())
            .with("drivers", driver1.id.to_string())
            .with("drivers", driver2.id.to_string());

        let draft = CarForm::clean(&data, &*state.manufacturer_service, &*state.driver_service)
            .await
            .unwrap();
        assert_eq!(draft.model, "TestModel");
        assert_eq!(draft.manufacturer_id, manufacturer.id);
        assert_eq!(draft.driver_ids, BTreeSet::from([driver1.id, driver2.id]));
    }

    #[tokio::test]
    async fn test_invalid_choices() {
        let state = test_support::memory_state();
        let data = FormData::new()
            .with("model", "")
            .with("manufacturer", "99")
            .with("drivers", "abc");

        let result = CarForm::clean(&data, &*state.manufacturer_service, &*state.driver_service).await;
        let Err(TaxiError::ValidationFailed(errors)) = result else {
            panic!("expected validation errors");
        };
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["model", "manufacturer", "drivers"]);
        assert_eq!(errors[1].message, INVALID_CHOICE);
        assert_eq!(
            errors[2].message,
            "Select a valid choice. abc is not one of the available choices."
        );
    }

    #[tokio::test]
    async fn test_initial_round_trips_through_clean() {
        let state = test_support::memory_state();
        let manufacturer = test_support::create_manufacturer(&state, "Toyota", "Japan").await;
        let driver = test_support::create_driver(&state, "driver1", "password123", "QWE12345").await;
        let car = test_support::create_car(&state, "Corolla", manufacturer.id, &[driver.id]).await;

        let draft = CarForm::clean(
            &CarForm::initial(&car),
            &*state.manufacturer_service,
            &*state.driver_service,
        )
        .await
        .unwrap();
        assert_eq!(draft.driver_ids, car.driver_ids);
    }
}

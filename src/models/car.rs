// src/models/car.rs
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use super::driver::DriverResponse;
use super::manufacturer::Manufacturer;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Car {
    pub id: u64,
    pub model: String,
    pub manufacturer_id: u64,
    pub driver_ids: BTreeSet<u64>,
}

impl fmt::Display for Car {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.model)
    }
}

/// Validated car fields. `manufacturer_id` and every entry of `driver_ids`
/// have been checked against storage by the form layer.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct CarDraft {
    pub model: String,
    pub manufacturer_id: u64,
    pub driver_ids: BTreeSet<u64>,
}

/// A car with its relations resolved, as shown on list and detail pages.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CarDetail {
    pub id: u64,
    pub model: String,
    pub manufacturer: Manufacturer,
    pub drivers: Vec<DriverResponse>,
}

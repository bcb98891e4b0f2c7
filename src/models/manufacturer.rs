// src/models/manufacturer.rs
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Manufacturer {
    pub id: u64,
    pub name: String,
    pub country: String,
}

/// Validated manufacturer fields, ready to be stored.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ManufacturerDraft {
    pub name: String,
    pub country: String,
}

impl fmt::Display for Manufacturer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.country)
    }
}

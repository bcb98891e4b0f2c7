pub mod admin;
pub mod auth;
pub mod errors;
pub mod forms;
pub mod handlers;
pub mod models;
pub mod pagination;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use errors::{TaxiError, TaxiResult, ValidationError};

// src/models/mod.rs
pub mod car;
pub mod driver;
pub mod manufacturer;
pub mod session;

pub use car::*;
pub use driver::*;
pub use manufacturer::*;
pub use session::*;

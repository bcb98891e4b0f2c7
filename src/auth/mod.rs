// src/auth/mod.rs
pub mod extractor;
pub mod hasher;

pub use extractor::{CurrentDriver, SESSION_COOKIE, StaffDriver};
pub use hasher::{Argon2Hasher, HashCost, PasswordHasher};

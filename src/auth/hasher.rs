// src/auth/hasher.rs
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
};
use rand::RngCore;
use std::sync::Arc;

use crate::errors::{TaxiError as AppError, TaxiResult};

/// Password hashing seam. Drivers never see the algorithm, only PHC strings.
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> TaxiResult<String>;

    /// `Ok(false)` on mismatch; `Err` only when `hash` is not a valid PHC string.
    fn verify(&self, password: &str, hash: &str) -> TaxiResult<bool>;
}

/// Argon2id cost settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HashCost {
    /// Smallest cost Argon2 accepts. Only meant for tests.
    pub fn minimal() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: Params::MIN_T_COST,
            parallelism: Params::MIN_P_COST,
        }
    }
}

pub struct Argon2Hasher {
    params: Params,
}

impl Argon2Hasher {
    pub fn new(cost: HashCost) -> TaxiResult<Self> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| AppError::InvalidConfiguration(format!("argon2 parameters: {}", e)))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> TaxiResult<String> {
        let mut salt_bytes = [0u8; 16];
        rand::rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes)?;

        let hash = self.argon2().hash_password(password.as_bytes(), &salt)?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> TaxiResult<bool> {
        let parsed_hash = PasswordHash::new(hash)?;
        // Cost parameters are read back from the hash itself.
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}

/// Hashes on the blocking pool so request workers are not held up by Argon2.
pub async fn hash_blocking(hasher: &Arc<dyn PasswordHasher>, password: &str) -> TaxiResult<String> {
    let hasher = Arc::clone(hasher);
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hasher.hash(&password))
        .await
        .map_err(|e| AppError::internal_error(format!("password hashing task failed: {}", e)))?
}

/// Blocking-pool counterpart of [`PasswordHasher::verify`].
pub async fn verify_blocking(hasher: &Arc<dyn PasswordHasher>, password: &str, hash: &str) -> TaxiResult<bool> {
    let hasher = Arc::clone(hasher);
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
        .await
        .map_err(|e| AppError::internal_error(format!("password verification task failed: {}", e)))?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = Argon2Hasher::new(HashCost::minimal()).unwrap();
        let hash = hasher.hash("password123").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("password123", &hash).unwrap());
        assert!(!hasher.verify("password124", &hash).unwrap());
    }

    #[test]
    fn test_hashes_are_salted() {
        let hasher = Argon2Hasher::new(HashCost::minimal()).unwrap();
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        let hasher = Argon2Hasher::new(HashCost::minimal()).unwrap();
        assert!(matches!(hasher.verify("pw", "not-a-hash"), Err(AppError::PasswordHash(_))));
    }

    #[test]
    fn test_invalid_cost_is_rejected() {
        let cost = HashCost {
            memory_kib: 1,
            iterations: 1,
            parallelism: 1,
        };
        assert!(Argon2Hasher::new(cost).is_err());
    }

    #[tokio::test]
    async fn test_hashing_leaves_the_runtime_free() {
        let hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2Hasher::new(HashCost::minimal()).unwrap());
        // On the single-threaded test runtime this task only gets polled if
        // hashing yields back to the scheduler.
        let other = tokio::spawn(async { true });

        let hash = hash_blocking(&hasher, "password123").await.unwrap();
        assert!(other.is_finished());
        assert!(other.await.unwrap());

        assert!(verify_blocking(&hasher, "password123", &hash).await.unwrap());
        assert!(!verify_blocking(&hasher, "password124", &hash).await.unwrap());
        assert!(matches!(
            verify_blocking(&hasher, "pw", "not-a-hash").await,
            Err(AppError::PasswordHash(_))
        ));
    }
}

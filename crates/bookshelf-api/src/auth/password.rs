/// Password hashing and verification using Argon2id
///
/// Parameters follow OWASP recommendations by default:
/// - Algorithm: Argon2id
/// - Memory: 64 MB
/// - Iterations: 3
/// - Parallelism: 4 lanes
/// - Salt: 16 bytes random
/// - Output: 32 bytes hash
///
/// Hashing is CPU bound; request handlers go through [`hash_password_async`]
/// and [`verify_password_async`], which run on the blocking pool.
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, Params,
};
use thiserror::Error;

/// Password hashing and verification errors
#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),

    #[error("Failed to verify password: {0}")]
    VerificationFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

/// Password hashing configuration
///
/// Increasing memory or iterations improves resistance to offline attacks
/// but slows down every login.
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// Memory cost in KB (default: 65536 = 64 MB)
    pub memory_cost: u32,
    /// Time cost (iterations, default: 3)
    pub time_cost: u32,
    /// Parallelism (lanes, default: 4)
    pub parallelism: u32,
    /// Output length in bytes (default: 32)
    pub output_len: Option<usize>,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_cost: 65536, // 64 MB
            time_cost: 3,
            parallelism: 4,
            output_len: Some(32),
        }
    }
}

impl PasswordConfig {
    /// Minimal parameters for tests; never use for real credentials
    pub fn insecure_fast() -> Self {
        Self {
            memory_cost: 1024,
            time_cost: 1,
            parallelism: 1,
            output_len: Some(32),
        }
    }

    fn to_params(&self) -> Result<Params, PasswordError> {
        Params::new(
            self.memory_cost,
            self.time_cost,
            self.parallelism,
            self.output_len,
        )
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }
}

/// Hash a plaintext password using Argon2id with default parameters
///
/// Returns a PHC string (`$argon2id$v=19$m=65536,t=3,p=4$...`) that embeds
/// the algorithm, parameters and salt, so it can be stored as-is.
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_password_with_config(password, &PasswordConfig::default())
}

/// Hash a password with custom configuration
pub fn hash_password_with_config(
    password: &str,
    config: &PasswordConfig,
) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let params = config.to_params()?;
    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;

    Ok(password_hash.to_string())
}

/// Verify a plaintext password against a stored hash
///
/// # Returns
///
/// * `Ok(true)` - Password matches
/// * `Ok(false)` - Password does not match
/// * `Err(PasswordError)` - The stored hash is malformed
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| PasswordError::InvalidHashFormat)?;

    // Parameters are read back from the PHC string.
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerificationFailed(e.to_string())),
    }
}

/// Hash on the blocking pool so the request executor is not stalled
pub async fn hash_password_async(
    password: String,
    config: PasswordConfig,
) -> Result<String, PasswordError> {
    tokio::task::spawn_blocking(move || hash_password_with_config(&password, &config))
        .await
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?
}

/// Verify on the blocking pool
pub async fn verify_password_async(password: String, hash: String) -> Result<bool, PasswordError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| PasswordError::VerificationFailed(e.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn fast_hash(password: &str) -> String {
        hash_password_with_config(password, &PasswordConfig::insecure_fast()).unwrap()
    }

    #[test]
    fn test_hash_and_verify_password() {
        let password = "secret123";
        let hash = hash_password(password).expect("Failed to hash password");

        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password(password, &hash).expect("Verification failed"));
        assert!(!verify_password("secret124", &hash).expect("Verification failed"));
    }

    #[test]
    fn test_same_password_produces_different_hashes() {
        // Random salt per hash
        let hash1 = fast_hash("SamePassword123!");
        let hash2 = fast_hash("SamePassword123!");

        assert_ne!(hash1, hash2);
        assert!(verify_password("SamePassword123!", &hash1).unwrap());
        assert!(verify_password("SamePassword123!", &hash2).unwrap());
    }

    #[test]
    fn test_invalid_hash_format() {
        let result = verify_password("password", "invalid-hash-format");
        assert!(matches!(result, Err(PasswordError::InvalidHashFormat)));
    }

    #[test]
    fn test_custom_config() {
        let config = PasswordConfig {
            memory_cost: 32768,
            time_cost: 2,
            parallelism: 2,
            output_len: Some(32),
        };

        let hash = hash_password_with_config("TestPassword123!", &config).unwrap();

        assert!(verify_password("TestPassword123!", &hash).unwrap());
        assert!(hash.contains("m=32768"));
        assert!(hash.contains("t=2"));
        assert!(hash.contains("p=2"));
    }

    #[test]
    fn test_invalid_config() {
        let config = PasswordConfig {
            memory_cost: 1,
            ..PasswordConfig::insecure_fast()
        };
        let result = hash_password_with_config("password", &config);
        assert!(matches!(result, Err(PasswordError::HashingFailed(_))));
    }

    #[tokio::test]
    async fn test_async_wrappers() {
        let hash = hash_password_async("secret123".to_string(), PasswordConfig::insecure_fast())
            .await
            .unwrap();

        assert!(verify_password_async("secret123".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password_async("other".to_string(), hash).await.unwrap());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_hash_verifies_only_its_password(
            p1 in "[ -~]{1,40}",
            p2 in "[ -~]{1,40}",
        ) {
            let hash = fast_hash(&p1);
            prop_assert!(verify_password(&p1, &hash).unwrap());
            if p1 != p2 {
                prop_assert!(!verify_password(&p2, &hash).unwrap());
            }
        }
    }
}

//! Identity generator: opaque, collision-checked user ids.
//!
//! A candidate id is the truncated SHA-256 of the human identifier plus a
//! salt. Candidates that clash with an existing workspace are regenerated
//! with a fresh salt, up to a bounded number of attempts.

use chrono::Utc;
use sha2::{Digest, Sha256};
use spcf_config::FactoryConfig;
use spcf_core::{Error, Result, UserId};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Produces the salt for a given attempt number.
pub type SaltSource = Arc<dyn Fn(u32) -> String + Send + Sync>;

/// Truncated hex SHA-256 of `data`.
pub fn generate_hash(data: &str, length: usize) -> String {
    let digest = Sha256::digest(data.as_bytes());
    let mut hex = hex::encode(digest);
    hex.truncate(length);
    hex
}

/// Default salt: wall-clock nanoseconds, a random word, and the attempt.
fn default_salt(attempt: u32) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    format!("{nanos}:{:016x}:{attempt}", rand::random::<u64>())
}

/// Generates unique user ids against a users directory.
#[derive(Clone)]
pub struct IdGenerator {
    users_dir: PathBuf,
    id_length: usize,
    max_attempts: u32,
    salt: SaltSource,
}

impl std::fmt::Debug for IdGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdGenerator")
            .field("users_dir", &self.users_dir)
            .field("id_length", &self.id_length)
            .field("max_attempts", &self.max_attempts)
            .finish()
    }
}

impl IdGenerator {
    pub fn new(config: &FactoryConfig) -> Self {
        Self {
            users_dir: config.users_dir(),
            id_length: config.identity.id_length,
            max_attempts: config.identity.max_attempts,
            salt: Arc::new(default_salt),
        }
    }

    /// Replace the salt source (deterministic ids in tests).
    pub fn with_salt_source(mut self, salt: SaltSource) -> Self {
        self.salt = salt;
        self
    }

    /// Derive a fresh id for `identifier` that no existing workspace uses.
    ///
    /// Does not create anything; provisioning is a separate step.
    pub fn create_id(&self, identifier: &str) -> Result<UserId> {
        for attempt in 0..self.max_attempts {
            let salt = (self.salt)(attempt);
            let candidate = generate_hash(&format!("{identifier}{salt}"), self.id_length);

            if !self.users_dir.join(&candidate).exists() {
                debug!(attempt, user_id = %candidate, "Generated user id");
                return UserId::parse(&candidate);
            }
            warn!(attempt, candidate = %candidate, "User id collision, regenerating");
        }

        Err(Error::Duplicate(format!(
            "Could not generate a unique user id for '{identifier}' after {} attempts",
            self.max_attempts
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spcf_core::ErrorKind;
    use std::collections::HashSet;

    fn generator(root: &std::path::Path) -> IdGenerator {
        IdGenerator::new(&FactoryConfig::with_root(root))
    }

    #[test]
    fn hash_is_truncated_hex() {
        let h = generate_hash("hello", 8);
        assert_eq!(h.len(), 8);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
        // sha256("hello") starts with 2cf24dba
        assert_eq!(h, "2cf24dba");
    }

    #[test]
    fn ids_have_configured_length() {
        let tmp = tempfile::tempdir().unwrap();
        let id = generator(tmp.path()).create_id("jane@example.com").unwrap();
        assert_eq!(id.as_str().len(), 16);
    }

    #[test]
    fn same_identifier_never_repeats() {
        let tmp = tempfile::tempdir().unwrap();
        let ids = generator(tmp.path());
        let seen: HashSet<String> = (0..50)
            .map(|_| ids.create_id("same-person").unwrap().to_string())
            .collect();
        assert_eq!(seen.len(), 50);
    }

    #[test]
    fn collision_is_retried_with_new_salt() {
        let tmp = tempfile::tempdir().unwrap();
        let config = FactoryConfig::with_root(tmp.path());
        let gen_fixed = IdGenerator::new(&config).with_salt_source(Arc::new(|attempt| {
            format!("fixed-{attempt}")
        }));

        let first = gen_fixed.create_id("bob").unwrap();
        std::fs::create_dir_all(config.users_dir().join(first.as_str())).unwrap();

        // attempt 0 now collides, attempt 1 yields a different id
        let second = gen_fixed.create_id("bob").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn persistent_collision_is_duplicate_error() {
        let tmp = tempfile::tempdir().unwrap();
        let config = FactoryConfig::with_root(tmp.path());
        let constant = IdGenerator::new(&config)
            .with_salt_source(Arc::new(|_| "constant".to_string()));

        let id = constant.create_id("carol").unwrap();
        std::fs::create_dir_all(config.users_dir().join(id.as_str())).unwrap();

        let err = constant.create_id("carol").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Duplicate);
        assert!(err.to_string().contains("5 attempts"));
    }
}

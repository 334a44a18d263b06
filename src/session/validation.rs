//! Seed address validation

use regex::Regex;
use std::future::Future;
use std::sync::OnceLock;
use tokio::sync::watch;

/// `<54 character peer id>@<host>:<port>`
pub const VALID_SEED_PATTERN: &str =
    r"^[A-Za-z0-9_]{54}@([A-Za-z0-9_-]+\.)*[A-Za-z0-9_-]+:[0-9]{1,5}$";

pub const INVALID_FORMAT_MESSAGE: &str = "This is not a valid seed address";
pub const DUPLICATE_SEED_MESSAGE: &str = "This seed already exists";

fn seed_regex() -> &'static Regex {
    static SEED_REGEX: OnceLock<Regex> = OnceLock::new();
    SEED_REGEX.get_or_init(|| Regex::new(VALID_SEED_PATTERN).expect("seed pattern is valid"))
}

pub fn is_valid_seed_format(seed: &str) -> bool {
    seed_regex().is_match(seed)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationStatus {
    NotStarted,
    /// Format passed, remote checks still running
    Loading,
    Success,
    Error(String),
}

/// Observable validation state for the seed input
pub struct SeedValidation {
    status: watch::Sender<ValidationStatus>,
}

impl SeedValidation {
    pub fn new() -> Self {
        let (status, _rx) = watch::channel(ValidationStatus::NotStarted);
        Self { status }
    }

    pub fn status(&self) -> ValidationStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ValidationStatus> {
        self.status.subscribe()
    }

    pub fn reset(&self) {
        self.status.send_replace(ValidationStatus::NotStarted);
    }

    /// Validate `seed`: the format check runs synchronously, then `is_unique`
    /// is awaited. Returns the final status.
    pub async fn validate<F, Fut>(&self, seed: &str, is_unique: F) -> ValidationStatus
    where
        F: FnOnce(&str) -> Fut,
        Fut: Future<Output = bool>,
    {
        if !is_valid_seed_format(seed) {
            return self.finish(ValidationStatus::Error(INVALID_FORMAT_MESSAGE.to_string()));
        }

        self.status.send_replace(ValidationStatus::Loading);
        if !is_unique(seed).await {
            return self.finish(ValidationStatus::Error(DUPLICATE_SEED_MESSAGE.to_string()));
        }

        self.finish(ValidationStatus::Success)
    }

    fn finish(&self, status: ValidationStatus) -> ValidationStatus {
        self.status.send_replace(status.clone());
        status
    }
}

impl Default for SeedValidation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed_with_prefix(len: usize) -> String {
        format!("{}@example.com:8080", "a".repeat(len))
    }

    #[test]
    fn accepts_54_character_prefix() {
        assert!(is_valid_seed_format(&seed_with_prefix(54)));
        assert!(is_valid_seed_format(&format!(
            "{}c9@seed.radicle.xyz:12345",
            "hyb5".repeat(13)
        )));
    }

    #[test]
    fn rejects_malformed_seeds() {
        assert!(!is_valid_seed_format(&seed_with_prefix(53)));
        assert!(!is_valid_seed_format(&seed_with_prefix(55)));
        assert!(!is_valid_seed_format(&format!("{}@example.com", "a".repeat(54))));
        assert!(!is_valid_seed_format(&format!("{}@example.com:123456", "a".repeat(54))));
        assert!(!is_valid_seed_format(&format!("{}@.com:80", "a".repeat(54))));
        assert!(!is_valid_seed_format(""));
    }

    #[tokio::test]
    async fn reports_format_errors_before_uniqueness() {
        let validation = SeedValidation::new();
        let mut checked = false;
        let status = validation
            .validate("nope", |_| {
                checked = true;
                async { true }
            })
            .await;

        assert!(!checked);
        assert_eq!(status, ValidationStatus::Error(INVALID_FORMAT_MESSAGE.to_string()));
        assert_eq!(validation.status(), status);
    }

    #[tokio::test]
    async fn reports_duplicates() {
        let validation = SeedValidation::new();
        let status = validation
            .validate(&seed_with_prefix(54), |_| async { false })
            .await;

        assert_eq!(status, ValidationStatus::Error(DUPLICATE_SEED_MESSAGE.to_string()));
    }

    #[tokio::test]
    async fn reset_clears_status() {
        let validation = SeedValidation::new();
        let status = validation
            .validate(&seed_with_prefix(54), |_| async { true })
            .await;
        assert_eq!(status, ValidationStatus::Success);

        validation.reset();
        assert_eq!(validation.status(), ValidationStatus::NotStarted);
    }
}

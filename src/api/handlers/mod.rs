//! API handlers and shared utilities for Custodia.
//!
//! This module organizes the service's route handlers and provides common
//! validation helpers used across them.

pub mod auth;
pub mod health;
pub mod me;

use regex::Regex;

/// Lightweight email sanity check used by auth handlers before persisting data.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_accepts_simple() {
        assert!(valid_email("user@example.com"));
    }

    #[test]
    fn valid_email_rejects_missing_at() {
        assert!(!valid_email("user.example.com"));
    }

    #[test]
    fn valid_email_rejects_missing_domain() {
        assert!(!valid_email("user@"));
        assert!(!valid_email("user@example"));
    }
}

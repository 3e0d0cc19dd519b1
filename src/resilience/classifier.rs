//! Retryability classification of remote failures.

use std::collections::HashSet;

use crate::backend::types::RemoteError;

/// Codes that will fail the same way on every retry.
///
/// - `PGRST116`: permission denied
/// - `PGRST204`: no data found
/// - `23505`: unique constraint violation
/// - `23503`: foreign-key violation
pub const NON_RETRYABLE_CODES: [&str; 4] = ["PGRST116", "PGRST204", "23505", "23503"];

/// Verdict for one failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retryability {
    Retryable,
    NonRetryable,
}

/// Splits failures into retryable and fatal by error code.
#[derive(Debug, Clone)]
pub struct RetryClassifier {
    fatal: HashSet<String>,
}

impl RetryClassifier {
    /// Classifier with the built-in fatal codes plus `extra`.
    pub fn with_extra_codes<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fatal: HashSet<String> = NON_RETRYABLE_CODES.iter().map(|c| c.to_string()).collect();
        fatal.extend(extra.into_iter().map(Into::into));
        Self { fatal }
    }

    /// Code-less errors are always retryable.
    pub fn classify(&self, error: &RemoteError) -> Retryability {
        match error.code.as_deref() {
            Some(code) if self.fatal.contains(code) => Retryability::NonRetryable,
            _ => Retryability::Retryable,
        }
    }

    pub fn is_retryable(&self, error: &RemoteError) -> bool {
        self.classify(error) == Retryability::Retryable
    }
}

impl Default for RetryClassifier {
    fn default() -> Self {
        Self::with_extra_codes(std::iter::empty::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_fatal_codes() {
        let classifier = RetryClassifier::default();
        for code in NON_RETRYABLE_CODES {
            let err = RemoteError::with_code(code, "x");
            assert_eq!(classifier.classify(&err), Retryability::NonRetryable, "{code}");
        }
    }

    #[test]
    fn test_other_codes_retryable() {
        let classifier = RetryClassifier::default();
        assert!(classifier.is_retryable(&RemoteError::with_code("57014", "statement timeout")));
        assert!(classifier.is_retryable(&RemoteError::with_code("pgrst116", "case matters")));
        assert!(classifier.is_retryable(&RemoteError::transport("connection reset")));
    }

    #[test]
    fn test_extra_codes() {
        let classifier = RetryClassifier::with_extra_codes(["42501"]);
        assert!(!classifier.is_retryable(&RemoteError::with_code("42501", "insufficient privilege")));
        assert!(!classifier.is_retryable(&RemoteError::with_code("23505", "dup")));
    }
}

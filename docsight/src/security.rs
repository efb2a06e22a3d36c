//! Credential handling and upload input validation.

use once_cell::sync::Lazy;
use regex::Regex;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{DocsightError, Result};

/// A secret string (API key) that is zeroized on drop and never printed.
#[derive(Clone, ZeroizeOnDrop)]
pub struct SecureString(String);

impl std::fmt::Debug for SecureString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecureString(***)")
    }
}

impl SecureString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the secret. Avoid storing the result.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// A loggable hint such as `sk-...wxyz`.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 8 {
            return "***".to_string();
        }
        let head: String = chars[..3].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }

    /// Convert to a regular string, zeroizing the original buffer.
    pub fn into_string(mut self) -> String {
        let value = self.0.clone();
        self.0.zeroize();
        value
    }
}

impl From<String> for SecureString {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SecureString {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

static CONTROL_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\x00-\x1f\x7f]").expect("control character pattern is valid"));

/// Validation of user-supplied upload metadata.
pub struct InputValidator;

impl InputValidator {
    /// Maximum accepted file name length in bytes.
    pub const MAX_FILE_NAME_LENGTH: usize = 255;

    /// Rejects empty names, control characters, path separators and `..`.
    pub fn validate_file_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(DocsightError::Configuration("file name cannot be empty".to_string()));
        }
        if name.len() > Self::MAX_FILE_NAME_LENGTH {
            return Err(DocsightError::Configuration(format!(
                "file name too long: {} bytes (max {})",
                name.len(),
                Self::MAX_FILE_NAME_LENGTH
            )));
        }
        if CONTROL_CHARS.is_match(name) {
            return Err(DocsightError::Configuration(
                "file name cannot contain control characters".to_string(),
            ));
        }
        if name.contains('/') || name.contains('\\') || name == ".." || name.starts_with("../") {
            return Err(DocsightError::Configuration(format!(
                "file name cannot contain a path: {name}"
            )));
        }
        Ok(())
    }

    /// Rejects uploads above `max_bytes`.
    pub fn validate_file_size(size: usize, max_bytes: usize) -> Result<()> {
        if size > max_bytes {
            return Err(DocsightError::Configuration(format!(
                "file too large: {size} bytes (max {max_bytes})"
            )));
        }
        Ok(())
    }

    /// Validates a fraction in `0.0..=1.0`.
    pub fn validate_fraction(value: f64, name: &str) -> Result<()> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(DocsightError::Configuration(format!(
                "Invalid {name} value: must be between 0.0 and 1.0, got {value}"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secure_string() {
        let secret = SecureString::new("sk-test-1234567890abcd");
        assert_eq!(secret.expose(), "sk-test-1234567890abcd");
        assert_eq!(secret.masked(), "sk-...abcd");
        assert_eq!(format!("{secret:?}"), "SecureString(***)");
        assert_eq!(SecureString::new("short").masked(), "***");

        let extracted = secret.into_string();
        assert_eq!(extracted, "sk-test-1234567890abcd");
    }

    #[test]
    fn test_file_name_validation() {
        assert!(InputValidator::validate_file_name("sales 2024.csv").is_ok());
        assert!(InputValidator::validate_file_name("résumé.docx").is_ok());

        assert!(InputValidator::validate_file_name("").is_err());
        assert!(InputValidator::validate_file_name("   ").is_err());
        assert!(InputValidator::validate_file_name("../etc/passwd").is_err());
        assert!(InputValidator::validate_file_name("dir\\file.csv").is_err());
        assert!(InputValidator::validate_file_name("bad\0name.csv").is_err());
        assert!(InputValidator::validate_file_name(&"a".repeat(300)).is_err());
    }

    #[test]
    fn test_size_and_fraction_validation() {
        assert!(InputValidator::validate_file_size(10, 100).is_ok());
        assert!(InputValidator::validate_file_size(101, 100).is_err());

        assert!(InputValidator::validate_fraction(0.7, "threshold").is_ok());
        assert!(InputValidator::validate_fraction(1.5, "threshold").is_err());
        assert!(InputValidator::validate_fraction(f64::NAN, "threshold").is_err());
    }
}

//! Secrets guarding encrypted data bag items

use std::fmt;
use std::fs;
use std::path::Path;

/// Shared secret used to decrypt an encrypted item.
///
/// The value never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Turns the raw `secret` attribute into a [`Secret`].
///
/// The raw value is either a path to a key file or the secret itself.
/// An existing file yields its content with trailing whitespace trimmed;
/// anything else, including a path that cannot be read, is used verbatim.
#[derive(Debug, Default, Clone, Copy)]
pub struct SecretResolver;

impl SecretResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(&self, raw: &str) -> Secret {
        let path = Path::new(raw);
        if !path.is_file() {
            return Secret::new(raw);
        }

        match fs::read_to_string(path) {
            Ok(content) => {
                tracing::debug!(path = %path.display(), "Loaded data bag secret from file");
                Secret::new(content.trim_end())
            }
            Err(e) => {
                tracing::debug!(
                    path = %path.display(),
                    error = %e,
                    "Secret file unreadable, using raw value"
                );
                Secret::new(raw)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn existing_file_yields_content() {
        let temp = TempDir::new().unwrap();
        let key = temp.path().join("secret.key");
        fs::write(&key, "s3cr3t-key\n").unwrap();

        let secret = SecretResolver::new().resolve(key.to_str().unwrap());
        assert_eq!(secret.expose(), "s3cr3t-key");
    }

    #[test]
    fn missing_path_is_taken_literally() {
        let secret = SecretResolver::new().resolve("/no/such/secret/file");
        assert_eq!(secret.expose(), "/no/such/secret/file");
    }

    #[test]
    fn plain_literal_passes_through() {
        assert_eq!(SecretResolver::new().resolve("hunter2").expose(), "hunter2");
    }

    #[test]
    fn debug_redacts_value() {
        let rendered = format!("{:?}", Secret::new("hunter2"));
        assert!(!rendered.contains("hunter2"));
    }
}

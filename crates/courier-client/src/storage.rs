//! Local persistence for credentials.
//!
//! Credentials are stored as JSON in a dot-directory next to the working
//! directory. The stored password blob inside is already encrypted under
//! the session's access key; this module adds no cryptography of its own.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LoginError;
use crate::types::Credentials;

/// Default location of the credentials file.
pub fn credentials_path() -> PathBuf {
    PathBuf::from("./.courier/credentials.json")
}

/// Persist credentials to the given path, creating parent directories.
pub fn save_credentials_to(path: &Path, credentials: &Credentials) -> Result<(), LoginError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| LoginError::Storage(err.to_string()))?;
    }
    let json = serde_json::to_string_pretty(credentials)
        .map_err(|err| LoginError::Storage(err.to_string()))?;
    fs::write(path, json).map_err(|err| LoginError::Storage(err.to_string()))
}

/// Load credentials from the given path.
pub fn load_credentials_from(path: &Path) -> Result<Credentials, LoginError> {
    let json = fs::read_to_string(path).map_err(|err| LoginError::Storage(err.to_string()))?;
    serde_json::from_str(&json).map_err(|err| LoginError::Storage(err.to_string()))
}

/// Remove stored credentials. Missing file counts as success.
pub fn delete_credentials_at(path: &Path) -> Result<(), LoginError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(LoginError::Storage(err.to_string())),
    }
}

/// Persist credentials to the default path.
pub fn save_credentials(credentials: &Credentials) -> Result<(), LoginError> {
    save_credentials_to(&credentials_path(), credentials)
}

/// Load credentials from the default path.
pub fn load_credentials() -> Result<Credentials, LoginError> {
    load_credentials_from(&credentials_path())
}

/// Whether credentials are stored at the default path.
pub fn has_credentials() -> bool {
    credentials_path().exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("courier-storage-test-{}", std::process::id()))
            .join(name)
    }

    fn credentials() -> Credentials {
        Credentials {
            mail_address: Some("a@b.c".into()),
            user_id: "user-1".into(),
            access_token: "token".into(),
            encrypted_password: Some("blob".into()),
        }
    }

    #[test]
    fn test_save_load_roundtrip() {
        let path = temp_path("roundtrip.json");
        save_credentials_to(&path, &credentials()).unwrap();

        let loaded = load_credentials_from(&path).unwrap();
        assert_eq!(loaded.user_id, "user-1");
        assert_eq!(loaded.mail_address.as_deref(), Some("a@b.c"));
        assert_eq!(loaded.encrypted_password.as_deref(), Some("blob"));

        delete_credentials_at(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file_fails() {
        let path = temp_path("missing.json");
        assert!(matches!(
            load_credentials_from(&path),
            Err(LoginError::Storage(_))
        ));
    }

    #[test]
    fn test_delete_missing_file_is_ok() {
        let path = temp_path("never-created.json");
        assert!(delete_credentials_at(&path).is_ok());
    }
}

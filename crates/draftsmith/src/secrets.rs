//! Provider credential resolution.
//!
//! The content provider key can be given in three ways, checked in order:
//!
//! 1. `api_key` in the config file, handy for local runs
//! 2. `api_key_file`, a path whose trimmed contents are the key (Docker secrets)
//! 3. `api_key_env_var`, the name of an environment variable holding the key

use std::fs;

use secrecy::SecretString;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No credential source configured (set a key, a key file, or an env var name)")]
    NoSourceProvided,

    #[error("Failed to read credential file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Credential file '{path}' is empty")]
    EmptyFile { path: String },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// Resolves a secret from the first non-empty source.
pub fn resolve_secret(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString> {
    if let Some(value) = direct.filter(|v| !v.is_empty()) {
        return Ok(SecretString::from(value.to_string()));
    }

    if let Some(path) = file_path.filter(|p| !p.is_empty()) {
        let expanded = expand_home(path);
        let content = fs::read_to_string(&expanded).map_err(|e| SecretError::FileReadError {
            path: expanded.clone(),
            source: e,
        })?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Err(SecretError::EmptyFile { path: expanded });
        }
        return Ok(SecretString::from(trimmed.to_string()));
    }

    if let Some(name) = env_var.filter(|n| !n.is_empty()) {
        return match std::env::var(name) {
            Ok(value) => Ok(SecretString::from(value.trim().to_string())),
            Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                name: name.to_string(),
            }),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                name: name.to_string(),
            }),
        };
    }

    Err(SecretError::NoSourceProvided)
}

/// Whether any source is configured, without resolving it.
pub fn has_source(direct: Option<&str>, file_path: Option<&str>, env_var: Option<&str>) -> bool {
    [direct, file_path, env_var]
        .iter()
        .any(|s| s.is_some_and(|s| !s.is_empty()))
}

/// Expands a leading `~` or `~/` to the home directory.
fn expand_home(path: &str) -> String {
    if path == "~" || path.starts_with("~/") {
        if let Some(home) = dirs::home_dir() {
            let home = home.to_string_lossy();
            return path.replacen('~', &home, 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    #[serial]
    fn test_direct_value_wins() {
        std::env::set_var("DRAFTSMITH_TEST_KEY_A", "from-env");
        let secret =
            resolve_secret(Some("direct"), None, Some("DRAFTSMITH_TEST_KEY_A")).unwrap();
        assert_eq!(secret.expose_secret(), "direct");
        std::env::remove_var("DRAFTSMITH_TEST_KEY_A");
    }

    #[test]
    #[serial]
    fn test_file_before_env() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "  from-file  ").unwrap();
        std::env::set_var("DRAFTSMITH_TEST_KEY_B", "from-env");

        let secret = resolve_secret(
            None,
            file.path().to_str(),
            Some("DRAFTSMITH_TEST_KEY_B"),
        )
        .unwrap();
        assert_eq!(secret.expose_secret(), "from-file");
        std::env::remove_var("DRAFTSMITH_TEST_KEY_B");
    }

    #[test]
    #[serial]
    fn test_env_fallback_and_missing() {
        std::env::set_var("DRAFTSMITH_TEST_KEY_C", "from-env\n");
        let secret = resolve_secret(Some(""), Some(""), Some("DRAFTSMITH_TEST_KEY_C")).unwrap();
        assert_eq!(secret.expose_secret(), "from-env");
        std::env::remove_var("DRAFTSMITH_TEST_KEY_C");

        let err = resolve_secret(None, None, Some("DRAFTSMITH_TEST_KEY_C")).unwrap_err();
        assert!(matches!(err, SecretError::EnvVarNotSet { .. }));
    }

    #[test]
    fn test_no_source() {
        assert!(matches!(
            resolve_secret(None, None, None),
            Err(SecretError::NoSourceProvided)
        ));
    }

    #[test]
    fn test_empty_file_rejected() {
        let file = NamedTempFile::new().unwrap();
        let err = resolve_secret(None, file.path().to_str(), None).unwrap_err();
        assert!(matches!(err, SecretError::EmptyFile { .. }));
    }

    #[test]
    fn test_has_source() {
        assert!(!has_source(None, Some(""), None));
        assert!(has_source(None, None, Some("GEMINI_API_KEY")));
    }

    #[test]
    fn test_missing_file() {
        let err = resolve_secret(None, Some("/nonexistent/draftsmith/key"), None).unwrap_err();
        assert!(matches!(err, SecretError::FileReadError { .. }));
    }
}

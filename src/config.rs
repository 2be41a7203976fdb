use crate::notify::MAX_TOAST_MS;
use crate::validate::{is_valid_email, password_too_short, MIN_PASSWORD_LEN};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_ADMIN_EMAIL: &str = "admin@gmail.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
pub const DEFAULT_ADMIN_NAME: &str = "Admin";
pub const DEFAULT_WRITE_RETRIES: u32 = 1;
pub const MAX_WRITE_RETRIES: u32 = 5;
pub const MAX_SESSION_TTL_HOURS: u64 = 24 * 365;

/// Directory name used for project-level and user-level state.
pub const STATE_DIR: &str = ".masthead";

/// A validation error in the configuration
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]: {}", self.field, self.message)
    }
}

/// Where the key-value store lives and how hard writes try
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub write_retries: Option<u32>,
}

/// Bootstrap admin account, seeded at startup through registration
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct AdminConfig {
    #[serde(default = "default_admin_email")]
    pub email: String,
    #[serde(default = "default_admin_name")]
    pub name: String,
    #[serde(default = "default_admin_password")]
    pub password: String,
}

fn default_admin_email() -> String {
    DEFAULT_ADMIN_EMAIL.to_string()
}

fn default_admin_name() -> String {
    DEFAULT_ADMIN_NAME.to_string()
}

fn default_admin_password() -> String {
    DEFAULT_ADMIN_PASSWORD.to_string()
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            email: default_admin_email(),
            name: default_admin_name(),
            password: default_admin_password(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct AuthConfig {
    /// Sessions older than this are dropped; unset means no expiry
    #[serde(default)]
    pub session_ttl_hours: Option<u64>,
    #[serde(default)]
    pub admin: Option<AdminConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ToastConfig {
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CatalogConfig {
    #[serde(default)]
    pub recent_limit: Option<usize>,
}

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub toasts: ToastConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl Config {
    /// Load configuration from default paths
    /// Priority: local (.masthead/config.local.toml) > project (.masthead/config.toml) > user (~/.masthead/config.toml)
    pub fn load() -> Result<Self> {
        let mut config = Self::default();

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(STATE_DIR).join("config.toml");
            if user_config.exists() {
                config.merge(Self::load_from(&user_config)?);
            }
        }

        let project_config = Path::new(STATE_DIR).join("config.toml");
        if project_config.exists() {
            config.merge(Self::load_from(&project_config)?);
        }

        // Should be gitignored
        let local_config = Path::new(STATE_DIR).join("config.local.toml");
        if local_config.exists() {
            config.merge(Self::load_from(&local_config)?);
        }

        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Merge another config into this one (other takes priority for every value it sets)
    pub fn merge(&mut self, other: Config) {
        if other.storage.path.is_some() {
            self.storage.path = other.storage.path;
        }
        if other.storage.write_retries.is_some() {
            self.storage.write_retries = other.storage.write_retries;
        }

        if other.auth.session_ttl_hours.is_some() {
            self.auth.session_ttl_hours = other.auth.session_ttl_hours;
        }
        if other.auth.admin.is_some() {
            self.auth.admin = other.auth.admin;
        }

        if other.toasts.duration_ms.is_some() {
            self.toasts.duration_ms = other.toasts.duration_ms;
        }
        if other.catalog.recent_limit.is_some() {
            self.catalog.recent_limit = other.catalog.recent_limit;
        }
    }

    pub fn admin(&self) -> AdminConfig {
        self.auth.admin.clone().unwrap_or_default()
    }

    pub fn write_retries(&self) -> u32 {
        self.storage.write_retries.unwrap_or(DEFAULT_WRITE_RETRIES)
    }

    pub fn session_ttl(&self) -> Option<chrono::Duration> {
        self.auth
            .session_ttl_hours
            .and_then(|h| i64::try_from(h).ok())
            .map(chrono::Duration::hours)
    }

    pub fn toast_duration_ms(&self) -> u64 {
        self.toasts
            .duration_ms
            .unwrap_or(crate::notify::DEFAULT_TOAST_MS)
    }

    pub fn recent_limit(&self) -> usize {
        self.catalog
            .recent_limit
            .unwrap_or(crate::catalog::DEFAULT_RECENT_LIMIT)
    }

    /// Store file, relative paths resolved against `root`
    pub fn store_path(&self, root: &Path) -> PathBuf {
        match &self.storage.path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => root.join(path),
            None => root.join(STATE_DIR).join("store.json"),
        }
    }

    /// Validate configuration and return any errors found
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if let Some(admin) = &self.auth.admin {
            if !is_valid_email(&admin.email) {
                errors.push(ValidationError {
                    field: "auth.admin.email".to_string(),
                    message: format!("Invalid email address '{}'", admin.email),
                });
            }
            if admin.name.trim().is_empty() {
                errors.push(ValidationError {
                    field: "auth.admin.name".to_string(),
                    message: "Name must not be empty".to_string(),
                });
            }
            if password_too_short(&admin.password) {
                errors.push(ValidationError {
                    field: "auth.admin.password".to_string(),
                    message: format!("Must be at least {} characters", MIN_PASSWORD_LEN),
                });
            }
        }

        if let Some(hours) = self.auth.session_ttl_hours {
            if !(1..=MAX_SESSION_TTL_HOURS).contains(&hours) {
                errors.push(ValidationError {
                    field: "auth.session_ttl_hours".to_string(),
                    message: format!(
                        "Must be between 1 and {}, got {}",
                        MAX_SESSION_TTL_HOURS, hours
                    ),
                });
            }
        }

        if let Some(retries) = self.storage.write_retries {
            if retries > MAX_WRITE_RETRIES {
                errors.push(ValidationError {
                    field: "storage.write_retries".to_string(),
                    message: format!("Must be at most {}, got {}", MAX_WRITE_RETRIES, retries),
                });
            }
        }

        if let Some(ms) = self.toasts.duration_ms {
            if !(1..=MAX_TOAST_MS).contains(&ms) {
                errors.push(ValidationError {
                    field: "toasts.duration_ms".to_string(),
                    message: format!("Must be between 1 and {}, got {}", MAX_TOAST_MS, ms),
                });
            }
        }

        if self.catalog.recent_limit == Some(0) {
            errors.push(ValidationError {
                field: "catalog.recent_limit".to_string(),
                message: "Must be greater than 0".to_string(),
            });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.admin(), AdminConfig::default());
        assert_eq!(config.admin().email, "admin@gmail.com");
        assert_eq!(config.write_retries(), 1);
        assert!(config.session_ttl().is_none());
        assert_eq!(config.toast_duration_ms(), 5_000);
        assert_eq!(config.recent_limit(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[storage]
path = "data/site.json"
write_retries = 3

[auth]
session_ttl_hours = 12

[auth.admin]
email = "editor@magazine.test"

[catalog]
recent_limit = 4
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.write_retries(), 3);
        assert_eq!(config.session_ttl(), Some(chrono::Duration::hours(12)));
        assert_eq!(config.recent_limit(), 4);
        let admin = config.admin();
        assert_eq!(admin.email, "editor@magazine.test");
        // Unset admin fields fall back to defaults
        assert_eq!(admin.password, "admin123");
        assert_eq!(
            config.store_path(Path::new("/srv/site")),
            PathBuf::from("/srv/site/data/site.json")
        );
    }

    #[test]
    fn test_merge_other_takes_priority() {
        let mut base = Config::default();
        base.storage.write_retries = Some(2);
        base.catalog.recent_limit = Some(5);

        let mut other = Config::default();
        other.catalog.recent_limit = Some(2);
        other.toasts.duration_ms = Some(1_000);

        base.merge(other);
        assert_eq!(base.write_retries(), 2);
        assert_eq!(base.recent_limit(), 2);
        assert_eq!(base.toast_duration_ms(), 1_000);
    }

    #[test]
    fn test_default_store_path() {
        let config = Config::default();
        assert_eq!(
            config.store_path(Path::new("/srv/site")),
            PathBuf::from("/srv/site/.masthead/store.json")
        );
    }

    #[test]
    fn test_validate_bad_admin() {
        let mut config = Config::default();
        config.auth.admin = Some(AdminConfig {
            email: "not-an-email".to_string(),
            name: " ".to_string(),
            password: "123".to_string(),
        });
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].field.contains("email"));
        assert!(errors[2].message.contains("at least 6"));
    }

    #[test]
    fn test_validate_ranges() {
        let mut config = Config::default();
        config.auth.session_ttl_hours = Some(0);
        config.storage.write_retries = Some(9);
        config.toasts.duration_ms = Some(0);
        config.catalog.recent_limit = Some(0);
        let errors = config.validate().unwrap_err();
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            vec![
                "auth.session_ttl_hours",
                "storage.write_retries",
                "toasts.duration_ms",
                "catalog.recent_limit"
            ]
        );
    }

    #[test]
    fn test_validate_toast_duration_upper_bound() {
        let mut config = Config::default();
        config.toasts.duration_ms = Some(u64::MAX);
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "toasts.duration_ms");

        config.toasts.duration_ms = Some(MAX_TOAST_MS);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError {
            field: "catalog.recent_limit".to_string(),
            message: "Must be greater than 0".to_string(),
        };
        assert_eq!(err.to_string(), "[catalog.recent_limit]: Must be greater than 0");
    }
}

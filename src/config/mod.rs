use std::path::PathBuf;
use std::sync::Arc;

use log::warn;

use crate::content::Wiki;
use crate::users::{AuthMethod, UserManager};

pub const CONTENT_DIR_VAR: &str = "WIKISTORE_CONTENT_DIR";
pub const USER_DIR_VAR: &str = "WIKISTORE_USER_DIR";
pub const AUTH_METHOD_VAR: &str = "WIKISTORE_AUTH_METHOD";

/// Store configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub content_dir: Arc<PathBuf>,
    pub user_dir: Arc<PathBuf>,
    pub default_auth_method: AuthMethod,
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self {
            content_dir: Arc::new(PathBuf::from("wiki")),
            user_dir: Arc::new(PathBuf::from("user")),
            default_auth_method: AuthMethod::Hash,
        }
    }

    /// Create configuration with custom values
    pub fn with_custom(
        content_dir: PathBuf,
        user_dir: Option<PathBuf>,
        default_auth_method: Option<AuthMethod>,
    ) -> Self {
        let defaults = Self::new();
        Self {
            content_dir: Arc::new(content_dir),
            user_dir: user_dir.map(Arc::new).unwrap_or(defaults.user_dir),
            default_auth_method: default_auth_method.unwrap_or(defaults.default_auth_method),
        }
    }

    /// Read overrides from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read overrides through `lookup`; unset or empty values keep the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::new();

        if let Some(dir) = get(CONTENT_DIR_VAR) {
            config.content_dir = Arc::new(PathBuf::from(dir));
        }
        if let Some(dir) = get(USER_DIR_VAR) {
            config.user_dir = Arc::new(PathBuf::from(dir));
        }
        if let Some(method) = get(AUTH_METHOD_VAR) {
            match method.parse::<AuthMethod>() {
                Ok(method) => config.default_auth_method = method,
                Err(e) => warn!("Ignoring {}: {}", AUTH_METHOD_VAR, e),
            }
        }
        config
    }

    pub fn wiki(&self) -> Wiki {
        Wiki::new(self.content_dir.to_path_buf())
    }

    pub fn user_manager(&self) -> UserManager {
        UserManager::new(self.user_dir.as_path()).with_default_method(self.default_auth_method)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

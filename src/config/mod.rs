//! Configuration system (layered: code > env).

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, RwLock};

/// Global default config (lazy-initialized from env).
static DEFAULT_CONFIG: OnceLock<AgentryConfig> = OnceLock::new();

/// Layered configuration for agentry.
///
/// Explicit keys set via [`AgentryConfig::set_api_key`] take precedence over
/// values loaded from the environment.
#[derive(Clone)]
pub struct AgentryConfig {
    api_keys: Arc<RwLock<HashMap<String, String>>>,
    base_urls: Arc<RwLock<HashMap<String, String>>>,
}

impl fmt::Debug for AgentryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentryConfig")
            .field("api_keys", &"..")
            .field("base_urls", &self.base_urls)
            .finish()
    }
}

impl Default for AgentryConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AgentryConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self {
            api_keys: Arc::new(RwLock::new(HashMap::new())),
            base_urls: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Load from environment variables (OPENAI_API_KEY, etc.).
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let config = Self::new();

        let env_mappings = [
            ("OPENAI_API_KEY", "openai"),
            ("OPENAI_COMPAT_API_KEY", "openai-compatible"),
        ];

        for (env_var, provider) in &env_mappings {
            if let Ok(key) = std::env::var(env_var) {
                config.set_api_key(provider, key);
            }
        }

        let url_mappings = [
            ("OPENAI_BASE_URL", "openai"),
            ("OPENAI_COMPAT_BASE_URL", "openai-compatible"),
        ];

        for (env_var, provider) in &url_mappings {
            if let Ok(url) = std::env::var(env_var) {
                config.set_base_url(provider, url);
            }
        }

        config
    }

    /// Get (or create) the global default config.
    pub fn global() -> &'static AgentryConfig {
        DEFAULT_CONFIG.get_or_init(Self::from_env)
    }

    pub fn set_api_key(&self, provider: &str, key: String) {
        self.api_keys
            .write()
            .unwrap()
            .insert(provider.to_string(), key);
    }

    pub fn get_api_key(&self, provider: &str) -> Option<String> {
        self.api_keys.read().unwrap().get(provider).cloned()
    }

    pub fn set_base_url(&self, provider: &str, url: String) {
        self.base_urls
            .write()
            .unwrap()
            .insert(provider.to_string(), url);
    }

    pub fn get_base_url(&self, provider: &str) -> Option<String> {
        self.base_urls.read().unwrap().get(provider).cloned()
    }

    /// Check if a provider has credentials configured.
    pub fn has_credentials(&self, provider: &str) -> bool {
        self.get_api_key(provider).is_some()
    }
}

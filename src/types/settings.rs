use serde::{Deserialize, Serialize};

/// Top-level application settings container.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppSettings {
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Remote sync settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncSettings {
    pub enabled: bool,
    /// Base URL of the Supabase project, e.g. `https://xyz.supabase.co`.
    pub supabase_url: Option<String>,
    pub anon_key: Option<String>,
    pub request_timeout_secs: u64,
    pub push_debounce_ms: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            supabase_url: None,
            anon_key: None,
            request_timeout_secs: 5,
            push_debounce_ms: 800,
        }
    }
}

impl SyncSettings {
    /// True when sync is on and both endpoint and key are present.
    pub fn is_configured(&self) -> bool {
        self.enabled
            && self.supabase_url.as_deref().is_some_and(|u| !u.trim().is_empty())
            && self.anon_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

/// On-device storage settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorageSettings {
    /// Overrides the platform data directory location of the database.
    pub database_path: Option<String>,
}

/// Log output settings. `RUST_LOG` takes precedence when set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

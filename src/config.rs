use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

use crate::models::UserProfile;
use crate::orchestrator::DEFAULT_ERROR_MESSAGE;
use crate::transport::GEMINI_API_BASE;

/// Candidate `.env` locations, nearest first. Only the first one found is loaded.
const ENV_FILES: [&str; 2] = [".env", "../.env"];

/// Main configuration structure for Dream Architect
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub app: AppConfig,
    pub gemini: GeminiConfig,
    pub profile: ProfileDefaults,
    pub orchestrator: OrchestratorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    /// Sent as `x-goog-api-key`; may be empty, in which case the service rejects the call
    #[serde(skip_serializing)]
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub temperature: f32,
    /// Attach the Google Search grounding tool
    pub enable_search: bool,
}

/// Profile the session starts with
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileDefaults {
    pub age: String,
    pub gender: String,
    pub dream: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Share one in-flight fetch between concurrent requests for the same key
    pub single_flight: bool,
    pub error_message: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "dream-architect".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gemini-3-flash-preview".to_string(),
            api_base: GEMINI_API_BASE.to_string(),
            temperature: 0.7,
            enable_search: true,
        }
    }
}

impl Default for ProfileDefaults {
    fn default() -> Self {
        Self {
            age: "13".to_string(),
            gender: "男孩".to_string(),
            dream: "网络安全与黑客技术".to_string(),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            single_flight: true,
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
        }
    }
}

impl ProfileDefaults {
    pub fn to_profile(&self) -> UserProfile {
        UserProfile::new(self.age.clone(), self.gender.clone(), self.dream.clone())
    }
}

impl Config {
    /// Load configuration from file with environment variable overrides
    /// ALWAYS returns a valid config - never fails
    pub fn load() -> Self {
        if load_env_file(&ENV_FILES).is_none() {
            tracing::debug!("No .env file found - continuing with env vars only");
        }

        let config_path =
            env::var("DREAM_CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());

        let mut config = Self::from_file_or_default(Path::new(&config_path));
        config.apply_env_overrides(|name| env::var(name).ok());

        // Validate configuration - log warnings but don't fail
        for warning in config.validate() {
            tracing::warn!("Config validation warning: {} - continuing anyway", warning);
        }

        config
    }

    fn from_file_or_default(path: &Path) -> Self {
        if !path.exists() {
            tracing::debug!("Config file not found at {} - using defaults", path.display());
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(contents) => match Self::from_yaml(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded configuration from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to parse config file {}: {} - using defaults",
                        path.display(),
                        e
                    );
                    Self::default()
                }
            },
            Err(e) => {
                tracing::error!(
                    "Failed to read config file {}: {} - using defaults",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Parse YAML; sections and fields that are absent keep their defaults
    pub fn from_yaml(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }

    /// Apply overrides from a variable lookup (the process environment in [`Config::load`])
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // Gemini overrides; API_KEY is accepted as a fallback name
        if let Some(api_key) = lookup("GEMINI_API_KEY").or_else(|| lookup("API_KEY")) {
            self.gemini.api_key = api_key;
        }
        if let Some(model) = lookup("GEMINI_MODEL") {
            self.gemini.model = model;
        }
        if let Some(base) = lookup("GEMINI_API_BASE") {
            self.gemini.api_base = base;
        }
        if let Some(temperature) = lookup("GEMINI_TEMPERATURE") {
            match temperature.parse() {
                Ok(t) => self.gemini.temperature = t,
                Err(_) => tracing::warn!("Ignoring invalid GEMINI_TEMPERATURE: {}", temperature),
            }
        }
        if let Some(enabled) = lookup("GEMINI_ENABLE_SEARCH") {
            if let Some(flag) = parse_flag(&enabled) {
                self.gemini.enable_search = flag;
            }
        }

        // Profile defaults
        if let Some(age) = lookup("DREAM_DEFAULT_AGE") {
            self.profile.age = age;
        }
        if let Some(gender) = lookup("DREAM_DEFAULT_GENDER") {
            self.profile.gender = gender;
        }
        if let Some(dream) = lookup("DREAM_DEFAULT_DREAM") {
            self.profile.dream = dream;
        }

        if let Some(single_flight) = lookup("DREAM_SINGLE_FLIGHT") {
            if let Some(flag) = parse_flag(&single_flight) {
                self.orchestrator.single_flight = flag;
            }
        }
    }

    /// Problems worth a warning. None of them stop the program.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.gemini.api_key.trim().is_empty() {
            warnings.push(
                "GEMINI_API_KEY is not set; requests will be rejected by the service".to_string(),
            );
        }
        if self.gemini.model.trim().is_empty() {
            warnings.push("gemini.model is empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.gemini.temperature) {
            warnings.push(format!(
                "gemini.temperature {} is outside 0.0..=2.0",
                self.gemini.temperature
            ));
        }

        warnings
    }
}

/// Load the first readable `.env` file from `paths` and stop there
fn load_env_file<'a>(paths: &[&'a str]) -> Option<&'a str> {
    for path in paths {
        if dotenvy::from_path(path).is_ok() {
            tracing::info!("Loaded .env from: {}", path);
            return Some(*path);
        }
    }
    None
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        other => {
            tracing::warn!("Ignoring invalid boolean value: {}", other);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_match_product_settings() {
        let cfg = Config::default();
        assert_eq!(cfg.gemini.model, "gemini-3-flash-preview");
        assert!((cfg.gemini.temperature - 0.7).abs() < 1e-6);
        assert!(cfg.gemini.enable_search);
        assert!(cfg.orchestrator.single_flight);
        assert_eq!(
            cfg.profile.to_profile(),
            UserProfile::new("13", "男孩", "网络安全与黑客技术")
        );
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let cfg = Config::from_yaml(
            "gemini:\n  model: gemini-test\n\
             profile:\n  age: \"16\"\n\
             orchestrator:\n  single_flight: false\n",
        )
        .unwrap();
        assert_eq!(cfg.gemini.model, "gemini-test");
        assert_eq!(cfg.gemini.api_base, GEMINI_API_BASE);
        assert_eq!(cfg.profile.age, "16");
        assert_eq!(cfg.profile.gender, "男孩");
        assert!(!cfg.orchestrator.single_flight);
        assert_eq!(cfg.orchestrator.error_message, DEFAULT_ERROR_MESSAGE);
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = Config::default();
        cfg.apply_env_overrides(lookup_from(&[
            ("API_KEY", "fallback-key"),
            ("GEMINI_TEMPERATURE", "0.3"),
            ("GEMINI_ENABLE_SEARCH", "off"),
            ("DREAM_DEFAULT_DREAM", "AI"),
            ("DREAM_SINGLE_FLIGHT", "false"),
        ]));
        assert_eq!(cfg.gemini.api_key, "fallback-key");
        assert!((cfg.gemini.temperature - 0.3).abs() < 1e-6);
        assert!(!cfg.gemini.enable_search);
        assert_eq!(cfg.profile.dream, "AI");
        assert!(!cfg.orchestrator.single_flight);
    }

    #[test]
    fn test_gemini_key_wins_over_fallback() {
        let mut cfg = Config::default();
        cfg.apply_env_overrides(lookup_from(&[("API_KEY", "old"), ("GEMINI_API_KEY", "new")]));
        assert_eq!(cfg.gemini.api_key, "new");
    }

    #[test]
    fn test_invalid_override_values_are_ignored() {
        let mut cfg = Config::default();
        cfg.apply_env_overrides(lookup_from(&[
            ("GEMINI_TEMPERATURE", "warm"),
            ("DREAM_SINGLE_FLIGHT", "maybe"),
        ]));
        assert!((cfg.gemini.temperature - 0.7).abs() < 1e-6);
        assert!(cfg.orchestrator.single_flight);
    }

    #[test]
    fn test_local_env_file_is_tried_first() {
        assert_eq!(ENV_FILES, [".env", "../.env"]);
    }

    #[test]
    fn test_only_first_env_file_is_loaded() {
        let dir = std::env::temp_dir().join(format!("dream-env-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let near = dir.join("near.env");
        let far = dir.join("far.env");
        fs::write(&near, "DREAM_TEST_NEAR_ONLY=near\nDREAM_TEST_SHARED=near\n").unwrap();
        fs::write(&far, "DREAM_TEST_FAR_ONLY=far\nDREAM_TEST_SHARED=far\n").unwrap();

        let missing = dir.join("missing.env");
        let (missing, near, far) = (
            missing.to_string_lossy().into_owned(),
            near.to_string_lossy().into_owned(),
            far.to_string_lossy().into_owned(),
        );
        let loaded = load_env_file(&[missing.as_str(), near.as_str(), far.as_str()]);

        assert_eq!(loaded, Some(near.as_str()));
        assert_eq!(env::var("DREAM_TEST_SHARED").as_deref(), Ok("near"));
        assert_eq!(env::var("DREAM_TEST_NEAR_ONLY").as_deref(), Ok("near"));
        assert!(env::var("DREAM_TEST_FAR_ONLY").is_err());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_validate_only_warns() {
        let mut cfg = Config::default();
        assert_eq!(cfg.validate().len(), 1);

        cfg.gemini.api_key = "k".into();
        assert!(cfg.validate().is_empty());

        cfg.gemini.temperature = 3.5;
        cfg.gemini.model = " ".into();
        assert_eq!(cfg.validate().len(), 2);
    }
}

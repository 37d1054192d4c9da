use std::{fs, time::Duration};

use client_core::{OperatorRole, SimulatorConfig};
use serde::Deserialize;
use shared::domain::OperatorId;
use tracing::warn;

const SETTINGS_FILE: &str = "agent_console.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub registry_url: String,
    pub operator_id: i64,
    pub role: OperatorRole,
    pub initial_delay_ms: u64,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            registry_url: "http://127.0.0.1:8080".into(),
            operator_id: 1,
            role: OperatorRole::FrontLineAgent,
            initial_delay_ms: 10_000,
            min_delay_ms: 30_000,
            max_delay_ms: 60_000,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    registry_url: Option<String>,
    operator_id: Option<i64>,
    role: Option<String>,
    initial_delay_ms: Option<u64>,
    min_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
}

impl Settings {
    pub fn simulator_config(&self, enabled: bool) -> SimulatorConfig {
        SimulatorConfig::new(OperatorId(self.operator_id))
            .with_enabled(enabled)
            .with_initial_delay(Duration::from_millis(self.initial_delay_ms))
            .with_delay_range(
                Duration::from_millis(self.min_delay_ms),
                Duration::from_millis(self.max_delay_ms),
            )
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(SETTINGS_FILE) {
        apply_file_overrides(&mut settings, &raw);
    }
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());

    settings
}

fn apply_file_overrides(settings: &mut Settings, raw: &str) {
    let file_cfg = match toml::from_str::<FileSettings>(raw) {
        Ok(file_cfg) => file_cfg,
        Err(error) => {
            warn!(file = SETTINGS_FILE, %error, "ignoring malformed settings file");
            return;
        }
    };
    if let Some(v) = file_cfg.registry_url {
        settings.registry_url = v;
    }
    if let Some(v) = file_cfg.operator_id {
        settings.operator_id = v;
    }
    if let Some(v) = file_cfg.role {
        set_role(settings, &v);
    }
    if let Some(v) = file_cfg.initial_delay_ms {
        settings.initial_delay_ms = v;
    }
    if let Some(v) = file_cfg.min_delay_ms {
        settings.min_delay_ms = v;
    }
    if let Some(v) = file_cfg.max_delay_ms {
        settings.max_delay_ms = v;
    }
}

fn apply_env_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("REGISTRY_URL") {
        settings.registry_url = v;
    }
    if let Some(v) = lookup("APP__REGISTRY_URL") {
        settings.registry_url = v;
    }
    if let Some(v) = lookup("APP__OPERATOR_ID") {
        set_parsed(&mut settings.operator_id, "APP__OPERATOR_ID", &v);
    }
    if let Some(v) = lookup("APP__ROLE") {
        set_role(settings, &v);
    }
    if let Some(v) = lookup("APP__INITIAL_DELAY_MS") {
        set_parsed(&mut settings.initial_delay_ms, "APP__INITIAL_DELAY_MS", &v);
    }
    if let Some(v) = lookup("APP__MIN_DELAY_MS") {
        set_parsed(&mut settings.min_delay_ms, "APP__MIN_DELAY_MS", &v);
    }
    if let Some(v) = lookup("APP__MAX_DELAY_MS") {
        set_parsed(&mut settings.max_delay_ms, "APP__MAX_DELAY_MS", &v);
    }
}

fn set_parsed<T: std::str::FromStr>(slot: &mut T, key: &str, raw: &str) {
    match raw.trim().parse::<T>() {
        Ok(parsed) => *slot = parsed,
        Err(_) => warn!(key, value = raw, "ignoring unparsable setting"),
    }
}

fn set_role(settings: &mut Settings, raw: &str) {
    match raw.parse::<OperatorRole>() {
        Ok(role) => settings.role = role,
        Err(error) => warn!(%error, "ignoring role setting"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let mut settings = Settings::default();
        apply_file_overrides(
            &mut settings,
            r#"
registry_url = "http://registry.local:9000"
operator_id = 12
role = "supervisor"
min_delay_ms = 1000
max_delay_ms = 2000
"#,
        );
        assert_eq!(settings.registry_url, "http://registry.local:9000");
        assert_eq!(settings.operator_id, 12);
        assert_eq!(settings.role, OperatorRole::Supervisor);
        assert_eq!(settings.initial_delay_ms, 10_000);
        assert_eq!(settings.min_delay_ms, 1_000);
        assert_eq!(settings.max_delay_ms, 2_000);
    }

    #[test]
    fn bad_env_values_are_ignored() {
        let mut settings = Settings::default();
        apply_env_overrides(&mut settings, |key| match key {
            "APP__OPERATOR_ID" => Some("seven".to_string()),
            "APP__ROLE" => Some("janitor".to_string()),
            "APP__MAX_DELAY_MS" => Some("90000".to_string()),
            _ => None,
        });
        assert_eq!(settings.operator_id, 1);
        assert_eq!(settings.role, OperatorRole::FrontLineAgent);
        assert_eq!(settings.max_delay_ms, 90_000);
    }

    #[test]
    fn simulator_config_carries_delays() {
        let settings = Settings {
            initial_delay_ms: 500,
            min_delay_ms: 1_000,
            max_delay_ms: 3_000,
            ..Settings::default()
        };
        let config = settings.simulator_config(false);
        assert!(!config.enabled);
        assert_eq!(config.operator_id, OperatorId(1));
        assert_eq!(config.initial_delay, Duration::from_millis(500));
        assert_eq!(config.max_delay, Duration::from_millis(3_000));
        assert_eq!(config.validate(), Ok(()));
    }
}

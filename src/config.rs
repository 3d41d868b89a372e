use serde::Deserialize;
use std::collections::HashSet;
use std::fs;

/// Explicit per-user query settings. These travel as a value into every
/// cycle instead of living in some global toggle state.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSettings {
    #[serde(default)]
    pub selected_retailer_ids: Vec<String>,
    #[serde(default)]
    pub plz: Option<String>,
}

impl UserSettings {
    /// Narrows the catalog's active retailer set to the user's selection.
    /// An empty selection means no restriction.
    pub fn restrict(&self, active: HashSet<String>) -> HashSet<String> {
        if self.selected_retailer_ids.is_empty() {
            return active;
        }
        active
            .into_iter()
            .filter(|id| self.selected_retailer_ids.contains(id))
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_check_interval")]
    pub check_interval_seconds: u64,
    #[serde(default)]
    pub settings: UserSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            check_interval_seconds: default_check_interval(),
            settings: UserSettings::default(),
        }
    }
}

fn default_db_path() -> String {
    "data.db".to_string()
}

fn default_check_interval() -> u64 {
    3600
}

pub fn load_config(path: &str) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_config_parses() {
        let config: AppConfig = serde_json::from_str(
            r#"{
                "db_path": "test.db",
                "check_interval_seconds": 600,
                "settings": {
                    "selected_retailer_ids": ["aldi", "rewe"],
                    "plz": "10115"
                }
            }"#,
        )
        .unwrap();
        assert_eq!(config.db_path, "test.db");
        assert_eq!(config.check_interval_seconds, 600);
        assert_eq!(config.settings.selected_retailer_ids.len(), 2);
        assert_eq!(config.settings.plz.as_deref(), Some("10115"));
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.db_path, "data.db");
        assert_eq!(config.check_interval_seconds, 3600);
        assert!(config.settings.selected_retailer_ids.is_empty());
        assert!(config.settings.plz.is_none());
    }

    #[test]
    fn test_restrict_with_empty_selection_keeps_all() {
        let settings = UserSettings::default();
        let active: HashSet<String> = ["aldi", "rewe"].iter().map(|s| s.to_string()).collect();
        assert_eq!(settings.restrict(active.clone()), active);
    }

    #[test]
    fn test_restrict_intersects_with_selection() {
        let settings = UserSettings {
            selected_retailer_ids: vec!["rewe".to_string(), "lidl".to_string()],
            plz: None,
        };
        let active: HashSet<String> = ["aldi", "rewe"].iter().map(|s| s.to_string()).collect();
        let restricted = settings.restrict(active);
        assert_eq!(restricted.len(), 1);
        assert!(restricted.contains("rewe"));
    }
}

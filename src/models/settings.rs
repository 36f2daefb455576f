use serde::{Deserialize, Serialize};

/// User settings, persisted as one record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub dark_mode: bool,
    /// Age classification threshold (FSK), stored as entered
    pub fsk_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            fsk_level: "0".to_string(),
        }
    }
}

/// Partial update merged over the current settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dark_mode: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fsk_level: Option<String>,
}

impl Settings {
    pub fn merge(self, patch: SettingsPatch) -> Self {
        Self {
            dark_mode: patch.dark_mode.unwrap_or(self.dark_mode),
            fsk_level: patch.fsk_level.unwrap_or(self.fsk_level),
        }
    }
}

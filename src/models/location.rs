use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// Device location permission as reported by the platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocPermission {
    Granted,
    Denied,
    Prompt,
}

impl LocPermission {
    pub fn as_str(self) -> &'static str {
        match self {
            LocPermission::Granted => "granted",
            LocPermission::Denied => "denied",
            LocPermission::Prompt => "prompt",
        }
    }
}

impl Display for LocPermission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LocPermission {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "granted" => Ok(LocPermission::Granted),
            "denied" => Ok(LocPermission::Denied),
            "prompt" => Ok(LocPermission::Prompt),
            _ => Err(()),
        }
    }
}

/// A position fix, `timestamp` in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<f64>,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationState {
    pub permission: LocPermission,
    pub coords: Option<Coords>,
    pub country_code: Option<String>,
    /// Epoch milliseconds of the last successful resolution
    pub last_updated: Option<i64>,
}

impl Default for LocationState {
    fn default() -> Self {
        Self {
            permission: LocPermission::Prompt,
            coords: None,
            country_code: None,
            last_updated: None,
        }
    }
}

impl LocationState {
    pub fn cleared(permission: LocPermission) -> Self {
        Self {
            permission,
            ..Self::default()
        }
    }
}

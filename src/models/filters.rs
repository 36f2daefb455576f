use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

use crate::error::AppError;

/// Recognized filter vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterKey {
    /// Runtime bucket(s): `<90`, `90-120`, `>120`
    Runtime,
    /// Minimum vote average
    Rating,
    /// Minimum vote count
    VoteCount,
    /// Original language code(s)
    Language,
    /// Release decade(s): `YYYY` or `older`
    Decade,
    FavoritesOnly,
    HideWatched,
}

impl FilterKey {
    pub const ALL: [FilterKey; 7] = [
        FilterKey::Runtime,
        FilterKey::Rating,
        FilterKey::VoteCount,
        FilterKey::Language,
        FilterKey::Decade,
        FilterKey::FavoritesOnly,
        FilterKey::HideWatched,
    ];

    /// Keys whose value is an on/off flag
    pub fn is_flag(self) -> bool {
        matches!(self, FilterKey::FavoritesOnly | FilterKey::HideWatched)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FilterKey::Runtime => "runtime",
            FilterKey::Rating => "rating",
            FilterKey::VoteCount => "voteCount",
            FilterKey::Language => "language",
            FilterKey::Decade => "decade",
            FilterKey::FavoritesOnly => "favoritesOnly",
            FilterKey::HideWatched => "hideWatched",
        }
    }
}

impl Display for FilterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FilterKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown filter key: {}", s)))
    }
}

/// Value held by a filter key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Flag(bool),
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl FilterValue {
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FilterValue::Flag(flag) => Some(*flag),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        let number = match self {
            FilterValue::Number(n) => Some(*n),
            FilterValue::Text(text) => text.trim().parse::<f64>().ok(),
            _ => None,
        };
        number.filter(|n| n.is_finite())
    }

    /// Single text values are treated as a one-element selection.
    pub fn as_list(&self) -> Vec<&str> {
        match self {
            FilterValue::Text(text) => vec![text.as_str()],
            FilterValue::List(items) => items.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        FilterValue::Text(value.to_string())
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        FilterValue::Flag(value)
    }
}

impl From<Vec<&str>> for FilterValue {
    fn from(values: Vec<&str>) -> Self {
        FilterValue::List(values.into_iter().map(str::to_string).collect())
    }
}

/// Transient filter selection for one result list
///
/// A missing key means the filter is inactive, except `hideWatched`, which is
/// active unless explicitly set to `false`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterState {
    values: BTreeMap<FilterKey, FilterValue>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: FilterKey, value: impl Into<FilterValue>) -> Self {
        self.set(key, value);
        self
    }

    pub fn get(&self, key: FilterKey) -> Option<&FilterValue> {
        self.values.get(&key)
    }

    pub fn contains(&self, key: FilterKey) -> bool {
        self.values.contains_key(&key)
    }

    pub fn set(&mut self, key: FilterKey, value: impl Into<FilterValue>) {
        self.values.insert(key, value.into());
    }

    /// Sets a filter addressed by its wire name.
    ///
    /// Flag keys also accept the text `"true"` / `"false"`; any other non-flag
    /// value for them is rejected.
    pub fn set_named(&mut self, key: &str, value: impl Into<FilterValue>) -> Result<(), AppError> {
        let key = key.parse::<FilterKey>()?;
        let value = value.into();

        let value = if key.is_flag() {
            let flag = match &value {
                FilterValue::Flag(flag) => Some(*flag),
                FilterValue::Text(text) => text.trim().parse::<bool>().ok(),
                _ => None,
            };
            let flag = flag.ok_or_else(|| {
                AppError::InvalidInput(format!("Filter {} expects true or false", key))
            })?;
            FilterValue::Flag(flag)
        } else {
            value
        };

        self.set(key, value);
        Ok(())
    }

    /// Deactivates one filter. `hideWatched` is switched off with an explicit
    /// `false`; every other key is removed.
    pub fn clear(&mut self, key: FilterKey) {
        match key {
            FilterKey::HideWatched => {
                self.values.insert(key, FilterValue::Flag(false));
            }
            _ => {
                self.values.remove(&key);
            }
        }
    }

    /// Removes every key, which also re-activates `hideWatched`.
    pub fn reset_all(&mut self) {
        self.values.clear();
    }

    pub fn hide_watched(&self) -> bool {
        self.get(FilterKey::HideWatched)
            .and_then(FilterValue::as_flag)
            .unwrap_or(true)
    }

    pub fn favorites_only(&self) -> bool {
        self.get(FilterKey::FavoritesOnly)
            .and_then(FilterValue::as_flag)
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of a filter editing session
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    Applied(FilterState),
    Cancelled,
}

/// Edits a private copy of a filter selection
///
/// The list view hands its current selection in by value and receives the edited
/// selection back through [`FilterOutcome`]; nothing is shared while editing.
#[derive(Debug, Clone)]
pub struct FilterEditor {
    draft: FilterState,
}

impl FilterEditor {
    pub fn open(current: FilterState) -> Self {
        Self { draft: current }
    }

    pub fn draft(&self) -> &FilterState {
        &self.draft
    }

    pub fn update(&mut self, key: FilterKey, value: impl Into<FilterValue>) -> &mut Self {
        self.draft.set(key, value);
        self
    }

    pub fn clear(&mut self, key: FilterKey) -> &mut Self {
        self.draft.clear(key);
        self
    }

    /// Clears everything and closes the editor.
    pub fn reset_all(mut self) -> FilterOutcome {
        self.draft.reset_all();
        FilterOutcome::Applied(self.draft)
    }

    pub fn apply(self) -> FilterOutcome {
        FilterOutcome::Applied(self.draft)
    }

    pub fn cancel(self) -> FilterOutcome {
        FilterOutcome::Cancelled
    }
}

/// Category tab a list was opened from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    All,
    Popular,
    TopRated,
    Trending,
    /// Any other selector is taken as a literal genre ID
    Genre(String),
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        match value {
            "all" => Category::All,
            "popular" => Category::Popular,
            "top-rated" => Category::TopRated,
            "trending" => Category::Trending,
            other => Category::Genre(other.to_string()),
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::All => write!(f, "all"),
            Category::Popular => write!(f, "popular"),
            Category::TopRated => write!(f, "top-rated"),
            Category::Trending => write!(f, "trending"),
            Category::Genre(id) => write!(f, "{}", id),
        }
    }
}

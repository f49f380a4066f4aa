use serde::{Deserialize, Serialize};

use super::errors::FavoriteError;

/// Category of content a favorite points at.
///
/// Closed set: payloads carrying any other tag fail to deserialize, so
/// malformed candidates are rejected at the RPC boundary instead of
/// reaching the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FavoriteKind {
    GlossarySign,
    GlossaryHouse,
    GlossaryPlanet,
    GlossaryAsteroid,
    GlossaryAspect,
    GlossaryDignity,
    GlossaryConfiguration,
    GlossaryCoordinate,
    GlossaryShape,
    GlossaryCelestial,
    GlossaryMoon,
    FrequencyExercise,
    ChartSection,
    Reflection,
}

impl FavoriteKind {
    pub const ALL: [FavoriteKind; 14] = [
        FavoriteKind::GlossarySign,
        FavoriteKind::GlossaryHouse,
        FavoriteKind::GlossaryPlanet,
        FavoriteKind::GlossaryAsteroid,
        FavoriteKind::GlossaryAspect,
        FavoriteKind::GlossaryDignity,
        FavoriteKind::GlossaryConfiguration,
        FavoriteKind::GlossaryCoordinate,
        FavoriteKind::GlossaryShape,
        FavoriteKind::GlossaryCelestial,
        FavoriteKind::GlossaryMoon,
        FavoriteKind::FrequencyExercise,
        FavoriteKind::ChartSection,
        FavoriteKind::Reflection,
    ];

    /// Wire tag, identical to the serde representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            FavoriteKind::GlossarySign => "glossary-sign",
            FavoriteKind::GlossaryHouse => "glossary-house",
            FavoriteKind::GlossaryPlanet => "glossary-planet",
            FavoriteKind::GlossaryAsteroid => "glossary-asteroid",
            FavoriteKind::GlossaryAspect => "glossary-aspect",
            FavoriteKind::GlossaryDignity => "glossary-dignity",
            FavoriteKind::GlossaryConfiguration => "glossary-configuration",
            FavoriteKind::GlossaryCoordinate => "glossary-coordinate",
            FavoriteKind::GlossaryShape => "glossary-shape",
            FavoriteKind::GlossaryCelestial => "glossary-celestial",
            FavoriteKind::GlossaryMoon => "glossary-moon",
            FavoriteKind::FrequencyExercise => "frequency-exercise",
            FavoriteKind::ChartSection => "chart-section",
            FavoriteKind::Reflection => "reflection",
        }
    }
}

/// Whether a favorite refers to app-wide content or to a generated chart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteScope {
    #[default]
    Global,
    Chart,
}

/// A saved pointer to content elsewhere in the app.
///
/// Wire names are camelCase with the kind under `type`; the remote
/// `user_favorites` row is this object plus `user_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: FavoriteKind,
    pub scope: FavoriteScope,
    pub title: String,
    pub icon: String,
    pub route: String,
    pub target_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub chart_id: Option<String>,
    pub created_at: i64,
    pub last_used_at: i64,
}

/// What the UI layer builds when the user stars something.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteCandidate {
    #[serde(rename = "type")]
    pub kind: FavoriteKind,
    #[serde(default)]
    pub scope: FavoriteScope,
    pub title: String,
    #[serde(default)]
    pub icon: String,
    pub route: String,
    #[serde(default)]
    pub target_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub pinned: bool,
    #[serde(default)]
    pub chart_id: Option<String>,
}

impl FavoriteCandidate {
    /// Shorthand for a global favorite with no icon, anchor or tags.
    pub fn new(kind: FavoriteKind, title: &str, route: &str) -> Self {
        Self {
            kind,
            scope: FavoriteScope::Global,
            title: title.to_string(),
            icon: String::new(),
            route: route.to_string(),
            target_id: None,
            tags: Vec::new(),
            pinned: false,
            chart_id: None,
        }
    }

    pub fn id(&self) -> String {
        deterministic_id(self.kind, &self.title)
    }

    /// Rejects candidates the store must never see.
    pub fn validate(&self) -> Result<(), FavoriteError> {
        if self.title.trim().is_empty() {
            return Err(FavoriteError::InvalidCandidate("title is empty".to_string()));
        }
        if self.route.trim().is_empty() {
            return Err(FavoriteError::InvalidCandidate(format!(
                "route is empty for '{}'",
                self.title.trim()
            )));
        }
        if self.scope == FavoriteScope::Chart && self.chart_id.as_deref().map_or(true, |c| c.trim().is_empty()) {
            return Err(FavoriteError::InvalidCandidate(format!(
                "chart-scoped favorite '{}' has no chart_id",
                self.title.trim()
            )));
        }
        Ok(())
    }

    /// Materializes the candidate as a stored record stamped at `now`.
    pub fn into_item(self, now: i64) -> FavoriteItem {
        let id = self.id();
        FavoriteItem {
            id,
            kind: self.kind,
            scope: self.scope,
            title: self.title.trim().to_string(),
            icon: self.icon,
            route: self.route,
            target_id: self.target_id,
            tags: self.tags,
            pinned: self.pinned,
            chart_id: self.chart_id,
            created_at: now,
            last_used_at: now,
        }
    }
}

/// Criteria for `FavoritesStore::list`. Empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteFilter {
    #[serde(default, rename = "type")]
    pub kind: Option<FavoriteKind>,
    #[serde(default)]
    pub scope: Option<FavoriteScope>,
    #[serde(default)]
    pub chart_id: Option<String>,
    /// Case-insensitive substring matched against title and tags.
    #[serde(default)]
    pub query: Option<String>,
}

impl FavoriteFilter {
    pub fn matches(&self, item: &FavoriteItem) -> bool {
        if self.kind.map_or(false, |k| k != item.kind) {
            return false;
        }
        if self.scope.map_or(false, |s| s != item.scope) {
            return false;
        }
        if let Some(chart) = &self.chart_id {
            if item.chart_id.as_deref() != Some(chart.as_str()) {
                return false;
            }
        }
        match self.query.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(q) => {
                let needle = q.to_lowercase();
                item.title.to_lowercase().contains(&needle)
                    || item.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            }
        }
    }
}

/// Trims, lower-cases and collapses whitespace runs to a single space.
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Stable identity of a favorite: `"<kind>:<normalized title>"`.
///
/// Two candidates with the same kind and a title differing only in case or
/// whitespace collapse to the same record.
pub fn deterministic_id(kind: FavoriteKind, title: &str) -> String {
    format!("{}:{}", kind.as_str(), normalize_title(title))
}

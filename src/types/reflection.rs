use serde::{Deserialize, Serialize};

use super::errors::ReflectionError;

/// A journal note, optionally tied to a generated natal chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionEntry {
    pub id: String,
    pub user_id: String,
    pub chart_id: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// The user-editable part of a reflection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionDraft {
    #[serde(default)]
    pub chart_id: Option<String>,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ReflectionDraft {
    /// Returns the cleaned draft, or `InvalidEntry` when title or content is blank.
    ///
    /// Tags are trimmed; blanks and repeats (case-insensitive) are dropped,
    /// first spelling wins.
    pub fn validate(self) -> Result<ReflectionDraft, ReflectionError> {
        let title = self.title.trim().to_string();
        let content = self.content.trim().to_string();
        if title.is_empty() {
            return Err(ReflectionError::InvalidEntry("title is empty".to_string()));
        }
        if content.is_empty() {
            return Err(ReflectionError::InvalidEntry("content is empty".to_string()));
        }

        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in self.tags {
            let tag = tag.trim();
            if tag.is_empty() || tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                continue;
            }
            tags.push(tag.to_string());
        }

        let chart_id = self.chart_id.filter(|c| !c.trim().is_empty());

        Ok(ReflectionDraft { chart_id, title, content, tags })
    }
}

/// Criteria for listing reflections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionFilter {
    #[serde(default)]
    pub chart_id: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
}

impl ReflectionFilter {
    pub fn matches(&self, entry: &ReflectionEntry) -> bool {
        if let Some(chart) = &self.chart_id {
            if entry.chart_id.as_deref() != Some(chart.as_str()) {
                return false;
            }
        }
        if let Some(tag) = &self.tag {
            if !entry.tags.iter().any(|t| t.eq_ignore_ascii_case(tag)) {
                return false;
            }
        }
        match self.query.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(q) => {
                let needle = q.to_lowercase();
                entry.title.to_lowercase().contains(&needle)
                    || entry.content.to_lowercase().contains(&needle)
            }
        }
    }
}

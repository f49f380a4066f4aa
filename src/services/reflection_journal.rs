//! Reflections journal.
//!
//! Remote only: entries live in the user's remote table and nothing is
//! cached on the device. Drafts are validated before any request is made,
//! and remote failures are returned to the caller instead of being dropped.

use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use uuid::Uuid;

use crate::clock::SharedClock;
use crate::services::remote::{with_timeout, ReflectionsRemote};
use crate::types::errors::ReflectionError;
use crate::types::reflection::{ReflectionDraft, ReflectionEntry, ReflectionFilter};

pub struct ReflectionJournal {
    remote: Arc<dyn ReflectionsRemote>,
    clock: SharedClock,
    timeout: Duration,
}

impl ReflectionJournal {
    pub fn new(remote: Arc<dyn ReflectionsRemote>, clock: SharedClock, timeout: Duration) -> Self {
        Self { remote, clock, timeout }
    }

    /// Entries of `user_id` matching `filter`, most recently edited first.
    pub async fn list(
        &self,
        user_id: &str,
        filter: &ReflectionFilter,
    ) -> Result<Vec<ReflectionEntry>, ReflectionError> {
        let mut entries = with_timeout(
            self.timeout,
            "reflections fetch",
            self.remote.fetch_reflections(user_id),
        )
        .await?;
        entries.retain(|e| filter.matches(e));
        entries.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(entries)
    }

    pub async fn create(
        &self,
        user_id: &str,
        draft: ReflectionDraft,
    ) -> Result<ReflectionEntry, ReflectionError> {
        let draft = draft.validate()?;
        let now = self.clock.now_millis();
        let entry = ReflectionEntry {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            chart_id: draft.chart_id,
            title: draft.title,
            content: draft.content,
            tags: draft.tags,
            created_at: now,
            updated_at: now,
        };

        with_timeout(
            self.timeout,
            "reflection insert",
            self.remote.insert_reflection(&entry),
        )
        .await?;
        info!(id = %entry.id, "reflection created");
        Ok(entry)
    }

    /// Replaces the editable fields of an entry, keeping `created_at`.
    pub async fn update(
        &self,
        user_id: &str,
        id: &str,
        draft: ReflectionDraft,
    ) -> Result<ReflectionEntry, ReflectionError> {
        let draft = draft.validate()?;

        let existing = self
            .list(user_id, &ReflectionFilter::default())
            .await?
            .into_iter()
            .find(|e| e.id == id)
            .ok_or_else(|| ReflectionError::NotFound(id.to_string()))?;

        let entry = ReflectionEntry {
            chart_id: draft.chart_id,
            title: draft.title,
            content: draft.content,
            tags: draft.tags,
            updated_at: self.clock.now_millis().max(existing.updated_at),
            ..existing
        };

        let matched = with_timeout(
            self.timeout,
            "reflection update",
            self.remote.update_reflection(&entry),
        )
        .await?;
        if !matched {
            return Err(ReflectionError::NotFound(id.to_string()));
        }
        info!(id = %entry.id, "reflection updated");
        Ok(entry)
    }

    pub async fn delete(&self, user_id: &str, id: &str) -> Result<(), ReflectionError> {
        let matched = with_timeout(
            self.timeout,
            "reflection delete",
            self.remote.delete_reflection(user_id, id),
        )
        .await?;
        if !matched {
            return Err(ReflectionError::NotFound(id.to_string()));
        }
        info!(id = %id, "reflection deleted");
        Ok(())
    }
}

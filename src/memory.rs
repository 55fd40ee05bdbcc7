//! Catalog memory: podcast episode lists fetched earlier, keyed by podcast name.
//!
//! Any agent in a delegation chain can read it, and the dispatcher summarizes it
//! into the context of every new request.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// A podcast episode record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discussed_topics: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Episode {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            id: id.into(),
            subtitle: None,
            discussed_topics: None,
            release_date: None,
            duration_seconds: None,
            url: None,
        }
    }

    /// Lowercased title, subtitle and discussed topics joined for substring search.
    fn searchable_text(&self) -> String {
        [
            self.title.as_str(),
            self.subtitle.as_deref().unwrap_or_default(),
            self.discussed_topics.as_deref().unwrap_or_default(),
        ]
        .join(" ")
        .to_lowercase()
    }
}

/// An episode found by [`CatalogMemory::search_all`], tagged with its podcast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeMatch {
    pub podcast_name: String,
    #[serde(flatten)]
    pub episode: Episode,
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    /// Podcast name as last stored.
    name: String,
    episodes: Vec<Episode>,
    updated_at: DateTime<Utc>,
}

/// Keyed cache of episode lists.
///
/// One list per podcast name, compared ignoring case and surrounding whitespace.
/// Storing again replaces the list (last write wins) but keeps the podcast's
/// original insertion position. Entries live until cleared explicitly.
#[derive(Debug, Default)]
pub struct CatalogMemory {
    catalogs: RwLock<IndexMap<String, CatalogEntry>>,
}

impl CatalogMemory {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(podcast_name: &str) -> String {
        podcast_name.trim().to_lowercase()
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexMap<String, CatalogEntry>> {
        self.catalogs.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<String, CatalogEntry>> {
        self.catalogs.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the episode list stored for `podcast_name`.
    pub fn store(&self, podcast_name: &str, episodes: Vec<Episode>) {
        debug!("Storing {} episodes for '{}'", episodes.len(), podcast_name);
        self.write().insert(
            Self::key(podcast_name),
            CatalogEntry {
                name: podcast_name.trim().to_string(),
                episodes,
                updated_at: Utc::now(),
            },
        );
    }

    pub fn get_episodes(&self, podcast_name: &str) -> Option<Vec<Episode>> {
        self.read().get(&Self::key(podcast_name)).map(|e| e.episodes.clone())
    }

    /// When the list for `podcast_name` was last stored.
    pub fn last_updated(&self, podcast_name: &str) -> Option<DateTime<Utc>> {
        self.read().get(&Self::key(podcast_name)).map(|e| e.updated_at)
    }

    /// First episode (in list order) whose title contains `title`, ignoring case.
    pub fn find_by_title(&self, podcast_name: &str, title: &str) -> Option<Episode> {
        let needle = title.to_lowercase();
        self.read().get(&Self::key(podcast_name)).and_then(|entry| {
            entry
                .episodes
                .iter()
                .find(|ep| ep.title.to_lowercase().contains(&needle))
                .cloned()
        })
    }

    /// Every episode whose title, subtitle or discussed topics contain `query`, ignoring case.
    ///
    /// Results follow podcast insertion order, then list order. Each episode appears at most once.
    pub fn search_all(&self, query: &str) -> Vec<EpisodeMatch> {
        let needle = query.to_lowercase();
        let needle = needle.as_str();
        self.read()
            .values()
            .flat_map(|entry| {
                entry
                    .episodes
                    .iter()
                    .filter(move |ep| ep.searchable_text().contains(needle))
                    .map(move |ep| EpisodeMatch {
                        podcast_name: entry.name.clone(),
                        episode: ep.clone(),
                    })
            })
            .collect()
    }

    /// Stored podcast names in insertion order.
    pub fn podcasts(&self) -> Vec<String> {
        self.read().values().map(|e| e.name.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self, podcast_name: &str) -> bool {
        self.write().shift_remove(&Self::key(podcast_name)).is_some()
    }

    pub fn clear_all(&self) {
        self.write().clear();
    }

    /// Listing of every stored episode, for seeding request context.
    ///
    /// Returns `None` when nothing is stored.
    pub fn context_summary(&self) -> Option<String> {
        let catalogs = self.read();
        if catalogs.is_empty() {
            return None;
        }

        let mut summary = String::from("Available podcast episodes:\n");
        for entry in catalogs.values() {
            summary.push_str(&format!("\n{}:\n", entry.name));
            for ep in &entry.episodes {
                let title = if ep.title.is_empty() { "Unknown Title" } else { &ep.title };
                let id = if ep.id.is_empty() { "Unknown ID" } else { &ep.id };
                summary.push_str(&format!("- {} (ID: {})\n", title, id));
            }
        }
        Some(summary)
    }
}

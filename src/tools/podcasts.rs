//! Podcast episode catalogs from the iTunes Search API.

use super::PodcastCatalog;
use crate::error::{AdapterError, AdapterResult};
use crate::memory::Episode;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument};
use url::Url;

const SEARCH_URL: &str = "https://itunes.apple.com/search";
const LOOKUP_URL: &str = "https://itunes.apple.com/lookup";

/// Apple Podcasts catalog client.
pub struct ApplePodcasts {
    client: reqwest::Client,
    country: String,
    episode_limit: u32,
}

#[derive(Debug, Deserialize)]
struct ItunesResponse {
    #[serde(default)]
    results: Vec<ItunesItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItunesItem {
    #[serde(default)]
    wrapper_type: Option<String>,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    collection_id: Option<u64>,
    #[serde(default)]
    collection_name: Option<String>,
    #[serde(default)]
    track_id: Option<u64>,
    #[serde(default)]
    track_name: Option<String>,
    #[serde(default)]
    short_description: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    track_time_millis: Option<u64>,
    #[serde(default)]
    track_view_url: Option<String>,
}

impl ItunesItem {
    fn is_episode(&self) -> bool {
        self.wrapper_type.as_deref() == Some("podcastEpisode")
            || self.kind.as_deref() == Some("podcast-episode")
    }

    fn into_episode(self) -> Episode {
        Episode {
            title: self.track_name.unwrap_or_default(),
            id: self.track_id.map(|id| id.to_string()).unwrap_or_default(),
            subtitle: self.short_description.filter(|s| !s.is_empty()),
            discussed_topics: self.description.filter(|s| !s.is_empty()),
            release_date: self
                .release_date
                .as_deref()
                .and_then(|d| DateTime::parse_from_rfc3339(d).ok())
                .map(|d| d.with_timezone(&Utc)),
            duration_seconds: self.track_time_millis.map(|ms| ms / 1000),
            url: self.track_view_url,
        }
    }
}

impl ApplePodcasts {
    pub fn new(country: &str, episode_limit: u32, timeout: Duration) -> AdapterResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdapterError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            country: country.to_string(),
            // the lookup endpoint caps episodes at 200
            episode_limit: episode_limit.clamp(1, 200),
        })
    }

    async fn get(&self, base: &str, params: &[(&str, &str)]) -> AdapterResult<ItunesResponse> {
        let url = Url::parse_with_params(base, params)
            .map_err(|e| AdapterError::InvalidArguments(format!("Bad request URL: {}", e)))?;

        let response = self.client.get(url).send().await?.error_for_status()?;
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| AdapterError::Malformed(format!("Unexpected iTunes response: {}", e)))
    }

    /// Resolve a podcast name to its collection id and canonical name.
    async fn find_podcast(&self, podcast_name: &str) -> AdapterResult<(u64, String)> {
        let response = self
            .get(
                SEARCH_URL,
                &[
                    ("term", podcast_name),
                    ("media", "podcast"),
                    ("entity", "podcast"),
                    ("limit", "1"),
                    ("country", self.country.as_str()),
                ],
            )
            .await?;

        response
            .results
            .into_iter()
            .find_map(|item| Some((item.collection_id?, item.collection_name.unwrap_or_default())))
            .ok_or_else(|| AdapterError::NotFound(format!("Podcast '{}'", podcast_name)))
    }

    async fn fetch_episodes(&self, collection_id: u64) -> AdapterResult<Vec<Episode>> {
        let id = collection_id.to_string();
        let limit = self.episode_limit.to_string();
        let response = self
            .get(
                LOOKUP_URL,
                &[
                    ("id", id.as_str()),
                    ("entity", "podcastEpisode"),
                    ("limit", limit.as_str()),
                    ("country", self.country.as_str()),
                ],
            )
            .await?;

        Ok(episodes_from(response))
    }
}

fn episodes_from(response: ItunesResponse) -> Vec<Episode> {
    response
        .results
        .into_iter()
        .filter(ItunesItem::is_episode)
        .map(ItunesItem::into_episode)
        .collect()
}

/// Episodes whose title contains `title_query`, or the whole catalog when none does.
fn narrow_by_title(episodes: Vec<Episode>, title_query: &str) -> Vec<Episode> {
    let needle = title_query.trim().to_lowercase();
    if needle.is_empty() {
        return episodes;
    }

    let matching: Vec<Episode> = episodes
        .iter()
        .filter(|ep| ep.title.to_lowercase().contains(&needle))
        .cloned()
        .collect();

    if matching.is_empty() {
        debug!("No title matches '{}', returning full catalog", title_query);
        episodes
    } else {
        matching
    }
}

#[async_trait]
impl PodcastCatalog for ApplePodcasts {
    #[instrument(skip(self))]
    async fn episodes_by_title(
        &self,
        podcast_name: &str,
        title_query: &str,
    ) -> AdapterResult<Vec<Episode>> {
        let podcast_name = podcast_name.trim();
        if podcast_name.is_empty() {
            return Err(AdapterError::InvalidArguments("Empty podcast name".to_string()));
        }

        let (collection_id, canonical_name) = self.find_podcast(podcast_name).await?;
        info!("Resolved '{}' to '{}' ({})", podcast_name, canonical_name, collection_id);

        let episodes = self.fetch_episodes(collection_id).await?;
        if episodes.is_empty() {
            return Err(AdapterError::NotFound(format!(
                "No episodes listed for '{}'",
                canonical_name
            )));
        }

        Ok(narrow_by_title(episodes, title_query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOOKUP_FIXTURE: &str = r#"{
        "resultCount": 3,
        "results": [
            {"wrapperType": "track", "kind": "podcast", "collectionId": 99, "collectionName": "PodcastX"},
            {"wrapperType": "podcastEpisode", "kind": "podcast-episode", "trackId": 1001,
             "trackName": "Rate Cuts Are Coming", "shortDescription": "What the Fed will do",
             "description": "Inflation, bond markets and the Fed", "releaseDate": "2024-09-18T10:00:00Z",
             "trackTimeMillis": 1830000, "trackViewUrl": "https://podcasts.apple.com/ep/1001"},
            {"wrapperType": "podcastEpisode", "trackId": 1002, "trackName": "Housing in 2024"}
        ]
    }"#;

    fn fixture_episodes() -> Vec<Episode> {
        episodes_from(serde_json::from_str(LOOKUP_FIXTURE).unwrap())
    }

    #[test]
    fn test_lookup_response_maps_episodes_only() {
        let episodes = fixture_episodes();
        assert_eq!(episodes.len(), 2);

        let first = &episodes[0];
        assert_eq!(first.id, "1001");
        assert_eq!(first.title, "Rate Cuts Are Coming");
        assert_eq!(first.subtitle.as_deref(), Some("What the Fed will do"));
        assert_eq!(
            first.discussed_topics.as_deref(),
            Some("Inflation, bond markets and the Fed")
        );
        assert_eq!(first.duration_seconds, Some(1830));
        assert!(first.release_date.is_some());

        assert!(episodes[1].subtitle.is_none());
    }

    #[test]
    fn test_narrow_by_title() {
        let narrowed = narrow_by_title(fixture_episodes(), "rate cuts");
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].id, "1001");

        // no match falls back to the full list
        assert_eq!(narrow_by_title(fixture_episodes(), "crypto").len(), 2);
        assert_eq!(narrow_by_title(fixture_episodes(), "").len(), 2);
    }

    #[tokio::test]
    async fn test_blank_podcast_name_is_invalid() {
        let catalog = ApplePodcasts::new("US", 50, Duration::from_secs(5)).unwrap();
        let err = catalog.episodes_by_title(" ", "x").await.unwrap_err();
        assert!(matches!(err, AdapterError::InvalidArguments(_)));
    }
}

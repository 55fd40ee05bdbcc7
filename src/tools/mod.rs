//! Data tools: external adapters and the memory-backed lookups agents can call.
//!
//! Adapters are opaque, fallible I/O. [`ToolContext::execute`] runs one parsed call
//! under a timeout and renders its result as text for the conversation; failures
//! come back as [`AdapterError`] for the dispatcher to turn into a tool message.

mod podcasts;
mod tavily;
mod youtube;

pub use podcasts::ApplePodcasts;
pub use tavily::TavilySearch;
pub use youtube::YoutubeSource;

use crate::error::{AdapterError, AdapterResult};
use crate::memory::{CatalogMemory, Episode};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};

/// A video search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoHit {
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
}

/// Plain-text transcript of a video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub video_id: String,
    pub title: String,
    pub url: String,
    pub text: String,
}

/// Web search provider.
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> AdapterResult<serde_json::Value>;
}

/// Video search and transcript retrieval.
#[async_trait]
pub trait VideoSource: Send + Sync {
    async fn search_videos(&self, query: &str) -> AdapterResult<Vec<VideoHit>>;

    /// Transcript of the video named by `query` (URL, ID, or search terms).
    async fn get_transcript(&self, query: &str) -> AdapterResult<Transcript>;
}

/// Podcast episode catalog.
#[async_trait]
pub trait PodcastCatalog: Send + Sync {
    async fn episodes_by_title(
        &self,
        podcast_name: &str,
        title_query: &str,
    ) -> AdapterResult<Vec<Episode>>;
}

/// The data tools an agent can be given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataTool {
    WebSearch,
    SearchVideos,
    GetTranscript,
    GetEpisodesByTitle,
    FindEpisode,
    SearchEpisodes,
}

impl DataTool {
    pub const ALL: [DataTool; 6] = [
        DataTool::WebSearch,
        DataTool::SearchVideos,
        DataTool::GetTranscript,
        DataTool::GetEpisodesByTitle,
        DataTool::FindEpisode,
        DataTool::SearchEpisodes,
    ];

    /// Function name exposed to the model.
    pub fn name(&self) -> &'static str {
        match self {
            DataTool::WebSearch => "web_search",
            DataTool::SearchVideos => "search_videos",
            DataTool::GetTranscript => "get_transcript",
            DataTool::GetEpisodesByTitle => "get_episodes_by_title",
            DataTool::FindEpisode => "find_episode",
            DataTool::SearchEpisodes => "search_episodes",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            DataTool::WebSearch => {
                "Search the web for current information. Returns ranked results with titles, URLs and content snippets."
            }
            DataTool::SearchVideos => {
                "Search YouTube for videos matching a query. Returns titles, URLs and IDs."
            }
            DataTool::GetTranscript => {
                "Get the transcript of a YouTube video. Accepts a video URL, a video ID, or a topic to search for."
            }
            DataTool::GetEpisodesByTitle => {
                "Fetch the episode list of a podcast by name, narrowed to episodes whose title contains the title query. \
                Returns the full list when no title matches."
            }
            DataTool::FindEpisode => {
                "Find an episode by title among podcasts fetched earlier in this session, without re-fetching."
            }
            DataTool::SearchEpisodes => {
                "Search titles, subtitles and topics of every episode fetched earlier in this session."
            }
        }
    }

    /// JSON schema of the arguments.
    pub fn parameters(&self) -> serde_json::Value {
        match self {
            DataTool::WebSearch => serde_json::json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "The search query" }
                },
                "required": ["query"]
            }),
            DataTool::SearchVideos => serde_json::json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "The video search query" }
                },
                "required": ["query"]
            }),
            DataTool::GetTranscript => serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Video URL, video ID, or a description of the video"
                    }
                },
                "required": ["query"]
            }),
            DataTool::GetEpisodesByTitle | DataTool::FindEpisode => serde_json::json!({
                "type": "object",
                "properties": {
                    "podcast_name": { "type": "string", "description": "Name of the podcast" },
                    "title": { "type": "string", "description": "Episode title or part of it" }
                },
                "required": ["podcast_name"]
            }),
            DataTool::SearchEpisodes => serde_json::json!({
                "type": "object",
                "properties": {
                    "query": { "type": "string", "description": "Words to look for" }
                },
                "required": ["query"]
            }),
        }
    }
}

impl std::fmt::Display for DataTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A data tool call with validated arguments.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    WebSearch { query: String },
    SearchVideos { query: String },
    GetTranscript { query: String },
    GetEpisodesByTitle { podcast_name: String, title: String },
    FindEpisode { podcast_name: String, title: String },
    SearchEpisodes { query: String },
}

impl ToolCall {
    pub fn tool(&self) -> DataTool {
        match self {
            ToolCall::WebSearch { .. } => DataTool::WebSearch,
            ToolCall::SearchVideos { .. } => DataTool::SearchVideos,
            ToolCall::GetTranscript { .. } => DataTool::GetTranscript,
            ToolCall::GetEpisodesByTitle { .. } => DataTool::GetEpisodesByTitle,
            ToolCall::FindEpisode { .. } => DataTool::FindEpisode,
            ToolCall::SearchEpisodes { .. } => DataTool::SearchEpisodes,
        }
    }
}

/// Parse and validate the JSON arguments of a data tool call.
pub fn parse_tool_call(tool: DataTool, arguments: &str) -> AdapterResult<ToolCall> {
    let args: serde_json::Value = if arguments.trim().is_empty() {
        serde_json::json!({})
    } else {
        serde_json::from_str(arguments)
            .map_err(|e| AdapterError::InvalidArguments(format!("Invalid tool arguments: {}", e)))?
    };

    match tool {
        DataTool::WebSearch => Ok(ToolCall::WebSearch {
            query: required_str(&args, "query")?,
        }),
        DataTool::SearchVideos => Ok(ToolCall::SearchVideos {
            query: required_str(&args, "query")?,
        }),
        DataTool::GetTranscript => Ok(ToolCall::GetTranscript {
            query: required_str(&args, "query")?,
        }),
        DataTool::GetEpisodesByTitle => Ok(ToolCall::GetEpisodesByTitle {
            podcast_name: required_str(&args, "podcast_name")?,
            title: optional_str(&args, "title"),
        }),
        DataTool::FindEpisode => Ok(ToolCall::FindEpisode {
            podcast_name: required_str(&args, "podcast_name")?,
            title: required_str(&args, "title")?,
        }),
        DataTool::SearchEpisodes => Ok(ToolCall::SearchEpisodes {
            query: required_str(&args, "query")?,
        }),
    }
}

fn required_str(args: &serde_json::Value, key: &str) -> AdapterResult<String> {
    args[key]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AdapterError::InvalidArguments(format!("Missing '{}' argument", key)))
}

fn optional_str(args: &serde_json::Value, key: &str) -> String {
    args[key].as_str().map(str::trim).unwrap_or_default().to_string()
}

/// Tool execution context with access to the external adapters.
pub struct ToolContext {
    pub web: Arc<dyn WebSearch>,
    pub videos: Arc<dyn VideoSource>,
    pub podcasts: Arc<dyn PodcastCatalog>,
    timeout: Duration,
}

impl ToolContext {
    /// Default per-call timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

    pub fn new(
        web: Arc<dyn WebSearch>,
        videos: Arc<dyn VideoSource>,
        podcasts: Arc<dyn PodcastCatalog>,
    ) -> Self {
        Self {
            web,
            videos,
            podcasts,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Execute a tool call and return the result as text.
    ///
    /// Fetched episode lists are stored in `memory` under the podcast name.
    #[instrument(skip(self, memory), fields(tool = %call.tool()))]
    pub async fn execute(&self, call: &ToolCall, memory: &CatalogMemory) -> AdapterResult<String> {
        match tokio::time::timeout(self.timeout, self.dispatch(call, memory)).await {
            Ok(result) => result,
            Err(_) => Err(AdapterError::Timeout {
                elapsed: self.timeout,
            }),
        }
    }

    async fn dispatch(&self, call: &ToolCall, memory: &CatalogMemory) -> AdapterResult<String> {
        match call {
            ToolCall::WebSearch { query } => {
                let results = self.web.search(query).await?;
                to_pretty_json(&results)
            }
            ToolCall::SearchVideos { query } => {
                let hits = self.videos.search_videos(query).await?;
                if hits.is_empty() {
                    return Ok(format!("No videos found for '{}'.", query));
                }
                Ok(format!("Found {} videos:\n{}", hits.len(), to_pretty_json(&hits)?))
            }
            ToolCall::GetTranscript { query } => {
                let transcript = self.videos.get_transcript(query).await?;
                Ok(format!(
                    "# {}\n\nVideo: {} ({})\n\n{}",
                    transcript.title, transcript.video_id, transcript.url, transcript.text
                ))
            }
            ToolCall::GetEpisodesByTitle { podcast_name, title } => {
                let episodes = self.podcasts.episodes_by_title(podcast_name, title).await?;
                info!("Fetched {} episodes of '{}'", episodes.len(), podcast_name);
                let rendered = to_pretty_json(&episodes)?;
                let count = episodes.len();
                memory.store(podcast_name, episodes);
                Ok(format!(
                    "Episodes of '{}' ({}):\n{}",
                    podcast_name, count, rendered
                ))
            }
            ToolCall::FindEpisode { podcast_name, title } => {
                match memory.find_by_title(podcast_name, title) {
                    Some(episode) => to_pretty_json(&episode),
                    None if memory.get_episodes(podcast_name).is_none() => {
                        Err(AdapterError::NotFound(format!(
                            "No episodes of '{}' have been fetched yet",
                            podcast_name
                        )))
                    }
                    None => Err(AdapterError::NotFound(format!(
                        "No episode of '{}' matches '{}'",
                        podcast_name, title
                    ))),
                }
            }
            ToolCall::SearchEpisodes { query } => {
                let matches = memory.search_all(query);
                if matches.is_empty() {
                    return Ok(format!("No stored episodes match '{}'.", query));
                }
                Ok(format!(
                    "Found {} episodes:\n{}",
                    matches.len(),
                    to_pretty_json(&matches)?
                ))
            }
        }
    }
}

fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> AdapterResult<String> {
    serde_json::to_string_pretty(value).map_err(|e| AdapterError::Malformed(e.to_string()))
}

/// In-memory adapters for tests.
#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use std::sync::Mutex;

    /// Adapters answering from fixed data and recording every call.
    #[derive(Default)]
    pub struct StaticSources {
        pub web_result: Option<serde_json::Value>,
        pub videos: Vec<VideoHit>,
        pub transcript: Option<Transcript>,
        pub episodes: Vec<Episode>,
        pub delay: Option<Duration>,
        pub calls: Mutex<Vec<String>>,
    }

    impl StaticSources {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        pub fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        async fn maybe_wait(&self) {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
        }
    }

    #[async_trait]
    impl WebSearch for StaticSources {
        async fn search(&self, query: &str) -> AdapterResult<serde_json::Value> {
            self.record(format!("web_search({})", query));
            self.maybe_wait().await;
            self.web_result
                .clone()
                .ok_or_else(|| AdapterError::Network("search provider unreachable".to_string()))
        }
    }

    #[async_trait]
    impl VideoSource for StaticSources {
        async fn search_videos(&self, query: &str) -> AdapterResult<Vec<VideoHit>> {
            self.record(format!("search_videos({})", query));
            self.maybe_wait().await;
            Ok(self.videos.clone())
        }

        async fn get_transcript(&self, query: &str) -> AdapterResult<Transcript> {
            self.record(format!("get_transcript({})", query));
            self.maybe_wait().await;
            self.transcript
                .clone()
                .ok_or_else(|| AdapterError::NotFound(format!("No transcript for '{}'", query)))
        }
    }

    #[async_trait]
    impl PodcastCatalog for StaticSources {
        async fn episodes_by_title(
            &self,
            podcast_name: &str,
            title_query: &str,
        ) -> AdapterResult<Vec<Episode>> {
            self.record(format!("episodes_by_title({}, {})", podcast_name, title_query));
            self.maybe_wait().await;
            if self.episodes.is_empty() {
                return Err(AdapterError::NotFound(format!("Podcast '{}'", podcast_name)));
            }
            Ok(self.episodes.clone())
        }
    }

    /// A tool context whose adapters all share `sources`.
    pub fn context(sources: Arc<StaticSources>) -> ToolContext {
        ToolContext::new(sources.clone(), sources.clone(), sources)
    }
}

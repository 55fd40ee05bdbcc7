//! Wiring for Switchboard.
//!
//! Builds the registry, backend and adapters from settings once, then hands
//! out sessions that share them.

use crate::agent::{AgentRegistry, Dispatcher};
use crate::backend::{ModelBackend, OpenAIBackend};
use crate::config::{MemoryScope, Prompts, Settings};
use crate::error::Result;
use crate::memory::CatalogMemory;
use crate::session::Session;
use crate::tools::{ApplePodcasts, TavilySearch, ToolContext, YoutubeSource};
use std::sync::Arc;
use tracing::{info, instrument};

/// Entry point that owns the shared components.
pub struct Orchestrator {
    settings: Settings,
    dispatcher: Arc<Dispatcher>,
    shared_memory: Arc<CatalogMemory>,
}

impl Orchestrator {
    /// Create an orchestrator with the OpenAI backend and the network adapters.
    #[instrument(skip_all)]
    pub fn new(settings: Settings) -> Result<Self> {
        // Load prompts (with optional custom directory and variables)
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;

        let registry = Arc::new(AgentRegistry::standard(&prompts)?);
        let backend: Arc<dyn ModelBackend> = Arc::new(OpenAIBackend::new(&settings.backend)?);

        let temp_dir = settings.temp_dir();
        std::fs::create_dir_all(&temp_dir)?;

        let timeout = settings.dispatcher.tool_timeout();
        let web = TavilySearch::new(
            settings.tools.tavily_key(),
            &settings.tools.search_depth,
            timeout,
        )?;
        let videos = YoutubeSource::new(
            settings.tools.max_video_results,
            &settings.tools.transcript_language,
            temp_dir,
        );
        let podcasts = ApplePodcasts::new(
            &settings.tools.podcast_country,
            settings.tools.episode_limit,
            timeout,
        )?;
        let tools = ToolContext::new(Arc::new(web), Arc::new(videos), Arc::new(podcasts))
            .with_timeout(timeout);

        info!(
            "Using {} with {} agents (memory scope: {})",
            settings.backend.model,
            registry.len(),
            settings.memory.scope
        );

        Ok(Self::with_components(
            settings,
            &prompts,
            registry,
            backend,
            Arc::new(tools),
        ))
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        prompts: &Prompts,
        registry: Arc<AgentRegistry>,
        backend: Arc<dyn ModelBackend>,
        tools: Arc<ToolContext>,
    ) -> Self {
        let dispatcher = Dispatcher::new(registry, backend, tools)
            .with_orchestration(&prompts.render_custom(&prompts.orchestration))
            .with_max_steps(settings.dispatcher.max_steps)
            .with_max_retries(settings.backend.max_retries);

        Self {
            settings,
            dispatcher: Arc::new(dispatcher),
            shared_memory: Arc::new(CatalogMemory::new()),
        }
    }

    /// Start a new session.
    ///
    /// With `session` scope the session gets its own catalog memory; with
    /// `global` scope every session shares one.
    pub fn session(&self) -> Session {
        let memory = match self.settings.memory.scope {
            MemoryScope::Global => self.shared_memory.clone(),
            MemoryScope::Session => Arc::new(CatalogMemory::new()),
        };
        Session::new(
            self.dispatcher.clone(),
            memory,
            self.settings.dispatcher.history_capacity,
        )
    }

    pub fn registry(&self) -> &AgentRegistry {
        self.dispatcher.registry()
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }
}

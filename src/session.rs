//! Conversation sessions and the in-memory session store.

use crate::agent::{DispatchOutcome, Dispatcher};
use crate::conversation::{ConversationHistory, Role};
use crate::error::{Result, SwitchboardError};
use crate::memory::CatalogMemory;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// One user's conversation: its history window and a handle to catalog memory.
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    history: ConversationHistory,
    memory: Arc<CatalogMemory>,
    dispatcher: Arc<Dispatcher>,
}

impl Session {
    pub fn new(dispatcher: Arc<Dispatcher>, memory: Arc<CatalogMemory>, history_capacity: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            history: ConversationHistory::new(history_capacity),
            memory,
            dispatcher,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    pub fn memory(&self) -> &Arc<CatalogMemory> {
        &self.memory
    }

    /// Answer a question, recording it and the answer in the history.
    #[instrument(skip(self, question), fields(session = %self.id))]
    pub async fn ask(&mut self, question: &str) -> Result<DispatchOutcome> {
        let question = question.trim();
        if question.is_empty() {
            return Err(SwitchboardError::InvalidInput("Question must not be empty".to_string()));
        }

        self.history.add(Role::User, question);
        let outcome = self.dispatcher.run(&self.history, &self.memory).await;
        self.history.add(Role::Assistant, outcome.answer.clone());

        info!(
            "Answered via {} in {} steps ({} tool calls)",
            outcome.agents.join(" -> "),
            outcome.steps,
            outcome.tool_calls.len()
        );
        Ok(outcome)
    }

    /// Answer a question and return only the text.
    pub async fn answer(&mut self, question: &str) -> Result<String> {
        Ok(self.ask(question).await?.answer)
    }

    /// Forget the conversation. Catalog memory is left alone.
    pub fn clear(&mut self) {
        debug!("Clearing history of session {}", self.id);
        self.history.clear();
    }
}

type SharedSession = Arc<Mutex<Session>>;

/// Live sessions by id.
///
/// Each session sits behind its own async mutex: requests on one session run
/// one at a time, requests on different sessions run concurrently.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SharedSession>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, session: Session) -> Uuid {
        let id = session.id();
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(Mutex::new(session)));
        id
    }

    pub fn get(&self, id: &Uuid) -> Result<SharedSession> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
            .ok_or_else(|| SwitchboardError::SessionNotFound(id.to_string()))
    }

    /// Drop a session. Returns false if it did not exist.
    pub fn remove(&self, id: &Uuid) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::AgentRegistry;
    use crate::backend::scripted::ScriptedBackend;
    use crate::backend::BackendReply;
    use crate::config::Prompts;
    use crate::tools::fakes::{context, StaticSources};
    use std::time::Duration;

    fn echo_dispatcher() -> Arc<Dispatcher> {
        let backend = ScriptedBackend::from_fn(|_, messages| {
            let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
            Ok(BackendReply::Text(format!("echo: {}", last)))
        });
        Arc::new(Dispatcher::new(
            Arc::new(AgentRegistry::standard(&Prompts::default()).unwrap()),
            Arc::new(backend),
            Arc::new(context(Arc::new(StaticSources::default()))),
        ))
    }

    fn session() -> Session {
        Session::new(echo_dispatcher(), Arc::new(CatalogMemory::new()), 10)
    }

    #[tokio::test]
    async fn test_answer_appends_question_and_answer() {
        let mut session = session();
        let answer = session.answer("  hello  ").await.unwrap();

        assert_eq!(answer, "echo: hello");
        let history = session.history().snapshot();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].content, "hello");
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].content, "echo: hello");
    }

    #[tokio::test]
    async fn test_empty_question_rejected() {
        let mut session = session();
        let err = session.answer("   ").await.unwrap_err();
        assert!(matches!(err, SwitchboardError::InvalidInput(_)));
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_clear_keeps_memory() {
        let mut session = session();
        session.memory().store("PodcastX", Vec::new());
        session.answer("hi").await.unwrap();

        session.clear();
        assert!(session.history().is_empty());
        assert!(!session.memory().is_empty());
    }

    #[tokio::test]
    async fn test_store_get_and_remove() {
        let store = SessionStore::new();
        let id = store.insert(session());

        let shared = store.get(&id).unwrap();
        shared.lock().await.answer("hi").await.unwrap();
        assert_eq!(store.get(&id).unwrap().lock().await.history().len(), 2);

        assert!(store.remove(&id));
        assert!(!store.remove(&id));
        assert!(matches!(store.get(&id), Err(SwitchboardError::SessionNotFound(_))));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_independent_sessions_run_concurrently() {
        let store = Arc::new(SessionStore::new());
        let slow = Arc::new(Dispatcher::new(
            Arc::new(AgentRegistry::standard(&Prompts::default()).unwrap()),
            Arc::new(ScriptedBackend::from_fn(|_, _| Ok(BackendReply::Text("done".to_string())))),
            Arc::new(context(Arc::new(StaticSources::default()))),
        ));

        let ids: Vec<Uuid> = (0..4)
            .map(|_| store.insert(Session::new(slow.clone(), Arc::new(CatalogMemory::new()), 10)))
            .collect();

        let mut handles = Vec::new();
        for id in &ids {
            let session = store.get(id).unwrap();
            handles.push(tokio::spawn(async move {
                let mut session = session.lock().await;
                session.answer("go").await
            }));
        }

        for handle in handles {
            let answer = tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .unwrap()
                .unwrap()
                .unwrap();
            assert_eq!(answer, "done");
        }
        assert_eq!(store.len(), 4);
    }
}

//! Study application
//!
//! Ties the dispatcher, the document store and the study features together.

use crate::api::ModelInfo;
use crate::client::{GeminiClient, ModelBackend};
use crate::config::Settings;
use crate::error::{OrbitError, Result};
use crate::router::{Dispatcher, KeyPool};
use crate::store::{ArchivedSession, ChatMessage, ConfigStore, SaveTarget, StudyDocument};
use crate::study::{archive_active_session, chat_prompt, parse_questions, Quiz, QuizPlan};
use chrono::Local;
use tracing::{error, info};

/// One user's study session over a model backend
pub struct StudyApp<B> {
    dispatcher: Dispatcher<B>,
    store: ConfigStore,
    document: StudyDocument,

    /// Messages of the chat in progress, including unanswered questions
    session: Vec<ChatMessage>,
}

impl StudyApp<GeminiClient> {
    /// Build the Gemini-backed app from settings and load the document
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let pool = KeyPool::new(settings.credentials()?)?;
        let backend = GeminiClient::new(settings.model.api_base.clone())?;
        let dispatcher = Dispatcher::new(
            backend,
            pool,
            settings.dispatch.clone(),
            settings.model.clone(),
        );
        let store = ConfigStore::from_settings(settings)?;
        Self::open(dispatcher, store).await
    }
}

impl<B: ModelBackend> StudyApp<B> {
    /// Load the document from `store`, starting fresh when none exists
    pub async fn open(dispatcher: Dispatcher<B>, store: ConfigStore) -> Result<Self> {
        let document = match store.load().await? {
            Some(doc) => doc,
            None => {
                info!("no study document found, starting a new profile");
                StudyDocument::default()
            }
        };
        Ok(Self::new(dispatcher, store, document))
    }

    pub fn new(dispatcher: Dispatcher<B>, store: ConfigStore, document: StudyDocument) -> Self {
        let session = document.active_session.clone();
        Self {
            dispatcher,
            store,
            document,
            session,
        }
    }

    pub fn document(&self) -> &StudyDocument {
        &self.document
    }

    pub fn dispatcher(&self) -> &Dispatcher<B> {
        &self.dispatcher
    }

    pub fn session(&self) -> &[ChatMessage] {
        &self.session
    }

    pub fn archives(&self) -> &[ArchivedSession] {
        &self.document.archived_sessions
    }

    /// Save the document; failures are logged and reported as `None`
    pub async fn persist(&self) -> Option<SaveTarget> {
        match self.store.save(&self.document).await {
            Ok(target) => Some(target),
            Err(e) => {
                error!(error = %e, "failed to save study document");
                None
            }
        }
    }

    /// Send a chat message. `None` when the model gave no answer; the
    /// question then stays in the session but is not saved.
    pub async fn ask(&mut self, question: &str) -> Option<String> {
        self.session.push(ChatMessage::user(question));
        let prompt = chat_prompt(&self.document, &self.session, question);

        let reply = self
            .dispatcher
            .dispatch(&prompt)
            .await
            .filter(|text| !text.trim().is_empty())?;

        self.session.push(ChatMessage::assistant(reply.clone()));
        self.document.active_session = self.session.clone();
        self.persist().await;
        Some(reply)
    }

    /// Archive the current chat and start a new one. False when the chat
    /// was empty.
    pub async fn new_chat(&mut self) -> bool {
        if self.session.is_empty() {
            return false;
        }

        self.document.active_session = std::mem::take(&mut self.session);
        archive_active_session(&mut self.document, Local::now().naive_local());
        self.persist().await;
        true
    }

    /// Roll a plan for the next quiz
    pub fn plan_quiz(&self, entropy: u64) -> Result<QuizPlan> {
        QuizPlan::roll(&self.document.current_units, entropy)
    }

    /// Generate the quiz for `plan`
    pub async fn generate_quiz(&mut self, plan: &QuizPlan) -> Result<Quiz> {
        let prompt = plan.prompt(&self.document.difficulty);
        let text = self
            .dispatcher
            .dispatch(&prompt)
            .await
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| OrbitError::Response("AI returned silence.".to_string()))?;

        Ok(Quiz {
            unit: plan.unit.clone(),
            questions: parse_questions(&text)?,
        })
    }

    /// Add units to the loadout, saving only when something changed
    pub async fn add_units(&mut self, units: &[String]) -> bool {
        let changed = self.document.add_units(units);
        if changed {
            self.persist().await;
        }
        changed
    }

    pub async fn drop_unit(&mut self, unit: &str) -> bool {
        let changed = self.document.drop_unit(unit);
        if changed {
            self.persist().await;
        }
        changed
    }

    pub async fn set_difficulty(&mut self, input: &str) -> Result<bool> {
        let changed = self.document.set_difficulty(input)?;
        if changed {
            self.persist().await;
        }
        Ok(changed)
    }

    pub async fn set_interests(&mut self, text: &str) {
        self.document.set_interests_from(text);
        self.persist().await;
    }

    /// Models the backend offers to the active key
    pub async fn catalog(&self) -> Result<Vec<ModelInfo>> {
        let credential = self.dispatcher.pool().current().value();
        self.dispatcher
            .backend()
            .list_models(credential)
            .await
            .map_err(|e| OrbitError::Request(e.to_string()))
    }

    /// Model used for this session
    pub async fn model_name(&mut self) -> String {
        self.dispatcher.resolve_model_name().await
    }
}

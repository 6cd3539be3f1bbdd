//! Request Dispatcher
//!
//! Sends prompts through the active model handle, rotating keys on quota and
//! auth failures and retrying transient ones in place.

use crate::client::{classify, ModelBackend};
use crate::config::{DispatchSettings, ModelSettings};
use crate::router::key_pool::{KeyPool, KeyPoolStats};
use crate::router::model_select::select_model;
use tracing::{debug, info, warn};

/// A model name bound to one credential
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelHandle {
    /// Pool index of the bound key
    pub key_index: usize,

    /// Bound key value
    pub credential: String,

    /// Resolved model name
    pub model: String,
}

impl ModelHandle {
    /// Bind `model` to the pool's active key
    pub fn bind(pool: &KeyPool, model: &str) -> Self {
        Self {
            key_index: pool.cursor(),
            credential: pool.current().value().to_string(),
            model: model.to_string(),
        }
    }
}

/// Session-scoped dispatcher. Owns the key pool, the cached model name and the
/// active handle; one prompt is in flight at a time.
pub struct Dispatcher<B> {
    backend: B,
    pool: KeyPool,
    settings: DispatchSettings,
    model_settings: ModelSettings,

    /// Resolved once per session
    model_name: Option<String>,

    /// Rebuilt on rotation and on model resolution
    handle: Option<ModelHandle>,
}

impl<B: ModelBackend> Dispatcher<B> {
    /// Create a dispatcher at cursor 0. A pinned model in `model_settings`
    /// skips the catalog probe.
    pub fn new(
        backend: B,
        pool: KeyPool,
        settings: DispatchSettings,
        model_settings: ModelSettings,
    ) -> Self {
        let mut dispatcher = Self {
            backend,
            pool,
            settings,
            model_name: model_settings.pinned.clone(),
            model_settings,
            handle: None,
        };
        dispatcher.rebind();
        dispatcher
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn pool(&self) -> &KeyPool {
        &self.pool
    }

    pub fn stats(&self) -> KeyPoolStats {
        self.pool.stats()
    }

    /// The cached model name, if resolution has happened
    pub fn model_name(&self) -> Option<&str> {
        self.model_name.as_deref()
    }

    pub fn handle(&self) -> Option<&ModelHandle> {
        self.handle.as_ref()
    }

    fn rebind(&mut self) {
        if let Some(model) = &self.model_name {
            self.handle = Some(ModelHandle::bind(&self.pool, model));
        }
    }

    /// Probe the catalog once and cache the chosen model for the session.
    /// Probe failures fall back to the configured default.
    pub async fn resolve_model_name(&mut self) -> String {
        if let Some(name) = &self.model_name {
            return name.clone();
        }

        let credential = self.pool.current().value().to_string();
        let name = match self.backend.list_models(&credential).await {
            Ok(catalog) => select_model(&catalog, &self.model_settings),
            Err(e) => {
                warn!(error = %e, "model catalog probe failed, using fallback");
                self.model_settings.fallback.clone()
            }
        };

        info!(model = %name, "resolved session model");
        self.model_name = Some(name.clone());
        self.rebind();
        name
    }

    /// Move to the next key and rebind the handle. False when the pool has
    /// no other key.
    pub fn rotate(&mut self) -> bool {
        let from = self.pool.current().masked();
        if !self.pool.rotate() {
            warn!(key = %from, "no backup keys available");
            return false;
        }

        self.rebind();
        info!(
            from = %from,
            to = %self.pool.current().masked(),
            index = self.pool.cursor() + 1,
            "swapped to next API key"
        );
        true
    }

    /// Send `prompt` and return the response text, or `None` once the key
    /// pool or the attempt budget is exhausted.
    pub async fn dispatch(&mut self, prompt: &str) -> Option<String> {
        let model = self.resolve_model_name().await;
        let max_attempts = self.pool.len() + self.settings.extra_attempts as usize;
        let delay = self.settings.rotation_delay();

        for attempt in 0..max_attempts {
            let handle = match &self.handle {
                Some(handle) => handle.clone(),
                None => ModelHandle::bind(&self.pool, &model),
            };
            let remaining = attempt + 1 < max_attempts;

            self.pool.record_request();
            debug!(attempt, key_index = handle.key_index, model = %handle.model, "dispatching prompt");

            let err = match self
                .backend
                .generate(&handle.credential, &handle.model, prompt)
                .await
            {
                Ok(text) => return Some(text),
                Err(e) => e,
            };

            let class = classify(&err);
            warn!(attempt, class = %class, error = %err, "model request failed");

            if class.should_rotate() {
                self.pool.record_failure();
                if !self.rotate() {
                    return None;
                }
            } else if !remaining {
                return None;
            }

            if remaining && !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        warn!(attempts = max_attempts, "attempt budget exhausted");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ModelInfo;
    use crate::client::BackendError;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Backend that replays a fixed script of generation results
    #[derive(Default)]
    struct ScriptedBackend {
        catalog: Option<Vec<ModelInfo>>,
        script: Mutex<VecDeque<Result<String, BackendError>>>,
        calls: Mutex<Vec<(String, String)>>,
        probes: Mutex<u32>,
    }

    impl ScriptedBackend {
        fn new(script: Vec<Result<String, BackendError>>) -> Self {
            Self {
                catalog: Some(vec![
                    ModelInfo::new("models/gemini-1.5-flash-latest", &["generateContent"]),
                    ModelInfo::new("models/gemini-1.5-flash", &["generateContent"]),
                ]),
                script: Mutex::new(script.into()),
                ..Default::default()
            }
        }

        fn credentials_used(&self) -> Vec<String> {
            self.calls.lock().unwrap().iter().map(|(c, _)| c.clone()).collect()
        }
    }

    #[async_trait]
    impl ModelBackend for ScriptedBackend {
        async fn list_models(&self, _credential: &str) -> Result<Vec<ModelInfo>, BackendError> {
            *self.probes.lock().unwrap() += 1;
            self.catalog
                .clone()
                .ok_or_else(|| BackendError::transport("catalog unavailable"))
        }

        async fn generate(
            &self,
            credential: &str,
            model: &str,
            _prompt: &str,
        ) -> Result<String, BackendError> {
            self.calls
                .lock()
                .unwrap()
                .push((credential.to_string(), model.to_string()));
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(BackendError::transport("script exhausted")))
        }
    }

    fn quota() -> Result<String, BackendError> {
        Err(BackendError::http(
            429,
            Some("RESOURCE_EXHAUSTED".to_string()),
            "quota exceeded",
        ))
    }

    fn server_error() -> Result<String, BackendError> {
        Err(BackendError::http(500, Some("INTERNAL".to_string()), "internal"))
    }

    fn dispatcher(keys: &[&str], backend: ScriptedBackend) -> Dispatcher<ScriptedBackend> {
        let pool = KeyPool::new(keys.iter().map(|k| k.to_string()).collect()).unwrap();
        let settings = DispatchSettings {
            rotation_delay_ms: 0,
            extra_attempts: 1,
        };
        Dispatcher::new(backend, pool, settings, ModelSettings::default())
    }

    #[tokio::test]
    async fn test_first_attempt_success() {
        let mut d = dispatcher(&["k0", "k1"], ScriptedBackend::new(vec![Ok("answer".into())]));

        assert_eq!(d.dispatch("q").await.as_deref(), Some("answer"));
        assert_eq!(d.stats().rotations, 0);
        assert_eq!(d.backend().credentials_used(), vec!["k0"]);
    }

    #[tokio::test]
    async fn test_quota_on_every_key_exhausts_budget() {
        let script = (0..10).map(|_| quota()).collect();
        let mut d = dispatcher(&["k0", "k1", "k2"], ScriptedBackend::new(script));

        assert_eq!(d.dispatch("q").await, None);
        assert_eq!(d.backend().credentials_used(), vec!["k0", "k1", "k2", "k0"]);
        assert_eq!(d.stats().rotations, 4);
        assert_eq!(d.pool().cursor(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_attempts_but_not_after_last() {
        let pool = KeyPool::new(vec!["k0".to_string(), "k1".to_string()]).unwrap();
        let script = (0..10).map(|_| quota()).collect();
        let mut d = Dispatcher::new(
            ScriptedBackend::new(script),
            pool,
            DispatchSettings::default(),
            ModelSettings::default(),
        );

        let start = tokio::time::Instant::now();
        assert_eq!(d.dispatch("q").await, None);

        assert_eq!(d.backend().credentials_used().len(), 3);
        assert_eq!(start.elapsed(), std::time::Duration::from_secs(2));
        assert_eq!(d.stats().rotations, 3);
        assert_eq!(d.pool().cursor(), 1);
    }

    #[tokio::test]
    async fn test_transient_then_success_keeps_key() {
        let backend = ScriptedBackend::new(vec![server_error(), Ok("second try".into())]);
        let mut d = dispatcher(&["k0", "k1"], backend);

        assert_eq!(d.dispatch("q").await.as_deref(), Some("second try"));
        assert_eq!(d.stats().rotations, 0);
        assert_eq!(d.backend().credentials_used(), vec!["k0", "k0"]);
    }

    #[tokio::test]
    async fn test_single_key_quota_is_terminal() {
        let mut d = dispatcher(&["only"], ScriptedBackend::new(vec![quota(), Ok("x".into())]));

        assert_eq!(d.dispatch("q").await, None);
        assert_eq!(d.backend().credentials_used().len(), 1);
        assert_eq!(d.pool().cursor(), 0);
    }

    #[tokio::test]
    async fn test_transient_failures_exhaust_budget_without_rotation() {
        let script = (0..5).map(|_| server_error()).collect();
        let mut d = dispatcher(&["k0", "k1"], ScriptedBackend::new(script));

        assert_eq!(d.dispatch("q").await, None);
        assert_eq!(d.backend().credentials_used(), vec!["k0", "k0", "k0"]);
        assert_eq!(d.stats().rotations, 0);
    }

    #[tokio::test]
    async fn test_auth_failure_rotates_to_next_key() {
        let leaked = Err(BackendError::http(
            403,
            Some("PERMISSION_DENIED".to_string()),
            "Your API key was reported as leaked",
        ));
        let backend = ScriptedBackend::new(vec![leaked, Ok("from k1".into())]);
        let mut d = dispatcher(&["k0", "k1"], backend);

        assert_eq!(d.dispatch("q").await.as_deref(), Some("from k1"));
        assert_eq!(d.backend().credentials_used(), vec!["k0", "k1"]);
        assert_eq!(d.handle().unwrap().key_index, 1);
    }

    #[tokio::test]
    async fn test_model_resolved_once_per_session() {
        let backend = ScriptedBackend::new(vec![quota(), Ok("a".into()), Ok("b".into())]);
        let mut d = dispatcher(&["k0", "k1"], backend);

        d.dispatch("one").await;
        d.dispatch("two").await;

        assert_eq!(*d.backend().probes.lock().unwrap(), 1);
        assert_eq!(d.model_name(), Some("gemini-1.5-flash"));
        let models: Vec<_> = d
            .backend()
            .calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, m)| m.clone())
            .collect();
        assert!(models.iter().all(|m| m == "gemini-1.5-flash"));
    }

    #[tokio::test]
    async fn test_probe_failure_uses_fallback() {
        let backend = ScriptedBackend {
            catalog: None,
            ..ScriptedBackend::new(vec![])
        };
        let mut d = dispatcher(&["k0"], backend);

        assert_eq!(d.resolve_model_name().await, "gemini-1.5-flash");
        assert_eq!(d.handle().unwrap().model, "gemini-1.5-flash");
    }

    #[tokio::test]
    async fn test_pinned_model_skips_probe() {
        let pool = KeyPool::new(vec!["k0".to_string()]).unwrap();
        let model_settings = ModelSettings {
            pinned: Some("gemini-1.5-pro".to_string()),
            ..ModelSettings::default()
        };
        let mut d = Dispatcher::new(
            ScriptedBackend::new(vec![Ok("ok".into())]),
            pool,
            DispatchSettings::default(),
            model_settings,
        );

        assert_eq!(d.dispatch("q").await.as_deref(), Some("ok"));
        assert_eq!(*d.backend().probes.lock().unwrap(), 0);
    }
}

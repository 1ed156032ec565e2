//! Memoized advice requests and the loading/error view the shell displays.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::fetcher::AdviceFetcher;
use crate::models::{AdviceResult, CacheKey, PersonaProfile, UserProfile};
use crate::prompt::PromptBuilder;

/// User-facing message shown when a fetch fails
pub const DEFAULT_ERROR_MESSAGE: &str = "无法生成计划，请检查网络连接或稍后重试。";

/// What a call to [`AdviceOrchestrator::request`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A result was already cached; nothing was sent
    Cached,
    /// A fetch completed and its result was cached
    Fetched,
    /// A fetch failed; the error flag is set and nothing was cached
    Failed,
}

/// Snapshot of request state for one (persona, profile) combination
#[derive(Debug, Clone, Default)]
pub struct AdviceView {
    pub loading: bool,
    pub error: Option<String>,
    pub result: Option<Arc<AdviceResult>>,
}

/// What the shell should show, in precedence order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Display<'a> {
    Loading,
    Failed(&'a str),
    Ready(&'a AdviceResult),
    Idle,
}

impl AdviceView {
    pub fn display(&self, persona: &PersonaProfile) -> Display<'_> {
        let stale = self
            .result
            .as_ref()
            .is_none_or(|r| r.persona_name != persona.name);
        if self.loading && stale {
            return Display::Loading;
        }
        if let Some(error) = &self.error {
            return Display::Failed(error);
        }
        match &self.result {
            Some(result) => Display::Ready(result),
            None => Display::Idle,
        }
    }
}

#[derive(Debug, Default)]
struct RequestState {
    in_flight: usize,
    error: Option<String>,
}

/// One async lock per key with a request in progress
#[derive(Default)]
struct InFlight {
    locks: Mutex<HashMap<CacheKey, Arc<Mutex<()>>>>,
}

impl InFlight {
    async fn acquire(&self, key: &CacheKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(key.clone()).or_default())
        };
        lock.lock_owned().await
    }

    async fn release(&self, key: &CacheKey, guard: OwnedMutexGuard<()>) {
        drop(guard);
        let mut locks = self.locks.lock().await;
        // Only the map still references the lock: nobody is waiting on this key
        if locks.get(key).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(key);
        }
    }
}

pub struct AdviceOrchestrator {
    fetcher: Arc<dyn AdviceFetcher>,
    prompts: PromptBuilder,
    cache: RwLock<HashMap<CacheKey, Arc<AdviceResult>>>,
    state: Mutex<RequestState>,
    in_flight: InFlight,
    single_flight: bool,
    error_message: String,
}

impl AdviceOrchestrator {
    pub fn new(fetcher: Arc<dyn AdviceFetcher>) -> Self {
        Self {
            fetcher,
            prompts: PromptBuilder::new(),
            cache: RwLock::new(HashMap::new()),
            state: Mutex::new(RequestState::default()),
            in_flight: InFlight::default(),
            single_flight: true,
            error_message: DEFAULT_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn with_prompt_builder(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    /// When disabled, concurrent requests for one key each fetch and the last
    /// to resolve owns the cache entry.
    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    pub fn with_error_message(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    /// Fetch advice for this combination unless a result is already cached.
    /// Failures are recorded in the view, never returned.
    pub async fn request(&self, persona: &PersonaProfile, profile: &UserProfile) -> RequestOutcome {
        let key = CacheKey::new(persona, profile);
        if self.is_cached(&key).await {
            tracing::debug!("Advice cache hit for {}", key);
            return RequestOutcome::Cached;
        }

        if !self.single_flight {
            return self.fetch_and_store(persona, profile, key).await;
        }

        let guard = self.in_flight.acquire(&key).await;
        // A request for the same key may have finished while we waited
        let outcome = if self.is_cached(&key).await {
            tracing::debug!("Advice for {} arrived while waiting", key);
            RequestOutcome::Cached
        } else {
            self.fetch_and_store(persona, profile, key.clone()).await
        };
        self.in_flight.release(&key, guard).await;
        outcome
    }

    /// Current loading flag, error message, and the cached result for this key
    pub async fn current_view(
        &self,
        persona: &PersonaProfile,
        profile: &UserProfile,
    ) -> AdviceView {
        let key = CacheKey::new(persona, profile);
        let result = self.cache.read().await.get(&key).cloned();
        let state = self.state.lock().await;
        AdviceView {
            loading: state.in_flight > 0,
            error: state.error.clone(),
            result,
        }
    }

    pub async fn cached_len(&self) -> usize {
        self.cache.read().await.len()
    }

    async fn is_cached(&self, key: &CacheKey) -> bool {
        self.cache.read().await.contains_key(key)
    }

    async fn fetch_and_store(
        &self,
        persona: &PersonaProfile,
        profile: &UserProfile,
        key: CacheKey,
    ) -> RequestOutcome {
        {
            let mut state = self.state.lock().await;
            state.in_flight += 1;
            state.error = None;
        }

        tracing::info!("Fetching advice for {}", key);
        let prompt = self
            .prompts
            .build(&persona.name, profile, persona.description.as_deref());

        let outcome = match self.fetcher.fetch(&persona.name, &prompt).await {
            Ok(result) => {
                self.cache.write().await.insert(key, Arc::new(result));
                RequestOutcome::Fetched
            }
            Err(e) => {
                tracing::error!("Advice fetch failed for {}: {}", key, e);
                if e.is_api() {
                    tracing::warn!("Check GEMINI_API_KEY and quota for the configured model");
                }
                self.state.lock().await.error = Some(self.error_message.clone());
                RequestOutcome::Failed
            }
        };

        let mut state = self.state.lock().await;
        state.in_flight = state.in_flight.saturating_sub(1);
        outcome
    }
}

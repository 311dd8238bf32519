//! API Handlers
//!
//! HTTP request handlers for the booking wizard and the read-through cache.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, RawQuery, State},
    Json,
};
use serde_json::Value;

use crate::api_cache::{request_signature, ReadThroughCache, TtlPolicy, UpstreamClient};
use crate::booking::{
    BookingSubmitter, BookingWizard, RetryPolicy, SessionSummary, SimulatedSubmitter, StepId,
    StepRecord, WizardSettings,
};
use crate::cache::{
    shared, Clock, ExpiringStore, FileStorage, MemoryStorage, Namespace, SharedStore, SystemClock,
};
use crate::config::Config;
use crate::error::{BookingError, Result};
use crate::models::{
    validate_namespace, validate_session_id, CloseResponse, HealthResponse, InvalidateRequest,
    InvalidateResponse, NavigationResponse, SessionQuery, StatsResponse, StepResponse,
    SubmitResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Store holding session drafts and cached API reads
    pub store: SharedStore,
    pub clock: Arc<dyn Clock>,
    pub wizard: WizardSettings,
    pub retry: RetryPolicy,
    pub submitter: Arc<dyn BookingSubmitter>,
    pub api_cache: ReadThroughCache,
    /// Studio backend; cached reads answer 503 without one
    pub upstream: Option<UpstreamClient>,
}

impl AppState {
    /// Creates state over `store` with default wizard, retry and cache settings.
    pub fn new(store: ExpiringStore, submitter: Arc<dyn BookingSubmitter>) -> Self {
        let clock = store.clock();
        let store = shared(store);
        Self {
            api_cache: ReadThroughCache::new(store.clone(), TtlPolicy::default(), true),
            store,
            clock,
            wizard: WizardSettings::default(),
            retry: RetryPolicy::default(),
            submitter,
            upstream: None,
        }
    }

    pub fn with_wizard_settings(mut self, settings: WizardSettings) -> Self {
        self.wizard = settings;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_api_cache(mut self, policy: TtlPolicy, stale_while_revalidate: bool) -> Self {
        self.api_cache = ReadThroughCache::new(self.store.clone(), policy, stale_while_revalidate);
        self
    }

    pub fn with_upstream(mut self, upstream: UpstreamClient) -> Self {
        self.upstream = Some(upstream);
        self
    }

    /// Creates state from configuration.
    ///
    /// Uses a file backend when `storage_path` is set, a simulated submitter
    /// and the configured upstream.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let quota = Some(config.storage_quota_bytes);
        let store = match &config.storage_path {
            Some(path) => ExpiringStore::new(Box::new(FileStorage::open(path, quota)), clock),
            None => ExpiringStore::new(
                Box::new(MemoryStorage::with_quota(config.storage_quota_bytes)),
                clock,
            ),
        };

        let submitter = SimulatedSubmitter::new(
            config.simulated_failure_rate,
            Duration::from_millis(config.simulated_latency_ms),
        );

        let mut state = Self::new(store, Arc::new(submitter))
            .with_wizard_settings(config.wizard_settings())
            .with_retry(config.retry_policy())
            .with_api_cache(config.ttl_policy(), config.stale_while_revalidate);

        if let Some(url) = &config.upstream_url {
            let upstream =
                UpstreamClient::new(url.clone(), Duration::from_millis(config.upstream_timeout_ms))?;
            state = state.with_upstream(upstream);
        }

        Ok(state)
    }

    /// Wizard for `session_id`, after checking the id.
    pub fn wizard(&self, session_id: &str) -> Result<BookingWizard> {
        if let Some(error_msg) = validate_session_id(session_id) {
            return Err(BookingError::InvalidRequest(error_msg));
        }
        Ok(BookingWizard::new(
            session_id,
            self.store.clone(),
            self.clock.clone(),
            self.wizard,
        ))
    }
}

fn step_from(n: u8) -> Result<StepId> {
    StepId::from_number(n).ok_or(BookingError::InvalidStep(n))
}

async fn navigation(wizard: &BookingWizard, current_step: StepId) -> NavigationResponse {
    NavigationResponse {
        session_id: wizard.session_id().to_string(),
        current_step,
        progress: wizard.progress_percentage().await,
    }
}

async fn step_response(wizard: &BookingWizard, step: StepId) -> StepResponse {
    let adapter = wizard.adapter(step);
    let record = adapter.load().await;
    let report = adapter.report().await;
    StepResponse::new(
        wizard.session_id(),
        step,
        record,
        report,
        adapter.time_remaining().await,
    )
}

// == Session Handlers ==

/// Handler for GET /sessions/:id
///
/// Returns the session summary. `?new_booking=true` discards the draft first.
pub async fn session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<SessionQuery>,
) -> Result<Json<SessionSummary>> {
    let wizard = state.wizard(&session_id)?;
    if query.new_booking {
        wizard.reset_all().await;
    }
    Ok(Json(wizard.summary().await))
}

/// Handler for DELETE /sessions/:id
pub async fn reset_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionSummary>> {
    let wizard = state.wizard(&session_id)?;
    wizard.reset_all().await;
    Ok(Json(wizard.summary().await))
}

/// Handler for POST /sessions/:id/close
///
/// Called when the client leaves; drops the steps holding personal data.
pub async fn close_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<CloseResponse>> {
    let wizard = state.wizard(&session_id)?;
    let cleared = wizard.discard_sensitive().await;
    Ok(Json(CloseResponse {
        session_id,
        cleared,
    }))
}

// == Step Handlers ==

/// Handler for GET /sessions/:id/steps/:step
pub async fn get_step_handler(
    State(state): State<AppState>,
    Path((session_id, step)): Path<(String, u8)>,
) -> Result<Json<StepResponse>> {
    let wizard = state.wizard(&session_id)?;
    let step = step_from(step)?;
    Ok(Json(step_response(&wizard, step).await))
}

/// Handler for PATCH /sessions/:id/steps/:step
///
/// Merges the body into the saved record and restarts its TTL.
pub async fn save_step_handler(
    State(state): State<AppState>,
    Path((session_id, step)): Path<(String, u8)>,
    Json(partial): Json<StepRecord>,
) -> Result<Json<StepResponse>> {
    let wizard = state.wizard(&session_id)?;
    let step = step_from(step)?;
    wizard.adapter(step).save(partial).await;
    Ok(Json(step_response(&wizard, step).await))
}

/// Handler for DELETE /sessions/:id/steps/:step
pub async fn clear_step_handler(
    State(state): State<AppState>,
    Path((session_id, step)): Path<(String, u8)>,
) -> Result<Json<StepResponse>> {
    let wizard = state.wizard(&session_id)?;
    let step = step_from(step)?;
    wizard.adapter(step).clear().await;
    Ok(Json(step_response(&wizard, step).await))
}

// == Navigation Handlers ==

/// Handler for POST /sessions/:id/next
pub async fn next_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<NavigationResponse>> {
    let wizard = state.wizard(&session_id)?;
    let step = wizard.next().await?;
    Ok(Json(navigation(&wizard, step).await))
}

/// Handler for POST /sessions/:id/previous
pub async fn previous_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<NavigationResponse>> {
    let wizard = state.wizard(&session_id)?;
    let step = wizard.previous().await;
    Ok(Json(navigation(&wizard, step).await))
}

/// Handler for POST /sessions/:id/jump/:step
pub async fn jump_handler(
    State(state): State<AppState>,
    Path((session_id, step)): Path<(String, u8)>,
) -> Result<Json<NavigationResponse>> {
    let wizard = state.wizard(&session_id)?;
    let step = wizard.jump_to(step).await?;
    Ok(Json(navigation(&wizard, step).await))
}

/// Handler for POST /sessions/:id/submit
pub async fn submit_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SubmitResponse>> {
    let wizard = state.wizard(&session_id)?;
    let confirmation = wizard.submit(state.submitter.as_ref(), &state.retry).await?;
    Ok(Json(SubmitResponse::from(confirmation)))
}

// == Read-Through Handlers ==

/// Handler for GET /api/:namespace
pub async fn cached_list_handler(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>> {
    cached_read(state, namespace, String::new(), query).await
}

/// Handler for GET /api/:namespace/*path
pub async fn cached_path_handler(
    State(state): State<AppState>,
    Path((namespace, path)): Path<(String, String)>,
    RawQuery(query): RawQuery,
) -> Result<Json<Value>> {
    cached_read(state, namespace, path, query).await
}

async fn cached_read(
    state: AppState,
    namespace: String,
    path: String,
    query: Option<String>,
) -> Result<Json<Value>> {
    if let Some(error_msg) = validate_namespace(&namespace) {
        return Err(BookingError::InvalidRequest(error_msg));
    }
    let upstream = state
        .upstream
        .clone()
        .ok_or_else(|| BookingError::Unavailable("no upstream configured".to_string()))?;

    let signature = request_signature(&path, query.as_deref());
    let url = upstream.url_for(&namespace, &signature);
    let ns = Namespace::new(namespace);

    let value: Value = state
        .api_cache
        .fetch_with_cache(&ns, &signature, move || async move {
            upstream.get_json(url).await
        })
        .await?;

    Ok(Json(value))
}

/// Handler for POST /cache/:namespace/invalidate
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Path(namespace): Path<String>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    if let Some(error_msg) = validate_namespace(&namespace) {
        return Err(BookingError::InvalidRequest(error_msg));
    }
    let pattern = req.key_pattern().map_err(BookingError::InvalidRequest)?;

    let ns = Namespace::new(namespace.clone());
    let removed = state.api_cache.invalidate_pattern(&ns, &pattern).await;

    Ok(Json(InvalidateResponse { namespace, removed }))
}

// == Service Handlers ==

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let store_stats = state.store.read().await.stats();
    Json(StatsResponse::new(store_stats, state.api_cache.stats()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

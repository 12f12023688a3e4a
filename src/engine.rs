//! Engine facade: ties context resolution, suggestion generation, and
//! the debounced value-fetch pipeline together behind a synchronous
//! surface the host can poll.
//!
//! Fetches run as spawned tasks and report back over an in-process
//! channel; the host drives the engine by calling [`SuggestionEngine::tick`]
//! and [`SuggestionEngine::poll_deliveries`] from its event loop.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::{debug, error, warn};

use crate::cache::{PageOutcome, ValueCache, cache_key};
use crate::config::CompletionConfig;
use crate::context::{Context, Scope, clamp_cursor, resolve_context};
use crate::error::{BackendError, EngineError, SchemaError};
use crate::ports::{SuggestionBackend, ValuePage, ValueRequest};
use crate::schema::Schema;
use crate::suggest::{self, SuggestionSet};

/// Keystrokes within this window collapse into a single value request.
pub const FETCH_DEBOUNCE: Duration = Duration::from_millis(250);

struct PageDelivery {
    key: String,
    result: Result<ValuePage, BackendError>,
}

/// A request waiting out the debounce window. Replaced wholesale when a
/// newer keystroke targets a different cache key.
struct PendingFetch {
    deadline: Instant,
    key: String,
    request: ValueRequest,
}

pub struct SuggestionEngine {
    config: CompletionConfig,
    schema: Option<Schema>,
    values: ValueCache,
    backend: Option<Arc<dyn SuggestionBackend>>,
    delivery_tx: mpsc::UnboundedSender<PageDelivery>,
    delivery_rx: mpsc::UnboundedReceiver<PageDelivery>,
    pending: Option<PendingFetch>,
    tasks: Vec<JoinHandle<()>>,
    inert: bool,
}

impl SuggestionEngine {
    /// Builds an engine from host configuration. An invalid configuration
    /// is reported once and leaves the engine inert rather than failing.
    pub fn new(config: CompletionConfig) -> Self {
        let inert = !config.is_valid();
        if inert {
            error!(
                cache_size = config.cache_size,
                "invalid completion configuration, suggestions disabled"
            );
        }
        let (delivery_tx, delivery_rx) = mpsc::unbounded_channel();
        Self {
            values: ValueCache::new(config.cache_size.max(1)),
            config,
            schema: None,
            backend: None,
            delivery_tx,
            delivery_rx,
            pending: None,
            tasks: Vec::new(),
            inert,
        }
    }

    pub fn with_backend(config: CompletionConfig, backend: Arc<dyn SuggestionBackend>) -> Self {
        let mut engine = Self::new(config);
        engine.backend = Some(backend);
        engine
    }

    pub fn is_active(&self) -> bool {
        !self.inert && self.config.completion_enabled
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    pub fn load_schema(&mut self, schema: Schema) -> Result<(), SchemaError> {
        schema.validate()?;
        self.schema = Some(schema);
        Ok(())
    }

    pub fn load_schema_json(&mut self, payload: &str) -> Result<(), SchemaError> {
        self.load_schema(Schema::from_json(payload)?)
    }

    pub async fn load_schema_from_url(&mut self, url: &str) -> Result<(), EngineError> {
        let Some(backend) = self.backend.clone() else {
            return Err(EngineError::NoBackend);
        };
        let schema = backend.fetch_schema(url).await?;
        self.load_schema(schema)?;
        Ok(())
    }

    /// Computes the suggestion set for the cursor position. Remote-backed
    /// value lookups are answered from the cache; a miss schedules a
    /// debounced fetch and returns a loading set in the meantime.
    pub fn suggestions(&mut self, text: &str, cursor: usize) -> SuggestionSet {
        if !self.is_active() {
            return SuggestionSet::empty();
        }
        let Some(schema) = self.schema.as_ref() else {
            return SuggestionSet::empty();
        };
        let context = resolve_context(schema, text, cursor);

        if let Some((key, request)) = remote_request(schema, &context) {
            if self.backend.is_some() && self.values.begin_first_fetch(&key) {
                // A pending fetch for a superseded key never fires; its
                // entry must not linger as a cached empty result, or a
                // later visit to that prefix would never fetch.
                if let Some(previous) = self.pending.take()
                    && previous.key != key
                {
                    self.values.remove(&previous.key);
                }
                debug!(key = %key, "scheduling value fetch");
                self.pending = Some(PendingFetch {
                    deadline: Instant::now() + FETCH_DEBOUNCE,
                    key: key.clone(),
                    request,
                });
            }
            let entry = self.values.get(&key);
            return suggest::generate(schema, &self.config, &context, entry);
        }

        suggest::generate(schema, &self.config, &context, None)
    }

    /// Requests the next page of remote values for the cursor position,
    /// bypassing the debounce. No-op while a page is already in flight or
    /// when the server reported the last page.
    pub fn load_more(&mut self, text: &str, cursor: usize) {
        if !self.is_active() {
            return;
        }
        let Some(schema) = self.schema.as_ref() else {
            return;
        };
        let context = resolve_context(schema, text, cursor);
        let Some((key, mut request)) = remote_request(schema, &context) else {
            return;
        };
        let Some(page) = self.values.begin_next_fetch(&key) else {
            return;
        };
        request.page = page;
        self.spawn_fetch(key, request);
    }

    /// Fires the pending fetch once its debounce deadline has passed.
    pub fn tick(&mut self, now: Instant) {
        let Some(pending) = self.pending.take_if(|p| p.deadline <= now) else {
            return;
        };
        self.spawn_fetch(pending.key, pending.request);
    }

    /// Drains completed fetches into the cache. Returns the number of
    /// pages applied; a non-zero count means the host should refresh its
    /// popup with [`SuggestionEngine::suggestions`].
    pub fn poll_deliveries(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(delivery) = self.delivery_rx.try_recv() {
            match delivery.result {
                Ok(page) => match self.values.apply_page(&delivery.key, &page) {
                    PageOutcome::Applied => applied += 1,
                    PageOutcome::Stale => {
                        debug!(key = %delivery.key, page = page.page, "discarding out-of-sequence page");
                    }
                },
                Err(err) => {
                    warn!(key = %delivery.key, error = %err, "value fetch failed");
                    self.values.clear_loading(&delivery.key);
                }
            }
        }
        self.tasks.retain(|task| !task.is_finished());
        applied
    }

    /// Splices the chosen suggestion into the text. Returns the rewritten
    /// text and the new cursor offset, or `None` when the index does not
    /// name a current suggestion.
    pub fn apply_selection(
        &self,
        text: &str,
        cursor: usize,
        index: usize,
    ) -> Option<(String, usize)> {
        if !self.is_active() {
            return None;
        }
        let schema = self.schema.as_ref()?;
        let context = resolve_context(schema, text, cursor);
        let entry = remote_request(schema, &context)
            .and_then(|(key, _)| self.values.peek(&key));
        let set = suggest::generate(schema, &self.config, &context, entry);
        let suggestion = set.suggestions.get(index)?;

        let cursor = clamp_cursor(text, cursor);
        // The prefix is the tail of the text at the cursor, except for a
        // stripped opening quote, which the snippet dedupe below absorbs.
        let start = cursor - set.prefix.len();
        let end = context
            .current_full_token
            .as_ref()
            .map_or(cursor, |token| token.end);

        let mut before = suggestion.snippet_before.as_str();
        if !before.is_empty() && text[..start].ends_with(before) {
            before = "";
        }
        let (after, cursor_in_after) = match suggestion.snippet_after.split_once('|') {
            Some((head, tail)) => (format!("{head}{tail}"), Some(head.len())),
            None => (suggestion.snippet_after.clone(), None),
        };
        let mut tail = &text[end..];
        if after.starts_with('"') && tail.starts_with('"') {
            tail = &tail[1..];
        }
        if after.ends_with(' ') && tail.starts_with(' ') {
            tail = &tail[1..];
        }

        let new_text = format!("{}{before}{}{after}{tail}", &text[..start], suggestion.text);
        let new_cursor = start
            + before.len()
            + suggestion.text.len()
            + cursor_in_after.unwrap_or(after.len());
        Some((new_text, new_cursor))
    }
}

impl SuggestionEngine {
    fn spawn_fetch(&mut self, key: String, request: ValueRequest) {
        let Some(backend) = self.backend.clone() else {
            self.values.clear_loading(&key);
            return;
        };
        let tx = self.delivery_tx.clone();
        debug!(key = %key, page = request.page, "dispatching value fetch");
        let handle = tokio::spawn(async move {
            let result = backend.fetch_values(&request).await;
            let _ = tx.send(PageDelivery { key, result });
        });
        self.tasks.push(handle);
    }
}

impl Drop for SuggestionEngine {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Cache key and page-1 request for the cursor position, when it targets
/// a remote-backed value lookup and the schema names an endpoint.
fn remote_request(schema: &Schema, context: &Context) -> Option<(String, ValueRequest)> {
    if context.scope != Some(Scope::Value) {
        return None;
    }
    let model = context.model.as_deref()?;
    let field = context.field.as_deref()?;
    let def = schema.field(model, field)?;
    if !def.has_remote_options() {
        return None;
    }
    let url = schema.suggestions_api_url.as_deref()?;
    let key = cache_key(model, field, &context.prefix);
    let request = ValueRequest {
        url: url.to_string(),
        model: model.to_string(),
        field: field.to_string(),
        search: context.prefix.clone(),
        page: 1,
    };
    Some((key, request))
}

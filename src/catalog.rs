//! Catalog store and façade.
//!
//! [`MessageCatalog`] owns the loaded message state behind one
//! read/write lock, resolves request-path lookups (language chain, entry,
//! plural form, rendering), and exposes the mutation surface (runtime
//! loads, reload) plus stats and the observer lifecycle.
//!
//! Request-path reads copy the templates they need out of the read lock and
//! render outside it; `load_messages` and `reload` take the write lock only
//! for the actual merge or swap.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};

use anyhow::{bail, Result};
use tracing::{debug, info};

use crate::config::CatalogConfig;
use crate::context::RequestContext;
use crate::error::CatalogError;
use crate::language::{candidate_chain, normalize_lang_tag};
use crate::loader::{self, MessageSource, YamlDirSource};
use crate::message::{
    is_valid_key, language_not_found_texts, LanguageMessages, Message, RawMessage,
    CODE_MISSING_LANGUAGE, CODE_MISSING_MESSAGE, RUNTIME_KEY_PREFIX,
};
use crate::observer::{
    ObserverEvent, ObserverPipeline, PublishOutcome, DROP_REASON_CLOSED, DROP_REASON_QUEUE_FULL,
};
use crate::params::Params;
use crate::plural::{self, PluralForm};
use crate::stats::{CatalogStats, StatsSnapshot};
use crate::template;

/// Invariant: after any successful load, every runtime key is also present
/// in `messages` for its language.
#[derive(Default)]
struct CatalogState {
    messages: HashMap<String, LanguageMessages>,
    runtime: HashMap<String, HashMap<String, RawMessage>>,
}

/// Fields copied out of the read lock for one resolution.
struct ResolvedEntry {
    resolved_lang: String,
    short_tpl: String,
    long_tpl: String,
    code: String,
    missing_message: bool,
    used_fallback: bool,
}

/// Localized message catalog.
///
/// Construction loads the source files (respecting the retry policy) and
/// starts the observer pipeline; a failed initial load fails construction.
/// All operations take `&self` and are safe to call from many threads.
pub struct MessageCatalog {
    config: CatalogConfig,
    source: Arc<dyn MessageSource>,
    state: RwLock<CatalogState>,
    stats: CatalogStats,
    pipeline: Mutex<Option<ObserverPipeline>>,
}

impl MessageCatalog {
    /// Create a catalog from `config`, performing the initial load.
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let config = config.normalized();
        let source: Arc<dyn MessageSource> = match config.source.clone() {
            Some(source) => source,
            None => Arc::new(YamlDirSource::new(config.resource_path.clone())),
        };

        let catalog = Self {
            stats: CatalogStats::new(config.stats_max_keys),
            state: RwLock::new(CatalogState::default()),
            pipeline: Mutex::new(None),
            source,
            config,
        };
        catalog.reload()?;

        if let Some(sink) = catalog.config.observer.clone() {
            let pipeline = ObserverPipeline::start(sink, catalog.config.observer_buffer);
            *catalog
                .pipeline
                .lock()
                .expect("observer pipeline mutex poisoned") = Some(pipeline);
        }

        Ok(catalog)
    }

    /// Resolve and render the message for `key`.
    ///
    /// Always returns a message: a missing language yields the stock
    /// not-found texts with [`CODE_MISSING_LANGUAGE`], a missing key
    /// renders the resolved language's default entry with
    /// [`CODE_MISSING_MESSAGE`], and `key` is always echoed back.
    pub fn message(&self, ctx: &RequestContext, key: &str, params: &Params) -> Message {
        let requested = self.requested_language(ctx);
        let Some(resolved) = self.resolve_entry(&requested, key, params) else {
            self.notify_language_missing(&requested);
            let (short_text, long_text) = language_not_found_texts(&requested);
            return Message {
                short_text,
                long_text,
                code: CODE_MISSING_LANGUAGE.to_string(),
                key: key.to_string(),
            };
        };

        if resolved.used_fallback {
            self.notify_language_fallback(&requested, &resolved.resolved_lang);
        }
        if resolved.missing_message {
            self.notify_message_missing(&resolved.resolved_lang, key);
        }

        let short_text = self.render(&resolved.resolved_lang, key, &resolved.short_tpl, params);
        let long_text = self.render(&resolved.resolved_lang, key, &resolved.long_tpl, params);
        Message {
            short_text,
            long_text,
            code: resolved.code,
            key: key.to_string(),
        }
    }

    /// Resolve `key` into a [`CatalogError`] wrapping `cause`.
    pub fn wrap_error(
        &self,
        ctx: &RequestContext,
        cause: anyhow::Error,
        key: &str,
        params: &Params,
    ) -> CatalogError {
        self.build_error(ctx, Some(cause), key, params)
    }

    /// Resolve `key` into a [`CatalogError`] without a cause.
    pub fn error(&self, ctx: &RequestContext, key: &str, params: &Params) -> CatalogError {
        self.build_error(ctx, None, key, params)
    }

    fn build_error(
        &self,
        ctx: &RequestContext,
        cause: Option<anyhow::Error>,
        key: &str,
        params: &Params,
    ) -> CatalogError {
        let message = self.message(ctx, key, params);
        CatalogError::new(
            message.short_text,
            message.long_text,
            message.code,
            message.key,
            cause,
        )
    }

    /// Merge runtime entries for `lang` into the catalog.
    ///
    /// Every entry must carry a key starting with [`RUNTIME_KEY_PREFIX`]
    /// and matching the key format, and must not duplicate an existing key
    /// for the language (or another entry in the batch). Validation happens
    /// up front; a rejected batch leaves the catalog untouched. Accepted
    /// entries survive subsequent reloads.
    pub fn load_messages(&self, lang: &str, messages: Vec<RawMessage>) -> Result<()> {
        let lang = normalize_lang_tag(lang);
        if lang.is_empty() {
            bail!("language is required");
        }

        let mut state = self.state.write().expect("catalog lock poisoned");

        let mut batch_keys = HashSet::new();
        for message in &messages {
            let key = message.key.as_str();
            if !key.starts_with(RUNTIME_KEY_PREFIX) {
                bail!(
                    "runtime messages must use the reserved {RUNTIME_KEY_PREFIX:?} key prefix, got {key:?}"
                );
            }
            if !is_valid_key(key) {
                bail!("invalid message key {key:?}: keys must match [A-Za-z0-9_.-]+");
            }
            let exists = state
                .messages
                .get(&lang)
                .is_some_and(|lang_messages| lang_messages.set.contains_key(key));
            if exists || !batch_keys.insert(key.to_string()) {
                bail!("message with key {key:?} already exists for language {lang}");
            }
        }

        let CatalogState { messages: base, runtime } = &mut *state;
        let lang_messages = base.entry(lang.clone()).or_default();
        let runtime_set = runtime.entry(lang).or_default();
        for message in messages {
            lang_messages
                .set
                .insert(message.key.clone(), message.clone());
            runtime_set.insert(message.key.clone(), message);
        }

        Ok(())
    }

    /// Re-read the source collection under the configured retry policy and
    /// publish the new state atomically, re-applying runtime entries. On
    /// terminal failure the previous state stays intact and
    /// `last_reload_at` is unchanged.
    pub fn reload(&self) -> Result<()> {
        let mut base = loader::load_with_retry(
            self.source.as_ref(),
            self.config.reload_retries,
            self.config.reload_retry_delay,
        )?;
        let loaded_at = (self.config.now_fn)();

        let mut state = self.state.write().expect("catalog lock poisoned");
        for (lang, runtime_set) in &state.runtime {
            let lang_messages = base.entry(lang.clone()).or_default();
            for (key, message) in runtime_set {
                lang_messages.set.insert(key.clone(), message.clone());
            }
        }
        state.messages = base;
        let languages = state.messages.len();
        drop(state);

        self.stats.set_last_reload_at(loaded_at);
        info!(languages, "message catalog loaded");
        Ok(())
    }

    /// Consistent copy of the statistics registry.
    pub fn snapshot_stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Zero all counters and clear `last_reload_at`.
    pub fn reset_stats(&self) {
        self.stats.reset()
    }

    /// Tear down the observer pipeline: close the queue and join the
    /// consumer once it drains. Idempotent; events published afterwards are
    /// counted under `observer_closed`.
    pub fn close(&self) {
        let pipeline = self
            .pipeline
            .lock()
            .expect("observer pipeline mutex poisoned")
            .take();
        if let Some(pipeline) = pipeline {
            pipeline.shutdown();
            debug!("message catalog observer pipeline closed");
        }
    }

    // ---------------------------------------------------------------------
    // Resolution internals
    // ---------------------------------------------------------------------

    fn requested_language(&self, ctx: &RequestContext) -> String {
        let requested = ctx
            .lookup(&self.config.ctx_language_key)
            .map(normalize_lang_tag)
            .filter(|lang| !lang.is_empty())
            .unwrap_or_else(|| normalize_lang_tag(&self.config.default_language));
        if requested.is_empty() {
            "en".to_string()
        } else {
            requested
        }
    }

    /// Walk the candidate chain and copy the matched entry's fields out of
    /// the read lock. `None` when no chain language exists in the catalog.
    fn resolve_entry(&self, requested: &str, key: &str, params: &Params) -> Option<ResolvedEntry> {
        let chain = candidate_chain(
            requested,
            &self.config.fallback_languages,
            &self.config.default_language,
        );

        let state = self.state.read().expect("catalog lock poisoned");
        let resolved_lang = chain
            .into_iter()
            .find(|candidate| state.messages.contains_key(candidate))?;
        let lang_messages = &state.messages[&resolved_lang];

        let (entry, missing_message) = match lang_messages.set.get(key) {
            Some(entry) => (entry, false),
            None => (&lang_messages.default, true),
        };

        let (short_tpl, long_tpl) = select_templates(entry, &resolved_lang, params);
        let code = if missing_message {
            CODE_MISSING_MESSAGE.to_string()
        } else {
            entry.code.clone().unwrap_or_default()
        };

        Some(ResolvedEntry {
            used_fallback: resolved_lang != requested,
            resolved_lang,
            short_tpl,
            long_tpl,
            code,
            missing_message,
        })
    }

    fn render(&self, lang: &str, key: &str, template: &str, params: &Params) -> String {
        template::render(
            template,
            lang,
            params,
            self.config.strict_templates,
            &mut |issue| self.notify_template_issue(lang, key, issue),
        )
    }

    // ---------------------------------------------------------------------
    // Stats + observer notification (stats first, then the event)
    // ---------------------------------------------------------------------

    fn notify_language_fallback(&self, requested: &str, resolved: &str) {
        self.stats.record_language_fallback(requested, resolved);
        self.publish(ObserverEvent::LanguageFallback {
            requested: requested.to_string(),
            resolved: resolved.to_string(),
        });
    }

    fn notify_language_missing(&self, lang: &str) {
        self.stats.record_missing_language(lang);
        self.publish(ObserverEvent::LanguageMissing {
            lang: lang.to_string(),
        });
    }

    fn notify_message_missing(&self, lang: &str, key: &str) {
        self.stats.record_missing_message(lang, key);
        self.publish(ObserverEvent::MessageMissing {
            lang: lang.to_string(),
            key: key.to_string(),
        });
    }

    fn notify_template_issue(&self, lang: &str, key: &str, issue: &str) {
        self.stats.record_template_issue(lang, key, issue);
        self.publish(ObserverEvent::TemplateIssue {
            lang: lang.to_string(),
            key: key.to_string(),
            issue: issue.to_string(),
        });
    }

    fn publish(&self, event: ObserverEvent) {
        if self.config.observer.is_none() {
            return;
        }
        let pipeline = self
            .pipeline
            .lock()
            .expect("observer pipeline mutex poisoned");
        match pipeline.as_ref() {
            Some(pipeline) => {
                if pipeline.publish(event) == PublishOutcome::QueueFull {
                    self.stats.record_dropped_event(DROP_REASON_QUEUE_FULL);
                }
            }
            None => self.stats.record_dropped_event(DROP_REASON_CLOSED),
        }
    }
}

impl Drop for MessageCatalog {
    fn drop(&mut self) {
        self.close();
    }
}

/// Pick the templates for an entry: its plural forms when present and the
/// plural parameter is an integer, its plain templates otherwise. Form
/// lookup falls back to `other`, then to the plain template.
fn select_templates(entry: &RawMessage, lang: &str, params: &Params) -> (String, String) {
    if entry.has_forms() {
        let count = params
            .get(entry.plural_param_name())
            .and_then(|value| value.plural_count());
        if let Some(count) = count {
            let form = plural::select(lang, count);
            let pick = |forms: &Option<HashMap<String, String>>, plain: &str| -> String {
                let Some(forms) = forms else {
                    return plain.to_string();
                };
                forms
                    .get(form.name())
                    .or_else(|| forms.get(PluralForm::Other.name()))
                    .cloned()
                    .unwrap_or_else(|| plain.to_string())
            };
            return (
                pick(&entry.short_forms, &entry.short_tpl),
                pick(&entry.long_forms, &entry.long_tpl),
            );
        }
    }
    (entry.short_tpl.clone(), entry.long_tpl.clone())
}

//! Catalog statistics.
//!
//! Counters for language fallbacks, missing languages, missing messages,
//! template issues, and dropped observer events, plus the time of the last
//! successful reload. Every map is cardinality-bounded: once a map holds
//! `max_keys - 1` distinct keys, counts for unseen keys coalesce into the
//! [`OVERFLOW_STAT_KEY`] bucket while existing keys keep incrementing.
//!
//! The registry has its own mutex and never reaches back into the catalog,
//! so request-path callers may update it while holding the catalog read
//! lock.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::language::normalize_lang_tag;

/// Bucket collecting counts for keys beyond the per-map cardinality cap.
pub const OVERFLOW_STAT_KEY: &str = "__overflow__";

const MAX_STAT_KEY_BYTES: usize = 120;

/// Deep-copied view of the registry at one instant.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsSnapshot {
    /// Keyed `"<requested>-><resolved>"`.
    pub language_fallbacks: HashMap<String, u64>,
    /// Keyed by the normalized requested tag.
    pub missing_languages: HashMap<String, u64>,
    /// Keyed `"<resolved_lang>:<msg_key>"`.
    pub missing_messages: HashMap<String, u64>,
    /// Keyed `"<resolved_lang>:<msg_key>:<issue_tag>"`.
    pub template_issues: HashMap<String, u64>,
    /// Keyed by drop reason (`observer_queue_full`, `observer_closed`).
    pub dropped_events: HashMap<String, u64>,
    /// Time of the last successful load, `None` before the first one or
    /// after a reset.
    pub last_reload_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct StatsInner {
    language_fallbacks: HashMap<String, u64>,
    missing_languages: HashMap<String, u64>,
    missing_messages: HashMap<String, u64>,
    template_issues: HashMap<String, u64>,
    dropped_events: HashMap<String, u64>,
    last_reload_at: Option<DateTime<Utc>>,
}

/// Bounded counter registry.
#[derive(Debug)]
pub(crate) struct CatalogStats {
    max_keys: usize,
    inner: Mutex<StatsInner>,
}

fn sanitize_stat_key(key: &str) -> String {
    let key = key.trim();
    if key.is_empty() {
        return "unknown".to_string();
    }
    if key.len() > MAX_STAT_KEY_BYTES {
        let mut cut = MAX_STAT_KEY_BYTES;
        while !key.is_char_boundary(cut) {
            cut -= 1;
        }
        return key[..cut].to_string();
    }
    key.to_string()
}

fn increment(target: &mut HashMap<String, u64>, max_keys: usize, key: &str) {
    let mut key = sanitize_stat_key(key);
    if max_keys > 0 && !target.contains_key(&key) {
        let threshold = if target.contains_key(OVERFLOW_STAT_KEY) {
            max_keys
        } else {
            max_keys - 1
        };
        if target.len() >= threshold {
            key = OVERFLOW_STAT_KEY.to_string();
        }
    }
    *target.entry(key).or_insert(0) += 1;
}

impl CatalogStats {
    pub(crate) fn new(max_keys: usize) -> Self {
        Self {
            max_keys,
            inner: Mutex::new(StatsInner::default()),
        }
    }

    pub(crate) fn record_language_fallback(&self, requested: &str, resolved: &str) {
        let mut inner = self.inner.lock().expect("stats mutex poisoned");
        increment(
            &mut inner.language_fallbacks,
            self.max_keys,
            &format!("{requested}->{resolved}"),
        );
    }

    pub(crate) fn record_missing_language(&self, lang: &str) {
        let mut inner = self.inner.lock().expect("stats mutex poisoned");
        increment(
            &mut inner.missing_languages,
            self.max_keys,
            &normalize_lang_tag(lang),
        );
    }

    pub(crate) fn record_missing_message(&self, lang: &str, key: &str) {
        let mut inner = self.inner.lock().expect("stats mutex poisoned");
        increment(
            &mut inner.missing_messages,
            self.max_keys,
            &format!("{lang}:{key}"),
        );
    }

    pub(crate) fn record_template_issue(&self, lang: &str, key: &str, issue: &str) {
        let mut inner = self.inner.lock().expect("stats mutex poisoned");
        increment(
            &mut inner.template_issues,
            self.max_keys,
            &format!("{lang}:{key}:{issue}"),
        );
    }

    pub(crate) fn record_dropped_event(&self, reason: &str) {
        let mut inner = self.inner.lock().expect("stats mutex poisoned");
        increment(&mut inner.dropped_events, self.max_keys, reason);
    }

    pub(crate) fn set_last_reload_at(&self, at: DateTime<Utc>) {
        let mut inner = self.inner.lock().expect("stats mutex poisoned");
        inner.last_reload_at = Some(at);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        let inner = self.inner.lock().expect("stats mutex poisoned");
        StatsSnapshot {
            language_fallbacks: inner.language_fallbacks.clone(),
            missing_languages: inner.missing_languages.clone(),
            missing_messages: inner.missing_messages.clone(),
            template_issues: inner.template_issues.clone(),
            dropped_events: inner.dropped_events.clone(),
            last_reload_at: inner.last_reload_at,
        }
    }

    pub(crate) fn reset(&self) {
        let mut inner = self.inner.lock().expect("stats mutex poisoned");
        *inner = StatsInner::default();
    }
}

//! Catalog configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::loader::MessageSource;
use crate::observer::CatalogObserver;

/// Injectable time source for `last_reload_at`.
pub type NowFn = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Construction options for a [`crate::MessageCatalog`].
///
/// Start from `CatalogConfig::default()` and override what the deployment
/// needs; unset or empty string fields fall back to their defaults at
/// construction time.
#[derive(Clone)]
pub struct CatalogConfig {
    /// Directory of per-language `<lang>.yaml` files.
    pub resource_path: PathBuf,

    /// Context attribute holding the caller's language. Read under the
    /// typed key shape first, then the plain string shape.
    pub ctx_language_key: String,

    /// Last non-hard fallback in the candidate chain (the hard fallback is
    /// always `"en"`).
    pub default_language: String,

    /// Ordered fallbacks inserted between the base tag and the default
    /// language.
    pub fallback_languages: Vec<String>,

    /// Replace missing template parameters with `<missing:name>` instead of
    /// leaving the placeholder in place.
    pub strict_templates: bool,

    /// Asynchronous sink for resolution events.
    pub observer: Option<Arc<dyn CatalogObserver>>,

    /// Observer queue capacity.
    pub observer_buffer: usize,

    /// Per-map cardinality cap for the statistics registry.
    pub stats_max_keys: usize,

    /// Extra whole-load attempts after a failed load.
    pub reload_retries: u32,

    /// Delay between load attempts.
    pub reload_retry_delay: Duration,

    /// Clock for `last_reload_at`.
    pub now_fn: NowFn,

    /// Message source override. `None` reads YAML files from
    /// `resource_path`.
    pub source: Option<Arc<dyn MessageSource>>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            resource_path: PathBuf::from("./resources/messages"),
            ctx_language_key: "language".to_string(),
            default_language: "en".to_string(),
            fallback_languages: Vec::new(),
            strict_templates: false,
            observer: None,
            observer_buffer: 1024,
            stats_max_keys: 512,
            reload_retries: 0,
            reload_retry_delay: Duration::from_millis(50),
            now_fn: Arc::new(Utc::now),
            source: None,
        }
    }
}

impl CatalogConfig {
    /// Re-apply defaults over empty or zero values, the shape the catalog
    /// constructor relies on.
    pub(crate) fn normalized(mut self) -> Self {
        if self.ctx_language_key.trim().is_empty() {
            self.ctx_language_key = "language".to_string();
        }
        if self.default_language.trim().is_empty() {
            self.default_language = "en".to_string();
        }
        if self.observer_buffer == 0 {
            self.observer_buffer = 1024;
        }
        if self.stats_max_keys == 0 {
            self.stats_max_keys = 512;
        }
        if self.reload_retry_delay.is_zero() {
            self.reload_retry_delay = Duration::from_millis(50);
        }
        self
    }
}

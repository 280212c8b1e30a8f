//! Localized message catalog for server-side request paths.
//!
//! Given a request context carrying a language preference, a stable message
//! key, and a bag of named template parameters, the catalog returns a
//! localized [`Message`] (short text, long text, optional user code, echoed
//! key) or a [`CatalogError`] carrying the same. Content is loaded from one
//! YAML file per language and can be augmented at runtime with entries
//! under the reserved [`RUNTIME_KEY_PREFIX`].
//!
//! # Architecture
//!
//! - `language`: tag normalization and the fallback candidate chain
//! - `plural`: CLDR plural form selection per language family
//! - `params` / `context`: named parameter bag and per-request attributes
//! - `template`: placeholder rendering (plural, number, date, simple)
//! - `loader`: the `MessageSource` seam, YAML instantiation, retry driver
//! - `catalog`: the store and public façade
//! - `stats` / `observer`: bounded counters and the async event pipeline
//! - `error`: the localized error value
//!
//! # Example
//!
//! ```no_run
//! use msgcat::{CatalogConfig, MessageCatalog, Params, RequestContext};
//!
//! # fn main() -> anyhow::Result<()> {
//! let catalog = MessageCatalog::new(CatalogConfig {
//!     resource_path: "./resources/messages".into(),
//!     ..CatalogConfig::default()
//! })?;
//!
//! let ctx = RequestContext::new().with_value("language", "es-AR");
//! let message = catalog.message(&ctx, "greeting.hello", &Params::new().with("name", "juan"));
//! println!("{} ({})", message.short_text, message.key);
//! # Ok(())
//! # }
//! ```

mod catalog;
mod config;
mod context;
mod error;
mod language;
mod loader;
mod message;
mod observer;
mod params;
mod plural;
mod stats;
mod template;

pub use catalog::MessageCatalog;
pub use config::{CatalogConfig, NowFn};
pub use context::{ContextKey, RequestContext};
pub use error::CatalogError;
pub use loader::{MessageSource, YamlDirSource};
pub use message::{
    LanguageMessages, Message, RawMessage, CODE_MISSING_LANGUAGE, CODE_MISSING_MESSAGE,
    LANGUAGE_NOT_FOUND_TEMPLATE, RUNTIME_KEY_PREFIX,
};
pub use observer::{CatalogObserver, DROP_REASON_CLOSED, DROP_REASON_QUEUE_FULL};
pub use params::{ParamValue, Params};
pub use plural::{select as plural_form, PluralForm};
pub use stats::{StatsSnapshot, OVERFLOW_STAT_KEY};

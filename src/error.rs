//! Localized error value.

use std::fmt;

/// Error produced by the catalog façade: a resolved message in error shape,
/// optionally wrapping an underlying cause.
///
/// `Display` renders the short text. The wrapped cause participates in the
/// standard error chain through [`std::error::Error::source`], so
/// `anyhow::Error::is`/`downcast` and manual chain walks can discover it.
/// When `code()` is empty, use `key()` as the API identifier.
pub struct CatalogError {
    short_text: String,
    long_text: String,
    code: String,
    key: String,
    cause: Option<anyhow::Error>,
}

impl CatalogError {
    pub(crate) fn new(
        short_text: String,
        long_text: String,
        code: String,
        key: String,
        cause: Option<anyhow::Error>,
    ) -> Self {
        Self {
            short_text,
            long_text,
            code,
            key,
            cause,
        }
    }

    /// User-defined or sentinel code; may be empty.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The queried message key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Rendered short text (also the `Display` output).
    pub fn short_text(&self) -> &str {
        &self.short_text
    }

    /// Rendered long text.
    pub fn long_text(&self) -> &str {
        &self.long_text
    }

    /// The wrapped cause, when one was supplied via `wrap_error`.
    pub fn cause(&self) -> Option<&anyhow::Error> {
        self.cause.as_ref()
    }
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.short_text)
    }
}

impl fmt::Debug for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogError")
            .field("short_text", &self.short_text)
            .field("long_text", &self.long_text)
            .field("code", &self.code)
            .field("key", &self.key)
            .field("cause", &self.cause)
            .finish()
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_ref()
            .map(AsRef::<dyn std::error::Error + 'static>::as_ref)
    }
}

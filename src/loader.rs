//! Message source loading.
//!
//! The catalog consumes a normalized per-language tree through the
//! [`MessageSource`] trait; [`YamlDirSource`] is the shipped instantiation,
//! reading one `<lang>.yaml` file per language from a directory. The driver
//! retries the whole load (not individual files) according to the
//! configured policy and fails without touching existing state.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::{debug, warn};

use crate::language::normalize_lang_tag;
use crate::message::{is_valid_key, LanguageMessages};

/// Provider of the complete per-language base layer.
///
/// A load either yields the full tree or fails with no side effects; the
/// catalog decides what to do with the previous state.
pub trait MessageSource: Send + Sync {
    fn load(&self) -> Result<HashMap<String, LanguageMessages>>;
}

/// Default source: a directory with one YAML file per language, file stem =
/// language tag. Directory entries without the `.yaml` suffix are ignored.
pub struct YamlDirSource {
    dir: PathBuf,
}

impl YamlDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl MessageSource for YamlDirSource {
    fn load(&self) -> Result<HashMap<String, LanguageMessages>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("failed to find messages in {}", self.dir.display()))?;

        let mut by_lang = HashMap::new();
        for entry in entries {
            let path = entry
                .context("failed to read message directory entry")?
                .path();
            let Some(file_name) = path.file_name().and_then(|name| name.to_str()) else {
                continue;
            };
            let Some(stem) = file_name.strip_suffix(".yaml") else {
                continue;
            };
            let lang = normalize_lang_tag(stem);
            if lang.is_empty() {
                continue;
            }

            let text = fs::read_to_string(&path)
                .with_context(|| format!("failed to read message file {}", path.display()))?;
            let mut messages: LanguageMessages = serde_yaml::from_str(&text)
                .with_context(|| format!("failed to parse message file {}", path.display()))?;
            validate_messages(&lang, &mut messages)?;
            by_lang.insert(lang, messages);
        }

        Ok(by_lang)
    }
}

/// Validate one language's messages and stamp each entry with its key.
pub(crate) fn validate_messages(lang: &str, messages: &mut LanguageMessages) -> Result<()> {
    if messages.default.short_tpl.is_empty() && messages.default.long_tpl.is_empty() {
        bail!("invalid default message for language {lang}: at least short or long text is required");
    }
    for (key, raw) in messages.set.iter_mut() {
        if !is_valid_key(key) {
            bail!("invalid message key {key:?} for language {lang}: keys must match [A-Za-z0-9_.-]+");
        }
        raw.key = key.clone();
    }
    Ok(())
}

/// Run `source.load()` with up to `retries` extra attempts, `delay` apart.
/// The whole load is the retry unit.
pub(crate) fn load_with_retry(
    source: &dyn MessageSource,
    retries: u32,
    delay: Duration,
) -> Result<HashMap<String, LanguageMessages>> {
    let attempts = retries + 1;
    let mut last_err = None;

    for attempt in 1..=attempts {
        if attempt > 1 {
            debug!("message load: attempt {attempt}/{attempts} after {delay:?}");
            std::thread::sleep(delay);
        }
        match source.load() {
            Ok(by_lang) => {
                if attempt > 1 {
                    debug!("message load: succeeded on attempt {attempt}/{attempts}");
                }
                return Ok(by_lang);
            }
            Err(err) => {
                let remaining = attempts - attempt;
                if remaining > 0 {
                    warn!("message load: attempt {attempt}/{attempts} failed ({err:#}), {remaining} retries remaining");
                } else {
                    warn!("message load: all {attempts} attempts failed. Last error: {err:#}");
                }
                last_err = Some(err);
            }
        }
    }

    Err(last_err.expect("at least one load attempt was made"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) {
        std::fs::write(dir.path().join(name), content).expect("failed to write fixture");
    }

    // ==================== YamlDirSource Tests ====================

    #[test]
    fn test_loads_languages_by_file_stem() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "en.yaml",
            "default:\n  short: Oops\nset:\n  greeting.hello:\n    short: Hello\n",
        );
        write_file(&dir, "ES.yaml", "default:\n  short: Uy\n");

        let by_lang = YamlDirSource::new(dir.path()).load().unwrap();
        assert_eq!(by_lang.len(), 2);
        assert!(by_lang.contains_key("en"));
        // File stems are normalized case-insensitively.
        assert!(by_lang.contains_key("es"));
        let entry = &by_lang["en"].set["greeting.hello"];
        assert_eq!(entry.short_tpl, "Hello");
        assert_eq!(entry.key, "greeting.hello");
    }

    #[test]
    fn test_ignores_non_yaml_entries() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "en.yaml", "default:\n  short: Oops\n");
        write_file(&dir, "notes.txt", "not messages");
        write_file(&dir, "fr.yml", "default:\n  short: Zut\n");

        let by_lang = YamlDirSource::new(dir.path()).load().unwrap();
        assert_eq!(by_lang.len(), 1);
        assert!(by_lang.contains_key("en"));
    }

    #[test]
    fn test_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = YamlDirSource::new(&missing).load().unwrap_err();
        assert!(err.to_string().contains("failed to find messages"));
    }

    #[test]
    fn test_unparsable_file_fails() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "en.yaml", "default: [not : a : mapping\n");
        let err = YamlDirSource::new(dir.path()).load().unwrap_err();
        assert!(err.to_string().contains("failed to parse"));
    }

    #[test]
    fn test_empty_default_fails_validation() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "en.yaml", "set:\n  a:\n    short: x\n");
        let err = YamlDirSource::new(dir.path()).load().unwrap_err();
        assert!(err.to_string().contains("invalid default message"));
    }

    #[test]
    fn test_invalid_key_fails_validation() {
        let dir = TempDir::new().unwrap();
        write_file(
            &dir,
            "en.yaml",
            "default:\n  short: Oops\nset:\n  \"bad key\":\n    short: x\n",
        );
        let err = YamlDirSource::new(dir.path()).load().unwrap_err();
        assert!(err.to_string().contains("invalid message key"));
    }

    #[test]
    fn test_default_only_long_is_valid() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "en.yaml", "default:\n  long: Something went wrong\n");
        let by_lang = YamlDirSource::new(dir.path()).load().unwrap();
        assert_eq!(by_lang["en"].default.long_tpl, "Something went wrong");
    }

    // ==================== Retry Tests ====================

    struct FlakySource {
        failures_left: Mutex<u32>,
        calls: Mutex<u32>,
    }

    impl FlakySource {
        fn new(failures: u32) -> Self {
            Self {
                failures_left: Mutex::new(failures),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    impl MessageSource for FlakySource {
        fn load(&self) -> Result<HashMap<String, LanguageMessages>> {
            *self.calls.lock().unwrap() += 1;
            let mut failures = self.failures_left.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                bail!("transient read failure");
            }
            Ok(HashMap::new())
        }
    }

    #[test]
    fn test_retry_succeeds_after_failures() {
        let source = FlakySource::new(2);
        let result = load_with_retry(&source, 2, Duration::from_millis(1));
        assert!(result.is_ok());
        assert_eq!(source.calls(), 3);
    }

    #[test]
    fn test_retry_exhaustion_returns_last_error() {
        let source = FlakySource::new(10);
        let err = load_with_retry(&source, 2, Duration::from_millis(1)).unwrap_err();
        assert!(err.to_string().contains("transient read failure"));
        assert_eq!(source.calls(), 3);
    }

    #[test]
    fn test_zero_retries_is_single_attempt() {
        let source = FlakySource::new(1);
        assert!(load_with_retry(&source, 0, Duration::from_millis(1)).is_err());
        assert_eq!(source.calls(), 1);
    }

    #[test]
    fn test_retry_waits_between_attempts() {
        let source = FlakySource::new(2);
        let started = std::time::Instant::now();
        let _ = load_with_retry(&source, 2, Duration::from_millis(30));
        assert!(started.elapsed() >= Duration::from_millis(60));
    }
}

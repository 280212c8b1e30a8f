//! Strict templates and the statistics snapshot.
//!
//! Run with `cargo run --example strict_stats`.

use anyhow::Result;
use msgcat::{CatalogConfig, MessageCatalog, Params, RequestContext};
use tempfile::TempDir;

const EN: &str = r#"default:
  short: Unexpected error
  long: Message not found
set:
  greeting.template:
    short: "Hello {{name}}, role {{role}}"
    long: "Hello {{name}}, you are {{role}}."
"#;

fn main() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("en.yaml"), EN)?;

    let catalog = MessageCatalog::new(CatalogConfig {
        resource_path: dir.path().to_path_buf(),
        strict_templates: true,
        ..CatalogConfig::default()
    })?;

    let ctx = RequestContext::new().with_value("language", "en");

    // Missing "role" materializes as <missing:role> in strict mode.
    let msg = catalog.message(&ctx, "greeting.template", &Params::new().with("name", "juan"));
    println!("strict: {}", msg.short_text);

    // A couple of misses to populate the counters.
    catalog.message(&ctx, "no.such.key", &Params::new());
    let es = RequestContext::new().with_value("language", "es-AR");
    catalog.message(&es, "greeting.template", &Params::new().with("name", "ana"));

    let stats = catalog.snapshot_stats();
    println!("stats: {}", serde_json::to_string_pretty(&stats)?);

    catalog.close();
    Ok(())
}

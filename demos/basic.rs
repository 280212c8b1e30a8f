//! Basic walkthrough: construction, message resolution, template
//! parameters, and the error values.
//!
//! Run with `cargo run --example basic`.

use anyhow::Result;
use msgcat::{CatalogConfig, MessageCatalog, Params, RequestContext};
use tempfile::TempDir;

const EN: &str = r#"default:
  short: Unexpected error
  long: Message not found in catalog
set:
  greeting.hello:
    short: Hello
    long: Hello, welcome.
  greeting.template:
    short: "Hello {{name}}, role {{role}}"
    long: "Hello {{name}}, you are {{role}}."
  error.gone:
    code: 404
    short: Not found
    long: Resource not found.
"#;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("en.yaml"), EN)?;

    let catalog = MessageCatalog::new(CatalogConfig {
        resource_path: dir.path().to_path_buf(),
        ..CatalogConfig::default()
    })?;

    let ctx = RequestContext::new().with_value("language", "en");

    let msg = catalog.message(&ctx, "greeting.hello", &Params::new());
    println!("plain: {} | code: {:?}", msg.short_text, msg.code);

    let params = Params::new().with("name", "juan").with("role", "admin");
    let msg = catalog.message(&ctx, "greeting.template", &params);
    println!("with params: {}", msg.short_text);

    let err = catalog.error(&ctx, "error.gone", &Params::new());
    println!("error: {} | code: {}", err, err.code());

    let wrapped = catalog.wrap_error(
        &ctx,
        anyhow::anyhow!("connection refused"),
        "error.gone",
        &Params::new(),
    );
    println!("wrapped: {} <- {}", wrapped, wrapped.cause().unwrap());

    catalog.close();
    Ok(())
}

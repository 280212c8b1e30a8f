//! CLDR plural forms: `short_forms`/`long_forms` maps and tagged
//! `{{plural:...}}` branches.
//!
//! Run with `cargo run --example cldr_plural`.

use anyhow::Result;
use msgcat::{CatalogConfig, MessageCatalog, Params, RequestContext};
use tempfile::TempDir;

const EN: &str = r#"default:
  short: Unexpected error
  long: Message not found
set:
  person.cats:
    short_forms:
      one: "{{name}} has {{count}} cat."
      other: "{{name}} has {{count}} cats."
    long_forms:
      one: "{{name}} has one cat."
      other: "{{name}} has {{count}} cats."
    plural_param: count
  person.dogs:
    short: "{{name}} has {{plural:count|zero:no dogs|one:one dog|other:several dogs}}"
"#;

const AR: &str = r#"default:
  short: "خطأ غير متوقع"
  long: "لم يتم العثور على الرسالة"
set:
  items:
    short_forms:
      zero: "no items"
      one: "one item"
      two: "two items"
      few: "a few items"
      many: "many items"
      other: "lots of items"
"#;

fn main() -> Result<()> {
    let dir = TempDir::new()?;
    std::fs::write(dir.path().join("en.yaml"), EN)?;
    std::fs::write(dir.path().join("ar.yaml"), AR)?;

    let catalog = MessageCatalog::new(CatalogConfig {
        resource_path: dir.path().to_path_buf(),
        ..CatalogConfig::default()
    })?;

    let en = RequestContext::new().with_value("language", "en");
    for count in [0, 1, 2, 5] {
        let params = Params::new().with("name", "Nick").with("count", count);
        let msg = catalog.message(&en, "person.cats", &params);
        println!("cats count={count}: {}", msg.short_text);
    }
    for count in [0, 1, 3] {
        let params = Params::new().with("name", "Nick").with("count", count);
        let msg = catalog.message(&en, "person.dogs", &params);
        println!("dogs count={count}: {}", msg.short_text);
    }

    let ar = RequestContext::new().with_value("language", "ar");
    for count in [0, 1, 2, 5, 11, 100] {
        let msg = catalog.message(&ar, "items", &Params::new().with("count", count));
        println!("ar items count={count}: {}", msg.short_text);
    }

    catalog.close();
    Ok(())
}

//! Topics API Example
//!
//! Exposes content types, a curated list, a menu and site variables declared
//! in `endpoints.yaml`, backed by in-memory sample content.

mod store;

use anyhow::Result;
use expose::prelude::*;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const CONFIG: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/demos/topics_api/endpoints.yaml");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "expose=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let entity_source = InMemoryEntitySource::new();
    let variables = InMemoryVariableStore::new();
    store::populate(&entity_source, &variables);

    println!("🌐 Server running on http://127.0.0.1:3000");
    println!("\n📚 Routes:");
    println!("    GET /api                                     - List endpoints");
    println!("    GET /api/1.0/topics.json?count=2&type=news   - Topics");
    println!("    GET /api/1.0/topics.json?path=topics/kelp-forests");
    println!("    GET /api/1.0/trending-topics.json            - Curated list");
    println!("    GET /api/1.0/main-menu.json                  - Menu links");
    println!("    GET /api/1.0/site-information.json           - Site variables");
    println!("    GET /scripts/1.0                             - Script whitelist");

    ServerBuilder::new()
        .with_entity_source(entity_source)
        .with_image_styles(PrefixImageStyles::new(
            "http://127.0.0.1:3000/files",
            ["thumbnail", "medium"],
        ))
        .with_variable_store(variables)
        .register_config(CONFIG)?
        .serve("127.0.0.1:3000")
        .await
}

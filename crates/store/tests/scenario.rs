// Generate, persist, gate, publish, resolve and render one site end to end.

use async_trait::async_trait;
use launchkit_core::{Error, GenerationError, OwnerId, parse_address};
use launchkit_generator::{GenerationRequest, GenerativeBackend, Generator};
use launchkit_renderer::{RenderOptions, render_document};
use launchkit_store::{AccessRules, FsStore, MemoryStore, Resolver, SiteStore};
use serde_json::json;
use std::sync::Arc;

struct CannedBackend;

#[async_trait]
impl GenerativeBackend for CannedBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        assert!(request.contents.contains("Coffee shop landing page"));
        Ok(json!({
            "title": "Bean There Coffee",
            "description": "Neighbourhood roastery",
            "slug": "Bean There!",
            "html": "<main class=\"p-8\"><h1>Bean There</h1></main>",
            "css": "h1 { letter-spacing: .05em; }",
            "tailwind": true,
            "scripts": "",
            "assets": [{ "path": "/img/hero.jpg", "alt": "Espresso pour" }],
            "mobileFirst": true
        })
        .to_string())
    }
}

fn title_of(document: &str) -> &str {
    let start = document.find("<title>").unwrap() + "<title>".len();
    let end = document[start..].find("</title>").unwrap() + start;
    &document[start..end]
}

async fn run_scenario(backend: Arc<dyn launchkit_store::DocumentStore>) {
    let owner = OwnerId::new("u1").unwrap();
    let generator = Generator::new(Arc::new(CannedBackend));
    let store = SiteStore::for_owner(backend.clone(), &owner);
    let resolver = Resolver::new(backend);

    let content = generator.generate("Coffee shop landing page").await.unwrap();
    assert!(content.tailwind_enabled);
    assert_eq!(content.slug, "bean-there");

    let record = store
        .create(&owner, "Coffee shop landing page", content.clone())
        .await
        .unwrap();
    assert!(!record.is_published);
    let address = parse_address(&format!("/#{}", record.address().encode())).unwrap();

    assert!(matches!(
        resolver.resolve_address(&address).await,
        Err(Error::NotPublished)
    ));

    store.publish(&owner, &record.id).await.unwrap();
    let resolved = resolver.resolve_address(&address).await.unwrap();
    assert_eq!(resolved, content);

    let document = render_document(&resolved, &RenderOptions::default());
    assert_eq!(title_of(&document), resolved.title);
    assert!(document.contains(&resolved.html));
    assert!(document.contains("cdn.tailwindcss.com"));
}

#[tokio::test]
async fn test_scenario_in_memory() {
    run_scenario(Arc::new(MemoryStore::default())).await;
}

#[tokio::test]
async fn test_scenario_on_disk() {
    let dir = tempfile::TempDir::new().unwrap();
    run_scenario(Arc::new(FsStore::new(dir.path(), AccessRules::default()))).await;
}

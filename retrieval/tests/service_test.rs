//! Integration tests for the retrieval service.
//!
//! The embedding provider is replaced by a keyword counter so every score is
//! predictable, and the corpus download goes to a local mock server.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use lore_embeddings::{Embedding, EmbeddingError, EmbeddingProvider};
use lore_retrieval::{RetrievalConfig, RetrievalError, RetrievalService};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FAQ: &str = "# Swiss FAQ\nWelcome aboard.\n\
## Fruit policy\nFruit is not allowed.\n\
## Pet policy\nPets travel in the cabin.\n\
## Baggage rules\nOne bag per pet or fruit basket.\n";

const KEYWORDS: [&str; 3] = ["fruit", "pet", "baggage"];

/// Embeds text as keyword occurrence counts and records every call.
#[derive(Default)]
struct KeywordProvider {
    calls: AtomicUsize,
    texts: AtomicUsize,
    fail: bool,
}

impl KeywordProvider {
    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for KeywordProvider {
    fn name(&self) -> &str {
        "keyword"
    }

    fn model(&self) -> &str {
        "keyword-counts"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn embed_batch(&self, texts: &[String]) -> lore_embeddings::Result<Vec<Embedding>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts.fetch_add(texts.len(), Ordering::SeqCst);
        if self.fail {
            return Err(EmbeddingError::ApiRequest("provider down".to_string()));
        }

        Ok(texts
            .iter()
            .map(|text| {
                let lower = text.to_lowercase();
                KEYWORDS
                    .iter()
                    .map(|keyword| lower.matches(keyword).count() as f32)
                    .collect()
            })
            .collect())
    }
}

fn config_in(dir: &TempDir) -> RetrievalConfig {
    RetrievalConfig::new(dir.path()).with_corpus_url("http://127.0.0.1:9/unreachable.md")
}

fn write_corpus(config: &RetrievalConfig, text: &str) {
    std::fs::write(&config.corpus_path, text).unwrap();
}

#[tokio::test]
async fn test_query_ranks_by_similarity() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    write_corpus(&config, FAQ);

    let service = RetrievalService::new(config, Arc::new(KeywordProvider::default()));
    let hits = service.query("fruit", 2).await.unwrap();

    assert_eq!(hits.len(), 2);
    assert!(hits[0].document.content.contains("Fruit policy"));
    assert!(hits[1].document.content.contains("Baggage rules"));
    assert_eq!(hits[0].similarity, 2.0);
    assert_eq!(hits[1].similarity, 1.0);
}

#[tokio::test]
async fn test_query_returns_k_non_increasing_hits() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    write_corpus(&config, FAQ);

    let service = RetrievalService::new(config, Arc::new(KeywordProvider::default()));
    let corpus_size = service.documents().await.unwrap().len();
    assert_eq!(corpus_size, 4);

    for k in 1..=corpus_size {
        let hits = service.query("pet fruit", k).await.unwrap();
        assert_eq!(hits.len(), k);
        assert!(hits.windows(2).all(|w| w[0].similarity >= w[1].similarity));
    }
}

#[tokio::test]
async fn test_k_beyond_corpus_returns_everything() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    write_corpus(&config, FAQ);

    let service = RetrievalService::new(config, Arc::new(KeywordProvider::default()));
    let hits = service.query("baggage", 50).await.unwrap();

    assert_eq!(hits.len(), 4);
    assert!(hits[0].document.content.contains("Baggage rules"));
    assert!(hits.windows(2).all(|w| w[0].similarity >= w[1].similarity));
}

#[tokio::test]
async fn test_query_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    write_corpus(&config, FAQ);

    let service = RetrievalService::new(config, Arc::new(KeywordProvider::default()));
    let first = service.query("pets and baggage", 2).await.unwrap();
    let second = service.query("pets and baggage", 2).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_zero_k_is_a_validation_error() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    write_corpus(&config, FAQ);

    let provider = Arc::new(KeywordProvider::default());
    let service = RetrievalService::new(config, provider.clone());
    let result = service.query("fruit", 0).await;

    assert!(matches!(result, Err(RetrievalError::Validation(_))));
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_ensure_vectors_embeds_once() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    write_corpus(&config, FAQ);

    let provider = Arc::new(KeywordProvider::default());
    let service = RetrievalService::new(config.clone(), provider.clone());

    service.ensure_vectors().await.unwrap();
    service.ensure_vectors().await.unwrap();

    assert_eq!(provider.calls(), 1);
    assert_eq!(provider.texts.load(Ordering::SeqCst), 4);
    assert!(config.vectors_path.exists());

    // A fresh service reads the persisted vectors instead of embedding.
    let reloaded = Arc::new(KeywordProvider::default());
    let service = RetrievalService::new(config, reloaded.clone());
    assert_eq!(service.ensure_vectors().await.unwrap().len(), 4);
    assert_eq!(reloaded.calls(), 0);
}

#[tokio::test]
async fn test_corpus_change_invalidates_cache() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    write_corpus(&config, FAQ);

    let first = Arc::new(KeywordProvider::default());
    RetrievalService::new(config.clone(), first.clone())
        .ensure_vectors()
        .await
        .unwrap();
    assert_eq!(first.calls(), 1);

    write_corpus(&config, &format!("{FAQ}## Meals\nFruit salad on long flights.\n"));

    let second = Arc::new(KeywordProvider::default());
    let service = RetrievalService::new(config, second.clone());
    assert_eq!(service.ensure_vectors().await.unwrap().len(), 5);
    assert_eq!(second.calls(), 1);
}

#[tokio::test]
async fn test_truncated_cache_is_rebuilt() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    write_corpus(&config, FAQ);
    std::fs::write(&config.vectors_path, r#"{"key":"abc","mod"#).unwrap();

    let provider = Arc::new(KeywordProvider::default());
    let service = RetrievalService::new(config.clone(), provider.clone());
    let hits = service.query("fruit", 1).await.unwrap();

    assert!(hits[0].document.content.contains("Fruit policy"));
    assert_eq!(provider.calls(), 2);

    let reloaded = Arc::new(KeywordProvider::default());
    RetrievalService::new(config, reloaded.clone())
        .ensure_vectors()
        .await
        .unwrap();
    assert_eq!(reloaded.calls(), 0);
}

#[tokio::test]
async fn test_embedding_failure_surfaces() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    write_corpus(&config, FAQ);

    let service = RetrievalService::new(config.clone(), Arc::new(KeywordProvider::failing()));
    let result = service.query("fruit", 1).await;

    assert!(matches!(result, Err(RetrievalError::Embedding(_))));
    assert!(!config.vectors_path.exists());
}

#[tokio::test]
async fn test_lookup_joins_best_chunks() {
    let dir = TempDir::new().unwrap();
    let config = config_in(&dir);
    write_corpus(&config, FAQ);

    let service = RetrievalService::new(config, Arc::new(KeywordProvider::default()));
    let answer = service.lookup("fruit").await.unwrap();

    assert_eq!(
        answer,
        "\n## Fruit policy\nFruit is not allowed.\n\n\n## Baggage rules\nOne bag per pet or fruit basket.\n"
    );
}

#[tokio::test]
async fn test_corpus_is_downloaded_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/swiss_faq.md"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FAQ))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = RetrievalConfig::new(dir.path().join("data"))
        .with_corpus_url(format!("{}/swiss_faq.md", server.uri()));

    let service = RetrievalService::new(config.clone(), Arc::new(KeywordProvider::default()));
    service.ensure_corpus().await.unwrap();
    service.ensure_corpus().await.unwrap();

    assert_eq!(std::fs::read_to_string(&config.corpus_path).unwrap(), FAQ);

    let hits = service.query("pet", 1).await.unwrap();
    assert!(hits[0].document.content.contains("Pet policy"));
}

#[tokio::test]
async fn test_fetch_failure_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = RetrievalConfig::new(dir.path())
        .with_corpus_url(format!("{}/missing.md", server.uri()));

    let service = RetrievalService::new(config.clone(), Arc::new(KeywordProvider::default()));
    let result = service.query("fruit", 1).await;

    match result {
        Err(RetrievalError::Fetch { reason, .. }) => assert!(reason.contains("404")),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(!config.corpus_path.exists());
}

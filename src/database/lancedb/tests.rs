use super::*;
use crate::test_support::{CountingEmbedder, FailingEmbedder, HashEmbedder, sample_chunks};
use std::fs;
use tempfile::TempDir;

fn store_config(temp_dir: &TempDir) -> VectorStoreConfig {
    VectorStoreConfig {
        persist_directory: temp_dir.path().join("vector_store"),
        collection_name: "manuals".to_string(),
        force_rebuild: false,
        top_k: 3,
    }
}

#[test]
fn embedding_record_gets_unique_id_and_timestamp() {
    let chunk = sample_chunks().remove(0);

    let first = EmbeddingRecord::new(chunk.clone(), vec![0.1, 0.2]);
    let second = EmbeddingRecord::new(chunk, vec![0.1, 0.2]);

    assert_ne!(first.id, second.id);
    assert!(chrono::DateTime::parse_from_rfc3339(&first.created_at).is_ok());
}

#[test]
fn embed_chunks_keeps_order() {
    let chunks = sample_chunks();

    let records = embed_chunks(&chunks, &HashEmbedder).expect("embedding should succeed");

    assert_eq!(records.len(), chunks.len());
    for (record, chunk) in records.iter().zip(&chunks) {
        assert_eq!(&record.chunk, chunk);
        assert_eq!(record.vector, HashEmbedder::vector(&chunk.content));
    }
}

#[test]
fn embed_failure_is_a_store_error() {
    let result = embed_chunks(&sample_chunks(), &FailingEmbedder);
    assert!(matches!(result, Err(RagError::Store(msg)) if msg.contains("unavailable")));
}

#[tokio::test]
async fn second_build_or_load_embeds_nothing() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = store_config(&temp_dir);
    let chunks = sample_chunks();
    let embedder = CountingEmbedder::default();

    let first = build_or_load(&chunks, &config, &embedder)
        .await
        .expect("first build should succeed");
    assert_eq!(embedder.documents_embedded(), chunks.len());
    assert_eq!(first.count().await.expect("count"), chunks.len());
    drop(first);

    let second = build_or_load(&chunks, &config, &embedder)
        .await
        .expect("second load should succeed");
    assert_eq!(embedder.documents_embedded(), chunks.len());
    assert_eq!(second.count().await.expect("count"), chunks.len());
}

#[tokio::test]
async fn existing_store_loads_even_without_chunks() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = store_config(&temp_dir);

    build_or_load(&sample_chunks(), &config, &HashEmbedder)
        .await
        .expect("build should succeed");

    let store = build_or_load(&[], &config, &HashEmbedder)
        .await
        .expect("load should not need chunks");
    assert_eq!(store.collection_name(), "manuals");
}

#[tokio::test]
async fn force_rebuild_replaces_contents() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = store_config(&temp_dir);
    let embedder = CountingEmbedder::default();

    build_or_load(&sample_chunks(), &config, &embedder)
        .await
        .expect("build should succeed");

    config.force_rebuild = true;
    let fewer = &sample_chunks()[..2];
    let store = build_or_load(fewer, &config, &embedder)
        .await
        .expect("rebuild should succeed");

    assert_eq!(store.count().await.expect("count"), 2);
    assert_eq!(embedder.documents_embedded(), sample_chunks().len() + 2);
}

#[tokio::test]
async fn missing_store_with_no_chunks_is_a_config_error() {
    let temp_dir = TempDir::new().expect("should create temp dir");

    let result = build_or_load(&[], &store_config(&temp_dir), &HashEmbedder).await;

    assert!(matches!(result, Err(RagError::Config(_))));
}

#[tokio::test]
async fn unusable_collection_is_rebuilt() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = store_config(&temp_dir);
    let junk = config.persist_directory.join("manuals.lance");
    fs::create_dir_all(&junk).expect("should create junk dir");
    fs::write(junk.join("_versions"), b"not a lance dataset").expect("should write junk");

    assert!(!matches!(
        VectorStore::open(&config.persist_directory, "manuals").await,
        OpenOutcome::Opened(_)
    ));

    let embedder = CountingEmbedder::default();
    let store = build_or_load(&sample_chunks(), &config, &embedder)
        .await
        .expect("rebuild should succeed");

    assert_eq!(embedder.documents_embedded(), sample_chunks().len());
    assert_eq!(store.count().await.expect("count"), sample_chunks().len());
}

#[tokio::test]
async fn failed_rebuild_keeps_previous_collection() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut config = store_config(&temp_dir);

    build_or_load(&sample_chunks(), &config, &HashEmbedder)
        .await
        .expect("build should succeed");

    config.force_rebuild = true;
    let result = build_or_load(&sample_chunks(), &config, &FailingEmbedder).await;
    assert!(result.is_err());

    match VectorStore::open(&config.persist_directory, "manuals").await {
        OpenOutcome::Opened(store) => {
            assert_eq!(store.count().await.expect("count"), sample_chunks().len());
        }
        other => panic!("previous collection should survive, got {:?}", other),
    }
}

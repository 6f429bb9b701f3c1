#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// End-to-end tests driving the client against a real SQLite database.
// A deterministic bag-of-words embedder stands in for the Ollama
// collaborator, so word overlap between texts translates directly into
// cosine similarity.

use async_trait::async_trait;
use std::sync::Arc;
use tempfile::TempDir;

use docvec::Client;
use docvec::DocvecError;
use docvec::config::{Config, JoinPolicy};
use docvec::documents::models::DocumentInput;
use docvec::embeddings::EmbeddingProvider;
use docvec::storage::{BoundQuery, SqlValue, SqliteEngine, StorageEngine};

const DIMS: usize = 64;

fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init()
        .ok();
}

fn embed_words(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0f32; DIMS];
    for word in text.to_lowercase().split_whitespace() {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in word.bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x100_0000_01b3);
        }
        vector[(hash % DIMS as u64) as usize] += 1.0;
    }

    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }
    vector
}

struct HashEmbedder;

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> docvec::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| embed_words(text)).collect())
    }
}

async fn create_test_client(join_policy: JoinPolicy) -> (TempDir, Client, Arc<SqliteEngine>) {
    init_test_tracing();

    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let mut config = Config::load(temp_dir.path()).expect("Failed to load config");
    config.storage.embedding_dimensions = DIMS;
    config.storage.join_policy = join_policy;

    let engine = Arc::new(
        SqliteEngine::new(config.database_path())
            .await
            .expect("Failed to create engine"),
    );
    engine
        .ensure_schema(&config.storage)
        .await
        .expect("Failed to create schema");

    let storage: Arc<dyn StorageEngine> = Arc::clone(&engine);
    let client = Client::with_collaborators(config, storage, Arc::new(HashEmbedder));

    (temp_dir, client, engine)
}

fn seed_corpus() -> Vec<DocumentInput> {
    vec![
        DocumentInput::new(
            "PS5 review",
            "The Sony PlayStation 5 delivers stunning graphics and very fast loading times.",
        ),
        DocumentInput::new(
            "Gardening guide",
            "Tomatoes need sunlight, water, and patience to thrive in a backyard garden.",
        ),
        DocumentInput::new(
            "Rust notes",
            "Ownership and borrowing make programs memory safe without garbage collection.",
        ),
    ]
}

// Scenario A: ingesting a document yields at least one point, each owned by
// the new document.
#[tokio::test]
async fn add_returns_points_owned_by_the_new_document() {
    let (_temp_dir, client, _engine) = create_test_client(JoinPolicy::Inner).await;

    let ingested = client
        .add(vec![DocumentInput::new(
            "PS5 review",
            "The Sony PlayStation 5 delivers stunning graphics.",
        )])
        .await
        .expect("Failed to ingest");

    assert_eq!(ingested.len(), 1);
    let entry = &ingested[0];
    assert!(!entry.points.is_empty());
    for point in &entry.points {
        assert_eq!(point.document_id, entry.document.document_id);
    }

    let stored = client
        .get_document(&entry.document.document_id)
        .await
        .expect("Failed to fetch")
        .expect("Document should exist");
    assert_eq!(stored.name, "PS5 review");
}

// Scenario B: querying for the document's words ranks it first with the
// maximum score.
#[tokio::test]
async fn search_ranks_the_matching_document_first() {
    let (_temp_dir, client, _engine) = create_test_client(JoinPolicy::Inner).await;
    client.add(seed_corpus()).await.expect("Failed to ingest");

    let hits = client
        .search("Sony PlayStation 5", 10)
        .await
        .expect("Search failed");

    assert!(!hits.is_empty());
    let top = &hits[0];
    let top_document = top.document.as_ref().expect("document present");
    assert_eq!(top_document.name, "PS5 review");
    assert!(
        hits.iter().all(|hit| hit.score <= top.score),
        "top hit must carry the maximum score"
    );
    assert!(top.score > 0.3, "top score was {}", top.score);
}

// Scenario C: removing the top document changes the winner and nothing
// references the removed id anymore.
#[tokio::test]
async fn remove_then_search_never_surfaces_the_removed_document() {
    let (_temp_dir, client, _engine) = create_test_client(JoinPolicy::Inner).await;
    client.add(seed_corpus()).await.expect("Failed to ingest");

    let hits = client
        .search("Sony PlayStation 5", 10)
        .await
        .expect("Search failed");
    let removed_id = hits[0]
        .document
        .as_ref()
        .expect("document present")
        .document_id
        .clone();

    let removed = client.remove(&removed_id).await.expect("Failed to remove");
    assert!(removed);

    let hits = client
        .search("Sony PlayStation 5", 10)
        .await
        .expect("Search failed");
    assert!(!hits.is_empty());
    assert_ne!(
        hits[0]
            .document
            .as_ref()
            .expect("document present")
            .document_id,
        removed_id
    );
    for hit in &hits {
        assert_ne!(hit.point.document_id, removed_id);
    }
}

// Scenario D: an empty corpus yields an empty result, not a fault.
#[tokio::test]
async fn search_on_empty_corpus_returns_no_hits() {
    let (_temp_dir, client, _engine) = create_test_client(JoinPolicy::Inner).await;

    let hits = client
        .search("anything at all", 5)
        .await
        .expect("Search on empty corpus must succeed");

    assert!(hits.is_empty());
}

// P1: the result list never exceeds top_k.
#[tokio::test]
async fn results_are_bounded_by_top_k() {
    let (_temp_dir, client, _engine) = create_test_client(JoinPolicy::Inner).await;
    client.add(seed_corpus()).await.expect("Failed to ingest");

    for top_k in [1, 2, 10] {
        let hits = client
            .search("sunlight water garden", top_k)
            .await
            .expect("Search failed");
        assert!(hits.len() <= top_k);
    }
}

// P2 and P3: descending score order, and every hit's point and document
// agree on the document id.
#[tokio::test]
async fn results_are_ordered_and_referentially_consistent() {
    let (_temp_dir, client, _engine) = create_test_client(JoinPolicy::Inner).await;
    client.add(seed_corpus()).await.expect("Failed to ingest");

    let hits = client
        .search("memory safe garden graphics", 10)
        .await
        .expect("Search failed");

    for pair in hits.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    for hit in &hits {
        let document = hit.document.as_ref().expect("inner join implies document");
        assert_eq!(hit.point.document_id, document.document_id);
    }
}

// P4 and P5: metadata is always a map, and embeddings are either empty or
// full-width depending on the request.
#[tokio::test]
async fn embedding_projection_is_caller_controlled() {
    let (_temp_dir, client, _engine) = create_test_client(JoinPolicy::Inner).await;
    client.add(seed_corpus()).await.expect("Failed to ingest");

    let query = embed_words("Sony PlayStation 5");

    let hits = client
        .vector_search(&query, 10, false)
        .await
        .expect("Search failed");
    assert!(!hits.is_empty());
    for hit in &hits {
        assert!(hit.point.embedding.is_empty());
        assert!(hit.point.metadata.is_empty());
        assert!(
            hit.document
                .as_ref()
                .expect("document present")
                .metadata
                .is_empty()
        );
    }

    let hits = client
        .vector_search(&query, 10, true)
        .await
        .expect("Search failed");
    for hit in &hits {
        assert_eq!(hit.point.embedding.len(), DIMS);
    }
}

// P7: removing an id that never existed is a successful no-op.
#[tokio::test]
async fn remove_unknown_id_succeeds_without_side_effects() {
    let (_temp_dir, client, _engine) = create_test_client(JoinPolicy::Inner).await;
    client.add(seed_corpus()).await.expect("Failed to ingest");

    let removed = client
        .remove("doc-never-existed")
        .await
        .expect("Remove must not fail");
    assert!(!removed);

    let hits = client
        .search("Sony PlayStation 5", 10)
        .await
        .expect("Search failed");
    assert!(!hits.is_empty(), "corpus must be untouched");
}

async fn insert_orphan_point(engine: &SqliteEngine, embedding: &[f32]) {
    let embedding_json = serde_json::to_string(embedding).expect("Failed to encode embedding");
    engine
        .execute(
            BoundQuery::new(
                "INSERT INTO points (point_id, document_id, chunk_index, chunk_text, embedding, metadata) \
                 VALUES ('pt-orphan', 'doc-gone', 0, 'orphaned chunk', ?, NULL)",
            )
            .bind(SqlValue::Text(embedding_json)),
        )
        .await
        .expect("Failed to insert orphan point");
}

// The inner join silently drops orphaned points; result cardinality shrinks
// and every surviving hit carries a document.
#[tokio::test]
async fn inner_join_drops_orphaned_points() {
    let (_temp_dir, client, engine) = create_test_client(JoinPolicy::Inner).await;
    client.add(seed_corpus()).await.expect("Failed to ingest");

    insert_orphan_point(&engine, &embed_words("orphaned chunk text")).await;

    let hits = client
        .search("orphaned chunk text", 10)
        .await
        .expect("Search failed");

    assert!(hits.iter().all(|hit| hit.point.point_id != "pt-orphan"));
    assert!(hits.iter().all(|hit| hit.document.is_some()));

    let report = client
        .validate_integrity()
        .await
        .expect("Failed to validate");
    assert_eq!(report.orphaned_points.len(), 1);
}

// The left join surfaces orphaned points with an absent document.
#[tokio::test]
async fn left_join_surfaces_orphaned_points() {
    let (_temp_dir, client, engine) = create_test_client(JoinPolicy::Left).await;
    client.add(seed_corpus()).await.expect("Failed to ingest");

    insert_orphan_point(&engine, &embed_words("orphaned chunk text")).await;

    let hits = client
        .search("orphaned chunk text", 10)
        .await
        .expect("Search failed");

    let orphan = hits
        .iter()
        .find(|hit| hit.point.point_id == "pt-orphan")
        .expect("orphan should surface under a left join");
    assert!(orphan.document.is_none());
    assert_eq!(orphan.point.document_id, "doc-gone");

    let removed = client
        .cleanup_orphaned_points()
        .await
        .expect("Failed to clean up");
    assert_eq!(removed, 1);

    let hits = client
        .search("orphaned chunk text", 10)
        .await
        .expect("Search failed");
    assert!(hits.iter().all(|hit| hit.point.point_id != "pt-orphan"));
}

#[tokio::test]
async fn input_contract_violations_fail_fast() {
    let (_temp_dir, client, _engine) = create_test_client(JoinPolicy::Inner).await;

    let result = client.search("   ", 5).await;
    assert!(matches!(result, Err(DocvecError::Validation(_))));

    let result = client.vector_search(&[1.0, 0.0], 5, false).await;
    assert!(matches!(result, Err(DocvecError::Validation(_))));

    let wrong_k = client.vector_search(&embed_words("anything"), 0, false).await;
    assert!(matches!(wrong_k, Err(DocvecError::Validation(_))));
}

use super::*;
use sqlx::sqlite::SqlitePoolOptions;
use tempfile::TempDir;

async fn create_test_pool() -> (TempDir, SqlitePool) {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let db_path = temp_dir.path().join("test.db");

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(
            sqlx::sqlite::SqliteConnectOptions::new()
                .filename(&db_path)
                .create_if_missing(true),
        )
        .await
        .expect("Failed to create test pool");

    sqlx::raw_sql(include_str!("../migrations/001_initial_schema.sql"))
        .execute(&pool)
        .await
        .expect("Failed to run migrations");

    (temp_dir, pool)
}

fn document(content: &str, embedding: Option<Vec<f32>>) -> NewRecord {
    NewRecord {
        collection: Collection::Documents,
        content: content.to_string(),
        embedding,
        metadata: RecordMetadata {
            filename: Some(format!("{}.pdf", content)),
            ..RecordMetadata::default()
        },
    }
}

#[tokio::test]
async fn record_create_and_get() {
    let (_temp_dir, pool) = create_test_pool().await;

    let created = RecordQueries::create(&pool, document("alpha", Some(vec![1.0, 0.0])))
        .await
        .expect("Failed to create record");

    assert_eq!(created.collection, Collection::Documents);
    assert_eq!(created.content, "alpha");
    assert_eq!(created.embedding.as_deref(), Some("[1.0,0.0]"));
    assert!(Uuid::parse_str(&created.id).is_ok());

    let fetched = RecordQueries::get_by_id(&pool, &created.id)
        .await
        .expect("Failed to get record")
        .expect("Record should exist");
    assert_eq!(fetched, created);

    let missing = RecordQueries::get_by_id(&pool, "does-not-exist")
        .await
        .expect("Query should succeed");
    assert!(missing.is_none());
}

#[tokio::test]
async fn list_preserves_insertion_order_per_collection() {
    let (_temp_dir, pool) = create_test_pool().await;

    for name in ["first", "second", "third"] {
        RecordQueries::create(&pool, document(name, Some(vec![0.1])))
            .await
            .expect("Failed to create record");
    }
    RecordQueries::create(
        &pool,
        NewRecord {
            collection: Collection::Resources,
            content: "resource".to_string(),
            embedding: None,
            metadata: RecordMetadata::default(),
        },
    )
    .await
    .expect("Failed to create record");

    let documents = RecordQueries::list_by_collection(&pool, Collection::Documents)
        .await
        .expect("Failed to list");
    let contents: Vec<&str> = documents.iter().map(|r| r.content.as_str()).collect();
    assert_eq!(contents, vec!["first", "second", "third"]);

    let resources = RecordQueries::list_by_collection(&pool, Collection::Resources)
        .await
        .expect("Failed to list");
    assert_eq!(resources.len(), 1);
    assert!(resources[0].embedding.is_none());

    let qa = RecordQueries::list_by_collection(&pool, Collection::QaLog)
        .await
        .expect("Failed to list");
    assert!(qa.is_empty());
}

#[tokio::test]
async fn count_and_delete_collection() {
    let (_temp_dir, pool) = create_test_pool().await;

    RecordQueries::create(&pool, document("one", None))
        .await
        .expect("Failed to create record");
    RecordQueries::create(&pool, document("two", None))
        .await
        .expect("Failed to create record");

    assert_eq!(
        RecordQueries::count_by_collection(&pool, Collection::Documents)
            .await
            .expect("count"),
        2
    );

    let deleted = RecordQueries::delete_collection(&pool, Collection::Documents)
        .await
        .expect("delete");
    assert_eq!(deleted, 2);
    assert_eq!(
        RecordQueries::count_by_collection(&pool, Collection::Documents)
            .await
            .expect("count"),
        0
    );
}

#[tokio::test]
async fn collection_is_stored_as_snake_case_text() {
    let (_temp_dir, pool) = create_test_pool().await;

    RecordQueries::create(
        &pool,
        NewRecord::qa_pair(
            &QaPair {
                question: "q".to_string(),
                answer: "a".to_string(),
            },
            None,
        ),
    )
    .await
    .expect("Failed to create record");

    let raw: String = sqlx::query_scalar("SELECT collection FROM records")
        .fetch_one(&pool)
        .await
        .expect("raw select");
    assert_eq!(raw, "qa_log");
}

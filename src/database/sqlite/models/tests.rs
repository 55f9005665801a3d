use chrono::Utc;

use super::*;

fn stored(embedding: Option<&str>) -> StoredRecord {
    StoredRecord {
        id: "rec-1".to_string(),
        collection: Collection::Documents,
        content: "Some passage".to_string(),
        embedding: embedding.map(str::to_string),
        metadata: r#"{"filename":"guide.pdf"}"#.to_string(),
        created_at: Utc::now().naive_utc(),
    }
}

#[test]
fn collection_display_and_parse() {
    assert_eq!(Collection::Documents.to_string(), "Documents");
    assert_eq!(Collection::Resources.to_string(), "Resources");
    assert_eq!(Collection::QaLog.to_string(), "QaLog");

    assert_eq!("documents".parse::<Collection>(), Ok(Collection::Documents));
    assert_eq!("Resources".parse::<Collection>(), Ok(Collection::Resources));
    assert_eq!("qa-log".parse::<Collection>(), Ok(Collection::QaLog));
    assert_eq!("QaLog".parse::<Collection>(), Ok(Collection::QaLog));
    assert!("sites".parse::<Collection>().is_err());
}

#[test]
fn default_search_order() {
    assert_eq!(
        Collection::SEARCH_ORDER,
        [Collection::Resources, Collection::Documents, Collection::QaLog]
    );
}

#[test]
fn valid_embedding_is_accepted() {
    let record = stored(Some("[0.1, 0.2, 0.3]"))
        .into_embedding_record()
        .expect("record should validate");

    assert_eq!(record.embedding, vec![0.1, 0.2, 0.3]);
    assert_eq!(record.metadata.filename.as_deref(), Some("guide.pdf"));
}

#[test]
fn missing_embedding_is_rejected() {
    assert!(stored(None).into_embedding_record().is_none());
}

#[test]
fn non_array_embedding_is_rejected() {
    assert!(stored(Some(r#""not a vector""#)).into_embedding_record().is_none());
    assert!(stored(Some(r#"{"values": [1, 2]}"#)).into_embedding_record().is_none());
    assert!(stored(Some("[1, \"two\", 3]")).into_embedding_record().is_none());
    assert!(stored(Some("[]")).into_embedding_record().is_none());
    assert!(stored(Some("garbage")).into_embedding_record().is_none());
}

#[test]
fn unreadable_metadata_falls_back_to_default() {
    let mut row = stored(Some("[1.0]"));
    row.metadata = "not json".to_string();

    let record = row.into_embedding_record().expect("record should validate");
    assert_eq!(record.metadata, RecordMetadata::default());
}

#[test]
fn qa_pair_record_shape() {
    let pair = QaPair {
        question: "What is parental alienation?".to_string(),
        answer: "It is ...".to_string(),
    };

    let record = NewRecord::qa_pair(&pair, Some(vec![0.5, 0.5]));
    assert_eq!(record.collection, Collection::QaLog);
    assert_eq!(record.content, "It is ...");
    assert_eq!(record.metadata.question.as_deref(), Some("What is parental alienation?"));
    assert_eq!(record.embedding, Some(vec![0.5, 0.5]));
}

#[test]
fn metadata_skips_empty_fields() {
    let metadata = RecordMetadata {
        title: Some("False Allegations".to_string()),
        ..RecordMetadata::default()
    };
    let json = serde_json::to_string(&metadata).expect("metadata serializes");
    assert_eq!(json, r#"{"title":"False Allegations"}"#);
}

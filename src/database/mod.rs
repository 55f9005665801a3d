// Database module
// SQLite document store holding every embedded record across the collections

pub mod sqlite;

pub use sqlite::models::{
    Collection, CollectionStats, EmbeddingRecord, NewRecord, QaPair, RecordMetadata, StoredRecord,
};
pub use sqlite::{CollectionScan, Database};

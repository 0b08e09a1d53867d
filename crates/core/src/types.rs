/// Documents are keyed by time-ordered UUIDs (v7).
pub type DocumentId = uuid::Uuid;

/// Owner identity: the `sub` claim of the caller's bearer token.
pub type UserId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

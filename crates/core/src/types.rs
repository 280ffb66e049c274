/// Scene and overlay identifiers are opaque strings (`scene_<uuid>` etc.).
pub type Id = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

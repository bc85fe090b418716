//! Database schema and migrations for Post Box.
//!
//! Migrations are applied in order when the database is first opened or
//! upgraded. The schema_version table tracks which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: key-value documents
    r#"
-- Whole JSON documents addressed by a record name
CREATE TABLE kv_store (
    key         TEXT PRIMARY KEY,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
];

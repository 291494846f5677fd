//! Database schema definitions.
//!
//! Versions are additive: each migration only adds columns or indexes, so
//! rows written by an older client stay readable with the new columns `NULL`.

/// Highest schema version this build knows how to read and write.
pub const LATEST_SCHEMA_VERSION: i64 = 3;

/// SQL to create the migration ledger
pub const CREATE_SCHEMA_MIGRATIONS_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
)
"#;

/// v1: base table keyed by id, with the denormalized lookup columns indexed
pub const MIGRATION_001_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS pokemon (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    type1 TEXT,
    type2 TEXT,
    weight REAL,
    height REAL,
    payload TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_pokemon_name ON pokemon(name);
CREATE INDEX IF NOT EXISTS idx_pokemon_type1 ON pokemon(type1);
CREATE INDEX IF NOT EXISTS idx_pokemon_type2 ON pokemon(type2);
CREATE INDEX IF NOT EXISTS idx_pokemon_weight ON pokemon(weight);
CREATE INDEX IF NOT EXISTS idx_pokemon_height ON pokemon(height);
"#;

/// v2: species payload fetched alongside the primary payload
pub const MIGRATION_002_SQL: &str = r#"
ALTER TABLE pokemon ADD COLUMN species_payload TEXT;
"#;

/// v3: write timestamp stamped on every put
pub const MIGRATION_003_SQL: &str = r#"
ALTER TABLE pokemon ADD COLUMN cached_at TEXT;
"#;

/// All migrations in order, paired with the version they bring the store to
pub const MIGRATIONS: &[(i64, &str)] = &[
    (1, MIGRATION_001_SQL),
    (2, MIGRATION_002_SQL),
    (3, MIGRATION_003_SQL),
];

//! Local persistent cache for offline data access.
//!
//! This module provides the `PokemonStore` for storing and retrieving
//! Pokémon payloads in SQLite. Records never expire; they are replaced when
//! the same id is written again and removed only by an explicit delete or
//! clear.
//!
//! - `record`: the `Record` shape plus raw-object validation (`format`)
//! - `schema`: additive schema versions and their migrations
//! - `store`: the SQLite-backed store itself

pub mod cached;
pub mod error;
pub mod record;
pub mod schema;
pub mod store;

pub use cached::CachedData;
pub use error::{CacheError, CacheResult};
pub use record::{format, raw_from_payload, Record};
pub use schema::LATEST_SCHEMA_VERSION;
pub use store::PokemonStore;

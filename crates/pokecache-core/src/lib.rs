//! pokecache-core - offline-first cache for PokeAPI data.
//!
//! The crate is split bottom-up:
//!
//! - `cache`: the versioned SQLite store (`PokemonStore`) and the `Record`
//!   shape it persists
//! - `api`: the HTTP client and the `CatalogSource` seam it implements
//! - `resolver`: cache-or-fetch lookups and bulk catalog population
//!
//! ```no_run
//! use std::sync::Arc;
//! use pokecache_core::{ApiClient, PokemonStore, Resolver};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let store = Arc::new(PokemonStore::open(std::path::Path::new("pokecache.db"))?);
//! let resolver = Resolver::new(store, ApiClient::new()?);
//! if let Some(pikachu) = resolver.resolve("Pikachu").await {
//!     println!("{}", pikachu.into_json());
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cache;
pub mod models;
pub mod resolver;
pub mod utils;

pub use api::{ApiClient, ApiError, CatalogSource};
pub use cache::{CacheError, CachedData, PokemonStore, Record};
pub use models::{CatalogEntry, ResolveSource, ResolvedPokemon};
pub use resolver::{PopulateProgress, PopulateSettings, Query, Resolver};

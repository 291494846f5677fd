//! Data models for PokeAPI entities.
//!
//! Payloads are kept as raw `serde_json::Value` so the cache stores exactly
//! what the API returned. This module only adds the small typed views the
//! cache needs: catalog listing entries and the resolved lookup result.

pub mod pokemon;

pub use pokemon::{
    is_valid_payload, species_url, type_name, CatalogEntry, CatalogPage, ResolveSource,
    ResolvedPokemon, SPECIES_FIELD,
};

//! REST client module for PokeAPI.
//!
//! `CatalogSource` is the seam between the resolver and the network:
//! `ApiClient` implements it over HTTP, tests implement it in memory.

pub mod client;
pub mod error;

pub use client::{ApiClient, CatalogSource, DEFAULT_API_BASE_URL};
pub use error::ApiError;

//! API client for communicating with PokeAPI.
//!
//! This module provides the `ApiClient` struct for fetching Pokémon payloads,
//! the species resources they reference, and the full catalog index.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::models::{CatalogEntry, CatalogPage};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the public PokeAPI
pub const DEFAULT_API_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// Page size used for the catalog index request. Large enough to return the
/// whole catalog in a single response.
const CATALOG_LIMIT: u32 = 100_000;

/// Network operations the resolver depends on.
///
/// Every failure (transport error, non-2xx status, undecodable body) comes
/// back as an `ApiError`; implementations never retry.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch the primary payload for a normalized name or id.
    async fn fetch_pokemon(&self, query: &str) -> Result<Value, ApiError>;

    /// Fetch an arbitrary JSON resource by absolute URL (species, catalog entries).
    async fn fetch_url(&self, url: &str) -> Result<Value, ApiError>;

    /// Fetch the flat `{name, url}` list of every Pokémon.
    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, ApiError>;
}

/// HTTP client for PokeAPI.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client against the public PokeAPI
    pub fn new() -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_API_BASE_URL)
    }

    /// Create a client against a different base URL (mirror or local fixture server)
    pub fn with_base_url(base_url: &str) -> Result<Self, ApiError> {
        // No request timeout; the transport's own limits apply
        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn pokemon_url(&self, query: &str) -> String {
        format!("{}/pokemon/{}", self.base_url, query)
    }

    fn catalog_url(&self) -> String {
        format!("{}/pokemon?limit={}&offset=0", self.base_url, CATALOG_LIMIT)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn get<T: DeserializeOwned>(&self, url: &str) -> Result<T, ApiError> {
        debug!(url = url, "GET");
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let response = Self::check_response(response).await?;

        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }
}

#[async_trait]
impl CatalogSource for ApiClient {
    async fn fetch_pokemon(&self, query: &str) -> Result<Value, ApiError> {
        self.get(&self.pokemon_url(query)).await
    }

    async fn fetch_url(&self, url: &str) -> Result<Value, ApiError> {
        self.get(url).await
    }

    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, ApiError> {
        let page: CatalogPage = self.get(&self.catalog_url()).await?;
        debug!(
            count = ?page.count,
            received = page.results.len(),
            "Catalog index received"
        );
        Ok(page.results)
    }
}

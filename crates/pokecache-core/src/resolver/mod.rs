//! Cache-or-fetch resolution of Pokémon lookups.
//!
//! `Resolver::resolve` checks the store first and only goes to the network
//! on a miss. Network results, along with their species payload when that
//! fetch succeeds, are written back to the store before being returned.
//! Nothing here returns an error to the caller: failed lookups are `None`.

mod populate;
mod query;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::CatalogSource;
use crate::cache::{format, raw_from_payload, PokemonStore};
use crate::models::{species_url, ResolveSource, ResolvedPokemon};

pub use populate::{
    PopulateProgress, PopulateSettings, DEFAULT_BATCH_DELAY_MS, DEFAULT_BATCH_SIZE,
};
pub use query::Query;

pub struct Resolver<S> {
    store: Arc<PokemonStore>,
    source: S,
    settings: PopulateSettings,
}

impl<S: CatalogSource> Resolver<S> {
    pub fn new(store: Arc<PokemonStore>, source: S) -> Self {
        Self {
            store,
            source,
            settings: PopulateSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: PopulateSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn store(&self) -> &PokemonStore {
        &self.store
    }

    /// Store-only lookup; never touches the network.
    pub fn cached(&self, raw_query: &str) -> Option<ResolvedPokemon> {
        Query::parse(raw_query).and_then(|query| self.lookup(&query))
    }

    /// Resolve a name or id to its payload, preferring the store.
    ///
    /// A store hit returns immediately. On a miss the payload is fetched,
    /// followed by its species resource if it references one; both are
    /// cached. A failed primary fetch yields `None`. A failed species fetch
    /// or cache write does not prevent the payload from being returned.
    pub async fn resolve(&self, raw_query: &str) -> Option<ResolvedPokemon> {
        let Some(query) = Query::parse(raw_query) else {
            debug!("Ignoring blank query");
            return None;
        };

        if let Some(hit) = self.lookup(&query) {
            info!(query = %query, "Retrieved Pokémon from store");
            return Some(hit);
        }
        debug!(query = %query, "Not in store, fetching from API");

        match self.source.fetch_pokemon(&query.as_path()).await {
            Ok(payload) => {
                info!(query = %query, "Fetched Pokémon from API");
                Some(self.complete(payload).await.0)
            }
            Err(e) if e.is_not_found() => {
                info!(query = %query, "Pokémon not found");
                None
            }
            Err(e) => {
                warn!(query = %query, error = %e, "Pokémon lookup failed");
                None
            }
        }
    }

    fn lookup(&self, query: &Query) -> Option<ResolvedPokemon> {
        self.store
            .get_cached(query)
            .map(|found| found.into_inner().into_resolved())
    }

    /// Fetch the species payload (best effort) and write everything back.
    /// Returns the resolved Pokémon and whether the store write succeeded.
    async fn complete(&self, payload: Value) -> (ResolvedPokemon, bool) {
        let species = match species_url(&payload) {
            Some(url) => match self.source.fetch_url(url).await {
                Ok(species) => Some(species),
                Err(e) => {
                    warn!(url, error = %e, "Species fetch failed, caching without it");
                    None
                }
            },
            None => None,
        };

        let stored = self.write_back(&payload, species.as_ref());
        let resolved = ResolvedPokemon {
            payload,
            species,
            source: ResolveSource::Network,
        };
        (resolved, stored)
    }

    fn write_back(&self, payload: &Value, species: Option<&Value>) -> bool {
        match format(&raw_from_payload(payload, species)) {
            // put logs its own failures
            Ok(record) => self.store.put(&record).is_ok(),
            Err(e) => {
                warn!(error = %e, "Fetched payload failed validation, not cached");
                false
            }
        }
    }
}

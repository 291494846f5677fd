//! In-memory `CatalogSource` for resolver tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::api::{ApiError, CatalogSource};
use crate::models::CatalogEntry;

pub const POKEMON_BASE: &str = "https://pokeapi.test/api/v2/pokemon";
pub const SPECIES_BASE: &str = "https://pokeapi.test/api/v2/pokemon-species";

pub fn pokemon_payload(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "weight": id * 10,
        "height": id,
        "types": [{"slot": 1, "type": {"name": "water", "url": "https://pokeapi.test/api/v2/type/11/"}}],
    })
}

/// Serves canned payloads by URL and counts every request.
#[derive(Default)]
pub struct FakeSource {
    routes: Mutex<HashMap<String, Value>>,
    failing: Mutex<HashSet<String>>,
    catalog: Mutex<Option<Vec<CatalogEntry>>>,
    primary_calls: AtomicUsize,
    url_calls: AtomicUsize,
    catalog_calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
    finished: AtomicUsize,
    // (url, fetches already finished when this one started)
    url_starts: Mutex<Vec<(String, usize)>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pokemon_url(&self, query: &str) -> String {
        format!("{}/{}", POKEMON_BASE, query)
    }

    /// Register a Pokémon reachable by id, by name and by its catalog URL.
    pub fn add_pokemon(&self, id: i64, name: &str, with_species: bool) -> CatalogEntry {
        let mut payload = pokemon_payload(id, name);
        let species_url = format!("{}/{}/", SPECIES_BASE, id);
        if with_species {
            payload["species"] = json!({"name": name, "url": species_url});
        }

        let catalog_url = format!("{}/{}/", POKEMON_BASE, id);
        let mut routes = self.routes.lock().expect("routes lock");
        routes.insert(self.pokemon_url(&id.to_string()), payload.clone());
        routes.insert(self.pokemon_url(name), payload.clone());
        routes.insert(catalog_url.clone(), payload);
        if with_species {
            routes.insert(
                species_url,
                json!({"id": id, "name": name, "flavor_text_entries": []}),
            );
        }

        CatalogEntry {
            name: name.to_string(),
            url: catalog_url,
        }
    }

    pub fn set_catalog(&self, entries: Vec<CatalogEntry>) {
        *self.catalog.lock().expect("catalog lock") = Some(entries);
    }

    pub fn fail_url(&self, url: &str) {
        self.failing.lock().expect("failing lock").insert(url.to_string());
    }

    pub fn primary_calls(&self) -> usize {
        self.primary_calls.load(Ordering::SeqCst)
    }

    pub fn url_calls(&self) -> usize {
        self.url_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.primary_calls() + self.url_calls() + self.catalog_calls.load(Ordering::SeqCst)
    }

    /// Most `fetch_url` calls ever outstanding at once.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    pub fn url_starts(&self) -> Vec<(String, usize)> {
        self.url_starts.lock().expect("starts lock").clone()
    }

    fn serve(&self, url: &str) -> Result<Value, ApiError> {
        if self.failing.lock().expect("failing lock").contains(url) {
            return Err(ApiError::ServerError(format!("injected failure for {}", url)));
        }
        self.routes
            .lock()
            .expect("routes lock")
            .get(url)
            .cloned()
            .ok_or_else(|| ApiError::NotFound(url.to_string()))
    }
}

#[async_trait]
impl CatalogSource for FakeSource {
    async fn fetch_pokemon(&self, query: &str) -> Result<Value, ApiError> {
        self.primary_calls.fetch_add(1, Ordering::SeqCst);
        self.serve(&self.pokemon_url(query))
    }

    async fn fetch_url(&self, url: &str) -> Result<Value, ApiError> {
        self.url_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        self.url_starts
            .lock()
            .expect("starts lock")
            .push((url.to_string(), self.finished.load(Ordering::SeqCst)));

        // Stay pending for one poll so sibling fetches get to start
        tokio::task::yield_now().await;

        let result = self.serve(url);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);
        result
    }

    async fn fetch_catalog(&self) -> Result<Vec<CatalogEntry>, ApiError> {
        self.catalog_calls.fetch_add(1, Ordering::SeqCst);
        self.catalog
            .lock()
            .expect("catalog lock")
            .clone()
            .ok_or_else(|| ApiError::ServerError("catalog unavailable".into()))
    }
}

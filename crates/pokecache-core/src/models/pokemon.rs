use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Field under which the species payload is attached by [`ResolvedPokemon::into_json`].
pub const SPECIES_FIELD: &str = "species_data";

/// One entry of the catalog index (`GET /pokemon?limit=..`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogEntry {
    pub name: String,
    pub url: String,
}

/// Paged list response returned by the catalog endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogPage {
    #[serde(default)]
    pub count: Option<u64>,
    #[serde(default)]
    pub results: Vec<CatalogEntry>,
}

/// Where a resolved Pokémon came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolveSource {
    Cache,
    Network,
}

/// Result of a successful lookup.
///
/// `species` is kept separate from the primary payload: a lookup whose
/// species fetch failed still resolves, with `species` left as `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPokemon {
    pub payload: Value,
    pub species: Option<Value>,
    pub source: ResolveSource,
}

impl ResolvedPokemon {
    pub fn id(&self) -> Option<i64> {
        self.payload.get("id").and_then(Value::as_i64)
    }

    pub fn name(&self) -> Option<&str> {
        self.payload.get("name").and_then(Value::as_str)
    }

    /// Flatten into a single JSON object with the species payload attached
    /// under [`SPECIES_FIELD`].
    pub fn into_json(self) -> Value {
        let mut payload = self.payload;
        if let (Some(species), Value::Object(map)) = (self.species, &mut payload) {
            map.insert(SPECIES_FIELD.to_string(), species);
        }
        payload
    }
}

/// URL of the species resource referenced by a Pokémon payload, if any.
pub fn species_url(payload: &Value) -> Option<&str> {
    payload
        .get("species")
        .and_then(|s| s.get("url"))
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
}

/// Name of the type in the given slot position (0 = primary, 1 = secondary).
pub fn type_name(payload: &Value, position: usize) -> Option<&str> {
    payload
        .get("types")?
        .as_array()?
        .get(position)?
        .get("type")?
        .get("name")?
        .as_str()
}

/// A payload is usable when it is a non-empty object carrying `id` and `name`.
pub fn is_valid_payload(payload: &Value) -> bool {
    match payload {
        Value::Object(map) => {
            !map.is_empty()
                && map.get("id").is_some_and(|v| !v.is_null())
                && map.get("name").is_some_and(|v| !v.is_null())
        }
        _ => false,
    }
}

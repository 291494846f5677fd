//! The cached record shape and the raw-object formatting that feeds it.
//!
//! Raw objects are loose JSON maps with the keys `id`, `name`, `type1`,
//! `type2`, `weight`, `height`, `payload` and `species_payload`. `format`
//! validates and normalizes them into a [`Record`]; `Record::to_raw` goes the
//! other way.

use serde_json::{json, Map, Value};

use crate::models::{type_name, ResolvedPokemon, ResolveSource};
use crate::utils::{coerce_number, sanitize_field};

use super::error::{CacheError, CacheResult};

/// One cached Pokémon.
///
/// `payload` is the API response exactly as received. The other fields are
/// copied out of it for indexing and are not checked against it.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: i64,
    pub name: String,
    pub primary_type: Option<String>,
    pub secondary_type: Option<String>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub payload: Value,
    pub species: Option<Value>,
}

impl Record {
    /// Project back into raw form. `format(&record.to_raw())` yields `record`.
    pub fn to_raw(&self) -> Value {
        let mut raw = Map::new();
        raw.insert("id".into(), json!(self.id));
        raw.insert("name".into(), json!(self.name));
        raw.insert("type1".into(), json!(self.primary_type));
        raw.insert("type2".into(), json!(self.secondary_type));
        raw.insert("weight".into(), json!(self.weight));
        raw.insert("height".into(), json!(self.height));
        raw.insert("payload".into(), self.payload.clone());
        raw.insert(
            "species_payload".into(),
            self.species.clone().unwrap_or(Value::Null),
        );
        Value::Object(raw)
    }

    /// True when the record carries a payload worth serving from cache.
    pub fn has_payload(&self) -> bool {
        match &self.payload {
            Value::Null => false,
            Value::Object(map) => !map.is_empty(),
            _ => true,
        }
    }

    pub fn into_resolved(self) -> ResolvedPokemon {
        ResolvedPokemon {
            payload: self.payload,
            species: self.species,
            source: ResolveSource::Cache,
        }
    }
}

/// Validate and normalize a raw object into a [`Record`].
///
/// Requires a positive integral `id` and a non-empty `name`. String fields
/// are sanitized, numeric fields are coerced (non-numeric becomes `None`),
/// and the payloads pass through untouched. Pure and idempotent.
pub fn format(raw: &Value) -> CacheResult<Record> {
    let Value::Object(map) = raw else {
        return Err(CacheError::Validation("expected a JSON object".into()));
    };

    let id = coerce_id(map.get("id"))
        .ok_or_else(|| CacheError::Validation("missing or invalid id".into()))?;

    let name = sanitize_field(map.get("name"))
        .ok_or_else(|| CacheError::Validation(format!("missing or invalid name for id {}", id)))?;

    Ok(Record {
        id,
        name,
        primary_type: sanitize_field(map.get("type1")),
        secondary_type: sanitize_field(map.get("type2")),
        weight: coerce_number(map.get("weight")),
        height: coerce_number(map.get("height")),
        payload: map.get("payload").cloned().unwrap_or(Value::Null),
        species: map.get("species_payload").filter(|v| !v.is_null()).cloned(),
    })
}

/// Positive integral id. Integers and integer strings are taken exactly;
/// only other numeric forms (e.g. `7.0`) go through `f64`.
fn coerce_id(value: Option<&Value>) -> Option<i64> {
    let exact = match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    exact
        .or_else(|| {
            coerce_number(value)
                .filter(|n| n.fract() == 0.0 && n.abs() < i64::MAX as f64)
                .map(|n| n as i64)
        })
        .filter(|id| *id >= 1)
}

/// Build the raw object for a freshly fetched payload: name lowercased,
/// type names and physical attributes copied out of the payload.
pub fn raw_from_payload(payload: &Value, species: Option<&Value>) -> Value {
    let name = payload
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_lowercase);

    json!({
        "id": payload.get("id").cloned().unwrap_or(Value::Null),
        "name": name,
        "type1": type_name(payload, 0),
        "type2": type_name(payload, 1),
        "weight": payload.get("weight").cloned().unwrap_or(Value::Null),
        "height": payload.get("height").cloned().unwrap_or(Value::Null),
        "payload": payload,
        "species_payload": species.cloned().unwrap_or(Value::Null),
    })
}

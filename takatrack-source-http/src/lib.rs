//! Snapshot source for HTTP bin registries serving a JSON array of bins.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use takatrack_core::{
    config::SyncConfig,
    model::{Entity, EntityId, Location, Snapshot},
    ports::{FetchError, SnapshotPort},
};

/// Single bin record as served by the registry.
///
/// Fields stay loosely typed so one bad record is dropped instead of failing the batch.
#[derive(Debug, Deserialize)]
struct BinRecord {
    id: Option<Value>,
    #[serde(alias = "latitude")]
    lat: Option<Value>,
    #[serde(alias = "longitude")]
    lng: Option<Value>,
    location: Option<NestedLocation>,
    status: Option<Value>,
    area: Option<Value>,
}

/// Nested `location` object some registries use instead of top-level coordinates.
#[derive(Debug, Deserialize)]
struct NestedLocation {
    #[serde(alias = "latitude")]
    lat: Option<Value>,
    #[serde(alias = "longitude")]
    lng: Option<Value>,
}

/// Why a record did not make it into the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DropReason {
    NotAnObject,
    MissingId,
    BadLocation,
}

/// Fetches full-state snapshots from `GET <base>/<path>`.
pub struct HttpSnapshotSource {
    client: Client,
    endpoint: String,
}

impl HttpSnapshotSource {
    /// Create a source bound to the given HTTP client and endpoint URL.
    #[must_use]
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Build a client with the configured user agent and timeout, and bind it to the
    /// configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns a [`reqwest::Error`] if the HTTP client cannot be built.
    pub fn from_config(config: &SyncConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.fetch_timeout)
            .build()?;
        Ok(Self::new(client, config.endpoint()))
    }

    /// Endpoint this source reads from.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SnapshotPort for HttpSnapshotSource {
    fn describe(&self) -> String {
        self.endpoint.clone()
    }

    async fn fetch(&self) -> Result<Snapshot, FetchError> {
        let response = self.client.get(self.endpoint.as_str()).send().await?;

        // Redirects that reqwest did not follow and 304s carry no snapshot.
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }
        let body = response.bytes().await?;

        let document: Value = serde_json::from_slice(&body)
            .map_err(|err| FetchError::MalformedBody(format!("invalid JSON: {err}")))?;

        parse_snapshot(document)
    }
}

/// Turn a decoded response body into a validated snapshot.
fn parse_snapshot(document: Value) -> Result<Snapshot, FetchError> {
    let Value::Array(records) = document else {
        return Err(FetchError::MalformedBody(format!(
            "expected a JSON array, got {}",
            json_kind(&document)
        )));
    };

    let total = records.len();
    let mut entities = Vec::with_capacity(total);
    let mut dropped = 0;

    for (index, record) in records.into_iter().enumerate() {
        match entity_from_record(record) {
            Ok(entity) => entities.push(entity),
            Err(reason) => {
                dropped += 1;
                tracing::debug!(index, ?reason, "source: dropping bin record");
            }
        }
    }

    if dropped > 0 {
        tracing::debug!(total, dropped, "source: some bin records failed validation");
    }

    Snapshot::new(entities, dropped).map_err(FetchError::from)
}

fn entity_from_record(record: Value) -> Result<Entity, DropReason> {
    if !record.is_object() {
        return Err(DropReason::NotAnObject);
    }
    // Objects only fail here on coordinate conflicts (`lat` next to `latitude`)
    // or a `location` that is not an object.
    let record: BinRecord =
        serde_json::from_value(record).map_err(|_err| DropReason::BadLocation)?;

    let id = record
        .id
        .as_ref()
        .and_then(entity_id)
        .ok_or(DropReason::MissingId)?;

    let (lat, lng) = match (&record.lat, &record.lng, &record.location) {
        (Some(lat), Some(lng), _) => (lat.as_f64(), lng.as_f64()),
        (None, None, Some(nested)) => (
            nested.lat.as_ref().and_then(Value::as_f64),
            nested.lng.as_ref().and_then(Value::as_f64),
        ),
        _ => (None, None),
    };
    let location = lat
        .zip(lng)
        .and_then(|(lat, lng)| Location::new(lat, lng))
        .ok_or(DropReason::BadLocation)?;

    Ok(Entity {
        id,
        location,
        raw_status: record.status.as_ref().and_then(text),
        area: record.area.as_ref().and_then(text),
    })
}

/// Numeric and string ids normalize to the same identifier.
fn entity_id(raw: &Value) -> Option<EntityId> {
    match raw {
        Value::Number(number) => Some(EntityId(number.to_string())),
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| EntityId(trimmed.to_owned()))
        }
        _ => None,
    }
}

fn text(raw: &Value) -> Option<String> {
    raw.as_str().map(str::to_owned)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn ids(snapshot: &Snapshot) -> Vec<&str> {
        snapshot
            .entities()
            .iter()
            .map(|entity| entity.id.0.as_str())
            .collect()
    }

    #[test]
    fn accepts_flat_long_and_nested_coordinates() {
        let snapshot = parse_snapshot(json!([
            {"id": 1, "lat": -1.286, "lng": 36.817, "status": "Full", "area": "CBD"},
            {"id": "2", "latitude": -1.288, "longitude": 36.819, "status": "Empty"},
            {"id": 3, "location": {"lat": -1.289, "lng": 36.820}, "status": "Half"},
        ]))
        .expect("valid snapshot");

        assert_eq!(ids(&snapshot), ["1", "2", "3"]);
        assert_eq!(snapshot.dropped(), 0);
        let first = &snapshot.entities()[0];
        assert_eq!(first.raw_status.as_deref(), Some("Full"));
        assert_eq!(first.area.as_deref(), Some("CBD"));
        assert_eq!(snapshot.entities()[1].area, None);
    }

    #[test]
    fn drops_records_with_corrupt_coordinates() {
        let snapshot = parse_snapshot(json!([
            {"id": 1, "lat": null, "lng": 36.8, "status": "Full"},
            {"id": 2, "lat": "-1.2", "lng": 36.8},
            {"id": 3, "lng": 36.8},
            {"id": 4, "lat": 120.0, "lng": 36.8},
            {"id": 5, "location": {"lat": -1.2}},
            {"id": 6, "lat": -1.2, "lng": 36.8},
        ]))
        .expect("valid snapshot");

        assert_eq!(ids(&snapshot), ["6"]);
        assert_eq!(snapshot.dropped(), 5);
    }

    #[test]
    fn drops_records_without_usable_id_or_shape() {
        let snapshot = parse_snapshot(json!([
            {"lat": 0.0, "lng": 0.0},
            {"id": "  ", "lat": 0.0, "lng": 0.0},
            {"id": [1], "lat": 0.0, "lng": 0.0},
            "not a bin",
            {"id": 9, "lat": 0.0, "lng": 0.0},
        ]))
        .expect("valid snapshot");

        assert_eq!(ids(&snapshot), ["9"]);
        assert_eq!(snapshot.dropped(), 4);
    }

    #[test]
    fn conflicting_coordinate_keys_are_a_location_problem() {
        let reason = entity_from_record(json!(
            {"id": 1, "lat": 0.0, "latitude": 0.5, "lng": 0.0}
        ))
        .expect_err("both lat and latitude");
        assert_eq!(reason, DropReason::BadLocation);

        let reason = entity_from_record(json!({"id": 2, "location": "CBD"}))
            .expect_err("location is not an object");
        assert_eq!(reason, DropReason::BadLocation);

        let reason = entity_from_record(json!("not a bin")).expect_err("string record");
        assert_eq!(reason, DropReason::NotAnObject);
    }

    #[test]
    fn non_string_status_and_area_are_treated_as_absent() {
        let snapshot = parse_snapshot(json!([
            {"id": 1, "lat": 0.0, "lng": 0.0, "status": 3, "area": false},
        ]))
        .expect("valid snapshot");

        let entity = &snapshot.entities()[0];
        assert_eq!(entity.raw_status, None);
        assert_eq!(entity.area_label(), "Unknown");
    }

    #[test]
    fn non_array_body_is_malformed() {
        let err = parse_snapshot(json!({"bins": []})).expect_err("object body");
        assert!(
            matches!(err, FetchError::MalformedBody(ref reason) if reason.contains("an object")),
            "unexpected error: {err:?}"
        );
    }

    #[test]
    fn numeric_and_string_ids_collide_as_duplicates() {
        let err = parse_snapshot(json!([
            {"id": 7, "lat": 0.0, "lng": 0.0},
            {"id": "7", "lat": 1.0, "lng": 1.0},
        ]))
        .expect_err("duplicate id");
        assert!(
            matches!(err, FetchError::MalformedBody(ref reason) if reason.contains('7')),
            "unexpected error: {err:?}"
        );
    }
}

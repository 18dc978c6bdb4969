//! Domain data structures for bins, snapshots, alerts, and map viewports.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Area label used when the source does not provide one.
pub const UNKNOWN_AREA: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
/// Identifier for a collection point, unique within a snapshot.
pub struct EntityId(pub String);

impl fmt::Display for EntityId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl From<&str> for EntityId {
    fn from(raw: &str) -> Self {
        EntityId(raw.to_owned())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Geographic position in decimal degrees.
pub struct Location {
    /// Latitude, -90..=90.
    pub lat: f64,
    /// Longitude, -180..=180.
    pub lng: f64,
}

impl Location {
    /// Build a location, rejecting non-finite or out-of-range coordinates.
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Option<Self> {
        let valid = lat.is_finite()
            && lng.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lng);
        valid.then_some(Self { lat, lng })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A monitored collection point as reported by the data source.
pub struct Entity {
    /// Stable identifier.
    pub id: EntityId,
    /// Validated position.
    pub location: Location,
    /// Status exactly as the source sent it, if at all.
    pub raw_status: Option<String>,
    /// Optional human-readable area label.
    pub area: Option<String>,
}

impl Entity {
    /// Area label, falling back to [`UNKNOWN_AREA`] when absent or blank.
    #[must_use]
    pub fn area_label(&self) -> &str {
        self.area
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .unwrap_or(UNKNOWN_AREA)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Reasons a snapshot cannot be assembled.
pub enum SnapshotError {
    /// The same identifier occurred more than once.
    #[error("Duplicate entity id {0}")]
    DuplicateId(EntityId),
}

#[derive(Debug, Clone, PartialEq, Default)]
/// Full entity set produced by one fetch cycle.
///
/// A snapshot is immutable once built and replaces the previous one wholesale.
pub struct Snapshot {
    entities: Vec<Entity>,
    dropped: usize,
}

impl Snapshot {
    /// Assemble a snapshot from validated entities.
    ///
    /// `dropped` is the number of source records filtered out during validation.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::DuplicateId`] for the first identifier seen twice.
    pub fn new(entities: Vec<Entity>, dropped: usize) -> Result<Self, SnapshotError> {
        let mut seen = HashSet::with_capacity(entities.len());
        for entity in &entities {
            if !seen.insert(&entity.id) {
                return Err(SnapshotError::DuplicateId(entity.id.clone()));
            }
        }
        Ok(Self { entities, dropped })
    }

    /// Entities in source order.
    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Number of source records dropped for failing validation.
    #[must_use]
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the snapshot holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Normalized fill state of a collection point.
pub enum CanonicalState {
    /// Needs collection.
    Full,
    /// Partially filled (`half` or `pending` at the source).
    Pending,
    /// Empty.
    Empty,
    /// Missing or unrecognized status.
    Unknown,
}

impl CanonicalState {
    /// All states, in display order.
    pub const ALL: [CanonicalState; 4] = [
        CanonicalState::Full,
        CanonicalState::Pending,
        CanonicalState::Empty,
        CanonicalState::Unknown,
    ];
}

impl fmt::Display for CanonicalState {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CanonicalState::Full => "Full",
            CanonicalState::Pending => "Pending",
            CanonicalState::Empty => "Empty",
            CanonicalState::Unknown => "Unknown",
        };
        write!(formatter, "{label}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Marker color key consumed by the rendering surface.
pub enum DisplayToken {
    /// Full bins.
    Red,
    /// Pending bins.
    Yellow,
    /// Empty bins and bins with unknown status.
    Green,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Entity annotated with its classification.
pub struct ClassifiedEntity {
    /// The underlying entity.
    pub entity: Entity,
    /// Normalized state.
    pub state: CanonicalState,
    /// Marker color.
    pub token: DisplayToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Event emitted on the alert channel when a bin becomes full.
pub struct AlertEvent {
    /// Bin that triggered the alert.
    pub id: EntityId,
    /// Area label of the bin.
    pub area: String,
    /// Always [`CanonicalState::Full`].
    pub state: CanonicalState,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Extent of a viewport in degrees.
pub struct Span {
    /// Latitude extent.
    pub lat_delta: f64,
    /// Longitude extent.
    pub lng_delta: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Visible map region.
pub struct Viewport {
    /// Center of the region.
    pub center: Location,
    /// Size of the region.
    pub span: Span,
}

impl Viewport {
    /// South-west corner as `(lat, lng)`.
    #[must_use]
    pub fn south_west(&self) -> (f64, f64) {
        (
            self.center.lat - self.span.lat_delta / 2.0,
            self.center.lng - self.span.lng_delta / 2.0,
        )
    }

    /// North-east corner as `(lat, lng)`.
    #[must_use]
    pub fn north_east(&self) -> (f64, f64) {
        (
            self.center.lat + self.span.lat_delta / 2.0,
            self.center.lng + self.span.lng_delta / 2.0,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
/// Viewport command for the rendering surface.
pub enum ViewportUpdate {
    /// Frame the given region.
    Fit(Viewport),
    /// Nothing to frame; keep whatever is currently shown.
    Keep,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
/// Number of bins per state.
pub struct FleetSummary {
    /// Full bins.
    pub full: usize,
    /// Pending bins.
    pub pending: usize,
    /// Empty bins.
    pub empty: usize,
    /// Bins with unknown status.
    pub unknown: usize,
}

impl FleetSummary {
    /// Tally the states of the given entities.
    #[must_use]
    pub fn tally(entities: &[ClassifiedEntity]) -> Self {
        entities
            .iter()
            .fold(Self::default(), |mut summary, classified| {
                match classified.state {
                    CanonicalState::Full => summary.full += 1,
                    CanonicalState::Pending => summary.pending += 1,
                    CanonicalState::Empty => summary.empty += 1,
                    CanonicalState::Unknown => summary.unknown += 1,
                }
                summary
            })
    }

    /// Count for a single state.
    #[must_use]
    pub fn count(&self, state: CanonicalState) -> usize {
        match state {
            CanonicalState::Full => self.full,
            CanonicalState::Pending => self.pending,
            CanonicalState::Empty => self.empty,
            CanonicalState::Unknown => self.unknown,
        }
    }

    /// Total number of bins.
    #[must_use]
    pub fn total(&self) -> usize {
        self.full + self.pending + self.empty + self.unknown
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Everything the rendering surface needs after a completed cycle.
pub struct RenderFrame {
    /// Number of the cycle that produced this frame.
    pub cycle: u64,
    /// When the cycle was applied.
    pub refreshed_at: DateTime<Utc>,
    /// Classified entities in source order.
    pub entities: Vec<ClassifiedEntity>,
    /// Viewport command.
    pub viewport: ViewportUpdate,
    /// Per-state counts.
    pub summary: FleetSummary,
    /// Source records dropped during validation.
    pub dropped: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: &str, area: Option<&str>) -> Entity {
        Entity {
            id: EntityId::from(id),
            location: Location { lat: 0.0, lng: 0.0 },
            raw_status: None,
            area: area.map(str::to_owned),
        }
    }

    #[test]
    fn location_rejects_non_finite_and_out_of_range() {
        assert!(Location::new(f64::NAN, 0.0).is_none(), "NaN latitude");
        assert!(Location::new(0.0, f64::INFINITY).is_none(), "infinite longitude");
        assert!(Location::new(91.0, 0.0).is_none(), "latitude beyond pole");
        assert!(Location::new(0.0, -180.5).is_none(), "longitude beyond antimeridian");
        assert!(Location::new(-1.2921, 36.8219).is_some(), "Nairobi is valid");
    }

    #[test]
    fn area_label_defaults_to_unknown() {
        assert_eq!(entity("1", None).area_label(), "Unknown");
        assert_eq!(entity("1", Some("  ")).area_label(), "Unknown");
        assert_eq!(entity("1", Some("Kibera ")).area_label(), "Kibera");
    }

    #[test]
    fn snapshot_rejects_duplicate_ids() {
        let result = Snapshot::new(vec![entity("7", None), entity("8", None), entity("7", None)], 0);
        assert_eq!(result, Err(SnapshotError::DuplicateId(EntityId::from("7"))));
    }

    #[test]
    fn snapshot_keeps_order_and_drop_count() {
        let snapshot = Snapshot::new(vec![entity("b", None), entity("a", None)], 3)
            .expect("distinct ids");
        let ids: Vec<&str> = snapshot.entities().iter().map(|e| e.id.0.as_str()).collect();
        assert_eq!(ids, ["b", "a"]);
        assert_eq!(snapshot.dropped(), 3);
        assert_eq!(snapshot.len(), 2);
    }

    #[test]
    fn viewport_corners_surround_center() {
        let viewport = Viewport {
            center: Location { lat: 1.0, lng: 2.0 },
            span: Span {
                lat_delta: 0.5,
                lng_delta: 1.0,
            },
        };
        assert_eq!(viewport.south_west(), (0.75, 1.5));
        assert_eq!(viewport.north_east(), (1.25, 2.5));
    }
}

//! Sync engine turning fetched snapshots into render frames and alerts.

use chrono::{DateTime, Utc};

use crate::alerts::AlertDeduplicator;
use crate::bounds::{self, BoundsSettings};
use crate::classify::classify_entity;
use crate::model::{AlertEvent, ClassifiedEntity, FleetSummary, RenderFrame, Snapshot};

#[derive(Debug, Clone, PartialEq)]
/// Result of applying one snapshot.
pub struct CycleOutcome {
    /// Frame for the rendering surface.
    pub frame: RenderFrame,
    /// New alerts for the alert channel.
    pub alerts: Vec<AlertEvent>,
}

#[derive(Debug, Clone, PartialEq)]
/// Owns the last known good frame and the alert memory.
///
/// Only completed fetches are applied, so a failed cycle leaves this state untouched.
pub struct SyncEngine {
    bounds: BoundsSettings,
    dedup: AlertDeduplicator,
    last_frame: Option<RenderFrame>,
    applied: u64,
}

impl SyncEngine {
    /// Create an engine with empty state.
    #[must_use]
    pub fn new(bounds: BoundsSettings) -> Self {
        Self {
            bounds,
            dedup: AlertDeduplicator::new(),
            last_frame: None,
            applied: 0,
        }
    }

    /// Classify, deduplicate, and frame a freshly fetched snapshot.
    pub fn apply(&mut self, snapshot: &Snapshot, now: DateTime<Utc>) -> CycleOutcome {
        let entities: Vec<ClassifiedEntity> = snapshot
            .entities()
            .iter()
            .cloned()
            .map(classify_entity)
            .collect();

        let alerts = self.dedup.observe(&entities);
        let viewport = bounds::frame(
            entities.iter().map(|classified| &classified.entity.location),
            self.bounds,
        );

        let frame = RenderFrame {
            cycle: self.applied,
            refreshed_at: now,
            summary: FleetSummary::tally(&entities),
            entities,
            viewport,
            dropped: snapshot.dropped(),
        };
        self.applied += 1;
        self.last_frame = Some(frame.clone());

        CycleOutcome { frame, alerts }
    }

    /// Most recent frame produced from a successful fetch.
    #[must_use]
    pub fn last_frame(&self) -> Option<&RenderFrame> {
        self.last_frame.as_ref()
    }

    /// Alert memory, for diagnostics.
    #[must_use]
    pub fn alerts(&self) -> &AlertDeduplicator {
        &self.dedup
    }

    /// Number of snapshots applied so far.
    #[must_use]
    pub fn applied(&self) -> u64 {
        self.applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CanonicalState, DisplayToken, Entity, EntityId, Location, ViewportUpdate};

    fn bin(id: &str, lat: f64, lng: f64, status: Option<&str>) -> Entity {
        Entity {
            id: EntityId::from(id),
            location: Location { lat, lng },
            raw_status: status.map(str::to_owned),
            area: None,
        }
    }

    #[test]
    fn annotates_alerts_and_frames_snapshot() {
        let mut engine = SyncEngine::new(BoundsSettings::default());
        let snapshot = Snapshot::new(
            vec![
                bin("1", -1.286, 36.817, Some("Full")),
                bin("2", -1.300, 36.830, Some("half")),
                bin("3", -1.310, 36.825, None),
            ],
            2,
        )
        .expect("distinct ids");

        let outcome = engine.apply(&snapshot, Utc::now());

        let tokens: Vec<DisplayToken> = outcome
            .frame
            .entities
            .iter()
            .map(|classified| classified.token)
            .collect();
        assert_eq!(
            tokens,
            [DisplayToken::Red, DisplayToken::Yellow, DisplayToken::Green]
        );
        assert_eq!(outcome.alerts.len(), 1);
        assert_eq!(outcome.alerts[0].area, "Unknown");
        assert_eq!(outcome.frame.summary.count(CanonicalState::Unknown), 1);
        assert_eq!(outcome.frame.dropped, 2);
        assert!(matches!(outcome.frame.viewport, ViewportUpdate::Fit(_)));
        assert_eq!(engine.last_frame(), Some(&outcome.frame));
    }

    #[test]
    fn empty_snapshot_keeps_viewport() {
        let mut engine = SyncEngine::new(BoundsSettings::default());
        let outcome = engine.apply(&Snapshot::default(), Utc::now());
        assert_eq!(outcome.frame.viewport, ViewportUpdate::Keep);
        assert!(outcome.alerts.is_empty());
    }

    #[test]
    fn cycle_numbers_increase_per_applied_snapshot() {
        let mut engine = SyncEngine::new(BoundsSettings::default());
        let snapshot = Snapshot::new(vec![bin("1", 0.0, 0.0, Some("full"))], 0).expect("one bin");
        let first = engine.apply(&snapshot, Utc::now());
        let second = engine.apply(&snapshot, Utc::now());
        assert_eq!((first.frame.cycle, second.frame.cycle), (0, 1));
        assert!(second.alerts.is_empty(), "still full, no repeat alert");
        assert_eq!(engine.applied(), 2);
    }
}

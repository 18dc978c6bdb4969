//! Edge-triggered alerting for bins that become full.

use std::collections::HashMap;

use crate::model::{AlertEvent, CanonicalState, ClassifiedEntity, EntityId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Memo kept for a bin that was full the last time it was seen.
pub struct AlertRecord {
    /// Cycle in which the bin was last observed full.
    pub last_full_cycle: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// Decides which bins raise a new alert each cycle.
///
/// A bin alerts when it is observed full and was not full in the previous
/// cycle it was present in. Bins missing from a snapshot lose their record,
/// so they alert again if they come back full.
pub struct AlertDeduplicator {
    records: HashMap<EntityId, AlertRecord>,
    cycles: u64,
}

impl AlertDeduplicator {
    /// Create a deduplicator with no memory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one completed cycle and return the alerts it raises, in snapshot order.
    pub fn observe(&mut self, entities: &[ClassifiedEntity]) -> Vec<AlertEvent> {
        let cycle = self.cycles;
        self.cycles += 1;

        let mut alerts = Vec::new();
        let mut next = HashMap::with_capacity(self.records.len());

        for classified in entities {
            if classified.state != CanonicalState::Full {
                continue;
            }
            let id = &classified.entity.id;
            if !self.records.contains_key(id) && !next.contains_key(id) {
                alerts.push(AlertEvent {
                    id: id.clone(),
                    area: classified.entity.area_label().to_owned(),
                    state: CanonicalState::Full,
                });
            }
            next.insert(
                id.clone(),
                AlertRecord {
                    last_full_cycle: cycle,
                },
            );
        }

        // Bins that are gone or no longer full are forgotten here.
        self.records = next;
        alerts
    }

    /// Whether the bin is currently remembered as full.
    #[must_use]
    pub fn is_alerting(&self, id: &EntityId) -> bool {
        self.records.contains_key(id)
    }

    /// Record for a bin, if it is currently remembered as full.
    #[must_use]
    pub fn record(&self, id: &EntityId) -> Option<AlertRecord> {
        self.records.get(id).copied()
    }

    /// Number of bins remembered as full.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no bin is remembered as full.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of cycles observed so far.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.cycles
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::classify::classify_entity;
    use crate::model::{Entity, Location};

    fn bin(id: &str, status: &str) -> ClassifiedEntity {
        classify_entity(Entity {
            id: EntityId::from(id),
            location: Location {
                lat: -1.29,
                lng: 36.82,
            },
            raw_status: Some(status.to_owned()),
            area: Some(String::from("Westlands")),
        })
    }

    fn alerted_ids(alerts: &[AlertEvent]) -> Vec<&str> {
        alerts.iter().map(|alert| alert.id.0.as_str()).collect()
    }

    #[test]
    fn alerts_only_on_transition_into_full() {
        let mut dedup = AlertDeduplicator::new();
        let fired: Vec<usize> = ["Empty", "Full", "Full", "Empty", "Full"]
            .iter()
            .enumerate()
            .filter(|(_, status)| !dedup.observe(&[bin("x", status)]).is_empty())
            .map(|(cycle, _)| cycle)
            .collect();
        assert_eq!(fired, [1, 4]);
    }

    #[test]
    fn disappearance_resets_memory() {
        let mut dedup = AlertDeduplicator::new();
        assert_eq!(alerted_ids(&dedup.observe(&[bin("x", "full")])), ["x"]);
        assert!(dedup.observe(&[]).is_empty(), "absent bin never alerts");
        assert!(!dedup.is_alerting(&EntityId::from("x")));
        assert_eq!(alerted_ids(&dedup.observe(&[bin("x", "full")])), ["x"]);
    }

    #[test]
    fn alert_carries_area_and_keeps_snapshot_order() {
        let mut dedup = AlertDeduplicator::new();
        let alerts = dedup.observe(&[bin("b", "full"), bin("a", "half"), bin("c", "FULL")]);
        assert_eq!(alerted_ids(&alerts), ["b", "c"]);
        assert!(alerts.iter().all(|alert| alert.area == "Westlands"));
        assert!(alerts.iter().all(|alert| alert.state == CanonicalState::Full));
    }

    #[test]
    fn pending_or_unknown_clears_the_record() {
        let mut dedup = AlertDeduplicator::new();
        dedup.observe(&[bin("x", "full")]);
        dedup.observe(&[bin("x", "pending")]);
        assert!(dedup.is_empty());
        dedup.observe(&[bin("x", "full")]);
        dedup.observe(&[bin("x", "garbage")]);
        assert_eq!(alerted_ids(&dedup.observe(&[bin("x", "full")])), ["x"]);
    }

    #[test]
    fn record_tracks_last_full_cycle() {
        let mut dedup = AlertDeduplicator::new();
        dedup.observe(&[bin("x", "full")]);
        dedup.observe(&[bin("x", "full")]);
        assert_eq!(
            dedup.record(&EntityId::from("x")),
            Some(AlertRecord { last_full_cycle: 1 })
        );
        assert_eq!(dedup.cycles(), 2);
    }

    fn status_for(code: u8) -> &'static str {
        match code {
            0 => "full",
            1 => "half",
            2 => "empty",
            _ => "unknown",
        }
    }

    proptest! {
        /// `None` marks a cycle where the bin is missing from the snapshot.
        #[test]
        fn alerts_exactly_on_rising_edges(history in prop::collection::vec(prop::option::of(0u8..4), 1..40)) {
            let mut dedup = AlertDeduplicator::new();
            let mut previously_full = false;
            for observation in history {
                let snapshot: Vec<ClassifiedEntity> = observation
                    .map(|code| vec![bin("x", status_for(code))])
                    .unwrap_or_default();
                let now_full = observation == Some(0);
                let alerts = dedup.observe(&snapshot);
                prop_assert_eq!(alerts.len(), usize::from(now_full && !previously_full));
                previously_full = now_full;
            }
        }
    }
}

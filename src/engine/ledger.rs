use std::collections::{BTreeMap, HashMap};

use ulid::{Generator, Ulid};

use crate::model::*;

use super::EngineError;

/// Reservation records keyed by id. Ids come from a monotonic generator, so
/// key order is creation order.
pub struct Ledger {
    reservations: BTreeMap<Ulid, Reservation>,
    ids: Generator,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("reservations", &self.reservations.len())
            .finish()
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            reservations: BTreeMap::new(),
            ids: Generator::new(),
        }
    }

    pub fn next_id(&mut self) -> Result<Ulid, EngineError> {
        self.ids
            .generate()
            .map_err(|_| EngineError::LimitExceeded("reservation id space exhausted"))
    }

    pub fn insert(&mut self, reservation: Reservation) {
        self.reservations.insert(reservation.id, reservation);
    }

    pub fn get(&self, id: &Ulid) -> Option<&Reservation> {
        self.reservations.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: &Ulid) -> Option<&mut Reservation> {
        self.reservations.get_mut(id)
    }

    pub(crate) fn remove(&mut self, id: &Ulid) -> Option<Reservation> {
        self.reservations.remove(id)
    }

    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }

    /// All reservations in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Reservation> {
        self.reservations.values()
    }

    /// The live reservation holding or occupying each spot.
    pub fn live_by_spot(&self) -> HashMap<&SpotId, &Reservation> {
        self.iter()
            .filter(|r| r.status.is_live())
            .map(|r| (&r.spot_id, r))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reservation(ledger: &mut Ledger, spot: &str, status: ReservationStatus) -> Ulid {
        let id = ledger.next_id().unwrap();
        ledger.insert(Reservation {
            id,
            user: "u1".into(),
            descriptor: "ABC-1".into(),
            span: Span::new(0, 1),
            spot_id: SpotId::new(spot),
            gate: None,
            status,
        });
        id
    }

    #[test]
    fn ids_follow_creation_order() {
        let mut ledger = Ledger::new();
        let ids: Vec<_> = (0..50)
            .map(|_| reservation(&mut ledger, "S-1", ReservationStatus::Done))
            .collect();
        let listed: Vec<_> = ledger.iter().map(|r| r.id).collect();
        assert_eq!(listed, ids);
    }

    #[test]
    fn live_by_spot_ignores_terminal() {
        let mut ledger = Ledger::new();
        reservation(&mut ledger, "S-1", ReservationStatus::Canceled);
        let live = reservation(&mut ledger, "S-1", ReservationStatus::Waiting);
        reservation(&mut ledger, "S-2", ReservationStatus::Done);

        let map = ledger.live_by_spot();
        assert_eq!(map.len(), 1);
        assert_eq!(map[&SpotId::new("S-1")].id, live);
    }

    #[test]
    fn remove_deletes_record() {
        let mut ledger = Ledger::new();
        let id = reservation(&mut ledger, "S-1", ReservationStatus::Reserved);
        assert!(ledger.remove(&id).is_some());
        assert!(ledger.get(&id).is_none());
        assert!(ledger.is_empty());
    }
}

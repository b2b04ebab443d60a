use std::collections::BTreeMap;

use ulid::Ulid;

use crate::model::*;

use super::{class_slot, Engine};

impl Engine {
    /// Reservations in creation order, optionally filtered by status.
    pub fn list_reservations(&self, status: Option<ReservationStatus>) -> Vec<Reservation> {
        self.ledger
            .iter()
            .filter(|r| status.is_none_or(|s| r.status == s))
            .cloned()
            .collect()
    }

    /// Canceled and Done reservations.
    pub fn list_history(&self) -> Vec<Reservation> {
        self.ledger
            .iter()
            .filter(|r| r.status.is_terminal())
            .cloned()
            .collect()
    }

    /// Reserved, Waiting and Active reservations.
    pub fn list_live(&self) -> Vec<Reservation> {
        self.ledger
            .iter()
            .filter(|r| r.status.is_live())
            .cloned()
            .collect()
    }

    /// Reservations made by `user`. Ownership enforcement is up to the caller.
    pub fn list_for_user(&self, user: &str) -> Vec<Reservation> {
        self.ledger
            .iter()
            .filter(|r| r.user == user)
            .cloned()
            .collect()
    }

    pub fn get_reservation(&self, id: &Ulid) -> Option<Reservation> {
        self.ledger.get(id).cloned()
    }

    pub fn get_spot(&self, id: &SpotId) -> Option<Spot> {
        self.pool.get(id).cloned()
    }

    pub fn spots(&self) -> Vec<Spot> {
        self.pool.iter().cloned().collect()
    }

    /// Spots grouped by zone (ascending), each with the live reservation
    /// holding it, if any.
    pub fn overview(&self) -> Vec<ZoneOverview> {
        let live = self.ledger.live_by_spot();
        let mut zones: BTreeMap<u32, Vec<SpotOverview>> = BTreeMap::new();
        for spot in self.pool.iter() {
            let occupant = live.get(&spot.id);
            zones.entry(spot.zone).or_default().push(SpotOverview {
                spot_id: spot.id.clone(),
                class: spot.class,
                status: spot.status,
                user: occupant.map(|r| r.user.clone()),
                descriptor: occupant.map(|r| r.descriptor.clone()),
            });
        }
        zones
            .into_iter()
            .map(|(zone, spots)| ZoneOverview { zone, spots })
            .collect()
    }

    /// Valid tickets waiting in the admission queue.
    pub fn pending_check_ins(&self) -> usize {
        self.queue.pending()
    }

    /// Exact free spots per class, counted from the pool.
    pub fn free_counts(&self) -> FreeCounts {
        self.pool.free_counts()
    }

    /// Allocator size for a class. Includes stale entries, so this is an
    /// upper bound on free spots.
    pub fn allocator_pending(&self, class: SpotClass) -> usize {
        self.allocators[class_slot(class)].pending_count()
    }

    /// Gate ring from next-to-assign to most recently assigned.
    pub fn gate_order(&self) -> Vec<String> {
        self.gates.snapshot()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }
}

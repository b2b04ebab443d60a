mod allocator;
mod error;
mod ledger;
mod mutations;
mod queries;
mod queue;
mod store;
mod undo;
mod validate;

pub use allocator::SpotHeap;
pub use error::{EngineError, ErrorKind};
pub use ledger::Ledger;
pub use queue::{AdmissionQueue, GateRing, Ticket};
pub use store::SpotPool;
pub use undo::{UndoLog, UndoRecord};

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{validate_gates, LotConfig};
use crate::limits::MAX_SPOT_ID_LEN;
use crate::model::*;
use crate::notify::NotifyHub;
use crate::observability::record_lot_gauges;

/// One parking lot: spot pool, reservation ledger, per-class allocators,
/// admission queue, gate ring and undo log.
///
/// Every public method is one atomic step. All checks run before the first
/// write, so a returned error means nothing changed. Callers sharing an
/// engine must serialize whole calls (see `lots::SharedLot`).
#[derive(Debug)]
pub struct Engine {
    pub(super) pool: SpotPool,
    pub(super) ledger: Ledger,
    /// Indexed by `class_slot`.
    pub(super) allocators: [SpotHeap; 2],
    pub(super) queue: AdmissionQueue,
    pub(super) gates: GateRing,
    pub(super) undo: UndoLog,
    pub(super) hourly_rate: u64,
    pub notify: Arc<NotifyHub>,
    /// Initial layout, kept for `reset`.
    initial_pool: SpotPool,
    gate_names: Vec<String>,
}

pub(super) fn class_slot(class: SpotClass) -> usize {
    match class {
        SpotClass::Standard => 0,
        SpotClass::Electric => 1,
    }
}

impl Engine {
    /// Lot with the config's deterministic zone/index layout.
    pub fn new(config: &LotConfig, notify: Arc<NotifyHub>) -> Result<Self, EngineError> {
        config.validate()?;
        let pool = SpotPool::layout(
            config.zones,
            config.spots_per_zone,
            config.electric_per_zone,
        );
        let spots: Vec<Spot> = pool.iter().cloned().collect();
        let mut engine = Self::with_spots(spots, config.gates.clone(), notify)?;
        engine.hourly_rate = config.hourly_rate;
        Ok(engine)
    }

    /// Lot with an explicit spot list. Spots start Free whatever status
    /// they carry.
    pub fn with_spots(
        spots: Vec<Spot>,
        gates: Vec<String>,
        notify: Arc<NotifyHub>,
    ) -> Result<Self, EngineError> {
        validate_gates(&gates)?;
        if spots
            .iter()
            .any(|s| s.id.as_str().is_empty() || s.id.as_str().len() > MAX_SPOT_ID_LEN)
        {
            return Err(EngineError::InvalidConfig("spot id empty or too long"));
        }
        let pool = SpotPool::new(
            spots
                .into_iter()
                .map(|s| Spot::new(s.id, s.zone, s.class))
                .collect(),
        )?;

        let mut engine = Self {
            pool: pool.clone(),
            ledger: Ledger::new(),
            allocators: [SpotHeap::new(), SpotHeap::new()],
            queue: AdmissionQueue::new(),
            gates: GateRing::filled(&gates),
            undo: UndoLog::new(),
            hourly_rate: LotConfig::default().hourly_rate,
            notify,
            initial_pool: pool,
            gate_names: gates,
        };
        engine.admit_all();
        engine.refresh_gauges();
        tracing::info!(
            "lot initialized: {} spots, {} gates",
            engine.pool.len(),
            engine.gates.len()
        );
        Ok(engine)
    }

    /// Back to the initial layout: every spot Free, no reservations, empty
    /// queue and undo log, gates in configured order.
    pub fn reset(&mut self) {
        self.pool = self.initial_pool.clone();
        self.ledger = Ledger::new();
        self.allocators = [SpotHeap::new(), SpotHeap::new()];
        self.queue = AdmissionQueue::new();
        self.gates = GateRing::filled(&self.gate_names);
        self.undo = UndoLog::new();
        self.admit_all();
        self.refresh_gauges();
        tracing::info!("lot reset");
    }

    pub fn hourly_rate(&self) -> u64 {
        self.hourly_rate
    }

    fn admit_all(&mut self) {
        for spot in self.pool.iter() {
            self.allocators[class_slot(spot.class)].admit(spot);
        }
    }

    /// Mark a spot Free and hand it back to its class allocator.
    pub(super) fn release_spot(&mut self, spot_id: &SpotId) {
        self.pool.set_status(spot_id, SpotStatus::Free);
        if let Some(spot) = self.pool.get(spot_id) {
            self.allocators[class_slot(spot.class)].admit(spot);
        }
    }

    pub(super) fn refresh_gauges(&self) {
        record_lot_gauges(self.pool.free_counts(), self.queue.pending());
    }

    /// Broadcast to subscribers of the spot's zone.
    pub(super) fn publish(&self, spot_id: &SpotId, event: LotEvent) {
        if let Some(spot) = self.pool.get(spot_id) {
            self.notify.send(spot.zone, &event);
        }
    }

    /// Cross-component consistency check. Returns a description of every
    /// violated invariant; empty means consistent.
    pub fn consistency_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();
        let live = self.ledger.live_by_spot();

        let mut holders: HashMap<&SpotId, usize> = HashMap::new();
        for r in self.ledger.iter().filter(|r| r.status.is_live()) {
            *holders.entry(&r.spot_id).or_default() += 1;
        }
        for (spot_id, n) in holders {
            if n > 1 {
                violations.push(format!("spot {spot_id} claimed by {n} live reservations"));
            }
        }

        for spot in self.pool.iter() {
            let expected = match live.get(&spot.id).map(|r| r.status) {
                None => SpotStatus::Free,
                Some(ReservationStatus::Reserved | ReservationStatus::Waiting) => SpotStatus::Held,
                Some(ReservationStatus::Active) => SpotStatus::InUse,
                Some(ReservationStatus::Canceled | ReservationStatus::Done) => SpotStatus::Free,
            };
            if spot.status != expected {
                violations.push(format!(
                    "spot {} is {:?}, reservations imply {:?}",
                    spot.id, spot.status, expected
                ));
            }
        }

        for r in self.ledger.iter() {
            let waiting = r.status == ReservationStatus::Waiting;
            if self.queue.is_pending(&r.id) != waiting {
                violations.push(format!(
                    "reservation {} is {} but queued={}",
                    r.id,
                    r.status,
                    self.queue.is_pending(&r.id)
                ));
            }
        }
        if self.queue.pending() > self.ledger.len() {
            violations.push("admission queue holds tickets for unknown reservations".into());
        }

        let mut ring = self.gates.snapshot();
        ring.sort();
        let mut configured = self.gate_names.clone();
        configured.sort();
        if ring != configured {
            violations.push(format!("gate ring {ring:?} differs from {configured:?}"));
        }

        violations
    }
}

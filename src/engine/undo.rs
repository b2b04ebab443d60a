use tracing::{info, warn};
use ulid::Ulid;

use crate::model::*;
use crate::observability::record_undo;

use super::validate::undo_guard;
use super::{Engine, EngineError};

/// One successful mutating call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoRecord {
    pub kind: OpKind,
    pub reservation_id: Ulid,
}

/// LIFO of undo records. There is no redo.
#[derive(Debug, Default)]
pub struct UndoLog {
    records: Vec<UndoRecord>,
}

impl UndoLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: OpKind, reservation_id: Ulid) {
        self.records.push(UndoRecord {
            kind,
            reservation_id,
        });
    }

    pub fn pop(&mut self) -> Option<UndoRecord> {
        self.records.pop()
    }

    pub fn peek(&self) -> Option<&UndoRecord> {
        self.records.last()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Engine {
    /// Revert the most recent mutating call.
    ///
    /// The record is consumed whether or not the reversal succeeds. Each
    /// reversal first checks that the lot is still exactly in the state the
    /// original call left it in; if not, nothing changes and
    /// `UndoRejected` is returned.
    pub fn undo_last(&mut self) -> Result<UndoRecord, EngineError> {
        let Some(record) = self.undo.pop() else {
            let result: Result<UndoRecord, EngineError> = Err(EngineError::NothingToUndo);
            record_undo(None, &result);
            return result;
        };
        let id = record.reservation_id;
        let result = match record.kind {
            OpKind::Reserve => self.undo_reserve(id),
            OpKind::Cancel => self.undo_cancel(id),
            OpKind::RequestCheckIn => self.undo_request_check_in(id),
            OpKind::ProcessCheckIn => self.undo_process_check_in(id),
            OpKind::CheckOut => self.undo_check_out(id),
        };
        record_undo(Some(record.kind), &result);
        self.refresh_gauges();

        match result {
            Ok(spot_id) => {
                info!("undid {} of {id}", record.kind);
                self.publish(
                    &spot_id,
                    LotEvent::Undone { kind: record.kind, reservation_id: id, spot_id: spot_id.clone() },
                );
                Ok(record)
            }
            Err(e) => {
                warn!("undo rejected: {e}");
                Err(e)
            }
        }
    }

    /// Look up the reservation and its spot status for a reversal.
    fn undo_target(&self, kind: OpKind, id: Ulid) -> Result<(&Reservation, Option<SpotStatus>), EngineError> {
        let r = self.ledger.get(&id).ok_or(EngineError::UndoRejected {
            kind,
            id,
            reason: "reservation no longer exists",
        })?;
        Ok((r, self.pool.status(&r.spot_id)))
    }

    /// Reserved/Held → reservation deleted, spot Free.
    fn undo_reserve(&mut self, id: Ulid) -> Result<SpotId, EngineError> {
        let kind = OpKind::Reserve;
        let (r, spot) = self.undo_target(kind, id)?;
        undo_guard(r.status == ReservationStatus::Reserved, kind, id, "reservation has advanced")?;
        undo_guard(spot == Some(SpotStatus::Held), kind, id, "spot is not held")?;
        undo_guard(!self.queue.is_pending(&id), kind, id, "check-in ticket still queued")?;
        let spot_id = r.spot_id.clone();

        self.ledger.remove(&id);
        self.release_spot(&spot_id);
        Ok(spot_id)
    }

    /// Canceled/Free → Reserved/Held. The allocator entry added by the
    /// cancel goes stale and is discarded lazily.
    fn undo_cancel(&mut self, id: Ulid) -> Result<SpotId, EngineError> {
        let kind = OpKind::Cancel;
        let (r, spot) = self.undo_target(kind, id)?;
        undo_guard(r.status == ReservationStatus::Canceled, kind, id, "reservation is not canceled")?;
        undo_guard(spot == Some(SpotStatus::Free), kind, id, "spot has been taken")?;
        let spot_id = r.spot_id.clone();

        self.pool.set_status(&spot_id, SpotStatus::Held);
        if let Some(r) = self.ledger.get_mut(&id) {
            r.status = ReservationStatus::Reserved;
        }
        Ok(spot_id)
    }

    /// Waiting with a queued ticket → Reserved, ticket removed.
    fn undo_request_check_in(&mut self, id: Ulid) -> Result<SpotId, EngineError> {
        let kind = OpKind::RequestCheckIn;
        let (r, spot) = self.undo_target(kind, id)?;
        undo_guard(r.status == ReservationStatus::Waiting, kind, id, "reservation is not waiting")?;
        undo_guard(spot == Some(SpotStatus::Held), kind, id, "spot is not held")?;
        undo_guard(self.queue.is_pending(&id), kind, id, "check-in ticket no longer queued")?;
        let spot_id = r.spot_id.clone();

        self.queue.retract(&id);
        if let Some(r) = self.ledger.get_mut(&id) {
            r.status = ReservationStatus::Reserved;
        }
        Ok(spot_id)
    }

    /// Active/InUse → Waiting/Held: gate cleared, ticket back at the front
    /// of the queue, gate ring rotated back one step.
    fn undo_process_check_in(&mut self, id: Ulid) -> Result<SpotId, EngineError> {
        let kind = OpKind::ProcessCheckIn;
        let (r, spot) = self.undo_target(kind, id)?;
        undo_guard(r.status == ReservationStatus::Active, kind, id, "reservation is not active")?;
        undo_guard(spot == Some(SpotStatus::InUse), kind, id, "spot is not in use")?;
        undo_guard(!self.queue.is_pending(&id), kind, id, "check-in ticket already queued")?;
        // Rotating back is only exact if this gate was the last one handed out.
        undo_guard(
            r.gate.is_some() && r.gate.as_deref() == self.gates.peek_back(),
            kind,
            id,
            "gate ring has moved on",
        )?;
        let spot_id = r.spot_id.clone();

        self.pool.set_status(&spot_id, SpotStatus::Held);
        if let Some(r) = self.ledger.get_mut(&id) {
            r.gate = None;
            r.status = ReservationStatus::Waiting;
        }
        self.queue.enqueue_front(id);
        self.gates.rotate_back();
        Ok(spot_id)
    }

    /// Done/Free → Active/InUse. The fee is not refunded or re-issued.
    fn undo_check_out(&mut self, id: Ulid) -> Result<SpotId, EngineError> {
        let kind = OpKind::CheckOut;
        let (r, spot) = self.undo_target(kind, id)?;
        undo_guard(r.status == ReservationStatus::Done, kind, id, "reservation is not done")?;
        undo_guard(spot == Some(SpotStatus::Free), kind, id, "spot has been taken")?;
        let spot_id = r.spot_id.clone();

        self.pool.set_status(&spot_id, SpotStatus::InUse);
        if let Some(r) = self.ledger.get_mut(&id) {
            r.status = ReservationStatus::Active;
        }
        Ok(spot_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_is_lifo() {
        let mut log = UndoLog::new();
        let (a, b) = (Ulid::new(), Ulid::new());
        log.record(OpKind::Reserve, a);
        log.record(OpKind::Cancel, b);
        assert_eq!(log.len(), 2);
        assert_eq!(log.peek().map(|r| r.kind), Some(OpKind::Cancel));
        assert_eq!(
            log.pop(),
            Some(UndoRecord { kind: OpKind::Cancel, reservation_id: b })
        );
        assert_eq!(
            log.pop(),
            Some(UndoRecord { kind: OpKind::Reserve, reservation_id: a })
        );
        assert!(log.pop().is_none());
        assert!(log.is_empty());
    }
}

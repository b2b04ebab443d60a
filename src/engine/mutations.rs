use tracing::{debug, info};
use ulid::Ulid;

use crate::model::*;
use crate::observability::{record_operation, record_skip};

use super::queue::Ticket;
use super::validate::{expect_spot, expect_status, validate_reserve};
use super::{class_slot, Engine, EngineError};

impl Engine {
    /// Claim the best free spot of `class` for `[start, end)`.
    pub fn reserve(
        &mut self,
        user: &str,
        descriptor: &str,
        start: Tick,
        end: Tick,
        class: SpotClass,
    ) -> Result<Reservation, EngineError> {
        let result = self.try_reserve(user, descriptor, start, end, class);
        record_operation("reserve", &result);
        self.refresh_gauges();
        result
    }

    fn try_reserve(
        &mut self,
        user: &str,
        descriptor: &str,
        start: Tick,
        end: Tick,
        class: SpotClass,
    ) -> Result<Reservation, EngineError> {
        let req = validate_reserve(user, descriptor, start, end)?;
        let slot = class_slot(class);
        let spot_id = self.allocators[slot]
            .take_best(&self.pool)
            .ok_or(EngineError::NoFreeSpot(class))?;
        let id = match self.ledger.next_id() {
            Ok(id) => id,
            Err(e) => {
                // Spot is still Free; hand it back.
                if let Some(spot) = self.pool.get(&spot_id) {
                    self.allocators[slot].admit(spot);
                }
                return Err(e);
            }
        };

        self.pool.set_status(&spot_id, SpotStatus::Held);
        let reservation = Reservation {
            id,
            user: req.user,
            descriptor: req.descriptor,
            span: req.span,
            spot_id: spot_id.clone(),
            gate: None,
            status: ReservationStatus::Reserved,
        };
        self.ledger.insert(reservation.clone());
        self.undo.record(OpKind::Reserve, id);

        info!("reserved {spot_id} for {} ({id})", reservation.user);
        self.publish(&spot_id, LotEvent::Reserved { reservation_id: id, spot_id: spot_id.clone() });
        Ok(reservation)
    }

    /// Cancel a Reserved or Waiting reservation and free its spot. A pending
    /// check-in ticket is withdrawn and will be skipped when it reaches the
    /// front of the queue.
    pub fn cancel(&mut self, id: Ulid) -> Result<(), EngineError> {
        let result = self.try_cancel(id);
        record_operation("cancel", &result);
        self.refresh_gauges();
        result
    }

    fn try_cancel(&mut self, id: Ulid) -> Result<(), EngineError> {
        let r = self.ledger.get(&id).ok_or(EngineError::NotFound(id))?;
        expect_status(
            r,
            &[ReservationStatus::Reserved, ReservationStatus::Waiting],
            "reserved or waiting",
        )?;
        let spot_id = r.spot_id.clone();
        match self.pool.status(&spot_id) {
            None => return Err(EngineError::SpotNotFound(spot_id)),
            Some(SpotStatus::InUse) => {
                return Err(EngineError::SpotState {
                    spot_id,
                    actual: SpotStatus::InUse,
                });
            }
            Some(_) => {}
        }

        self.queue.withdraw(&id);
        if let Some(r) = self.ledger.get_mut(&id) {
            r.status = ReservationStatus::Canceled;
        }
        self.release_spot(&spot_id);
        self.undo.record(OpKind::Cancel, id);

        info!("canceled {id}, released {spot_id}");
        self.publish(&spot_id, LotEvent::Canceled { reservation_id: id, spot_id: spot_id.clone() });
        Ok(())
    }

    /// Join the admission queue.
    pub fn request_check_in(&mut self, id: Ulid) -> Result<(), EngineError> {
        let result = self.try_request_check_in(id);
        record_operation("request_check_in", &result);
        self.refresh_gauges();
        result
    }

    fn try_request_check_in(&mut self, id: Ulid) -> Result<(), EngineError> {
        let r = self.ledger.get(&id).ok_or(EngineError::NotFound(id))?;
        expect_status(r, &[ReservationStatus::Reserved], "reserved")?;
        let spot_id = r.spot_id.clone();
        expect_spot(&spot_id, self.pool.status(&spot_id), SpotStatus::Held)?;
        if self.queue.is_pending(&id) {
            return Err(EngineError::AlreadyQueued(id));
        }

        self.queue.enqueue(id);
        if let Some(r) = self.ledger.get_mut(&id) {
            r.status = ReservationStatus::Waiting;
        }
        self.undo.record(OpKind::RequestCheckIn, id);

        info!("{id} waiting to check in ({} pending)", self.queue.pending());
        self.publish(&spot_id, LotEvent::CheckInRequested { reservation_id: id, spot_id: spot_id.clone() });
        Ok(())
    }

    /// Admit the vehicle at the head of the queue through the next gate.
    ///
    /// A withdrawn or inconsistent ticket is consumed and reported as
    /// `Skipped`: no gate is used and nothing is recorded for undo. Call
    /// again to reach the next ticket.
    pub fn process_next_check_in(&mut self) -> Result<CheckInOutcome, EngineError> {
        let result = self.try_process_next_check_in();
        let op = match &result {
            Ok(CheckInOutcome::Skipped { .. }) => "process_check_in_skipped",
            _ => "process_check_in",
        };
        record_operation(op, &result);
        self.refresh_gauges();
        result
    }

    fn try_process_next_check_in(&mut self) -> Result<CheckInOutcome, EngineError> {
        if self.queue.is_empty() {
            return Err(EngineError::QueueEmpty);
        }
        if self.gates.is_empty() {
            return Err(EngineError::NoGateAvailable);
        }

        let id = match self.queue.dequeue() {
            None => return Err(EngineError::QueueEmpty),
            Some(Ticket::Stale(id)) => return Ok(self.skip(id, SkipReason::Withdrawn)),
            Some(Ticket::Live(id)) => id,
        };
        let spot_id = match self.ledger.get(&id) {
            Some(r) if r.status == ReservationStatus::Waiting => r.spot_id.clone(),
            _ => return Ok(self.skip(id, SkipReason::ReservationState)),
        };
        if self.pool.status(&spot_id) != Some(SpotStatus::Held) {
            return Ok(self.skip(id, SkipReason::SpotState));
        }

        let Some(gate) = self.gates.next_gate() else {
            return Err(EngineError::NoGateAvailable);
        };
        self.pool.set_status(&spot_id, SpotStatus::InUse);
        if let Some(r) = self.ledger.get_mut(&id) {
            r.gate = Some(gate.clone());
            r.status = ReservationStatus::Active;
        }
        self.undo.record(OpKind::ProcessCheckIn, id);

        info!("{id} checked in at {gate} to {spot_id}");
        self.publish(
            &spot_id,
            LotEvent::CheckedIn { reservation_id: id, spot_id: spot_id.clone(), gate: gate.clone() },
        );
        Ok(CheckInOutcome::Admitted { reservation_id: id, gate })
    }

    fn skip(&self, id: Ulid, reason: SkipReason) -> CheckInOutcome {
        debug!("skipped check-in ticket {id}: {reason:?}");
        record_skip(reason);
        CheckInOutcome::Skipped { reservation_id: id, reason }
    }

    /// Finish an Active reservation and free its spot. Returns the fee,
    /// `max(0, end - start) * hourly_rate`.
    pub fn check_out(&mut self, id: Ulid, hourly_rate: u64) -> Result<u64, EngineError> {
        let result = self.try_check_out(id, hourly_rate);
        record_operation("check_out", &result);
        self.refresh_gauges();
        result
    }

    /// `check_out` at the lot's configured rate.
    pub fn check_out_default(&mut self, id: Ulid) -> Result<u64, EngineError> {
        self.check_out(id, self.hourly_rate)
    }

    fn try_check_out(&mut self, id: Ulid, hourly_rate: u64) -> Result<u64, EngineError> {
        let r = self.ledger.get(&id).ok_or(EngineError::NotFound(id))?;
        expect_status(r, &[ReservationStatus::Active], "active")?;
        let spot_id = r.spot_id.clone();
        expect_spot(&spot_id, self.pool.status(&spot_id), SpotStatus::InUse)?;
        let fee = r.fee(hourly_rate);

        if let Some(r) = self.ledger.get_mut(&id) {
            r.status = ReservationStatus::Done;
        }
        self.release_spot(&spot_id);
        self.undo.record(OpKind::CheckOut, id);

        info!("{id} checked out of {spot_id}, fee {fee}");
        metrics::counter!(crate::observability::FEES_CHARGED_TOTAL).increment(fee);
        self.publish(&spot_id, LotEvent::CheckedOut { reservation_id: id, spot_id: spot_id.clone(), fee });
        Ok(fee)
    }
}

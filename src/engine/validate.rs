use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::EngineError;

/// A reserve request that passed input validation.
pub(crate) struct ReserveRequest {
    pub user: String,
    pub descriptor: String,
    pub span: Span,
}

pub(crate) fn validate_reserve(
    user: &str,
    descriptor: &str,
    start: Tick,
    end: Tick,
) -> Result<ReserveRequest, EngineError> {
    let user = user.trim();
    if user.is_empty() {
        return Err(EngineError::EmptyUser);
    }
    if user.len() > MAX_USER_LEN {
        return Err(EngineError::LimitExceeded("user name too long"));
    }
    let descriptor = descriptor.trim();
    if descriptor.is_empty() {
        return Err(EngineError::EmptyDescriptor);
    }
    if descriptor.len() > MAX_DESCRIPTOR_LEN {
        return Err(EngineError::LimitExceeded("vehicle descriptor too long"));
    }
    let span = Span::try_new(start, end).ok_or(EngineError::InvalidSpan { start, end })?;
    Ok(ReserveRequest {
        user: user.to_string(),
        descriptor: descriptor.to_string(),
        span,
    })
}

/// Reservation status check for forward transitions.
pub(crate) fn expect_status(
    r: &Reservation,
    allowed: &[ReservationStatus],
    expected: &'static str,
) -> Result<(), EngineError> {
    if allowed.contains(&r.status) {
        Ok(())
    } else {
        Err(EngineError::InvalidState {
            id: r.id,
            expected,
            actual: r.status,
        })
    }
}

pub(crate) fn expect_spot(
    spot_id: &SpotId,
    actual: Option<SpotStatus>,
    wanted: SpotStatus,
) -> Result<(), EngineError> {
    match actual {
        None => Err(EngineError::SpotNotFound(spot_id.clone())),
        Some(s) if s == wanted => Ok(()),
        Some(s) => Err(EngineError::SpotState {
            spot_id: spot_id.clone(),
            actual: s,
        }),
    }
}

/// Post-condition check used by undo: reject with `reason` unless `ok`.
pub(crate) fn undo_guard(ok: bool, kind: OpKind, id: Ulid, reason: &'static str) -> Result<(), EngineError> {
    if ok {
        Ok(())
    } else {
        Err(EngineError::UndoRejected { kind, id, reason })
    }
}

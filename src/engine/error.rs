use ulid::Ulid;

use crate::model::{OpKind, ReservationStatus, SpotClass, SpotId, SpotStatus};

/// Failure categories. A skipped check-in ticket is not an error and has no
/// category; see `CheckInOutcome::Skipped`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input, rejected before any lookup.
    Validation,
    /// No free spot, gate, ticket or undo record.
    Exhausted,
    /// Target in the wrong state for the transition.
    Conflict,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    EmptyUser,
    EmptyDescriptor,
    InvalidSpan { start: i64, end: i64 },
    LimitExceeded(&'static str),
    UnknownClass(String),
    DuplicateSpot(SpotId),
    InvalidConfig(&'static str),
    InvalidLotName(String),
    NoFreeSpot(SpotClass),
    NoGateAvailable,
    QueueEmpty,
    NotFound(Ulid),
    SpotNotFound(SpotId),
    InvalidState {
        id: Ulid,
        expected: &'static str,
        actual: ReservationStatus,
    },
    SpotState {
        spot_id: SpotId,
        actual: SpotStatus,
    },
    AlreadyQueued(Ulid),
    NothingToUndo,
    UndoRejected {
        kind: OpKind,
        id: Ulid,
        reason: &'static str,
    },
}

impl EngineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::EmptyUser
            | EngineError::EmptyDescriptor
            | EngineError::InvalidSpan { .. }
            | EngineError::LimitExceeded(_)
            | EngineError::UnknownClass(_)
            | EngineError::DuplicateSpot(_)
            | EngineError::InvalidConfig(_)
            | EngineError::InvalidLotName(_) => ErrorKind::Validation,
            EngineError::NoFreeSpot(_)
            | EngineError::NoGateAvailable
            | EngineError::QueueEmpty
            | EngineError::NothingToUndo => ErrorKind::Exhausted,
            EngineError::NotFound(_)
            | EngineError::SpotNotFound(_)
            | EngineError::InvalidState { .. }
            | EngineError::SpotState { .. }
            | EngineError::AlreadyQueued(_)
            | EngineError::UndoRejected { .. } => ErrorKind::Conflict,
        }
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::EmptyUser => write!(f, "user must not be empty"),
            EngineError::EmptyDescriptor => write!(f, "vehicle descriptor must not be empty"),
            EngineError::InvalidSpan { start, end } => {
                write!(f, "invalid interval [{start}, {end}): start must be before end")
            }
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::UnknownClass(c) => write!(f, "unknown spot class: {c}"),
            EngineError::DuplicateSpot(id) => write!(f, "duplicate spot id: {id}"),
            EngineError::InvalidConfig(msg) => write!(f, "invalid lot config: {msg}"),
            EngineError::InvalidLotName(name) => write!(f, "invalid lot name: {name:?}"),
            EngineError::NoFreeSpot(class) => write!(f, "no free {class} spot"),
            EngineError::NoGateAvailable => write!(f, "no entry gate available"),
            EngineError::QueueEmpty => write!(f, "no vehicles waiting to check in"),
            EngineError::NotFound(id) => write!(f, "reservation not found: {id}"),
            EngineError::SpotNotFound(id) => write!(f, "spot not found: {id}"),
            EngineError::InvalidState {
                id,
                expected,
                actual,
            } => write!(f, "reservation {id} is {actual}, expected {expected}"),
            EngineError::SpotState { spot_id, actual } => {
                write!(f, "spot {spot_id} is {actual:?}")
            }
            EngineError::AlreadyQueued(id) => {
                write!(f, "reservation {id} is already waiting to check in")
            }
            EngineError::NothingToUndo => write!(f, "nothing to undo"),
            EngineError::UndoRejected { kind, id, reason } => {
                write!(f, "cannot undo {kind} of {id}: {reason}")
            }
        }
    }
}

impl std::error::Error for EngineError {}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::engine::EngineError;

/// Opaque time unit. The caller decides the granularity (hours in the
/// default pricing).
pub type Tick = i64;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: Tick,
    pub end: Tick,
}

impl Span {
    pub fn new(start: Tick, end: Tick) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    /// Checked constructor for caller-supplied bounds.
    pub fn try_new(start: Tick, end: Tick) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Length in ticks. Exact across the whole `Tick` range.
    pub fn duration(&self) -> u64 {
        self.end.abs_diff(self.start)
    }
}

/// Spot identifier. Ordering of ids is allocation priority: the lowest id of
/// a class is handed out first.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpotId(String);

impl SpotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Layout id `F{zone}-{index:03}`. Zero padding keeps the lexical order
    /// equal to (zone, index) order.
    pub fn from_layout(zone: u32, index: u32) -> Self {
        Self(format!("F{zone}-{index:03}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SpotId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Closed set of spot classes. Each class is served by its own allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SpotClass {
    Standard,
    /// Scarce class: charger-equipped spots.
    Electric,
}

impl SpotClass {
    pub const ALL: [SpotClass; 2] = [SpotClass::Standard, SpotClass::Electric];

    pub fn label(&self) -> &'static str {
        match self {
            SpotClass::Standard => "standard",
            SpotClass::Electric => "electric",
        }
    }
}

impl fmt::Display for SpotClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SpotClass {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "normal" => Ok(SpotClass::Standard),
            "electric" | "ev" => Ok(SpotClass::Electric),
            _ => Err(EngineError::UnknownClass(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpotStatus {
    Free,
    /// Claimed by a Reserved or Waiting reservation.
    Held,
    /// Vehicle on site (Active reservation).
    InUse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spot {
    pub id: SpotId,
    pub zone: u32,
    pub class: SpotClass,
    pub status: SpotStatus,
}

impl Spot {
    pub fn new(id: SpotId, zone: u32, class: SpotClass) -> Self {
        Self {
            id,
            zone,
            class,
            status: SpotStatus::Free,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReservationStatus {
    Reserved,
    Waiting,
    Active,
    Canceled,
    Done,
}

impl ReservationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReservationStatus::Canceled | ReservationStatus::Done)
    }

    /// Holding or occupying a spot.
    pub fn is_live(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReservationStatus::Reserved => "reserved",
            ReservationStatus::Waiting => "waiting",
            ReservationStatus::Active => "active",
            ReservationStatus::Canceled => "canceled",
            ReservationStatus::Done => "done",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: Ulid,
    pub user: String,
    /// Free text identifying the vehicle (a license plate in practice).
    pub descriptor: String,
    pub span: Span,
    pub spot_id: SpotId,
    /// Set when the reservation becomes Active.
    pub gate: Option<String>,
    pub status: ReservationStatus,
}

impl Reservation {
    /// Flat-rate fee over the booked span.
    pub fn fee(&self, hourly_rate: u64) -> u64 {
        self.span.duration().saturating_mul(hourly_rate)
    }
}

/// Mutating operations, as recorded in the undo log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpKind {
    Reserve,
    Cancel,
    RequestCheckIn,
    ProcessCheckIn,
    CheckOut,
}

impl OpKind {
    pub fn label(&self) -> &'static str {
        match self {
            OpKind::Reserve => "reserve",
            OpKind::Cancel => "cancel",
            OpKind::RequestCheckIn => "request_check_in",
            OpKind::ProcessCheckIn => "process_check_in",
            OpKind::CheckOut => "check_out",
        }
    }
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Lot events, broadcast per zone after each committed change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LotEvent {
    Reserved {
        reservation_id: Ulid,
        spot_id: SpotId,
    },
    Canceled {
        reservation_id: Ulid,
        spot_id: SpotId,
    },
    CheckInRequested {
        reservation_id: Ulid,
        spot_id: SpotId,
    },
    CheckedIn {
        reservation_id: Ulid,
        spot_id: SpotId,
        gate: String,
    },
    CheckedOut {
        reservation_id: Ulid,
        spot_id: SpotId,
        fee: u64,
    },
    Undone {
        kind: OpKind,
        reservation_id: Ulid,
        spot_id: SpotId,
    },
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotOverview {
    pub spot_id: SpotId,
    pub class: SpotClass,
    pub status: SpotStatus,
    pub user: Option<String>,
    pub descriptor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneOverview {
    pub zone: u32,
    pub spots: Vec<SpotOverview>,
}

/// Exact count of Free spots per class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeCounts {
    pub standard: usize,
    pub electric: usize,
}

impl FreeCounts {
    pub fn get(&self, class: SpotClass) -> usize {
        match class {
            SpotClass::Standard => self.standard,
            SpotClass::Electric => self.electric,
        }
    }

    pub(crate) fn bump(&mut self, class: SpotClass) {
        match class {
            SpotClass::Standard => self.standard += 1,
            SpotClass::Electric => self.electric += 1,
        }
    }
}

/// Result of processing the head of the admission queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckInOutcome {
    Admitted { reservation_id: Ulid, gate: String },
    /// Ticket consumed without effect.
    Skipped { reservation_id: Ulid, reason: SkipReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Ticket withdrawn by a cancellation.
    Withdrawn,
    /// Reservation no longer Waiting, or gone.
    ReservationState,
    /// Spot no longer Held.
    SpotState,
}

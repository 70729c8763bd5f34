use std::fmt;

use uuid::Uuid;

/// Occupancy state of a slot.
///
/// `Held` is the claim-to-payment window: the slot is taken but the booking
/// is still `pending`. Reconciliation success promotes it to `Booked`;
/// failure, refund or hold expiry releases it back to `Available`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotStatus {
    Available,
    Held,
    Booked,
}

impl SlotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SlotStatus::Available => "available",
            SlotStatus::Held => "held",
            SlotStatus::Booked => "booked",
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "available" => Ok(SlotStatus::Available),
            "held" => Ok(SlotStatus::Held),
            "booked" => Ok(SlotStatus::Booked),
            other => Err(anyhow::anyhow!("unknown slot status: {other}")),
        }
    }
}

/// A single instructor-owned bookable time window.
#[derive(Clone, Debug)]
pub struct Slot {
    pub slot_id: Uuid,
    pub instructor_id: Uuid,
    pub starts_at_ms: i64,
    pub ends_at_ms: i64,
    pub status: SlotStatus,
    /// Set while `Held`; a reaper may release the slot once this passes.
    pub hold_expires_at_ms: Option<i64>,
    /// Payment transaction currently holding the slot, if any.
    pub holding_txn_id: Option<Uuid>,
}

impl Slot {
    pub fn duration_ms(&self) -> i64 {
        self.ends_at_ms.saturating_sub(self.starts_at_ms)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupSessionStatus {
    Open,
    Confirmed,
    Cancelled,
}

impl GroupSessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupSessionStatus::Open => "open",
            GroupSessionStatus::Confirmed => "confirmed",
            GroupSessionStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "open" => Ok(GroupSessionStatus::Open),
            "confirmed" => Ok(GroupSessionStatus::Confirmed),
            "cancelled" => Ok(GroupSessionStatus::Cancelled),
            other => Err(anyhow::anyhow!("unknown group session status: {other}")),
        }
    }
}

/// A capacity-bounded session multiple clients can join concurrently.
///
/// `current_participants` is mutated only by guarded conditional updates
/// inside repository transactions; it is never computed-then-written.
#[derive(Clone, Debug)]
pub struct GroupSession {
    pub session_id: Uuid,
    pub instructor_id: Option<Uuid>,
    pub starts_at_ms: i64,
    pub ends_at_ms: i64,
    pub min_participants: i64,
    pub max_participants: i64,
    pub current_participants: i64,
    pub price_per_participant: i64,
    pub status: GroupSessionStatus,
}

impl GroupSession {
    pub fn remaining_seats(&self) -> i64 {
        self.max_participants
            .saturating_sub(self.current_participants)
    }
}

/// Why a reservation attempt could not claim capacity.
///
/// These are surfaced verbatim to the booking client, so each variant maps
/// to a clear user-facing reason rather than a generic failure.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnavailableReason {
    SlotNotFound,
    SlotTaken,
    SlotTooShort,
    WrongInstructor,
    SessionNotFound,
    SessionNotOpen,
    InsufficientSeats { remaining: i64 },
}

impl fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnavailableReason::SlotNotFound => write!(f, "slot does not exist"),
            UnavailableReason::SlotTaken => write!(f, "slot is already taken"),
            UnavailableReason::SlotTooShort => {
                write!(f, "slot does not cover the requested duration")
            }
            UnavailableReason::WrongInstructor => {
                write!(f, "slot belongs to a different instructor")
            }
            UnavailableReason::SessionNotFound => write!(f, "group session does not exist"),
            UnavailableReason::SessionNotOpen => write!(f, "group session is not open for booking"),
            UnavailableReason::InsufficientSeats { remaining } => {
                write!(f, "only {remaining} seat(s) remaining")
            }
        }
    }
}

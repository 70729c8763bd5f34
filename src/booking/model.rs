use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BookingKind {
    Individual,
    Group,
}

impl BookingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingKind::Individual => "individual",
            BookingKind::Group => "group",
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "individual" => Ok(BookingKind::Individual),
            "group" => Ok(BookingKind::Group),
            other => Err(anyhow::anyhow!("unknown booking kind: {other}")),
        }
    }
}

/// Booking lifecycle.
///
/// `Pending` is the only non-terminal state; every transition out of it is
/// applied exactly once by the reconciliation handler or an explicit
/// administrative cancellation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Refunded,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "refunded" => Ok(BookingStatus::Refunded),
            other => Err(anyhow::anyhow!("unknown booking status: {other}")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TxnStatus {
    Pending,
    Completed,
    Failed,
    Cancelled,
}

impl TxnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxnStatus::Pending => "pending",
            TxnStatus::Completed => "completed",
            TxnStatus::Failed => "failed",
            TxnStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "pending" => Ok(TxnStatus::Pending),
            "completed" => Ok(TxnStatus::Completed),
            "failed" => Ok(TxnStatus::Failed),
            "cancelled" => Ok(TxnStatus::Cancelled),
            other => Err(anyhow::anyhow!("unknown transaction status: {other}")),
        }
    }
}

/// A client's claim on a slot or group session.
///
/// `instructor_id`, `starts_at_ms` and `ends_at_ms` are snapshots taken at
/// claim time. The capacity row may be edited or reclaimed later; the
/// booking must stay historically accurate, so these are never re-joined
/// against the live slot/session.
#[derive(Clone, Debug)]
pub struct Booking {
    pub booking_id: Uuid,
    pub client_id: Uuid,
    pub kind: BookingKind,
    pub slot_id: Option<Uuid>,
    pub group_session_id: Option<Uuid>,
    pub instructor_id: Option<Uuid>,
    pub starts_at_ms: i64,
    pub ends_at_ms: i64,
    pub participants: i64,
    pub participant_names: Vec<String>,
    pub price_total: i64,
    pub price_per_participant: i64,
    pub status: BookingStatus,
    pub cancellation_reason: Option<String>,
    pub cancelled_at_ms: Option<i64>,
    pub created_at_ms: i64,
}

/// One payment attempt, 1:1 with a booking.
#[derive(Clone, Debug)]
pub struct PaymentTransaction {
    pub txn_id: Uuid,
    pub booking_id: Uuid,
    pub client_id: Uuid,
    pub amount: i64,
    pub status: TxnStatus,
    pub gateway_payment_id: Option<String>,
    pub gateway_status: Option<String>,
    pub description: String,
    pub created_at_ms: i64,
}

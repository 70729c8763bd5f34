use uuid::Uuid;

/// Which capacity unit a reservation request targets.
#[derive(Clone, Debug)]
pub enum ReservationTarget {
    Slot {
        slot_id: Uuid,
        /// Instructor the client selected; the slot must belong to them.
        instructor_id: Uuid,
        /// Duration of the requested service.
        service_duration_ms: i64,
        /// Price quoted to the client for this service, integer cents.
        price_total: i64,
    },
    Group {
        session_id: Uuid,
        participants: i64,
    },
}

/// Inbound reservation request from the booking UI.
#[derive(Clone, Debug)]
pub struct ReservationRequest {
    pub client_id: Uuid,
    pub target: ReservationTarget,
    pub participant_names: Vec<String>,
    /// Terms/privacy consent; reservations without it are rejected outright.
    pub consent: bool,
}

/// Successful reservation response: the client is redirected to pay.
#[derive(Clone, Debug)]
pub struct ReservationReceipt {
    pub booking_id: Uuid,
    pub payment_redirect_url: String,
}

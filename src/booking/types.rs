use uuid::Uuid;

use crate::booking::model::BookingStatus;
use crate::capacity::model::UnavailableReason;
use crate::notify::BookingNotice;

/// Input for an individual (slot) reservation atomic unit.
#[derive(Clone, Debug)]
pub struct NewSlotBooking {
    pub client_id: Uuid,
    pub slot_id: Uuid,
    /// Instructor the client believes owns the slot; mismatch aborts.
    pub expected_instructor_id: Uuid,
    /// Duration of the requested service; the slot must cover it.
    pub service_duration_ms: i64,
    pub price_total: i64,
    pub participant_names: Vec<String>,
    /// Absolute expiry of the payment hold placed on the slot.
    pub hold_expires_at_ms: i64,
    pub description: String,
}

/// Input for a group-session reservation atomic unit.
#[derive(Clone, Debug)]
pub struct NewGroupBooking {
    pub client_id: Uuid,
    pub session_id: Uuid,
    pub participants: i64,
    pub participant_names: Vec<String>,
    pub description: String,
}

/// Identifiers committed by a successful reservation, handed to the payment
/// gateway after the transaction has closed.
#[derive(Clone, Debug)]
pub struct ReservedBooking {
    pub booking_id: Uuid,
    pub txn_id: Uuid,
    pub amount: i64,
    pub description: String,
}

/// Result of a reservation atomic unit.
///
/// `Unavailable` is the race loser's view: it reflects the post-mutation
/// state of the capacity row, not a stale snapshot.
#[derive(Clone, Debug)]
pub enum ReserveOutcome {
    Reserved(ReservedBooking),
    Unavailable(UnavailableReason),
}

/// Terminal meaning of an external gateway status code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaymentOutcome {
    Success,
    Rejected,
    Refunded,
    /// Anything non-terminal; only raw-status metadata is recorded.
    Intermediate(String),
}

impl PaymentOutcome {
    /// Normalizes gateway status codes into the four reconciliation
    /// outcomes. Unknown codes are intermediate, bounded to a stable length.
    pub fn from_gateway_status(code: &str) -> Self {
        match code.to_ascii_lowercase().as_str() {
            "success" | "completed" | "paid" => PaymentOutcome::Success,
            "rejected" | "declined" | "failed" | "cancelled" | "canceled" => {
                PaymentOutcome::Rejected
            }
            "refunded" | "reversed" | "chargeback" => PaymentOutcome::Refunded,
            _ => {
                const MAX: usize = 64;
                let mut end = code.len().min(MAX);
                // Never split a multi-byte character.
                while !code.is_char_boundary(end) {
                    end -= 1;
                }
                PaymentOutcome::Intermediate(code[..end].to_string())
            }
        }
    }
}

/// What a reconciliation atomic unit actually did.
#[derive(Clone, Debug)]
pub enum ReconcileApplied {
    Confirmed(BookingNotice),
    Cancelled(BookingNotice),
    Refunded(BookingNotice),
    /// Intermediate status: raw metadata recorded, no booking transition.
    MetadataRecorded,
    /// Re-delivery of an already-applied terminal status; strict no-op.
    AlreadyApplied,
    /// Signal does not fit the booking's current status; nothing mutated.
    OutOfOrder { current: BookingStatus },
    UnknownBooking,
}

/// Refund the gateway should be asked for after an administrative
/// cancellation of a paid booking.
#[derive(Clone, Debug)]
pub struct RefundRequest {
    pub gateway_payment_id: String,
    pub amount: i64,
}

#[derive(Clone, Debug)]
pub enum CancelOutcome {
    Cancelled {
        notice: BookingNotice,
        refund: Option<RefundRequest>,
    },
    AlreadyTerminal(BookingStatus),
    UnknownBooking,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gateway_status_mapping_covers_terminal_codes() {
        assert_eq!(
            PaymentOutcome::from_gateway_status("SUCCESS"),
            PaymentOutcome::Success
        );
        assert_eq!(
            PaymentOutcome::from_gateway_status("declined"),
            PaymentOutcome::Rejected
        );
        assert_eq!(
            PaymentOutcome::from_gateway_status("chargeback"),
            PaymentOutcome::Refunded
        );
    }

    #[test]
    fn unknown_codes_become_bounded_intermediate() {
        let long = "x".repeat(500);
        match PaymentOutcome::from_gateway_status(&long) {
            PaymentOutcome::Intermediate(raw) => assert!(raw.len() <= 64),
            other => panic!("expected intermediate, got {other:?}"),
        }
    }

    #[test]
    fn multibyte_statuses_truncate_on_char_boundaries() {
        // 22 three-byte characters, 66 bytes; the cut at 64 falls mid-char.
        let status = "あ".repeat(22);
        match PaymentOutcome::from_gateway_status(&status) {
            PaymentOutcome::Intermediate(raw) => {
                assert!(raw.len() <= 64);
                assert!(status.starts_with(&raw));
            }
            other => panic!("expected intermediate, got {other:?}"),
        }
    }
}

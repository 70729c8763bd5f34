use thiserror::Error;
use uuid::Uuid;

use crate::capacity::model::UnavailableReason;
use crate::gateway::GatewayError;

/// Engine-level error taxonomy.
///
/// `Validation` and `CapacityConflict` carry user-facing reasons; everything
/// else surfaces to operational logs only.
#[derive(Error, Debug)]
pub enum BookingError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("capacity no longer available: {0}")]
    CapacityConflict(UnavailableReason),

    #[error("payment could not be started")]
    PaymentInitiation(#[source] GatewayError),

    #[error("booking not found: {0}")]
    BookingNotFound(Uuid),

    #[error("payout already exists for instructor {instructor_id} over the requested period")]
    PayoutExists { instructor_id: Uuid },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

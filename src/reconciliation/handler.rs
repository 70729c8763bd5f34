//! Reconciliation of asynchronous payment results.
//!
//! Design principles:
//! - **Ack-always**: every payload the gateway could never successfully
//!   retry (bad signature, unknown booking, replayed terminal status) is
//!   acknowledged so the gateway stops retrying; only genuine internal
//!   failures propagate as errors and lean on the gateway's retry loop.
//! - **Status-keyed transitions**: the atomic unit decides what to do from
//!   the booking's *current* status, so re-delivery and reordering are
//!   no-ops instead of double releases or double confirmations.
//! - **Post-commit notifications**: stakeholders are told only after the
//!   durable state change committed, and a sink failure changes nothing.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::booking::repository::BookingRepository;
use crate::booking::types::{PaymentOutcome, ReconcileApplied};
use crate::gateway::{PaymentCallback, parse_order_ref, signature};
use crate::logger::warn_if_slow;
use crate::notify::NotificationDispatcher;

/// How a callback was absorbed. All variants are acknowledged to the
/// external caller; `Ignored` ones additionally leave an operational trace.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackAck {
    /// A booking transition was applied and notifications were attempted.
    Applied,
    /// Intermediate status: raw metadata recorded only.
    MetadataRecorded,
    /// Terminal status re-delivered; nothing changed, nobody re-notified.
    AlreadyApplied,
    Ignored(IgnoreReason),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    InvalidSignature,
    MalformedOrderRef,
    UnknownBooking,
    OutOfOrder,
}

pub struct ReconciliationHandler {
    bookings: Arc<dyn BookingRepository>,
    notifier: NotificationDispatcher,
    gateway_secret: String,
}

impl ReconciliationHandler {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        notifier: NotificationDispatcher,
        gateway_secret: String,
    ) -> Self {
        Self {
            bookings,
            notifier,
            gateway_secret,
        }
    }

    /// Applies one gateway callback.
    ///
    /// `Err` means the reconciliation unit itself failed and rolled back;
    /// the caller should answer non-success so the gateway retries.
    #[instrument(
        skip(self, cb),
        target = "reconciliation",
        fields(order_ref = %cb.order_ref, status = %cb.status)
    )]
    pub async fn apply(&self, cb: &PaymentCallback) -> anyhow::Result<CallbackAck> {
        if !signature::verify(&self.gateway_secret, cb) {
            warn!("callback signature mismatch; ignoring payload");
            return Ok(CallbackAck::Ignored(IgnoreReason::InvalidSignature));
        }

        let booking_id = match parse_order_ref(&cb.order_ref) {
            Some(id) => id,
            None => {
                warn!("callback order reference is malformed; ignoring payload");
                return Ok(CallbackAck::Ignored(IgnoreReason::MalformedOrderRef));
            }
        };

        let outcome = PaymentOutcome::from_gateway_status(&cb.status);

        let applied = warn_if_slow("reconcile", Duration::from_millis(100), async {
            self.bookings
                .reconcile(&booking_id, &outcome, &cb.payment_id, &cb.status)
                .await
        })
        .await?;

        match applied {
            ReconcileApplied::Confirmed(notice) => {
                info!(%booking_id, "booking confirmed by payment");
                self.notifier.booking_confirmed(&notice).await;
                Ok(CallbackAck::Applied)
            }
            ReconcileApplied::Cancelled(notice) | ReconcileApplied::Refunded(notice) => {
                info!(%booking_id, "booking released by payment result");
                self.notifier.booking_cancelled(&notice).await;
                Ok(CallbackAck::Applied)
            }
            ReconcileApplied::MetadataRecorded => {
                debug!(%booking_id, "intermediate gateway status recorded");
                Ok(CallbackAck::MetadataRecorded)
            }
            ReconcileApplied::AlreadyApplied => {
                debug!(%booking_id, "terminal status re-delivered; no-op");
                Ok(CallbackAck::AlreadyApplied)
            }
            ReconcileApplied::OutOfOrder { current } => {
                warn!(%booking_id, ?current, "callback does not fit current booking status");
                Ok(CallbackAck::Ignored(IgnoreReason::OutOfOrder))
            }
            ReconcileApplied::UnknownBooking => {
                // Acknowledged by contract: the gateway would retry forever
                // against a booking that can never exist. The warn line is
                // the operational alert for misconfiguration.
                warn!(%booking_id, "callback references unknown booking; acknowledged without state change");
                Ok(CallbackAck::Ignored(IgnoreReason::UnknownBooking))
            }
        }
    }
}

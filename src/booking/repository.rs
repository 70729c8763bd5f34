use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::booking::model::{Booking, PaymentTransaction};
use crate::booking::types::{
    CancelOutcome, NewGroupBooking, NewSlotBooking, PaymentOutcome, ReconcileApplied,
    ReserveOutcome,
};
use crate::notify::BookingNotice;

/// Booking ledger + payment transaction tracker.
///
/// Every mutating method is one whole atomic unit: the capacity claim or
/// release, the booking transition and the transaction transition commit
/// together or not at all. Callers never see partial writes.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Claims a slot and creates the pending booking + transaction pair.
    async fn reserve_slot(&self, req: &NewSlotBooking) -> Result<ReserveOutcome>;

    /// Claims seats on a group session and creates the pending pair.
    async fn reserve_group(&self, req: &NewGroupBooking) -> Result<ReserveOutcome>;

    /// Stores the gateway payment id once initiation has succeeded.
    async fn record_initiation(&self, booking_id: &Uuid, gateway_payment_id: &str) -> Result<()>;

    /// Compensating unit for a failed payment initiation: booking cancelled,
    /// transaction failed, capacity restored to its pre-claim state.
    /// Idempotent; a no-op if the booking already left `pending`.
    async fn cancel_failed_initiation(&self, booking_id: &Uuid) -> Result<()>;

    /// Applies one external payment outcome to the booking/transaction pair,
    /// keyed on the booking's current status.
    async fn reconcile(
        &self,
        booking_id: &Uuid,
        outcome: &PaymentOutcome,
        gateway_payment_id: &str,
        raw_status: &str,
    ) -> Result<ReconcileApplied>;

    /// Administrative cancellation: releases capacity, cancels the booking,
    /// and reports whether a gateway refund should be requested.
    async fn cancel_admin(&self, booking_id: &Uuid, reason: &str) -> Result<CancelOutcome>;

    /// Releases slots whose payment hold expired while the booking stayed
    /// `pending`, cancelling booking and transaction under the same lock
    /// discipline as any other capacity release.
    async fn reap_expired_holds(&self, now_ms: i64) -> Result<Vec<BookingNotice>>;

    async fn fetch_booking(&self, booking_id: &Uuid) -> Result<Option<Booking>>;

    async fn fetch_transaction(&self, booking_id: &Uuid) -> Result<Option<PaymentTransaction>>;
}

use async_trait::async_trait;
use uuid::Uuid;

use crate::payout::model::{CompletedTraining, InstructorPayout, SettleOutcome};

/// Persistence seam for instructor payouts.
#[async_trait]
pub trait PayoutRepository: Send + Sync + 'static {
    /// Whole settlement atomic unit: serializes on the instructor's lock
    /// row, checks for an overlapping non-cancelled payout, aggregates the
    /// eligible bookings and inserts the pending payout. Concurrent calls
    /// for the same instructor queue behind the lock, so a booking can
    /// never be counted by two payouts.
    async fn settle(
        &self,
        instructor_id: &Uuid,
        period_start_ms: i64,
        period_end_ms: i64,
        now_ms: i64,
        commission_pct: i64,
    ) -> anyhow::Result<SettleOutcome>;

    /// True if a non-cancelled payout for this instructor overlaps the
    /// given period.
    async fn overlapping_exists(
        &self,
        instructor_id: &Uuid,
        period_start_ms: i64,
        period_end_ms: i64,
    ) -> anyhow::Result<bool>;

    /// Confirmed bookings of this instructor finishing inside the period,
    /// already finished at `now_ms`, and not covered by any earlier
    /// non-cancelled payout.
    async fn eligible_bookings(
        &self,
        instructor_id: &Uuid,
        period_start_ms: i64,
        period_end_ms: i64,
        now_ms: i64,
    ) -> anyhow::Result<Vec<CompletedTraining>>;

    async fn insert(&self, payout: &InstructorPayout) -> anyhow::Result<()>;

    /// Pending -> paid. Returns false if the payout was not pending.
    async fn mark_paid(
        &self,
        payout_id: &Uuid,
        payment_method: &str,
        comment: Option<&str>,
        now_ms: i64,
    ) -> anyhow::Result<bool>;

    /// Pending -> cancelled. Returns false if the payout was not pending.
    async fn mark_cancelled(&self, payout_id: &Uuid, comment: Option<&str>)
        -> anyhow::Result<bool>;

    async fn fetch(&self, payout_id: &Uuid) -> anyhow::Result<Option<InstructorPayout>>;
}

//! Period settlement for instructors.
//!
//! The repository owns the settlement atomic unit (lock, overlap check,
//! aggregation, insert commit together); this layer validates the request,
//! maps outcomes onto the error taxonomy and notifies post-commit.

use std::sync::Arc;

use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::BookingError;
use crate::notify::{NotificationDispatcher, PayoutNotice};
use crate::payout::model::{InstructorPayout, SettleOutcome};
use crate::payout::repository::PayoutRepository;
use crate::time;

pub struct PayoutAggregator {
    payouts: Arc<dyn PayoutRepository>,
    notifier: NotificationDispatcher,
    /// School commission in whole percent, 0..=100.
    commission_pct: i64,
}

impl PayoutAggregator {
    pub fn new(
        payouts: Arc<dyn PayoutRepository>,
        notifier: NotificationDispatcher,
        commission_pct: i64,
    ) -> Self {
        Self {
            payouts,
            notifier,
            commission_pct,
        }
    }

    /// Creates a pending payout covering `[period_start_ms, period_end_ms)`.
    ///
    /// Fails with `PayoutExists` when a non-cancelled payout already covers
    /// any part of the period, and with `Validation` when the period is
    /// empty or holds no completed trainings.
    #[instrument(skip(self), target = "payout", fields(%instructor_id))]
    pub async fn create(
        &self,
        instructor_id: &Uuid,
        period_start_ms: i64,
        period_end_ms: i64,
    ) -> Result<InstructorPayout, BookingError> {
        if period_start_ms >= period_end_ms {
            return Err(BookingError::Validation(
                "payout period must end after it starts".into(),
            ));
        }

        let outcome = self
            .payouts
            .settle(
                instructor_id,
                period_start_ms,
                period_end_ms,
                time::now_ms(),
                self.commission_pct,
            )
            .await?;

        let payout = match outcome {
            SettleOutcome::Overlap => {
                return Err(BookingError::PayoutExists {
                    instructor_id: *instructor_id,
                });
            }
            SettleOutcome::NoTrainings => {
                return Err(BookingError::Validation(
                    "no completed trainings in the requested period".into(),
                ));
            }
            SettleOutcome::Created(payout) => payout,
        };

        info!(
            payout_id = %payout.payout_id,
            trainings = payout.trainings_count,
            revenue = payout.revenue_total,
            share = payout.instructor_share,
            "payout created"
        );

        self.notifier
            .payout_created(&PayoutNotice {
                payout_id: payout.payout_id,
                instructor_id: payout.instructor_id,
                period_start_ms: payout.period_start_ms,
                period_end_ms: payout.period_end_ms,
                instructor_share: payout.instructor_share,
            })
            .await;

        Ok(payout)
    }

    #[instrument(skip(self, comment), target = "payout", fields(%payout_id))]
    pub async fn mark_paid(
        &self,
        payout_id: &Uuid,
        payment_method: &str,
        comment: Option<&str>,
    ) -> Result<(), BookingError> {
        let updated = self
            .payouts
            .mark_paid(payout_id, payment_method, comment, time::now_ms())
            .await?;

        if !updated {
            return Err(BookingError::Validation(format!(
                "payout {payout_id} is not pending"
            )));
        }

        info!(payment_method, "payout marked paid");
        Ok(())
    }

    #[instrument(skip(self, comment), target = "payout", fields(%payout_id))]
    pub async fn mark_cancelled(
        &self,
        payout_id: &Uuid,
        comment: Option<&str>,
    ) -> Result<(), BookingError> {
        let updated = self.payouts.mark_cancelled(payout_id, comment).await?;

        if !updated {
            return Err(BookingError::Validation(format!(
                "payout {payout_id} is not pending"
            )));
        }

        info!("payout cancelled");
        Ok(())
    }
}

//! Outbound notification seam.
//!
//! The engine only decides *that* and *what* to notify. Rendering and
//! transport live behind `NotificationSink`; the dispatcher guarantees a
//! sink failure can never fail a committed booking flow.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};
use uuid::Uuid;

use crate::booking::model::BookingKind;

/// What stakeholders are told about a booking transition.
#[derive(Clone, Debug)]
pub struct BookingNotice {
    pub booking_id: Uuid,
    pub client_id: Uuid,
    pub instructor_id: Option<Uuid>,
    pub kind: BookingKind,
    pub starts_at_ms: i64,
    pub ends_at_ms: i64,
    pub participants: i64,
    pub price_total: i64,
    pub reason: Option<String>,
}

#[derive(Clone, Debug)]
pub struct PayoutNotice {
    pub payout_id: Uuid,
    pub instructor_id: Uuid,
    pub period_start_ms: i64,
    pub period_end_ms: i64,
    pub instructor_share: i64,
}

/// Abstraction over the notification collaborator.
///
/// Implementations own message rendering and delivery (push, email, ...).
/// Errors are reported back only so the dispatcher can log them.
#[async_trait]
pub trait NotificationSink: Send + Sync + 'static {
    async fn booking_confirmed(&self, notice: &BookingNotice) -> anyhow::Result<()>;

    async fn booking_cancelled(&self, notice: &BookingNotice) -> anyhow::Result<()>;

    async fn instructor_alert(&self, notice: &BookingNotice) -> anyhow::Result<()>;

    async fn admin_payout_created(&self, notice: &PayoutNotice) -> anyhow::Result<()>;
}

/// Best-effort fan-out over a `NotificationSink`.
///
/// Every method runs strictly post-commit; failures are logged and dropped,
/// never propagated into the transactional path that triggered them.
#[derive(Clone)]
pub struct NotificationDispatcher {
    sink: Arc<dyn NotificationSink>,
}

impl NotificationDispatcher {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self { sink }
    }

    pub async fn booking_confirmed(&self, notice: &BookingNotice) {
        let (client, instructor) = futures::join!(
            self.sink.booking_confirmed(notice),
            self.sink.instructor_alert(notice)
        );
        log_outcome("booking_confirmed", notice.booking_id, client);
        log_outcome("instructor_alert", notice.booking_id, instructor);
    }

    pub async fn booking_cancelled(&self, notice: &BookingNotice) {
        let (client, instructor) = futures::join!(
            self.sink.booking_cancelled(notice),
            self.sink.instructor_alert(notice)
        );
        log_outcome("booking_cancelled", notice.booking_id, client);
        log_outcome("instructor_alert", notice.booking_id, instructor);
    }

    pub async fn payout_created(&self, notice: &PayoutNotice) {
        if let Err(e) = self.sink.admin_payout_created(notice).await {
            warn!(
                payout_id = %notice.payout_id,
                error = ?e,
                "payout notification failed; dropped"
            );
        }
    }
}

fn log_outcome(label: &'static str, booking_id: Uuid, result: anyhow::Result<()>) {
    if let Err(e) = result {
        warn!(%booking_id, label, error = ?e, "notification failed; dropped");
    }
}

/// Default sink: structured log lines only.
///
/// Real transports (admin push, instructor push, transactional email) mount
/// behind `NotificationSink` in the outer application.
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn booking_confirmed(&self, notice: &BookingNotice) -> anyhow::Result<()> {
        info!(booking_id = %notice.booking_id, client_id = %notice.client_id, "notify: booking confirmed");
        Ok(())
    }

    async fn booking_cancelled(&self, notice: &BookingNotice) -> anyhow::Result<()> {
        info!(
            booking_id = %notice.booking_id,
            reason = notice.reason.as_deref().unwrap_or("-"),
            "notify: booking cancelled"
        );
        Ok(())
    }

    async fn instructor_alert(&self, notice: &BookingNotice) -> anyhow::Result<()> {
        if let Some(instructor_id) = notice.instructor_id {
            info!(booking_id = %notice.booking_id, %instructor_id, "notify: instructor");
        }
        Ok(())
    }

    async fn admin_payout_created(&self, notice: &PayoutNotice) -> anyhow::Result<()> {
        info!(
            payout_id = %notice.payout_id,
            instructor_id = %notice.instructor_id,
            share = notice.instructor_share,
            "notify: payout created"
        );
        Ok(())
    }
}

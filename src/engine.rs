//! Composition root: wires the engine's collaborators from configuration.
//!
//! The outer transport (HTTP handlers, an admin console) calls into the
//! public entry points; the binary itself only drives the hold reaper.

use std::sync::Arc;
use std::time::Duration;

use sqlx::AnyPool;

use crate::booking::repository::BookingRepository;
use crate::booking::repository_sqlx::SqlxBookingRepository;
use crate::config::AppConfig;
use crate::gateway::http::HttpPaymentGateway;
use crate::notify::{NotificationDispatcher, NotificationSink};
use crate::payout::aggregator::PayoutAggregator;
use crate::payout::repository_sqlx::SqlxPayoutRepository;
use crate::reconciliation::handler::ReconciliationHandler;
use crate::reservation::coordinator::ReservationCoordinator;
use crate::time::now_ms;

pub struct Engine {
    pub bookings: Arc<dyn BookingRepository>,
    pub reservations: ReservationCoordinator,
    pub reconciliation: ReconciliationHandler,
    pub payouts: PayoutAggregator,
    pub notifier: NotificationDispatcher,
}

impl Engine {
    pub fn from_config(
        cfg: &AppConfig,
        pool: AnyPool,
        sink: Arc<dyn NotificationSink>,
    ) -> anyhow::Result<Self> {
        let notifier = NotificationDispatcher::new(sink);
        let bookings: Arc<dyn BookingRepository> =
            Arc::new(SqlxBookingRepository::new(pool.clone()));
        let gateway = Arc::new(
            HttpPaymentGateway::new(cfg.gateway_base_url.clone())
                .map_err(|e| anyhow::anyhow!("payment gateway client: {e}"))?,
        );

        let reservations = ReservationCoordinator::new(
            bookings.clone(),
            gateway,
            notifier.clone(),
            cfg.slot_hold_ttl_ms,
            cfg.payment_return_url.clone(),
        );

        let reconciliation = ReconciliationHandler::new(
            bookings.clone(),
            notifier.clone(),
            cfg.gateway_secret.clone(),
        );

        let payouts = PayoutAggregator::new(
            Arc::new(SqlxPayoutRepository::new(pool)),
            notifier.clone(),
            cfg.admin_commission_pct,
        );

        Ok(Self {
            bookings,
            reservations,
            reconciliation,
            payouts,
            notifier,
        })
    }

    /// Starts the hold-reaper loop (fixed cadence). Each pass releases
    /// slots whose payment hold expired and notifies the affected clients.
    pub fn spawn_hold_reaper(&self, interval: Duration) {
        let bookings = self.bookings.clone();
        let notifier = self.notifier.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);

            loop {
                ticker.tick().await;

                match bookings.reap_expired_holds(now_ms()).await {
                    Ok(notices) => {
                        if !notices.is_empty() {
                            tracing::info!(released = notices.len(), "expired holds released");
                        }
                        for notice in &notices {
                            notifier.booking_cancelled(notice).await;
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = ?e, "hold reaper pass failed");
                    }
                }
            }
        });
    }
}

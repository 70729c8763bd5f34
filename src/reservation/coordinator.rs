//! Reservation coordinator.
//!
//! Responsibilities:
//! - Validate the inbound request (pure, no state change on failure).
//! - Run the reservation atomic unit: claim capacity, create the pending
//!   booking + transaction pair, commit.
//! - Initiate payment with the external gateway strictly *after* the
//!   transaction has closed, so a slow remote call never holds a row lock.
//! - On initiation failure, run the compensating unit and re-raise the
//!   original gateway error.
//!
//! Non-responsibilities:
//! - Reconciling payment results (reconciliation handler).
//! - Rendering or transporting notifications (sink behind the dispatcher).

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::booking::repository::BookingRepository;
use crate::booking::types::{CancelOutcome, NewGroupBooking, NewSlotBooking, ReserveOutcome};
use crate::error::BookingError;
use crate::gateway::{InitiatePayment, PaymentGateway};
use crate::logger::warn_if_slow;
use crate::notify::NotificationDispatcher;
use crate::reservation::types::{ReservationReceipt, ReservationRequest, ReservationTarget};
use crate::time::now_ms;

pub struct ReservationCoordinator {
    bookings: Arc<dyn BookingRepository>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: NotificationDispatcher,

    /// How long a claimed slot stays held waiting for payment.
    hold_ttl_ms: i64,

    /// Where the gateway sends the client after paying.
    return_url: String,
}

impl ReservationCoordinator {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: NotificationDispatcher,
        hold_ttl_ms: i64,
        return_url: String,
    ) -> Self {
        Self {
            bookings,
            gateway,
            notifier,
            hold_ttl_ms,
            return_url,
        }
    }

    /// Reserves capacity and starts payment.
    ///
    /// The client either gets a payment redirect or a specific reason the
    /// reservation failed; partial writes are never observable.
    #[instrument(skip(self, req), target = "reservation", fields(client_id = %req.client_id))]
    pub async fn reserve(
        &self,
        req: &ReservationRequest,
    ) -> Result<ReservationReceipt, BookingError> {
        validate(req)?;

        let outcome = warn_if_slow("reserve_capacity", Duration::from_millis(100), async {
            match &req.target {
                ReservationTarget::Slot {
                    slot_id,
                    instructor_id,
                    service_duration_ms,
                    price_total,
                } => {
                    self.bookings
                        .reserve_slot(&NewSlotBooking {
                            client_id: req.client_id,
                            slot_id: *slot_id,
                            expected_instructor_id: *instructor_id,
                            service_duration_ms: *service_duration_ms,
                            price_total: *price_total,
                            participant_names: req.participant_names.clone(),
                            hold_expires_at_ms: now_ms() + self.hold_ttl_ms,
                            description: format!("Individual training, slot {slot_id}"),
                        })
                        .await
                }
                ReservationTarget::Group {
                    session_id,
                    participants,
                } => {
                    self.bookings
                        .reserve_group(&NewGroupBooking {
                            client_id: req.client_id,
                            session_id: *session_id,
                            participants: *participants,
                            participant_names: req.participant_names.clone(),
                            description: format!(
                                "Group session {session_id}, {participants} participant(s)"
                            ),
                        })
                        .await
                }
            }
        })
        .await?;

        let reserved = match outcome {
            ReserveOutcome::Reserved(r) => r,
            ReserveOutcome::Unavailable(reason) => {
                info!(%reason, "reservation lost the capacity race");
                return Err(BookingError::CapacityConflict(reason));
            }
        };

        // Remote call outside any transaction.
        let initiation = self
            .gateway
            .initiate(&InitiatePayment {
                booking_id: reserved.booking_id,
                txn_id: reserved.txn_id,
                amount: reserved.amount,
                description: reserved.description.clone(),
                return_url: self.return_url.clone(),
            })
            .await;

        let initiation = match initiation {
            Ok(i) => i,
            Err(gateway_err) => {
                warn!(
                    booking_id = %reserved.booking_id,
                    error = ?gateway_err,
                    "payment initiation failed; compensating"
                );

                if let Err(comp_err) = self
                    .bookings
                    .cancel_failed_initiation(&reserved.booking_id)
                    .await
                {
                    // The booking stays pending; the hold reaper will
                    // release the capacity once the hold expires.
                    error!(
                        booking_id = %reserved.booking_id,
                        error = ?comp_err,
                        "compensation failed; left for hold reaper"
                    );
                }

                return Err(BookingError::PaymentInitiation(gateway_err));
            }
        };

        self.bookings
            .record_initiation(&reserved.booking_id, &initiation.payment_id)
            .await?;

        info!(
            booking_id = %reserved.booking_id,
            payment_id = %initiation.payment_id,
            "reservation committed and payment initiated"
        );

        Ok(ReservationReceipt {
            booking_id: reserved.booking_id,
            payment_redirect_url: initiation.redirect_url,
        })
    }

    /// Administrative cancellation.
    ///
    /// Releases capacity and cancels the booking in one atomic unit; if the
    /// payment had already completed, a refund is requested from the
    /// gateway best-effort (the terminal `refunded` state arrives through
    /// the normal callback path).
    #[instrument(skip(self), target = "reservation")]
    pub async fn cancel(&self, booking_id: &Uuid, reason: &str) -> Result<(), BookingError> {
        match self.bookings.cancel_admin(booking_id, reason).await? {
            CancelOutcome::UnknownBooking => Err(BookingError::BookingNotFound(*booking_id)),
            CancelOutcome::AlreadyTerminal(status) => {
                info!(?status, "cancellation skipped; booking already terminal");
                Ok(())
            }
            CancelOutcome::Cancelled { notice, refund } => {
                if let Some(r) = refund {
                    if let Err(e) = self
                        .gateway
                        .request_refund(&r.gateway_payment_id, r.amount)
                        .await
                    {
                        warn!(
                            %booking_id,
                            error = ?e,
                            "refund request failed; gateway will be retried by operations"
                        );
                    }
                }

                self.notifier.booking_cancelled(&notice).await;
                Ok(())
            }
        }
    }
}

fn validate(req: &ReservationRequest) -> Result<(), BookingError> {
    if !req.consent {
        return Err(BookingError::Validation(
            "consent to the booking terms is required".into(),
        ));
    }

    match &req.target {
        ReservationTarget::Slot {
            service_duration_ms,
            price_total,
            ..
        } => {
            if *service_duration_ms <= 0 {
                return Err(BookingError::Validation(
                    "service duration must be positive".into(),
                ));
            }
            if *price_total <= 0 {
                return Err(BookingError::Validation("price must be positive".into()));
            }
        }
        ReservationTarget::Group { participants, .. } => {
            if *participants < 1 {
                return Err(BookingError::Validation(
                    "at least one participant is required".into(),
                ));
            }
            if !req.participant_names.is_empty()
                && req.participant_names.len() as i64 != *participants
            {
                return Err(BookingError::Validation(
                    "participant names must match the participant count".into(),
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    use crate::booking::model::{Booking, PaymentTransaction};
    use crate::booking::types::{
        PaymentOutcome, ReconcileApplied, ReservedBooking,
    };
    use crate::capacity::model::UnavailableReason;
    use crate::gateway::{GatewayError, PaymentInitiation};
    use crate::notify::{BookingNotice, LogNotifier, NotificationSink, PayoutNotice};

    /// Scripted repository: records calls, replays configured outcomes.
    struct MockBookingRepo {
        reserve_outcome: Mutex<Option<ReserveOutcome>>,
        compensations: Mutex<Vec<Uuid>>,
        initiations: Mutex<Vec<(Uuid, String)>>,
    }

    impl MockBookingRepo {
        fn reserving(outcome: ReserveOutcome) -> Self {
            Self {
                reserve_outcome: Mutex::new(Some(outcome)),
                compensations: Mutex::new(vec![]),
                initiations: Mutex::new(vec![]),
            }
        }

        fn take_outcome(&self) -> ReserveOutcome {
            self.reserve_outcome
                .lock()
                .take()
                .expect("reserve called more than once")
        }
    }

    #[async_trait]
    impl BookingRepository for MockBookingRepo {
        async fn reserve_slot(&self, _: &NewSlotBooking) -> anyhow::Result<ReserveOutcome> {
            Ok(self.take_outcome())
        }

        async fn reserve_group(&self, _: &NewGroupBooking) -> anyhow::Result<ReserveOutcome> {
            Ok(self.take_outcome())
        }

        async fn record_initiation(
            &self,
            booking_id: &Uuid,
            gateway_payment_id: &str,
        ) -> anyhow::Result<()> {
            self.initiations
                .lock()
                .push((*booking_id, gateway_payment_id.to_string()));
            Ok(())
        }

        async fn cancel_failed_initiation(&self, booking_id: &Uuid) -> anyhow::Result<()> {
            self.compensations.lock().push(*booking_id);
            Ok(())
        }

        async fn reconcile(
            &self,
            _: &Uuid,
            _: &PaymentOutcome,
            _: &str,
            _: &str,
        ) -> anyhow::Result<ReconcileApplied> {
            unreachable!("not used in coordinator tests")
        }

        async fn cancel_admin(&self, _: &Uuid, _: &str) -> anyhow::Result<CancelOutcome> {
            unreachable!("not used in coordinator tests")
        }

        async fn reap_expired_holds(&self, _: i64) -> anyhow::Result<Vec<BookingNotice>> {
            Ok(vec![])
        }

        async fn fetch_booking(&self, _: &Uuid) -> anyhow::Result<Option<Booking>> {
            Ok(None)
        }

        async fn fetch_transaction(&self, _: &Uuid) -> anyhow::Result<Option<PaymentTransaction>> {
            Ok(None)
        }
    }

    struct MockGateway {
        fail: bool,
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl PaymentGateway for MockGateway {
        async fn initiate(
            &self,
            _: &InitiatePayment,
        ) -> Result<PaymentInitiation, GatewayError> {
            *self.calls.lock() += 1;
            if self.fail {
                Err(GatewayError::Rejected("merchant disabled".into()))
            } else {
                Ok(PaymentInitiation {
                    payment_id: "pay-1".into(),
                    redirect_url: "https://gateway.example.test/pay/1".into(),
                })
            }
        }

        async fn request_refund(&self, _: &str, _: i64) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    fn mk_coordinator(
        repo: Arc<MockBookingRepo>,
        gateway: Arc<MockGateway>,
    ) -> ReservationCoordinator {
        ReservationCoordinator::new(
            repo,
            gateway,
            NotificationDispatcher::new(Arc::new(LogNotifier)),
            900_000,
            "https://booking.example.test/done".into(),
        )
    }

    fn slot_request() -> ReservationRequest {
        ReservationRequest {
            client_id: Uuid::new_v4(),
            target: ReservationTarget::Slot {
                slot_id: Uuid::new_v4(),
                instructor_id: Uuid::new_v4(),
                service_duration_ms: 3_600_000,
                price_total: 8_000,
            },
            participant_names: vec!["Ada".into()],
            consent: true,
        }
    }

    fn reserved() -> ReserveOutcome {
        ReserveOutcome::Reserved(ReservedBooking {
            booking_id: Uuid::new_v4(),
            txn_id: Uuid::new_v4(),
            amount: 8_000,
            description: "Individual training".into(),
        })
    }

    // Sink that counts deliveries; used to prove the cancel path notifies.
    struct CountingSink {
        cancelled: Mutex<usize>,
    }

    #[async_trait]
    impl NotificationSink for CountingSink {
        async fn booking_confirmed(&self, _: &BookingNotice) -> anyhow::Result<()> {
            Ok(())
        }
        async fn booking_cancelled(&self, _: &BookingNotice) -> anyhow::Result<()> {
            *self.cancelled.lock() += 1;
            Ok(())
        }
        async fn instructor_alert(&self, _: &BookingNotice) -> anyhow::Result<()> {
            Ok(())
        }
        async fn admin_payout_created(&self, _: &PayoutNotice) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn missing_consent_is_rejected_without_repo_access() {
        let repo = Arc::new(MockBookingRepo::reserving(reserved()));
        let gateway = Arc::new(MockGateway {
            fail: false,
            calls: Mutex::new(0),
        });
        let coordinator = mk_coordinator(repo.clone(), gateway.clone());

        let mut req = slot_request();
        req.consent = false;

        let err = coordinator.reserve(&req).await.unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));

        // Validation failures must not touch capacity or the gateway.
        assert!(repo.reserve_outcome.lock().is_some());
        assert_eq!(*gateway.calls.lock(), 0);
    }

    #[tokio::test]
    async fn capacity_conflict_surfaces_typed_reason() {
        let repo = Arc::new(MockBookingRepo::reserving(ReserveOutcome::Unavailable(
            UnavailableReason::SlotTaken,
        )));
        let gateway = Arc::new(MockGateway {
            fail: false,
            calls: Mutex::new(0),
        });
        let coordinator = mk_coordinator(repo, gateway.clone());

        let err = coordinator.reserve(&slot_request()).await.unwrap_err();
        match err {
            BookingError::CapacityConflict(UnavailableReason::SlotTaken) => {}
            other => panic!("expected capacity conflict, got {other:?}"),
        }
        assert_eq!(*gateway.calls.lock(), 0);
    }

    #[tokio::test]
    async fn gateway_failure_triggers_exactly_one_compensation() {
        let repo = Arc::new(MockBookingRepo::reserving(reserved()));
        let gateway = Arc::new(MockGateway {
            fail: true,
            calls: Mutex::new(0),
        });
        let coordinator = mk_coordinator(repo.clone(), gateway);

        let err = coordinator.reserve(&slot_request()).await.unwrap_err();
        assert!(matches!(err, BookingError::PaymentInitiation(_)));

        assert_eq!(repo.compensations.lock().len(), 1);
        assert!(repo.initiations.lock().is_empty());
    }

    #[tokio::test]
    async fn success_records_initiation_and_returns_redirect() {
        let repo = Arc::new(MockBookingRepo::reserving(reserved()));
        let gateway = Arc::new(MockGateway {
            fail: false,
            calls: Mutex::new(0),
        });
        let coordinator = mk_coordinator(repo.clone(), gateway);

        let receipt = coordinator.reserve(&slot_request()).await.unwrap();
        assert_eq!(
            receipt.payment_redirect_url,
            "https://gateway.example.test/pay/1"
        );

        let initiations = repo.initiations.lock();
        assert_eq!(initiations.len(), 1);
        assert_eq!(initiations[0].1, "pay-1");
        assert!(repo.compensations.lock().is_empty());
    }

    #[tokio::test]
    async fn group_name_count_mismatch_is_rejected() {
        let repo = Arc::new(MockBookingRepo::reserving(reserved()));
        let gateway = Arc::new(MockGateway {
            fail: false,
            calls: Mutex::new(0),
        });
        let coordinator = mk_coordinator(repo, gateway);

        let req = ReservationRequest {
            client_id: Uuid::new_v4(),
            target: ReservationTarget::Group {
                session_id: Uuid::new_v4(),
                participants: 3,
            },
            participant_names: vec!["Ada".into(), "Grace".into()],
            consent: true,
        };

        let err = coordinator.reserve(&req).await.unwrap_err();
        assert!(matches!(err, BookingError::Validation(_)));
    }

    #[tokio::test]
    async fn admin_cancel_notifies_and_requests_refund() {
        struct CancellingRepo {
            refund: Mutex<Option<crate::booking::types::RefundRequest>>,
        }

        #[async_trait]
        impl BookingRepository for CancellingRepo {
            async fn reserve_slot(&self, _: &NewSlotBooking) -> anyhow::Result<ReserveOutcome> {
                unreachable!()
            }
            async fn reserve_group(&self, _: &NewGroupBooking) -> anyhow::Result<ReserveOutcome> {
                unreachable!()
            }
            async fn record_initiation(&self, _: &Uuid, _: &str) -> anyhow::Result<()> {
                Ok(())
            }
            async fn cancel_failed_initiation(&self, _: &Uuid) -> anyhow::Result<()> {
                Ok(())
            }
            async fn reconcile(
                &self,
                _: &Uuid,
                _: &PaymentOutcome,
                _: &str,
                _: &str,
            ) -> anyhow::Result<ReconcileApplied> {
                unreachable!()
            }
            async fn cancel_admin(
                &self,
                booking_id: &Uuid,
                reason: &str,
            ) -> anyhow::Result<CancelOutcome> {
                Ok(CancelOutcome::Cancelled {
                    notice: BookingNotice {
                        booking_id: *booking_id,
                        client_id: Uuid::new_v4(),
                        instructor_id: Some(Uuid::new_v4()),
                        kind: crate::booking::model::BookingKind::Individual,
                        starts_at_ms: 0,
                        ends_at_ms: 3_600_000,
                        participants: 1,
                        price_total: 8_000,
                        reason: Some(reason.to_string()),
                    },
                    refund: self.refund.lock().take(),
                })
            }
            async fn reap_expired_holds(&self, _: i64) -> anyhow::Result<Vec<BookingNotice>> {
                Ok(vec![])
            }
            async fn fetch_booking(&self, _: &Uuid) -> anyhow::Result<Option<Booking>> {
                Ok(None)
            }
            async fn fetch_transaction(
                &self,
                _: &Uuid,
            ) -> anyhow::Result<Option<PaymentTransaction>> {
                Ok(None)
            }
        }

        let repo = Arc::new(CancellingRepo {
            refund: Mutex::new(Some(crate::booking::types::RefundRequest {
                gateway_payment_id: "pay-9".into(),
                amount: 8_000,
            })),
        });
        let gateway = Arc::new(MockGateway {
            fail: false,
            calls: Mutex::new(0),
        });
        let sink = Arc::new(CountingSink {
            cancelled: Mutex::new(0),
        });

        let coordinator = ReservationCoordinator::new(
            repo,
            gateway,
            NotificationDispatcher::new(sink.clone()),
            900_000,
            "https://booking.example.test/done".into(),
        );

        coordinator
            .cancel(&Uuid::new_v4(), "client no-show")
            .await
            .unwrap();

        assert_eq!(*sink.cancelled.lock(), 1);
    }
}

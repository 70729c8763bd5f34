//! SQLx-backed implementation of `BookingRepository`.
//!
//! Concurrency discipline: every capacity mutation is a guarded conditional
//! UPDATE executed inside the same transaction as the booking/transaction
//! writes. Two claimants racing for the same row are serialized by the
//! store; the loser observes the post-mutation state (zero rows affected)
//! and the whole unit rolls back without partial writes.

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{Any, AnyPool, Row, Transaction};
use uuid::Uuid;

use crate::booking::model::{Booking, BookingKind, BookingStatus, PaymentTransaction, TxnStatus};
use crate::booking::repository::BookingRepository;
use crate::booking::types::{
    CancelOutcome, NewGroupBooking, NewSlotBooking, PaymentOutcome, ReconcileApplied,
    RefundRequest, ReserveOutcome, ReservedBooking,
};
use crate::capacity::model::UnavailableReason;
use crate::capacity::repository_sqlx::{parse_opt_uuid, parse_uuid, row_to_slot};
use crate::notify::BookingNotice;
use crate::time::now_ms;

pub struct SqlxBookingRepository {
    pool: AnyPool,
}

impl SqlxBookingRepository {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookingRepository for SqlxBookingRepository {
    async fn reserve_slot(&self, req: &NewSlotBooking) -> anyhow::Result<ReserveOutcome> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
SELECT slot_id, instructor_id, starts_at_ms, ends_at_ms, status, hold_expires_at_ms, holding_txn_id
FROM slots
WHERE slot_id = ?;
"#,
        )
        .bind(req.slot_id.to_string())
        .fetch_optional(&mut *tx)
        .await?;

        let slot = match row {
            Some(r) => row_to_slot(&r)?,
            None => return Ok(ReserveOutcome::Unavailable(UnavailableReason::SlotNotFound)),
        };

        if slot.instructor_id != req.expected_instructor_id {
            return Ok(ReserveOutcome::Unavailable(
                UnavailableReason::WrongInstructor,
            ));
        }
        if slot.duration_ms() < req.service_duration_ms {
            return Ok(ReserveOutcome::Unavailable(UnavailableReason::SlotTooShort));
        }

        let txn_id = Uuid::new_v4();

        // Guarded claim: only an available slot can move to held. A racing
        // claimant that committed first leaves zero rows for us to update.
        let claimed = sqlx::query(
            r#"
UPDATE slots
SET status = 'held', hold_expires_at_ms = ?, holding_txn_id = ?
WHERE slot_id = ? AND status = 'available';
"#,
        )
        .bind(req.hold_expires_at_ms)
        .bind(txn_id.to_string())
        .bind(req.slot_id.to_string())
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            return Ok(ReserveOutcome::Unavailable(UnavailableReason::SlotTaken));
        }

        let booking = Booking {
            booking_id: Uuid::new_v4(),
            client_id: req.client_id,
            kind: BookingKind::Individual,
            slot_id: Some(req.slot_id),
            group_session_id: None,
            instructor_id: Some(slot.instructor_id),
            starts_at_ms: slot.starts_at_ms,
            ends_at_ms: slot.ends_at_ms,
            participants: 1,
            participant_names: req.participant_names.clone(),
            price_total: req.price_total,
            price_per_participant: req.price_total,
            status: BookingStatus::Pending,
            cancellation_reason: None,
            cancelled_at_ms: None,
            created_at_ms: now_ms(),
        };

        insert_pending_pair(&mut tx, &booking, txn_id, &req.description).await?;
        tx.commit().await?;

        Ok(ReserveOutcome::Reserved(ReservedBooking {
            booking_id: booking.booking_id,
            txn_id,
            amount: booking.price_total,
            description: req.description.clone(),
        }))
    }

    async fn reserve_group(&self, req: &NewGroupBooking) -> anyhow::Result<ReserveOutcome> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
SELECT session_id, instructor_id, starts_at_ms, ends_at_ms,
       min_participants, max_participants, current_participants,
       price_per_participant, status
FROM group_sessions
WHERE session_id = ?;
"#,
        )
        .bind(req.session_id.to_string())
        .fetch_optional(&mut *tx)
        .await?;

        let session = match row {
            Some(r) => crate::capacity::repository_sqlx::row_to_group_session(&r)?,
            None => {
                return Ok(ReserveOutcome::Unavailable(
                    UnavailableReason::SessionNotFound,
                ));
            }
        };

        if session.status != crate::capacity::model::GroupSessionStatus::Open {
            return Ok(ReserveOutcome::Unavailable(
                UnavailableReason::SessionNotOpen,
            ));
        }

        // Seat-sum invariant lives in this single statement: the increment
        // only happens when the post-increment count still fits. Validation
        // read and write are never split across transactions.
        let claimed = sqlx::query(
            r#"
UPDATE group_sessions
SET current_participants = current_participants + ?
WHERE session_id = ?
  AND status = 'open'
  AND current_participants + ? <= max_participants;
"#,
        )
        .bind(req.participants)
        .bind(req.session_id.to_string())
        .bind(req.participants)
        .execute(&mut *tx)
        .await?;

        if claimed.rows_affected() == 0 {
            // Loser path: report the seats actually remaining now.
            let remaining: i64 = sqlx::query(
                r#"SELECT max_participants - current_participants AS remaining FROM group_sessions WHERE session_id = ?;"#,
            )
            .bind(req.session_id.to_string())
            .fetch_one(&mut *tx)
            .await?
            .get("remaining");

            return Ok(ReserveOutcome::Unavailable(
                UnavailableReason::InsufficientSeats { remaining },
            ));
        }

        let price_total = session
            .price_per_participant
            .checked_mul(req.participants)
            .context("price overflow")?;

        let txn_id = Uuid::new_v4();
        let booking = Booking {
            booking_id: Uuid::new_v4(),
            client_id: req.client_id,
            kind: BookingKind::Group,
            slot_id: None,
            group_session_id: Some(req.session_id),
            instructor_id: session.instructor_id,
            starts_at_ms: session.starts_at_ms,
            ends_at_ms: session.ends_at_ms,
            participants: req.participants,
            participant_names: req.participant_names.clone(),
            price_total,
            price_per_participant: session.price_per_participant,
            status: BookingStatus::Pending,
            cancellation_reason: None,
            cancelled_at_ms: None,
            created_at_ms: now_ms(),
        };

        insert_pending_pair(&mut tx, &booking, txn_id, &req.description).await?;
        tx.commit().await?;

        Ok(ReserveOutcome::Reserved(ReservedBooking {
            booking_id: booking.booking_id,
            txn_id,
            amount: price_total,
            description: req.description.clone(),
        }))
    }

    async fn record_initiation(
        &self,
        booking_id: &Uuid,
        gateway_payment_id: &str,
    ) -> anyhow::Result<()> {
        sqlx::query(
            r#"UPDATE payment_transactions SET gateway_payment_id = ? WHERE booking_id = ?;"#,
        )
        .bind(gateway_payment_id)
        .bind(booking_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn cancel_failed_initiation(&self, booking_id: &Uuid) -> anyhow::Result<()> {
        let mut tx = self.pool.begin().await?;

        let booking = match fetch_booking_tx(&mut tx, booking_id).await? {
            Some(b) => b,
            None => return Ok(()),
        };

        // Status guard makes the compensation idempotent: once the booking
        // has left pending this whole unit is a no-op.
        let updated = sqlx::query(
            r#"
UPDATE bookings
SET status = 'cancelled', cancellation_reason = ?, cancelled_at_ms = ?
WHERE booking_id = ? AND status = 'pending';
"#,
        )
        .bind("payment initiation failed")
        .bind(now_ms())
        .bind(booking_id.to_string())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(());
        }

        sqlx::query(
            r#"UPDATE payment_transactions SET status = 'failed' WHERE booking_id = ? AND status = 'pending';"#,
        )
        .bind(booking_id.to_string())
        .execute(&mut *tx)
        .await?;

        release_capacity(&mut tx, &booking).await?;
        tx.commit().await?;

        Ok(())
    }

    async fn reconcile(
        &self,
        booking_id: &Uuid,
        outcome: &PaymentOutcome,
        gateway_payment_id: &str,
        raw_status: &str,
    ) -> anyhow::Result<ReconcileApplied> {
        let mut tx = self.pool.begin().await?;

        let booking = match fetch_booking_tx(&mut tx, booking_id).await? {
            Some(b) => b,
            None => return Ok(ReconcileApplied::UnknownBooking),
        };

        // Every terminal branch starts with a booking UPDATE guarded on the
        // status we just read. A concurrent unit that committed in between
        // leaves zero rows for us; the loser must not release capacity or
        // emit a notice, on any store isolation level.
        let applied = match (booking.status, outcome) {
            (BookingStatus::Pending, PaymentOutcome::Success) => {
                if !transition_booking(
                    &mut tx,
                    booking_id,
                    BookingStatus::Pending,
                    BookingStatus::Confirmed,
                    None,
                )
                .await?
                {
                    ReconcileApplied::AlreadyApplied
                } else {
                    transition_txn(
                        &mut tx,
                        booking_id,
                        TxnStatus::Completed,
                        gateway_payment_id,
                        raw_status,
                    )
                    .await?;

                    if let Some(slot_id) = booking.slot_id {
                        sqlx::query(
                            r#"UPDATE slots SET status = 'booked', hold_expires_at_ms = NULL WHERE slot_id = ? AND status = 'held';"#,
                        )
                        .bind(slot_id.to_string())
                        .execute(&mut *tx)
                        .await?;
                    }

                    ReconcileApplied::Confirmed(notice_from(&booking, None))
                }
            }

            (BookingStatus::Pending, PaymentOutcome::Rejected) => {
                let reason = "payment rejected by gateway".to_string();
                if !transition_booking(
                    &mut tx,
                    booking_id,
                    BookingStatus::Pending,
                    BookingStatus::Cancelled,
                    Some(&reason),
                )
                .await?
                {
                    ReconcileApplied::AlreadyApplied
                } else {
                    transition_txn(
                        &mut tx,
                        booking_id,
                        TxnStatus::Failed,
                        gateway_payment_id,
                        raw_status,
                    )
                    .await?;
                    release_capacity(&mut tx, &booking).await?;

                    ReconcileApplied::Cancelled(notice_from(&booking, Some(reason)))
                }
            }

            // A reversal releases capacity whether it arrives before or
            // after confirmation; a reversal of an already-cancelled booking
            // only flips the statuses (capacity went back at cancel time).
            (
                BookingStatus::Pending | BookingStatus::Confirmed | BookingStatus::Cancelled,
                PaymentOutcome::Refunded,
            ) => {
                let reason = "payment refunded".to_string();
                if !transition_booking(
                    &mut tx,
                    booking_id,
                    booking.status,
                    BookingStatus::Refunded,
                    Some(&reason),
                )
                .await?
                {
                    ReconcileApplied::AlreadyApplied
                } else {
                    transition_txn(
                        &mut tx,
                        booking_id,
                        TxnStatus::Cancelled,
                        gateway_payment_id,
                        raw_status,
                    )
                    .await?;

                    if booking.status != BookingStatus::Cancelled {
                        release_capacity(&mut tx, &booking).await?;
                    }

                    ReconcileApplied::Refunded(notice_from(&booking, Some(reason)))
                }
            }

            (_, PaymentOutcome::Intermediate(raw)) => {
                sqlx::query(
                    r#"UPDATE payment_transactions SET gateway_status = ? WHERE booking_id = ?;"#,
                )
                .bind(raw)
                .bind(booking_id.to_string())
                .execute(&mut *tx)
                .await?;

                ReconcileApplied::MetadataRecorded
            }

            // Re-delivery of an already-applied terminal signal.
            (BookingStatus::Confirmed, PaymentOutcome::Success)
            | (BookingStatus::Cancelled, PaymentOutcome::Rejected)
            | (BookingStatus::Refunded, PaymentOutcome::Refunded) => {
                ReconcileApplied::AlreadyApplied
            }

            _ => ReconcileApplied::OutOfOrder {
                current: booking.status,
            },
        };

        tx.commit().await?;
        Ok(applied)
    }

    async fn cancel_admin(
        &self,
        booking_id: &Uuid,
        reason: &str,
    ) -> anyhow::Result<CancelOutcome> {
        let mut tx = self.pool.begin().await?;

        let booking = match fetch_booking_tx(&mut tx, booking_id).await? {
            Some(b) => b,
            None => return Ok(CancelOutcome::UnknownBooking),
        };

        match booking.status {
            BookingStatus::Pending | BookingStatus::Confirmed => {}
            terminal => return Ok(CancelOutcome::AlreadyTerminal(terminal)),
        }

        let txn = fetch_transaction_tx(&mut tx, booking_id).await?;

        let updated = sqlx::query(
            r#"
UPDATE bookings
SET status = 'cancelled', cancellation_reason = ?, cancelled_at_ms = ?
WHERE booking_id = ? AND status IN ('pending', 'confirmed');
"#,
        )
        .bind(reason)
        .bind(now_ms())
        .bind(booking_id.to_string())
        .execute(&mut *tx)
        .await?;

        // A reconciliation unit may have moved the booking to a terminal
        // status since our read; it already handled the capacity.
        if updated.rows_affected() == 0 {
            let current = fetch_booking_tx(&mut tx, booking_id)
                .await?
                .map(|b| b.status)
                .unwrap_or(booking.status);
            return Ok(CancelOutcome::AlreadyTerminal(current));
        }

        // A completed payment stays completed here; the refunded terminal
        // state arrives later through the gateway callback.
        sqlx::query(
            r#"UPDATE payment_transactions SET status = 'cancelled' WHERE booking_id = ? AND status = 'pending';"#,
        )
        .bind(booking_id.to_string())
        .execute(&mut *tx)
        .await?;

        release_capacity(&mut tx, &booking).await?;
        tx.commit().await?;

        let refund = txn.and_then(|t| match (t.status, t.gateway_payment_id) {
            (TxnStatus::Completed, Some(payment_id)) => Some(RefundRequest {
                gateway_payment_id: payment_id,
                amount: t.amount,
            }),
            _ => None,
        });

        Ok(CancelOutcome::Cancelled {
            notice: notice_from(&booking, Some(reason.to_string())),
            refund,
        })
    }

    async fn reap_expired_holds(&self, now_ms_: i64) -> anyhow::Result<Vec<BookingNotice>> {
        let mut tx = self.pool.begin().await?;

        let rows = sqlx::query(
            r#"
SELECT b.booking_id
FROM bookings b
JOIN slots s ON s.slot_id = b.slot_id
WHERE b.status = 'pending'
  AND s.status = 'held'
  AND s.hold_expires_at_ms IS NOT NULL
  AND s.hold_expires_at_ms < ?;
"#,
        )
        .bind(now_ms_)
        .fetch_all(&mut *tx)
        .await?;

        let mut reaped = Vec::new();

        for r in rows {
            let booking_id = parse_uuid(r.get("booking_id")).context("invalid booking_id")?;

            let booking = match fetch_booking_tx(&mut tx, &booking_id).await? {
                Some(b) => b,
                None => continue,
            };

            let reason = "payment hold expired".to_string();
            let updated = sqlx::query(
                r#"
UPDATE bookings
SET status = 'cancelled', cancellation_reason = ?, cancelled_at_ms = ?
WHERE booking_id = ? AND status = 'pending';
"#,
            )
            .bind(&reason)
            .bind(now_ms())
            .bind(booking_id.to_string())
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                continue;
            }

            sqlx::query(
                r#"UPDATE payment_transactions SET status = 'failed' WHERE booking_id = ? AND status = 'pending';"#,
            )
            .bind(booking_id.to_string())
            .execute(&mut *tx)
            .await?;

            release_capacity(&mut tx, &booking).await?;
            reaped.push(notice_from(&booking, Some(reason)));
        }

        tx.commit().await?;
        Ok(reaped)
    }

    async fn fetch_booking(&self, booking_id: &Uuid) -> anyhow::Result<Option<Booking>> {
        let row = sqlx::query(BOOKING_SELECT)
            .bind(booking_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_booking(&r)?)),
            None => Ok(None),
        }
    }

    async fn fetch_transaction(
        &self,
        booking_id: &Uuid,
    ) -> anyhow::Result<Option<PaymentTransaction>> {
        let row = sqlx::query(TXN_SELECT)
            .bind(booking_id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => Ok(Some(row_to_txn(&r)?)),
            None => Ok(None),
        }
    }
}

/* =========================
Atomic-unit building blocks
========================= */

const BOOKING_SELECT: &str = r#"
SELECT booking_id, client_id, kind, slot_id, group_session_id, instructor_id,
       starts_at_ms, ends_at_ms, participants, participant_names,
       price_total, price_per_participant, status,
       cancellation_reason, cancelled_at_ms, created_at_ms
FROM bookings
WHERE booking_id = ?;
"#;

const TXN_SELECT: &str = r#"
SELECT txn_id, booking_id, client_id, amount, status,
       gateway_payment_id, gateway_status, description, created_at_ms
FROM payment_transactions
WHERE booking_id = ?;
"#;

async fn insert_pending_pair(
    tx: &mut Transaction<'_, Any>,
    booking: &Booking,
    txn_id: Uuid,
    description: &str,
) -> anyhow::Result<()> {
    let names = serde_json::to_string(&booking.participant_names)?;

    sqlx::query(
        r#"
INSERT INTO bookings (booking_id, client_id, kind, slot_id, group_session_id, instructor_id,
                      starts_at_ms, ends_at_ms, participants, participant_names,
                      price_total, price_per_participant, status,
                      cancellation_reason, cancelled_at_ms, created_at_ms)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, NULL, ?);
"#,
    )
    .bind(booking.booking_id.to_string())
    .bind(booking.client_id.to_string())
    .bind(booking.kind.as_str())
    .bind(booking.slot_id.map(|id| id.to_string()))
    .bind(booking.group_session_id.map(|id| id.to_string()))
    .bind(booking.instructor_id.map(|id| id.to_string()))
    .bind(booking.starts_at_ms)
    .bind(booking.ends_at_ms)
    .bind(booking.participants)
    .bind(names)
    .bind(booking.price_total)
    .bind(booking.price_per_participant)
    .bind(booking.status.as_str())
    .bind(booking.created_at_ms)
    .execute(&mut **tx)
    .await?;

    sqlx::query(
        r#"
INSERT INTO payment_transactions (txn_id, booking_id, client_id, amount, status,
                                  gateway_payment_id, gateway_status, description, created_at_ms)
VALUES (?, ?, ?, ?, 'pending', NULL, NULL, ?, ?);
"#,
    )
    .bind(txn_id.to_string())
    .bind(booking.booking_id.to_string())
    .bind(booking.client_id.to_string())
    .bind(booking.price_total)
    .bind(description)
    .bind(booking.created_at_ms)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn fetch_booking_tx(
    tx: &mut Transaction<'_, Any>,
    booking_id: &Uuid,
) -> anyhow::Result<Option<Booking>> {
    let row = sqlx::query(BOOKING_SELECT)
        .bind(booking_id.to_string())
        .fetch_optional(&mut **tx)
        .await?;

    match row {
        Some(r) => Ok(Some(row_to_booking(&r)?)),
        None => Ok(None),
    }
}

async fn fetch_transaction_tx(
    tx: &mut Transaction<'_, Any>,
    booking_id: &Uuid,
) -> anyhow::Result<Option<PaymentTransaction>> {
    let row = sqlx::query(TXN_SELECT)
        .bind(booking_id.to_string())
        .fetch_optional(&mut **tx)
        .await?;

    match row {
        Some(r) => Ok(Some(row_to_txn(&r)?)),
        None => Ok(None),
    }
}

/// Guarded booking transition. Returns false when the row no longer holds
/// `from`, which means another unit committed first.
async fn transition_booking(
    tx: &mut Transaction<'_, Any>,
    booking_id: &Uuid,
    from: BookingStatus,
    to: BookingStatus,
    reason: Option<&str>,
) -> anyhow::Result<bool> {
    let cancelled_at = match to {
        BookingStatus::Cancelled | BookingStatus::Refunded => Some(now_ms()),
        _ => None,
    };

    let res = sqlx::query(
        r#"
UPDATE bookings
SET status = ?, cancellation_reason = ?, cancelled_at_ms = ?
WHERE booking_id = ? AND status = ?;
"#,
    )
    .bind(to.as_str())
    .bind(reason)
    .bind(cancelled_at)
    .bind(booking_id.to_string())
    .bind(from.as_str())
    .execute(&mut **tx)
    .await?;

    Ok(res.rows_affected() > 0)
}

async fn transition_txn(
    tx: &mut Transaction<'_, Any>,
    booking_id: &Uuid,
    to: TxnStatus,
    gateway_payment_id: &str,
    raw_status: &str,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
UPDATE payment_transactions
SET status = ?, gateway_payment_id = ?, gateway_status = ?
WHERE booking_id = ?;
"#,
    )
    .bind(to.as_str())
    .bind(gateway_payment_id)
    .bind(raw_status)
    .bind(booking_id.to_string())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Reverts the capacity unit a booking claimed. Guards keep the operation
/// idempotent: a slot is only reset from held/booked, a seat counter never
/// goes below zero.
async fn release_capacity(tx: &mut Transaction<'_, Any>, booking: &Booking) -> anyhow::Result<()> {
    match booking.kind {
        BookingKind::Individual => {
            if let Some(slot_id) = booking.slot_id {
                sqlx::query(
                    r#"
UPDATE slots
SET status = 'available', hold_expires_at_ms = NULL, holding_txn_id = NULL
WHERE slot_id = ? AND status IN ('held', 'booked');
"#,
                )
                .bind(slot_id.to_string())
                .execute(&mut **tx)
                .await?;
            }
        }
        BookingKind::Group => {
            if let Some(session_id) = booking.group_session_id {
                sqlx::query(
                    r#"
UPDATE group_sessions
SET current_participants = current_participants - ?
WHERE session_id = ? AND current_participants >= ?;
"#,
                )
                .bind(booking.participants)
                .bind(session_id.to_string())
                .bind(booking.participants)
                .execute(&mut **tx)
                .await?;
            }
        }
    }

    Ok(())
}

/* =========================
Row mapping
========================= */

fn row_to_booking(r: &sqlx::any::AnyRow) -> anyhow::Result<Booking> {
    let names_json: String = r.get("participant_names");
    let participant_names: Vec<String> =
        serde_json::from_str(&names_json).context("malformed participant_names")?;

    Ok(Booking {
        booking_id: parse_uuid(r.get("booking_id")).context("invalid booking_id")?,
        client_id: parse_uuid(r.get("client_id")).context("invalid client_id")?,
        kind: BookingKind::parse(&r.get::<String, _>("kind"))?,
        slot_id: parse_opt_uuid(r.get("slot_id")).context("invalid slot_id")?,
        group_session_id: parse_opt_uuid(r.get("group_session_id"))
            .context("invalid group_session_id")?,
        instructor_id: parse_opt_uuid(r.get("instructor_id")).context("invalid instructor_id")?,
        starts_at_ms: r.get("starts_at_ms"),
        ends_at_ms: r.get("ends_at_ms"),
        participants: r.get("participants"),
        participant_names,
        price_total: r.get("price_total"),
        price_per_participant: r.get("price_per_participant"),
        status: BookingStatus::parse(&r.get::<String, _>("status"))?,
        cancellation_reason: r.get("cancellation_reason"),
        cancelled_at_ms: r.get("cancelled_at_ms"),
        created_at_ms: r.get("created_at_ms"),
    })
}

fn row_to_txn(r: &sqlx::any::AnyRow) -> anyhow::Result<PaymentTransaction> {
    Ok(PaymentTransaction {
        txn_id: parse_uuid(r.get("txn_id")).context("invalid txn_id")?,
        booking_id: parse_uuid(r.get("booking_id")).context("invalid booking_id")?,
        client_id: parse_uuid(r.get("client_id")).context("invalid client_id")?,
        amount: r.get("amount"),
        status: TxnStatus::parse(&r.get::<String, _>("status"))?,
        gateway_payment_id: r.get("gateway_payment_id"),
        gateway_status: r.get("gateway_status"),
        description: r.get("description"),
        created_at_ms: r.get("created_at_ms"),
    })
}

fn notice_from(booking: &Booking, reason: Option<String>) -> BookingNotice {
    BookingNotice {
        booking_id: booking.booking_id,
        client_id: booking.client_id,
        instructor_id: booking.instructor_id,
        kind: booking.kind,
        starts_at_ms: booking.starts_at_ms,
        ends_at_ms: booking.ends_at_ms,
        participants: booking.participants,
        price_total: booking.price_total,
        reason,
    }
}

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{AnyPool, Row};
use uuid::Uuid;

use crate::booking::model::BookingKind;
use crate::capacity::repository_sqlx::{parse_opt_uuid, parse_uuid};
use crate::payout::model::{
    CompletedTraining, InstructorPayout, PayoutStatus, SettleOutcome, count_trainings,
    split_revenue,
};
use crate::payout::repository::PayoutRepository;

/// SQLx-backed implementation of PayoutRepository.
pub struct SqlxPayoutRepository {
    pool: AnyPool,
}

impl SqlxPayoutRepository {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

const OVERLAP_SELECT: &str = r#"
SELECT 1 AS hit
FROM instructor_payouts
WHERE instructor_id = ?
  AND status != 'cancelled'
  AND period_start_ms < ?
  AND period_end_ms > ?
LIMIT 1;
"#;

// The NOT EXISTS arm guards against a booking being counted twice even if
// two periods were created back to back with shared edges.
const ELIGIBLE_SELECT: &str = r#"
SELECT b.booking_id, b.kind, b.group_session_id, b.ends_at_ms, b.price_total
FROM bookings b
WHERE b.instructor_id = ?
  AND b.status = 'confirmed'
  AND b.ends_at_ms >= ?
  AND b.ends_at_ms < ?
  AND b.ends_at_ms <= ?
  AND NOT EXISTS (
    SELECT 1
    FROM instructor_payouts p
    WHERE p.instructor_id = b.instructor_id
      AND p.status != 'cancelled'
      AND p.period_start_ms <= b.ends_at_ms
      AND p.period_end_ms > b.ends_at_ms
  )
ORDER BY b.ends_at_ms;
"#;

const PAYOUT_INSERT: &str = r#"
INSERT INTO instructor_payouts (payout_id, instructor_id, period_start_ms, period_end_ms,
                                trainings_count, revenue_total, instructor_share, commission,
                                status, payment_method, paid_at_ms, comment)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?);
"#;

#[async_trait]
impl PayoutRepository for SqlxPayoutRepository {
    async fn settle(
        &self,
        instructor_id: &Uuid,
        period_start_ms: i64,
        period_end_ms: i64,
        now_ms: i64,
        commission_pct: i64,
    ) -> anyhow::Result<SettleOutcome> {
        let mut tx = self.pool.begin().await?;

        // Upsert takes the instructor's lock row until commit; a concurrent
        // settlement blocks here and then sees our committed payout.
        sqlx::query(
            r#"
INSERT INTO payout_locks (instructor_id) VALUES (?)
ON CONFLICT (instructor_id) DO UPDATE SET instructor_id = excluded.instructor_id;
"#,
        )
        .bind(instructor_id.to_string())
        .execute(&mut *tx)
        .await?;

        let overlap = sqlx::query(OVERLAP_SELECT)
            .bind(instructor_id.to_string())
            .bind(period_end_ms)
            .bind(period_start_ms)
            .fetch_optional(&mut *tx)
            .await?;

        if overlap.is_some() {
            return Ok(SettleOutcome::Overlap);
        }

        let rows = sqlx::query(ELIGIBLE_SELECT)
            .bind(instructor_id.to_string())
            .bind(period_start_ms)
            .bind(period_end_ms)
            .bind(now_ms)
            .fetch_all(&mut *tx)
            .await?;

        let trainings = rows
            .iter()
            .map(row_to_training)
            .collect::<anyhow::Result<Vec<_>>>()?;

        if trainings.is_empty() {
            return Ok(SettleOutcome::NoTrainings);
        }

        let revenue_total: i64 = trainings.iter().map(|t| t.price_total).sum();
        let (commission, instructor_share) = split_revenue(revenue_total, commission_pct);

        let payout = InstructorPayout {
            payout_id: Uuid::new_v4(),
            instructor_id: *instructor_id,
            period_start_ms,
            period_end_ms,
            trainings_count: count_trainings(&trainings),
            revenue_total,
            instructor_share,
            commission,
            status: PayoutStatus::Pending,
            payment_method: None,
            paid_at_ms: None,
            comment: None,
        };

        sqlx::query(PAYOUT_INSERT)
            .bind(payout.payout_id.to_string())
            .bind(payout.instructor_id.to_string())
            .bind(payout.period_start_ms)
            .bind(payout.period_end_ms)
            .bind(payout.trainings_count)
            .bind(payout.revenue_total)
            .bind(payout.instructor_share)
            .bind(payout.commission)
            .bind(payout.status.as_str())
            .bind(payout.payment_method.as_deref())
            .bind(payout.paid_at_ms)
            .bind(payout.comment.as_deref())
            .execute(&mut *tx)
            .await
            .context("insert payout")?;

        tx.commit().await?;
        Ok(SettleOutcome::Created(payout))
    }

    async fn overlapping_exists(
        &self,
        instructor_id: &Uuid,
        period_start_ms: i64,
        period_end_ms: i64,
    ) -> anyhow::Result<bool> {
        let row = sqlx::query(OVERLAP_SELECT)
            .bind(instructor_id.to_string())
            .bind(period_end_ms)
            .bind(period_start_ms)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    async fn eligible_bookings(
        &self,
        instructor_id: &Uuid,
        period_start_ms: i64,
        period_end_ms: i64,
        now_ms: i64,
    ) -> anyhow::Result<Vec<CompletedTraining>> {
        let rows = sqlx::query(ELIGIBLE_SELECT)
            .bind(instructor_id.to_string())
            .bind(period_start_ms)
            .bind(period_end_ms)
            .bind(now_ms)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_training).collect()
    }

    async fn insert(&self, payout: &InstructorPayout) -> anyhow::Result<()> {
        sqlx::query(PAYOUT_INSERT)
            .bind(payout.payout_id.to_string())
            .bind(payout.instructor_id.to_string())
            .bind(payout.period_start_ms)
            .bind(payout.period_end_ms)
            .bind(payout.trainings_count)
            .bind(payout.revenue_total)
            .bind(payout.instructor_share)
            .bind(payout.commission)
            .bind(payout.status.as_str())
            .bind(payout.payment_method.as_deref())
            .bind(payout.paid_at_ms)
            .bind(payout.comment.as_deref())
            .execute(&self.pool)
            .await
            .context("insert payout")?;

        Ok(())
    }

    async fn mark_paid(
        &self,
        payout_id: &Uuid,
        payment_method: &str,
        comment: Option<&str>,
        now_ms: i64,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
UPDATE instructor_payouts
SET status = 'paid', payment_method = ?, comment = ?, paid_at_ms = ?
WHERE payout_id = ? AND status = 'pending';
"#,
        )
        .bind(payment_method)
        .bind(comment)
        .bind(now_ms)
        .bind(payout_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn mark_cancelled(
        &self,
        payout_id: &Uuid,
        comment: Option<&str>,
    ) -> anyhow::Result<bool> {
        let res = sqlx::query(
            r#"
UPDATE instructor_payouts
SET status = 'cancelled', comment = ?
WHERE payout_id = ? AND status = 'pending';
"#,
        )
        .bind(comment)
        .bind(payout_id.to_string())
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected() > 0)
    }

    async fn fetch(&self, payout_id: &Uuid) -> anyhow::Result<Option<InstructorPayout>> {
        let row = sqlx::query(
            r#"
SELECT payout_id, instructor_id, period_start_ms, period_end_ms,
       trainings_count, revenue_total, instructor_share, commission,
       status, payment_method, paid_at_ms, comment
FROM instructor_payouts
WHERE payout_id = ?;
"#,
        )
        .bind(payout_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(row_to_payout(&r)?)),
            None => Ok(None),
        }
    }
}

fn row_to_training(r: &sqlx::any::AnyRow) -> anyhow::Result<CompletedTraining> {
    Ok(CompletedTraining {
        booking_id: parse_uuid(r.get("booking_id")).context("invalid booking_id")?,
        kind: BookingKind::parse(&r.get::<String, _>("kind"))?,
        group_session_id: parse_opt_uuid(r.get("group_session_id"))
            .context("invalid group_session_id")?,
        ends_at_ms: r.get("ends_at_ms"),
        price_total: r.get("price_total"),
    })
}

fn row_to_payout(r: &sqlx::any::AnyRow) -> anyhow::Result<InstructorPayout> {
    Ok(InstructorPayout {
        payout_id: parse_uuid(r.get("payout_id")).context("invalid payout_id")?,
        instructor_id: parse_uuid(r.get("instructor_id")).context("invalid instructor_id")?,
        period_start_ms: r.get("period_start_ms"),
        period_end_ms: r.get("period_end_ms"),
        trainings_count: r.get("trainings_count"),
        revenue_total: r.get("revenue_total"),
        instructor_share: r.get("instructor_share"),
        commission: r.get("commission"),
        status: PayoutStatus::parse(&r.get::<String, _>("status"))?,
        payment_method: r.get("payment_method"),
        paid_at_ms: r.get("paid_at_ms"),
        comment: r.get("comment"),
    })
}

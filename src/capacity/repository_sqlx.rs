use anyhow::Context;
use async_trait::async_trait;
use sqlx::{AnyPool, Row};
use uuid::Uuid;

use crate::capacity::model::{GroupSession, GroupSessionStatus, Slot, SlotStatus};
use crate::capacity::repository::CapacityRepository;

/// SQLx-backed implementation of CapacityRepository.
/// Responsible only for persistence and row mapping.
pub struct SqlxCapacityRepository {
    pool: AnyPool,
}

impl SqlxCapacityRepository {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CapacityRepository for SqlxCapacityRepository {
    async fn fetch_slot(&self, slot_id: &Uuid) -> anyhow::Result<Option<Slot>> {
        let row = sqlx::query(
            r#"
SELECT slot_id, instructor_id, starts_at_ms, ends_at_ms, status, hold_expires_at_ms, holding_txn_id
FROM slots
WHERE slot_id = ?;
"#,
        )
        .bind(slot_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(row_to_slot(&r)?)),
            None => Ok(None),
        }
    }

    async fn fetch_group_session(&self, session_id: &Uuid) -> anyhow::Result<Option<GroupSession>> {
        let row = sqlx::query(
            r#"
SELECT session_id, instructor_id, starts_at_ms, ends_at_ms,
       min_participants, max_participants, current_participants,
       price_per_participant, status
FROM group_sessions
WHERE session_id = ?;
"#,
        )
        .bind(session_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(r) => Ok(Some(row_to_group_session(&r)?)),
            None => Ok(None),
        }
    }

    async fn insert_slot(&self, slot: &Slot) -> anyhow::Result<()> {
        sqlx::query(
            r#"
INSERT INTO slots (slot_id, instructor_id, starts_at_ms, ends_at_ms, status, hold_expires_at_ms, holding_txn_id)
VALUES (?, ?, ?, ?, ?, ?, ?);
"#,
        )
        .bind(slot.slot_id.to_string())
        .bind(slot.instructor_id.to_string())
        .bind(slot.starts_at_ms)
        .bind(slot.ends_at_ms)
        .bind(slot.status.as_str())
        .bind(slot.hold_expires_at_ms)
        .bind(slot.holding_txn_id.map(|id| id.to_string()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn insert_group_session(&self, session: &GroupSession) -> anyhow::Result<()> {
        sqlx::query(
            r#"
INSERT INTO group_sessions (session_id, instructor_id, starts_at_ms, ends_at_ms,
                            min_participants, max_participants, current_participants,
                            price_per_participant, status)
VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?);
"#,
        )
        .bind(session.session_id.to_string())
        .bind(session.instructor_id.map(|id| id.to_string()))
        .bind(session.starts_at_ms)
        .bind(session.ends_at_ms)
        .bind(session.min_participants)
        .bind(session.max_participants)
        .bind(session.current_participants)
        .bind(session.price_per_participant)
        .bind(session.status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/* =========================
Row mapping + conversions
========================= */

pub(crate) fn row_to_slot(r: &sqlx::any::AnyRow) -> anyhow::Result<Slot> {
    Ok(Slot {
        slot_id: parse_uuid(r.get("slot_id")).context("invalid slot_id")?,
        instructor_id: parse_uuid(r.get("instructor_id")).context("invalid instructor_id")?,
        starts_at_ms: r.get("starts_at_ms"),
        ends_at_ms: r.get("ends_at_ms"),
        status: SlotStatus::parse(&r.get::<String, _>("status"))?,
        hold_expires_at_ms: r.get("hold_expires_at_ms"),
        holding_txn_id: parse_opt_uuid(r.get("holding_txn_id")).context("invalid holding_txn_id")?,
    })
}

pub(crate) fn row_to_group_session(r: &sqlx::any::AnyRow) -> anyhow::Result<GroupSession> {
    Ok(GroupSession {
        session_id: parse_uuid(r.get("session_id")).context("invalid session_id")?,
        instructor_id: parse_opt_uuid(r.get("instructor_id")).context("invalid instructor_id")?,
        starts_at_ms: r.get("starts_at_ms"),
        ends_at_ms: r.get("ends_at_ms"),
        min_participants: r.get("min_participants"),
        max_participants: r.get("max_participants"),
        current_participants: r.get("current_participants"),
        price_per_participant: r.get("price_per_participant"),
        status: GroupSessionStatus::parse(&r.get::<String, _>("status"))?,
    })
}

pub(crate) fn parse_uuid(v: String) -> anyhow::Result<Uuid> {
    Uuid::parse_str(&v).map_err(|e| anyhow::anyhow!("malformed uuid {v:?}: {e}"))
}

pub(crate) fn parse_opt_uuid(v: Option<String>) -> anyhow::Result<Option<Uuid>> {
    match v {
        Some(s) => Ok(Some(parse_uuid(s)?)),
        None => Ok(None),
    }
}

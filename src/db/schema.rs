use sqlx::AnyPool;

pub async fn migrate(pool: &AnyPool) -> anyhow::Result<()> {
    // Slots: one instructor-owned bookable time window.
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS slots (
  slot_id TEXT PRIMARY KEY,
  instructor_id TEXT NOT NULL,
  starts_at_ms BIGINT NOT NULL,
  ends_at_ms BIGINT NOT NULL,
  status TEXT NOT NULL,
  hold_expires_at_ms BIGINT,
  holding_txn_id TEXT
);
"#,
    )
    .execute(pool)
    .await?;

    // Group sessions: seat counter mutated only by guarded updates.
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS group_sessions (
  session_id TEXT PRIMARY KEY,
  instructor_id TEXT,
  starts_at_ms BIGINT NOT NULL,
  ends_at_ms BIGINT NOT NULL,
  min_participants BIGINT NOT NULL,
  max_participants BIGINT NOT NULL,
  current_participants BIGINT NOT NULL DEFAULT 0
    CHECK (current_participants >= 0 AND current_participants <= max_participants),
  price_per_participant BIGINT NOT NULL,
  status TEXT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    // Bookings: date/time and instructor are snapshots taken at claim time.
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS bookings (
  booking_id TEXT PRIMARY KEY,
  client_id TEXT NOT NULL,
  kind TEXT NOT NULL,
  slot_id TEXT,
  group_session_id TEXT,
  instructor_id TEXT,
  starts_at_ms BIGINT NOT NULL,
  ends_at_ms BIGINT NOT NULL,
  participants BIGINT NOT NULL,
  participant_names TEXT NOT NULL,
  price_total BIGINT NOT NULL,
  price_per_participant BIGINT NOT NULL,
  status TEXT NOT NULL,
  cancellation_reason TEXT,
  cancelled_at_ms BIGINT,
  created_at_ms BIGINT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    // Payment transactions: 1:1 with bookings.
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS payment_transactions (
  txn_id TEXT PRIMARY KEY,
  booking_id TEXT NOT NULL UNIQUE,
  client_id TEXT NOT NULL,
  amount BIGINT NOT NULL,
  status TEXT NOT NULL,
  gateway_payment_id TEXT,
  gateway_status TEXT,
  description TEXT NOT NULL,
  created_at_ms BIGINT NOT NULL
);
"#,
    )
    .execute(pool)
    .await?;

    // Per-instructor settlement mutex rows: a settlement transaction takes
    // the row lock via upsert and holds it until commit.
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS payout_locks (
  instructor_id TEXT PRIMARY KEY
);
"#,
    )
    .execute(pool)
    .await?;

    // Payouts: one row per (instructor, exact period).
    sqlx::query(
        r#"
CREATE TABLE IF NOT EXISTS instructor_payouts (
  payout_id TEXT PRIMARY KEY,
  instructor_id TEXT NOT NULL,
  period_start_ms BIGINT NOT NULL,
  period_end_ms BIGINT NOT NULL,
  trainings_count BIGINT NOT NULL,
  revenue_total BIGINT NOT NULL,
  instructor_share BIGINT NOT NULL,
  commission BIGINT NOT NULL,
  status TEXT NOT NULL,
  payment_method TEXT,
  paid_at_ms BIGINT,
  comment TEXT,
  UNIQUE (instructor_id, period_start_ms, period_end_ms)
);
"#,
    )
    .execute(pool)
    .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_slots_instructor ON slots(instructor_id);"#)
        .execute(pool)
        .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_bookings_instructor ON bookings(instructor_id);"#)
        .execute(pool)
        .await?;

    sqlx::query(r#"CREATE INDEX IF NOT EXISTS idx_bookings_status ON bookings(status);"#)
        .execute(pool)
        .await?;

    Ok(())
}

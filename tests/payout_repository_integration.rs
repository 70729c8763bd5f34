use std::sync::Arc;

use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use uuid::Uuid;

use ridgeline::db::schema;
use ridgeline::error::BookingError;
use ridgeline::notify::{LogNotifier, NotificationDispatcher};
use ridgeline::payout::aggregator::PayoutAggregator;
use ridgeline::payout::model::{InstructorPayout, PayoutStatus};
use ridgeline::payout::repository::PayoutRepository;
use ridgeline::payout::repository_sqlx::SqlxPayoutRepository;
use ridgeline::time::now_ms;

async fn setup_db() -> AnyPool {
    sqlx::any::install_default_drivers();

    let db_name = Uuid::new_v4().to_string();
    let conn_str = format!("sqlite:file:{}?mode=memory&cache=shared", db_name);

    let pool = AnyPoolOptions::new()
        .max_connections(5)
        .connect(&conn_str)
        .await
        .unwrap();

    schema::migrate(&pool).await.unwrap();
    pool
}

/// Seeds a booking row directly; payout aggregation only reads bookings.
async fn insert_booking(
    pool: &AnyPool,
    instructor_id: &Uuid,
    status: &str,
    ends_at_ms: i64,
    price_total: i64,
    group_session_id: Option<Uuid>,
) {
    let kind = if group_session_id.is_some() {
        "group"
    } else {
        "individual"
    };

    sqlx::query(
        r#"
INSERT INTO bookings (booking_id, client_id, kind, slot_id, group_session_id, instructor_id,
                      starts_at_ms, ends_at_ms, participants, participant_names,
                      price_total, price_per_participant, status,
                      cancellation_reason, cancelled_at_ms, created_at_ms)
VALUES (?, ?, ?, NULL, ?, ?, ?, ?, 1, '[]', ?, ?, ?, NULL, NULL, 0);
"#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(Uuid::new_v4().to_string())
    .bind(kind)
    .bind(group_session_id.map(|id| id.to_string()))
    .bind(instructor_id.to_string())
    .bind(ends_at_ms - 3_600_000)
    .bind(ends_at_ms)
    .bind(price_total)
    .bind(price_total)
    .bind(status)
    .execute(pool)
    .await
    .unwrap();
}

fn pending_payout(instructor_id: &Uuid, start: i64, end: i64) -> InstructorPayout {
    InstructorPayout {
        payout_id: Uuid::new_v4(),
        instructor_id: *instructor_id,
        period_start_ms: start,
        period_end_ms: end,
        trainings_count: 1,
        revenue_total: 10_000,
        instructor_share: 8_000,
        commission: 2_000,
        status: PayoutStatus::Pending,
        payment_method: None,
        paid_at_ms: None,
        comment: None,
    }
}

#[tokio::test]
async fn eligibility_filters_status_period_and_completion() {
    let pool = setup_db().await;
    let repo = SqlxPayoutRepository::new(pool.clone());
    let instructor = Uuid::new_v4();
    let now = now_ms();
    let period_end = now + 172_800_000;

    // Counted: confirmed, finished inside the period.
    insert_booking(&pool, &instructor, "confirmed", 5_000, 8_000, None).await;
    // Excluded: still pending.
    insert_booking(&pool, &instructor, "pending", 5_000, 8_000, None).await;
    // Excluded: cancelled.
    insert_booking(&pool, &instructor, "cancelled", 5_000, 8_000, None).await;
    // Excluded: ends after the period.
    insert_booking(&pool, &instructor, "confirmed", period_end + 1, 8_000, None).await;
    // Excluded: inside the period but not finished yet.
    insert_booking(&pool, &instructor, "confirmed", now + 86_400_000, 8_000, None).await;
    // Excluded: different instructor.
    insert_booking(&pool, &Uuid::new_v4(), "confirmed", 5_000, 8_000, None).await;

    let eligible = repo
        .eligible_bookings(&instructor, 0, period_end, now)
        .await
        .unwrap();

    assert_eq!(eligible.len(), 1);
    assert_eq!(eligible[0].price_total, 8_000);
}

#[tokio::test]
async fn bookings_covered_by_a_prior_payout_are_excluded() {
    let pool = setup_db().await;
    let repo = SqlxPayoutRepository::new(pool.clone());
    let instructor = Uuid::new_v4();

    insert_booking(&pool, &instructor, "confirmed", 5_000, 8_000, None).await;
    repo.insert(&pending_payout(&instructor, 0, 10_000))
        .await
        .unwrap();

    let eligible = repo
        .eligible_bookings(&instructor, 0, 10_000, now_ms())
        .await
        .unwrap();
    assert!(eligible.is_empty());
}

#[tokio::test]
async fn overlap_detection_ignores_cancelled_payouts() {
    let pool = setup_db().await;
    let repo = SqlxPayoutRepository::new(pool.clone());
    let instructor = Uuid::new_v4();

    let payout = pending_payout(&instructor, 0, 10_000);
    repo.insert(&payout).await.unwrap();

    // Partial overlap on either edge is still an overlap.
    assert!(repo
        .overlapping_exists(&instructor, 9_000, 20_000)
        .await
        .unwrap());
    assert!(repo
        .overlapping_exists(&instructor, -5_000, 1_000)
        .await
        .unwrap());
    // Disjoint period is fine.
    assert!(!repo
        .overlapping_exists(&instructor, 10_000, 20_000)
        .await
        .unwrap());
    // Another instructor is never affected.
    assert!(!repo
        .overlapping_exists(&Uuid::new_v4(), 0, 10_000)
        .await
        .unwrap());

    // A cancelled payout frees its period again.
    repo.mark_cancelled(&payout.payout_id, Some("created in error"))
        .await
        .unwrap();
    assert!(!repo
        .overlapping_exists(&instructor, 0, 10_000)
        .await
        .unwrap());
}

#[tokio::test]
async fn mark_paid_transitions_only_from_pending() {
    let pool = setup_db().await;
    let repo = SqlxPayoutRepository::new(pool.clone());
    let instructor = Uuid::new_v4();

    let payout = pending_payout(&instructor, 0, 10_000);
    repo.insert(&payout).await.unwrap();

    assert!(repo
        .mark_paid(&payout.payout_id, "bank_transfer", Some("July"), 123)
        .await
        .unwrap());
    // Already paid; the guard refuses a second transition.
    assert!(!repo
        .mark_paid(&payout.payout_id, "cash", None, 456)
        .await
        .unwrap());

    let stored = repo.fetch(&payout.payout_id).await.unwrap().unwrap();
    assert_eq!(stored.status, PayoutStatus::Paid);
    assert_eq!(stored.payment_method.as_deref(), Some("bank_transfer"));
    assert_eq!(stored.paid_at_ms, Some(123));
    assert_eq!(stored.comment.as_deref(), Some("July"));
}

#[tokio::test]
async fn overlapping_periods_settle_exactly_once_under_contention() {
    let pool = setup_db().await;
    let repo = Arc::new(SqlxPayoutRepository::new(pool.clone()));
    let instructor = Uuid::new_v4();

    // One booking ending inside the intersection of both periods.
    insert_booking(&pool, &instructor, "confirmed", 6_000, 8_000, None).await;

    let notifier = NotificationDispatcher::new(Arc::new(LogNotifier));
    let a = PayoutAggregator::new(repo.clone(), notifier.clone(), 20);
    let b = PayoutAggregator::new(repo.clone(), notifier, 20);
    let instructor_a = instructor;
    let instructor_b = instructor;

    let (first, second) = tokio::join!(
        async move { a.create(&instructor_a, 0, 10_000).await },
        async move { b.create(&instructor_b, 5_000, 15_000).await }
    );

    let mut created = vec![];
    for res in [first, second] {
        match res {
            Ok(payout) => created.push(payout),
            Err(BookingError::PayoutExists { .. }) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    // The booking is settled by exactly one of the overlapping periods.
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].revenue_total, 8_000);
    assert_eq!(created[0].trainings_count, 1);
}

#[tokio::test]
async fn aggregator_settles_a_period_exactly_once() {
    let pool = setup_db().await;
    let repo = Arc::new(SqlxPayoutRepository::new(pool.clone()));
    let aggregator = PayoutAggregator::new(
        repo.clone(),
        NotificationDispatcher::new(Arc::new(LogNotifier)),
        20,
    );
    let instructor = Uuid::new_v4();

    let session = Uuid::new_v4();
    insert_booking(&pool, &instructor, "confirmed", 5_000, 8_000, None).await;
    insert_booking(&pool, &instructor, "confirmed", 6_000, 2_500, Some(session)).await;
    insert_booking(&pool, &instructor, "confirmed", 6_000, 2_500, Some(session)).await;

    let payout = aggregator.create(&instructor, 0, 10_000).await.unwrap();

    // One individual training plus one group session; every seat pays.
    assert_eq!(payout.trainings_count, 2);
    assert_eq!(payout.revenue_total, 13_000);
    assert_eq!(payout.commission, 2_600);
    assert_eq!(payout.instructor_share, 10_400);
    assert_eq!(payout.status, PayoutStatus::Pending);

    // The same period can never be settled twice.
    let err = aggregator.create(&instructor, 0, 10_000).await.unwrap_err();
    assert!(matches!(err, BookingError::PayoutExists { .. }));

    let stored = repo.fetch(&payout.payout_id).await.unwrap().unwrap();
    assert_eq!(stored.revenue_total, 13_000);
}

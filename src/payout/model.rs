use uuid::Uuid;

use crate::booking::model::BookingKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PayoutStatus {
    Pending,
    Paid,
    Cancelled,
}

impl PayoutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayoutStatus::Pending => "pending",
            PayoutStatus::Paid => "paid",
            PayoutStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "pending" => Ok(PayoutStatus::Pending),
            "paid" => Ok(PayoutStatus::Paid),
            "cancelled" => Ok(PayoutStatus::Cancelled),
            other => Err(anyhow::anyhow!("unknown payout status: {other}")),
        }
    }
}

/// Settlement record for one instructor over one exact period.
///
/// The split is frozen at creation time; later changes to the commission
/// percentage never rewrite an existing payout.
#[derive(Clone, Debug)]
pub struct InstructorPayout {
    pub payout_id: Uuid,
    pub instructor_id: Uuid,
    pub period_start_ms: i64,
    pub period_end_ms: i64,
    pub trainings_count: i64,
    pub revenue_total: i64,
    pub instructor_share: i64,
    pub commission: i64,
    pub status: PayoutStatus,
    pub payment_method: Option<String>,
    pub paid_at_ms: Option<i64>,
    pub comment: Option<String>,
}

/// One confirmed, finished booking as seen by the payout aggregation.
#[derive(Clone, Debug)]
pub struct CompletedTraining {
    pub booking_id: Uuid,
    pub kind: BookingKind,
    pub group_session_id: Option<Uuid>,
    pub ends_at_ms: i64,
    pub price_total: i64,
}

/// Result of a settlement atomic unit.
#[derive(Clone, Debug)]
pub enum SettleOutcome {
    Created(InstructorPayout),
    /// A non-cancelled payout already covers part of the period.
    Overlap,
    /// The period holds no completed trainings.
    NoTrainings,
}

/// Floors the commission; the instructor keeps the rounding remainder.
pub(crate) fn split_revenue(revenue_total: i64, commission_pct: i64) -> (i64, i64) {
    let commission = revenue_total * commission_pct / 100;
    (commission, revenue_total - commission)
}

/// Individual bookings count one each; a group session counts once no
/// matter how many bookings it carried.
pub(crate) fn count_trainings(trainings: &[CompletedTraining]) -> i64 {
    let mut sessions: std::collections::HashSet<Uuid> = std::collections::HashSet::new();
    let mut individual = 0i64;

    for t in trainings {
        match t.group_session_id {
            Some(session_id) => {
                sessions.insert(session_id);
            }
            None => individual += 1,
        }
    }

    individual + sessions.len() as i64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn training(group_session_id: Option<Uuid>, price: i64) -> CompletedTraining {
        CompletedTraining {
            booking_id: Uuid::new_v4(),
            kind: if group_session_id.is_some() {
                BookingKind::Group
            } else {
                BookingKind::Individual
            },
            group_session_id,
            ends_at_ms: 1_000,
            price_total: price,
        }
    }

    #[test]
    fn group_sessions_count_once() {
        let session = Uuid::new_v4();
        let trainings = vec![
            training(Some(session), 2_000),
            training(Some(session), 2_000),
            training(None, 8_000),
        ];
        assert_eq!(count_trainings(&trainings), 2);
    }

    #[test]
    fn commission_floors_toward_the_instructor() {
        let (commission, share) = split_revenue(15_075, 20);
        assert_eq!(commission, 3_015);
        assert_eq!(share, 12_060);
    }

    proptest! {
        #[test]
        fn split_is_exact_and_commission_never_exceeds_pct(
            revenue in 0i64..=1_000_000_000,
            pct in 0i64..=100,
        ) {
            let (commission, share) = split_revenue(revenue, pct);
            prop_assert_eq!(commission + share, revenue);
            prop_assert!(commission >= 0);
            prop_assert!(share >= 0);
            prop_assert!(commission * 100 <= revenue * pct);
        }
    }
}

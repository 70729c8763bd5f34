#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Database connection string.
    pub database_url: String,

    // =========================
    // Payment gateway
    // =========================
    /// Base URL of the external payment gateway's HTTP API.
    pub gateway_base_url: String,

    /// Shared secret used to sign/verify gateway callback payloads.
    ///
    /// The gateway computes the same digest over the callback fields;
    /// a mismatch means the payload must be ignored without state change.
    pub gateway_secret: String,

    /// URL the gateway redirects the client back to after payment.
    pub payment_return_url: String,

    // =========================
    // Booking policy
    // =========================
    /// Platform commission retained from instructor revenue, in percent.
    ///
    /// Used by the payout aggregator:
    /// commission = revenue * pct / 100, instructor share is the remainder.
    pub admin_commission_pct: i64,

    /// How long a claimed slot stays `held` waiting for payment before the
    /// reaper may release it (milliseconds).
    ///
    /// Purpose:
    /// - abandoned checkouts must not occupy a slot forever
    /// - the window must comfortably cover a normal gateway round-trip
    pub slot_hold_ttl_ms: i64,

    /// Interval between hold-reaper passes (milliseconds).
    pub hold_reap_interval_ms: u64,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://ridgeline_dev.db".to_string());

        let gateway_base_url = std::env::var("GATEWAY_BASE_URL")
            .unwrap_or_else(|_| "https://gateway.example.test".to_string());

        let gateway_secret =
            std::env::var("GATEWAY_SECRET").unwrap_or_else(|_| "dev-secret".to_string());

        let payment_return_url = std::env::var("PAYMENT_RETURN_URL")
            .unwrap_or_else(|_| "https://booking.example.test/payment/done".to_string());

        Self {
            database_url,
            gateway_base_url,
            gateway_secret,
            payment_return_url,

            // Policy defaults:
            // - 20% platform commission
            // - 15 minutes to complete payment before a held slot is reaped
            admin_commission_pct: 20,
            slot_hold_ttl_ms: 15 * 60 * 1000,
            hold_reap_interval_ms: 60_000,
        }
    }
}

pub mod http;
pub mod signature;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("gateway rejected initiation: {0}")]
    Rejected(String),

    #[error("invalid response from payment gateway")]
    InvalidResponse,
}

/// Payment initiation input. Built from identifiers that are already
/// committed; the remote call itself never runs inside a transaction.
#[derive(Clone, Debug)]
pub struct InitiatePayment {
    pub booking_id: Uuid,
    pub txn_id: Uuid,
    /// Integer cents.
    pub amount: i64,
    pub description: String,
    pub return_url: String,
}

#[derive(Clone, Debug)]
pub struct PaymentInitiation {
    pub payment_id: String,
    pub redirect_url: String,
}

/// Abstraction over the external payment gateway.
///
/// This trait intentionally hides transport, authentication and the
/// gateway's error formats. Implementations must normalize rejections into
/// `GatewayError::Rejected` with a stable message.
#[async_trait]
pub trait PaymentGateway: Send + Sync + 'static {
    async fn initiate(&self, req: &InitiatePayment) -> Result<PaymentInitiation, GatewayError>;

    async fn request_refund(
        &self,
        gateway_payment_id: &str,
        amount: i64,
    ) -> Result<(), GatewayError>;
}

/// Webhook payload delivered by the gateway after a payment reaches a new
/// status. Arrives out of order relative to the original request and may be
/// re-delivered any number of times.
#[derive(Clone, Debug, Deserialize)]
pub struct PaymentCallback {
    pub order_ref: String,
    pub payment_id: String,
    pub status: String,
    pub signature: String,
}

/// Opaque order reference handed to the gateway at initiation; encodes the
/// booking id so callbacks can be routed back.
pub fn order_ref(booking_id: &Uuid) -> String {
    format!("bk-{booking_id}")
}

pub fn parse_order_ref(s: &str) -> Option<Uuid> {
    s.strip_prefix("bk-").and_then(|t| Uuid::parse_str(t).ok())
}

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::gateway::{
    GatewayError, InitiatePayment, PaymentGateway, PaymentInitiation, order_ref,
};

#[derive(Clone)]
pub struct HttpPaymentGateway {
    http: Client,
    base_url: String,
}

impl HttpPaymentGateway {
    pub fn new(base_url: String) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(5))
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self { http, base_url })
    }
}

#[derive(Serialize)]
struct InitiateBody<'a> {
    order_ref: String,
    amount: i64,
    description: &'a str,
    return_url: &'a str,
}

#[derive(Deserialize)]
struct InitiateEnvelope {
    payment: InitiatedPayment,
}

#[derive(Deserialize)]
struct InitiatedPayment {
    id: String,
    redirect_url: String,
    status: String,
}

#[derive(Serialize)]
struct RefundBody {
    amount: i64,
}

#[async_trait::async_trait]
impl PaymentGateway for HttpPaymentGateway {
    #[instrument(
        skip(self, req),
        fields(booking_id = %req.booking_id, amount = req.amount),
        level = "debug"
    )]
    async fn initiate(&self, req: &InitiatePayment) -> Result<PaymentInitiation, GatewayError> {
        let url = format!("{}/payments", self.base_url);

        let resp = self
            .http
            .post(&url)
            .json(&InitiateBody {
                order_ref: order_ref(&req.booking_id),
                amount: req.amount,
                description: &req.description,
                return_url: &req.return_url,
            })
            .send()
            .await?
            .error_for_status()?;

        let envelope: InitiateEnvelope = resp.json().await?;

        if envelope.payment.status == "rejected" {
            return Err(GatewayError::Rejected(envelope.payment.status));
        }
        if envelope.payment.redirect_url.is_empty() {
            return Err(GatewayError::InvalidResponse);
        }

        debug!(payment_id = %envelope.payment.id, "payment initiated");

        Ok(PaymentInitiation {
            payment_id: envelope.payment.id,
            redirect_url: envelope.payment.redirect_url,
        })
    }

    #[instrument(skip(self), level = "debug")]
    async fn request_refund(
        &self,
        gateway_payment_id: &str,
        amount: i64,
    ) -> Result<(), GatewayError> {
        let url = format!("{}/payments/{}/refunds", self.base_url, gateway_payment_id);

        self.http
            .post(&url)
            .json(&RefundBody { amount })
            .send()
            .await?
            .error_for_status()?;

        debug!(gateway_payment_id, amount, "refund requested");
        Ok(())
    }
}

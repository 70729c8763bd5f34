//! Deterministic callback signing.
//!
//! The gateway and the engine share a secret; both sides compute
//! sha256(order_ref:payment_id:status:secret) over the callback fields.
//! A mismatch means the payload is ignored without any state change.

use sha2::{Digest, Sha256};

use crate::gateway::PaymentCallback;

pub fn callback_signature(secret: &str, order_ref: &str, payment_id: &str, status: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(order_ref.as_bytes());
    hasher.update(b":");
    hasher.update(payment_id.as_bytes());
    hasher.update(b":");
    hasher.update(status.as_bytes());
    hasher.update(b":");
    hasher.update(secret.as_bytes());

    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{b:02x}"));
    }
    out
}

pub fn verify(secret: &str, cb: &PaymentCallback) -> bool {
    let expected = callback_signature(secret, &cb.order_ref, &cb.payment_id, &cb.status);
    // Case-insensitive on the hex, nothing else.
    expected.eq_ignore_ascii_case(&cb.signature)
}

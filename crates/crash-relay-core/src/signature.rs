//! Sentry webhook signature verification.
//!
//! Sentry signs the raw request body with the integration's client secret
//! (HMAC-SHA256) and sends the lowercase hex digest in the
//! `sentry-hook-signature` header.
//!
//! # Security
//!
//! - The digest comparison runs in constant time
//! - Neither the secret nor any digest is ever logged
//! - An empty secret disables verification entirely. This exists for local
//!   testing with hand-written requests and must not be used in production.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded HMAC-SHA256 digest of the body
pub const SIGNATURE_HEADER: &str = "sentry-hook-signature";

/// Why a signature was not accepted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// A secret is configured but the request carried no signature
    MissingHeader,

    /// The signature does not match the body
    Mismatch,
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHeader => write!(f, "missing {} header", SIGNATURE_HEADER),
            Self::Mismatch => write!(f, "signature mismatch"),
        }
    }
}

/// Outcome of verifying one inbound request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationResult {
    /// The signature matches the body
    Verified,

    /// No secret is configured, so the request was let through unchecked
    Bypassed,

    /// The request must be rejected
    Rejected(RejectionReason),
}

impl VerificationResult {
    /// Whether the request may proceed
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

/// Verify a Sentry webhook signature.
///
/// # Arguments
///
/// * `secret` - The shared client secret (empty disables verification)
/// * `signature` - Value of the `sentry-hook-signature` header, if any
/// * `body` - The exact raw request body
pub fn verify_signature(secret: &[u8], signature: Option<&str>, body: &[u8]) -> VerificationResult {
    if secret.is_empty() {
        warn!("Sentry client secret not set; skipping signature verification");
        return VerificationResult::Bypassed;
    }

    let received = match signature.map(str::trim) {
        Some(sig) if !sig.is_empty() => sig,
        _ => {
            warn!(reason = %RejectionReason::MissingHeader, "Rejecting webhook");
            return VerificationResult::Rejected(RejectionReason::MissingHeader);
        }
    };

    let expected = compute_signature(secret, body);

    // Length is not secret: every valid digest is 64 hex characters.
    if bool::from(expected.as_bytes().ct_eq(received.as_bytes())) {
        VerificationResult::Verified
    } else {
        warn!(reason = %RejectionReason::Mismatch, "Rejecting webhook");
        VerificationResult::Rejected(RejectionReason::Mismatch)
    }
}

/// Compute the lowercase hex HMAC-SHA256 digest Sentry would send for `body`.
pub fn compute_signature(secret: &[u8], body: &[u8]) -> String {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret)
        .unwrap_or_else(|_| unreachable!("HMAC-SHA256 accepts keys of any length"));
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
#[path = "signature_tests.rs"]
mod tests;

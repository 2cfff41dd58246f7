//! Webhook signature verification

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header GitHub puts the HMAC-SHA256 signature in
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature-256";

pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Compute the `sha256=<hex digest>` signature of `body`
pub fn sign(secret: &[u8], body: &[u8]) -> Option<String> {
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(m) => m,
        Err(_) => return None,
    };

    mac.update(body);
    Some(format!(
        "{}{}",
        SIGNATURE_PREFIX,
        hex::encode(mac.finalize().into_bytes())
    ))
}

/// Verify the webhook signature from GitHub
///
/// `secret` is the shared webhook secret; `None` or empty disables verification
/// `body` is the raw request body, exactly as received
/// `signature` is the value of the `X-Hub-Signature-256` header
pub fn verify_signature(secret: Option<&[u8]>, body: &[u8], signature: &str) -> bool {
    let secret = match secret {
        Some(s) if !s.is_empty() => s,
        _ => return true,
    };

    // Signature format: "sha256=<hex digest>"
    let presented = match signature.strip_prefix(SIGNATURE_PREFIX) {
        Some(s) => s,
        None => return false,
    };

    let expected = match sign(secret, body) {
        Some(s) => s,
        None => return false,
    };
    let expected = &expected[SIGNATURE_PREFIX.len()..];

    expected.as_bytes().ct_eq(presented.as_bytes()).into()
}

//! Payment confirmation signature.
//!
//! The processor's client flow hands back `(order_id, payment_id,
//! signature)` where the signature is `HMAC-SHA256(secret,
//! "<order_id>|<payment_id>")`, hex-encoded. Recomputing it with the
//! shared secret proves the confirmation came out of the processor's
//! flow and that neither identifier was tampered with.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded `HMAC-SHA256(secret, order_id|payment_id)`.
pub fn compute_signature(secret: &str, order_id: &str, payment_id: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a supplied signature against the recomputed one.
/// Comparison is constant-time.
pub fn verify_signature(
    secret: &str,
    order_id: &str,
    payment_id: &str,
    supplied: &str,
) -> bool {
    let expected = compute_signature(secret, order_id, payment_id);
    expected.as_bytes().ct_eq(supplied.as_bytes()).unwrap_u8() == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_deterministic_hex() {
        let sig = compute_signature("secret", "order_1", "pay_1");
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(sig, compute_signature("secret", "order_1", "pay_1"));
    }

    #[test]
    fn signature_depends_on_every_input() {
        let base = compute_signature("secret", "order_1", "pay_1");
        assert_ne!(base, compute_signature("other", "order_1", "pay_1"));
        assert_ne!(base, compute_signature("secret", "order_2", "pay_1"));
        assert_ne!(base, compute_signature("secret", "order_1", "pay_2"));
    }

    #[test]
    fn delimiter_prevents_identifier_splicing() {
        // ("ab", "c") and ("a", "bc") must not collide
        assert_ne!(
            compute_signature("secret", "ab", "c"),
            compute_signature("secret", "a", "bc")
        );
    }

    #[test]
    fn verify_accepts_genuine_signature() {
        let sig = compute_signature("secret", "order_1", "pay_1");
        assert!(verify_signature("secret", "order_1", "pay_1", &sig));
    }

    #[test]
    fn verify_rejects_tampered_signature() {
        let mut sig = compute_signature("secret", "order_1", "pay_1");
        // Flip the last hex digit
        let last = sig.pop().unwrap();
        sig.push(if last == '0' { '1' } else { '0' });
        assert!(!verify_signature("secret", "order_1", "pay_1", &sig));
    }

    #[test]
    fn verify_rejects_wrong_length_input() {
        assert!(!verify_signature("secret", "order_1", "pay_1", "deadbeef"));
        assert!(!verify_signature("secret", "order_1", "pay_1", ""));
    }
}

//! Canonical request signing.
//!
//! One signing contract serves the whole platform — SDK, gateway, and tests
//! all call into these two functions, so the scheme cannot drift between
//! sides:
//!
//! ```text
//! sign = lowercase_hex( SHA-256( accessKey "\n" secretKey "\n" nonce "\n" timestamp ) )
//! ```
//!
//! `nonce` and `timestamp` enter the hash as the raw header strings the
//! caller sent, not as parsed integers, so a request signs exactly the bytes
//! it transmits.  The newline separator keeps field boundaries unambiguous
//! (`"ab" + "c"` and `"a" + "bc"` hash differently).

use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Compute the canonical signature over the four signed fields.
pub fn compute_signature(
    access_key: &str,
    secret_key: &str,
    nonce: &str,
    timestamp: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(access_key.as_bytes());
    hasher.update(b"\n");
    hasher.update(secret_key.as_bytes());
    hasher.update(b"\n");
    hasher.update(nonce.as_bytes());
    hasher.update(b"\n");
    hasher.update(timestamp.as_bytes());
    hex::encode(hasher.finalize())
}

/// Recompute the signature and compare it against `supplied` in constant
/// time.
pub fn verify_signature(
    supplied: &str,
    access_key: &str,
    secret_key: &str,
    nonce: &str,
    timestamp: &str,
) -> bool {
    let expected = compute_signature(access_key, secret_key, nonce, timestamp);
    expected.as_bytes().ct_eq(supplied.as_bytes()).into()
}

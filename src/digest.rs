//! Password digest computation
//!
//! Pure SHA-512 hashing rendered as standard (non-URL-safe) base64.
//! The artificial response delay lives in `delay`, not here.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha512};

/// Compute the SHA-512 digest of a password's UTF-8 bytes and encode it
/// with the standard base64 alphabet. Deterministic, no I/O.
///
/// Callers that compare against URL-safe encodings must map `+` to `-`
/// and `/` to `_` on their side; this service always emits the standard
/// alphabet.
pub fn digest_password(password: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(password.as_bytes());
    STANDARD.encode(hasher.finalize())
}

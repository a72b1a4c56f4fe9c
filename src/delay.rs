//! Timer-gated digest computation
//!
//! Every hash response is withheld for a configured interval measured
//! from the moment the request is accepted. The wait is a suspension
//! point: it holds no lock, so any number of requests can sit out their
//! delay concurrently.

use std::time::Duration;

use crate::digest;

/// Compute the digest of `password` and release it once `delay` has
/// elapsed. The delay is a floor, not an additional wait: the timer
/// starts before the computation, so if hashing ever took longer than
/// the delay the result would be returned immediately after.
pub async fn delayed_digest(password: &str, delay: Duration) -> String {
    let timer = tokio::time::sleep(delay);
    let encoded = digest::digest_password(password);
    timer.await;
    encoded
}

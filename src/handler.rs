//! HTTP endpoint handlers
//!
//! Dispatches requests for the three routes the service exposes and
//! orchestrates the hash path: admission check, form decode, delayed
//! digest, stats update, response.

use std::time::Instant;

use bytes::Bytes;
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};

use crate::delay;
use crate::error::ApiError;
use crate::logger::log;
use crate::server::HashServer;

/// Route one request. Generic over the body type so tests can drive the
/// dispatch with in-memory bodies instead of live connections.
pub async fn route<B>(server: &HashServer, req: Request<B>) -> Response<Full<Bytes>>
where
    B: hyper::body::Body,
    B::Error: std::fmt::Display,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let result = match path.as_str() {
        "/hash" if method == Method::POST => handle_hash(server, req).await,
        "/stats" if method == Method::GET => Ok(handle_stats(server)),
        "/shutdown" if method == Method::GET => Ok(handle_shutdown(server)),
        _ => Err(ApiError::MethodNotSupported),
    };

    let resp = match result {
        Ok(resp) => resp,
        Err(err) => error_response(&err),
    };
    log::request(&path, resp.status().as_u16());
    resp
}

/// POST /hash: validate the form, compute the delayed digest, and record
/// the elapsed wall-clock time. Exactly one stats update per successful
/// completion.
async fn handle_hash<B>(
    server: &HashServer,
    req: Request<B>,
) -> Result<Response<Full<Bytes>>, ApiError>
where
    B: hyper::body::Body,
    B::Error: std::fmt::Display,
{
    // Admission comes first: a request that observes Running here always
    // runs to completion, even if draining begins a moment later. The
    // guard keeps the drain barrier waiting until this request finishes.
    let _guard = server.shutdown.admit().ok_or(ApiError::Unavailable)?;

    let started = Instant::now();

    let body = req
        .into_body()
        .collect()
        .await
        .map_err(|e| ApiError::InvalidInput(format!("failed to read request body: {}", e)))?
        .to_bytes();

    let password = parse_password_form(&body)?;

    let encoded = delay::delayed_digest(&password, server.hash_delay).await;

    server.stats.record(started.elapsed());

    Ok(text_response(StatusCode::OK, Bytes::from(encoded)))
}

/// GET /stats: render the aggregator snapshot, including the zero
/// snapshot before any hash request has completed.
fn handle_stats(server: &HashServer) -> Response<Full<Bytes>> {
    let snapshot = server.stats.snapshot();
    let body = serde_json::to_vec(&snapshot).unwrap_or_default();
    text_response(StatusCode::OK, Bytes::from(body))
}

/// GET /shutdown: begin draining and acknowledge before the listener
/// closes. The client may observe the connection dropping instead of
/// this response; repeated calls are idempotent at the coordinator.
fn handle_shutdown(server: &HashServer) -> Response<Full<Bytes>> {
    if server.shutdown.begin_drain() {
        log::info!("Shutdown requested, draining in-flight requests");
    }
    text_response(StatusCode::OK, Bytes::new())
}

/// Extract the `password` field from an x-www-form-urlencoded body.
fn parse_password_form(body: &[u8]) -> Result<String, ApiError> {
    if body.is_empty() {
        return Err(ApiError::InvalidInput("empty request body".to_string()));
    }
    let text = std::str::from_utf8(body)
        .map_err(|_| ApiError::InvalidInput("request body is not valid UTF-8".to_string()))?;

    for pair in text.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(ApiError::InvalidInput(format!(
                "malformed form field '{}'",
                pair
            )));
        };
        if key == "password" {
            let password = percent_decode(value)?;
            if password.is_empty() {
                return Err(ApiError::InvalidInput(
                    "password must not be empty".to_string(),
                ));
            }
            return Ok(password);
        }
    }
    Err(ApiError::InvalidInput("missing password field".to_string()))
}

/// Percent-decoding for form values: handles `%XX` escapes and `+` as
/// space. A `%` not followed by two hex digits makes the whole value
/// invalid.
fn percent_decode(input: &str) -> Result<String, ApiError> {
    let mut decoded = Vec::with_capacity(input.len());
    let mut bytes = input.bytes();
    while let Some(b) = bytes.next() {
        match b {
            b'+' => decoded.push(b' '),
            b'%' => {
                let hi = bytes.next().and_then(hex_val);
                let lo = bytes.next().and_then(hex_val);
                match (hi, lo) {
                    (Some(h), Some(l)) => decoded.push((h << 4) | l),
                    _ => {
                        return Err(ApiError::InvalidInput(
                            "malformed percent escape in form value".to_string(),
                        ))
                    }
                }
            }
            other => decoded.push(other),
        }
    }
    Ok(String::from_utf8_lossy(&decoded).into_owned())
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn text_response(status: StatusCode, body: Bytes) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(body));
    *resp.status_mut() = status;
    resp
}

/// Non-200 responses carry a JSON `{"Error": "<message>"}` body.
fn error_response(err: &ApiError) -> Response<Full<Bytes>> {
    let body = serde_json::json!({ "Error": err.to_string() }).to_string();
    text_response(err.status(), Bytes::from(body))
}

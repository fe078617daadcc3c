use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Deserialize;

/// Legacy tokens carry no `exp`; they are implicitly valid for 30 days
/// from their issue timestamp.
const LEGACY_TOKEN_VALIDITY_DAYS: i64 = 30;

#[derive(Debug, Deserialize)]
struct JwtPayload {
    exp: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct LegacyPayload {
    /// Epoch milliseconds, unlike the JWT `exp` which is in seconds.
    timestamp: Option<i64>,
}

/// Extract the expiry instant from a stored token without validating it.
///
/// Two shapes are accepted: a three-segment JWT whose payload carries
/// `exp` (epoch seconds), and a single base64 JSON blob carrying
/// `timestamp` (epoch milliseconds, valid for 30 days). Signatures are
/// never checked here; the backend is the authority and answers 401 for
/// anything it rejects. Returns `None` when no expiry can be derived,
/// which callers must treat as already expired.
pub fn token_expiry(token: &str) -> Option<DateTime<Utc>> {
    let parts: Vec<&str> = token.split('.').collect();

    if parts.len() == 3 {
        let payload = decode_segment(parts[1])?;
        let claims: JwtPayload = serde_json::from_slice(&payload).ok()?;
        return claims.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single());
    }

    let payload = decode_segment(token)?;
    let claims: LegacyPayload = serde_json::from_slice(&payload).ok()?;
    let issued_ms = claims.timestamp?;
    let issued = Utc.timestamp_millis_opt(issued_ms).single()?;
    issued.checked_add_signed(Duration::days(LEGACY_TOKEN_VALIDITY_DAYS))
}

/// Whether the stored token is expired as of `now`.
///
/// An unparseable token counts as expired: any request made with it is
/// doomed anyway, and treating it as expired routes it into the same
/// logout path a 401 would.
pub fn is_expired(token: &str, now: DateTime<Utc>) -> bool {
    match token_expiry(token) {
        Some(expiry) => expiry <= now,
        None => true,
    }
}

/// Decode one base64 segment, tolerating both the URL-safe alphabet JWTs
/// use and the standard alphabet (with or without padding) the legacy
/// blob tokens were minted with.
fn decode_segment(segment: &str) -> Option<Vec<u8>> {
    general_purpose::URL_SAFE_NO_PAD
        .decode(segment)
        .or_else(|_| general_purpose::STANDARD.decode(segment))
        .or_else(|_| general_purpose::STANDARD_NO_PAD.decode(segment))
        .ok()
}

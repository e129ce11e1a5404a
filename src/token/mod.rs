// Identity token codec for QR payloads.
//
// The token is an opaque string of six colon-delimited fields:
//
//   EVENT:<event_id>:PART:<participant_id>:TENANT:<tenant_id>
//
// Decoding only parses structure; it performs no authenticity check. A token
// that decodes cleanly still has to survive the participant lookup and the
// tenant ownership check before it means anything.

use thiserror::Error;
use uuid::Uuid;

const EVENT_MARKER: &str = "EVENT";
const PART_MARKER: &str = "PART";
const TENANT_MARKER: &str = "TENANT";

/// The (tenant, event, participant) triple carried inside a QR token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenClaims {
    pub tenant_id: Uuid,
    pub event_id: Uuid,
    pub participant_id: Uuid,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed identity token: {0}")]
    InvalidFormat(&'static str),
}

/// Serialize the triple into the QR payload string.
pub fn encode(claims: &TokenClaims) -> String {
    format!(
        "{}:{}:{}:{}:{}:{}",
        EVENT_MARKER,
        claims.event_id,
        PART_MARKER,
        claims.participant_id,
        TENANT_MARKER,
        claims.tenant_id
    )
}

/// Parse an untrusted scanner payload. Rejects anything that is not exactly
/// the six-field shape with the expected literal markers and UUID payloads.
pub fn decode(token: &str) -> Result<TokenClaims, TokenError> {
    let fields: Vec<&str> = token.split(':').collect();
    if fields.len() != 6 {
        return Err(TokenError::InvalidFormat("expected six colon-delimited fields"));
    }
    if fields[0] != EVENT_MARKER || fields[2] != PART_MARKER || fields[4] != TENANT_MARKER {
        return Err(TokenError::InvalidFormat("unexpected field markers"));
    }

    let event_id = Uuid::parse_str(fields[1])
        .map_err(|_| TokenError::InvalidFormat("event id is not a UUID"))?;
    let participant_id = Uuid::parse_str(fields[3])
        .map_err(|_| TokenError::InvalidFormat("participant id is not a UUID"))?;
    let tenant_id = Uuid::parse_str(fields[5])
        .map_err(|_| TokenError::InvalidFormat("tenant id is not a UUID"))?;

    Ok(TokenClaims {
        tenant_id,
        event_id,
        participant_id,
    })
}

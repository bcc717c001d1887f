//! Compact JWS serialization of an assembled claim set.

use base64ct::{Base64UrlUnpadded, Encoding};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    claims::{assemble_claims, ClaimParams, IssueOptions},
    error::IssueError,
    store::Role,
};

/// Header of an issued token. The `alg` field is filled from the role's
/// configured algorithm; no further header customization is offered.
#[derive(Debug, Serialize)]
struct Header<'a> {
    #[serde(rename = "alg")]
    algorithm: &'a str,
    #[serde(rename = "typ")]
    token_type: &'static str,
}

/// A freshly issued token. Not persisted anywhere.
#[derive(Debug, Clone, PartialEq)]
pub struct IssuedToken {
    /// The `jti` value that survived claim assembly. Usually a UUID string,
    /// but a free-form claim override may substitute any JSON value.
    pub jti: Value,
    /// The compact-serialized JWT (three base64url segments joined by `.`).
    pub token: String,
}

/// Assembles the claim set for `role` and signs it, producing a compact JWS.
///
/// The role is assumed internally consistent; its key material was validated
/// when the role was written. Claim assembly failures surface as
/// [`IssueError::ClaimBlob`] / [`IssueError::ClaimBlobType`]; signing
/// failures are non-retryable.
pub fn issue_token<F, G>(
    role: &Role,
    params: &ClaimParams,
    options: &IssueOptions<F, G>,
) -> Result<IssuedToken, IssueError>
where
    F: Fn() -> DateTime<Utc>,
    G: Fn() -> Uuid,
{
    let claims = assemble_claims(role, params, options)?;
    let signing_key = role.algorithm.signing_key(&role.key)?;

    let header = Header {
        algorithm: role.algorithm.name(),
        token_type: "JWT",
    };
    let header = serde_json::to_string(&header).map_err(IssueError::Header)?;
    let mut buffer = Vec::new();
    encode_base64_buf(&header, &mut buffer);

    let serialized_claims = serde_json::to_string(&claims).map_err(IssueError::Claims)?;
    buffer.push(b'.');
    encode_base64_buf(&serialized_claims, &mut buffer);

    let signature = signing_key.sign(&buffer).map_err(IssueError::Signing)?;
    buffer.push(b'.');
    encode_base64_buf(&signature, &mut buffer);

    let jti = claims.get("jti").cloned().unwrap_or(Value::Null);
    // SAFETY: safe by construction: base64 alphabet and `.` char are valid UTF-8.
    let token = unsafe { String::from_utf8_unchecked(buffer) };
    Ok(IssuedToken { jti, token })
}

fn encode_base64_buf(source: impl AsRef<[u8]>, buffer: &mut Vec<u8>) {
    let source = source.as_ref();
    let previous_len = buffer.len();
    let encoded_len = Base64UrlUnpadded::encoded_len(source);
    buffer.resize(previous_len + encoded_len, 0);
    Base64UrlUnpadded::encode(source, &mut buffer[previous_len..])
        .expect("miscalculated base64-encoded length; this should never happen");
}

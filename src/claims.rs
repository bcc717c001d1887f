//! Claim assembly: layered construction of a token's claim set.
//!
//! The final claim mapping is built from four precedence layers; later layers
//! overwrite earlier ones on key conflict:
//!
//! 1. the role's default `iss` / `sub` / `aud` values;
//! 2. system-generated gap fillers (`nbf`, `iat`, `jti`), applied only where
//!    the corresponding request field is unset;
//! 3. the per-request structured fields;
//! 4. the free-form claims object, which overrides everything above.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::{error::IssueError, store::Role};

/// Per-request structured inputs to token issuance.
///
/// Empty strings and zero integers mean "unset"; unset time fields and `jti`
/// are filled in by the engine. The `claims` string, if non-empty, must
/// decode to a JSON object and is merged into the claim set last.
#[derive(Debug, Clone, Default)]
pub struct ClaimParams {
    /// Value for the `iss` claim. Overrides the role default.
    pub issuer: String,
    /// Value for the `sub` claim. Overrides the role default.
    pub subject: String,
    /// Value for the `aud` claim. Overrides the role default.
    pub audience: String,
    /// Value for the `exp` claim, in seconds since the Unix epoch.
    pub expiration: i64,
    /// Value for the `nbf` claim. Zero means "now".
    pub not_before: i64,
    /// Value for the `iat` claim. Zero means "now".
    pub issued_at: i64,
    /// Value for the `jti` claim. Empty means "generate one".
    pub jti: String,
    /// Free-form claims as a JSON-encoded object.
    pub claims: String,
}

/// Sources for system-generated claim values.
///
/// The clock and the token-id generator are injectable so that tests can
/// assert deterministic claim values.
#[derive(Debug, Clone, Copy)]
pub struct IssueOptions<F = fn() -> DateTime<Utc>, G = fn() -> Uuid> {
    /// Source of the current timestamp for auto-filled `nbf` / `iat`.
    pub clock_fn: F,
    /// Source of fresh `jti` values.
    pub token_id_fn: G,
}

impl<F: Fn() -> DateTime<Utc>, G: Fn() -> Uuid> IssueOptions<F, G> {
    /// Creates options from the specified clock and token-id sources.
    pub fn new(clock_fn: F, token_id_fn: G) -> Self {
        Self {
            clock_fn,
            token_id_fn,
        }
    }
}

impl Default for IssueOptions {
    fn default() -> Self {
        Self {
            clock_fn: Utc::now,
            token_id_fn: Uuid::new_v4,
        }
    }
}

/// Builds the final claim mapping for a token issued against `role`.
///
/// Reserved claim names are `iss`, `sub`, `aud`, `exp`, `nbf`, `iat` and
/// `jti`; all other keys of the free-form object pass through unchanged.
/// Time-bearing claims are emitted as integer NumericDate values. No policy
/// checks (such as `nbf < exp`) are performed.
pub fn assemble_claims<F, G>(
    role: &Role,
    params: &ClaimParams,
    options: &IssueOptions<F, G>,
) -> Result<Map<String, Value>, IssueError>
where
    F: Fn() -> DateTime<Utc>,
    G: Fn() -> Uuid,
{
    let mut claims = Map::new();

    // Layer 1: role defaults.
    if !role.issuer.is_empty() {
        claims.insert("iss".to_owned(), Value::from(role.issuer.clone()));
    }
    if !role.subject.is_empty() {
        claims.insert("sub".to_owned(), Value::from(role.subject.clone()));
    }
    if !role.audience.is_empty() {
        claims.insert("aud".to_owned(), Value::from(role.audience.clone()));
    }

    // Layer 2: system-generated values fill the gaps the request leaves.
    let now = (options.clock_fn)().timestamp();
    if params.not_before == 0 {
        claims.insert("nbf".to_owned(), Value::from(now));
    }
    if params.issued_at == 0 {
        claims.insert("iat".to_owned(), Value::from(now));
    }
    if params.jti.is_empty() {
        let token_id = (options.token_id_fn)();
        claims.insert("jti".to_owned(), Value::from(token_id.to_string()));
    }

    // Layer 3: per-request structured fields.
    if !params.issuer.is_empty() {
        claims.insert("iss".to_owned(), Value::from(params.issuer.clone()));
    }
    if !params.subject.is_empty() {
        claims.insert("sub".to_owned(), Value::from(params.subject.clone()));
    }
    if !params.audience.is_empty() {
        claims.insert("aud".to_owned(), Value::from(params.audience.clone()));
    }
    if params.expiration != 0 {
        claims.insert("exp".to_owned(), Value::from(params.expiration));
    }
    if params.not_before != 0 {
        claims.insert("nbf".to_owned(), Value::from(params.not_before));
    }
    if params.issued_at != 0 {
        claims.insert("iat".to_owned(), Value::from(params.issued_at));
    }
    if !params.jti.is_empty() {
        claims.insert("jti".to_owned(), Value::from(params.jti.clone()));
    }

    // Layer 4: the free-form object overrides everything, `jti` included.
    if !params.claims.is_empty() {
        let blob: Value = serde_json::from_str(&params.claims).map_err(IssueError::ClaimBlob)?;
        let Value::Object(blob) = blob else {
            return Err(IssueError::ClaimBlobType);
        };
        for (name, value) in blob {
            claims.insert(name, value);
        }
    }

    Ok(claims)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    use super::*;
    use crate::alg::JwsAlgorithm;

    const NOW: i64 = 1_438_898_720;

    fn test_role() -> Role {
        Role {
            algorithm: JwsAlgorithm::Hs256,
            key: "test".to_owned(),
            issuer: "Test Default Issuer".to_owned(),
            subject: "Test Default Subject".to_owned(),
            audience: "Test Default Audience".to_owned(),
        }
    }

    fn fixed_options() -> IssueOptions {
        fn clock() -> DateTime<Utc> {
            Utc.timestamp_opt(NOW, 0).unwrap()
        }
        IssueOptions::new(clock, Uuid::nil)
    }

    #[test]
    fn role_defaults_fill_empty_request() {
        let claims = assemble_claims(&test_role(), &ClaimParams::default(), &fixed_options()).unwrap();

        assert_eq!(claims["iss"], "Test Default Issuer");
        assert_eq!(claims["sub"], "Test Default Subject");
        assert_eq!(claims["aud"], "Test Default Audience");
        assert_eq!(claims["nbf"], NOW);
        assert_eq!(claims["iat"], NOW);
        assert_eq!(claims["jti"], Uuid::nil().to_string());
        assert!(!claims.contains_key("exp"));
    }

    #[test]
    fn empty_role_defaults_are_omitted() {
        let role = Role {
            issuer: String::new(),
            subject: String::new(),
            audience: String::new(),
            ..test_role()
        };
        let claims = assemble_claims(&role, &ClaimParams::default(), &fixed_options()).unwrap();

        assert!(!claims.contains_key("iss"));
        assert!(!claims.contains_key("sub"));
        assert!(!claims.contains_key("aud"));
    }

    #[test]
    fn request_fields_override_defaults_and_generated_values() {
        let params = ClaimParams {
            issuer: "Test Issuer".to_owned(),
            expiration: NOW + 3_600,
            not_before: NOW - 60,
            jti: "explicit".to_owned(),
            ..ClaimParams::default()
        };
        let claims = assemble_claims(&test_role(), &params, &fixed_options()).unwrap();

        assert_eq!(claims["iss"], "Test Issuer");
        // Untouched fields keep the role defaults.
        assert_eq!(claims["sub"], "Test Default Subject");
        assert_eq!(claims["exp"], NOW + 3_600);
        assert_eq!(claims["nbf"], NOW - 60);
        // `iat` was unset, so the clock filled it.
        assert_eq!(claims["iat"], NOW);
        assert_eq!(claims["jti"], "explicit");
    }

    #[test]
    fn free_form_claims_override_every_layer() {
        let params = ClaimParams {
            jti: "A".to_owned(),
            claims: r#"{"jti": "B", "iss": "blob issuer", "ran": "random"}"#.to_owned(),
            ..ClaimParams::default()
        };
        let claims = assemble_claims(&test_role(), &params, &fixed_options()).unwrap();

        assert_eq!(claims["jti"], "B");
        assert_eq!(claims["iss"], "blob issuer");
        assert_eq!(claims["ran"], "random");
    }

    #[test]
    fn free_form_claims_may_be_non_strings() {
        let params = ClaimParams {
            claims: r#"{"admin": true, "level": 7, "jti": 5}"#.to_owned(),
            ..ClaimParams::default()
        };
        let claims = assemble_claims(&test_role(), &params, &fixed_options()).unwrap();

        assert_eq!(claims["admin"], true);
        assert_eq!(claims["level"], 7);
        assert_eq!(claims["jti"], 5);
    }

    #[test]
    fn malformed_claim_blob_is_rejected() {
        let params = ClaimParams {
            claims: "{not json".to_owned(),
            ..ClaimParams::default()
        };
        assert_matches!(
            assemble_claims(&test_role(), &params, &fixed_options()),
            Err(IssueError::ClaimBlob(_))
        );

        let params = ClaimParams {
            claims: "[1, 2, 3]".to_owned(),
            ..ClaimParams::default()
        };
        assert_matches!(
            assemble_claims(&test_role(), &params, &fixed_options()),
            Err(IssueError::ClaimBlobType)
        );
    }

    #[test]
    fn generated_jti_is_a_canonical_uuid() {
        let claims =
            assemble_claims(&test_role(), &ClaimParams::default(), &IssueOptions::default())
                .unwrap();
        let jti = claims["jti"].as_str().unwrap();
        assert_eq!(jti.len(), 36);
        assert!(Uuid::parse_str(jti).is_ok());
    }
}

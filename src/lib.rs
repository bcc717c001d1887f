//! Role-scoped [JSON web token (JWT)][JWT] issuance core.
//!
//! Clients register signing *roles*, each binding a JWS algorithm, key
//! material and optional default claim values, and then request signed
//! tokens against a role by supplying the variable claim payload. The crate
//! produces RFC 7519 JWTs in compact serialization and returns each token
//! together with its `jti` identifier. Token *verification* is deliberately
//! not offered: this is an issuing component.
//!
//! # Design choices
//!
//! - Key material is validated against the algorithm family when a role is
//!   *written*, so invalid configuration is rejected at the earliest point
//!   and the signing path can assume roles are internally consistent.
//! - On reads, the key attribute is stripped before the role leaves the
//!   store; callers of the read path never see key material, and `Debug`
//!   impls redact it.
//! - The claim set is assembled from four precedence layers (role defaults,
//!   system-generated gap fillers, per-request fields, free-form claims);
//!   the free-form object deliberately overrides everything, `jti` included.
//! - All mutable state lives behind the [`Storage`] capability. The
//!   dispatcher itself is stateless and can run on parallel threads.
//!
//! ## Supported algorithms
//!
//! | Algorithm(s) | Key material | Description |
//! |--------------|--------------|-------------|
//! | `HS256`, `HS384`, `HS512` | any non-empty string | HMAC via pure Rust [`sha2`] crate |
//! | `RS256`, `RS384`, `RS512` | PKCS#1 PEM | RSASSA-PKCS1-v1_5 via the [`rsa`] crate |
//! | `ES256`, `ES384`, `ES512` | SEC1 PEM | ECDSA on P-256 / P-384 / P-521 |
//!
//! [JWT]: https://jwt.io/
//! [`sha2`]: https://docs.rs/sha2/
//! [`rsa`]: https://docs.rs/rsa/
//!
//! # Examples
//!
//! Full lifecycle through the dispatcher:
//!
//! ```
//! use jwt_mint::{Backend, MemoryStorage, Operation, Request, Response};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), jwt_mint::BackendError> {
//! let storage = MemoryStorage::new();
//! let backend = Backend::new();
//!
//! // Register a signing role.
//! let fields = json!({
//!     "algorithm": "HS256",
//!     "key": "0b59secret27",
//!     "default_issuer": "token-service",
//! });
//! let request = Request::new(Operation::Write, "roles/demo", &storage)
//!     .with_data(fields.as_object().cloned().unwrap());
//! assert_eq!(backend.handle_request(request)?, Response::Empty);
//!
//! // Reading the role back never exposes the key.
//! let request = Request::new(Operation::Read, "roles/demo", &storage);
//! let Response::Data(body) = backend.handle_request(request)? else {
//!     unreachable!();
//! };
//! assert_eq!(body["iss"], "token-service");
//! assert!(body.get("key").is_none());
//!
//! // Issue a token against the role.
//! let fields = json!({
//!     "subject": "alice",
//!     "expiration": 1_893_456_000,
//!     "claims": r#"{"scope": "read"}"#,
//! });
//! let request = Request::new(Operation::Write, "issue/demo", &storage)
//!     .with_data(fields.as_object().cloned().unwrap());
//! let Response::Data(body) = backend.handle_request(request)? else {
//!     unreachable!();
//! };
//! let token = body["token"].as_str().unwrap();
//! assert_eq!(token.split('.').count(), 3);
//! assert!(body["jti"].is_string());
//! # Ok(())
//! # }
//! ```
//!
//! The signing engine can also be driven directly, with the clock and the
//! token-id source injected for deterministic output:
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use jwt_mint::{issue_token, ClaimParams, IssueOptions, JwsAlgorithm, Role};
//! use uuid::Uuid;
//!
//! # fn main() -> Result<(), jwt_mint::IssueError> {
//! let role = Role {
//!     algorithm: JwsAlgorithm::Hs256,
//!     key: "0b59secret27".to_owned(),
//!     issuer: "token-service".to_owned(),
//!     subject: String::new(),
//!     audience: String::new(),
//! };
//! let options = IssueOptions::new(
//!     || Utc.timestamp_opt(1_438_898_720, 0).unwrap(),
//!     Uuid::nil,
//! );
//! let issued = issue_token(&role, &ClaimParams::default(), &options)?;
//! assert_eq!(issued.jti, Uuid::nil().to_string());
//! # Ok(())
//! # }
//! ```

pub mod alg;
mod claims;
mod error;
mod fields;
mod paths;
mod store;
mod token;

pub use crate::{
    alg::{JwsAlgorithm, KeyFamily, SigningKey},
    claims::{assemble_claims, ClaimParams, IssueOptions},
    error::{BackendError, FieldError, IssueError, KeyError, StorageError, StoreError},
    fields::{FieldData, FieldSchema, FieldType},
    paths::{Backend, Operation, Request, Response},
    store::{MemoryStorage, Role, RoleConfig, RoleStore, RoleView, Storage},
    token::{issue_token, IssuedToken},
};

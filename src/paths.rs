//! Path dispatch: binding URL-shaped operations to the role store and the
//! signing engine.
//!
//! Two path families are exposed: `roles/<name>` for role CRUD (plus a list
//! on the bare `roles` prefix) and `issue/<role>` for token issuance. The
//! trailing segment accepts one or more characters from `[A-Za-z0-9_-]`.
//! Named captures from the path are bound into the request data and take
//! precedence over same-named body fields.

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use std::fmt;

use crate::{
    claims::{ClaimParams, IssueOptions},
    error::BackendError,
    fields::{FieldData, FieldSchema},
    store::{RoleConfig, RoleStore, Storage},
    token::issue_token,
};

/// Operation requested on a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Retrieve data from the path.
    Read,
    /// Create or overwrite data at the path.
    Write,
    /// Remove data at the path.
    Delete,
    /// Enumerate entries under the path.
    List,
}

impl fmt::Display for Operation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::List => "list",
        })
    }
}

/// A request routed to the backend.
///
/// The storage handle travels with the request; the backend itself owns no
/// mutable state, so it can be driven from parallel threads with the storage
/// abstraction as the sole synchronization point.
pub struct Request<'a> {
    /// Requested operation.
    pub operation: Operation,
    /// Request path, e.g. `roles/my-role` or `issue/my-role`.
    pub path: String,
    /// Raw request fields.
    pub data: Map<String, Value>,
    /// Storage handle for this request.
    pub storage: &'a dyn Storage,
}

impl<'a> Request<'a> {
    /// Creates a request with no body fields.
    pub fn new(operation: Operation, path: impl Into<String>, storage: &'a dyn Storage) -> Self {
        Self {
            operation,
            path: path.into(),
            data: Map::new(),
            storage,
        }
    }

    /// Replaces the request body fields.
    #[must_use]
    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = data;
        self
    }
}

/// Outcome of a dispatched request.
///
/// `Error` is an ordinary response carrying a human-readable message, used
/// where a failure is part of normal operation (an issue request naming an
/// unknown role). Protocol-level failures surface as
/// [`BackendError`](crate::BackendError) instead.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    /// Success with no body.
    Empty,
    /// Success carrying a JSON object body.
    Data(Map<String, Value>),
    /// A user-visible error message.
    Error(String),
}

#[derive(Debug, Clone, Copy)]
enum PathKind {
    RoleList,
    Role,
    Issue,
}

struct PathSpec {
    pattern: Regex,
    fields: &'static [FieldSchema],
    kind: PathKind,
}

const ROLE_FIELDS: &[FieldSchema] = &[
    FieldSchema::string("name"),
    FieldSchema::string("algorithm").with_default("RS256"),
    FieldSchema::string("key"),
    FieldSchema::string("default_issuer"),
    FieldSchema::string("default_subject"),
    FieldSchema::string("default_audience"),
];

const ISSUE_FIELDS: &[FieldSchema] = &[
    FieldSchema::string("role"),
    FieldSchema::string("issuer"),
    FieldSchema::string("subject"),
    FieldSchema::string("audience"),
    FieldSchema::int("expiration"),
    FieldSchema::int("not_before"),
    FieldSchema::int("issued_at"),
    FieldSchema::string("jti"),
    FieldSchema::string("claims"),
];

/// The request dispatcher.
///
/// Owns the compiled path table and nothing else; all mutable state lives
/// behind the [`Storage`] handle carried by each request.
pub struct Backend {
    paths: Vec<PathSpec>,
}

impl Default for Backend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend {
    /// Creates a backend with the two path families.
    pub fn new() -> Self {
        let compile = |pattern| Regex::new(pattern).expect("valid path pattern");
        let paths = vec![
            PathSpec {
                pattern: compile("^roles/?$"),
                fields: &[],
                kind: PathKind::RoleList,
            },
            PathSpec {
                pattern: compile(r"^roles/(?P<name>[A-Za-z0-9_-]+)$"),
                fields: ROLE_FIELDS,
                kind: PathKind::Role,
            },
            PathSpec {
                pattern: compile(r"^issue/(?P<role>[A-Za-z0-9_-]+)$"),
                fields: ISSUE_FIELDS,
                kind: PathKind::Issue,
            },
        ];
        Self { paths }
    }

    /// Dispatches a request to the handler registered for its path and
    /// operation.
    pub fn handle_request(&self, request: Request<'_>) -> Result<Response, BackendError> {
        let Request {
            operation,
            path,
            mut data,
            storage,
        } = request;
        debug!(%operation, %path, "dispatching request");

        let (spec, captures) = self
            .paths
            .iter()
            .find_map(|spec| spec.pattern.captures(&path).map(|captures| (spec, captures)))
            .ok_or_else(|| BackendError::UnsupportedPath(path.clone()))?;

        // Path captures win over same-named body fields.
        for name in spec.pattern.capture_names().flatten() {
            if let Some(capture) = captures.name(name) {
                data.insert(name.to_owned(), Value::from(capture.as_str()));
            }
        }
        let fields = FieldData::new(&data, spec.fields);

        match (spec.kind, operation) {
            (PathKind::Role, Operation::Write) => write_role(&fields, storage),
            (PathKind::Role, Operation::Read) => read_role(&fields, storage),
            (PathKind::Role, Operation::Delete) => delete_role(&fields, storage),
            (PathKind::RoleList, Operation::List) => list_roles(storage),
            (PathKind::Issue, Operation::Write) => issue(&fields, storage),
            _ => Err(BackendError::UnsupportedOperation { operation, path }),
        }
    }
}

fn write_role(fields: &FieldData<'_>, storage: &dyn Storage) -> Result<Response, BackendError> {
    let name = fields.get_string("name")?;
    let config = RoleConfig {
        algorithm: fields.get_string("algorithm")?,
        key: fields.get_string("key")?,
        issuer: fields.get_string("default_issuer")?,
        subject: fields.get_string("default_subject")?,
        audience: fields.get_string("default_audience")?,
    };
    RoleStore::new(storage).put(&name, &config)?;
    Ok(Response::Empty)
}

fn read_role(fields: &FieldData<'_>, storage: &dyn Storage) -> Result<Response, BackendError> {
    let name = fields.get_string("name")?;
    let Some(view) = RoleStore::new(storage).get_public_view(&name)? else {
        return Ok(Response::Empty);
    };
    let mut body = Map::new();
    body.insert("algorithm".to_owned(), Value::from(view.algorithm.name()));
    body.insert("iss".to_owned(), Value::from(view.issuer));
    body.insert("sub".to_owned(), Value::from(view.subject));
    body.insert("aud".to_owned(), Value::from(view.audience));
    Ok(Response::Data(body))
}

fn delete_role(fields: &FieldData<'_>, storage: &dyn Storage) -> Result<Response, BackendError> {
    let name = fields.get_string("name")?;
    RoleStore::new(storage).delete(&name)?;
    Ok(Response::Empty)
}

fn list_roles(storage: &dyn Storage) -> Result<Response, BackendError> {
    let names = RoleStore::new(storage).list()?;
    let mut body = Map::new();
    body.insert(
        "keys".to_owned(),
        Value::Array(names.into_iter().map(Value::from).collect()),
    );
    Ok(Response::Data(body))
}

fn issue(fields: &FieldData<'_>, storage: &dyn Storage) -> Result<Response, BackendError> {
    let name = fields.get_string("role")?;
    let Some(role) = RoleStore::new(storage).get(&name)? else {
        // Callers routinely probe for roles; this is an ordinary response,
        // not a dispatch failure.
        return Ok(Response::Error(format!("Unknown role: {name}")));
    };

    let params = ClaimParams {
        issuer: fields.get_string("issuer")?,
        subject: fields.get_string("subject")?,
        audience: fields.get_string("audience")?,
        expiration: fields.get_int("expiration")?,
        not_before: fields.get_int("not_before")?,
        issued_at: fields.get_int("issued_at")?,
        jti: fields.get_string("jti")?,
        claims: fields.get_string("claims")?,
    };
    let issued = issue_token(&role, &params, &IssueOptions::default())?;

    let mut body = Map::new();
    body.insert("jti".to_owned(), issued.jti);
    body.insert("token".to_owned(), Value::from(issued.token));
    Ok(Response::Data(body))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::store::MemoryStorage;

    #[test]
    fn unmatched_paths_are_rejected() {
        let storage = MemoryStorage::new();
        let backend = Backend::new();
        for path in [
            "unknown/test",
            "roles/bad name",
            "roles/nested/name",
            "roles/",
            "issue/",
            "issue/bad.name!",
        ] {
            let err = backend
                .handle_request(Request::new(Operation::Read, path, &storage))
                .unwrap_err();
            if path == "roles/" {
                // `roles/` matches the list path, which only supports list.
                assert_matches!(err, BackendError::UnsupportedOperation { .. });
            } else {
                assert_matches!(err, BackendError::UnsupportedPath(p) if p == path);
            }
        }
    }

    #[test]
    fn unsupported_operations_are_rejected() {
        let storage = MemoryStorage::new();
        let backend = Backend::new();
        let err = backend
            .handle_request(Request::new(Operation::Delete, "issue/test", &storage))
            .unwrap_err();
        assert_matches!(
            err,
            BackendError::UnsupportedOperation {
                operation: Operation::Delete,
                ..
            }
        );
        let err = backend
            .handle_request(Request::new(Operation::List, "roles/test", &storage))
            .unwrap_err();
        assert_matches!(err, BackendError::UnsupportedOperation { .. });
    }

    #[test]
    fn generic_name_segments_accept_dashes_and_underscores() {
        let storage = MemoryStorage::new();
        let backend = Backend::new();
        // Reading an absent role is an empty response, so a successful
        // dispatch is distinguishable from a path mismatch.
        for path in ["roles/a", "roles/A-b_c9", "roles/_-_"] {
            let response = backend
                .handle_request(Request::new(Operation::Read, path, &storage))
                .unwrap();
            assert_eq!(response, Response::Empty);
        }
    }

    #[test]
    fn path_capture_overrides_body_field() {
        let storage = MemoryStorage::new();
        let backend = Backend::new();
        let mut data = Map::new();
        data.insert("role".to_owned(), Value::from("body-role"));
        let response = backend
            .handle_request(
                Request::new(Operation::Write, "issue/url-role", &storage).with_data(data),
            )
            .unwrap();
        assert_eq!(
            response,
            Response::Error("Unknown role: url-role".to_owned())
        );
    }

    #[test]
    fn list_operation_reports_role_names() {
        let storage = MemoryStorage::new();
        let backend = Backend::new();
        let mut data = Map::new();
        data.insert("algorithm".to_owned(), Value::from("HS256"));
        data.insert("key".to_owned(), Value::from("test"));
        backend
            .handle_request(
                Request::new(Operation::Write, "roles/test", &storage).with_data(data),
            )
            .unwrap();

        for path in ["roles", "roles/"] {
            let response = backend
                .handle_request(Request::new(Operation::List, path, &storage))
                .unwrap();
            let Response::Data(body) = response else {
                panic!("expected data response");
            };
            assert_eq!(body["keys"], serde_json::json!(["test"]));
        }
    }
}

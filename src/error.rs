//! Error handling.

use std::{error, fmt};

use crate::{alg::JwsAlgorithm, fields::FieldType, paths::Operation};

/// Errors that may occur when validating key material against an algorithm
/// family.
#[derive(Debug)]
#[non_exhaustive]
pub enum KeyError {
    /// Key material is empty.
    Empty,
    /// PEM does not carry the marker required by the algorithm family
    /// (`RSA PRIVATE KEY` for `RS*`, `EC PRIVATE KEY` for `ES*`).
    MissingMarker {
        /// The marker the family expects.
        marker: &'static str,
    },
    /// Key does not parse according to the algorithm family (PKCS#1 for `RS*`,
    /// SEC1 on the matching curve for `ES*`).
    Malformed(anyhow::Error),
}

impl fmt::Display for KeyError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => formatter.write_str("Key material is empty"),
            Self::MissingMarker { marker } => {
                write!(formatter, "PEM does not contain a `{marker}` block")
            }
            Self::Malformed(e) => write!(formatter, "Cannot parse key material: {e}"),
        }
    }
}

impl error::Error for KeyError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Malformed(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// Opaque failure reported by a [`Storage`](crate::Storage) implementation.
#[derive(Debug)]
pub struct StorageError(anyhow::Error);

impl StorageError {
    /// Wraps an arbitrary error into a `StorageError`.
    pub fn new(error: impl Into<anyhow::Error>) -> Self {
        Self(error.into())
    }

    /// Creates an error from a message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self(anyhow::Error::msg(message.to_string()))
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "Storage operation failed: {}", self.0)
    }
}

impl error::Error for StorageError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(self.0.as_ref())
    }
}

/// Errors that can occur when writing, reading or deleting roles.
#[derive(Debug)]
#[non_exhaustive]
pub enum StoreError {
    /// Requested algorithm is not one of the supported JWS identifiers.
    BadAlgorithm(String),
    /// No key material was supplied on a role write.
    MissingKey,
    /// Key material does not match the family implied by the algorithm.
    KeyFormat {
        /// Algorithm the role was being configured with.
        algorithm: JwsAlgorithm,
        /// Underlying validation failure.
        source: KeyError,
    },
    /// Role entry cannot be serialized for storage.
    Encoding(serde_json::Error),
    /// A stored role entry cannot be decoded.
    Corrupt {
        /// Name of the offending role.
        name: String,
        /// Underlying decoding failure.
        source: serde_json::Error,
    },
    /// The storage backend failed. Writes are not retried locally.
    Storage(StorageError),
}

impl fmt::Display for StoreError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadAlgorithm(name) => write!(formatter, "Unsupported algorithm: {name}"),
            Self::MissingKey => formatter.write_str("Missing key material"),
            Self::KeyFormat { algorithm, source } => write!(
                formatter,
                "Key does not match algorithm {}: {source}",
                algorithm.name()
            ),
            Self::Encoding(e) => write!(formatter, "Cannot serialize role entry: {e}"),
            Self::Corrupt { name, source } => {
                write!(formatter, "Stored entry for role `{name}` is corrupt: {source}")
            }
            Self::Storage(e) => fmt::Display::fmt(e, formatter),
        }
    }
}

impl error::Error for StoreError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::KeyFormat { source, .. } => Some(source),
            Self::Encoding(e) | Self::Corrupt { source: e, .. } => Some(e),
            Self::Storage(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(error: StorageError) -> Self {
        Self::Storage(error)
    }
}

/// Errors that can occur during token issuance.
#[derive(Debug)]
#[non_exhaustive]
pub enum IssueError {
    /// The free-form claims string is not valid JSON.
    ClaimBlob(serde_json::Error),
    /// The free-form claims string decodes to something other than a JSON
    /// object.
    ClaimBlobType,
    /// The role's key material no longer parses. Roles are validated on
    /// write, so this indicates a corrupted or tampered entry.
    Key(KeyError),
    /// Token header cannot be serialized.
    Header(serde_json::Error),
    /// The claim set cannot be serialized.
    Claims(serde_json::Error),
    /// The signing primitive rejected the operation. Non-retryable.
    Signing(anyhow::Error),
}

impl fmt::Display for IssueError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClaimBlob(e) => write!(formatter, "Cannot decode claims: {e}"),
            Self::ClaimBlobType => formatter.write_str("Claims must decode to a JSON object"),
            Self::Key(e) => write!(formatter, "Role key material is unusable: {e}"),
            Self::Header(e) => write!(formatter, "Cannot serialize header: {e}"),
            Self::Claims(e) => write!(formatter, "Cannot serialize claims: {e}"),
            Self::Signing(e) => write!(formatter, "Signing failed: {e}"),
        }
    }
}

impl error::Error for IssueError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::ClaimBlob(e) | Self::Header(e) | Self::Claims(e) => Some(e),
            Self::Key(e) => Some(e),
            Self::Signing(e) => Some(e.as_ref()),
            Self::ClaimBlobType => None,
        }
    }
}

impl From<KeyError> for IssueError {
    fn from(error: KeyError) -> Self {
        Self::Key(error)
    }
}

/// Errors raised by the request field coercion layer.
#[derive(Debug)]
#[non_exhaustive]
pub enum FieldError {
    /// A field was requested that the operation's schema does not declare.
    Undeclared(String),
    /// A supplied value cannot be coerced to the declared field type.
    InvalidType {
        /// Name of the offending field.
        field: String,
        /// Type the schema declares for it.
        expected: FieldType,
    },
}

impl fmt::Display for FieldError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undeclared(field) => {
                write!(formatter, "Field `{field}` is not declared in the schema")
            }
            Self::InvalidType { field, expected } => {
                write!(formatter, "Field `{field}` cannot be read as {expected}")
            }
        }
    }
}

impl error::Error for FieldError {}

/// Errors surfaced by the request dispatcher.
///
/// These are protocol-level failures. A request that is well-formed but names
/// an unknown role produces an in-band [`Response::Error`], not a
/// `BackendError`.
///
/// [`Response::Error`]: crate::Response::Error
#[derive(Debug)]
#[non_exhaustive]
pub enum BackendError {
    /// No path pattern matches the requested path.
    UnsupportedPath(String),
    /// The matched path does not support the requested operation.
    UnsupportedOperation {
        /// The requested operation.
        operation: Operation,
        /// The path it was requested on.
        path: String,
    },
    /// Request fields failed coercion.
    Field(FieldError),
    /// Role store failure.
    Store(StoreError),
    /// Token issuance failure.
    Issue(IssueError),
}

impl fmt::Display for BackendError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedPath(path) => write!(formatter, "Unsupported path: {path}"),
            Self::UnsupportedOperation { operation, path } => {
                write!(formatter, "Operation {operation} is not supported on {path}")
            }
            Self::Field(e) => fmt::Display::fmt(e, formatter),
            Self::Store(e) => fmt::Display::fmt(e, formatter),
            Self::Issue(e) => fmt::Display::fmt(e, formatter),
        }
    }
}

impl error::Error for BackendError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Field(e) => Some(e),
            Self::Store(e) => Some(e),
            Self::Issue(e) => Some(e),
            _ => None,
        }
    }
}

impl From<FieldError> for BackendError {
    fn from(error: FieldError) -> Self {
        Self::Field(error)
    }
}

impl From<StoreError> for BackendError {
    fn from(error: StoreError) -> Self {
        Self::Store(error)
    }
}

impl From<IssueError> for BackendError {
    fn from(error: IssueError) -> Self {
        Self::Issue(error)
    }
}

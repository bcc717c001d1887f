//! Role persistence: the storage capability and the validating role store.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use std::{collections::BTreeMap, fmt};

use crate::{
    alg::JwsAlgorithm,
    error::{StorageError, StoreError},
};

/// Storage keys for role entries are `role/<name>`.
const STORAGE_PREFIX: &str = "role/";

/// Key-value capability the backend persists through.
///
/// Implementations are expected to be thread-safe and to provide their own
/// consistency semantics; the backend performs no caching or retries on top.
/// Atomicity across multiple keys must not be assumed.
pub trait Storage: Send + Sync {
    /// Retrieves the value stored at `key`. A missing key yields `Ok(None)`,
    /// not an error.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Stores `value` at `key`, overwriting any existing entry wholesale.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Deletes `key`. Deleting an absent key is not an error.
    fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Lists keys starting with `prefix`, in lexicographic order, with the
    /// prefix stripped.
    fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

/// In-memory [`Storage`] implementation for tests and development.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    data: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStorage {
    /// Creates an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.data.write().insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.data.write().remove(key);
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let data = self.data.read();
        let keys = data
            .range(prefix.to_owned()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key[prefix.len()..].to_owned())
            .collect();
        Ok(keys)
    }
}

/// Persistent role entry: one signing algorithm, one key, and three optional
/// default claim values.
///
/// The on-disk encoding is a JSON object with exactly the keys `algorithm`,
/// `key`, `iss`, `sub` and `aud`. `Debug` output never contains the key.
#[derive(Clone, Serialize, Deserialize)]
pub struct Role {
    /// The JWS algorithm tokens issued against this role are signed with.
    pub algorithm: JwsAlgorithm,
    /// Signing key material, interpreted per the algorithm family.
    pub key: String,
    /// Default `iss` claim; empty means no default.
    #[serde(rename = "iss")]
    pub issuer: String,
    /// Default `sub` claim; empty means no default.
    #[serde(rename = "sub")]
    pub subject: String,
    /// Default `aud` claim; empty means no default.
    #[serde(rename = "aud")]
    pub audience: String,
}

impl fmt::Debug for Role {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Role")
            .field("algorithm", &self.algorithm)
            .field("key", &"_")
            .field("issuer", &self.issuer)
            .field("subject", &self.subject)
            .field("audience", &self.audience)
            .finish()
    }
}

/// Public projection of a [`Role`]: every attribute except the key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleView {
    /// The configured algorithm.
    pub algorithm: JwsAlgorithm,
    /// Default `iss` claim.
    #[serde(rename = "iss")]
    pub issuer: String,
    /// Default `sub` claim.
    #[serde(rename = "sub")]
    pub subject: String,
    /// Default `aud` claim.
    #[serde(rename = "aud")]
    pub audience: String,
}

impl From<Role> for RoleView {
    fn from(role: Role) -> Self {
        Self {
            algorithm: role.algorithm,
            issuer: role.issuer,
            subject: role.subject,
            audience: role.audience,
        }
    }
}

/// Unvalidated input for a role write. `Debug` output never contains the key.
#[derive(Clone, Default)]
pub struct RoleConfig {
    /// Requested algorithm identifier.
    pub algorithm: String,
    /// Raw key material.
    pub key: String,
    /// Default `iss` claim.
    pub issuer: String,
    /// Default `sub` claim.
    pub subject: String,
    /// Default `aud` claim.
    pub audience: String,
}

impl fmt::Debug for RoleConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RoleConfig")
            .field("algorithm", &self.algorithm)
            .field("key", &"_")
            .field("issuer", &self.issuer)
            .field("subject", &self.subject)
            .field("audience", &self.audience)
            .finish()
    }
}

/// Validating facade over [`Storage`] for role entries.
///
/// Key material is validated against the algorithm family on write, so that
/// invalid configuration is rejected at the earliest point; after a
/// successful write the signing path may assume the role is internally
/// consistent. Reads are always fresh; there is no caching layer.
#[derive(Clone, Copy)]
pub struct RoleStore<'a> {
    storage: &'a dyn Storage,
}

impl<'a> RoleStore<'a> {
    /// Creates a store over the given storage handle.
    pub fn new(storage: &'a dyn Storage) -> Self {
        Self { storage }
    }

    fn storage_key(name: &str) -> String {
        format!("{STORAGE_PREFIX}{name}")
    }

    /// Validates `config` and persists it under `name`, overwriting any
    /// existing entry wholesale.
    ///
    /// Fails with [`StoreError::BadAlgorithm`] for an unrecognized algorithm,
    /// [`StoreError::MissingKey`] for empty key material and
    /// [`StoreError::KeyFormat`] when the key does not match the algorithm
    /// family. Storage failures are not retried here; the hosting layer
    /// retries at a higher level.
    pub fn put(&self, name: &str, config: &RoleConfig) -> Result<(), StoreError> {
        let algorithm = JwsAlgorithm::from_name(&config.algorithm)
            .ok_or_else(|| StoreError::BadAlgorithm(config.algorithm.clone()))?;
        if config.key.is_empty() {
            return Err(StoreError::MissingKey);
        }
        algorithm
            .signing_key(&config.key)
            .map_err(|source| StoreError::KeyFormat { algorithm, source })?;

        let role = Role {
            algorithm,
            key: config.key.clone(),
            issuer: config.issuer.clone(),
            subject: config.subject.clone(),
            audience: config.audience.clone(),
        };
        let bytes = serde_json::to_vec(&role).map_err(StoreError::Encoding)?;
        self.storage
            .put(&Self::storage_key(name), &bytes)
            .map_err(|err| {
                warn!(role = name, %err, "role write failed");
                err
            })?;
        debug!(role = name, algorithm = algorithm.name(), "wrote role entry");
        Ok(())
    }

    /// Loads the full role entry, key included. A missing role yields
    /// `Ok(None)`.
    pub fn get(&self, name: &str) -> Result<Option<Role>, StoreError> {
        let Some(bytes) = self.storage.get(&Self::storage_key(name))? else {
            return Ok(None);
        };
        let role = serde_json::from_slice(&bytes).map_err(|source| StoreError::Corrupt {
            name: name.to_owned(),
            source,
        })?;
        Ok(Some(role))
    }

    /// Loads the public projection of a role. The key attribute is never
    /// part of it.
    pub fn get_public_view(&self, name: &str) -> Result<Option<RoleView>, StoreError> {
        Ok(self.get(name)?.map(RoleView::from))
    }

    /// Deletes the role entry. Deleting an absent role succeeds.
    pub fn delete(&self, name: &str) -> Result<(), StoreError> {
        self.storage.delete(&Self::storage_key(name))?;
        debug!(role = name, "deleted role entry");
        Ok(())
    }

    /// Lists the names of all stored roles, sorted.
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.storage.list(STORAGE_PREFIX)?)
    }
}

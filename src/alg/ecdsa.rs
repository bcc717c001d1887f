//! `ES*` signing: ECDSA on the NIST curves with curve-matched SHA-2 digests.
//!
//! Signatures use the fixed-size `r || s` encoding required by JWS (64, 96
//! and 132 bytes for P-256, P-384 and P-521 respectively).

use p256::ecdsa::signature::Signer as _;

use super::KeyInner;
use crate::error::KeyError;

const PEM_MARKER: &str = "EC PRIVATE KEY";

fn check_marker(pem: &str) -> Result<(), KeyError> {
    if pem.contains(PEM_MARKER) {
        Ok(())
    } else {
        Err(KeyError::MissingMarker { marker: PEM_MARKER })
    }
}

/// Validates a PEM-encoded SEC1 private key on P-256 (for `ES256`).
pub(super) fn signing_key_p256(pem: &str) -> Result<KeyInner, KeyError> {
    check_marker(pem)?;
    let secret = p256::SecretKey::from_sec1_pem(pem)
        .map_err(|err| KeyError::Malformed(anyhow::anyhow!(err)))?;
    Ok(KeyInner::P256(Box::new(p256::ecdsa::SigningKey::from(
        &secret,
    ))))
}

/// Validates a PEM-encoded SEC1 private key on P-384 (for `ES384`).
pub(super) fn signing_key_p384(pem: &str) -> Result<KeyInner, KeyError> {
    check_marker(pem)?;
    let secret = p384::SecretKey::from_sec1_pem(pem)
        .map_err(|err| KeyError::Malformed(anyhow::anyhow!(err)))?;
    Ok(KeyInner::P384(Box::new(p384::ecdsa::SigningKey::from(
        &secret,
    ))))
}

/// Validates a PEM-encoded SEC1 private key on P-521 (for `ES512`).
pub(super) fn signing_key_p521(pem: &str) -> Result<KeyInner, KeyError> {
    check_marker(pem)?;
    let secret = p521::SecretKey::from_sec1_pem(pem)
        .map_err(|err| KeyError::Malformed(anyhow::anyhow!(err)))?;
    Ok(KeyInner::P521(Box::new(
        p521::ecdsa::SigningKey::from_bytes(&secret.to_bytes())
            .map_err(|err| KeyError::Malformed(anyhow::anyhow!(err)))?,
    )))
}

pub(super) fn sign_p256(key: &p256::ecdsa::SigningKey, message: &[u8]) -> anyhow::Result<Vec<u8>> {
    let signature: p256::ecdsa::Signature =
        key.try_sign(message).map_err(|err| anyhow::anyhow!(err))?;
    Ok(signature.to_bytes().to_vec())
}

pub(super) fn sign_p384(key: &p384::ecdsa::SigningKey, message: &[u8]) -> anyhow::Result<Vec<u8>> {
    let signature: p384::ecdsa::Signature =
        key.try_sign(message).map_err(|err| anyhow::anyhow!(err))?;
    Ok(signature.to_bytes().to_vec())
}

pub(super) fn sign_p521(key: &p521::ecdsa::SigningKey, message: &[u8]) -> anyhow::Result<Vec<u8>> {
    let signature: p521::ecdsa::Signature =
        key.try_sign(message).map_err(|err| anyhow::anyhow!(err))?;
    Ok(signature.to_bytes().to_vec())
}

//! `RS*` signing: RSASSA-PKCS1-v1_5 with SHA-2 digests.

use rsa::{
    pkcs1::DecodeRsaPrivateKey,
    pkcs1v15::SigningKey,
    signature::{SignatureEncoding, Signer},
    RsaPrivateKey,
};
use sha2::{Sha256, Sha384, Sha512};

use super::{HashAlg, KeyInner};
use crate::error::KeyError;

const PEM_MARKER: &str = "RSA PRIVATE KEY";

/// Validates a PEM-encoded PKCS#1 private key for an `RS*` algorithm.
pub(super) fn signing_key(pem: &str, hash: HashAlg) -> Result<KeyInner, KeyError> {
    if !pem.contains(PEM_MARKER) {
        return Err(KeyError::MissingMarker { marker: PEM_MARKER });
    }
    let key = RsaPrivateKey::from_pkcs1_pem(pem)
        .map_err(|err| KeyError::Malformed(anyhow::anyhow!(err)))?;
    Ok(KeyInner::Rsa(Box::new(key), hash))
}

pub(super) fn sign(key: &RsaPrivateKey, hash: HashAlg, message: &[u8]) -> anyhow::Result<Vec<u8>> {
    let signature = match hash {
        HashAlg::Sha256 => SigningKey::<Sha256>::new(key.clone())
            .try_sign(message)
            .map_err(|err| anyhow::anyhow!(err))?
            .to_vec(),
        HashAlg::Sha384 => SigningKey::<Sha384>::new(key.clone())
            .try_sign(message)
            .map_err(|err| anyhow::anyhow!(err))?
            .to_vec(),
        HashAlg::Sha512 => SigningKey::<Sha512>::new(key.clone())
            .try_sign(message)
            .map_err(|err| anyhow::anyhow!(err))?
            .to_vec(),
    };
    Ok(signature)
}

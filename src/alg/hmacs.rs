//! HMAC signing for the `HS*` family.

use hmac::{Hmac, Mac};
use sha2::{Sha256, Sha384, Sha512};
use smallvec::SmallVec;
use zeroize::Zeroize;

use std::fmt;

use super::HashAlg;

/// Key for the `HS*` algorithms. Zeroed on drop.
///
/// The configured key string is used verbatim as the HMAC key; any non-empty
/// value is accepted. No minimum length is enforced: RFC 7518 recommends at
/// least the hash output size, but rejecting shorter keys would break roles
/// that were previously valid.
#[derive(Clone)]
pub struct HmacKey(SmallVec<[u8; 64]>);

impl fmt::Debug for HmacKey {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_tuple("HmacKey").field(&"_").finish()
    }
}

impl HmacKey {
    /// Creates a key from the specified `bytes`.
    pub fn new(bytes: impl AsRef<[u8]>) -> Self {
        Self(bytes.as_ref().into())
    }
}

impl From<&[u8]> for HmacKey {
    fn from(bytes: &[u8]) -> Self {
        Self(bytes.into())
    }
}

impl AsRef<[u8]> for HmacKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Drop for HmacKey {
    fn drop(&mut self) {
        self.0.as_mut_slice().zeroize();
    }
}

pub(super) fn sign(key: &HmacKey, hash: HashAlg, message: &[u8]) -> Vec<u8> {
    match hash {
        HashAlg::Sha256 => {
            let mut mac = Hmac::<Sha256>::new_from_slice(key.as_ref())
                .expect("HMACs work with any key size");
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        HashAlg::Sha384 => {
            let mut mac = Hmac::<Sha384>::new_from_slice(key.as_ref())
                .expect("HMACs work with any key size");
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
        HashAlg::Sha512 => {
            let mut mac = Hmac::<Sha512>::new_from_slice(key.as_ref())
                .expect("HMACs work with any key size");
            mac.update(message);
            mac.finalize().into_bytes().to_vec()
        }
    }
}

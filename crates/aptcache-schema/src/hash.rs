//! Cache key digest newtype.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Raw bytes that are not the length of a SHA-256 digest.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Invalid SHA256 digest: expected 32 bytes, got {0}")]
pub struct DigestLengthError(pub usize);

/// SHA-256 digest of a cache key's plaintext.
///
/// Stored on disk as the raw 32 bytes; displayed and serialized as lowercase
/// hex so it can double as a content address in the shared cache store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyDigest([u8; 32]);

impl KeyDigest {
    /// Digest length in bytes.
    pub const LEN: usize = 32;

    /// Wrap an already computed digest.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Validate and copy a digest read back from storage.
    ///
    /// # Errors
    ///
    /// Returns [`DigestLengthError`] if `bytes` is not exactly 32 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DigestLengthError> {
        <[u8; 32]>::try_from(bytes)
            .map(Self)
            .map_err(|_| DigestLengthError(bytes.len()))
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering (64 characters).
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl AsRef<[u8]> for KeyDigest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for KeyDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl Serialize for KeyDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for KeyDigest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let bytes = hex::decode(&s).map_err(serde::de::Error::custom)?;
        Self::from_slice(&bytes).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_slice_rejects_wrong_length() {
        assert_eq!(KeyDigest::from_slice(&[0u8; 16]), Err(DigestLengthError(16)));
        assert_eq!(KeyDigest::from_slice(&[]), Err(DigestLengthError(0)));
        assert!(KeyDigest::from_slice(&[7u8; 32]).is_ok());
    }

    #[test]
    fn hex_roundtrip_through_json() {
        let digest = KeyDigest::new([0xab; 32]);
        assert_eq!(digest.to_string().len(), 64);

        let json = serde_json::to_string(&digest).unwrap();
        let back: KeyDigest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, digest);
    }

    #[test]
    fn deserialize_rejects_short_hex() {
        let result: Result<KeyDigest, _> = serde_json::from_str("\"abcd\"");
        assert!(result.is_err());
    }
}

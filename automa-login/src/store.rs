//! Credential store keeping SHA-256 digests of the secrets, never the secrets themselves.

use automa::retry::CredentialStore;
use hashbrown::HashMap;
use sha2::{Digest, Sha256};

/// SHA-256 of a secret.
pub type SecretDigest = [u8; 32];

/// Hashes `secret` the way [`HashedStore`] compares it.
pub fn digest(secret: &str) -> SecretDigest {
    Sha256::digest(secret.as_bytes()).into()
}

/// Identifier to secret digest. Every secret handed to [`CredentialStore::verify`] is hashed before the compare.
#[derive(Debug, Clone, Default)]
pub struct HashedStore {
    digests: HashMap<String, SecretDigest>,
}

impl HashedStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hashes `secret` and stores the digest under `identifier`, replacing any previous entry.
    pub fn insert(&mut self, identifier: impl Into<String>, secret: &str) {
        self.insert_digest(identifier, digest(secret));
    }

    /// Stores an already computed digest.
    pub fn insert_digest(&mut self, identifier: impl Into<String>, digest: SecretDigest) {
        self.digests.insert(identifier.into(), digest);
    }

    /// Number of identifiers.
    pub fn len(&self) -> usize {
        self.digests.len()
    }

    /// Returns if no identifier is stored.
    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}

impl<I: Into<String>> FromIterator<(I, SecretDigest)> for HashedStore {
    fn from_iter<T: IntoIterator<Item = (I, SecretDigest)>>(iter: T) -> Self {
        let mut store = Self::new();
        for (identifier, digest) in iter {
            store.insert_digest(identifier, digest);
        }
        store
    }
}

impl CredentialStore for HashedStore {
    fn knows(&self, identifier: &str) -> bool {
        self.digests.contains_key(identifier)
    }

    fn verify(&self, identifier: &str, secret: &str) -> bool {
        self.digests.get(identifier).is_some_and(|expected| *expected == digest(secret))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn hex(digest: &SecretDigest) -> String {
        digest.iter().map(|b| format!("{b:02x}")).collect()
    }

    #[test]
    fn test_digest_is_sha256() {
        assert_eq!(
            hex(&digest("abc")),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(
            hex(&digest("")),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_verify_hashes_the_attempt() {
        let mut store = HashedStore::new();
        store.insert("alice", "wonderland");

        assert!(store.knows("alice"));
        assert!(store.verify("alice", "wonderland"));
        assert!(!store.verify("alice", "Wonderland"));
        assert!(!store.verify("mallory", "wonderland"));
        // knowing the stored digest is not enough
        assert!(!store.verify("alice", &hex(&digest("wonderland"))));
    }

    #[test]
    fn test_plaintext_entry_does_not_verify() {
        // a plaintext secret stored where a digest belongs
        let mut raw = [0u8; 32];
        raw[..7].copy_from_slice(b"builder");
        let store: HashedStore = [("bob", raw)].into_iter().collect();

        assert!(store.knows("bob"));
        assert!(!store.verify("bob", "builder"));
    }

    #[test]
    fn test_from_digests() {
        let store: HashedStore = [("alice", digest("wonderland")), ("bob", digest("builder"))]
            .into_iter()
            .collect();
        assert_eq!(store.len(), 2);
        assert!(store.verify("bob", "builder"));
        assert!(!store.verify("bob", "wonderland"));
    }
}

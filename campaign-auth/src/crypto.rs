//! AES-256-GCM sealing for campaign tokens and state-transfer cookies.
//!
//! A `Cipher` is built from a raw 32-byte secret, from which it derives one subkey for
//! encryption and another for naming. Sealed values are the random 12-byte nonce followed by
//! the ciphertext and tag, encoded as unpadded URL-safe base64 so they can travel in query
//! strings and cookie values without further escaping.

use aes_gcm::{
    aead::{Aead, KeyInit, Payload},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64, Engine};
use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;

use crate::error::{crypto_error, CryptoErrorKind, Error, ErrorKind};

type HmacSha256 = Hmac<Sha256>;

/// Required secret length in bytes.
pub const KEY_SIZE: usize = 32;

/// 12-byte nonce size for AES-GCM
const NONCE_SIZE: usize = 12;

/// 16-byte authentication tag appended by AES-GCM
const TAG_SIZE: usize = 16;

/// Hex characters kept from the HMAC when deriving a cookie name.
const DERIVED_NAME_LEN: usize = 24;

const ENCRYPTION_LABEL: &[u8] = b"enc";
const NAMING_LABEL: &[u8] = b"name";

fn decryption_err() -> Error {
    Error {
        source: None,
        error_kind: ErrorKind::Crypto(CryptoErrorKind::DecryptionFailed),
    }
}

/// Symmetric cipher shared by everything that seals campaign state.
#[derive(Clone)]
pub struct Cipher {
    aead: Aes256Gcm,
    mac: HmacSha256,
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Cipher { .. }")
    }
}

impl Cipher {
    /// Create a cipher from a secret that must be exactly `KEY_SIZE` bytes long.
    pub fn new(secret: &[u8]) -> Result<Self, Error> {
        if secret.len() != KEY_SIZE {
            return Err(crypto_error(
                CryptoErrorKind::InvalidKey,
                "secret must be exactly 32 bytes",
            ));
        }

        let aead = <Aes256Gcm as KeyInit>::new_from_slice(&subkey(secret, ENCRYPTION_LABEL)?)
            .map_err(|_| crypto_error(CryptoErrorKind::InvalidKey, "invalid AES key"))?;
        let mac = <HmacSha256 as Mac>::new_from_slice(&subkey(secret, NAMING_LABEL)?)
            .map_err(|_| crypto_error(CryptoErrorKind::InvalidKey, "invalid HMAC key"))?;

        Ok(Self { aead, mac })
    }

    /// Encrypts plaintext with a fresh random nonce.
    ///
    /// Sealing the same plaintext twice yields two different outputs.
    pub fn seal(&self, plaintext: &str) -> Result<String, Error> {
        self.seal_bound(plaintext, "")
    }

    /// Like `seal`, but the value only opens again under the same `context`.
    pub fn seal_bound(&self, plaintext: &str, context: &str) -> Result<String, Error> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let payload = Payload {
            msg: plaintext.as_bytes(),
            aad: context.as_bytes(),
        };
        let ciphertext = self
            .aead
            .encrypt(nonce, payload)
            .map_err(|_| crypto_error(CryptoErrorKind::EncryptionFailed, "AES-GCM seal failed"))?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend(ciphertext);

        Ok(BASE64.encode(combined))
    }

    /// Decrypts a value produced by `seal`.
    ///
    /// Fails closed: a forged, truncated or foreign-key value is always an error.
    pub fn open(&self, sealed: &str) -> Result<String, Error> {
        self.open_bound(sealed, "")
    }

    /// Opens a value produced by `seal_bound` with the same `context`.
    pub fn open_bound(&self, sealed: &str, context: &str) -> Result<String, Error> {
        let combined = BASE64.decode(sealed).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::Crypto(CryptoErrorKind::DecryptionFailed),
        })?;

        if combined.len() < NONCE_SIZE + TAG_SIZE {
            return Err(decryption_err());
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_SIZE);
        let nonce = Nonce::from_slice(nonce_bytes);

        let payload = Payload {
            msg: ciphertext,
            aad: context.as_bytes(),
        };
        let plaintext_bytes = self
            .aead
            .decrypt(nonce, payload)
            .map_err(|_| decryption_err())?;

        String::from_utf8(plaintext_bytes).map_err(|e| Error {
            source: Some(Box::new(e)),
            error_kind: ErrorKind::Crypto(CryptoErrorKind::DecryptionFailed),
        })
    }

    /// Deterministically maps a logical name onto an opaque one.
    ///
    /// Two ciphers built from the same secret derive the same name, so a reader can find
    /// what a writer stored without either side exposing the logical name.
    pub fn derive_name(&self, logical: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(logical.as_bytes());
        let mut name = hex::encode(mac.finalize().into_bytes());
        name.truncate(DERIVED_NAME_LEN);
        name
    }
}

/// HMAC-SHA256 of `label` under the configured secret.
fn subkey(secret: &[u8], label: &[u8]) -> Result<[u8; KEY_SIZE], Error> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret)
        .map_err(|_| crypto_error(CryptoErrorKind::InvalidKey, "invalid HMAC key"))?;
    mac.update(label);
    Ok(mac.finalize().into_bytes().into())
}

/// Generate a cryptographically random token, hex encoded.
pub fn random_token() -> String {
    let random_bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(random_bytes)
}

/// HMAC-SHA256 of `payload` keyed by `secret`, hex encoded.
pub fn sign_hex(secret: &str, payload: &[u8]) -> Result<String, Error> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .map_err(|_| crypto_error(CryptoErrorKind::InvalidKey, "invalid HMAC key"))?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Compares two strings in constant time.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &[u8] = b"123456789_123456789_123456789_12";
    const OTHER_SECRET: &[u8] = b"abcdefghij_abcdefghij_abcdefghij";

    fn cipher() -> Cipher {
        Cipher::new(TEST_SECRET).unwrap()
    }

    fn is_decryption_failure(result: Result<String, Error>) -> bool {
        matches!(
            result,
            Err(Error {
                error_kind: ErrorKind::Crypto(CryptoErrorKind::DecryptionFailed),
                ..
            })
        )
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let plaintext = "Hello World";
        let sealed = cipher().seal(plaintext).expect("seal should succeed");
        assert_ne!(sealed, plaintext);
        let opened = cipher().open(&sealed).expect("open should succeed");
        assert_eq!(opened, plaintext);
    }

    #[test]
    fn test_seal_produces_different_outputs() {
        let c = cipher();
        let first = c.seal("same input").unwrap();
        let second = c.seal("same input").unwrap();
        assert_ne!(first, second);
        assert_eq!(c.open(&first).unwrap(), "same input");
        assert_eq!(c.open(&second).unwrap(), "same input");
    }

    #[test]
    fn test_wrong_secret_fails_closed() {
        let sealed = cipher().seal("secret").unwrap();
        let other = Cipher::new(OTHER_SECRET).unwrap();
        assert!(is_decryption_failure(other.open(&sealed)));
    }

    #[test]
    fn test_every_flipped_byte_is_rejected() {
        let c = cipher();
        let sealed = c.seal("list-1|Google").unwrap();
        let raw = BASE64.decode(&sealed).unwrap();

        for i in 0..raw.len() {
            let mut tampered = raw.clone();
            tampered[i] ^= 0x01;
            let result = c.open(&BASE64.encode(&tampered));
            assert!(is_decryption_failure(result), "byte {i} was not detected");
        }
    }

    #[test]
    fn test_context_binds_the_sealed_value() {
        let c = cipher();
        let sealed = c.seal_bound("list-1", "emailListId").unwrap();
        assert_eq!(c.open_bound(&sealed, "emailListId").unwrap(), "list-1");
        assert!(is_decryption_failure(c.open_bound(&sealed, "redirectUrl")));
        assert!(is_decryption_failure(c.open(&sealed)));
    }

    #[test]
    fn test_raw_secret_is_not_the_encryption_key() {
        let raw = <Aes256Gcm as KeyInit>::new_from_slice(TEST_SECRET).unwrap();
        let nonce_bytes = [7u8; NONCE_SIZE];
        let mut combined = nonce_bytes.to_vec();
        combined.extend(
            raw.encrypt(Nonce::from_slice(&nonce_bytes), b"list-1".as_ref())
                .unwrap(),
        );
        assert!(is_decryption_failure(cipher().open(&BASE64.encode(combined))));
    }

    #[test]
    fn test_subkeys_differ_per_label() {
        let enc = subkey(TEST_SECRET, ENCRYPTION_LABEL).unwrap();
        let name = subkey(TEST_SECRET, NAMING_LABEL).unwrap();
        assert_ne!(enc, name);
        assert_ne!(&enc[..], TEST_SECRET);
    }

    #[test]
    fn test_invalid_base64_is_rejected() {
        assert!(is_decryption_failure(cipher().open("not_valid_base64!!!")));
    }

    #[test]
    fn test_too_short_is_rejected() {
        assert!(is_decryption_failure(cipher().open("YWJj")));
    }

    #[test]
    fn test_invalid_key_length() {
        let result = Cipher::new(b"short");
        assert!(matches!(
            result,
            Err(Error {
                error_kind: ErrorKind::Crypto(CryptoErrorKind::InvalidKey),
                ..
            })
        ));
    }

    #[test]
    fn test_derive_name_is_deterministic_per_secret() {
        let a = cipher().derive_name("listId");
        let b = cipher().derive_name("listId");
        let other = Cipher::new(OTHER_SECRET).unwrap().derive_name("listId");

        assert_eq!(a, b);
        assert_ne!(a, other);
        assert_ne!(a, cipher().derive_name("redirectUrl"));
        assert_eq!(a.len(), DERIVED_NAME_LEN);
        assert!(!a.contains("listId"));
    }

    #[test]
    fn test_unicode_plaintext() {
        let plaintext = "Ada Lovelace 🔐 ✓";
        let sealed = cipher().seal(plaintext).unwrap();
        assert_eq!(cipher().open(&sealed).unwrap(), plaintext);
    }

    #[test]
    fn test_random_token_is_fresh() {
        let first = random_token();
        assert_eq!(first.len(), 64); // 32 bytes hex encoded
        assert_ne!(first, random_token());
    }

    #[test]
    fn test_sign_hex_matches_known_vector() {
        // RFC 4231 test case 2
        let signature = sign_hex("Jefe", b"what do ya want for nothing?").unwrap();
        assert_eq!(
            signature,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("abc", "abc"));
        assert!(!constant_time_eq("abc", "abd"));
        assert!(!constant_time_eq("abc", "abcd"));
        assert!(constant_time_eq("", ""));
    }
}

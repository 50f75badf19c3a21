//! Decryption of secret files
//!
//! The [`Decryptor`] trait is the seam between the secret loader and whatever
//! understands the encrypted format. [`EjsonDecryptor`] implements it for
//! [ejson](https://github.com/Shopify/ejson) documents: a JSON object carrying
//! a `_public_key` and string values boxed as
//! `EJ[1:<ephemeral public key>:<nonce>:<ciphertext>]` (base64 parts,
//! curve25519-xsalsa20-poly1305).

use base64::Engine as _;
use crypto_box::aead::Aead;
use crypto_box::aead::generic_array::GenericArray;
use crypto_box::{PublicKey, SalsaBox, SecretKey};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use crate::error::{CoreError, Result};

/// Metadata key naming the public key a document was encrypted for
pub const PUBLIC_KEY_FIELD: &str = "_public_key";

const KEY_SIZE: usize = 32;
const NONCE_SIZE: usize = 24;
const BOX_PREFIX: &str = "EJ[1:";

/// Something able to tell encrypted content apart and decrypt it
pub trait Decryptor {
    /// Checks if given content is encrypted in the format this decryptor reads
    fn is_encrypted(&self, data: &[u8]) -> Result<bool>;

    /// Decrypts content into key/value pairs
    fn decrypt(&self, data: &[u8]) -> Result<Map<String, JsonValue>>;
}

/// Behaviour shared by decryptors
#[derive(Debug, Clone, Copy, Default)]
pub struct DecryptorConfig {
    /// Return values still encrypted; metadata is stripped by the caller anyway
    pub skip_decrypt: bool,
}

/// ejson decryptor backed by explicit keys and key directories
pub struct EjsonDecryptor {
    config: DecryptorConfig,
    key_dirs: Vec<PathBuf>,
    keys: HashMap<String, [u8; KEY_SIZE]>,
}

impl fmt::Debug for EjsonDecryptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EjsonDecryptor")
            .field("config", &self.config)
            .field("key_dirs", &self.key_dirs)
            .field("keys", &self.keys.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl EjsonDecryptor {
    /// Create a decryptor
    ///
    /// `private_keys` are hex encoded curve25519 private keys. A malformed key
    /// is an error: the caller asked for it explicitly.
    pub fn new(
        config: DecryptorConfig,
        key_dirs: Vec<PathBuf>,
        private_keys: &[String],
    ) -> Result<Self> {
        let mut keys = HashMap::new();

        for (idx, key) in private_keys.iter().enumerate() {
            let bytes = decode_key(key.trim()).map_err(|message| CoreError::DecryptorInit {
                message: format!("ejson key #{} is invalid: {}", idx + 1, message),
            })?;
            let public = SecretKey::from(bytes).public_key();
            keys.insert(hex::encode(public.as_bytes()), bytes);
        }

        tracing::debug!(
            explicit_keys = keys.len(),
            key_dirs = ?key_dirs,
            skip_decrypt = config.skip_decrypt,
            "initialized ejson decryptor"
        );

        Ok(Self {
            config,
            key_dirs,
            keys,
        })
    }

    /// Find the private key for a public key, explicit keys first
    fn private_key(&self, public_key: &str) -> Result<[u8; KEY_SIZE]> {
        if let Some(key) = self.keys.get(public_key) {
            return Ok(*key);
        }

        for dir in &self.key_dirs {
            let path = dir.join(public_key);
            if !path.is_file() {
                continue;
            }
            let content = std::fs::read_to_string(&path).map_err(|e| CoreError::io(&path, e))?;
            return decode_key(content.trim()).map_err(|message| {
                CoreError::decrypt(format!("key file {} is invalid: {}", path.display(), message))
            });
        }

        Err(CoreError::decrypt(format!(
            "no private key found for public key {}",
            public_key
        )))
    }

    fn decrypt_map(&self, map: Map<String, JsonValue>, sbox: &Opener) -> Result<Map<String, JsonValue>> {
        map.into_iter()
            .map(|(key, value)| {
                if key.starts_with('_') {
                    Ok((key, value))
                } else {
                    Ok((key, self.decrypt_value(value, sbox)?))
                }
            })
            .collect()
    }

    fn decrypt_value(&self, value: JsonValue, sbox: &Opener) -> Result<JsonValue> {
        match value {
            JsonValue::String(s) if s.starts_with(BOX_PREFIX) => {
                Ok(JsonValue::String(sbox.open(&s)?))
            }
            JsonValue::Object(map) => Ok(JsonValue::Object(self.decrypt_map(map, sbox)?)),
            JsonValue::Array(items) => items
                .into_iter()
                .map(|item| self.decrypt_value(item, sbox))
                .collect::<Result<Vec<_>>>()
                .map(JsonValue::Array),
            other => Ok(other),
        }
    }
}

impl Decryptor for EjsonDecryptor {
    fn is_encrypted(&self, data: &[u8]) -> Result<bool> {
        let doc = parse_document(data)?;
        Ok(doc
            .get(PUBLIC_KEY_FIELD)
            .and_then(JsonValue::as_str)
            .is_some_and(is_public_key))
    }

    fn decrypt(&self, data: &[u8]) -> Result<Map<String, JsonValue>> {
        let doc = parse_document(data)?;
        if self.config.skip_decrypt {
            return Ok(doc);
        }

        let public_key = doc
            .get(PUBLIC_KEY_FIELD)
            .and_then(JsonValue::as_str)
            .filter(|k| is_public_key(k))
            .ok_or_else(|| CoreError::decrypt(format!("missing or invalid {}", PUBLIC_KEY_FIELD)))?
            .to_string();

        let opener = Opener {
            private_key: self.private_key(&public_key)?,
        };
        self.decrypt_map(doc, &opener)
    }
}

/// Opens boxed values with one private key
struct Opener {
    private_key: [u8; KEY_SIZE],
}

impl Opener {
    fn open(&self, boxed: &str) -> Result<String> {
        let inner = boxed
            .strip_prefix(BOX_PREFIX)
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(|| CoreError::decrypt("malformed boxed value"))?;

        let parts: Vec<&str> = inner.split(':').collect();
        let [ephemeral, nonce, ciphertext] = parts.as_slice() else {
            return Err(CoreError::decrypt("malformed boxed value"));
        };

        let ephemeral: [u8; KEY_SIZE] = b64(ephemeral)?
            .try_into()
            .map_err(|_| CoreError::decrypt("boxed value has an invalid public key"))?;
        let nonce = b64(nonce)?;
        if nonce.len() != NONCE_SIZE {
            return Err(CoreError::decrypt("boxed value has an invalid nonce"));
        }
        let ciphertext = b64(ciphertext)?;

        let sbox = SalsaBox::new(
            &PublicKey::from(ephemeral),
            &SecretKey::from(self.private_key),
        );
        let plaintext = sbox
            .decrypt(GenericArray::from_slice(&nonce), ciphertext.as_slice())
            .map_err(|_| CoreError::decrypt("could not open boxed value (wrong key?)"))?;

        String::from_utf8(plaintext)
            .map_err(|e| CoreError::decrypt(format!("decrypted value is not UTF-8: {}", e)))
    }
}

/// Parse a secret document as JSON, falling back to YAML
pub fn parse_document(data: &[u8]) -> Result<Map<String, JsonValue>> {
    let value: JsonValue = match serde_json::from_slice(data) {
        Ok(value) => value,
        Err(json_err) => serde_yaml::from_slice(data).map_err(|_| CoreError::JsonParse(json_err))?,
    };

    match value {
        JsonValue::Object(map) => Ok(map),
        _ => Err(CoreError::decrypt("secret document is not a mapping")),
    }
}

fn is_public_key(s: &str) -> bool {
    s.len() == KEY_SIZE * 2 && s.chars().all(|c| c.is_ascii_hexdigit())
}

fn decode_key(s: &str) -> std::result::Result<[u8; KEY_SIZE], String> {
    let bytes = hex::decode(s).map_err(|e| e.to_string())?;
    bytes
        .try_into()
        .map_err(|b: Vec<u8>| format!("expected {} bytes, got {}", KEY_SIZE, b.len()))
}

fn b64(s: &str) -> Result<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(s)
        .map_err(|e| CoreError::decrypt(format!("base64 decode error: {}", e)))
}

/// Test helper: box a plaintext for `public_key` the way ejson does
#[cfg(test)]
pub(crate) fn seal(public_key: &[u8; KEY_SIZE], plaintext: &str) -> String {
    let ephemeral = SecretKey::from([9u8; KEY_SIZE]);
    let nonce = [1u8; NONCE_SIZE];
    let sbox = SalsaBox::new(&PublicKey::from(*public_key), &ephemeral);
    let ciphertext = sbox
        .encrypt(GenericArray::from_slice(&nonce), plaintext.as_bytes())
        .unwrap();
    let engine = base64::engine::general_purpose::STANDARD;
    format!(
        "{}{}:{}:{}]",
        BOX_PREFIX,
        engine.encode(ephemeral.public_key().as_bytes()),
        engine.encode(nonce),
        engine.encode(ciphertext)
    )
}

/// Test helper: a fixed key pair as (public hex, private hex, public bytes)
#[cfg(test)]
pub(crate) fn test_keypair() -> (String, String, [u8; KEY_SIZE]) {
    let private = [5u8; KEY_SIZE];
    let public = *SecretKey::from(private).public_key().as_bytes();
    (hex::encode(public), hex::encode(private), public)
}

use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::errors::{Result, ZvaultError};
use crate::models::EncryptedBlob;

pub const KEY_LEN: usize = 32;
pub const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;

pub type SecretKey = Zeroizing<[u8; KEY_LEN]>;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost: 19 * 1024,
            t_cost: 2,
            p_cost: 1,
        }
    }
}

pub fn derive_key(password: &str, salt: &[u8], params: KdfParams) -> Result<SecretKey> {
    let params = Params::new(params.m_cost, params.t_cost, params.p_cost, Some(KEY_LEN))
        .map_err(|e| ZvaultError::Crypto(format!("invalid Argon2 params: {e}")))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    argon2
        .hash_password_into(password.as_bytes(), salt, key.as_mut())
        .map_err(|e| ZvaultError::Crypto(format!("key derivation failed: {e}")))?;
    Ok(key)
}

pub fn random_key() -> SecretKey {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    OsRng.fill_bytes(key.as_mut());
    key
}

pub fn random_salt() -> [u8; SALT_LEN] {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    salt
}

pub fn encrypt_with_key(key: &[u8; KEY_LEN], plaintext: &[u8]) -> Result<EncryptedBlob> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| ZvaultError::Crypto(format!("encryption failed: {e}")))?;

    Ok(EncryptedBlob {
        nonce: b64().encode(nonce_bytes),
        data: b64().encode(ciphertext),
    })
}

/// AEAD failure means the key is wrong or the blob was tampered with;
/// both surface as [`ZvaultError::Authentication`].
pub fn decrypt_with_key(key: &[u8; KEY_LEN], blob: &EncryptedBlob) -> Result<Zeroizing<Vec<u8>>> {
    let nonce_bytes = decode(&blob.nonce)?;
    if nonce_bytes.len() != NONCE_LEN {
        return Err(ZvaultError::Storage("invalid nonce length".into()));
    }
    let ciphertext = decode(&blob.data)?;

    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
        .map(Zeroizing::new)
        .map_err(|_| ZvaultError::Authentication)
}

pub fn encode(bytes: &[u8]) -> String {
    b64().encode(bytes)
}

pub fn decode(text: &str) -> Result<Vec<u8>> {
    b64()
        .decode(text)
        .map_err(|e| ZvaultError::Storage(format!("invalid base64: {e}")))
}

fn b64() -> &'static base64::engine::GeneralPurpose {
    &base64::engine::general_purpose::STANDARD
}

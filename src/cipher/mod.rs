//! Symmetric encryption of credential bundles.
//!
//! Bundles are serialized to JSON, encrypted with AES-256-CBC under a random
//! 16-byte IV, and authenticated with HMAC-SHA256 (encrypt-then-MAC). The MAC
//! key is derived from the configured encryption key, so a single 32-byte
//! secret covers both.

pub mod bundle;
pub mod envelope;
pub mod error;

pub use bundle::CredentialBundle;
pub use envelope::Envelope;
pub use error::CipherError;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::config::SecurityConfig;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;
type HmacSha256 = Hmac<Sha256>;

pub const KEY_SIZE: usize = 32;
pub const IV_SIZE: usize = 16;
const BLOCK_SIZE: usize = 16;
const MAC_KEY_CONTEXT: &[u8] = b"dataport/credential-envelope/mac";

/// Encrypts and decrypts credential bundles with a process-wide static key
pub struct CredentialCipher {
    enc_key: Zeroizing<[u8; KEY_SIZE]>,
    mac_key: Zeroizing<[u8; KEY_SIZE]>,
}

impl CredentialCipher {
    pub fn new(key: [u8; KEY_SIZE]) -> Self {
        let enc_key = Zeroizing::new(key);

        let mut hasher = Sha256::new();
        hasher.update(MAC_KEY_CONTEXT);
        hasher.update(&*enc_key);
        let mut mac_key = Zeroizing::new([0u8; KEY_SIZE]);
        mac_key.copy_from_slice(&hasher.finalize());

        Self { enc_key, mac_key }
    }

    /// Accepts a raw 32-byte string or base64 of 32 bytes
    pub fn from_key_material(material: &str) -> Result<Self, CipherError> {
        let raw = material.as_bytes();
        if raw.len() == KEY_SIZE {
            let mut key = [0u8; KEY_SIZE];
            key.copy_from_slice(raw);
            return Ok(Self::new(key));
        }

        let decoded = Zeroizing::new(
            STANDARD
                .decode(material.trim())
                .map_err(|_| CipherError::InvalidKey(raw.len()))?,
        );
        if decoded.len() != KEY_SIZE {
            return Err(CipherError::InvalidKey(decoded.len()));
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&decoded);
        Ok(Self::new(key))
    }

    pub fn from_config(security: &SecurityConfig) -> Result<Self, CipherError> {
        let material = security
            .encryption_key
            .as_deref()
            .ok_or(CipherError::MissingKey)?;
        Self::from_key_material(material)
    }

    /// Random key in the base64 form accepted by `from_key_material`
    pub fn generate_key() -> String {
        let mut key = Zeroizing::new([0u8; KEY_SIZE]);
        OsRng.fill_bytes(&mut *key);
        STANDARD.encode(&*key)
    }

    pub fn encrypt(&self, bundle: &CredentialBundle) -> Result<Envelope, CipherError> {
        let plaintext = Zeroizing::new(serde_json::to_vec(bundle)?);

        let mut iv = [0u8; IV_SIZE];
        OsRng.fill_bytes(&mut iv);

        let ciphertext = Aes256CbcEnc::new_from_slices(&*self.enc_key, &iv)
            .map_err(|_| CipherError::InvalidKey(KEY_SIZE))?
            .encrypt_padded_vec_mut::<Pkcs7>(&plaintext);
        let tag = self.tag(&iv, &ciphertext)?.finalize().into_bytes();

        Ok(Envelope {
            iv: STANDARD.encode(iv),
            data: STANDARD.encode(&ciphertext),
            tag: STANDARD.encode(tag),
        })
    }

    pub fn decrypt(&self, envelope: &Envelope) -> Result<CredentialBundle, CipherError> {
        let iv = STANDARD
            .decode(&envelope.iv)
            .map_err(|_| CipherError::Decryption("IV is not valid base64"))?;
        if iv.len() != IV_SIZE {
            return Err(CipherError::Decryption("IV must be 16 bytes"));
        }

        let ciphertext = STANDARD
            .decode(&envelope.data)
            .map_err(|_| CipherError::Decryption("ciphertext is not valid base64"))?;
        if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
            return Err(CipherError::Decryption("ciphertext length is not a whole number of blocks"));
        }

        let tag = STANDARD
            .decode(&envelope.tag)
            .map_err(|_| CipherError::Decryption("tag is not valid base64"))?;
        self.tag(&iv, &ciphertext)?
            .verify_slice(&tag)
            .map_err(|_| CipherError::Decryption("authentication failed (wrong key or tampered envelope)"))?;

        let plaintext = Zeroizing::new(
            Aes256CbcDec::new_from_slices(&*self.enc_key, &iv)
                .map_err(|_| CipherError::Decryption("IV must be 16 bytes"))?
                .decrypt_padded_vec_mut::<Pkcs7>(&ciphertext)
                .map_err(|_| CipherError::Decryption("invalid padding"))?,
        );

        serde_json::from_slice(&plaintext)
            .map_err(|_| CipherError::Decryption("plaintext is not a credential map"))
    }

    /// Decrypts the stored text form of an envelope
    pub fn decrypt_str(&self, stored: &str) -> Result<CredentialBundle, CipherError> {
        self.decrypt(&Envelope::from_json(stored)?)
    }

    fn tag(&self, iv: &[u8], ciphertext: &[u8]) -> Result<HmacSha256, CipherError> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&*self.mac_key)
            .map_err(|_| CipherError::InvalidKey(KEY_SIZE))?;
        mac.update(iv);
        mac.update(ciphertext);
        Ok(mac)
    }
}

impl std::fmt::Debug for CredentialCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialCipher").finish_non_exhaustive()
    }
}

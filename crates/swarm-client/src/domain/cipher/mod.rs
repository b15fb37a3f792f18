//! # Envelope Encryption
//!
//! X25519 key agreement plus AES-256-CBC with a random IV prepended to the
//! ciphertext. The raw agreement output is the AES key.
//!
//! ## Wire format
//!
//! ```text
//! [ IV (16 bytes) ][ AES-256-CBC ciphertext, PKCS#7 padded ]
//! ```

use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use rand::rngs::OsRng;
use rand::RngCore;
use x25519_dalek::{PublicKey, StaticSecret};
use zeroize::Zeroizing;

use super::errors::CryptoError;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// AES block / IV size in bytes.
pub const IV_SIZE: usize = 16;

/// X25519 key size in bytes.
pub const KEY_SIZE: usize = 32;

/// Prefix byte some networks put in front of X25519 keys.
const KEY_TYPE_PREFIX: u8 = 0x05;

/// Session key pair used for every proxied request.
///
/// Generated once; safe to share across concurrent requests since
/// agreement only borrows the secret.
pub struct EphemeralKeyPair {
    secret: StaticSecret,
    public: PublicKey,
}

impl EphemeralKeyPair {
    /// Generate a fresh key pair from the OS RNG.
    pub fn generate() -> Self {
        let secret = StaticSecret::random_from_rng(OsRng);
        let public = PublicKey::from(&secret);
        Self { secret, public }
    }

    /// Raw public key bytes.
    pub fn public_key_bytes(&self) -> [u8; KEY_SIZE] {
        self.public.to_bytes()
    }

    /// Hex public key, as sent in `X-Sender-Public-Key`.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public.as_bytes())
    }

    /// Agree on a symmetric key with a hex-encoded X25519 public key.
    ///
    /// Accepts both the bare 32-byte form and the `05`-prefixed 33-byte form.
    pub fn shared_key(&self, their_public_hex: &str) -> Result<SharedKey, CryptoError> {
        let bytes = hex::decode(their_public_hex)
            .map_err(|_| CryptoError::InvalidPublicKey(their_public_hex.to_string()))?;
        let raw: [u8; KEY_SIZE] = match bytes.as_slice() {
            [KEY_TYPE_PREFIX, rest @ ..] if rest.len() == KEY_SIZE => {
                rest.try_into().map_err(|_| {
                    CryptoError::InvalidPublicKey(their_public_hex.to_string())
                })?
            }
            other => other
                .try_into()
                .map_err(|_| CryptoError::InvalidPublicKey(their_public_hex.to_string()))?,
        };
        let shared = self.secret.diffie_hellman(&PublicKey::from(raw));
        Ok(SharedKey(Zeroizing::new(shared.to_bytes())))
    }
}

impl std::fmt::Debug for EphemeralKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EphemeralKeyPair")
            .field("public", &self.public_key_hex())
            .finish_non_exhaustive()
    }
}

/// Symmetric key derived from one agreement. Zeroed on drop.
pub struct SharedKey(Zeroizing<[u8; KEY_SIZE]>);

impl SharedKey {
    /// Wrap raw key material.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(Zeroizing::new(bytes))
    }

    /// Encrypt under a fresh random IV; returns `IV ‖ ciphertext`.
    pub fn encrypt(&self, plaintext: &[u8]) -> Vec<u8> {
        let mut iv = [0u8; IV_SIZE];
        OsRng.fill_bytes(&mut iv);

        let ciphertext = Aes256CbcEnc::new(&(*self.0).into(), &iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext);

        let mut out = Vec::with_capacity(IV_SIZE + ciphertext.len());
        out.extend_from_slice(&iv);
        out.extend_from_slice(&ciphertext);
        out
    }

    /// Decrypt `IV ‖ ciphertext`.
    pub fn decrypt(&self, data: &[u8]) -> Result<Vec<u8>, CryptoError> {
        if data.len() < IV_SIZE {
            return Err(CryptoError::CiphertextTooShort { len: data.len() });
        }
        let (iv, ciphertext) = data.split_at(IV_SIZE);
        Aes256CbcDec::new_from_slices(&self.0[..], iv)
            .map_err(|_| CryptoError::DecryptionFailed)?
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
            .map_err(|_| CryptoError::DecryptionFailed)
    }
}

#[cfg(test)]
mod tests;

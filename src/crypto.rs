//! Role token sealing.
//!
//! Tokens use the NaCl `crypto_secretbox` construction (XSalsa20-Poly1305)
//! and are laid out as `base64(nonce || mac || ciphertext)`, which is what
//! `crypto_secretbox_easy` produces with the nonce prepended. The chat backend
//! opens them with the same shared key to learn the caller's access level.

use std::sync::Arc;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use crypto_secretbox::XSalsa20Poly1305;
use crypto_secretbox::aead::generic_array::GenericArray;
use crypto_secretbox::aead::{AeadCore, AeadInPlace, KeyInit, OsRng};

use crate::users::Position;

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 24;
const MAC_LEN: usize = 16;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("role key is not valid base64")]
    KeyEncoding,

    #[error("role key must be 32 bytes, got {0}")]
    KeyLength(usize),

    #[error("token is not valid base64")]
    TokenEncoding,

    #[error("token is too short")]
    TokenTooShort,

    #[error("token failed authentication")]
    Authentication,

    #[error("token plaintext is not UTF-8")]
    Utf8,

    #[error("position {0} has no role token")]
    Unassignable(Position),
}

/// Seals and opens role tokens with the key shared with the chat backend.
#[derive(Clone)]
pub struct RoleTokenCipher {
    cipher: Arc<XSalsa20Poly1305>,
}

impl std::fmt::Debug for RoleTokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleTokenCipher").finish_non_exhaustive()
    }
}

impl RoleTokenCipher {
    /// Build a cipher from a base64 encoded 32-byte key.
    pub fn from_base64(key: &str) -> Result<Self, CryptoError> {
        let bytes = STANDARD
            .decode(key.trim())
            .map_err(|_| CryptoError::KeyEncoding)?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != KEY_LEN {
            return Err(CryptoError::KeyLength(key.len()));
        }
        let cipher = XSalsa20Poly1305::new_from_slice(key)
            .map_err(|_| CryptoError::KeyLength(key.len()))?;
        Ok(Self {
            cipher: Arc::new(cipher),
        })
    }

    /// Encrypt `plaintext` under a fresh random nonce.
    pub fn seal(&self, plaintext: &str) -> Result<String, CryptoError> {
        let nonce = XSalsa20Poly1305::generate_nonce(&mut OsRng);
        let mut buffer = plaintext.as_bytes().to_vec();
        let tag = self
            .cipher
            .encrypt_in_place_detached(&nonce, b"", &mut buffer)
            .map_err(|_| CryptoError::Authentication)?;

        let mut out = Vec::with_capacity(NONCE_LEN + MAC_LEN + buffer.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&tag);
        out.extend_from_slice(&buffer);
        Ok(STANDARD.encode(out))
    }

    /// Decrypt a token produced by [`RoleTokenCipher::seal`].
    pub fn open(&self, token: &str) -> Result<String, CryptoError> {
        let bytes = STANDARD
            .decode(token.trim())
            .map_err(|_| CryptoError::TokenEncoding)?;
        if bytes.len() < NONCE_LEN + MAC_LEN {
            return Err(CryptoError::TokenTooShort);
        }

        let (nonce, rest) = bytes.split_at(NONCE_LEN);
        let (tag, ciphertext) = rest.split_at(MAC_LEN);
        let mut buffer = ciphertext.to_vec();
        self.cipher
            .decrypt_in_place_detached(
                GenericArray::from_slice(nonce),
                b"",
                &mut buffer,
                GenericArray::from_slice(tag),
            )
            .map_err(|_| CryptoError::Authentication)?;

        String::from_utf8(buffer).map_err(|_| CryptoError::Utf8)
    }

    /// Seal the access level plaintext for `position`.
    pub fn seal_position(&self, position: Position) -> Result<String, CryptoError> {
        let plaintext = position
            .token_plaintext()
            .ok_or(CryptoError::Unassignable(position))?;
        self.seal(plaintext)
    }

    /// Open a stored token and map it back to a position.
    pub fn open_position(&self, token: &str) -> Result<Position, CryptoError> {
        self.open(token).map(|p| Position::from_token_plaintext(&p))
    }
}

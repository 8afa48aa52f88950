//! Email content cipher.
//!
//! Content is AES-256-CBC encrypted with PKCS#7 padding. The 16-byte IV is
//! prepended to the ciphertext and the key travels as standard base64.

use aes::Aes256;
use aes::cipher::block_padding::Pkcs7;
use aes::cipher::{BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::{Error, Result};

/// IV length, prepended to every ciphertext.
pub const IV_LENGTH: usize = 16;

const KEY_LENGTH: usize = 32;

type Decryptor = cbc::Decryptor<Aes256>;
type Encryptor = cbc::Encryptor<Aes256>;

fn decode_key(key: &str) -> Result<[u8; KEY_LENGTH]> {
    let bytes = STANDARD
        .decode(key.trim())
        .map_err(|_| Error::Decryption("key is not base64"))?;
    bytes
        .try_into()
        .map_err(|_| Error::Decryption("key is not 256 bits"))
}

/// Decrypts `data` (IV followed by ciphertext) with a base64 key.
///
/// # Errors
///
/// Returns [`Error::Decryption`] if the key is malformed, the payload is
/// shorter than an IV or the padding does not check out.
pub fn decrypt(data: &[u8], key: &str) -> Result<Vec<u8>> {
    let key = decode_key(key)?;
    if data.len() < IV_LENGTH {
        return Err(Error::Decryption("payload shorter than IV"));
    }
    let (iv, ciphertext) = data.split_at(IV_LENGTH);
    Decryptor::new_from_slices(&key, iv)
        .map_err(|_| Error::Decryption("invalid key or IV length"))?
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::Decryption("bad padding"))
}

/// Encrypts `content` with a base64 key under `iv`, returning IV followed
/// by ciphertext.
///
/// The task itself only decrypts. This is the sealing side of the format,
/// for building gateway fixtures that [`decrypt`] must accept.
///
/// # Errors
///
/// Returns [`Error::Decryption`] if the key is malformed.
pub fn encrypt(content: &[u8], key: &str, iv: [u8; IV_LENGTH]) -> Result<Vec<u8>> {
    let key = decode_key(key)?;
    let ciphertext = Encryptor::new_from_slices(&key, &iv)
        .map_err(|_| Error::Decryption("invalid key or IV length"))?
        .encrypt_padded_vec_mut::<Pkcs7>(content);
    let mut out = Vec::with_capacity(IV_LENGTH + ciphertext.len());
    out.extend_from_slice(&iv);
    out.extend_from_slice(&ciphertext);
    Ok(out)
}

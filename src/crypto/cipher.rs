//! AES-256-CBC with PKCS7 padding for at-rest token storage.
//!
//! Unauthenticated: integrity comes only from the plaintext having to
//! parse as a record after decryption.

use crate::crypto::kdf::{TokenKey, IV_LEN};
use crate::TollgateError;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

/// Cipher block size in bytes.
pub const BLOCK_SIZE: usize = IV_LEN;

/// Encrypt `plaintext`. Output length is the next multiple of 16 above it.
pub fn encrypt(plaintext: &[u8], key: &TokenKey) -> Vec<u8> {
    Aes256CbcEnc::new(&(*key.key()).into(), &(*key.iv()).into())
        .encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// Decrypt `ciphertext`, rejecting bad lengths and bad padding.
pub fn decrypt(ciphertext: &[u8], key: &TokenKey) -> Result<Vec<u8>, TollgateError> {
    if ciphertext.is_empty() || ciphertext.len() % BLOCK_SIZE != 0 {
        return Err(TollgateError::CorruptToken(format!(
            "ciphertext length {} is not a positive multiple of {}",
            ciphertext.len(),
            BLOCK_SIZE
        )));
    }

    Aes256CbcDec::new(&(*key.key()).into(), &(*key.iv()).into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| TollgateError::CorruptToken("invalid padding".to_string()))
}

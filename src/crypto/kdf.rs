//! Deterministic key and IV derivation from machine identity.
//!
//! key = SHA-256(company | product | device id | user | app id)
//! iv  = MD5(os | machine name | app id)
//!
//! No stored secret is involved; the same machine and app always derive the
//! same material.

use crate::identity::MachineIdentity;
use md5::Md5;
use sha2::{Digest, Sha256};
use std::fmt;

/// AES-256 key length in bytes.
pub const KEY_LEN: usize = 32;

/// AES block / IV length in bytes.
pub const IV_LEN: usize = 16;

/// Derived key material for one (machine, app) pair.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenKey {
    key: [u8; KEY_LEN],
    iv: [u8; IV_LEN],
}

impl TokenKey {
    /// Derive key and IV for `app_id` on the machine described by `identity`.
    pub fn derive(identity: &MachineIdentity, app_id: u32) -> Self {
        Self {
            key: derive_key(identity, app_id),
            iv: derive_iv(identity, app_id),
        }
    }

    /// Build key material from raw bytes.
    pub fn from_bytes(key: [u8; KEY_LEN], iv: [u8; IV_LEN]) -> Self {
        Self { key, iv }
    }

    /// The 256-bit cipher key.
    pub fn key(&self) -> &[u8; KEY_LEN] {
        &self.key
    }

    /// The 128-bit CBC initialization vector.
    pub fn iv(&self) -> &[u8; IV_LEN] {
        &self.iv
    }

    /// Short non-reversible tag for log lines, so the key itself never is logged.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.key);
        hasher.update(self.iv);
        hex::encode(&hasher.finalize()[..4])
    }
}

impl fmt::Debug for TokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenKey")
            .field("fingerprint", &self.fingerprint())
            .finish()
    }
}

/// Derive the 32-byte cipher key.
pub fn derive_key(identity: &MachineIdentity, app_id: u32) -> [u8; KEY_LEN] {
    let seed = format!(
        "{}|{}|{}|{}|{}",
        identity.company_name,
        identity.product_name,
        identity.device_unique_id,
        identity.user_name,
        app_id
    );
    Sha256::digest(seed.as_bytes()).into()
}

/// Derive the 16-byte IV.
pub fn derive_iv(identity: &MachineIdentity, app_id: u32) -> [u8; IV_LEN] {
    let seed = format!(
        "{}|{}|{}",
        identity.os_name, identity.machine_name, app_id
    );
    Md5::digest(seed.as_bytes()).into()
}

//! AES-128 block cipher and SHA-256 password-key derivation (C3).
//!
//! AES-128 is provided by the RustCrypto [`aes`] crate via the [`cipher`]
//! crate's `BlockEncrypt`/`BlockDecrypt` traits; SHA-256 by [`sha2`]. Rather
//! than exposing the reference library's raw 176-byte expanded key schedule,
//! `PasswordData` stores the already-keyed `aes::Aes128` cipher object for
//! each level — the schedule lives inside it, built once at key-derivation
//! time and reused per file, matching the spec's "derived once... reused per
//! file" requirement without hand-rolling AES key expansion ourselves.

use aes::Aes128;
use cipher::{BlockDecrypt, BlockEncrypt, KeyInit};
use sha2::{Digest, Sha256};

use crate::enums::EncryptionLevel;
use crate::errors::MedError;

pub const PASSWORD_BYTES: usize = 16;
pub const PASSWORD_HINT_BYTES: usize = 256;
pub const ENCRYPTION_BLOCK_BYTES: usize = 16;

/// Derive a 16-byte AES key from a password via SHA-256, truncating the
/// 32-byte digest to its first 16 bytes (the reference library's scheme).
pub fn derive_key_bytes(password: &str) -> [u8; PASSWORD_BYTES] {
    let digest = Sha256::digest(password.as_bytes());
    let mut key = [0u8; PASSWORD_BYTES];
    key.copy_from_slice(&digest[..PASSWORD_BYTES]);
    key
}

/// Two AES-128 keys (level-1, level-2) derived from up to three passwords,
/// plus password hints and the caller's resolved access level.
pub struct PasswordData {
    level_1_cipher: Option<Aes128>,
    level_2_cipher: Option<Aes128>,
    level_1_hint: Option<String>,
    level_2_hint: Option<String>,
    access_level: i8,
    processed: bool,
}

impl PasswordData {
    /// Build password data from up to three passwords. `password_3` ("master"),
    /// if supplied, is used to recover both the level-1 and level-2 keys;
    /// otherwise each of `password_1`/`password_2` independently derives its
    /// own level's key. Access level is the highest level whose key was
    /// derived.
    pub fn new(password_1: Option<&str>, password_2: Option<&str>, password_3: Option<&str>) -> Self {
        let (level_1_cipher, level_2_cipher, access_level) = match password_3 {
            Some(master) => {
                let key = derive_key_bytes(master);
                let cipher = Aes128::new_from_slice(&key).expect("16-byte key");
                (Some(cipher.clone()), Some(cipher), 2)
            }
            None => {
                let l1 = password_1.map(|p| {
                    Aes128::new_from_slice(&derive_key_bytes(p)).expect("16-byte key")
                });
                let l2 = password_2.map(|p| {
                    Aes128::new_from_slice(&derive_key_bytes(p)).expect("16-byte key")
                });
                let level = if l2.is_some() {
                    2
                } else if l1.is_some() {
                    1
                } else {
                    0
                };
                (l1, l2, level)
            }
        };

        PasswordData {
            level_1_cipher,
            level_2_cipher,
            level_1_hint: None,
            level_2_hint: None,
            access_level,
            processed: password_1.is_some() || password_2.is_some() || password_3.is_some(),
        }
    }

    /// No passwords at all: everything is readable only at `NoEntry`/`None` level.
    pub fn none() -> Self {
        PasswordData {
            level_1_cipher: None,
            level_2_cipher: None,
            level_1_hint: None,
            level_2_hint: None,
            access_level: 0,
            processed: false,
        }
    }

    pub fn access_level(&self) -> i8 {
        self.access_level
    }

    pub fn processed(&self) -> bool {
        self.processed
    }

    pub fn set_level_1_hint(&mut self, hint: impl Into<String>) {
        self.level_1_hint = Some(hint.into());
    }

    pub fn set_level_2_hint(&mut self, hint: impl Into<String>) {
        self.level_2_hint = Some(hint.into());
    }

    pub fn level_1_hint(&self) -> Option<&str> {
        self.level_1_hint.as_deref()
    }

    pub fn level_2_hint(&self) -> Option<&str> {
        self.level_2_hint.as_deref()
    }

    fn cipher_for(&self, level: EncryptionLevel) -> Option<&Aes128> {
        match level.nominal_level() {
            1 => self.level_1_cipher.as_ref(),
            2 => self.level_2_cipher.as_ref(),
            _ => None,
        }
    }

    /// Decrypt `bytes` (length must be a multiple of 16) in place at the
    /// requested `level`. Returns `EncryptionLevelExceeded` if the key is
    /// unavailable -- decryption is skipped, never producing garbage.
    pub fn decrypt(&self, level: EncryptionLevel, bytes: &mut [u8]) -> Result<(), MedError> {
        let cipher = self.cipher_for(level).ok_or(MedError::EncryptionLevelExceeded {
            requested: level.nominal_level(),
            access_level: self.access_level,
        })?;
        for chunk in bytes.chunks_exact_mut(ENCRYPTION_BLOCK_BYTES) {
            let block = cipher::generic_array::GenericArray::from_mut_slice(chunk);
            cipher.decrypt_block(block);
        }
        Ok(())
    }

    /// Encrypt `bytes` (length must be a multiple of 16) in place at the
    /// requested `level`.
    pub fn encrypt(&self, level: EncryptionLevel, bytes: &mut [u8]) -> Result<(), MedError> {
        let cipher = self.cipher_for(level).ok_or(MedError::EncryptionLevelExceeded {
            requested: level.nominal_level(),
            access_level: self.access_level,
        })?;
        for chunk in bytes.chunks_exact_mut(ENCRYPTION_BLOCK_BYTES) {
            let block = cipher::generic_array::GenericArray::from_mut_slice(chunk);
            cipher.encrypt_block(block);
        }
        Ok(())
    }

    /// Validate a 16-byte password-validation field against this level's key:
    /// decrypting it should reveal the fixed sentinel pattern the field was
    /// encrypted from (the level's own derived key, repeated).
    pub fn validate(&self, level: EncryptionLevel, validation_field: &[u8; 16]) -> Result<(), MedError> {
        let cipher = self.cipher_for(level).ok_or(MedError::EncryptionLevelExceeded {
            requested: level.nominal_level(),
            access_level: self.access_level,
        })?;
        let mut buf = *validation_field;
        let block = cipher::generic_array::GenericArray::from_mut_slice(&mut buf);
        cipher.decrypt_block(block);
        if buf == [0x7eu8; 16] {
            Ok(())
        } else {
            Err(MedError::PasswordValidationFailed { level: level.nominal_level() })
        }
    }

    /// Build the validation field that `validate` expects to recover, for
    /// writing a new universal header.
    pub fn make_validation_field(&self, level: EncryptionLevel) -> Result<[u8; 16], MedError> {
        let cipher = self.cipher_for(level).ok_or(MedError::EncryptionLevelExceeded {
            requested: level.nominal_level(),
            access_level: self.access_level,
        })?;
        let mut buf = [0x7eu8; 16];
        let block = cipher::generic_array::GenericArray::from_mut_slice(&mut buf);
        cipher.encrypt_block(block);
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_round_trips() {
        let pw = PasswordData::new(Some("patient_pw"), None, None);
        let mut data = *b"0123456789abcdef"; // exactly 16 bytes
        pw.encrypt(EncryptionLevel::Level1, &mut data).unwrap();
        assert_ne!(&data, b"0123456789abcdef");
        pw.decrypt(EncryptionLevel::Level1, &mut data).unwrap();
        assert_eq!(&data, b"0123456789abcdef");
    }

    #[test]
    fn master_password_unlocks_both_levels() {
        let pw = PasswordData::new(None, None, Some("master_pw"));
        assert_eq!(pw.access_level(), 2);
        let v1 = pw.make_validation_field(EncryptionLevel::Level1).unwrap();
        let v2 = pw.make_validation_field(EncryptionLevel::Level2).unwrap();
        pw.validate(EncryptionLevel::Level1, &v1).unwrap();
        pw.validate(EncryptionLevel::Level2, &v2).unwrap();
    }

    #[test]
    fn patient_password_only_unlocks_level_1() {
        let writer_pw = PasswordData::new(Some("patient_pw"), None, None);
        let v1 = writer_pw.make_validation_field(EncryptionLevel::Level1).unwrap();

        let reader_pw = PasswordData::new(Some("patient_pw"), None, None);
        reader_pw.validate(EncryptionLevel::Level1, &v1).unwrap();
        let err = reader_pw.make_validation_field(EncryptionLevel::Level2).unwrap_err();
        assert!(matches!(err, MedError::EncryptionLevelExceeded { .. }));
    }

    #[test]
    fn missing_key_is_skipped_not_garbage() {
        let pw = PasswordData::none();
        let mut data = *b"0123456789abcdef";
        let err = pw.encrypt(EncryptionLevel::Level1, &mut data).unwrap_err();
        assert!(matches!(err, MedError::EncryptionLevelExceeded { .. }));
        assert_eq!(&data, b"0123456789abcdef");
    }
}

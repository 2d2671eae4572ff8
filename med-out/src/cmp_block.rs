//! Assembly of the 56-byte CMP block header plus parameter region, CRC, and
//! optional encryption around a compressed sample body (C5 write side). The
//! compression itself is `med_core::codec::encode_block_body`; this module
//! only adds the on-disk framing `med-in`'s `cmp_block` module unwinds.
use med_core::cmp::{BlockFlags, CmpBlockHeader, ParameterFlags};
use med_core::codec::encode_block_body;
use med_core::crc::crc32;
use med_core::crypto::PasswordData;
use med_core::enums::EncryptionLevel;
use med_core::errors::MedError;
use med_core::layout::cmp as cmp_layout;
use med_core::settings::CmpDirectives;

fn parameter_flags_for(directives: &CmpDirectives) -> ParameterFlags {
    let mut flags = ParameterFlags::default();
    if directives.detrend() {
        flags.set(ParameterFlags::INTERCEPT, true);
        flags.set(ParameterFlags::GRADIENT, true);
    }
    if directives.amplitude_scale().is_some() {
        flags.set(ParameterFlags::AMPLITUDE_SCALE, true);
    }
    if directives.frequency_scale().is_some() {
        flags.set(ParameterFlags::FREQUENCY_SCALE, true);
    }
    flags
}

/// Encode one CMP block: compress `samples` per `directives`, then assemble
/// the fixed header, parameter region, and (if `directives.encryption_level()`
/// is nonzero) encrypt the compressed body with `password`.
pub fn encode_cmp_block(
    samples: &[i32],
    start_time: i64,
    acquisition_channel_number: i32,
    discontinuity: bool,
    directives: &CmpDirectives,
    password: Option<&PasswordData>,
) -> Result<Vec<u8>, MedError> {
    let (params, mut body) = encode_block_body(samples, directives);
    let parameter_flags = parameter_flags_for(directives);

    let mut parameter_region = Vec::with_capacity(parameter_flags.region_bytes() as usize);
    if parameter_flags.has(ParameterFlags::INTERCEPT) {
        parameter_region.extend_from_slice(&params.intercept.unwrap_or(0.0).to_le_bytes());
    }
    if parameter_flags.has(ParameterFlags::GRADIENT) {
        parameter_region.extend_from_slice(&params.gradient.unwrap_or(0.0).to_le_bytes());
    }
    if parameter_flags.has(ParameterFlags::AMPLITUDE_SCALE) {
        parameter_region.extend_from_slice(&params.amplitude_scale.unwrap_or(1.0).to_le_bytes());
    }
    if parameter_flags.has(ParameterFlags::FREQUENCY_SCALE) {
        parameter_region.extend_from_slice(&params.frequency_scale.unwrap_or(1.0).to_le_bytes());
    }

    let encryption_level = directives.encryption_level();
    if encryption_level > 0 {
        let password = password.ok_or(MedError::EncryptionLevelExceeded {
            requested: encryption_level as i8,
            access_level: 0,
        })?;
        let level = EncryptionLevel::from_raw(encryption_level as i8);
        pad_to_block(&mut body);
        password.encrypt(level, &mut body)?;
    }

    let total_header_bytes = cmp_layout::CMP_BLOCK_HEADER_BYTES + parameter_region.len();
    let total_block_bytes = total_header_bytes + body.len();

    let mut out = vec![0u8; total_block_bytes];
    out[cmp_layout::START_UID_OFFSET..][..8].copy_from_slice(&CmpBlockHeader::START_UID.to_le_bytes());
    // block_crc filled in below once the rest of the block is in place.
    let flags = BlockFlags::new(directives.algorithm(), discontinuity, encryption_level);
    out[cmp_layout::BLOCK_FLAGS_OFFSET..][..4].copy_from_slice(&flags.0.to_le_bytes());
    out[cmp_layout::START_TIME_OFFSET..][..8].copy_from_slice(&start_time.to_le_bytes());
    out[cmp_layout::ACQUISITION_CHANNEL_NUMBER_OFFSET..][..4]
        .copy_from_slice(&acquisition_channel_number.to_le_bytes());
    out[cmp_layout::TOTAL_BLOCK_BYTES_OFFSET..][..4].copy_from_slice(&(total_block_bytes as u32).to_le_bytes());
    out[cmp_layout::NUMBER_OF_SAMPLES_OFFSET..][..4].copy_from_slice(&(samples.len() as u32).to_le_bytes());
    out[cmp_layout::NUMBER_OF_RECORDS_OFFSET..][..2].copy_from_slice(&0u16.to_le_bytes());
    out[cmp_layout::RECORD_REGION_BYTES_OFFSET..][..2].copy_from_slice(&0u16.to_le_bytes());
    out[cmp_layout::PARAMETER_FLAGS_OFFSET..][..4].copy_from_slice(&parameter_flags.0.to_le_bytes());
    out[cmp_layout::PARAMETER_REGION_BYTES_OFFSET..][..2]
        .copy_from_slice(&(parameter_region.len() as u16).to_le_bytes());
    out[cmp_layout::PROTECTED_REGION_BYTES_OFFSET..][..2].copy_from_slice(&0u16.to_le_bytes());
    out[cmp_layout::DISCRETIONARY_REGION_BYTES_OFFSET..][..2].copy_from_slice(&0u16.to_le_bytes());
    out[cmp_layout::MODEL_REGION_BYTES_OFFSET..][..2].copy_from_slice(&0u16.to_le_bytes());
    out[cmp_layout::TOTAL_HEADER_BYTES_OFFSET..][..4].copy_from_slice(&(total_header_bytes as u32).to_le_bytes());

    out[cmp_layout::VARIABLE_REGION_OFFSET..total_header_bytes].copy_from_slice(&parameter_region);
    out[total_header_bytes..].copy_from_slice(&body);

    let block_crc = crc32(&out[cmp_layout::BLOCK_FLAGS_OFFSET..]);
    out[cmp_layout::BLOCK_CRC_OFFSET..][..4].copy_from_slice(&block_crc.to_le_bytes());

    Ok(out)
}

/// AES-128 operates on whole 16-byte blocks; pad the compressed body with
/// zero bytes to the next multiple of 16 before encrypting (the decoder
/// trims back to `number_of_samples`-derived length after decrypting).
fn pad_to_block(body: &mut Vec<u8>) {
    let remainder = body.len() % 16;
    if remainder != 0 {
        body.resize(body.len() + (16 - remainder), 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::TryInto;
    use med_core::enums::CmpAlgorithm;

    #[test]
    fn encodes_a_lossless_red_block_with_consistent_header_fields() {
        let samples = vec![10, -5, 0, 100, -100, 42, 7, 7];
        let mut directives = CmpDirectives::default();
        directives.set_algorithm(CmpAlgorithm::Red);
        let block = encode_cmp_block(&samples, 1000, 3, false, &directives, None).unwrap();

        let start_uid = u64::from_le_bytes(block[cmp_layout::START_UID_OFFSET..][..8].try_into().unwrap());
        assert_eq!(start_uid, CmpBlockHeader::START_UID);
        let total_block_bytes =
            u32::from_le_bytes(block[cmp_layout::TOTAL_BLOCK_BYTES_OFFSET..][..4].try_into().unwrap());
        assert_eq!(total_block_bytes as usize, block.len());
        let number_of_samples =
            u32::from_le_bytes(block[cmp_layout::NUMBER_OF_SAMPLES_OFFSET..][..4].try_into().unwrap());
        assert_eq!(number_of_samples as usize, samples.len());
    }

    #[test]
    fn encrypted_block_pads_body_to_a_block_multiple() {
        let samples = vec![1, 2, 3];
        let mut directives = CmpDirectives::default();
        directives.set_algorithm(CmpAlgorithm::Red);
        directives.set_encryption_level(1).unwrap();
        let password = PasswordData::new(Some("pw"), None, None);
        let block = encode_cmp_block(&samples, 0, 0, false, &directives, Some(&password)).unwrap();
        let total_header_bytes =
            u32::from_le_bytes(block[cmp_layout::TOTAL_HEADER_BYTES_OFFSET..][..4].try_into().unwrap()) as usize;
        assert_eq!((block.len() - total_header_bytes) % 16, 0);
    }

    #[test]
    fn missing_password_at_nonzero_encryption_level_errors() {
        let samples = vec![1, 2, 3];
        let mut directives = CmpDirectives::default();
        directives.set_encryption_level(1).unwrap();
        assert!(encode_cmp_block(&samples, 0, 0, false, &directives, None).is_err());
    }
}

//! Unwinding a CMP block's on-disk framing (C5 read side): verify the start
//! UID and block CRC, decrypt the compressed body if needed, recover the
//! parameter region, and hand the compressed body to
//! `med_core::codec::decode_block_body` for the actual decompression.
use std::convert::TryInto;

use med_core::cmp::{CmpBlockHeader, ParameterFlags};
use med_core::codec::{decode_block_body, BlockParams};
use med_core::crc::crc32;
use med_core::crypto::PasswordData;
use med_core::enums::EncryptionLevel;
use med_core::errors::MedError;
use med_core::layout::cmp as cmp_layout;

use crate::convert_headers::parse_cmp_block_header;

/// Parse, verify, and decompress one CMP block starting at `bytes[0]`.
/// `bytes` must contain at least `total_block_bytes` (extra trailing bytes,
/// e.g. from a data file holding several blocks back to back, are ignored).
pub fn decode_cmp_block(bytes: &[u8], password: Option<&PasswordData>) -> Result<(CmpBlockHeader, Vec<i32>), MedError> {
    let header = parse_cmp_block_header(bytes)?;
    let total_block_bytes = header.total_block_bytes as usize;
    if bytes.len() < total_block_bytes {
        return Err(MedError::FileTooShort);
    }
    let block = &bytes[..total_block_bytes];

    let stored_crc = header.block_crc;
    let computed_crc = crc32(&block[cmp_layout::BLOCK_FLAGS_OFFSET..]);
    if stored_crc != computed_crc {
        return Err(MedError::BlockCrcMismatch { block_start_sample: header.start_time });
    }

    let total_header_bytes = header.total_header_bytes as usize;
    let parameter_region = &block[cmp_layout::VARIABLE_REGION_OFFSET..total_header_bytes];
    let params = parse_parameter_region(parameter_region, header.parameter_flags);

    let mut body = block[total_header_bytes..].to_vec();
    let encryption_level = header.block_flags.encryption_level();
    if encryption_level > 0 {
        let password = password.ok_or(MedError::EncryptionLevelExceeded {
            requested: encryption_level as i8,
            access_level: 0,
        })?;
        let level = EncryptionLevel::from_raw(encryption_level as i8);
        password.decrypt(level, &mut body)?;
    }

    let algorithm = header.block_flags.algorithm().ok_or(MedError::ParseEnum {
        f: "CmpAlgorithm".to_string(),
        code: header.block_flags.0,
    })?;
    let samples = decode_block_body(&body, header.number_of_samples as usize, algorithm, 0, params);
    Ok((header, samples))
}

fn parameter_region_f64(bytes: &[u8], offset: &mut usize) -> f64 {
    let value = f64::from_le_bytes(bytes[*offset..*offset + 8].try_into().unwrap());
    *offset += 8;
    value
}

fn parse_parameter_region(bytes: &[u8], flags: ParameterFlags) -> BlockParams {
    let mut params = BlockParams::default();
    let mut offset = 0usize;
    if flags.has(ParameterFlags::INTERCEPT) {
        params.intercept = Some(parameter_region_f64(bytes, &mut offset));
    }
    if flags.has(ParameterFlags::GRADIENT) {
        params.gradient = Some(parameter_region_f64(bytes, &mut offset));
    }
    if flags.has(ParameterFlags::AMPLITUDE_SCALE) {
        params.amplitude_scale = Some(parameter_region_f64(bytes, &mut offset));
    }
    if flags.has(ParameterFlags::FREQUENCY_SCALE) {
        params.frequency_scale = Some(parameter_region_f64(bytes, &mut offset));
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use med_core::enums::CmpAlgorithm;
    use med_core::settings::CmpDirectives;
    use med_out::cmp_block::encode_cmp_block;

    #[test]
    fn round_trips_an_unencrypted_red_block() {
        let samples = vec![10, -5, 0, 100, -100, 42, 7, 7];
        let mut directives = CmpDirectives::default();
        directives.set_algorithm(CmpAlgorithm::Red);
        let encoded = encode_cmp_block(&samples, 1000, 3, false, &directives, None).unwrap();

        let (header, decoded) = decode_cmp_block(&encoded, None).unwrap();
        assert_eq!(decoded, samples);
        assert_eq!(header.start_time, 1000);
        assert_eq!(header.acquisition_channel_number, 3);
    }

    #[test]
    fn round_trips_a_detrended_mbe_block() {
        let samples: Vec<i32> = (0..40).map(|i| i * 3 + 7).collect();
        let mut directives = CmpDirectives::default();
        directives.set_detrend(true);
        directives.set_algorithm(CmpAlgorithm::Mbe);
        let encoded = encode_cmp_block(&samples, 0, 0, false, &directives, None).unwrap();
        let (_, decoded) = decode_cmp_block(&encoded, None).unwrap();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn round_trips_an_encrypted_block() {
        let samples = vec![1, 2, 3, 4, 5];
        let mut directives = CmpDirectives::default();
        directives.set_algorithm(CmpAlgorithm::Red);
        directives.set_encryption_level(1).unwrap();
        let password = PasswordData::new(Some("pw"), None, None);
        let encoded = encode_cmp_block(&samples, 0, 0, false, &directives, Some(&password)).unwrap();

        let (_, decoded) = decode_cmp_block(&encoded, Some(&password)).unwrap();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn corrupted_block_crc_is_detected() {
        let samples = vec![1, 2, 3];
        let directives = CmpDirectives::default();
        let mut encoded = encode_cmp_block(&samples, 0, 0, false, &directives, None).unwrap();
        let last = encoded.len() - 1;
        encoded[last] ^= 0xFF;
        assert!(matches!(decode_cmp_block(&encoded, None), Err(MedError::BlockCrcMismatch { .. })));
    }
}

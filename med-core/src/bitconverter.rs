//! Fixed-bit-width packing for the MBE compression algorithm (C5, C1
//! primitive). MBE stores each zig-zag-mapped residual in the smallest
//! number of bits that holds the block's largest magnitude, packed
//! most-significant-bit-first across a byte stream -- this is the
//! bit-converter primitive the CMP codec's MBE path drives directly (see
//! [`crate::codec::mbe_encode`]/[`crate::codec::mbe_decode`]).

/// The number of bits needed to hold `max_value` (0 needs zero bits: every
/// value in the block is zero and the packed region is empty).
pub fn bits_required(max_value: u32) -> u8 {
    32 - max_value.leading_zeros() as u8
}

/// Pack `values`, each assumed to fit in `width` bits, into a minimal
/// big-endian bitstream.
pub fn pack_bits(values: &[u32], width: u8) -> Vec<u8> {
    if width == 0 {
        return Vec::new();
    }
    let total_bits = values.len() * width as usize;
    let mut out = vec![0u8; (total_bits + 7) / 8];
    let mut bit_pos = 0usize;
    for &value in values {
        for i in (0..width).rev() {
            let bit = (value >> i) & 1;
            if bit != 0 {
                out[bit_pos / 8] |= 1 << (7 - bit_pos % 8);
            }
            bit_pos += 1;
        }
    }
    out
}

/// Inverse of [`pack_bits`]: unpack `count` values of `width` bits each.
pub fn unpack_bits(bytes: &[u8], width: u8, count: usize) -> Vec<u32> {
    if width == 0 {
        return vec![0u32; count];
    }
    let mut out = Vec::with_capacity(count);
    let mut bit_pos = 0usize;
    for _ in 0..count {
        let mut value = 0u32;
        for _ in 0..width {
            let byte = bytes[bit_pos / 8];
            let bit = (byte >> (7 - bit_pos % 8)) & 1;
            value = (value << 1) | u32::from(bit);
            bit_pos += 1;
        }
        out.push(value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_required_matches_known_values() {
        assert_eq!(bits_required(0), 0);
        assert_eq!(bits_required(1), 1);
        assert_eq!(bits_required(255), 8);
        assert_eq!(bits_required(256), 9);
    }

    #[test]
    fn pack_unpack_round_trips() {
        let values = vec![0u32, 1, 2, 3, 5, 7];
        let width = bits_required(*values.iter().max().unwrap());
        let packed = pack_bits(&values, width);
        let unpacked = unpack_bits(&packed, width, values.len());
        assert_eq!(unpacked, values);
    }

    #[test]
    fn zero_width_packs_to_nothing() {
        let values = vec![0u32; 10];
        let packed = pack_bits(&values, 0);
        assert!(packed.is_empty());
        assert_eq!(unpack_bits(&packed, 0, 10), values);
    }
}

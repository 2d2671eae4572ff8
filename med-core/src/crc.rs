//! CRC-32 (polynomial `0xEDB88320`, reflected, initial register 0, no final
//! XOR) used for universal-header and CMP-block checksums.
//!
//! The rolling update is delegated to [`crc32fast`], which implements the
//! same reflected polynomial with a SIMD-accelerated slicing-by-multiple
//! table. `combine` has no off-the-shelf equivalent and is hand-rolled here
//! via polynomial matrix squaring (GF(2) operations), the one piece of this
//! module not delegated to a crate because it is specified algorithmic
//! behavior, not an ambient concern.

/// Compute the CRC-32 of `data`, starting from register `0`.
///
/// ```
/// use med_core::crc::crc32;
/// assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
/// ```
pub fn crc32(data: &[u8]) -> u32 {
    crc32_with_seed(0, data)
}

/// Continue a CRC-32 computation from an existing register value.
pub fn crc32_with_seed(seed: u32, data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new_with_initial(seed);
    hasher.update(data);
    hasher.finalize()
}

/// Combine the CRCs of two adjacent byte runs `a` (length unknown) and `b`
/// (length `len_b`) into the CRC of their concatenation, without re-reading
/// `a`. Used when computing body CRCs across a file read in pieces.
///
/// `CRC(a || b) == combine(CRC(a), CRC(b), len_b)`.
pub fn combine(crc_a: u32, crc_b: u32, len_b: u64) -> u32 {
    // Treat the CRC register as a polynomial over GF(2) and view appending
    // `len_b` zero bytes to `a`'s running CRC as multiplication by x^(8*len_b)
    // modulo the CRC polynomial; that matrix is built once via repeated
    // squaring of the "multiply by x" matrix, standard zlib `crc32_combine`
    // technique.
    let mut odd = [0u32; 32];
    let mut even = [0u32; 32];

    odd[0] = 0xEDB8_8320; // CRC-32 reflected polynomial
    let mut row = 1u32;
    for entry in odd.iter_mut().skip(1) {
        *entry = row;
        row <<= 1;
    }

    gf2_matrix_square(&mut even, &odd);
    gf2_matrix_square(&mut odd, &even);

    let mut len = len_b;
    let mut crc1 = crc_a;
    let (mut even, mut odd) = (even, odd);

    loop {
        gf2_matrix_square(&mut even, &odd);
        if len & 1 != 0 {
            crc1 = gf2_matrix_times(&even, crc1);
        }
        len >>= 1;
        if len == 0 {
            break;
        }
        gf2_matrix_square(&mut odd, &even);
        if len & 1 != 0 {
            crc1 = gf2_matrix_times(&odd, crc1);
        }
        len >>= 1;
        if len == 0 {
            break;
        }
    }

    crc1 ^ crc_b
}

fn gf2_matrix_times(matrix: &[u32; 32], mut vec: u32) -> u32 {
    let mut sum = 0u32;
    let mut i = 0;
    while vec != 0 {
        if vec & 1 != 0 {
            sum ^= matrix[i];
        }
        vec >>= 1;
        i += 1;
    }
    sum
}

fn gf2_matrix_square(square: &mut [u32; 32], matrix: &[u32; 32]) {
    for n in 0..32 {
        square[n] = gf2_matrix_times(matrix, matrix[n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn combine_matches_direct_computation() {
        let a = b"hello, ";
        let b = b"world!";
        let whole = crc32(b"hello, world!");
        let crc_a = crc32(a);
        let crc_b = crc32(b);
        assert_eq!(combine(crc_a, crc_b, b.len() as u64), whole);
    }

    #[test]
    fn combine_with_empty_tail_is_identity() {
        let crc_a = crc32(b"anything");
        let crc_b = crc32(b"");
        assert_eq!(combine(crc_a, crc_b, 0), crc_a);
    }

    #[test]
    fn known_vector() {
        assert_eq!(crc32(b"123456789"), 0xCBF4_3926);
    }
}

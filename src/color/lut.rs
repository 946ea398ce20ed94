//! Color-space samplers (spec §4.8 "LUT build"): materializes a converter's
//! `to_srgb` as a precomputed table so a canvas doesn't re-evaluate a
//! TRC/CLUT/tint-transform per pixel.

/// A materialized sampler for a color-space converter.
pub enum Sampler {
    /// 1-channel converters (`DeviceGray`, `CalGray`, 1-channel ICC): a
    /// flat 256-entry table of RGB bytes.
    Lut1 { table: Vec<[u8; 3]> },
    /// 3-channel converters (`DeviceRGB`, `CalRGB`, Lab, 3-channel ICC): a
    /// 17x17x17 grid, trilinearly interpolated.
    Lut3 { grid: usize, table: Vec<[u8; 3]> },
    /// 4-channel converters (`DeviceCMYK`): layered 3D LUTs across the K
    /// sample levels in [`CMYK_K_LEVELS`].
    Lut4 {
        grid: usize,
        k_levels: Vec<f32>,
        layers: Vec<Vec<[u8; 3]>>,
    },
}

/// K sample levels for the layered CMYK LUT (spec §4.8).
pub const CMYK_K_LEVELS: [f32; 8] = [0.0, 0.05, 0.15, 0.30, 0.50, 0.70, 0.85, 1.0];

/// Default grid resolution for 3-channel/CMY-slice LUTs (spec §4.8).
pub const DEFAULT_GRID: usize = 17;

impl Sampler {
    /// Builds a 1-channel 256-entry LUT by evaluating `to_srgb` at each of
    /// the 256 possible byte inputs.
    pub fn build_1d(to_srgb: impl Fn(&[f32]) -> [u8; 3]) -> Sampler {
        let table = (0..256)
            .map(|i| to_srgb(&[i as f32 / 255.0]))
            .collect();
        Sampler::Lut1 { table }
    }

    /// Builds a 3-channel `grid^3` LUT.
    pub fn build_3d(grid: usize, to_srgb: impl Fn(&[f32]) -> [u8; 3]) -> Sampler {
        let mut table = Vec::with_capacity(grid * grid * grid);
        for r in 0..grid {
            for g in 0..grid {
                for b in 0..grid {
                    let components = [
                        r as f32 / (grid - 1) as f32,
                        g as f32 / (grid - 1) as f32,
                        b as f32 / (grid - 1) as f32,
                    ];
                    table.push(to_srgb(&components));
                }
            }
        }
        Sampler::Lut3 { grid, table }
    }

    /// Builds the layered CMYK LUT: one 3D CMY grid per K level (spec
    /// §4.8).
    pub fn build_4d_cmyk(grid: usize, to_srgb: impl Fn(&[f32]) -> [u8; 3]) -> Sampler {
        let k_levels = CMYK_K_LEVELS.to_vec();
        let layers = k_levels
            .iter()
            .map(|&k| {
                let mut layer = Vec::with_capacity(grid * grid * grid);
                for c in 0..grid {
                    for m in 0..grid {
                        for y in 0..grid {
                            let components = [
                                c as f32 / (grid - 1) as f32,
                                m as f32 / (grid - 1) as f32,
                                y as f32 / (grid - 1) as f32,
                                k,
                            ];
                            layer.push(to_srgb(&components));
                        }
                    }
                }
                layer
            })
            .collect();
        Sampler::Lut4 { grid, k_levels, layers }
    }

    /// Samples the LUT at `components` (each `0.0..=1.0`), interpolating as
    /// described by each variant's doc comment.
    pub fn sample(&self, components: &[f32]) -> [u8; 3] {
        match self {
            Sampler::Lut1 { table } => {
                let idx = (components[0].clamp(0.0, 1.0) * 255.0).round() as usize;
                table[idx.min(255)]
            }
            Sampler::Lut3 { grid, table } => sample_3d(*grid, table, components),
            Sampler::Lut4 { grid, k_levels, layers } => {
                let k = components.get(3).copied().unwrap_or(0.0).clamp(0.0, 1.0);
                let (lo, hi, frac) = bracket_k(k_levels, k);
                let lo_rgb = sample_3d(*grid, &layers[lo], components);
                if lo == hi {
                    return lo_rgb;
                }
                let hi_rgb = sample_3d(*grid, &layers[hi], components);
                let mut out = [0u8; 3];
                for i in 0..3 {
                    let blended = lo_rgb[i] as f32 * (1.0 - frac) + hi_rgb[i] as f32 * frac;
                    out[i] = blended.round().clamp(0.0, 255.0) as u8;
                }
                out
            }
        }
    }
}

fn bracket_k(levels: &[f32], k: f32) -> (usize, usize, f32) {
    if k <= levels[0] {
        return (0, 0, 0.0);
    }
    if k >= levels[levels.len() - 1] {
        let last = levels.len() - 1;
        return (last, last, 0.0);
    }
    for i in 0..levels.len() - 1 {
        if k >= levels[i] && k <= levels[i + 1] {
            let span = levels[i + 1] - levels[i];
            let frac = if span > 0.0 { (k - levels[i]) / span } else { 0.0 };
            return (i, i + 1, frac);
        }
    }
    (levels.len() - 1, levels.len() - 1, 0.0)
}

fn sample_3d(grid: usize, table: &[[u8; 3]], components: &[f32]) -> [u8; 3] {
    let max_index = (grid - 1) as f32;
    let mut lo = [0usize; 3];
    let mut frac = [0.0f32; 3];
    for dim in 0..3 {
        let pos = components[dim].clamp(0.0, 1.0) * max_index;
        lo[dim] = (pos.floor() as usize).min(grid.saturating_sub(2));
        frac[dim] = pos - lo[dim] as f32;
    }
    let index = |r: usize, g: usize, b: usize| (r * grid + g) * grid + b;
    let mut out = [0.0f32; 3];
    for corner in 0..8u8 {
        let dr = (corner & 1) as usize;
        let dg = ((corner >> 1) & 1) as usize;
        let db = ((corner >> 2) & 1) as usize;
        let weight = (if dr == 1 { frac[0] } else { 1.0 - frac[0] })
            * (if dg == 1 { frac[1] } else { 1.0 - frac[1] })
            * (if db == 1 { frac[2] } else { 1.0 - frac[2] });
        if weight == 0.0 {
            continue;
        }
        let rgb = table[index((lo[0] + dr).min(grid - 1), (lo[1] + dg).min(grid - 1), (lo[2] + db).min(grid - 1))];
        for c in 0..3 {
            out[c] += weight * rgb[c] as f32;
        }
    }
    [out[0].round() as u8, out[1].round() as u8, out[2].round() as u8]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lut1_exact_at_sample_points() {
        let sampler = Sampler::build_1d(|c| {
            let v = (c[0] * 255.0).round() as u8;
            [v, v, v]
        });
        assert_eq!(sampler.sample(&[0.0]), [0, 0, 0]);
        assert_eq!(sampler.sample(&[1.0]), [255, 255, 255]);
    }

    #[test]
    fn lut3_identity_function_round_trips_corners() {
        let sampler = Sampler::build_3d(5, |c| {
            [
                (c[0] * 255.0).round() as u8,
                (c[1] * 255.0).round() as u8,
                (c[2] * 255.0).round() as u8,
            ]
        });
        assert_eq!(sampler.sample(&[0.0, 0.0, 0.0]), [0, 0, 0]);
        assert_eq!(sampler.sample(&[1.0, 1.0, 1.0]), [255, 255, 255]);
    }

    #[test]
    fn lut4_blends_across_k_levels() {
        let sampler = Sampler::build_4d_cmyk(3, |c| {
            let k = c[3];
            let v = (k * 255.0).round() as u8;
            [v, v, v]
        });
        let at_zero = sampler.sample(&[0.0, 0.0, 0.0, 0.0]);
        let at_one = sampler.sample(&[0.0, 0.0, 0.0, 1.0]);
        assert_eq!(at_zero, [0, 0, 0]);
        assert_eq!(at_one, [255, 255, 255]);
    }

    #[test]
    fn bracket_k_clamps_outside_range() {
        let levels = CMYK_K_LEVELS;
        assert_eq!(bracket_k(&levels, -1.0), (0, 0, 0.0));
        assert_eq!(bracket_k(&levels, 2.0), (levels.len() - 1, levels.len() - 1, 0.0));
    }
}

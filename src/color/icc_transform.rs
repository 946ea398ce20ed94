//! ICC transform evaluator (spec §4.7): converts device values through a
//! profile to sRGB, either via the shaper-matrix path (RGB/Gray profiles
//! with TRC + XYZ tags, no `A2B*`) or the LUT path (`A2B*` present).

use crate::color::icc::{IccProfile, Trc, Xyz};

/// PDF rendering intents (spec §4.7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderingIntent {
    Perceptual,
    RelativeColorimetric,
    Saturation,
    AbsoluteColorimetric,
}

impl RenderingIntent {
    fn icc_code(self) -> u32 {
        match self {
            RenderingIntent::Perceptual => 0,
            RenderingIntent::RelativeColorimetric => 1,
            RenderingIntent::Saturation => 2,
            RenderingIntent::AbsoluteColorimetric => 3,
        }
    }
}

/// D50, the PCS-native illuminant (ICC spec), and D65, sRGB's reference
/// white (spec glossary).
const D50: Xyz = Xyz { x: 0.9642, y: 1.0, z: 0.8249 };
const D65: Xyz = Xyz { x: 0.9505, y: 1.0, z: 1.0890 };

/// Bradford chromatic adaptation matrix and its inverse (fixed constants;
/// the profile's own illuminant substitutes for D50 when it differs).
const BRADFORD: [[f64; 3]; 3] = [
    [0.8951, 0.2664, -0.1614],
    [-0.7502, 1.7135, 0.0367],
    [0.0389, -0.0685, 1.0296],
];
const BRADFORD_INV: [[f64; 3]; 3] = [
    [0.9869929, -0.1470543, 0.1599627],
    [0.4323053, 0.5183603, 0.0492912],
    [-0.0085287, 0.0400428, 0.9684867],
];

fn mat_vec(m: &[[f64; 3]; 3], v: [f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

fn mat_mul(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
        }
    }
    out
}

/// D65 -> linear-sRGB matrix (IEC 61966-2-1).
const D65_TO_SRGB_LINEAR: [[f64; 3]; 3] = [
    [3.2404542, -1.5371385, -0.4985314],
    [-0.9692660, 1.8760108, 0.0415560],
    [0.0556434, -0.2040259, 1.0572252],
];

fn srgb_oetf(linear: f64) -> f64 {
    let v = linear.clamp(0.0, 1.0);
    if v <= 0.0031308 {
        v * 12.92
    } else {
        1.055 * v.powf(1.0 / 2.4) - 0.055
    }
}

/// Bradford-adapts `xyz` from `source_white` to `target_white`.
fn chromatic_adapt(xyz: Xyz, source_white: Xyz, target_white: Xyz) -> Xyz {
    let cone_response = |w: Xyz| mat_vec(&BRADFORD, [w.x, w.y, w.z]);
    let src_cone = cone_response(source_white);
    let dst_cone = cone_response(target_white);
    let scale = [
        [dst_cone[0] / src_cone[0], 0.0, 0.0],
        [0.0, dst_cone[1] / src_cone[1], 0.0],
        [0.0, 0.0, dst_cone[2] / src_cone[2]],
    ];
    let adaptation = mat_mul(&mat_mul(&BRADFORD_INV, &scale), &BRADFORD);
    let out = mat_vec(&adaptation, [xyz.x, xyz.y, xyz.z]);
    Xyz { x: out[0], y: out[1], z: out[2] }
}

/// Converts PCS XYZ (D50-adapted, per ICC convention) to 8-bit sRGB.
fn xyz_to_srgb_bytes(xyz: Xyz) -> [u8; 3] {
    let adapted = chromatic_adapt(xyz, D50, D65);
    let linear = mat_vec(&D65_TO_SRGB_LINEAR, [adapted.x, adapted.y, adapted.z]);
    let mut out = [0u8; 3];
    for (channel, value) in out.iter_mut().zip(linear.iter()) {
        *channel = (srgb_oetf(*value) * 255.0).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// Evaluates a profile's shaper-matrix path (spec §4.7): linearize via TRC,
/// multiply by the profile's own `r/g/bXYZ` matrix (or pass through for
/// Gray), chromatic-adapt to D65, convert to sRGB.
fn shaper_matrix_transform(profile: &IccProfile, components: &[f64]) -> Option<[u8; 3]> {
    use crate::color::icc::IccColorSpace;
    match profile.header.color_space {
        IccColorSpace::Gray => {
            let trc = profile.gray_trc.as_ref().unwrap_or(&Trc::Identity);
            let linear = trc.eval(*components.first()?);
            let white = profile.white_point.unwrap_or(D50);
            let xyz = Xyz { x: linear * white.x, y: linear * white.y, z: linear * white.z };
            Some(xyz_to_srgb_bytes(xyz))
        }
        IccColorSpace::Rgb => {
            let r_trc = profile.red_trc.as_ref().unwrap_or(&Trc::Identity);
            let g_trc = profile.green_trc.as_ref().unwrap_or(&Trc::Identity);
            let b_trc = profile.blue_trc.as_ref().unwrap_or(&Trc::Identity);
            let lr = r_trc.eval(*components.first()?);
            let lg = g_trc.eval(*components.get(1)?);
            let lb = b_trc.eval(*components.get(2)?);
            let rx = profile.red_xyz?;
            let gx = profile.green_xyz?;
            let bx = profile.blue_xyz?;
            let matrix = [[rx.x, gx.x, bx.x], [rx.y, gx.y, bx.y], [rx.z, gx.z, bx.z]];
            let xyz_vec = mat_vec(&matrix, [lr, lg, lb]);
            Some(xyz_to_srgb_bytes(Xyz { x: xyz_vec[0], y: xyz_vec[1], z: xyz_vec[2] }))
        }
        _ => None,
    }
}

/// Evaluates a profile's `A2B*` LUT path (spec §4.7) for the given intent.
fn lut_transform(profile: &IccProfile, intent: RenderingIntent, components: &[f64]) -> Option<[u8; 3]> {
    let pipeline = profile.a2b_for_intent(intent.icc_code())?;
    let shaped: Vec<f64> = pipeline
        .input_curves
        .iter()
        .zip(components.iter())
        .map(|(trc, &x)| trc.eval(x))
        .collect();
    let mut pcs = pipeline.sample_clut(&shaped);
    for (value, trc) in pcs.iter_mut().zip(pipeline.output_curves.iter()) {
        *value = trc.eval(*value);
    }
    if let Some(matrix) = pipeline.matrix {
        let offset = pipeline.matrix_offset.unwrap_or([0.0; 3]);
        let v = mat_vec(&matrix, [pcs[0], pcs[1], pcs[2]]);
        pcs = vec![v[0] + offset[0], v[1] + offset[1], v[2] + offset[2]];
    }
    let is_lab = profile.header.pcs == crate::color::icc::IccColorSpace::Lab;
    let xyz = if is_lab {
        lab_to_xyz(pcs[0] * 100.0, pcs[1] * 255.0 - 128.0, pcs[2] * 255.0 - 128.0, D50)
    } else {
        Xyz { x: pcs[0] * 2.0, y: pcs[1] * 2.0, z: pcs[2] * 2.0 }
    };
    Some(xyz_to_srgb_bytes(xyz))
}

fn lab_f_inv(t: f64) -> f64 {
    const DELTA: f64 = 6.0 / 29.0;
    if t > DELTA {
        t * t * t
    } else {
        3.0 * DELTA * DELTA * (t - 4.0 / 29.0)
    }
}

/// CIE L*a*b* to XYZ relative to `white` (used for both ICC Lab PCS and
/// the PDF `Lab` color space, spec §4.8).
pub fn lab_to_xyz(l: f64, a: f64, b: f64, white: Xyz) -> Xyz {
    let fy = (l + 16.0) / 116.0;
    let fx = fy + a / 500.0;
    let fz = fy - b / 200.0;
    Xyz {
        x: white.x * lab_f_inv(fx),
        y: white.y * lab_f_inv(fy),
        z: white.z * lab_f_inv(fz),
    }
}

/// Converts `components` (each normalized `0.0..=1.0` in device order)
/// through `profile` to 8-bit sRGB (spec §4.7). Prefers the LUT path when
/// an `A2B*` table is present, per spec §4.8 ("when A2B present").
pub fn transform_to_srgb(profile: &IccProfile, intent: RenderingIntent, components: &[f64]) -> Option<[u8; 3]> {
    if profile.a2b0.is_some() || profile.a2b1.is_some() || profile.a2b2.is_some() {
        if let Some(rgb) = lut_transform(profile, intent, components) {
            return Some(rgb);
        }
    }
    shaper_matrix_transform(profile, components)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::icc::IccColorSpace;

    fn gray_profile_with_trc(trc: Trc) -> IccProfile {
        IccProfile {
            header: crate::color::icc::IccHeader {
                size: 132,
                version_major: 4,
                version_minor: 0,
                device_class: *b"mntr",
                color_space: IccColorSpace::Gray,
                pcs: IccColorSpace::Xyz,
                rendering_intent: 0,
                illuminant: D50,
            },
            white_point: Some(D50),
            red_xyz: None,
            green_xyz: None,
            blue_xyz: None,
            red_trc: None,
            green_trc: None,
            blue_trc: None,
            gray_trc: Some(trc),
            a2b0: None,
            a2b1: None,
            a2b2: None,
        }
    }

    #[test]
    fn gray_identity_trc_white_maps_to_white_srgb() {
        let profile = gray_profile_with_trc(Trc::Identity);
        let rgb = shaper_matrix_transform(&profile, &[1.0]).unwrap();
        assert!(rgb.iter().all(|&c| c > 250));
    }

    #[test]
    fn gray_identity_trc_black_maps_to_black_srgb() {
        let profile = gray_profile_with_trc(Trc::Identity);
        let rgb = shaper_matrix_transform(&profile, &[0.0]).unwrap();
        assert_eq!(rgb, [0, 0, 0]);
    }

    #[test]
    fn lab_white_point_round_trips_to_near_white() {
        let xyz = lab_to_xyz(100.0, 0.0, 0.0, D65);
        let rgb = xyz_to_srgb_bytes(xyz);
        assert!(rgb.iter().all(|&c| c > 250));
    }
}

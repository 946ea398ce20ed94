//! End-to-end sRGB round trip through the ICC shaper-matrix path, driven
//! entirely through the crate's public API (no byte-level ICC parsing
//! involved — the profile is built the way a host would after its own tag
//! decode, exercising `color::icc_transform::transform_to_srgb` directly).

use pdf_core_engines::color::icc::{IccColorSpace, IccHeader, IccProfile, Trc, Xyz};
use pdf_core_engines::color::icc_transform::{transform_to_srgb, RenderingIntent};

const D50: Xyz = Xyz { x: 0.9642, y: 1.0, z: 0.8249 };

fn srgb_profile() -> IccProfile {
    IccProfile {
        header: IccHeader {
            size: 132,
            version_major: 4,
            version_minor: 0,
            device_class: *b"mntr",
            color_space: IccColorSpace::Rgb,
            pcs: IccColorSpace::Xyz,
            rendering_intent: 1,
            illuminant: D50,
        },
        white_point: Some(D50),
        // D50-adapted sRGB primaries, as encoded in a real sRGB v4 ICC profile.
        red_xyz: Some(Xyz { x: 0.4360747, y: 0.2225045, z: 0.0139322 }),
        green_xyz: Some(Xyz { x: 0.3850649, y: 0.7168786, z: 0.0971045 }),
        blue_xyz: Some(Xyz { x: 0.1430804, y: 0.0606169, z: 0.7139734 }),
        red_trc: Some(Trc::Identity),
        green_trc: Some(Trc::Identity),
        blue_trc: Some(Trc::Identity),
        gray_trc: None,
        a2b0: None,
        a2b1: None,
        a2b2: None,
    }
}

#[test]
fn mid_gray_linear_input_matches_srgb_gamma_encoding() {
    let profile = srgb_profile();
    let rgb = transform_to_srgb(&profile, RenderingIntent::RelativeColorimetric, &[0.5, 0.5, 0.5]).unwrap();
    for channel in rgb {
        assert!((channel as i32 - 188).abs() <= 1, "channel {channel} not within 1 of 188");
    }
}

#[test]
fn white_maps_to_white() {
    let profile = srgb_profile();
    let rgb = transform_to_srgb(&profile, RenderingIntent::RelativeColorimetric, &[1.0, 1.0, 1.0]).unwrap();
    for channel in rgb {
        assert!(channel > 250);
    }
}

#[test]
fn black_maps_to_black() {
    let profile = srgb_profile();
    let rgb = transform_to_srgb(&profile, RenderingIntent::RelativeColorimetric, &[0.0, 0.0, 0.0]).unwrap();
    assert_eq!(rgb, [0, 0, 0]);
}

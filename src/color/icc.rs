//! ICC profile parser (spec §4.6): header, tag directory, and the per-tag
//! decoders the color engine needs (`desc`/`cprt` text, XYZ tristimulus,
//! TRC curves, and `A2B*` LUT pipelines).

use crate::error::{Error, Result};
use byteorder::{BigEndian, ReadBytesExt};
use std::io::Cursor;

fn s15_fixed16(raw: i32) -> f64 {
    raw as f64 / 65536.0
}

fn read_s15_fixed16(cursor: &mut Cursor<&[u8]>) -> Result<f64> {
    Ok(s15_fixed16(cursor.read_i32::<BigEndian>()?))
}

/// A profile's `/XYZ` tristimulus values (`wtpt`, `bkpt`, `rXYZ`, ...).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Xyz {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// A tone reproduction curve (spec §3 `TRC`).
#[derive(Debug, Clone, PartialEq)]
pub enum Trc {
    /// `curv` with `count == 0`.
    Identity,
    /// `curv` with `count == 1`: a single gamma value, `raw / 256.0`.
    Gamma(f64),
    /// `curv` with `count > 1`: normalized samples, resampled to a fixed
    /// length via Catmull-Rom spline if shorter than [`RESAMPLE_LEN`].
    Sampled(Vec<f64>),
    /// `para`: IEC 61966-2-1-style parametric curve, function type `0..=4`.
    Parametric { kind: u16, params: Vec<f64> },
}

/// Target length for resampling short sampled TRCs (spec §4.6).
pub const RESAMPLE_LEN: usize = 1024;

impl Trc {
    /// Evaluates the curve at `x` in `[0.0, 1.0]` (spec §4.7 TRC evaluator).
    pub fn eval(&self, x: f64) -> f64 {
        let x = x.clamp(0.0, 1.0);
        match self {
            Trc::Identity => x,
            Trc::Gamma(g) => x.powf(*g),
            Trc::Sampled(samples) => eval_sampled(samples, x),
            Trc::Parametric { kind, params } => eval_parametric(*kind, params, x),
        }
    }
}

fn eval_sampled(samples: &[f64], x: f64) -> f64 {
    if samples.is_empty() {
        return x;
    }
    if samples.len() == 1 {
        return samples[0];
    }
    let last = (samples.len() - 1) as f64;
    let pos = x * last;
    let idx = pos.floor() as usize;
    if (pos - pos.floor()).abs() < f64::EPSILON || idx + 1 > samples.len() - 1 {
        return samples[idx.min(samples.len() - 1)];
    }
    let frac = pos - idx as f64;
    samples[idx] * (1.0 - frac) + samples[idx + 1] * frac
}

/// Catmull-Rom resample of `samples` up to `RESAMPLE_LEN` entries (spec
/// §4.6: "sampled TRCs shorter than a target length are resampled").
pub fn resample_catmull_rom(samples: &[f64], target_len: usize) -> Vec<f64> {
    if samples.len() >= target_len || samples.len() < 2 {
        return samples.to_vec();
    }
    let n = samples.len();
    let get = |i: isize| -> f64 {
        let clamped = i.clamp(0, n as isize - 1) as usize;
        samples[clamped]
    };
    let mut out = Vec::with_capacity(target_len);
    for j in 0..target_len {
        let t = j as f64 / (target_len - 1) as f64;
        let pos = t * (n - 1) as f64;
        let i = pos.floor() as isize;
        let f = pos - i as f64;
        let p0 = get(i - 1);
        let p1 = get(i);
        let p2 = get(i + 1);
        let p3 = get(i + 2);
        let f2 = f * f;
        let f3 = f2 * f;
        let value = 0.5
            * ((2.0 * p1)
                + (-p0 + p2) * f
                + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * f2
                + (-p0 + 3.0 * p1 - 3.0 * p2 + p3) * f3);
        out.push(value);
    }
    out
}

fn eval_parametric(kind: u16, p: &[f64], x: f64) -> f64 {
    // IEC 61966-2-1 parametric curve types 0..=4.
    match kind {
        0 if !p.is_empty() => x.powf(p[0]),
        1 if p.len() >= 3 => {
            let (g, a, b) = (p[0], p[1], p[2]);
            if x >= -b / a {
                (a * x + b).powf(g)
            } else {
                0.0
            }
        }
        2 if p.len() >= 4 => {
            let (g, a, b, c) = (p[0], p[1], p[2], p[3]);
            if x >= -b / a {
                (a * x + b).powf(g) + c
            } else {
                c
            }
        }
        3 if p.len() >= 5 => {
            let (g, a, b, c, d) = (p[0], p[1], p[2], p[3], p[4]);
            if x >= d {
                (a * x + b).powf(g)
            } else {
                c * x
            }
        }
        4 if p.len() >= 7 => {
            let (g, a, b, c, d, e, f) = (p[0], p[1], p[2], p[3], p[4], p[5], p[6]);
            if x >= d {
                (a * x + b).powf(g) + e
            } else {
                c * x + f
            }
        }
        _ => x,
    }
}

/// A single stage of an `A2B*` LUT pipeline (spec §4.6: `mft1`/`mft2`/`mAB`).
#[derive(Debug, Clone)]
pub struct LutPipeline {
    pub input_channels: usize,
    pub output_channels: usize,
    /// Per-dimension CLUT grid size, length == `input_channels`.
    pub grid_per_dim: Vec<usize>,
    /// Per-input-channel curve, applied before the CLUT.
    pub input_curves: Vec<Trc>,
    /// Flattened CLUT, row-major over `grid_per_dim`, `output_channels`
    /// entries per grid point, normalized to `[0.0, 1.0]`.
    pub clut: Vec<f64>,
    /// Per-output-channel curve, applied after the CLUT.
    pub output_curves: Vec<Trc>,
    /// `mAB`-only 3x3 matrix plus offset, applied before the CLUT stage
    /// when the B-curves/CLUT-less matrix-only path applies.
    pub matrix: Option<[[f64; 3]; 3]>,
    pub matrix_offset: Option<[f64; 3]>,
}

impl LutPipeline {
    fn clut_entry(&self, grid_indices: &[usize]) -> &[f64] {
        let mut flat = 0usize;
        let mut stride = 1usize;
        for (dim, &g) in grid_indices.iter().enumerate().rev() {
            flat += g * stride;
            stride *= self.grid_per_dim[dim];
        }
        let start = flat * self.output_channels;
        &self.clut[start..start + self.output_channels]
    }

    /// Trilinear CLUT interpolation for 3-input pipelines (the common
    /// RGB/Lab case); N-linear for any other dimensionality (spec §4.7).
    pub fn sample_clut(&self, coords: &[f64]) -> Vec<f64> {
        if coords.len() == 3 {
            return self.sample_clut_trilinear(coords);
        }
        self.sample_clut_nlinear(coords)
    }

    fn sample_clut_trilinear(&self, coords: &[f64]) -> Vec<f64> {
        let grid = &self.grid_per_dim;
        let mut lo = [0usize; 3];
        let mut frac = [0.0f64; 3];
        for dim in 0..3 {
            let max_index = (grid[dim].max(1) - 1) as f64;
            let pos = coords[dim].clamp(0.0, 1.0) * max_index;
            lo[dim] = (pos.floor() as usize).min(grid[dim].saturating_sub(2));
            frac[dim] = pos - lo[dim] as f64;
        }
        let mut out = vec![0.0; self.output_channels];
        for corner in 0..8u8 {
            let dx = (corner & 1) as usize;
            let dy = ((corner >> 1) & 1) as usize;
            let dz = ((corner >> 2) & 1) as usize;
            let weight = (if dx == 1 { frac[0] } else { 1.0 - frac[0] })
                * (if dy == 1 { frac[1] } else { 1.0 - frac[1] })
                * (if dz == 1 { frac[2] } else { 1.0 - frac[2] });
            if weight == 0.0 {
                continue;
            }
            let idx = [
                (lo[0] + dx).min(grid[0] - 1),
                (lo[1] + dy).min(grid[1] - 1),
                (lo[2] + dz).min(grid[2] - 1),
            ];
            let entry = self.clut_entry(&idx);
            for (o, v) in out.iter_mut().zip(entry.iter()) {
                *o += weight * v;
            }
        }
        out
    }

    fn sample_clut_nlinear(&self, coords: &[f64]) -> Vec<f64> {
        let dims = self.grid_per_dim.len();
        let mut lo = vec![0usize; dims];
        let mut frac = vec![0.0f64; dims];
        for dim in 0..dims {
            let max_index = (self.grid_per_dim[dim].max(1) - 1) as f64;
            let pos = coords[dim].clamp(0.0, 1.0) * max_index;
            lo[dim] = (pos.floor() as usize).min(self.grid_per_dim[dim].saturating_sub(2));
            frac[dim] = pos - lo[dim] as f64;
        }
        let mut out = vec![0.0; self.output_channels];
        for corner in 0..(1usize << dims) {
            let mut weight = 1.0;
            let mut idx = vec![0usize; dims];
            for dim in 0..dims {
                let bit = (corner >> dim) & 1;
                weight *= if bit == 1 { frac[dim] } else { 1.0 - frac[dim] };
                idx[dim] = (lo[dim] + bit).min(self.grid_per_dim[dim].saturating_sub(1));
            }
            if weight == 0.0 {
                continue;
            }
            let entry = self.clut_entry(&idx);
            for (o, v) in out.iter_mut().zip(entry.iter()) {
                *o += weight * v;
            }
        }
        out
    }
}

/// ICC color space / PCS 4-byte signatures this parser recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IccColorSpace {
    Gray,
    Rgb,
    Cmyk,
    Lab,
    Xyz,
    Other,
}

impl IccColorSpace {
    fn from_signature(sig: &[u8; 4]) -> Self {
        match sig {
            b"GRAY" => IccColorSpace::Gray,
            b"RGB " => IccColorSpace::Rgb,
            b"CMYK" => IccColorSpace::Cmyk,
            b"Lab " => IccColorSpace::Lab,
            b"XYZ " => IccColorSpace::Xyz,
            _ => IccColorSpace::Other,
        }
    }

    pub fn num_components(&self) -> usize {
        match self {
            IccColorSpace::Gray => 1,
            IccColorSpace::Rgb | IccColorSpace::Lab | IccColorSpace::Xyz => 3,
            IccColorSpace::Cmyk => 4,
            IccColorSpace::Other => 0,
        }
    }
}

/// The 128-byte ICC profile header (spec §4.6).
#[derive(Debug, Clone)]
pub struct IccHeader {
    pub size: u32,
    pub version_major: u8,
    pub version_minor: u8,
    pub device_class: [u8; 4],
    pub color_space: IccColorSpace,
    pub pcs: IccColorSpace,
    pub rendering_intent: u32,
    pub illuminant: Xyz,
}

fn parse_header(data: &[u8]) -> Result<IccHeader> {
    if data.len() < 128 {
        return Err(Error::truncated(data.len(), 128 - data.len()));
    }
    let mut cursor = Cursor::new(data);
    let size = cursor.read_u32::<BigEndian>()?;
    cursor.set_position(4);
    let _cmm_type = cursor.read_u32::<BigEndian>()?;
    let version = cursor.read_u32::<BigEndian>()?;
    let version_major = ((version >> 24) & 0xFF) as u8;
    let version_minor = ((version >> 20) & 0x0F) as u8;
    cursor.set_position(12);
    let mut device_class = [0u8; 4];
    std::io::Read::read_exact(&mut cursor, &mut device_class)?;
    let mut color_space_sig = [0u8; 4];
    std::io::Read::read_exact(&mut cursor, &mut color_space_sig)?;
    let mut pcs_sig = [0u8; 4];
    std::io::Read::read_exact(&mut cursor, &mut pcs_sig)?;
    cursor.set_position(36);
    let rendering_intent = { cursor.set_position(64); cursor.read_u32::<BigEndian>()? };
    cursor.set_position(68);
    let illuminant = Xyz {
        x: read_s15_fixed16(&mut cursor)?,
        y: read_s15_fixed16(&mut cursor)?,
        z: read_s15_fixed16(&mut cursor)?,
    };
    Ok(IccHeader {
        size,
        version_major,
        version_minor,
        device_class,
        color_space: IccColorSpace::from_signature(&color_space_sig),
        pcs: IccColorSpace::from_signature(&pcs_sig),
        rendering_intent,
        illuminant,
    })
}

#[derive(Debug, Clone, Copy)]
struct TagEntry {
    signature: [u8; 4],
    offset: u32,
    size: u32,
}

fn parse_tag_directory(data: &[u8]) -> Result<Vec<TagEntry>> {
    if data.len() < 132 {
        return Err(Error::truncated(data.len(), 132 - data.len()));
    }
    let mut cursor = Cursor::new(data);
    cursor.set_position(128);
    let count = cursor.read_u32::<BigEndian>()?;
    let mut entries = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let mut sig = [0u8; 4];
        std::io::Read::read_exact(&mut cursor, &mut sig)?;
        let offset = cursor.read_u32::<BigEndian>()?;
        let size = cursor.read_u32::<BigEndian>()?;
        entries.push(TagEntry { signature: sig, offset, size });
    }
    Ok(entries)
}

fn tag_bytes<'a>(data: &'a [u8], entry: &TagEntry) -> Option<&'a [u8]> {
    let start = entry.offset as usize;
    let end = start.checked_add(entry.size as usize)?;
    // spec §4.6 invariant: tag payload must lie within its declared window.
    if end > data.len() || start > end {
        return None;
    }
    data.get(start..end)
}

fn decode_xyz_tag(bytes: &[u8]) -> Option<Xyz> {
    if bytes.len() < 20 {
        return None;
    }
    let mut cursor = Cursor::new(bytes);
    cursor.set_position(8);
    Some(Xyz {
        x: read_s15_fixed16(&mut cursor).ok()?,
        y: read_s15_fixed16(&mut cursor).ok()?,
        z: read_s15_fixed16(&mut cursor).ok()?,
    })
}

fn decode_curv_tag(bytes: &[u8]) -> Option<Trc> {
    if bytes.len() < 12 {
        return None;
    }
    let mut cursor = Cursor::new(bytes);
    cursor.set_position(8);
    let count = cursor.read_u32::<BigEndian>().ok()?;
    if count == 0 {
        return Some(Trc::Identity);
    }
    if count == 1 {
        let raw = cursor.read_u16::<BigEndian>().ok()?;
        return Some(Trc::Gamma(raw as f64 / 256.0));
    }
    let mut samples = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let raw = cursor.read_u16::<BigEndian>().ok()?;
        samples.push(raw as f64 / 65535.0);
    }
    if samples.len() < RESAMPLE_LEN {
        samples = resample_catmull_rom(&samples, RESAMPLE_LEN);
    }
    Some(Trc::Sampled(samples))
}

fn decode_para_tag(bytes: &[u8]) -> Option<Trc> {
    if bytes.len() < 12 {
        return None;
    }
    let mut cursor = Cursor::new(bytes);
    cursor.set_position(8);
    let kind = cursor.read_u16::<BigEndian>().ok()?;
    cursor.set_position(12);
    let count = match kind {
        0 => 1,
        1 => 3,
        2 => 4,
        3 => 5,
        4 => 7,
        _ => return None,
    };
    let mut params = Vec::with_capacity(count);
    for _ in 0..count {
        params.push(read_s15_fixed16(&mut cursor).ok()?);
    }
    Some(Trc::Parametric { kind, params })
}

/// Decodes a TRC tag (`curv` or `para`, spec §4.6).
fn decode_trc_tag(bytes: &[u8]) -> Option<Trc> {
    let kind = bytes.get(0..4)?;
    match kind {
        b"curv" => decode_curv_tag(bytes),
        b"para" => decode_para_tag(bytes),
        _ => None,
    }
}

fn decode_mft1(bytes: &[u8]) -> Option<LutPipeline> {
    let mut cursor = Cursor::new(bytes);
    cursor.set_position(8);
    let input_channels = cursor.read_u8().ok()? as usize;
    let output_channels = cursor.read_u8().ok()? as usize;
    let grid_points = cursor.read_u8().ok()? as usize;
    let _reserved = cursor.read_u8().ok()?;
    let mut matrix = [[0.0f64; 3]; 3];
    for row in matrix.iter_mut() {
        for cell in row.iter_mut() {
            *cell = read_s15_fixed16(&mut cursor).ok()?;
        }
    }
    let input_table_len = 256usize;
    let output_table_len = 256usize;
    let mut read_curve_set = |channels: usize, table_len: usize| -> Option<Vec<Trc>> {
        let mut curves = Vec::with_capacity(channels);
        for _ in 0..channels {
            let mut samples = Vec::with_capacity(table_len);
            for _ in 0..table_len {
                samples.push(cursor.read_u8().ok()? as f64 / 255.0);
            }
            curves.push(Trc::Sampled(samples));
        }
        Some(curves)
    };
    let input_curves = read_curve_set(input_channels, input_table_len)?;
    let clut_entries = grid_points.pow(input_channels as u32) * output_channels;
    let mut clut = Vec::with_capacity(clut_entries);
    for _ in 0..clut_entries {
        clut.push(cursor.read_u8().ok()? as f64 / 255.0);
    }
    let output_curves = read_curve_set(output_channels, output_table_len)?;
    Some(LutPipeline {
        input_channels,
        output_channels,
        grid_per_dim: vec![grid_points; input_channels],
        input_curves,
        clut,
        output_curves,
        matrix: Some(matrix),
        matrix_offset: None,
    })
}

fn decode_mft2(bytes: &[u8]) -> Option<LutPipeline> {
    let mut cursor = Cursor::new(bytes);
    cursor.set_position(8);
    let input_channels = cursor.read_u8().ok()? as usize;
    let output_channels = cursor.read_u8().ok()? as usize;
    let grid_points = cursor.read_u8().ok()? as usize;
    let _reserved = cursor.read_u8().ok()?;
    let mut matrix = [[0.0f64; 3]; 3];
    for row in matrix.iter_mut() {
        for cell in row.iter_mut() {
            *cell = read_s15_fixed16(&mut cursor).ok()?;
        }
    }
    let input_table_len = cursor.read_u16::<BigEndian>().ok()? as usize;
    let output_table_len = cursor.read_u16::<BigEndian>().ok()? as usize;
    let mut read_curve_set = |channels: usize, table_len: usize| -> Option<Vec<Trc>> {
        let mut curves = Vec::with_capacity(channels);
        for _ in 0..channels {
            let mut samples = Vec::with_capacity(table_len);
            for _ in 0..table_len {
                samples.push(cursor.read_u16::<BigEndian>().ok()? as f64 / 65535.0);
            }
            curves.push(Trc::Sampled(samples));
        }
        Some(curves)
    };
    let input_curves = read_curve_set(input_channels, input_table_len)?;
    let clut_entries = grid_points.pow(input_channels as u32) * output_channels;
    let mut clut = Vec::with_capacity(clut_entries);
    for _ in 0..clut_entries {
        clut.push(cursor.read_u16::<BigEndian>().ok()? as f64 / 65535.0);
    }
    let output_curves = read_curve_set(output_channels, output_table_len)?;
    Some(LutPipeline {
        input_channels,
        output_channels,
        grid_per_dim: vec![grid_points; input_channels],
        input_curves,
        clut,
        output_curves,
        matrix: Some(matrix),
        matrix_offset: None,
    })
}

fn decode_mab(bytes: &[u8]) -> Option<LutPipeline> {
    let mut cursor = Cursor::new(bytes);
    cursor.set_position(8);
    let input_channels = cursor.read_u8().ok()? as usize;
    let output_channels = cursor.read_u8().ok()? as usize;
    cursor.set_position(12);
    let offset_b_curves = cursor.read_u32::<BigEndian>().ok()? as usize;
    let offset_matrix = cursor.read_u32::<BigEndian>().ok()? as usize;
    let offset_m_curves = cursor.read_u32::<BigEndian>().ok()? as usize;
    let offset_clut = cursor.read_u32::<BigEndian>().ok()? as usize;
    let offset_a_curves = cursor.read_u32::<BigEndian>().ok()? as usize;

    let read_curve_set_at = |offset: usize, channels: usize| -> Option<Vec<Trc>> {
        if offset == 0 {
            return Some((0..channels).map(|_| Trc::Identity).collect());
        }
        let mut curves = Vec::with_capacity(channels);
        let mut pos = offset;
        for _ in 0..channels {
            let tag = decode_trc_tag(bytes.get(pos..)?)?;
            // Each curve is tag-type-prefixed and individually offset; a
            // conforming profile packs them contiguously, word-aligned.
            let len = match &tag {
                Trc::Identity => 12,
                Trc::Gamma(_) => 14,
                Trc::Sampled(samples) => 12 + samples.len() * 2,
                Trc::Parametric { kind, .. } => {
                    12 + match kind {
                        0 => 1,
                        1 => 3,
                        2 => 4,
                        3 => 5,
                        4 => 7,
                        _ => 0,
                    } * 4
                }
            };
            pos += (len + 3) & !3;
            curves.push(tag);
        }
        Some(curves)
    };

    let output_curves = read_curve_set_at(offset_b_curves, output_channels)?;
    let input_curves = if offset_a_curves != 0 {
        read_curve_set_at(offset_a_curves, input_channels)?
    } else {
        (0..input_channels).map(|_| Trc::Identity).collect()
    };
    let _m_curves = if offset_m_curves != 0 {
        Some(read_curve_set_at(offset_m_curves, output_channels)?)
    } else {
        None
    };

    let (matrix, matrix_offset) = if offset_matrix != 0 {
        let mut c = Cursor::new(bytes.get(offset_matrix..)?);
        let mut m = [[0.0f64; 3]; 3];
        for row in m.iter_mut() {
            for cell in row.iter_mut() {
                *cell = read_s15_fixed16(&mut c).ok()?;
            }
        }
        let mut off = [0.0f64; 3];
        for cell in off.iter_mut() {
            *cell = read_s15_fixed16(&mut c).ok()?;
        }
        (Some(m), Some(off))
    } else {
        (None, None)
    };

    let (grid_per_dim, clut) = if offset_clut != 0 {
        let clut_bytes = bytes.get(offset_clut..)?;
        let grid_per_dim: Vec<usize> = clut_bytes.get(0..16)?[..input_channels].iter().map(|&b| b as usize).collect();
        let precision = *clut_bytes.get(16)?;
        let total_points: usize = grid_per_dim.iter().product();
        let entries = total_points * output_channels;
        let mut values = Vec::with_capacity(entries);
        let data_start = 20;
        if precision == 1 {
            for i in 0..entries {
                values.push(*clut_bytes.get(data_start + i)? as f64 / 255.0);
            }
        } else {
            let mut c = Cursor::new(&clut_bytes[data_start..]);
            for _ in 0..entries {
                values.push(c.read_u16::<BigEndian>().ok()? as f64 / 65535.0);
            }
        }
        (grid_per_dim, values)
    } else {
        (vec![2; input_channels], Vec::new())
    };

    Some(LutPipeline {
        input_channels,
        output_channels,
        grid_per_dim,
        input_curves,
        clut,
        output_curves,
        matrix,
        matrix_offset,
    })
}

/// A parsed ICC profile (spec §3 `IccProfile`).
#[derive(Debug, Clone)]
pub struct IccProfile {
    pub header: IccHeader,
    pub white_point: Option<Xyz>,
    pub red_xyz: Option<Xyz>,
    pub green_xyz: Option<Xyz>,
    pub blue_xyz: Option<Xyz>,
    pub red_trc: Option<Trc>,
    pub green_trc: Option<Trc>,
    pub blue_trc: Option<Trc>,
    pub gray_trc: Option<Trc>,
    pub a2b0: Option<LutPipeline>,
    pub a2b1: Option<LutPipeline>,
    pub a2b2: Option<LutPipeline>,
}

impl IccProfile {
    /// Parses a v2/v4 ICC profile (spec §4.6). Malformed individual tags
    /// degrade to `None` fields rather than failing the whole parse; only a
    /// truncated header/tag directory is a hard error.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = parse_header(data)?;
        let entries = parse_tag_directory(data)?;
        let find = |sig: &[u8; 4]| entries.iter().find(|e| &e.signature == sig);
        let tag = |sig: &[u8; 4]| find(sig).and_then(|e| tag_bytes(data, e));

        let lut_tag = |sig: &[u8; 4]| -> Option<LutPipeline> {
            let bytes = tag(sig)?;
            match bytes.get(0..4)? {
                b"mft1" => decode_mft1(bytes),
                b"mft2" => decode_mft2(bytes),
                b"mAB " => decode_mab(bytes),
                _ => None,
            }
        };

        Ok(IccProfile {
            white_point: tag(b"wtpt").and_then(decode_xyz_tag),
            red_xyz: tag(b"rXYZ").and_then(decode_xyz_tag),
            green_xyz: tag(b"gXYZ").and_then(decode_xyz_tag),
            blue_xyz: tag(b"bXYZ").and_then(decode_xyz_tag),
            red_trc: tag(b"rTRC").and_then(decode_trc_tag),
            green_trc: tag(b"gTRC").and_then(decode_trc_tag),
            blue_trc: tag(b"bTRC").and_then(decode_trc_tag),
            gray_trc: tag(b"kTRC").and_then(decode_trc_tag),
            a2b0: lut_tag(b"A2B0"),
            a2b1: lut_tag(b"A2B1"),
            a2b2: lut_tag(b"A2B2"),
            header,
        })
    }

    /// The A2B pipeline to use for a given rendering intent, falling back
    /// through `A2B1`/`A2B0` when the intent-specific table is absent.
    pub fn a2b_for_intent(&self, intent: u32) -> Option<&LutPipeline> {
        match intent {
            1 => self.a2b1.as_ref().or(self.a2b0.as_ref()),
            2 => self.a2b2.as_ref().or(self.a2b0.as_ref()),
            _ => self.a2b0.as_ref().or(self.a2b1.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_profile_bytes(color_space: &[u8; 4], pcs: &[u8; 4]) -> Vec<u8> {
        let mut data = vec![0u8; 132];
        data[8] = 4;
        data[9] = 0x20;
        data[16..20].copy_from_slice(color_space);
        data[20..24].copy_from_slice(pcs);
        data[36..40].copy_from_slice(b"acsp");
        // tag count = 0
        data[128..132].copy_from_slice(&0u32.to_be_bytes());
        data
    }

    #[test]
    fn parses_header_color_space_and_version() {
        let data = minimal_profile_bytes(b"RGB ", b"XYZ ");
        let profile = IccProfile::parse(&data).unwrap();
        assert_eq!(profile.header.color_space, IccColorSpace::Rgb);
        assert_eq!(profile.header.pcs, IccColorSpace::Xyz);
        assert_eq!(profile.header.version_major, 4);
    }

    #[test]
    fn truncated_header_is_an_error() {
        let data = vec![0u8; 16];
        assert!(IccProfile::parse(&data).is_err());
    }

    #[test]
    fn curv_identity_and_gamma() {
        let mut identity = vec![0u8; 12];
        identity[0..4].copy_from_slice(b"curv");
        assert_eq!(decode_curv_tag(&identity), Some(Trc::Identity));

        let mut gamma = vec![0u8; 14];
        gamma[0..4].copy_from_slice(b"curv");
        gamma[8..12].copy_from_slice(&1u32.to_be_bytes());
        gamma[12..14].copy_from_slice(&(2 * 256u16).to_be_bytes());
        assert_eq!(decode_curv_tag(&gamma), Some(Trc::Gamma(2.0)));
    }

    #[test]
    fn trc_gamma_eval() {
        let trc = Trc::Gamma(2.2);
        assert!((trc.eval(1.0) - 1.0).abs() < 1e-9);
        assert!((trc.eval(0.5) - 0.5f64.powf(2.2)).abs() < 1e-9);
    }

    #[test]
    fn catmull_rom_resample_preserves_endpoints() {
        let samples = vec![0.0, 0.25, 0.75, 1.0];
        let resampled = resample_catmull_rom(&samples, 16);
        assert_eq!(resampled.len(), 16);
        assert!((resampled[0] - 0.0).abs() < 1e-9);
        assert!((resampled[15] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn parametric_type1_matches_gamma_offset_form() {
        let params = vec![2.0, 1.0, 0.0];
        let trc = Trc::Parametric { kind: 1, params };
        assert!((trc.eval(0.5) - 0.25).abs() < 1e-9);
    }
}

//! JPEG engine (spec §4.9): marker scan, baseline/progressive entropy
//! decode, chroma upsampling, color conversion, and row-at-a-time output.

pub mod band;
pub mod baseline;
pub mod bitreader;
pub mod block;
pub mod color_convert;
pub mod huffman;
pub mod marker;
pub mod progressive;
pub mod upsample;

use crate::error::{Error, Result};
use band::BandPacker;
use block::{dequantize, idct_aan, prescale_quant_table};
use color_convert::transform_for;
use marker::{ComponentInfo, JpgHeader, ParsedStream};
use upsample::{upsample, ComponentPlane};

/// Per-component coefficient storage for the whole image, in natural
/// (not zig-zag) order, one `[i32; 64]` per 8x8 block (spec §4.9.4/§4.9.5).
pub struct ComponentBuffer {
    pub blocks_per_line: usize,
    pub blocks_per_column: usize,
    pub quant_table_id: u8,
    pub h_sampling: u8,
    pub v_sampling: u8,
    pub coefficients: Vec<[i32; 64]>,
}

fn div_ceil(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}

/// Computes a component's block-grid geometry from the frame header (spec
/// §4.9.5: coefficient buffers sized per-component over the whole image).
pub fn component_geometry(header: &JpgHeader, component: &ComponentInfo) -> ComponentBuffer {
    let mcus_per_line = div_ceil(header.width as usize, 8 * header.h_max() as usize);
    let mcus_per_column = div_ceil(header.height as usize, 8 * header.v_max() as usize);
    let blocks_per_line = mcus_per_line * component.h_sampling as usize;
    let blocks_per_column = mcus_per_column * component.v_sampling as usize;
    ComponentBuffer {
        blocks_per_line,
        blocks_per_column,
        quant_table_id: component.quant_table_id,
        h_sampling: component.h_sampling,
        v_sampling: component.v_sampling,
        coefficients: vec![[0i32; 64]; blocks_per_line * blocks_per_column],
    }
}

enum State {
    Unparsed,
    Ready { packer: BandPacker, current_row: usize },
}

/// Lazily-decoding JPEG reader: nothing is parsed until the first
/// [`JpegDecoder::try_read_row`] call (spec §4.9.8 iterator contract).
pub struct JpegDecoder<'a> {
    data: &'a [u8],
    state: State,
    width: usize,
    height: usize,
}

impl<'a> JpegDecoder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        JpegDecoder { data, state: State::Unparsed, width: 0, height: 0 }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Output components per pixel; always 3 (RGB), matching the band
    /// packer's conversion target.
    pub fn output_components(&self) -> usize {
        3
    }

    fn ensure_decoded(&mut self) -> Result<()> {
        if matches!(self.state, State::Ready { .. }) {
            return Ok(());
        }
        let parsed = marker::parse(self.data)?;
        self.width = parsed.header.width as usize;
        self.height = parsed.header.height as usize;

        let buffers = if parsed.header.is_progressive {
            progressive::decode_progressive(&parsed, self.data)?
        } else {
            baseline::decode_baseline(&parsed, self.data)?
        };

        let planes = build_planes(&parsed, &buffers)?;
        let transform = transform_for(parsed.header.components.len() as u8, parsed.header.adobe_transform);
        let packer = BandPacker::new(planes, transform, self.width, self.height);
        self.state = State::Ready { packer, current_row: 0 };
        Ok(())
    }

    /// Decodes (on first call) and copies one output row into `dst`,
    /// returning `true` iff a row was produced. Returns `false` once every
    /// row has been read (spec §4.9.8).
    pub fn try_read_row(&mut self, dst: &mut Vec<u8>) -> Result<bool> {
        self.ensure_decoded()?;
        match &mut self.state {
            State::Ready { packer, current_row } => {
                if *current_row >= packer.height() {
                    return Ok(false);
                }
                *dst = packer.row(*current_row);
                *current_row += 1;
                Ok(true)
            }
            State::Unparsed => unreachable!("ensure_decoded always transitions to Ready"),
        }
    }
}

fn build_planes(parsed: &ParsedStream, buffers: &[ComponentBuffer]) -> Result<Vec<ComponentPlane>> {
    let h_max = parsed.header.h_max();
    let v_max = parsed.header.v_max();
    let target_width = buffers
        .iter()
        .map(|b| b.blocks_per_line * 8 * h_max as usize / b.h_sampling.max(1) as usize)
        .max()
        .unwrap_or(parsed.header.width as usize);
    let target_height = buffers
        .iter()
        .map(|b| b.blocks_per_column * 8 * v_max as usize / b.v_sampling.max(1) as usize)
        .max()
        .unwrap_or(parsed.header.height as usize);

    let mut planes = Vec::with_capacity(buffers.len());
    for buffer in buffers {
        let quant_table = parsed.quant_tables[buffer.quant_table_id as usize]
            .as_ref()
            .ok_or_else(|| Error::malformed("component references missing quant table"))?;
        let prescaled = prescale_quant_table(quant_table);

        let plane_width = buffer.blocks_per_line * 8;
        let plane_height = buffer.blocks_per_column * 8;
        let mut samples = vec![0u8; plane_width * plane_height];
        for block_row in 0..buffer.blocks_per_column {
            for block_col in 0..buffer.blocks_per_line {
                let block_index = block_row * buffer.blocks_per_line + block_col;
                let block = dequantize(&buffer.coefficients[block_index], &prescaled);
                let pixels = idct_aan(&block);
                for (py, row) in pixels.iter().enumerate() {
                    let dst_row = block_row * 8 + py;
                    let dst_start = dst_row * plane_width + block_col * 8;
                    samples[dst_start..dst_start + 8].copy_from_slice(row);
                }
            }
        }

        let native_plane = ComponentPlane { width: plane_width, height: plane_height, samples };
        let upsampled = upsample(&native_plane, target_width, target_height);
        planes.push(ComponentPlane { width: target_width, height: target_height, samples: upsampled });
    }
    Ok(planes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_gray_jpeg() -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8];
        data.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x43, 0x00]);
        data.extend_from_slice(&[1u8; 64]);
        data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x0B, 0x08, 0x00, 0x08, 0x00, 0x08, 0x01, 0x01, 0x11, 0x00]);
        data.extend_from_slice(&[0xFF, 0xC4, 0x00, 0x14, 0x00]);
        data.extend_from_slice(&[1u8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        data.push(0);
        data.extend_from_slice(&[0xFF, 0xC4, 0x00, 0x14, 0x10]);
        data.extend_from_slice(&[1u8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        data.push(0);
        data.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]);
        data.push(0x00);
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }

    #[test]
    fn reads_all_rows_then_stops() {
        let data = minimal_gray_jpeg();
        let mut decoder = JpegDecoder::new(&data);
        let mut dst = Vec::new();
        let mut rows = 0;
        while decoder.try_read_row(&mut dst).unwrap() {
            assert_eq!(dst.len(), decoder.width() * 3);
            rows += 1;
        }
        assert_eq!(rows, decoder.height());
        assert_eq!(decoder.width(), 8);
        assert_eq!(decoder.height(), 8);
    }

    #[test]
    fn dc_only_block_decodes_to_uniform_gray() {
        let data = minimal_gray_jpeg();
        let mut decoder = JpegDecoder::new(&data);
        let mut dst = Vec::new();
        decoder.try_read_row(&mut dst).unwrap();
        assert_eq!(dst, vec![128u8; 24]);
    }
}

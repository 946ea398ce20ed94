//! Baseline (SOF0) per-MCU decode (spec §4.9.4).

use crate::error::Result;
use crate::jpeg::bitreader::BitReader;
use crate::jpeg::block::ZIGZAG_TO_NATURAL;
use crate::jpeg::marker::ParsedStream;
use crate::jpeg::{component_geometry, ComponentBuffer};

const EOB: u8 = 0x00;
const ZRL: u8 = 0xF0;

/// Decodes every scan as baseline MCU interleaving, returning one
/// coefficient buffer per component (spec §4.9.4).
pub fn decode_baseline(parsed: &ParsedStream, data: &[u8]) -> Result<Vec<ComponentBuffer>> {
    let mut buffers: Vec<ComponentBuffer> = parsed
        .header
        .components
        .iter()
        .map(|c| component_geometry(&parsed.header, c))
        .collect();

    let scan = parsed
        .scans
        .first()
        .ok_or_else(|| crate::error::Error::malformed("no SOS scan found"))?;

    let (start, end) = scan.data_range;
    let mut reader = BitReader::new(&data[start..end]);
    let mcus_per_line = div_ceil(parsed.header.width as usize, 8 * parsed.header.h_max() as usize);
    let mcus_per_column = div_ceil(parsed.header.height as usize, 8 * parsed.header.v_max() as usize);
    let total_mcus = mcus_per_line * mcus_per_column;

    let mut prev_dc = vec![0i32; scan.component_selectors.len()];
    let restart_interval = parsed.header.restart_interval as usize;

    for mcu_index in 0..total_mcus {
        if restart_interval != 0 && mcu_index != 0 && mcu_index % restart_interval == 0 {
            reader.expect_restart_marker()?;
            prev_dc.iter_mut().for_each(|dc| *dc = 0);
        }

        let mcu_row = mcu_index / mcus_per_line;
        let mcu_col = mcu_index % mcus_per_line;

        for (sel_index, sel) in scan.component_selectors.iter().enumerate() {
            let comp = &parsed.header.components[sel.component_index];
            let dc_table = parsed.dc_tables[sel.dc_table_id as usize]
                .as_ref()
                .ok_or_else(|| crate::error::Error::malformed("missing DC Huffman table"))?;
            let ac_table = parsed.ac_tables[sel.ac_table_id as usize]
                .as_ref()
                .ok_or_else(|| crate::error::Error::malformed("missing AC Huffman table"))?;

            for v in 0..comp.v_sampling as usize {
                for h in 0..comp.h_sampling as usize {
                    let block_row = mcu_row * comp.v_sampling as usize + v;
                    let block_col = mcu_col * comp.h_sampling as usize + h;
                    let buffer = &mut buffers[sel.component_index];
                    let block_index = block_row * buffer.blocks_per_line + block_col;

                    let mut coefficients = [0i32; 64];
                    let dc_category = dc_table.decode(&mut reader)?;
                    let diff = if dc_category == 0 { 0 } else { reader.read_signed(dc_category as u32) };
                    prev_dc[sel_index] += diff;
                    coefficients[0] = prev_dc[sel_index];

                    let mut pos = 1usize;
                    while pos < 64 {
                        let run_size = ac_table.decode(&mut reader)?;
                        if run_size == EOB {
                            break;
                        }
                        if run_size == ZRL {
                            pos += 16;
                            continue;
                        }
                        let run = (run_size >> 4) as usize;
                        let size = run_size & 0x0F;
                        pos += run;
                        if pos >= 64 {
                            break;
                        }
                        let value = reader.read_signed(size as u32);
                        coefficients[ZIGZAG_TO_NATURAL[pos]] = value;
                        pos += 1;
                    }

                    buffer.coefficients[block_index] = coefficients;
                }
            }
        }
    }

    Ok(buffers)
}

fn div_ceil(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg::marker;

    fn minimal_baseline_jpeg() -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8];
        data.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x43, 0x00]);
        data.extend_from_slice(&[1u8; 64]);
        data.extend_from_slice(&[0xFF, 0xC0, 0x00, 0x0B, 0x08, 0x00, 0x08, 0x00, 0x08, 0x01, 0x01, 0x11, 0x00]);
        data.extend_from_slice(&[0xFF, 0xC4, 0x00, 0x14, 0x00]);
        data.extend_from_slice(&[1u8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        data.push(5);
        data.extend_from_slice(&[0xFF, 0xC4, 0x00, 0x14, 0x10]);
        data.extend_from_slice(&[1u8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        data.push(0);
        data.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]);
        // DC: 1-bit code "0" -> category 5, then 5 magnitude bits "10100" = 20 (positive since >= 16).
        // AC: 1-bit code "0" -> EOB immediately.
        // bits: 0 10100 0  -> pad to byte: 0101000 0 = 0b01010000
        data.push(0b0101_0000);
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }

    #[test]
    fn decodes_single_block_dc_and_eob() {
        let data = minimal_baseline_jpeg();
        let parsed = marker::parse(&data).unwrap();
        let buffers = decode_baseline(&parsed, &data).unwrap();
        assert_eq!(buffers.len(), 1);
        assert_eq!(buffers[0].coefficients.len(), 1);
        assert_eq!(buffers[0].coefficients[0][0], 20);
        assert!(buffers[0].coefficients[0][1..].iter().all(|&v| v == 0));
    }
}

//! Progressive (SOF2) decode: DC/AC initial and refinement scans with
//! EOB-run handling (spec §4.9.5).

use crate::error::{Error, Result};
use crate::jpeg::bitreader::BitReader;
use crate::jpeg::block::ZIGZAG_TO_NATURAL;
use crate::jpeg::huffman::HuffmanTable;
use crate::jpeg::marker::{ParsedStream, ScanSpec};
use crate::jpeg::{component_geometry, ComponentBuffer};

/// Decodes every progressive scan into per-component coefficient buffers.
/// Dequantization and IDCT happen later, identically to baseline, once all
/// scans have contributed (spec §4.9.5: "after all scans, dequantize + IDCT
/// is performed... identical to baseline from that point").
pub fn decode_progressive(parsed: &ParsedStream, data: &[u8]) -> Result<Vec<ComponentBuffer>> {
    let mut buffers: Vec<ComponentBuffer> = parsed
        .header
        .components
        .iter()
        .map(|c| component_geometry(&parsed.header, c))
        .collect();

    for scan in &parsed.scans {
        let (start, end) = scan.data_range;
        let mut reader = BitReader::new(&data[start..end]);
        let is_dc = scan.spectral_start == 0 && scan.spectral_end == 0;
        if is_dc {
            decode_dc_scan(parsed, scan, &mut reader, &mut buffers)?;
        } else {
            decode_ac_scan(parsed, scan, &mut reader, &mut buffers)?;
        }
    }

    Ok(buffers)
}

fn div_ceil(a: usize, b: usize) -> usize {
    (a + b - 1) / b
}

fn dc_table_for<'a>(parsed: &'a ParsedStream, table_id: u8) -> Result<&'a HuffmanTable> {
    parsed.dc_tables[table_id as usize]
        .as_ref()
        .ok_or_else(|| Error::malformed("missing DC Huffman table"))
}

fn decode_dc_scan(parsed: &ParsedStream, scan: &ScanSpec, reader: &mut BitReader, buffers: &mut [ComponentBuffer]) -> Result<()> {
    let mcus_per_line = div_ceil(parsed.header.width as usize, 8 * parsed.header.h_max() as usize);
    let mcus_per_column = div_ceil(parsed.header.height as usize, 8 * parsed.header.v_max() as usize);
    let total_mcus = mcus_per_line * mcus_per_column;
    let restart_interval = parsed.header.restart_interval as usize;
    let mut prev_dc = vec![0i32; scan.component_selectors.len()];
    let al = scan.approx_low;
    let initial = scan.approx_high == 0;

    for mcu_index in 0..total_mcus {
        if restart_interval != 0 && mcu_index != 0 && mcu_index % restart_interval == 0 {
            reader.expect_restart_marker()?;
            prev_dc.iter_mut().for_each(|dc| *dc = 0);
        }
        let mcu_row = mcu_index / mcus_per_line;
        let mcu_col = mcu_index % mcus_per_line;

        for (sel_index, sel) in scan.component_selectors.iter().enumerate() {
            let comp = &parsed.header.components[sel.component_index];
            for v in 0..comp.v_sampling as usize {
                for h in 0..comp.h_sampling as usize {
                    let block_row = mcu_row * comp.v_sampling as usize + v;
                    let block_col = mcu_col * comp.h_sampling as usize + h;
                    let buffer = &mut buffers[sel.component_index];
                    let block_index = block_row * buffer.blocks_per_line + block_col;

                    if initial {
                        let dc_table = dc_table_for(parsed, sel.dc_table_id)?;
                        let category = dc_table.decode(reader)?;
                        let diff = if category == 0 { 0 } else { reader.read_signed(category as u32) };
                        prev_dc[sel_index] += diff;
                        buffer.coefficients[block_index][0] = prev_dc[sel_index] << al;
                    } else {
                        let bit = reader.read_bit() as i32;
                        buffer.coefficients[block_index][0] |= bit << al;
                    }
                }
            }
        }
    }
    Ok(())
}

fn decode_ac_scan(parsed: &ParsedStream, scan: &ScanSpec, reader: &mut BitReader, buffers: &mut [ComponentBuffer]) -> Result<()> {
    let sel = scan
        .component_selectors
        .first()
        .ok_or_else(|| Error::malformed("AC scan has no component selector"))?;
    let comp = &parsed.header.components[sel.component_index];
    let ac_table = parsed.ac_tables[sel.ac_table_id as usize]
        .as_ref()
        .ok_or_else(|| Error::malformed("missing AC Huffman table"))?;

    let buffer = &mut buffers[sel.component_index];
    let total_blocks = buffer.blocks_per_line * buffer.blocks_per_column;
    let restart_interval = parsed.header.restart_interval as usize;
    let ss = scan.spectral_start as usize;
    let se = scan.spectral_end as usize;
    let al = scan.approx_low;
    let initial = scan.approx_high == 0;
    let mut eob_run: u32 = 0;

    // Non-interleaved scans iterate blocks in the component's own raster
    // order (spec §4.9.5); with sampling > 1 this is the full block grid,
    // not one block per MCU.
    let blocks_per_line = buffer.blocks_per_line;
    let _ = comp;

    for block_index in 0..total_blocks {
        if restart_interval != 0 && block_index != 0 && block_index % restart_interval == 0 {
            reader.expect_restart_marker()?;
            eob_run = 0;
        }
        let block = &mut buffer.coefficients[block_index];
        if initial {
            decode_ac_initial_block(reader, ac_table, ss, se, al, &mut eob_run, block)?;
        } else {
            decode_ac_refine_block(reader, ac_table, ss, se, al, &mut eob_run, block)?;
        }
    }
    let _ = blocks_per_line;
    Ok(())
}

fn decode_ac_initial_block(
    reader: &mut BitReader,
    ac_table: &HuffmanTable,
    ss: usize,
    se: usize,
    al: u8,
    eob_run: &mut u32,
    block: &mut [i32; 64],
) -> Result<()> {
    if *eob_run > 0 {
        *eob_run -= 1;
        return Ok(());
    }
    let mut k = ss;
    while k <= se {
        let rs = ac_table.decode(reader)?;
        let run = (rs >> 4) as usize;
        let size = rs & 0x0F;
        if size == 0 {
            if run != 15 {
                *eob_run = (1u32 << run) + reader.read_bits(run as u32) - 1;
                break;
            }
            k += 16;
            continue;
        }
        k += run;
        if k > se {
            break;
        }
        let value = reader.read_signed(size as u32);
        block[ZIGZAG_TO_NATURAL[k]] = value << al;
        k += 1;
    }
    Ok(())
}

fn decode_ac_refine_block(
    reader: &mut BitReader,
    ac_table: &HuffmanTable,
    ss: usize,
    se: usize,
    al: u8,
    eob_run: &mut u32,
    block: &mut [i32; 64],
) -> Result<()> {
    let p1 = 1i32 << al;
    let m1 = -1i32 << al;
    let mut k = ss;

    if *eob_run == 0 {
        while k <= se {
            let rs = ac_table.decode(reader)?;
            let mut run = (rs >> 4) as i32;
            let size = rs & 0x0F;
            let mut new_value = 0i32;
            if size == 0 {
                if run != 15 {
                    *eob_run = (1u32 << run) + reader.read_bits(run as u32);
                    break;
                }
            } else {
                new_value = if reader.read_bit() == 1 { p1 } else { m1 };
            }

            while k <= se {
                let natural = ZIGZAG_TO_NATURAL[k];
                if block[natural] != 0 {
                    if reader.read_bit() == 1 && (block[natural] & p1) == 0 {
                        block[natural] += if block[natural] >= 0 { p1 } else { m1 };
                    }
                } else {
                    if run == 0 {
                        if new_value != 0 {
                            block[natural] = new_value;
                        }
                        k += 1;
                        break;
                    }
                    run -= 1;
                }
                k += 1;
            }
        }
    }

    if *eob_run > 0 {
        while k <= se {
            let natural = ZIGZAG_TO_NATURAL[k];
            if block[natural] != 0 && reader.read_bit() == 1 && (block[natural] & p1) == 0 {
                block[natural] += if block[natural] >= 0 { p1 } else { m1 };
            }
            k += 1;
        }
        *eob_run -= 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jpeg::marker;

    fn progressive_dc_only_jpeg() -> Vec<u8> {
        let mut data = vec![0xFF, 0xD8];
        data.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x43, 0x00]);
        data.extend_from_slice(&[1u8; 64]);
        // SOF2: progressive, 8x8, 1 component.
        data.extend_from_slice(&[0xFF, 0xC2, 0x00, 0x0B, 0x08, 0x00, 0x08, 0x00, 0x08, 0x01, 0x01, 0x11, 0x00]);
        data.extend_from_slice(&[0xFF, 0xC4, 0x00, 0x14, 0x00]);
        data.extend_from_slice(&[1u8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
        data.push(3);
        // DC scan, Ss=0 Se=0 Ah=0 Al=0.
        data.extend_from_slice(&[0xFF, 0xDA, 0x00, 0x08, 0x01, 0x01, 0x00, 0x00, 0x00, 0x00]);
        // DC: code "0" -> category 3, 3 magnitude bits "110" = 6 (positive, MSB set).
        data.push(0b0_110_0000);
        data.extend_from_slice(&[0xFF, 0xD9]);
        data
    }

    #[test]
    fn dc_only_progressive_scan_sets_dc_coefficient() {
        let data = progressive_dc_only_jpeg();
        let parsed = marker::parse(&data).unwrap();
        assert!(parsed.header.is_progressive);
        let buffers = decode_progressive(&parsed, &data).unwrap();
        assert_eq!(buffers[0].coefficients[0][0], 6);
    }
}

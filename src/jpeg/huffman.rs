//! Canonical Huffman table construction and decode (spec §4.9.1: "Build
//! canonical codes (`min_code[l]`, `max_code[l]`, `val_offset[l]`) and an
//! 8-bit fast-decode table for codes of length <= 8").

use crate::error::{Error, Result};
use crate::jpeg::bitreader::BitReader;

/// A DHT table: DC or AC, identified by `table_id` (spec §4.9.1).
pub struct HuffmanTable {
    min_code: [i32; 17],
    max_code: [i32; 17],
    val_ptr: [i32; 17],
    values: Vec<u8>,
    /// `fast[byte] = Some((value, code_length))` for codes of length <= 8,
    /// indexed by the next 8 bits of input (spec §4.9.1).
    fast: Box<[Option<(u8, u8)>; 256]>,
}

impl HuffmanTable {
    /// Builds canonical codes from `{bits[1..=16], values[]}` (spec
    /// §4.9.1 DHT layout).
    pub fn build(bits: &[u8; 16], values: &[u8]) -> Result<Self> {
        let total: usize = bits.iter().map(|&b| b as usize).sum();
        if total != values.len() {
            return Err(Error::malformed("DHT bits/values count mismatch"));
        }

        let mut huff_size = Vec::with_capacity(total);
        for (length, &count) in bits.iter().enumerate() {
            for _ in 0..count {
                huff_size.push((length + 1) as u8);
            }
        }

        let mut huff_code = vec![0u32; total];
        let mut code = 0u32;
        let mut size_pos = 0usize;
        while size_pos < total {
            let size = huff_size[size_pos];
            while size_pos < total && huff_size[size_pos] == size {
                huff_code[size_pos] = code;
                code += 1;
                size_pos += 1;
            }
            code <<= 1;
        }

        let mut min_code = [0i32; 17];
        let mut max_code = [-1i32; 17];
        let mut val_ptr = [0i32; 17];
        let mut pos = 0usize;
        for length in 1..=16usize {
            let count = bits[length - 1] as usize;
            if count == 0 {
                continue;
            }
            val_ptr[length] = pos as i32;
            min_code[length] = huff_code[pos] as i32;
            max_code[length] = huff_code[pos + count - 1] as i32;
            pos += count;
        }

        let mut fast: Box<[Option<(u8, u8)>; 256]> = Box::new([None; 256]);
        for (i, &size) in huff_size.iter().enumerate() {
            if size > 8 {
                continue;
            }
            let code_val = huff_code[i];
            let shift = 8 - size;
            let base = (code_val << shift) as usize;
            let count = 1usize << shift;
            for fill in base..(base + count).min(256) {
                fast[fill] = Some((values[i], size));
            }
        }

        Ok(HuffmanTable { min_code, max_code, val_ptr, values: values.to_vec(), fast })
    }

    /// Decodes one symbol from `reader` (spec §4.9.1 fast/slow path).
    pub fn decode(&self, reader: &mut BitReader) -> Result<u8> {
        if let Some(value) = self.try_fast_decode(reader) {
            return Ok(value);
        }
        let mut code = 0i32;
        for length in 1..=16usize {
            code = (code << 1) | reader.read_bit() as i32;
            if self.max_code[length] >= 0 && code <= self.max_code[length] && code >= self.min_code[length] {
                let index = (self.val_ptr[length] + (code - self.min_code[length])) as usize;
                if let Some(&v) = self.values.get(index) {
                    return Ok(v);
                }
            }
        }
        Err(Error::HuffmanOverrun { bit_position: reader.byte_position() as u64 * 8 })
    }

    fn try_fast_decode(&self, reader: &mut BitReader) -> Option<u8> {
        let peeked = reader.peek_byte();
        let (value, length) = self.fast[peeked as usize]?;
        reader.consume_bits(length as u32);
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A 3-symbol table: `0 -> 0xAA` (1 bit), `10 -> 0xBB` (2 bits),
    /// `11 -> 0xCC` (2 bits).
    fn sample_table() -> HuffmanTable {
        let mut bits = [0u8; 16];
        bits[0] = 1;
        bits[1] = 2;
        let values = vec![0xAA, 0xBB, 0xCC];
        HuffmanTable::build(&bits, &values).unwrap()
    }

    #[test]
    fn decodes_single_bit_code() {
        let table = sample_table();
        let data = [0b0_000_0000];
        let mut reader = BitReader::new(&data);
        assert_eq!(table.decode(&mut reader).unwrap(), 0xAA);
    }

    #[test]
    fn decodes_two_bit_codes() {
        let table = sample_table();
        let data = [0b10_11_0000];
        let mut reader = BitReader::new(&data);
        assert_eq!(table.decode(&mut reader).unwrap(), 0xBB);
        assert_eq!(table.decode(&mut reader).unwrap(), 0xCC);
    }

    #[test]
    fn rejects_bits_values_mismatch() {
        let mut bits = [0u8; 16];
        bits[0] = 2;
        assert!(HuffmanTable::build(&bits, &[0xAA]).is_err());
    }
}

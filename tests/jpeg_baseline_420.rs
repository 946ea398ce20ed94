//! End-to-end baseline 4:2:0 decode through the public `JpegDecoder` API:
//! a single MCU (Y: 2x2 blocks, Cb/Cr: 1 block each), every block DC-only
//! with value 0, cropped to an 8x8 frame.

use pdf_core_engines::jpeg::JpegDecoder;

fn minimal_420_jpeg() -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8];
    // DQT: one all-ones table, shared by every component.
    data.extend_from_slice(&[0xFF, 0xDB, 0x00, 0x43, 0x00]);
    data.extend_from_slice(&[1u8; 64]);
    // SOF0: 8x8, 3 components, Y=2x2 subsampling, Cb/Cr=1x1.
    data.extend_from_slice(&[
        0xFF, 0xC0, 0x00, 0x11, 0x08, 0x00, 0x08, 0x00, 0x08, 0x03, 0x01, 0x22, 0x00, 0x02, 0x11, 0x00, 0x03, 0x11,
        0x00,
    ]);
    // DHT DC class 0, table 0: single 1-bit code -> category 0.
    data.extend_from_slice(&[0xFF, 0xC4, 0x00, 0x14, 0x00]);
    data.extend_from_slice(&[1u8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    data.push(0);
    // DHT AC class 1, table 0: single 1-bit code -> EOB.
    data.extend_from_slice(&[0xFF, 0xC4, 0x00, 0x14, 0x10]);
    data.extend_from_slice(&[1u8, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    data.push(0);
    // SOS: all three components, both tables id 0.
    data.extend_from_slice(&[
        0xFF, 0xDA, 0x00, 0x0C, 0x03, 0x01, 0x00, 0x02, 0x00, 0x03, 0x00, 0x00, 0x3F, 0x00,
    ]);
    // Entropy data: 6 blocks (4 Y + Cb + Cr), each "0" (DC cat0) + "0" (AC EOB) = 12 zero bits.
    data.extend_from_slice(&[0x00, 0x00]);
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

#[test]
fn decodes_420_mcu_to_uniform_gray_rows() {
    let data = minimal_420_jpeg();
    let mut decoder = JpegDecoder::new(&data);
    assert_eq!(decoder.width(), 0);

    let mut dst = Vec::new();
    let mut rows = 0;
    while decoder.try_read_row(&mut dst).unwrap() {
        assert_eq!(dst, vec![128u8; decoder.width() * 3]);
        rows += 1;
    }

    assert_eq!(decoder.width(), 8);
    assert_eq!(decoder.height(), 8);
    assert_eq!(rows, 8);
}

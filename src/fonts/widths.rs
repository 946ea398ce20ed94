//! Glyph width tables for simple and CID fonts (spec §3, §4.4).
//!
//! Widths are always stored in glyph space (1000 units/em) and returned
//! already scaled by 0.001 to text space, matching the font dictionary's
//! `/Widths`, `/MissingWidth`, `/W`, `/DW`, `/W2`, `/DW2` entries.

use std::collections::HashMap;

/// `/Widths` + `/FirstChar`/`/LastChar`/`/MissingWidth` for a simple font.
#[derive(Debug, Clone)]
pub struct SimpleFontWidths {
    first_char: u32,
    widths: Vec<f32>,
    default_width: f32,
}

impl SimpleFontWidths {
    /// Builds the table from the raw `/Widths` array (already in glyph
    /// space) and the declared range/default.
    pub fn new(first_char: u32, widths_glyph_space: Vec<f32>, default_width_glyph_space: f32) -> Self {
        SimpleFontWidths {
            first_char,
            widths: widths_glyph_space.into_iter().map(|w| w * 0.001).collect(),
            default_width: default_width_glyph_space * 0.001,
        }
    }

    /// Width of `code` in text space, or the font's default width if `code`
    /// falls outside `[first_char, last_char]`.
    pub fn width_for_code(&self, code: u32) -> f32 {
        if code < self.first_char {
            return self.default_width;
        }
        let index = (code - self.first_char) as usize;
        self.widths.get(index).copied().unwrap_or(self.default_width)
    }
}

/// `/W` + `/DW` horizontal metrics for a CID font (spec §3
/// `CidFontWidths`).
#[derive(Debug, Clone, Default)]
pub struct CidFontWidths {
    individual: HashMap<u32, f32>,
    ranges: Vec<(u32, u32, f32)>,
    default_width: f32,
}

impl CidFontWidths {
    /// `default_width_glyph_space` is the `/DW` value (1000 if absent, per
    /// spec).
    pub fn new(default_width_glyph_space: f32) -> Self {
        CidFontWidths {
            individual: HashMap::new(),
            ranges: Vec::new(),
            default_width: default_width_glyph_space * 0.001,
        }
    }

    /// Applies one `/W` array entry sequence. `entries` alternates between
    /// the two forms PDF allows:
    /// - `c [w1 w2 ... wn]`: individual widths for CIDs `c, c+1, ..., c+n-1`
    /// - `c_first c_last w`: a single width applied to the whole range
    ///
    /// This mirrors how the array is actually laid out on the page: a
    /// leading CID followed by either a nested array or two more numbers.
    pub fn parse_w_array(&mut self, entries: &[WArrayEntry]) {
        for entry in entries {
            match entry {
                WArrayEntry::Individual { start_cid, widths } => {
                    for (i, w) in widths.iter().enumerate() {
                        self.individual.insert(start_cid + i as u32, w * 0.001);
                    }
                }
                WArrayEntry::Range { first_cid, last_cid, width } => {
                    self.ranges.push((*first_cid, *last_cid, width * 0.001));
                }
            }
        }
    }

    /// Width of `cid` in text space.
    pub fn width_for_cid(&self, cid: u32) -> f32 {
        if let Some(&w) = self.individual.get(&cid) {
            return w;
        }
        for &(lo, hi, w) in &self.ranges {
            if cid >= lo && cid <= hi {
                return w;
            }
        }
        self.default_width
    }
}

/// One logical entry of a `/W` array, pre-split into its two forms by the
/// caller's PDF array walker.
#[derive(Debug, Clone)]
pub enum WArrayEntry {
    /// `c [w1 w2 ... wn]`, widths still in glyph space.
    Individual { start_cid: u32, widths: Vec<f32> },
    /// `c_first c_last w`, width still in glyph space.
    Range { first_cid: u32, last_cid: u32, width: f32 },
}

/// `/W2` + `/DW2` vertical metrics for a CID font in vertical writing mode
/// (spec §3 `CidFontVerticalMetrics`, §8 scenario 2). Each CID maps to
/// `(w1y, v_x, v_y)`: the vertical displacement and the position vector
/// from the horizontal origin to the vertical origin, all in glyph space
/// before the 0.001 scale is applied on read.
#[derive(Debug, Clone)]
pub struct CidFontVerticalMetrics {
    individual: HashMap<u32, (f32, f32, f32)>,
    ranges: Vec<(u32, u32, f32, f32, f32)>,
    /// `/DW2`: `[vy dw1y]` in the PDF array, stored as `(vy, dw1y)`.
    default_position_and_displacement: (f32, f32),
}

impl CidFontVerticalMetrics {
    /// `dw2_glyph_space` is the two-element `/DW2` array, `[880, -1000]` if
    /// absent per spec.
    pub fn new(dw2_glyph_space: [f32; 2]) -> Self {
        CidFontVerticalMetrics {
            individual: HashMap::new(),
            ranges: Vec::new(),
            default_position_and_displacement: (dw2_glyph_space[0], dw2_glyph_space[1]),
        }
    }

    /// Applies one `/W2` array entry sequence, mirroring `/W`'s two forms
    /// but with a 3-tuple per CID instead of a single width:
    /// - `c [w1y1 v1x v1y w1y2 v2x v2y ...]`
    /// - `c_first c_last w1y v1x v1y`
    pub fn parse_w2_array(&mut self, entries: &[W2ArrayEntry]) {
        for entry in entries {
            match entry {
                W2ArrayEntry::Individual { start_cid, metrics } => {
                    for (i, (w1y, vx, vy)) in metrics.iter().enumerate() {
                        self.individual.insert(start_cid + i as u32, (*w1y, *vx, *vy));
                    }
                }
                W2ArrayEntry::Range { first_cid, last_cid, w1y, vx, vy } => {
                    self.ranges.push((*first_cid, *last_cid, *w1y, *vx, *vy));
                }
            }
        }
    }

    /// Returns `(w1y, v_x, v_y)` in text space for `cid`.
    pub fn metrics_for_cid(&self, cid: u32) -> (f32, f32, f32) {
        if let Some(&(w1y, vx, vy)) = self.individual.get(&cid) {
            return (w1y * 0.001, vx * 0.001, vy * 0.001);
        }
        for &(lo, hi, w1y, vx, vy) in &self.ranges {
            if cid >= lo && cid <= hi {
                return (w1y * 0.001, vx * 0.001, vy * 0.001);
            }
        }
        let (vy, dw1y) = self.default_position_and_displacement;
        (dw1y * 0.001, 0.0, vy * 0.001)
    }
}

/// One logical entry of a `/W2` array.
#[derive(Debug, Clone)]
pub enum W2ArrayEntry {
    /// `c [w1y1 v1x v1y ...]`, all still in glyph space.
    Individual { start_cid: u32, metrics: Vec<(f32, f32, f32)> },
    /// `c_first c_last w1y v1x v1y`, still in glyph space.
    Range { first_cid: u32, last_cid: u32, w1y: f32, vx: f32, vy: f32 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_font_widths_use_default_outside_range() {
        let widths = SimpleFontWidths::new(65, vec![600.0, 600.0, 500.0], 250.0);
        assert_eq!(widths.width_for_code(65), 0.6);
        assert_eq!(widths.width_for_code(67), 0.5);
        assert_eq!(widths.width_for_code(64), 0.25);
        assert_eq!(widths.width_for_code(68), 0.25);
    }

    #[test]
    fn cid_widths_individual_form() {
        let mut w = CidFontWidths::new(1000.0);
        w.parse_w_array(&[WArrayEntry::Individual {
            start_cid: 10,
            widths: vec![500.0, 600.0, 700.0],
        }]);
        assert_eq!(w.width_for_cid(10), 0.5);
        assert_eq!(w.width_for_cid(11), 0.6);
        assert_eq!(w.width_for_cid(12), 0.7);
        assert_eq!(w.width_for_cid(13), 1.0);
    }

    #[test]
    fn cid_widths_range_form() {
        let mut w = CidFontWidths::new(1000.0);
        w.parse_w_array(&[WArrayEntry::Range {
            first_cid: 100,
            last_cid: 200,
            width: 550.0,
        }]);
        assert_eq!(w.width_for_cid(150), 0.55);
        assert_eq!(w.width_for_cid(201), 1.0);
    }

    #[test]
    fn vertical_metrics_default_matches_spec_dw2() {
        let vm = CidFontVerticalMetrics::new([880.0, -1000.0]);
        let (w1y, vx, vy) = vm.metrics_for_cid(42);
        assert_eq!(w1y, -1.0);
        assert_eq!(vx, 0.0);
        assert_eq!(vy, 0.88);
    }

    #[test]
    fn vertical_metrics_individual_overrides_default() {
        let mut vm = CidFontVerticalMetrics::new([880.0, -1000.0]);
        vm.parse_w2_array(&[W2ArrayEntry::Individual {
            start_cid: 5,
            metrics: vec![(-900.0, 250.0, 850.0)],
        }]);
        assert_eq!(vm.metrics_for_cid(5), (-0.9, 0.25, 0.85));
        assert_eq!(vm.metrics_for_cid(6), (-1.0, 0.0, 0.88));
    }
}

//! Type 1 -> Type 2 charstring translation (spec §4.3 Stage 3).
//!
//! Type 1 charstrings are interpreted rather than transliterated: hints
//! (`hstem`/`vstem`/`hstem3`/`vstem3`/`dotsection`) are evaluated and
//! dropped, `callsubr` is inlined, flex (`callothersubr` 0/1/2) collapses
//! to a pair of `rrcurveto`s, `div` is evaluated immediately, and
//! `hsbw`/`sbw` fold their sidebearing into the first `moveto` instead of
//! surviving as an operator (Type 2 has none of these concepts). The
//! result contains only: `rmoveto, hmoveto, vmoveto, rlineto, hlineto,
//! vlineto, rrcurveto, vhcurveto, hvcurveto, endchar`.

use crate::error::{Error, Result};

/// A `seac`-composed accented glyph: the base/accent glyphs (identified by
/// their Standard Encoding codes) plus the accent's placement offset. The
/// caller resolves both referenced glyphs and composes them (spec §4.3:
/// `seac` does not survive translation, so this is surfaced instead of
/// inlined here — charstring.rs has no access to the font's glyph table).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeacComposition {
    pub base_code: u8,
    pub accent_code: u8,
    pub adx: f64,
    pub ady: f64,
}

/// Result of translating one Type 1 charstring.
#[derive(Debug, Clone)]
pub struct TranslationOutcome {
    /// The translated Type 2 charstring bytes, valid standalone unless
    /// `seac` is `Some` (in which case it is empty — composition happens
    /// in [`compose_seac`]).
    pub charstring: Vec<u8>,
    /// The glyph's advance width (from `hsbw`/`sbw`), in glyph space.
    pub width: f64,
    /// Present if this glyph was defined via `seac` instead of a normal
    /// outline.
    pub seac: Option<SeacComposition>,
}

struct Translator<'a> {
    subrs: &'a [Vec<u8>],
    stack: Vec<f64>,
    ps_stack: Vec<f64>,
    output: Vec<u8>,
    current_x: f64,
    current_y: f64,
    width: f64,
    pending_sidebearing: Option<(f64, f64)>,
    in_flex: bool,
    flex_start: (f64, f64),
    flex_points: Vec<(f64, f64)>,
    seac: Option<SeacComposition>,
    done: bool,
}

enum StepResult {
    Continue,
    Return,
    Done,
}

impl<'a> Translator<'a> {
    fn new(subrs: &'a [Vec<u8>]) -> Self {
        Translator {
            subrs,
            stack: Vec::new(),
            ps_stack: Vec::new(),
            output: Vec::new(),
            current_x: 0.0,
            current_y: 0.0,
            width: 0.0,
            pending_sidebearing: None,
            in_flex: false,
            flex_start: (0.0, 0.0),
            flex_points: Vec::new(),
            seac: None,
            done: false,
        }
    }

    fn run(&mut self, code: &[u8], depth: usize) -> Result<()> {
        if depth > 20 {
            return Err(Error::malformed("Type1 charstring subroutine recursion too deep"));
        }
        let mut pos = 0;
        while pos < code.len() && !self.done {
            match self.step(code, &mut pos, depth)? {
                StepResult::Continue => {}
                StepResult::Return => return Ok(()),
                StepResult::Done => return Ok(()),
            }
        }
        Ok(())
    }

    fn step(&mut self, code: &[u8], pos: &mut usize, depth: usize) -> Result<StepResult> {
        let b0 = code[*pos];
        *pos += 1;
        match b0 {
            32..=246 => {
                self.stack.push(b0 as f64 - 139.0);
            }
            247..=250 => {
                let b1 = *code.get(*pos).ok_or_else(|| Error::truncated(*pos, 1))?;
                *pos += 1;
                self.stack.push((b0 as f64 - 247.0) * 256.0 + b1 as f64 + 108.0);
            }
            251..=254 => {
                let b1 = *code.get(*pos).ok_or_else(|| Error::truncated(*pos, 1))?;
                *pos += 1;
                self.stack.push(-(b0 as f64 - 251.0) * 256.0 - b1 as f64 - 108.0);
            }
            255 => {
                let bytes = code
                    .get(*pos..*pos + 4)
                    .ok_or_else(|| Error::truncated(*pos, 4))?;
                let v = i32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                *pos += 4;
                self.stack.push(v as f64);
            }
            1 | 3 => {
                // hstem / vstem: hint, drop.
                self.stack.clear();
            }
            4 => {
                let dy = self.stack.pop().unwrap_or(0.0);
                self.stack.clear();
                self.emit_moveto(0.0, dy, 4);
            }
            5 => {
                if self.stack.len() >= 2 {
                    let dy = self.stack.pop().unwrap();
                    let dx = self.stack.pop().unwrap();
                    self.current_x += dx;
                    self.current_y += dy;
                    self.emit_op2(5, dx, dy);
                }
                self.stack.clear();
            }
            6 => {
                if let Some(dx) = self.stack.pop() {
                    self.current_x += dx;
                    self.emit_op1(6, dx);
                }
                self.stack.clear();
            }
            7 => {
                if let Some(dy) = self.stack.pop() {
                    self.current_y += dy;
                    self.emit_op1(7, dy);
                }
                self.stack.clear();
            }
            8 => {
                if self.stack.len() >= 6 {
                    let vals: Vec<f64> = self.stack.drain(self.stack.len() - 6..).collect();
                    self.current_x += vals[0] + vals[2] + vals[4];
                    self.current_y += vals[1] + vals[3] + vals[5];
                    self.emit_number(vals[0]);
                    self.emit_number(vals[1]);
                    self.emit_number(vals[2]);
                    self.emit_number(vals[3]);
                    self.emit_number(vals[4]);
                    self.emit_number(vals[5]);
                    self.output.push(8);
                }
                self.stack.clear();
            }
            9 => {
                // closepath: Type2 paths close implicitly, drop.
                self.stack.clear();
            }
            10 => {
                if let Some(idx) = self.stack.pop() {
                    let idx = idx as i64;
                    if idx >= 0 && (idx as usize) < self.subrs.len() {
                        let code = self.subrs[idx as usize].clone();
                        self.run(&code, depth + 1)?;
                    }
                }
            }
            11 => return Ok(StepResult::Return),
            13 => {
                if self.stack.len() >= 2 {
                    let wx = self.stack.pop().unwrap();
                    let sbx = self.stack.pop().unwrap();
                    self.width = wx;
                    self.current_x = sbx;
                    self.current_y = 0.0;
                    self.pending_sidebearing = Some((sbx, 0.0));
                }
                self.stack.clear();
            }
            14 => {
                self.output.push(14);
                self.done = true;
                return Ok(StepResult::Done);
            }
            21 => {
                if self.stack.len() >= 2 {
                    let dy = self.stack.pop().unwrap();
                    let dx = self.stack.pop().unwrap();
                    self.emit_moveto(dx, dy, 21);
                } else {
                    self.stack.clear();
                }
            }
            22 => {
                if let Some(dx) = self.stack.pop() {
                    self.emit_moveto(dx, 0.0, 22);
                }
                self.stack.clear();
            }
            30 => {
                self.emit_curve_pass_through(30);
            }
            31 => {
                self.emit_curve_pass_through(31);
            }
            12 => {
                let b1 = *code.get(*pos).ok_or_else(|| Error::truncated(*pos, 1))?;
                *pos += 1;
                return self.escape(b1);
            }
            _ => {
                self.stack.clear();
            }
        }
        Ok(StepResult::Continue)
    }

    fn escape(&mut self, op: u8) -> Result<StepResult> {
        match op {
            0 | 1 | 2 => {
                // dotsection / vstem3 / hstem3: hints, drop.
                self.stack.clear();
            }
            6 => {
                if self.stack.len() >= 5 {
                    let achar = self.stack.pop().unwrap() as u8;
                    let bchar = self.stack.pop().unwrap() as u8;
                    let ady = self.stack.pop().unwrap();
                    let adx = self.stack.pop().unwrap();
                    let _asb = self.stack.pop().unwrap();
                    self.seac = Some(SeacComposition { base_code: bchar, accent_code: achar, adx, ady });
                    self.done = true;
                    return Ok(StepResult::Done);
                }
                self.stack.clear();
            }
            7 => {
                if self.stack.len() >= 4 {
                    let wy = self.stack.pop().unwrap();
                    let wx = self.stack.pop().unwrap();
                    let sby = self.stack.pop().unwrap();
                    let sbx = self.stack.pop().unwrap();
                    let _ = wy;
                    self.width = wx;
                    self.current_x = sbx;
                    self.current_y = sby;
                    self.pending_sidebearing = Some((sbx, sby));
                }
                self.stack.clear();
            }
            12 => {
                if self.stack.len() >= 2 {
                    let b = self.stack.pop().unwrap();
                    let a = self.stack.pop().unwrap();
                    self.stack.push(if b != 0.0 { a / b } else { 0.0 });
                }
            }
            16 => {
                self.callothersubr();
            }
            17 => {
                let v = self.ps_stack.pop().unwrap_or(0.0);
                self.stack.push(v);
            }
            33 => {
                if self.stack.len() >= 2 {
                    let y = self.stack.pop().unwrap();
                    let x = self.stack.pop().unwrap();
                    self.current_x = x;
                    self.current_y = y;
                }
                self.stack.clear();
            }
            _ => {
                self.stack.clear();
            }
        }
        Ok(StepResult::Continue)
    }

    fn callothersubr(&mut self) {
        let Some(othersubr) = self.stack.pop() else { return };
        let argcount = self.stack.pop().unwrap_or(0.0) as usize;
        let mut args = Vec::with_capacity(argcount);
        for _ in 0..argcount.min(self.stack.len()) {
            args.push(self.stack.pop().unwrap());
        }
        args.reverse();

        match othersubr as i64 {
            1 => {
                self.in_flex = true;
                self.flex_start = (self.current_x, self.current_y);
                self.flex_points.clear();
            }
            2 => {
                self.flex_points.push((self.current_x, self.current_y));
            }
            0 => {
                if self.flex_points.len() == 7 {
                    self.emit_flex();
                }
                self.in_flex = false;
                // Standard flex end subr pops x then y via two `pop`s.
                self.ps_stack.push(self.current_y);
                self.ps_stack.push(self.current_x);
            }
            3 => {
                // Hint replacement: pass the subroutine number straight
                // through; the referenced subr is itself hint-only and a
                // no-op once interpreted (hstem/vstem are dropped).
                self.ps_stack.push(args.first().copied().unwrap_or(0.0));
            }
            _ => {
                for a in args.into_iter().rev() {
                    self.ps_stack.push(a);
                }
            }
        }
    }

    fn emit_flex(&mut self) {
        let start = self.flex_start;
        let p = &self.flex_points;
        let d1 = (p[1].0 - start.0, p[1].1 - start.1);
        let d2 = (p[2].0 - p[1].0, p[2].1 - p[1].1);
        let d3 = (p[3].0 - p[2].0, p[3].1 - p[2].1);
        let d4 = (p[4].0 - p[3].0, p[4].1 - p[3].1);
        let d5 = (p[5].0 - p[4].0, p[5].1 - p[4].1);
        let d6 = (p[6].0 - p[5].0, p[6].1 - p[5].1);
        for (dx, dy) in [d1, d2, d3, d4, d5, d6] {
            self.emit_number(dx);
            self.emit_number(dy);
        }
        self.output.push(8); // rrcurveto, two curves back to back
    }

    fn emit_moveto(&mut self, dx: f64, dy: f64, op: u8) {
        let (dx, dy) = if let Some((sbx, sby)) = self.pending_sidebearing.take() {
            (dx + sbx, dy + sby)
        } else {
            (dx, dy)
        };
        self.current_x += dx;
        self.current_y += dy;
        if self.in_flex {
            // Flex reference-point movetos are captured by callothersubr(2)
            // reading current_x/current_y; they must not reach the output.
            return;
        }
        match op {
            4 => self.emit_op1(4, dy),
            22 => self.emit_op1(22, dx),
            _ => self.emit_op2(21, dx, dy),
        }
    }

    fn emit_curve_pass_through(&mut self, op: u8) {
        let n = self.stack.len();
        if n == 0 {
            return;
        }
        let vals: Vec<f64> = self.stack.drain(..).collect();
        // Track current point: vhcurveto/hvcurveto alternate the starting
        // tangent direction; summing all deltas is sufficient for this
        // engine's own bookkeeping (bounding the composed-seac offset),
        // not pixel-accurate replay.
        for (i, v) in vals.iter().enumerate() {
            if i % 2 == 0 {
                self.current_x += v;
            } else {
                self.current_y += v;
            }
            self.emit_number(*v);
        }
        self.output.push(op);
    }

    fn emit_op1(&mut self, op: u8, a: f64) {
        self.emit_number(a);
        self.output.push(op);
    }

    fn emit_op2(&mut self, op: u8, a: f64, b: f64) {
        self.emit_number(a);
        self.emit_number(b);
        self.output.push(op);
    }

    /// Encodes an integer operand using the forms shared by Type 1 and
    /// Type 2 charstrings (non-integer deltas are rounded: real-valued
    /// Type 1 coordinates are rare and always device-space rounding
    /// artifacts in practice).
    fn emit_number(&mut self, value: f64) {
        let n = value.round() as i32;
        if (-107..=107).contains(&n) {
            self.output.push((n + 139) as u8);
        } else if (108..=1131).contains(&n) {
            let v = n - 108;
            self.output.push(247 + (v >> 8) as u8);
            self.output.push((v & 0xFF) as u8);
        } else if (-1131..=-108).contains(&n) {
            let v = -n - 108;
            self.output.push(251 + (v >> 8) as u8);
            self.output.push((v & 0xFF) as u8);
        } else {
            self.output.push(255);
            self.output.extend_from_slice(&n.to_be_bytes());
        }
    }
}

/// Translates one decrypted Type 1 charstring into Type 2 form (spec §4.3
/// Stage 3). `subrs` must already be decrypted (see [`crate::fonts::type1`]).
pub fn translate_charstring(charstring: &[u8], subrs: &[Vec<u8>]) -> Result<TranslationOutcome> {
    let mut t = Translator::new(subrs);
    t.run(charstring, 0)?;
    Ok(TranslationOutcome {
        charstring: t.output,
        width: t.width,
        seac: t.seac,
    })
}

/// Composes a `seac`-defined accented glyph from its already-translated
/// base and accent Type 2 charstrings (spec §4.3: `seac` does not survive
/// into the output, so the caller resolves the two referenced glyphs via
/// Standard Encoding and calls this). The accent outline is emitted after
/// an `rmoveto` by `(adx, ady)` relative to the base's origin; both
/// component charstrings' trailing `endchar` bytes are stripped except
/// the final one.
pub fn compose_seac(base: &[u8], accent: &[u8], adx: f64, ady: f64) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(strip_endchar(base));
    let mut mover = Translator::new(&[]);
    mover.emit_op2(21, adx, ady);
    out.extend_from_slice(&mover.output);
    out.extend_from_slice(strip_endchar(accent));
    out.push(14);
    out
}

fn strip_endchar(charstring: &[u8]) -> &[u8] {
    if charstring.last() == Some(&14) {
        &charstring[..charstring.len() - 1]
    } else {
        charstring
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: i32) -> Vec<u8> {
        if (-107..=107).contains(&n) {
            vec![(n + 139) as u8]
        } else {
            panic!("test helper only covers the small-int form")
        }
    }

    #[test]
    fn hsbw_does_not_survive_and_folds_into_first_moveto() {
        // 50 sbx, 600 wx -> hsbw ; then 10 20 rmoveto ; endchar
        let mut cs = Vec::new();
        cs.extend(num(50 - 139 + 139)); // placeholder keeps helper simple
        cs.clear();
        cs.push(139 + 50); // sbx = 50
        cs.extend_from_slice(&[255, 0, 0, 2, 88]); // wx = 600 via 32-bit form
        cs.push(13); // hsbw
        cs.push(139 + 10); // dx = 10
        cs.push(139 + 20); // dy = 20
        cs.push(21); // rmoveto
        cs.push(14); // endchar

        let result = translate_charstring(&cs, &[]).unwrap();
        assert_eq!(result.width, 600.0);
        assert!(!result.charstring.contains(&13));
        // First emitted moveto should have dx = 50+10 = 60.
        assert_eq!(result.charstring[0], (60 + 139) as u8);
    }

    #[test]
    fn hstem_vstem_and_closepath_are_dropped() {
        let cs = vec![
            139 + 10, 139 + 20, 1, // 10 20 hstem
            139 + 10, 139 + 20, 3, // 10 20 vstem
            9,  // closepath
            14, // endchar
        ];
        let result = translate_charstring(&cs, &[]).unwrap();
        assert_eq!(result.charstring, vec![14]);
    }

    #[test]
    fn callsubr_is_inlined_not_emitted() {
        let subr0 = vec![139 + 5, 139 + 5, 21, 11]; // 5 5 rmoveto ; return
        let cs = vec![139 + 0, 10, 14]; // 0 callsubr ; endchar
        let result = translate_charstring(&cs, &[subr0]).unwrap();
        assert!(!result.charstring.contains(&10));
        assert_eq!(result.charstring, vec![139 + 5, 139 + 5, 21, 14]);
    }

    #[test]
    fn div_is_evaluated_not_emitted() {
        // 10 2 div rmoveto-style usage: push 10, push 2, div -> 5; then treat as dy vmoveto
        let cs = vec![139 + 10, 139 + 2, 12, 12, 4, 14]; // 10 2 div vmoveto ; endchar
        let result = translate_charstring(&cs, &[]).unwrap();
        assert!(!result.charstring.windows(2).any(|w| w == [12, 12]));
        assert_eq!(result.charstring, vec![139 + 5, 4, 14]);
    }

    #[test]
    fn seac_does_not_emit_a_charstring_but_is_reported() {
        let cs = vec![
            139, // asb = 0
            139 + 10, // adx = 10
            139 + 5, // ady = 5
            139 + 65, // bchar = 65 ('A')
            139 + 66, // achar = 66 ('B' slot, arbitrary)
            12, 6, // seac
        ];
        let result = translate_charstring(&cs, &[]).unwrap();
        assert!(result.charstring.is_empty());
        let seac = result.seac.unwrap();
        assert_eq!(seac.base_code, 65);
        assert_eq!(seac.accent_code, 66);
        assert_eq!(seac.adx, 10.0);
        assert_eq!(seac.ady, 5.0);
    }

    #[test]
    fn compose_seac_concatenates_with_offset_and_single_endchar() {
        let base = vec![139 + 1, 139 + 1, 21, 14];
        let accent = vec![139 + 2, 139 + 2, 21, 14];
        let composed = compose_seac(&base, &accent, 7.0, 3.0);
        assert_eq!(composed.iter().filter(|&&b| b == 14).count(), 1);
        assert_eq!(*composed.last().unwrap(), 14);
    }
}

//! Band packer (spec §4.9.8): combines per-component upsampled planes into
//! interleaved output rows.

use crate::jpeg::color_convert::{convert_pixel, PixelTransform};
use crate::jpeg::upsample::ComponentPlane;

/// Packs full-resolution, upsampled component planes into RGB rows cropped
/// to `(width, height)`.
pub struct BandPacker {
    planes: Vec<ComponentPlane>,
    transform: PixelTransform,
    width: usize,
    height: usize,
}

impl BandPacker {
    pub fn new(planes: Vec<ComponentPlane>, transform: PixelTransform, width: usize, height: usize) -> Self {
        BandPacker { planes, transform, width, height }
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Packs row `y` as interleaved RGB bytes, `width * 3` long.
    pub fn row(&self, y: usize) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width * 3);
        let mut samples = [0u8; 4];
        for x in 0..self.width {
            for (i, plane) in self.planes.iter().enumerate() {
                if i < samples.len() {
                    samples[i] = plane.get(x, y);
                }
            }
            let rgb = convert_pixel(self.transform, &samples[..self.planes.len().min(4)]);
            out.extend_from_slice(&rgb);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packs_grayscale_row_as_rgb_triples() {
        let plane = ComponentPlane { width: 2, height: 1, samples: vec![10, 200] };
        let packer = BandPacker::new(vec![plane], PixelTransform::Gray, 2, 1);
        let row = packer.row(0);
        assert_eq!(row, vec![10, 10, 10, 200, 200, 200]);
    }

    #[test]
    fn crops_to_requested_width() {
        let plane = ComponentPlane { width: 4, height: 1, samples: vec![1, 2, 3, 4] };
        let packer = BandPacker::new(vec![plane], PixelTransform::Gray, 2, 1);
        let row = packer.row(0);
        assert_eq!(row.len(), 6);
    }
}

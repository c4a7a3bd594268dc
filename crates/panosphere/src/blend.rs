//! Weighted multi-source blend accumulation.
//!
//! Every contributing source adds `weight · color` and `weight` into dense
//! per-pixel accumulators; finalization normalizes by the accumulated weight.
//! The weight is a Chebyshev-distance falloff from the camera's optical
//! center: 1 at the center, exactly 0 on the frustum boundary, so adjacent
//! sources cross-fade continuously in overlap regions.

use image::RgbImage;
use rayon::prelude::*;

use crate::camera::{Projection, RectilinearCamera};
use crate::sampler::sample_bilinear;
use crate::sphere::DirectionField;

/// Weight floor applied before normalization so uncovered pixels resolve to
/// near-black instead of dividing by zero.
pub(crate) const WEIGHT_EPS: f64 = 1e-6;

/// Blend weight of one projected direction.
pub(crate) fn blend_weight(p: &Projection) -> f64 {
    if !p.in_frame {
        return 0.0;
    }
    (1.0 - p.x_norm.abs().max(p.y_norm.abs())).max(0.0)
}

/// Per-pixel RGB and weight accumulators for one stitch invocation.
///
/// Zero-initialized, mutated additively once per contributing source, read
/// only at finalization. Accumulation is commutative and associative, so the
/// result does not depend on source order beyond floating-point rounding;
/// sources are nonetheless processed in input order to keep repeated runs
/// bit-identical.
pub(crate) struct AccumulationBuffer {
    width: u32,
    height: u32,
    color: Vec<[f64; 3]>,
    weight: Vec<f64>,
}

impl AccumulationBuffer {
    pub(crate) fn new(width: u32, height: u32) -> Self {
        let n = width as usize * height as usize;
        Self {
            width,
            height,
            color: vec![[0.0; 3]; n],
            weight: vec![0.0; n],
        }
    }

    /// Accumulate one source over the whole output grid.
    ///
    /// Rows are independent, so they are processed in parallel; each row's
    /// arithmetic is sequential and deterministic.
    pub(crate) fn accumulate_source(
        &mut self,
        img: &RgbImage,
        camera: &RectilinearCamera,
        field: &DirectionField,
    ) {
        debug_assert_eq!(field.width(), self.width);
        debug_assert_eq!(field.height(), self.height);

        let width = self.width as usize;
        self.color
            .par_chunks_mut(width)
            .zip(self.weight.par_chunks_mut(width))
            .enumerate()
            .for_each(|(row, (color_row, weight_row))| {
                let dirs = field.row(row as u32);
                for col in 0..width {
                    let p = camera.project(&dirs[col]);
                    let w = blend_weight(&p);
                    if w <= 0.0 {
                        continue;
                    }
                    let rgb = sample_bilinear(img, p.x_norm, p.y_norm);
                    color_row[col][0] += w * rgb[0];
                    color_row[col][1] += w * rgb[1];
                    color_row[col][2] += w * rgb[2];
                    weight_row[col] += w;
                }
            });
    }

    /// Normalize the accumulators into the final 8-bit panorama.
    pub(crate) fn finalize(&self) -> RgbImage {
        let width = self.width as usize;
        let mut out = RgbImage::new(self.width, self.height);
        let raw: &mut [u8] = &mut out;
        raw.par_chunks_mut(width * 3)
            .enumerate()
            .for_each(|(row, out_row)| {
                let start = row * width;
                for col in 0..width {
                    let w = self.weight[start + col].max(WEIGHT_EPS);
                    let rgb = &self.color[start + col];
                    for c in 0..3 {
                        out_row[col * 3 + c] = (rgb[c] / w).clamp(0.0, 255.0) as u8;
                    }
                }
            });
        out
    }

    #[cfg(test)]
    pub(crate) fn weight_at(&self, col: u32, row: u32) -> f64 {
        self.weight[row as usize * self.width as usize + col as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CameraPose, FieldOfView};
    use crate::test_utils::solid_rgb;

    fn proj(x_norm: f64, y_norm: f64, in_frame: bool) -> Projection {
        Projection {
            x_norm,
            y_norm,
            in_frame,
        }
    }

    #[test]
    fn weight_is_one_at_optical_center() {
        assert_eq!(blend_weight(&proj(0.0, 0.0, true)), 1.0);
    }

    #[test]
    fn weight_is_zero_on_frustum_boundary() {
        assert_eq!(blend_weight(&proj(1.0, 0.0, true)), 0.0);
        assert_eq!(blend_weight(&proj(0.0, -1.0, true)), 0.0);
        assert_eq!(blend_weight(&proj(-1.0, 1.0, true)), 0.0);
    }

    #[test]
    fn weight_uses_chebyshev_distance() {
        let w = blend_weight(&proj(0.25, -0.5, true));
        assert!((w - 0.5).abs() < 1e-12);
    }

    #[test]
    fn masked_projection_has_zero_weight() {
        assert_eq!(blend_weight(&proj(0.0, 0.0, false)), 0.0);
    }

    #[test]
    fn uncovered_pixels_finalize_to_black() {
        let acc = AccumulationBuffer::new(4, 2);
        let out = acc.finalize();
        for p in out.pixels() {
            assert_eq!(p.0, [0, 0, 0]);
        }
    }

    #[test]
    fn overlapping_yaw_ring_covers_the_equator() {
        // Eight horizon-aimed cameras every 45° with a 60° horizontal FOV:
        // adjacent frustums overlap, so no equator pixel is left unweighted.
        let field = DirectionField::generate(64, 32);
        let mut acc = AccumulationBuffer::new(64, 32);
        let img = solid_rgb(8, 6, [255, 255, 255]);
        for i in 0..8 {
            let camera = RectilinearCamera::new(
                CameraPose {
                    pitch_deg: 0.0,
                    yaw_deg: f64::from(i) * 45.0,
                },
                FieldOfView::default(),
            );
            acc.accumulate_source(&img, &camera, &field);
        }
        // Equator rows of a 32-row grid.
        for row in [15, 16] {
            for col in 0..64 {
                assert!(
                    acc.weight_at(col, row) > WEIGHT_EPS,
                    "gap at col={col} row={row}"
                );
            }
        }
        let out = acc.finalize();
        for col in 0..64 {
            let p = out.get_pixel(col, 16).0;
            assert!(p[0] > 250 && p[1] > 250 && p[2] > 250);
        }
    }

    #[test]
    fn single_source_leaves_opposite_hemisphere_unweighted() {
        let field = DirectionField::generate(32, 16);
        let mut acc = AccumulationBuffer::new(32, 16);
        let img = solid_rgb(8, 6, [200, 10, 10]);
        let camera = RectilinearCamera::new(
            CameraPose {
                pitch_deg: 90.0,
                yaw_deg: 0.0,
            },
            FieldOfView::default(),
        );
        acc.accumulate_source(&img, &camera, &field);

        // Pitch 90° aims the view axis at the +y pole, so the bottom half of
        // the grid gets nothing from this source.
        for row in 8..16 {
            for col in 0..32 {
                assert_eq!(acc.weight_at(col, row), 0.0);
            }
        }
    }
}

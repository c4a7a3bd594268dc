//! Bilinear source sampling in normalized image-plane coordinates.

use image::RgbImage;

/// Sample a source raster at normalized `[-1, 1]` image-plane coordinates.
///
/// `x_norm = -1` is the left edge, `y_norm = +1` the top edge (image-plane y
/// increases upward while raster rows increase downward). Coordinates are
/// clamped to the raster rather than rejected; combining the result with the
/// projection's `in_frame` mask is the caller's responsibility.
pub(crate) fn sample_bilinear(img: &RgbImage, x_norm: f64, y_norm: f64) -> [f64; 3] {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return [0.0; 3];
    }

    let max_x = f64::from(w - 1);
    let max_y = f64::from(h - 1);
    let px = ((x_norm + 1.0) * 0.5 * max_x).clamp(0.0, max_x);
    let py = ((1.0 - y_norm) * 0.5 * max_y).clamp(0.0, max_y);

    let x0 = px.floor() as u32;
    let y0 = py.floor() as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);
    let fx = px - f64::from(x0);
    let fy = py - f64::from(y0);

    let p00 = img.get_pixel(x0, y0);
    let p10 = img.get_pixel(x1, y0);
    let p01 = img.get_pixel(x0, y1);
    let p11 = img.get_pixel(x1, y1);

    let mut out = [0.0; 3];
    for (c, v) in out.iter_mut().enumerate() {
        let top = f64::from(p00[c]) * (1.0 - fx) + f64::from(p10[c]) * fx;
        let bottom = f64::from(p01[c]) * (1.0 - fx) + f64::from(p11[c]) * fx;
        *v = top * (1.0 - fy) + bottom * fy;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::solid_rgb;
    use image::Rgb;

    /// 2×2 image with distinct corner values in the red channel.
    fn corner_image() -> RgbImage {
        let mut img = RgbImage::new(2, 2);
        img.put_pixel(0, 0, Rgb([10, 0, 0]));
        img.put_pixel(1, 0, Rgb([20, 0, 0]));
        img.put_pixel(0, 1, Rgb([30, 0, 0]));
        img.put_pixel(1, 1, Rgb([40, 0, 0]));
        img
    }

    #[test]
    fn corners_sample_exactly() {
        let img = corner_image();
        assert_eq!(sample_bilinear(&img, -1.0, 1.0)[0], 10.0); // top-left
        assert_eq!(sample_bilinear(&img, 1.0, 1.0)[0], 20.0); // top-right
        assert_eq!(sample_bilinear(&img, -1.0, -1.0)[0], 30.0); // bottom-left
        assert_eq!(sample_bilinear(&img, 1.0, -1.0)[0], 40.0); // bottom-right
    }

    #[test]
    fn center_is_mean_of_four_neighbors() {
        let img = corner_image();
        let v = sample_bilinear(&img, 0.0, 0.0)[0];
        assert!((v - 25.0).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_coordinates_clamp_to_edges() {
        let img = corner_image();
        assert_eq!(sample_bilinear(&img, -3.0, 5.0)[0], 10.0);
        assert_eq!(sample_bilinear(&img, 3.0, -5.0)[0], 40.0);
    }

    #[test]
    fn single_pixel_image_samples_everywhere() {
        let img = solid_rgb(1, 1, [7, 8, 9]);
        for &(x, y) in &[(-1.0, -1.0), (0.0, 0.0), (1.0, 1.0), (0.3, -0.7)] {
            assert_eq!(sample_bilinear(&img, x, y), [7.0, 8.0, 9.0]);
        }
    }

    #[test]
    fn solid_image_is_constant_under_interpolation() {
        let img = solid_rgb(5, 3, [100, 150, 200]);
        let v = sample_bilinear(&img, 0.37, -0.21);
        assert_eq!(v, [100.0, 150.0, 200.0]);
    }
}

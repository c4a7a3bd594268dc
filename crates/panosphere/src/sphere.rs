//! Equirectangular direction field.
//!
//! Maps every output pixel of the panorama grid to the unit direction it
//! represents on the viewing sphere. The field depends only on the output
//! resolution, so one instance is shared by all sources of a stitch and a
//! process-wide cache reuses it across calls at the same resolution.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use nalgebra::Vector3;
use once_cell::sync::Lazy;

/// Fields are immutable after generation; concurrent readers share one `Arc`.
static FIELD_CACHE: Lazy<Mutex<HashMap<(u32, u32), Arc<DirectionField>>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

const FIELD_CACHE_CAP: usize = 8;

/// Dense `height × width` grid of unit directions, row-major.
///
/// The world frame is right-handed with `y` vertical: pixel `(u, v)` with
/// `u = (col+0.5)/width`, `v = (row+0.5)/height` maps to longitude
/// `λ = u·360 − 180` and latitude `φ = 90 − v·180` (degrees), and to the
/// direction `(cos λ·cos φ, sin φ, sin λ·cos φ)`. `v = 0` is the north
/// pole (zenith), `v = 1` the south pole (nadir), `u = 0.5` longitude 0.
#[derive(Debug, Clone)]
pub struct DirectionField {
    width: u32,
    height: u32,
    dirs: Vec<Vector3<f64>>,
}

impl DirectionField {
    /// Generate the field for one output resolution.
    ///
    /// Pure and deterministic; no error conditions.
    pub fn generate(width: u32, height: u32) -> Self {
        let mut dirs = Vec::with_capacity(width as usize * height as usize);
        for row in 0..height {
            let v = (f64::from(row) + 0.5) / f64::from(height);
            let lat = (90.0 - v * 180.0).to_radians();
            let (sin_lat, cos_lat) = lat.sin_cos();
            for col in 0..width {
                let u = (f64::from(col) + 0.5) / f64::from(width);
                let lon = (u * 360.0 - 180.0).to_radians();
                let (sin_lon, cos_lon) = lon.sin_cos();
                dirs.push(Vector3::new(cos_lon * cos_lat, sin_lat, sin_lon * cos_lat));
            }
        }
        Self { width, height, dirs }
    }

    /// Shared field for `(width, height)`, generated on first use.
    ///
    /// A field is never mutated after insertion, so readers need no locking
    /// beyond the map lookup. The cache holds a handful of resolutions;
    /// beyond that, fields are generated per call instead of evicting.
    pub fn cached(width: u32, height: u32) -> Arc<Self> {
        let mut cache = match FIELD_CACHE.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(field) = cache.get(&(width, height)) {
            return Arc::clone(field);
        }
        let field = Arc::new(Self::generate(width, height));
        if cache.len() < FIELD_CACHE_CAP {
            cache.insert((width, height), Arc::clone(&field));
        }
        field
    }

    /// Output width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Output height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// All directions of one output row.
    pub fn row(&self, row: u32) -> &[Vector3<f64>] {
        let w = self.width as usize;
        let start = row as usize * w;
        &self.dirs[start..start + w]
    }

    /// Direction for one output pixel.
    pub fn dir(&self, col: u32, row: u32) -> &Vector3<f64> {
        &self.dirs[row as usize * self.width as usize + col as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions_are_unit_length() {
        let field = DirectionField::generate(16, 8);
        for row in 0..8 {
            for d in field.row(row) {
                assert!((d.norm() - 1.0).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn single_pixel_grid_points_at_longitude_zero_equator() {
        // u = v = 0.5 → λ = 0, φ = 0 → (1, 0, 0).
        let field = DirectionField::generate(1, 1);
        let d = field.dir(0, 0);
        assert!((d.x - 1.0).abs() < 1e-12);
        assert!(d.y.abs() < 1e-12);
        assert!(d.z.abs() < 1e-12);
    }

    #[test]
    fn equator_row_spans_longitudes() {
        // width 2, height 1: pixel centers at u = 0.25 and u = 0.75,
        // i.e. longitudes -90° and +90° on the equator.
        let field = DirectionField::generate(2, 1);
        let west = field.dir(0, 0);
        let east = field.dir(1, 0);
        assert!(west.x.abs() < 1e-12 && (west.z + 1.0).abs() < 1e-12);
        assert!(east.x.abs() < 1e-12 && (east.z - 1.0).abs() < 1e-12);
        assert!(west.y.abs() < 1e-12 && east.y.abs() < 1e-12);
    }

    #[test]
    fn top_rows_approach_zenith() {
        let field = DirectionField::generate(64, 32);
        // Row 0 sits half a pixel below the north pole; y = sin(φ) close to 1.
        for d in field.row(0) {
            assert!(d.y > 0.99);
        }
        for d in field.row(31) {
            assert!(d.y < -0.99);
        }
    }

    #[test]
    fn cache_returns_shared_instance() {
        let a = DirectionField::cached(32, 16);
        let b = DirectionField::cached(32, 16);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.width(), 32);
        assert_eq!(a.height(), 16);
    }
}

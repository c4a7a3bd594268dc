//! panosphere — pose-driven equirectangular panorama stitching.
//!
//! Blends a set of photographs taken from (approximately) one viewpoint into
//! a seamless 360°×180° equirectangular panorama, using only the known
//! per-photo orientation (pitch, yaw) and a fixed camera field of view.
//! There is no feature detection, matching, or bundle adjustment.
//!
//! The pipeline stages are:
//!
//! 1. **Direction field** – one unit direction per output pixel, computed
//!    once per resolution and cached process-wide.
//! 2. **Projection** – world direction → normalized rectilinear image-plane
//!    coordinates for one camera pose, with a frustum visibility mask.
//! 3. **Sampling** – bilinear lookup of the source raster at the projected
//!    coordinates.
//! 4. **Blending** – weighted accumulation with a Chebyshev falloff from the
//!    optical center, so overlapping sources cross-fade without hard seams.
//!
//! # Public API
//! [`Stitcher`] and [`StitchConfig`] are the primary entry points;
//! [`StitchManifest`] loads the capture-side JSON pose list. The projection
//! primitives ([`RectilinearCamera`], [`DirectionField`]) are exported for
//! callers that need the raw camera math.

mod blend;
pub mod camera;
mod error;
mod manifest;
mod sampler;
pub mod sphere;
mod stitcher;
#[cfg(test)]
mod test_utils;

pub use camera::{CameraPose, FieldOfView, Projection, RectilinearCamera};
pub use error::StitchError;
pub use manifest::StitchManifest;
pub use sphere::DirectionField;
pub use stitcher::{SourceFrame, StitchConfig, Stitcher, DEFAULT_OUTPUT_WIDTH};

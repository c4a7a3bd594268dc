//! Stitch orchestration: sources in, panorama out.

use std::path::{Path, PathBuf};

use image::{ImageReader, RgbImage};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::blend::AccumulationBuffer;
use crate::camera::{CameraPose, FieldOfView, RectilinearCamera};
use crate::error::StitchError;
use crate::sphere::DirectionField;

/// Default equirectangular output width in pixels.
pub const DEFAULT_OUTPUT_WIDTH: u32 = 4096;

/// Per-call stitch configuration.
///
/// Passed explicitly into every call (never process-wide state), so stitches
/// with different FOVs can run concurrently without interference.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct StitchConfig {
    /// Output width in pixels; must be even and positive.
    pub output_width: u32,
    /// Field of view applied identically to every source.
    pub fov: FieldOfView,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            output_width: DEFAULT_OUTPUT_WIDTH,
            fov: FieldOfView::default(),
        }
    }
}

impl StitchConfig {
    /// Output height; always exactly half the width.
    pub fn output_height(&self) -> u32 {
        self.output_width / 2
    }

    /// Reject zero or odd output widths.
    pub fn validate(&self) -> Result<(), StitchError> {
        if self.output_width == 0 || self.output_width % 2 != 0 {
            return Err(StitchError::InvalidOutputWidth(self.output_width));
        }
        Ok(())
    }
}

/// One capture record: a source image path and the pose it was taken at.
///
/// Sources and poses travel as a single ordered sequence rather than
/// parallel lists, so they cannot fall out of step.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceFrame {
    /// Path to the source raster (decoded as 8-bit RGB).
    pub image: PathBuf,
    /// Capture orientation.
    #[serde(flatten)]
    pub pose: CameraPose,
}

/// Primary stitching interface.
///
/// Create once with a configuration, stitch many capture sets.
///
/// # Examples
///
/// ```no_run
/// use panosphere::Stitcher;
/// use std::path::Path;
///
/// let manifest = panosphere::StitchManifest::from_json_file(Path::new("poses.json"))?;
/// let stitcher = Stitcher::with_config(manifest.to_config());
/// let panorama = stitcher.stitch_files(&manifest.frames)?;
/// println!("{}x{} panorama", panorama.width(), panorama.height());
/// # Ok::<(), panosphere::StitchError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Stitcher {
    config: StitchConfig,
}

impl Stitcher {
    /// Stitcher with the default configuration (4096×2048, 60°×45° FOV).
    pub fn new() -> Self {
        Self::default()
    }

    /// Stitcher with full config control.
    pub fn with_config(config: StitchConfig) -> Self {
        Self { config }
    }

    /// Access the current configuration.
    pub fn config(&self) -> &StitchConfig {
        &self.config
    }

    /// Mutable access to configuration for post-construction tuning.
    pub fn config_mut(&mut self) -> &mut StitchConfig {
        &mut self.config
    }

    /// Stitch already-decoded sources into one equirectangular panorama.
    ///
    /// Sources are blended in input order; identical inputs produce
    /// bit-identical output across runs.
    pub fn stitch_images(
        &self,
        frames: &[(RgbImage, CameraPose)],
    ) -> Result<RgbImage, StitchError> {
        self.config.validate()?;
        if frames.is_empty() {
            return Err(StitchError::NoSources);
        }

        let width = self.config.output_width;
        let height = self.config.output_height();
        debug!("stitching {} sources into {width}x{height}", frames.len());

        let field = DirectionField::cached(width, height);
        let mut acc = AccumulationBuffer::new(width, height);
        for (img, pose) in frames {
            let camera = RectilinearCamera::new(*pose, self.config.fov);
            acc.accumulate_source(img, &camera, &field);
        }
        Ok(acc.finalize())
    }

    /// Load every source from disk, then stitch.
    ///
    /// All sources are decoded before any blending starts; one unreadable
    /// source aborts the whole call with no partial output.
    pub fn stitch_files(&self, frames: &[SourceFrame]) -> Result<RgbImage, StitchError> {
        self.config.validate()?;
        if frames.is_empty() {
            return Err(StitchError::NoSources);
        }

        let mut loaded = Vec::with_capacity(frames.len());
        for frame in frames {
            let img = ImageReader::open(&frame.image)
                .map_err(image::ImageError::IoError)
                .and_then(|reader| reader.decode())
                .map_err(|source| StitchError::ImageLoad {
                    path: frame.image.clone(),
                    source,
                })?;
            loaded.push((img.to_rgb8(), frame.pose));
        }
        self.stitch_images(&loaded)
    }

    /// Convenience entry point: stitch and write the panorama to `out`.
    ///
    /// The encoding format follows the file extension (JPEG, PNG, ...).
    pub fn stitch_to_file(
        &self,
        frames: &[SourceFrame],
        out: &Path,
    ) -> Result<(), StitchError> {
        let panorama = self.stitch_files(frames)?;
        panorama.save(out).map_err(|source| StitchError::ImageSave {
            path: out.to_path_buf(),
            source,
        })
    }
}

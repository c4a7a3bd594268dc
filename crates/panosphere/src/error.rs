//! Stitch error taxonomy.

use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the stitching core.
///
/// A stitch never retries and never partially succeeds: either every
/// declared source is loaded and blended, or the call fails with no output.
/// Pixels without any contributing source are not an error; they normalize
/// against a small epsilon weight and come out near-black.
#[derive(Debug, Error)]
pub enum StitchError {
    /// Requested output width is zero or odd (height must be exactly width/2).
    #[error("output width must be a positive even number, got {0}")]
    InvalidOutputWidth(u32),

    /// The source frame list is empty.
    #[error("at least one source frame is required")]
    NoSources,

    /// A declared source could not be read or decoded; the whole stitch is
    /// aborted so the output never silently misrepresents coverage.
    #[error("cannot load source image {path}: {source}")]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The convenience file-writing entry point failed to encode or persist.
    #[error("cannot write panorama {path}: {source}")]
    ImageSave {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Manifest file could not be read.
    #[error("cannot read manifest {path}: {source}")]
    ManifestIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Manifest file is not valid JSON for the expected schema.
    #[error("invalid manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Manifest parsed but violates a semantic constraint.
    #[error("invalid manifest: {0}")]
    ManifestInvalid(String),
}

//! Capture manifest: the JSON handed over by the capture side.
//!
//! An ordered list of `{image, pitch, yaw}` records plus optional stitch
//! options. Record order is blend order.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::camera::FieldOfView;
use crate::error::StitchError;
use crate::stitcher::{SourceFrame, StitchConfig, DEFAULT_OUTPUT_WIDTH};

/// Parsed capture manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StitchManifest {
    /// Ordered capture records; at least one.
    pub frames: Vec<SourceFrame>,
    /// Output width override; defaults to [`DEFAULT_OUTPUT_WIDTH`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_width: Option<u32>,
    /// Field-of-view override; defaults to 60°×45°.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fov: Option<FieldOfView>,
}

impl StitchManifest {
    /// Load and validate a manifest from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, StitchError> {
        let text = fs::read_to_string(path).map_err(|source| StitchError::ManifestIo {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: Self =
            serde_json::from_str(&text).map_err(|source| StitchError::ManifestParse {
                path: path.to_path_buf(),
                source,
            })?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Semantic checks beyond JSON well-formedness.
    pub fn validate(&self) -> Result<(), StitchError> {
        if self.frames.is_empty() {
            return Err(StitchError::NoSources);
        }
        for frame in &self.frames {
            if !frame.pose.is_finite() {
                return Err(StitchError::ManifestInvalid(format!(
                    "non-finite pose for {}",
                    frame.image.display()
                )));
            }
        }
        if let Some(width) = self.output_width {
            if width == 0 || width % 2 != 0 {
                return Err(StitchError::InvalidOutputWidth(width));
            }
        }
        Ok(())
    }

    /// Stitch configuration with manifest overrides applied.
    pub fn to_config(&self) -> StitchConfig {
        StitchConfig {
            output_width: self.output_width.unwrap_or(DEFAULT_OUTPUT_WIDTH),
            fov: self.fov.unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const MANIFEST_JSON: &str = r#"{
        "frames": [
            {"image": "shots/top.jpg", "pitch": 180.0, "yaw": 0.0},
            {"image": "shots/c1.jpg", "pitch": 90.0, "yaw": 0.0},
            {"image": "shots/c2.jpg", "pitch": 90.0, "yaw": 45.0}
        ],
        "output_width": 2048
    }"#;

    #[test]
    fn parses_frames_in_order() {
        let manifest: StitchManifest = serde_json::from_str(MANIFEST_JSON).expect("manifest");
        manifest.validate().expect("valid");
        assert_eq!(manifest.frames.len(), 3);
        assert_eq!(manifest.frames[0].image, PathBuf::from("shots/top.jpg"));
        assert_eq!(manifest.frames[0].pose.pitch_deg, 180.0);
        assert_eq!(manifest.frames[2].pose.yaw_deg, 45.0);
    }

    #[test]
    fn config_applies_overrides_and_defaults() {
        let manifest: StitchManifest = serde_json::from_str(MANIFEST_JSON).expect("manifest");
        let config = manifest.to_config();
        assert_eq!(config.output_width, 2048);
        assert_eq!(config.output_height(), 1024);
        assert_eq!(config.fov, FieldOfView::default());
    }

    #[test]
    fn empty_manifest_is_rejected() {
        let manifest: StitchManifest =
            serde_json::from_str(r#"{"frames": []}"#).expect("manifest");
        assert!(matches!(manifest.validate(), Err(StitchError::NoSources)));
    }

    #[test]
    fn odd_width_override_is_rejected() {
        let manifest: StitchManifest = serde_json::from_str(
            r#"{"frames": [{"image": "a.jpg", "pitch": 0.0, "yaw": 0.0}], "output_width": 99}"#,
        )
        .expect("manifest");
        assert!(matches!(
            manifest.validate(),
            Err(StitchError::InvalidOutputWidth(99))
        ));
    }

    #[test]
    fn missing_file_reports_io_error() {
        let err =
            StitchManifest::from_json_file(Path::new("/nonexistent/poses.json")).unwrap_err();
        assert!(matches!(err, StitchError::ManifestIo { .. }));
    }
}

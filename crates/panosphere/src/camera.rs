//! Rectilinear (pinhole) camera model and pose-driven projection.
//!
//! [`RectilinearCamera`] maps world directions into one camera's normalized
//! image plane. The rotation composition (yaw about the vertical axis, then
//! pitch about the camera's tilted horizontal axis) is the contract with the
//! capture side that records the pose angles; it is deliberately kept
//! bit-for-bit identical to that convention rather than rewritten as a
//! conventional yaw-pitch-roll chain.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Orientation of one source photo, in degrees, as recorded at capture time.
///
/// `pitch` raises the view axis above the horizon: 0° looks level, 90° at
/// the zenith, -90° at the nadir. `yaw` rotates 0°–360° about the vertical
/// axis.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct CameraPose {
    /// Pitch angle in degrees.
    #[serde(rename = "pitch")]
    pub pitch_deg: f64,
    /// Yaw angle in degrees.
    #[serde(rename = "yaw")]
    pub yaw_deg: f64,
}

impl CameraPose {
    /// Returns `true` when both angles are finite.
    pub fn is_finite(self) -> bool {
        self.pitch_deg.is_finite() && self.yaw_deg.is_finite()
    }
}

/// Angular extent of the camera frustum, shared by every source of a stitch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct FieldOfView {
    /// Horizontal field of view in degrees.
    pub h_deg: f64,
    /// Vertical field of view in degrees.
    pub v_deg: f64,
}

impl Default for FieldOfView {
    fn default() -> Self {
        Self {
            h_deg: 60.0,
            v_deg: 45.0,
        }
    }
}

/// Result of projecting one world direction through a camera.
///
/// `x_norm`/`y_norm` are normalized image-plane coordinates; `[-1, 1]` spans
/// the frustum. When `in_frame` is false the coordinates are degenerate
/// (behind the camera or outside the frustum) and must be masked out.
#[derive(Debug, Clone, Copy)]
pub struct Projection {
    /// Normalized horizontal image-plane coordinate.
    pub x_norm: f64,
    /// Normalized vertical image-plane coordinate (positive is up).
    pub y_norm: f64,
    /// True when the direction lies in front of the camera and inside the frustum.
    pub in_frame: bool,
}

/// One camera's pose and field of view with precomputed trigonometric terms.
#[derive(Debug, Clone, Copy)]
pub struct RectilinearCamera {
    cos_pitch: f64,
    sin_pitch: f64,
    cos_yaw: f64,
    sin_yaw: f64,
    tan_half_h: f64,
    tan_half_v: f64,
}

impl RectilinearCamera {
    /// Build the camera for one `(pose, fov)` pair.
    pub fn new(pose: CameraPose, fov: FieldOfView) -> Self {
        let pitch = pose.pitch_deg.to_radians();
        let yaw = pose.yaw_deg.to_radians();
        Self {
            cos_pitch: pitch.cos(),
            sin_pitch: pitch.sin(),
            cos_yaw: yaw.cos(),
            sin_yaw: yaw.sin(),
            tan_half_h: (fov.h_deg.to_radians() / 2.0).tan(),
            tan_half_v: (fov.v_deg.to_radians() / 2.0).tan(),
        }
    }

    /// Project a world direction into this camera's normalized image plane.
    ///
    /// The camera looks down `-z` in its own frame. Directions with
    /// non-negative `rz` get a perspective scale of 0 instead of a division
    /// by zero, which marks them out of frame.
    pub fn project(&self, dir: &Vector3<f64>) -> Projection {
        let (cp, sp) = (self.cos_pitch, self.sin_pitch);
        let (cy, sy) = (self.cos_yaw, self.sin_yaw);

        let rx = dir.x * cy + dir.z * sy;
        let ry = dir.x * (-sy * sp) + dir.y * cp + dir.z * (cy * sp);
        let rz = dir.x * (-sy * cp) - dir.y * sp + dir.z * (cy * cp);

        let in_front = rz < 0.0;
        let scale = if in_front { -1.0 / rz } else { 0.0 };
        let x_norm = rx * scale / self.tan_half_h;
        let y_norm = ry * scale / self.tan_half_v;
        let in_frame = in_front && x_norm.abs() <= 1.0 && y_norm.abs() <= 1.0;

        Projection {
            x_norm,
            y_norm,
            in_frame,
        }
    }
}

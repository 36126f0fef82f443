use serde::{Deserialize, Serialize};

use crate::{GeoAnimError, Result};

pub const FPS_DEFAULT: u32 = 60;
pub const XLIM_DEFAULT: (f64, f64) = (-1.0, 5.0);
pub const YLIM_DEFAULT: (f64, f64) = (-1.0, 5.0);

/// Scene-wide configuration. Built once per [`crate::Scene`] and handed to
/// parts and elements when they are cued.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Frames per second.
    pub fps: u32,
    /// Visible x range in data coordinates.
    pub xlim: (f64, f64),
    /// Visible y range in data coordinates.
    pub ylim: (f64, f64),
    /// Whether the surface should draw its axes (spines).
    pub with_axes: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            fps: FPS_DEFAULT,
            xlim: XLIM_DEFAULT,
            ylim: YLIM_DEFAULT,
            with_axes: false,
        }
    }
}

impl SceneConfig {
    pub fn with_fps(fps: u32) -> Self {
        Self {
            fps,
            ..Self::default()
        }
    }

    /// Interval between frames in milliseconds, for the host loop to honor.
    pub fn interval_ms(&self) -> f64 {
        1000.0 / f64::from(self.fps)
    }

    /// Number of whole frames covered by `seconds`. Fails when the count
    /// does not fit a frame number.
    pub fn frames_for(&self, seconds: f64) -> Result<u64> {
        let frames = (seconds * f64::from(self.fps)).round();
        if frames.is_nan() {
            return Err(GeoAnimError::config(format!("{seconds}s is not a frame count")));
        }
        if frames <= 0.0 {
            return Ok(0);
        }
        if frames >= u64::MAX as f64 {
            return Err(GeoAnimError::config(format!(
                "{seconds}s at {} fps is {frames} frames, more than a scene can hold",
                self.fps
            )));
        }
        Ok(frames as u64)
    }

    pub fn validate(&self) -> Result<()> {
        if self.fps == 0 {
            return Err(GeoAnimError::config("frame rate must be > 0"));
        }
        if !(self.xlim.0 < self.xlim.1) || !(self.ylim.0 < self.ylim.1) {
            return Err(GeoAnimError::config(format!(
                "axis limits must be increasing, got x {:?} y {:?}",
                self.xlim, self.ylim
            )));
        }
        Ok(())
    }
}

//! Viewer orientation shared between the render loop and the optimizer

use std::sync::Mutex;
use std::time::Instant;

use crate::codec::{constrain_angle, CodecSettings};

/// Where the viewer is looking, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerOrientation {
    /// Yaw in `[0, 360)`
    pub h_angle: f64,
    /// Pitch measured from the top of the panorama, 90 is the horizon
    pub v_angle: f64,
}

impl ViewerOrientation {
    /// Normalized orientation: yaw is wrapped, pitch is clamped so the focus
    /// window of `settings` fits inside one eye's half.
    pub fn new(h_angle: f64, v_angle: f64, settings: &CodecSettings) -> Self {
        Self {
            h_angle: constrain_angle(h_angle),
            v_angle: settings.clamp_v_angle(v_angle),
        }
    }
}

impl Default for ViewerOrientation {
    fn default() -> Self {
        Self {
            h_angle: 0.0,
            v_angle: 90.0,
        }
    }
}

/// Orientation plus the instant it was captured
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerSnapshot {
    pub orientation: ViewerOrientation,
    pub captured_at: Instant,
}

/// Mutex-guarded latest viewer orientation.
///
/// Written by the consumer once per iteration, read by the producer before
/// each encode. Critical sections only copy the snapshot in or out.
#[derive(Debug)]
pub struct ViewerState {
    inner: Mutex<ViewerSnapshot>,
}

impl ViewerState {
    pub fn new(orientation: ViewerOrientation) -> Self {
        Self {
            inner: Mutex::new(ViewerSnapshot {
                orientation,
                captured_at: Instant::now(),
            }),
        }
    }

    pub fn snapshot(&self) -> ViewerSnapshot {
        *self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Replace the orientation, stamping it with the current instant
    pub fn update(&self, orientation: ViewerOrientation) {
        self.update_at(orientation, Instant::now());
    }

    pub fn update_at(&self, orientation: ViewerOrientation, captured_at: Instant) {
        let snapshot = ViewerSnapshot {
            orientation,
            captured_at,
        };
        *self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = snapshot;
    }
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new(ViewerOrientation::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_orientation_normalized() {
        let settings = CodecSettings::default();
        let o = ViewerOrientation::new(-30.0, 179.0, &settings);
        assert_eq!(o.h_angle, 330.0);
        assert_eq!(o.v_angle, 165.0);
    }

    #[test]
    fn test_update_replaces_snapshot() {
        let state = ViewerState::default();
        let at = Instant::now() + Duration::from_millis(5);
        let orientation = ViewerOrientation {
            h_angle: 12.0,
            v_angle: 80.0,
        };
        state.update_at(orientation, at);
        let snap = state.snapshot();
        assert_eq!(snap.orientation, orientation);
        assert_eq!(snap.captured_at, at);
    }
}

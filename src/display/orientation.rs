//! Orientation prediction sources driving the viewer state

use std::time::Instant;

use crate::pipeline::ViewerOrientation;

/// Head tracking with motion prediction.
///
/// Asked once per render iteration where the viewer will be looking at
/// `at`, which lies in the future by the observed pipeline latency.
pub trait OrientationSource {
    fn predict_orientation(&mut self, at: Instant) -> ViewerOrientation;
}

impl<F> OrientationSource for F
where
    F: FnMut(Instant) -> ViewerOrientation,
{
    fn predict_orientation(&mut self, at: Instant) -> ViewerOrientation {
        self(at)
    }
}

/// Head turning at a constant yaw rate with a fixed pitch.
///
/// Pitch is given relative to the horizon, as a tracker reports it, and
/// scaled by `pitch_multiplier` into the panorama's vertical angle where
/// 90° is the horizon.
#[derive(Debug, Clone)]
pub struct SimulatedHead {
    origin: Instant,
    start_yaw: f64,
    /// Degrees per second
    yaw_rate: f64,
    pitch: f64,
    pitch_multiplier: f64,
}

impl SimulatedHead {
    pub fn new(start_yaw: f64, yaw_rate: f64, pitch: f64, pitch_multiplier: f64) -> Self {
        Self {
            origin: Instant::now(),
            start_yaw,
            yaw_rate,
            pitch,
            pitch_multiplier,
        }
    }

    pub fn with_origin(mut self, origin: Instant) -> Self {
        self.origin = origin;
        self
    }

    pub fn v_angle(&self) -> f64 {
        90.0 + self.pitch * self.pitch_multiplier
    }
}

impl OrientationSource for SimulatedHead {
    fn predict_orientation(&mut self, at: Instant) -> ViewerOrientation {
        let elapsed = at.saturating_duration_since(self.origin).as_secs_f64();
        ViewerOrientation {
            h_angle: crate::codec::constrain_angle(self.start_yaw + self.yaw_rate * elapsed),
            v_angle: self.v_angle(),
        }
    }
}

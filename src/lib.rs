//! Rolling Snow - core simulation for an endless vertical avoider
//!
//! Core modules:
//! - `sim`: Deterministic simulation (segment recycling, obstacle pool, layouts, player)
//! - `settings`: Data-driven tuning loaded from JSON
//! - `error`: Error type shared by every fallible operation

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{SimError, SimResult};
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Height/width used when a segment has no geometry of its own
    pub const UNIT_SEGMENT_EXTENT: f32 = 1.0;
    /// Smallest external scale multiplier applied to the player
    pub const MIN_SCALE_MULTIPLIER: f32 = 0.01;
    /// Smallest camera half height (avoids a degenerate view)
    pub const MIN_CAMERA_HALF_HEIGHT: f32 = 0.01;
    /// Tolerance used when comparing world-space positions
    pub const POSITION_EPSILON: f32 = 1e-4;
}

/// Move `current` toward `target` by at most `max_delta`
#[inline]
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = target - current;
    if delta.abs() <= max_delta {
        target
    } else {
        current + delta.signum() * max_delta
    }
}

/// Where `value` sits between `a` and `b`, clamped to [0, 1]
#[inline]
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() <= f32::EPSILON {
        return 0.0;
    }
    ((value - a) / (b - a)).clamp(0.0, 1.0)
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_towards_clamps_to_target() {
        assert_eq!(move_towards(0.0, 1.0, 0.25), 0.25);
        assert_eq!(move_towards(0.0, 1.0, 2.0), 1.0);
        assert_eq!(move_towards(1.0, -1.0, 0.5), 0.5);
    }

    #[test]
    fn test_inverse_lerp() {
        assert_eq!(inverse_lerp(50.0, 200.0, 125.0), 0.5);
        assert_eq!(inverse_lerp(50.0, 200.0, 10.0), 0.0);
        assert_eq!(inverse_lerp(50.0, 200.0, 500.0), 1.0);
        assert_eq!(inverse_lerp(5.0, 5.0, 7.0), 0.0);
    }
}

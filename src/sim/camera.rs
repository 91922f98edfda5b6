//! Follow camera with score-driven zoom and track clamping

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::MIN_CAMERA_HALF_HEIGHT;
use crate::error::{SimError, SimResult};
use crate::{inverse_lerp, lerp, move_towards};

/// Camera tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Offset from the player the camera centers on
    pub follow_offset: Vec2,
    /// Lerp speed; zero or less snaps every tick
    pub follow_lerp_speed: f32,
    /// Half of the visible height before zooming
    pub half_height: f32,
    /// Width / height of the view
    pub aspect: f32,
    /// Score at which zooming out begins
    pub zoom_start_score: f32,
    /// Score at which the zoom is complete
    pub max_zoom_score: f32,
    /// Half height once fully zoomed out
    pub zoomed_half_height: f32,
    /// Blend units per second
    pub zoom_lerp_speed: f32,
    /// Keep the view inside the track's horizontal extent
    pub clamp_to_track: bool,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            follow_offset: Vec2::new(0.0, -1.0),
            follow_lerp_speed: 10.0,
            half_height: 5.0,
            aspect: 9.0 / 16.0,
            zoom_start_score: 50.0,
            max_zoom_score: 200.0,
            zoomed_half_height: 7.0,
            zoom_lerp_speed: 4.0,
            clamp_to_track: true,
        }
    }
}

impl CameraSettings {
    pub fn validate(&self) -> SimResult<()> {
        if !(self.half_height > 0.0) || !(self.zoomed_half_height > 0.0) {
            return Err(SimError::config("camera half heights must be positive"));
        }
        if !(self.aspect > 0.0) {
            return Err(SimError::config(format!("camera aspect must be positive, got {}", self.aspect)));
        }
        if !(self.zoom_lerp_speed >= 0.0) {
            return Err(SimError::config(format!(
                "zoom_lerp_speed must not be negative, got {}",
                self.zoom_lerp_speed
            )));
        }
        Ok(())
    }
}

/// Orthographic 2D camera
#[derive(Debug, Clone)]
pub struct Camera {
    pub pos: Vec2,
    half_height: f32,
    /// Current zoom blend in [0, 1]
    blend: f32,
    settings: CameraSettings,
}

impl Camera {
    pub fn new(settings: CameraSettings, target: Vec2) -> Self {
        Self {
            pos: target + settings.follow_offset,
            half_height: settings.half_height.max(MIN_CAMERA_HALF_HEIGHT),
            blend: 0.0,
            settings,
        }
    }

    pub fn settings(&self) -> &CameraSettings {
        &self.settings
    }

    /// Jump straight to `target` and drop any zoom
    pub fn snap_to(&mut self, target: Vec2) {
        self.pos = target + self.settings.follow_offset;
        self.blend = 0.0;
        self.half_height = self.settings.half_height.max(MIN_CAMERA_HALF_HEIGHT);
    }

    /// Ease toward `target` plus the follow offset
    pub fn follow(&mut self, target: Vec2, dt: f32) {
        let goal = target + self.settings.follow_offset;
        if self.settings.follow_lerp_speed <= 0.0 {
            self.pos = goal;
        } else {
            let t = (self.settings.follow_lerp_speed * dt).clamp(0.0, 1.0);
            self.pos = self.pos.lerp(goal, t);
        }
    }

    /// Zoom out as the score rises.
    ///
    /// Returns the scale multiplier that keeps the player's on-screen size
    /// constant (current half height / default half height).
    pub fn update_zoom(&mut self, score: f32, dt: f32) -> f32 {
        let s = &self.settings;
        let desired = if s.max_zoom_score > s.zoom_start_score {
            inverse_lerp(s.zoom_start_score, s.max_zoom_score, score)
        } else if score >= s.zoom_start_score {
            1.0
        } else {
            0.0
        };
        self.blend = move_towards(self.blend, desired, s.zoom_lerp_speed * dt);
        self.half_height = lerp(s.half_height, s.zoomed_half_height, self.blend).max(MIN_CAMERA_HALF_HEIGHT);
        self.half_height / s.half_height.max(MIN_CAMERA_HALF_HEIGHT)
    }

    /// Keep the view within [min_x, max_x], centering when it does not fit
    pub fn clamp_x(&mut self, min_x: f32, max_x: f32) {
        let half_width = self.half_width();
        if max_x - min_x <= half_width * 2.0 {
            self.pos.x = (min_x + max_x) * 0.5;
        } else {
            self.pos.x = self.pos.x.clamp(min_x + half_width, max_x - half_width);
        }
    }

    pub fn half_height(&self) -> f32 {
        self.half_height
    }

    pub fn half_width(&self) -> f32 {
        self.half_height * self.settings.aspect
    }

    pub fn blend(&self) -> f32 {
        self.blend
    }

    pub fn top(&self) -> f32 {
        self.pos.y + self.half_height
    }

    pub fn bottom(&self) -> f32 {
        self.pos.y - self.half_height
    }

    pub fn left(&self) -> f32 {
        self.pos.x - self.half_width()
    }

    pub fn right(&self) -> f32 {
        self.pos.x + self.half_width()
    }

    /// Whether `point` is inside the view
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.left() && point.x <= self.right() && point.y >= self.bottom() && point.y <= self.top()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(
            CameraSettings {
                follow_offset: Vec2::ZERO,
                half_height: 4.0,
                aspect: 0.5,
                ..Default::default()
            },
            Vec2::ZERO,
        )
    }

    #[test]
    fn test_follow_lerps_and_snaps() {
        let mut cam = camera();
        cam.follow(Vec2::new(0.0, -10.0), 0.05);
        assert!((cam.pos.y + 5.0).abs() < 1e-5);

        let mut snap = Camera::new(
            CameraSettings {
                follow_lerp_speed: 0.0,
                ..Default::default()
            },
            Vec2::ZERO,
        );
        snap.follow(Vec2::new(3.0, -10.0), 0.01);
        assert_eq!(snap.pos, Vec2::new(3.0, -11.0));
    }

    #[test]
    fn test_zoom_blends_with_score() {
        let mut cam = Camera::new(CameraSettings::default(), Vec2::ZERO);
        assert_eq!(cam.update_zoom(10.0, 1.0), 1.0);

        // Halfway through the zoom range, with enough time to settle
        for _ in 0..10 {
            cam.update_zoom(125.0, 1.0);
        }
        assert!((cam.blend() - 0.5).abs() < 1e-5);
        assert!((cam.half_height() - 6.0).abs() < 1e-4);
        let multiplier = cam.update_zoom(125.0, 1.0);
        assert!((multiplier - 1.2).abs() < 1e-4);
    }

    #[test]
    fn test_zoom_step_when_range_is_empty() {
        let mut cam = Camera::new(
            CameraSettings {
                zoom_start_score: 30.0,
                max_zoom_score: 30.0,
                zoom_lerp_speed: 100.0,
                ..Default::default()
            },
            Vec2::ZERO,
        );
        cam.update_zoom(29.0, 1.0);
        assert_eq!(cam.blend(), 0.0);
        cam.update_zoom(30.0, 1.0);
        assert_eq!(cam.blend(), 1.0);
    }

    #[test]
    fn test_clamp_x() {
        let mut cam = camera(); // half width 2
        cam.pos.x = 10.0;
        cam.clamp_x(-4.0, 4.0);
        assert_eq!(cam.pos.x, 2.0);

        cam.clamp_x(5.0, 8.0); // narrower than the view
        assert_eq!(cam.pos.x, 6.5);
    }

    #[test]
    fn test_contains() {
        let cam = camera();
        assert!(cam.contains(Vec2::new(1.9, 3.9)));
        assert!(!cam.contains(Vec2::new(2.1, 0.0)));
        assert!(!cam.contains(Vec2::new(0.0, -4.1)));
    }

    #[test]
    fn test_negative_zoom_speed_rejected() {
        let settings = CameraSettings {
            zoom_lerp_speed: -1.0,
            ..Default::default()
        };
        assert!(matches!(settings.validate(), Err(SimError::InvalidConfiguration(_))));

        let settings = CameraSettings {
            zoom_lerp_speed: 0.0,
            ..Default::default()
        };
        settings.validate().unwrap();
    }
}

//! The rolling player: growth, tap/hold steering and descent

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::MIN_SCALE_MULTIPLIER;
use crate::error::{SimError, SimResult};
use crate::{lerp, move_towards};

/// Player tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub start: Vec2,
    /// Collision radius at scale 1
    pub radius: f32,
    pub initial_scale: f32,
    /// Scale units gained per second
    pub growth_rate: f32,
    pub max_scale: f32,
    /// Lateral speed at full steering
    pub move_speed: f32,
    pub descent_speed: f32,
    /// Lowest Y the player descends to (unbounded when unset)
    pub ground_y: Option<f32>,
    /// Hold time (seconds) after which a press starts flipping
    pub tap_threshold: f32,
    /// Seconds a direction flip takes
    pub flip_duration: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            start: Vec2::ZERO,
            radius: 0.5,
            initial_scale: 0.5,
            growth_rate: 0.02,
            max_scale: 1.0,
            move_speed: 3.0,
            descent_speed: 2.0,
            ground_y: None,
            tap_threshold: 0.18,
            flip_duration: 0.3,
        }
    }
}

impl PlayerSettings {
    pub fn validate(&self) -> SimResult<()> {
        if !(self.max_scale > 0.0) || !(self.radius > 0.0) {
            return Err(SimError::config("player radius and max_scale must be positive"));
        }
        if self.growth_rate < 0.0 || self.descent_speed < 0.0 || self.move_speed < 0.0 {
            return Err(SimError::config("player rates must not be negative"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Flip {
    from: f32,
    to: f32,
    progress: f32,
    duration: f32,
}

/// Direction state driven by press/release events.
///
/// The first press picks a side; after that every press reverses direction
/// once, either when released or when held past the tap threshold. The
/// reversal is smoothed over `flip_duration`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Steering {
    /// -1 left, +1 right, 0 not started
    move_dir: i8,
    /// Continuous direction in [-1, 1]
    dir_value: f32,
    pressing: bool,
    held: f32,
    flip: Option<Flip>,
    flipped_this_press: bool,
}

impl Steering {
    pub fn direction(&self) -> f32 {
        self.dir_value
    }

    pub fn move_dir(&self) -> i8 {
        self.move_dir
    }

    pub fn is_flipping(&self) -> bool {
        self.flip.is_some()
    }

    /// `press` carries the world X of a press that began this tick
    pub fn update(&mut self, press: Option<f32>, release: bool, player_x: f32, dt: f32, settings: &PlayerSettings) {
        if self.pressing {
            self.held += dt;
        }

        if let Some(press_x) = press {
            self.flipped_this_press = false;
            if self.move_dir == 0 {
                self.move_dir = if press_x < player_x { -1 } else { 1 };
                self.dir_value = f32::from(self.move_dir);
            } else {
                self.pressing = true;
                self.held = 0.0;
            }
        }

        if release && self.pressing {
            if !self.flipped_this_press && self.flip.is_none() {
                self.start_flip(settings.flip_duration);
            }
            self.pressing = false;
        }

        if self.pressing
            && self.flip.is_none()
            && !self.flipped_this_press
            && self.held >= settings.tap_threshold
        {
            self.start_flip(settings.flip_duration);
        }

        if let Some(flip) = self.flip.as_mut() {
            flip.progress += dt / flip.duration.max(1e-4);
            self.dir_value = lerp(flip.from, flip.to, flip.progress.clamp(0.0, 1.0));
            if flip.progress >= 1.0 {
                self.dir_value = flip.to;
                self.flip = None;
            }
        }
    }

    fn start_flip(&mut self, duration: f32) {
        self.move_dir = -self.move_dir;
        self.flip = Some(Flip {
            from: self.dir_value,
            to: f32::from(self.move_dir),
            progress: 0.0,
            duration,
        });
        self.flipped_this_press = true;
    }
}

/// The player shape
#[derive(Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    base_scale: f32,
    initial_base_scale: f32,
    external_multiplier: f32,
    steering: Steering,
    settings: PlayerSettings,
}

impl Player {
    pub fn new(settings: PlayerSettings) -> Self {
        let base = settings.initial_scale.min(settings.max_scale);
        Self {
            pos: settings.start,
            base_scale: base,
            initial_base_scale: base,
            external_multiplier: 1.0,
            steering: Steering::default(),
            settings,
        }
    }

    /// Back to the start position, size and steering
    pub fn reset(&mut self) {
        self.pos = self.settings.start;
        self.base_scale = self.initial_base_scale;
        self.external_multiplier = 1.0;
        self.steering = Steering::default();
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    pub fn steering(&self) -> &Steering {
        &self.steering
    }

    pub fn base_scale(&self) -> f32 {
        self.base_scale
    }

    /// Visible scale (growth times camera compensation)
    pub fn scale(&self) -> f32 {
        self.base_scale * self.external_multiplier
    }

    /// Collision radius in world units
    pub fn radius(&self) -> f32 {
        self.settings.radius * self.scale()
    }

    pub fn set_external_scale_multiplier(&mut self, multiplier: f32) {
        self.external_multiplier = multiplier.max(MIN_SCALE_MULTIPLIER);
    }

    /// Grow, steer and move for one tick
    pub fn update(&mut self, press: Option<f32>, release: bool, dt: f32) {
        if self.base_scale < self.settings.max_scale {
            self.base_scale = (self.base_scale + self.settings.growth_rate * dt).min(self.settings.max_scale);
        }

        self.steering.update(press, release, self.pos.x, dt, &self.settings);

        let step = self.settings.descent_speed * dt;
        self.pos.y = match self.settings.ground_y {
            Some(ground) => move_towards(self.pos.y, ground, step),
            None => self.pos.y - step,
        };

        let dir = self.steering.direction();
        if dir.abs() > 0.001 {
            self.pos.x += dir * self.settings.move_speed * dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn still_player() -> Player {
        Player::new(PlayerSettings {
            descent_speed: 0.0,
            ..Default::default()
        })
    }

    #[test]
    fn test_growth_caps_at_max() {
        let mut player = Player::new(PlayerSettings {
            growth_rate: 1.0,
            ..Default::default()
        });
        assert_eq!(player.base_scale(), 0.5);
        for _ in 0..120 {
            player.update(None, false, DT);
        }
        assert_eq!(player.base_scale(), 1.0);
        player.set_external_scale_multiplier(2.0);
        assert_eq!(player.scale(), 2.0);
        player.set_external_scale_multiplier(0.0);
        assert_eq!(player.scale(), 0.01);
    }

    #[test]
    fn test_waits_for_first_press() {
        let mut player = still_player();
        player.update(None, false, DT);
        assert_eq!(player.pos.x, 0.0);
        assert_eq!(player.steering().move_dir(), 0);
    }

    #[test]
    fn test_first_press_picks_side() {
        let mut player = still_player();
        player.update(Some(-5.0), false, DT);
        assert_eq!(player.steering().move_dir(), -1);
        assert!(player.pos.x < 0.0);

        let mut player = still_player();
        player.update(Some(5.0), true, DT);
        assert_eq!(player.steering().move_dir(), 1);
        assert!(!player.steering().is_flipping());
    }

    #[test]
    fn test_tap_flips_direction() {
        let mut player = still_player();
        player.update(Some(1.0), false, DT);
        player.update(None, true, DT);
        assert_eq!(player.steering().move_dir(), 1);

        // Quick tap while moving: flip starts on release
        player.update(Some(0.0), false, DT);
        assert!(!player.steering().is_flipping());
        player.update(None, true, DT);
        assert!(player.steering().is_flipping());
        assert_eq!(player.steering().move_dir(), -1);

        for _ in 0..30 {
            player.update(None, false, DT);
        }
        assert!(!player.steering().is_flipping());
        assert_eq!(player.steering().direction(), -1.0);
    }

    #[test]
    fn test_hold_flips_once() {
        let mut player = still_player();
        player.update(Some(1.0), true, DT);
        player.update(Some(0.0), false, DT);
        // Hold past the tap threshold (0.18s)
        for _ in 0..15 {
            player.update(None, false, DT);
        }
        assert_eq!(player.steering().move_dir(), -1);
        // Keep holding, then release: no second flip
        for _ in 0..60 {
            player.update(None, false, DT);
        }
        player.update(None, true, DT);
        assert_eq!(player.steering().move_dir(), -1);
        assert_eq!(player.steering().direction(), -1.0);
    }

    #[test]
    fn test_descends_to_ground() {
        let mut player = Player::new(PlayerSettings {
            start: Vec2::new(0.0, 5.0),
            descent_speed: 60.0,
            ground_y: Some(1.2),
            ..Default::default()
        });
        player.update(None, false, DT);
        assert!((player.pos.y - 4.0).abs() < 1e-5);
        for _ in 0..10 {
            player.update(None, false, DT);
        }
        assert_eq!(player.pos.y, 1.2);

        player.reset();
        assert_eq!(player.pos.y, 5.0);
    }
}

//! Obstacle instances, shrink-based lethality and cosmetic variation

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::segment::SegmentId;
use crate::error::{SimError, SimResult};
use crate::lerp;

/// How an obstacle decides whether touching it ends the run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleBehavior {
    /// Every contact is fatal
    pub always_lethal: bool,
    /// Scale lerps from `start_scale` to `end_scale` after spawning
    pub shrink_over_time: bool,
    pub start_scale: f32,
    pub end_scale: f32,
    /// Seconds to go from `start_scale` to `end_scale`
    pub shrink_duration: f32,
    /// At or below this scale a shrinking obstacle is harmless
    pub safe_scale: f32,
}

impl Default for ObstacleBehavior {
    fn default() -> Self {
        Self {
            always_lethal: true,
            shrink_over_time: false,
            start_scale: 1.0,
            end_scale: 1.0,
            shrink_duration: 10.0,
            safe_scale: 0.6,
        }
    }
}

impl ObstacleBehavior {
    /// Shrinking obstacle that turns harmless once small enough
    pub fn shrinking(start_scale: f32, end_scale: f32, duration: f32, safe_scale: f32) -> Self {
        Self {
            always_lethal: false,
            shrink_over_time: true,
            start_scale,
            end_scale,
            shrink_duration: duration,
            safe_scale,
        }
    }

    /// Scale `age` seconds after spawning
    pub fn scale_at(&self, age: f32) -> f32 {
        if !self.shrink_over_time {
            return self.start_scale;
        }
        let t = if self.shrink_duration <= 0.0 {
            1.0
        } else {
            (age / self.shrink_duration).clamp(0.0, 1.0)
        };
        lerp(self.start_scale, self.end_scale, t)
    }
}

/// A pooled obstacle prototype
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleTemplate {
    /// Collision radius at scale 1
    pub radius: f32,
    pub behavior: ObstacleBehavior,
}

impl Default for ObstacleTemplate {
    fn default() -> Self {
        Self {
            radius: 0.4,
            behavior: ObstacleBehavior::default(),
        }
    }
}

/// Random rotation/scale applied to each placed obstacle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariationSettings {
    pub randomize_scale: bool,
    /// Scale multiplier range, either order
    pub scale_range: (f32, f32),
    pub randomize_rotation: bool,
    /// Rotation range in degrees, either order
    pub rotation_range: (f32, f32),
}

impl Default for VariationSettings {
    fn default() -> Self {
        Self {
            randomize_scale: true,
            scale_range: (0.85, 1.25),
            randomize_rotation: true,
            rotation_range: (-10.0, 10.0),
        }
    }
}

/// Obstacle pool tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleSettings {
    /// One pool template per entry
    pub templates: Vec<ObstacleTemplate>,
    /// Instances created up front for every template
    pub prewarm_count: usize,
    /// Pick a random template per placement (else always the first)
    pub randomize_templates: bool,
    pub variation: VariationSettings,
}

impl Default for ObstacleSettings {
    fn default() -> Self {
        Self {
            templates: vec![
                ObstacleTemplate::default(),
                ObstacleTemplate {
                    radius: 0.5,
                    behavior: ObstacleBehavior::shrinking(1.4, 0.4, 8.0, 0.8),
                },
            ],
            prewarm_count: 20,
            randomize_templates: true,
            variation: VariationSettings::default(),
        }
    }
}

impl ObstacleSettings {
    pub fn validate(&self) -> SimResult<()> {
        if self.templates.is_empty() {
            return Err(SimError::config("at least one obstacle template is required"));
        }
        for template in &self.templates {
            if !(template.radius > 0.0) || !template.radius.is_finite() {
                return Err(SimError::config(format!(
                    "obstacle radius must be positive, got {}",
                    template.radius
                )));
            }
        }
        let variation = &self.variation;
        for (name, (a, b)) in [
            ("scale_range", variation.scale_range),
            ("rotation_range", variation.rotation_range),
        ] {
            if !a.is_finite() || !b.is_finite() {
                return Err(SimError::config(format!("{name} must be finite, got ({a}, {b})")));
            }
        }
        Ok(())
    }
}

/// Uniform sample from a range given in either order
fn sample_range<R: Rng + ?Sized>(rng: &mut R, range: (f32, f32)) -> f32 {
    let lo = range.0.min(range.1);
    let hi = range.0.max(range.1);
    if hi - lo <= f32::EPSILON {
        lo
    } else {
        rng.random_range(lo..hi)
    }
}

/// A live obstacle
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub radius: f32,
    pub behavior: ObstacleBehavior,
    /// Segment the obstacle is placed on
    pub segment: Option<SegmentId>,
    pub lane: usize,
    /// Offset within the owning segment
    pub local: Vec2,
    /// World position
    pub pos: Vec2,
    /// Z rotation in degrees (cosmetic)
    pub rotation: f32,
    /// Cosmetic scale multiplier from variation
    pub variation_scale: f32,
    /// Behavior scale (drives lethality)
    pub scale: f32,
    pub spawn_time: f32,
}

impl Obstacle {
    pub fn from_template(template: &ObstacleTemplate) -> Self {
        Self {
            radius: template.radius,
            behavior: template.behavior,
            segment: None,
            lane: 0,
            local: Vec2::ZERO,
            pos: Vec2::ZERO,
            rotation: 0.0,
            variation_scale: 1.0,
            scale: template.behavior.start_scale,
            spawn_time: 0.0,
        }
    }

    /// Reset to the start of life at time `now`
    pub fn spawn(&mut self, now: f32) {
        self.spawn_time = now;
        self.scale = self.behavior.start_scale;
    }

    /// Advance the shrink animation
    pub fn update(&mut self, now: f32) {
        self.scale = self.behavior.scale_at(now - self.spawn_time);
    }

    pub fn is_lethal(&self) -> bool {
        if self.behavior.always_lethal {
            return true;
        }
        if self.behavior.shrink_over_time {
            return self.scale > self.behavior.safe_scale;
        }
        true
    }

    /// Collision radius in world units
    pub fn world_radius(&self) -> f32 {
        self.radius * self.scale * self.variation_scale
    }

    pub fn apply_variation<R: Rng + ?Sized>(&mut self, variation: &VariationSettings, rng: &mut R) {
        if variation.randomize_rotation {
            self.rotation = sample_range(rng, variation.rotation_range);
        }
        if variation.randomize_scale {
            self.variation_scale = sample_range(rng, variation.scale_range);
        }
    }
}

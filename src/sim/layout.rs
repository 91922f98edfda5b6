//! Lane-based obstacle layouts with difficulty scaling
//!
//! Each segment gets `desired_count` obstacles spread over distinct lanes.
//! One lane, the safe lane, is always left empty so a segment can never be
//! fully blocked. The count grows with the elapsed score and is capped at
//! `lanes - 1`.

use rand::Rng;
use rand::seq::index;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// Tuning for the layout generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Lane X offsets in segment-local space
    pub lanes: Vec<f32>,
    /// Obstacles per segment at score 0
    pub base_count: u32,
    /// Score needed for each extra obstacle
    pub step_seconds: f32,
    /// Fixed local Y for placements (segment midpoint when unset)
    pub local_y: Option<f32>,
    /// Safe-lane re-roll chance at score 0
    pub reroll_base: f32,
    /// Extra re-roll chance per difficulty step
    pub reroll_per_step: f32,
    /// Upper bound on the re-roll chance
    pub reroll_max: f32,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            lanes: vec![-2.0, 0.0, 2.0],
            base_count: 1,
            step_seconds: 20.0,
            local_y: None,
            reroll_base: 0.1,
            reroll_per_step: 0.05,
            reroll_max: 0.5,
        }
    }
}

impl LayoutSettings {
    pub fn validate(&self) -> SimResult<()> {
        if self.lanes.is_empty() {
            return Err(SimError::config("layout needs at least one lane"));
        }
        if self.lanes.iter().any(|x| !x.is_finite()) {
            return Err(SimError::config("lane positions must be finite"));
        }
        if !(self.step_seconds > 0.0) {
            return Err(SimError::config(format!(
                "step_seconds must be positive, got {}",
                self.step_seconds
            )));
        }
        for (name, p) in [
            ("reroll_base", self.reroll_base),
            ("reroll_per_step", self.reroll_per_step),
            ("reroll_max", self.reroll_max),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(SimError::config(format!("{name} must be in [0, 1], got {p}")));
            }
        }
        Ok(())
    }
}

/// Where one obstacle goes inside a segment
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub lane: usize,
    /// Lane X in segment-local space
    pub x: f32,
    /// Local Y in segment-local space
    pub y: f32,
}

/// Chooses lane occupancy per segment
#[derive(Debug, Clone)]
pub struct ObstacleLayoutGenerator {
    settings: LayoutSettings,
    safe_lane: usize,
    /// Safe lane restored by `reset`
    initial_safe_lane: usize,
}

impl ObstacleLayoutGenerator {
    /// Create a generator whose safe lane starts at the middle lane
    pub fn new(settings: LayoutSettings) -> SimResult<Self> {
        settings.validate()?;
        let safe_lane = settings.lanes.len() / 2;
        Ok(Self {
            settings,
            safe_lane,
            initial_safe_lane: safe_lane,
        })
    }

    /// Start from a specific safe lane
    pub fn with_safe_lane(mut self, lane: usize) -> SimResult<Self> {
        if lane >= self.lane_count() {
            return Err(SimError::config(format!(
                "safe lane {lane} out of range for {} lanes",
                self.lane_count()
            )));
        }
        self.safe_lane = lane;
        self.initial_safe_lane = lane;
        Ok(self)
    }

    /// Put the safe lane back where the generator started
    pub fn reset(&mut self) {
        self.safe_lane = self.initial_safe_lane;
    }

    pub fn settings(&self) -> &LayoutSettings {
        &self.settings
    }

    pub fn lane_count(&self) -> usize {
        self.settings.lanes.len()
    }

    pub fn safe_lane(&self) -> usize {
        self.safe_lane
    }

    /// Whole difficulty steps reached at `score` (negative and NaN count as 0)
    pub fn difficulty_steps(&self, score: f32) -> u32 {
        // float -> int casts saturate, NaN becomes 0
        (score.max(0.0) / self.settings.step_seconds).floor() as u32
    }

    /// Obstacles to place at `score`, always leaving one lane free
    pub fn desired_count(&self, score: f32) -> usize {
        let wanted = self
            .settings
            .base_count
            .saturating_add(self.difficulty_steps(score)) as usize;
        wanted.min(self.lane_count() - 1)
    }

    /// Chance of moving the safe lane before this layout
    pub fn reroll_chance(&self, score: f32) -> f32 {
        let steps = self.difficulty_steps(score) as f32;
        (self.settings.reroll_base + self.settings.reroll_per_step * steps)
            .min(self.settings.reroll_max)
            .clamp(0.0, 1.0)
    }

    /// Generate placements for one segment.
    ///
    /// `mid_y` is the segment's local vertical midpoint, used when no fixed
    /// local Y is configured. Placements come back sorted by lane.
    pub fn generate<R: Rng + ?Sized>(&mut self, score: f32, mid_y: f32, rng: &mut R) -> Vec<Placement> {
        let lanes = self.lane_count();
        if rng.random_bool(f64::from(self.reroll_chance(score))) {
            let previous = self.safe_lane;
            self.safe_lane = rng.random_range(0..lanes);
            if previous != self.safe_lane {
                log::debug!("Safe lane moved {} -> {}", previous, self.safe_lane);
            }
        }

        let count = self.desired_count(score);
        let candidates: Vec<usize> = (0..lanes).filter(|&l| l != self.safe_lane).collect();
        let y = self.settings.local_y.unwrap_or(mid_y);

        let mut picked: Vec<usize> = index::sample(rng, candidates.len(), count)
            .into_iter()
            .map(|i| candidates[i])
            .collect();
        picked.sort_unstable();

        picked
            .into_iter()
            .map(|lane| Placement {
                lane,
                x: self.settings.lanes[lane],
                y,
            })
            .collect()
    }
}

//! Endless vertical track built from recycled segments
//!
//! Segments are kept in top-to-bottom order as a gapless chain: every
//! segment's top sits on the previous segment's bottom. When the camera has
//! moved far enough below the leading (topmost) segment, that segment is
//! moved to the tail, anchored on the current tail's bottom, and gets a fresh
//! obstacle layout. Obstacles come from an [`ObjectPool`] and go back to it
//! when their segment is recycled.

use std::collections::{HashSet, VecDeque};

use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::layout::ObstacleLayoutGenerator;
use super::obstacle::{Obstacle, ObstacleSettings};
use super::pool::{InstanceId, ObjectPool, TemplateId};
use super::segment::{LocalBounds, Segment, SegmentId};
use crate::error::{SimError, SimResult};
use crate::settings::Settings;

/// Track layout tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackSettings {
    /// Local bounds of each segment, in definition order
    pub segments: Vec<LocalBounds>,
    /// Top of the first segment (aligned to the camera top when unset)
    pub start_top: Option<f32>,
    /// World X every segment origin is aligned to
    pub baseline_x: f32,
    /// How far past a segment's bottom the camera top must be before recycling
    pub pass_threshold: f32,
    /// Shuffle segment order on initialize
    pub randomize_order: bool,
    /// Leading segments left without obstacles on initialize
    pub clear_leading_segments: usize,
}

impl Default for TrackSettings {
    fn default() -> Self {
        Self {
            segments: vec![LocalBounds::centered(8.0, 12.0); 4],
            start_top: None,
            baseline_x: 0.0,
            pass_threshold: 0.25,
            randomize_order: true,
            clear_leading_segments: 1,
        }
    }
}

impl TrackSettings {
    pub fn validate(&self) -> SimResult<()> {
        if self.segments.is_empty() {
            return Err(SimError::config("track needs at least one segment"));
        }
        for bounds in &self.segments {
            bounds.validate()?;
        }
        if !self.pass_threshold.is_finite() || !self.baseline_x.is_finite() {
            return Err(SimError::config("pass_threshold and baseline_x must be finite"));
        }
        Ok(())
    }

    /// Segments numbered in definition order
    pub fn build_segments(&self) -> Vec<Segment> {
        self.segments
            .iter()
            .enumerate()
            .map(|(i, bounds)| Segment::new(SegmentId(i as u32), *bounds))
            .collect()
    }

    pub fn order(&self) -> SegmentOrder {
        if self.randomize_order {
            SegmentOrder::Shuffled
        } else {
            SegmentOrder::AsGiven
        }
    }

    /// Combined height of all segments
    pub fn total_height(&self) -> f32 {
        self.segments.iter().map(LocalBounds::height).sum()
    }
}

/// Initial ordering of the segment chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentOrder {
    /// Keep the supplied order
    AsGiven,
    /// Fisher-Yates shuffle with the track's RNG
    Shuffled,
    /// Explicit order; must be a permutation of the supplied ids
    Custom(Vec<SegmentId>),
}

/// Camera-relative chain of recycled segments and their obstacles
#[derive(Debug, Clone)]
pub struct SegmentTrack {
    settings: TrackSettings,
    obstacle_settings: ObstacleSettings,
    segments: VecDeque<Segment>,
    initialized: bool,
    pool: ObjectPool<Obstacle>,
    templates: Vec<TemplateId>,
    generator: ObstacleLayoutGenerator,
    rng: Pcg32,
    /// Simulation time stamped on newly placed obstacles
    time: f32,
    recycle_count: u64,
}

impl SegmentTrack {
    /// Assemble a track from its collaborators.
    ///
    /// Obstacles are drawn from every template registered in `pool`; a pool
    /// without templates is a configuration error.
    pub fn new(
        settings: TrackSettings,
        obstacle_settings: ObstacleSettings,
        pool: ObjectPool<Obstacle>,
        generator: ObstacleLayoutGenerator,
        rng: Pcg32,
    ) -> SimResult<Self> {
        settings.validate()?;
        let templates: Vec<TemplateId> = pool.templates().collect();
        if templates.is_empty() {
            return Err(SimError::config("obstacle pool has no templates"));
        }
        Ok(Self {
            settings,
            obstacle_settings,
            segments: VecDeque::new(),
            initialized: false,
            pool,
            templates,
            generator,
            rng,
            time: 0.0,
            recycle_count: 0,
        })
    }

    /// Build the pool (registered and prewarmed) and generator from settings
    pub fn from_settings(settings: &Settings, rng: Pcg32) -> SimResult<Self> {
        settings.obstacles.validate()?;
        let mut pool = ObjectPool::new();
        for template in &settings.obstacles.templates {
            let id = pool.register(Obstacle::from_template(template));
            pool.prewarm(id, settings.obstacles.prewarm_count)?;
        }
        let generator = ObstacleLayoutGenerator::new(settings.layout.clone())?;
        Self::new(
            settings.track.clone(),
            settings.obstacles.clone(),
            pool,
            generator,
            rng,
        )
    }

    /// Order segments, lay them out downward from `start_top` and place
    /// the initial obstacles.
    ///
    /// Re-initializing returns every previously placed obstacle to the pool.
    pub fn initialize(&mut self, segments: Vec<Segment>, start_top: f32, order: SegmentOrder) -> SimResult<()> {
        if segments.is_empty() {
            return Err(SimError::config("cannot initialize a track without segments"));
        }
        if !start_top.is_finite() {
            return Err(SimError::config(format!("start_top must be finite, got {start_top}")));
        }
        let mut seen = HashSet::with_capacity(segments.len());
        for segment in &segments {
            segment.bounds().validate()?;
            if !seen.insert(segment.id()) {
                return Err(SimError::config(format!("duplicate {}", segment.id())));
            }
        }

        let mut ordered = match order {
            SegmentOrder::AsGiven => segments,
            SegmentOrder::Shuffled => {
                let mut segments = segments;
                segments.shuffle(&mut self.rng);
                segments
            }
            SegmentOrder::Custom(ids) => apply_custom_order(segments, &ids)?,
        };

        self.release_all_obstacles();

        let mut current_top = start_top;
        for segment in &mut ordered {
            segment.obstacles.clear();
            segment.move_top_to(current_top);
            segment.align_x(self.settings.baseline_x);
            current_top = segment.bottom();
        }

        self.segments = ordered.into();
        self.initialized = true;
        self.recycle_count = 0;

        for index in self.settings.clear_leading_segments..self.segments.len() {
            self.place_obstacles(index, 0.0)?;
        }

        log::info!(
            "Track initialized: {} segments from y={:.2} to y={:.2}",
            self.segments.len(),
            start_top,
            current_top
        );
        Ok(())
    }

    /// Replace the RNG and put the layout generator back at its starting
    /// safe lane. Call before `initialize` to replay a seed from the start.
    pub fn reseed(&mut self, rng: Pcg32) {
        self.rng = rng;
        self.generator.reset();
    }

    /// Recycle the leading segment once the camera has passed it.
    ///
    /// Returns the recycled segment's id so the caller can react (trail
    /// resets and the like). At most one segment is recycled per call.
    pub fn tick(&mut self, camera_top: f32, score: f32) -> SimResult<Option<SegmentId>> {
        if !self.initialized {
            return Err(SimError::NotInitialized);
        }
        let leading = self.segments.front().ok_or(SimError::NotInitialized)?;
        // negated so a NaN camera never triggers a recycle
        if !(camera_top <= leading.bottom() - self.settings.pass_threshold) {
            return Ok(None);
        }

        let Some(mut passed) = self.segments.pop_front() else {
            return Err(SimError::NotInitialized);
        };
        for id in passed.obstacles.drain(..) {
            self.pool.release(id);
        }

        let anchor = match self.segments.back() {
            Some(tail) => tail.bottom(),
            None => passed.bottom(),
        };
        passed.move_top_to(anchor);
        passed.align_x(self.settings.baseline_x);
        let id = passed.id();
        self.segments.push_back(passed);

        let index = self.segments.len() - 1;
        self.place_obstacles(index, score)?;
        self.recycle_count += 1;

        log::debug!(
            "Recycled {} to top y={:.2} ({} obstacles, safe lane {})",
            id,
            anchor,
            self.segments[index].obstacles.len(),
            self.generator.safe_lane()
        );
        Ok(Some(id))
    }

    /// Horizontal extent of the track at height `y`.
    ///
    /// Uses the first segment whose span contains `y`, otherwise the segment
    /// with the nearest vertical center (first one wins a tie).
    pub fn horizontal_bounds_at(&self, y: f32) -> SimResult<(f32, f32)> {
        if !self.initialized {
            return Err(SimError::NotInitialized);
        }
        let mut closest: Option<(&Segment, f32)> = None;
        for segment in &self.segments {
            if segment.contains_y(y) {
                return Ok((segment.left(), segment.right()));
            }
            let distance = (y - segment.center_y()).abs();
            if closest.is_none_or(|(_, best)| distance < best) {
                closest = Some((segment, distance));
            }
        }
        closest
            .map(|(segment, _)| (segment.left(), segment.right()))
            .ok_or(SimError::NotInitialized)
    }

    /// Advance obstacle shrink animations to time `now`
    pub fn update_obstacles(&mut self, now: f32) {
        self.time = now;
        for (_, obstacle) in self.pool.active_mut() {
            obstacle.update(now);
        }
    }

    fn place_obstacles(&mut self, index: usize, score: f32) -> SimResult<()> {
        let Self {
            segments,
            pool,
            templates,
            generator,
            rng,
            obstacle_settings,
            time,
            ..
        } = self;
        let segment = &mut segments[index];

        let placements = generator.generate(score, segment.bounds().mid_y(), rng);
        for placement in placements {
            let template = if obstacle_settings.randomize_templates && templates.len() > 1 {
                templates[rng.random_range(0..templates.len())]
            } else {
                templates[0]
            };
            let id = pool.get(template)?;
            let local = Vec2::new(placement.x, placement.y);
            if let Some(obstacle) = pool.instance_mut(id) {
                obstacle.segment = Some(segment.id());
                obstacle.lane = placement.lane;
                obstacle.local = local;
                obstacle.pos = segment.to_world(local);
                obstacle.spawn(*time);
                obstacle.apply_variation(&obstacle_settings.variation, rng);
            }
            segment.obstacles.push(id);
        }
        Ok(())
    }

    fn release_all_obstacles(&mut self) {
        for segment in &mut self.segments {
            for id in segment.obstacles.drain(..) {
                self.pool.release(id);
            }
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Segments in top-to-bottom order
    pub fn segments(&self) -> impl Iterator<Item = &Segment> + '_ {
        self.segments.iter()
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id() == id)
    }

    pub fn leading(&self) -> Option<&Segment> {
        self.segments.front()
    }

    pub fn tail(&self) -> Option<&Segment> {
        self.segments.back()
    }

    /// Every obstacle currently placed on the track
    pub fn obstacles(&self) -> impl Iterator<Item = (InstanceId, &Obstacle)> + '_ {
        self.pool.active()
    }

    pub fn obstacle(&self, id: InstanceId) -> Option<&Obstacle> {
        self.pool.instance(id)
    }

    pub fn obstacle_mut(&mut self, id: InstanceId) -> Option<&mut Obstacle> {
        self.pool.instance_mut(id)
    }

    pub fn pool(&self) -> &ObjectPool<Obstacle> {
        &self.pool
    }

    pub fn pool_mut(&mut self) -> &mut ObjectPool<Obstacle> {
        &mut self.pool
    }

    pub fn generator(&self) -> &ObstacleLayoutGenerator {
        &self.generator
    }

    pub fn recycle_count(&self) -> u64 {
        self.recycle_count
    }
}

fn apply_custom_order(segments: Vec<Segment>, ids: &[SegmentId]) -> SimResult<Vec<Segment>> {
    if ids.len() != segments.len() {
        return Err(SimError::config(format!(
            "custom order lists {} segments, track has {}",
            ids.len(),
            segments.len()
        )));
    }
    let mut remaining: Vec<Option<Segment>> = segments.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(ids.len());
    for &id in ids {
        let slot = remaining
            .iter_mut()
            .find(|s| s.as_ref().is_some_and(|seg| seg.id() == id))
            .ok_or_else(|| SimError::config(format!("custom order names unknown or repeated {id}")))?;
        if let Some(segment) = slot.take() {
            ordered.push(segment);
        }
    }
    Ok(ordered)
}

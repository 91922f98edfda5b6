//! World track segments
//!
//! A segment is a fixed piece of level geometry. Its extents are cached once in
//! its own local frame; afterwards only its world position moves.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::pool::InstanceId;
use crate::consts::UNIT_SEGMENT_EXTENT;
use crate::error::{SimError, SimResult};

/// Stable identifier for a segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SegmentId(pub u32);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "segment#{}", self.0)
    }
}

/// Axis-aligned extents relative to a segment's origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocalBounds {
    pub left: f32,
    pub right: f32,
    pub bottom: f32,
    pub top: f32,
}

impl LocalBounds {
    /// Bounds used for a segment without geometry (centered unit square)
    pub const UNIT: Self = Self {
        left: -UNIT_SEGMENT_EXTENT / 2.0,
        right: UNIT_SEGMENT_EXTENT / 2.0,
        bottom: -UNIT_SEGMENT_EXTENT / 2.0,
        top: UNIT_SEGMENT_EXTENT / 2.0,
    };

    pub fn new(left: f32, right: f32, bottom: f32, top: f32) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
        }
    }

    /// Bounds of `width` x `height` centered on the origin
    pub fn centered(width: f32, height: f32) -> Self {
        Self::new(-width / 2.0, width / 2.0, -height / 2.0, height / 2.0)
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.top - self.bottom
    }

    #[inline]
    pub fn width(&self) -> f32 {
        self.right - self.left
    }

    /// Vertical midpoint in local space
    #[inline]
    pub fn mid_y(&self) -> f32 {
        (self.top + self.bottom) * 0.5
    }

    /// Reject non-finite or empty extents
    pub fn validate(&self) -> SimResult<()> {
        let finite = [self.left, self.right, self.bottom, self.top]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(SimError::config(format!("non-finite segment bounds {self:?}")));
        }
        if self.height() <= 0.0 || self.width() <= 0.0 {
            return Err(SimError::config(format!("empty segment bounds {self:?}")));
        }
        Ok(())
    }
}

impl Default for LocalBounds {
    fn default() -> Self {
        Self::UNIT
    }
}

/// A piece of world track and the obstacles currently placed on it
#[derive(Debug, Clone)]
pub struct Segment {
    id: SegmentId,
    bounds: LocalBounds,
    /// World position of the segment origin
    position: Vec2,
    /// Pooled obstacles placed on this segment
    pub(crate) obstacles: Vec<InstanceId>,
}

impl Segment {
    pub fn new(id: SegmentId, bounds: LocalBounds) -> Self {
        Self {
            id,
            bounds,
            position: Vec2::ZERO,
            obstacles: Vec::new(),
        }
    }

    /// Segment with no geometry of its own (unit bounds)
    pub fn unit(id: SegmentId) -> Self {
        Self::new(id, LocalBounds::UNIT)
    }

    pub fn id(&self) -> SegmentId {
        self.id
    }

    pub fn bounds(&self) -> &LocalBounds {
        &self.bounds
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn obstacles(&self) -> &[InstanceId] {
        &self.obstacles
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.position.y + self.bounds.top
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.position.y + self.bounds.bottom
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.position.x + self.bounds.left
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.position.x + self.bounds.right
    }

    #[inline]
    pub fn center_y(&self) -> f32 {
        (self.top() + self.bottom()) * 0.5
    }

    #[inline]
    pub fn height(&self) -> f32 {
        self.bounds.height()
    }

    /// True when `y` lies within [bottom, top]
    pub fn contains_y(&self, y: f32) -> bool {
        y <= self.top() && y >= self.bottom()
    }

    /// Shift vertically so the top edge lands on `top_y`
    pub(crate) fn move_top_to(&mut self, top_y: f32) {
        self.position.y = top_y - self.bounds.top;
    }

    /// Place the origin at `x`
    pub(crate) fn align_x(&mut self, x: f32) {
        self.position.x = x;
    }

    /// Local point to world space
    pub fn to_world(&self, local: Vec2) -> Vec2 {
        self.position + local
    }
}

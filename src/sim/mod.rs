//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied timestep only
//! - Seeded RNG only
//! - Stable iteration order (segment order, instance id order)
//! - No rendering or platform dependencies

pub mod camera;
pub mod layout;
pub mod obstacle;
pub mod player;
pub mod pool;
pub mod segment;
pub mod state;
pub mod tick;
pub mod track;

pub use camera::{Camera, CameraSettings};
pub use layout::{LayoutSettings, ObstacleLayoutGenerator, Placement};
pub use obstacle::{Obstacle, ObstacleBehavior, ObstacleSettings, ObstacleTemplate, VariationSettings};
pub use player::{Player, PlayerSettings, Steering};
pub use pool::{InstanceId, ObjectPool, TemplateId};
pub use segment::{LocalBounds, Segment, SegmentId};
pub use state::{GameEvent, GamePhase, GameState};
pub use tick::{TickInput, tick};
pub use track::{SegmentOrder, SegmentTrack, TrackSettings};

//! Game state and run lifecycle
//!
//! Owns every simulation component; collaborators are handed in through
//! `Settings` and the run seed instead of being looked up globally.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::camera::Camera;
use super::player::Player;
use super::pool::InstanceId;
use super::segment::SegmentId;
use super::track::SegmentTrack;
use crate::error::SimResult;
use crate::settings::Settings;

/// Current phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Playing,
    /// Hit a lethal obstacle or left the screen
    GameOver,
    /// Crossed the finish line
    Cleared,
}

/// Things the host may want to react to, collected per tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GameEvent {
    /// A segment was moved to the bottom with a new layout
    SegmentRecycled(SegmentId),
    GameOver { score: f32 },
    Cleared { score: f32 },
}

/// Complete simulation state for one run
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub settings: Settings,
    pub phase: GamePhase,
    /// Survival score
    pub score: f32,
    /// Seconds since the run started
    pub elapsed: f32,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub player: Player,
    pub camera: Camera,
    pub track: SegmentTrack,
    /// Events raised during the latest tick
    pub events: Vec<GameEvent>,
    /// Autopilot tapped last tick and still has to release
    pub(crate) autopilot_release_pending: bool,
}

impl GameState {
    /// Validate `settings` and start a run seeded with `seed`
    pub fn new(settings: Settings, seed: u64) -> SimResult<Self> {
        settings.validate()?;
        let player = Player::new(settings.player.clone());
        let camera = Camera::new(settings.camera.clone(), player.pos);
        let track = SegmentTrack::from_settings(&settings, Pcg32::seed_from_u64(seed))?;

        let mut state = Self {
            seed,
            settings,
            phase: GamePhase::Playing,
            score: 0.0,
            elapsed: 0.0,
            time_ticks: 0,
            player,
            camera,
            track,
            events: Vec::new(),
            autopilot_release_pending: false,
        };
        state.start_track()?;
        Ok(state)
    }

    fn start_track(&mut self) -> SimResult<()> {
        let track = &self.settings.track;
        let view_height = 2.0 * self.settings.camera.half_height.max(self.settings.camera.zoomed_half_height);
        if track.total_height() < view_height + track.pass_threshold {
            log::warn!(
                "Track height {:.2} is shorter than the view ({:.2}); gaps will be visible",
                track.total_height(),
                view_height
            );
        }
        let start_top = track.start_top.unwrap_or_else(|| self.camera.top());
        self.track.update_obstacles(self.elapsed);
        self.track.initialize(track.build_segments(), start_top, track.order())
    }

    /// Reset score, player and camera and rebuild the track.
    ///
    /// The track RNG is reseeded from `seed`, so a restarted run plays out
    /// exactly like a fresh one.
    pub fn restart(&mut self) -> SimResult<()> {
        self.track.reseed(Pcg32::seed_from_u64(self.seed));
        self.phase = GamePhase::Playing;
        self.score = 0.0;
        self.elapsed = 0.0;
        self.time_ticks = 0;
        self.events.clear();
        self.autopilot_release_pending = false;
        self.player.reset();
        self.camera.snap_to(self.player.pos);
        self.start_track()?;
        log::info!("Run restarted (seed {})", self.seed);
        Ok(())
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// Report contact between the player and a pooled obstacle.
    ///
    /// Unknown or released instances and non-lethal obstacles are ignored.
    /// Returns true if the contact ended the run.
    pub fn on_collision(&mut self, obstacle: InstanceId) -> bool {
        if !self.is_playing() {
            return false;
        }
        let lethal = self.track.obstacle(obstacle).is_some_and(|o| o.is_lethal());
        if !lethal {
            return false;
        }
        self.game_over(&format!("hit {obstacle}"));
        true
    }

    /// End the run as lost (one-shot)
    pub fn game_over(&mut self, reason: &str) {
        if !self.is_playing() {
            return;
        }
        self.phase = GamePhase::GameOver;
        self.events.push(GameEvent::GameOver { score: self.score });
        log::info!(
            "GAME OVER ({}) - Score: {} after {:.1}s",
            reason,
            self.score.floor(),
            self.elapsed
        );
    }

    /// End the run as cleared (one-shot)
    pub fn clear(&mut self) {
        if !self.is_playing() {
            return;
        }
        self.phase = GamePhase::Cleared;
        self.events.push(GameEvent::Cleared { score: self.score });
        log::info!("CLEAR - Score: {} after {:.1}s", self.score.floor(), self.elapsed);
    }
}

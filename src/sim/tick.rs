//! Per-frame simulation tick
//!
//! Advances score, player and camera, lets the track recycle, then checks
//! collisions and run end conditions, always in that order.

use super::pool::InstanceId;
use super::state::{GameEvent, GameState};
use crate::error::SimResult;

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// World X of a press that started this tick
    pub press: Option<f32>,
    /// The press was released this tick
    pub release: bool,
    /// Start a new run
    pub restart: bool,
    /// Demo mode - AI steers toward free lanes
    pub autopilot: bool,
}

/// Advance the game state by one timestep
pub fn tick(state: &mut GameState, input: &TickInput, dt: f32) -> SimResult<()> {
    state.events.clear();
    if input.restart {
        return state.restart();
    }
    if !state.is_playing() {
        return Ok(());
    }

    let mut input = input.clone();
    if input.autopilot {
        autopilot(state, &mut input);
    }

    state.time_ticks += 1;
    state.elapsed += dt;
    state.score += state.settings.score.score_rate * dt;

    // Zoom first so the player's scale compensation applies this tick
    let multiplier = state.camera.update_zoom(state.score, dt);
    state.player.set_external_scale_multiplier(multiplier);

    state.player.update(input.press, input.release, dt);

    state.camera.follow(state.player.pos, dt);
    if state.camera.settings().clamp_to_track {
        let (min_x, max_x) = state.track.horizontal_bounds_at(state.camera.pos.y)?;
        state.camera.clamp_x(min_x, max_x);
    }

    state.track.update_obstacles(state.elapsed);
    if let Some(recycled) = state.track.tick(state.camera.top(), state.score)? {
        state.events.push(GameEvent::SegmentRecycled(recycled));
    }

    for id in touching_obstacles(state) {
        if state.on_collision(id) {
            break;
        }
    }

    if state.settings.score.offscreen_is_fatal && !state.camera.contains(state.player.pos) {
        state.game_over("left screen");
    }

    if let Some(finish_y) = state.settings.score.finish_line_y {
        if state.player.pos.y <= finish_y {
            state.clear();
        }
    }

    Ok(())
}

/// Obstacles overlapping the player, in id order
fn touching_obstacles(state: &GameState) -> Vec<InstanceId> {
    let pos = state.player.pos;
    let radius = state.player.radius();
    state
        .track
        .obstacles()
        .filter(|(_, o)| o.pos.distance(pos) < o.world_radius() + radius)
        .map(|(id, _)| id)
        .collect()
}

/// Steer toward the nearest lane with no lethal obstacle coming up.
///
/// Taps are two ticks long (press, then release) so each one produces
/// exactly one direction flip.
fn autopilot(state: &mut GameState, input: &mut TickInput) {
    const LOOKAHEAD: f32 = 4.0;
    const DEAD_ZONE: f32 = 0.3;

    if state.autopilot_release_pending {
        input.release = true;
        state.autopilot_release_pending = false;
        return;
    }

    let player = &state.player;
    let lanes = &state.settings.layout.lanes;
    let baseline = state.settings.track.baseline_x;
    let ahead = |y: f32| y <= player.pos.y + 1.0 && y >= player.pos.y - LOOKAHEAD;

    let blocked: Vec<usize> = state
        .track
        .obstacles()
        .filter(|(_, o)| o.is_lethal() && ahead(o.pos.y))
        .map(|(_, o)| o.lane)
        .collect();

    let target = lanes
        .iter()
        .enumerate()
        .filter(|(lane, _)| !blocked.contains(lane))
        .map(|(_, &x)| baseline + x)
        .min_by(|a, b| {
            (a - player.pos.x)
                .abs()
                .partial_cmp(&(b - player.pos.x).abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    let Some(target_x) = target else {
        return;
    };

    let steering = player.steering();
    let offset = target_x - player.pos.x;
    if steering.move_dir() == 0 {
        input.press = Some(target_x);
        return;
    }
    let moving_away = f32::from(steering.move_dir()) * offset < 0.0;
    if moving_away && offset.abs() > DEAD_ZONE && !steering.is_flipping() {
        input.press = Some(target_x);
        state.autopilot_release_pending = true;
    }
}

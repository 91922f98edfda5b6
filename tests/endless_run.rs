//! Long endless runs driven through the public API

use rand::SeedableRng;
use rand_pcg::Pcg32;
use rolling_snow::Settings;
use rolling_snow::settings::DifficultyPreset;
use rolling_snow::sim::{
    GamePhase, GameState, LayoutSettings, LocalBounds, ObjectPool, Obstacle, ObstacleLayoutGenerator,
    ObstacleSettings, ObstacleTemplate, Segment, SegmentId, SegmentOrder, SegmentTrack, TickInput,
    TrackSettings, tick,
};

fn five_lane_track(seed: u64) -> SegmentTrack {
    let layout = LayoutSettings {
        lanes: vec![-3.0, -1.5, 0.0, 1.5, 3.0],
        base_count: 1,
        step_seconds: 5.0,
        ..Default::default()
    };
    let obstacles = ObstacleSettings::default();
    let mut pool = ObjectPool::new();
    for template in &obstacles.templates {
        let id = pool.register(Obstacle::from_template(template));
        pool.prewarm(id, 4).unwrap();
    }
    let generator = ObstacleLayoutGenerator::new(layout).unwrap();
    SegmentTrack::new(
        TrackSettings::default(),
        obstacles,
        pool,
        generator,
        Pcg32::seed_from_u64(seed),
    )
    .unwrap()
}

fn segments(heights: &[f32]) -> Vec<Segment> {
    heights
        .iter()
        .enumerate()
        .map(|(i, &h)| Segment::new(SegmentId(i as u32), LocalBounds::centered(10.0, h)))
        .collect()
}

#[test]
fn test_track_survives_many_recycles() {
    let mut track = five_lane_track(77);
    track
        .initialize(segments(&[6.0, 9.0, 4.0, 7.5]), 10.0, SegmentOrder::Shuffled)
        .unwrap();

    let mut camera_top = 10.0;
    let mut score = 0.0;
    for _ in 0..4000 {
        camera_top -= 0.2;
        score += 0.05;
        track.tick(camera_top, score).unwrap();

        let chain: Vec<&Segment> = track.segments().collect();
        assert_eq!(chain.len(), 4);
        for pair in chain.windows(2) {
            assert!((pair[0].bottom() - pair[1].top()).abs() < 1e-2);
        }

        let placed: usize = chain.iter().map(|s| s.obstacles().len()).sum();
        assert_eq!(placed, track.pool().active_count());

        for segment in &chain {
            let mut lanes: Vec<usize> = segment
                .obstacles()
                .iter()
                .map(|&id| track.obstacle(id).unwrap().lane)
                .collect();
            assert!(lanes.len() <= 4, "one lane must stay open");
            lanes.sort_unstable();
            lanes.dedup();
            assert_eq!(lanes.len(), segment.obstacles().len());
        }

        let (min_x, max_x) = track.horizontal_bounds_at(camera_top).unwrap();
        assert!(min_x < max_x);
    }

    assert!(track.recycle_count() > 100);
    // A template only grows once all of its instances are placed at the same time
    assert!(track.pool().total_count() >= 8);
    assert!(track.pool().total_count() <= 2 * 4 * 4);
}

#[test]
fn test_recycled_segments_get_harder() {
    let mut track = five_lane_track(5);
    track
        .initialize(segments(&[5.0; 4]), 0.0, SegmentOrder::AsGiven)
        .unwrap();

    let mut camera_top = 0.0;
    let mut late_counts = Vec::new();
    while track.recycle_count() < 12 {
        camera_top -= 0.5;
        // score far past the last difficulty step
        if track.tick(camera_top, 500.0).unwrap().is_some() {
            let tail = track.tail().unwrap();
            late_counts.push(tail.obstacles().len());
        }
    }
    assert!(late_counts.iter().all(|&n| n == 4));
}

#[test]
fn test_autopilot_runs_each_preset() {
    for preset in [DifficultyPreset::Easy, DifficultyPreset::Normal, DifficultyPreset::Hard] {
        let mut settings = Settings::from_preset(preset);
        settings.obstacles.templates = vec![ObstacleTemplate {
            radius: 0.3,
            ..Default::default()
        }];
        let mut state = GameState::new(settings, 31).unwrap();
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        for _ in 0..600 {
            tick(&mut state, &input, 1.0 / 60.0).unwrap();
            if state.phase != GamePhase::Playing {
                break;
            }
        }
        assert!(state.time_ticks > 0);
        assert!(state.score > 0.0);
        assert!(state.track.pool().active_count() <= state.track.pool().total_count());
    }
}

#[test]
fn test_settings_file_round_trip() {
    let path = std::env::temp_dir().join(format!("rolling-snow-{}.json", std::process::id()));
    let settings = Settings::from_preset(DifficultyPreset::Hard);
    std::fs::write(&path, settings.to_json().unwrap()).unwrap();
    let loaded = Settings::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(loaded, settings);

    assert!(Settings::load(std::env::temp_dir().join("rolling-snow-missing.json")).is_err());
}

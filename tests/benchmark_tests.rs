//! Performance benchmarks for critical game systems

use rand::rngs::StdRng;
use rand::SeedableRng;
use server::config::GameConfig;
use server::game::{GameState, StoredScore};
use server::grid::{Cell, Grid};
use server::id_pool::IdPool;
use server::render::{Frame, Scene};
use server::scoreboard::Scoreboard;
use server::sidebar::Sidebar;
use server::store::ScoreRecord;
use shared::SIDEBAR_WIDTH;
use std::sync::Arc;
use std::time::{Duration, Instant};

fn crowded_game(players: usize) -> GameState {
    let config = GameConfig {
        width: 254,
        height: 254,
        max_players: players,
        ..GameConfig::default()
    };
    let pool = Arc::new(IdPool::new(players));
    let mut game = GameState::new(config, Arc::clone(&pool)).unwrap();
    for i in 0..players {
        let id = pool.acquire().unwrap();
        let identity = format!("player{}", i);
        game.add_player(id, &identity, &identity, StoredScore::Missing).unwrap();
        game.resize(id, 300, 150);
    }
    game
}

/// Benchmarks full ticks with renders for a busy board
#[test]
fn benchmark_tick_and_render() {
    let players = 16;
    let mut game = crowded_game(players);
    let mut rng = StdRng::seed_from_u64(42);

    let iterations = 500u32;
    let start = Instant::now();
    let mut bytes = 0usize;
    let mut now = Instant::now();

    for _ in 0..iterations {
        let ids: Vec<_> = game.players().map(|p| p.id).collect();
        for id in ids {
            game.respawn_with(id, &mut rng);
        }
        now += Duration::from_millis(25);
        let report = game.tick(now);
        for (_, frame) in game.render_frames(report.ranking_changed()) {
            bytes += frame.len();
        }
    }

    let duration = start.elapsed();
    println!(
        "Tick+render: {} ticks for {} players in {:?} ({:.2} ms/tick, {} bytes)",
        iterations,
        players,
        duration,
        duration.as_secs_f64() * 1000.0 / iterations as f64,
        bytes
    );

    assert!(bytes > 0);
    // Generous bound so unoptimised test builds still pass
    assert!(duration.as_secs() < 20);
}

/// Benchmarks the diff encoder repainting a whole maximum-size board
#[test]
fn benchmark_full_repaint() {
    let mut grid = Grid::new(254, 254).unwrap();
    for y in 1..253 {
        for x in 1..253 {
            if (x + y) % 3 == 0 {
                grid.set(x, y, Cell::Owned(((x * y) % 6 + 1) as u16));
            }
        }
    }
    let sidebar = Sidebar::new(254 / 2 - 2);
    let mut frame = Frame::blank(SIDEBAR_WIDTH + 254, 254 / 2);

    let iterations = 50;
    let start = Instant::now();
    let mut total = 0usize;

    for _ in 0..iterations {
        frame.invalidate();
        total += frame.diff(&Scene::new(&grid, &sidebar, true), (0, 0)).len();
    }

    let duration = start.elapsed();
    println!(
        "Full repaint: {} iterations in {:?} ({:.2} ms/iter, {} bytes/iter)",
        iterations,
        duration,
        duration.as_secs_f64() * 1000.0 / iterations as f64,
        total / iterations
    );

    assert!(duration.as_secs() < 20);
}

/// Benchmarks an idle diff, the common case for most cells every tick
#[test]
fn benchmark_idle_diff() {
    let grid = Grid::new(254, 254).unwrap();
    let sidebar = Sidebar::new(254 / 2 - 2);
    let mut frame = Frame::blank(SIDEBAR_WIDTH + 254, 254 / 2);
    frame.diff(&Scene::new(&grid, &sidebar, false), (0, 0));

    let iterations = 200;
    let start = Instant::now();
    for _ in 0..iterations {
        assert!(frame
            .diff(&Scene::new(&grid, &sidebar, false), (0, 0))
            .is_empty());
    }

    let duration = start.elapsed();
    println!(
        "Idle diff: {} iterations in {:?} ({:.2} μs/iter)",
        iterations,
        duration,
        duration.as_micros() as f64 / iterations as f64
    );
    assert!(duration.as_secs() < 20);
}

/// Benchmarks ranking a large restored scoreboard
#[test]
fn benchmark_scoreboard_recompute() {
    let mut board = Scoreboard::new();
    board.restore((0..2000u32).map(|i| {
        (
            format!("id{}", i),
            ScoreRecord {
                name: format!("p{}", i),
                kills: i % 37,
                deaths: i % 11,
            },
        )
    }));

    let iterations = 100u32;
    let start = Instant::now();
    for i in 0..iterations {
        board.record("id0", "p0", i, 0, Some(1));
        board.recompute();
    }

    let duration = start.elapsed();
    println!(
        "Scoreboard recompute: {} iterations over {} entries in {:?} ({:.2} ms/iter)",
        iterations,
        board.ranked().len(),
        duration,
        duration.as_secs_f64() * 1000.0 / iterations as f64
    );

    assert_eq!(board.leader().unwrap().identity, "id0");
    assert!(duration.as_secs() < 20);
}

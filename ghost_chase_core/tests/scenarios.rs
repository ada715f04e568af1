use ghost_chase_core::{
    Direction, Position, Vec2,
    config::{LevelSource, MovementMode, SessionConfig},
    ghost::{Ghost, GhostState, TickContext},
    level::Level,
    maze,
    search::{Algorithm, bfs_path, dfs_path, dijkstra_path},
    session::{Session, SessionStatus},
    targeting::{Role, TargetInput, Targeting},
};
use rand::{SeedableRng, rngs::StdRng};

#[test]
fn seeded_maze_rasterizes_identically() {
    let first = maze::generate_level(10, 10, 3, 42).unwrap();
    let second = maze::generate_level(10, 10, 3, 42).unwrap();
    assert_eq!((first.width(), first.height()), (30, 30));
    assert_eq!(first.tiles(), second.tiles());
    assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
}

#[test]
fn bfs_and_dijkstra_agree_across_the_maze() {
    let level = maze::generate_level(10, 10, 3, 42).unwrap();
    let grid = level.connectivity();
    // (0, 0) and (29, 29) are border walls; these are the corner cell centers.
    let (start, goal) = (Position::new(1, 1), Position::new(28, 28));
    let bfs = bfs_path(&grid, start, goal);
    let dijkstra = dijkstra_path(&grid, start, goal);
    assert!(!bfs.is_empty());
    assert_eq!(bfs.len(), dijkstra.len());
    assert_eq!(bfs.first(), Some(&start));
    assert_eq!(dijkstra.last(), Some(&goal));
}

#[test]
fn every_reachable_pair_has_a_minimal_and_a_valid_path() {
    let level = maze::generate_level(6, 6, 3, 7).unwrap();
    let grid = level.connectivity();
    let centers: Vec<Position> = (0..6)
        .flat_map(|y| (0..6).map(move |x| Position::new(x * 3 + 1, y * 3 + 1)))
        .collect();
    for &start in centers.iter().step_by(5) {
        for &goal in &centers {
            let bfs = bfs_path(&grid, start, goal);
            assert_eq!(bfs.len(), dijkstra_path(&grid, start, goal).len());

            let dfs = dfs_path(&grid, start, goal);
            assert_eq!(dfs.first(), Some(&start));
            assert_eq!(dfs.last(), Some(&goal));
            assert!(dfs.len() >= bfs.len());
            for pair in dfs.windows(2) {
                let direction = Direction::between(pair[0], pair[1]).unwrap();
                assert!(grid.is_open(pair[0], direction));
            }
        }
    }
}

#[test]
fn searches_are_total() {
    let level = Level::classic();
    let grid = level.connectivity();
    let floor = Position::new(1, 1);
    let house = Position::new(13, 14);
    for algorithm in Algorithm::ALL {
        assert!(algorithm.find_path(&grid, Position::new(0, 0), floor).is_empty());
        assert!(algorithm.find_path(&grid, floor, Position::new(0, 0)).is_empty());
        assert!(algorithm.find_path(&grid, floor, Position::new(28, 31)).is_empty());
        // The house interior is walkable but sealed off by the gate.
        assert!(algorithm.find_path(&grid, floor, house).is_empty());
    }
}

#[test]
fn boxed_ghosts_reach_pursuit() {
    let level = Level::classic();
    let connectivity = level.connectivity();
    let config = SessionConfig::default();
    let limit = config.exit_delay_ticks * 3 + 200;
    for role in [Role::Inky, Role::Pinky, Role::Clyde] {
        let mut ghost = Ghost::new(role, &level, &config);
        assert_eq!(ghost.state(), GhostState::InBox);
        let ctx = TickContext {
            level: &level,
            connectivity: &connectivity,
            config: &config,
            target: Position::new(13, 23).center(config.tile_size),
            frightened: false,
            eaten: false,
        };
        let released = (0..limit).any(|_| {
            ghost.update(&ctx);
            ghost.state() == GhostState::Pursuing
        });
        assert!(released, "{role:?} still {:?}", ghost.state());
    }
}

#[test]
fn targeting_rules_are_pure() {
    let config = SessionConfig::default();
    let input = TargetInput {
        player: Vec2::new(100.0, 100.0),
        heading: Direction::North,
        own: Vec2::new(400.0, 400.0),
        sibling: Some(Vec2::new(60.0, 220.0)),
    };
    for role in Role::ALL {
        let rule = Targeting::for_role(role, &config, Vec2::new(30.0, 590.0));
        let first = rule.target(&input);
        for _ in 0..10 {
            assert_eq!(rule.target(&input), first);
        }
    }
}

#[test]
fn ambush_overshoots_when_facing_up() {
    // Facing up shifts the target left as well as up.
    let ambush = Targeting::Ambush { offset: 80.0 };
    let target = ambush.target(&TargetInput {
        player: Vec2::new(100.0, 100.0),
        heading: Direction::North,
        own: Vec2::new(0.0, 0.0),
        sibling: None,
    });
    assert_eq!(target, Vec2::new(20.0, 20.0));
}

#[test]
fn vector_pivot_without_sibling_chases_directly() {
    let pivot = Targeting::VectorPivot { offset: 40.0 };
    let player = Vec2::new(180.0, 260.0);
    let target = pivot.target(&TargetInput {
        player,
        heading: Direction::South,
        own: Vec2::new(0.0, 0.0),
        sibling: None,
    });
    assert_eq!(target, player);
}

#[test]
fn generated_session_plays_with_search_guided_ghosts() {
    for algorithm in Algorithm::ALL {
        let config = SessionConfig {
            level: LevelSource::Generated {
                rows: 8,
                cols: 8,
                scale: 3,
            },
            movement: MovementMode::SearchGuided,
            algorithm,
            seed: 3,
            ..SessionConfig::default()
        };
        let mut session = Session::new(config).unwrap();
        assert!(session.level().house().is_none());
        let steering = [
            Direction::North,
            Direction::East,
            Direction::South,
            Direction::West,
        ];
        for tick in 0..600 {
            let input = (tick % 40 == 0).then(|| steering[(tick / 40) % 4]);
            if session.tick(input) != SessionStatus::Playing {
                break;
            }
        }
        // The spawn tile's own pellet is eaten on the first tick.
        assert!(session.score() >= 10);
        for ghost in session.ghosts() {
            let tile = ghost.position().to_tile(20.0).unwrap();
            assert!(tile.x < 24 && tile.y < 24);
        }
    }
}

#[test]
fn json_levels_round_trip_through_sessions() {
    let level = maze::generate_level(5, 7, 3, 99).unwrap();
    let json = level.to_json().unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let loaded = Level::from_json(&json, &mut rng).unwrap();
    assert_eq!(loaded.tiles(), level.tiles());
    let session = Session::with_level(SessionConfig::default(), loaded).unwrap();
    assert_eq!(session.status(), SessionStatus::Playing);
}

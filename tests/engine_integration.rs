//! End-to-end engine tests against a mock leaderboard server.
//!
//! These drive the full pipeline (root probing, index matching, family
//! grouping, model loading, rotation) through repeated `tick()` calls,
//! the same way a host loop would.

use std::time::Duration;

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use podium::config::Config;
use podium::engine::{Engine, EngineState};

const HALO_INDEX: &str = r#"[
    {"title_id": "AA", "name": "Halo 2 (NTSC)", "slug": "halo-2-ntsc"},
    {"title_id": "BB", "name": "Halo 2 (PAL)", "slug": "halo-2-pal"},
    {"title_id": "CC", "name": "Crimson Skies (NTSC)", "slug": "crimson-skies-ntsc"}
]"#;

fn title_doc(title: &str) -> String {
    format!(
        r#"{{
            "game_title": "{title}",
            "scoreboards": [{{
                "name": "Deathmatch",
                "rows": [
                    {{"rank": "1", "gamertag": "MasterChief", "score": "50"}},
                    {{"rank": "2", "gamertag": "Arbiter", "score": "42"}}
                ]
            }}]
        }}"#
    )
}

/// Test config pointed at the mock server, with every pacing gate opened
/// so each tick can make progress.
fn test_config(base: &str, cache_dir: &std::path::Path) -> Config {
    let mut config = Config::default();
    config.server.base_csv = base.to_string();
    config.server.probe_spacing_ms = 0;
    config.server.probe_backoff_ms = 0;
    config.server.attempt_interval_ms = 0;
    config.cache.dir = cache_dir.to_path_buf();
    config
}

async fn mount_title(server: &MockServer, id: &str, title: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/data/by_id/{id}.json")))
        .respond_with(ResponseTemplate::new(200).set_body_string(title_doc(title)))
        .mount(server)
        .await;
}

/// Probing tries each derived candidate once per eligible tick and locks
/// onto the first one that serves a parseable index.
#[tokio::test]
async fn test_root_confirmed_on_third_candidate() {
    let server = MockServer::start().await;
    let base = format!("{}/xbox", server.uri());
    // Candidates, in order: /xbox, /xbox/xbox, /xbox/xbox/data.
    Mock::given(method("GET"))
        .and(path("/xbox/data/search.json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/xbox/xbox/data/search.json"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/xbox/xbox/data/data/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut engine = Engine::with_seed(test_config(&base, dir.path()), 1).unwrap();
    engine.on_app_name("anything");

    engine.tick().await;
    assert!(engine.work_root().is_none());
    engine.tick().await;
    assert!(engine.work_root().is_none());
    engine.tick().await;
    assert_eq!(
        engine.work_root(),
        Some(format!("{}/xbox/xbox/data", server.uri()).as_str())
    );
    assert_eq!(engine.state(), EngineState::Resolving);

    // Resolution keeps running against the cached index; the expect(1)
    // counts verify no candidate is probed again.
    for _ in 0..5 {
        engine.tick().await;
    }
    assert_eq!(
        engine.work_root(),
        Some(format!("{}/xbox/xbox/data", server.uri()).as_str())
    );
}

#[tokio::test]
async fn test_full_pipeline_to_active() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(HALO_INDEX))
        .mount(&server)
        .await;
    mount_title(&server, "AA", "Halo 2").await;
    mount_title(&server, "BB", "Halo 2").await;

    let dir = tempfile::tempdir().unwrap();
    let mut engine = Engine::with_seed(test_config(&server.uri(), dir.path()), 42).unwrap();
    engine.on_app_name("Halo 2");
    assert_eq!(engine.state(), EngineState::Probing);

    // probe, resolve, load
    engine.tick().await;
    assert_eq!(engine.state(), EngineState::Resolving);
    engine.tick().await;
    assert_eq!(engine.state(), EngineState::Loading);
    engine.tick().await;
    assert_eq!(engine.state(), EngineState::Active);
    assert!(engine.is_active());

    assert_eq!(engine.game_title(), Some("Halo 2"));
    let pool = engine.title_pool();
    assert_eq!(pool.len(), 2);
    assert!(pool.contains(&"AA".to_string()));
    assert!(pool.contains(&"BB".to_string()));

    let (position, size) = engine.variant_cursor().unwrap();
    assert_eq!(size, 2);
    assert!(position < size);

    let board = engine.current_board().unwrap();
    assert_eq!(board.name, "Deathmatch");
    assert_eq!(board.rows[0].name, "MasterChief");
    assert_eq!(board.rows[0].metric, "50");
}

#[tokio::test]
async fn test_no_acceptable_match_keeps_engine_resolving() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(HALO_INDEX))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut engine = Engine::with_seed(test_config(&server.uri(), dir.path()), 1).unwrap();
    // No token overlap and no containment with any index entry.
    engine.on_app_name("XBMC4Gamers");

    for _ in 0..6 {
        engine.tick().await;
    }
    assert!(!engine.is_active());
    assert_eq!(engine.state(), EngineState::Resolving);
    assert!(engine.current_board().is_none());
}

#[tokio::test]
async fn test_query_change_resets_but_keeps_root() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(HALO_INDEX))
        .mount(&server)
        .await;
    mount_title(&server, "AA", "Halo 2").await;
    mount_title(&server, "BB", "Halo 2").await;

    let dir = tempfile::tempdir().unwrap();
    let mut engine = Engine::with_seed(test_config(&server.uri(), dir.path()), 7).unwrap();
    engine.on_app_name("Halo 2");
    for _ in 0..3 {
        engine.tick().await;
    }
    assert!(engine.is_active());
    let root = engine.work_root().map(str::to_string);
    assert!(root.is_some());

    // Switching titles drops the pool and model but not the probed root.
    engine.on_app_name("Crimson Skies");
    assert!(!engine.is_active());
    assert_eq!(engine.state(), EngineState::Resolving);
    assert_eq!(engine.work_root(), root.as_deref());
    assert!(engine.current_board().is_none());
    assert!(engine.variant_cursor().is_none());
}

#[tokio::test]
async fn test_variant_rotation_reloads_other_pool_member() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(HALO_INDEX))
        .mount(&server)
        .await;
    mount_title(&server, "AA", "Halo 2 NTSC").await;
    mount_title(&server, "BB", "Halo 2 PAL").await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = test_config(&server.uri(), dir.path());
    // Collapse every dwell window so rotation fires as soon as the board
    // has scrolled out.
    config.rotation.step_ms = 0;
    config.rotation.board_dwell_ms = 0;
    config.rotation.freeze_ms = 0;
    config.rotation.variant_dwell_ms = 0;

    let mut engine = Engine::with_seed(config, 3).unwrap();
    engine.on_app_name("Halo 2");
    for _ in 0..3 {
        engine.tick().await;
    }
    assert!(engine.is_active());
    let (first_variant, _) = engine.variant_cursor().unwrap();
    let first_title = engine.game_title().unwrap().to_string();

    let mut switched = false;
    for _ in 0..500 {
        engine.tick().await;
        if let Some((position, _)) = engine.variant_cursor() {
            if position != first_variant && engine.is_active() {
                switched = true;
                break;
            }
        }
    }
    assert!(switched, "variant never advanced");
    assert_ne!(engine.game_title(), Some(first_title.as_str()));
}

#[tokio::test]
async fn test_offline_start_with_warm_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string(HALO_INDEX))
        .mount(&server)
        .await;
    mount_title(&server, "AA", "Halo 2").await;
    mount_title(&server, "BB", "Halo 2").await;

    let dir = tempfile::tempdir().unwrap();

    {
        // Warm session fills the cache.
        let mut engine = Engine::with_seed(test_config(&server.uri(), dir.path()), 5).unwrap();
        engine.on_app_name("Halo 2");
        for _ in 0..3 {
            engine.tick().await;
        }
        assert!(engine.is_active());
    }

    // Take the server "offline": every request now 503s. A new session
    // over the same cache dir still activates: the cached index is
    // stale-tolerated during probing, and title bodies fall back to the
    // cache once the network path has failed.
    server.reset().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri(), dir.path());
    config.server.title_ttl_secs = 0;
    let mut engine = Engine::with_seed(config, 5).unwrap();
    engine.on_app_name("Halo 2");
    for _ in 0..10 {
        engine.tick().await;
        if engine.is_active() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(engine.is_active());
    assert_eq!(engine.game_title(), Some("Halo 2"));
}

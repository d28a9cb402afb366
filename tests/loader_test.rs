//! Integration tests for per-title document loading.

use podium::loader::{parse_model, LoaderSettings};

fn settings() -> LoaderSettings {
    LoaderSettings::default()
}

#[test]
fn test_realistic_document() {
    let body = r#"{
        "game_title": "Crimson Skies",
        "scoreboards": [
            {
                "name": "Dogfight Wins",
                "rows": [
                    {"rank": "1", "gamertag": "ace", "wins": 42, "losses": 3},
                    {"rank": "2", "gamertag": "baron", "wins": 37, "losses": 8}
                ]
            },
            {
                "name": "Best Times",
                "columns": ["pos", "player", "time"],
                "rows": [
                    ["1", "ace", "1:02.3"],
                    ["2", "chip", "1:05.9"]
                ]
            }
        ]
    }"#;

    let model = parse_model(body, &settings()).unwrap();
    assert_eq!(model.game_title, "Crimson Skies");
    assert_eq!(model.boards.len(), 2);

    let dogfight = &model.boards[0];
    assert_eq!(dogfight.name, "Dogfight Wins");
    assert_eq!(dogfight.rows[0].name, "ace");
    assert_eq!(dogfight.rows[0].metric, "42");
    assert_eq!(dogfight.rows[0].extras, vec!["losses=3"]);

    let times = &model.boards[1];
    assert_eq!(times.rows[0].name, "ace");
    assert_eq!(times.rows[0].metric, "1:02.3");
}

#[test]
fn test_mixed_row_shapes_in_one_board() {
    let body = r#"{
        "scoreboards": [{
            "columns": ["rank", "name", "score"],
            "rows": [
                {"rank": "2", "name": "beta", "score": "90"},
                ["1", "alpha", "100"],
                "gamma"
            ]
        }]
    }"#;

    let model = parse_model(body, &settings()).unwrap();
    let rows = &model.boards[0].rows;
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].name, "alpha");
    assert_eq!(rows[1].name, "beta");
    // The scalar row got rank 3 (its 1-based position) and no metric.
    assert_eq!(rows[2].name, "gamma");
    assert_eq!(rows[2].rank, "3");
    assert!(rows[2].metric.is_empty());
}

#[test]
fn test_board_without_rows_dropped_others_kept() {
    let body = r#"{
        "scoreboards": [
            {"name": "Empty", "rows": []},
            {"name": "Kept", "rows": ["solo"]}
        ]
    }"#;

    let model = parse_model(body, &settings()).unwrap();
    assert_eq!(model.boards.len(), 1);
    assert_eq!(model.boards[0].name, "Kept");
}

#[test]
fn test_hard_row_cap() {
    let rows: Vec<String> = (1..=1500)
        .map(|i| format!(r#"{{"rank":"{i}","name":"p{i}","score":"{i}"}}"#))
        .collect();
    let body = format!(r#"{{"scoreboards": [{{"rows": [{}]}}]}}"#, rows.join(","));

    // Unlimited configured rows still stops at the safety cap.
    let model = parse_model(&body, &LoaderSettings { max_rows: 0 }).unwrap();
    assert_eq!(model.boards[0].rows.len(), 1000);
}

#[test]
fn test_numeric_rank_sort_with_gaps() {
    let body = r#"{
        "scoreboards": [{
            "rows": [
                {"rank": "100", "name": "z"},
                {"rank": "9", "name": "a"},
                {"rank": "dnf", "name": "q"},
                {"rank": "21", "name": "m"}
            ]
        }]
    }"#;

    let model = parse_model(body, &settings()).unwrap();
    let order: Vec<&str> = model.boards[0].rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(order, vec!["a", "m", "z", "q"]);
}

#[test]
fn test_no_partial_model_on_failure() {
    assert!(parse_model(r#"{"scoreboards": [{"rows": []}]}"#, &settings()).is_err());
    assert!(parse_model("truncated {", &settings()).is_err());
    assert!(parse_model(r#"{"game_title": "X"}"#, &settings()).is_err());
}

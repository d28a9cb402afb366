//! Integration tests for matching and family grouping against realistic
//! index snippets.

use podium::matcher::family::{build_pool, family_key};
use podium::matcher::{best_match, ScoreWeights};
use podium::models::{parse_index, IndexEntry};

fn entry(id: &str, name: &str, slug: &str) -> IndexEntry {
    IndexEntry {
        title_id: id.to_string(),
        name: Some(name.to_string()),
        name_lc: None,
        slug: Some(slug.to_string()),
    }
}

fn sample_index() -> Vec<IndexEntry> {
    vec![
        entry("AA", "Halo 2 (NTSC)", "halo-2-ntsc"),
        entry("BB", "Halo 2 (PAL)", "halo-2-pal"),
        entry("CC", "Halo: Combat Evolved (NTSC)", "halo-combat-evolved-ntsc"),
        entry("DD", "Fable (NTSC)", "fable-ntsc"),
        entry("EE", "Crimson Skies (PAL)", "crimson-skies-pal"),
        entry("FF", "Pirates of the Caribbean", "pirates-of-the-caribbean"),
    ]
}

#[test]
fn test_halo_2_resolves_family_pool_of_two() {
    let entries = sample_index();
    let outcome = best_match("Halo 2", &entries, &ScoreWeights::default());
    let best = outcome.best.expect("Halo 2 must resolve");
    assert_eq!(best.family_key, "halo2");

    let pool = build_pool(&entries, &best.family_key, &best.id);
    assert_eq!(pool.len(), 2);
    assert!(pool.contains(&"AA".to_string()));
    assert!(pool.contains(&"BB".to_string()));
}

#[test]
fn test_unrelated_query_yields_no_match() {
    // No token overlap and no containment with any entry: the hard gate
    // must refuse even if raw n-gram similarity happens to score.
    let entries = sample_index();
    let outcome = best_match("XBMC4Gamers", &entries, &ScoreWeights::default());
    assert!(outcome.best.is_none());
}

#[test]
fn test_exact_name_always_wins() {
    let entries = sample_index();
    let outcome = best_match("Fable (NTSC)", &entries, &ScoreWeights::default());
    let best = outcome.best.unwrap();
    assert_eq!(best.id, "DD");
    assert_eq!(best.score, 100);
}

#[test]
fn test_pool_always_contains_matched_id() {
    let entries = sample_index();
    for query in ["Halo 2", "Fable", "Crimson Skies"] {
        let outcome = best_match(query, &entries, &ScoreWeights::default());
        let best = outcome.best.unwrap_or_else(|| panic!("{query} must resolve"));
        let pool = build_pool(&entries, &best.family_key, &best.id);
        assert!(
            pool.contains(&best.id),
            "{query}: pool {pool:?} missing matched id {}",
            best.id
        );
    }
}

#[test]
fn test_pool_members_share_family_key() {
    let entries = sample_index();
    let outcome = best_match("Halo 2", &entries, &ScoreWeights::default());
    let best = outcome.best.unwrap();
    let pool = build_pool(&entries, &best.family_key, &best.id);

    for id in &pool {
        let e = entries.iter().find(|e| &e.title_id == id).unwrap();
        assert_eq!(family_key(e.name(), e.slug()), best.family_key);
    }
}

#[test]
fn test_roman_numeral_query_matches_digit_name() {
    let entries = sample_index();
    let outcome = best_match("Halo II", &entries, &ScoreWeights::default());
    let best = outcome.best.unwrap();
    assert!(best.id == "AA" || best.id == "BB");
}

#[test]
fn test_region_glyph_prefix_ignored() {
    let entries = sample_index();
    let outcome = best_match("xHalo 2", &entries, &ScoreWeights::default());
    assert!(outcome.best.is_some());
}

#[test]
fn test_diagnostics_recorded_on_failure() {
    let entries = sample_index();
    // "Halo" alone scores against the Halo titles but stays under the
    // threshold; near misses land in diagnostics.
    let outcome = best_match("Halo Infinite Wars", &entries, &ScoreWeights::default());
    for c in &outcome.candidates {
        assert!(c.score > 0);
    }
}

#[test]
fn test_match_over_parsed_wire_index() {
    let body = r#"[
        {"title_id": "AA", "name": "Halo 2 (NTSC)", "slug": "halo-2-ntsc"},
        {"title_id": "BB", "name": "Halo 2 (PAL)", "slug": "halo-2-pal"},
        {"skipped": true},
        {"title_id": "DD", "name": "Fable (NTSC)"}
    ]"#;
    let entries = parse_index(body).unwrap();
    assert_eq!(entries.len(), 3);

    let outcome = best_match("Halo 2", &entries, &ScoreWeights::default());
    let best = outcome.best.unwrap();
    let pool = build_pool(&entries, &best.family_key, &best.id);
    assert_eq!(pool, vec!["AA".to_string(), "BB".to_string()]);
}

#[test]
fn test_custom_threshold_is_honored() {
    let entries = sample_index();
    let strict = ScoreWeights {
        accept_threshold: 99,
        ..ScoreWeights::default()
    };
    // Normalized-name equality scores 93, below a 99 threshold.
    let outcome = best_match("Halo 2 NTSC", &entries, &strict);
    assert!(outcome.best.is_none());
}

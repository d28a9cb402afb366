//! Candidate matching and scoring
//!
//! Scores every index entry against a normalized query and picks the
//! single best match, or none. Scoring runs in tiers: exact equalities
//! first (name, pre-lowercased name, slug, then normalized forms, where
//! the normalized comparison also accepts the region-stripped name, so an
//! unqualified query lines up with its regional variants), then a
//! composite of token overlap, bigram similarity, and substring
//! containment, with penalties for coincidental short-string and
//! generic-label matches.
//!
//! A hard gate keeps bigram similarity honest: a candidate sharing no
//! token with the query, where neither normalized string contains the
//! other, scores zero no matter how much n-gram overlap it has.
//!
//! The weights are empirically tuned values carried as configuration; see
//! [`ScoreWeights`].

pub mod family;

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::models::{IndexEntry, MatchCandidate};
use crate::normalize::{norm_key, tokenize};

/// Score for an exact case-insensitive name equality.
const TIER_EXACT_NAME: i32 = 100;
/// Score for an exact `name_lc` equality.
const TIER_EXACT_NAME_LC: i32 = 98;
/// Score for an exact slug equality.
const TIER_EXACT_SLUG: i32 = 95;
/// Score for a normalized-name equality.
const TIER_NORM_NAME: i32 = 93;
/// Score for a normalized-slug equality.
const TIER_NORM_SLUG: i32 = 91;

/// At most this many near-miss candidates are retained for diagnostics.
const MAX_DIAGNOSTICS: usize = 10;

/// Generic platform-label vocabulary, in normalized token space (the
/// region-glyph strip turns "xbox" into "box" before comparison). A
/// candidate whose name tokens all come from this set is a category label,
/// not a title, unless the query itself leads with the anchor word.
const GENERIC_LABEL_TOKENS: &[&str] = &["box", "live", "arcade"];
const GENERIC_ANCHOR_TOKEN: &str = "box";

/// Tuned scoring weights.
///
/// These values were calibrated against known false positives; they are
/// configuration, not derived quantities.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Points per token shared between query and candidate
    pub per_token: i32,

    /// Cap on the token-overlap contribution
    pub token_overlap_cap: i32,

    /// Bonus when the first tokens match exactly
    pub first_token_bonus: i32,

    /// Bigram-Jaccard similarity is scaled to 0..=this
    pub bigram_scale: i32,

    /// Containment bonus for short contained strings
    pub contains_base: i32,

    /// Containment bonus at 5+ contained characters
    pub contains_at_5: i32,

    /// Containment bonus at 8+ contained characters
    pub contains_at_8: i32,

    /// Containment bonus at 12+ contained characters
    pub contains_at_12: i32,

    /// Penalty for short candidates without a first-token match
    pub short_name_penalty: i32,

    /// Normalized-name length at or below which the short penalty applies
    pub short_name_max_len: usize,

    /// Penalty for generic platform-label candidates
    pub generic_label_penalty: i32,

    /// Minimum score for a candidate to be eligible at all
    pub accept_threshold: i32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            per_token: 12,
            token_overlap_cap: 60,
            first_token_bonus: 25,
            bigram_scale: 70,
            contains_base: 15,
            contains_at_5: 18,
            contains_at_8: 22,
            contains_at_12: 25,
            short_name_penalty: 20,
            short_name_max_len: 6,
            generic_label_penalty: 35,
            accept_threshold: 65,
        }
    }
}

/// The accepted match, with its family key for pool building.
#[derive(Debug, Clone)]
pub struct BestMatch {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub score: i32,
    pub family_key: String,
}

/// Result of one matching pass over the index.
#[derive(Debug, Clone, Default)]
pub struct MatchOutcome {
    /// The accepted best match, if any candidate reached the threshold
    pub best: Option<BestMatch>,

    /// Bounded list of scoring candidates, for diagnostics only
    pub candidates: Vec<MatchCandidate>,
}

struct ScoredEntry<'a> {
    entry: &'a IndexEntry,
    norm_name: String,
    name_tokens: Vec<String>,
    score: i32,
}

/// Find the best match for `raw_query` among `entries`.
///
/// Returns a `MatchOutcome` whose `best` is `None` when nothing reached
/// the acceptance threshold; the near-miss candidates are still recorded.
pub fn best_match(
    raw_query: &str,
    entries: &[IndexEntry],
    weights: &ScoreWeights,
) -> MatchOutcome {
    let q_tokens = tokenize(raw_query);
    let q_key = q_tokens.concat();
    if q_key.is_empty() {
        return MatchOutcome::default();
    }
    let q_lc = raw_query.trim().to_lowercase();

    let mut outcome = MatchOutcome::default();
    let mut best: Option<ScoredEntry<'_>> = None;

    for entry in entries {
        let name = entry.name();
        let slug = entry.slug();
        let norm_name = norm_key(name);
        let norm_slug = norm_key(slug);
        let name_tokens = tokenize(name);
        let slug_tokens = tokenize(slug);

        let (mut score, mut reason) = score_tiers(entry, &q_lc, &q_key, &norm_name, &norm_slug);

        if score == 0 {
            score = composite_score(
                weights,
                &q_tokens,
                &q_key,
                &norm_name,
                &norm_slug,
                &name_tokens,
                &slug_tokens,
            );
            reason = "composite";
        }

        // Hard gate: bigram overlap alone is not evidence of relatedness.
        if score > 0 && !overlap_gate(&q_tokens, &q_key, &norm_name, &norm_slug, &name_tokens, &slug_tokens)
        {
            score = 0;
            reason = "";
        }

        if score > 0 && outcome.candidates.len() < MAX_DIAGNOSTICS {
            outcome.candidates.push(MatchCandidate {
                id: entry.title_id.clone(),
                name: name.to_string(),
                slug: slug.to_string(),
                score,
                reason: reason.to_string(),
            });
        }

        if score < weights.accept_threshold {
            continue;
        }

        let scored = ScoredEntry {
            entry,
            norm_name,
            name_tokens,
            score,
        };
        let take = match &best {
            None => true,
            Some(current) => prefer(&scored, current, &q_tokens, &q_key),
        };
        if take {
            best = Some(scored);
        }
    }

    outcome.best = best.map(|s| {
        let name = s.entry.name().to_string();
        let slug = s.entry.slug().to_string();
        let family_key = family::family_key(&name, &slug);
        BestMatch {
            id: s.entry.title_id.clone(),
            name,
            slug,
            score: s.score,
            family_key,
        }
    });
    outcome
}

/// Exact-equality tiers, first hit wins.
fn score_tiers(
    entry: &IndexEntry,
    q_lc: &str,
    q_key: &str,
    norm_name: &str,
    norm_slug: &str,
) -> (i32, &'static str) {
    let name = entry.name();
    let slug = entry.slug();

    if !name.is_empty() && name.to_lowercase() == q_lc {
        return (TIER_EXACT_NAME, "exact name");
    }
    if let Some(name_lc) = entry.name_lc.as_deref() {
        if !name_lc.is_empty() && name_lc.to_lowercase() == q_lc {
            return (TIER_EXACT_NAME_LC, "exact name_lc");
        }
    }
    if !slug.is_empty() && slug.to_lowercase() == q_lc {
        return (TIER_EXACT_SLUG, "exact slug");
    }
    // The normalized comparison also tries the region-stripped form, so
    // "Halo 2" lines up with "Halo 2 (NTSC)" at this tier.
    if !norm_name.is_empty()
        && (norm_name == q_key || family::family_key_from_name(name) == q_key)
    {
        return (TIER_NORM_NAME, "norm(name)");
    }
    if !norm_slug.is_empty()
        && (norm_slug == q_key || family::family_key_from_slug(slug) == q_key)
    {
        return (TIER_NORM_SLUG, "norm(slug)");
    }
    (0, "")
}

/// Composite heuristic score for non-exact candidates.
#[allow(clippy::too_many_arguments)]
fn composite_score(
    w: &ScoreWeights,
    q_tokens: &[String],
    q_key: &str,
    norm_name: &str,
    norm_slug: &str,
    name_tokens: &[String],
    slug_tokens: &[String],
) -> i32 {
    let st_name = token_overlap_score(w, q_tokens, name_tokens)
        + first_token_bonus(w, q_tokens, name_tokens);
    let st_slug = token_overlap_score(w, q_tokens, slug_tokens)
        + first_token_bonus(w, q_tokens, slug_tokens);

    let bigram = bigram_jaccard_score(w, q_key, norm_name)
        .max(bigram_jaccard_score(w, q_key, norm_slug));

    let contains = contains_bonus(w, q_key, norm_name)
        .max(contains_bonus(w, q_key, norm_slug))
        .max(contains_bonus(w, norm_name, q_key))
        .max(contains_bonus(w, norm_slug, q_key));

    let mut score = st_name.max(st_slug).max(bigram).max(contains);

    // Short candidates with an unaligned head token are usually noise.
    if first_token_bonus(w, q_tokens, name_tokens) == 0
        && first_token_bonus(w, q_tokens, slug_tokens) == 0
        && norm_name.len() <= w.short_name_max_len
    {
        score -= w.short_name_penalty;
    }

    // De-prefer platform/category labels unless the query asks for one.
    if is_generic_label(name_tokens)
        && q_tokens.first().map(String::as_str) != Some(GENERIC_ANCHOR_TOKEN)
    {
        score -= w.generic_label_penalty;
    }

    score.max(0)
}

/// Some token is shared, or one normalized string contains the other.
fn overlap_gate(
    q_tokens: &[String],
    q_key: &str,
    norm_name: &str,
    norm_slug: &str,
    name_tokens: &[String],
    slug_tokens: &[String],
) -> bool {
    let token_overlap = q_tokens
        .iter()
        .any(|q| name_tokens.contains(q) || slug_tokens.contains(q));
    if token_overlap {
        return true;
    }

    let contains = |a: &str, b: &str| !a.is_empty() && !b.is_empty() && a.contains(b);
    contains(norm_name, q_key)
        || contains(norm_slug, q_key)
        || contains(q_key, norm_name)
        || contains(q_key, norm_slug)
}

fn token_overlap_score(w: &ScoreWeights, q_tokens: &[String], c_tokens: &[String]) -> i32 {
    if q_tokens.is_empty() || c_tokens.is_empty() {
        return 0;
    }
    let matches = q_tokens.iter().filter(|q| c_tokens.contains(q)).count() as i32;
    (matches * w.per_token).min(w.token_overlap_cap)
}

fn first_token_bonus(w: &ScoreWeights, q_tokens: &[String], c_tokens: &[String]) -> i32 {
    match (q_tokens.first(), c_tokens.first()) {
        (Some(q), Some(c)) if q == c => w.first_token_bonus,
        _ => 0,
    }
}

/// Jaccard similarity over the character-bigram sets, scaled to
/// `0..=bigram_scale`.
fn bigram_jaccard_score(w: &ScoreWeights, a: &str, b: &str) -> i32 {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let grams = |s: &str| -> BTreeSet<(u8, u8)> {
        s.as_bytes().windows(2).map(|w| (w[0], w[1])).collect()
    };
    let ga = grams(a);
    let gb = grams(b);
    let inter = ga.intersection(&gb).count();
    let union = ga.len() + gb.len() - inter;
    if union == 0 {
        return 0;
    }
    let jacc = inter as f32 / union as f32;
    ((jacc * w.bigram_scale as f32) as i32).clamp(0, w.bigram_scale)
}

/// Bonus when `big` contains `small`, scaled by how much was contained.
fn contains_bonus(w: &ScoreWeights, small: &str, big: &str) -> i32 {
    if small.is_empty() || big.is_empty() || !big.contains(small) {
        return 0;
    }
    match small.len() {
        n if n >= 12 => w.contains_at_12,
        n if n >= 8 => w.contains_at_8,
        n if n >= 5 => w.contains_at_5,
        _ => w.contains_base,
    }
}

fn is_generic_label(tokens: &[String]) -> bool {
    !tokens.is_empty()
        && tokens
            .iter()
            .all(|t| GENERIC_LABEL_TOKENS.contains(&t.as_str()))
}

/// Tie-breaking: higher score; then normalized length closest to the
/// query's; then first-token alignment; then shorter display name.
fn prefer(cand: &ScoredEntry<'_>, best: &ScoredEntry<'_>, q_tokens: &[String], q_key: &str) -> bool {
    if cand.score != best.score {
        return cand.score > best.score;
    }

    let dist = |s: &ScoredEntry<'_>| (s.norm_name.len() as i64 - q_key.len() as i64).abs();
    let (dc, db) = (dist(cand), dist(best));
    if dc != db {
        return dc < db;
    }

    let aligned = |s: &ScoredEntry<'_>| {
        matches!(
            (q_tokens.first(), s.name_tokens.first()),
            (Some(q), Some(c)) if q == c
        )
    };
    let (ac, ab) = (aligned(cand), aligned(best));
    if ac != ab {
        return ac;
    }

    cand.entry.name().len() < best.entry.name().len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, name: &str, slug: &str) -> IndexEntry {
        IndexEntry {
            title_id: id.to_string(),
            name: Some(name.to_string()),
            name_lc: None,
            slug: if slug.is_empty() {
                None
            } else {
                Some(slug.to_string())
            },
        }
    }

    #[test]
    fn test_exact_name_scores_100() {
        let entries = vec![
            entry("AA", "Halo 2", "halo-2"),
            entry("BB", "Halo: Combat Evolved", "halo-ce"),
        ];
        let outcome = best_match("halo 2", &entries, &ScoreWeights::default());
        let best = outcome.best.unwrap();
        assert_eq!(best.id, "AA");
        assert_eq!(best.score, 100);
    }

    #[test]
    fn test_exact_slug_tier() {
        let entries = vec![entry("AA", "Completely Different", "halo-2")];
        let outcome = best_match("halo-2", &entries, &ScoreWeights::default());
        assert_eq!(outcome.best.unwrap().score, 95);
    }

    #[test]
    fn test_normalized_name_tier() {
        let entries = vec![entry("AA", "Halo II", "")];
        let outcome = best_match("Halo 2", &entries, &ScoreWeights::default());
        assert_eq!(outcome.best.unwrap().score, 93);
    }

    #[test]
    fn test_no_match_below_threshold() {
        let entries = vec![entry("AA", "Completely Unrelated Title", "unrelated")];
        let outcome = best_match("Halo 2", &entries, &ScoreWeights::default());
        assert!(outcome.best.is_none());
    }

    #[test]
    fn test_hard_gate_blocks_bigram_only_overlap() {
        // Deliberately bigram-heavy but token-disjoint and not contained
        // either way.
        let entries = vec![entry("AA", "Gamblers Amber", "gamblers-amber")];
        let outcome = best_match("XBMC4Gamers", &entries, &ScoreWeights::default());
        assert!(outcome.best.is_none());
        assert!(outcome.candidates.is_empty());
    }

    #[test]
    fn test_generic_label_penalized() {
        let w = ScoreWeights::default();
        let entries = vec![
            entry("XL", "Xbox Live Arcade", "xbox-live-arcade"),
            entry("AA", "Arcade Racer 7", "arcade-racer-7"),
        ];
        // Query shares the "arcade" token with the label entry, but the
        // label penalty keeps it below threshold.
        let outcome = best_match("Arcade Racer 7", &entries, &w);
        assert_eq!(outcome.best.unwrap().id, "AA");
    }

    #[test]
    fn test_exact_beats_partial() {
        let w = ScoreWeights::default();
        let entries = vec![
            entry("LONG", "Halo 2 Multiplayer Map Pack", ""),
            entry("EXACT", "Halo 2", ""),
        ];
        let outcome = best_match("halo 2", &entries, &w);
        assert_eq!(outcome.best.unwrap().id, "EXACT");
    }

    #[test]
    fn test_tie_break_prefers_shorter_display_name() {
        // Both entries normalize to "halo2" and tie at the norm(name)
        // tier; the extra inner space defeats the exact-name tier.
        let w = ScoreWeights::default();
        let entries = vec![
            entry("ROMAN", "Halo II", ""),
            entry("DIGIT", "Halo 2", ""),
        ];
        let outcome = best_match("halo  2", &entries, &w);
        assert_eq!(outcome.best.unwrap().id, "DIGIT");
    }

    #[test]
    fn test_diagnostics_bounded() {
        let entries: Vec<IndexEntry> = (0..20)
            .map(|i| entry(&format!("T{i}"), &format!("Halo {i}"), ""))
            .collect();
        let outcome = best_match("halo", &entries, &ScoreWeights::default());
        assert!(outcome.candidates.len() <= MAX_DIAGNOSTICS);
    }

    #[test]
    fn test_empty_query_matches_nothing() {
        let entries = vec![entry("AA", "Halo 2", "")];
        let outcome = best_match("   ", &entries, &ScoreWeights::default());
        assert!(outcome.best.is_none());
        assert!(outcome.candidates.is_empty());
    }
}

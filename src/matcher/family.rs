//! Family grouping of regional title variants
//!
//! Index entries for the same underlying title differ only by a trailing
//! region qualifier: a parenthetical region list on the display name
//! ("Halo 2 (NTSC)") or a region suffix on the slug ("halo-2-ntsc").
//! Stripping that qualifier and normalizing what remains yields the
//! family key; every entry with the same key belongs to one title pool.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::IndexEntry;
use crate::normalize::norm_key;

/// Region slug suffixes, longest-match-first not required (first hit wins).
const SLUG_REGION_SUFFIXES: &[&str] = &[
    "-ntsc", "-pal", "-usa", "-japan", "-jpn", "-germany", "-eu", "-europe", "-asia", "-kor",
    "-korea",
];

/// Words accepted inside a trailing parenthetical region list.
pub fn is_region_word(token: &str) -> bool {
    let t = token.trim_end_matches(',').to_ascii_lowercase();
    matches!(
        t.as_str(),
        "ntsc"
            | "pal"
            | "usa"
            | "us"
            | "japan"
            | "jpn"
            | "germany"
            | "de"
            | "europe"
            | "eu"
            | "asia"
            | "kor"
            | "korea"
            | "au"
            | "australia"
    )
}

fn trailing_parenthetical() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\(([^()]*)\)\s*$").unwrap())
}

/// Family key from a display name.
///
/// A trailing parenthetical is stripped only when every comma/space
/// separated token inside it is a region word; otherwise the full name is
/// normalized as-is.
pub fn family_key_from_name(name: &str) -> String {
    let mut base = name;

    if let Some(caps) = trailing_parenthetical().captures(name) {
        let inside = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let tokens: Vec<&str> = inside
            .split([' ', ','])
            .filter(|t| !t.is_empty())
            .collect();
        if !tokens.is_empty() && tokens.iter().all(|t| is_region_word(t)) {
            base = &name[..caps.get(0).unwrap().start()];
        }
    }

    norm_key(base.trim())
}

/// Family key from a slug: strip a known region suffix, then normalize
/// with dashes read as word separators.
pub fn family_key_from_slug(slug: &str) -> String {
    let lower = slug.to_ascii_lowercase();
    let mut base = lower.as_str();
    for suffix in SLUG_REGION_SUFFIXES {
        if lower.len() > suffix.len() {
            if let Some(stripped) = base.strip_suffix(suffix) {
                base = stripped;
                break;
            }
        }
    }
    norm_key(&base.replace('-', " "))
}

/// Family key for an entry: name-derived, falling back to the slug when
/// the name yields nothing.
pub fn family_key(name: &str, slug: &str) -> String {
    let from_name = family_key_from_name(name);
    if !from_name.is_empty() {
        from_name
    } else {
        family_key_from_slug(slug)
    }
}

/// Collect the ordered, de-duplicated title pool sharing `target` family.
///
/// Degenerate case: an empty scan still yields a singleton pool holding
/// the matched id, so a successful resolution always has a pool.
pub fn build_pool(entries: &[IndexEntry], target: &str, matched_id: &str) -> Vec<String> {
    let mut pool: Vec<String> = Vec::new();
    for entry in entries {
        if family_key(entry.name(), entry.slug()) == target
            && !pool.iter().any(|id| id == &entry.title_id)
        {
            pool.push(entry.title_id.clone());
        }
    }
    if pool.is_empty() {
        pool.push(matched_id.to_string());
    }
    pool
}

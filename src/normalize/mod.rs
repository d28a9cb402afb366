//! Query and title normalization
//!
//! Turns a raw application/title name into an ordered token sequence and a
//! canonical key used by the matcher. The same normalization is applied to
//! queries and to index entries so both sides compare in the same space.
//!
//! The pipeline:
//! 1. lowercase and ASCII fold (`&` becomes `" and "`, anything outside
//!    `[a-z0-9 ]` a space), squeezing runs of spaces
//! 2. strip leading region-glyph letters (`x` before a letter/digit) and a
//!    leading `"the "`, repeated until neither applies
//! 3. split into tokens, mapping roman numerals to decimal strings
//!
//! The prefix strips run to a fixed point so that normalization is
//! idempotent: re-normalizing the produced tokens yields the same tokens.
//!
//! Normalization is pure and infallible; an empty input yields an empty
//! key and no tokens, which callers treat as "no valid query."

/// Map a lowercase roman numeral token (`i`..`x`, including the additive
/// `iiii` form) to its decimal value.
fn roman_to_int(tok: &str) -> Option<u32> {
    match tok {
        "i" => Some(1),
        "ii" => Some(2),
        "iii" => Some(3),
        "iiii" | "iv" => Some(4),
        "v" => Some(5),
        "vi" => Some(6),
        "vii" => Some(7),
        "viii" => Some(8),
        "ix" => Some(9),
        "x" => Some(10),
        _ => None,
    }
}

/// Lowercase and fold to the `[a-z0-9 ]` alphabet, expanding `&` to " and ".
fn ascii_fold(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        let c = c.to_ascii_lowercase();
        match c {
            'a'..='z' | '0'..='9' | ' ' => out.push(c),
            '&' => out.push_str(" and "),
            _ => out.push(' '),
        }
    }
    out
}

/// Collapse runs of spaces and trim both ends.
fn squeeze_spaces(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut prev_space = true;
    for c in input.chars() {
        if c == ' ' {
            if !prev_space {
                out.push(' ');
            }
            prev_space = true;
        } else {
            out.push(c);
            prev_space = false;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Strip leading region glyphs and articles until neither applies.
///
/// The index encodes a region glyph as a single `x` stuck onto the title
/// (e.g. `"xHalo 2"`), so a leading `x` directly followed by a letter or
/// digit is dropped.
fn strip_prefixes(mut s: &str) -> &str {
    loop {
        let mut chars = s.chars();
        if let (Some('x'), Some(second)) = (chars.next(), chars.next()) {
            if second.is_ascii_alphanumeric() {
                s = &s[1..];
                continue;
            }
        }
        if let Some(rest) = s.strip_prefix("the ") {
            s = rest;
            continue;
        }
        return s;
    }
}

/// Tokenize a raw name into normalized, ordered tokens.
///
/// Roman-numeral tokens come out as decimal strings, so `"Halo II"` and
/// `"Halo 2"` tokenize identically.
pub fn tokenize(raw: &str) -> Vec<String> {
    let folded = squeeze_spaces(&ascii_fold(raw));
    let stripped = strip_prefixes(&folded);

    stripped
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(|t| match roman_to_int(t) {
            Some(n) => n.to_string(),
            None => t.to_string(),
        })
        .collect()
}

/// Canonical key: the normalized tokens concatenated with no separator.
///
/// Used for substring and bigram-similarity comparisons where word
/// boundaries only add noise.
pub fn norm_key(raw: &str) -> String {
    tokenize(raw).concat()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_tokenize_basic() {
        assert_eq!(tokenize("Halo 2"), vec!["halo", "2"]);
        assert_eq!(tokenize("  Halo   2  "), vec!["halo", "2"]);
    }

    #[test]
    fn test_tokenize_strips_article() {
        assert_eq!(tokenize("The Simpsons"), vec!["simpsons"]);
        // Only a leading article is stripped
        assert_eq!(tokenize("Enter The Matrix"), vec!["enter", "the", "matrix"]);
    }

    #[test]
    fn test_tokenize_strips_region_glyph() {
        assert_eq!(tokenize("xHalo 2"), vec!["halo", "2"]);
        assert_eq!(tokenize("XBMC4Gamers"), vec!["bmc4gamers"]);
        // a lone 'x' word is kept (and read as a roman numeral)
        assert_eq!(tokenize("x"), vec!["10"]);
    }

    #[test]
    fn test_tokenize_roman_numerals() {
        assert_eq!(tokenize("Final Fantasy VII"), vec!["final", "fantasy", "7"]);
        assert_eq!(tokenize("Halo II"), vec!["halo", "2"]);
        assert_eq!(tokenize("Grand Prix IIII"), vec!["grand", "prix", "4"]);
    }

    #[test]
    fn test_tokenize_ampersand() {
        assert_eq!(tokenize("Jak & Daxter"), vec!["jak", "and", "daxter"]);
    }

    #[test]
    fn test_tokenize_punctuation_folds_to_space() {
        assert_eq!(tokenize("Crash: Bandicoot!"), vec!["crash", "bandicoot"]);
    }

    #[test]
    fn test_norm_key() {
        assert_eq!(norm_key("Halo 2"), "halo2");
        assert_eq!(norm_key("The Halo II"), "halo2");
        assert_eq!(norm_key(""), "");
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   ").is_empty());
        assert!(tokenize("!!!").is_empty());
    }

    #[test]
    fn test_stacked_prefixes() {
        assert_eq!(tokenize("The xHalo"), vec!["halo"]);
        assert_eq!(tokenize("xThe Halo"), vec!["halo"]);
    }

    proptest! {
        /// Re-normalizing the produced tokens yields the same tokens.
        #[test]
        fn normalize_idempotent(input in "\\PC{0,40}") {
            let once = tokenize(&input);
            let again = tokenize(&once.join(" "));
            prop_assert_eq!(once, again);
        }
    }
}

// Core data structures for the podium resolver

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DocumentError;

/// One row of the remote title index.
///
/// Only `title_id` is required; every display field is optional and unknown
/// fields are ignored. Entries are parsed on demand and never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    /// Opaque title identifier
    pub title_id: String,

    /// Display name, e.g. "Halo 2 (NTSC)"
    #[serde(default)]
    pub name: Option<String>,

    /// Pre-lowercased display name, when the index provides one
    #[serde(default)]
    pub name_lc: Option<String>,

    /// URL slug, e.g. "halo-2-ntsc"
    #[serde(default)]
    pub slug: Option<String>,
}

impl IndexEntry {
    /// Display name with empty fallback
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Slug with empty fallback
    pub fn slug(&self) -> &str {
        self.slug.as_deref().unwrap_or("")
    }
}

/// Parse an index document into its entries.
///
/// Tolerant of shape: accepts a top-level array of entries, or an object
/// whose first array-valued field holds the entries. Elements that are not
/// objects or lack a `title_id` are skipped, not fatal.
pub fn parse_index(body: &str) -> Result<Vec<IndexEntry>, DocumentError> {
    let value: Value = serde_json::from_str(body)?;

    let empty = Vec::new();
    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => map
            .values()
            .find_map(|v| v.as_array())
            .unwrap_or(&empty),
        _ => &empty,
    };

    Ok(items
        .iter()
        .filter_map(|v| serde_json::from_value::<IndexEntry>(v.clone()).ok())
        .filter(|e| !e.title_id.is_empty())
        .collect())
}

/// Per-title wire document: a title heading plus its scoreboard sections.
#[derive(Debug, Clone, Deserialize)]
pub struct TitleDocument {
    #[serde(default)]
    pub game_title: Option<String>,

    #[serde(default)]
    pub scoreboards: Vec<ScoreboardDoc>,
}

/// One scoreboard section as it appears on the wire.
///
/// `columns` may be absent (inferred from the first keyed row); `rows` may
/// hold keyed objects, positional arrays, or bare scalars.
#[derive(Debug, Clone, Deserialize)]
pub struct ScoreboardDoc {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub columns: Vec<String>,

    #[serde(default)]
    pub rows: Vec<Value>,
}

/// One resolved leaderboard row.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Row {
    /// Rank label; never empty (synthesized as the 1-based position when
    /// the source omits it)
    pub rank: String,

    /// Player / entry display name
    pub name: String,

    /// The single chosen metric value for the row
    pub metric: String,

    /// Remaining fields as "key=value" strings, source order
    pub extras: Vec<String>,
}

/// One named leaderboard, rows sorted ascending by the integer prefix of
/// their rank (non-numeric ranks sort last).
#[derive(Debug, Clone, Serialize)]
pub struct Board {
    pub name: String,
    pub rows: Vec<Row>,
}

/// A fully loaded leaderboard dataset for one title variant.
///
/// Created fresh on every successful load and swapped in whole; the engine
/// never mutates a model in place.
#[derive(Debug, Clone, Serialize)]
pub struct Model {
    pub game_title: String,
    pub boards: Vec<Board>,
}

/// Ephemeral scoring record kept for diagnostics after a match attempt.
#[derive(Debug, Clone, Serialize)]
pub struct MatchCandidate {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub score: i32,
    pub reason: String,
}

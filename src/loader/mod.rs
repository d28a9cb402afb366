//! Per-title document loading
//!
//! Turns a fetched per-title JSON document into a [`Model`]: a set of
//! named boards with uniform rows. The wire shape is loose (boards may
//! declare columns or not, rows may be keyed objects, positional
//! arrays, or bare scalars), so loading is a normalization
//! pass: resolve rank/name columns by alias, synthesize missing ranks,
//! fold everything else into "key=value" extras, and promote one extra to
//! the row's metric by a fixed preference order.
//!
//! A hard per-board row cap bounds memory regardless of the configured
//! row limit. Boards are sorted by the integer prefix of each rank;
//! non-numeric ranks sort last.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::DocumentError;
use crate::models::{Board, Model, Row, ScoreboardDoc, TitleDocument};

/// Column-name aliases that mean "rank".
const RANK_ALIASES: &[&str] = &["rank", "#", "pos", "position", "place"];

/// Column-name aliases that mean "player name".
const NAME_ALIASES: &[&str] = &[
    "name", "player", "gamertag", "gamer", "tag", "alias", "username", "user", "gt", "account",
];

/// Metric key preference, best first.
const METRIC_PREFERENCE: &[&str] = &[
    "score",
    "points",
    "rating",
    "time",
    "best time",
    "laps",
    "wins",
    "value",
];

/// Safety cap on rows per board, independent of any configured limit.
const HARD_ROW_CAP: usize = 1000;

/// Sentinel sort key for ranks without a numeric prefix.
const RANK_SENTINEL: u64 = u64::MAX;

/// Loader tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// Maximum rows kept per board; 0 means unlimited (the hard safety
    /// cap still applies)
    pub max_rows: usize,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self { max_rows: 0 }
    }
}

/// Sort key: the integer prefix of a rank label, non-numeric last.
pub fn rank_sort_key(rank: &str) -> u64 {
    let digits: &str = {
        let end = rank
            .char_indices()
            .find(|(_, c)| !c.is_ascii_digit())
            .map(|(i, _)| i)
            .unwrap_or(rank.len());
        &rank[..end]
    };
    if digits.is_empty() {
        return RANK_SENTINEL;
    }
    digits.parse::<u64>().unwrap_or(RANK_SENTINEL)
}

fn in_alias_list(key: &str, aliases: &[&str]) -> bool {
    aliases.iter().any(|a| key.eq_ignore_ascii_case(a))
}

fn metric_preference(key: &str) -> usize {
    METRIC_PREFERENCE
        .iter()
        .position(|p| key.eq_ignore_ascii_case(p))
        .unwrap_or(usize::MAX)
}

/// Render a JSON value as display text; null becomes empty.
fn value_text(v: &Value) -> String {
    match v {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Parse a per-title document body into a model.
///
/// Fails without side effects: callers keep whatever model they already
/// have when this returns an error.
pub fn parse_model(body: &str, settings: &LoaderSettings) -> Result<Model, DocumentError> {
    let doc: TitleDocument = serde_json::from_str(body)?;
    if doc.scoreboards.is_empty() {
        return Err(DocumentError::MissingScoreboards);
    }

    let mut boards = Vec::new();
    for sb in &doc.scoreboards {
        if let Some(board) = build_board(sb, settings) {
            boards.push(board);
        }
    }

    if boards.is_empty() {
        return Err(DocumentError::EmptyBoards);
    }

    Ok(Model {
        game_title: doc.game_title.unwrap_or_default(),
        boards,
    })
}

fn build_board(sb: &ScoreboardDoc, settings: &LoaderSettings) -> Option<Board> {
    let name = sb
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "default".to_string());

    // Column inference: a document without declared columns gets them from
    // the keys of the first keyed row, in document order.
    let mut columns = sb.columns.clone();
    if columns.is_empty() {
        if let Some(Value::Object(first)) = sb.rows.first() {
            columns = first.keys().cloned().collect();
        }
    }

    let rank_idx = columns.iter().position(|c| in_alias_list(c, RANK_ALIASES));
    let name_idx = columns.iter().position(|c| in_alias_list(c, NAME_ALIASES));

    let mut rows: Vec<Row> = Vec::new();
    for rv in &sb.rows {
        let position = rows.len() + 1;
        let row = build_row(rv, &columns, rank_idx, name_idx, position);
        rows.push(row);

        if settings.max_rows > 0 && rows.len() >= settings.max_rows {
            break;
        }
        if rows.len() >= HARD_ROW_CAP {
            debug!(board = %name, cap = HARD_ROW_CAP, "row cap reached");
            break;
        }
    }

    if rows.is_empty() {
        return None;
    }

    rows.sort_by_key(|r| rank_sort_key(&r.rank));
    Some(Board { name, rows })
}

fn build_row(
    rv: &Value,
    columns: &[String],
    rank_idx: Option<usize>,
    name_idx: Option<usize>,
    position: usize,
) -> Row {
    let mut rank = String::new();
    let mut name = String::new();
    let mut extras: Vec<String> = Vec::new();

    match rv {
        Value::Object(obj) => {
            let by_col = |idx: Option<usize>| -> String {
                idx.and_then(|i| columns.get(i))
                    .and_then(|c| obj.get(c))
                    .map(value_text)
                    .unwrap_or_default()
            };
            rank = by_col(rank_idx);
            name = by_col(name_idx);

            // Alias fallback when the resolved columns missed.
            if rank.is_empty() {
                if let Some((_, v)) = obj.iter().find(|(k, _)| in_alias_list(k, RANK_ALIASES)) {
                    rank = value_text(v);
                }
            }
            if name.is_empty() {
                if let Some((_, v)) = obj.iter().find(|(k, _)| in_alias_list(k, NAME_ALIASES)) {
                    name = value_text(v);
                }
            }

            for (i, col) in columns.iter().enumerate() {
                if Some(i) == rank_idx || Some(i) == name_idx {
                    continue;
                }
                if let Some(v) = obj.get(col) {
                    let text = value_text(v);
                    if !text.is_empty() {
                        extras.push(format!("{col}={text}"));
                    }
                }
            }
            for (k, v) in obj {
                if k.is_empty() || columns.iter().any(|c| c == k) {
                    continue;
                }
                let text = value_text(v);
                if !text.is_empty() {
                    extras.push(format!("{k}={text}"));
                }
            }
        }
        Value::Array(arr) => {
            let at = |idx: Option<usize>| -> String {
                idx.and_then(|i| arr.get(i)).map(value_text).unwrap_or_default()
            };
            rank = at(rank_idx);
            name = at(name_idx);

            for (i, col) in columns.iter().enumerate() {
                if Some(i) == rank_idx || Some(i) == name_idx {
                    continue;
                }
                if let Some(v) = arr.get(i) {
                    let text = value_text(v);
                    if !text.is_empty() {
                        extras.push(format!("{col}={text}"));
                    }
                }
            }
        }
        scalar => {
            name = value_text(scalar);
        }
    }

    if rank.is_empty() {
        rank = position.to_string();
    }

    // A field that is really rank or name under another declared column
    // must not also show up as an extra.
    extras.retain(|kv| {
        kv.split_once('=')
            .map(|(k, _)| !in_alias_list(k, RANK_ALIASES) && !in_alias_list(k, NAME_ALIASES))
            .unwrap_or(false)
    });

    let metric = take_metric(&mut extras);

    Row {
        rank,
        name,
        metric,
        extras,
    }
}

/// Pull the best metric out of the extras list.
///
/// Preference-listed keys win by list position; otherwise the first extra
/// is promoted. The chosen entry leaves the extras.
fn take_metric(extras: &mut Vec<String>) -> String {
    let mut best: Option<(usize, usize)> = None; // (pref, index)
    for (i, kv) in extras.iter().enumerate() {
        let Some((k, _)) = kv.split_once('=') else {
            continue;
        };
        let pref = metric_preference(k);
        if pref != usize::MAX && best.map(|(p, _)| pref < p).unwrap_or(true) {
            best = Some((pref, i));
        }
    }

    let idx = best.map(|(_, i)| i).or(if extras.is_empty() { None } else { Some(0) });
    match idx {
        Some(i) => {
            let kv = extras.remove(i);
            kv.split_once('=').map(|(_, v)| v.to_string()).unwrap_or(kv)
        }
        None => String::new(),
    }
}

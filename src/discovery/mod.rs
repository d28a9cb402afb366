//! Incremental server-root discovery
//!
//! A configured base list (comma-separated URLs) expands into an ordered
//! set of candidate roots. Each scheduler tick probes at most one
//! candidate's index resource, spaced by a fixed interval so the tick loop
//! never absorbs more than one network timeout per pass. Once a candidate
//! serves a parseable index, from cache or network, it becomes the
//! session's work root and probing stops until the state is reset.
//!
//! Exhausting every candidate without success restarts the sweep after a
//! longer backoff.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use url::Url;

use crate::cache::ResourceCache;
use crate::fetch::Fetcher;

/// Path of the title index below a confirmed root.
pub fn index_url(root: &str) -> String {
    format!("{root}/data/search.json")
}

/// Path of a per-title document below a confirmed root.
pub fn title_url(root: &str, title_id: &str) -> String {
    format!("{root}/data/by_id/{title_id}.json")
}

/// Expand a comma-separated base list into ordered, de-duplicated
/// candidate roots.
///
/// For each base: the base itself (trailing slashes stripped), its parent
/// when it ends in `/data`, then the `xbox` and `xbox/data` children.
/// Bases that do not parse as URLs are skipped.
pub fn candidate_roots(base_csv: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();

    fn add(out: &mut Vec<String>, s: &str) {
        let t = s.trim_end_matches('/');
        if !t.is_empty() && !out.iter().any(|have| have == t) {
            out.push(t.to_string());
        }
    }

    for base in base_csv.split(',') {
        let base = base.trim().trim_end_matches('/');
        if base.is_empty() {
            continue;
        }
        if Url::parse(base).is_err() {
            warn!(base, "skipping unparseable server base");
            continue;
        }

        add(&mut out, base);
        if let Some(parent) = base.strip_suffix("/data") {
            add(&mut out, parent);
        }
        add(&mut out, &format!("{base}/xbox"));
        add(&mut out, &format!("{base}/xbox/data"));
    }

    out
}

/// Probe pacing knobs, taken from the engine configuration.
#[derive(Debug, Clone, Copy)]
pub struct ProbePacing {
    /// Minimum spacing between two probe attempts
    pub spacing: Duration,

    /// Pause after a full unsuccessful sweep before restarting
    pub backoff: Duration,
}

/// Incremental prober over the candidate roots.
///
/// Persists across ticks; a confirmed root is terminal until the prober is
/// rebuilt by a state reset.
#[derive(Debug)]
pub struct RootProber {
    candidates: Vec<String>,
    cursor: usize,
    next_eligible: Option<Instant>,
    work_root: Option<String>,
}

impl RootProber {
    /// Build a prober from the configured base list.
    pub fn new(base_csv: &str) -> Self {
        let candidates = candidate_roots(base_csv);
        if !candidates.is_empty() {
            debug!(count = candidates.len(), "probe candidates built");
        }
        Self {
            candidates,
            cursor: 0,
            next_eligible: None,
            work_root: None,
        }
    }

    /// The confirmed root, once probing has succeeded.
    pub fn work_root(&self) -> Option<&str> {
        self.work_root.as_deref()
    }

    /// Adopt an already confirmed root (e.g. kept across a query change).
    pub fn adopt_root(&mut self, root: String) {
        self.work_root = Some(root);
    }

    /// Number of candidate roots in the sweep.
    pub fn candidate_count(&self) -> usize {
        self.candidates.len()
    }

    /// Attempt at most one probe. Returns true once a work root is
    /// confirmed (this tick or earlier).
    ///
    /// A candidate is accepted only when its index resource yields a body
    /// that parses as JSON; a half-written cache file or an error page is
    /// never trusted for routing.
    pub async fn step(
        &mut self,
        fetcher: &Fetcher,
        cache: &mut ResourceCache,
        now: Instant,
        pacing: ProbePacing,
    ) -> bool {
        if self.work_root.is_some() {
            return true;
        }
        if self.candidates.is_empty() {
            return false;
        }
        if let Some(at) = self.next_eligible {
            if now < at {
                return false;
            }
        }
        self.next_eligible = Some(now + pacing.spacing);

        if self.cursor >= self.candidates.len() {
            self.cursor = 0;
            self.next_eligible = Some(now + pacing.backoff);
            debug!("probe sweep exhausted, backing off");
            return false;
        }

        let root = self.candidates[self.cursor].clone();
        self.cursor += 1;
        let url = index_url(&root);

        if let Some(body) = cache.read_any(&url) {
            if parses_as_json(&body) {
                info!(root = %root, "work root confirmed via cache");
                self.work_root = Some(root);
                return true;
            }
        }

        match fetcher.get_text(&url).await {
            Ok(body) => {
                cache.write(&url, &body);
                if parses_as_json(&body) {
                    info!(root = %root, "work root confirmed via network");
                    self.work_root = Some(root);
                    return true;
                }
                debug!(root = %root, "probe body did not parse, rejecting candidate");
            }
            Err(e) => {
                debug!(root = %root, error = %e, "probe failed");
            }
        }
        false
    }
}

fn parses_as_json(body: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(body).is_ok()
}

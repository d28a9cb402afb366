//! Resolution engine
//!
//! [`Engine`] owns the whole resolution session: the query, the probed
//! work root, the title pool, the loaded model, and the rotation clock.
//! Everything advances inside [`Engine::tick`], called from one periodic
//! loop; no call blocks longer than the configured HTTP timeout.
//!
//! The lifecycle is an explicit state machine:
//!
//! ```text
//! Idle ──query──▶ Probing ──root──▶ Resolving ──pool──▶ Loading ──model──▶ Active
//!                                                           ▲                │
//!                                                           └── variant ─────┘
//! ```
//!
//! A query change resets the session back through Probing/Resolving
//! (keeping the persistent cache and an already confirmed root); a server
//! base change also drops the root. Failures never propagate out of
//! `tick`; they leave state unchanged and the attempt repeats on the
//! next eligible tick.

pub mod rotation;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, ResourceCache};
use crate::config::Config;
use crate::discovery::{index_url, title_url, RootProber};
use crate::error::{Error, ResolveError, Result};
use crate::fetch::Fetcher;
use crate::matcher::{self, family};
use crate::models::{parse_index, Board, MatchCandidate, Model};
use crate::normalize::norm_key;

use self::rotation::{RotationEvent, RotationState};

/// Engine lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// No active query
    Idle,

    /// Query set, no confirmed server root yet
    Probing,

    /// Root confirmed, no accepted match yet
    Resolving,

    /// Pool resolved, current variant not loaded
    Loading,

    /// Model loaded; rotation is running
    Active,
}

#[derive(Debug, Clone)]
struct QueryContext {
    raw: String,
    key: String,
}

/// The resolution session object.
///
/// All state lives here; consumers hold one instance and call the ingress
/// methods plus [`Engine::tick`]. Result accessors hand out references
/// only; the model is owned by the engine and replaced whole on reload.
#[derive(Debug)]
pub struct Engine {
    config: Config,
    fetcher: Fetcher,
    cache: ResourceCache,
    prober: RootProber,
    rng: ChaCha8Rng,

    query: Option<QueryContext>,
    state: EngineState,
    pool: Vec<String>,
    pool_idx: usize,
    model: Option<Model>,
    rotation: Option<RotationState>,
    diagnostics: Vec<MatchCandidate>,
    last_attempt: Option<Instant>,
}

impl Engine {
    /// Create an engine from configuration.
    pub fn new(config: Config) -> Result<Self> {
        Self::build(config, ChaCha8Rng::from_entropy())
    }

    /// Create an engine with a fixed RNG seed, for deterministic tests.
    pub fn with_seed(config: Config, seed: u64) -> Result<Self> {
        Self::build(config, ChaCha8Rng::seed_from_u64(seed))
    }

    fn build(config: Config, rng: ChaCha8Rng) -> Result<Self> {
        config.validate().map_err(|e| Error::config(e.to_string()))?;

        let fetcher = Fetcher::new(config.server.http_timeout())?;
        let mut cache = ResourceCache::new(config.cache.dir.clone(), config.cache.limits());
        cache.set_flush_on_boot(config.cache.flush_on_boot);
        let prober = RootProber::new(&config.server.base_csv);

        Ok(Self {
            config,
            fetcher,
            cache,
            prober,
            rng,
            query: None,
            state: EngineState::Idle,
            pool: Vec::new(),
            pool_idx: 0,
            model: None,
            rotation: None,
            diagnostics: Vec::new(),
            last_attempt: None,
        })
    }

    // =========================================================================
    // Ingress
    // =========================================================================

    /// Replace the configured server base list. Clears any confirmed root
    /// and rebuilds the probe candidates.
    pub fn set_server_base(&mut self, base_csv: &str) {
        self.config.server.base_csv = base_csv.to_string();
        self.reset_session(false);
    }

    /// Report the current application name.
    ///
    /// A changed name resets the session (keeping the persistent cache and
    /// a confirmed root); an empty name means "no active query."
    pub fn on_app_name(&mut self, raw: &str) {
        let trimmed = raw.trim();
        if self.query.as_ref().map(|q| q.raw.as_str()) == Some(trimmed)
            || (self.query.is_none() && trimmed.is_empty())
        {
            return;
        }

        self.query = if trimmed.is_empty() {
            None
        } else {
            Some(QueryContext {
                raw: trimmed.to_string(),
                key: norm_key(trimmed),
            })
        };
        info!(app = %trimmed, "query changed");
        self.reset_session(true);
    }

    /// Update cache limits. Zero values keep the corresponding limit.
    pub fn set_cache_limits(&mut self, max_files: usize, max_bytes: u64, max_age: Duration) {
        self.cache.set_limits(max_files, max_bytes, max_age);
    }

    /// Clear the cache directory on its next first use.
    pub fn set_flush_cache_on_boot(&mut self, enable: bool) {
        self.cache.set_flush_on_boot(enable);
    }

    /// Clear the cache directory immediately.
    pub fn flush_cache_now(&mut self) {
        self.cache.flush_now();
    }

    /// Cache occupancy snapshot, when the store is available.
    pub fn cache_stats(&mut self) -> Option<CacheStats> {
        self.cache.stats()
    }

    /// Advance the engine. Must be called regularly; performs at most one
    /// rate-limited probe or one resolve-or-load attempt per call.
    pub async fn tick(&mut self) {
        let Some(query) = self.query.clone() else {
            return;
        };
        let now = Instant::now();

        match self.state {
            EngineState::Idle => {
                // A live query never sits in Idle; recover just in case.
                self.state = EngineState::Probing;
            }
            EngineState::Probing => {
                if !self.attempt_ready(now) {
                    return;
                }
                let pacing = self.config.server.probe_pacing();
                if self
                    .prober
                    .step(&self.fetcher, &mut self.cache, now, pacing)
                    .await
                {
                    self.state = EngineState::Resolving;
                }
            }
            EngineState::Resolving => {
                if !self.attempt_ready(now) {
                    return;
                }
                if let Err(e) = self.try_resolve(&query).await {
                    debug!(error = %e, app = %query.raw, "resolution attempt failed");
                }
            }
            EngineState::Loading => {
                if !self.attempt_ready(now) {
                    return;
                }
                if let Err(e) = self.try_load(now).await {
                    debug!(error = %e, "load attempt failed");
                }
            }
            EngineState::Active => {
                self.tick_rotation(now);
            }
        }
    }

    // =========================================================================
    // Result surface
    // =========================================================================

    /// True only once both resolution and loading have succeeded.
    pub fn is_active(&self) -> bool {
        self.state == EngineState::Active
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// The confirmed server root, once probing has succeeded.
    pub fn work_root(&self) -> Option<&str> {
        self.prober.work_root()
    }

    /// Game title of the loaded model, falling back to the raw query.
    pub fn game_title(&self) -> Option<&str> {
        let model_title = self
            .model
            .as_ref()
            .map(|m| m.game_title.as_str())
            .filter(|t| !t.is_empty());
        model_title.or_else(|| self.query.as_ref().map(|q| q.raw.as_str()))
    }

    /// The currently visible board, while active.
    pub fn current_board(&self) -> Option<&Board> {
        let model = self.model.as_ref()?;
        let idx = self.rotation.as_ref()?.board_idx();
        model.boards.get(idx)
    }

    /// Current scroll offset in pixels, for the rendering consumer.
    pub fn scroll_offset(&self) -> f32 {
        self.rotation.as_ref().map(RotationState::scroll_y).unwrap_or(0.0)
    }

    /// (current variant position, pool size), once resolved.
    pub fn variant_cursor(&self) -> Option<(usize, usize)> {
        if self.pool.is_empty() {
            None
        } else {
            Some((self.pool_idx, self.pool.len()))
        }
    }

    /// The resolved title pool.
    pub fn title_pool(&self) -> &[String] {
        &self.pool
    }

    /// Top scoring candidates of the last match attempt.
    pub fn match_diagnostics(&self) -> &[MatchCandidate] {
        &self.diagnostics
    }

    /// Suggested display hold for consumers that page between screens.
    pub fn recommended_hold(&self) -> Duration {
        self.config.rotation.hold()
    }

    /// Log the last match attempt's candidates and scores.
    pub fn dump_match_debug(&self) {
        let query = self.query.as_ref();
        info!(
            app = query.map(|q| q.raw.as_str()).unwrap_or(""),
            key = query.map(|q| q.key.as_str()).unwrap_or(""),
            root = self.prober.work_root().unwrap_or(""),
            candidates = self.diagnostics.len(),
            "match diagnostics"
        );
        for d in &self.diagnostics {
            info!(
                score = d.score,
                name = %d.name,
                slug = %d.slug,
                id = %d.id,
                reason = %d.reason,
                "candidate"
            );
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Gate resolve/load/probe attempts to the configured minimum interval.
    fn attempt_ready(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_attempt {
            if now.duration_since(last) < self.config.server.attempt_interval() {
                return false;
            }
        }
        self.last_attempt = Some(now);
        true
    }

    /// Fetch the index and resolve the query into a title pool.
    async fn try_resolve(&mut self, query: &QueryContext) -> Result<()> {
        if query.key.is_empty() {
            return Err(ResolveError::EmptyQuery.into());
        }
        let Some(root) = self.prober.work_root().map(str::to_string) else {
            self.state = EngineState::Probing;
            return Ok(());
        };

        let url = index_url(&root);
        let body = self
            .fetcher
            .get_cached(&mut self.cache, &url, self.config.server.index_ttl())
            .await?;
        let entries = parse_index(&body)?;

        let outcome = matcher::best_match(&query.raw, &entries, &self.config.weights);
        self.diagnostics = outcome.candidates;

        let Some(best) = outcome.best else {
            debug!(
                app = %query.raw,
                key = %query.key,
                near_misses = self.diagnostics.len(),
                "no acceptable match"
            );
            return Err(ResolveError::NoAcceptableMatch.into());
        };

        self.pool = family::build_pool(&entries, &best.family_key, &best.id);
        self.pool_idx = self.rng.gen_range(0..self.pool.len());
        self.state = EngineState::Loading;

        info!(
            app = %query.raw,
            best = %best.name,
            score = best.score,
            family = %best.family_key,
            pool = self.pool.len(),
            "query resolved"
        );
        Ok(())
    }

    /// Fetch and install the current variant's model.
    async fn try_load(&mut self, now: Instant) -> Result<()> {
        let Some(root) = self.prober.work_root().map(str::to_string) else {
            self.state = EngineState::Probing;
            return Ok(());
        };
        let Some(title_id) = self.pool.get(self.pool_idx).cloned() else {
            self.state = EngineState::Resolving;
            return Ok(());
        };

        let url = title_url(&root, &title_id);
        let body = self
            .fetcher
            .get_cached(&mut self.cache, &url, self.config.server.title_ttl())
            .await?;

        let model = crate::loader::parse_model(&body, &self.config.loader)?;
        let board_count = model.boards.len();

        self.rotation = Some(RotationState::start(
            now,
            board_count,
            &self.config.rotation,
            &mut self.rng,
        ));
        self.model = Some(model);
        self.state = EngineState::Active;

        info!(title_id = %title_id, boards = board_count, "model loaded");
        Ok(())
    }

    /// Advance rotation; service a variant switch by re-entering Loading.
    fn tick_rotation(&mut self, now: Instant) {
        let Some(model) = self.model.as_ref() else {
            warn!("active without a model, re-entering load");
            self.state = EngineState::Loading;
            return;
        };
        let Some(rot) = self.rotation.as_mut() else {
            self.state = EngineState::Loading;
            return;
        };

        let board_count = model.boards.len();
        let row_count = model
            .boards
            .get(rot.board_idx())
            .map(|b| b.rows.len())
            .unwrap_or(0);

        let event = rot.tick(
            now,
            &self.config.rotation,
            board_count,
            row_count,
            self.pool.len(),
            &mut self.rng,
        );

        if event == RotationEvent::VariantAdvance {
            self.pool_idx = (self.pool_idx + 1) % self.pool.len();
            self.state = EngineState::Loading;
            debug!(
                variant = %self.pool[self.pool_idx],
                position = self.pool_idx,
                "variant switch requested"
            );
        }
    }

    /// Reset session state. Keeps the persistent cache always; keeps a
    /// confirmed root only on a query change (`keep_root`).
    fn reset_session(&mut self, keep_root: bool) {
        let root = if keep_root {
            self.prober.work_root().map(str::to_string)
        } else {
            None
        };
        self.prober = RootProber::new(&self.config.server.base_csv);
        if let Some(r) = root {
            self.prober.adopt_root(r);
        }

        self.pool.clear();
        self.pool_idx = 0;
        self.model = None;
        self.rotation = None;
        self.diagnostics.clear();
        self.last_attempt = None;

        self.state = match (&self.query, self.prober.work_root()) {
            (None, _) => EngineState::Idle,
            (Some(_), Some(_)) => EngineState::Resolving,
            (Some(_), None) => EngineState::Probing,
        };
    }
}

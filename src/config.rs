//! # Configuration
//!
//! Tunable constants of the exploration policy, the per-request time budget
//! and the session retention policy. Every value has a default; the server
//! overrides them from `FOG_*` environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Heuristic constants of the exploration policy.
///
/// The values were tuned empirically against the game server; the ordering
/// of the decision steps matters more than the exact numbers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// A scan is issued only when its value is strictly above this.
    pub scan_threshold: i64,
    /// `reasonable_limit = min(grid_size^2, wall_budget * wall_multiplier)`.
    pub wall_multiplier: i64,
    /// Per unknown cell when nothing has been explored yet.
    pub unexplored_scan_weight: i64,
    /// Upper bound of the distance-based weight of a single unknown cell.
    pub max_cell_weight: i64,
    pub edge_bonus: i64,
    /// Positions at most this far from a border receive `edge_bonus`.
    pub edge_margin: i64,
    pub base_move_score: i64,
    pub revisit_score: i64,
    pub frontier_bonus: i64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            scan_threshold: 5,
            wall_multiplier: 5,
            unexplored_scan_weight: 3,
            max_cell_weight: 5,
            edge_bonus: 5,
            edge_margin: 2,
            base_move_score: 10,
            revisit_score: 1,
            frontier_bonus: 5,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetConfig {
    /// Wall-clock ceiling for a single request, measured from its arrival.
    pub request_time_budget_ms: u64,
}

impl BudgetConfig {
    pub fn request_time_budget(&self) -> Duration {
        Duration::from_millis(self.request_time_budget_ms)
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        Self {
            request_time_budget_ms: 500,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Sessions idle for longer than this are purged.
    pub session_ttl_secs: u64,
    /// Least recently used sessions are evicted beyond this count.
    pub max_sessions: usize,
}

impl RegistryConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            session_ttl_secs: 3600,
            max_sessions: 10_000,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub policy: PolicyConfig,
    pub budget: BudgetConfig,
    pub registry: RegistryConfig,
}

impl Config {
    /// Builds a configuration from defaults overridden by environment variables.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        override_from_env("FOG_SCAN_THRESHOLD", &mut config.policy.scan_threshold)?;
        override_from_env("FOG_WALL_MULTIPLIER", &mut config.policy.wall_multiplier)?;
        override_from_env(
            "FOG_REQUEST_BUDGET_MS",
            &mut config.budget.request_time_budget_ms,
        )?;
        override_from_env("FOG_SESSION_TTL_SECS", &mut config.registry.session_ttl_secs)?;
        override_from_env("FOG_MAX_SESSIONS", &mut config.registry.max_sessions)?;
        Ok(config)
    }
}

fn override_from_env<T>(key: &str, slot: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Ok(raw) = env::var(key) {
        *slot = raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", key, raw))?;
    }
    Ok(())
}

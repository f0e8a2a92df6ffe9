use std::env;
use std::time::Duration;

use tracing::warn;

use crate::geometry::Pitch;
use crate::quality::XgotPolicy;

pub const MAX_MATCHES: usize = 30;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/115.0 Safari/537.36";

const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 15;
const DEFAULT_RENDER_SETTLE_SECS: u64 = 3;
const MAX_PARALLELISM: usize = 8;

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    pub user_agent: String,
    // Time given to client-side rendering before the page source is read.
    pub render_settle: Duration,
    pub browser_fallback: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            render_settle: Duration::from_secs(DEFAULT_RENDER_SETTLE_SECS),
            browser_fallback: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub fetch: FetchConfig,
    pub pitch: Pitch,
    pub xgot_policy: XgotPolicy,
    pub parallelism: usize,
    pub include_opponent: bool,
    pub max_matches: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            pitch: Pitch::default(),
            xgot_policy: XgotPolicy::default(),
            parallelism: 1,
            include_opponent: false,
            max_matches: MAX_MATCHES,
        }
    }
}

impl RunConfig {
    /// Defaults overridden by whatever is set in the environment (after `.env` loading).
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(secs) = env_parse::<u64>("FETCH_TIMEOUT_SECS") {
            cfg.fetch.timeout = Duration::from_secs(secs.max(1));
        }
        if let Some(secs) = env_parse::<u64>("RENDER_SETTLE_SECS") {
            cfg.fetch.render_settle = Duration::from_secs(secs);
        }
        if let Some(agent) = opt_env("FETCH_USER_AGENT") {
            cfg.fetch.user_agent = agent;
        }
        if let Some(flag) = env_flag("BROWSER_FALLBACK") {
            cfg.fetch.browser_fallback = flag;
        }
        if let Some(threads) = env_parse::<usize>("MATCH_PARALLELISM") {
            cfg.parallelism = clamp_parallelism(threads);
        }
        if let Some(raw) = opt_env("XGOT_POLICY") {
            match raw.parse::<XgotPolicy>() {
                Ok(policy) => cfg.xgot_policy = policy,
                Err(err) => warn!("ignoring XGOT_POLICY: {err}"),
            }
        }
        if let Some(length) = env_parse::<f64>("PITCH_LENGTH_M").filter(|v| *v > 0.0) {
            cfg.pitch.length = length;
        }
        if let Some(width) = env_parse::<f64>("PITCH_WIDTH_M").filter(|v| *v > 0.0) {
            cfg.pitch.width = width;
        }
        if let Some(flag) = env_flag("INCLUDE_OPPONENT") {
            cfg.include_opponent = flag;
        }

        cfg
    }
}

pub fn clamp_parallelism(threads: usize) -> usize {
    threads.clamp(1, MAX_PARALLELISM)
}

fn opt_env(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|val| {
        if val.trim().is_empty() {
            None
        } else {
            Some(val)
        }
    })
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    opt_env(key).and_then(|val| val.trim().parse::<T>().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    opt_env(key).map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

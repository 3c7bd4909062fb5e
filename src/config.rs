//! Centralized configuration and builder for notion-mentions.
//!
//! Goals:
//! - Single place to collect tunables instead of scattering env lookups.
//! - MigrateConfig::from_env() reads the NOTION_* / NM_* variables.
//! - CLI flags override env via the fluent `with_*` setters.
//!
//! Defaults follow the Notion API limits:
//! - request_interval_ms = 400 (~3 requests/s average allowed per integration)
//! - page_size = 100 (maximum accepted by list endpoints)

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{anyhow, Result};

pub const DEFAULT_API_BASE: &str = "https://api.notion.com/v1";
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";
pub const DEFAULT_CHECKPOINT_FILE: &str = "cursor_metadata.json";
pub const MAX_PAGE_SIZE: u32 = 100;

/// What to do when a `[[category]]` does not name any existing page.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OnMissing {
    /// Fail the run (the batch cursor is not saved).
    Abort,
    /// Write the span back as literal `[[category]]` text.
    Keep,
}

impl FromStr for OnMissing {
    type Err = anyhow::Error;
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "abort" | "" => Ok(OnMissing::Abort),
            "keep" => Ok(OnMissing::Keep),
            other => Err(anyhow!("invalid on-missing policy '{}': use abort|keep", other)),
        }
    }
}

impl fmt::Display for OnMissing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OnMissing::Abort => "abort",
            OnMissing::Keep => "keep",
        })
    }
}

#[derive(Clone, Debug)]
pub struct MigrateConfig {
    /// Integration token.
    /// Env: NOTION_KEY (no default; required by the HTTP store)
    pub api_key: Option<String>,

    /// Env: NOTION_API_BASE (default https://api.notion.com/v1)
    pub api_base: String,

    /// Value of the Notion-Version header.
    /// Env: NOTION_VERSION (default 2022-06-28)
    pub notion_version: String,

    /// Env: NM_CHECKPOINT_FILE (default ./cursor_metadata.json)
    pub checkpoint_path: PathBuf,

    /// Minimal delay between two API requests (0 disables throttling).
    /// Env: NM_REQUEST_INTERVAL_MS (default 400)
    pub request_interval_ms: u64,

    /// page_size for list endpoints, clamped to 1..=100.
    /// Env: NM_PAGE_SIZE (default 100)
    pub page_size: u32,

    /// Walk and report, but issue no updates and save no checkpoint.
    /// Env: NM_DRY_RUN (default false; "1|true|on|yes" => true)
    pub dry_run: bool,

    /// Env: NM_ON_MISSING = abort|keep (default abort)
    pub on_missing: OnMissing,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            notion_version: DEFAULT_NOTION_VERSION.to_string(),
            checkpoint_path: PathBuf::from(DEFAULT_CHECKPOINT_FILE),
            request_interval_ms: 400,
            page_size: MAX_PAGE_SIZE,
            dry_run: false,
            on_missing: OnMissing::Abort,
        }
    }
}

fn env_flag(v: &str) -> bool {
    let s = v.trim().to_ascii_lowercase();
    s == "1" || s == "true" || s == "on" || s == "yes"
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl MigrateConfig {
    /// Load configuration from environment variables. Unparsable values keep the default.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        cfg.api_key = env_nonempty("NOTION_KEY");

        if let Some(v) = env_nonempty("NOTION_API_BASE") {
            cfg.api_base = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = env_nonempty("NOTION_VERSION") {
            cfg.notion_version = v;
        }
        if let Some(v) = env_nonempty("NM_CHECKPOINT_FILE") {
            cfg.checkpoint_path = PathBuf::from(v);
        }

        if let Ok(v) = std::env::var("NM_REQUEST_INTERVAL_MS") {
            if let Ok(n) = v.trim().parse::<u64>() {
                cfg.request_interval_ms = n;
            }
        }

        if let Ok(v) = std::env::var("NM_PAGE_SIZE") {
            if let Ok(n) = v.trim().parse::<u32>() {
                cfg.page_size = n.clamp(1, MAX_PAGE_SIZE);
            }
        }

        if let Ok(v) = std::env::var("NM_DRY_RUN") {
            cfg.dry_run = env_flag(&v);
        }

        if let Ok(v) = std::env::var("NM_ON_MISSING") {
            match v.parse::<OnMissing>() {
                Ok(p) => cfg.on_missing = p,
                Err(e) => log::warn!("ignoring NM_ON_MISSING: {}", e),
            }
        }

        cfg
    }

    pub fn with_api_key<S: Into<String>>(mut self, key: Option<S>) -> Self {
        self.api_key = key.map(Into::into);
        self
    }

    pub fn with_api_base<S: Into<String>>(mut self, base: S) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_checkpoint_path<P: Into<PathBuf>>(mut self, p: P) -> Self {
        self.checkpoint_path = p.into();
        self
    }

    pub fn with_request_interval_ms(mut self, ms: u64) -> Self {
        self.request_interval_ms = ms;
        self
    }

    pub fn with_page_size(mut self, n: u32) -> Self {
        self.page_size = n.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn with_dry_run(mut self, on: bool) -> Self {
        self.dry_run = on;
        self
    }

    pub fn with_on_missing(mut self, p: OnMissing) -> Self {
        self.on_missing = p;
        self
    }

    /// Token or a readable error (used by the HTTP store only).
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| anyhow!("NOTION_KEY is not set: export the integration token"))
    }
}

impl fmt::Display for MigrateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MigrateConfig {{ \
             api_key: {}, \
             api_base: {}, \
             notion_version: {}, \
             checkpoint_path: {}, \
             request_interval_ms: {}, \
             page_size: {}, \
             dry_run: {}, \
             on_missing: {} \
             }}",
            // никогда не печатаем сам токен
            if self.api_key.is_some() { "<set>" } else { "<unset>" },
            self.api_base,
            self.notion_version,
            self.checkpoint_path.display(),
            self.request_interval_ms,
            self.page_size,
            self.dry_run,
            self.on_missing,
        )
    }
}

/// Lightweight builder that produces a MigrateConfig, starting from env.
#[derive(Clone, Debug)]
pub struct MigrateBuilder {
    cfg: MigrateConfig,
}

impl Default for MigrateBuilder {
    fn default() -> Self {
        Self {
            cfg: MigrateConfig::from_env(),
        }
    }
}

impl MigrateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a clean default (without reading env).
    pub fn from_default() -> Self {
        Self {
            cfg: MigrateConfig::default(),
        }
    }

    pub fn api_key<S: Into<String>>(mut self, key: S) -> Self {
        self.cfg.api_key = Some(key.into());
        self
    }

    pub fn api_base<S: Into<String>>(mut self, base: S) -> Self {
        self.cfg = self.cfg.with_api_base(base);
        self
    }

    pub fn checkpoint_path<P: Into<PathBuf>>(mut self, p: P) -> Self {
        self.cfg.checkpoint_path = p.into();
        self
    }

    pub fn request_interval_ms(mut self, ms: u64) -> Self {
        self.cfg.request_interval_ms = ms;
        self
    }

    pub fn page_size(mut self, n: u32) -> Self {
        self.cfg = self.cfg.with_page_size(n);
        self
    }

    pub fn dry_run(mut self, on: bool) -> Self {
        self.cfg.dry_run = on;
        self
    }

    pub fn on_missing(mut self, p: OnMissing) -> Self {
        self.cfg.on_missing = p;
        self
    }

    pub fn build(self) -> MigrateConfig {
        self.cfg
    }
}

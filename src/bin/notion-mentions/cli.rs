use clap::{Parser, Subcommand};
use std::path::PathBuf;

use notion_mentions::{MigrateConfig, OnMissing};

/// Rewrite leftover [[Roam]] links in Notion into native @mentions
#[derive(Parser, Debug)]
#[command(name = "notion-mentions", version, about = "Replace [[links]] with Notion page mentions")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Walk every page shared with the integration, resuming from the checkpoint
    ///
    /// Пример:
    ///   NOTION_KEY=secret_... notion-mentions run
    ///   notion-mentions run --dry-run --json
    Run {
        /// Checkpoint file (env NM_CHECKPOINT_FILE, default ./cursor_metadata.json)
        #[arg(long)]
        checkpoint: Option<PathBuf>,
        /// Report rewrites without updating blocks or saving the checkpoint
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        /// What to do with [[name]] when no page has that title: abort|keep
        #[arg(long)]
        on_missing: Option<OnMissing>,
        /// Minimal delay between API requests, ms (env NM_REQUEST_INTERVAL_MS)
        #[arg(long)]
        interval_ms: Option<u64>,
        /// page_size for list endpoints, 1..=100 (env NM_PAGE_SIZE)
        #[arg(long)]
        page_size: Option<u32>,
        /// Print the final report as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Process a single page (checkpoint untouched), e.g. one that failed a run
    Page {
        /// Page id (UUID with or without dashes)
        #[arg(long)]
        id: String,
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        #[arg(long)]
        on_missing: Option<OnMissing>,
        #[arg(long)]
        interval_ms: Option<u64>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Inspect or reset the checkpoint file
    Checkpoint {
        #[command(subcommand)]
        action: CheckpointCmd,
    },
}

#[derive(Subcommand, Debug)]
pub enum CheckpointCmd {
    /// Show whether the next run starts fresh, resumes, or has nothing to do
    Status {
        #[arg(long)]
        checkpoint: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Delete the checkpoint so the next run starts from the first page
    Reset {
        #[arg(long)]
        checkpoint: Option<PathBuf>,
    },
}

/// Env config with CLI flags applied on top.
pub fn overrides(
    checkpoint: Option<PathBuf>,
    dry_run: bool,
    on_missing: Option<OnMissing>,
    interval_ms: Option<u64>,
    page_size: Option<u32>,
) -> MigrateConfig {
    let mut cfg = MigrateConfig::from_env();
    if let Some(p) = checkpoint {
        cfg = cfg.with_checkpoint_path(p);
    }
    if dry_run {
        cfg = cfg.with_dry_run(true);
    }
    if let Some(p) = on_missing {
        cfg = cfg.with_on_missing(p);
    }
    if let Some(ms) = interval_ms {
        cfg = cfg.with_request_interval_ms(ms);
    }
    if let Some(n) = page_size {
        cfg = cfg.with_page_size(n);
    }
    cfg
}

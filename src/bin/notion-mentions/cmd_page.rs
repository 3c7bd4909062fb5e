use anyhow::Result;
use serde_json::json;

use notion_mentions::{metrics, CheckpointStore, MigrateConfig, Migrator, NotionStore, WalkOptions};

/// Обработать одну страницу (например, ту, на которой упал прогон).
/// Checkpoint не читается и не пишется.
pub fn exec(cfg: MigrateConfig, page_id: String, json_out: bool) -> Result<()> {
    let store = NotionStore::new(&cfg)?;
    let checkpoint = CheckpointStore::open(cfg.checkpoint_path.clone());
    let mut migrator = Migrator::new(store, checkpoint, WalkOptions { dry_run: cfg.dry_run });

    let stats = migrator.process_page(&page_id)?;

    if json_out {
        let out = json!({ "page": page_id, "stats": stats, "metrics": metrics::snapshot() });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!(
            "{}page {}: blocks={} rewritten={} references={} unresolved={} malformed={}",
            if cfg.dry_run { "[dry-run] " } else { "" },
            page_id,
            stats.visited,
            stats.rewritten,
            stats.references,
            stats.unresolved,
            stats.malformed,
        );
    }
    Ok(())
}

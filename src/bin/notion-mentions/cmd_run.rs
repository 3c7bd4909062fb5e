use anyhow::Result;
use log::info;
use serde_json::json;

use notion_mentions::{metrics, CheckpointStore, MigrateConfig, Migrator, NotionStore, WalkOptions};

/// Full migration run over every page visible to the integration.
///
/// Печатает итог: батчи/страницы/блоки + счётчики API.
/// При ошибке процесс завершается с кодом 1, checkpoint остаётся на последнем
/// полностью обработанном батче; просто запустите команду ещё раз.
pub fn exec(cfg: MigrateConfig, json_out: bool) -> Result<()> {
    info!("{}", cfg);
    let store = NotionStore::new(&cfg)?;
    let checkpoint = CheckpointStore::open(cfg.checkpoint_path.clone());
    let mut migrator = Migrator::new(store, checkpoint, WalkOptions { dry_run: cfg.dry_run });

    let report = migrator.run()?;
    let m = metrics::snapshot();

    if json_out {
        let out = json!({ "report": report, "metrics": m });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "{}pages={} batches={} blocks={} textual={} rewritten={} references={} unresolved={} malformed={} duplicates={}",
        if report.dry_run { "[dry-run] " } else { "" },
        report.pages,
        report.batches,
        report.stats.visited,
        report.stats.textual,
        report.stats.rewritten,
        report.stats.references,
        report.stats.unresolved,
        report.stats.malformed,
        report.stats.duplicates,
    );
    println!(
        "api: requests={} list_pages={} list_children={} updates={} searches={} throttle_wait_ms={}",
        m.api_requests_total,
        m.api_list_pages,
        m.api_list_children,
        m.api_updates,
        m.api_searches,
        m.throttle_wait_ms,
    );
    if !report.dry_run {
        println!(
            "Done! Don't forget to delete {} (or run `notion-mentions checkpoint reset`)",
            cfg.checkpoint_path.display()
        );
    }
    Ok(())
}

use anyhow::Result;
use serde_json::json;

use notion_mentions::{Checkpoint, CheckpointStore, MigrateConfig};

/// Показать состояние checkpoint-файла.
pub fn exec_status(cfg: MigrateConfig, json_out: bool) -> Result<()> {
    let store = CheckpointStore::open(cfg.checkpoint_path);
    let state = store.load();
    let (kind, cursor) = match &state {
        Checkpoint::Fresh => ("fresh", None),
        Checkpoint::Resume(c) => ("resume", Some(c.as_str())),
    };

    if json_out {
        let out = json!({
            "path": store.path().display().to_string(),
            "state": kind,
            "cursor": cursor,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("checkpoint {}", store.path().display());
    match state {
        Checkpoint::Fresh => println!("  state  = fresh (next run starts from the first page)"),
        Checkpoint::Resume(c) => println!("  state  = resume\n  cursor = {}", c),
    }
    Ok(())
}

/// Удалить checkpoint: следующий run начнёт с первой страницы.
pub fn exec_reset(cfg: MigrateConfig) -> Result<()> {
    let store = CheckpointStore::open(cfg.checkpoint_path);
    if store.clear()? {
        println!("checkpoint {} removed", store.path().display());
    } else {
        println!("checkpoint {} did not exist", store.path().display());
    }
    Ok(())
}

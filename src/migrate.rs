//! migrate: главный цикл: checkpoint -> батчи страниц -> обход -> checkpoint.
//!
//! ```text
//! cursor = checkpoint.load()          // Fresh = None, Resume(c) = Some(c)
//! for batch in PageEnumerator(cursor):
//!     for page in batch: walk_page(page)?
//!     checkpoint.save(batch.next_cursor)?   // последний батч пишет null
//! ```
//!
//! Ошибка на любой странице батча прерывает прогон, курсор этого батча не сохраняется:
//! повторный запуск переделает максимум один батч. Покрытый блок не даёт совпадений
//! и повторно не пишется.
//! Dry-run читает checkpoint, но никогда его не пишет.

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::enumerate::PageEnumerator;
use crate::store::DocumentStore;
use crate::walk::{walk_page, WalkOptions, WalkStats};

#[derive(Clone, Debug, Default, Serialize)]
pub struct RunReport {
    pub dry_run: bool,
    /// Cursor the run started from (None = beginning).
    pub resumed_from: Option<String>,
    pub batches: u64,
    pub pages: u64,
    pub stats: WalkStats,
}

pub struct Migrator<S> {
    store: S,
    checkpoint: CheckpointStore,
    opts: WalkOptions,
}

fn describe(cursor: Option<&str>) -> &str {
    cursor.unwrap_or("<start>")
}

impl<S: DocumentStore> Migrator<S> {
    pub fn new(store: S, checkpoint: CheckpointStore, opts: WalkOptions) -> Self {
        Self {
            store,
            checkpoint,
            opts,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn checkpoint(&self) -> &CheckpointStore {
        &self.checkpoint
    }

    /// Migrate every page, resuming from the persisted cursor.
    pub fn run(&mut self) -> Result<RunReport> {
        let state = self.checkpoint.load();
        let mut report = RunReport {
            dry_run: self.opts.dry_run,
            resumed_from: state.start_cursor(),
            ..RunReport::default()
        };

        match &state {
            Checkpoint::Resume(c) => info!("resuming from cursor {}", c),
            Checkpoint::Fresh => info!("no saved cursor, starting from the first page"),
        }

        // Последний курсор, который точно лежит на диске (для сообщений об ошибках).
        let mut saved = state.start_cursor();
        let mut pages = PageEnumerator::new(state.start_cursor());

        loop {
            let batch = pages.next_batch(&mut self.store).with_context(|| {
                format!(
                    "aborted; last saved checkpoint cursor: {}",
                    describe(saved.as_deref())
                )
            })?;
            let Some(batch) = batch else { break };

            for page in &batch.pages {
                info!("Page Name: {}, Page ID: {}", page.label(), page.id);
                let stats = walk_page(&mut self.store, &page.id, &self.opts).with_context(|| {
                    format!(
                        "aborted at page {} in batch starting at {}; last saved checkpoint cursor: {}",
                        page.id,
                        describe(batch.start_cursor.as_deref()),
                        describe(saved.as_deref())
                    )
                })?;
                report.pages += 1;
                report.stats.merge(&stats);
            }
            report.batches += 1;

            if !self.opts.dry_run {
                self.checkpoint
                    .save(batch.next_cursor.as_deref())
                    .with_context(|| {
                        format!(
                            "save checkpoint {} after batch starting at {}",
                            self.checkpoint.path().display(),
                            describe(batch.start_cursor.as_deref())
                        )
                    })?;
                saved = batch.next_cursor.clone();
            }
        }

        info!(
            "done: {} batch(es), {} page(s), {} block(s) visited, {} rewritten, {} reference(s)",
            report.batches,
            report.pages,
            report.stats.visited,
            report.stats.rewritten,
            report.stats.references
        );
        Ok(report)
    }

    /// Walk a single page; the checkpoint is neither read nor written.
    pub fn process_page(&mut self, page_id: &str) -> Result<WalkStats> {
        walk_page(&mut self.store, page_id, &self.opts)
            .with_context(|| format!("process page {}", page_id))
    }
}

//! walk: обход дерева блоков одной страницы.
//!
//! Порядок: depth-first pre-order, среди соседей порядок листинга.
//! Реализация на явном стеке фреймов (без рекурсии): у каждого фрейма свой parent id,
//! очередь ещё не посещённых блоков и курсор пагинации детей этого parent'а.
//! Детей одного parent'а дочитываем до конца (has_more=false), но лениво:
//! следующая страница листинга запрашивается, только когда очередь фрейма опустела.
//!
//! Для каждого блока:
//! - текстовый kind + BlockBody::Text  -> matcher, resolve_category для каждого спана,
//!   mutator только по разрешённым спанам, при изменениях update_block;
//!   неразрешённый спан (None) остаётся в исходных run'ах байт в байт;
//! - BlockBody::Malformed              -> лог + пропуск матчинга (обход продолжается);
//! - has_children                      -> спускаемся всегда, независимо от kind/совпадений.
//!
//! Visited-set живёт ровно один walk_page и засеян id самой страницы:
//! повторный id (битые данные, общий блок у двух parent'ов) пропускается.

use std::collections::{HashMap, HashSet, VecDeque};

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::matcher::find_references;
use crate::mutate::{rewrite, Rewrite};
use crate::richtext::{plain_text, Block, BlockBody, RefTarget, Reference, Run};
use crate::store::DocumentStore;

#[derive(Clone, Debug, Default)]
pub struct WalkOptions {
    /// Report rewrites without calling update_block.
    pub dry_run: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct WalkStats {
    /// Blocks visited (each id at most once per page).
    pub visited: u64,
    /// Visited blocks of a textual kind.
    pub textual: u64,
    /// Blocks whose runs changed (updated, or would be in dry-run).
    pub rewritten: u64,
    /// `[[...]]` spans replaced.
    pub references: u64,
    /// Spans left as text because the store had no target for them.
    pub unresolved: u64,
    /// Textual blocks whose content could not be parsed.
    pub malformed: u64,
    /// Repeated block ids skipped.
    pub duplicates: u64,
    /// list_children requests issued.
    pub child_listings: u64,
}

impl WalkStats {
    pub fn merge(&mut self, o: &WalkStats) {
        self.visited += o.visited;
        self.textual += o.textual;
        self.rewritten += o.rewritten;
        self.references += o.references;
        self.unresolved += o.unresolved;
        self.malformed += o.malformed;
        self.duplicates += o.duplicates;
        self.child_listings += o.child_listings;
    }
}

struct Frame {
    parent: String,
    pending: VecDeque<Block>,
    cursor: Option<String>,
    exhausted: bool,
}

impl Frame {
    fn new(parent: String) -> Self {
        Self {
            parent,
            pending: VecDeque::new(),
            cursor: None,
            exhausted: false,
        }
    }
}

/// Walk every block reachable from `page_id`, rewriting legacy links on the way.
pub fn walk_page<S: DocumentStore + ?Sized>(
    store: &mut S,
    page_id: &str,
    opts: &WalkOptions,
) -> Result<WalkStats> {
    let mut stats = WalkStats::default();
    let mut visited: HashSet<String> = HashSet::new();
    visited.insert(page_id.to_string());

    let mut stack = vec![Frame::new(page_id.to_string())];

    while let Some(frame) = stack.last_mut() {
        let Some(block) = frame.pending.pop_front() else {
            if frame.exhausted {
                stack.pop();
                continue;
            }
            let listing = store
                .list_children(&frame.parent, frame.cursor.as_deref())
                .with_context(|| format!("list children of {}", frame.parent))?;
            stats.child_listings += 1;
            frame.exhausted = !listing.continues();
            frame.cursor = listing.next_cursor;
            frame.pending.extend(listing.items);
            continue;
        };

        if !visited.insert(block.id.clone()) {
            warn!("block {} reached twice under page {}, skipping", block.id, page_id);
            stats.duplicates += 1;
            continue;
        }
        stats.visited += 1;

        visit_block(store, &block, opts, &mut stats)?;

        if block.has_children {
            stack.push(Frame::new(block.id));
        }
    }

    Ok(stats)
}

fn visit_block<S: DocumentStore + ?Sized>(
    store: &mut S,
    block: &Block,
    opts: &WalkOptions,
    stats: &mut WalkStats,
) -> Result<()> {
    if !block.kind.is_textual() {
        return Ok(());
    }
    stats.textual += 1;

    let runs = match &block.body {
        BlockBody::Text { runs, .. } => runs,
        BlockBody::Malformed(reason) => {
            warn!("block {} ({}): unreadable content, skipping: {}", block.id, block.kind.type_name(), reason);
            stats.malformed += 1;
            return Ok(());
        }
        BlockBody::Unsupported => return Ok(()),
    };

    let found = find_references(runs);
    if found.is_empty() {
        return Ok(());
    }

    let mut matches = Vec::with_capacity(found.len());
    let mut targets: HashMap<String, RefTarget> = HashMap::new();
    for m in found {
        let target = store
            .resolve_category(&m.category)
            .with_context(|| format!("resolve [[{}]] in block {}", m.category, block.id))?;
        match target {
            Some(t) => {
                targets.insert(m.category.clone(), t);
                matches.push(m);
            }
            None => stats.unresolved += 1,
        }
    }

    let (new_runs, references) = match rewrite(runs, &matches) {
        Rewrite::Unchanged => {
            debug!("block {}: no span resolved, left as is", block.id);
            return Ok(());
        }
        Rewrite::Changed { runs, references } => (retarget(runs, &targets), references),
    };

    debug!(
        "block {}: '{}' -> '{}'",
        block.id,
        plain_text(runs),
        plain_text(&new_runs)
    );

    if opts.dry_run {
        info!("[dry-run] block {}: {} reference(s) to create", block.id, references);
    } else {
        store
            .update_block(block, &new_runs)
            .with_context(|| format!("update block {}", block.id))?;
        info!("block {}: {} reference(s) created", block.id, references);
    }
    stats.rewritten += 1;
    stats.references += references as u64;
    Ok(())
}

// Point freshly created references at the targets the store resolved.
fn retarget(runs: Vec<Run>, targets: &HashMap<String, RefTarget>) -> Vec<Run> {
    runs.into_iter()
        .map(|run| match run {
            Run::Reference(Reference {
                target: RefTarget::Category(name),
                plain_text,
                annotations,
            }) => {
                let target = targets
                    .get(&name)
                    .cloned()
                    .unwrap_or(RefTarget::Category(name));
                Run::Reference(Reference {
                    target,
                    plain_text,
                    annotations,
                })
            }
            other => other,
        })
        .collect()
}

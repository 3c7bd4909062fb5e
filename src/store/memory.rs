//! store/memory: in-memory DocumentStore.
//!
//! Keeps pages, blocks and parent→children lists in maps and paginates them with
//! index cursors. Records every listing and update so callers can assert on traffic.
//! Failure injection: `fail_children_of(parent)` makes listing that parent's children
//! return an HTTP 500 until `clear_failures()`.
//! `mark_unknown(category)` makes `resolve_category` answer None for that name, as the
//! Notion store does for a missing page under OnMissing::Keep.

use std::collections::{HashMap, HashSet};

use crate::error::{StoreError, StoreResult};
use crate::richtext::{Block, BlockBody, RefTarget, Run};

use super::{DocumentStore, Listing, PageRef};

#[derive(Debug, Clone)]
pub struct MemoryStore {
    page_size: usize,
    pages: Vec<PageRef>,
    blocks: HashMap<String, Block>,
    children: HashMap<String, Vec<String>>,
    failing: HashSet<String>,
    unknown: HashSet<String>,

    page_requests: Vec<Option<String>>,
    children_requests: Vec<String>,
    updates: Vec<(String, Vec<Run>)>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            page_size: 100,
            pages: Vec::new(),
            blocks: HashMap::new(),
            children: HashMap::new(),
            failing: HashSet::new(),
            unknown: HashSet::new(),
            page_requests: Vec::new(),
            children_requests: Vec::new(),
            updates: Vec::new(),
        }
    }

    /// Items per listing page for both pages and children (min 1).
    pub fn with_page_size(mut self, n: usize) -> Self {
        self.page_size = n.max(1);
        self
    }

    pub fn add_page(&mut self, id: &str, title: Option<&str>) {
        self.pages.push(PageRef {
            id: id.to_string(),
            title: title.map(str::to_string),
        });
    }

    /// Append `block` as the last child of `parent_id` (a page or a block).
    pub fn add_block(&mut self, parent_id: &str, block: Block) {
        let id = block.id.clone();
        self.blocks.insert(id.clone(), block);
        self.link_child(parent_id, &id);
    }

    /// Add an existing block id under another parent as well (shared or malformed data).
    pub fn link_child(&mut self, parent_id: &str, child_id: &str) {
        self.children
            .entry(parent_id.to_string())
            .or_default()
            .push(child_id.to_string());
        if let Some(parent) = self.blocks.get_mut(parent_id) {
            parent.has_children = true;
        }
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.get(id)
    }

    pub fn fail_children_of(&mut self, parent_id: &str) {
        self.failing.insert(parent_id.to_string());
    }

    pub fn clear_failures(&mut self) {
        self.failing.clear();
    }

    pub fn mark_unknown(&mut self, category: &str) {
        self.unknown.insert(category.to_string());
    }

    /// Cursors passed to `list_pages`, in call order.
    pub fn page_requests(&self) -> &[Option<String>] {
        &self.page_requests
    }

    /// Parent ids passed to `list_children`, in call order (one entry per request).
    pub fn children_requests(&self) -> &[String] {
        &self.children_requests
    }

    /// (block id, new runs) for every successful update, in call order.
    pub fn updates(&self) -> &[(String, Vec<Run>)] {
        &self.updates
    }

    pub fn clear_log(&mut self) {
        self.page_requests.clear();
        self.children_requests.clear();
        self.updates.clear();
    }

    fn window<T: Clone>(
        &self,
        items: &[T],
        cursor: Option<&str>,
        op: &str,
    ) -> StoreResult<Listing<T>> {
        let start = match cursor {
            None => 0,
            Some(c) => c
                .parse::<usize>()
                .map_err(|_| StoreError::decode(op, format!("bad cursor '{}'", c)))?,
        };
        let end = (start + self.page_size).min(items.len());
        let slice = if start < items.len() {
            items[start..end].to_vec()
        } else {
            Vec::new()
        };
        let has_more = end < items.len();
        Ok(Listing {
            items: slice,
            next_cursor: has_more.then(|| end.to_string()),
            has_more,
        })
    }
}

impl DocumentStore for MemoryStore {
    fn list_pages(&mut self, cursor: Option<&str>) -> StoreResult<Listing<PageRef>> {
        self.page_requests.push(cursor.map(str::to_string));
        let pages = self.pages.clone();
        self.window(&pages, cursor, "list_pages")
    }

    fn list_children(
        &mut self,
        parent_id: &str,
        cursor: Option<&str>,
    ) -> StoreResult<Listing<Block>> {
        self.children_requests.push(parent_id.to_string());
        if self.failing.contains(parent_id) {
            return Err(StoreError::Status {
                op: "list_children".into(),
                status: 500,
                body: format!("injected failure for {}", parent_id),
            });
        }
        let ids = self.children.get(parent_id).cloned().unwrap_or_default();
        let page = self.window(&ids, cursor, "list_children")?;
        let mut items = Vec::with_capacity(page.items.len());
        for id in page.items {
            let block = self
                .blocks
                .get(&id)
                .cloned()
                .ok_or_else(|| StoreError::NotFound(id.clone()))?;
            items.push(block);
        }
        Ok(Listing {
            items,
            next_cursor: page.next_cursor,
            has_more: page.has_more,
        })
    }

    fn update_block(&mut self, block: &Block, runs: &[Run]) -> StoreResult<()> {
        let stored = self
            .blocks
            .get_mut(&block.id)
            .ok_or_else(|| StoreError::NotFound(block.id.clone()))?;
        match &mut stored.body {
            BlockBody::Text { runs: current, .. } => *current = runs.to_vec(),
            _ => {
                return Err(StoreError::Status {
                    op: "update_block".into(),
                    status: 400,
                    body: format!("block {} has no rich_text", block.id),
                })
            }
        }
        self.updates.push((block.id.clone(), runs.to_vec()));
        Ok(())
    }

    fn resolve_category(&mut self, category: &str) -> StoreResult<Option<RefTarget>> {
        if self.unknown.contains(category) {
            return Ok(None);
        }
        Ok(Some(RefTarget::Category(category.to_string())))
    }
}

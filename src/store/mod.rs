//! store: граница с удалённым хранилищем документов.
//!
//! Три операции, которых достаточно для миграции:
//! - list_pages(cursor)             - пагинированный список страниц;
//! - list_children(parent, cursor)  - пагинированный список дочерних блоков;
//! - update_block(block, runs)      - атомарная замена rich_text одного блока;
//! - resolve_category(name)         - цель ссылки до записи (None: спан остаётся текстом).
//!
//! Реализации:
//! - notion::NotionStore  - HTTP (reqwest blocking) + троттлинг;
//! - memory::MemoryStore  - in-memory дерево (тесты, офлайн-прогоны).

pub mod memory;
pub mod notion;
pub mod throttle;

use crate::error::StoreResult;
use crate::richtext::{Block, RefTarget, Run};

/// Page identifier plus its title when the listing carries one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageRef {
    pub id: String,
    pub title: Option<String>,
}

impl PageRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
        }
    }

    /// Title for progress output.
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or("<untitled>")
    }
}

/// One page of a paginated listing.
#[derive(Clone, Debug)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl<T> Listing<T> {
    /// True when another request with `next_cursor` is needed.
    pub fn continues(&self) -> bool {
        self.has_more && self.next_cursor.is_some()
    }
}

pub trait DocumentStore {
    fn list_pages(&mut self, cursor: Option<&str>) -> StoreResult<Listing<PageRef>>;

    /// Children of a page or a block (a page id is a valid parent).
    fn list_children(&mut self, parent_id: &str, cursor: Option<&str>)
        -> StoreResult<Listing<Block>>;

    /// Replace the block's rich text with `runs`. `block` is the snapshot that was matched.
    fn update_block(&mut self, block: &Block, runs: &[Run]) -> StoreResult<()>;

    /// Target for a `[[category]]` span. `Ok(None)` leaves the span as plain text.
    /// The default defers to `update_block` by keeping the category itself.
    fn resolve_category(&mut self, category: &str) -> StoreResult<Option<RefTarget>> {
        Ok(Some(RefTarget::Category(category.to_string())))
    }
}

impl<S: DocumentStore + ?Sized> DocumentStore for &mut S {
    fn list_pages(&mut self, cursor: Option<&str>) -> StoreResult<Listing<PageRef>> {
        (**self).list_pages(cursor)
    }

    fn list_children(
        &mut self,
        parent_id: &str,
        cursor: Option<&str>,
    ) -> StoreResult<Listing<Block>> {
        (**self).list_children(parent_id, cursor)
    }

    fn update_block(&mut self, block: &Block, runs: &[Run]) -> StoreResult<()> {
        (**self).update_block(block, runs)
    }

    fn resolve_category(&mut self, category: &str) -> StoreResult<Option<RefTarget>> {
        (**self).resolve_category(category)
    }
}

pub use memory::MemoryStore;
pub use notion::NotionStore;

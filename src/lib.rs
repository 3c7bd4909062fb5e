// Модель и чистая обработка текста
pub mod richtext;
pub mod matcher; // [[category]] -> Match
pub mod mutate;  // Match -> новые runs

// Обход и прогресс
pub mod walk;       // дерево блоков одной страницы
pub mod enumerate;  // батчи страниц
pub mod checkpoint; // курсор на диске
pub mod migrate;    // главный цикл

// Граница с хранилищем (Notion HTTP / in-memory)
pub mod store;
pub mod error;

// Общее
pub mod config;
pub mod metrics;

// Удобные реэкспорты
pub use checkpoint::{Checkpoint, CheckpointStore};
pub use config::{MigrateBuilder, MigrateConfig, OnMissing};
pub use enumerate::{PageBatch, PageEnumerator};
pub use error::StoreError;
pub use matcher::{find_references, find_in_text, Match, RunPos};
pub use migrate::{Migrator, RunReport};
pub use mutate::{rewrite, Rewrite};
pub use richtext::{Annotations, Block, BlockBody, BlockKind, RefTarget, Reference, Run, TextRun};
pub use store::{DocumentStore, Listing, MemoryStore, NotionStore, PageRef};
pub use walk::{walk_page, WalkOptions, WalkStats};

//! Lightweight global metrics for notion-mentions.
//!
//! Потокобезопасные атомарные счётчики:
//! - API (запросы по эндпоинтам, время ожидания троттлинга)
//! - Mentions (поиск страниц, кэш, неразрешённые ссылки)
//! - Checkpoint (сохранения)

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

// ----- API -----
static API_REQUESTS_TOTAL: AtomicU64 = AtomicU64::new(0);
static API_LIST_PAGES: AtomicU64 = AtomicU64::new(0);
static API_LIST_CHILDREN: AtomicU64 = AtomicU64::new(0);
static API_UPDATES: AtomicU64 = AtomicU64::new(0);
static API_SEARCHES: AtomicU64 = AtomicU64::new(0);
static API_ERRORS: AtomicU64 = AtomicU64::new(0);
static THROTTLE_WAIT_MS: AtomicU64 = AtomicU64::new(0);

// ----- Mentions -----
static MENTION_CACHE_HITS: AtomicU64 = AtomicU64::new(0);
static MENTION_UNRESOLVED: AtomicU64 = AtomicU64::new(0);

// ----- Checkpoint -----
static CHECKPOINT_SAVES: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsSnapshot {
    pub api_requests_total: u64,
    pub api_list_pages: u64,
    pub api_list_children: u64,
    pub api_updates: u64,
    pub api_searches: u64,
    pub api_errors: u64,
    pub throttle_wait_ms: u64,

    pub mention_cache_hits: u64,
    pub mention_unresolved: u64,

    pub checkpoint_saves: u64,
}

#[derive(Debug, Clone, Copy)]
pub enum ApiCall {
    ListPages,
    ListChildren,
    Update,
    Search,
}

pub fn record_api_call(call: ApiCall) {
    API_REQUESTS_TOTAL.fetch_add(1, Ordering::Relaxed);
    let c = match call {
        ApiCall::ListPages => &API_LIST_PAGES,
        ApiCall::ListChildren => &API_LIST_CHILDREN,
        ApiCall::Update => &API_UPDATES,
        ApiCall::Search => &API_SEARCHES,
    };
    c.fetch_add(1, Ordering::Relaxed);
}

pub fn record_api_error() {
    API_ERRORS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_throttle_wait(ms: u64) {
    THROTTLE_WAIT_MS.fetch_add(ms, Ordering::Relaxed);
}

pub fn record_mention_cache_hit() {
    MENTION_CACHE_HITS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_mention_unresolved() {
    MENTION_UNRESOLVED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_checkpoint_save() {
    CHECKPOINT_SAVES.fetch_add(1, Ordering::Relaxed);
}

pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        api_requests_total: API_REQUESTS_TOTAL.load(Ordering::Relaxed),
        api_list_pages: API_LIST_PAGES.load(Ordering::Relaxed),
        api_list_children: API_LIST_CHILDREN.load(Ordering::Relaxed),
        api_updates: API_UPDATES.load(Ordering::Relaxed),
        api_searches: API_SEARCHES.load(Ordering::Relaxed),
        api_errors: API_ERRORS.load(Ordering::Relaxed),
        throttle_wait_ms: THROTTLE_WAIT_MS.load(Ordering::Relaxed),

        mention_cache_hits: MENTION_CACHE_HITS.load(Ordering::Relaxed),
        mention_unresolved: MENTION_UNRESOLVED.load(Ordering::Relaxed),

        checkpoint_saves: CHECKPOINT_SAVES.load(Ordering::Relaxed),
    }
}
